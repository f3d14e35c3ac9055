pub mod tab;

pub use tab::{dedup_by_url, TabObservation, TabRecord};

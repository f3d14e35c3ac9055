pub mod db;
pub mod merge;
pub mod records;

pub use db::{Database, StoreError};
pub use merge::merge;
pub use records::Page;

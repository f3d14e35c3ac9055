pub mod capture;
pub mod handshake;
pub mod session;
pub mod worker;

pub use capture::{capture_snapshot, OpenTab, TabSource};
pub use handshake::{Handshake, HandshakeError, ViewId, ViewRegistry};
pub use session::SessionFile;
pub use worker::{ArchiveCommand, ArchiveEvent, ArchiveWorker};

pub mod app;
pub mod terminal;
pub mod views;

pub use app::{App, Pane};
pub use terminal::{init as init_terminal, restore as restore_terminal, Tui};

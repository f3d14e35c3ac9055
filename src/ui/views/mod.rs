pub mod archive;

pub use archive::render_archive;

pub mod manifest;
pub mod render;
pub mod snapshot;

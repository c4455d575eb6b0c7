pub mod actors;
pub mod bootstrap;
pub mod clock;
pub mod context;
pub mod dispute;
pub mod lifecycle;
pub mod validation;

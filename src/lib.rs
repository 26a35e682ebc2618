pub mod logging;
pub mod paint;
pub mod settings;

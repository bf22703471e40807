//! CLI library for testing purposes

pub mod config;
pub mod deepl;
pub mod path_glob;
pub mod validation;

pub use config::{Config, load_config};
pub use path_glob::expand_inputs;

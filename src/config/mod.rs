pub mod env;
mod loader;

pub use env::{AppConfig, TrainingConfig, TriageConfig};
pub use loader::load_config;

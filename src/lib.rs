pub mod assigned;
pub mod assignment;
pub mod checker;
pub mod chooser;
pub mod config;
pub mod error;
pub mod generator;
pub mod loader;
pub mod manifest;
pub mod models;
pub mod output;
pub mod randomizer;
pub mod skin;
pub mod uuids;

pub use error::GenerationError;
pub use generator::{generate, ExamGenerator, GenerationOutput, GeneratorOptions};

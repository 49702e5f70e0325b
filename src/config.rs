use crate::generator::GeneratorOptions;
use crate::manifest::FilenameStrategy;
use crate::uuids::UuidStrategy;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "examgen", version, about = "Assign randomized exams to a roster")]
pub struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "EXAMGEN_JSON_LOGS")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Assign exams to every student and write manifests.
    Generate(Generate),
    /// Run every check without writing anything.
    Validate(Validate),
}

#[derive(Args)]
pub struct Generate {
    #[command(flatten)]
    pub generation: GenerationArgs,

    #[arg(short, long, env = "EXAMGEN_OUT_DIR", default_value = "out")]
    pub out_dir: PathBuf,
}

#[derive(Args)]
pub struct Validate {
    #[command(flatten)]
    pub generation: GenerationArgs,
}

#[derive(Args)]
pub struct GenerationArgs {
    /// Exam specification JSON.
    #[arg(short, long, env = "EXAMGEN_EXAM")]
    pub exam: PathBuf,

    /// Roster CSV with `uniqname` and `name` columns.
    #[arg(short, long, env = "EXAMGEN_ROSTER")]
    pub roster: PathBuf,

    #[arg(long, env = "EXAMGEN_UUID_STRATEGY", default_value_t = UuidStrategy::Plain)]
    pub uuid_strategy: UuidStrategy,

    #[arg(long, env = "EXAMGEN_UUIDV5_NAMESPACE")]
    pub uuidv5_namespace: Option<String>,

    #[arg(long, env = "EXAMGEN_CHOOSE_ALL")]
    pub choose_all: bool,

    #[arg(long, env = "EXAMGEN_ALLOW_DUPLICATES")]
    pub allow_duplicates: bool,

    #[arg(long, env = "EXAMGEN_CONSISTENT_RANDOMIZATION")]
    pub consistent_randomization: bool,

    #[arg(long, env = "EXAMGEN_FILENAMES", default_value_t = FilenameStrategy::Uniqname)]
    pub filenames: FilenameStrategy,
}

impl GenerationArgs {
    pub fn options(&self) -> GeneratorOptions {
        GeneratorOptions {
            uuid_strategy: self.uuid_strategy,
            uuidv5_namespace: self
                .uuidv5_namespace
                .clone()
                .filter(|ns| !ns.trim().is_empty()),
            choose_all: self.choose_all,
            allow_duplicates: self.allow_duplicates,
            consistent_randomization: self.consistent_randomization,
            filenames: self.filenames,
        }
    }
}

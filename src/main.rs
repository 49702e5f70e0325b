use clap::Parser;
use exam_generator::config::{Cli, Commands, GenerationArgs};
use exam_generator::generator::GenerationOutput;
use exam_generator::loader::{load_exam, load_roster};
use exam_generator::output::write_artifacts;
use tracing_subscriber::EnvFilter;

async fn run_generation(args: &GenerationArgs) -> anyhow::Result<GenerationOutput> {
    let (exam, roster) = tokio::try_join!(load_exam(&args.exam), load_roster(&args.roster))?;
    Ok(exam_generator::generate(exam, &roster, args.options())?)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate(generate) => {
            let output = run_generation(&generate.generation).await?;
            write_artifacts(&generate.out_dir, &output).await?;
        }
        Commands::Validate(validate) => {
            let output = run_generation(&validate.generation).await?;
            tracing::info!(
                students = output.exams.len(),
                sections = output.stats.sections.len(),
                questions = output.stats.questions.len(),
                "exam and roster are consistent"
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let filter = EnvFilter::from_default_env().add_directive("info".parse()?);
    if cli.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    if let Err(err) = run(cli).await {
        tracing::error!("generation failed: {:#}", err);
        return Err(err);
    }
    Ok(())
}

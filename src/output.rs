use crate::generator::GenerationOutput;
use crate::manifest::filenames_csv;
use anyhow::{Context, Result};
use futures::future::try_join_all;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub const MANIFEST_DIR: &str = "manifests";
pub const STATS_FILE: &str = "stats.json";
pub const STUDENTS_FILE: &str = "students.csv";

async fn write_json<T: Serialize>(path: PathBuf, value: &T) -> Result<()> {
    let serialized = serde_json::to_vec_pretty(value)?;
    tokio::fs::write(&path, serialized)
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}

pub async fn write_artifacts(out_dir: &Path, output: &GenerationOutput) -> Result<()> {
    let manifest_dir = out_dir.join(MANIFEST_DIR);
    tokio::fs::create_dir_all(&manifest_dir)
        .await
        .with_context(|| format!("failed to create {}", manifest_dir.display()))?;

    try_join_all(
        output
            .manifests
            .iter()
            .zip(&output.filenames)
            .map(|(manifest, filename)| {
                write_json(
                    manifest_dir.join(format!("{}.json", filename.filename_base)),
                    manifest,
                )
            }),
    )
    .await?;

    write_json(out_dir.join(STATS_FILE), &output.stats).await?;

    let students = filenames_csv(&output.filenames)?;
    let students_path = out_dir.join(STUDENTS_FILE);
    tokio::fs::write(&students_path, students)
        .await
        .with_context(|| format!("failed to write {}", students_path.display()))?;

    info!(
        out_dir = %out_dir.display(),
        manifests = output.manifests.len(),
        "artifacts written"
    );
    Ok(())
}

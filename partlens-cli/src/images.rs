// ABOUTME: Runs the SDK ingestion pipeline for files named on the command line
// ABOUTME: Drives an indicatif progress bar and summarizes payload sizes against the byte budget

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use partlens_sdk::{EncodedImage, IngestConfig, IngestionPipeline, SourceFile};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::ui;

/// Size report for one prepared image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageSummary {
    pub index: usize,
    pub name: String,
    pub mime_type: String,
    pub byte_size: usize,
    pub over_budget: bool,
}

/// Read, encode and compress `paths` in order.
pub async fn prepare_images(
    paths: &[PathBuf],
    config: IngestConfig,
    show_progress: bool,
) -> Result<Vec<EncodedImage>> {
    let files = paths
        .iter()
        .map(SourceFile::from_path)
        .collect::<partlens_sdk::Result<Vec<_>>>()?;

    let progress = progress_bar(files.len(), show_progress);
    let pipeline = IngestionPipeline::with_config(config);

    let result = pipeline
        .process(&files, |current, total| {
            progress.set_length(total as u64);
            progress.set_position(current as u64);
        })
        .await;

    progress.finish_and_clear();
    Ok(result?)
}

pub fn summarize(images: &[EncodedImage], byte_budget: usize) -> Vec<ImageSummary> {
    images
        .iter()
        .map(|image| {
            let byte_size = image.byte_size();
            ImageSummary {
                index: image.index,
                name: image.name.clone(),
                mime_type: image.mime_type.clone(),
                byte_size,
                over_budget: byte_size > byte_budget,
            }
        })
        .collect()
}

fn progress_bar(total: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{msg} [{bar:25.cyan/blue}] {pos}/{len}")
    {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb.set_message("Preparing images");
    pb.enable_steady_tick(Duration::from_millis(ui::PROGRESS_BAR_TICK_MS));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(index: usize, payload_chars: usize) -> EncodedImage {
        EncodedImage {
            index,
            name: format!("part-{index}.jpg"),
            mime_type: "image/jpeg".to_string(),
            data_uri: Some(format!("data:image/jpeg;base64,{}", "A".repeat(payload_chars))),
        }
    }

    #[test]
    fn test_summarize_flags_over_budget_images() {
        let summaries = summarize(&[image(0, 400), image(1, 4_000)], 1_000);

        assert_eq!(summaries[0].byte_size, 300);
        assert!(!summaries[0].over_budget);
        assert_eq!(summaries[1].byte_size, 3_000);
        assert!(summaries[1].over_budget);
        assert_eq!(summaries[1].name, "part-1.jpg");
    }

    #[tokio::test]
    async fn test_missing_file_is_reported() {
        let err = prepare_images(
            &[PathBuf::from("/definitely/missing/part.jpg")],
            IngestConfig::default(),
            false,
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("part.jpg"));
    }
}

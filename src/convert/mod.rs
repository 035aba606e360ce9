//! Markdown conversion stage
//!
//! Turns fetched pages into Markdown files in the job workspace, one per
//! page. A page that cannot be converted is logged and skipped; the stage
//! only fails when no page at all made it through.

mod markdown;

pub use markdown::{
    artifact_path, convert_page, sanitize_filename, Converter, Html2MdConverter, MarkdownArtifact,
};

use crate::crawler::FetchedPage;
use crate::{ConversionError, FerryError};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use url::Url;

/// A converted page written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenArtifact {
    pub source_url: Url,
    pub relative_path: String,
    pub local_path: PathBuf,
}

/// Converts every page and writes the results under `dir`
///
/// Pages are processed in order; when two pages map to the same file name
/// the first one wins and the later one is skipped.
///
/// # Returns
///
/// * `Ok(Vec<WrittenArtifact>)` - At least one page was converted
/// * `Err(FerryError::NothingConverted)` - Every page failed
pub async fn convert_pages(
    converter: &dyn Converter,
    pages: &[FetchedPage],
    dir: &Path,
) -> Result<Vec<WrittenArtifact>, FerryError> {
    let mut seen = HashSet::new();
    let mut written = Vec::new();
    let mut failed = 0;

    for page in pages {
        match convert_one(converter, page, dir, &mut seen).await {
            Ok(artifact) => {
                tracing::debug!("Converted {} -> {}", artifact.source_url, artifact.relative_path);
                written.push(artifact);
            }
            Err(e) => {
                tracing::warn!("{}", e);
                failed += 1;
            }
        }
    }

    tracing::info!(
        "Converted {} pages to Markdown ({} skipped)",
        written.len(),
        failed
    );

    if written.is_empty() {
        return Err(FerryError::NothingConverted);
    }

    Ok(written)
}

async fn convert_one(
    converter: &dyn Converter,
    page: &FetchedPage,
    dir: &Path,
    seen: &mut HashSet<String>,
) -> Result<WrittenArtifact, ConversionError> {
    let artifact = convert_page(converter, page);

    if !seen.insert(artifact.relative_path.clone()) {
        return Err(ConversionError::DuplicatePath {
            url: page.url.to_string(),
            path: artifact.relative_path,
        });
    }

    let local_path = dir.join(&artifact.relative_path);
    if let Err(source) = tokio::fs::write(&local_path, &artifact.content).await {
        // Free the name so a later page with the same path may still claim it
        seen.remove(&artifact.relative_path);
        return Err(ConversionError::Write {
            url: page.url.to_string(),
            source,
        });
    }

    Ok(WrittenArtifact {
        source_url: artifact.source_url,
        relative_path: artifact.relative_path,
        local_path,
    })
}

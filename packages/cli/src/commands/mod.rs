pub mod check;
pub mod run;
pub mod sections;

pub use check::{check, CheckArgs};
pub use run::{run, RunArgs};
pub use sections::{sections, SectionsArgs};

use crate::config::DEFAULT_CONFIG_NAME;
use anyhow::Result;
use clap::{Args, ValueEnum};
use plinth_schema::{ExecutionRequest, Intent, Mode, RequestError};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Target overrides shared by every command that executes documents
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Build into a `_preview` frame without touching selection or notifications
    #[arg(long)]
    pub dry_run: bool,

    /// Page to build on (defaults to each document's target, then the current page)
    #[arg(long)]
    pub page: Option<String>,

    /// Reconciliation mode (append, replace, update)
    #[arg(long)]
    pub mode: Option<String>,

    /// Frame name for every document
    #[arg(long)]
    pub frame: Option<String>,
}

impl TargetArgs {
    /// Validate `documents` into an execution request carrying these overrides
    pub fn request(&self, documents: Vec<String>) -> Result<ExecutionRequest> {
        let intent = if self.dry_run {
            Intent::DryRun
        } else {
            Intent::Apply
        };
        let mut request = ExecutionRequest::new(intent, documents)?;

        if let Some(page) = &self.page {
            request = request.with_target_page(page.as_str());
        }
        if let Some(mode) = &self.mode {
            let mode = mode
                .parse::<Mode>()
                .map_err(|_| RequestError::InvalidMode(mode.clone()))?;
            request = request.with_target_mode(mode);
        }
        if let Some(frame) = &self.frame {
            request = request.with_target_frame_name(frame.as_str());
        }

        Ok(request)
    }
}

/// Expand files and directories into request document paths.
///
/// Directories are searched recursively for `.json` files in name order;
/// the config file is never treated as a document.
pub fn find_documents(paths: &[PathBuf], cwd: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        let path = cwd.join(path);
        if path.is_file() {
            files.push(path);
        } else if path.is_dir() {
            for entry in WalkDir::new(&path)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let file = entry.path();
                let is_json = file.extension().map(|e| e == "json").unwrap_or(false);
                let is_config = file.file_name().map(|n| n == DEFAULT_CONFIG_NAME).unwrap_or(false);
                if file.is_file() && is_json && !is_config {
                    files.push(file.to_path_buf());
                }
            }
        } else {
            return Err(anyhow::anyhow!("Input path does not exist: {}", path.display()));
        }
    }

    Ok(files)
}

/// Path shown to the user, relative to the working directory when possible
pub fn display_path(path: &Path, cwd: &Path) -> String {
    path.strip_prefix(cwd).unwrap_or(path).display().to_string()
}

//! fontfetch-core - Core font management library for fontfetch
//!
//! This library implements the font selection and installed-state
//! reconciliation engine behind the `fontfetch` CLI: categorizing extracted
//! font files by container format and variability, selecting the subset
//! matching the caller's format/weight/style preferences, and keeping the
//! installed-fonts manifest consistent with what is actually on disk.
//!
//! The collaborators the engine depends on (GitHub release fetching, archive
//! extraction, the download cache, config parsing, OS font registration) live
//! in their own modules behind narrow seams.

use std::path::PathBuf;
use thiserror::Error;

pub mod archive;
pub mod cache;
pub mod categorize;
pub mod config;
pub mod fetch;
pub mod format;
pub mod inspect;
pub mod install;
pub mod library;
pub mod manifest;
pub mod platform;
pub mod repair;
pub mod select;
pub mod uninstall;
pub mod update;

/// Core errors for fontfetch operations
#[derive(Error, Debug)]
pub enum FontfetchError {
    #[error("Font file not found: {0}\n→ Suggestion: Check the file path and ensure the font file exists")]
    FontNotFound(PathBuf),

    #[error("Invalid font data in {path}: {reason}")]
    FontParse { path: PathBuf, reason: String },

    #[error("Invalid repo format: {0}\n→ Suggestion: Use owner/repo, e.g. rsms/inter")]
    InvalidRepo(String),

    #[error("Invalid font format token: {0}\n→ Suggestion: Valid tokens are variable-ttf, otf, static-ttf, variable-woff2, variable-woff, static-woff2, static-woff")]
    InvalidFormat(String),

    #[error("Unknown font weight: {0}\n→ Suggestion: Use a number (100-900) or a name like regular, bold")]
    InvalidWeight(String),

    #[error("Invalid style: {0}\n→ Suggestion: Use roman, italic, or both")]
    InvalidStyle(String),

    #[error("No archive asset found in the release")]
    NoArchiveAsset,

    #[error("Unsupported archive format: {0}")]
    UnsupportedArchive(String),

    #[error("Release not found: {0}")]
    ReleaseNotFound(String),

    #[error("GitHub API error: {0}")]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}\n→ Suggestion: Check file permissions and disk space")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for fontfetch operations
pub type FetchResult<T> = Result<T, FontfetchError>;

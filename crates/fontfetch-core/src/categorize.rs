//! Partition extracted font files into the seven format buckets.

use crate::format::FormatLabel;
use crate::inspect;
use std::path::{Path, PathBuf};

/// The seven disjoint (container × variability) buckets. Input order is
/// preserved within each bucket.
#[derive(Debug, Clone, Default)]
pub struct FontBuckets {
    pub variable_ttf: Vec<PathBuf>,
    pub static_ttf: Vec<PathBuf>,
    pub otf: Vec<PathBuf>,
    pub variable_woff: Vec<PathBuf>,
    pub static_woff: Vec<PathBuf>,
    pub variable_woff2: Vec<PathBuf>,
    pub static_woff2: Vec<PathBuf>,
}

impl FontBuckets {
    pub fn bucket(&self, label: FormatLabel) -> &[PathBuf] {
        match label {
            FormatLabel::VariableTtf => &self.variable_ttf,
            FormatLabel::StaticTtf => &self.static_ttf,
            FormatLabel::Otf => &self.otf,
            FormatLabel::VariableWoff => &self.variable_woff,
            FormatLabel::StaticWoff => &self.static_woff,
            FormatLabel::VariableWoff2 => &self.variable_woff2,
            FormatLabel::StaticWoff2 => &self.static_woff2,
        }
    }

    pub fn total(&self) -> usize {
        FormatLabel::ALL
            .iter()
            .map(|&label| self.bucket(label).len())
            .sum()
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}

/// Categorize font files by extension and variability.
///
/// `.otf` files land in the `otf` bucket with no variability check (variable
/// OTF is deliberately not distinguished). For the other containers, an
/// introspection failure routes the file to the static sub-bucket: a font is
/// never dropped over an inspection error, and never claimed variable without
/// evidence.
pub fn categorize_fonts(font_files: &[PathBuf]) -> FontBuckets {
    let mut buckets = FontBuckets::default();

    for file in font_files {
        let Some(ext) = extension_of(file) else {
            log::debug!("skipping extension-less file: {}", file.display());
            continue;
        };
        match ext.as_str() {
            "otf" => buckets.otf.push(file.clone()),
            "ttf" | "woff" | "woff2" => {
                let variable = match inspect::is_variable_font(file) {
                    Ok(variable) => variable,
                    Err(e) => {
                        log::warn!(
                            "could not inspect {}: {e}; treating as static",
                            file.display()
                        );
                        false
                    }
                };
                let bucket = match ext.as_str() {
                    "ttf" if variable => &mut buckets.variable_ttf,
                    "ttf" => &mut buckets.static_ttf,
                    "woff" if variable => &mut buckets.variable_woff,
                    "woff" => &mut buckets.static_woff,
                    _ if variable => &mut buckets.variable_woff2,
                    _ => &mut buckets.static_woff2,
                };
                bucket.push(file.clone());
            }
            _ => log::debug!("skipping non-font file: {}", file.display()),
        }
    }

    buckets
}

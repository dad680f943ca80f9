//! First-match-wins font selection over an ordered format preference list.

use crate::categorize::FontBuckets;
use crate::format::FormatLabel;
use crate::inspect;
use crate::{FetchResult, FontfetchError};
use std::path::PathBuf;
use std::str::FromStr;

/// Style whitelist. `Both` means no filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StyleFilter {
    Roman,
    Italic,
    #[default]
    Both,
}

impl StyleFilter {
    pub fn matches(self, italic: bool) -> bool {
        match self {
            StyleFilter::Roman => !italic,
            StyleFilter::Italic => italic,
            StyleFilter::Both => true,
        }
    }

    /// True when the filter accepts every style, i.e. it is not a strict
    /// subset of {roman, italic}.
    pub fn is_everything(self) -> bool {
        self == StyleFilter::Both
    }
}

impl FromStr for StyleFilter {
    type Err = FontfetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "roman" => Ok(StyleFilter::Roman),
            "italic" => Ok(StyleFilter::Italic),
            "both" => Ok(StyleFilter::Both),
            other => Err(FontfetchError::InvalidStyle(other.to_string())),
        }
    }
}

/// The outcome of a selection pass: the chosen files and the format that
/// matched, or empty when no priority yielded a post-filter result.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub files: Vec<PathBuf>,
    pub format: Option<FormatLabel>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Pick the first priority whose bucket is non-empty after filtering.
///
/// Variable formats are taken whole: weights and styles are meaningless for a
/// single file spanning the full axis range, so a non-trivial filter only
/// produces a warning. Static formats are filtered by the weight whitelist and
/// style filter; an empty post-filter result moves on to the next priority.
pub fn select_fonts(
    buckets: &FontBuckets,
    priorities: &[FormatLabel],
    weights: &[u16],
    styles: StyleFilter,
) -> Selection {
    for &priority in priorities {
        let bucket = buckets.bucket(priority);
        if bucket.is_empty() {
            continue;
        }

        if priority.is_variable() {
            if !weights.is_empty() || !styles.is_everything() {
                log::warn!("weights and styles are ignored for variable fonts");
            }
            return Selection {
                files: bucket.to_vec(),
                format: Some(priority),
            };
        }

        let mut candidates = bucket.to_vec();
        if !weights.is_empty() {
            candidates.retain(|file| weights.contains(&inspect::font_weight(file)));
        }
        if !styles.is_everything() {
            candidates.retain(|file| styles.matches(inspect::font_italic(file)));
        }
        if !candidates.is_empty() {
            return Selection {
                files: candidates,
                format: Some(priority),
            };
        }
    }

    Selection::default()
}

const WEIGHT_NAMES: [(&str, u16); 9] = [
    ("thin", 100),
    ("extralight", 200),
    ("light", 300),
    ("regular", 400),
    ("medium", 500),
    ("semibold", 600),
    ("bold", 700),
    ("extrabold", 800),
    ("black", 900),
];

/// Parse a comma-separated weight list; entries are either weight-class
/// numbers (`400,700`) or names (`Regular,Bold`).
pub fn parse_weights(value: &str) -> FetchResult<Vec<u16>> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }
    value
        .split(',')
        .map(|entry| {
            let entry = entry.trim();
            if let Ok(number) = entry.parse::<u16>() {
                return Ok(number);
            }
            let lower = entry.to_lowercase();
            WEIGHT_NAMES
                .iter()
                .find(|(name, _)| *name == lower)
                .map(|&(_, weight)| weight)
                .ok_or_else(|| FontfetchError::InvalidWeight(entry.to_string()))
        })
        .collect()
}

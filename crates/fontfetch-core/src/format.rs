//! The closed set of font format tokens.
//!
//! A format token combines the container type (ttf/otf/woff/woff2) with
//! variability. OTF is always treated as static: variable OTF fonts are not
//! distinguished by this tool.

use crate::{FetchResult, FontfetchError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the seven recognized (container × variability) formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatLabel {
    #[serde(rename = "variable-ttf")]
    VariableTtf,
    #[serde(rename = "otf")]
    Otf,
    #[serde(rename = "static-ttf")]
    StaticTtf,
    #[serde(rename = "variable-woff2")]
    VariableWoff2,
    #[serde(rename = "variable-woff")]
    VariableWoff,
    #[serde(rename = "static-woff2")]
    StaticWoff2,
    #[serde(rename = "static-woff")]
    StaticWoff,
}

impl FormatLabel {
    /// All valid tokens, in the order they are documented to users.
    pub const ALL: [FormatLabel; 7] = [
        FormatLabel::VariableTtf,
        FormatLabel::Otf,
        FormatLabel::StaticTtf,
        FormatLabel::VariableWoff2,
        FormatLabel::VariableWoff,
        FormatLabel::StaticWoff2,
        FormatLabel::StaticWoff,
    ];

    /// Default preference order used when the config file does not override it.
    pub const DEFAULT_PRIORITIES: [FormatLabel; 3] = [
        FormatLabel::VariableTtf,
        FormatLabel::Otf,
        FormatLabel::StaticTtf,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FormatLabel::VariableTtf => "variable-ttf",
            FormatLabel::Otf => "otf",
            FormatLabel::StaticTtf => "static-ttf",
            FormatLabel::VariableWoff2 => "variable-woff2",
            FormatLabel::VariableWoff => "variable-woff",
            FormatLabel::StaticWoff2 => "static-woff2",
            FormatLabel::StaticWoff => "static-woff",
        }
    }

    /// True for the three variable formats. Weight/style filters do not apply
    /// to these: a variable font spans the whole axis range in one file.
    pub fn is_variable(self) -> bool {
        matches!(
            self,
            FormatLabel::VariableTtf | FormatLabel::VariableWoff | FormatLabel::VariableWoff2
        )
    }

    /// True for the web container formats (WOFF/WOFF2), which are not meant
    /// for system-wide installation.
    pub fn is_web(self) -> bool {
        matches!(
            self,
            FormatLabel::VariableWoff
                | FormatLabel::StaticWoff
                | FormatLabel::VariableWoff2
                | FormatLabel::StaticWoff2
        )
    }

    /// The filename extension this format implies, dot included.
    pub fn extension(self) -> &'static str {
        match self {
            FormatLabel::VariableTtf | FormatLabel::StaticTtf => ".ttf",
            FormatLabel::Otf => ".otf",
            FormatLabel::VariableWoff | FormatLabel::StaticWoff => ".woff",
            FormatLabel::VariableWoff2 | FormatLabel::StaticWoff2 => ".woff2",
        }
    }

    /// Expected extension for a stored format token. Unknown tokens yield
    /// `None`; manifest entries carrying them are tolerated rather than
    /// flagged as mismatched.
    pub fn expected_extension(token: &str) -> Option<&'static str> {
        token.parse::<FormatLabel>().ok().map(FormatLabel::extension)
    }

    /// Render the valid token list for help and error messages.
    pub fn token_list() -> String {
        Self::ALL
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for FormatLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatLabel {
    type Err = FontfetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormatLabel::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| FontfetchError::InvalidFormat(s.to_string()))
    }
}

/// Parse a comma-separated priority list, e.g. `variable-ttf,otf,static-ttf`.
pub fn parse_priorities(value: &str) -> FetchResult<Vec<FormatLabel>> {
    let labels = value
        .split(',')
        .map(|p| p.trim().parse::<FormatLabel>())
        .collect::<FetchResult<Vec<_>>>()?;
    if labels.is_empty() {
        return Err(FontfetchError::InvalidFormat(value.to_string()));
    }
    Ok(labels)
}

//! Marker-driven extraction of diagnostics from tool output
//!
//! Each `ErrorMarker` names a literal phrase the tool prints for a known failure
//! and how to carve the interesting fragment out of the surrounding text. Markers
//! are plain data, so new tool phrasings can be added through configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How to cut the relevant fragment once a marker has been found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionShape {
    /// Rest of the marker's line
    ToNextNewline,
    /// The line following the next `--` after the marker (an echoed flag name)
    TokenAfterDoubleDash,
    /// Like `TokenAfterDoubleDash`, split once on the first space into name and value
    NameValuePair,
}

/// A known diagnostic phrase, tagged with what it means to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMarker<T> {
    pub text: String,
    pub shape: ExtractionShape,
    pub tag: T,
    /// Start a `ToNextNewline` fragment at the marker itself rather than after it
    #[serde(default)]
    pub keep_marker: bool,
}

impl<T> ErrorMarker<T> {
    pub fn new(text: impl Into<String>, shape: ExtractionShape, tag: T) -> Self {
        Self {
            text: text.into(),
            shape,
            tag,
            keep_marker: false,
        }
    }

    /// Include the marker text in a `ToNextNewline` fragment
    pub fn keep_marker(mut self) -> Self {
        self.keep_marker = true;
        self
    }

    fn carve(&self, text: &str, at: usize) -> Option<Fragment> {
        let after = at + self.text.len();
        match self.shape {
            ExtractionShape::ToNextNewline => {
                let from = if self.keep_marker { at } else { after };
                Some(Fragment::Text(line_from(text, from)))
            }
            ExtractionShape::TokenAfterDoubleDash => {
                token_after_dashes(text, after).map(Fragment::Text)
            }
            ExtractionShape::NameValuePair => {
                let token = token_after_dashes(text, after)?;
                let (name, value) = token.split_once(' ').unwrap_or((token.as_str(), ""));
                Some(Fragment::Pair {
                    name: name.trim().to_string(),
                    value: value.trim().to_string(),
                })
            }
        }
    }
}

/// Text carved out of tool output by a marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    Pair { name: String, value: String },
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fragment::Text(text) => write!(f, "{}", text),
            Fragment::Pair { name, value } => write!(f, "{} {}", name, value),
        }
    }
}

/// The first marker that matched, with its fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction<'m, T> {
    pub marker: &'m ErrorMarker<T>,
    pub fragment: Fragment,
}

impl<T> Extraction<'_, T> {
    pub fn tag(&self) -> &T {
        &self.marker.tag
    }
}

/// Try `markers` in order against `text`; the first one found (and whose shape
/// can be satisfied) wins
pub fn extract<'m, T>(text: &str, markers: &'m [ErrorMarker<T>]) -> Option<Extraction<'m, T>> {
    markers.iter().find_map(|marker| {
        if marker.text.is_empty() {
            return None;
        }
        let at = text.find(marker.text.as_str())?;
        let fragment = marker.carve(text, at)?;
        Some(Extraction { marker, fragment })
    })
}

/// Text from byte offset `from` up to the next line break, trimmed
fn line_from(text: &str, from: usize) -> String {
    let rest = &text[from..];
    let end = rest.find('\n').unwrap_or(rest.len());
    rest[..end].trim().to_string()
}

fn token_after_dashes(text: &str, from: usize) -> Option<String> {
    let offset = text[from..].find("--")?;
    Some(line_from(text, from + offset + "--".len()))
}

//! Template records built from the tool's listing

use crate::parse::{parse_table, TableRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Listing columns, in the order the tool prints them
const NAME_COLUMN: usize = 0;
const SHORT_NAME_COLUMN: usize = 1;
const LANGUAGES_COLUMN: usize = 2;
const TAGS_COLUMN: usize = 3;

/// An installed template, keyed in a catalog by its short name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateInfo {
    pub name: String,
    pub languages: String,
    pub tags: String,
}

impl TemplateInfo {
    /// Build `(short name, info)` from a listing row; rows without a short name are skipped
    pub fn from_record(record: &TableRecord) -> Option<(String, TemplateInfo)> {
        let column = |index| record.value(index).unwrap_or_default().to_string();

        let short_name = column(SHORT_NAME_COLUMN);
        if short_name.is_empty() {
            return None;
        }
        Some((
            short_name,
            TemplateInfo {
                name: column(NAME_COLUMN),
                languages: column(LANGUAGES_COLUMN),
                tags: column(TAGS_COLUMN),
            },
        ))
    }
}

impl fmt::Display for TemplateInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[name={},languages={},tags={}]",
            self.name, self.languages, self.tags
        )
    }
}

/// Templates keyed by short name
pub type TemplateCatalog = BTreeMap<String, TemplateInfo>;

/// Parse `<tool> new --list` output into a catalog
pub fn catalog_from_listing(text: &str) -> TemplateCatalog {
    parse_table(text)
        .iter()
        .filter_map(TemplateInfo::from_record)
        .collect()
}

/// Templates in `from` whose short name is absent from `minus`
pub fn difference(from: &TemplateCatalog, minus: &TemplateCatalog) -> TemplateCatalog {
    from.iter()
        .filter(|(key, _)| !minus.contains_key(*key))
        .map(|(key, info)| (key.clone(), info.clone()))
        .collect()
}

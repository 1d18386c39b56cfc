//! Fixed-width table parsing for human-oriented CLI listings
//!
//! Column geometry is derived from the table itself: either from a rule row of
//! dashes (`-----  ----`) or, when there is none, from a header whose titles are
//! separated by runs of two or more spaces. Data rows are then sliced at those
//! character offsets, so cells may contain single or repeated spaces freely.

/// Minimum run of spaces that separates two header cells
const COLUMN_GAP: usize = 2;

/// A single column: title and the character offset where it starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub title: String,
    pub start: usize,
}

/// Ordered column geometry for one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    columns: Vec<Column>,
}

impl TableLayout {
    /// Derive columns from a header line whose titles are separated by 2+ spaces
    pub fn from_header(header: &str) -> Self {
        let columns = cell_spans(header)
            .into_iter()
            .map(|(start, title)| Column { title, start })
            .collect();
        Self { columns }
    }

    /// Derive columns from a dash rule, taking titles from `titles` at the same offsets
    ///
    /// Without a title line, columns are named `column1`, `column2`, ...
    pub fn from_rule(rule: &str, titles: Option<&str>) -> Self {
        let starts: Vec<usize> = cell_spans(rule).into_iter().map(|(start, _)| start).collect();
        let mut layout = Self {
            columns: starts
                .iter()
                .enumerate()
                .map(|(i, &start)| Column {
                    title: format!("column{}", i + 1),
                    start,
                })
                .collect(),
        };
        if let Some(line) = titles {
            let chars: Vec<char> = line.chars().collect();
            for i in 0..layout.columns.len() {
                let title = layout.slice(&chars, i);
                if !title.is_empty() {
                    layout.columns[i].title = title;
                }
            }
        }
        layout
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Slice one data row into a record
    pub fn record(&self, line: &str) -> TableRecord {
        let chars: Vec<char> = line.chars().collect();
        let fields = (0..self.columns.len())
            .map(|i| (self.columns[i].title.clone(), self.slice(&chars, i)))
            .collect();
        TableRecord { fields }
    }

    /// Cell text of column `index`: from its start to the next column's start,
    /// the last column running to end of line. Short rows yield empty cells.
    fn slice(&self, chars: &[char], index: usize) -> String {
        let start = self.columns[index].start;
        if start >= chars.len() {
            return String::new();
        }
        let end = self
            .columns
            .get(index + 1)
            .map_or(chars.len(), |next| next.start.min(chars.len()));
        chars[start..end].iter().collect::<String>().trim().to_string()
    }
}

/// One data row, keyed by column title in column order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRecord {
    fields: Vec<(String, String)>,
}

impl TableRecord {
    /// Value of the first column titled `title`
    pub fn get(&self, title: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == title)
            .map(|(_, value)| value.as_str())
    }

    /// Value of the column at `index`
    pub fn value(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Parse a column-aligned listing into one record per data row
pub fn parse(text: &str) -> Vec<TableRecord> {
    let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();

    let (layout, rows) = match lines.iter().position(|line| is_rule(line)) {
        Some(idx) => {
            let titles = idx.checked_sub(1).map(|i| lines[i]);
            (TableLayout::from_rule(lines[idx], titles), &lines[idx + 1..])
        }
        None => match lines.split_first() {
            Some((header, rows)) => (TableLayout::from_header(header), rows),
            None => return Vec::new(),
        },
    };

    if layout.is_empty() {
        return Vec::new();
    }
    rows.iter().map(|line| layout.record(line)).collect()
}

/// A rule row consists only of dashes and spaces, with at least one dash
fn is_rule(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && line.chars().all(|c| c == '-' || c == ' ')
}

/// Split a line into `(char offset, text)` cells separated by 2+ spaces
fn cell_spans(line: &str) -> Vec<(usize, String)> {
    let mut spans = Vec::new();
    let mut current: Option<(usize, String)> = None;
    let mut spaces = 0;

    for (offset, c) in line.trim_end().chars().enumerate() {
        if c.is_whitespace() {
            spaces += 1;
            continue;
        }
        if spaces >= COLUMN_GAP {
            if let Some(cell) = current.take() {
                spans.push(cell);
            }
        }
        match current.as_mut() {
            Some((_, text)) => {
                // Single spaces belong to the title ("Template Name").
                for _ in 0..spaces {
                    text.push(' ');
                }
                text.push(c);
            }
            None => current = Some((offset, c.to_string())),
        }
        spaces = 0;
    }
    spans.extend(current);
    spans
}

//! Columnar storage for loaded tables.
//!
//! A `Table` holds one `Column` per header. Integer and dictionary-coded
//! string columns store `i32` values; only the terminal column of a row may
//! hold free text (`RawString`), which is never range-queried.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

/// Storage kind a column finalizes to after type sniffing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    StringCode,
    RawString,
}

/// Running min/max over committed values. Valid only for `Integer` and
/// `StringCode` columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnStats {
    pub min: i32,
    pub max: i32,
}

impl ColumnStats {
    fn empty() -> Self {
        Self {
            min: i32::MAX,
            max: i32::MIN,
        }
    }

    fn observe(&mut self, v: i32) {
        self.min = self.min.min(v);
        self.max = self.max.max(v);
    }
}

#[derive(Debug)]
pub struct Column {
    kind: ColumnKind,
    ints: Vec<i32>,
    texts: Vec<String>,
    stats: ColumnStats,
    /// code -> original string, in first-seen order.
    dict: Vec<String>,
    codes: HashMap<String, i32>,
}

impl Column {
    pub fn new(kind: ColumnKind) -> Self {
        Self {
            kind,
            ints: Vec::new(),
            texts: Vec::new(),
            stats: ColumnStats::empty(),
            dict: Vec::new(),
            codes: HashMap::new(),
        }
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        match self.kind {
            ColumnKind::Integer | ColumnKind::StringCode => self.ints.len(),
            ColumnKind::RawString => self.texts.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> ColumnStats {
        self.stats
    }

    /// Number of distinct values a StringCode column has seen.
    pub fn dict_len(&self) -> usize {
        self.dict.len()
    }

    pub fn push_int(&mut self, v: i32) {
        debug_assert_eq!(self.kind, ColumnKind::Integer);
        self.ints.push(v);
        self.stats.observe(v);
    }

    /// Commit a string value, assigning the next sequential code on first
    /// sight. Codes are never reused or reassigned.
    pub fn push_code(&mut self, value: &str) -> i32 {
        debug_assert_eq!(self.kind, ColumnKind::StringCode);
        let code = match self.codes.get(value) {
            Some(&code) => code,
            None => {
                let code = self.dict.len() as i32;
                self.dict.push(value.to_string());
                self.codes.insert(value.to_string(), code);
                code
            }
        };
        self.ints.push(code);
        self.stats.observe(code);
        code
    }

    pub fn push_text(&mut self, value: &str) {
        debug_assert_eq!(self.kind, ColumnKind::RawString);
        self.texts.push(value.to_string());
    }

    /// Raw numeric value at `row` (the stored integer or dictionary code).
    /// RawString columns have no numeric value and report 0.
    pub fn value(&self, row: usize) -> i32 {
        match self.kind {
            ColumnKind::Integer | ColumnKind::StringCode => self.ints[row],
            ColumnKind::RawString => 0,
        }
    }

    /// Decode a dictionary code back to its original string.
    pub fn decode(&self, code: i32) -> Option<&str> {
        self.dict.get(code as usize).map(String::as_str)
    }

    /// Display text for the cell at `row`, decoding StringCode columns
    /// through their dictionary.
    pub fn cell_text(&self, row: usize) -> String {
        match self.kind {
            ColumnKind::Integer => self.ints[row].to_string(),
            ColumnKind::StringCode => self
                .decode(self.ints[row])
                .unwrap_or_default()
                .to_string(),
            ColumnKind::RawString => self.texts[row].clone(),
        }
    }
}

/// One loaded table: ordered headers plus one column per header. Created
/// once per load and replaced wholesale on reload.
#[derive(Default, Debug)]
pub struct Table {
    headers: Vec<String>,
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_headers(&mut self, headers: Vec<String>) {
        self.headers = headers;
    }

    pub fn set_columns(&mut self, columns: Vec<Column>) {
        self.columns = columns;
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, idx: usize) -> &Column {
        &self.columns[idx]
    }

    pub fn column_mut(&mut self, idx: usize) -> &mut Column {
        &mut self.columns[idx]
    }

    // Columns only exist once the loader's sample window has closed, so a
    // header can momentarily outnumber them mid-load.
    pub fn column_by_name(&self, name: &str) -> Option<(usize, &Column)> {
        let idx = self.headers.iter().position(|h| h == name)?;
        let col = self.columns.get(idx)?;
        Some((idx, col))
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Marks one whole row as committed. The loader appends to every column
    /// first, so readers never observe a partial row.
    pub fn commit_row(&mut self) {
        self.rows += 1;
        debug_assert!(self.columns.iter().all(|c| c.len() == self.rows));
    }

    pub fn cell_text(&self, row: usize, col: usize) -> String {
        self.columns[col].cell_text(row)
    }
}

/// Shared handle letting the view and renderer read a table the loader is
/// still appending to.
pub type SharedTable = Arc<RwLock<Table>>;

pub fn shared_table() -> SharedTable {
    Arc::new(RwLock::new(Table::new()))
}

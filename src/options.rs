// CSV parse options and their cache fingerprint.

use serde::{Deserialize, Serialize};

/// Options controlling how a downloaded CSV file is parsed.
///
/// The full option set is fingerprinted into the file cache alongside the
/// parsed table: a cached entry is only reused when a later load carries an
/// identical option set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Field delimiter byte.
    pub delimiter: u8,
    /// Whether the first record is a header row.
    pub has_headers: bool,
    /// Trim whitespace around fields and headers.
    pub trim: bool,
    /// Permit records with differing field counts.
    pub flexible: bool,
    /// Keep only the named columns; requires a header row.
    pub columns: Option<Vec<String>>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_headers: true,
            trim: false,
            flexible: false,
            columns: None,
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn has_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    pub fn trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    pub fn flexible(mut self, flexible: bool) -> Self {
        self.flexible = flexible;
        self
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Canonical representation of the full option set.
    ///
    /// Field order is fixed, so two option sets fingerprint equal exactly
    /// when they are value-equal.
    pub fn fingerprint(&self) -> String {
        let columns = match &self.columns {
            Some(cols) => format!("[{}]", cols.join(",")),
            None => "*".to_string(),
        };
        format!(
            "d={};h={};t={};f={};c={}",
            self.delimiter, self.has_headers, self.trim, self.flexible, columns
        )
    }
}

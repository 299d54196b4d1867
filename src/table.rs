// In-memory tabular value parsed from CSV.

use std::io::Write;

use csv::{ReaderBuilder, Trim, WriterBuilder};

use crate::error::{QuarryError, Result};
use crate::options::LoadOptions;

/// An owned table of string cells with optional header names.
///
/// Values handed out by the cache are clones of this type, so callers can
/// never mutate cache-owned state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Parse CSV text with the given options.
    pub fn from_csv(data: &str, options: &LoadOptions) -> Result<Self> {
        let trim = if options.trim { Trim::All } else { Trim::None };
        let mut reader = ReaderBuilder::new()
            .delimiter(options.delimiter)
            .has_headers(options.has_headers)
            .flexible(options.flexible)
            .trim(trim)
            .from_reader(data.as_bytes());

        let headers = if options.has_headers {
            reader.headers()?.iter().map(str::to_string).collect()
        } else {
            Vec::new()
        };

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        let table = Self { headers, rows };
        match &options.columns {
            Some(columns) => table.select(columns),
            None => Ok(table),
        }
    }

    /// Header names; empty when parsed without a header row.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        if self.headers.is_empty() {
            self.rows.first().map(Vec::len).unwrap_or(0)
        } else {
            self.headers.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell values of one named column.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.headers.iter().position(|h| h == name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }

    /// Reduce to the named columns, preserving the requested order.
    fn select(&self, columns: &[String]) -> Result<Self> {
        if self.headers.is_empty() {
            return Err(QuarryError::Other(
                "column selection requires a header row".to_string(),
            ));
        }

        let mut indices = Vec::with_capacity(columns.len());
        for name in columns {
            let idx = self
                .headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| QuarryError::Other(format!("no column named {:?}", name)))?;
            indices.push(idx);
        }

        let rows = self
            .rows
            .iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|&i| row.get(i).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();

        Ok(Self {
            headers: columns.to_vec(),
            rows,
        })
    }

    /// Write the table as CSV.
    pub fn write_csv<W: Write>(&self, writer: W, delimiter: u8) -> Result<()> {
        let mut out = WriterBuilder::new().delimiter(delimiter).from_writer(writer);
        if !self.headers.is_empty() {
            out.write_record(&self.headers)?;
        }
        for row in &self.rows {
            out.write_record(row)?;
        }
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "name,age,city\nalice,30,denver\nbob,25,boulder\n";

    #[test]
    fn test_parse_with_headers() {
        let table = Table::from_csv(SAMPLE, &LoadOptions::default()).unwrap();
        assert_eq!(table.headers(), ["name", "age", "city"]);
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.num_columns(), 3);
        assert_eq!(table.rows()[1], ["bob", "25", "boulder"]);
    }

    #[test]
    fn test_parse_without_headers() {
        let options = LoadOptions::new().has_headers(false);
        let table = Table::from_csv("1,2\n3,4\n", &options).unwrap();
        assert!(table.headers().is_empty());
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.num_columns(), 2);
    }

    #[test]
    fn test_parse_with_delimiter_and_trim() {
        let options = LoadOptions::new().delimiter(b';').trim(true);
        let table = Table::from_csv("a; b\n 1 ;2\n", &options).unwrap();
        assert_eq!(table.headers(), ["a", "b"]);
        assert_eq!(table.rows()[0], ["1", "2"]);
    }

    #[test]
    fn test_column_selection() {
        let options = LoadOptions::new().columns(["city", "name"]);
        let table = Table::from_csv(SAMPLE, &options).unwrap();
        assert_eq!(table.headers(), ["city", "name"]);
        assert_eq!(table.rows()[0], ["denver", "alice"]);
    }

    #[test]
    fn test_column_selection_unknown_name() {
        let options = LoadOptions::new().columns(["nope"]);
        assert!(Table::from_csv(SAMPLE, &options).is_err());
    }

    #[test]
    fn test_column_selection_without_headers() {
        let options = LoadOptions::new().has_headers(false).columns(["a"]);
        assert!(Table::from_csv("1,2\n", &options).is_err());
    }

    #[test]
    fn test_column_accessor() {
        let table = Table::from_csv(SAMPLE, &LoadOptions::default()).unwrap();
        assert_eq!(table.column("age").unwrap(), ["30", "25"]);
        assert!(table.column("nope").is_none());
    }

    #[test]
    fn test_write_round_trip() {
        let table = Table::from_csv(SAMPLE, &LoadOptions::default()).unwrap();
        let mut buf = Vec::new();
        table.write_csv(&mut buf, b',').unwrap();
        let text = String::from_utf8(buf).unwrap();
        let reparsed = Table::from_csv(&text, &LoadOptions::default()).unwrap();
        assert_eq!(reparsed, table);
    }
}

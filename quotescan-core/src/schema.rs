//! Declared column shape for the download endpoint's CSV payload.
//!
//! The shape is fixed by the service: seven columns, header row first.
//! It is read off the first window's fetch request and reused as the
//! declared output shape for the whole query; later windows must conform.

use crate::error::QuoteError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Date,
    Float64,
    Int128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    columns: Vec<Column>,
}

impl TableSchema {
    /// The canonical historical-quote shape.
    pub fn quotes() -> Self {
        TableSchema {
            columns: vec![
                Column { name: "Date", kind: ColumnKind::Date },
                Column { name: "Open", kind: ColumnKind::Float64 },
                Column { name: "High", kind: ColumnKind::Float64 },
                Column { name: "Low", kind: ColumnKind::Float64 },
                Column { name: "Close", kind: ColumnKind::Float64 },
                Column { name: "Adj Close", kind: ColumnKind::Float64 },
                Column { name: "Volume", kind: ColumnKind::Int128 },
            ],
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Check that a CSV header row names the declared columns, in order.
    ///
    /// A mismatch means the remote payload drifted from the declared shape
    /// and the window's fetch fails.
    pub fn validate_header<'a, I>(&self, names: I) -> Result<(), QuoteError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut count = 0;
        for (i, name) in names.into_iter().enumerate() {
            match self.columns.get(i) {
                Some(col) if col.name == name => count += 1,
                Some(col) => {
                    return Err(QuoteError::SchemaMismatch {
                        expected: format!("column '{}'", col.name),
                        actual: format!("column '{name}'"),
                    })
                }
                None => {
                    return Err(QuoteError::SchemaMismatch {
                        expected: format!("{} columns", self.columns.len()),
                        actual: format!("at least {} columns", i + 1),
                    })
                }
            }
        }
        if count < self.columns.len() {
            return Err(QuoteError::SchemaMismatch {
                expected: format!("{} columns", self.columns.len()),
                actual: format!("{count} columns"),
            });
        }
        Ok(())
    }
}

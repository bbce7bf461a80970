use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tabular statement result: ordered column names plus rows of JSON values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row. Short rows are padded with nulls and long rows truncated
    /// so every row matches the column count.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Case-insensitive column lookup.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.eq_ignore_ascii_case(name))
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)
    }

    pub fn first_value(&self, column: &str) -> Option<&Value> {
        self.value(0, column)
    }

    /// First row's value in `column` when it is a string.
    pub fn first_text(&self, column: &str) -> Option<&str> {
        self.first_value(column).and_then(Value::as_str)
    }

    /// Returns a new result keeping only `columns`, in the requested order.
    ///
    /// On failure returns the first requested column that does not exist.
    pub fn project(&self, columns: &[String]) -> Result<ResultSet, String> {
        let indices = columns
            .iter()
            .map(|name| self.column_index(name).ok_or_else(|| name.clone()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ResultSet {
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        })
    }

    /// Rows as JSON objects keyed by column name.
    pub fn to_records(&self) -> Vec<serde_json::Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }
}

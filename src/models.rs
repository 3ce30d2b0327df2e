use serde::{Deserialize, Serialize};

use crate::error::RowShapeError;

/// Field positions for one relation, fixed before any row is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordLayout {
    /// Index of the join-key column.
    pub key: usize,
    /// Index of the filter column, when this relation carries one.
    pub filter: Option<usize>,
}

impl RecordLayout {
    pub fn keyed(key: usize) -> Self {
        Self { key, filter: None }
    }

    pub fn with_filter(key: usize, filter: usize) -> Self {
        Self {
            key,
            filter: Some(filter),
        }
    }

    fn max_index(&self) -> usize {
        self.filter.map_or(self.key, |f| f.max(self.key))
    }
}

/// One row of a relation with its field layout fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: Vec<String>,
    layout: RecordLayout,
}

impl Record {
    /// Builds a record, rejecting rows too short for the declared layout.
    pub fn new(fields: Vec<String>, layout: RecordLayout) -> Result<Self, RowShapeError> {
        let needed = layout.max_index() + 1;
        if fields.len() < needed {
            return Err(RowShapeError {
                needed,
                found: fields.len(),
            });
        }
        Ok(Self { fields, layout })
    }

    /// Raw (un-normalized) join-key field.
    pub fn join_key(&self) -> &str {
        &self.fields[self.layout.key]
    }

    /// Filter field value, for relations whose layout declares one.
    pub fn filter_field(&self) -> Option<&str> {
        self.layout.filter.map(|i| self.fields[i].as_str())
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

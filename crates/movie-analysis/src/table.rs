//! Typed tables of records.
//!
//! A `Table<R>` is an ordered list of rows sharing one schema. The
//! column-oriented view (`columns`, `column`) goes through each row's serde
//! representation, so column names are the serialized field names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{HarvestError, HarvestResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table<R> {
    rows: Vec<R>,
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<R> Table<R> {
    pub fn new(rows: Vec<R>) -> Self {
        Self { rows }
    }

    /// A table holding exactly one row.
    pub fn single(row: R) -> Self {
        Self { rows: vec![row] }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.rows.iter()
    }

    /// New table from every row for which `f` returns `Some`, in order.
    pub fn filter_map<T, F>(&self, f: F) -> Table<T>
    where
        F: FnMut(&R) -> Option<T>,
    {
        Table::new(self.rows.iter().filter_map(f).collect())
    }
}

impl<R> FromIterator<R> for Table<R> {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a, R> IntoIterator for &'a Table<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl<R: Serialize> Table<R> {
    /// Column name → values, one value per row. A column missing from some
    /// rows is padded with `null` for those rows.
    pub fn columns(&self) -> HarvestResult<BTreeMap<String, Vec<Value>>> {
        let objects = self.objects()?;
        let mut columns: BTreeMap<String, Vec<Value>> = BTreeMap::new();

        for object in &objects {
            for key in object.keys() {
                columns.entry(key.clone()).or_default();
            }
        }
        for (name, values) in columns.iter_mut() {
            for object in &objects {
                values.push(object.get(name).cloned().unwrap_or(Value::Null));
            }
        }

        Ok(columns)
    }

    /// Values of a single column. Every row must carry it.
    pub fn column(&self, name: &str) -> HarvestResult<Vec<Value>> {
        self.objects()?
            .into_iter()
            .enumerate()
            .map(|(i, mut object)| {
                object.remove(name).ok_or_else(|| {
                    HarvestError::DataShape(format!("row {i} has no column '{name}'"))
                })
            })
            .collect()
    }

    fn objects(&self) -> HarvestResult<Vec<serde_json::Map<String, Value>>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| match serde_json::to_value(row) {
                Ok(Value::Object(map)) => Ok(map),
                Ok(other) => Err(HarvestError::DataShape(format!(
                    "row {i} is not a record: {other}"
                ))),
                Err(e) => Err(HarvestError::DataShape(format!("row {i}: {e}"))),
            })
            .collect()
    }
}

//! Entry sources: the backend the terminal base stage reads from.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    convert::json_to_value,
    error::QueryError,
    value::{Value, type_name},
};

/// Produces the raw entries a query starts from.
///
/// Called every time a chain computes its results, so implementations
/// should be cheap to call repeatedly or cache internally.
pub trait EntrySource: fmt::Debug + Send + Sync {
    fn entries(&self) -> Result<Vec<Value>, QueryError>;
}

impl EntrySource for Vec<Value> {
    fn entries(&self) -> Result<Vec<Value>, QueryError> {
        Ok(self.clone())
    }
}

/// Reads entries from a JSON file holding an array of objects.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EntrySource for JsonFileSource {
    fn entries(&self) -> Result<Vec<Value>, QueryError> {
        debug!("loading entries from {}", self.path.display());
        let text = fs::read_to_string(&self.path)?;
        parse_entries(&text)
    }
}

/// Parse a JSON document into a list of entries.
///
/// The document must be an array and every element an object.
pub fn parse_entries(text: &str) -> Result<Vec<Value>, QueryError> {
    let json: serde_json::Value = serde_json::from_str(text)?;
    match json_to_value(json) {
        Value::Array(items) => {
            if let Some((idx, item)) = items
                .iter()
                .enumerate()
                .find(|(_, item)| !matches!(item, Value::Object(_)))
            {
                return Err(QueryError::InvalidEntries(format!(
                    "entry {} is {}, expected object",
                    idx,
                    type_name(item)
                )));
            }
            Ok(items)
        }
        other => Err(QueryError::InvalidEntries(format!(
            "expected an array of entries, got {}",
            type_name(&other)
        ))),
    }
}

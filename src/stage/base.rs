use std::sync::Arc;

use tracing::trace;

use crate::{
    error::QueryError,
    options::Options,
    source::EntrySource,
    stage::{Category, Stage, StageRef},
    value::Value,
};

/// Terminal stage: passes every entry of the source through untouched.
#[derive(Debug, Clone)]
pub struct NoFilter {
    source: Arc<dyn EntrySource>,
    options: Options,
}

impl NoFilter {
    pub fn new(source: Arc<dyn EntrySource>) -> Self {
        NoFilter {
            source,
            options: Options::new(),
        }
    }
}

impl Stage for NoFilter {
    fn name(&self) -> &str {
        "NoFilter"
    }

    fn category(&self) -> Category {
        Category::Base
    }

    fn parent(&self) -> Option<&StageRef> {
        None
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn rows(&self) -> Result<Vec<Value>, QueryError> {
        let entries = self.source.entries()?;
        trace!("base stage read {} entries", entries.len());
        Ok(entries)
    }
}

//! # Stages
//!
//! A query is a chain of stages. Every stage wraps its predecessor (its
//! `parent`) and the chain bottoms out in a terminal base stage that reads
//! entries from an [`EntrySource`](crate::EntrySource):
//!
//! ```text
//! GroupBy(priority, column) -> Filter(status = open) -> NoFilter -> source
//! ```
//!
//! Stages are immutable once built and shared through [`StageRef`]. Adding a
//! stage never touches the existing chain; it produces a new head.
//!
//! - **[base]** - the terminal [`NoFilter`] stage
//! - **[filter]** - [`FieldFilter`], an operator/value predicate on one field
//! - **[group_by]** - [`FieldGroupBy`], grouping on the column or row axis
//! - **[ops]** - the operation table behind [`Stage::call`]
pub mod base;
pub mod filter;
pub mod group_by;
pub mod ops;

pub use base::NoFilter;
pub use filter::{FieldFilter, FilterOperator};
pub use group_by::{Axis, FieldGroupBy, Grouping};
pub use ops::Operation;

use std::{fmt, sync::Arc};

use crate::{error::QueryError, options::Options, result::QueryResult, value::Value};

/// Shared handle to an immutable stage.
pub type StageRef = Arc<dyn Stage>;

/// Callback handed through [`Stage::call`] for operations that yield values
/// one at a time.
pub type Callback<'a> = &'a mut dyn FnMut(&Value);

/// Which family a stage belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// The terminal stage every chain starts from
    Base,
    Filter,
    GroupBy,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Base => "base",
            Category::Filter => "filter",
            Category::GroupBy => "group_by",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One layer of a query pipeline.
pub trait Stage: fmt::Debug + Send + Sync {
    /// Registered name, e.g. `Status` or `NoFilter`.
    fn name(&self) -> &str;

    fn category(&self) -> Category;

    /// The stage this one wraps. `None` only for the terminal base.
    fn parent(&self) -> Option<&StageRef>;

    fn options(&self) -> &Options;

    /// Whether this stage may serve as the head of the chain. The builder
    /// unwinds through `parent` until it finds one that does.
    fn is_edge(&self) -> bool {
        true
    }

    /// Entries that survive this stage and everything below it.
    fn rows(&self) -> Result<Vec<Value>, QueryError>;

    /// Grouping contributed by this stage, if any.
    fn grouping(&self) -> Option<&Grouping> {
        None
    }

    /// Materialized output of the chain ending at this stage.
    ///
    /// Groupings are collected from this stage down to the base and nested
    /// rows first, then columns. Within an axis the stage nearest the head
    /// is outermost.
    fn results(&self) -> Result<QueryResult, QueryError> {
        let rows = self.rows()?;
        let mut groupings: Vec<Grouping> = self.grouping().into_iter().cloned().collect();
        let mut cursor = self.parent();
        while let Some(stage) = cursor {
            groupings.extend(stage.grouping().cloned());
            cursor = stage.parent();
        }
        groupings.sort_by_key(|g| g.axis);
        Ok(QueryResult::build(rows, &groupings))
    }

    /// Run a named operation against this stage.
    ///
    /// The default forwards to the [`ops`] table. Stages that add their own
    /// operations match on those first and fall back to [`ops::dispatch`].
    fn call(
        &self,
        operation: &str,
        args: &[Value],
        callback: Option<Callback<'_>>,
    ) -> Result<Value, QueryError> {
        ops::dispatch(self, operation, args, callback)
    }

    /// One-line description used when walking the chain.
    fn label(&self) -> String {
        let mut label = format!("{} {}", self.category(), self.name());
        let options = self.options();
        if !options.is_empty() {
            let rendered: Vec<String> = options
                .sorted_keys()
                .into_iter()
                .map(|key| {
                    let value = options.get(key).map(Value::as_string).unwrap_or_default();
                    format!("{}={}", key, value)
                })
                .collect();
            label.push_str(&format!(" ({})", rendered.join(", ")));
        }
        label
    }
}

/// Iterate a chain from `stage` down to the base.
pub fn ancestry(stage: &StageRef) -> impl Iterator<Item = &StageRef> {
    std::iter::successors(Some(stage), |s| s.parent())
}

/// Entry key a stage reads: the `field` option, or the snake_case form of
/// the stage name.
pub(crate) fn field_for(name: &str, options: &Options) -> String {
    options
        .get_str("field")
        .map(str::to_string)
        .unwrap_or_else(|| crate::registry::snake_case(name))
}

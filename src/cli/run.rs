//! Build a query from CLI input and execute it

use std::{path::PathBuf, sync::Arc};

use tracing::debug;

use super::{CliError, Step};
use crate::{
    CostQuery, EngineConfig, EntrySource, JsonFileSource, Options, QueryResult, Value, WalkOrder,
    convert::value_to_json, result::decimal_to_value, source::parse_entries,
};

/// Everything needed to assemble a query
#[derive(Debug, Clone, Default)]
pub struct QueryInput {
    pub config: EngineConfig,
    /// Entries file; falls back to `config.entries`
    pub entries: Option<PathBuf>,
    /// Raw JSON entries, e.g. read from stdin
    pub input: Option<String>,
    /// Stages, applied in order
    pub steps: Vec<Step>,
}

impl QueryInput {
    fn source(&self) -> Result<Arc<dyn EntrySource>, CliError> {
        if let Some(path) = self.entries.as_ref().or(self.config.entries.as_ref()) {
            return Ok(Arc::new(JsonFileSource::new(path.clone())));
        }
        match &self.input {
            Some(text) => Ok(Arc::new(parse_entries(text)?)),
            None => Err(CliError::NoInput),
        }
    }
}

/// Assemble a [`CostQuery`] with every requested stage applied.
pub fn build_query(input: &QueryInput) -> Result<CostQuery, CliError> {
    let registry = Arc::new(input.config.registry());
    let mut query = CostQuery::new(input.source()?, registry);

    for step in &input.steps {
        match step {
            Step::Filter { name, options } => query.filter(name, options.clone())?,
            Step::Column(name) => query.column(name, Options::new())?,
            Step::Row(name) => query.row(name, Options::new())?,
        };
    }
    debug!("query built with {} steps", input.steps.len());
    Ok(query)
}

/// Run the query and render its results as JSON.
pub fn execute_run(input: &QueryInput) -> Result<serde_json::Value, CliError> {
    let mut query = build_query(input)?;
    let results = query.results()?;
    Ok(results.to_json(input.config.sum_field.as_deref()))
}

/// Describe the chain, one line per stage, indented by depth.
pub fn execute_explain(input: &QueryInput, order: WalkOrder) -> Result<Vec<String>, CliError> {
    let mut query = build_query(input)?;
    let lines = query.walk(order, |stage, depth| {
        Ok(format!("{}{}", "  ".repeat(depth), stage.label()))
    })?;
    Ok(lines)
}

/// Forward `operation` to the head of the chain.
pub fn execute_call(
    input: &QueryInput,
    operation: &str,
    args: &[Value],
) -> Result<serde_json::Value, CliError> {
    let mut query = build_query(input)?;
    let value = query.invoke(operation, args, None)?;
    Ok(value_to_json(&value))
}

/// Group totals as an indented text tree.
pub fn render_totals(
    query: &mut CostQuery,
    sum_field: Option<&str>,
) -> Result<Vec<String>, CliError> {
    let lines = query
        .walker()
        .reduce(|node: &QueryResult, key: Option<&Value>, children: Vec<Vec<String>>| {
            let label = key.map_or_else(|| "total".to_string(), Value::as_string);
            let mut line = format!("{}: {} entries", label, node.count());
            if let Some(field) = sum_field {
                let sum = decimal_to_value(node.sum(field));
                line.push_str(&format!(", {} {}", field, sum.as_string()));
            }

            let mut lines = vec![line];
            for child in children.into_iter().flatten() {
                lines.push(format!("  {}", child));
            }
            lines
        })?;
    Ok(lines)
}

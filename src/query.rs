use std::sync::Arc;

use tracing::{debug, trace};

use crate::{
    error::QueryError,
    options::Options,
    registry::{StageFactory, StageRegistry},
    result::QueryResult,
    source::EntrySource,
    stage::{Callback, Category, NoFilter, Stage, StageRef},
    value::Value,
    walker::{WalkOrder, Walker},
};

/// Builds a cost report by layering filter and group-by stages.
///
/// The query holds a single reference to the head of its chain. Every
/// `filter`/`group_by`/`column`/`row` call wraps that head in a new stage,
/// then re-resolves it: the builder follows `parent` links until it reaches
/// a stage whose [`Stage::is_edge`] holds. Operations the builder does not
/// know are forwarded to that stage through [`CostQuery::invoke`].
///
/// A query is a single-session builder and is not meant to be shared across
/// threads while it is being mutated. The stages it hands out are.
///
/// # Examples
///
/// ```
/// use cost_query::{CostQuery, Options, StageRegistry, Value};
/// use std::{collections::HashMap, sync::Arc};
///
/// let entry = |status: &str, priority: &str| {
///     let mut map = HashMap::new();
///     map.insert("status".to_string(), Value::from(status));
///     map.insert("priority".to_string(), Value::from(priority));
///     Value::Object(map)
/// };
/// let entries = vec![entry("open", "high"), entry("closed", "low"), entry("open", "low")];
///
/// let registry = StageRegistry::with_fields(["status", "priority"]);
/// let mut query = CostQuery::new(Arc::new(entries), Arc::new(registry));
///
/// query.filter("Status", Options::new().with("value", "open")).unwrap();
/// query.column("Priority", Options::new()).unwrap();
///
/// let results = query.results().unwrap();
/// assert_eq!(results.count(), 2);
/// assert_eq!(results.groups().len(), 2);
/// ```
#[derive(Debug)]
pub struct CostQuery {
    source: Arc<dyn EntrySource>,
    registry: Arc<StageRegistry>,
    /// Head of the chain; unset until first access.
    chain: Option<StageRef>,
    /// Cleared whenever `chain` changes.
    walker: Option<Walker>,
}

impl CostQuery {
    pub fn new(source: Arc<dyn EntrySource>, registry: Arc<StageRegistry>) -> Self {
        CostQuery {
            source,
            registry,
            chain: None,
            walker: None,
        }
    }

    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    /// Entry fields this query's registry accepts.
    pub fn accepted_properties(&self) -> &[String] {
        self.registry.accepted_properties()
    }

    /// The resolved head of the chain, installing the base stage on first
    /// use. Calling it again without adding a stage returns the same `Arc`.
    pub fn chain(&mut self) -> StageRef {
        let head = match &self.chain {
            Some(head) => head.clone(),
            None => {
                debug!("installing base stage");
                Arc::new(NoFilter::new(self.source.clone()))
            }
        };
        self.install(head)
    }

    /// Wrap the current head in a stage built by `factory` and return the
    /// re-resolved head.
    pub fn chain_with(
        &mut self,
        factory: &StageFactory,
        options: Options,
    ) -> Result<StageRef, QueryError> {
        let parent = self.chain();
        let stage = factory(parent, options)?;
        debug!("added {}", stage.label());
        Ok(self.install(stage))
    }

    pub fn filter(&mut self, name: &str, options: Options) -> Result<StageRef, QueryError> {
        self.add_chain(Category::Filter, name, options)
    }

    /// Add a grouping. `type` defaults to `column` unless the caller set it.
    pub fn group_by(&mut self, name: &str, options: Options) -> Result<StageRef, QueryError> {
        let options = options.reverse_merge(Options::new().with("type", "column"));
        self.add_chain(Category::GroupBy, name, options)
    }

    /// Group on the column axis, whatever `type` the caller passed.
    pub fn column(&mut self, name: &str, options: Options) -> Result<StageRef, QueryError> {
        self.group_by(name, options.merge(Options::new().with("type", "column")))
    }

    /// Group on the row axis, whatever `type` the caller passed.
    pub fn row(&mut self, name: &str, options: Options) -> Result<StageRef, QueryError> {
        self.group_by(name, options.merge(Options::new().with("type", "row")))
    }

    pub fn results(&mut self) -> Result<QueryResult, QueryError> {
        self.chain().results()
    }

    /// Walker over the resolved chain, rebuilt if the chain changed since
    /// the last call.
    pub fn walker(&mut self) -> &Walker {
        let head = self.chain();
        self.walker.get_or_insert_with(|| {
            debug!("rebuilding walker");
            Walker::new(head)
        })
    }

    /// See [`Walker::walk`].
    pub fn walk<T, F>(&mut self, order: WalkOrder, f: F) -> Result<Vec<T>, QueryError>
    where
        F: FnMut(&dyn Stage, usize) -> Result<T, QueryError>,
    {
        self.walker().walk(order, f)
    }

    /// Forward an operation the builder does not implement to the head of
    /// the chain. Arguments, callback and errors pass through untouched.
    pub fn invoke(
        &mut self,
        operation: &str,
        args: &[Value],
        callback: Option<Callback<'_>>,
    ) -> Result<Value, QueryError> {
        trace!("forwarding '{}' to the chain", operation);
        self.chain().call(operation, args, callback)
    }

    fn add_chain(
        &mut self,
        category: Category,
        name: &str,
        options: Options,
    ) -> Result<StageRef, QueryError> {
        let factory = self.registry.resolve(category, name)?;
        self.chain_with(&factory, options)
    }

    /// Make `head` current after unwinding it to the nearest edge. Drops the
    /// cached walker if that changes what `chain` points at.
    fn install(&mut self, head: StageRef) -> StageRef {
        let resolved = resolve_edge(head);
        let changed = self
            .chain
            .as_ref()
            .is_none_or(|current| !Arc::ptr_eq(current, &resolved));
        if changed {
            self.walker = None;
            self.chain = Some(resolved.clone());
        }
        resolved
    }
}

/// Follow `parent` from `stage` until a stage reports itself as the edge.
/// A stage with no parent ends the search.
fn resolve_edge(mut stage: StageRef) -> StageRef {
    while !stage.is_edge() {
        let Some(parent) = stage.parent().cloned() else {
            break;
        };
        trace!("{} is not an edge, moving to {}", stage.name(), parent.name());
        stage = parent;
    }
    stage
}

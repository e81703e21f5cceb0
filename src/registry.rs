//! Name-to-constructor resolution for stages.
//!
//! Names are canonicalized to CamelCase before lookup, so `cost_type`,
//! `cost-type` and `CostType` all find the same entry. Lookups of unknown
//! names fail immediately; new constructors can be registered at any time
//! before the registry is handed to a query.

use std::{collections::HashMap, fmt, sync::Arc};

use crate::{
    error::QueryError,
    options::Options,
    stage::{Category, FieldFilter, FieldGroupBy, StageRef},
};

/// Builds a stage on top of the given parent.
pub type StageFactory =
    Arc<dyn Fn(StageRef, Options) -> Result<StageRef, QueryError> + Send + Sync>;

#[derive(Default, Clone)]
pub struct StageRegistry {
    factories: HashMap<(Category, String), StageFactory>,
    /// Entry fields stages may read, in registration order.
    accepted_properties: Vec<String>,
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with one filter and one group-by per entry field.
    pub fn with_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::new();
        for field in fields {
            registry.register_field(field.as_ref());
        }
        registry
    }

    /// Register a constructor. Returns the one it replaced, if any.
    pub fn register<F>(&mut self, category: Category, name: &str, factory: F) -> Option<StageFactory>
    where
        F: Fn(StageRef, Options) -> Result<StageRef, QueryError> + Send + Sync + 'static,
    {
        self.factories
            .insert((category, camel_case(name)), Arc::new(factory))
    }

    /// Register a [`FieldFilter`] and a [`FieldGroupBy`] reading `field`.
    pub fn register_field(&mut self, field: &str) {
        self.accept_property(field);
        let name = camel_case(field);
        let field = field.to_string();

        let filter_name = name.clone();
        let filter_field = field.clone();
        self.register(Category::Filter, &name, move |parent, options| {
            let options = options.reverse_merge(Options::new().with("field", filter_field.as_str()));
            Ok(Arc::new(FieldFilter::new(filter_name.as_str(), parent, options)?) as StageRef)
        });

        let group_name = name.clone();
        self.register(Category::GroupBy, &name, move |parent, options| {
            let options = options.reverse_merge(Options::new().with("field", field.as_str()));
            Ok(Arc::new(FieldGroupBy::new(group_name.as_str(), parent, options)?) as StageRef)
        });
    }

    /// Record `property` as an entry field queries may use. Repeats are
    /// ignored.
    pub fn accept_property(&mut self, property: &str) {
        if !self.accepted_properties.iter().any(|p| p == property) {
            self.accepted_properties.push(property.to_string());
        }
    }

    pub fn accepted_properties(&self) -> &[String] {
        &self.accepted_properties
    }

    pub fn resolve(&self, category: Category, name: &str) -> Result<StageFactory, QueryError> {
        self.factories
            .get(&(category, camel_case(name)))
            .cloned()
            .ok_or_else(|| QueryError::UnresolvedStageType {
                category,
                name: name.to_string(),
            })
    }

    pub fn contains(&self, category: Category, name: &str) -> bool {
        self.factories.contains_key(&(category, camel_case(name)))
    }

    /// Registered names in a category, sorted.
    pub fn names(&self, category: Category) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .factories
            .keys()
            .filter(|(c, _)| *c == category)
            .map(|(_, name)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for StageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageRegistry")
            .field("filters", &self.names(Category::Filter))
            .field("group_bys", &self.names(Category::GroupBy))
            .field("accepted_properties", &self.accepted_properties)
            .finish()
    }
}

/// `cost_type` -> `CostType`
pub fn camel_case(name: &str) -> String {
    name.split(['_', '-', ' '])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// `CostType` -> `cost_type`
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for ch in name.chars() {
        if ch == '-' || ch == ' ' || ch == '_' {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
        } else if ch.is_uppercase() {
            if prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit()) {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
        prev = Some(ch);
    }
    out
}

#[test]
fn test_camel_case() {
    assert_eq!(camel_case("cost_type"), "CostType");
    assert_eq!(camel_case("CostType"), "CostType");
    assert_eq!(camel_case("spent-on"), "SpentOn");
    assert_eq!(camel_case("status"), "Status");
}

#[test]
fn test_snake_case() {
    assert_eq!(snake_case("CostType"), "cost_type");
    assert_eq!(snake_case("Status"), "status");
    assert_eq!(snake_case("cost_type"), "cost_type");
    assert_eq!(snake_case("Spent-On"), "spent_on");
}

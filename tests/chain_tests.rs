use cost_query::{
    Category, CostQuery, Options, QueryError, Stage, StageRef, StageRegistry, Value,
    result::QueryResult, stage::Axis,
};
use std::{collections::HashMap, sync::Arc};

fn entry(pairs: Vec<(&str, Value)>) -> Value {
    let mut map = HashMap::new();
    for (k, v) in pairs {
        map.insert(k.to_string(), v);
    }
    Value::Object(map)
}

fn entries() -> Vec<Value> {
    vec![
        entry(vec![
            ("status", "open".into()),
            ("priority", "high".into()),
            ("author", "alice".into()),
            ("costs", Value::Integer(100)),
        ]),
        entry(vec![
            ("status", "open".into()),
            ("priority", "low".into()),
            ("author", "bob".into()),
            ("costs", Value::Integer(50)),
        ]),
        entry(vec![
            ("status", "closed".into()),
            ("priority", "high".into()),
            ("author", "alice".into()),
            ("costs", Value::Integer(150)),
        ]),
        entry(vec![
            ("status", "open".into()),
            ("priority", "high".into()),
            ("author", "carol".into()),
            ("costs", Value::Integer(25)),
        ]),
    ]
}

/// A stage that refuses to be the head of a chain.
#[derive(Debug)]
struct Shadow {
    parent: StageRef,
    options: Options,
}

impl Stage for Shadow {
    fn name(&self) -> &str {
        "Shadow"
    }

    fn category(&self) -> Category {
        Category::Filter
    }

    fn parent(&self) -> Option<&StageRef> {
        Some(&self.parent)
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn is_edge(&self) -> bool {
        false
    }

    fn rows(&self) -> Result<Vec<Value>, QueryError> {
        Ok(Vec::new())
    }
}

fn registry() -> StageRegistry {
    let mut registry = StageRegistry::with_fields(["status", "priority", "author"]);
    registry.register(Category::Filter, "shadow", |parent, options| {
        Ok(Arc::new(Shadow { parent, options }) as StageRef)
    });
    registry
}

fn query() -> CostQuery {
    CostQuery::new(Arc::new(entries()), Arc::new(registry()))
}

fn type_of(stage: &StageRef) -> Option<&str> {
    stage.options().get_str("type")
}

#[test]
fn test_first_access_installs_base() {
    let mut q = query();
    let head = q.chain();

    assert_eq!(head.name(), "NoFilter");
    assert_eq!(head.category(), Category::Base);
    assert!(head.parent().is_none());
    assert_eq!(q.results().unwrap().count(), 4);
}

#[test]
fn test_chain_is_idempotent() {
    let mut q = query();
    q.filter("Status", Options::new().with("value", "open")).unwrap();
    q.column("Priority", Options::new()).unwrap();

    let first = q.chain();
    let second = q.chain();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(first.is_edge());
}

#[test]
fn test_new_stage_becomes_head() {
    let mut q = query();
    let filter = q.filter("Status", Options::new().with("value", "open")).unwrap();

    assert_eq!(filter.name(), "Status");
    assert!(Arc::ptr_eq(&filter, &q.chain()));
    assert_eq!(filter.parent().unwrap().name(), "NoFilter");
}

#[test]
fn test_non_edge_stage_is_unwound() {
    let mut q = query();
    let filter = q.filter("Status", Options::new().with("value", "open")).unwrap();
    let head = q.filter("shadow", Options::new()).unwrap();

    assert!(Arc::ptr_eq(&head, &filter));
    assert!(Arc::ptr_eq(&q.chain(), &filter));
    assert_eq!(q.results().unwrap().count(), 3);
}

#[test]
fn test_group_by_defaults_to_column() {
    let mut q = query();
    let stage = q.group_by("Priority", Options::new()).unwrap();
    assert_eq!(type_of(&stage), Some("column"));
    assert_eq!(stage.grouping().unwrap().axis, Axis::Column);
}

#[test]
fn test_group_by_keeps_caller_type() {
    let mut q = query();
    let stage = q.group_by("Priority", Options::new().with("type", "row")).unwrap();
    assert_eq!(type_of(&stage), Some("row"));
}

#[test]
fn test_column_overrides_caller_type() {
    let mut q = query();
    let stage = q.column("Priority", Options::new().with("type", "row")).unwrap();
    assert_eq!(type_of(&stage), Some("column"));
    assert_eq!(stage.grouping().unwrap().axis, Axis::Column);
}

#[test]
fn test_row_overrides_caller_type() {
    let mut q = query();
    q.row("Author", Options::new()).unwrap();
    let stage = q.row("Author", Options::new().with("type", "column")).unwrap();

    assert_eq!(type_of(&stage), Some("row"));
    assert_eq!(type_of(&q.chain()), Some("row"));
}

#[test]
fn test_filter_then_column_scenario() {
    let mut q = query();
    q.filter("Status", Options::new().with("value", "open")).unwrap();
    q.column("Priority", Options::new()).unwrap();

    let head = q.chain();
    assert_eq!(head.name(), "Priority");
    assert_eq!(head.grouping().unwrap().field, "priority");
    let filter = head.parent().unwrap();
    assert_eq!(filter.name(), "Status");
    assert_eq!(filter.options().get_str("value"), Some("open"));
    assert_eq!(filter.parent().unwrap().name(), "NoFilter");

    let results = q.results().unwrap();
    let QueryResult::Grouped { field, axis, groups } = &results else {
        panic!("expected grouped result, got {:?}", results);
    };
    assert_eq!(field, "priority");
    assert_eq!(*axis, Axis::Column);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].key, Value::from("high"));
    assert_eq!(groups[0].result.count(), 2);
    assert_eq!(groups[1].key, Value::from("low"));
    assert_eq!(groups[1].result.count(), 1);
    assert_eq!(results.sum("costs").to_string(), "175");
}

#[test]
fn test_unknown_stage_name_fails_fast() {
    let mut q = query();
    let base = q.chain();

    let err = q.filter("Nonexistent", Options::new()).unwrap_err();
    match err {
        QueryError::UnresolvedStageType { category, name } => {
            assert_eq!(category, Category::Filter);
            assert_eq!(name, "Nonexistent");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(Arc::ptr_eq(&q.chain(), &base));
}

#[test]
fn test_filter_name_is_not_a_group_by_name() {
    let mut registry = StageRegistry::new();
    registry.register(Category::Filter, "only_filter", |parent, _| Ok(parent));
    let mut q = CostQuery::new(Arc::new(entries()), Arc::new(registry));

    assert!(matches!(
        q.column("only_filter", Options::new()),
        Err(QueryError::UnresolvedStageType { category: Category::GroupBy, .. })
    ));
}

#[test]
fn test_invalid_options_leave_chain_untouched() {
    let mut q = query();
    let filter = q.filter("Status", Options::new().with("value", "open")).unwrap();

    let err = q
        .filter("Priority", Options::new().with("operator", "<>").with("value", "x"))
        .unwrap_err();
    assert!(matches!(err, QueryError::InvalidOption { ref key, .. } if key == "operator"));
    assert!(Arc::ptr_eq(&q.chain(), &filter));
}

#[test]
fn test_snake_case_names_resolve() {
    let mut q = CostQuery::new(
        Arc::new(entries()),
        Arc::new(StageRegistry::with_fields(["cost_type"])),
    );
    let stage = q.column("cost_type", Options::new()).unwrap();
    assert_eq!(stage.name(), "CostType");
    assert_eq!(stage.grouping().unwrap().field, "cost_type");
}

#[test]
fn test_accepted_properties_follow_registered_fields() {
    let mut registry = StageRegistry::with_fields(["status", "priority", "status"]);
    registry.accept_property("hours");

    let q = CostQuery::new(Arc::new(entries()), Arc::new(registry));
    assert_eq!(q.accepted_properties(), ["status", "priority", "hours"]);
}

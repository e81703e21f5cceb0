use cost_query::{
    CostQuery, Options, QueryError, QueryResult, StageRegistry, Value, WalkOrder, Walker,
};
use std::{collections::HashMap, sync::Arc};

fn entry(project: &str, tracker: &str, costs: i64) -> Value {
    let mut map = HashMap::new();
    map.insert("project".to_string(), Value::from(project));
    map.insert("tracker".to_string(), Value::from(tracker));
    map.insert("costs".to_string(), Value::Integer(costs));
    Value::Object(map)
}

fn query() -> CostQuery {
    let entries = vec![
        entry("apollo", "bug", 10),
        entry("apollo", "feature", 20),
        entry("gemini", "bug", 5),
        entry("gemini", "bug", 7),
    ];
    let registry = StageRegistry::with_fields(["project", "tracker"]);
    CostQuery::new(Arc::new(entries), Arc::new(registry))
}

fn names(query: &mut CostQuery, order: WalkOrder) -> Vec<(String, usize)> {
    query
        .walk(order, |stage, depth| Ok((stage.name().to_string(), depth)))
        .unwrap()
}

#[test]
fn test_walks_edge_first_by_default() {
    let mut q = query();
    q.filter("Tracker", Options::new().with("value", "bug")).unwrap();
    q.column("Project", Options::new()).unwrap();

    assert_eq!(
        names(&mut q, WalkOrder::default()),
        vec![
            ("Project".to_string(), 2),
            ("Tracker".to_string(), 1),
            ("NoFilter".to_string(), 0),
        ]
    );
}

#[test]
fn test_walks_base_first() {
    let mut q = query();
    q.filter("Tracker", Options::new().with("value", "bug")).unwrap();

    assert_eq!(
        names(&mut q, WalkOrder::BaseFirst),
        vec![("NoFilter".to_string(), 0), ("Tracker".to_string(), 1)]
    );
}

#[test]
fn test_fresh_query_walks_only_the_base() {
    let mut q = query();
    let walker = q.walker();
    assert_eq!(walker.len(), 1);
    assert_eq!(walker.edge().name(), "NoFilter");
}

#[test]
fn test_walker_is_cached_between_calls() {
    let mut q = query();
    q.row("Project", Options::new()).unwrap();

    let first = q.walker() as *const Walker;
    let second = q.walker() as *const Walker;
    assert_eq!(first, second);
}

#[test]
fn test_walk_after_mutation_sees_new_stage() {
    let mut q = query();
    q.filter("Tracker", Options::new().with("value", "bug")).unwrap();
    assert_eq!(q.walker().len(), 2);

    q.column("Project", Options::new()).unwrap();
    let walker = q.walker();
    assert_eq!(walker.len(), 3);
    assert_eq!(walker.edge().name(), "Project");
}

#[test]
fn test_failed_mutation_keeps_walker_current() {
    let mut q = query();
    q.filter("Tracker", Options::new().with("value", "bug")).unwrap();
    let before = q.walker().len();

    assert!(q.filter("Missing", Options::new()).is_err());
    assert_eq!(q.walker().len(), before);
}

#[test]
fn test_callback_error_stops_walk() {
    let mut q = query();
    q.filter("Tracker", Options::new().with("value", "bug")).unwrap();
    q.column("Project", Options::new()).unwrap();

    let mut visited = Vec::new();
    let err = q
        .walk(WalkOrder::EdgeFirst, |stage, _| {
            visited.push(stage.name().to_string());
            if stage.name() == "Tracker" {
                return Err(QueryError::InvalidEntries("stop".to_string()));
            }
            Ok(())
        })
        .unwrap_err();

    assert!(matches!(err, QueryError::InvalidEntries(_)));
    assert_eq!(visited, vec!["Project", "Tracker"]);
}

#[test]
fn test_stages_follow_order() {
    let mut q = query();
    q.column("Tracker", Options::new()).unwrap();
    let walker = q.walker();

    let edge_first: Vec<&str> = walker
        .stages(WalkOrder::EdgeFirst)
        .into_iter()
        .map(|s| s.name())
        .collect();
    let base_first: Vec<&str> = walker
        .stages(WalkOrder::BaseFirst)
        .into_iter()
        .map(|s| s.name())
        .collect();
    assert_eq!(edge_first, vec!["Tracker", "NoFilter"]);
    assert_eq!(base_first, vec!["NoFilter", "Tracker"]);
}

#[test]
fn test_reduce_folds_groups_bottom_up() {
    let mut q = query();
    q.row("Project", Options::new()).unwrap();
    q.column("Tracker", Options::new()).unwrap();

    let total = q
        .walker()
        .reduce(|node: &QueryResult, _key: Option<&Value>, children: Vec<usize>| {
            if children.is_empty() {
                node.count()
            } else {
                children.iter().sum()
            }
        })
        .unwrap();
    assert_eq!(total, 4);
}

#[test]
fn test_reduce_sees_group_keys() {
    let mut q = query();
    q.row("Project", Options::new()).unwrap();

    let keys = q
        .walker()
        .reduce(|_node: &QueryResult, key: Option<&Value>, children: Vec<Vec<String>>| {
            let mut keys: Vec<String> = key.map(Value::as_string).into_iter().collect();
            keys.extend(children.into_iter().flatten());
            keys
        })
        .unwrap();
    assert_eq!(keys, vec!["apollo", "gemini"]);
}

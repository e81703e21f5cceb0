//! Materialized query output.

use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde_json::json;

use crate::{
    convert::value_to_json,
    stage::{Axis, Grouping},
    value::Value,
};

/// Output of a stage chain.
///
/// Without group-bys the result is the flat list of entries that passed
/// every filter. Each grouping adds one level of nesting.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Rows(Vec<Value>),
    Grouped {
        field: String,
        axis: Axis,
        groups: Vec<Group>,
    },
}

/// One bucket of a grouped result.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: Value,
    pub result: QueryResult,
}

impl QueryResult {
    /// Nest `rows` by `groupings`, outermost first.
    ///
    /// Groups are ordered by key, nulls last. A row missing the grouped
    /// field lands in the null group. Keys that compare loosely equal share
    /// a group keyed by the first value seen.
    pub fn build(rows: Vec<Value>, groupings: &[Grouping]) -> QueryResult {
        let Some((first, rest)) = groupings.split_first() else {
            return QueryResult::Rows(rows);
        };

        let mut buckets: Vec<(Value, Vec<Value>)> = Vec::new();
        for row in rows {
            let key = row.get(&first.field).clone();
            // 1, 1.0 and "1" share a bucket, as they do in filters.
            match buckets.iter_mut().find(|(k, _)| k.loose_eq(&key)) {
                Some((_, bucket)) => bucket.push(row),
                None => buckets.push((key, vec![row])),
            }
        }
        buckets.sort_by(|(a, _), (b, _)| a.sort_cmp(b));

        QueryResult::Grouped {
            field: first.field.clone(),
            axis: first.axis,
            groups: buckets
                .into_iter()
                .map(|(key, rows)| Group {
                    key,
                    result: QueryResult::build(rows, rest),
                })
                .collect(),
        }
    }

    /// Number of entries below this node.
    pub fn count(&self) -> usize {
        match self {
            QueryResult::Rows(rows) => rows.len(),
            QueryResult::Grouped { groups, .. } => groups.iter().map(|g| g.result.count()).sum(),
        }
    }

    /// All entries below this node, in group order.
    pub fn rows(&self) -> Vec<&Value> {
        let mut out = Vec::with_capacity(self.count());
        self.collect_rows(&mut out);
        out
    }

    fn collect_rows<'a>(&'a self, out: &mut Vec<&'a Value>) {
        match self {
            QueryResult::Rows(rows) => out.extend(rows.iter()),
            QueryResult::Grouped { groups, .. } => {
                for group in groups {
                    group.result.collect_rows(out);
                }
            }
        }
    }

    /// Exact sum of `field` over every entry below this node.
    /// Non-numeric and missing values count as zero.
    pub fn sum(&self, field: &str) -> Decimal {
        self.rows()
            .into_iter()
            .filter_map(|row| row.get(field).as_decimal())
            .sum()
    }

    pub fn groups(&self) -> &[Group] {
        match self {
            QueryResult::Rows(_) => &[],
            QueryResult::Grouped { groups, .. } => groups,
        }
    }

    /// Number of grouping levels below this node.
    pub fn depth(&self) -> usize {
        match self {
            QueryResult::Rows(_) => 0,
            QueryResult::Grouped { groups, .. } => {
                1 + groups.iter().map(|g| g.result.depth()).max().unwrap_or(0)
            }
        }
    }

    /// Render as JSON. When `sum_field` is set, every node carries the sum
    /// of that field next to its count.
    pub fn to_json(&self, sum_field: Option<&str>) -> serde_json::Value {
        let mut node = match self {
            QueryResult::Rows(rows) => json!({
                "entries": rows.iter().map(value_to_json).collect::<Vec<_>>(),
            }),
            QueryResult::Grouped {
                field,
                axis,
                groups,
            } => json!({
                "field": field,
                "axis": axis.as_str(),
                "groups": groups
                    .iter()
                    .map(|group| {
                        let mut child = group.result.to_json(sum_field);
                        child["key"] = value_to_json(&group.key);
                        child
                    })
                    .collect::<Vec<_>>(),
            }),
        };

        node["count"] = json!(self.count());
        if let Some(field) = sum_field {
            node["sum"] = value_to_json(&decimal_to_value(self.sum(field)));
        }
        node
    }
}

/// Whole sums become integers, everything else a float.
pub fn decimal_to_value(d: Decimal) -> Value {
    let d = d.normalize();
    if d.is_integer()
        && let Some(n) = d.to_i64()
    {
        Value::Integer(n)
    } else if let Some(f) = d.to_f64() {
        Value::Float(f)
    } else {
        Value::String(d.to_string())
    }
}

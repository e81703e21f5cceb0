use tracing::trace;

use crate::{
    error::QueryError,
    result::QueryResult,
    stage::{Stage, StageRef, ancestry},
    value::Value,
};

/// Direction of a [`Walker::walk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalkOrder {
    /// Head of the chain first, base last
    #[default]
    EdgeFirst,
    /// Base first, head last
    BaseFirst,
}

/// Snapshot of a resolved chain, for inspection and rendering.
///
/// A walker mirrors the chain as it was when built. [`CostQuery`] drops its
/// cached walker on every mutation so it is rebuilt before the next walk.
///
/// [`CostQuery`]: crate::CostQuery
#[derive(Debug, Clone)]
pub struct Walker {
    /// Edge first.
    stages: Vec<StageRef>,
}

impl Walker {
    pub fn new(edge: StageRef) -> Self {
        let stages: Vec<StageRef> = ancestry(&edge).cloned().collect();
        trace!("walker built over {} stages", stages.len());
        Walker { stages }
    }

    /// The stage the walker was built on.
    pub fn edge(&self) -> &StageRef {
        &self.stages[0]
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always false: a chain contains at least its base.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stages(&self, order: WalkOrder) -> Vec<&StageRef> {
        match order {
            WalkOrder::EdgeFirst => self.stages.iter().collect(),
            WalkOrder::BaseFirst => self.stages.iter().rev().collect(),
        }
    }

    /// Call `f` for every stage in `order`. The second argument is the
    /// stage's distance from the base. The first error stops the walk.
    pub fn walk<T, F>(&self, order: WalkOrder, mut f: F) -> Result<Vec<T>, QueryError>
    where
        F: FnMut(&dyn Stage, usize) -> Result<T, QueryError>,
    {
        let top = self.stages.len() - 1;
        let mut out = Vec::with_capacity(self.stages.len());
        for (idx, stage) in self.stages.iter().enumerate() {
            let depth = top - idx;
            out.push((depth, stage));
        }
        if order == WalkOrder::BaseFirst {
            out.reverse();
        }
        out.into_iter()
            .map(|(depth, stage)| f(stage.as_ref(), depth))
            .collect()
    }

    /// Fold the edge's result tree bottom-up.
    ///
    /// `f` receives each node, the group key it sits under (`None` for the
    /// root) and the already-folded values of its child groups.
    pub fn reduce<T, F>(&self, mut f: F) -> Result<T, QueryError>
    where
        F: FnMut(&QueryResult, Option<&Value>, Vec<T>) -> T,
    {
        let results = self.edge().results()?;
        Ok(fold(&results, None, &mut f))
    }
}

fn fold<T, F>(node: &QueryResult, key: Option<&Value>, f: &mut F) -> T
where
    F: FnMut(&QueryResult, Option<&Value>, Vec<T>) -> T,
{
    let children = node
        .groups()
        .iter()
        .map(|group| fold(&group.result, Some(&group.key), f))
        .collect();
    f(node, key, children)
}

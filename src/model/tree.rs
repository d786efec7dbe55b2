//! Goal tree assembly.
//!
//! The store keeps plans flat; this groups them under their parents. Depth is
//! bounded by the five ranks, so recursion never goes deeper than five frames.

use super::{Plan, Stats};
use serde::Serialize;
use std::collections::HashMap;

/// A plan with its descendants.
#[derive(Debug, Clone, Serialize)]
pub struct PlanNode {
    pub plan: Plan,
    pub children: Vec<PlanNode>,
}

impl PlanNode {
    /// Number of plans in this subtree, including the root.
    #[must_use]
    pub fn count(&self) -> u64 {
        1 + self.children.iter().map(PlanNode::count).sum::<u64>()
    }

    /// Number of completed plans in this subtree, including the root.
    #[must_use]
    pub fn completed_count(&self) -> u64 {
        u64::from(self.plan.is_completed)
            + self.children.iter().map(PlanNode::completed_count).sum::<u64>()
    }

    /// Completion rollup over the whole subtree.
    #[must_use]
    pub fn stats(&self) -> Stats {
        Stats::new(self.completed_count(), self.count())
    }

    /// Depth of the subtree (1 for a leaf).
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(PlanNode::depth).max().unwrap_or(0)
    }
}

/// Group a flat plan list into trees rooted at 5-year visions.
///
/// Children keep the input order, so feeding `list_all_plans()` yields
/// newest-first siblings. Plans whose parent is absent from `plans` (orphans)
/// and non-root plans without a parent are not reachable and are left out.
#[must_use]
pub fn build_forest(plans: Vec<Plan>) -> Vec<PlanNode> {
    let mut roots = Vec::new();
    let mut by_parent: HashMap<i64, Vec<Plan>> = HashMap::new();

    for plan in plans {
        match plan.parent_id {
            Some(parent_id) if !plan.plan_type.is_root() => {
                by_parent.entry(parent_id).or_default().push(plan);
            }
            None if plan.plan_type.is_root() => roots.push(plan),
            _ => {}
        }
    }

    roots
        .into_iter()
        .map(|plan| attach(plan, &mut by_parent))
        .collect()
}

fn attach(plan: Plan, by_parent: &mut HashMap<i64, Vec<Plan>>) -> PlanNode {
    let children = by_parent
        .remove(&plan.id)
        .unwrap_or_default()
        .into_iter()
        .filter(|child| Some(child.plan_type) == plan.plan_type.child_type())
        .map(|child| attach(child, by_parent))
        .collect();
    PlanNode { plan, children }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlanType;

    fn plan(id: i64, plan_type: PlanType, parent: Option<i64>) -> Plan {
        let mut p = Plan::new(format!("plan {id}"), plan_type);
        p.id = id;
        p.parent_id = parent;
        p
    }

    #[test]
    fn test_full_depth_chain() {
        let plans = vec![
            plan(1, PlanType::FiveYear, None),
            plan(2, PlanType::Year, Some(1)),
            plan(3, PlanType::Quarter, Some(2)),
            plan(4, PlanType::Month, Some(3)),
            plan(5, PlanType::Week, Some(4)).completed(),
        ];
        let forest = build_forest(plans);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].depth(), 5);
        assert_eq!(forest[0].stats(), Stats::new(1, 5));
    }

    #[test]
    fn test_orphans_are_unreachable() {
        let plans = vec![
            plan(1, PlanType::FiveYear, None),
            plan(2, PlanType::Year, Some(1)),
            plan(7, PlanType::Year, Some(99)),
        ];
        let forest = build_forest(plans);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].count(), 2);
    }

    #[test]
    fn test_rank_skipping_child_is_dropped() {
        let plans = vec![
            plan(1, PlanType::FiveYear, None),
            plan(2, PlanType::Month, Some(1)),
        ];
        let forest = build_forest(plans);
        assert!(forest[0].children.is_empty());
    }
}

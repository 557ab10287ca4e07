//! Business roll-ups over the node payload: progress, risk and budget health.

use serde::Serialize;

use crate::domain::entities::{
    Level, Node, NodeCollection, NodeDetails, NodeId, NodeType, Risk, Status, TaskStatus,
};

/// Share of completed tasks in percent; the stored progress when there are no tasks.
pub fn calculate_progress(details: &NodeDetails) -> u8 {
    if details.tasks.is_empty() {
        return details.progress;
    }
    let total = details.tasks.len() as f64;
    let completed = details
        .tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .count() as f64;
    (completed / total * 100.0).round() as u8
}

/// Status implied by the worst open risk.
pub fn risk_status(risks: &[Risk]) -> Status {
    if risks.iter().any(|r| r.severity == Level::High) {
        Status::Delayed
    } else if risks.iter().any(|r| r.severity == Level::Medium) {
        Status::AtRisk
    } else {
        Status::OnTrack
    }
}

/// Status implied by budget consumption: above 90% delayed, above 75% at risk.
pub fn budget_status(budget: f64, spent: f64) -> Status {
    if budget <= 0.0 || spent <= 0.0 {
        return Status::OnTrack;
    }
    let used = spent / budget * 100.0;
    if used > 90.0 {
        Status::Delayed
    } else if used > 75.0 {
        Status::AtRisk
    } else {
        Status::OnTrack
    }
}

/// Worse of risk and budget status.
pub fn health(details: &NodeDetails) -> Status {
    risk_status(&details.risks).max(budget_status(details.budget, details.spent))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSummary {
    pub id: NodeId,
    pub name: String,
    pub node_type: NodeType,
    pub progress: u8,
    pub health: Status,
    pub budget: f64,
    pub spent: f64,
}

impl NodeSummary {
    pub fn of(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            node_type: node.node_type,
            progress: calculate_progress(&node.details),
            health: health(&node.details),
            budget: node.details.budget,
            spent: node.details.spent,
        }
    }
}

/// Roll-up across all non-root nodes.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub nodes: Vec<NodeSummary>,
    pub total_budget: f64,
    pub total_spent: f64,
    /// Spent over budget in percent; 0 when there is no budget
    pub utilisation: f64,
    pub at_risk: Vec<NodeId>,
    pub delayed: Vec<NodeId>,
}

impl PortfolioSummary {
    pub fn from_nodes(nodes: &NodeCollection) -> Self {
        let summaries: Vec<_> = nodes
            .iter()
            .filter(|n| !n.is_root())
            .map(NodeSummary::of)
            .collect();

        let total_budget: f64 = summaries.iter().map(|s| s.budget).sum();
        let total_spent: f64 = summaries.iter().map(|s| s.spent).sum();
        let utilisation = if total_budget > 0.0 {
            total_spent / total_budget * 100.0
        } else {
            0.0
        };
        let with_health = |status: Status| {
            summaries
                .iter()
                .filter(|s| s.health == status)
                .map(|s| s.id.clone())
                .collect::<Vec<_>>()
        };

        let at_risk = with_health(Status::AtRisk);
        let delayed = with_health(Status::Delayed);

        Self {
            nodes: summaries,
            total_budget,
            total_spent,
            utilisation,
            at_risk,
            delayed,
        }
    }
}

//! Domain entities: core data structures

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::geometry::Point;

/// Stable node identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random identifier (UUID v4).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl FromStr for NodeId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(DomainError::InvalidAttribute {
                field: "id",
                reason: "must not be empty".into(),
            });
        }
        Ok(Self::new(s))
    }
}

/// Position of a node in the type taxonomy.
/// Accepts the orbital names (sun/planet/moon/satellite) on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    #[serde(alias = "sun")]
    Root,
    #[serde(alias = "planet")]
    Primary,
    #[serde(alias = "moon")]
    Secondary,
    #[serde(alias = "satellite")]
    Tertiary,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Root => "root",
            NodeType::Primary => "primary",
            NodeType::Secondary => "secondary",
            NodeType::Tertiary => "tertiary",
        }
    }

    /// Child types this type may host.
    pub fn allowed_children(&self) -> &'static [NodeType] {
        match self {
            NodeType::Root => &[NodeType::Primary],
            NodeType::Primary => &[NodeType::Secondary, NodeType::Tertiary],
            NodeType::Secondary | NodeType::Tertiary => &[],
        }
    }

    pub fn allows_child(&self, child: NodeType) -> bool {
        self.allowed_children().contains(&child)
    }

    /// Child type picked when the caller does not name one.
    pub fn default_child(&self) -> Option<NodeType> {
        self.allowed_children().first().copied()
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "root" | "sun" => Ok(NodeType::Root),
            "primary" | "planet" => Ok(NodeType::Primary),
            "secondary" | "moon" => Ok(NodeType::Secondary),
            "tertiary" | "satellite" => Ok(NodeType::Tertiary),
            other => Err(DomainError::UnknownVariant {
                kind: "node type",
                value: other.to_string(),
            }),
        }
    }
}

/// Display classification; never used by layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Strategy,
    Operations,
    Technology,
    Hr,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Strategy => "strategy",
            Category::Operations => "operations",
            Category::Technology => "technology",
            Category::Hr => "hr",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strategy" => Ok(Category::Strategy),
            "operations" => Ok(Category::Operations),
            "technology" => Ok(Category::Technology),
            "hr" => Ok(Category::Hr),
            other => Err(DomainError::UnknownVariant {
                kind: "category",
                value: other.to_string(),
            }),
        }
    }
}

/// Project health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Active,
    #[default]
    OnTrack,
    AtRisk,
    Delayed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::OnTrack => "on-track",
            Status::AtRisk => "at-risk",
            Status::Delayed => "delayed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Status {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Status::Active),
            "on-track" | "on_track" | "ontrack" => Ok(Status::OnTrack),
            "at-risk" | "at_risk" | "atrisk" => Ok(Status::AtRisk),
            "delayed" => Ok(Status::Delayed),
            other => Err(DomainError::UnknownVariant {
                kind: "status",
                value: other.to_string(),
            }),
        }
    }
}

/// Severity of a risk, also used as task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kpi {
    pub name: String,
    pub target: String,
    pub current: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Risk {
    pub severity: Level,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub priority: Level,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub date: NaiveDate,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

impl Timeline {
    /// One year starting at `start`.
    pub fn one_year_from(start: NaiveDate) -> Self {
        let end = start.checked_add_days(Days::new(365)).unwrap_or(start);
        Self {
            start,
            end,
            milestones: Vec::new(),
        }
    }
}

/// Project-management payload. Opaque to layout.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeDetails {
    pub status: Status,
    pub progress: u8,
    pub budget: f64,
    pub spent: f64,
    pub team: Vec<String>,
    pub kpis: Vec<Kpi>,
    pub risks: Vec<Risk>,
    pub tasks: Vec<Task>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Timeline>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl NodeDetails {
    /// Default payload for a freshly created node of `node_type`.
    pub fn template(node_type: NodeType, today: NaiveDate) -> Self {
        let budget = match node_type {
            NodeType::Root => 0.0,
            NodeType::Primary => 100_000.0,
            NodeType::Secondary => 50_000.0,
            NodeType::Tertiary => 25_000.0,
        };
        let timeline = match node_type {
            NodeType::Primary => Some(Timeline::one_year_from(today)),
            _ => None,
        };
        Self {
            budget,
            timeline,
            ..Self::default()
        }
    }
}

/// Default category for a freshly created node of `node_type`.
pub fn default_category(node_type: NodeType) -> Category {
    match node_type {
        NodeType::Root | NodeType::Primary => Category::Strategy,
        NodeType::Secondary => Category::Operations,
        NodeType::Tertiary => Category::Technology,
    }
}

/// An entity in the orbital hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Parent link; None only for the root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    #[serde(default)]
    pub category: Category,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Committed position; persists until invalidated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    /// Ring radius of the last slot assignment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orbit: Option<f64>,
    /// Angle of the last slot assignment, relative to the anchor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    #[serde(flatten)]
    pub details: NodeDetails,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            node_type,
            parent_id: None,
            category: default_category(node_type),
            description: String::new(),
            position: None,
            orbit: None,
            angle: None,
            details: NodeDetails::default(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<NodeId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    pub fn with_position(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }

    pub fn is_root(&self) -> bool {
        self.node_type == NodeType::Root
    }

    /// Drop position and restart hints so the next layout pass re-resolves.
    pub fn clear_placement(&mut self) {
        self.position = None;
        self.orbit = None;
        self.angle = None;
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Attributes for a node created by `Mutation::Add`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewNode {
    pub name: String,
    /// None picks the parent's default child type
    pub node_type: Option<NodeType>,
    pub category: Option<Category>,
    pub description: String,
    pub budget: Option<f64>,
}

impl NewNode {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn of_type(mut self, node_type: NodeType) -> Self {
        self.node_type = Some(node_type);
        self
    }
}

/// Partial attribute edit. Structural fields (type, parent, placement) are
/// not editable here.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodePatch {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub progress: Option<u8>,
    pub budget: Option<f64>,
    pub spent: Option<f64>,
    pub team: Option<Vec<String>>,
    pub kpis: Option<Vec<Kpi>>,
    pub risks: Option<Vec<Risk>>,
    pub tasks: Option<Vec<Task>>,
    pub timeline: Option<Timeline>,
}

impl NodePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, node: &mut Node) {
        if let Some(name) = &self.name {
            node.name = name.clone();
        }
        if let Some(category) = self.category {
            node.category = category;
        }
        if let Some(description) = &self.description {
            node.description = description.clone();
        }
        let d = &mut node.details;
        if let Some(status) = self.status {
            d.status = status;
        }
        if let Some(progress) = self.progress {
            d.progress = progress;
        }
        if let Some(budget) = self.budget {
            d.budget = budget;
        }
        if let Some(spent) = self.spent {
            d.spent = spent;
        }
        if let Some(team) = &self.team {
            d.team = team.clone();
        }
        if let Some(kpis) = &self.kpis {
            d.kpis = kpis.clone();
        }
        if let Some(risks) = &self.risks {
            d.risks = risks.clone();
        }
        if let Some(tasks) = &self.tasks {
            d.tasks = tasks.clone();
        }
        if let Some(timeline) = &self.timeline {
            d.timeline = Some(timeline.clone());
        }
    }
}

/// Ordered node set. Order is the layout tie-break: children are visited
/// in collection order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeCollection {
    nodes: Vec<Node>,
}

impl NodeCollection {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.nodes.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Node> {
        self.nodes.iter_mut()
    }

    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn get_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| &n.id == id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Lookup that reports a missing id as `InvalidReference`.
    pub fn require(&self, id: &NodeId) -> DomainResult<&Node> {
        self.get(id)
            .ok_or_else(|| DomainError::InvalidReference(id.clone()))
    }

    pub fn require_mut(&mut self, id: &NodeId) -> DomainResult<&mut Node> {
        self.get_mut(id)
            .ok_or_else(|| DomainError::InvalidReference(id.clone()))
    }

    /// The first root-typed node.
    pub fn root(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| n.is_root())
    }

    pub fn children_of<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes
            .iter()
            .filter(move |n| n.parent_id.as_ref() == Some(id))
    }

    pub fn child_count(&self, id: &NodeId) -> usize {
        self.children_of(id).count()
    }

    pub fn push(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn retain(&mut self, f: impl FnMut(&Node) -> bool) {
        self.nodes.retain(f);
    }
}

impl<'a> IntoIterator for &'a NodeCollection {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl FromIterator<Node> for NodeCollection {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

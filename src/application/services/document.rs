//! Node document storage
//!
//! A node document is the JSON array of node records. Loading validates the
//! hierarchy; saving writes pretty JSON atomically.

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use crate::application::error_ext::JsonResultExt;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{
    validate_forest, Category, HierarchyRules, Kpi, Level, Milestone, Node, NodeCollection,
    NodeType, Risk, Status, Timeline,
};
use crate::infrastructure::traits::FileSystem;

/// Loads and saves node documents.
pub struct DocumentService {
    fs: Arc<dyn FileSystem>,
    rules: HierarchyRules,
}

impl DocumentService {
    pub fn new(fs: Arc<dyn FileSystem>, rules: HierarchyRules) -> Self {
        Self { fs, rules }
    }

    /// Read and validate the document at `path`.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, path: &Path) -> ApplicationResult<NodeCollection> {
        if !self.fs.is_file(path) {
            return Err(ApplicationError::DocumentMissing(path.to_path_buf()));
        }
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read node document", path)?;
        let nodes: NodeCollection =
            serde_json::from_str(&content).with_path_context("parse node document", path)?;
        validate_forest(&nodes, &self.rules)?;
        debug!(nodes = nodes.len(), "loaded document");
        Ok(nodes)
    }

    #[instrument(level = "debug", skip(self, nodes), fields(nodes = nodes.len()))]
    pub fn save(&self, path: &Path, nodes: &NodeCollection) -> ApplicationResult<()> {
        let mut content =
            serde_json::to_string_pretty(nodes).with_path_context("serialize node document", path)?;
        content.push('\n');
        self.fs
            .write_atomic(path, &content)
            .with_path_context("write node document", path)?;
        debug!("saved document");
        Ok(())
    }

    /// Write the seed organization to `path`.
    ///
    /// Refuses to overwrite an existing document unless `force` is set.
    pub fn init(&self, path: &Path, force: bool) -> ApplicationResult<NodeCollection> {
        if self.fs.exists(path) && !force {
            return Err(ApplicationError::DocumentExists(path.to_path_buf()));
        }
        let nodes = seed_nodes();
        self.save(path, &nodes)?;
        info!(path = %path.display(), "Initialized node document");
        Ok(nodes)
    }
}

fn kpi(name: &str, target: &str, current: &str) -> Kpi {
    Kpi {
        name: name.into(),
        target: target.into(),
        current: current.into(),
    }
}

fn risk(severity: Level, description: &str) -> Risk {
    Risk {
        severity,
        description: description.into(),
    }
}

fn org_timeline() -> Option<Timeline> {
    let date = |m, d| NaiveDate::from_ymd_opt(2024, m, d);
    Some(Timeline {
        start: date(1, 1)?,
        end: date(12, 31)?,
        milestones: vec![
            Milestone {
                date: date(3, 31)?,
                description: "Q1 Digital Strategy Review".into(),
            },
            Milestone {
                date: date(6, 30)?,
                description: "Mid-year Transformation Assessment".into(),
            },
        ],
    })
}

/// Starter organization: one root and three primaries, all unplaced.
pub fn seed_nodes() -> NodeCollection {
    let mut root = Node::new("center", "Main Organization", NodeType::Root);
    root.category = Category::Strategy;
    root.description = "Central organization hub".into();
    root.details.status = Status::Active;
    root.details.budget = 5_000_000.0;
    root.details.spent = 2_100_000.0;
    root.details.progress = 65;
    root.details.team = vec![
        "John D. (CEO)".into(),
        "Sarah M. (COO)".into(),
        "Mike R. (CTO)".into(),
    ];
    root.details.kpis = vec![
        kpi("Revenue Growth", "25%", "18%"),
        kpi("Digital Adoption", "80%", "65%"),
        kpi("Customer Satisfaction", "95%", "92%"),
    ];
    root.details.risks = vec![
        risk(Level::High, "Market volatility impact"),
        risk(Level::Medium, "Resource constraints"),
    ];
    root.details.timeline = org_timeline();

    let mut transform = Node::new("digital-transform", "Digital Transformation", NodeType::Primary)
        .with_parent("center");
    transform.category = Category::Technology;
    transform.description = "Enterprise-wide digital transformation initiative".into();
    transform.details.budget = 2_000_000.0;
    transform.details.spent = 800_000.0;
    transform.details.progress = 45;
    transform.details.team = vec![
        "Alex T. (Digital Director)".into(),
        "Maria S. (Change Manager)".into(),
    ];
    transform.details.kpis = vec![
        kpi("Process Automation", "70%", "45%"),
        kpi("Employee Digital Skills", "90%", "75%"),
    ];
    transform.details.risks = vec![
        risk(Level::Medium, "Technical debt accumulation"),
        risk(Level::Medium, "Change resistance"),
    ];

    let mut workplace = Node::new("digital-workplace", "Digital Workplace", NodeType::Primary)
        .with_parent("center");
    workplace.category = Category::Operations;
    workplace.description = "Modern workplace and collaboration tools".into();
    workplace.details.budget = 500_000.0;
    workplace.details.spent = 200_000.0;
    workplace.details.progress = 70;
    workplace.details.team = vec!["Patricia H. (IT)".into(), "James R. (Training)".into()];
    workplace.details.kpis = vec![
        kpi("Tool Adoption", "95%", "82%"),
        kpi("Productivity Gain", "30%", "25%"),
    ];

    let mut experience = Node::new("customer-experience", "Customer Experience", NodeType::Primary)
        .with_parent("center");
    experience.category = Category::Strategy;
    experience.description = "Digital customer experience enhancement".into();
    experience.details.budget = 1_000_000.0;
    experience.details.spent = 400_000.0;
    experience.details.progress = 65;
    experience.details.team = vec!["Lisa M. (CX Lead)".into(), "Chris P. (UX Director)".into()];
    experience.details.kpis = vec![
        kpi("Customer Satisfaction", "90%", "85%"),
        kpi("Digital Engagement", "75%", "60%"),
    ];

    NodeCollection::new(vec![root, transform, workplace, experience])
}

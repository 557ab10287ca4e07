//! Attribute validation for node records.
//!
//! Structural rules live in `hierarchy`; this module only checks field values.

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::entities::{Kpi, Node, NodeDetails, Timeline};
use crate::domain::error::{DomainError, DomainResult};

pub const NAME_MIN: usize = 3;
pub const NAME_MAX: usize = 50;
pub const DESCRIPTION_MAX: usize = 500;
pub const BUDGET_MAX: f64 = 1_000_000_000.0;
pub const TEAM_MAX: usize = 20;
pub const MEMBER_MAX: usize = 50;
pub const KPI_NAME_MAX: usize = 50;
pub const MILESTONES_MAX: usize = 20;

fn name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9\s\-_]+$").expect("valid name regex"))
}

fn kpi_value_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]+%?$").expect("valid kpi regex"))
}

fn invalid(field: &'static str, reason: impl Into<String>) -> DomainError {
    DomainError::InvalidAttribute {
        field,
        reason: reason.into(),
    }
}

pub fn validate_name(name: &str) -> DomainResult<()> {
    let len = name.trim().chars().count();
    if !(NAME_MIN..=NAME_MAX).contains(&len) {
        return Err(invalid(
            "name",
            format!("must be {NAME_MIN} to {NAME_MAX} characters, got {len}"),
        ));
    }
    if !name_pattern().is_match(name) {
        return Err(invalid(
            "name",
            "only letters, digits, spaces, hyphens and underscores are allowed",
        ));
    }
    Ok(())
}

pub fn validate_description(description: &str) -> DomainResult<()> {
    let len = description.chars().count();
    if len > DESCRIPTION_MAX {
        return Err(invalid(
            "description",
            format!("must be at most {DESCRIPTION_MAX} characters, got {len}"),
        ));
    }
    Ok(())
}

pub fn validate_amount(field: &'static str, amount: f64) -> DomainResult<()> {
    if !amount.is_finite() || !(0.0..=BUDGET_MAX).contains(&amount) {
        return Err(invalid(field, format!("must be between 0 and {BUDGET_MAX}, got {amount}")));
    }
    Ok(())
}

pub fn validate_progress(progress: u8) -> DomainResult<()> {
    if progress > 100 {
        return Err(invalid("progress", format!("must be at most 100, got {progress}")));
    }
    Ok(())
}

pub fn validate_team(team: &[String]) -> DomainResult<()> {
    if team.len() > TEAM_MAX {
        return Err(invalid("team", format!("at most {TEAM_MAX} members")));
    }
    if let Some(member) = team.iter().find(|m| m.chars().count() > MEMBER_MAX) {
        return Err(invalid(
            "team",
            format!("member name longer than {MEMBER_MAX} characters: {member}"),
        ));
    }
    Ok(())
}

pub fn validate_kpi(kpi: &Kpi) -> DomainResult<()> {
    let len = kpi.name.trim().chars().count();
    if len == 0 || len > KPI_NAME_MAX {
        return Err(invalid("kpis", format!("name must be 1 to {KPI_NAME_MAX} characters")));
    }
    for value in [&kpi.target, &kpi.current] {
        if !kpi_value_pattern().is_match(value) {
            return Err(invalid(
                "kpis",
                format!("{}: value must be a number or percentage, got '{value}'", kpi.name),
            ));
        }
    }
    Ok(())
}

pub fn validate_timeline(timeline: &Timeline) -> DomainResult<()> {
    if timeline.end <= timeline.start {
        return Err(invalid("timeline", "end date must be after start date"));
    }
    if timeline.milestones.len() > MILESTONES_MAX {
        return Err(invalid("timeline", format!("at most {MILESTONES_MAX} milestones")));
    }
    if let Some(m) = timeline
        .milestones
        .iter()
        .find(|m| m.date < timeline.start || m.date > timeline.end)
    {
        return Err(invalid(
            "timeline",
            format!("milestone '{}' on {} is outside the timeline", m.description, m.date),
        ));
    }
    Ok(())
}

pub fn validate_details(details: &NodeDetails) -> DomainResult<()> {
    validate_progress(details.progress)?;
    validate_amount("budget", details.budget)?;
    validate_amount("spent", details.spent)?;
    validate_team(&details.team)?;
    details.kpis.iter().try_for_each(validate_kpi)?;
    if let Some(timeline) = &details.timeline {
        validate_timeline(timeline)?;
    }
    if let Some(task) = details.tasks.iter().find(|t| t.progress > 100) {
        return Err(invalid(
            "tasks",
            format!("task '{}' progress must be at most 100", task.title),
        ));
    }
    Ok(())
}

/// Check every editable attribute of `node`.
pub fn validate_node(node: &Node) -> DomainResult<()> {
    validate_name(&node.name)?;
    validate_description(&node.description)?;
    validate_details(&node.details)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_charset() {
        assert!(validate_name("Digital Workplace").is_ok());
        assert!(validate_name("R&D").is_err());
        assert!(validate_name("ab").is_err());
    }
}

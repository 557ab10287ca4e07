//! Command dispatch: load the document, run the operation, save, report.

use std::path::Path;
use std::str::FromStr;

use clap::CommandFactory;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::services::{DragController, DragOutcome, Session};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{document_dir, global_config_path, local_config_path, Settings};
use crate::domain::{
    DomainError, HierarchyTree, Mutation, NewNode, NodeId, NodePatch, NodeType, Point,
    PortfolioSummary, PositionResolver,
};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::InfraError;

fn parse<T: FromStr<Err = DomainError>>(value: &str) -> CliResult<T> {
    Ok(value.parse::<T>()?)
}

fn fmt_point(point: Option<Point>) -> String {
    match point {
        Some(p) => format!("({:.1}, {:.1})", p.x, p.y),
        None => "-".to_string(),
    }
}

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage("no command given, see --help".into()));
    };

    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        clap_complete::generate(*shell, &mut cmd, name, &mut std::io::stdout());
        return Ok(());
    }

    let (settings, path) = Settings::for_document(cli.file.as_deref())?;
    let local_dir = document_dir(&path);
    let container = ServiceContainer::new(settings);

    match command {
        Commands::Init { force } => cmd_init(&container, &path, *force),
        Commands::Layout { reset, dry_run } => cmd_layout(&container, &path, *reset, *dry_run),
        Commands::List => cmd_list(&container, &path),
        Commands::Tree => cmd_tree(&container, &path),
        Commands::Slots {
            node_type,
            parent,
            rings,
        } => cmd_slots(&container, &path, node_type, parent.as_deref(), *rings),
        Commands::Add {
            parent,
            name,
            node_type,
            category,
            description,
            budget,
        } => {
            let attrs = NewNode {
                name: name.clone(),
                node_type: node_type.as_deref().map(parse).transpose()?,
                category: category.as_deref().map(parse).transpose()?,
                description: description.clone().unwrap_or_default(),
                budget: *budget,
            };
            cmd_mutate(
                &container,
                &path,
                Mutation::Add {
                    parent: NodeId::from(parent.as_str()),
                    attrs,
                },
            )
        }
        Commands::Update {
            id,
            name,
            status,
            progress,
            budget,
            spent,
            category,
            description,
        } => {
            let patch = NodePatch {
                name: name.clone(),
                status: status.as_deref().map(parse).transpose()?,
                progress: *progress,
                budget: *budget,
                spent: *spent,
                category: category.as_deref().map(parse).transpose()?,
                description: description.clone(),
                ..NodePatch::default()
            };
            if patch.is_empty() {
                return Err(CliError::InvalidArgs("nothing to update".into()));
            }
            cmd_mutate(
                &container,
                &path,
                Mutation::Update {
                    id: NodeId::from(id.as_str()),
                    patch,
                },
            )
        }
        Commands::Remove { id } => cmd_mutate(
            &container,
            &path,
            Mutation::Remove {
                id: NodeId::from(id.as_str()),
            },
        ),
        Commands::Reparent {
            id,
            parent,
            keep_position,
        } => cmd_mutate(
            &container,
            &path,
            Mutation::Reparent {
                id: NodeId::from(id.as_str()),
                parent: NodeId::from(parent.as_str()),
                keep_position: *keep_position,
            },
        ),
        Commands::Promote { id } => cmd_mutate(
            &container,
            &path,
            Mutation::Promote {
                id: NodeId::from(id.as_str()),
            },
        ),
        Commands::Demote { id, parent } => cmd_mutate(
            &container,
            &path,
            Mutation::Demote {
                id: NodeId::from(id.as_str()),
                parent: NodeId::from(parent.as_str()),
            },
        ),
        Commands::Unlink { id } => cmd_mutate(
            &container,
            &path,
            Mutation::Unlink {
                id: NodeId::from(id.as_str()),
            },
        ),
        Commands::Reset { id } => cmd_mutate(
            &container,
            &path,
            Mutation::ResetPosition {
                id: NodeId::from(id.as_str()),
            },
        ),
        Commands::Drag { id, x, y, parent } => cmd_drag(
            &container,
            &path,
            &NodeId::from(id.as_str()),
            Point::new(*x, *y),
            parent.as_deref().map(NodeId::from).as_ref(),
        ),
        Commands::Status => cmd_status(&container, &path),
        Commands::Config { command } => cmd_config(&container, command, &local_dir),
        Commands::Completion { .. } => Ok(()),
    }
}

fn save(container: &ServiceContainer, path: &Path, session: &Session) -> CliResult<()> {
    container.documents().save(path, session.nodes())?;
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn cmd_init(container: &ServiceContainer, path: &Path, force: bool) -> CliResult<()> {
    let nodes = container.documents().init(path, force)?;
    let session = container.session(nodes)?;
    save(container, path, &session)?;
    output::success(&format!(
        "Initialized {} with {} nodes",
        path.display(),
        session.nodes().len()
    ));
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn cmd_layout(container: &ServiceContainer, path: &Path, reset: bool, dry_run: bool) -> CliResult<()> {
    let mut session = container.open(path)?;
    if reset {
        session.reset_layout()?;
    }
    if dry_run {
        print_nodes(&session);
        return Ok(());
    }
    save(container, path, &session)?;
    output::success(&format!("Laid out {} nodes", session.nodes().len()));
    Ok(())
}

fn print_nodes(session: &Session) {
    output::header(&format!(
        "{:<24} {:<10} {:<28} {:<20} {}",
        "ID", "TYPE", "NAME", "PARENT", "POSITION"
    ));
    for node in session.nodes() {
        output::info(&format!(
            "{:<24} {:<10} {:<28} {:<20} {}",
            node.id,
            node.node_type,
            node.name,
            node.parent_id.as_ref().map(NodeId::as_str).unwrap_or("-"),
            fmt_point(node.position)
        ));
    }
}

fn cmd_list(container: &ServiceContainer, path: &Path) -> CliResult<()> {
    let session = container.open(path)?;
    print_nodes(&session);
    Ok(())
}

fn cmd_tree(container: &ServiceContainer, path: &Path) -> CliResult<()> {
    let session = container.open(path)?;
    let tree = HierarchyTree::build(session.nodes())?;
    output::info(&tree.to_tree_string());
    Ok(())
}

fn cmd_slots(
    container: &ServiceContainer,
    path: &Path,
    node_type: &str,
    parent: Option<&str>,
    rings: Option<usize>,
) -> CliResult<()> {
    let node_type: NodeType = parse(node_type)?;
    let layout = container.settings.layout_config();
    let orbit = layout.orbit_for(node_type).ok_or_else(|| {
        CliError::InvalidArgs(format!("{node_type} nodes are not placed on rings"))
    })?;
    let rings = rings.unwrap_or(orbit.rings.len());

    // Anchor and occupancy come from the document when there is one
    let session = if container.fs.exists(path) {
        Some(container.open(path)?)
    } else {
        None
    };
    let anchor = match (parent, &session) {
        (Some(id), Some(session)) => {
            let node = session.node(&NodeId::from(id))?;
            node.position.unwrap_or(layout.center)
        }
        (Some(_), None) => {
            return Err(CliError::Usage(format!(
                "--parent needs a node document, {} not found",
                path.display()
            )))
        }
        (None, _) => layout.center,
    };
    let occupied = session.as_ref().map(Session::occupancy);

    let resolver = PositionResolver::new(layout.clone());
    output::header(&format!("{node_type} slots around {}", fmt_point(Some(anchor))));
    for slot in resolver.candidate_slots(node_type, anchor, rings) {
        let holder = occupied
            .as_ref()
            .and_then(|o| o.occupant_at(&slot.position))
            .map(|id| format!("  [{id}]"))
            .unwrap_or_default();
        output::detail(&format!(
            "ring {} slot {:>2}  r={:<6} {:>6.1}°  {}{}",
            slot.ring,
            slot.index,
            slot.radius,
            slot.angle.to_degrees(),
            fmt_point(Some(slot.position)),
            holder
        ));
    }
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn cmd_mutate(container: &ServiceContainer, path: &Path, mutation: Mutation) -> CliResult<()> {
    let op = mutation.name();
    let mut session = container.open(path)?;
    let id = session.apply(mutation)?;
    save(container, path, &session)?;

    match session.nodes().get(&id) {
        Some(node) => output::action(op, &format!("{} ({}) at {}", node.name, id, fmt_point(node.position))),
        None => output::action(op, &id),
    }
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn cmd_drag(
    container: &ServiceContainer,
    path: &Path,
    id: &NodeId,
    pointer: Point,
    parent: Option<&NodeId>,
) -> CliResult<()> {
    let mut session = container.open(path)?;
    let mut drag = DragController::new();
    drag.begin(&session, id, parent)?;
    if drag.pointer_moved(&session, pointer)?.is_none() {
        debug!("nearest slot is taken");
    }

    match drag.end(&mut session)? {
        DragOutcome::Committed { node, slot } => {
            save(container, path, &session)?;
            output::success(&format!(
                "Dropped {} on ring {} slot {} at {}",
                node,
                slot.ring,
                slot.index,
                fmt_point(Some(slot.position))
            ));
        }
        DragOutcome::Rejected { node, occupant } => {
            output::warning(&format!("{node} not moved: slot is occupied by {occupant}"));
        }
        DragOutcome::Cancelled { node } => {
            output::warning(&format!("{node} not moved: no drop target"));
        }
    }
    Ok(())
}

fn cmd_status(container: &ServiceContainer, path: &Path) -> CliResult<()> {
    let session = container.open(path)?;
    let summary = PortfolioSummary::from_nodes(session.nodes());

    output::header(&format!(
        "{:<28} {:<10} {:>8} {:<10} {:>14} {:>14}",
        "NAME", "TYPE", "PROGRESS", "HEALTH", "BUDGET", "SPENT"
    ));
    for s in &summary.nodes {
        output::info(&format!(
            "{:<28} {:<10} {:>7}% {:<10} {:>14.0} {:>14.0}",
            s.name, s.node_type, s.progress, s.health, s.budget, s.spent
        ));
    }
    output::info(&format!(
        "\nTotal budget {:.0}, spent {:.0} ({:.1}%)",
        summary.total_budget, summary.total_spent, summary.utilisation
    ));
    if !summary.at_risk.is_empty() {
        output::warning(&format!("at risk: {}", summary.at_risk.iter().join(", ")));
    }
    if !summary.delayed.is_empty() {
        output::error(&format!("delayed: {}", summary.delayed.iter().join(", ")));
    }
    Ok(())
}

fn cmd_config(container: &ServiceContainer, command: &ConfigCommands, local_dir: &Path) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
        }
        ConfigCommands::Path => {
            let marker = |p: &Path| if p.exists() { "" } else { " (not found)" };
            match global_config_path() {
                Some(p) => output::action("global", &format!("{}{}", p.display(), marker(p.as_path()))),
                None => output::action("global", &"unavailable"),
            }
            let local = local_config_path(local_dir);
            output::action("local", &format!("{}{}", local.display(), marker(local.as_path())));
        }
        ConfigCommands::Init { global } => {
            let target = if *global {
                global_config_path()
                    .ok_or_else(|| CliError::Usage("no config directory on this system".into()))?
            } else {
                local_config_path(local_dir)
            };
            if target.exists() {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    target.display()
                )));
            }
            let fs = RealFileSystem;
            fs.ensure_parent(&target)
                .and_then(|_| fs.write(&target, &Settings::template()))
                .map_err(|e| InfraError::io(format!("write {}", target.display()), e))?;
            output::success(&format!("Created {}", target.display()));
        }
    }
    Ok(())
}

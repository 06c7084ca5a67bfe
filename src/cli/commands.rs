//! Command dispatch and handlers

use std::collections::HashMap;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::CommandFactory;
use generational_arena::Index;
use termtree::Tree;
use tracing::{debug, instrument};

use crate::application::services::{DropResolution, RevertReason};
use crate::application::wire::{PersistRequest, PersistResponse};
use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, HierarchyVariant, Settings};
use crate::domain::{
    Bounds, Division, EmployeeId, Forest, LayoutEngine, LayoutPolicy, ParentRef, PersonName,
    Point, Reassignment,
};
use crate::exitcode;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::{AutoConfirm, FileSystem, RealFileSystem};
use crate::infrastructure::InfraError;

/// Run the parsed command line; returns the process exit code.
pub fn execute_command(cli: &Cli) -> CliResult<i32> {
    let project_dir = resolve_project_dir(cli.project_dir.as_deref())?;
    debug!("execute_command: project_dir={}", project_dir.display());

    let Some(command) = &cli.command else {
        Cli::command()
            .print_help()
            .map_err(|e| InfraError::io("print help", e))?;
        return Ok(exitcode::OK);
    };

    match command {
        Commands::Config { command } => cmd_config(command, &project_dir, &RealFileSystem),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(exitcode::OK)
        }
        command => {
            let container = build_container(cli, &project_dir, command)?;
            dispatch(&container, command)
        }
    }
}

fn dispatch(container: &ServiceContainer, command: &Commands) -> CliResult<i32> {
    match command {
        Commands::Tree => cmd_tree(container),
        Commands::Check => cmd_check(container),
        Commands::Layout {
            policy,
            width,
            height,
            json,
        } => cmd_layout(container, *policy, *width, *height, *json),
        Commands::Reassign {
            employee,
            supervisor,
            ..
        } => {
            let change = Reassignment::Supervisor {
                employee: parse_employee(employee)?,
                supervisor: parse_parent(supervisor)?,
            };
            cmd_reassign(container, change)
        }
        Commands::MoveDivision {
            employee,
            division,
            under,
            ..
        } => cmd_move_division(container, employee, *division, under.as_deref()),
        Commands::Drag { employee, to, .. } => cmd_drag(container, parse_employee(employee)?, *to),
        Commands::Apply { file } => cmd_apply(container, file),
        Commands::Review { today } => cmd_review(container, *today),
        Commands::Config { .. } | Commands::Completion { .. } => Ok(exitcode::OK),
    }
}

fn resolve_project_dir(dir: Option<&Path>) -> CliResult<PathBuf> {
    match dir {
        Some(dir) => Ok(dir.to_path_buf()),
        None => std::env::current_dir()
            .map_err(|e| CliError::from(InfraError::io("determine current directory", e))),
    }
}

fn build_container(
    cli: &Cli,
    project_dir: &Path,
    command: &Commands,
) -> CliResult<ServiceContainer> {
    let mut settings = Settings::load(Some(project_dir))?;
    if let Some(store) = &cli.store {
        settings.override_store_path(store.clone(), Some(project_dir));
    }
    debug!("build_container: store={}", settings.store_path.display());

    let container = ServiceContainer::new(settings);
    let yes = matches!(
        command,
        Commands::Reassign { yes: true, .. }
            | Commands::MoveDivision { yes: true, .. }
            | Commands::Drag { yes: true, .. }
    );
    Ok(if yes {
        container.with_confirmer(Arc::new(AutoConfirm(true)))
    } else {
        container
    })
}

fn parse_employee(text: &str) -> CliResult<EmployeeId> {
    text.parse()
        .map_err(|_| CliError::InvalidArgs(format!("not an employee id: {text}")))
}

/// `42`, `#42`, or `First Last`.
fn parse_parent(text: &str) -> CliResult<ParentRef> {
    if let Ok(id) = text.parse::<EmployeeId>() {
        return Ok(ParentRef::Id(id));
    }
    match text.trim().split_once(char::is_whitespace) {
        Some((first, last)) if !last.trim().is_empty() => {
            Ok(ParentRef::Name(PersonName::new(first, last)))
        }
        _ => Err(CliError::InvalidArgs(format!(
            "expected an id or \"First Last\": {text}"
        ))),
    }
}

fn label(forest: &Forest, id: EmployeeId) -> String {
    forest
        .get(id)
        .map(|n| n.data.to_string())
        .unwrap_or_else(|| id.to_string())
}

/// Children are built before their parent, so depth never grows the stack.
fn to_tree(forest: &Forest, id: EmployeeId) -> Tree<String> {
    let Some(root) = forest.index_of(id) else {
        return Tree::new(id.to_string());
    };
    let mut built: HashMap<Index, Tree<String>> = HashMap::new();
    for (idx, node) in forest.subtree_postorder(root) {
        let leaves: Vec<Tree<String>> = node
            .children
            .iter()
            .filter_map(|child| built.remove(child))
            .collect();
        built.insert(idx, Tree::new(node.data.to_string()).with_leaves(leaves));
    }
    built
        .remove(&root)
        .unwrap_or_else(|| Tree::new(label(forest, id)))
}

#[instrument(skip(container))]
fn cmd_tree(container: &ServiceContainer) -> CliResult<i32> {
    let forest = container.hierarchy().fetch()?;
    if forest.is_empty() {
        output::warning("hierarchy is empty");
        return Ok(exitcode::OK);
    }

    if container.settings.variant == HierarchyVariant::Division {
        for division in Division::ALL {
            let roots: Vec<_> = forest
                .root_ids()
                .into_iter()
                .filter(|&r| forest.get(r).and_then(|n| n.data.division) == Some(division))
                .collect();
            if roots.is_empty() {
                continue;
            }
            output::header(&division);
            for root in roots {
                output::info(&to_tree(&forest, root));
            }
        }
        let unassigned: Vec<_> = forest
            .root_ids()
            .into_iter()
            .filter(|&r| forest.get(r).and_then(|n| n.data.division).is_none())
            .collect();
        if !unassigned.is_empty() {
            output::header("unassigned");
            for root in unassigned {
                output::info(&to_tree(&forest, root));
            }
        }
    } else {
        for root in forest.root_ids() {
            output::info(&to_tree(&forest, root));
        }
    }
    Ok(exitcode::OK)
}

#[instrument(skip(container))]
fn cmd_check(container: &ServiceContainer) -> CliResult<i32> {
    let forest = container.hierarchy().fetch()?;
    forest.verify()?;
    output::success(&format!(
        "{} employees in {} tree(s), depth {}",
        forest.len(),
        forest.roots().len(),
        forest.depth()
    ));
    for root in forest.root_ids() {
        output::detail(&format!(
            "{} heads {} employee(s)",
            label(&forest, root),
            forest.descendants(root).len() + 1
        ));
    }
    Ok(exitcode::OK)
}

#[instrument(skip(container))]
fn cmd_layout(
    container: &ServiceContainer,
    policy: Option<LayoutPolicy>,
    width: Option<f64>,
    height: Option<f64>,
    json: bool,
) -> CliResult<i32> {
    let forest = container.hierarchy().fetch()?;

    let mut config = container.settings.layout.clone();
    if let Some(policy) = policy {
        config.policy = policy;
    }
    let canvas = container.settings.canvas;
    let bounds = Bounds::new(width.unwrap_or(canvas.width), height.unwrap_or(canvas.height));
    let layout = LayoutEngine::new(config).layout(&forest, bounds);

    if json {
        let body = serde_json::to_string_pretty(layout.nodes())
            .map_err(|e| serialize_err("serialize layout", e))?;
        output::info(&body);
        return Ok(exitcode::OK);
    }

    for node in layout.nodes() {
        output::info(&format!(
            "{:>6}  {:<28} x={:>8.1} y={:>8.1} depth={}",
            node.id.to_string(),
            node.label,
            node.rect.x,
            node.rect.y,
            node.depth
        ));
    }
    Ok(exitcode::OK)
}

/// Confirm `change`, commit it, and print where the employee ended up.
fn commit(container: &ServiceContainer, change: Reassignment, prompt: &str) -> CliResult<i32> {
    if !container.confirmer.confirm(prompt) {
        output::warning("not confirmed, nothing changed");
        return Ok(exitcode::REVERTED);
    }
    let forest = container.hierarchy().reassign(&change)?;
    output::success(&change);
    report_position(&forest, change.employee());
    Ok(exitcode::OK)
}

fn report_position(forest: &Forest, id: EmployeeId) {
    let chain: Vec<_> = forest
        .chain_of_command(id)
        .into_iter()
        .map(|s| label(forest, s))
        .collect();
    if chain.is_empty() {
        output::detail(&format!("{} heads a tree", label(forest, id)));
    } else {
        output::detail(&format!("{} -> {}", label(forest, id), chain.join(" -> ")));
    }
}

#[instrument(skip(container))]
fn cmd_reassign(container: &ServiceContainer, change: Reassignment) -> CliResult<i32> {
    let prompt = format!("Apply: {}?", change);
    commit(container, change, &prompt)
}

#[instrument(skip(container))]
fn cmd_move_division(
    container: &ServiceContainer,
    employee: &str,
    division: Division,
    under: Option<&str>,
) -> CliResult<i32> {
    if container.settings.variant != HierarchyVariant::Division {
        return Err(CliError::Usage(
            "move-division needs variant = \"division\" in the config".to_string(),
        ));
    }
    let change = Reassignment::Division {
        employee: parse_employee(employee)?,
        division,
        supervisor: under.map(parse_parent).transpose()?,
    };
    let prompt = format!("Apply: {}?", change);
    commit(container, change, &prompt)
}

#[instrument(skip(container))]
fn cmd_drag(container: &ServiceContainer, employee: EmployeeId, to: Point) -> CliResult<i32> {
    match container.interaction().replay_drag(employee, to)? {
        DropResolution::Committed {
            change,
            forest,
            layout,
        } => {
            output::success(&change);
            report_position(&forest, employee);
            if let Some(rect) = layout.rect_of(employee) {
                output::detail(&format!("now drawn at ({:.1}, {:.1})", rect.x, rect.y));
            }
            Ok(exitcode::OK)
        }
        DropResolution::Reverted {
            reason: RevertReason::Rejected(e),
        } => Err(e.into()),
        DropResolution::Reverted { reason } => {
            output::warning(&format!("{}, nothing changed", reason));
            Ok(exitcode::REVERTED)
        }
    }
}

#[instrument(skip(container))]
fn cmd_apply(container: &ServiceContainer, file: &Path) -> CliResult<i32> {
    let body = if file == Path::new("-") {
        let mut body = String::new();
        io::stdin()
            .read_to_string(&mut body)
            .map_err(|e| InfraError::io("read request from stdin", e))?;
        body
    } else {
        container
            .fs
            .read_to_string(file)
            .map_err(|e| InfraError::io(format!("read {}", file.display()), e))?
    };

    let response = match serde_json::from_str::<PersistRequest>(&body) {
        Ok(request) => container.hierarchy().respond(&request),
        Err(e) => PersistResponse::failed(format!("invalid request: {e}")),
    };
    let rendered =
        serde_json::to_string(&response).map_err(|e| serialize_err("serialize response", e))?;
    output::info(&rendered);

    Ok(if response.success {
        exitcode::OK
    } else {
        exitcode::DATAERR
    })
}

#[instrument(skip(container))]
fn cmd_review(container: &ServiceContainer, today: Option<chrono::NaiveDate>) -> CliResult<i32> {
    let today = today.unwrap_or_else(|| chrono::Local::now().date_naive());
    let notices = container.review().notices(today)?;
    if notices.is_empty() {
        output::success(&format!("no raise reviews due on {}", today));
        return Ok(exitcode::OK);
    }

    output::header(&format!("Raise reviews due on {}", today));
    for notice in &notices {
        output::info(&format!(
            "{} ({}): salary since {}, raise effective {}",
            notice.employee.name,
            notice.employee.id,
            notice.salary_effective_date,
            notice.payroll_increase_date
        ));
        let mut recipients = format!("to {}", notice.immediate_supervisor.name);
        if let Some(ultimate) = &notice.ultimate_supervisor {
            recipients.push_str(&format!(", cc {}", ultimate.name));
        }
        output::detail(&recipients);
    }
    Ok(exitcode::OK)
}

fn cmd_config(
    command: &ConfigCommands,
    project_dir: &Path,
    fs: &dyn FileSystem,
) -> CliResult<i32> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(Some(project_dir))?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Init { global } => {
            let path = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("cannot determine global config directory".to_string())
                })?
            } else {
                local_config_path(project_dir)
            };
            init_config(fs, &path)?;
            output::action("Created", &path.display());
        }
        ConfigCommands::Path => {
            let local = local_config_path(project_dir);
            match global_config_path() {
                Some(global) => output::info(&format!(
                    "global: {}{}",
                    global.display(),
                    marker(fs, &global)
                )),
                None => output::info("global: (unavailable)"),
            }
            output::info(&format!("local:  {}{}", local.display(), marker(fs, &local)));
        }
    }
    Ok(exitcode::OK)
}

/// Write the config template to `path`; never overwrites.
fn init_config(fs: &dyn FileSystem, path: &Path) -> CliResult<()> {
    if fs.exists(path) {
        return Err(CliError::Usage(format!(
            "config already exists: {}",
            path.display()
        )));
    }
    fs.ensure_parent(path)
        .map_err(|e| InfraError::io(format!("create parent of {}", path.display()), e))?;
    fs.write(path, &Settings::template())
        .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
    Ok(())
}

fn marker(fs: &dyn FileSystem, path: &Path) -> &'static str {
    if fs.exists(path) {
        ""
    } else {
        " (not found)"
    }
}

fn serialize_err(context: &str, e: serde_json::Error) -> CliError {
    CliError::from(ApplicationError::OperationFailed {
        context: context.to_string(),
        source: Box::new(e),
    })
}

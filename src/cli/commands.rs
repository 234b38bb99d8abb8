//! Command dispatch: one function per subcommand

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_dir, global_config_path, Settings};
use crate::domain::{Bundle, EntryType, EntryValue, Group, NodeMut, SettingsError};
use crate::infrastructure::{InfraError, ServiceContainer};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    let container = ServiceContainer::new(settings);

    match &cli.command {
        Commands::Tree { file } => cmd_tree(&container, file),
        Commands::List { file } => cmd_list(&container, file),
        Commands::Get { file, path } => cmd_get(&container, file, path),
        Commands::Set {
            file,
            path,
            value,
            null,
        } => {
            let value = if *null { None } else { value.as_deref() };
            cmd_set(&container, file, path, value)
        }
        Commands::AddRoot { file, id, desc } => {
            cmd_add_root(&container, file, id, desc.as_deref())
        }
        Commands::AddEntry {
            file,
            group,
            id,
            entry_type,
            value,
            desc,
        } => cmd_add_entry(
            &container,
            file,
            group,
            id,
            *entry_type,
            value.as_deref(),
            desc.as_deref(),
        ),
        Commands::AddGroup {
            file,
            group,
            id,
            desc,
        } => cmd_add_group(&container, file, group, id, desc.as_deref()),
        Commands::Remove {
            file,
            path,
            recursive,
        } => cmd_remove(&container, file, path, *recursive),
        Commands::New { file, desc } => cmd_new(&container, file, desc.clone()),
        Commands::Check { path } => cmd_check(&container, path),
        Commands::Config { command } => cmd_config(&container, command),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    }
}

// ============================================================
// Read-only commands
// ============================================================

fn cmd_tree(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let bundle = container.bundles().load(file)?;
    output::info(&bundle.to_tree());
    Ok(())
}

fn cmd_list(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let bundle = container.bundles().load(file)?;
    for root in bundle.roots() {
        for node in root.iter() {
            if let Some(value) = node.value() {
                output::info(&format!(
                    "{} ({}) = {}",
                    node.path(),
                    node.entry_type(),
                    value
                ));
            }
        }
    }
    Ok(())
}

fn cmd_get(container: &ServiceContainer, file: &Path, path: &str) -> CliResult<()> {
    let bundle = container.bundles().load(file)?;
    let node = bundle
        .get_by_path(path)?
        .ok_or_else(|| SettingsError::NotFound(path.to_string()))?;

    if node.value().is_some() {
        output::info(&node);
        return Ok(());
    }
    output::header(&node.path());
    if let Some(desc) = node.description() {
        output::detail(&desc);
    }
    for child in node.children() {
        output::detail(&format!("{} ({})", child.id(), child.entry_type()));
    }
    Ok(())
}

fn cmd_check(container: &ServiceContainer, path: &Path) -> CliResult<()> {
    let outcomes = container.bundles().check(path)?;
    if outcomes.is_empty() {
        output::warning(&format!(
            "no .{} files found in {}",
            container.settings.extension,
            path.display()
        ));
        return Ok(());
    }

    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(nodes) => output::success_detail(&format!(
                "{} ({} nodes)",
                outcome.path.display(),
                nodes
            )),
            Err(e) => {
                failed += 1;
                output::failure(&format!("{}: {}", outcome.path.display(), e));
            }
        }
    }
    if failed > 0 {
        return Err(CliError::CheckFailed {
            failed,
            total: outcomes.len(),
        });
    }
    Ok(())
}

// ============================================================
// Mutating commands: load, change, save
// ============================================================

fn save(container: &ServiceContainer, bundle: &Bundle, file: &Path) -> CliResult<()> {
    if let Some(backup) = container.bundles().save(bundle, file)? {
        output::detail(&format!("backup: {}", backup.display()));
    }
    Ok(())
}

/// Mutable handle to the node at `path`; a miss is an error here.
fn node_at<'a>(bundle: &'a mut Bundle, path: &str) -> CliResult<NodeMut<'a>> {
    bundle
        .get_by_path_mut(path)?
        .ok_or_else(|| SettingsError::NotFound(path.to_string()).into())
}

#[instrument(level = "debug", skip(container))]
fn cmd_set(
    container: &ServiceContainer,
    file: &Path,
    path: &str,
    value: Option<&str>,
) -> CliResult<()> {
    let mut bundle = container.bundles().load(file)?;
    let mut node = node_at(&mut bundle, path)?;
    let entry_type = node.view().entry_type();
    if entry_type == EntryType::Group {
        return Err(SettingsError::WrongKind {
            id: path.to_string(),
            expected: "entry",
            actual: "group",
        }
        .into());
    }
    let value = match value {
        Some(text) => EntryValue::parse(entry_type, text)?,
        None => EntryValue::empty(entry_type)?,
    };
    debug!("set {} = {:?}", path, value);
    node.set_value(value)?;

    save(container, &bundle, file)?;
    output::action("Updated", &path);
    Ok(())
}

fn cmd_add_root(
    container: &ServiceContainer,
    file: &Path,
    id: &str,
    desc: Option<&str>,
) -> CliResult<()> {
    let mut bundle = container.bundles().load(file)?;
    let path = bundle.add_root_with(id, Vec::new(), desc)?;
    save(container, &bundle, file)?;
    output::action("Added root", &path);
    Ok(())
}

fn cmd_add_entry(
    container: &ServiceContainer,
    file: &Path,
    group: &str,
    id: &str,
    entry_type: EntryType,
    value: Option<&str>,
    desc: Option<&str>,
) -> CliResult<()> {
    let value = match value {
        Some(text) => EntryValue::parse(entry_type, text)?,
        None => EntryValue::empty(entry_type)?,
    };
    let mut bundle = container.bundles().load(file)?;
    let path = node_at(&mut bundle, group)?.add_entry(id, value, desc)?;
    save(container, &bundle, file)?;
    output::action("Added entry", &path);
    Ok(())
}

fn cmd_add_group(
    container: &ServiceContainer,
    file: &Path,
    group: &str,
    id: &str,
    desc: Option<&str>,
) -> CliResult<()> {
    let mut child = Group::empty(id)?;
    if let Some(desc) = desc {
        child = child.with_description(desc);
    }
    let mut bundle = container.bundles().load(file)?;
    let path = node_at(&mut bundle, group)?.add(child)?;
    save(container, &bundle, file)?;
    output::action("Added group", &path);
    Ok(())
}

fn cmd_remove(
    container: &ServiceContainer,
    file: &Path,
    path: &str,
    recursive: bool,
) -> CliResult<()> {
    let mut bundle = container.bundles().load(file)?;
    match path.rsplit_once('.') {
        None => {
            bundle.remove_root(path, recursive)?;
        }
        Some((parent, id)) => {
            let mut parent = node_at(&mut bundle, parent)?;
            let is_group = parent.view().get(id)?.is_group();
            if is_group {
                parent.remove_group(id, recursive)?;
            } else {
                parent.remove_entry(id)?;
            }
        }
    }
    save(container, &bundle, file)?;
    output::action("Removed", &path);
    Ok(())
}

fn cmd_new(container: &ServiceContainer, file: &Path, desc: Option<String>) -> CliResult<()> {
    if container.fs.exists(file) {
        return Err(CliError::Usage(format!(
            "{} already exists",
            file.display()
        )));
    }
    container.bundles().create(file, desc)?;
    output::action("Created", &file.display());
    Ok(())
}

// ============================================================
// Config
// ============================================================

fn cmd_config(container: &ServiceContainer, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
        }
        ConfigCommands::Path => match global_config_path() {
            Some(path) => {
                let status = if path.exists() { "exists" } else { "not found" };
                output::info(&format!("{} ({})", path.display(), status));
            }
            None => output::warning("no config directory available on this platform"),
        },
        ConfigCommands::Init => {
            let (Some(dir), Some(path)) = (global_config_dir(), global_config_path()) else {
                return Err(CliError::Usage(
                    "no config directory available on this platform".into(),
                ));
            };
            if container.fs.exists(&path) {
                return Err(CliError::Usage(format!(
                    "{} already exists",
                    path.display()
                )));
            }
            container
                .fs
                .create_dir_all(&dir)
                .map_err(|e| InfraError::io("create", &dir, e))?;
            container
                .fs
                .write_atomic(&path, &Settings::template())
                .map_err(|e| InfraError::io("write", &path, e))?;
            output::action("Created", &path.display());
        }
    }
    Ok(())
}

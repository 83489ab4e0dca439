//! Command dispatch

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::AppContext;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{DestroyPolicy, Traversal};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;
use crate::tree_traits::TreeNodeConvert;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let project_dir = match &cli.project_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().map_err(|e| InfraError::io("current directory", e))?,
    };
    let settings = Settings::load(Some(&project_dir))?;
    debug!(?settings, "settings loaded");

    match &cli.command {
        Some(Commands::Tree { scene }) => cmd_tree(settings, scene),
        Some(Commands::Run {
            scene,
            frames,
            policy,
            traversal,
        }) => cmd_run(settings, scene, *frames, *policy, *traversal),
        Some(Commands::Destroy {
            scene,
            name,
            policy,
        }) => cmd_destroy(settings, scene, name, *policy),
        Some(Commands::Config { command }) => cmd_config(&settings, &project_dir, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "cobra", &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, try `cobra --help`".to_string(),
        )),
    }
}

#[instrument(skip(settings))]
fn cmd_tree(settings: Settings, scene: &str) -> CliResult<()> {
    let container = ServiceContainer::new(settings);
    let ctx = AppContext::init((*container.settings).clone());
    let scene = container.load_scene(scene, &ctx.scene_builder())?;
    output::info(&scene.to_tree_string());
    Ok(())
}

#[instrument(skip(settings))]
fn cmd_run(
    mut settings: Settings,
    scene: &str,
    frames: Option<u64>,
    policy: Option<DestroyPolicy>,
    traversal: Option<Traversal>,
) -> CliResult<()> {
    if let Some(policy) = policy {
        settings.destroy_policy = policy;
    }
    if let Some(traversal) = traversal {
        settings.traversal = traversal;
    }
    let frames = frames.unwrap_or(settings.frames);
    if frames == 0 {
        return Err(CliError::InvalidArgs("frames must be at least 1".to_string()));
    }

    let container = ServiceContainer::new(settings.clone());
    let mut ctx = AppContext::init(settings);
    let scene = container.load_scene(scene, &ctx.scene_builder())?;
    let journal = scene.journal().clone();
    let names = scene.live_names();

    output::header(&scene.to_tree_string());
    ctx.mount(scene);
    let report = ctx.run(frames)?;

    output::action("Painted", &format!("{} frame(s), {} update(s)", report.frames, report.paints));
    for name in &names {
        output::detail(&format!("{}: {} paint(s)", name, journal.paints_of(name)));
    }
    if report.released > 0 {
        output::warning(&format!("{} object(s) expired during the run", report.released));
    }
    if report.frames < frames {
        output::warning(&format!("scene emptied after {} frame(s)", report.frames));
    }

    let released = ctx.shutdown();
    output::action("Released", &format!("{} object(s) at shutdown", released));
    Ok(())
}

#[instrument(skip(settings))]
fn cmd_destroy(
    settings: Settings,
    scene: &str,
    name: &str,
    policy: Option<DestroyPolicy>,
) -> CliResult<()> {
    let container = ServiceContainer::new(settings);
    let ctx = AppContext::init((*container.settings).clone());
    let mut scene = container.load_scene(scene, &ctx.scene_builder())?;
    let policy = policy.unwrap_or(ctx.settings().destroy_policy);

    output::header("Before:");
    output::info(&scene.to_tree_string());

    let count = scene.destroy(name, Some(policy))?;
    output::action("Destroyed", &format!("{} ({}, {} released)", name, policy, count));
    for released in scene.journal().released() {
        output::released(&released);
    }

    output::header("After:");
    output::info(&scene.to_tree_string());
    Ok(())
}

fn cmd_config(settings: &Settings, project_dir: &Path, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&settings.to_toml()?),
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &path.display()),
                None => output::warning("no config directory for this platform"),
            }
            output::action("local", &local_config_path(project_dir).display());
        }
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(())
}

// src/cli/handlers/new.rs

//! Creates an application from the wizard's answers or a preset.

use anyhow::{Context, Result};
use colored::Colorize;
use std::{
    collections::HashMap,
    env, fs,
    io::{self, Write},
    path::Path,
};

use super::{
    commons::{self, WizardError},
    wizard::{self, Mode},
};
use crate::{
    cli::Cli,
    constants::OUTPUT_INDENT,
    core::{
        dotenv,
        plan::{self, PlanOptions, ProjectPlan},
        preset_store::{self, PresetStore},
    },
    models::Preset,
    system::{
        batch::CommandBatch,
        executor::{CommandRunner, OutputSettings},
        settings,
    },
};

/// The wizard's entry point: resolves the options, then creates the application.
pub fn handle(cli: &Cli) -> Result<()> {
    let settings = settings::load_settings().context(t!("new.error.settings"))?;
    let mut store = PresetStore::new();

    let requested = check_requests(cli, &mut store)?;

    if !cli.quiet {
        commons::print_banner();
    }

    let mode = match requested {
        Some(preset) => Mode::Preset(preset),
        None if cli.interactive => Mode::Interactive,
        None => wizard::choose_mode(&mut store)?,
    };

    let parent_dir = dunce::simplified(&env::current_dir()?).to_path_buf();
    let name = match &cli.name {
        Some(name) => commons::validate_project_name(name)?,
        None => wizard::ask_project_name()?,
    };
    let replace_existing = resolve_existing(&parent_dir, &name, cli.force, wizard::confirm_force)?;

    let interactive = matches!(mode, Mode::Interactive);
    let preset = match mode {
        Mode::Preset(preset) => preset,
        Mode::Interactive => wizard::build_preset(&name, cli.advanced, &settings)?,
    };

    let save_as = match &cli.save_preset {
        Some(preset_name) => Some(preset_name.clone()),
        None if interactive => wizard::ask_save_preset(&name)?,
        None => None,
    };
    // Losing the preset is not worth losing the application.
    if let Some(preset_name) = save_as
        && let Err(e) = save_preset(&mut store, &preset, preset_name)
    {
        log::warn!("Saving the preset failed: {:#}", e);
        println!(
            "  {}",
            format!(t!("new.warning.preset_not_saved"), error = e).yellow()
        );
    }

    let project_plan = plan::build_plan(
        &preset,
        &name,
        &parent_dir,
        &settings,
        PlanOptions { git: cli.git },
    );
    let runner = CommandRunner::new(OutputSettings::detect(cli.quiet));
    log::debug!("Plan for '{}': {:?}", name, project_plan);

    if cli.dry_run {
        print_dry_run(&runner, &project_plan, &parent_dir, replace_existing);
        return Ok(());
    }

    if replace_existing {
        log::debug!("Removing {}", project_plan.directory.display());
        fs::remove_dir_all(&project_plan.directory).with_context(|| {
            format!(
                t!("new.error.remove_existing"),
                path = project_plan.directory.display()
            )
        })?;
    }

    execute(&runner, &project_plan, &parent_dir)?;
    print_report(&project_plan);
    Ok(())
}

/// Validates the preset flags before anything is asked.
///
/// Returns the preset named by `--preset`. A missing preset or an unusable
/// `--save-preset` name fails here rather than after the questions.
fn check_requests(cli: &Cli, store: &mut PresetStore) -> Result<Option<Preset>> {
    if let Some(name) = &cli.save_preset {
        preset_store::validate_name(name)?;
    }
    match &cli.preset {
        Some(name) => Ok(Some(store.require(name)?.clone())),
        None => Ok(None),
    }
}

/// Decides what happens when the target directory is already taken.
///
/// Returns whether the existing directory must be removed first. Installing
/// into a non-empty current directory is never allowed.
fn resolve_existing(
    parent_dir: &Path,
    name: &str,
    force: bool,
    confirm: impl FnOnce(&Path) -> Result<bool, WizardError>,
) -> Result<bool, WizardError> {
    if !commons::application_exists(parent_dir, name) {
        return Ok(false);
    }
    let directory = commons::installation_directory(parent_dir, name);
    if name == "." {
        return Err(WizardError::ApplicationExists(directory));
    }
    if force || confirm(&directory)? {
        Ok(true)
    } else {
        Err(WizardError::Cancelled)
    }
}

fn save_preset(store: &mut PresetStore, preset: &Preset, preset_name: String) -> Result<()> {
    let named = Preset {
        name: preset_name,
        ..preset.clone()
    };
    let path = store.save(&named)?;
    println!(
        "  {}",
        format!(t!("new.info.preset_saved"), name = named.name, path = path.display()).green()
    );
    Ok(())
}

/// The name the project's database is derived from.
fn project_label(project_plan: &ProjectPlan) -> String {
    project_plan
        .directory
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| project_plan.name.clone())
}

/// Runs both batches, pointing the `.env` files at the database in between.
fn execute(runner: &CommandRunner, project_plan: &ProjectPlan, parent_dir: &Path) -> Result<()> {
    let batch = CommandBatch::new();
    let env_vars = HashMap::new();
    let mut stdout = io::stdout();

    println!("{}", t!("new.info.creating").bold());
    batch.append_all(project_plan.create.iter().cloned());
    runner
        .run_stashed(&batch, Some(parent_dir), &env_vars, &mut stdout)?
        .into_result()?;

    dotenv::configure_database(
        &project_plan.directory,
        project_plan.database,
        &project_label(project_plan),
    )
    .context(t!("new.error.dotenv"))?;

    println!("\n{}", t!("new.info.configuring").bold());
    batch.append_all(project_plan.setup.iter().cloned());
    runner
        .run_stashed(&batch, Some(&project_plan.directory), &env_vars, &mut stdout)?
        .into_result()?;

    stdout.flush()?;
    Ok(())
}

fn print_dry_run(
    runner: &CommandRunner,
    project_plan: &ProjectPlan,
    parent_dir: &Path,
    replace_existing: bool,
) {
    println!("{}", t!("new.dry_run.header").yellow().bold());

    if replace_existing {
        println!(
            "\n  {}",
            format!(
                t!("new.dry_run.remove"),
                path = project_plan.directory.display()
            )
            .dimmed()
        );
    }

    println!(
        "\n  {}",
        format!(t!("new.dry_run.in"), path = parent_dir.display()).dimmed()
    );
    println!("{}{}", OUTPUT_INDENT, runner.render(&project_plan.create));

    println!(
        "\n  {}",
        format!(
            t!("new.dry_run.dotenv"),
            database = project_plan.database.label()
        )
        .dimmed()
    );

    if !project_plan.setup.is_empty() {
        println!(
            "\n  {}",
            format!(
                t!("new.dry_run.in"),
                path = project_plan.directory.display()
            )
            .dimmed()
        );
        println!("{}{}", OUTPUT_INDENT, runner.render(&project_plan.setup));
    }
}

fn print_report(project_plan: &ProjectPlan) {
    println!(
        "\n  {}",
        format!(t!("new.success"), name = project_label(project_plan))
            .green()
            .bold()
    );
    println!("\n  {}", t!("new.next_steps").bold());
    for step in &project_plan.next_steps {
        println!("  {} {}", "➜".cyan(), step);
    }
    println!();
}

// src/cli/handlers/wizard.rs

//! The interactive questions that turn into a [`Preset`].

use colored::Colorize;
use dialoguer::{Confirm, Input, MultiSelect, Select, theme::ColorfulTheme};
use std::collections::HashSet;
use std::path::Path;

use super::commons::{WizardError, validate_project_name};
use crate::{
    constants::DEV_VERSION,
    core::preset_store::{self, PresetStore},
    models::{
        Database, DevEnvironment, DevEnvironmentOptions, LaravelOptions, Preset, Settings, Stack,
        StackFeature, StarterKit, TestFramework,
    },
    system::tools,
};

/// Services offered when Sail is the development environment.
const SAIL_SERVICES: &[&str] = &[
    "mysql",
    "pgsql",
    "mariadb",
    "redis",
    "memcached",
    "meilisearch",
    "mailpit",
    "minio",
];

const DEFAULT_SERVE_PORT: u16 = 8000;

/// How the project's options are obtained.
#[derive(Debug)]
pub enum Mode {
    /// Use a stored preset as is.
    Preset(Preset),
    /// Ask every question.
    Interactive,
}

fn select_index(prompt: &str, labels: &[String], default: usize) -> Result<usize, WizardError> {
    Ok(Select::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .items(labels)
        .default(default)
        .interact()?)
}

/// Picks one of `options`, showing each with `label`.
fn select_one<T: Copy + PartialEq>(
    prompt: &str,
    options: &[T],
    label: impl Fn(T) -> String,
    default: Option<T>,
) -> Result<T, WizardError> {
    let labels: Vec<String> = options.iter().map(|option| label(*option)).collect();
    let default_index = default
        .and_then(|value| options.iter().position(|option| *option == value))
        .unwrap_or(0);
    let index = select_index(prompt, &labels, default_index)?;
    options.get(index).copied().ok_or(WizardError::Cancelled)
}

fn confirm(prompt: &str, default: bool) -> Result<bool, WizardError> {
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(default)
        .interact()?)
}

/// Shows the main menu until the user settles on a preset or the interactive questions.
pub fn choose_mode(store: &mut PresetStore) -> anyhow::Result<Mode> {
    let menu = [
        t!("wizard.menu.preset").to_string(),
        t!("wizard.menu.interactive").to_string(),
    ];

    loop {
        let choice = select_index(t!("wizard.menu.prompt"), &menu, 0)?;
        if choice == 1 {
            return Ok(Mode::Interactive);
        }

        let presets: Vec<Preset> = store.list(true)?.values().cloned().collect();
        if presets.is_empty() {
            println!("\n  {}\n", t!("wizard.menu.no_presets").yellow());
            continue;
        }

        let mut labels: Vec<String> = presets.iter().map(describe_preset).collect();
        labels.push(t!("wizard.menu.back").to_string());
        let back = presets.len();

        let index = select_index(t!("wizard.preset.prompt"), &labels, back)?;
        if let Some(preset) = presets.get(index) {
            return Ok(Mode::Preset(preset.clone()));
        }
    }
}

/// A one-line summary of a preset for the picker.
pub fn describe_preset(preset: &Preset) -> String {
    let options = &preset.laravel_options;
    let mut parts = vec![options.effective_starter_kit().label().to_string()];
    if let Some(stack) = options.stack {
        parts.push(stack.label().to_string());
    }
    parts.push(options.effective_database().label().to_string());
    parts.push(options.effective_test_framework().label().to_string());
    format!("{} {}", preset.name, format!("({})", parts.join(", ")).dimmed())
}

/// Asks for the project name until it passes validation.
pub fn ask_project_name() -> Result<String, WizardError> {
    let name: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("wizard.prompt.name"))
        .validate_with(|input: &String| -> Result<(), String> {
            validate_project_name(input)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()?;
    validate_project_name(&name)
}

/// Asks whether an existing application directory may be replaced.
pub fn confirm_force(directory: &Path) -> Result<bool, WizardError> {
    confirm(
        &format!(t!("wizard.prompt.force"), path = directory.display()),
        false,
    )
}

fn ask_laravel_version(settings: &Settings) -> Result<Option<String>, WizardError> {
    let labels = [
        format!(
            t!("wizard.version.latest"),
            version = settings.default_laravel_version
        ),
        t!("wizard.version.dev").to_string(),
        t!("wizard.version.other").to_string(),
    ];
    match select_index(t!("wizard.version.prompt"), &labels, 0)? {
        0 => Ok(Some(settings.default_laravel_version.clone())),
        1 => Ok(Some(DEV_VERSION.to_string())),
        _ => {
            let version: String = Input::with_theme(&ColorfulTheme::default())
                .with_prompt(t!("wizard.version.custom"))
                .validate_with(|input: &String| -> Result<(), &str> {
                    if input.trim().is_empty() || input.contains(char::is_whitespace) {
                        Err(t!("wizard.version.invalid"))
                    } else {
                        Ok(())
                    }
                })
                .interact_text()?;
            Ok(Some(version.trim().to_string()))
        }
    }
}

fn dev_environment_label(environment: DevEnvironment) -> String {
    if tools::is_dev_environment_available(environment) {
        environment.label().to_string()
    } else {
        format!(
            t!("wizard.dev_env.not_installed"),
            label = environment.label()
        )
    }
}

fn ask_dev_environment(options: &mut LaravelOptions) -> Result<(), WizardError> {
    let installed = DevEnvironment::ALL
        .iter()
        .copied()
        .find(|env| env.required_executable().is_some() && tools::is_dev_environment_available(*env))
        .unwrap_or(DevEnvironment::BuiltIn);

    let environment = select_one(
        t!("wizard.dev_env.prompt"),
        DevEnvironment::ALL,
        dev_environment_label,
        Some(installed),
    )?;

    if !tools::is_dev_environment_available(environment) {
        println!(
            "  {}",
            format!(t!("wizard.dev_env.missing_warning"), label = environment.label()).yellow()
        );
    }

    let mut environment_options = DevEnvironmentOptions::default();
    match environment {
        DevEnvironment::BuiltIn => {
            let port: u16 = Input::with_theme(&ColorfulTheme::default())
                .with_prompt(t!("wizard.dev_env.port"))
                .default(DEFAULT_SERVE_PORT)
                .interact_text()?;
            environment_options.port = Some(port);
        }
        DevEnvironment::Sail => {
            let selected = MultiSelect::with_theme(&ColorfulTheme::default())
                .with_prompt(t!("wizard.dev_env.services"))
                .items(SAIL_SERVICES)
                .interact()?;
            environment_options.services = selected
                .into_iter()
                .filter_map(|index| SAIL_SERVICES.get(index))
                .map(|service| service.to_string())
                .collect();
        }
        DevEnvironment::Herd | DevEnvironment::Valet => {}
    }

    options.dev_environment = Some(environment);
    options.dev_environment_options = environment_options;
    Ok(())
}

fn ask_stack_features(
    kit: StarterKit,
    stack: Stack,
) -> Result<Vec<StackFeature>, WizardError> {
    let available = StackFeature::available_for(kit, stack);
    match available.as_slice() {
        [] => Ok(Vec::new()),
        [only] => {
            let wanted = confirm(
                &format!(t!("wizard.feature.confirm"), feature = only.label()),
                false,
            )?;
            Ok(if wanted { vec![*only] } else { Vec::new() })
        }
        _ => {
            let labels: Vec<&str> = available.iter().map(|feature| feature.label()).collect();
            let selected = MultiSelect::with_theme(&ColorfulTheme::default())
                .with_prompt(t!("wizard.feature.prompt"))
                .items(&labels)
                .interact()?;
            Ok(selected
                .into_iter()
                .filter_map(|index| available.get(index).copied())
                .collect())
        }
    }
}

fn ask_starter_kit(options: &mut LaravelOptions) -> Result<(), WizardError> {
    let kit = select_one(
        t!("wizard.starter_kit.prompt"),
        StarterKit::ALL,
        |kit| kit.label().to_string(),
        Some(StarterKit::Blank),
    )?;
    options.starter_kit = Some(kit);

    if kit == StarterKit::Blank {
        options.stack = None;
        options.stack_options.clear();
        return Ok(());
    }

    let stack = select_one(
        t!("wizard.stack.prompt"),
        Stack::for_starter_kit(kit),
        |stack| stack.label().to_string(),
        None,
    )?;
    options.stack = Some(stack);
    options.stack_options = ask_stack_features(kit, stack)?;
    Ok(())
}

/// Databases in prompt order: engines whose PDO extension is loaded come
/// first, each paired with whether it is usable. Unknown extensions count as loaded.
fn database_choices(extensions: Option<&HashSet<String>>) -> Vec<(Database, bool)> {
    let mut choices: Vec<(Database, bool)> = Database::ALL
        .iter()
        .map(|database| {
            let loaded = extensions.is_none_or(|loaded| loaded.contains(database.pdo_extension()));
            (*database, loaded)
        })
        .collect();
    // Stable, so each group keeps the declaration order.
    choices.sort_by_key(|(_, loaded)| !loaded);
    choices
}

fn ask_database(options: &mut LaravelOptions, settings: &Settings) -> Result<(), WizardError> {
    let extensions = tools::php_extensions(&settings.php);
    let choices = database_choices(extensions.as_ref());
    let labels: Vec<String> = choices
        .iter()
        .map(|(database, loaded)| {
            if *loaded {
                database.label().to_string()
            } else {
                format!(t!("wizard.database.missing_pdo"), label = database.label())
            }
        })
        .collect();

    let index = select_index(t!("wizard.database.prompt"), &labels, 0)?;
    let (database, _) = choices.get(index).copied().ok_or(WizardError::Cancelled)?;
    options.database = Some(database);
    options.migrate = Some(confirm(t!("wizard.database.migrate"), true)?);
    Ok(())
}

fn ask_test_framework(options: &mut LaravelOptions) -> Result<(), WizardError> {
    options.test_framework = Some(select_one(
        t!("wizard.test_framework.prompt"),
        TestFramework::ALL,
        |framework| framework.label().to_string(),
        Some(TestFramework::Pest),
    )?);
    Ok(())
}

/// Runs every question and collects the answers into a preset named `name`.
///
/// The Laravel version and the development environment are only asked in
/// advanced mode.
pub fn build_preset(name: &str, advanced: bool, settings: &Settings) -> Result<Preset, WizardError> {
    let mut preset = Preset::new(name);

    if advanced {
        preset.laravel_version = ask_laravel_version(settings)?;
        ask_dev_environment(&mut preset.laravel_options)?;
    }
    ask_starter_kit(&mut preset.laravel_options)?;
    ask_database(&mut preset.laravel_options, settings)?;
    ask_test_framework(&mut preset.laravel_options)?;

    Ok(preset)
}

/// Offers to save the answers, returning the preset name to save them under.
pub fn ask_save_preset(default_name: &str) -> Result<Option<String>, WizardError> {
    if !confirm(t!("wizard.save.confirm"), false)? {
        return Ok(None);
    }
    let name: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("wizard.save.name"))
        .default(default_name.to_string())
        .validate_with(|input: &String| -> Result<(), String> {
            preset_store::validate_name(input.trim()).map_err(|e| e.to_string())
        })
        .interact_text()?;
    Ok(Some(name.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_preset_lists_effective_choices() {
        colored::control::set_override(false);
        let mut preset = Preset::new("acme");
        preset.laravel_options.stack = Some(Stack::Vue);
        preset.laravel_options.database = Some(Database::Pgsql);

        let description = describe_preset(&preset);
        assert!(description.starts_with("acme ("));
        assert!(description.contains(StarterKit::Breeze.label()));
        assert!(description.contains(Stack::Vue.label()));
        assert!(description.contains(Database::Pgsql.label()));
        assert!(description.contains(TestFramework::Pest.label()));
    }

    #[test]
    fn test_databases_with_loaded_pdo_come_first() {
        let loaded: HashSet<String> = ["pdo_pgsql", "pdo_sqlite"]
            .into_iter()
            .map(String::from)
            .collect();

        let choices = database_choices(Some(&loaded));
        assert_eq!(
            choices,
            vec![
                (Database::Sqlite, true),
                (Database::Pgsql, true),
                (Database::Mysql, false),
                (Database::Mariadb, false),
                (Database::Sqlsrv, false),
            ]
        );
    }

    #[test]
    fn test_unknown_extensions_keep_every_database_available() {
        let choices = database_choices(None);
        assert!(choices.iter().all(|(_, loaded)| *loaded));
        let order: Vec<Database> = choices.into_iter().map(|(database, _)| database).collect();
        assert_eq!(order, Database::ALL.to_vec());
    }

    #[test]
    fn test_sail_services_cover_every_server_database() {
        for database in Database::ALL {
            if let Some(service) = database.sail_service() {
                assert!(SAIL_SERVICES.contains(&service), "{service} missing");
            }
        }
    }
}

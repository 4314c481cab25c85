// src/core/plan.rs

//! Turns a preset into the shell commands that materialize a project.

use crate::constants::LARAVEL_PACKAGE;
use crate::models::{
    Database, DevEnvironment, Preset, Settings, Stack, StackFeature, StarterKit, TestFramework,
};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Choices that are not part of a preset.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanOptions {
    /// Initialize a git repository and commit the fresh application.
    pub git: bool,
}

/// Everything needed to create one project.
///
/// Commands are split in two batches: `create` runs in the parent directory and
/// produces the project directory, `setup` runs inside it once the `.env`
/// files have been pointed at `database`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPlan {
    /// The name given on the command line (`.` for the current directory).
    pub name: String,
    /// Where the application ends up.
    pub directory: PathBuf,
    /// Commands run in the parent directory.
    pub create: Vec<String>,
    /// Commands run inside `directory`.
    pub setup: Vec<String>,
    /// The engine the `.env` files are pointed at.
    pub database: Database,
    /// Shown to the user once everything succeeded.
    pub next_steps: Vec<String>,
}

/// Quotes a shell argument for the platform shell.
fn quote(value: &str) -> String {
    if cfg!(target_os = "windows") {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        shlex::try_quote(value).map_or_else(|_| value.replace('\0', ""), Cow::into_owned)
    }
}

fn feature_flags(kit: StarterKit, stack: Stack, features: &[StackFeature]) -> Vec<String> {
    StackFeature::available_for(kit, stack)
        .into_iter()
        .filter(|feature| features.contains(feature))
        .map(|feature| format!("--{}", feature.key()))
        .collect()
}

fn starter_kit_commands(preset: &Preset, settings: &Settings) -> Vec<String> {
    let options = &preset.laravel_options;
    let pest = options.effective_test_framework() == TestFramework::Pest;
    let kit = options.effective_starter_kit();

    let (package, install, default_stack) = match kit {
        StarterKit::Breeze => ("laravel/breeze --dev", "breeze:install", Stack::Blade),
        StarterKit::Jetstream => ("laravel/jetstream", "jetstream:install", Stack::Livewire),
        StarterKit::Blank => {
            if !pest {
                return Vec::new();
            }
            // The skeleton ships PHPUnit; swap it for Pest.
            return vec![
                format!("{} remove phpunit/phpunit --dev --no-update", settings.composer),
                format!(
                    "{} require pestphp/pest pestphp/pest-plugin-laravel --no-update --dev",
                    settings.composer
                ),
                format!("{} update", settings.composer),
                format!("{} ./vendor/bin/pest --init", settings.php),
            ];
        }
    };

    let stack = options
        .stack
        .filter(|stack| Stack::for_starter_kit(kit).contains(stack))
        .unwrap_or(default_stack);

    let mut install_command = format!("{} artisan {} {}", settings.php, install, stack.key());
    for flag in feature_flags(kit, stack, &options.stack_options) {
        install_command.push(' ');
        install_command.push_str(&flag);
    }
    if pest {
        install_command.push_str(" --pest");
    }

    vec![
        format!("{} require {}", settings.composer, package),
        install_command,
    ]
}

fn dev_environment_commands(preset: &Preset, settings: &Settings) -> Vec<String> {
    let options = &preset.laravel_options;
    match options.dev_environment {
        Some(DevEnvironment::Herd) => vec!["herd link".to_string()],
        Some(DevEnvironment::Valet) => vec!["valet link".to_string()],
        Some(DevEnvironment::Sail) => {
            let mut services = options.dev_environment_options.services.clone();
            if services.is_empty()
                && let Some(service) = options.effective_database().sail_service()
            {
                services.push(service.to_string());
            }
            let mut command = format!("{} artisan sail:install", settings.php);
            if !services.is_empty() {
                command.push_str(&format!(" --with={}", services.join(",")));
            }
            vec![command]
        }
        Some(DevEnvironment::BuiltIn) | None => Vec::new(),
    }
}

fn next_steps(preset: &Preset, name: &str) -> Vec<String> {
    let options = &preset.laravel_options;
    let mut steps = Vec::new();
    if name != "." {
        steps.push(format!("cd {}", quote(name)));
    }
    match options.dev_environment {
        Some(DevEnvironment::Herd) | Some(DevEnvironment::Valet) => {
            steps.push(format!("Open http://{}.test", name.to_lowercase()));
        }
        Some(DevEnvironment::Sail) => {
            steps.push("./vendor/bin/sail up -d".to_string());
            if options.migrate == Some(true) {
                steps.push("./vendor/bin/sail artisan migrate".to_string());
            }
        }
        Some(DevEnvironment::BuiltIn) | None => {
            let port = options.dev_environment_options.port.unwrap_or(8000);
            steps.push(format!("php artisan serve --port={}", port));
        }
    }
    steps
}

/// Builds the command plan that turns `preset` into a project named `name`
/// inside `parent_dir`. A name of `.` installs into `parent_dir` itself.
pub fn build_plan(
    preset: &Preset,
    name: &str,
    parent_dir: &Path,
    settings: &Settings,
    plan_options: PlanOptions,
) -> ProjectPlan {
    let options = &preset.laravel_options;

    let mut create_command = format!(
        "{} create-project {} {}",
        settings.composer,
        LARAVEL_PACKAGE,
        quote(name)
    );
    if let Some(constraint) = preset.version_constraint() {
        create_command.push(' ');
        create_command.push_str(&quote(&constraint));
    }
    create_command.push_str(" --remove-vcs --prefer-dist");

    let mut setup = Vec::new();
    if !cfg!(target_os = "windows") {
        setup.push("chmod 755 artisan".to_string());
    }
    setup.extend(starter_kit_commands(preset, settings));
    setup.extend(dev_environment_commands(preset, settings));

    // Sail databases only exist once the containers are up.
    if options.migrate == Some(true) && options.dev_environment != Some(DevEnvironment::Sail) {
        setup.push(format!("{} artisan migrate --force", settings.php));
    }

    if plan_options.git {
        setup.extend([
            "git init -q".to_string(),
            "git add .".to_string(),
            "git commit -q -m \"Set up a fresh Laravel app\"".to_string(),
        ]);
    }

    let directory = if name == "." {
        parent_dir.to_path_buf()
    } else {
        parent_dir.join(name)
    };

    ProjectPlan {
        name: name.to_string(),
        directory,
        create: vec![create_command],
        setup,
        database: options.effective_database(),
        next_steps: next_steps(preset, name),
    }
}

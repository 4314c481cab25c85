// src/models.rs

//! Data types persisted by architect: presets and user settings.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::constants::DEV_VERSION;

// --- PRESET MODELS (What is read from `<name>.json`) ---

/// A named, persisted bundle of scaffolding choices.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    /// Display label and storage key (the file stem).
    pub name: String,
    /// A major version such as `"11"`, a full constraint, or `"dev-master"`.
    pub laravel_version: Option<String>,
    /// Everything the wizard asked for.
    #[serde(default)]
    pub laravel_options: LaravelOptions,
}

impl Preset {
    /// Creates an empty preset, to be filled field by field by the wizard.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Parses a preset document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Returns the Composer version constraint for `create-project`, if any.
    ///
    /// A bare major (`"11"`) becomes `"11.*"`; the development marker and
    /// explicit constraints are passed through.
    pub fn version_constraint(&self) -> Option<String> {
        let version = self.laravel_version.as_deref()?.trim();
        if version.is_empty() {
            return None;
        }
        if version == DEV_VERSION {
            return Some(DEV_VERSION.to_string());
        }
        if version.chars().all(|c| c.is_ascii_digit()) {
            return Some(format!("{}.*", version));
        }
        Some(version.to_string())
    }
}

/// Typed replacement for the free-form options map of a preset.
///
/// Every field is optional so that partially specified presets still load.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct LaravelOptions {
    /// Starter kit; inferred from `stack` when missing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starter_kit: Option<StarterKit>,
    /// Front-end stack installed by the starter kit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<Stack>,
    /// Optional features passed to the starter kit installer.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stack_options: Vec<StackFeature>,
    /// Database engine; SQLite when missing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<Database>,
    /// Run the default migrations once the application is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrate: Option<bool>,
    /// Where the application is served during development.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_environment: Option<DevEnvironment>,
    /// Settings specific to `dev_environment`.
    #[serde(skip_serializing_if = "DevEnvironmentOptions::is_empty")]
    pub dev_environment_options: DevEnvironmentOptions,
    /// Test framework; Pest when missing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_framework: Option<TestFramework>,
}

impl LaravelOptions {
    /// The starter kit, inferred from the stack when older presets omit it.
    pub fn effective_starter_kit(&self) -> StarterKit {
        match (self.starter_kit, self.stack) {
            (Some(kit), _) => kit,
            (None, Some(Stack::Inertia)) => StarterKit::Jetstream,
            (None, Some(_)) => StarterKit::Breeze,
            (None, None) => StarterKit::Blank,
        }
    }

    /// The database, defaulting to SQLite like a fresh Laravel skeleton.
    pub fn effective_database(&self) -> Database {
        self.database.unwrap_or(Database::Sqlite)
    }

    /// The test framework, defaulting to Pest.
    pub fn effective_test_framework(&self) -> TestFramework {
        self.test_framework.unwrap_or(TestFramework::Pest)
    }
}

/// Extra answers for the chosen development environment.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct DevEnvironmentOptions {
    /// Port of the PHP built-in server. Accepts `8000` or `"8000"`.
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_port"
    )]
    pub port: Option<u16>,
    /// Sail services to install.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<String>,
}

impl DevEnvironmentOptions {
    /// Whether nothing was answered.
    pub fn is_empty(&self) -> bool {
        self.port.is_none() && self.services.is_empty()
    }
}

/// Reads a port stored either as a number or as text typed into a prompt.
fn deserialize_port<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPort {
        Number(u16),
        Text(String),
    }

    match Option::<RawPort>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawPort::Number(port)) => Ok(Some(port)),
        Some(RawPort::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(RawPort::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid port '{}'", text))),
    }
}

/// Declares a fieldless enum whose serialized form doubles as its command-line token.
macro_rules! keyed_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $key:literal, $label:literal;)+ }
    ) => {
        $(#[$meta])*
        #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $(
                #[doc = $label]
                #[serde(rename = $key)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in prompt order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The token used in preset files and shell commands.
            pub fn key(self) -> &'static str {
                match self {
                    $(Self::$variant => $key,)+
                }
            }

            /// The human readable name shown in prompts.
            pub fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.key())
            }
        }
    };
}

keyed_enum! {
    /// First-party starter kits.
    StarterKit {
        Blank => "none", "No starter kit";
        Breeze => "breeze", "Laravel Breeze";
        Jetstream => "jetstream", "Laravel Jetstream";
    }
}

keyed_enum! {
    /// Front-end stacks offered by the starter kits.
    Stack {
        Blade => "blade", "Blade with Alpine";
        Livewire => "livewire", "Livewire (Volt Class API) with Alpine";
        LivewireFunctional => "livewire-functional", "Livewire (Volt Functional API) with Alpine";
        React => "react", "React with Inertia";
        Vue => "vue", "Vue with Inertia";
        Api => "api", "API only";
        Inertia => "inertia", "Vue with Inertia";
    }
}

impl Stack {
    /// Stacks installable with the given starter kit.
    pub fn for_starter_kit(kit: StarterKit) -> &'static [Self] {
        match kit {
            StarterKit::Blank => &[],
            StarterKit::Breeze => &[
                Self::Blade,
                Self::Livewire,
                Self::LivewireFunctional,
                Self::React,
                Self::Vue,
                Self::Api,
            ],
            StarterKit::Jetstream => &[Self::Livewire, Self::Inertia],
        }
    }

    /// Whether the stack renders through Inertia.
    pub fn is_inertia(self) -> bool {
        matches!(self, Self::React | Self::Vue | Self::Inertia)
    }
}

keyed_enum! {
    /// Optional starter kit features, passed as `--<key>` flags to the installers.
    StackFeature {
        Dark => "dark", "Dark mode";
        Ssr => "ssr", "Inertia SSR";
        Typescript => "typescript", "TypeScript";
        Eslint => "eslint", "ESLint with Prettier";
        Api => "api", "API support";
        Verification => "verification", "Email verification";
        Teams => "teams", "Team support";
    }
}

impl StackFeature {
    /// Features the installer accepts for a kit and stack, in prompt order.
    pub fn available_for(kit: StarterKit, stack: Stack) -> Vec<Self> {
        match kit {
            StarterKit::Blank => Vec::new(),
            StarterKit::Breeze if stack.is_inertia() => {
                vec![Self::Dark, Self::Ssr, Self::Typescript, Self::Eslint]
            }
            StarterKit::Breeze if stack == Stack::Api => Vec::new(),
            StarterKit::Breeze => vec![Self::Dark],
            StarterKit::Jetstream => {
                let mut features = vec![Self::Api, Self::Dark, Self::Verification, Self::Teams];
                if stack == Stack::Inertia {
                    features.push(Self::Ssr);
                }
                features
            }
        }
    }
}

keyed_enum! {
    /// Database engines supported by a fresh application.
    Database {
        Sqlite => "sqlite", "SQLite";
        Mysql => "mysql", "MySQL";
        Mariadb => "mariadb", "MariaDB";
        Pgsql => "pgsql", "PostgreSQL";
        Sqlsrv => "sqlsrv", "SQL Server";
    }
}

impl Database {
    /// The Sail service providing this database, if Sail ships one.
    pub fn sail_service(self) -> Option<&'static str> {
        match self {
            Self::Mysql => Some("mysql"),
            Self::Mariadb => Some("mariadb"),
            Self::Pgsql => Some("pgsql"),
            Self::Sqlite | Self::Sqlsrv => None,
        }
    }

    /// The PHP extension the framework needs to talk to this database.
    pub fn pdo_extension(self) -> &'static str {
        match self {
            Self::Sqlite => "pdo_sqlite",
            Self::Mysql | Self::Mariadb => "pdo_mysql",
            Self::Pgsql => "pdo_pgsql",
            Self::Sqlsrv => "pdo_sqlsrv",
        }
    }
}

keyed_enum! {
    /// Local development environments.
    DevEnvironment {
        Herd => "herd", "Herd";
        BuiltIn => "none", "PHP built-in server";
        Valet => "valet", "Valet";
        Sail => "sail", "Laravel Sail";
    }
}

impl DevEnvironment {
    /// The executable that must be on `PATH` for this environment to work.
    pub fn required_executable(self) -> Option<&'static str> {
        match self {
            Self::Herd => Some("herd"),
            Self::Valet => Some("valet"),
            Self::Sail => Some("docker"),
            Self::BuiltIn => None,
        }
    }
}

keyed_enum! {
    /// Test frameworks.
    TestFramework {
        Pest => "pest", "Pest";
        Phpunit => "phpunit", "PHPUnit";
    }
}

// --- `settings.toml` MODELS ---

/// User settings read from `~/.laravel-architect/settings.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// The Composer executable (may include arguments, e.g. `php composer.phar`).
    pub composer: String,
    /// The PHP executable used to run `artisan`.
    pub php: String,
    /// Version proposed by the wizard in advanced mode.
    pub default_laravel_version: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            composer: "composer".to_string(),
            php: "php".to_string(),
            default_laravel_version: "11".to_string(),
        }
    }
}

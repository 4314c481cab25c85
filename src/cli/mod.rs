//! Command-line arguments and the wizard behind them.

use clap::Parser;

pub mod handlers;

/// architect: an interactive wizard that scaffolds Laravel applications.
#[derive(Parser, Debug, Default)]
#[command(
    name = "architect",
    author,
    version,
    about,
    styles = clap::builder::Styles::styled()
        .header(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .usage(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .literal(clap::builder::styling::AnsiColor::Cyan.on_default().bold())
        .placeholder(clap::builder::styling::AnsiColor::Green.on_default()),
)]
pub struct Cli {
    /// The name of the application. Use `.` to install into the current directory.
    pub name: Option<String>,

    /// Skip the menu and go straight to the interactive questions.
    #[arg(short, long, conflicts_with = "preset")]
    pub interactive: bool,

    /// Create the application from a saved preset.
    #[arg(short, long, value_name = "PRESET")]
    pub preset: Option<String>,

    /// Also ask for the Laravel version and the development environment.
    #[arg(short, long)]
    pub advanced: bool,

    /// Print the commands instead of running them.
    #[arg(long)]
    pub dry_run: bool,

    /// Show debug logs.
    #[arg(short, long)]
    pub debug: bool,

    /// Pass `--quiet` to the commands that build the application.
    #[arg(short, long)]
    pub quiet: bool,

    /// Install even if the target directory already exists.
    #[arg(short, long)]
    pub force: bool,

    /// Initialize a git repository and commit the fresh application.
    #[arg(long)]
    pub git: bool,

    /// Disable colored output, for architect and for the commands it runs.
    #[arg(long)]
    pub no_ansi: bool,

    /// Save the answers as a preset under this name without asking.
    #[arg(long, value_name = "PRESET")]
    pub save_preset: Option<String>,
}

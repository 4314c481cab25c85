//! # System Interaction Layer
//!
//! Abstractions over the operating system: spawning the external tools that
//! build a project, and reading the user's settings.
//!
//! ## Modules
//!
//! - **`batch`**: the ordered list of shell commands waiting to run.
//! - **`executor`**: rewrites a batch for the current output stream, runs it as
//!   one `&&`-joined shell line and streams the output back.
//! - **`settings`**: loads `settings.toml`, creating it with defaults.
//! - **`tools`**: detects the developer tools installed on `PATH`.

pub mod batch;
pub mod executor;
pub mod settings;
pub mod tools;

// src/core/dotenv.rs

//! Points a fresh application's `.env` files at the chosen database.

use crate::models::Database;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// The connection keys a fresh skeleton ships commented out for SQLite.
const CONNECTION_KEYS: &[&str] = &["DB_HOST", "DB_PORT", "DB_DATABASE", "DB_USERNAME", "DB_PASSWORD"];

fn db_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<comment>#\s*)?(?P<key>DB_[A-Z_]+)=(?P<value>.*)$")
            .unwrap_or_else(|e| unreachable!("static regex is valid: {e}"))
    })
}

fn default_port(database: Database) -> Option<&'static str> {
    match database {
        Database::Mysql | Database::Mariadb => Some("3306"),
        Database::Pgsql => Some("5432"),
        Database::Sqlsrv => Some("1433"),
        Database::Sqlite => None,
    }
}

/// Derives a database name from a project name (`my-app.io` -> `my_app_io`).
pub fn database_name(project_name: &str) -> String {
    project_name
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

/// Rewrites the `DB_*` lines of an env file for `database`.
///
/// Server databases get their connection keys uncommented with a default port
/// and a database named after the project; SQLite gets them commented out.
pub fn rewrite_database_config(content: &str, database: Database, db_name: &str) -> String {
    let re = db_line_regex();
    let mut rewritten: Vec<String> = Vec::new();

    for line in content.lines() {
        let Some(caps) = re.captures(line) else {
            rewritten.push(line.to_string());
            continue;
        };
        let key = caps.name("key").map_or("", |m| m.as_str());
        let value = caps.name("value").map_or("", |m| m.as_str());

        if key == "DB_CONNECTION" {
            rewritten.push(format!("DB_CONNECTION={}", database.key()));
            continue;
        }
        if !CONNECTION_KEYS.contains(&key) {
            rewritten.push(line.to_string());
            continue;
        }

        if database == Database::Sqlite {
            rewritten.push(format!("# {}={}", key, value));
            continue;
        }

        let value = match key {
            "DB_PORT" => default_port(database).unwrap_or(value).to_string(),
            "DB_DATABASE" => db_name.to_string(),
            _ => value.to_string(),
        };
        rewritten.push(format!("{}={}", key, value));
    }

    let mut output = rewritten.join("\n");
    if content.ends_with('\n') {
        output.push('\n');
    }
    output
}

/// Applies [`rewrite_database_config`] to `.env` and `.env.example` in `project_dir`.
/// Missing files are skipped.
pub fn configure_database(
    project_dir: &Path,
    database: Database,
    project_name: &str,
) -> std::io::Result<()> {
    let db_name = database_name(project_name);
    for file in [".env", ".env.example"] {
        let path = project_dir.join(file);
        if !path.is_file() {
            log::debug!("No {} to configure in {}", file, project_dir.display());
            continue;
        }
        let content = fs::read_to_string(&path)?;
        fs::write(&path, rewrite_database_config(&content, database, &db_name))?;
        log::debug!("Configured {} for {}", path.display(), database);
    }
    Ok(())
}

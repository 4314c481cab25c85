// src/system/executor.rs

//! Runs command batches through the platform shell and streams their output.

use crate::constants::{FLAG_EXEMPT_PREFIXES, OUTPUT_INDENT};
use crate::system::batch::CommandBatch;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;
use std::process::{Command as StdCommand, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use thiserror::Error;

/// Errors raised while running a command batch.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// The shell could not be spawned.
    #[error("Command '{command}' could not be started: {source}")]
    ProcessStart {
        /// The joined command line.
        command: String,
        /// The spawn error.
        #[source]
        source: io::Error,
    },
    /// `/dev/tty` could not be opened; reported as a warning only.
    #[error("Unable to attach the terminal: {0}")]
    TtyAttach(#[source] io::Error),
    /// The child was spawned but its status could not be collected.
    #[error("Failed while waiting for '{command}': {source}")]
    Wait {
        /// The joined command line.
        command: String,
        /// The wait error.
        #[source]
        source: io::Error,
    },
    /// The chain ran and one of its commands failed.
    #[error("Command '{command}' exited with a non-zero status ({}).", describe_code(.code))]
    CommandFailure {
        /// The joined command line.
        command: String,
        /// Exit code of the chain, `None` when killed by a signal.
        code: Option<i32>,
    },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// How the output stream the commands write to behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSettings {
    /// The stream renders colors; when false every command gets `--no-ansi`.
    pub decorated: bool,
    /// The user asked for quiet output; every command gets `--quiet`.
    pub quiet: bool,
}

impl OutputSettings {
    /// Reads decoration from `colored`, which honours `NO_COLOR`, `CLICOLOR`
    /// and whether stdout is a terminal.
    pub fn detect(quiet: bool) -> Self {
        Self {
            decorated: colored::control::SHOULD_COLORIZE.should_colorize(),
            quiet,
        }
    }
}

/// Whether the child process may take over the controlling terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtyMode {
    /// Attach to `/dev/tty` when it is available (never on Windows).
    Auto,
    /// Always pipe and forward output.
    Never,
}

/// The result of running a batch.
#[derive(Debug)]
pub struct ProcessOutcome {
    command_line: String,
    status: ExitStatus,
    output: String,
}

impl ProcessOutcome {
    /// The joined shell line that was executed.
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    /// Exit status of the shell running the chain.
    pub fn status(&self) -> ExitStatus {
        self.status
    }

    /// Whether every command in the chain succeeded.
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Exit code of the chain, `None` when killed by a signal.
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    /// Combined stdout/stderr. Empty when the output went to the terminal directly.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Turns a failing exit status into [`ExecutionError::CommandFailure`].
    pub fn into_result(self) -> Result<Self, ExecutionError> {
        if self.success() {
            Ok(self)
        } else {
            Err(ExecutionError::CommandFailure {
                code: self.code(),
                command: self.command_line,
            })
        }
    }
}

/// Whether a command is left untouched by the flag rewriting passes.
fn is_flag_exempt(command: &str) -> bool {
    FLAG_EXEMPT_PREFIXES
        .iter()
        .any(|prefix| command.starts_with(prefix))
}

fn append_flag(commands: Vec<String>, flag: &str) -> Vec<String> {
    commands
        .into_iter()
        .map(|command| {
            if is_flag_exempt(&command) {
                command
            } else {
                format!("{} {}", command, flag)
            }
        })
        .collect()
}

/// Applies the output-dependent flag rewriting to a list of commands.
///
/// Undecorated output appends `--no-ansi`, quiet mode appends `--quiet`. Both
/// passes are independent and skip commands starting with `chmod` or `git`.
pub fn prepare_commands(commands: &[String], settings: OutputSettings) -> Vec<String> {
    let mut prepared = commands.to_vec();
    if !settings.decorated {
        prepared = append_flag(prepared, "--no-ansi");
    }
    if settings.quiet {
        prepared = append_flag(prepared, "--quiet");
    }
    prepared
}

/// Joins commands so that the first failure stops the chain.
pub fn join_commands(commands: &[String]) -> String {
    commands.join(" && ")
}

/// Runs batches of shell commands as a single chained invocation.
#[derive(Debug, Clone, Copy)]
pub struct CommandRunner {
    settings: OutputSettings,
    tty: TtyMode,
}

impl CommandRunner {
    /// A runner that attaches the terminal when it can.
    pub fn new(settings: OutputSettings) -> Self {
        Self {
            settings,
            tty: TtyMode::Auto,
        }
    }

    /// Overrides terminal attachment.
    pub fn with_tty(mut self, tty: TtyMode) -> Self {
        self.tty = tty;
        self
    }

    /// The output settings the commands are rewritten for.
    pub fn settings(&self) -> OutputSettings {
        self.settings
    }

    /// The exact shell line [`run`](Self::run) would execute.
    pub fn render(&self, commands: &[String]) -> String {
        join_commands(&prepare_commands(commands, self.settings))
    }

    /// Executes `commands` as one `&&`-joined shell line.
    ///
    /// Output is forwarded to `sink` line by line, each line indented, as the
    /// child produces it. When the controlling terminal can be attached the
    /// child writes to it directly instead. A failing command is not an error
    /// here: inspect the returned outcome or call
    /// [`ProcessOutcome::into_result`].
    pub fn run(
        &self,
        commands: &[String],
        working_dir: Option<&Path>,
        env_vars: &HashMap<String, String>,
        sink: &mut dyn Write,
    ) -> Result<ProcessOutcome, ExecutionError> {
        let command_line = self.render(commands);
        if command_line.trim().is_empty() {
            // An empty batch is a success, not an error.
            return Ok(ProcessOutcome {
                command_line,
                status: ExitStatus::default(),
                output: String::new(),
            });
        }

        log::debug!("Running: {}", command_line);

        let mut command = shell_command(&command_line);
        command.envs(env_vars);
        if let Some(dir) = working_dir {
            command.current_dir(dunce::simplified(dir));
        }

        if self.should_attach_tty() {
            match open_tty() {
                Ok((stdin, stdout, stderr)) => {
                    command.stdin(stdin).stdout(stdout).stderr(stderr);
                    return run_attached(command, command_line);
                }
                Err(e) => {
                    let warning = ExecutionError::TtyAttach(e);
                    log::warn!("{}", warning);
                    let _ = writeln!(sink, "  WARN {}\n", warning);
                }
            }
        }

        run_piped(command, command_line, sink)
    }

    /// Takes the pending commands out of `batch` and runs them.
    ///
    /// Commands appended to `batch` once the stash has happened belong to the
    /// next run, not this one.
    pub fn run_stashed(
        &self,
        batch: &CommandBatch,
        working_dir: Option<&Path>,
        env_vars: &HashMap<String, String>,
        sink: &mut dyn Write,
    ) -> Result<ProcessOutcome, ExecutionError> {
        let commands = batch.stash();
        self.run(&commands, working_dir, env_vars, sink)
    }

    fn should_attach_tty(&self) -> bool {
        self.tty == TtyMode::Auto
            && !cfg!(target_os = "windows")
            && Path::new("/dev/tty").exists()
    }
}

/// Builds the platform shell invocation for a joined command line.
fn shell_command(command_line: &str) -> StdCommand {
    if cfg!(target_os = "windows") {
        let mut command = StdCommand::new("cmd");
        command.arg("/C").arg(command_line);
        command
    } else {
        let mut command = StdCommand::new("sh");
        command.arg("-c").arg(command_line);
        command
    }
}

/// Opens the controlling terminal once per standard stream.
fn open_tty() -> io::Result<(File, File, File)> {
    let tty = File::options().read(true).write(true).open("/dev/tty")?;
    Ok((tty.try_clone()?, tty.try_clone()?, tty))
}

fn run_attached(
    mut command: StdCommand,
    command_line: String,
) -> Result<ProcessOutcome, ExecutionError> {
    let status = command.status().map_err(|e| ExecutionError::ProcessStart {
        command: command_line.clone(),
        source: e,
    })?;

    Ok(ProcessOutcome {
        command_line,
        status,
        output: String::new(),
    })
}

fn run_piped(
    mut command: StdCommand,
    command_line: String,
    sink: &mut dyn Write,
) -> Result<ProcessOutcome, ExecutionError> {
    let mut child = command
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ExecutionError::ProcessStart {
            command: command_line.clone(),
            source: e,
        })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let mut captured = String::new();
    let mut sink_error = None;

    thread::scope(|scope| {
        let (tx, rx) = mpsc::channel::<String>();
        if let Some(stdout) = stdout {
            let tx = tx.clone();
            scope.spawn(move || forward_lines(stdout, &tx));
        }
        if let Some(stderr) = stderr {
            let tx = tx.clone();
            scope.spawn(move || forward_lines(stderr, &tx));
        }
        drop(tx);

        // Keep draining after a sink failure so the child never blocks on a full pipe.
        for line in rx {
            if sink_error.is_none()
                && let Err(e) = write!(sink, "{}{}", OUTPUT_INDENT, line).and_then(|_| sink.flush())
            {
                sink_error = Some(e);
            }
            captured.push_str(&line);
        }
    });

    if let Some(e) = sink_error {
        log::warn!("Could not forward command output: {}", e);
    }

    let status = child.wait().map_err(|e| ExecutionError::Wait {
        command: command_line.clone(),
        source: e,
    })?;
    log::debug!("Command chain finished with {}", status);

    Ok(ProcessOutcome {
        command_line,
        status,
        output: captured,
    })
}

/// Sends every line read from `reader` (newline included) until EOF.
fn forward_lines(reader: impl Read, tx: &mpsc::Sender<String>) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf).into_owned();
                if tx.send(line).is_err() {
                    break;
                }
            }
            Err(e) => {
                log::debug!("Stopped reading command output: {}", e);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    const PLAIN: OutputSettings = OutputSettings {
        decorated: true,
        quiet: false,
    };

    #[test]
    fn test_decorated_output_leaves_commands_untouched() {
        let commands = strings(&["composer install", "git init"]);
        assert_eq!(prepare_commands(&commands, PLAIN), commands);
    }

    #[test]
    fn test_undecorated_output_adds_no_ansi_except_exempt_commands() {
        let settings = OutputSettings {
            decorated: false,
            quiet: false,
        };
        let prepared = prepare_commands(
            &strings(&["composer install", "chmod 755 artisan", "git add .", "php artisan migrate"]),
            settings,
        );
        assert_eq!(
            prepared,
            strings(&[
                "composer install --no-ansi",
                "chmod 755 artisan",
                "git add .",
                "php artisan migrate --no-ansi",
            ])
        );
    }

    #[test]
    fn test_quiet_adds_quiet_flag_with_same_exemptions() {
        let settings = OutputSettings {
            decorated: true,
            quiet: true,
        };
        let prepared = prepare_commands(&strings(&["npm install", "git commit -q"]), settings);
        assert_eq!(prepared, strings(&["npm install --quiet", "git commit -q"]));
    }

    #[test]
    fn test_both_rewrites_apply_together() {
        let settings = OutputSettings {
            decorated: false,
            quiet: true,
        };
        let prepared = prepare_commands(&strings(&["composer update", "chmod +x x"]), settings);
        assert_eq!(
            prepared,
            strings(&["composer update --no-ansi --quiet", "chmod +x x"])
        );
    }

    #[test]
    fn test_render_joins_with_and() {
        let runner = CommandRunner::new(PLAIN);
        assert_eq!(
            runner.render(&strings(&["a", "b", "c"])),
            "a && b && c".to_string()
        );
    }

    #[test]
    fn test_failure_is_reported_with_exit_code() {
        let err = ExecutionError::CommandFailure {
            command: "false".to_string(),
            code: Some(3),
        };
        assert_eq!(
            err.to_string(),
            "Command 'false' exited with a non-zero status (exit code 3)."
        );
    }

    #[test]
    fn test_empty_batch_succeeds_without_spawning() {
        let runner = CommandRunner::new(PLAIN).with_tty(TtyMode::Never);
        let mut sink = Vec::new();
        let outcome = runner.run(&[], None, &HashMap::new(), &mut sink).unwrap();
        assert!(outcome.success());
        assert!(sink.is_empty());
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::sync::Arc;
        use std::time::{Duration, Instant};
        use tempfile::TempDir;

        fn runner() -> CommandRunner {
            CommandRunner::new(PLAIN).with_tty(TtyMode::Never)
        }

        #[test]
        fn test_failing_command_stops_the_chain() {
            let temp = TempDir::new().unwrap();
            let mut sink = Vec::new();
            let outcome = runner()
                .run(
                    &strings(&["mkdir foo", "false", "mkdir bar"]),
                    Some(temp.path()),
                    &HashMap::new(),
                    &mut sink,
                )
                .unwrap();

            assert!(!outcome.success());
            assert!(temp.path().join("foo").is_dir());
            assert!(!temp.path().join("bar").exists());
            assert!(matches!(
                outcome.into_result(),
                Err(ExecutionError::CommandFailure { code: Some(1), .. })
            ));
        }

        #[test]
        fn test_commands_run_in_order_with_indented_output() {
            let mut sink = Vec::new();
            let outcome = runner()
                .run(
                    &strings(&["echo first", "echo second", "echo third >&2"]),
                    None,
                    &HashMap::new(),
                    &mut sink,
                )
                .unwrap();

            assert!(outcome.success());
            // stdout and stderr are read concurrently, so only stdout order is fixed.
            let forwarded = String::from_utf8(sink).unwrap();
            assert!(forwarded.contains("    first\n    second\n"));
            assert!(forwarded.contains("    third\n"));
            assert_eq!(forwarded.lines().count(), 3);
            assert!(forwarded.lines().all(|line| line.starts_with(OUTPUT_INDENT)));
            assert!(outcome.output().contains("first\nsecond\n"));
        }

        #[test]
        fn test_environment_overlay_is_visible() {
            let mut env = HashMap::new();
            env.insert("ARCHITECT_TEST_VALUE".to_string(), "overlay".to_string());
            let mut sink = Vec::new();
            let outcome = runner()
                .run(
                    &strings(&["echo \"$ARCHITECT_TEST_VALUE\""]),
                    None,
                    &env,
                    &mut sink,
                )
                .unwrap();
            assert_eq!(outcome.output(), "overlay\n");
        }

        #[test]
        fn test_missing_working_directory_fails_to_start() {
            let temp = TempDir::new().unwrap();
            let missing = temp.path().join("missing");
            let mut sink = Vec::new();
            let result = runner().run(
                &strings(&["true"]),
                Some(&missing),
                &HashMap::new(),
                &mut sink,
            );
            assert!(matches!(result, Err(ExecutionError::ProcessStart { .. })));
        }

        #[test]
        fn test_run_stashed_empties_the_batch() {
            let batch = CommandBatch::new();
            batch.append_all(["echo one", "echo two"]);
            let mut sink = Vec::new();

            let outcome = runner()
                .run_stashed(&batch, None, &HashMap::new(), &mut sink)
                .unwrap();
            assert_eq!(outcome.output(), "one\ntwo\n");
            assert!(batch.is_empty());
        }

        #[test]
        fn test_run_stashed_ignores_commands_appended_during_the_run() {
            let batch = Arc::new(CommandBatch::new());
            batch.append_all(["sleep 0.3", "echo stashed"]);

            let worker = {
                let batch = Arc::clone(&batch);
                std::thread::spawn(move || {
                    let mut sink = Vec::new();
                    runner()
                        .run_stashed(&batch, None, &HashMap::new(), &mut sink)
                        .unwrap()
                })
            };

            let deadline = Instant::now() + Duration::from_secs(5);
            while !batch.is_empty() && Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(5));
            }
            batch.append("echo late");

            let outcome = worker.join().unwrap();
            assert!(outcome.success());
            assert_eq!(outcome.output(), "stashed\n");
            assert_eq!(batch.pending(), vec!["echo late".to_string()]);
        }
    }
}

// crates/nexus-router-dispatch/src/subprocess.rs
// ============================================================================
// Module: Subprocess Adapter
// Description: Adapter invoking external commands over the args-file wire.
// Purpose: Execute tool calls via `<base_cmd> call <tool> <method>
//          --json-args-file <path>` with a strict failure taxonomy.
// Dependencies: nexus-router-core, serde, serde_json, tempfile, thiserror
// ============================================================================

//! ## Overview
//! The subprocess adapter materializes the canonical-JSON payload
//! `{tool, method, args}` into a fresh temporary file, runs the external
//! command without shell interpretation, captures stdout and stderr in
//! full, and enforces a wall-clock timeout. Failures map onto the closed
//! operational code set (`TIMEOUT`, `COMMAND_NOT_FOUND`, `OS_ERROR`,
//! `NONZERO_EXIT`, `INVALID_JSON_OUTPUT`); everything else is a bug.
//!
//! The full stdout is parsed untruncated; only diagnostic excerpts embedded
//! in error messages are truncated to `max_capture_bytes`. The args file is
//! an RAII resource and is removed on every exit path, including timeouts
//! and spawn failures.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::Child;
use std::process::Command;
use std::process::Stdio;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use nexus_router_core::DispatchAdapter;
use nexus_router_core::DispatchError;
use nexus_router_core::hashing::DEFAULT_HASH_ALGORITHM;
use nexus_router_core::hashing::canonical_json_bytes;
use nexus_router_core::hashing::hash_bytes;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use tempfile::Builder;
use tempfile::NamedTempFile;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Operational code for a wall-clock timeout.
pub const ERROR_CODE_TIMEOUT: &str = "TIMEOUT";
/// Operational code for a missing binary.
pub const ERROR_CODE_COMMAND_NOT_FOUND: &str = "COMMAND_NOT_FOUND";
/// Operational code for other OS spawn failures.
pub const ERROR_CODE_OS_ERROR: &str = "OS_ERROR";
/// Operational code for a non-zero exit.
pub const ERROR_CODE_NONZERO_EXIT: &str = "NONZERO_EXIT";
/// Operational code for unparseable or non-object stdout.
pub const ERROR_CODE_INVALID_JSON_OUTPUT: &str = "INVALID_JSON_OUTPUT";

/// Default wall-clock timeout for subprocess execution.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default cap for diagnostic excerpts embedded in error messages.
const DEFAULT_MAX_CAPTURE_BYTES: usize = 200_000;
/// Poll interval while waiting for the child to exit.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);
/// Hex length of the command digest embedded in derived adapter ids.
const ADAPTER_ID_HASH_LEN: usize = 6;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the subprocess adapter.
///
/// # Invariants
/// - `base_cmd` must not be empty; its first element is the program.
/// - `env` entries are merged over the ambient process environment.
#[derive(Debug, Clone)]
pub struct SubprocessAdapterConfig {
    /// Base command, e.g. `["python", "-m", "mcpt.cli"]`.
    pub base_cmd: Vec<String>,
    /// Optional caller-supplied adapter identifier.
    pub adapter_id: Option<String>,
    /// Wall-clock timeout for one call.
    pub timeout: Duration,
    /// Optional working directory for the subprocess.
    pub cwd: Option<PathBuf>,
    /// Optional environment variables merged over the ambient environment.
    pub env: Option<BTreeMap<String, String>>,
    /// Cap for diagnostic excerpts embedded in error messages.
    pub max_capture_bytes: usize,
}

impl SubprocessAdapterConfig {
    /// Builds a configuration for the given base command with defaults.
    #[must_use]
    pub fn for_command(base_cmd: Vec<String>) -> Self {
        Self {
            base_cmd,
            adapter_id: None,
            timeout: DEFAULT_TIMEOUT,
            cwd: None,
            env: None,
            max_capture_bytes: DEFAULT_MAX_CAPTURE_BYTES,
        }
    }

    /// Sets the wall-clock timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Subprocess adapter construction errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum SubprocessConfigError {
    /// The base command is empty.
    #[error("base_cmd must not be empty")]
    EmptyBaseCommand,
}

// ============================================================================
// SECTION: Adapter Identity
// ============================================================================

/// Derives the stable adapter identifier for a base command.
///
/// The identifier is `subprocess:<basename>:<hash6>` where `hash6` is the
/// first six hex characters of the SHA-256 of the space-joined command.
/// The same command produces the same identifier across processes and
/// operating systems.
#[must_use]
pub fn derive_adapter_id(base_cmd: &[String]) -> String {
    let first_token = base_cmd.first().map_or("", String::as_str);
    let basename = Path::new(first_token)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(first_token);
    let joined = base_cmd.join(" ");
    let digest = hash_bytes(DEFAULT_HASH_ALGORITHM, joined.as_bytes());
    let short = digest.value.get(..ADAPTER_ID_HASH_LEN).unwrap_or(&digest.value);
    format!("subprocess:{basename}:{short}")
}

// ============================================================================
// SECTION: Wire Payload
// ============================================================================

/// Payload written to the args file for the external command.
#[derive(Debug, Serialize)]
struct CallPayload<'c> {
    /// Tool identifier.
    tool: &'c str,
    /// Method name.
    method: &'c str,
    /// Arguments object.
    args: &'c Map<String, Value>,
}

// ============================================================================
// SECTION: Adapter
// ============================================================================

/// Adapter that calls external commands via subprocess.
///
/// # Invariants
/// - No shell interpretation; the program and arguments are passed verbatim.
/// - The temporary args file is removed on every exit path.
pub struct SubprocessAdapter {
    /// Adapter configuration.
    config: SubprocessAdapterConfig,
    /// Resolved adapter identifier.
    adapter_id: String,
}

impl SubprocessAdapter {
    /// Creates a subprocess adapter from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SubprocessConfigError::EmptyBaseCommand`] when `base_cmd`
    /// is empty.
    pub fn new(config: SubprocessAdapterConfig) -> Result<Self, SubprocessConfigError> {
        if config.base_cmd.is_empty() {
            return Err(SubprocessConfigError::EmptyBaseCommand);
        }
        let adapter_id = config
            .adapter_id
            .clone()
            .unwrap_or_else(|| derive_adapter_id(&config.base_cmd));
        Ok(Self {
            config,
            adapter_id,
        })
    }

    /// Writes the canonical payload into a fresh temporary file.
    fn materialize_args_file(
        &self,
        tool: &str,
        method: &str,
        args: &Map<String, Value>,
    ) -> Result<NamedTempFile, DispatchError> {
        let payload = CallPayload {
            tool,
            method,
            args,
        };
        let payload_json = canonical_json_bytes(&payload)
            .map_err(|err| DispatchError::bug("PAYLOAD_ENCODING", err.to_string()))?;
        let mut file = Builder::new()
            .prefix("nexus_args_")
            .suffix(".json")
            .tempfile()
            .map_err(|err| DispatchError::bug("TEMPFILE_IO", err.to_string()))?;
        file.write_all(&payload_json)
            .and_then(|()| file.flush())
            .map_err(|err| DispatchError::bug("TEMPFILE_IO", err.to_string()))?;
        Ok(file)
    }

    /// Spawns the external command with captured stdio.
    fn spawn(&self, tool: &str, method: &str, args_file: &Path) -> Result<Child, DispatchError> {
        let program = &self.config.base_cmd[0];
        let mut command = Command::new(program);
        command
            .args(&self.config.base_cmd[1..])
            .arg("call")
            .arg(tool)
            .arg(method)
            .arg("--json-args-file")
            .arg(args_file)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &self.config.cwd {
            command.current_dir(cwd);
        }
        if let Some(env) = &self.config.env {
            command.envs(env);
        }
        command.spawn().map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => DispatchError::operational(
                ERROR_CODE_COMMAND_NOT_FOUND,
                format!("command not found: {program}"),
            ),
            _ => DispatchError::operational(
                ERROR_CODE_OS_ERROR,
                format!("os error executing command: {err}"),
            ),
        })
    }

    /// Waits for the child within the timeout, collecting stdio in full.
    fn wait_with_timeout(&self, mut child: Child) -> Result<CapturedExit, DispatchError> {
        let stdout_reader = spawn_capture_thread(child.stdout.take());
        let stderr_reader = spawn_capture_thread(child.stderr.take());

        let deadline = Instant::now() + self.config.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        join_capture(stdout_reader);
                        join_capture(stderr_reader);
                        return Err(DispatchError::operational(
                            ERROR_CODE_TIMEOUT,
                            format!(
                                "command timed out after {:.1}s",
                                self.config.timeout.as_secs_f64()
                            ),
                        ));
                    }
                    thread::sleep(EXIT_POLL_INTERVAL);
                }
                Err(err) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    join_capture(stdout_reader);
                    join_capture(stderr_reader);
                    return Err(DispatchError::operational(
                        ERROR_CODE_OS_ERROR,
                        format!("os error waiting for command: {err}"),
                    ));
                }
            }
        };

        Ok(CapturedExit {
            exit_code: status.code(),
            stdout: join_capture(stdout_reader),
            stderr: join_capture(stderr_reader),
        })
    }

    /// Truncates captured bytes for diagnostic embedding.
    fn truncate_capture(&self, bytes: &[u8]) -> String {
        let text = String::from_utf8_lossy(bytes);
        let limit = self.config.max_capture_bytes;
        if text.len() <= limit {
            return text.into_owned();
        }
        let mut cut = limit;
        while cut > 0 && !text.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}... [truncated at {limit}]", &text[..cut])
    }
}

impl DispatchAdapter for SubprocessAdapter {
    fn adapter_id(&self) -> &str {
        &self.adapter_id
    }

    fn call(
        &self,
        tool: &str,
        method: &str,
        args: &Map<String, Value>,
    ) -> Result<Map<String, Value>, DispatchError> {
        // Held for the whole call; dropping it removes the file on every
        // exit path, including timeouts and spawn failures.
        let args_file = self.materialize_args_file(tool, method, args)?;

        let child = self.spawn(tool, method, args_file.path())?;
        let exit = self.wait_with_timeout(child)?;

        if exit.exit_code != Some(0) {
            let detail = exit.exit_code.map_or_else(
                || "terminated by signal".to_string(),
                |code| format!("exited with code {code}"),
            );
            let stderr_excerpt = self.truncate_capture(&exit.stderr);
            let message = if stderr_excerpt.is_empty() {
                format!("command {detail}")
            } else {
                format!("command {detail}; stderr: {stderr_excerpt}")
            };
            return Err(DispatchError::operational(ERROR_CODE_NONZERO_EXIT, message));
        }

        // Parse the full stdout, never the truncated diagnostic copy.
        let output: Value = serde_json::from_slice(&exit.stdout).map_err(|err| {
            DispatchError::operational(
                ERROR_CODE_INVALID_JSON_OUTPUT,
                format!(
                    "invalid json output: {err}; stdout: {}",
                    self.truncate_capture(&exit.stdout)
                ),
            )
        })?;
        match output {
            Value::Object(object) => Ok(object),
            other => Err(DispatchError::operational(
                ERROR_CODE_INVALID_JSON_OUTPUT,
                format!("output is not a JSON object: {}", json_type_name(&other)),
            )),
        }
    }
}

// ============================================================================
// SECTION: Capture Helpers
// ============================================================================

/// Exit status plus fully captured stdio.
struct CapturedExit {
    /// Exit code, absent when the child was killed by a signal.
    exit_code: Option<i32>,
    /// Complete captured stdout.
    stdout: Vec<u8>,
    /// Complete captured stderr.
    stderr: Vec<u8>,
}

/// Drains one stdio pipe to completion on a background thread.
fn spawn_capture_thread<R>(pipe: Option<R>) -> Option<thread::JoinHandle<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    pipe.map(|mut reader| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            let _ = reader.read_to_end(&mut buffer);
            buffer
        })
    })
}

/// Joins a capture thread, yielding whatever was read.
fn join_capture(handle: Option<thread::JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|handle| handle.join().ok()).unwrap_or_default()
}

/// Names a JSON value's type for diagnostics.
const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

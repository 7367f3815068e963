//! Collaborators reached by spawning one short-lived process per request.
//!
//! A term lookup runs `program [args…] <term> <limit>` and reads the
//! answer from stdout. An ingestion hands the document to the child on
//! stdin, or through a spool file when a spool directory is configured.
//! Children are spawned with `kill_on_drop`, so a lookup abandoned by a
//! timeout or by a failed sibling term takes its process down with it.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

use super::payload::{decode_documents, decode_store_response};
use crate::error::{IngestionFailure, LookupFailure, LookupFailureReason};
use crate::ingest::{IngestionService, StoreResponse};
use crate::lookup::TermIndex;
use crate::types::Document;

/// Stderr is only kept for error messages.
const STDERR_SNIPPET_CHARS: usize = 512;

/// Bytes of stderr buffered before the rest is discarded.
const STDERR_CAPTURE_BYTES: u64 = 8 * 1024;

fn default_max_output_bytes() -> usize {
    4 * 1024 * 1024
}

/// How to launch a collaborator process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessCommand {
    /// Executable to run (e.g. `python3`).
    pub program: PathBuf,
    /// Leading arguments (e.g. the script path).
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory for the child. Inherits ours when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
    /// Stdout larger than this is rejected as malformed.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
}

impl ProcessCommand {
    /// A command with default limits.
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: None,
            max_output_bytes: default_max_output_bytes(),
        }
    }

    fn command(&self, extra: &[&str], stdin: Stdio) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .args(extra)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

/// Captured result of one child run.
struct Captured {
    success: bool,
    code: Option<i32>,
    /// At most `max_output_bytes + 1` bytes of stdout.
    stdout: Vec<u8>,
    /// Total stdout length, including what was discarded.
    stdout_len: u64,
    stderr: String,
}

impl Captured {
    fn exit_description(&self) -> String {
        let code = self
            .code
            .map_or_else(|| "signal".to_owned(), |c| c.to_string());
        if self.stderr.is_empty() {
            format!("exited with {code}")
        } else {
            format!("exited with {code}: {}", self.stderr)
        }
    }

    fn oversized(&self, limit: usize) -> bool {
        self.stdout.len() > limit
    }
}

/// Buffer up to `cap` bytes of `reader`, then drain the rest so the child
/// never blocks on a full pipe. Returns the buffer and the total length.
async fn read_capped<R: AsyncRead + Unpin>(
    reader: Option<R>,
    cap: u64,
) -> std::io::Result<(Vec<u8>, u64)> {
    let Some(reader) = reader else {
        return Ok((Vec::new(), 0));
    };
    let mut buf = Vec::new();
    let mut limited = reader.take(cap);
    limited.read_to_end(&mut buf).await?;
    let mut rest = limited.into_inner();
    let discarded = tokio::io::copy(&mut rest, &mut tokio::io::sink()).await?;
    let total = buf.len() as u64 + discarded;
    Ok((buf, total))
}

async fn run(
    command: &ProcessCommand,
    extra: &[&str],
    input: Option<&[u8]>,
) -> std::io::Result<Captured> {
    let stdin = if input.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    };
    let mut child = command.command(extra, stdin).spawn()?;

    let stdin = child.stdin.take();
    let feed = async move {
        if let (Some(payload), Some(mut pipe)) = (input, stdin) {
            match pipe.write_all(payload).await {
                Ok(()) => {}
                // The child may exit without reading its input.
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    };
    let stdout_cap = u64::try_from(command.max_output_bytes)
        .unwrap_or(u64::MAX)
        .saturating_add(1);
    let (fed, stdout, stderr) = tokio::join!(
        feed,
        read_capped(child.stdout.take(), stdout_cap),
        read_capped(child.stderr.take(), STDERR_CAPTURE_BYTES),
    );
    fed?;
    let (stdout, stdout_len) = stdout?;
    let (stderr, _) = stderr?;
    let status = child.wait().await?;

    let mut stderr = String::from_utf8_lossy(&stderr).trim().to_owned();
    if stderr.chars().count() > STDERR_SNIPPET_CHARS {
        stderr = stderr.chars().take(STDERR_SNIPPET_CHARS).collect();
    }
    Ok(Captured {
        success: status.success(),
        code: status.code(),
        stdout,
        stdout_len,
        stderr,
    })
}

/// A [`TermIndex`] backed by a search script.
#[derive(Debug, Clone)]
pub struct ProcessTermIndex {
    command: ProcessCommand,
}

impl ProcessTermIndex {
    /// Run `command` once per term.
    pub fn new(command: ProcessCommand) -> Self {
        Self { command }
    }
}

impl TermIndex for ProcessTermIndex {
    async fn lookup(&self, term: &str, limit: usize) -> Result<Vec<Document>, LookupFailure> {
        let limit_arg = limit.to_string();
        let captured = run(&self.command, &[term, limit_arg.as_str()], None)
            .await
            .map_err(|e| {
                LookupFailure::new(
                    term,
                    LookupFailureReason::Unreachable(format!(
                        "failed to run {}: {e}",
                        self.command.program.display()
                    )),
                )
            })?;

        if !captured.success {
            return Err(LookupFailure::new(
                term,
                LookupFailureReason::Unreachable(captured.exit_description()),
            ));
        }
        if captured.oversized(self.command.max_output_bytes) {
            return Err(LookupFailure::new(
                term,
                LookupFailureReason::Malformed(format!(
                    "output of {} bytes exceeds limit of {}",
                    captured.stdout_len, self.command.max_output_bytes
                )),
            ));
        }
        decode_documents(term, &captured.stdout)
    }

    fn name(&self) -> &'static str {
        "process"
    }
}

/// An [`IngestionService`] backed by an upload script.
#[derive(Debug, Clone)]
pub struct ProcessIngestionService {
    command: ProcessCommand,
    spool_dir: Option<PathBuf>,
}

impl ProcessIngestionService {
    /// Run `command` once per document.
    ///
    /// With a `spool_dir`, each document is written to a fresh
    /// `<spool_dir>/<id>-<random>.json` whose path is passed as the last
    /// argument and which is removed once the child is done; otherwise the
    /// document is written to the child's stdin.
    pub fn new(command: ProcessCommand, spool_dir: Option<PathBuf>) -> Self {
        Self { command, spool_dir }
    }

    /// Write `body` to a spool file unique to this call. The file is
    /// deleted when the returned handle drops, including on cancellation.
    async fn spool(
        dir: &Path,
        document: &Document,
        body: &[u8],
    ) -> Result<NamedTempFile, IngestionFailure> {
        tokio::fs::create_dir_all(dir).await?;
        // Sanitised ids may collide; the random suffix keeps files apart.
        let key: String = document
            .id
            .as_key()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        let file = tempfile::Builder::new()
            .prefix(&format!("{key}-"))
            .suffix(".json")
            .tempfile_in(dir)?;
        tokio::fs::write(file.path(), body).await?;
        Ok(file)
    }
}

impl IngestionService for ProcessIngestionService {
    async fn store(&self, document: &Document) -> Result<StoreResponse, IngestionFailure> {
        let body = serde_json::to_vec(document)
            .map_err(|e| IngestionFailure::InvalidDocument(e.to_string()))?;

        let captured = match &self.spool_dir {
            Some(dir) => {
                let spooled = Self::spool(dir, document, &body).await?;
                let path_arg = spooled.path().to_string_lossy().into_owned();
                tracing::debug!(path = %path_arg, "document spooled");
                let captured = run(&self.command, &[path_arg.as_str()], None).await;
                if let Err(e) = spooled.close() {
                    tracing::warn!(path = %path_arg, error = %e, "failed to remove spool file");
                }
                captured
            }
            None => run(&self.command, &[], Some(&body)).await,
        }
        .map_err(|e| {
            IngestionFailure::Unreachable(format!(
                "failed to run {}: {e}",
                self.command.program.display()
            ))
        })?;

        if !captured.success {
            return Err(IngestionFailure::Unreachable(captured.exit_description()));
        }
        if captured.oversized(self.command.max_output_bytes) {
            return Err(IngestionFailure::Malformed(format!(
                "output of {} bytes exceeds limit of {}",
                captured.stdout_len, self.command.max_output_bytes
            )));
        }
        decode_store_response(&captured.stdout)
    }

    fn name(&self) -> &'static str {
        "process"
    }
}

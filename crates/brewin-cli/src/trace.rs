//! Console effect traces: record every `print`/input line a program performs
//! as JSONL, and replay a recorded run deterministically.
//!
//! A trace is a stream of `TraceRecord`s:
//! 1. Header (schema version, start time, whether values are complete)
//! 2. Effect entries (one per console write or read)
//! 3. Footer (effect count, completion status)

use std::io::Write;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::host::{Console, HostError};

/// Current trace schema version.
pub const TRACE_SCHEMA_VERSION: &str = "0.1";

/// In audit mode, values longer than this are stored as their hash only.
const AUDIT_VALUE_LIMIT: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Write,
    Read,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Operation::Write => "write",
            Operation::Read => "read",
        })
    }
}

/// One console operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub seq: u64,
    pub timestamp: String,
    pub operation: Operation,
    /// The line written or read; absent when hashed away in audit mode.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<String>,
    pub value_hash: String,
    pub value_size: usize,
    pub duration_ms: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "record")]
pub enum TraceRecord {
    #[serde(rename = "header")]
    Header(TraceHeader),
    #[serde(rename = "effect")]
    Effect(TraceEntry),
    #[serde(rename = "footer")]
    Footer(TraceFooter),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TraceHeader {
    pub schema_version: String,
    pub timestamp: String,
    pub full_values: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TraceFooter {
    pub timestamp: String,
    pub effect_count: u64,
    /// "complete" if finalize() was called normally
    pub trace_status: String,
    /// "success" or "error"
    pub program_status: String,
}

// ---------------------------------------------------------------------------
// Recording
// ---------------------------------------------------------------------------

/// Writes trace records as JSONL.
pub struct TraceEmitter {
    seq: u64,
    writer: Box<dyn Write>,
    full_values: bool,
}

impl std::fmt::Debug for TraceEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceEmitter")
            .field("seq", &self.seq)
            .field("full_values", &self.full_values)
            .finish()
    }
}

impl TraceEmitter {
    /// Start a trace on `writer`, emitting the header immediately.
    ///
    /// With `full_values` every line is stored verbatim (replayable);
    /// otherwise lines over 1 KB keep only their SHA-256 hash.
    pub fn new(writer: Box<dyn Write>, full_values: bool) -> Result<Self, HostError> {
        let mut emitter = Self {
            seq: 0,
            writer,
            full_values,
        };
        emitter.write_record(&TraceRecord::Header(TraceHeader {
            schema_version: TRACE_SCHEMA_VERSION.to_string(),
            timestamp: now_rfc3339(),
            full_values,
        }))?;
        Ok(emitter)
    }

    pub fn effect_count(&self) -> u64 {
        self.seq
    }

    /// Record one console operation.
    pub fn record(&mut self, operation: Operation, line: &str, duration: Duration) -> Result<(), HostError> {
        let keep = self.full_values || line.len() <= AUDIT_VALUE_LIMIT;
        let entry = TraceEntry {
            seq: self.seq,
            timestamp: now_rfc3339(),
            operation,
            value: keep.then(|| line.to_string()),
            value_hash: sha256_hex(line),
            value_size: line.len(),
            duration_ms: duration.as_millis() as u64,
        };
        self.seq += 1;
        self.write_record(&TraceRecord::Effect(entry))
    }

    /// Write the footer and flush. `program_status` is "success" or "error".
    pub fn finalize(&mut self, program_status: &str) -> Result<(), HostError> {
        self.write_record(&TraceRecord::Footer(TraceFooter {
            timestamp: now_rfc3339(),
            effect_count: self.seq,
            trace_status: "complete".to_string(),
            program_status: program_status.to_string(),
        }))?;
        self.writer
            .flush()
            .map_err(|e| HostError::TraceWrite(format!("flush trace: {}", e)))
    }

    fn write_record(&mut self, record: &TraceRecord) -> Result<(), HostError> {
        let json = serde_json::to_string(record)
            .map_err(|e| HostError::TraceWrite(format!("serialize record: {}", e)))?;
        writeln!(self.writer, "{}", json)
            .map_err(|e| HostError::TraceWrite(format!("write record: {}", e)))
    }
}

/// Console wrapper that records every operation of the inner console.
#[derive(Debug)]
pub struct TracedConsole<C> {
    inner: C,
    emitter: TraceEmitter,
}

impl<C: Console> TracedConsole<C> {
    pub fn new(inner: C, emitter: TraceEmitter) -> Self {
        Self { inner, emitter }
    }

    pub fn finalize(&mut self, program_status: &str) -> Result<(), HostError> {
        self.emitter.finalize(program_status)
    }
}

impl<C: Console> Console for TracedConsole<C> {
    fn write_line(&mut self, line: &str) -> Result<(), HostError> {
        let start = Instant::now();
        self.inner.write_line(line)?;
        self.emitter.record(Operation::Write, line, start.elapsed())
    }

    fn read_line(&mut self) -> Result<String, HostError> {
        let start = Instant::now();
        let line = self.inner.read_line()?;
        self.emitter.record(Operation::Read, &line, start.elapsed())?;
        Ok(line)
    }
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ReplayError {
    /// Program performed a console operation past the end of the trace.
    #[error("replay: unexpected {0} not in trace")]
    UnexpectedEffect(Operation),
    #[error("replay: operation mismatch at seq {seq}: expected {expected}, got {actual}")]
    OperationMismatch {
        expected: Operation,
        actual: Operation,
        seq: u64,
    },
    #[error("replay: output mismatch at seq {seq}: expected {expected:?}, got {actual:?}")]
    OutputMismatch {
        seq: u64,
        expected: String,
        actual: String,
    },
    #[error(
        "cannot replay: input at seq {seq} was hashed ({value_size} bytes). \
         Re-run with --trace-full to record complete values"
    )]
    MissingValue { seq: u64, value_size: usize },
    #[error("replay: recorded run ended with {expected}, replayed run ended with {actual}")]
    StatusMismatch { expected: String, actual: String },
    #[error("replay: trace has {0} unreplayed entries")]
    UnreplayedEffects(usize),
    #[error("replay: trace is not replayable: {0}")]
    NotReplayable(String),
    #[error("replay: parse error at line {0}: {1}")]
    ParseError(usize, String),
}

/// A parsed full-values trace, consumed entry by entry.
#[derive(Debug)]
pub struct TraceReplayer {
    entries: Vec<TraceEntry>,
    cursor: usize,
    /// Program status from the footer, if the trace has one
    program_status: Option<String>,
}

impl TraceReplayer {
    /// Parse JSONL trace content. Audit-mode traces and unknown schema
    /// versions are rejected.
    pub fn from_jsonl(content: &str) -> Result<Self, ReplayError> {
        let mut entries = Vec::new();
        let mut saw_header = false;
        let mut program_status = None;

        for (i, line) in content.lines().filter(|l| !l.trim().is_empty()).enumerate() {
            let record: TraceRecord =
                serde_json::from_str(line).map_err(|e| ReplayError::ParseError(i + 1, e.to_string()))?;
            match record {
                TraceRecord::Header(h) => {
                    saw_header = true;
                    if h.schema_version != TRACE_SCHEMA_VERSION {
                        return Err(ReplayError::NotReplayable(format!(
                            "unsupported trace schema version '{}' (expected '{}')",
                            h.schema_version, TRACE_SCHEMA_VERSION
                        )));
                    }
                    if !h.full_values {
                        return Err(ReplayError::NotReplayable(
                            "trace was recorded with --trace (audit mode). \
                             Re-run with --trace-full for replay-capable traces"
                                .to_string(),
                        ));
                    }
                }
                TraceRecord::Effect(entry) => entries.push(entry),
                TraceRecord::Footer(f) => program_status = Some(f.program_status),
            }
        }

        if !saw_header {
            return Err(ReplayError::NotReplayable("missing trace header".to_string()));
        }

        Ok(Self {
            entries,
            cursor: 0,
            program_status,
        })
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    /// Take the next entry, which must be of kind `operation`.
    pub fn next(&mut self, operation: Operation) -> Result<&TraceEntry, ReplayError> {
        let entry = self
            .entries
            .get(self.cursor)
            .ok_or(ReplayError::UnexpectedEffect(operation))?;
        if entry.operation != operation {
            return Err(ReplayError::OperationMismatch {
                expected: entry.operation,
                actual: operation,
                seq: entry.seq,
            });
        }
        self.cursor += 1;
        Ok(entry)
    }

    /// Verify that all trace entries were replayed.
    pub fn verify_complete(&self) -> Result<(), ReplayError> {
        if self.cursor < self.entries.len() {
            Err(ReplayError::UnreplayedEffects(self.entries.len() - self.cursor))
        } else {
            Ok(())
        }
    }

    /// Whether the trace ended with a footer. A missing footer means the
    /// recording was cut short.
    pub fn is_trace_complete(&self) -> bool {
        self.program_status.is_some()
    }

    /// Check that the replayed run ended the way the recorded one did.
    /// `actual` is "success" or "error". Traces without a footer carry no
    /// status and always pass.
    pub fn verify_program_status(&self, actual: &str) -> Result<(), ReplayError> {
        match &self.program_status {
            Some(expected) if expected != actual => Err(ReplayError::StatusMismatch {
                expected: expected.clone(),
                actual: actual.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

/// Console that feeds recorded input back to the program and checks that
/// every line it writes matches the recording. Verified output is passed on
/// to `inner`.
#[derive(Debug)]
pub struct ReplayConsole<C> {
    inner: C,
    replayer: TraceReplayer,
}

impl<C: Console> ReplayConsole<C> {
    pub fn new(inner: C, replayer: TraceReplayer) -> Self {
        Self { inner, replayer }
    }

    pub fn verify_complete(&self) -> Result<(), ReplayError> {
        self.replayer.verify_complete()
    }

    pub fn verify_program_status(&self, actual: &str) -> Result<(), ReplayError> {
        self.replayer.verify_program_status(actual)
    }
}

impl<C: Console> Console for ReplayConsole<C> {
    fn write_line(&mut self, line: &str) -> Result<(), HostError> {
        let entry = self.replayer.next(Operation::Write)?;
        let matches = match &entry.value {
            Some(recorded) => recorded == line,
            None => entry.value_hash == sha256_hex(line),
        };
        if !matches {
            return Err(ReplayError::OutputMismatch {
                seq: entry.seq,
                expected: entry.value.clone().unwrap_or_else(|| entry.value_hash.clone()),
                actual: line.to_string(),
            }
            .into());
        }
        self.inner.write_line(line)
    }

    fn read_line(&mut self) -> Result<String, HostError> {
        let entry = self.replayer.next(Operation::Read)?;
        entry.value.clone().ok_or_else(|| {
            ReplayError::MissingValue {
                seq: entry.seq,
                value_size: entry.value_size,
            }
            .into()
        })
    }
}

/// SHA-256 hex digest of a string, prefixed with "sha256:".
fn sha256_hex(data: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    format!("sha256:{:x}", hasher.finalize())
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

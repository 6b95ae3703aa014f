//! Audit sinks: `tracing`, JSON lines file, spreadsheet-style CSV, fan-out.

use crate::ports::{AuditEvent, AuditSink, LogLevel};
use crate::Result;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

const CSV_HEADER: &str = "timestamp,level,service,message,retry_count,circuit_state";

/// Emits audit events as `tracing` events under the
/// `resilient_call_agent::audit` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &AuditEvent) {
        match event.level {
            LogLevel::Info => info!(
                target: "resilient_call_agent::audit",
                level = %event.level,
                service = %event.service,
                retry_count = ?event.retry_count,
                circuit_state = ?event.circuit_state,
                "{}",
                event.message
            ),
            LogLevel::Warning => warn!(
                target: "resilient_call_agent::audit",
                level = %event.level,
                service = %event.service,
                retry_count = ?event.retry_count,
                circuit_state = ?event.circuit_state,
                "{}",
                event.message
            ),
            LogLevel::Error | LogLevel::Critical => error!(
                target: "resilient_call_agent::audit",
                level = %event.level,
                service = %event.service,
                retry_count = ?event.retry_count,
                circuit_state = ?event.circuit_state,
                "{}",
                event.message
            ),
        }
    }
}

fn open_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// Appends one JSON object per line
#[derive(Debug)]
pub struct JsonLinesAuditSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesAuditSink {
    /// Open (or create) the log file, creating parent directories as needed
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = open_append(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, event: &AuditEvent) -> Result<()> {
        let line = serde_json::to_string(event)?;
        let mut file = self
            .file
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        writeln!(file, "{line}")?;
        Ok(())
    }
}

impl AuditSink for JsonLinesAuditSink {
    fn record(&self, event: &AuditEvent) {
        if let Err(e) = self.write(event) {
            warn!("Failed to write audit log {:?}: {}", self.path, e);
        }
    }
}

/// Spreadsheet-style CSV log; the header row is written once per file
#[derive(Debug)]
pub struct CsvAuditSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl CsvAuditSink {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut file = open_append(&path)?;
        if file.metadata()?.len() == 0 {
            writeln!(file, "{CSV_HEADER}")?;
        }
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, event: &AuditEvent) -> Result<()> {
        let row = csv_row(event);
        let mut file = self
            .file
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        writeln!(file, "{row}")?;
        Ok(())
    }
}

impl AuditSink for CsvAuditSink {
    fn record(&self, event: &AuditEvent) {
        if let Err(e) = self.write(event) {
            warn!("Failed to write CSV log {:?}: {}", self.path, e);
        }
    }
}

fn csv_row(event: &AuditEvent) -> String {
    let fields = [
        event.timestamp.to_rfc3339(),
        event.level.to_string(),
        event.service.clone(),
        event.message.clone(),
        event.retry_count.map(|n| n.to_string()).unwrap_or_default(),
        event
            .circuit_state
            .map(|s| s.to_string())
            .unwrap_or_default(),
    ];
    fields
        .iter()
        .map(|field| csv_escape(field))
        .collect::<Vec<_>>()
        .join(",")
}

fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Forwards every event to each inner sink in order
#[derive(Default, Clone)]
pub struct FanoutAuditSink {
    sinks: Vec<Arc<dyn AuditSink>>,
}

impl FanoutAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl AuditSink for FanoutAuditSink {
    fn record(&self, event: &AuditEvent) {
        for sink in &self.sinks {
            sink.record(event);
        }
    }
}

impl std::fmt::Debug for FanoutAuditSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutAuditSink")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

//! Optional JSONL record of every LLM exchange, one line per call.

use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

#[derive(Serialize)]
struct ExchangeEntry<'a> {
    phase: &'a str,
    model: Option<&'a str>,
    prompt: &'a str,
    response: &'a str,
    latency_ms: u64,
    timestamp: String,
}

#[derive(Clone, Default)]
pub struct ExchangeLog {
    writer: Option<Arc<Mutex<BufWriter<File>>>>,
}

impl ExchangeLog {
    /// Opens `log_file` for appending. An unopenable file disables logging.
    pub fn new(log_file: Option<PathBuf>) -> Self {
        let writer = log_file.and_then(|path| {
            match OpenOptions::new().create(true).append(true).open(&path) {
                Ok(file) => Some(Arc::new(Mutex::new(BufWriter::new(file)))),
                Err(e) => {
                    warn!("Failed to open LLM exchange log {:?}: {}", path, e);
                    None
                }
            }
        });
        Self { writer }
    }

    pub fn disabled() -> Self {
        Self { writer: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    pub fn record(
        &self,
        phase: &str,
        model: Option<&str>,
        prompt: &str,
        response: &str,
        latency_ms: u64,
    ) {
        let Some(writer) = &self.writer else {
            return;
        };

        let entry = ExchangeEntry {
            phase,
            model,
            prompt,
            response,
            latency_ms,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        if let Ok(mut writer) = writer.lock() {
            match serde_json::to_string(&entry) {
                Ok(json) => {
                    if let Err(e) = writeln!(writer, "{}", json) {
                        warn!("Failed to write LLM exchange entry: {}", e);
                    }
                    if let Err(e) = writer.flush() {
                        warn!("Failed to flush LLM exchange log: {}", e);
                    }
                }
                Err(e) => warn!("Failed to serialize LLM exchange for {}: {}", phase, e),
            }
        }

        debug!(phase, latency_ms, "LLM exchange recorded");
    }
}

impl std::fmt::Debug for ExchangeLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeLog")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

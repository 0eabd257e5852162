// JSONL log of model exchanges, one line per call
use super::types::{LLMRequest, LLMResponse};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, warn};

#[derive(Serialize)]
struct ExchangeEntry<'a> {
    stage: &'a str,
    request: &'a LLMRequest,
    model: Option<&'a str>,
    response: Option<&'a str>,
    error: Option<&'a str>,
    latency_ms: u64,
    timestamp: String,
}

pub struct ExchangeLog {
    writer: Option<Mutex<BufWriter<File>>>,
}

impl ExchangeLog {
    pub fn new(log_file: Option<PathBuf>) -> Self {
        let writer = log_file.and_then(|path| {
            match OpenOptions::new().create(true).append(true).open(&path) {
                Ok(file) => Some(Mutex::new(BufWriter::new(file))),
                Err(e) => {
                    warn!("Failed to open exchange log file {:?}: {}", path, e);
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
        stage: &str,
        request: &LLMRequest,
        outcome: Result<&LLMResponse, &str>,
        latency_ms: u64,
    ) {
        debug!("Model exchange: stage={} latency_ms={}", stage, latency_ms);

        let Some(writer) = &self.writer else {
            return;
        };

        let (model, response, error) = match outcome {
            Ok(resp) => (resp.model.as_deref(), Some(resp.content.as_str()), None),
            Err(e) => (None, None, Some(e)),
        };

        let entry = ExchangeEntry {
            stage,
            request,
            model,
            response,
            error,
            latency_ms,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let Ok(mut writer) = writer.lock() else {
            return;
        };
        match serde_json::to_string(&entry) {
            Ok(json) => {
                if let Err(e) = writeln!(writer, "{}", json) {
                    warn!("Failed to write exchange log entry: {}", e);
                }
                if let Err(e) = writer.flush() {
                    warn!("Failed to flush exchange log: {}", e);
                }
            }
            Err(e) => {
                warn!("Failed to serialize exchange for stage {}: {}", stage, e);
            }
        }
    }
}

impl Default for ExchangeLog {
    fn default() -> Self {
        Self::disabled()
    }
}

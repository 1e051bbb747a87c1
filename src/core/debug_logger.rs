use std::collections::HashMap;
use std::env;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use chrono::Local;
use flate2::{write::GzEncoder, Compression};
use fs2::FileExt;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const LOG_ROTATION_SIZE_MB: u64 = 8;
const MAX_ARCHIVES: usize = 5;
const ROTATION_CHECK_INTERVAL: u32 = 200;

pub const ENV_DEBUG: &str = "TPROXY_DEBUG";

/// Severity of a log record; proxy lifecycle events get their own level
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Error,
    Proxy,
}

/// One JSONL record; `message` is redacted before it is written
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: LogLevel,
    pub component: String,
    pub event: String,
    pub message: String,
    pub correlation_id: Option<String>,
    pub fields: HashMap<String, serde_json::Value>,
}

/// Append-only log file, gzipped into `<stem>.<timestamp>.gz` once it grows past the threshold
struct RotatingLogger {
    log_path: PathBuf,
    writes: u32,
}

impl RotatingLogger {
    fn new(log_path: PathBuf) -> Self {
        if let Some(parent) = log_path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        Self { log_path, writes: 0 }
    }

    fn append(&mut self, json_line: &str) -> io::Result<()> {
        if self.writes % ROTATION_CHECK_INTERVAL == 0 {
            let _ = self.rotate_if_oversized();
        }
        self.writes = self.writes.wrapping_add(1);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        writeln!(file, "{}", json_line)
    }

    fn is_oversized(&self) -> bool {
        fs::metadata(&self.log_path)
            .map(|metadata| metadata.len() >= LOG_ROTATION_SIZE_MB * 1024 * 1024)
            .unwrap_or(false)
    }

    fn rotate_if_oversized(&self) -> io::Result<()> {
        if !self.is_oversized() {
            return Ok(());
        }

        // Several processes may share one log file; only the lock holder rotates
        let lock_path = self.log_path.with_extension("lock");
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        if lock_file.try_lock_exclusive().is_err() {
            return Ok(());
        }

        let result = if self.is_oversized() {
            self.archive_current().and_then(|_| self.prune_archives())
        } else {
            Ok(())
        };
        let _ = fs::remove_file(&lock_path);
        result
    }

    fn stem(&self) -> String {
        self.log_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "tproxy-debug".to_string())
    }

    fn dir(&self) -> &Path {
        self.log_path.parent().unwrap_or_else(|| Path::new("."))
    }

    fn archive_current(&self) -> io::Result<()> {
        let archive_path = self.dir().join(format!(
            "{}.{}.gz",
            self.stem(),
            Local::now().format("%Y%m%d_%H%M%S")
        ));

        let pending = self.log_path.with_extension("rotating");
        fs::rename(&self.log_path, &pending)?;

        let mut encoder = GzEncoder::new(File::create(&archive_path)?, Compression::default());
        io::copy(&mut BufReader::new(File::open(&pending)?), &mut encoder)?;
        encoder.finish()?;

        fs::remove_file(&pending)
    }

    /// Delete the oldest archives beyond `MAX_ARCHIVES`
    fn prune_archives(&self) -> io::Result<()> {
        let prefix = format!("{}.", self.stem());

        let mut archives = Vec::new();
        for entry in fs::read_dir(self.dir())? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(&prefix) && name.ends_with(".gz") {
                archives.push((entry.metadata()?.modified()?, entry.path()));
            }
        }

        archives.sort();
        let excess = archives.len().saturating_sub(MAX_ARCHIVES);
        for (_, path) in archives.into_iter().take(excess) {
            let _ = fs::remove_file(path);
        }
        Ok(())
    }
}

/// Structured JSONL debug logger, disabled unless `TPROXY_DEBUG` is truthy
pub struct DebugLogger {
    enabled: bool,
    rotating_logger: Option<Mutex<RotatingLogger>>,
    session_id: String,
    redaction_patterns: Vec<(Regex, &'static str)>,
}

impl Default for DebugLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl DebugLogger {
    /// Logger configured from the environment, writing to `~/.tproxy/tproxy-debug.log`
    pub fn new() -> Self {
        Self::with_path(Self::get_log_path(), Self::parse_debug_enabled())
    }

    /// Logger writing to an explicit path
    pub fn with_path(log_path: PathBuf, enabled: bool) -> Self {
        let rotating_logger = if enabled {
            Some(Mutex::new(RotatingLogger::new(log_path)))
        } else {
            None
        };

        Self {
            enabled,
            rotating_logger,
            session_id: Uuid::new_v4().to_string()[..8].to_string(),
            redaction_patterns: Self::compile_redaction_patterns(),
        }
    }

    /// Supports: true/false, 1/0, yes/no, on/off (case insensitive)
    fn parse_debug_enabled() -> bool {
        env::var(ENV_DEBUG)
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on"))
            .unwrap_or(false)
    }

    fn get_log_path() -> PathBuf {
        let mut log_path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        log_path.push(".tproxy");
        log_path.push("tproxy-debug.log");
        log_path
    }

    fn compile_redaction_patterns() -> Vec<(Regex, &'static str)> {
        let patterns = [
            // user:password@ in proxy URLs
            (r"(?i)(?:[a-z][a-z0-9+.-]*://)?[^\s/@:]+:[^\s/@]+@", "[REDACTED]@"),
            (r"(?i)proxy-authorization[:\s]+[^\s\n]+", "[REDACTED]"),
            (r"(?i)password[:\s=]+[^\s\n]+", "[REDACTED]"),
        ];

        patterns
            .iter()
            .filter_map(|(pattern, replacement)| {
                Regex::new(pattern).ok().map(|regex| (regex, *replacement))
            })
            .collect()
    }

    fn redact_sensitive_data(&self, text: &str) -> String {
        let mut redacted = text.to_string();
        for (regex, replacement) in &self.redaction_patterns {
            redacted = regex.replace_all(&redacted, *replacement).to_string();
        }
        redacted
    }

    fn log_sync(
        &self,
        level: LogLevel,
        component: &str,
        event: &str,
        message: &str,
        fields: HashMap<String, serde_json::Value>,
    ) {
        if !self.enabled {
            return;
        }

        let entry = LogEntry {
            timestamp: Local::now().to_rfc3339(),
            level,
            component: component.to_string(),
            event: event.to_string(),
            message: self.redact_sensitive_data(message),
            correlation_id: Some(self.session_id.clone()),
            fields,
        };

        if let (Some(logger), Ok(json_line)) = (&self.rotating_logger, serde_json::to_string(&entry)) {
            if let Ok(mut logger) = logger.lock() {
                // Logging failures never reach callers
                let _ = logger.append(&json_line);
            }
        }
    }

    pub fn debug_sync(&self, component: &str, event: &str, message: &str) {
        self.log_sync(LogLevel::Debug, component, event, message, HashMap::new());
    }

    pub fn error_sync(&self, component: &str, event: &str, message: &str) {
        self.log_sync(LogLevel::Error, component, event, message, HashMap::new());
    }

    pub fn config_resolved(&self, platform: &str, active: bool, protocols: &[&str]) {
        let mut fields = HashMap::new();
        fields.insert("platform".to_string(), serde_json::Value::from(platform));
        fields.insert("static_active".to_string(), serde_json::Value::Bool(active));
        fields.insert("protocols".to_string(), serde_json::Value::from(protocols.to_vec()));

        self.log_sync(
            LogLevel::Proxy,
            "ProxyConfigResolver",
            "config_resolved",
            &format!("Resolved {} proxy config (active: {})", platform, active),
            fields,
        );
    }

    pub fn endpoint_selected(&self, protocol: Option<&str>, endpoint: Option<&str>) {
        let mut fields = HashMap::new();
        if let Some(protocol) = protocol {
            fields.insert("protocol".to_string(), serde_json::Value::from(protocol));
        }

        let message = match endpoint {
            Some(endpoint) => {
                fields.insert("endpoint".to_string(), serde_json::Value::from(endpoint));
                format!("Selected proxy endpoint {}", endpoint)
            }
            None => "No proxy selected, using direct connection".to_string(),
        };

        self.log_sync(LogLevel::Proxy, "ProxyEndpointSelector", "endpoint_selected", &message, fields);
    }

    pub fn endpoint_replaced(&self, reason: &str, endpoint: Option<&str>) {
        let mut fields = HashMap::new();
        fields.insert("reason".to_string(), serde_json::Value::from(reason));
        fields.insert(
            "endpoint".to_string(),
            endpoint
                .map(serde_json::Value::from)
                .unwrap_or(serde_json::Value::Null),
        );

        self.log_sync(
            LogLevel::Proxy,
            "ProxyClient",
            "endpoint_replaced",
            &format!("Cached endpoint replaced ({}): {}", reason, endpoint.unwrap_or("DIRECT")),
            fields,
        );
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn get_session_id(&self) -> &str {
        &self.session_id
    }
}

static DEBUG_LOGGER: OnceLock<DebugLogger> = OnceLock::new();

/// Process-wide logger, configured from the environment on first use
pub fn get_debug_logger() -> &'static DebugLogger {
    DEBUG_LOGGER.get_or_init(DebugLogger::new)
}

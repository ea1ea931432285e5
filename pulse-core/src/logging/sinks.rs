use crate::config::model::{CollectorSinkConfig, FileSinkConfig};
use crate::logging::record::{LogLevel, LogRecord};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, warn};

/// A log output destination. Sinks receive the already-serialized line along
/// with the record itself; each sink filters by its own minimum severity.
/// Write failures are reported by the dispatcher, never propagated to the
/// request path.
#[async_trait]
pub trait LogSink: Send + Sync {
    fn name(&self) -> &'static str;

    fn min_level(&self) -> LogLevel;

    async fn write(&mut self, record: &LogRecord, line: &str) -> Result<()>;

    async fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Writes each record to stdout, in dispatch order.
pub struct ConsoleSink {
    min_level: LogLevel,
}

impl ConsoleSink {
    pub fn new(min_level: LogLevel) -> Self {
        Self { min_level }
    }
}

#[async_trait]
impl LogSink for ConsoleSink {
    fn name(&self) -> &'static str {
        "console"
    }

    fn min_level(&self) -> LogLevel {
        self.min_level
    }

    async fn write(&mut self, _record: &LogRecord, line: &str) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{line}")?;
        Ok(())
    }
}

struct OpenLogFile {
    date: NaiveDate,
    seq: u32,
    len: u64,
    writer: BufWriter<File>,
}

/// Appends records to `<dir>/<prefix>.<YYYY-MM-DD>.log`, rolling on UTC date
/// change and on the size cap (size-rolled files get a numeric suffix).
/// Files older than the retention window are pruned on every roll.
pub struct RollingFileSink {
    dir: PathBuf,
    prefix: String,
    min_level: LogLevel,
    max_bytes: u64,
    retention_days: u32,
    current: Option<OpenLogFile>,
}

impl RollingFileSink {
    pub fn new(config: &FileSinkConfig) -> Result<Self> {
        fs::create_dir_all(&config.dir)?;
        Ok(Self {
            dir: PathBuf::from(&config.dir),
            prefix: config.prefix.clone(),
            min_level: config.min_level,
            max_bytes: config.max_bytes.max(1),
            retention_days: config.retention_days,
            current: None,
        })
    }

    fn file_name(&self, date: NaiveDate, seq: u32) -> String {
        if seq == 0 {
            format!("{}.{}.log", self.prefix, date.format("%Y-%m-%d"))
        } else {
            format!("{}.{}.{}.log", self.prefix, date.format("%Y-%m-%d"), seq)
        }
    }

    fn ensure_writer(&mut self, today: NaiveDate) -> Result<&mut OpenLogFile> {
        let needs_roll = match &self.current {
            Some(open) => open.date != today || open.len >= self.max_bytes,
            None => true,
        };

        if needs_roll {
            if let Some(open) = self.current.as_mut() {
                open.writer.flush()?;
            }
            let mut seq = match &self.current {
                Some(open) if open.date == today => open.seq + 1,
                _ => 0,
            };
            // Skip over files already at the size cap, e.g. after a restart
            loop {
                let path = self.dir.join(self.file_name(today, seq));
                let len = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
                if len < self.max_bytes {
                    let file = OpenOptions::new().create(true).append(true).open(&path)?;
                    debug!(path = %path.display(), "opened log file");
                    self.current = Some(OpenLogFile {
                        date: today,
                        seq,
                        len,
                        writer: BufWriter::new(file),
                    });
                    break;
                }
                seq += 1;
            }
            self.prune(today);
        }

        match self.current.as_mut() {
            Some(open) => Ok(open),
            None => Err(anyhow::anyhow!("log file not open")),
        }
    }

    fn prune(&self, today: NaiveDate) {
        let Some(cutoff) = today.checked_sub_days(Days::new(u64::from(self.retention_days)))
        else {
            return;
        };
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "failed to scan log directory");
                return;
            }
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(date) = parse_log_file_date(&name, &self.prefix) {
                if date < cutoff {
                    if let Err(e) = fs::remove_file(entry.path()) {
                        warn!(file = %name, error = %e, "failed to prune expired log file");
                    } else {
                        debug!(file = %name, "pruned expired log file");
                    }
                }
            }
        }
    }
}

#[async_trait]
impl LogSink for RollingFileSink {
    fn name(&self) -> &'static str {
        "file"
    }

    fn min_level(&self) -> LogLevel {
        self.min_level
    }

    async fn write(&mut self, _record: &LogRecord, line: &str) -> Result<()> {
        let today = Utc::now().date_naive();
        let open = self.ensure_writer(today)?;
        open.writer.write_all(line.as_bytes())?;
        open.writer.write_all(b"\n")?;
        open.len += line.len() as u64 + 1;
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        if let Some(open) = self.current.as_mut() {
            open.writer.flush()?;
        }
        Ok(())
    }
}

fn parse_log_file_date(file_name: &str, prefix: &str) -> Option<NaiveDate> {
    let rest = file_name.strip_prefix(prefix)?.strip_prefix('.')?;
    let date_part = rest.split('.').next()?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Ships records to a remote collector in batches. Delivery is best-effort:
/// a rejected or undeliverable batch is dropped after a local warning.
pub struct HttpCollectorSink {
    client: reqwest::Client,
    url: String,
    min_level: LogLevel,
    batch_size: usize,
    buffer: Vec<serde_json::Value>,
}

impl HttpCollectorSink {
    pub fn new(config: &CollectorSinkConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.url.clone(),
            min_level: config.min_level,
            batch_size: config.batch_size.max(1),
            buffer: Vec::new(),
        }
    }

    async fn send_batch(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let batch = std::mem::take(&mut self.buffer);
        let count = batch.len();
        match self.client.post(&self.url).json(&batch).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(count, "delivered log batch to collector");
            }
            Ok(response) => {
                warn!(status = %response.status(), count, "log collector rejected batch");
            }
            Err(e) => {
                warn!(error = %e, count, "failed to deliver log batch to collector");
            }
        }
    }
}

#[async_trait]
impl LogSink for HttpCollectorSink {
    fn name(&self) -> &'static str {
        "collector"
    }

    fn min_level(&self) -> LogLevel {
        self.min_level
    }

    async fn write(&mut self, record: &LogRecord, _line: &str) -> Result<()> {
        self.buffer.push(serde_json::to_value(record)?);
        if self.buffer.len() >= self.batch_size {
            self.send_batch().await;
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        self.send_batch().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pulse-sink-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn file_config(dir: &PathBuf) -> FileSinkConfig {
        FileSinkConfig {
            enabled: true,
            dir: dir.to_string_lossy().into_owned(),
            prefix: "pulse".to_string(),
            min_level: LogLevel::Debug,
            max_bytes: 1024 * 1024,
            retention_days: 14,
        }
    }

    fn record() -> LogRecord {
        LogRecord::new(LogLevel::Info, "request completed", Map::new())
    }

    #[tokio::test]
    async fn test_file_sink_writes_date_stamped_file() {
        let dir = test_dir("date");
        let mut sink = RollingFileSink::new(&file_config(&dir)).unwrap();

        let rec = record();
        sink.write(&rec, &rec.to_json_line()).await.unwrap();
        sink.flush().await.unwrap();

        let expected = dir.join(format!("pulse.{}.log", Utc::now().date_naive().format("%Y-%m-%d")));
        let contents = fs::read_to_string(&expected).unwrap();
        assert!(contents.contains("request completed"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_file_sink_rolls_on_size() {
        let dir = test_dir("size");
        let mut config = file_config(&dir);
        config.max_bytes = 16;
        let mut sink = RollingFileSink::new(&config).unwrap();

        let rec = record();
        let line = rec.to_json_line();
        sink.write(&rec, &line).await.unwrap();
        sink.write(&rec, &line).await.unwrap();
        sink.flush().await.unwrap();

        let date = Utc::now().date_naive().format("%Y-%m-%d");
        assert!(dir.join(format!("pulse.{date}.log")).exists());
        assert!(dir.join(format!("pulse.{date}.1.log")).exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_file_sink_prunes_expired_files() {
        let dir = test_dir("prune");
        let stale = dir.join("pulse.2020-01-01.log");
        let fresh_foreign = dir.join("other.2020-01-01.log");
        fs::write(&stale, "old\n").unwrap();
        fs::write(&fresh_foreign, "not ours\n").unwrap();

        let mut sink = RollingFileSink::new(&file_config(&dir)).unwrap();
        let rec = record();
        sink.write(&rec, &rec.to_json_line()).await.unwrap();
        sink.flush().await.unwrap();

        assert!(!stale.exists());
        // Files with a different prefix are left alone
        assert!(fresh_foreign.exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_parse_log_file_date() {
        assert_eq!(
            parse_log_file_date("pulse.2026-08-06.log", "pulse"),
            NaiveDate::from_ymd_opt(2026, 8, 6)
        );
        assert_eq!(
            parse_log_file_date("pulse.2026-08-06.3.log", "pulse"),
            NaiveDate::from_ymd_opt(2026, 8, 6)
        );
        assert_eq!(parse_log_file_date("other.2026-08-06.log", "pulse"), None);
        assert_eq!(parse_log_file_date("pulse.not-a-date.log", "pulse"), None);
    }
}

use crate::config::model::LoggingConfig;
use crate::logging::record::{LogLevel, LogRecord};
use crate::logging::sinks::{ConsoleSink, HttpCollectorSink, LogSink, RollingFileSink};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{info, warn};

enum Command {
    Record(LogRecord),
    Shutdown,
}

/// Process-wide structured logger.
///
/// `log` stamps a record and hands it to the background dispatch task over a
/// bounded queue with a non-blocking `try_send`; when the queue is full the
/// newest record is dropped and counted. The dispatch task serializes each
/// record once and offers it to every sink whose minimum severity admits it,
/// flushing buffered sinks on a fixed interval and on shutdown.
pub struct RequestLogger {
    sender: mpsc::Sender<Command>,
    submitted: Arc<AtomicU64>,
    dropped: Arc<AtomicU64>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RequestLogger {
    pub fn new(
        sinks: Vec<Box<dyn LogSink>>,
        queue_capacity: usize,
        flush_interval: Duration,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(queue_capacity.max(1));
        let handle = tokio::spawn(dispatch_loop(receiver, sinks, flush_interval));

        Self {
            sender,
            submitted: Arc::new(AtomicU64::new(0)),
            dropped: Arc::new(AtomicU64::new(0)),
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Build the sink set from configuration and start the dispatch task.
    pub fn from_config(config: &LoggingConfig) -> Result<Self, anyhow::Error> {
        let mut sinks: Vec<Box<dyn LogSink>> = Vec::new();
        if config.console.enabled {
            sinks.push(Box::new(ConsoleSink::new(config.console.min_level)));
        }
        if config.file.enabled {
            sinks.push(Box::new(RollingFileSink::new(&config.file)?));
        }
        if config.collector.enabled {
            sinks.push(Box::new(HttpCollectorSink::new(&config.collector)));
        }
        Ok(Self::new(sinks, config.queue_capacity, config.flush_interval()))
    }

    /// Enqueue one record. Never blocks and never fails the caller.
    pub fn log(&self, level: LogLevel, message: impl Into<String>, fields: Map<String, Value>) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
        let record = LogRecord::new(level, message, fields);
        if self.sender.try_send(Command::Record(record)).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn submitted_records(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    /// Records lost to a full queue (or to a stopped dispatcher).
    pub fn dropped_records(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Drain the queue and flush every sink. Called once at process exit.
    pub async fn shutdown(&self) {
        let _ = self.sender.send(Command::Shutdown).await;
        if let Some(handle) = self.handle.lock().await.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "log dispatch task ended abnormally");
            }
        }
    }
}

async fn dispatch_loop(
    mut receiver: mpsc::Receiver<Command>,
    mut sinks: Vec<Box<dyn LogSink>>,
    flush_interval: Duration,
) {
    let mut ticker = interval(flush_interval);

    loop {
        tokio::select! {
            command = receiver.recv() => match command {
                Some(Command::Record(record)) => dispatch_record(&mut sinks, &record).await,
                Some(Command::Shutdown) | None => break,
            },
            _ = ticker.tick() => flush_sinks(&mut sinks).await,
        }
    }

    // Drain whatever was queued before shutdown, then flush buffered sinks
    while let Ok(command) = receiver.try_recv() {
        if let Command::Record(record) = command {
            dispatch_record(&mut sinks, &record).await;
        }
    }
    flush_sinks(&mut sinks).await;
    info!("log dispatch task stopped");
}

async fn dispatch_record(sinks: &mut [Box<dyn LogSink>], record: &LogRecord) {
    let line = record.to_json_line();
    for sink in sinks.iter_mut() {
        if record.level >= sink.min_level() {
            if let Err(e) = sink.write(record, &line).await {
                warn!(sink = sink.name(), error = %e, "log sink write failed");
            }
        }
    }
}

async fn flush_sinks(sinks: &mut [Box<dyn LogSink>]) {
    for sink in sinks.iter_mut() {
        if let Err(e) = sink.flush().await {
            warn!(sink = sink.name(), error = %e, "log sink flush failed");
        }
    }
}

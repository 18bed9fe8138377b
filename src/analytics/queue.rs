//! Analytics queue: in-memory buffer flushed by size or timer.
//!
//! Sessions hand records to an [`AnalyticsHandle`] without awaiting. A single
//! spawned task owns the buffer and is the only place the sink is awaited. A
//! failed batch goes back to the front of the buffer, so delivery is
//! at-least-once and the buffer grows without bound while the sink is down.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::AnalyticsConfig;
use crate::error::AnalyticsError;

use super::record::AnalyticsRecord;
use super::sink::AnalyticsSink;

/// Shortest flush period accepted; `tokio::time::interval` rejects zero.
const MIN_FLUSH_INTERVAL: Duration = Duration::from_millis(10);

/// Ordered record buffer with front re-queue.
#[derive(Debug, Default)]
pub struct AnalyticsBuffer {
    records: VecDeque<AnalyticsRecord>,
    batch_size: usize,
}

impl AnalyticsBuffer {
    pub fn new(batch_size: usize) -> Self {
        Self {
            records: VecDeque::new(),
            batch_size: batch_size.max(1),
        }
    }

    /// Append a record. Returns true once a full batch is buffered.
    pub fn push(&mut self, record: AnalyticsRecord) -> bool {
        self.records.push_back(record);
        self.records.len() >= self.batch_size
    }

    /// Remove up to one batch from the front.
    pub fn take_batch(&mut self) -> Vec<AnalyticsRecord> {
        let n = self.batch_size.min(self.records.len());
        self.records.drain(..n).collect()
    }

    /// Put a failed batch back ahead of everything buffered since.
    pub fn requeue_front(&mut self, batch: Vec<AnalyticsRecord>) {
        for record in batch.into_iter().rev() {
            self.records.push_front(record);
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Send buffered batches until empty or a send fails.
    /// Returns the number of records delivered.
    pub async fn flush_to(&mut self, sink: &dyn AnalyticsSink) -> Result<usize, AnalyticsError> {
        let mut sent = 0;
        while !self.is_empty() {
            let batch = self.take_batch();
            match sink.send_batch(&batch).await {
                Ok(()) => sent += batch.len(),
                Err(e) => {
                    warn!(
                        sink = sink.name(),
                        count = batch.len(),
                        buffered = self.len() + batch.len(),
                        error = %e,
                        "Analytics flush failed, re-queueing batch"
                    );
                    self.requeue_front(batch);
                    return Err(e);
                }
            }
        }
        if sent > 0 {
            debug!(sink = sink.name(), count = sent, "Flushed analytics");
        }
        Ok(sent)
    }
}

enum Command {
    Track(AnalyticsRecord),
    Flush(oneshot::Sender<Result<usize, AnalyticsError>>),
}

/// Cheap, cloneable front door to the analytics task.
#[derive(Clone)]
pub struct AnalyticsHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl AnalyticsHandle {
    /// Queue a record. Never blocks; dropped with a warning if the task is gone.
    pub fn track(&self, record: AnalyticsRecord) {
        if self.tx.send(Command::Track(record)).is_err() {
            warn!("Analytics queue closed, dropping record");
        }
    }

    /// Flush everything buffered now.
    pub async fn flush(&self) -> Result<usize, AnalyticsError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::Flush(reply_tx))
            .map_err(|_| AnalyticsError::QueueClosed)?;
        reply_rx.await.map_err(|_| AnalyticsError::QueueClosed)?
    }
}

/// Spawn the analytics task. It exits after every handle is dropped,
/// attempting one final flush.
pub fn spawn_analytics_queue(
    sink: Arc<dyn AnalyticsSink>,
    config: &AnalyticsConfig,
) -> (AnalyticsHandle, tokio::task::JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Command>();
    let mut buffer = AnalyticsBuffer::new(config.batch_size);
    let period = config.flush_interval.max(MIN_FLUSH_INTERVAL);

    info!(
        sink = sink.name(),
        batch_size = config.batch_size,
        interval_ms = period.as_millis() as u64,
        "Analytics queue started"
    );

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // Skip immediate first tick
        ticker.tick().await;

        loop {
            tokio::select! {
                command = rx.recv() => match command {
                    Some(Command::Track(record)) => {
                        if buffer.push(record) {
                            let _ = buffer.flush_to(sink.as_ref()).await;
                        }
                    }
                    Some(Command::Flush(reply)) => {
                        let result = buffer.flush_to(sink.as_ref()).await;
                        let _ = reply.send(result);
                    }
                    None => {
                        let _ = buffer.flush_to(sink.as_ref()).await;
                        break;
                    }
                },
                _ = ticker.tick() => {
                    if !buffer.is_empty() {
                        let _ = buffer.flush_to(sink.as_ref()).await;
                    }
                }
            }
        }

        if !buffer.is_empty() {
            warn!(count = buffer.len(), "Analytics queue stopped with undelivered records");
        }
    });

    (AnalyticsHandle { tx }, handle)
}

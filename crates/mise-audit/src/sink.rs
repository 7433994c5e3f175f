//! Async audit sink.
//!
//! A bounded `mpsc` queue feeding a small pool of tokio workers. Producers
//! never wait and never see an error: when the queue is full or closed the
//! payload is logged and dropped. Workers validate and persist each payload
//! exactly once. A failed write is logged with the full payload and
//! discarded; nothing is retried or requeued.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use mise_config::AuditConfig;
use mise_core::payload::AuditPayload;
use mise_schema::{AUDIT_PAYLOAD, SchemaRegistry};
use serde::Serialize;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::error::AuditError;
use crate::store::AuditStore;

/// Sizing and behaviour of the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkOptions {
    /// Maximum number of queued payloads.
    pub capacity: usize,
    /// Number of consumer tasks.
    pub workers: usize,
    /// Validate payloads against the `audit_payload` JSON Schema before writing.
    pub validate: bool,
}

impl SinkOptions {
    #[must_use]
    pub const fn from_config(config: &AuditConfig) -> Self {
        Self {
            capacity: config.queue_capacity,
            workers: config.workers,
            validate: config.validate_payloads,
        }
    }

    /// Number of consumer tasks actually spawned. At least one.
    #[must_use]
    pub const fn effective_workers(&self) -> usize {
        if self.workers == 0 { 1 } else { self.workers }
    }
}

impl Default for SinkOptions {
    fn default() -> Self {
        Self::from_config(&AuditConfig::default())
    }
}

/// Result of handing a payload to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Queued,
    Dropped,
}

/// Point-in-time sink counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SinkStats {
    pub enqueued: u64,
    pub dropped: u64,
    pub written: u64,
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    enqueued: AtomicU64,
    dropped: AtomicU64,
    written: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> SinkStats {
        SinkStats {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            written: self.written.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Producer side of the sink. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AuditSinkHandle {
    tx: mpsc::Sender<AuditPayload>,
    counters: Arc<Counters>,
}

impl AuditSinkHandle {
    fn channel(capacity: usize) -> (Self, mpsc::Receiver<AuditPayload>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = Self {
            tx,
            counters: Arc::new(Counters::default()),
        };
        (handle, rx)
    }

    /// Queue a payload for persistence without waiting.
    pub fn enqueue(&self, payload: AuditPayload) -> EnqueueOutcome {
        match self.tx.try_send(payload) {
            Ok(()) => {
                self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
                EnqueueOutcome::Queued
            }
            Err(mpsc::error::TrySendError::Full(payload)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    entity_type = %payload.entity_type,
                    entity_id = %payload.entity_id,
                    change_type = %payload.change_type,
                    "audit queue full; payload dropped"
                );
                EnqueueOutcome::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(payload)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    entity_type = %payload.entity_type,
                    entity_id = %payload.entity_id,
                    change_type = %payload.change_type,
                    "audit queue closed; payload dropped"
                );
                EnqueueOutcome::Dropped
            }
        }
    }

    #[must_use]
    pub fn stats(&self) -> SinkStats {
        self.counters.snapshot()
    }
}

/// Owner of the worker pool.
pub struct AuditSink {
    handle: AuditSinkHandle,
    shutdown: watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
}

impl AuditSink {
    /// Start the worker pool on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn<A: AuditStore>(store: Arc<A>, options: SinkOptions) -> Self {
        let (handle, rx) = AuditSinkHandle::channel(options.capacity);
        let rx = Arc::new(Mutex::new(rx));
        let (shutdown, shutdown_rx) = watch::channel(false);
        let registry = options.validate.then(|| Arc::new(SchemaRegistry::new()));

        let worker_count = options.effective_workers();
        let workers: Vec<JoinHandle<()>> = (0..worker_count)
            .map(|worker| {
                let consumer = Consumer {
                    worker,
                    store: Arc::clone(&store),
                    registry: registry.clone(),
                    counters: Arc::clone(&handle.counters),
                };
                tokio::spawn(consumer.run(Arc::clone(&rx), shutdown_rx.clone()))
            })
            .collect();

        debug!(
            capacity = options.capacity,
            workers = workers.len(),
            validate = options.validate,
            "audit sink started"
        );

        Self {
            handle,
            shutdown,
            workers,
        }
    }

    #[must_use]
    pub fn handle(&self) -> AuditSinkHandle {
        self.handle.clone()
    }

    #[must_use]
    pub fn stats(&self) -> SinkStats {
        self.handle.stats()
    }

    /// Number of running consumer tasks.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Close the queue, let the workers drain what is already queued, and
    /// wait for them to exit. Payloads enqueued afterwards are dropped.
    pub async fn shutdown(self) -> SinkStats {
        // Receivers outlive this send; an error only means every worker already exited.
        let _ = self.shutdown.send(true);
        for worker in self.workers {
            if let Err(e) = worker.await {
                error!(error = %e, "audit worker terminated abnormally");
            }
        }
        let stats = self.handle.stats();
        debug!(?stats, "audit sink drained");
        stats
    }
}

struct Consumer<A> {
    worker: usize,
    store: Arc<A>,
    registry: Option<Arc<SchemaRegistry>>,
    counters: Arc<Counters>,
}

impl<A: AuditStore> Consumer<A> {
    async fn run(
        self,
        rx: Arc<Mutex<mpsc::Receiver<AuditPayload>>>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            let next = {
                let mut rx = rx.lock().await;
                if *shutdown.borrow_and_update() {
                    rx.close();
                }
                tokio::select! {
                    biased;
                    payload = rx.recv() => payload,
                    _ = shutdown.changed() => {
                        rx.close();
                        rx.recv().await
                    }
                }
            };

            let Some(payload) = next else {
                break;
            };
            self.consume(payload).await;
        }
        debug!(worker = self.worker, "audit worker stopped");
    }

    async fn consume(&self, payload: AuditPayload) {
        match self.persist(&payload).await {
            Ok(()) => {
                self.counters.written.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                let body = serde_json::to_string(&payload)
                    .unwrap_or_else(|_| format!("{payload:?}"));
                error!(
                    worker = self.worker,
                    error = %e,
                    entity_type = %payload.entity_type,
                    entity_id = %payload.entity_id,
                    change_type = %payload.change_type,
                    payload = %body,
                    "audit write failed; payload discarded"
                );
            }
        }
    }

    async fn persist(&self, payload: &AuditPayload) -> Result<(), AuditError> {
        if let Some(registry) = &self.registry {
            registry.validate(AUDIT_PAYLOAD, &serde_json::to_value(payload)?)?;
        }
        let record = self
            .store
            .create_record(payload)
            .await
            .map_err(|e| AuditError::Store(e.to_string()))?;
        debug!(
            worker = self.worker,
            audit_id = %record.id,
            version = record.version,
            "audit record written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mise_core::enums::{ChangeType, EntityType};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::{RecordingAuditStore, payload};

    #[test]
    fn options_follow_config() {
        let config = AuditConfig {
            queue_capacity: 8,
            workers: 3,
            validate_payloads: false,
            ..AuditConfig::default()
        };
        assert_eq!(
            SinkOptions::from_config(&config),
            SinkOptions {
                capacity: 8,
                workers: 3,
                validate: false,
            }
        );
    }

    #[test]
    fn zero_workers_still_spawns_one_consumer() {
        let options = SinkOptions {
            workers: 0,
            ..SinkOptions::default()
        };
        assert_eq!(options.effective_workers(), 1);
        assert_eq!(SinkOptions { workers: 4, ..options }.effective_workers(), 4);
    }

    #[tokio::test]
    async fn sink_with_zero_workers_still_drains() {
        let store = Arc::new(RecordingAuditStore::default());
        let sink = AuditSink::spawn(
            Arc::clone(&store),
            SinkOptions {
                workers: 0,
                ..SinkOptions::default()
            },
        );
        assert_eq!(sink.worker_count(), 1);
        sink.handle()
            .enqueue(payload(EntityType::Tag, "tag-00000001", ChangeType::Create));
        assert_eq!(sink.shutdown().await.written, 1);
    }

    #[tokio::test]
    async fn full_queue_drops_without_blocking() {
        let (handle, _rx) = AuditSinkHandle::channel(1);
        let first = payload(EntityType::Dish, "dsh-00000001", ChangeType::Update);
        let second = payload(EntityType::Dish, "dsh-00000002", ChangeType::Update);

        assert_eq!(handle.enqueue(first), EnqueueOutcome::Queued);
        assert_eq!(handle.enqueue(second), EnqueueOutcome::Dropped);
        assert_eq!(
            handle.stats(),
            SinkStats {
                enqueued: 1,
                dropped: 1,
                ..SinkStats::default()
            }
        );
    }

    #[tokio::test]
    async fn closed_queue_drops() {
        let (handle, rx) = AuditSinkHandle::channel(4);
        drop(rx);
        let outcome = handle.enqueue(payload(EntityType::Tag, "tag-00000001", ChangeType::Create));
        assert_eq!(outcome, EnqueueOutcome::Dropped);
        assert_eq!(handle.stats().dropped, 1);
    }

    #[tokio::test]
    async fn workers_persist_everything_before_shutdown_returns() {
        let store = Arc::new(RecordingAuditStore::default());
        let sink = AuditSink::spawn(
            Arc::clone(&store),
            SinkOptions {
                capacity: 64,
                workers: 3,
                validate: true,
            },
        );
        let handle = sink.handle();
        for i in 0..20 {
            let id = format!("dsh-{i:08x}");
            assert_eq!(
                handle.enqueue(payload(EntityType::Dish, &id, ChangeType::Update)),
                EnqueueOutcome::Queued
            );
        }

        let stats = sink.shutdown().await;
        assert_eq!(stats.enqueued, 20);
        assert_eq!(stats.written, 20);
        assert_eq!(stats.failed, 0);
        assert_eq!(store.records().len(), 20);
    }

    #[tokio::test]
    async fn failed_write_is_counted_and_not_retried() {
        let store = Arc::new(RecordingAuditStore::failing());
        let sink = AuditSink::spawn(Arc::clone(&store), SinkOptions::default());
        sink.handle()
            .enqueue(payload(EntityType::User, "usr-00000001", ChangeType::Update));

        let stats = sink.shutdown().await;
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.written, 0);
        assert_eq!(store.attempts(), 1);
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn schema_rejection_skips_the_store() {
        let store = Arc::new(RecordingAuditStore::default());
        let sink = AuditSink::spawn(Arc::clone(&store), SinkOptions::default());
        let mut bad = payload(EntityType::User, "usr-00000001", ChangeType::Update);
        bad.changed_fields.clear();
        sink.handle().enqueue(bad);

        let stats = sink.shutdown().await;
        assert_eq!(stats.failed, 1);
        assert_eq!(store.attempts(), 0);
    }

    #[tokio::test]
    async fn enqueue_after_shutdown_is_dropped() {
        let store = Arc::new(RecordingAuditStore::default());
        let sink = AuditSink::spawn(store, SinkOptions::default());
        let handle = sink.handle();
        sink.shutdown().await;

        let outcome = handle.enqueue(payload(EntityType::Tag, "tag-00000001", ChangeType::Create));
        assert_eq!(outcome, EnqueueOutcome::Dropped);
    }
}

//! In-memory event bus.
//!
//! Producers publish into a bounded queue without blocking; a dedicated
//! worker task pulls events off the queue and fans each one out to every
//! subscribed handler, one spawned task per handler invocation. Lifecycle
//! is `Running -> Draining -> Closed`: shutdown cancels the internal
//! token, the worker empties whatever the queue already accepted, then
//! joins all in-flight handler tasks before the bus reports closed.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use orders_core::event::{EventType, OrderEvent};

use crate::stats::EventStats;

/// Number of events the in-memory queue buffers before publishes are
/// rejected with [`PublishError::QueueFull`].
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Error returned to publishers.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum PublishError {
    /// The bounded queue has no free slot; rejecting instead of blocking
    /// is the back-pressure policy.
    #[error("event queue is full")]
    QueueFull,
    /// The bus has begun or completed shutdown.
    #[error("event bus is closed")]
    Closed,
    /// The caller's own cancellation signal fired before the event was
    /// accepted.
    #[error("publish cancelled by caller")]
    Cancelled,
    /// The selected bus implementation does not support publishing.
    #[error("event bus implementation does not support publish: {0}")]
    Unsupported(&'static str),
}

/// Error returned from handler registration. The in-memory bus never
/// fails registration; the variants exist so implementations may start
/// rejecting subscriptions without an API break.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubscribeError {
    /// The selected bus implementation does not support subscriptions.
    #[error("event bus implementation does not support subscribe: {0}")]
    Unsupported(&'static str),
}

/// Error returned from bus shutdown.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum CloseError {
    /// The dispatch worker terminated abnormally.
    #[error("dispatch worker failed: {0}")]
    Worker(String),
    /// The selected bus implementation does not support closing.
    #[error("event bus implementation does not support close: {0}")]
    Unsupported(&'static str),
}

/// Error returned by a handler for a single event. Terminal for that
/// handler/event pairing: counted and logged, never retried, never
/// escalated to sibling handlers or the producer.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Notification delivery failed.
    #[error("notification delivery failed: {0}")]
    Notification(String),
    /// The audit sink rejected the record.
    #[error("audit append failed: {0}")]
    Audit(String),
    /// Any other processing failure.
    #[error("{0}")]
    Other(String),
}

/// A subscriber callback, invoked once per relevant event, independently
/// of other handlers. Implementations must not mutate the event and must
/// not assume any ordering relative to sibling handlers.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Stable name used in logs.
    fn name(&self) -> &'static str;

    /// Processes one event.
    async fn handle(&self, event: &OrderEvent) -> Result<(), HandlerError>;
}

/// Publication/subscription interface of the event pipeline.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Enqueues an event without blocking. Every rejection surfaces as an
    /// error to the caller; no event is silently dropped.
    fn publish(&self, event: OrderEvent) -> Result<(), PublishError>;

    /// [`EventBus::publish`] guarded by the caller's own cancellation
    /// signal. The caller's token only affects this publish attempt,
    /// never the bus's lifecycle.
    fn publish_cancellable(
        &self,
        event: OrderEvent,
        cancel: &CancellationToken,
    ) -> Result<(), PublishError> {
        if cancel.is_cancelled() {
            return Err(PublishError::Cancelled);
        }
        self.publish(event)
    }

    /// Registers a handler for one event type. Multiple handlers may be
    /// registered for the same type; all are invoked independently.
    fn subscribe(
        &self,
        event_type: EventType,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), SubscribeError>;

    /// Signals shutdown, drains already-accepted events to their
    /// handlers, and waits for all in-flight handler invocations.
    /// Publishing after `close` fails with [`PublishError::Closed`];
    /// calling `close` again is a no-op.
    async fn close(&self) -> Result<(), CloseError>;
}

type HandlerRegistry = Arc<RwLock<HashMap<EventType, Vec<Arc<dyn EventHandler>>>>>;

/// Bounded in-memory [`EventBus`] for single-process deployments.
pub struct InMemoryEventBus {
    registry: HandlerRegistry,
    queue_tx: mpsc::Sender<OrderEvent>,
    shutdown: CancellationToken,
    worker: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl InMemoryEventBus {
    /// Creates a bus with the default queue capacity and starts its
    /// dispatch worker. Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(stats: Arc<EventStats>) -> Self {
        Self::with_capacity(stats, DEFAULT_QUEUE_CAPACITY)
    }

    /// Creates a bus with an explicit queue capacity.
    #[must_use]
    pub fn with_capacity(stats: Arc<EventStats>, capacity: usize) -> Self {
        let (queue_tx, queue_rx) = mpsc::channel(capacity);
        let registry: HandlerRegistry = Arc::new(RwLock::new(HashMap::new()));
        let shutdown = CancellationToken::new();

        let worker = DispatchWorker {
            queue: queue_rx,
            registry: Arc::clone(&registry),
            shutdown: shutdown.clone(),
            stats,
            tasks: JoinSet::new(),
        };
        let handle = tokio::spawn(worker.run());

        Self {
            registry,
            queue_tx,
            shutdown,
            worker: tokio::sync::Mutex::new(Some(handle)),
        }
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    fn publish(&self, event: OrderEvent) -> Result<(), PublishError> {
        if self.shutdown.is_cancelled() {
            return Err(PublishError::Closed);
        }
        match self.queue_tx.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(PublishError::QueueFull),
            Err(TrySendError::Closed(_)) => Err(PublishError::Closed),
        }
    }

    fn subscribe(
        &self,
        event_type: EventType,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), SubscribeError> {
        let name = handler.name();
        self.registry
            .write()
            .expect("handler registry lock poisoned")
            .entry(event_type)
            .or_default()
            .push(handler);
        tracing::debug!(handler = name, event_type = %event_type, "handler subscribed");
        Ok(())
    }

    async fn close(&self) -> Result<(), CloseError> {
        self.shutdown.cancel();
        let handle = self.worker.lock().await.take();
        if let Some(handle) = handle {
            handle
                .await
                .map_err(|err| CloseError::Worker(err.to_string()))?;
            tracing::info!("event bus closed");
        }
        Ok(())
    }
}

/// The dedicated dispatch loop. Owns the receiving half of the queue and
/// the set of spawned handler tasks, so `close` can deterministically
/// await everything the bus started.
struct DispatchWorker {
    queue: mpsc::Receiver<OrderEvent>,
    registry: HandlerRegistry,
    shutdown: CancellationToken,
    stats: Arc<EventStats>,
    tasks: JoinSet<()>,
}

impl DispatchWorker {
    async fn run(mut self) {
        let shutdown = self.shutdown.clone();
        loop {
            tokio::select! {
                maybe_event = self.queue.recv() => {
                    match maybe_event {
                        Some(event) => self.dispatch(event),
                        None => break,
                    }
                }
                () = shutdown.cancelled() => {
                    self.drain();
                    break;
                }
            }
            self.reap_finished();
        }
        while let Some(joined) = self.tasks.join_next().await {
            log_aborted(joined);
        }
    }

    /// Empties everything the queue accepted before shutdown.
    fn drain(&mut self) {
        loop {
            match self.queue.try_recv() {
                Ok(event) => self.dispatch(event),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
    }

    /// Fans one event out to every handler subscribed to its type, one
    /// spawned task per handler.
    fn dispatch(&mut self, event: OrderEvent) {
        let handlers: Vec<Arc<dyn EventHandler>> = {
            let registry = self.registry.read().expect("handler registry lock poisoned");
            registry.get(&event.event_type()).cloned().unwrap_or_default()
        };

        if handlers.is_empty() {
            tracing::warn!(
                event_type = %event.event_type(),
                event_id = %event.id,
                "no subscribers for event"
            );
            return;
        }

        let event = Arc::new(event);
        for handler in handlers {
            let event = Arc::clone(&event);
            let stats = Arc::clone(&self.stats);
            self.tasks.spawn(async move {
                if let Err(err) = handler.handle(&event).await {
                    stats.record_processing_error();
                    tracing::error!(
                        handler = handler.name(),
                        event_type = %event.event_type(),
                        event_id = %event.id,
                        error = %err,
                        "event handler failed"
                    );
                }
            });
        }
    }

    /// Collects handler tasks that have already finished so the set does
    /// not grow without bound between events.
    fn reap_finished(&mut self) {
        while let Some(joined) = self.tasks.try_join_next() {
            log_aborted(joined);
        }
    }
}

fn log_aborted(joined: Result<(), tokio::task::JoinError>) {
    if let Err(err) = joined {
        tracing::error!(error = %err, "event handler task aborted");
    }
}

// src/server/notifier.rs

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_stream::Stream;
use tracing::{debug, info, warn};

use crate::server::events::ReloadEvent;

/// Per-client buffer of pending messages.
const CLIENT_BUFFER: usize = 64;

type ClientRegistry = Arc<RwLock<HashMap<usize, mpsc::Sender<String>>>>;

/// Fan-out of reload messages to connected browser clients.
///
/// Cheap to clone; all clones share one registry.
#[derive(Debug, Clone, Default)]
pub struct ReloadNotifier {
    clients: ClientRegistry,
    next_id: Arc<AtomicUsize>,
}

impl ReloadNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client. Messages arrive on the returned receiver until it
    /// is dropped.
    pub fn register(&self) -> (usize, mpsc::Receiver<String>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(CLIENT_BUFFER);
        self.clients.write().insert(id, tx);
        debug!(client = id, "reload client connected");
        (id, rx)
    }

    /// Register a client whose registry entry lives exactly as long as the
    /// returned stream.
    pub fn subscribe(&self) -> Subscription {
        let (id, rx) = self.register();
        Subscription {
            id,
            rx,
            notifier: self.clone(),
        }
    }

    pub fn unregister(&self, id: usize) {
        if self.clients.write().remove(&id).is_some() {
            debug!(client = id, "reload client disconnected");
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }

    /// Send `event` to every client and return how many received it.
    ///
    /// Never waits on a client: one whose buffer is full misses this message,
    /// one whose receiver is gone is dropped from the registry. Having no
    /// clients at all is fine.
    pub async fn notify(&self, event: &ReloadEvent) -> usize {
        let message = event.to_message();
        let clients: Vec<(usize, mpsc::Sender<String>)> = self
            .clients
            .read()
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        let mut delivered = 0;
        let mut gone = Vec::new();
        for (id, tx) in clients {
            match tx.try_send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(client = id, "reload client is not reading; message skipped");
                }
                Err(TrySendError::Closed(_)) => gone.push(id),
            }
        }
        for id in gone {
            self.unregister(id);
        }

        info!(
            unit = %event.unit,
            kind = ?event.kind,
            clients = delivered,
            "reload notification sent"
        );
        delivered
    }

    /// Forward events from the pipeline until the channel closes.
    pub async fn forward(self, mut rx: mpsc::Receiver<ReloadEvent>) {
        while let Some(event) = rx.recv().await {
            self.notify(&event).await;
        }
        debug!("reload channel closed; notifier exiting");
    }
}

/// Stream of reload messages for one client; unregisters on drop.
#[derive(Debug)]
pub struct Subscription {
    id: usize,
    rx: mpsc::Receiver<String>,
    notifier: ReloadNotifier,
}

impl Subscription {
    pub fn id(&self) -> usize {
        self.id
    }
}

impl Stream for Subscription {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<String>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.notifier.unregister(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::events::ReloadKind;

    fn event(kind: ReloadKind) -> ReloadEvent {
        ReloadEvent {
            unit: "styles".into(),
            kind,
            paths: vec!["css/style.min.css".into()],
        }
    }

    #[tokio::test]
    async fn zero_clients_is_not_an_error() {
        let notifier = ReloadNotifier::new();
        assert_eq!(notifier.notify(&event(ReloadKind::Full)).await, 0);
    }

    #[tokio::test]
    async fn every_client_receives_the_message() {
        let notifier = ReloadNotifier::new();
        let (_, mut a) = notifier.register();
        let (_, mut b) = notifier.register();

        assert_eq!(notifier.notify(&event(ReloadKind::Inject)).await, 2);
        let expected = r#"{"type":"inject","paths":["css/style.min.css"]}"#;
        assert_eq!(a.recv().await.as_deref(), Some(expected));
        assert_eq!(b.recv().await.as_deref(), Some(expected));
    }

    #[tokio::test]
    async fn disconnected_clients_are_pruned() {
        let notifier = ReloadNotifier::new();
        let (_, rx) = notifier.register();
        drop(rx);
        let (_, mut live) = notifier.register();

        assert_eq!(notifier.notify(&event(ReloadKind::Full)).await, 1);
        assert_eq!(notifier.client_count(), 1);
        assert_eq!(live.recv().await.as_deref(), Some(r#"{"type":"reload"}"#));
    }

    #[tokio::test]
    async fn dropped_subscription_leaves_the_registry() {
        use tokio_stream::StreamExt;

        let notifier = ReloadNotifier::new();
        let mut sub = notifier.subscribe();
        assert_eq!(notifier.client_count(), 1);

        assert_eq!(notifier.notify(&event(ReloadKind::Full)).await, 1);
        assert_eq!(sub.next().await.as_deref(), Some(r#"{"type":"reload"}"#));

        drop(sub);
        assert_eq!(notifier.client_count(), 0);
    }

    #[tokio::test]
    async fn stalled_client_does_not_block_notify() {
        let notifier = ReloadNotifier::new();
        let (_, mut stalled) = notifier.register();

        for _ in 0..CLIENT_BUFFER {
            assert_eq!(notifier.notify(&event(ReloadKind::Full)).await, 1);
        }
        let skipped = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            notifier.notify(&event(ReloadKind::Full)),
        )
        .await
        .expect("notify waited on a full client");
        assert_eq!(skipped, 0);
        assert_eq!(notifier.client_count(), 1);

        // Once the client drains, delivery resumes.
        while stalled.try_recv().is_ok() {}
        assert_eq!(notifier.notify(&event(ReloadKind::Full)).await, 1);
    }
}

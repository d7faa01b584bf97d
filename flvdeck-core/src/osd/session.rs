//! OSD session controller
//!
//! Each push is independent: nothing is debounced or cancelled, so responses
//! can come back out of order. Every push takes a sequence number when it is
//! issued, and a response older than the newest acknowledged one is reported
//! as superseded without a confirmation. The remote side may still apply the
//! requests in arrival order.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{Notification, OsdClient, OsdError, OverlayConfig, Pipeline};

/// Result of a push that reached the overlay service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// Newest acknowledged push; the confirmation was raised.
    Applied {
        seq: u64,
        pipeline: Pipeline,
        acknowledgement: String,
    },
    /// A later push was acknowledged first; this response was dropped.
    Superseded { seq: u64 },
}

#[derive(Debug, Default)]
struct AckState {
    acknowledged_seq: u64,
    last_pushed: Option<OverlayConfig>,
}

struct SessionInner {
    client: Arc<dyn OsdClient>,
    notifications: mpsc::UnboundedSender<Notification>,
    issued: AtomicU64,
    acks: Mutex<AckState>,
    closed: AtomicBool,
}

impl SessionInner {
    fn notify(&self, notification: Notification) {
        // Receiver gone means nobody is showing notifications anymore
        let _ = self.notifications.send(notification);
    }

    async fn push(&self, seq: u64, config: OverlayConfig) -> Result<PushOutcome, OsdError> {
        let effective = config.effective_filters();
        info!(seq, %effective, "Pushing overlay filter graph");

        let acknowledgement = match self.client.set_osd(&effective).await {
            Ok(ack) => ack,
            Err(e) => {
                let newest = self.acks.lock().acknowledged_seq;
                if seq < newest {
                    debug!(seq, newest, error = %e, "Superseded overlay push failed");
                } else {
                    warn!(seq, error = %e, "Overlay push failed");
                    self.notify(Notification::PushFailed {
                        message: e.to_string(),
                    });
                }
                return Err(e);
            }
        };

        {
            let mut acks = self.acks.lock();
            if seq < acks.acknowledged_seq {
                debug!(
                    seq,
                    newest = acks.acknowledged_seq,
                    "Dropping superseded overlay acknowledgement"
                );
                return Ok(PushOutcome::Superseded { seq });
            }
            acks.acknowledged_seq = seq;
            acks.last_pushed = Some(config);
        }

        let pipeline = Pipeline::for_effective(&effective);
        self.notify(Notification::PipelineStarted(pipeline));
        Ok(PushOutcome::Applied {
            seq,
            pipeline,
            acknowledgement,
        })
    }
}

/// Keeps the remote overlay graph in step with the local overlay config.
///
/// Cloning is cheap and clones share one session.
#[derive(Clone)]
pub struct OsdSessionController {
    inner: Arc<SessionInner>,
}

impl OsdSessionController {
    /// Creates a session over `client` and the receiver for its notifications.
    pub fn new(client: Arc<dyn OsdClient>) -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller = Self {
            inner: Arc::new(SessionInner {
                client,
                notifications: tx,
                issued: AtomicU64::new(0),
                acks: Mutex::new(AckState::default()),
                closed: AtomicBool::new(false),
            }),
        };
        (controller, rx)
    }

    /// Issues one push of `config`'s effective filter string.
    ///
    /// The sequence number is taken immediately, so issue order is the order
    /// of calls to this method, not the order the futures are polled.
    /// Failures also raise a `PushFailed` notification unless a newer push
    /// was already acknowledged; there is no retry.
    ///
    /// # Errors
    ///
    /// - `OsdError::RemoteUnreachable` - Transport failure
    /// - `OsdError::RemoteRejected` - Non-success response status
    pub fn push(
        &self,
        config: &OverlayConfig,
    ) -> impl Future<Output = Result<PushOutcome, OsdError>> + Send + 'static {
        let seq = self.inner.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let inner = Arc::clone(&self.inner);
        let config = config.clone();
        async move { inner.push(seq, config).await }
    }

    /// Issues a push and runs it as its own task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn_push(&self, config: &OverlayConfig) -> JoinHandle<Result<PushOutcome, OsdError>> {
        tokio::spawn(self.push(config))
    }

    /// Asks the service to end the session, at most once.
    ///
    /// The request runs detached so a caller that is shutting down does not
    /// have to wait for it. Returns `None` when the session was already
    /// closed. Must be called from within a Tokio runtime.
    pub fn close(&self) -> Option<JoinHandle<()>> {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            debug!("Overlay session already closed");
            return None;
        }

        info!("Closing overlay session");
        let inner = Arc::clone(&self.inner);
        Some(tokio::spawn(async move {
            match inner.client.close().await {
                Ok(ack) => debug!(%ack, "Overlay session closed"),
                Err(e) => {
                    warn!(error = %e, "Overlay session close failed");
                    inner.notify(Notification::CloseFailed {
                        message: e.to_string(),
                    });
                }
            }
        }))
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Number of pushes issued so far.
    pub fn issued(&self) -> u64 {
        self.inner.issued.load(Ordering::SeqCst)
    }

    /// Sequence number of the newest acknowledged push, 0 if none.
    pub fn acknowledged_seq(&self) -> u64 {
        self.inner.acks.lock().acknowledged_seq
    }

    /// Config of the newest acknowledged push.
    pub fn last_pushed(&self) -> Option<OverlayConfig> {
        self.inner.acks.lock().last_pushed.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::osd::{MockOsdClient, OsdCall};

    fn overlay(enabled: bool, filters: &[&str]) -> OverlayConfig {
        OverlayConfig::new(enabled, filters.iter().map(|s| s.to_string()).collect())
    }

    #[tokio::test]
    async fn test_push_applies_and_confirms_overlay() {
        let client = MockOsdClient::new();
        let (session, mut notifications) = OsdSessionController::new(Arc::new(client.clone()));

        let outcome = session.push(&overlay(true, &["f1", "f2"])).await.unwrap();

        assert!(matches!(
            outcome,
            PushOutcome::Applied {
                seq: 1,
                pipeline: Pipeline::Overlay,
                ..
            }
        ));
        assert_eq!(client.calls(), vec![OsdCall::SetOsd("f1,f2".to_string())]);
        assert_eq!(
            notifications.try_recv().unwrap(),
            Notification::PipelineStarted(Pipeline::Overlay)
        );
        assert_eq!(session.last_pushed(), Some(overlay(true, &["f1", "f2"])));
    }

    #[tokio::test]
    async fn test_disabled_push_confirms_passthrough() {
        let (session, mut notifications) =
            OsdSessionController::new(Arc::new(MockOsdClient::new()));

        session.push(&overlay(false, &["a", "b"])).await.unwrap();

        assert_eq!(
            notifications.try_recv().unwrap(),
            Notification::PipelineStarted(Pipeline::Passthrough)
        );
    }

    #[tokio::test]
    async fn test_failed_push_notifies_and_keeps_last_known_good() {
        let client = MockOsdClient::new();
        let (session, mut notifications) = OsdSessionController::new(Arc::new(client.clone()));
        session.push(&overlay(true, &["a"])).await.unwrap();
        let _ = notifications.try_recv();

        client.set_rejecting(500);
        let result = session.push(&overlay(true, &["b"])).await;

        assert!(matches!(
            result,
            Err(OsdError::RemoteRejected { status: 500, .. })
        ));
        assert!(matches!(
            notifications.try_recv().unwrap(),
            Notification::PushFailed { .. }
        ));
        assert_eq!(session.last_pushed(), Some(overlay(true, &["a"])));
        assert_eq!(client.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_stale_response_is_superseded() {
        let client = MockOsdClient::new().with_delay("slow", Duration::from_millis(80));
        let (session, mut notifications) = OsdSessionController::new(Arc::new(client.clone()));

        let first = session.spawn_push(&overlay(true, &["slow"]));
        let second = session.spawn_push(&overlay(false, &["slow"]));

        let second = second.await.unwrap().unwrap();
        let first = first.await.unwrap().unwrap();

        assert!(matches!(second, PushOutcome::Applied { seq: 2, .. }));
        assert_eq!(first, PushOutcome::Superseded { seq: 1 });
        assert_eq!(session.issued(), 2);
        assert_eq!(session.acknowledged_seq(), 2);
        assert_eq!(session.last_pushed(), Some(overlay(false, &["slow"])));
        assert_eq!(
            notifications.try_recv().unwrap(),
            Notification::PipelineStarted(Pipeline::Passthrough)
        );
        assert!(notifications.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stale_failure_raises_no_notification() {
        let client = MockOsdClient::new().with_delay("slow", Duration::from_millis(80));
        let (session, mut notifications) = OsdSessionController::new(Arc::new(client.clone()));

        client.set_rejecting(502);
        let first = session.spawn_push(&overlay(true, &["slow"]));
        while client.calls().is_empty() {
            tokio::task::yield_now().await;
        }
        client.set_accepting();
        let second = session.push(&overlay(false, &["fast"])).await.unwrap();
        let first = first.await.unwrap();

        assert!(matches!(second, PushOutcome::Applied { seq: 2, .. }));
        assert!(matches!(
            first,
            Err(OsdError::RemoteRejected { status: 502, .. })
        ));
        assert_eq!(session.acknowledged_seq(), 2);
        assert_eq!(
            notifications.try_recv().unwrap(),
            Notification::PipelineStarted(Pipeline::Passthrough)
        );
        assert!(notifications.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_close_is_issued_once() {
        let client = MockOsdClient::new();
        let (session, _notifications) = OsdSessionController::new(Arc::new(client.clone()));

        let first = session.close();
        let second = session.close();

        assert!(second.is_none());
        first.unwrap().await.unwrap();
        assert!(session.is_closed());
        assert_eq!(client.close_count(), 1);
    }

    #[tokio::test]
    async fn test_close_failure_is_reported() {
        let client = MockOsdClient::new_unreachable();
        let (session, mut notifications) = OsdSessionController::new(Arc::new(client));

        session.close().unwrap().await.unwrap();

        assert!(matches!(
            notifications.try_recv().unwrap(),
            Notification::CloseFailed { .. }
        ));
    }
}

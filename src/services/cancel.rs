use std::sync::Arc;

use tokio::sync::watch;

/// Cooperative cancellation flag shared between a controller and its in-flight request.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once `cancel` has been called on any clone.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this cannot observe a closed channel.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds the single live token of one request class (browse list, favorites list, ...).
#[derive(Debug, Default)]
pub struct RequestSlot {
    live: Option<CancelToken>,
}

impl RequestSlot {
    /// Cancel whatever is in flight and hand out a fresh token.
    pub fn begin_reset(&mut self) -> CancelToken {
        if let Some(previous) = self.live.take() {
            previous.cancel();
        }
        let token = CancelToken::new();
        self.live = Some(token.clone());
        token
    }

    /// Token for a follow-up request (load more) that a later reset must also supersede.
    pub fn current(&mut self) -> CancelToken {
        self.live.get_or_insert_with(CancelToken::new).clone()
    }
}

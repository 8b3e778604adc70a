//! Common test helpers for PairLink tests
//!
//! Provides:
//! - A recording mock channel standing in for the transport layer
//! - Condition-based waiting (no hardcoded sleeps)

use async_trait::async_trait;
use bytes::Bytes;
use pairlink_core::{ChannelError, ChannelResult, ChannelSender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default condition check interval
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_millis(10);

// ============================================================================
// Mock channel
// ============================================================================

/// A recording channel: remembers every payload sent on it and can be flipped
/// closed or made to fail, standing in for a transport connection.
pub struct MockChannel {
    open: AtomicBool,
    fail_sends: AtomicBool,
    sent: Mutex<Vec<Bytes>>,
}

impl MockChannel {
    /// A fresh open channel
    pub fn open() -> Arc<Self> {
        Arc::new(Self {
            open: AtomicBool::new(true),
            fail_sends: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
        })
    }

    /// A channel that already reports itself closed
    pub fn closed() -> Arc<Self> {
        let channel = Self::open();
        channel.set_open(false);
        channel
    }

    /// Coerce to the trait object the registry works with
    pub fn sender(self: &Arc<Self>) -> Arc<dyn ChannelSender> {
        self.clone()
    }

    pub fn set_open(&self, open: bool) {
        self.open.store(open, Ordering::SeqCst);
    }

    /// Make every subsequent send return an error while staying open
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Raw payloads sent so far
    pub fn sent(&self) -> Vec<Bytes> {
        self.sent.lock().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    /// Payloads sent so far, decoded as JSON values
    pub fn sent_json(&self) -> Vec<serde_json::Value> {
        self.sent
            .lock()
            .iter()
            .map(|data| serde_json::from_slice(data).expect("sent payload was not JSON"))
            .collect()
    }

    /// The `action` tag of the most recent payload
    pub fn last_action(&self) -> Option<String> {
        self.sent_json()
            .last()
            .and_then(|value| value["action"].as_str().map(str::to_string))
    }
}

#[async_trait]
impl ChannelSender for MockChannel {
    async fn send(&self, data: Bytes) -> ChannelResult<()> {
        if !self.is_open() {
            return Err(ChannelError::NotOpen);
        }
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ChannelError::SendFailed("mock send failure".to_string()));
        }
        self.sent.lock().push(data);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn close(&self) -> ChannelResult<()> {
        self.set_open(false);
        Ok(())
    }
}

// ============================================================================
// Condition-based waiting
// ============================================================================

/// Wait for a condition with timeout - condition-based, not time-based
pub async fn wait_for<F, Fut>(check: F, interval: Duration, max_wait: Duration) -> bool
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = Instant::now();
    while start.elapsed() < max_wait {
        if check().await {
            return true;
        }
        tokio::time::sleep(interval).await;
    }
    false
}

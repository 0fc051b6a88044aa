//! services/app/src/state/toasts.rs
//!
//! Ephemeral user-facing notifications with auto-expiry. Pushed from any
//! store or spawned task; rendered as an overlay and pruned on every UI
//! tick.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::Utc;

use super::lock;

/// How long a toast stays visible unless dismissed.
pub const TOAST_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone)]
pub struct Toast {
    /// Creation timestamp in milliseconds; bumped to stay strictly
    /// increasing when two toasts land within the same millisecond.
    pub id: i64,
    pub message: String,
    pub kind: ToastKind,
    pub expires_at: Instant,
}

#[derive(Default)]
struct ToastInner {
    toasts: Vec<Toast>,
    last_id: i64,
}

#[derive(Default)]
pub struct ToastQueue {
    inner: Mutex<ToastInner>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, message: impl Into<String>, kind: ToastKind) -> i64 {
        let mut inner = lock(&self.inner);
        let mut id = Utc::now().timestamp_millis();
        if id <= inner.last_id {
            id = inner.last_id + 1;
        }
        inner.last_id = id;
        inner.toasts.push(Toast {
            id,
            message: message.into(),
            kind,
            expires_at: Instant::now() + TOAST_TTL,
        });
        id
    }

    pub fn success(&self, message: impl Into<String>) -> i64 {
        self.push(message, ToastKind::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> i64 {
        self.push(message, ToastKind::Error)
    }

    pub fn warning(&self, message: impl Into<String>) -> i64 {
        self.push(message, ToastKind::Warning)
    }

    pub fn info(&self, message: impl Into<String>) -> i64 {
        self.push(message, ToastKind::Info)
    }

    pub fn dismiss(&self, id: i64) {
        lock(&self.inner).toasts.retain(|toast| toast.id != id);
    }

    /// Drops expired toasts. Called once per UI tick.
    pub fn prune(&self) {
        let now = Instant::now();
        lock(&self.inner).toasts.retain(|toast| toast.expires_at > now);
    }

    /// Snapshot of the currently visible toasts, oldest first.
    pub fn visible(&self) -> Vec<Toast> {
        lock(&self.inner).toasts.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_strictly_increasing() {
        let queue = ToastQueue::new();
        let a = queue.push("one", ToastKind::Info);
        let b = queue.push("two", ToastKind::Info);
        let c = queue.push("three", ToastKind::Info);
        assert!(a < b && b < c);
    }

    #[test]
    fn dismiss_removes_only_the_target() {
        let queue = ToastQueue::new();
        let a = queue.push("one", ToastKind::Success);
        let b = queue.push("two", ToastKind::Error);
        queue.dismiss(a);

        let visible = queue.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, b);
    }

    #[test]
    fn prune_keeps_unexpired_toasts() {
        let queue = ToastQueue::new();
        queue.push("sticky", ToastKind::Warning);
        queue.prune();
        assert_eq!(queue.visible().len(), 1);
    }
}

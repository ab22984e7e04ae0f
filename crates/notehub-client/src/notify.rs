//! Toast notifications.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

/// How many toasts are kept for `recent`.
const RECENT_CAPACITY: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Recent {
    toasts: VecDeque<Toast>,
    next_id: u64,
}

/// Publishes toasts to subscribers and keeps the latest ones.
#[derive(Debug, Clone)]
pub struct Toaster {
    recent: Arc<Mutex<Recent>>,
    sender: broadcast::Sender<Toast>,
}

impl Default for Toaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Toaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(RECENT_CAPACITY);
        Self {
            recent: Arc::new(Mutex::new(Recent::default())),
            sender,
        }
    }

    pub fn success(&self, message: impl Into<String>) -> Toast {
        self.push(ToastKind::Success, message.into())
    }

    pub fn error(&self, message: impl Into<String>) -> Toast {
        self.push(ToastKind::Error, message.into())
    }

    fn push(&self, kind: ToastKind, message: String) -> Toast {
        let toast = {
            let mut recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
            recent.next_id += 1;
            let toast = Toast {
                id: recent.next_id,
                kind,
                message,
                created_at: Utc::now(),
            };
            if recent.toasts.len() == RECENT_CAPACITY {
                recent.toasts.pop_front();
            }
            recent.toasts.push_back(toast.clone());
            toast
        };

        debug!(id = toast.id, kind = ?toast.kind, message = %toast.message, "toast");
        // No subscribers is fine.
        let _ = self.sender.send(toast.clone());
        toast
    }

    /// Toasts still on screen, oldest first.
    pub fn recent(&self) -> Vec<Toast> {
        self.recent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .toasts
            .iter()
            .cloned()
            .collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Toast> {
        self.sender.subscribe()
    }

    /// Removes one toast. Returns false if it was already gone.
    pub fn dismiss(&self, id: u64) -> bool {
        let mut recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
        let before = recent.toasts.len();
        recent.toasts.retain(|t| t.id != id);
        recent.toasts.len() != before
    }

    pub fn clear(&self) {
        self.recent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .toasts
            .clear();
    }
}

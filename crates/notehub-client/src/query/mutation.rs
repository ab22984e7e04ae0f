//! Tracking of write operations.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::{ClientError, ClientResult};

/// Lifecycle of a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Error,
}

struct MutationState<T> {
    status: MutationStatus,
    data: Option<Arc<T>>,
    error: Option<Arc<ClientError>>,
}

impl<T> Default for MutationState<T> {
    fn default() -> Self {
        Self {
            status: MutationStatus::Idle,
            data: None,
            error: None,
        }
    }
}

/// State of one kind of write: idle, pending, then success or error.
///
/// The last error stays readable until the next success or `reset`.
pub struct Mutation<T> {
    state: watch::Sender<MutationState<T>>,
}

impl<T> std::fmt::Debug for Mutation<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mutation")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl<T> Default for Mutation<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Mutation<T> {
    pub fn new() -> Self {
        let (state, _) = watch::channel(MutationState::default());
        Self { state }
    }

    pub fn status(&self) -> MutationStatus {
        self.state.borrow().status
    }

    pub fn is_pending(&self) -> bool {
        self.status() == MutationStatus::Pending
    }

    pub fn data(&self) -> Option<Arc<T>> {
        self.state.borrow().data.clone()
    }

    pub fn error(&self) -> Option<Arc<ClientError>> {
        self.state.borrow().error.clone()
    }

    /// Runs the write and records its outcome.
    pub async fn mutate<F>(&self, write: F) -> Result<Arc<T>, Arc<ClientError>>
    where
        F: Future<Output = ClientResult<T>>,
    {
        self.state.send_modify(|s| s.status = MutationStatus::Pending);

        match write.await {
            Ok(value) => {
                let value = Arc::new(value);
                self.state.send_modify(|s| {
                    s.status = MutationStatus::Success;
                    s.data = Some(Arc::clone(&value));
                    s.error = None;
                });
                Ok(value)
            }
            Err(e) => {
                let e = Arc::new(e);
                self.state.send_modify(|s| {
                    s.status = MutationStatus::Error;
                    s.error = Some(Arc::clone(&e));
                });
                Err(e)
            }
        }
    }

    /// Back to idle, forgetting data and error.
    pub fn reset(&self) {
        self.state.send_replace(MutationState::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn success_then_reset() {
        let mutation = Mutation::<u32>::new();
        assert_eq!(mutation.status(), MutationStatus::Idle);

        let value = mutation.mutate(async { Ok(7) }).await.unwrap();
        assert_eq!(*value, 7);
        assert_eq!(mutation.status(), MutationStatus::Success);
        assert_eq!(mutation.data().as_deref(), Some(&7));

        mutation.reset();
        assert_eq!(mutation.status(), MutationStatus::Idle);
        assert!(mutation.data().is_none());
    }

    #[tokio::test]
    async fn error_is_kept_until_next_success() {
        let mutation = Mutation::<u32>::new();

        let err = mutation
            .mutate(async { Err(ClientError::Validation("Title taken".to_string())) })
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Title taken");
        assert_eq!(mutation.status(), MutationStatus::Error);
        assert!(mutation.error().is_some());

        mutation.mutate(async { Ok(1) }).await.unwrap();
        assert!(mutation.error().is_none());
    }

    #[tokio::test]
    async fn pending_while_running() {
        let mutation = Arc::new(Mutation::<u32>::new());
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let running = {
            let mutation = Arc::clone(&mutation);
            tokio::spawn(async move {
                mutation
                    .mutate(async move {
                        let _ = rx.await;
                        Ok(1)
                    })
                    .await
            })
        };

        while !mutation.is_pending() {
            tokio::task::yield_now().await;
        }
        let _ = tx.send(());
        running.await.unwrap().unwrap();
        assert_eq!(mutation.status(), MutationStatus::Success);
    }
}

//! Listener plumbing shared by the live engines
//!
//! The first delivery (the current value) is handled before `attach`
//! returns; later deliveries run on a background task in arrival order.

use futures::StreamExt;
use std::future::Future;
use tokio::task::JoinHandle;

use messenger_core::{ListenerGuard, RealtimeStore, Snapshot, StorePath};

use super::error::{ServiceError, ServiceResult};

/// An attached listener and the task draining it
///
/// Dropping it detaches the listener and stops the task synchronously.
pub(crate) struct ActiveListener {
    guard: ListenerGuard,
    task: JoinHandle<()>,
}

impl ActiveListener {
    pub(crate) async fn attach<F, Fut>(
        store: &dyn RealtimeStore,
        path: &StorePath,
        mut on_event: F,
    ) -> ServiceResult<Self>
    where
        F: FnMut(Snapshot) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let subscription = store
            .subscribe(path)
            .map_err(|e| ServiceError::subscription_failure(path, e))?;
        let (guard, mut events) = subscription.split();

        if let Some(current) = events.next().await {
            on_event(current).await;
        }

        let task = tokio::spawn(async move {
            while let Some(snapshot) = events.next().await {
                on_event(snapshot).await;
            }
        });

        Ok(Self { guard, task })
    }

    pub(crate) fn path(&self) -> &StorePath {
        self.guard.path()
    }
}

impl Drop for ActiveListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl std::fmt::Debug for ActiveListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveListener")
            .field("path", self.path())
            .finish_non_exhaustive()
    }
}

//! Compute-once cell used for every session accessor.

use std::future::Future;

use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

use crate::error::{ServiceError, ServiceResult};

/// Single-flight memo for one logical resource.
///
/// The first caller runs the initializer; concurrent callers wait on the same
/// cell and then share the value. A failed initializer leaves the cell empty.
/// Every access checks the session's cancellation token first, so a cancelled
/// session never hands out cached data.
#[derive(Debug)]
pub(crate) struct Memo<T> {
    name: &'static str,
    cell: OnceCell<T>,
}

impl<T> Memo<T> {
    pub(crate) fn new(name: &'static str) -> Self {
        Self { name, cell: OnceCell::new() }
    }

    pub(crate) fn is_ready(&self) -> bool {
        self.cell.initialized()
    }

    pub(crate) async fn get_or_fetch<F, Fut>(
        &self,
        cancel: &CancellationToken,
        init: F,
    ) -> ServiceResult<&T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ServiceResult<T>>,
    {
        if cancel.is_cancelled() {
            return Err(ServiceError::Cancelled);
        }
        if let Some(value) = self.cell.get() {
            return Ok(value);
        }
        let name = self.name;
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!(resource = name, "fetch abandoned on cancellation");
                Err(ServiceError::Cancelled)
            },
            value = self.cell.get_or_try_init(|| async move {
                tracing::debug!(resource = name, "fetching");
                init().await
            }) => value,
        }
    }
}

use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio_util::sync::CancellationToken;

use crate::{
    exception::BatchResult,
    model::vo::{CompletionEvent, WaitOutcome, WaitRequest},
};

#[async_trait]
pub trait CompletionMonitorService: Send + Sync {
    /// Waits until every task reaches the target state, or fails on timeout.
    async fn wait_all(
        &self,
        request: WaitRequest,
        cancel: CancellationToken,
    ) -> BatchResult<WaitOutcome>;

    /// A finite stream with one event per task reaching the target state.
    ///
    /// Ends after the last task, or after yielding a single error.
    fn completion_events(
        &self,
        request: WaitRequest,
        cancel: CancellationToken,
    ) -> BoxStream<'static, BatchResult<CompletionEvent>>;
}

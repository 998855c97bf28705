//! The passive notification sink.
//!
//! Used by the webhook trigger, which has no conversation to reply into: the
//! completion notice becomes one structured log event. The interactive chat
//! sink lives in the `slack` crate.

use async_trait::async_trait;
use tracing::info;

use crate::{CompletionNotice, InvocationId, NotificationSink, NotifyError};

/// Writes the completion notice as a structured `tracing` event.
#[derive(Debug, Clone, Copy)]
pub struct LogSink {
    invocation_id: InvocationId,
}

impl LogSink {
    pub fn new(invocation_id: InvocationId) -> Self {
        Self { invocation_id }
    }
}

#[async_trait]
impl NotificationSink for LogSink {
    async fn notify(&self, notice: &CompletionNotice) -> Result<(), NotifyError> {
        if notice.timed_out {
            info!(
                invocation_id = %self.invocation_id,
                session_id = %notice.session_id,
                "webhook task timed out"
            );
        } else {
            info!(
                invocation_id = %self.invocation_id,
                session_id = %notice.session_id,
                pr_url = notice.pr_url.as_deref().unwrap_or_default(),
                pr_title = notice.pr_title.as_deref().unwrap_or_default(),
                "webhook task completed"
            );
        }
        Ok(())
    }
}

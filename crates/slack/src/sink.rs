use async_trait::async_trait;

use orchestrator::{ChannelId, CompletionNotice, MessageTs, NotificationSink, NotifyError};

use crate::{messages, SlackApiClient};

/// Posts the completion notice as a reply in the originating thread.
#[derive(Debug, Clone)]
pub struct SlackThreadSink {
    client: SlackApiClient,
    channel: ChannelId,
    thread_ts: MessageTs,
}

impl SlackThreadSink {
    pub fn new(client: SlackApiClient, channel: ChannelId, thread_ts: MessageTs) -> Self {
        Self {
            client,
            channel,
            thread_ts,
        }
    }
}

#[async_trait]
impl NotificationSink for SlackThreadSink {
    async fn notify(&self, notice: &CompletionNotice) -> Result<(), NotifyError> {
        self.client
            .post_message(&self.channel, &messages::completion(notice), Some(&self.thread_ts))
            .await
            .map(|_| ())
            .map_err(|err| NotifyError::new(err.to_string()))
    }
}

use super::client::TelegramClient;
use super::wire::Routed;
use crate::application::lanes::SenderLanes;
use crate::application::workflow::CheckWorkflow;
use crate::domain::ports::Messenger;
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const RETRY_DELAY: Duration = Duration::from_secs(3);

/// Long-poll loop feeding updates into the workflow.
///
/// Events go through [`SenderLanes`]: one chat's updates are handled in poll
/// order, while a slow sheet write for one operator never stalls another.
pub struct Poller {
    client: Arc<TelegramClient>,
    workflow: Arc<CheckWorkflow>,
    timeout: Duration,
}

impl Poller {
    pub fn new(
        client: Arc<TelegramClient>,
        workflow: Arc<CheckWorkflow>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            workflow,
            timeout,
        }
    }

    /// Runs until interrupted. Fails only if the bot cannot be reached at startup.
    pub async fn run(self) -> Result<()> {
        let me = self.client.get_me().await?;
        info!(
            bot_id = me.id,
            username = me.username.as_deref().unwrap_or(""),
            "Listening for updates"
        );

        let mut lanes = SenderLanes::new(Arc::clone(&self.workflow));
        let mut offset = 0;
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutting down");
                    lanes.shutdown().await;
                    return Ok(());
                }
                polled = self.client.get_updates(offset, self.timeout) => match polled {
                    Ok(updates) => {
                        for update in updates {
                            offset = offset.max(update.update_id + 1);
                            self.dispatch(&mut lanes, update.route());
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Polling failed, retrying");
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                }
            }
        }
    }

    fn dispatch(&self, lanes: &mut SenderLanes, routed: Routed) {
        match routed {
            Routed::Event(event) => lanes.submit(event),
            Routed::UnknownCallback(callback_id) => {
                let client = Arc::clone(&self.client);
                tokio::spawn(async move {
                    if let Err(e) = client.acknowledge(&callback_id).await {
                        debug!(error = %e, "Could not acknowledge callback");
                    }
                });
            }
            Routed::Skip => {}
        }
    }
}

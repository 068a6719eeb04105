use crate::application::workflow::CheckWorkflow;
use crate::domain::directory::Address;
use crate::domain::event::InboundEvent;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

struct Lane {
    tx: mpsc::UnboundedSender<InboundEvent>,
    worker: JoinHandle<()>,
}

/// Feeds events into the workflow with one worker task per sender.
///
/// Events from one chat are handled strictly in submission order; different
/// chats run concurrently.
pub struct SenderLanes {
    workflow: Arc<CheckWorkflow>,
    lanes: HashMap<Address, Lane>,
}

impl SenderLanes {
    pub fn new(workflow: Arc<CheckWorkflow>) -> Self {
        Self {
            workflow,
            lanes: HashMap::new(),
        }
    }

    pub fn submit(&mut self, event: InboundEvent) {
        let sender = event.sender().address;
        let event = match self.lanes.get(&sender) {
            Some(lane) => match lane.tx.send(event) {
                Ok(()) => return,
                // worker is gone, start a fresh one below
                Err(mpsc::error::SendError(event)) => event,
            },
            None => event,
        };

        let lane = self.open(sender);
        if lane.tx.send(event).is_err() {
            tracing::warn!(%sender, "Event dropped, lane closed");
        }
        self.lanes.insert(sender, lane);
    }

    fn open(&self, sender: Address) -> Lane {
        let (tx, mut rx) = mpsc::unbounded_channel::<InboundEvent>();
        let workflow = Arc::clone(&self.workflow);
        let worker = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                workflow.handle(event).await;
            }
            tracing::debug!(%sender, "Lane closed");
        });
        Lane { tx, worker }
    }

    /// Stops accepting events and waits for every queued one to be handled.
    pub async fn shutdown(&mut self) {
        for (sender, lane) in self.lanes.drain() {
            drop(lane.tx);
            if let Err(e) = lane.worker.await {
                tracing::warn!(%sender, error = %e, "Lane worker failed");
            }
        }
    }
}

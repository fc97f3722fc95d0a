use log::warn;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use super::{JobOutcome, QueueSnapshot};
use crate::constants::{AUTOMATION_STATUS_EVENT, QUEUE_STATUS_EVENT, STATUS_CHANNEL_CAPACITY};

/// Events published by the queue manager.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
    /// Delivered to every subscriber, since positions depend on the global order.
    QueueStatus(QueueSnapshot),
    /// Delivered to subscribers of the job's account.
    AutomationStatus(JobOutcome),
}

impl StatusEvent {
    pub fn name(&self) -> &'static str {
        match self {
            StatusEvent::QueueStatus(_) => QUEUE_STATUS_EVENT,
            StatusEvent::AutomationStatus(_) => AUTOMATION_STATUS_EVENT,
        }
    }

    pub fn account_id(&self) -> Option<&str> {
        match self {
            StatusEvent::QueueStatus(_) => None,
            StatusEvent::AutomationStatus(outcome) => Some(outcome.account_id.as_str()),
        }
    }

    pub fn payload(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            StatusEvent::QueueStatus(snapshot) => serde_json::to_value(snapshot),
            StatusEvent::AutomationStatus(outcome) => serde_json::to_value(outcome),
        }
    }
}

/// Fan-out of queue and job events to every connected client.
///
/// Delivery is best-effort: missed events are not replayed, and a client that
/// reconnects must fetch the current queue snapshot to resynchronise.
#[derive(Clone)]
pub struct StatusBroadcaster {
    sender: broadcast::Sender<StatusEvent>,
}

impl Default for StatusBroadcaster {
    fn default() -> Self {
        Self::new(STATUS_CHANNEL_CAPACITY)
    }
}

impl StatusBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: StatusEvent) {
        // No subscribers is fine; lagging ones are never waited on.
        let _ = self.sender.send(event);
    }

    /// Subscribe to updates for one account, or to every account when `None`.
    pub fn subscribe(&self, account_id: Option<&str>) -> StatusSubscription {
        StatusSubscription {
            receiver: self.sender.subscribe(),
            account_id: account_id.map(str::to_string),
        }
    }
}

pub struct StatusSubscription {
    receiver: broadcast::Receiver<StatusEvent>,
    account_id: Option<String>,
}

impl StatusSubscription {
    pub fn accepts(&self, event: &StatusEvent) -> bool {
        match (event.account_id(), self.account_id.as_deref()) {
            (None, _) | (_, None) => true,
            (Some(event_account), Some(subscribed)) => event_account == subscribed,
        }
    }

    /// Next event for this subscriber. Returns `None` once the broadcaster is gone.
    pub async fn recv(&mut self) -> Option<StatusEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.accepts(&event) => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(
                        "Status subscriber for {:?} lagged, {} event(s) dropped",
                        self.account_id, skipped
                    );
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next already-buffered event, without waiting.
    pub fn try_next(&mut self) -> Option<StatusEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.accepts(&event) => return Some(event),
                Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}

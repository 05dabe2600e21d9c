use std::collections::HashSet;
use std::sync::Mutex;

use tokio::sync::broadcast;

use crate::schemas::SettlementEvent;

const CHANNEL_CAPACITY: usize = 100;

/// In-process broadcast of settled payments. Typed payload and explicit
/// subscription instead of a string-keyed page-wide channel; listeners
/// that unsubscribed are never invoked, listeners that subscribe during a
/// dispatch do not see that dispatch.
pub struct SettlementNotifier {
    tx: broadcast::Sender<SettlementEvent>,
    settled_orders: Mutex<HashSet<String>>,
}

impl SettlementNotifier {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            settled_orders: Mutex::new(HashSet::new()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SettlementEvent> {
        self.tx.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Broadcasts the event to every current listener, at most once per
    /// order id even if the same settlement is reported twice. Returns the
    /// number of listeners reached; with none registered the event is
    /// dropped.
    #[tracing::instrument(skip(self, event), fields(amount = event.amount))]
    pub fn publish(&self, order_id: &str, event: SettlementEvent) -> usize {
        let mut settled = self.settled_orders.lock().unwrap();
        if !settled.insert(order_id.to_string()) {
            tracing::debug!("skipping duplicate settlement for this order");
            return 0;
        }
        match self.tx.send(event) {
            Ok(listeners) => {
                tracing::debug!(listeners, "settlement event published");
                listeners
            }
            Err(_) => {
                tracing::debug!("no listener registered, settlement event dropped");
                0
            }
        }
    }
}

impl Default for SettlementNotifier {
    fn default() -> Self {
        Self::new()
    }
}

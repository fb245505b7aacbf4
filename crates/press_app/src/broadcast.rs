use press_logging::press_warn;
use press_proto::{ObserverFrame, Update};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

pub type ObserverId = u64;

/// Fans progress updates out to every live observer.
///
/// Membership is self-healing: the first failed send removes an observer,
/// with no retry and no backpressure, so a dead subscriber never blocks the
/// rest or the pipeline.
#[derive(Default)]
pub struct Broadcaster {
    observers: Vec<(ObserverId, UnboundedSender<String>)>,
    next_id: ObserverId,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer; delivery arrives as serialized observer frames.
    pub fn subscribe(&mut self) -> (ObserverId, UnboundedReceiver<String>) {
        let (tx, rx) = unbounded_channel();
        self.next_id += 1;
        let id = self.next_id;
        self.observers.push((id, tx));
        (id, rx)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) {
        self.observers.retain(|(observer, _)| *observer != id);
    }

    /// Deliver `update` to all observers, pruning any that fail.
    pub fn publish(&mut self, update: &Update) {
        let frame = match serde_json::to_string(&ObserverFrame::single(update.clone())) {
            Ok(frame) => frame,
            Err(err) => {
                press_warn!("unserializable update for job {}: {err}", update.id);
                return;
            }
        };
        self.observers.retain(|(_, tx)| tx.send(frame.clone()).is_ok());
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

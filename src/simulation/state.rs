use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use tokio::sync::oneshot;
use uuid::Uuid;

/// Shared state of one running exhibition game.
///
/// The producer, the paced consumer, and the interactive pause/stop
/// handlers all hold this. Mutation is limited to the pause flag and
/// a cancel sender that fires at most once.
#[derive(Debug)]
pub struct Simulation {
    id: Uuid,
    paused: AtomicBool,
    cancel: Mutex<Option<oneshot::Sender<()>>>,
}

impl Simulation {
    /// the state and the cancellation signal its consumer listens on
    pub fn new(id: Uuid) -> (Arc<Self>, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        let state = Self {
            id,
            paused: AtomicBool::new(false),
            cancel: Mutex::new(Some(tx)),
        };
        (Arc::new(state), rx)
    }
    pub fn id(&self) -> Uuid {
        self.id
    }
    pub fn paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }
    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Release);
    }
    /// deliver the one-shot cancel; false once it has already fired
    /// or the run is gone
    pub fn stop(&self) -> bool {
        self.cancel
            .lock()
            .expect("cancel lock")
            .take()
            .map(|tx| tx.send(()).is_ok())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_toggles() {
        let (sim, _rx) = Simulation::new(Uuid::now_v7());
        assert!(!sim.paused());
        sim.set_paused(true);
        assert!(sim.paused());
        sim.set_paused(false);
        assert!(!sim.paused());
    }

    #[test]
    fn stop_fires_once() {
        let (sim, rx) = Simulation::new(Uuid::now_v7());
        assert!(sim.stop());
        assert!(!sim.stop());
        assert!(rx.blocking_recv().is_ok());
    }

    #[test]
    fn stop_after_consumer_gone_is_noop() {
        let (sim, rx) = Simulation::new(Uuid::now_v7());
        drop(rx);
        assert!(!sim.stop());
    }
}

use super::state::Simulation;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Live simulations by id, with a hard lifetime bound. Eviction
/// cancels the run; a run that already ended makes that a no-op.
pub struct Simulations {
    live: Arc<RwLock<HashMap<Uuid, Arc<Simulation>>>>,
    ttl: Duration,
}

impl Default for Simulations {
    fn default() -> Self {
        Self {
            live: Arc::new(RwLock::new(HashMap::new())),
            ttl: crate::SIMULATION_TTL,
        }
    }
}

impl Simulations {
    pub async fn insert(&self, sim: Arc<Simulation>) {
        let id = sim.id();
        self.live.write().await.insert(id, Arc::clone(&sim));
        let live = Arc::clone(&self.live);
        let ttl = self.ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if live.write().await.remove(&id).is_some() {
                log::info!("simulation {} hit its deadline", id);
                sim.stop();
            }
        });
    }
    pub async fn get(&self, id: &Uuid) -> Option<Arc<Simulation>> {
        self.live.read().await.get(id).cloned()
    }
    /// forget a run that completed on its own
    pub async fn remove(&self, id: &Uuid) {
        self.live.write().await.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn evicts_and_cancels_at_ttl() {
        let sims = Simulations::default();
        let (sim, rx) = Simulation::new(Uuid::now_v7());
        let id = sim.id();
        sims.insert(sim).await;
        assert!(sims.get(&id).await.is_some());
        tokio::time::sleep(crate::SIMULATION_TTL + Duration::from_secs(1)).await;
        assert!(sims.get(&id).await.is_none());
        assert!(rx.await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn completed_runs_are_left_alone() {
        let sims = Simulations::default();
        let (sim, rx) = Simulation::new(Uuid::now_v7());
        let id = sim.id();
        sims.insert(Arc::clone(&sim)).await;
        sim.stop();
        drop(rx);
        sims.remove(&id).await;
        tokio::time::sleep(crate::SIMULATION_TTL + Duration::from_secs(1)).await;
        assert!(sims.get(&id).await.is_none());
    }
}

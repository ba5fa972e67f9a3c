use crate::gameplay::Player;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::sync::mpsc;

/// A pending offer from one human to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub challenger: Player,
    pub challenged: Player,
}

impl Challenge {
    pub fn new(challenger: Player, challenged: Player) -> Self {
        Self {
            challenger,
            challenged,
        }
    }
    fn key(&self) -> String {
        format!("{},{}", self.challenged.id(), self.challenger.id())
    }
}

/// Registry of pending challenges with a bounded lifetime.
///
/// Each entry owns a capacity-1 stop channel; a timer task races the
/// TTL against it. Accepting removes the entry under the write lock
/// and signals the timer, so for any challenge exactly one of
/// "accepted" or "expiry callback" happens, never both. Re-issuing a
/// challenge replaces the entry, which drops the old stop sender and
/// retires the old timer silently.
pub struct Challenges {
    pending: Arc<RwLock<HashMap<String, mpsc::Sender<()>>>>,
    ttl: Duration,
}

impl Default for Challenges {
    fn default() -> Self {
        Self {
            pending: Arc::new(RwLock::new(HashMap::new())),
            ttl: crate::CHALLENGE_TTL,
        }
    }
}

impl Challenges {
    /// Register the offer and arm its expiry timer. `expired` runs at
    /// most once, and never after [`accept`](Self::accept) returned
    /// true for the same challenge.
    pub async fn create<F, Fut>(&self, challenge: Challenge, expired: F)
    where
        F: FnOnce(Challenge) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let key = challenge.key();
        let (stop, mut stopped) = mpsc::channel::<()>(1);
        self.pending.write().await.insert(key.clone(), stop);
        let pending = Arc::clone(&self.pending);
        let ttl = self.ttl;
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(ttl) => {
                    if pending.write().await.remove(&key).is_some() {
                        log::info!("challenge {} expired", key);
                        expired(challenge).await;
                    }
                }
                _ = stopped.recv() => {}
            }
        });
    }

    /// Consume a pending offer. True iff it was still outstanding.
    pub async fn accept(&self, challenge: &Challenge) -> bool {
        match self.pending.write().await.remove(&challenge.key()) {
            Some(stop) => {
                let _ = stop.try_send(());
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::atomic::Ordering;

    fn offer() -> Challenge {
        Challenge::new(
            Player::human("1001", "alice"),
            Player::human("1002", "bob"),
        )
    }

    async fn watch(challenges: &Challenges, challenge: Challenge) -> Arc<AtomicBool> {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        challenges
            .create(challenge, move |_| async move {
                flag.store(true, Ordering::SeqCst);
            })
            .await;
        fired
    }

    #[tokio::test(start_paused = true)]
    async fn accept_beats_expiry() {
        let challenges = Challenges::default();
        let fired = watch(&challenges, offer()).await;
        assert!(challenges.accept(&offer()).await);
        tokio::time::sleep(crate::CHALLENGE_TTL * 2).await;
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_fires_once() {
        let challenges = Challenges::default();
        let fired = watch(&challenges, offer()).await;
        tokio::time::sleep(crate::CHALLENGE_TTL * 2).await;
        assert!(fired.load(Ordering::SeqCst));
        assert!(!challenges.accept(&offer()).await);
    }

    #[tokio::test(start_paused = true)]
    async fn accept_is_exactly_once() {
        let challenges = Challenges::default();
        let fired = watch(&challenges, offer()).await;
        assert!(challenges.accept(&offer()).await);
        assert!(!challenges.accept(&offer()).await);
        tokio::time::sleep(crate::CHALLENGE_TTL * 2).await;
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn reissue_replaces_the_timer() {
        let challenges = Challenges::default();
        let first = watch(&challenges, offer()).await;
        tokio::time::sleep(crate::CHALLENGE_TTL / 2).await;
        let second = watch(&challenges, offer()).await;
        tokio::time::sleep(crate::CHALLENGE_TTL / 2 + Duration::from_secs(1)).await;
        // the original timer deadline has passed but its entry was replaced
        assert!(!first.load(Ordering::SeqCst));
        tokio::time::sleep(crate::CHALLENGE_TTL).await;
        assert!(second.load(Ordering::SeqCst));
    }
}

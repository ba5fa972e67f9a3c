use crate::gameplay::Player;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// cache growth bound; stale entries are shed before inserting past it
const CAPACITY: usize = 4096;

/// An identity record from the chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub username: String,
}

/// The external identity service. Lookups run under the caller's
/// request context: dropping the future cancels the fetch.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, id: &str) -> anyhow::Result<Account>;
}

/// Bounded TTL cache over the identity fetcher. Misses populate the
/// whole record; hits stay valid for an hour.
pub struct Users {
    fetcher: Box<dyn Fetcher>,
    cache: RwLock<HashMap<String, (Account, Instant)>>,
    ttl: Duration,
}

impl Users {
    pub fn new(fetcher: Box<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            cache: RwLock::new(HashMap::new()),
            ttl: crate::USER_TTL,
        }
    }

    /// a human `Player` for the platform user `id`
    pub async fn player(&self, id: &str) -> anyhow::Result<Player> {
        if let Some((account, at)) = self.cache.read().await.get(id).cloned() {
            if at.elapsed() < self.ttl {
                return Ok(Player::human(account.id, account.username));
            }
        }
        let account = self.fetcher.fetch(id).await?;
        let mut cache = self.cache.write().await;
        if cache.len() >= CAPACITY {
            let ttl = self.ttl;
            cache.retain(|_, (_, at)| at.elapsed() < ttl);
        }
        cache.insert(id.to_string(), (account.clone(), Instant::now()));
        Ok(Player::human(account.id, account.username))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    struct Counting(Arc<AtomicUsize>);

    #[async_trait::async_trait]
    impl Fetcher for Counting {
        async fn fetch(&self, id: &str) -> anyhow::Result<Account> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Account {
                id: id.to_string(),
                username: format!("user-{}", id),
            })
        }
    }

    struct Failing;

    #[async_trait::async_trait]
    impl Fetcher for Failing {
        async fn fetch(&self, _: &str) -> anyhow::Result<Account> {
            Err(anyhow::anyhow!("identity service unavailable"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn caches_within_ttl() {
        let calls = Arc::new(AtomicUsize::new(0));
        let users = Users::new(Box::new(Counting(Arc::clone(&calls))));
        let first = users.player("1001").await.unwrap();
        let second = users.player("1001").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.name(), "user-1001");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refetches_after_ttl() {
        let calls = Arc::new(AtomicUsize::new(0));
        let users = Users::new(Box::new(Counting(Arc::clone(&calls))));
        users.player("1001").await.unwrap();
        tokio::time::sleep(crate::USER_TTL + Duration::from_secs(1)).await;
        users.player("1001").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn propagates_lookup_failure() {
        let users = Users::new(Box::new(Failing));
        assert!(users.player("1001").await.is_err());
    }
}

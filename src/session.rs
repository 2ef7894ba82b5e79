use quick_cache::sync::Cache;
use tokio::time::{Duration, Instant};
use uuid::Uuid;

use crate::date::DateRange;

pub struct Config {
    pub ttl: Duration,
    pub capacity: usize,
}

/// Remembers which date range a pending OAuth round trip asked for.
pub trait SessionStore: Send + Sync {
    fn put(&self, token: String, range: DateRange);

    fn get(&self, token: &str) -> Option<DateRange>;

    fn remove(&self, token: &str) -> Option<DateRange>;

    /// Looks up a session and forgets it in one step, so a token is only
    /// honored once even when callbacks race.
    fn take(&self, token: &str) -> Option<DateRange>;

    /// Stores `range` under a freshly generated token and returns the token.
    fn issue(&self, range: DateRange) -> String {
        let token = Uuid::new_v4().to_string();
        self.put(token.clone(), range);
        token
    }
}

/// In-process session store. Entries are evicted once `ttl` has passed or
/// when more than `capacity` sessions are pending.
pub struct MemorySessionStore {
    inner: Cache<String, (Instant, DateRange)>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Cache::new(config.capacity),
            ttl: config.ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    fn put(&self, token: String, range: DateRange) {
        self.inner.insert(token, (Instant::now(), range));
    }

    fn get(&self, token: &str) -> Option<DateRange> {
        let (created, range) = self.inner.get(token)?;

        if created.elapsed() >= self.ttl {
            log::debug!("Session {token} expired");
            self.inner.remove(token);
            return None;
        }

        Some(range)
    }

    fn remove(&self, token: &str) -> Option<DateRange> {
        self.inner.remove(token).map(|(_, (_, range))| range)
    }

    fn take(&self, token: &str) -> Option<DateRange> {
        let (_, (created, range)) = self.inner.remove(token)?;

        if created.elapsed() >= self.ttl {
            log::debug!("Session {token} expired");
            return None;
        }

        Some(range)
    }
}

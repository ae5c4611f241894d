//! Bounded, age-expiring pool of shared clients keyed by credential.
//!
//! Building an HTTP/2 transport is expensive (TLS handshake), and the
//! intended usage pattern is many streams multiplexed over one connection.
//! [`ClientManager`] guarantees a single shared [`Client`] per credential
//! for multi-tenant senders, with LRU eviction bounding the fleet.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use lru::LruCache;
use sha2::{Digest, Sha256};

use crate::certificate::Certificate;
use crate::client::Client;

const DEFAULT_MAX_SIZE: usize = 64;
const DEFAULT_MAX_AGE: Duration = Duration::from_secs(10 * 60);

type Factory = Box<dyn Fn(&Certificate) -> Option<Client> + Send + Sync>;

struct Entry {
    client: Arc<Client>,
    last_used: Instant,
}

/// A thread-safe mapping from certificate fingerprint to shared client.
///
/// Entries are keyed by the SHA-256 of the leaf certificate DER (the hash
/// of the empty string for an empty certificate, so all empty credentials
/// share one slot). At most `max_size` entries are held; an entry unused
/// for longer than `max_age` is treated as absent on lookup.
pub struct ClientManager {
    max_age: Duration,
    factory: Factory,
    cache: Mutex<LruCache<[u8; 32], Entry>>,
}

impl ClientManager {
    /// Create a manager with the default bounds (64 entries, 10 minutes)
    /// and the standard client constructor as factory.
    pub fn new() -> Self {
        Self {
            max_age: DEFAULT_MAX_AGE,
            factory: Box::new(|certificate| Client::new(certificate.clone()).ok()),
            cache: Mutex::new(LruCache::new(cap(DEFAULT_MAX_SIZE))),
        }
    }

    /// Bound the number of cached clients.
    pub fn with_max_size(self, max_size: usize) -> Self {
        self.lock().resize(cap(max_size));
        self
    }

    /// Bound the age beyond which a cached client is treated as absent.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Replace the client factory. Returning `None` makes the credential
    /// unpoolable: `get` reports `None` and inserts nothing.
    pub fn with_factory(
        mut self,
        factory: impl Fn(&Certificate) -> Option<Client> + Send + Sync + 'static,
    ) -> Self {
        self.factory = Box::new(factory);
        self
    }

    /// Maximum number of cached clients.
    pub fn max_size(&self) -> usize {
        self.lock().cap().get()
    }

    /// Maximum entry age.
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Fetch the shared client for a credential, building one if the slot
    /// is empty or stale.
    ///
    /// Repeated calls within `max_age` return the same client and refresh
    /// its age. When a fresh client must be built and the factory declines,
    /// nothing is inserted; a stale entry stays counted until a successful
    /// insert displaces it.
    pub fn get(&self, certificate: &Certificate) -> Option<Arc<Client>> {
        let key = fingerprint(Some(certificate));
        let mut cache = self.lock();

        if let Some(entry) = cache.get_mut(&key)
            && entry.last_used.elapsed() < self.max_age
        {
            entry.last_used = Instant::now();
            return Some(entry.client.clone());
        }

        let client = Arc::new((self.factory)(certificate)?);
        cache.put(
            key,
            Entry {
                client: client.clone(),
                last_used: Instant::now(),
            },
        );
        Some(client)
    }

    /// Insert a client under its own certificate fingerprint.
    ///
    /// A second add with an equivalent fingerprint overwrites in place.
    pub fn add(&self, client: Arc<Client>) {
        let key = fingerprint(client.certificate());
        self.lock().put(
            key,
            Entry {
                client,
                last_used: Instant::now(),
            },
        );
    }

    /// Number of cached clients, stale entries included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when no clients are cached.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<[u8; 32], Entry>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ClientManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ClientManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientManager")
            .field("max_size", &self.max_size())
            .field("max_age", &self.max_age)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

fn cap(max_size: usize) -> NonZeroUsize {
    NonZeroUsize::new(max_size.max(1)).unwrap_or(NonZeroUsize::MIN)
}

fn fingerprint(certificate: Option<&Certificate>) -> [u8; 32] {
    let mut hasher = Sha256::new();
    if let Some(leaf) = certificate.and_then(|c| c.leaf()) {
        hasher.update(leaf);
    }
    hasher.finalize().into()
}

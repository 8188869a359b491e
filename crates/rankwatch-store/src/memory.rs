//! In-memory store.

use crate::data::StoreData;
use crate::error::{StoreError, StoreResult};
use crate::traits::{EntityStore, EntityUpsert, GuildConfigStore};
use parking_lot::RwLock;
use rankwatch_core::{BoxFuture, ChannelId, GuildId, PlayerId, SubscriberRemoval, TrackedEntity};
use std::sync::atomic::{AtomicUsize, Ordering};

const UNLIMITED: usize = usize::MAX;

/// Store holding everything in process memory.
///
/// Each write runs under one write lock, so merges are atomic.
#[derive(Debug)]
pub struct MemoryStore {
    data: RwLock<StoreData>,
    /// Writes allowed before every write fails (for testing).
    writes_allowed: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::from_data(StoreData::new())
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_data(data: StoreData) -> Self {
        Self {
            data: RwLock::new(data),
            writes_allowed: AtomicUsize::new(UNLIMITED),
        }
    }

    /// Make every subsequent write fail with `Unavailable` (for testing).
    pub fn set_fail_writes(&self, fail: bool) {
        let allowed = if fail { 0 } else { UNLIMITED };
        self.writes_allowed.store(allowed, Ordering::SeqCst);
    }

    /// Let the next `n` writes through, then fail every write (for testing).
    pub fn fail_writes_after(&self, n: usize) {
        self.writes_allowed.store(n, Ordering::SeqCst);
    }

    pub fn entity_count(&self) -> usize {
        self.data.read().entity_count()
    }

    fn write<T>(&self, f: impl FnOnce(&mut StoreData) -> StoreResult<T>) -> StoreResult<T> {
        let admitted = self
            .writes_allowed
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| match n {
                0 => None,
                UNLIMITED => Some(n),
                n => Some(n - 1),
            });
        if admitted.is_err() {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        f(&mut self.data.write())
    }
}

impl EntityStore for MemoryStore {
    fn list_all(&self) -> BoxFuture<'_, StoreResult<Vec<TrackedEntity>>> {
        Box::pin(async move { Ok(self.data.read().list_all()) })
    }

    fn get<'a>(&'a self, id: &'a PlayerId) -> BoxFuture<'a, StoreResult<Option<TrackedEntity>>> {
        Box::pin(async move { Ok(self.data.read().get(id)) })
    }

    fn upsert(&self, upsert: EntityUpsert) -> BoxFuture<'_, StoreResult<TrackedEntity>> {
        Box::pin(async move { self.write(|data| data.upsert(upsert)) })
    }

    fn remove_subscriber<'a>(
        &'a self,
        id: &'a PlayerId,
        guild: GuildId,
    ) -> BoxFuture<'a, StoreResult<SubscriberRemoval>> {
        Box::pin(async move { self.write(|data| Ok(data.remove_subscriber(id, guild))) })
    }

    fn delete<'a>(&'a self, id: &'a PlayerId) -> BoxFuture<'a, StoreResult<bool>> {
        Box::pin(async move { self.write(|data| Ok(data.delete(id))) })
    }

    fn find_by_subscriber(&self, guild: GuildId) -> BoxFuture<'_, StoreResult<Vec<TrackedEntity>>> {
        Box::pin(async move { Ok(self.data.read().find_by_subscriber(guild)) })
    }
}

impl GuildConfigStore for MemoryStore {
    fn channel_for(&self, guild: GuildId) -> BoxFuture<'_, StoreResult<Option<ChannelId>>> {
        Box::pin(async move { Ok(self.data.read().channel_for(guild)) })
    }

    fn set_channel(&self, guild: GuildId, channel: ChannelId) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            self.write(|data| {
                data.set_channel(guild, channel);
                Ok(())
            })
        })
    }

    fn remove(&self, guild: GuildId) -> BoxFuture<'_, StoreResult<bool>> {
        Box::pin(async move { self.write(|data| Ok(data.remove_guild(guild))) })
    }
}

//! JSON snapshot store.
//!
//! The snapshot file is the source of truth and may be shared by several
//! processes (the daemon and one-shot operator commands). Reads load the
//! current snapshot. Writes hold an exclusive lock on a sidecar
//! `<snapshot>.lock` file, re-read the snapshot, apply the merge and write
//! the result to a temporary file that is renamed over the target, so a
//! crash leaves either the old or the new snapshot, never a torn one.

use crate::data::StoreData;
use crate::error::StoreResult;
use crate::lock::{sidecar_path, FileLock};
use crate::traits::{EntityStore, EntityUpsert, GuildConfigStore};
use parking_lot::RwLock;
use rankwatch_core::{BoxFuture, ChannelId, GuildId, PlayerId, SubscriberRemoval, TrackedEntity};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File-backed store.
pub struct JsonFileStore {
    path: PathBuf,
    lock_path: PathBuf,
    /// Last snapshot this process read or wrote.
    data: RwLock<StoreData>,
    /// Serializes this process's writers before they queue on the file lock.
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonFileStore {
    /// Open the snapshot at `path`, starting empty if it does not exist.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let data = load(&path).await?;
        info!(
            path = %path.display(),
            entities = data.entity_count(),
            "Opened entity snapshot"
        );

        Ok(Self {
            lock_path: sidecar_path(&path, ".lock"),
            path,
            data: RwLock::new(data),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entity count as of the last read or write.
    pub fn entity_count(&self) -> usize {
        self.data.read().entity_count()
    }

    /// Load the current snapshot and answer `f` from it.
    async fn read<T>(&self, f: impl FnOnce(&StoreData) -> T) -> StoreResult<T> {
        let data = load(&self.path).await?;
        let out = f(&data);
        *self.data.write() = data;
        Ok(out)
    }

    /// Under the file lock: re-read the snapshot, apply `f`, persist.
    async fn write<T>(&self, f: impl FnOnce(&mut StoreData) -> StoreResult<T>) -> StoreResult<T> {
        let _guard = self.write_lock.lock().await;
        let _lock = FileLock::acquire(&self.lock_path).await?;
        let mut next = load(&self.path).await?;
        let out = f(&mut next)?;
        self.persist(&next).await?;
        *self.data.write() = next;
        Ok(out)
    }

    async fn persist(&self, data: &StoreData) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(data)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), bytes = json.len(), "Snapshot written");
        Ok(())
    }
}

async fn load(path: &Path) -> StoreResult<StoreData> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(serde_json::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoreData::new()),
        Err(e) => Err(e.into()),
    }
}

impl EntityStore for JsonFileStore {
    fn list_all(&self) -> BoxFuture<'_, StoreResult<Vec<TrackedEntity>>> {
        Box::pin(async move { self.read(|data| data.list_all()).await })
    }

    fn get<'a>(&'a self, id: &'a PlayerId) -> BoxFuture<'a, StoreResult<Option<TrackedEntity>>> {
        Box::pin(async move { self.read(|data| data.get(id)).await })
    }

    fn upsert(&self, upsert: EntityUpsert) -> BoxFuture<'_, StoreResult<TrackedEntity>> {
        Box::pin(async move { self.write(|data| data.upsert(upsert)).await })
    }

    fn remove_subscriber<'a>(
        &'a self,
        id: &'a PlayerId,
        guild: GuildId,
    ) -> BoxFuture<'a, StoreResult<SubscriberRemoval>> {
        Box::pin(async move { self.write(|data| Ok(data.remove_subscriber(id, guild))).await })
    }

    fn delete<'a>(&'a self, id: &'a PlayerId) -> BoxFuture<'a, StoreResult<bool>> {
        Box::pin(async move { self.write(|data| Ok(data.delete(id))).await })
    }

    fn find_by_subscriber(&self, guild: GuildId) -> BoxFuture<'_, StoreResult<Vec<TrackedEntity>>> {
        Box::pin(async move { self.read(|data| data.find_by_subscriber(guild)).await })
    }
}

impl GuildConfigStore for JsonFileStore {
    fn channel_for(&self, guild: GuildId) -> BoxFuture<'_, StoreResult<Option<ChannelId>>> {
        Box::pin(async move { self.read(|data| data.channel_for(guild)).await })
    }

    fn set_channel(&self, guild: GuildId, channel: ChannelId) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            self.write(|data| {
                data.set_channel(guild, channel);
                Ok(())
            })
            .await
        })
    }

    fn remove(&self, guild: GuildId) -> BoxFuture<'_, StoreResult<bool>> {
        Box::pin(async move { self.write(|data| Ok(data.remove_guild(guild))).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use rankwatch_core::{Division, RankState, Region, RiotId, Subscription, Tier};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn create(id: &str, guild: u64) -> EntityUpsert {
        EntityUpsert::new(PlayerId::new(id), Region::Euw1)
            .riot_id(RiotId::new(id, "euw"))
            .rank(RankState::new(Tier::Silver, Division::II, 40))
            .subscriber(GuildId(guild), Subscription::new(Some(7)))
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store").join("entities.json");

        {
            let store = JsonFileStore::open(&path).await.unwrap();
            store.upsert(create("a", 1)).await.unwrap();
            store.upsert(create("a", 2)).await.unwrap();
            store.upsert(create("b", 1)).await.unwrap();
            store.set_channel(GuildId(1), ChannelId(99)).await.unwrap();
            store.remove_subscriber(&PlayerId::new("b"), GuildId(1)).await.unwrap();
        }

        let store = JsonFileStore::open(&path).await.unwrap();
        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].subscriber_count(), 2);
        assert_eq!(all[0].subscription(GuildId(2)).unwrap().added_by, Some(7));
        assert_eq!(store.channel_for(GuildId(1)).await.unwrap(), Some(ChannelId(99)));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path().join("none.json")).await.unwrap();
        assert_eq!(store.entity_count(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            JsonFileStore::open(&path).await,
            Err(StoreError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_rejected_merge_leaves_snapshot_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("entities.json");
        let store = JsonFileStore::open(&path).await.unwrap();
        store.upsert(create("a", 1)).await.unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let mut conflicting = create("a", 2);
        conflicting.region = Region::Na1;
        assert!(store.upsert(conflicting).await.is_err());

        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
        assert_eq!(store.entity_count(), 1);
    }

    #[tokio::test]
    async fn test_two_stores_on_one_path_keep_each_others_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("entities.json");
        let daemon = JsonFileStore::open(&path).await.unwrap();
        daemon.upsert(create("a", 1)).await.unwrap();

        let cli = JsonFileStore::open(&path).await.unwrap();
        cli.upsert(create("b", 2)).await.unwrap();
        cli.set_channel(GuildId(2), ChannelId(20)).await.unwrap();

        let promoted = EntityUpsert::new(PlayerId::new("a"), Region::Euw1)
            .rank(RankState::new(Tier::Gold, Division::IV, 1));
        daemon.upsert(promoted).await.unwrap();

        assert!(daemon.get(&PlayerId::new("b")).await.unwrap().is_some());
        assert_eq!(daemon.channel_for(GuildId(2)).await.unwrap(), Some(ChannelId(20)));
        assert_eq!(daemon.find_by_subscriber(GuildId(2)).await.unwrap().len(), 1);

        let reopened = JsonFileStore::open(&path).await.unwrap();
        let mut ids: Vec<String> = reopened
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id.0)
            .collect();
        ids.sort();
        assert_eq!(ids, ["a", "b"]);
        let a = reopened.get(&PlayerId::new("a")).await.unwrap().unwrap();
        assert_eq!(a.rank, Some(RankState::new(Tier::Gold, Division::IV, 1)));
    }

    #[tokio::test]
    async fn test_untrack_from_another_store_is_not_resurrected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("entities.json");
        let daemon = JsonFileStore::open(&path).await.unwrap();
        daemon.upsert(create("a", 1)).await.unwrap();

        let cli = JsonFileStore::open(&path).await.unwrap();
        cli.remove_subscriber(&PlayerId::new("a"), GuildId(1)).await.unwrap();

        let stale = EntityUpsert::new(PlayerId::new("a"), Region::Euw1)
            .rank(RankState::new(Tier::Gold, Division::IV, 1));
        assert!(matches!(
            daemon.upsert(stale).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(daemon.list_all().await.unwrap().is_empty());
        assert_eq!(daemon.entity_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_across_stores_keep_every_subscriber() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("entities.json");
        let stores = [
            Arc::new(JsonFileStore::open(&path).await.unwrap()),
            Arc::new(JsonFileStore::open(&path).await.unwrap()),
        ];

        let mut handles = Vec::new();
        for guild in 1..=10u64 {
            let store = stores[(guild % 2) as usize].clone();
            handles.push(tokio::spawn(async move {
                store.upsert(create("a", guild)).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let entity = stores[0].get(&PlayerId::new("a")).await.unwrap().unwrap();
        assert_eq!(entity.subscriber_count(), 10);
    }
}

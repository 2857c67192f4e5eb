//! ViolationStore: the editing-client API over the shared store
//!
//! Reads go straight to the [`AtomicStore`] and return a self-consistent
//! snapshot without waiting on anyone. Every mutation runs its whole
//! load → mutate → replace cycle under the [`AccessCoordinator`], so
//! concurrent editors in other processes never lose each other's writes.
//!
//! Patches are applied to the record as it exists once the lock is
//! granted. Two concurrent edits to different fields both survive; edits
//! to the same field resolve to whichever editor locked last.
//!
//! Positions are only stable between a read and the next delete. Callers
//! that hold on to a record across user interaction should address it by
//! [`RecordId`] instead.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use vigil_concurrency::{AccessCoordinator, LockConfig};
use vigil_core::{
    Error, PositionedRecord, RecordDraft, RecordFilter, RecordId, RecordPatch, Result, SortOrder,
    ViolationRecord, ViolationStats,
};
use vigil_durability::AtomicStore;

use crate::config::VigilConfig;
use crate::index::RecordIndex;
use crate::monitor::ChangeMonitor;

/// Handle on one shared store file
///
/// Cheap to construct and holds no open files; any number of handles, in
/// any number of processes, may point at the same store.
#[derive(Debug, Clone)]
pub struct ViolationStore {
    store: AtomicStore,
    coordinator: AccessCoordinator,
    config: VigilConfig,
}

impl ViolationStore {
    /// Open the store named by `config`
    ///
    /// Touches nothing on disk and never waits on the lock, so read-only
    /// clients can open a store they cannot write. The store file is
    /// created by [`initialize`](Self::initialize) or the first write.
    pub fn open(config: VigilConfig) -> Result<Self> {
        config.validate()?;
        let path = config.store.path.clone();
        let store = AtomicStore::new(&path);
        let coordinator = AccessCoordinator::for_store(&path, config.lock_config());
        info!(path = %path.display(), exists = store.exists(), "Opened violation store");

        Ok(Self {
            store,
            coordinator,
            config,
        })
    }

    /// Open `path` with default settings apart from lock timing
    pub fn open_path(path: impl Into<PathBuf>, lock: LockConfig) -> Result<Self> {
        let mut config = VigilConfig::default().with_store_path(path);
        config.lock.timeout_ms = lock.timeout.as_millis() as u64;
        config.lock.retry_interval_ms = lock.retry_interval.as_millis() as u64;
        config.lock.stale_after_ms = lock.stale_after.as_millis() as u64;
        Self::open(config)
    }

    /// Store file path
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Settings this handle was opened with
    pub fn config(&self) -> &VigilConfig {
        &self.config
    }

    /// The coordinator guarding mutations
    pub fn coordinator(&self) -> &AccessCoordinator {
        &self.coordinator
    }

    /// Make sure the store file exists (header only if new)
    ///
    /// Returns whether a file was created.
    pub fn initialize(&self) -> Result<bool> {
        self.exclusive(|| {
            if self.store.exists() {
                return Ok(false);
            }
            self.store.replace_all(&[])?;
            info!(path = %self.path().display(), "Created empty store");
            Ok(true)
        })
    }

    /// Run `f` holding the lock
    ///
    /// Temp files left by writers that crashed mid-commit are swept first;
    /// with the lock held no live writer can own one.
    fn exclusive<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        self.coordinator.with_exclusive_access(|| {
            let removed = self.store.cleanup_temp_files()?;
            if removed > 0 {
                warn!(path = %self.path().display(), removed, "Removed abandoned temporary files");
            }
            f()
        })
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Every record, in store order
    pub fn records(&self) -> Result<Vec<ViolationRecord>> {
        self.store.load()
    }

    /// Records matching `filter`, in store order, with their positions
    pub fn list(&self, filter: &RecordFilter) -> Result<Vec<PositionedRecord>> {
        let records = self.store.load()?;
        Ok(filter.select(&records))
    }

    /// Records matching `filter`, in display `order`
    ///
    /// Sorting reorders the listing only; the store keeps insertion order.
    pub fn list_sorted(
        &self,
        filter: &RecordFilter,
        order: SortOrder,
    ) -> Result<Vec<PositionedRecord>> {
        let mut listing = self.list(filter)?;
        order.apply(&mut listing);
        Ok(listing)
    }

    /// Record with `id` and its current position
    pub fn get(&self, id: RecordId) -> Result<PositionedRecord> {
        let records = self.store.load()?;
        let position = RecordIndex::build(&records)
            .position_of(id)
            .ok_or(Error::RecordNotFound(id))?;
        Ok(PositionedRecord {
            position,
            record: records[position].clone(),
        })
    }

    /// Summary counts
    pub fn stats(&self) -> Result<ViolationStats> {
        let records = self.store.load()?;
        Ok(ViolationStats::from_records(&records))
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Validate `draft` and append it as a new record
    ///
    /// Invalid input is rejected before the lock is taken.
    pub fn create(&self, draft: &RecordDraft) -> Result<PositionedRecord> {
        let record = draft.validate(RecordId::new())?;
        let position = self.exclusive(|| self.store.append(record.clone()))?;
        info!(
            id = %record.id(),
            position,
            violation_type = record.violation_type(),
            "Created violation record"
        );
        Ok(PositionedRecord { position, record })
    }

    /// Apply `patch` to the record at `position`
    ///
    /// Returns the record as stored after the update.
    pub fn update(&self, position: usize, patch: &RecordPatch) -> Result<ViolationRecord> {
        self.exclusive(|| {
            let mut records = self.store.load()?;
            let len = records.len();
            let current = records
                .get(position)
                .ok_or(Error::PositionOutOfRange { position, len })?;
            let updated = patch.apply(current)?;
            if updated.same_content(current) {
                debug!(position, "Update changes nothing; store left untouched");
                return Ok(updated);
            }
            records[position] = updated.clone();
            self.store.replace_all(&records)?;
            info!(id = %updated.id(), position, "Updated violation record");
            Ok(updated)
        })
    }

    /// Remove the record at `position`; later records shift down by one
    pub fn delete(&self, position: usize) -> Result<ViolationRecord> {
        let removed = self.exclusive(|| self.store.delete_at(position))?;
        info!(id = %removed.id(), position, "Deleted violation record");
        Ok(removed)
    }

    /// Apply `patch` to the record with `id`, wherever it is now
    pub fn update_by_id(&self, id: RecordId, patch: &RecordPatch) -> Result<PositionedRecord> {
        self.exclusive(|| {
            let mut records = self.store.load()?;
            let position = RecordIndex::build(&records)
                .position_of(id)
                .ok_or(Error::RecordNotFound(id))?;
            let updated = patch.apply(&records[position])?;
            if !updated.same_content(&records[position]) {
                records[position] = updated.clone();
                self.store.replace_all(&records)?;
                info!(%id, position, "Updated violation record");
            }
            Ok(PositionedRecord {
                position,
                record: updated,
            })
        })
    }

    /// Remove the record with `id`
    ///
    /// Returns it with the position it had just before removal.
    pub fn delete_by_id(&self, id: RecordId) -> Result<PositionedRecord> {
        self.exclusive(|| {
            let mut records = self.store.load()?;
            let position = RecordIndex::build(&records)
                .position_of(id)
                .ok_or(Error::RecordNotFound(id))?;
            let record = records.remove(position);
            self.store.replace_all(&records)?;
            info!(%id, position, "Deleted violation record");
            Ok(PositionedRecord { position, record })
        })
    }

    /// Mark the record with `id` resolved
    pub fn resolve(&self, id: RecordId) -> Result<PositionedRecord> {
        self.update_by_id(id, &RecordPatch::resolve())
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    /// Change monitor over this store, baselined now
    pub fn monitor(&self) -> Result<ChangeMonitor> {
        ChangeMonitor::new(self.path(), self.config.monitor)
    }
}

//! Process-wide, group-scoped trend cursor state.
//!
//! The store is the authoritative owner of every [`CursorRecord`]. Charts read
//! it through immutable [`GroupSnapshot`]s and learn about changes through
//! [`Subscription`]s; only the mutation methods here ever change it.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::config::CursorSyncConfig;
use crate::cursor::{CursorId, CursorRecord, GroupId, is_valid_timestamp, next_color_index};
use crate::error::{CursorError, Result};
use crate::style::CURSOR_PALETTE;

type Listener = Arc<dyn Fn(&GroupSnapshot) + Send + Sync>;

/// Immutable view of one group's cursors at a given revision.
///
/// Cloning is cheap; the cursor map is shared until the next write to the
/// group, so a snapshot never observes a partial mutation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupSnapshot {
    revision: u64,
    cursors: Arc<BTreeMap<CursorId, CursorRecord>>,
}

impl GroupSnapshot {
    /// Build a snapshot from explicit records.
    pub fn from_records(records: impl IntoIterator<Item = (CursorId, CursorRecord)>) -> Self {
        Self {
            revision: 0,
            cursors: Arc::new(records.into_iter().collect()),
        }
    }

    /// Revision of the group when the snapshot was taken.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// All cursors, ordered by id.
    pub fn cursors(&self) -> &BTreeMap<CursorId, CursorRecord> {
        &self.cursors
    }

    /// Look up one cursor.
    pub fn get(&self, id: &CursorId) -> Option<&CursorRecord> {
        self.cursors.get(id)
    }

    /// Number of cursors in the group.
    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    /// Check whether the group has no cursors.
    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }
}

/// Shared store of trend cursors keyed by group.
///
/// Clones share the same underlying state.
#[derive(Clone)]
pub struct TrendCursorStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    state: RwLock<StoreState>,
    listeners: Mutex<ListenerTable>,
    max_cursors_per_group: usize,
}

#[derive(Default)]
struct StoreState {
    next_cursor: u64,
    groups: HashMap<GroupId, GroupSnapshot>,
}

impl StoreState {
    fn next_cursor_id(&mut self) -> CursorId {
        self.next_cursor = self.next_cursor.wrapping_add(1);
        CursorId::generated(self.next_cursor)
    }
}

#[derive(Default)]
struct ListenerTable {
    next_id: u64,
    groups: HashMap<GroupId, Vec<(u64, Listener)>>,
}

impl TrendCursorStore {
    /// Create an empty store with the default configuration.
    pub fn new() -> Self {
        Self::with_config(&CursorSyncConfig::default())
    }

    /// Create an empty store with a custom configuration.
    pub fn with_config(config: &CursorSyncConfig) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(StoreState::default()),
                listeners: Mutex::new(ListenerTable::default()),
                max_cursors_per_group: config.max_cursors_per_group,
            }),
        }
    }

    /// Read the current state of a group.
    ///
    /// Unknown groups read as an empty snapshot.
    pub fn snapshot(&self, group: &GroupId) -> GroupSnapshot {
        self.inner
            .state
            .read()
            .groups
            .get(group)
            .cloned()
            .unwrap_or_default()
    }

    /// Register a callback invoked after every change to the group.
    ///
    /// The callback runs on the mutating thread, after the store lock has
    /// been released, and receives the post-change snapshot.
    pub fn subscribe(
        &self,
        group: &GroupId,
        on_change: impl Fn(&GroupSnapshot) + Send + Sync + 'static,
    ) -> Subscription {
        let mut table = self.inner.listeners.lock();
        table.next_id = table.next_id.wrapping_add(1);
        let id = table.next_id;
        table
            .groups
            .entry(group.clone())
            .or_default()
            .push((id, Arc::new(on_change)));
        Subscription {
            store: Arc::downgrade(&self.inner),
            group: group.clone(),
            id,
            active: true,
        }
    }

    /// Number of live subscriptions on a group.
    pub fn subscriber_count(&self, group: &GroupId) -> usize {
        self.inner
            .listeners
            .lock()
            .groups
            .get(group)
            .map_or(0, Vec::len)
    }

    /// Create a cursor at the given timestamp.
    ///
    /// The cursor takes the lowest palette color not yet used in the group.
    pub fn add_cursor(&self, group: &GroupId, timestamp_ms: f64) -> Result<CursorId> {
        if !is_valid_timestamp(timestamp_ms) {
            return Err(CursorError::InvalidTimestamp(timestamp_ms));
        }
        let limit = self.inner.max_cursors_per_group;
        self.mutate(group, |state| {
            let current = state.groups.get(group).map_or(0, GroupSnapshot::len);
            if current >= limit {
                return Err(CursorError::GroupFull {
                    group: group.clone(),
                    limit,
                });
            }
            let id = state.next_cursor_id();
            let snapshot = state.groups.entry(group.clone()).or_default();
            let color_index = next_color_index(snapshot.cursors.values(), CURSOR_PALETTE.len());
            Arc::make_mut(&mut snapshot.cursors)
                .insert(id.clone(), CursorRecord::new(timestamp_ms, color_index));
            debug!(%group, cursor = %id, timestamp_ms, color_index, "trend cursor added");
            Ok((id, true))
        })
    }

    /// Move a cursor to a new timestamp.
    pub fn move_cursor(&self, group: &GroupId, id: &CursorId, timestamp_ms: f64) -> Result<()> {
        if !is_valid_timestamp(timestamp_ms) {
            return Err(CursorError::InvalidTimestamp(timestamp_ms));
        }
        self.mutate(group, |state| {
            let snapshot = state
                .groups
                .get_mut(group)
                .ok_or_else(|| not_found(group, id))?;
            let current = snapshot.get(id).ok_or_else(|| not_found(group, id))?;
            if current.timestamp_ms == timestamp_ms {
                return Ok(((), false));
            }
            if let Some(record) = Arc::make_mut(&mut snapshot.cursors).get_mut(id) {
                record.timestamp_ms = timestamp_ms;
            }
            debug!(%group, cursor = %id, timestamp_ms, "trend cursor moved");
            Ok(((), true))
        })
    }

    /// Delete a cursor, returning its last record.
    pub fn remove_cursor(&self, group: &GroupId, id: &CursorId) -> Result<CursorRecord> {
        self.mutate(group, |state| {
            let snapshot = state
                .groups
                .get_mut(group)
                .ok_or_else(|| not_found(group, id))?;
            if !snapshot.cursors.contains_key(id) {
                return Err(not_found(group, id));
            }
            let record = Arc::make_mut(&mut snapshot.cursors)
                .remove(id)
                .ok_or_else(|| not_found(group, id))?;
            debug!(%group, cursor = %id, "trend cursor removed");
            Ok((record, true))
        })
    }

    /// Insert or replace a record verbatim.
    ///
    /// No validation is applied; records with unusable timestamps are kept
    /// and filtered out by reconciliation instead.
    pub fn insert_record(&self, group: &GroupId, id: CursorId, record: CursorRecord) {
        self.apply(group, |state| {
            let snapshot = state.groups.entry(group.clone()).or_default();
            if snapshot.get(&id) == Some(&record) {
                return false;
            }
            Arc::make_mut(&mut snapshot.cursors).insert(id, record);
            true
        });
    }

    /// Remove every cursor of a group.
    pub fn clear_group(&self, group: &GroupId) {
        self.apply(group, |state| {
            let Some(snapshot) = state.groups.get_mut(group) else {
                return false;
            };
            if snapshot.is_empty() {
                return false;
            }
            snapshot.cursors = Arc::new(BTreeMap::new());
            debug!(%group, "trend cursor group cleared");
            true
        });
    }

    fn mutate<T>(
        &self,
        group: &GroupId,
        f: impl FnOnce(&mut StoreState) -> Result<(T, bool)>,
    ) -> Result<T> {
        let (value, changed) = {
            let mut state = self.inner.state.write();
            let (value, changed) = f(&mut state)?;
            (value, bump_revision(&mut state, group, changed))
        };
        // Listeners run without the state lock so they may read the store.
        if let Some(snapshot) = changed {
            self.notify(group, &snapshot);
        }
        Ok(value)
    }

    /// Like `mutate`, for changes that cannot fail.
    fn apply(&self, group: &GroupId, f: impl FnOnce(&mut StoreState) -> bool) {
        let changed = {
            let mut state = self.inner.state.write();
            let changed = f(&mut state);
            bump_revision(&mut state, group, changed)
        };
        if let Some(snapshot) = changed {
            self.notify(group, &snapshot);
        }
    }

    fn notify(&self, group: &GroupId, snapshot: &GroupSnapshot) {
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .lock()
            .groups
            .get(group)
            .map(|entries| entries.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default();
        for listener in listeners {
            listener(snapshot);
        }
    }
}

impl Default for TrendCursorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TrendCursorStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("TrendCursorStore")
            .field("groups", &state.groups.len())
            .field("max_cursors_per_group", &self.inner.max_cursors_per_group)
            .finish()
    }
}

fn not_found(group: &GroupId, id: &CursorId) -> CursorError {
    CursorError::CursorNotFound {
        group: group.clone(),
        id: id.clone(),
    }
}

/// Bump the group's revision after a change and return the new snapshot.
fn bump_revision(state: &mut StoreState, group: &GroupId, changed: bool) -> Option<GroupSnapshot> {
    let current = state.groups.get_mut(group).filter(|_| changed)?;
    current.revision = current.revision.wrapping_add(1);
    Some(current.clone())
}

/// Handle to a store subscription.
///
/// Dropping the handle unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    store: Weak<StoreInner>,
    group: GroupId,
    id: u64,
    active: bool,
}

impl Subscription {
    /// Group this subscription listens to.
    pub fn group(&self) -> &GroupId {
        &self.group
    }

    /// Stop receiving notifications.
    pub fn unsubscribe(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        let Some(store) = self.store.upgrade() else {
            return;
        };
        let mut table = store.listeners.lock();
        if let Some(entries) = table.groups.get_mut(&self.group) {
            entries.retain(|(id, _)| *id != self.id);
            if entries.is_empty() {
                table.groups.remove(&self.group);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("group", &self.group)
            .field("id", &self.id)
            .field("active", &self.active)
            .finish()
    }
}

//! Staged vs. active filter specs for one browsing session.
//!
//! Controls edit the staged spec freely. Only `apply` makes it active, and
//! only the active spec is persisted and handed to the query engine.

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use hearth_common::{HearthError, HearthResult};

use crate::query::FilterSpec;
use crate::storage::KeyValueStore;

/// Storage key for the persisted active spec.
pub const FILTER_STATE_KEY: &str = "hearth.filters.active";

/// Read the persisted spec. `Ok(None)` when nothing was stored.
pub fn load_persisted<S: KeyValueStore + ?Sized>(storage: &S) -> HearthResult<Option<FilterSpec>> {
    let Some(raw) = storage.get(FILTER_STATE_KEY)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| HearthError::PersistedStateCorrupt(e.to_string()))
}

/// Restore the persisted spec, falling back to `FilterSpec::initial(today)`
/// when the record is missing, unreadable or corrupt.
pub fn restore_spec<S: KeyValueStore + ?Sized>(storage: &S, today: NaiveDate) -> FilterSpec {
    match load_persisted(storage) {
        Ok(Some(spec)) => spec,
        Ok(None) => FilterSpec::initial(today),
        Err(e) => {
            warn!(error = %e, "Discarding persisted filter state, using defaults");
            FilterSpec::initial(today)
        }
    }
}

pub struct FilterStateStore<S: KeyValueStore> {
    storage: S,
    staged: FilterSpec,
    active: FilterSpec,
}

impl<S: KeyValueStore> FilterStateStore<S> {
    /// Fresh session with default filters; nothing is read from storage.
    pub fn new(storage: S, today: NaiveDate) -> Self {
        let initial = FilterSpec::initial(today);
        Self {
            storage,
            staged: initial.clone(),
            active: initial,
        }
    }

    /// Resume a session from storage. Never fails.
    pub fn restore(storage: S, today: NaiveDate) -> Self {
        let spec = restore_spec(&storage, today);
        Self {
            storage,
            staged: spec.clone(),
            active: spec,
        }
    }

    pub fn restore_today(storage: S) -> Self {
        Self::restore(storage, Utc::now().date_naive())
    }

    pub fn staged(&self) -> &FilterSpec {
        &self.staged
    }

    pub fn active(&self) -> &FilterSpec {
        &self.active
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn has_pending_changes(&self) -> bool {
        self.staged != self.active
    }

    /// Edit the staged spec. The active spec is untouched until `apply`.
    pub fn stage(&mut self, edit: impl FnOnce(&mut FilterSpec)) {
        edit(&mut self.staged);
    }

    pub fn toggle_category(&mut self, category: &str) {
        if !self.staged.categories.remove(category) {
            self.staged.categories.insert(category.to_string());
        }
    }

    pub fn toggle_community(&mut self, community_id: &str) {
        if !self.staged.communities.remove(community_id) {
            self.staged.communities.insert(community_id.to_string());
        }
    }

    /// Make the staged spec active. Returns true if the active spec changed.
    pub fn apply(&mut self) -> bool {
        if self.staged == self.active {
            return false;
        }
        self.active = self.staged.clone();
        self.persist();
        true
    }

    /// Reset both buffers to the defaults for the current UTC day.
    pub fn clear_all(&mut self) {
        self.clear_all_on(Utc::now().date_naive());
    }

    /// Reset both buffers to the defaults for `today`.
    pub fn clear_all_on(&mut self, today: NaiveDate) {
        let initial = FilterSpec::initial(today);
        self.staged = initial.clone();
        self.active = initial;
        self.persist();
    }

    /// Drop staged edits, e.g. when the filter panel closes without applying.
    pub fn discard_staged_changes(&mut self) {
        self.staged = self.active.clone();
    }

    /// Write the active spec to storage. Failures are logged, never raised.
    pub fn persist(&mut self) {
        let raw = match serde_json::to_string(&self.active) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Failed to serialize filter state");
                return;
            }
        };
        match self.storage.set(FILTER_STATE_KEY, &raw) {
            Ok(()) => info!(
                categories = self.active.categories.len(),
                communities = self.active.communities.len(),
                "Filter state persisted"
            ),
            Err(e) => warn!(error = %e, "Failed to persist filter state"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> HearthResult<Option<String>> {
            Err(HearthError::Storage("unavailable".into()))
        }

        fn set(&mut self, _key: &str, _value: &str) -> HearthResult<()> {
            Err(HearthError::Storage("unavailable".into()))
        }
    }

    #[test]
    fn staged_edits_do_not_touch_active() {
        let mut store = FilterStateStore::new(MemoryStore::new(), today());
        store.toggle_category("Tech");
        store.stage(|spec| spec.search_query = "rust".into());

        assert!(store.has_pending_changes());
        assert!(store.active().categories.is_empty());
        assert_eq!(store.staged().search_query, "rust");
        assert!(store.storage().get(FILTER_STATE_KEY).unwrap().is_none());
    }

    #[test]
    fn apply_promotes_and_persists() {
        let mut store = FilterStateStore::new(MemoryStore::new(), today());
        store.toggle_community("c1");
        assert!(store.apply());
        assert!(!store.has_pending_changes());
        assert!(store.active().communities.contains("c1"));

        let persisted = load_persisted(store.storage()).unwrap().unwrap();
        assert_eq!(&persisted, store.active());

        // nothing staged, nothing to apply
        assert!(!store.apply());
    }

    #[test]
    fn discard_reverts_staged_to_active() {
        let mut store = FilterStateStore::new(MemoryStore::new(), today());
        store.toggle_category("Music");
        store.apply();
        store.toggle_category("Music");
        store.toggle_category("Art");

        store.discard_staged_changes();
        assert_eq!(store.staged(), store.active());
        assert!(store.staged().categories.contains("Music"));
    }

    #[test]
    fn clear_all_resets_both_buffers() {
        let mut store = FilterStateStore::new(MemoryStore::new(), today());
        store.stage(|spec| {
            spec.include_past = true;
            spec.start_date = None;
            spec.categories.insert("Tech".into());
        });
        store.apply();

        store.clear_all_on(today());
        assert_eq!(store.active(), &FilterSpec::initial(today()));
        assert_eq!(store.staged(), &FilterSpec::initial(today()));
        assert_eq!(
            load_persisted(store.storage()).unwrap(),
            Some(FilterSpec::initial(today()))
        );
    }

    #[test]
    fn clear_all_uses_the_day_it_runs_on() {
        let mut store = FilterStateStore::new(MemoryStore::new(), today());
        let next_day = today().succ_opt().unwrap();
        store.clear_all_on(next_day);
        assert_eq!(store.active().start_date, Some(next_day));
        assert_eq!(store.staged().start_date, Some(next_day));

        let before = Utc::now().date_naive();
        store.clear_all();
        let after = Utc::now().date_naive();
        let start = store.active().start_date.unwrap();
        assert!(start == before || start == after);
        assert_ne!(start, today());
    }

    #[test]
    fn restore_resumes_previous_session() {
        let mut first = FilterStateStore::new(MemoryStore::new(), today());
        first.stage(|spec| spec.search_query = "jazz night".into());
        first.apply();

        let resumed = FilterStateStore::restore(first.into_storage(), today());
        assert_eq!(resumed.active().search_query, "jazz night");
        assert_eq!(resumed.staged(), resumed.active());
    }

    #[test]
    fn corrupt_record_falls_back_to_defaults() {
        let storage = MemoryStore::with_value(FILTER_STATE_KEY, "{\"categories\": [oops");
        assert!(matches!(
            load_persisted(&storage),
            Err(HearthError::PersistedStateCorrupt(_))
        ));
        let store = FilterStateStore::restore(storage, today());
        assert_eq!(store.active(), &FilterSpec::initial(today()));
    }

    #[test]
    fn storage_failures_are_swallowed() {
        let mut store = FilterStateStore::restore(FailingStore, today());
        assert_eq!(store.active(), &FilterSpec::initial(today()));
        store.toggle_category("Tech");
        assert!(store.apply());
        assert!(store.active().categories.contains("Tech"));
    }
}

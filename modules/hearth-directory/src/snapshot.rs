use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use hearth_common::{Community, Event, HearthResult, Location};

use crate::query::search_haystack;
use crate::taxonomy::Taxonomy;

/// Immutable in-memory view of the three directory collections plus every
/// index derived from them. Built once per load; nothing here mutates after
/// construction.
pub struct DirectorySnapshot {
    pub events: Vec<Event>,
    pub communities: Vec<Community>,
    pub locations: Vec<Location>,

    pub event_by_id: HashMap<String, usize>,
    pub community_by_id: HashMap<String, usize>,
    pub location_by_id: HashMap<String, usize>,

    /// Raw foreign key → event indices. Dangling keys are indexed too.
    pub events_by_community: HashMap<String, Vec<usize>>,
    pub events_by_location: HashMap<String, Vec<usize>>,
    pub events_by_associated_community: HashMap<String, Vec<usize>>,

    /// Parsed dates per event index. `None` when the raw value is malformed.
    pub starts_at: Vec<Option<DateTime<Utc>>>,
    pub ends_at: Vec<Option<DateTime<Utc>>>,

    /// Lowercased search text per event index.
    pub search_text: Vec<String>,

    pub taxonomy: Taxonomy,

    pub loaded_at: DateTime<Utc>,
}

impl DirectorySnapshot {
    pub fn build(events: Vec<Event>, communities: Vec<Community>, locations: Vec<Location>) -> Self {
        let start = std::time::Instant::now();

        let event_by_id = index_by_id(&events, |e| e.id.as_str(), "event");
        let community_by_id = index_by_id(&communities, |c| c.id.as_str(), "community");
        let location_by_id = index_by_id(&locations, |l| l.id.as_str(), "location");

        // Reverse indexes keyed by raw foreign key
        let mut events_by_community: HashMap<String, Vec<usize>> = HashMap::new();
        let mut events_by_location: HashMap<String, Vec<usize>> = HashMap::new();
        let mut events_by_associated_community: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, event) in events.iter().enumerate() {
            if let Some(community_id) = event.community_ref() {
                events_by_community
                    .entry(community_id.to_string())
                    .or_default()
                    .push(idx);
            }
            if let Some(location_id) = event.location_ref() {
                events_by_location
                    .entry(location_id.to_string())
                    .or_default()
                    .push(idx);
            }
            for associated in event.associated_communities() {
                let associated = associated.trim();
                if associated.is_empty() {
                    continue;
                }
                let entries = events_by_associated_community
                    .entry(associated.to_string())
                    .or_default();
                if !entries.contains(&idx) {
                    entries.push(idx);
                }
            }
        }

        let starts_at: Vec<Option<DateTime<Utc>>> = events.iter().map(Event::starts_at).collect();
        let ends_at: Vec<Option<DateTime<Utc>>> = events.iter().map(Event::ends_at).collect();

        let undated = starts_at.iter().filter(|s| s.is_none()).count();
        if undated > 0 {
            warn!(
                undated,
                "Events with unparseable start dates are excluded from date-ordered views"
            );
        }

        let taxonomy = Taxonomy::build(&events);

        let mut snapshot = Self {
            events,
            communities,
            locations,
            event_by_id,
            community_by_id,
            location_by_id,
            events_by_community,
            events_by_location,
            events_by_associated_community,
            starts_at,
            ends_at,
            search_text: Vec::new(),
            taxonomy,
            loaded_at: Utc::now(),
        };

        // Haystacks need the id indexes to resolve community/location names
        snapshot.search_text = snapshot
            .events
            .iter()
            .map(|event| search_haystack(&snapshot, event))
            .collect();

        info!(
            events = snapshot.events.len(),
            communities = snapshot.communities.len(),
            locations = snapshot.locations.len(),
            categories = snapshot.taxonomy.categories.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Directory snapshot built"
        );

        snapshot
    }

    /// Build a snapshot from the three JSON collections (each a JSON array).
    pub fn from_json(events: &str, communities: &str, locations: &str) -> HearthResult<Self> {
        let events: Vec<Event> = serde_json::from_str(events)?;
        let communities: Vec<Community> = serde_json::from_str(communities)?;
        let locations: Vec<Location> = serde_json::from_str(locations)?;
        Ok(Self::build(events, communities, locations))
    }

    // --- Entity lookups ---

    pub fn find_event(&self, id: &str) -> Option<&Event> {
        lookup(&self.event_by_id, id).map(|idx| &self.events[idx])
    }

    pub fn find_community(&self, id: &str) -> Option<&Community> {
        lookup(&self.community_by_id, id).map(|idx| &self.communities[idx])
    }

    pub fn find_location(&self, id: &str) -> Option<&Location> {
        lookup(&self.location_by_id, id).map(|idx| &self.locations[idx])
    }

    // --- Reverse references ---

    /// Every event whose `communityId` equals `id`, whether or not the
    /// community exists.
    pub fn events_by_community(&self, id: &str) -> Vec<&Event> {
        self.events_at(self.events_by_community.get(id.trim()))
    }

    pub fn events_by_location(&self, id: &str) -> Vec<&Event> {
        self.events_at(self.events_by_location.get(id.trim()))
    }

    /// Events that list `id` among their secondary (associated) communities.
    pub fn events_associated_with(&self, id: &str) -> Vec<&Event> {
        self.events_at(self.events_by_associated_community.get(id.trim()))
    }

    pub(crate) fn event_indices_by_community(&self, id: &str) -> &[usize] {
        self.events_by_community
            .get(id.trim())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn event_indices_by_location(&self, id: &str) -> &[usize] {
        self.events_by_location
            .get(id.trim())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn event_indices_by_associated_community(&self, id: &str) -> &[usize] {
        self.events_by_associated_community
            .get(id.trim())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn events_at(&self, indices: Option<&Vec<usize>>) -> Vec<&Event> {
        indices
            .map(|indices| indices.iter().map(|&idx| &self.events[idx]).collect())
            .unwrap_or_default()
    }
}

fn lookup(index: &HashMap<String, usize>, id: &str) -> Option<usize> {
    let id = id.trim();
    if id.is_empty() {
        return None;
    }
    index.get(id).copied()
}

/// First occurrence of an id wins. Blank ids are not indexed.
fn index_by_id<T>(items: &[T], id_of: impl Fn(&T) -> &str, kind: &str) -> HashMap<String, usize> {
    let mut index = HashMap::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let id = id_of(item).trim();
        if id.is_empty() {
            warn!(kind, position = idx, "Entity without an id is not indexed");
            continue;
        }
        if index.contains_key(id) {
            warn!(kind, id, position = idx, "Duplicate id, keeping first occurrence");
            continue;
        }
        index.insert(id.to_string(), idx);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, community: Option<&str>, location: Option<&str>) -> Event {
        let mut e = Event::new(id, format!("Event {id}"), "2025-01-10");
        e.community_id = community.map(str::to_string);
        e.location_id = location.map(str::to_string);
        e
    }

    fn snapshot() -> DirectorySnapshot {
        DirectorySnapshot::build(
            vec![
                event("e1", Some("c1"), Some("l1")),
                event("e2", Some("c1"), None),
                event("e3", Some("ghost"), Some("l1")),
                event("e4", None, None),
            ],
            vec![Community::new("c1", "Rustaceans")],
            vec![Location::new("l1", "Library")],
        )
    }

    #[test]
    fn bad_category_does_not_block_the_load() {
        let snap = DirectorySnapshot::from_json(
            r#"[
                {"id": "e1", "name": "A", "category": {"subCategory": "AI"}, "startDate": "2025-01-10"},
                {"id": "e2", "name": "B", "category": 7, "startDate": "2025-01-11"},
                {"id": "e3", "name": "C", "category": "Tech", "startDate": "2025-01-12"}
            ]"#,
            "[]",
            "[]",
        )
        .unwrap();

        assert_eq!(snap.events.len(), 3);
        assert!(snap.find_event("e1").unwrap().category.is_none());
        let names: Vec<&str> = snap.taxonomy.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Tech"]);
    }

    #[test]
    fn finds_entities_by_id() {
        let snap = snapshot();
        assert_eq!(snap.find_event("e2").map(|e| e.id.as_str()), Some("e2"));
        assert_eq!(
            snap.find_community("c1").map(|c| c.name.as_str()),
            Some("Rustaceans")
        );
        assert_eq!(
            snap.find_location("l1").map(|l| l.name.as_str()),
            Some("Library")
        );
    }

    #[test]
    fn unknown_and_empty_ids_are_absent() {
        let snap = snapshot();
        assert!(snap.find_event("nope").is_none());
        assert!(snap.find_community("").is_none());
        assert!(snap.find_location("   ").is_none());
    }

    #[test]
    fn reverse_index_includes_dangling_keys() {
        let snap = snapshot();
        let ids: Vec<&str> = snap
            .events_by_community("ghost")
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["e3"]);
        assert!(snap.find_community("ghost").is_none());
    }

    #[test]
    fn reverse_index_keeps_collection_order() {
        let snap = snapshot();
        let ids: Vec<&str> = snap
            .events_by_community("c1")
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["e1", "e2"]);

        let ids: Vec<&str> = snap
            .events_by_location("l1")
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["e1", "e3"]);
    }

    #[test]
    fn empty_id_yields_no_events() {
        let snap = snapshot();
        assert!(snap.events_by_community("").is_empty());
        assert!(snap.events_by_location("").is_empty());
    }

    #[test]
    fn duplicate_ids_keep_first_occurrence() {
        let snap = DirectorySnapshot::build(
            vec![Event::new("e1", "first", "2025-01-01"), Event::new("e1", "second", "2025-01-02")],
            vec![],
            vec![],
        );
        assert_eq!(snap.events.len(), 2);
        assert_eq!(snap.find_event("e1").map(|e| e.name.as_str()), Some("first"));
    }

    #[test]
    fn malformed_dates_are_kept_but_unparsed() {
        let snap = DirectorySnapshot::build(
            vec![Event::new("e1", "bad", "sometime soon")],
            vec![],
            vec![],
        );
        assert_eq!(snap.events.len(), 1);
        assert!(snap.starts_at[0].is_none());
    }

    #[test]
    fn associated_communities_are_indexed_once_per_event() {
        let mut e = event("e1", Some("c1"), None);
        e.metadata = Some(hearth_common::EventMetadata {
            associated_communities: vec!["c2".into(), "c2".into(), " ".into()],
            ..Default::default()
        });
        let snap = DirectorySnapshot::build(vec![e], vec![], vec![]);
        assert_eq!(snap.events_associated_with("c2").len(), 1);
        assert!(snap.events_associated_with("").is_empty());
    }
}

//! Multi-criteria event filtering.
//!
//! Criteria groups combine with AND; inside the category group any selected
//! category or subcategory matches. Results are ordered by start date, and
//! events whose start date cannot be parsed never appear.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use hearth_common::dates::{day_start, next_day_start, start_of_day};
use hearth_common::Event;

use crate::snapshot::DirectorySnapshot;

/// Search terms shorter than this many characters are ignored.
pub const MIN_SEARCH_TERM_CHARS: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    /// Category names, composite subcategory ids, or raw event types.
    #[serde(default)]
    pub categories: BTreeSet<String>,
    /// Primary organizer community ids.
    #[serde(default)]
    pub communities: BTreeSet<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub search_query: String,
    #[serde(default)]
    pub include_past: bool,
}

impl FilterSpec {
    /// The spec a fresh session starts with: no restrictions except that the
    /// range opens today and past events are hidden.
    pub fn initial(today: NaiveDate) -> Self {
        Self {
            start_date: Some(today),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.insert(category.into());
        self
    }

    pub fn with_community(mut self, community_id: impl Into<String>) -> Self {
        self.communities.insert(community_id.into());
        self
    }

    pub fn between(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search_query = query.into();
        self
    }

    pub fn including_past(mut self, include_past: bool) -> Self {
        self.include_past = include_past;
        self
    }
}

/// JSON Schema of the persisted filter record.
pub fn filter_spec_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(FilterSpec)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryResult {
    pub items: Vec<Event>,
    pub total: usize,
}

/// Normalize a free-text query into lowercase terms of at least
/// `MIN_SEARCH_TERM_CHARS` characters.
pub fn search_terms(query: &str) -> Vec<String> {
    query
        .trim()
        .to_lowercase()
        .split_whitespace()
        .filter(|term| term.chars().count() >= MIN_SEARCH_TERM_CHARS)
        .map(str::to_string)
        .collect()
}

/// Lowercased text an event is searched against. Unresolvable community or
/// location references contribute nothing beyond their raw ids.
pub fn search_haystack(snapshot: &DirectorySnapshot, event: &Event) -> String {
    let location = event.location_ref().and_then(|id| snapshot.find_location(id));
    let community = event.community_ref().and_then(|id| snapshot.find_community(id));
    let category = event.category();

    let parts = [
        Some(event.name.as_str()),
        event.description.as_deref(),
        location.map(|l| l.name.as_str()),
        location.map(|l| l.address.as_str()),
        community.map(|c| c.name.as_str()),
        event.location_ref(),
        event.community_ref(),
        category.map(|c| c.primary_name()),
        category.and_then(|c| c.sub_name()),
    ];

    parts
        .into_iter()
        .flatten()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// True if the event's category name, composite subcategory id, or raw type
/// is one of `selected`.
pub fn matches_category(event: &Event, selected: &BTreeSet<String>) -> bool {
    if selected.is_empty() {
        return true;
    }
    if !event.kind.is_empty() && selected.contains(event.kind.as_str()) {
        return true;
    }
    let Some(category) = event.category() else {
        return false;
    };
    if selected.contains(category.primary_name()) {
        return true;
    }
    category
        .subcategory_id()
        .is_some_and(|id| selected.contains(&id))
}

pub fn matches_community(event: &Event, selected: &BTreeSet<String>) -> bool {
    if selected.is_empty() {
        return true;
    }
    event
        .community_ref()
        .is_some_and(|id| selected.contains(id))
}

/// A filter spec compiled against a snapshot and a point in time.
pub struct QueryPlan<'a> {
    snapshot: &'a DirectorySnapshot,
    spec: &'a FilterSpec,
    terms: Vec<String>,
    today_start: DateTime<Utc>,
    range_start: Option<DateTime<Utc>>,
    /// Exclusive: midnight after `end_date`.
    range_end: Option<DateTime<Utc>>,
}

impl<'a> QueryPlan<'a> {
    pub fn new(snapshot: &'a DirectorySnapshot, spec: &'a FilterSpec, now: DateTime<Utc>) -> Self {
        Self {
            snapshot,
            spec,
            terms: search_terms(&spec.search_query),
            today_start: start_of_day(now),
            range_start: spec.start_date.map(day_start),
            range_end: spec.end_date.map(next_day_start),
        }
    }

    pub fn matches(&self, idx: usize) -> bool {
        let event = &self.snapshot.events[idx];
        let Some(starts_at) = self.snapshot.starts_at[idx] else {
            return false;
        };

        if !self.spec.include_past && starts_at < self.today_start {
            return false;
        }
        if !matches_category(event, &self.spec.categories) {
            return false;
        }
        if !matches_community(event, &self.spec.communities) {
            return false;
        }
        if let Some(range_start) = self.range_start {
            if starts_at < range_start {
                return false;
            }
        }
        if let Some(range_end) = self.range_end {
            match self.effective_end(idx, starts_at) {
                Some(ends_at) if ends_at < range_end => {}
                _ => return false,
            }
        }
        if !self.terms.is_empty() {
            let haystack = &self.snapshot.search_text[idx];
            if !self.terms.iter().all(|term| haystack.contains(term.as_str())) {
                return false;
            }
        }
        true
    }

    /// End date, falling back to the start date when absent. A present but
    /// malformed end date has no effective end.
    fn effective_end(&self, idx: usize, starts_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let has_raw_end = self.snapshot.events[idx]
            .end_date
            .as_deref()
            .is_some_and(|raw| !raw.trim().is_empty());
        match (has_raw_end, self.snapshot.ends_at[idx]) {
            (false, _) => Some(starts_at),
            (true, parsed) => parsed,
        }
    }

    /// Indices of matching events, ascending by start date. Ties keep
    /// collection order.
    pub fn run(&self) -> Vec<usize> {
        let mut hits: Vec<usize> = (0..self.snapshot.events.len())
            .filter(|&idx| self.matches(idx))
            .collect();
        hits.sort_by_key(|&idx| self.snapshot.starts_at[idx]);

        debug!(
            matched = hits.len(),
            terms = self.terms.len(),
            categories = self.spec.categories.len(),
            communities = self.spec.communities.len(),
            include_past = self.spec.include_past,
            "Query evaluated"
        );
        hits
    }
}

impl DirectorySnapshot {
    pub fn query_at(&self, spec: &FilterSpec, now: DateTime<Utc>) -> QueryResult {
        let items: Vec<Event> = QueryPlan::new(self, spec, now)
            .run()
            .into_iter()
            .map(|idx| self.events[idx].clone())
            .collect();
        QueryResult {
            total: items.len(),
            items,
        }
    }

    pub fn query(&self, spec: &FilterSpec) -> QueryResult {
        self.query_at(spec, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_common::{Category, Community, Location};

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn search_terms_drop_short_tokens() {
        assert_eq!(search_terms("  Tech a Meetup  "), vec!["tech", "meetup"]);
        assert!(search_terms("a b c").is_empty());
        assert!(search_terms("   ").is_empty());
    }

    #[test]
    fn search_terms_count_characters_not_bytes() {
        assert_eq!(search_terms("é ün"), vec!["ün"]);
    }

    #[test]
    fn category_matches_name_subcategory_or_type() {
        let mut event = Event::new("e1", "x", "2025-01-01");
        event.kind = "workshop".into();
        event.category = Some(Category::structured("Tech", "AI"));

        assert!(matches_category(&event, &set(&["Tech"])));
        assert!(matches_category(&event, &set(&["Tech-AI"])));
        assert!(matches_category(&event, &set(&["workshop"])));
        assert!(matches_category(&event, &set(&["Music", "Tech-AI"])));
        assert!(!matches_category(&event, &set(&["AI"])));
        assert!(!matches_category(&event, &set(&["Music"])));
        assert!(matches_category(&event, &BTreeSet::new()));
    }

    #[test]
    fn community_matches_primary_only() {
        let mut event = Event::new("e1", "x", "2025-01-01");
        event.community_id = Some("c1".into());
        event.metadata = Some(hearth_common::EventMetadata {
            associated_communities: vec!["c2".into()],
            ..Default::default()
        });

        assert!(matches_community(&event, &set(&["c1"])));
        assert!(!matches_community(&event, &set(&["c2"])));

        event.community_id = None;
        assert!(!matches_community(&event, &set(&["c1"])));
        assert!(matches_community(&event, &BTreeSet::new()));
    }

    #[test]
    fn haystack_resolves_names_and_skips_dangling() {
        let mut location = Location::new("l1", "Central Library");
        location.address = "1 Book St".into();
        let mut event = Event::new("e1", "Rust Night", "2025-01-01");
        event.location_id = Some("l1".into());
        event.community_id = Some("ghost".into());
        event.category = Some(Category::structured("Tech", "Systems"));

        let snap = DirectorySnapshot::build(
            vec![event],
            vec![Community::new("c1", "Unrelated")],
            vec![location],
        );
        let hay = &snap.search_text[0];
        assert!(hay.contains("rust night"));
        assert!(hay.contains("central library"));
        assert!(hay.contains("1 book st"));
        assert!(hay.contains("ghost"));
        assert!(hay.contains("systems"));
        assert!(!hay.contains("unrelated"));
    }

    #[test]
    fn initial_spec_starts_today() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let spec = FilterSpec::initial(today);
        assert_eq!(spec.start_date, Some(today));
        assert!(!spec.include_past);
        assert!(spec.categories.is_empty());
    }

    #[test]
    fn spec_serializes_dates_as_iso_strings() {
        let spec = FilterSpec::default()
            .with_category("Tech")
            .between(NaiveDate::from_ymd_opt(2025, 1, 2), None);
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["startDate"], "2025-01-02");
        assert_eq!(json["endDate"], serde_json::Value::Null);
        assert_eq!(json["categories"], serde_json::json!(["Tech"]));
        assert_eq!(json["includePast"], false);
    }

    #[test]
    fn schema_describes_persisted_fields() {
        let schema = serde_json::to_value(filter_spec_schema()).unwrap();
        let props = &schema["properties"];
        assert!(props.get("searchQuery").is_some());
        assert!(props.get("includePast").is_some());
    }
}

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use hearth_common::dates::start_of_day;
use hearth_common::{Community, Event, Location, Venue};

use crate::pagination::{PaginationController, DEFAULT_PAGE_SIZE};
use crate::query::{FilterSpec, QueryResult};
use crate::snapshot::DirectorySnapshot;
use crate::taxonomy::Taxonomy;

/// Entry in the community filter control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommunityOption {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Upcoming events organized or co-promoted by the community.
    pub count: usize,
}

/// An event with every reference resolved. Missing references are `None` or
/// left out of the lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventDetail {
    pub event: Event,
    pub community: Option<Community>,
    pub location: Option<Location>,
    /// Metadata venue override if present, otherwise derived from the location.
    pub venue: Option<Venue>,
    pub associated_communities: Vec<Community>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationDetail {
    pub location: Location,
    pub main_community: Option<Community>,
    pub guest_communities: Vec<Community>,
    pub upcoming_events: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunityDetail {
    pub community: Community,
    pub locations: Vec<Location>,
    pub meeting_locations: Vec<Location>,
    pub home_locations: Vec<Location>,
    pub upcoming_events: Vec<Event>,
    pub associated_events: Vec<Event>,
}

/// Read interface the rendering layer talks to. Cheap to clone; every clone
/// shares the same immutable snapshot.
#[derive(Clone)]
pub struct DirectoryReader {
    snapshot: Arc<DirectorySnapshot>,
    page_size: usize,
}

impl DirectoryReader {
    pub fn new(snapshot: DirectorySnapshot) -> Self {
        Self::from_shared(Arc::new(snapshot))
    }

    pub fn from_shared(snapshot: Arc<DirectorySnapshot>) -> Self {
        Self {
            snapshot,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn snapshot(&self) -> &DirectorySnapshot {
        &self.snapshot
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.snapshot.taxonomy
    }

    // --- Queries ---

    pub fn query(&self, spec: &FilterSpec) -> QueryResult {
        self.snapshot.query(spec)
    }

    pub fn query_at(&self, spec: &FilterSpec, now: DateTime<Utc>) -> QueryResult {
        self.snapshot.query_at(spec, now)
    }

    /// Pagination over `total` results with the reader's page size.
    pub fn paginate(&self, total: usize) -> PaginationController {
        PaginationController::new(total, self.page_size)
    }

    pub fn paginate_with(&self, total: usize, page_size: usize) -> PaginationController {
        PaginationController::new(total, page_size)
    }

    pub fn community_options(&self) -> Vec<CommunityOption> {
        self.community_options_at(Utc::now())
    }

    /// Every community with its count of upcoming events, where an event
    /// counts if the community organizes it or is listed as associated.
    /// Ordered by descending count, then name.
    pub fn community_options_at(&self, now: DateTime<Utc>) -> Vec<CommunityOption> {
        let snap = &self.snapshot;
        let today_start = start_of_day(now);
        let is_upcoming = |idx: usize| snap.starts_at[idx].is_some_and(|s| s >= today_start);

        let mut options: Vec<CommunityOption> = snap
            .communities
            .iter()
            .filter(|c| snap.find_community(&c.id).is_some_and(|found| std::ptr::eq(found, *c)))
            .map(|community| {
                let mut counted: Vec<usize> = snap
                    .event_indices_by_community(&community.id)
                    .iter()
                    .chain(snap.event_indices_by_associated_community(&community.id))
                    .copied()
                    .filter(|&idx| is_upcoming(idx))
                    .collect();
                counted.sort_unstable();
                counted.dedup();

                CommunityOption {
                    id: community.id.clone(),
                    name: community.name.clone(),
                    kind: community.kind.clone(),
                    count: counted.len(),
                }
            })
            .collect();

        options.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        options
    }

    // --- Detail views ---

    pub fn event_detail(&self, id: &str) -> Option<EventDetail> {
        let snap = &self.snapshot;
        let event = snap.find_event(id)?;
        let community = event.community_ref().and_then(|c| snap.find_community(c));
        let location = event.location_ref().and_then(|l| snap.find_location(l));

        let venue = event.venue().cloned().or_else(|| {
            location.map(|l| Venue {
                name: l.name.clone(),
                address: Some(l.address.clone()).filter(|a| !a.is_empty()),
                kind: Some(l.kind.clone()).filter(|k| !k.is_empty()),
            })
        });

        let mut associated_communities: Vec<Community> = Vec::new();
        for id in event.associated_communities() {
            if let Some(c) = snap.find_community(id) {
                if !associated_communities.iter().any(|a| a.id == c.id) {
                    associated_communities.push(c.clone());
                }
            }
        }

        Some(EventDetail {
            event: event.clone(),
            community: community.cloned(),
            location: location.cloned(),
            venue,
            associated_communities,
        })
    }

    pub fn location_detail_at(&self, id: &str, now: DateTime<Utc>) -> Option<LocationDetail> {
        let snap = &self.snapshot;
        let location = snap.find_location(id)?;
        Some(LocationDetail {
            location: location.clone(),
            main_community: snap.main_community_for_location(location).cloned(),
            guest_communities: snap
                .communities_for_location(&location.id)
                .into_iter()
                .cloned()
                .collect(),
            upcoming_events: self.upcoming_for_location(&location.id, now),
        })
    }

    pub fn location_detail(&self, id: &str) -> Option<LocationDetail> {
        self.location_detail_at(id, Utc::now())
    }

    pub fn community_detail_at(&self, id: &str, now: DateTime<Utc>) -> Option<CommunityDetail> {
        let snap = &self.snapshot;
        let community = snap.find_community(id)?;
        let owned = |locations: Vec<&Location>| locations.into_iter().cloned().collect::<Vec<_>>();
        Some(CommunityDetail {
            community: community.clone(),
            locations: owned(snap.locations_for_community(&community.id)),
            meeting_locations: owned(snap.meeting_locations(community)),
            home_locations: owned(snap.home_locations_for_community(&community.id)),
            upcoming_events: self.upcoming_for_community(&community.id, now),
            associated_events: self.upcoming_sorted(
                snap.event_indices_by_associated_community(&community.id),
                now,
            ),
        })
    }

    pub fn community_detail(&self, id: &str) -> Option<CommunityDetail> {
        self.community_detail_at(id, Utc::now())
    }

    /// Upcoming events organized by the community, ascending by start date.
    pub fn upcoming_for_community(&self, community_id: &str, now: DateTime<Utc>) -> Vec<Event> {
        self.upcoming_sorted(self.snapshot.event_indices_by_community(community_id), now)
    }

    pub fn upcoming_for_location(&self, location_id: &str, now: DateTime<Utc>) -> Vec<Event> {
        self.upcoming_sorted(self.snapshot.event_indices_by_location(location_id), now)
    }

    fn upcoming_sorted(&self, indices: &[usize], now: DateTime<Utc>) -> Vec<Event> {
        let snap = &self.snapshot;
        let today_start = start_of_day(now);
        let mut upcoming: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&idx| snap.starts_at[idx].is_some_and(|s| s >= today_start))
            .collect();
        upcoming.sort_by_key(|&idx| snap.starts_at[idx]);
        upcoming
            .into_iter()
            .map(|idx| snap.events[idx].clone())
            .collect()
    }
}

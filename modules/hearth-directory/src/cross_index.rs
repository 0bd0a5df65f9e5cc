//! Community ↔ location relationships that no single foreign key captures.

use hearth_common::{Community, Location};

use crate::snapshot::DirectorySnapshot;

impl DirectorySnapshot {
    /// Primary community of a location: the explicit `mainCommunityId` when it
    /// resolves, otherwise a community with the location's exact name when the
    /// location is flagged as a community, otherwise none.
    pub fn main_community_for_location(&self, location: &Location) -> Option<&Community> {
        if let Some(community) = location
            .main_community_ref()
            .and_then(|id| self.find_community(id))
        {
            return Some(community);
        }
        if !location.community_and_location {
            return None;
        }
        let name = location.name.trim();
        if name.is_empty() {
            return None;
        }
        self.communities.iter().find(|c| c.name.trim() == name)
    }

    /// "Guest" communities: every resolvable community that has held an event
    /// at the location, minus the location's own main community.
    pub fn communities_for_location(&self, location_id: &str) -> Vec<&Community> {
        let main_id = self
            .find_location(location_id)
            .and_then(|l| self.main_community_for_location(l))
            .map(|c| c.id.as_str());

        let mut out: Vec<&Community> = Vec::new();
        for &idx in self.event_indices_by_location(location_id) {
            let Some(community) = self.events[idx]
                .community_ref()
                .and_then(|id| self.find_community(id))
            else {
                continue;
            };
            if Some(community.id.as_str()) == main_id {
                continue;
            }
            if !out.iter().any(|c| c.id == community.id) {
                out.push(community);
            }
        }
        out
    }

    /// Distinct resolvable locations where the community has held an event.
    pub fn locations_for_community(&self, community_id: &str) -> Vec<&Location> {
        let mut out: Vec<&Location> = Vec::new();
        for &idx in self.event_indices_by_community(community_id) {
            let Some(location) = self.events[idx]
                .location_ref()
                .and_then(|id| self.find_location(id))
            else {
                continue;
            };
            if !out.iter().any(|l| l.id == location.id) {
                out.push(location);
            }
        }
        out
    }

    /// Locations that are themselves communities.
    pub fn community_locations(&self) -> Vec<&Location> {
        self.locations
            .iter()
            .filter(|l| l.community_and_location)
            .collect()
    }

    /// Locations whose main community is `community_id`.
    pub fn home_locations_for_community(&self, community_id: &str) -> Vec<&Location> {
        let community_id = community_id.trim();
        if community_id.is_empty() {
            return Vec::new();
        }
        self.locations
            .iter()
            .filter(|l| {
                self.main_community_for_location(l)
                    .is_some_and(|c| c.id == community_id)
            })
            .collect()
    }

    /// The community's declared meeting locations, skipping ids that do not
    /// resolve.
    pub fn meeting_locations(&self, community: &Community) -> Vec<&Location> {
        community
            .meeting_location_ids
            .iter()
            .filter_map(|id| self.find_location(id))
            .collect()
    }
}

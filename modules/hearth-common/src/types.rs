use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::dates::parse_event_date;

// --- Geo Types ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    #[serde(alias = "lon", alias = "long")]
    pub lng: f64,
}

// --- Category ---

/// Event category as it appears in the static data: either a bare label or a
/// `{type, subCategory}` pair. A bare label is a structured category with no
/// subcategory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Category {
    Bare(String),
    Structured {
        #[serde(rename = "type")]
        kind: String,
        #[serde(
            rename = "subCategory",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        sub_category: Option<String>,
    },
}

impl Category {
    pub fn bare(name: impl Into<String>) -> Self {
        Category::Bare(name.into())
    }

    pub fn structured(kind: impl Into<String>, sub_category: impl Into<String>) -> Self {
        Category::Structured {
            kind: kind.into(),
            sub_category: Some(sub_category.into()),
        }
    }

    pub fn primary_name(&self) -> &str {
        match self {
            Category::Bare(name) => name.trim(),
            Category::Structured { kind, .. } => kind.trim(),
        }
    }

    /// Subcategory label. Bare categories and blank subcategories have none.
    pub fn sub_name(&self) -> Option<&str> {
        match self {
            Category::Bare(_) => None,
            Category::Structured { sub_category, .. } => sub_category
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty()),
        }
    }

    /// Composite `"<category>-<subcategory>"` id used by filter controls.
    pub fn subcategory_id(&self) -> Option<String> {
        self.sub_name()
            .map(|sub| subcategory_id(self.primary_name(), sub))
    }

    pub fn is_empty(&self) -> bool {
        self.primary_name().is_empty()
    }
}

pub fn subcategory_id(category: &str, sub_category: &str) -> String {
    format!("{category}-{sub_category}")
}

/// A category that fits neither shape is dropped with a warning instead of
/// failing the whole collection.
fn lenient_category<'de, D>(deserializer: D) -> Result<Option<Category>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<serde_json::Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match serde_json::from_value::<Category>(raw.clone()) {
        Ok(category) => Ok(Some(category)),
        Err(e) => {
            warn!(category = %raw, error = %e, "Ignoring malformed event category");
            Ok(None)
        }
    }
}

// --- Events ---

/// Venue override carried in event metadata, independent of `locationId`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<Venue>,
    /// Secondary communities that co-promote the event.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub associated_communities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(
        default,
        deserialize_with = "lenient_category",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<Category>,
    /// Raw ISO-8601 timestamp. Parsed on demand; malformed values are kept.
    #[serde(default)]
    pub start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<EventMetadata>,
}

impl Event {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        start_date: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: String::new(),
            category: None,
            start_date: start_date.into(),
            end_date: None,
            description: None,
            community_id: None,
            location_id: None,
            metadata: None,
        }
    }

    pub fn starts_at(&self) -> Option<DateTime<Utc>> {
        parse_event_date(&self.start_date)
    }

    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        self.end_date.as_deref().and_then(parse_event_date)
    }

    /// Primary organizer id, with blank ids treated as absent.
    pub fn community_ref(&self) -> Option<&str> {
        non_blank(self.community_id.as_deref())
    }

    pub fn location_ref(&self) -> Option<&str> {
        non_blank(self.location_id.as_deref())
    }

    pub fn associated_communities(&self) -> &[String] {
        self.metadata
            .as_ref()
            .map(|m| m.associated_communities.as_slice())
            .unwrap_or(&[])
    }

    pub fn venue(&self) -> Option<&Venue> {
        self.metadata.as_ref().and_then(|m| m.venue.as_ref())
    }

    pub fn source_url(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| m.source_url.as_deref())
    }

    /// Category with blank labels treated as absent.
    pub fn category(&self) -> Option<&Category> {
        self.category.as_ref().filter(|c| !c.is_empty())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

// --- Communities ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommunitySize {
    Members(u64),
    Label(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Community {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "founded", skip_serializing_if = "Option::is_none")]
    pub founding_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<CommunitySize>,
    /// Locations where this community holds its events.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub meeting_location_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactInfo>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub social: BTreeMap<String, String>,
}

impl Community {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: String::new(),
            description: String::new(),
            founding_year: None,
            size: None,
            meeting_location_ids: Vec::new(),
            contact: None,
            social: BTreeMap::new(),
        }
    }
}

// --- Locations ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Hours {
    Text(String),
    Weekly(BTreeMap<String, String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, alias = "coords", skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<GeoPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_community_id: Option<String>,
    /// The location is itself a community, matched to a Community by name.
    #[serde(rename = "community_and_location", default)]
    pub community_and_location: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub amenities: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<Hours>,
}

impl Location {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: String::new(),
            address: String::new(),
            coordinates: None,
            main_community_id: None,
            community_and_location: false,
            amenities: Vec::new(),
            tags: Vec::new(),
            hours: None,
        }
    }

    pub fn main_community_ref(&self) -> Option<&str> {
        non_blank(self.main_community_id.as_deref())
    }
}

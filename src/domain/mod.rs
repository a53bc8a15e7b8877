/// Domain models for the application
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameters forwarded to an upstream service, in forwarding order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpstreamQuery {
    pairs: Vec<(String, String)>,
}

impl UpstreamQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn as_pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(k, _)| k.as_str())
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "uptimeSeconds")]
    pub uptime_seconds: f64,
}

// ---------------------------------------------------------------------------
// APOD

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApodEntry {
    pub date: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub hdurl: Option<String>,
    pub media_type: String,
    #[serde(default)]
    pub service_version: Option<String>,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub copyright: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl ApodEntry {
    pub fn is_video(&self) -> bool {
        self.media_type == "video"
    }
}

/// APOD returns one object for a date query and an array when `count` is sent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApodResult {
    Multiple(Vec<ApodEntry>),
    Single(ApodEntry),
}

impl ApodResult {
    pub fn len(&self) -> usize {
        match self {
            ApodResult::Single(_) => 1,
            ApodResult::Multiple(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Mars rover photos

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarsPhotos {
    #[serde(default)]
    pub photos: Vec<MarsPhoto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarsPhoto {
    pub id: u64,
    pub sol: u32,
    pub camera: RoverCamera,
    pub img_src: String,
    pub earth_date: String,
    pub rover: RoverSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoverCamera {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub rover_id: Option<u64>,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoverSummary {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub landing_date: Option<String>,
    #[serde(default)]
    pub launch_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

// ---------------------------------------------------------------------------
// Near-Earth objects

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NeoFeed {
    #[serde(default)]
    pub links: NeoLinks,
    #[serde(default)]
    pub element_count: u64,
    #[serde(default)]
    pub near_earth_objects: BTreeMap<String, Vec<NearEarthObject>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NeoLinks {
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub prev: Option<String>,
    #[serde(default, rename = "self")]
    pub self_link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NearEarthObject {
    pub id: String,
    #[serde(default)]
    pub neo_reference_id: String,
    pub name: String,
    #[serde(default)]
    pub nasa_jpl_url: String,
    #[serde(default)]
    pub absolute_magnitude_h: f64,
    #[serde(default)]
    pub estimated_diameter: EstimatedDiameter,
    #[serde(default)]
    pub is_potentially_hazardous_asteroid: bool,
    #[serde(default)]
    pub close_approach_data: Vec<CloseApproach>,
    #[serde(default)]
    pub is_sentry_object: bool,
}

impl NearEarthObject {
    pub fn max_diameter_m(&self) -> f64 {
        self.estimated_diameter.meters.estimated_diameter_max
    }

    /// Velocity of the first close approach; missing or garbled values read as 0
    pub fn velocity_km_s(&self) -> f64 {
        self.close_approach_data
            .first()
            .and_then(|approach| approach.relative_velocity.kilometers_per_second.as_deref())
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EstimatedDiameter {
    #[serde(default)]
    pub kilometers: DiameterRange,
    #[serde(default)]
    pub meters: DiameterRange,
    #[serde(default)]
    pub miles: DiameterRange,
    #[serde(default)]
    pub feet: DiameterRange,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiameterRange {
    #[serde(default)]
    pub estimated_diameter_min: f64,
    #[serde(default)]
    pub estimated_diameter_max: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CloseApproach {
    #[serde(default)]
    pub close_approach_date: String,
    #[serde(default)]
    pub close_approach_date_full: Option<String>,
    #[serde(default)]
    pub epoch_date_close_approach: Option<i64>,
    #[serde(default)]
    pub relative_velocity: RelativeVelocity,
    #[serde(default)]
    pub miss_distance: MissDistance,
    #[serde(default)]
    pub orbiting_body: String,
}

/// NeoWs sends these as decimal strings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelativeVelocity {
    #[serde(default)]
    pub kilometers_per_second: Option<String>,
    #[serde(default)]
    pub kilometers_per_hour: Option<String>,
    #[serde(default)]
    pub miles_per_hour: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissDistance {
    #[serde(default)]
    pub astronomical: Option<String>,
    #[serde(default)]
    pub lunar: Option<String>,
    #[serde(default)]
    pub kilometers: Option<String>,
    #[serde(default)]
    pub miles: Option<String>,
}

// ---------------------------------------------------------------------------
// EPIC

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpicImage {
    pub identifier: String,
    #[serde(default)]
    pub caption: String,
    pub image: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub centroid_coordinates: Option<LatLon>,
    #[serde(default)]
    pub dscovr_j2000_position: Option<Vector3>,
    #[serde(default)]
    pub lunar_j2000_position: Option<Vector3>,
    #[serde(default)]
    pub sun_j2000_position: Option<Vector3>,
    #[serde(default)]
    pub attitude_quaternions: Option<Quaternion>,
    /// "YYYY-MM-DD HH:MM:SS"
    pub date: String,
}

impl EpicImage {
    pub fn capture_date(&self) -> Option<NaiveDate> {
        self.date
            .get(..10)
            .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
    }

    /// Full-resolution PNG in the natural-color archive
    pub fn archive_url(&self, nasa_api_url: &str, api_key: &str) -> Option<String> {
        let day = self.capture_date()?;
        Some(format!(
            "{}/EPIC/archive/natural/{}/png/{}.png?api_key={}",
            nasa_api_url.trim_end_matches('/'),
            day.format("%Y/%m/%d"),
            self.image,
            api_key
        ))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Quaternion {
    pub q0: f64,
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
}

// ---------------------------------------------------------------------------
// NASA Image and Video Library

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaSearchResponse {
    pub collection: MediaCollection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaCollection {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub items: Vec<MediaSearchItem>,
    #[serde(default)]
    pub metadata: MediaMetadata,
    #[serde(default)]
    pub links: Vec<MediaLink>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaMetadata {
    #[serde(default)]
    pub total_hits: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaSearchItem {
    pub href: String,
    #[serde(default)]
    pub data: Vec<MediaData>,
    #[serde(default)]
    pub links: Vec<MediaLink>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaData {
    #[serde(default)]
    pub center: Option<String>,
    pub title: String,
    pub nasa_id: String,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub media_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub photographer: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub album: Vec<String>,
    #[serde(default)]
    pub description_508: Option<String>,
    #[serde(default)]
    pub secondary_creator: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaLink {
    pub href: String,
    #[serde(default)]
    pub rel: Option<String>,
    #[serde(default)]
    pub render: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

impl MediaSearchResponse {
    pub fn total_hits(&self) -> u64 {
        self.collection.metadata.total_hits
    }

    pub fn next_page(&self) -> Option<&str> {
        self.collection
            .links
            .iter()
            .find(|l| l.rel.as_deref() == Some("next"))
            .map(|l| l.href.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_query_keeps_insertion_order() {
        let mut query = UpstreamQuery::new();
        query.push("page", "1");
        query.push("sol", "1000");
        assert_eq!(query.keys().collect::<Vec<_>>(), vec!["page", "sol"]);
        assert_eq!(query.get("sol"), Some("1000"));
        assert!(!query.contains("camera"));
    }

    #[test]
    fn test_apod_single_and_multiple_are_distinguished() {
        let single: ApodResult = serde_json::from_value(serde_json::json!({
            "date": "2024-01-01",
            "explanation": "A nebula.",
            "media_type": "image",
            "title": "Nebula",
            "url": "https://apod.nasa.gov/a.jpg"
        }))
        .unwrap();
        assert!(matches!(single, ApodResult::Single(ref e) if e.title == "Nebula"));

        let multiple: ApodResult = serde_json::from_value(serde_json::json!([
            {"date": "2024-01-01", "media_type": "image", "title": "A"},
            {"date": "2024-01-02", "media_type": "video", "title": "B"}
        ]))
        .unwrap();
        match multiple {
            ApodResult::Multiple(entries) => {
                assert_eq!(entries.len(), 2);
                assert!(entries[1].is_video());
            }
            other => panic!("expected multiple, got {:?}", other),
        }
    }

    #[test]
    fn test_velocity_parsing_tolerates_garbage() {
        let mut neo = NearEarthObject::default();
        assert_eq!(neo.velocity_km_s(), 0.0);

        neo.close_approach_data.push(CloseApproach {
            relative_velocity: RelativeVelocity {
                kilometers_per_second: Some("not a number".into()),
                ..Default::default()
            },
            ..Default::default()
        });
        assert_eq!(neo.velocity_km_s(), 0.0);

        neo.close_approach_data[0].relative_velocity.kilometers_per_second =
            Some("12.5".into());
        assert_eq!(neo.velocity_km_s(), 12.5);
    }

    #[test]
    fn test_epic_archive_url_uses_capture_date() {
        let image: EpicImage = serde_json::from_value(serde_json::json!({
            "identifier": "20151031003633",
            "image": "epic_1b_20151031003633",
            "date": "2015-10-31 00:36:33"
        }))
        .unwrap();
        assert_eq!(
            image.archive_url("https://api.nasa.gov/", "DEMO_KEY").as_deref(),
            Some("https://api.nasa.gov/EPIC/archive/natural/2015/10/31/png/epic_1b_20151031003633.png?api_key=DEMO_KEY")
        );
    }

    #[test]
    fn test_media_search_next_page() {
        let resp: MediaSearchResponse = serde_json::from_value(serde_json::json!({
            "collection": {
                "version": "1.0",
                "href": "https://images-api.nasa.gov/search?q=moon",
                "items": [],
                "metadata": {"total_hits": 42},
                "links": [{"href": "https://images-api.nasa.gov/search?q=moon&page=2", "rel": "next", "prompt": "Next"}]
            }
        }))
        .unwrap();
        assert_eq!(resp.total_hits(), 42);
        assert_eq!(
            resp.next_page(),
            Some("https://images-api.nasa.gov/search?q=moon&page=2")
        );
    }
}

//! Display statistics derived from a NeoWs feed.

use crate::domain::{NearEarthObject, NeoFeed};
use chrono::NaiveDate;
use serde::Serialize;

const HIGH_DANGER_DIAMETER_M: f64 = 1000.0;
const MEDIUM_DANGER_DIAMETER_M: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DangerLevel {
    High,
    Medium,
    Low,
}

/// First matching rule wins
pub fn classify_danger(neo: &NearEarthObject) -> DangerLevel {
    let hazardous = neo.is_potentially_hazardous_asteroid;
    let size = neo.max_diameter_m();

    if hazardous && size > HIGH_DANGER_DIAMETER_M {
        DangerLevel::High
    } else if hazardous || size > MEDIUM_DANGER_DIAMETER_M {
        DangerLevel::Medium
    } else {
        DangerLevel::Low
    }
}

/// One bar of the per-day chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRow {
    pub date: String,
    /// "Jan 05"
    pub label: String,
    pub hazardous: usize,
    pub safe: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FastestObject {
    pub object: NearEarthObject,
    pub speed_km_s: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeoStatsView {
    pub total: usize,
    pub hazardous: usize,
    pub safe: usize,
    pub largest: Option<NearEarthObject>,
    pub fastest: Option<FastestObject>,
    pub chart: Vec<ChartRow>,
    /// Every object, flattened in date order
    pub objects: Vec<NearEarthObject>,
}

pub fn derive_neo_stats(feed: &NeoFeed) -> NeoStatsView {
    let mut objects = Vec::new();
    let mut chart = Vec::with_capacity(feed.near_earth_objects.len());

    // BTreeMap iteration keeps ISO dates chronological
    for (date, neos) in &feed.near_earth_objects {
        let hazardous = neos
            .iter()
            .filter(|n| n.is_potentially_hazardous_asteroid)
            .count();
        chart.push(ChartRow {
            date: date.clone(),
            label: chart_label(date),
            hazardous,
            safe: neos.len() - hazardous,
            total: neos.len(),
        });
        objects.extend(neos.iter().cloned());
    }

    let hazardous = objects
        .iter()
        .filter(|n| n.is_potentially_hazardous_asteroid)
        .count();

    NeoStatsView {
        total: objects.len(),
        hazardous,
        safe: objects.len() - hazardous,
        largest: largest(&objects).cloned(),
        fastest: fastest(&objects),
        chart,
        objects,
    }
}

/// Strictly-greater scan from 0, so ties keep the first seen
fn largest(objects: &[NearEarthObject]) -> Option<&NearEarthObject> {
    let mut best: Option<&NearEarthObject> = None;
    let mut best_size = 0.0;
    for neo in objects {
        let size = neo.max_diameter_m();
        if size > best_size {
            best_size = size;
            best = Some(neo);
        }
    }
    best
}

fn fastest(objects: &[NearEarthObject]) -> Option<FastestObject> {
    let mut best: Option<FastestObject> = None;
    for neo in objects {
        let speed = neo.velocity_km_s();
        let best_speed = best.as_ref().map(|b| b.speed_km_s).unwrap_or(0.0);
        if speed > best_speed {
            best = Some(FastestObject {
                object: neo.clone(),
                speed_km_s: speed,
            });
        }
    }
    best
}

fn chart_label(date: &str) -> String {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.format("%b %d").to_string())
        .unwrap_or_else(|_| date.to_string())
}

//! Shape of the public DDNet player statistics (`/players/?json2=<name>`) and its
//! conversion into the local [`PlayerProfile`] layout.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;

use crate::profile::{PlayerProfile, ProfileCategory, ProfileMapRow};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DdnetPlayerResponse {
    #[serde(default)]
    pub player: Option<String>,
    #[serde(default)]
    pub types: Option<BTreeMap<String, DdnetCategory>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DdnetCategory {
    #[serde(default)]
    pub maps: Option<BTreeMap<String, DdnetMapStats>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DdnetMapStats {
    #[serde(default)]
    pub points: Option<f64>,
    #[serde(default)]
    pub finishes: Option<u32>,
    #[serde(default)]
    pub time: Option<f64>,
    /// Unix seconds.
    #[serde(default)]
    pub first_finish: Option<f64>,
    #[serde(default)]
    pub team_rank: Option<u32>,
    #[serde(default)]
    pub rank: Option<u32>,
}

/// Render Unix seconds the way a browser's `Date::toISOString` does.
pub fn unix_seconds_to_iso(secs: f64) -> Option<String> {
    if !secs.is_finite() {
        return None;
    }
    let millis = (secs * 1000.0).trunc() as i64;
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Convert a DDNet player response into the local profile layout.
///
/// Only maps with at least one finish become rows, but every map counts toward
/// `totalMaps`. DDNet does not report team times, so `teamRankTime` stays empty.
/// Every category in `types` is kept, an absent `maps` counting as zero maps.
/// An empty result means the response had no categories at all.
pub fn to_player_profile(response: &DdnetPlayerResponse) -> PlayerProfile {
    let Some(types) = response.types.as_ref() else {
        return PlayerProfile::new();
    };

    types
        .iter()
        .map(|(category, data)| {
            let maps = data.maps.as_ref();
            let rows = maps
                .into_iter()
                .flatten()
                .filter(|(_, stats)| stats.finishes.unwrap_or(0) > 0)
                .map(|(map, stats)| ProfileMapRow {
                    map: map.clone(),
                    points: stats.points.unwrap_or(0.0),
                    rank_time: stats.time,
                    team_rank_time: None,
                    finishes: stats.finishes.unwrap_or(0),
                    first_finish: stats.first_finish.and_then(unix_seconds_to_iso),
                })
                .collect();
            let total_maps = maps.map_or(0, |maps| maps.len() as u32);
            (
                category.clone(),
                ProfileCategory::from_rows(total_maps, rows),
            )
        })
        .collect()
}

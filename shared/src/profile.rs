use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::map_sort::collate;

/// Display order for well-known categories. Anything else follows, by name.
pub const CATEGORY_ORDER: [&str; 9] = [
    "Novice",
    "Moderate",
    "Brutal",
    "Insane",
    "Dummy",
    "Oldschool",
    "Solo",
    "Race",
    "Event",
];

/// One finished map in a player's category table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileMapRow {
    pub map: String,
    #[serde(default)]
    pub points: f64,
    #[serde(default)]
    pub rank_time: Option<f64>,
    #[serde(default)]
    pub team_rank_time: Option<f64>,
    #[serde(default)]
    pub finishes: u32,
    #[serde(default)]
    pub first_finish: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCategory {
    #[serde(default)]
    pub total_maps: u32,
    #[serde(default)]
    pub finished: u32,
    #[serde(default)]
    pub maps: Vec<ProfileMapRow>,
}

impl ProfileCategory {
    /// Build a category from its finished rows, keeping `finished == maps.len()`.
    pub fn from_rows(total_maps: u32, maps: Vec<ProfileMapRow>) -> Self {
        let finished = maps.len() as u32;
        Self {
            total_maps: total_maps.max(finished),
            finished,
            maps,
        }
    }

    pub fn progress_percent(&self) -> f64 {
        if self.total_maps == 0 {
            return 0.0;
        }
        100.0 * f64::from(self.finished) / f64::from(self.total_maps)
    }
}

/// Category name -> per-category statistics for one player.
pub type PlayerProfile = BTreeMap<String, ProfileCategory>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapInCategory {
    pub map: String,
    #[serde(default)]
    pub points: f64,
}

/// Every known map per category, independent of any player.
pub type MapsByCategory = HashMap<String, Vec<MapInCategory>>;

/// Envelope of `profiles/<encoded>.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDocument {
    #[serde(default)]
    pub schema_version: Option<i64>,
    #[serde(default)]
    pub profile: Option<serde_json::Value>,
}

impl ProfileDocument {
    /// The `profile` field as a [`PlayerProfile`]. A missing or non-object field is
    /// empty; an object whose categories do not match the profile layout is an error.
    pub fn into_profile(self) -> Result<PlayerProfile, serde_json::Error> {
        match self.profile {
            Some(value @ serde_json::Value::Object(_)) => serde_json::from_value(value),
            _ => Ok(PlayerProfile::new()),
        }
    }
}

/// Parse a profile document, keeping only its `profile` field.
///
/// Only invalid JSON is an error. A missing, non-object or wrongly shaped
/// `profile` yields an empty profile.
pub fn parse_profile_document(bytes: &[u8]) -> Result<PlayerProfile, serde_json::Error> {
    let document: ProfileDocument = serde_json::from_slice(bytes)?;
    Ok(document.into_profile().unwrap_or_default())
}

fn category_position(name: &str) -> Option<usize> {
    CATEGORY_ORDER.iter().position(|known| *known == name)
}

/// Sort category names for display: [`CATEGORY_ORDER`] first, then the rest by name.
pub fn order_categories<'a, I>(names: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut ordered: Vec<&str> = names.into_iter().collect();
    ordered.sort_by(
        |a, b| match (category_position(a), category_position(b)) {
            (Some(ia), Some(ib)) => ia.cmp(&ib),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => collate(a, b),
        },
    );
    ordered
}

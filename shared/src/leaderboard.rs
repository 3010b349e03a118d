use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Schema versions of `leaderboard.json` this build understands.
pub const SUPPORTED_SCHEMA_VERSIONS: [i64; 2] = [1, 2];

/// Regions surfaced as their own filter pills; everything else goes in the overflow list.
pub const PRIORITY_REGIONS: [&str; 4] = ["GER", "POL", "RUS", "CHN"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// Position in the current view. Recomputed on every filter/sort.
    pub rank: u32,
    pub name: String,
    pub points: f64,
    pub region: String,
    /// Completion points (stars x multiplier + offset per finished map). Schema v2.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_points: Option<f64>,
    /// Team rank points (1st=25 ... 10th=1 per map). Schema v2.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_rank_points: Option<f64>,
    /// Solo rank points (1st=25 ... 10th=1 per map). Schema v2.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank_points: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse {
    pub schema_version: i64,
    #[serde(default)]
    pub generated_at: Option<String>,
    pub entries: Vec<LeaderboardEntry>,
}

pub fn is_supported_schema_version(version: i64) -> bool {
    SUPPORTED_SCHEMA_VERSIONS.contains(&version)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PointsSortKey {
    #[default]
    CompletionPoints,
    TeamRankPoints,
    RankPoints,
    Points,
}

impl PointsSortKey {
    pub const ALL: [Self; 4] = [
        Self::CompletionPoints,
        Self::TeamRankPoints,
        Self::RankPoints,
        Self::Points,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CompletionPoints => "completionPoints",
            Self::TeamRankPoints => "teamRankPoints",
            Self::RankPoints => "rankPoints",
            Self::Points => "points",
        }
    }

    /// Sort value of `entry` under this key; absent fields count as 0.
    pub fn value(self, entry: &LeaderboardEntry) -> f64 {
        match self {
            Self::CompletionPoints => entry.completion_points.unwrap_or(0.0),
            Self::TeamRankPoints => entry.team_rank_points.unwrap_or(0.0),
            Self::RankPoints => entry.rank_points.unwrap_or(0.0),
            Self::Points => entry.points,
        }
    }
}

impl fmt::Display for PointsSortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSortKey(pub String);

impl fmt::Display for UnknownSortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown sort key: {}", self.0)
    }
}

impl std::error::Error for UnknownSortKey {}

impl FromStr for PointsSortKey {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownSortKey(s.to_owned()))
    }
}

/// Filter by region (if any), order descending by `sort_key` and renumber ranks from 1.
///
/// Ties keep their input order. The input slice is left untouched.
pub fn rerank(
    entries: &[LeaderboardEntry],
    region: Option<&str>,
    sort_key: PointsSortKey,
) -> Vec<LeaderboardEntry> {
    let mut ranked: Vec<LeaderboardEntry> = entries
        .iter()
        .filter(|entry| region.is_none_or(|region| entry.region == region))
        .cloned()
        .collect();

    ranked.sort_by(|a, b| sort_key.value(b).total_cmp(&sort_key.value(a)));

    for (idx, entry) in ranked.iter_mut().enumerate() {
        entry.rank = idx as u32 + 1;
    }
    ranked
}

/// Distinct region codes in lexicographic order.
pub fn unique_regions(entries: &[LeaderboardEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| entry.region.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegionGroups {
    pub priority: Vec<String>,
    pub other: Vec<String>,
}

/// Split regions into [`PRIORITY_REGIONS`] (input order kept) and the sorted rest.
pub fn split_regions(regions: &[String]) -> RegionGroups {
    let (priority, mut other): (Vec<String>, Vec<String>) = regions
        .iter()
        .cloned()
        .partition(|region| PRIORITY_REGIONS.contains(&region.as_str()));
    other.sort();
    RegionGroups { priority, other }
}

/// 1-based position of `name` among players of its own region.
///
/// Regional order uses completion points, falling back to total points for
/// schema v1 payloads that lack the breakdown.
pub fn regional_rank(entries: &[LeaderboardEntry], name: &str) -> Option<u32> {
    let entry = entries.iter().find(|entry| entry.name == name)?;
    let sort_value = |e: &LeaderboardEntry| e.completion_points.unwrap_or(e.points);

    let mut in_region: Vec<&LeaderboardEntry> = entries
        .iter()
        .filter(|e| e.region == entry.region)
        .collect();
    in_region.sort_by(|a, b| sort_value(b).total_cmp(&sort_value(a)));

    in_region
        .iter()
        .position(|e| e.name == name)
        .map(|idx| idx as u32 + 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankTier {
    Gold,
    Silver,
    Bronze,
}

impl RankTier {
    pub const fn for_rank(rank: u32) -> Option<Self> {
        match rank {
            1 => Some(Self::Gold),
            2 => Some(Self::Silver),
            3 => Some(Self::Bronze),
            _ => None,
        }
    }
}

/// Sample rows shown while the real leaderboard is loading or unavailable.
pub fn fallback_entries() -> Vec<LeaderboardEntry> {
    const ROWS: [(&str, f64, &str); 10] = [
        ("SpeedDemon", 12450.0, "EU"),
        ("NinjaRunner", 11820.0, "NA"),
        ("PixelDash", 10990.0, "EU"),
        ("TeeworldsPro", 9870.0, "SA"),
        ("MapMaster", 9450.0, "AS"),
        ("FinishLine", 8920.0, "EU"),
        ("HookKing", 8340.0, "NA"),
        ("GhostRun", 7810.0, "OC"),
        ("ZeroGrav", 7290.0, "EU"),
        ("EdgeRunner", 6750.0, "AF"),
    ];

    ROWS.iter()
        .enumerate()
        .map(|(idx, (name, points, region))| LeaderboardEntry {
            rank: idx as u32 + 1,
            name: (*name).to_owned(),
            points: *points,
            region: (*region).to_owned(),
            completion_points: None,
            team_rank_points: None,
            rank_points: None,
        })
        .collect()
}

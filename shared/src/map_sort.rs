use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::leaderboard::UnknownSortKey;
use crate::profile::{MapInCategory, ProfileMapRow};

/// Case-insensitive string order; strings equal up to case put lowercase first.
///
/// This compares lowercased code points, not locale collation, so accented
/// letters sort by code point (`"é"` after `"f"`).
pub fn collate(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
        .then_with(|| b.cmp(a))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MapSortKey {
    #[default]
    Map,
    Points,
    RankTime,
    TeamRankTime,
    Finishes,
    FirstFinish,
}

impl MapSortKey {
    pub const ALL: [Self; 6] = [
        Self::Map,
        Self::Points,
        Self::RankTime,
        Self::TeamRankTime,
        Self::Finishes,
        Self::FirstFinish,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Map => "map",
            Self::Points => "points",
            Self::RankTime => "rankTime",
            Self::TeamRankTime => "teamRankTime",
            Self::Finishes => "finishes",
            Self::FirstFinish => "firstFinish",
        }
    }

    /// Direction a column starts in when first selected.
    pub const fn default_ascending(self) -> bool {
        matches!(self, Self::Map | Self::FirstFinish)
    }

    fn value(self, row: &ProfileMapRow) -> Option<SortValue<'_>> {
        match self {
            Self::Map => Some(SortValue::Text(&row.map)),
            Self::Points => Some(SortValue::Number(row.points)),
            Self::RankTime => row.rank_time.map(SortValue::Number),
            Self::TeamRankTime => row.team_rank_time.map(SortValue::Number),
            Self::Finishes => Some(SortValue::Number(f64::from(row.finishes))),
            Self::FirstFinish => row.first_finish.as_deref().map(SortValue::Text),
        }
    }
}

impl fmt::Display for MapSortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MapSortKey {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownSortKey(s.to_owned()))
    }
}

#[derive(Debug, Clone, Copy)]
enum SortValue<'a> {
    Text(&'a str),
    Number(f64),
}

impl SortValue<'_> {
    fn compare(self, other: Self) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => collate(a, b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(&b),
            (a, b) => collate(&a.to_string(), &b.to_string()),
        }
    }
}

impl fmt::Display for SortValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{number}"),
        }
    }
}

/// Active column and direction of a category table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSortState {
    pub key: MapSortKey,
    pub ascending: bool,
}

impl Default for MapSortState {
    fn default() -> Self {
        Self {
            key: MapSortKey::Map,
            ascending: true,
        }
    }
}

impl MapSortState {
    /// Clicking the active column flips direction; another column starts in its default direction.
    pub fn select(self, key: MapSortKey) -> Self {
        if self.key == key {
            Self {
                key,
                ascending: !self.ascending,
            }
        } else {
            Self {
                key,
                ascending: key.default_ascending(),
            }
        }
    }

    pub fn apply(self, rows: &[ProfileMapRow]) -> Vec<ProfileMapRow> {
        sort_maps(rows, self.key, self.ascending)
    }
}

/// Stable sort of finished-map rows.
///
/// Missing values go last in either direction; `ascending` only flips the
/// comparison between present values.
pub fn sort_maps(rows: &[ProfileMapRow], key: MapSortKey, ascending: bool) -> Vec<ProfileMapRow> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| match (key.value(a), key.value(b)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(av), Some(bv)) => {
            let cmp = av.compare(bv);
            if ascending { cmp } else { cmp.reverse() }
        }
    });
    sorted
}

/// Catalog maps the player has not finished, ordered by name.
pub fn unfinished_maps(
    catalog: &[MapInCategory],
    finished_rows: &[ProfileMapRow],
) -> Vec<MapInCategory> {
    let finished: HashSet<&str> = finished_rows.iter().map(|row| row.map.as_str()).collect();
    let mut unfinished: Vec<MapInCategory> = catalog
        .iter()
        .filter(|entry| !finished.contains(entry.map.as_str()))
        .cloned()
        .collect();
    unfinished.sort_by(|a, b| collate(&a.map, &b.map));
    unfinished
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::{MapSortKey, MapSortState, collate, sort_maps, unfinished_maps};
    use crate::profile::{MapInCategory, ProfileMapRow};

    fn row(map: &str, points: f64, rank_time: Option<f64>, finishes: u32) -> ProfileMapRow {
        ProfileMapRow {
            map: map.to_string(),
            points,
            rank_time,
            team_rank_time: None,
            finishes,
            first_finish: None,
        }
    }

    fn catalog(maps: &[&str]) -> Vec<MapInCategory> {
        maps.iter()
            .map(|map| MapInCategory {
                map: map.to_string(),
                points: 1.0,
            })
            .collect()
    }

    fn map_names(rows: &[ProfileMapRow]) -> Vec<&str> {
        rows.iter().map(|r| r.map.as_str()).collect()
    }

    #[test]
    fn collate_ignores_case_and_prefers_lowercase_on_ties() {
        assert_eq!(collate("alpha", "Beta"), Ordering::Less);
        assert_eq!(collate("Zeta", "beta"), Ordering::Greater);
        assert_eq!(collate("a", "A"), Ordering::Less);
        assert_eq!(collate("same", "same"), Ordering::Equal);
    }

    #[test]
    fn collate_orders_accented_letters_by_code_point() {
        assert_eq!(collate("é", "f"), Ordering::Greater);
        assert_eq!(collate("Émile", "zed"), Ordering::Greater);
    }

    #[test]
    fn nulls_sort_last_in_both_directions() {
        let rows = vec![
            row("a", 1.0, None, 1),
            row("b", 1.0, Some(30.0), 1),
            row("c", 1.0, None, 1),
            row("d", 1.0, Some(10.0), 1),
        ];

        let asc = sort_maps(&rows, MapSortKey::RankTime, true);
        assert_eq!(map_names(&asc), vec!["d", "b", "a", "c"]);

        let desc = sort_maps(&rows, MapSortKey::RankTime, false);
        assert_eq!(map_names(&desc), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn team_rank_time_is_all_null_for_fallback_rows() {
        let rows = vec![row("x", 1.0, None, 1), row("y", 2.0, None, 1)];
        let sorted = sort_maps(&rows, MapSortKey::TeamRankTime, false);
        assert_eq!(map_names(&sorted), vec!["x", "y"]);
    }

    #[test]
    fn toggling_twice_restores_tie_order() {
        let rows = vec![
            row("first", 5.0, None, 2),
            row("second", 5.0, None, 2),
            row("third", 9.0, None, 1),
        ];

        let state = MapSortState::default().select(MapSortKey::Points);
        assert!(!state.ascending);
        let desc = state.apply(&rows);
        assert_eq!(map_names(&desc), vec!["third", "first", "second"]);

        let asc = state.select(MapSortKey::Points);
        assert!(asc.ascending);
        assert_eq!(map_names(&asc.apply(&rows)), vec!["first", "second", "third"]);

        let back = asc.select(MapSortKey::Points);
        assert_eq!(back, state);
        assert_eq!(back.apply(&rows), desc);
    }

    #[test]
    fn select_uses_column_default_direction() {
        let state = MapSortState::default();
        assert_eq!(state.key, MapSortKey::Map);
        assert!(state.ascending);

        assert!(!state.select(MapSortKey::Map).ascending);
        assert!(state.select(MapSortKey::FirstFinish).ascending);
        assert!(!state.select(MapSortKey::Finishes).ascending);
        assert!(!state.select(MapSortKey::RankTime).ascending);
    }

    #[test]
    fn map_names_sort_with_collation() {
        let rows = vec![
            row("beta", 1.0, None, 1),
            row("Alpha", 1.0, None, 1),
            row("gamma", 1.0, None, 1),
        ];
        assert_eq!(
            map_names(&sort_maps(&rows, MapSortKey::Map, true)),
            vec!["Alpha", "beta", "gamma"]
        );
        assert_eq!(
            map_names(&sort_maps(&rows, MapSortKey::Map, false)),
            vec!["gamma", "beta", "Alpha"]
        );
    }

    #[test]
    fn first_finish_sorts_iso_timestamps_chronologically() {
        let mut early = row("early", 1.0, None, 1);
        early.first_finish = Some("2019-01-02T00:00:00.000Z".to_string());
        let mut late = row("late", 1.0, None, 1);
        late.first_finish = Some("2023-11-14T22:13:20.000Z".to_string());
        let never = row("never", 1.0, None, 1);

        let rows = vec![never, late, early];
        assert_eq!(
            map_names(&sort_maps(&rows, MapSortKey::FirstFinish, true)),
            vec!["early", "late", "never"]
        );
    }

    #[test]
    fn unfinished_maps_are_catalog_minus_finished_sorted() {
        let finished = vec![row("x", 1.0, None, 1)];

        let forward = unfinished_maps(&catalog(&["x", "y", "z"]), &finished);
        let reversed = unfinished_maps(&catalog(&["z", "y", "x"]), &finished);

        let names = |maps: &[MapInCategory]| maps.iter().map(|m| m.map.clone()).collect::<Vec<_>>();
        assert_eq!(names(forward.as_slice()), vec!["y", "z"]);
        assert_eq!(names(reversed.as_slice()), vec!["y", "z"]);
    }

    #[test]
    fn unfinished_maps_is_empty_without_catalog() {
        assert!(unfinished_maps(&[], &[row("x", 1.0, None, 1)]).is_empty());
    }

    #[test]
    fn sort_key_round_trips_through_str() {
        for key in MapSortKey::ALL {
            assert_eq!(key.as_str().parse::<MapSortKey>(), Ok(key));
        }
        assert!("rank_time".parse::<MapSortKey>().is_err());
    }
}

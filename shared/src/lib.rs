pub mod ddnet;
pub mod leaderboard;
pub mod map_sort;
pub mod profile;
pub mod profile_path;
pub mod time_format;

pub use leaderboard::*;
pub use map_sort::*;
pub use profile::*;
pub use profile_path::player_profile_path;

pub mod leaderboard;
pub mod profiles;

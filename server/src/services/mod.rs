pub mod leaderboard_refresher;

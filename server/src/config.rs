use std::time::Duration;

use crate::data_source::DataSource;

pub const DEFAULT_DATA_BASE: &str = "./data";
pub const DEFAULT_DDNET_PLAYERS_URL: &str = "https://ddnet.org/players/";

pub const LEADERBOARD_FILE: &str = "leaderboard.json";
pub const MAPS_BY_CATEGORY_FILE: &str = "maps-by-category.json";
pub const PROFILES_DIR: &str = "profiles";

pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 3;
pub const MAX_PLAYER_NAME_LEN: usize = 64;

/// Where `leaderboard.json`, `maps-by-category.json` and `profiles/` live.
/// Either an `http(s)://` base URL or a local directory.
pub fn data_source() -> DataSource {
    let raw = std::env::var("DATA_BASE_URL")
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_DATA_BASE.to_owned());
    DataSource::parse(&raw)
}

pub fn ddnet_players_url() -> String {
    std::env::var("DDNET_PLAYERS_URL")
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_DDNET_PLAYERS_URL.to_owned())
}

pub fn server_port() -> u16 {
    std::env::var("SERVER_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SERVER_PORT)
}

/// Interval for re-loading the leaderboard. `None` loads it once at startup.
pub fn leaderboard_refresh_interval() -> Option<Duration> {
    std::env::var("LEADERBOARD_REFRESH_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
}

pub fn upstream_http_timeout() -> Duration {
    std::env::var("UPSTREAM_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS))
}

pub fn upstream_connect_timeout() -> Duration {
    std::env::var("UPSTREAM_CONNECT_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::{
        DEFAULT_DDNET_PLAYERS_URL, DEFAULT_SERVER_PORT, data_source, ddnet_players_url,
        leaderboard_refresh_interval, server_port, upstream_http_timeout,
    };
    use crate::data_source::DataSource;

    #[test]
    fn defaults_apply_when_unset() {
        temp_env::with_vars_unset(
            [
                "DATA_BASE_URL",
                "DDNET_PLAYERS_URL",
                "SERVER_PORT",
                "LEADERBOARD_REFRESH_SECS",
                "UPSTREAM_HTTP_TIMEOUT_SECS",
            ],
            || {
                assert!(matches!(data_source(), DataSource::Dir(path) if path == PathBuf::from("./data")));
                assert_eq!(ddnet_players_url(), DEFAULT_DDNET_PLAYERS_URL);
                assert_eq!(server_port(), DEFAULT_SERVER_PORT);
                assert_eq!(leaderboard_refresh_interval(), None);
                assert_eq!(upstream_http_timeout(), Duration::from_secs(10));
            },
        );
    }

    #[test]
    fn http_base_url_selects_http_source() {
        temp_env::with_var(
            "DATA_BASE_URL",
            Some("https://example.org/ddrank/"),
            || match data_source() {
                DataSource::Http(url) => {
                    assert_eq!(url.as_str(), "https://example.org/ddrank/");
                }
                DataSource::Dir(path) => panic!("expected HTTP source, got {path:?}"),
            },
        );
    }

    #[test]
    fn invalid_or_zero_values_fall_back() {
        temp_env::with_vars(
            [
                ("SERVER_PORT", Some("not-a-port")),
                ("LEADERBOARD_REFRESH_SECS", Some("0")),
                ("UPSTREAM_HTTP_TIMEOUT_SECS", Some("-4")),
                ("DDNET_PLAYERS_URL", Some("   ")),
            ],
            || {
                assert_eq!(server_port(), DEFAULT_SERVER_PORT);
                assert_eq!(leaderboard_refresh_interval(), None);
                assert_eq!(upstream_http_timeout(), Duration::from_secs(10));
                assert_eq!(ddnet_players_url(), DEFAULT_DDNET_PLAYERS_URL);
            },
        );
    }

    #[test]
    fn refresh_interval_reads_seconds() {
        temp_env::with_var("LEADERBOARD_REFRESH_SECS", Some("900"), || {
            assert_eq!(
                leaderboard_refresh_interval(),
                Some(Duration::from_secs(900))
            );
        });
    }
}

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use ddrank_shared::ddnet::{DdnetPlayerResponse, to_player_profile};
use ddrank_shared::{MapsByCategory, PlayerProfile, ProfileDocument, player_profile_path};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::{MAPS_BY_CATEGORY_FILE, PROFILES_DIR};
use crate::data_source::{DataSource, FetchError, fetch_url};
use crate::state::ObservabilityCounters;

/// Outcome of the most recent `load_player` call.
#[derive(Debug, Clone, Default)]
pub struct ProfileStatus {
    pub player: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
    generation: u64,
}

pub struct ProfileStore {
    profiles: DashMap<String, Arc<PlayerProfile>>,
    in_flight: DashMap<String, Arc<Mutex<()>>>,
    maps_by_category: RwLock<Option<Arc<MapsByCategory>>>,
    maps_loaded: Mutex<bool>,
    status: RwLock<ProfileStatus>,
    next_generation: AtomicU64,
    client: reqwest::Client,
    source: DataSource,
    ddnet_players_url: String,
    observability: Arc<ObservabilityCounters>,
}

impl ProfileStore {
    pub fn new(
        client: reqwest::Client,
        source: DataSource,
        ddnet_players_url: String,
        observability: Arc<ObservabilityCounters>,
    ) -> Self {
        Self {
            profiles: DashMap::new(),
            in_flight: DashMap::new(),
            maps_by_category: RwLock::new(None),
            maps_loaded: Mutex::new(false),
            status: RwLock::new(ProfileStatus::default()),
            next_generation: AtomicU64::new(0),
            client,
            source,
            ddnet_players_url,
            observability,
        }
    }

    pub fn profile(&self, name: &str) -> Option<Arc<PlayerProfile>> {
        self.profiles.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn cached_players(&self) -> usize {
        self.profiles.len()
    }

    pub async fn maps_by_category(&self) -> Option<Arc<MapsByCategory>> {
        self.maps_by_category.read().await.clone()
    }

    pub async fn status(&self) -> ProfileStatus {
        self.status.read().await.clone()
    }

    /// Load the map catalog until one attempt succeeds. Callers queue behind a
    /// single attempt; failures only log and leave the catalog unset.
    pub async fn load_maps_by_category(&self) {
        let mut loaded = self.maps_loaded.lock().await;
        if *loaded {
            return;
        }

        let result = match self.source.fetch(&self.client, MAPS_BY_CATEGORY_FILE).await {
            Ok(bytes) => serde_json::from_slice::<MapsByCategory>(&bytes).map_err(FetchError::from),
            Err(e) => Err(e),
        };

        match result {
            Ok(catalog) => {
                info!(categories = catalog.len(), "loaded maps-by-category catalog");
                *self.maps_by_category.write().await = Some(Arc::new(catalog));
                *loaded = true;
            }
            Err(e) => {
                warn!(error = %e, source = %self.source.describe(), "failed to load maps-by-category catalog");
                self.observability.record_maps_catalog_failure();
            }
        }
    }

    /// Fetch and cache one player's profile: local document first, DDNet second.
    ///
    /// Blank and already cached names return without fetching. A failure of both
    /// sources is recorded in [`ProfileStatus::error`] and nothing is cached.
    pub async fn load_player(&self, name: &str) {
        if name.trim().is_empty() {
            return;
        }
        self.observability.record_profile_request();
        if self.profiles.contains_key(name) {
            self.observability.record_profile_cache_hit();
            return;
        }

        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.status.write().await = ProfileStatus {
            player: Some(name.to_owned()),
            loading: true,
            error: None,
            generation,
        };

        self.load_maps_by_category().await;

        let lock = Arc::clone(self.in_flight.entry(name.to_owned()).or_default().value());
        let error = {
            let _guard = lock.lock().await;
            if self.profiles.contains_key(name) {
                self.observability.record_profile_cache_hit();
                None
            } else {
                match self.fetch_player(name).await {
                    Ok(profile) => {
                        info!(player = name, categories = profile.len(), "cached player profile");
                        self.profiles.insert(name.to_owned(), Arc::new(profile));
                        None
                    }
                    Err(e) => {
                        warn!(player = name, error = %e, "failed to load player profile");
                        self.observability.record_profile_failure();
                        Some(e.to_string())
                    }
                }
            }
        };
        drop(lock);
        self.in_flight
            .remove_if(name, |_, lock| Arc::strong_count(lock) == 1);

        self.finish_status(generation, error).await;
    }

    async fn finish_status(&self, generation: u64, error: Option<String>) {
        let mut status = self.status.write().await;
        if status.generation != generation {
            return;
        }
        status.loading = false;
        status.error = error;
    }

    async fn fetch_player(&self, name: &str) -> Result<PlayerProfile, FetchError> {
        match self.fetch_local_profile(name).await {
            Ok(profile) => {
                self.observability.record_profile_local_load();
                return Ok(profile);
            }
            Err(e) => debug!(player = name, error = %e, "local profile unavailable, trying ddnet"),
        }

        let profile = self.fetch_ddnet_profile(name).await?;
        self.observability.record_profile_fallback_load();
        Ok(profile)
    }

    async fn fetch_local_profile(&self, name: &str) -> Result<PlayerProfile, FetchError> {
        let path = format!("{PROFILES_DIR}/{}.json", player_profile_path(name));
        let bytes = self.source.fetch(&self.client, &path).await?;
        let document: ProfileDocument = serde_json::from_slice(&bytes)?;
        Ok(document.into_profile().unwrap_or_else(|e| {
            warn!(player = name, error = %e, "local profile has an unexpected layout, using an empty profile");
            PlayerProfile::new()
        }))
    }

    async fn fetch_ddnet_profile(&self, name: &str) -> Result<PlayerProfile, FetchError> {
        let bytes = fetch_url(&self.client, self.ddnet_url(name)?).await?;
        let response: DdnetPlayerResponse = serde_json::from_slice(&bytes)?;
        let profile = to_player_profile(&response);
        if profile.is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(profile)
    }

    fn ddnet_url(&self, name: &str) -> Result<reqwest::Url, FetchError> {
        let separator = if self.ddnet_players_url.contains('?') { '&' } else { '?' };
        let raw = format!(
            "{}{separator}json2={}",
            self.ddnet_players_url,
            urlencoding::encode(name)
        );
        reqwest::Url::parse(&raw).map_err(|e| FetchError::Url(e.to_string()))
    }
}

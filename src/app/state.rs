//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::MatchRegistry;
use crate::gateway::{HttpGateway, StatsGateway};
use crate::store::{PlayerStore, SessionStore};
use crate::util::rate_limit::{create_limiter, Limiter, API_RATE_LIMIT};
use crate::ws::relay::RelayHub;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: SessionStore,
    pub relay: RelayHub,
    pub match_registry: Arc<MatchRegistry>,
    pub gateway: StatsGateway,
    pub api_limiter: Arc<Limiter>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        let sessions = SessionStore::new(PlayerStore::new(), config.max_players_per_session);

        // Results go to the remote service when one is configured, otherwise stay local
        let gateway = match &config.stats_gateway_url {
            Some(url) => StatsGateway::Http(HttpGateway::new(url)),
            None => StatsGateway::Local(sessions.clone()),
        };

        Self {
            config,
            sessions,
            relay: RelayHub::new(),
            match_registry: Arc::new(MatchRegistry::new()),
            gateway,
            api_limiter: create_limiter(API_RATE_LIMIT),
        }
    }
}

use std::sync::Arc;

use crate::{
    config::Config,
    services::{
        authenticator::Authenticator,
        session_store::{InMemorySessionStore, SessionStore},
        token_codec::{TokenCodec, TokenSettings},
    },
    utils::{cookies::CookieOptions, time::Clock},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: Arc<dyn SessionStore>,
    pub authenticator: Arc<Authenticator>,
}

impl AppState {
    pub fn new(config: Config, sessions: Arc<dyn SessionStore>, clock: Arc<dyn Clock>) -> Self {
        let codec = TokenCodec::new(TokenSettings::from(&config), sessions.clone(), clock);
        let authenticator = Authenticator::new(codec, sessions.clone());
        Self {
            config: Arc::new(config),
            sessions,
            authenticator: Arc::new(authenticator),
        }
    }

    /// State backed by a fresh in-memory session registry.
    pub fn in_memory(config: Config, clock: Arc<dyn Clock>) -> Self {
        let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new(clock.clone()));
        Self::new(config, sessions, clock)
    }

    pub fn cookie_options(&self) -> CookieOptions {
        self.config.cookie_options()
    }
}

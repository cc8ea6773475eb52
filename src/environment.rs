use std::sync::Arc;

use log::Logger;

use crate::db::Db;
use crate::identity::IdentityProvider;
use crate::render::Renderer;
use crate::session::SessionKeys;

pub type SafeDb = dyn Db + Send + Sync;
pub type SafeProvider = dyn IdentityProvider + Send + Sync;
pub type SafeRenderer = dyn Renderer + Send + Sync;

/// What every request handler has access to.
#[derive(Clone)]
pub struct Environment {
    pub logger: Arc<Logger>,
    pub db: Arc<SafeDb>,
    pub provider: Arc<SafeProvider>,
    pub sessions: Arc<SessionKeys>,
    pub renderer: Arc<SafeRenderer>,
    pub config: Config,
}

impl Environment {
    pub fn new(
        logger: Arc<Logger>,
        db: Arc<SafeDb>,
        provider: Arc<SafeProvider>,
        sessions: Arc<SessionKeys>,
        renderer: Arc<SafeRenderer>,
        config: Config,
    ) -> Self {
        Self {
            logger,
            db,
            provider,
            sessions,
            renderer,
            config,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// How many programs the home page lists.
    pub(crate) latest_count: i64,
}

impl Config {
    pub fn new(latest_count: i64) -> Self {
        Self { latest_count }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(10)
    }
}

//! Centralized state management for the Actix web server
use std::{fmt, sync::Arc};

use crate::{config::Config, github::ContentsApi};

/// Global, read-only state
pub trait Global {
    /// Deploy targets and the shared secret
    fn config(&self) -> &Config;
    /// Client for the GitHub Contents API
    fn contents(&self) -> &dyn ContentsApi;
}

/// Application state
#[derive(Clone)]
pub struct App {
    /// Deploy targets and the shared secret
    pub config: Arc<Config>,
    /// Client for the GitHub Contents API
    pub contents: Arc<dyn ContentsApi>,
}

impl App {
    /// Bundle the start-up configuration with the outbound client.
    #[must_use]
    pub fn new(config: Config, contents: Arc<dyn ContentsApi>) -> Self {
        Self {
            config: Arc::new(config),
            contents,
        }
    }
}

impl Global for App {
    fn config(&self) -> &Config {
        &self.config
    }

    fn contents(&self) -> &dyn ContentsApi {
        self.contents.as_ref()
    }
}

impl fmt::Debug for App {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "App with {:?}", self.config)
    }
}

//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::{BackendClient, BackendError};
use crate::blocks::BlockRegistry;
use crate::config::StorefrontConfig;
use crate::content::{ContentError, ContentStore};
use crate::search::SearchCoordinator;

/// Error creating the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("backend client: {0}")]
    Backend(#[from] BackendError),
    #[error("content: {0}")]
    Content(#[from] ContentError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Everything in here is immutable or
/// internally synchronized; per-visitor state lives in the session.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backend: BackendClient,
    content: ContentStore,
    blocks: BlockRegistry,
    search: SearchCoordinator,
}

impl AppState {
    /// Create the application state, loading content pages from
    /// `config.content_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the content
    /// directory cannot be read.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let backend = BackendClient::new(&config.backend)?;
        let content = ContentStore::load(&config.content_dir)?;

        Ok(Self::with_parts(config, backend, content, BlockRegistry::default()))
    }

    /// Assemble state from prebuilt parts.
    #[must_use]
    pub fn with_parts(
        config: StorefrontConfig,
        backend: BackendClient,
        content: ContentStore,
        blocks: BlockRegistry,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                content,
                blocks,
                search: SearchCoordinator::new(),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Client for the backend REST API.
    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    /// Markdown legal and info pages.
    #[must_use]
    pub fn content(&self) -> &ContentStore {
        &self.inner.content
    }

    /// CMS block renderers.
    #[must_use]
    pub fn blocks(&self) -> &BlockRegistry {
        &self.inner.blocks
    }

    #[must_use]
    pub fn search(&self) -> &SearchCoordinator {
        &self.inner.search
    }
}

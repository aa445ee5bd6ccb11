use std::time::Duration;

use crate::state::GalleryOrder;

/// Default address of the generation server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Configuration for a [`GenerationSession`](crate::GenerationSession).
///
/// Use [`SessionConfig::builder()`] for ergonomic construction, or
/// [`SessionConfig::default()`] for a local server with append ordering.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base URL of the generation server.
    pub base_url: String,

    /// Timeout for cancel, skip, and catalog requests.
    pub control_timeout: Duration,

    /// Timeout for establishing the streaming request. The stream body
    /// itself is never timed out.
    pub connect_timeout: Duration,

    /// Where finished images are inserted into the gallery.
    pub gallery_order: GalleryOrder,

    /// Give the undelimited tail of the stream one parse attempt at end of stream.
    pub flush_on_end: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            control_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(30),
            gallery_order: GalleryOrder::Append,
            flush_on_end: true,
        }
    }
}

impl SessionConfig {
    /// Start building a config with the builder pattern.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }
}

/// Builder for [`SessionConfig`].
#[derive(Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn with_control_timeout(mut self, timeout: Duration) -> Self {
        self.config.control_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set whether new gallery images are appended or prepended.
    pub fn with_gallery_order(mut self, order: GalleryOrder) -> Self {
        self.config.gallery_order = order;
        self
    }

    pub fn with_flush_on_end(mut self, flush: bool) -> Self {
        self.config.flush_on_end = flush;
        self
    }

    /// Build the final [`SessionConfig`].
    pub fn build(self) -> SessionConfig {
        self.config
    }
}

//! Application state for the API server

use crate::{Config, StreamNotifier};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clone).
#[derive(Clone)]
pub struct AppState {
    /// The notifier instance
    pub notifier: Arc<StreamNotifier>,

    /// Configuration, read only
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(notifier: Arc<StreamNotifier>, config: Arc<Config>) -> Self {
        Self { notifier, config }
    }
}

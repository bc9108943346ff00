use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::provider::{MetadataProvider, ProviderError};

/// Session-lifetime poster/still cache keyed by URL.
///
/// Unbounded: entries live until the process exits.
#[derive(Debug, Default, Clone)]
pub struct ArtworkCache {
    entries: Arc<Mutex<HashMap<String, Arc<Vec<u8>>>>>,
}

impl ArtworkCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<Arc<Vec<u8>>> {
        self.entries.lock().ok()?.get(url).cloned()
    }

    pub fn insert(&self, url: &str, bytes: Vec<u8>) -> Arc<Vec<u8>> {
        let bytes = Arc::new(bytes);
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(url.to_string(), Arc::clone(&bytes));
        }
        bytes
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached bytes for `url`, downloading through the provider on a miss.
    pub async fn fetch(
        &self,
        provider: &dyn MetadataProvider,
        url: &str,
    ) -> Result<Arc<Vec<u8>>, ProviderError> {
        if let Some(bytes) = self.get(url) {
            debug!(url = %url, "artwork cache hit");
            return Ok(bytes);
        }

        let bytes = provider.fetch_image(url).await?;
        debug!(url = %url, size = bytes.len(), "artwork downloaded");
        Ok(self.insert(url, bytes))
    }
}

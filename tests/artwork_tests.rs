// Integration tests for the artwork cache

mod common;

use std::sync::atomic::Ordering;

use common::MockProvider;
use kodi_rename::artwork::ArtworkCache;
use kodi_rename::provider::ProviderError;

const URL: &str = "https://image.tmdb.org/t/p/w342/poster.jpg";

#[tokio::test]
async fn test_second_fetch_is_served_from_cache() {
    let mut provider = MockProvider::new();
    provider.images.insert(URL.to_string(), vec![1, 2, 3]);
    let cache = ArtworkCache::new();

    let first = cache.fetch(&provider, URL).await.unwrap();
    let second = cache.fetch(&provider, URL).await.unwrap();

    assert_eq!(first.as_slice(), &[1, 2, 3]);
    assert_eq!(first, second);
    assert_eq!(provider.image_calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn test_failed_fetch_is_not_cached() {
    let provider = MockProvider::new();
    let cache = ArtworkCache::new();

    let result = cache.fetch(&provider, URL).await;
    assert!(matches!(result, Err(ProviderError::NotFound)));
    assert!(cache.is_empty());

    let _ = cache.fetch(&provider, URL).await;
    assert_eq!(provider.image_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_clones_share_entries() {
    let cache = ArtworkCache::new();
    let clone = cache.clone();
    clone.insert(URL, vec![9]);

    assert_eq!(cache.get(URL).map(|b| b.len()), Some(1));
}

//! Generation Cache
//!
//! Process-wide cache of generated text keyed by (backend, model, prompt).
//! Created empty at process start, never evicted, dropped at process exit.
//! An explicit object rather than a module-level singleton so tests can
//! isolate themselves with fresh instances.

use dashmap::DashMap;
use sha2::{Digest, Sha256};

/// Concurrency-safe map of cache keys to generated text.
///
/// Two concurrent misses for the same key may both reach the backend; the
/// duplicate work is acceptable, the last write wins, and no reader ever
/// observes a torn value.
#[derive(Default)]
pub struct GenerationCache {
    entries: DashMap<String, String>,
}

impl GenerationCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Deterministic cache key for one generation request.
    pub fn cache_key(backend: &str, model: &str, prompt: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(backend.as_bytes());
        hasher.update([0u8]);
        hasher.update(model.as_bytes());
        hasher.update([0u8]);
        hasher.update(prompt.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Record a successful generation. Failures are never inserted.
    pub fn insert(&self, key: String, text: String) {
        self.entries.insert(key, text);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_cache_key_deterministic() {
        let a = GenerationCache::cache_key("ollama", "llama3", "summarize this");
        let b = GenerationCache::cache_key("ollama", "llama3", "summarize this");
        assert_eq!(a, b);
    }

    #[test]
    fn test_cache_key_distinguishes_inputs() {
        let base = GenerationCache::cache_key("ollama", "llama3", "prompt");
        assert_ne!(
            base,
            GenerationCache::cache_key("openai", "llama3", "prompt")
        );
        assert_ne!(
            base,
            GenerationCache::cache_key("ollama", "llama3.1", "prompt")
        );
        assert_ne!(
            base,
            GenerationCache::cache_key("ollama", "llama3", "prompt!")
        );
    }

    #[test]
    fn test_cache_key_no_field_confusion() {
        // The separator prevents (ab, c) and (a, bc) from colliding
        let a = GenerationCache::cache_key("ab", "c", "p");
        let b = GenerationCache::cache_key("a", "bc", "p");
        assert_ne!(a, b);
    }

    #[test]
    fn test_get_insert_roundtrip() {
        let cache = GenerationCache::new();
        assert!(cache.is_empty());

        let key = GenerationCache::cache_key("ollama", "m", "p");
        assert_eq!(cache.get(&key), None);

        cache.insert(key.clone(), "summary text".to_string());
        assert_eq!(cache.get(&key).as_deref(), Some("summary text"));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_access() {
        let cache = Arc::new(GenerationCache::new());
        let mut handles = Vec::new();

        for worker in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                for i in 0..50 {
                    let key = GenerationCache::cache_key("ollama", "m", &format!("p{}", i));
                    cache.insert(key.clone(), format!("text{}", i));
                    let _ = cache.get(&key);
                    let _ = worker;
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(cache.len(), 50);
    }
}

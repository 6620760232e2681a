use std::collections::HashMap;

/// Resolved translations for the active language pair.
///
/// Entries are never evicted one by one; the whole map is cleared when the
/// pair changes.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: HashMap<String, String>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, text: &str) -> Option<&str> {
        self.entries.get(text).map(String::as_str)
    }

    pub fn contains(&self, text: &str) -> bool {
        self.entries.contains_key(text)
    }

    pub fn put(&mut self, text: String, translated: String) {
        self.entries.insert(text, translated);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
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

    #[test]
    fn test_put_and_get() {
        let mut cache = ResultCache::new();
        assert!(cache.get("Hello").is_none());

        cache.put("Hello".to_string(), "Hola".to_string());
        assert_eq!(cache.get("Hello"), Some("Hola"));
        assert!(cache.contains("Hello"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_keys_are_exact() {
        let mut cache = ResultCache::new();
        cache.put("Hello".to_string(), "Hola".to_string());
        assert!(cache.get("hello").is_none());
        assert!(cache.get("Hello ").is_none());
    }

    #[test]
    fn test_put_overwrites() {
        let mut cache = ResultCache::new();
        cache.put("Hello".to_string(), "Hola".to_string());
        cache.put("Hello".to_string(), "Buenas".to_string());
        assert_eq!(cache.get("Hello"), Some("Buenas"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut cache = ResultCache::new();
        cache.put("Hello".to_string(), "Hola".to_string());
        cache.put("World".to_string(), "Mundo".to_string());
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get("Hello").is_none());
    }
}

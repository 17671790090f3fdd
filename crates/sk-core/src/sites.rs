//! Per-domain override bindings
//!
//! A binding for the current domain takes precedence over the global
//! override. Keys are normalised with [`domain_key`].

use crate::error::StorageError;
use crate::host::domain_key;
use crate::store::{PersistentStore, SiteBindingMap, StorageBackend};
use crate::types::StyleOverride;

/// Resolver view over the site-binding map of a store.
pub struct SiteBindings<'a, B> {
    store: &'a mut PersistentStore<B>,
}

impl<'a, B: StorageBackend> SiteBindings<'a, B> {
    pub fn new(store: &'a mut PersistentStore<B>) -> Self {
        Self { store }
    }

    /// Override bound to `domain`, if any.
    pub fn resolve(&self, domain: &str) -> Option<StyleOverride> {
        let key = domain_key(domain)?;
        self.store.site_bindings().remove(&key)
    }

    /// Insert or replace the binding for `domain`. Empty hosts are ignored.
    /// Returns whether a binding was written.
    pub fn bind(&mut self, domain: &str, style: &StyleOverride) -> Result<bool, StorageError> {
        let Some(key) = domain_key(domain) else {
            return Ok(false);
        };
        let mut bindings = self.store.site_bindings();
        bindings.insert(key, style.clone());
        self.store.set_site_bindings(&bindings)?;
        Ok(true)
    }

    /// Remove the binding for `domain`. Returns whether one existed.
    pub fn unbind(&mut self, domain: &str) -> Result<bool, StorageError> {
        let Some(key) = domain_key(domain) else {
            return Ok(false);
        };
        let mut bindings = self.store.site_bindings();
        if bindings.remove(&key).is_none() {
            return Ok(false);
        }
        self.store.set_site_bindings(&bindings)?;
        Ok(true)
    }

    /// Remove every binding.
    pub fn unbind_all(&mut self) -> Result<(), StorageError> {
        self.store.set_site_bindings(&SiteBindingMap::new())
    }

    pub fn list(&self) -> SiteBindingMap {
        self.store.site_bindings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;

    #[test]
    fn test_bind_resolve_unbind() {
        let mut store = PersistentStore::new(MemoryBackend::new());
        let mut sites = SiteBindings::new(&mut store);
        let a = StyleOverride::new("color: red", "p");

        assert_eq!(sites.resolve("example.com"), None);
        assert!(sites.bind("Example.com", &a).unwrap());
        assert_eq!(sites.resolve("example.com"), Some(a.clone()));
        assert_eq!(sites.resolve("other.org"), None);

        assert!(sites.unbind("example.com").unwrap());
        assert!(!sites.unbind("example.com").unwrap());
        assert_eq!(sites.resolve("example.com"), None);
    }

    #[test]
    fn test_bind_upserts() {
        let mut store = PersistentStore::new(MemoryBackend::new());
        let mut sites = SiteBindings::new(&mut store);
        sites.bind("a.com", &StyleOverride::new("color: red", "*")).unwrap();
        sites.bind("a.com", &StyleOverride::new("color: blue", "*")).unwrap();
        assert_eq!(sites.list().len(), 1);
        assert_eq!(sites.resolve("a.com").unwrap().css, "color: blue");
    }

    #[test]
    fn test_unbind_all_and_empty_host() {
        let mut store = PersistentStore::new(MemoryBackend::new());
        let mut sites = SiteBindings::new(&mut store);
        let style = StyleOverride::new("color: red", "*");
        assert!(!sites.bind("", &style).unwrap());
        sites.bind("a.com", &style).unwrap();
        sites.bind("b.com", &style).unwrap();
        sites.unbind_all().unwrap();
        assert!(sites.list().is_empty());
    }
}

// Site Registry - the fixed set of monitored sites

use crate::utils::network::Endpoint;
use crate::{MonitorError, Result};
use serde::{Deserialize, Serialize};

/// A monitored HTTPS site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub address: String,
}

impl Site {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            address: address.into(),
        }
    }

    /// Host and port this site resolves to
    pub fn endpoint(&self) -> Result<Endpoint> {
        Endpoint::parse(&self.address)
    }
}

/// Immutable, ordered collection of sites. Built once from configuration.
#[derive(Debug, Clone, Default)]
pub struct SiteRegistry {
    sites: Vec<Site>,
}

impl SiteRegistry {
    /// Build the registry, rejecting sites without a name or with an unusable address
    pub fn new(sites: Vec<Site>) -> Result<Self> {
        for (index, site) in sites.iter().enumerate() {
            if site.name.trim().is_empty() {
                return Err(MonitorError::Config {
                    message: format!("Site #{} ({}) has no name", index + 1, site.address),
                });
            }

            site.endpoint().map_err(|e| MonitorError::Config {
                message: format!("Site {:?}: {}", site.name, e),
            })?;
        }

        let mut seen = std::collections::HashSet::new();
        for site in &sites {
            if !seen.insert(site.address.as_str()) {
                tracing::warn!(
                    "Address {} is listed more than once; each entry is checked independently",
                    site.address
                );
            }
        }

        Ok(Self { sites })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Site> {
        self.sites.iter()
    }

    /// Look up a site by name (first match)
    pub fn get(&self, name: &str) -> Option<&Site> {
        self.sites.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

impl<'a> IntoIterator for &'a SiteRegistry {
    type Item = &'a Site;
    type IntoIter = std::slice::Iter<'a, Site>;

    fn into_iter(self) -> Self::IntoIter {
        self.sites.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_keeps_order() {
        let registry = SiteRegistry::new(vec![
            Site::new("blog", "Blog", "https://blog.example.com"),
            Site::new("api", "API", "api.example.com:8443"),
            Site::new("shop", "", "https://shop.example.com"),
        ])
        .unwrap();

        let names: Vec<&str> = registry.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["blog", "api", "shop"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_registry_get() {
        let site = Site::new("blog", "Blog", "https://blog.example.com");
        let registry = SiteRegistry::new(vec![site]).unwrap();

        assert_eq!(registry.get("blog").unwrap().address, "https://blog.example.com");
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_registry_rejects_bad_address() {
        let site = Site::new("plain", "", "http://example.com");
        let err = SiteRegistry::new(vec![site]).unwrap_err();
        assert!(matches!(err, MonitorError::Config { .. }));
        assert!(err.to_string().contains("plain"));
    }

    #[test]
    fn test_registry_rejects_unnamed_site() {
        let err = SiteRegistry::new(vec![Site::new("  ", "", "https://example.com")]).unwrap_err();
        assert!(matches!(err, MonitorError::Config { .. }));
    }

    #[test]
    fn test_registry_allows_duplicates() {
        let registry = SiteRegistry::new(vec![
            Site::new("a", "", "https://example.com"),
            Site::new("b", "", "https://example.com"),
        ])
        .unwrap();

        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_site_endpoint() {
        let site = Site::new("api", "", "https://api.example.com:9443/status");
        let endpoint = site.endpoint().unwrap();
        assert_eq!(endpoint.hostname, "api.example.com");
        assert_eq!(endpoint.port, 9443);
    }
}

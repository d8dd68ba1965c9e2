//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::cache::OriginPattern;

/// Default cache name, used as the generation label prefix.
pub const DEFAULT_CACHE_NAME: &str = "map-cache";

/// Default generation version. Pinned, so a restart reopens the persisted
/// generation instead of starting a new one.
pub const DEFAULT_CACHE_VERSION: &str = "v1";

/// Default directory for persisted generations.
pub const DEFAULT_CACHE_DIR: &str = ".tile_cache";

/// Default capacity of a generation's store.
pub const DEFAULT_MAX_ITEMS: usize = 100;

/// Resources fetched into every new generation so the map works offline.
pub const DEFAULT_PRECACHE_URLS: &[&str] = &[
    "index.html",
    "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css",
    "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js",
];

/// Tile server and static asset CDN substrings eligible for caching.
pub const DEFAULT_CACHEABLE_PATTERNS: &[&str] = &["tile.openstreetmap.org", "unpkg.com/leaflet"];

/// Cache layer configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Generation label prefix
    pub cache_name: String,
    /// Generation version; combined with `cache_name` into the label
    pub cache_version: String,
    /// Maximum number of entries per generation store
    pub max_items: usize,
    /// Ordered list of URLs fetched at activation
    pub precache_urls: Vec<String>,
    /// URL patterns whose responses may be cached
    pub cacheable_patterns: Vec<OriginPattern>,
    /// Base URL that relative precache entries are resolved against
    pub origin: String,
    /// Abort activation on the first failed precache fetch
    pub strict_precache: bool,
    /// Write admitted responses from a spawned task instead of inline
    pub write_behind: bool,
    /// Network fetch timeout in seconds
    pub fetch_timeout: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Directory for persisted generations; `None` keeps everything in memory
    pub cache_dir: Option<PathBuf>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_NAME` - Generation label prefix (default: map-cache)
    /// - `CACHE_VERSION` - Generation version (default: v1)
    /// - `MAX_ITEMS` - Store capacity (default: 100)
    /// - `PRECACHE_URLS` - Comma-separated precache list
    /// - `CACHEABLE_PATTERNS` - Comma-separated URL substrings
    /// - `ORIGIN` - Base for relative precache URLs (default: http://localhost:8080/)
    /// - `STRICT_PRECACHE` - Abort activation on precache failure (default: false)
    /// - `WRITE_BEHIND` - Cache writes off the response path (default: true)
    /// - `FETCH_TIMEOUT` - Network timeout in seconds (default: 30)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_DIR` - Persistence directory, empty for memory only (default: .tile_cache)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from any variable source, falling back to defaults for
    /// missing or unparsable values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            cache_name: lookup("CACHE_NAME").unwrap_or(defaults.cache_name),
            cache_version: lookup("CACHE_VERSION").unwrap_or(defaults.cache_version),
            max_items: parse_value(lookup("MAX_ITEMS")).unwrap_or(defaults.max_items),
            precache_urls: split_list(lookup("PRECACHE_URLS")).unwrap_or(defaults.precache_urls),
            cacheable_patterns: split_list(lookup("CACHEABLE_PATTERNS"))
                .map(|patterns| patterns.into_iter().map(OriginPattern::Substring).collect())
                .unwrap_or(defaults.cacheable_patterns),
            origin: lookup("ORIGIN").unwrap_or(defaults.origin),
            strict_precache: parse_value(lookup("STRICT_PRECACHE"))
                .unwrap_or(defaults.strict_precache),
            write_behind: parse_value(lookup("WRITE_BEHIND")).unwrap_or(defaults.write_behind),
            fetch_timeout: parse_value(lookup("FETCH_TIMEOUT")).unwrap_or(defaults.fetch_timeout),
            server_port: parse_value(lookup("SERVER_PORT")).unwrap_or(defaults.server_port),
            cache_dir: match lookup("CACHE_DIR") {
                Some(dir) if dir.trim().is_empty() => None,
                Some(dir) => Some(PathBuf::from(dir.trim())),
                None => defaults.cache_dir,
            },
        }
    }

    /// Label of the generation this configuration activates.
    pub fn generation_label(&self) -> String {
        format!("{}-{}", self.cache_name, self.cache_version)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            cache_version: DEFAULT_CACHE_VERSION.to_string(),
            max_items: DEFAULT_MAX_ITEMS,
            precache_urls: DEFAULT_PRECACHE_URLS.iter().map(|s| s.to_string()).collect(),
            cacheable_patterns: DEFAULT_CACHEABLE_PATTERNS
                .iter()
                .map(|s| OriginPattern::Substring(s.to_string()))
                .collect(),
            origin: "http://localhost:8080/".to_string(),
            strict_precache: false,
            write_behind: true,
            fetch_timeout: 30,
            server_port: 3000,
            cache_dir: Some(PathBuf::from(DEFAULT_CACHE_DIR)),
        }
    }
}

fn parse_value<T: FromStr>(value: Option<String>) -> Option<T> {
    value.and_then(|v| v.trim().parse().ok())
}

fn split_list(value: Option<String>) -> Option<Vec<String>> {
    let items: Vec<String> = value?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.cache_name, "map-cache");
        assert_eq!(config.max_items, 100);
        assert_eq!(config.precache_urls.len(), 3);
        assert_eq!(config.cacheable_patterns.len(), 2);
        assert!(!config.strict_precache);
        assert!(config.write_behind);
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn test_generation_label() {
        let config = Config {
            cache_version: "v1".to_string(),
            ..Config::default()
        };
        assert_eq!(config.generation_label(), "map-cache-v1");
    }

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_config_from_lookup_defaults() {
        let config = Config::from_lookup(lookup_from(&[]));

        assert_eq!(config.cache_name, "map-cache");
        assert_eq!(config.cache_version, "v1");
        assert_eq!(config.max_items, 100);
        assert_eq!(config.precache_urls.len(), 3);
        assert_eq!(config.origin, "http://localhost:8080/");
        assert!(!config.strict_precache);
        assert!(config.write_behind);
        assert_eq!(config.fetch_timeout, 30);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cache_dir, Some(PathBuf::from(".tile_cache")));
    }

    #[test]
    fn test_config_from_lookup_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("CACHE_VERSION", "v7"),
            ("MAX_ITEMS", " 12 "),
            ("CACHEABLE_PATTERNS", "tiles.example,cdn.example"),
            ("STRICT_PRECACHE", "true"),
            ("WRITE_BEHIND", "false"),
            ("FETCH_TIMEOUT", "not-a-number"),
            ("CACHE_DIR", "/var/cache/tiles"),
        ]));

        assert_eq!(config.generation_label(), "map-cache-v7");
        assert_eq!(config.max_items, 12);
        assert_eq!(
            config.cacheable_patterns,
            vec![
                OriginPattern::Substring("tiles.example".to_string()),
                OriginPattern::Substring("cdn.example".to_string()),
            ]
        );
        assert!(config.strict_precache);
        assert!(!config.write_behind);
        assert_eq!(config.fetch_timeout, 30);
        assert_eq!(config.cache_dir, Some(PathBuf::from("/var/cache/tiles")));
    }

    #[test]
    fn test_empty_cache_dir_means_memory_only() {
        let config = Config::from_lookup(lookup_from(&[("CACHE_DIR", " ")]));
        assert_eq!(config.cache_dir, None);
    }

    #[test]
    fn test_split_list_ignores_blank_items() {
        assert_eq!(
            split_list(Some(" a.example ,, b.example ,".to_string())),
            Some(vec!["a.example".to_string(), "b.example".to_string()])
        );
        assert_eq!(split_list(Some(" , ".to_string())), None);
        assert_eq!(split_list(None), None);
    }
}

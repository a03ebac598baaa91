//! Catalog loading and snapshot publication.
//!
//! The live catalog is an immutable [`CatalogSnapshot`] behind an
//! [`ArcSwap`]. Reloading builds a complete new snapshot and swaps the
//! pointer; readers holding the previous `Arc` keep a consistent view.

use crate::types::{Catalog, Descriptor};
use arc_swap::ArcSwap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Default catalog file name, resolved against the working directory
pub const DEFAULT_CATALOG_PATH: &str = "mcp.json";

/// Built-in descriptors used when no catalog file is available
pub fn default_catalog() -> Catalog {
    Catalog::new()
        .with_entry(
            "weather",
            Descriptor::new(
                "Weather MCP",
                "Provides weather information for locations",
                ["getWeather", "getForecast"],
            ),
        )
        .with_entry(
            "todo",
            Descriptor::new(
                "Todo MCP",
                "Manages todo items and task lists",
                ["addTask", "listTasks", "completeTask"],
            ),
        )
        .with_entry(
            "calendar",
            Descriptor::new(
                "Calendar MCP",
                "Manages calendar events and appointments",
                ["addEvent", "listEvents", "getAvailability"],
            ),
        )
}

/// Result of [`load`]
#[derive(Debug, Clone)]
pub struct CatalogLoad {
    pub catalog: Catalog,
    /// Whether the external file was read and merged
    pub loaded: bool,
}

/// Load the catalog file at `path` on top of the built-in defaults.
///
/// Never fails: a missing or malformed file yields the defaults with
/// `loaded == false`.
pub fn load(path: impl AsRef<Path>) -> CatalogLoad {
    let path = path.as_ref();
    tracing::info!("Loading MCP catalog from {}", path.display());

    if !path.exists() {
        let catalog = default_catalog();
        tracing::warn!(
            "Catalog file not found at {}, using {} default MCPs",
            path.display(),
            catalog.len()
        );
        return CatalogLoad {
            catalog,
            loaded: false,
        };
    }

    match read_catalog_file(path) {
        Ok(external) => {
            let from_file = external.len();
            let catalog = default_catalog().overlay(external);
            tracing::info!(
                from_file,
                total = catalog.len(),
                "Loaded MCP catalog from {}",
                path.display()
            );
            tracing::debug!(
                "Available MCP ids: {}",
                catalog.ids().collect::<Vec<_>>().join(", ")
            );
            CatalogLoad {
                catalog,
                loaded: true,
            }
        }
        Err(e) => {
            let catalog = default_catalog();
            tracing::warn!(
                error = %e,
                "Failed to load catalog from {}, using {} default MCPs",
                path.display(),
                catalog.len()
            );
            CatalogLoad {
                catalog,
                loaded: false,
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum CatalogFileError {
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn read_catalog_file(path: &Path) -> Result<Catalog, CatalogFileError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// One published generation of the catalog
#[derive(Debug)]
pub struct CatalogSnapshot {
    pub generation: u64,
    pub catalog: Catalog,
}

impl CatalogSnapshot {
    pub fn new(generation: u64, catalog: Catalog) -> Self {
        Self {
            generation,
            catalog,
        }
    }
}

/// Process-wide owner of the current catalog snapshot
pub struct CatalogStore {
    current: ArcSwap<CatalogSnapshot>,
    next_generation: AtomicU64,
}

impl CatalogStore {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            current: ArcSwap::from_pointee(CatalogSnapshot::new(0, catalog)),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Store seeded from [`load`]
    pub fn load(path: impl AsRef<Path>) -> (Self, bool) {
        let CatalogLoad { catalog, loaded } = load(path);
        (Self::new(catalog), loaded)
    }

    /// The snapshot a request should use from start to finish
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.current.load_full()
    }

    /// Replace the catalog wholesale under a fresh generation
    pub fn publish(&self, catalog: Catalog) -> Arc<CatalogSnapshot> {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        let snapshot = Arc::new(CatalogSnapshot::new(generation, catalog));
        self.current.store(snapshot.clone());
        tracing::info!(
            generation,
            entries = snapshot.catalog.len(),
            "Published catalog snapshot"
        );
        snapshot
    }

    /// Re-run the loader and publish its result
    pub fn reload(&self, path: impl AsRef<Path>) -> bool {
        let CatalogLoad { catalog, loaded } = load(path);
        self.publish(catalog);
        loaded
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new(default_catalog())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_catalog(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("mcp.json");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let result = load(temp_dir.path().join("does-not-exist.json"));

        assert!(!result.loaded);
        assert_eq!(result.catalog, default_catalog());
    }

    #[test]
    fn test_external_entries_override_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_catalog(
            &temp_dir,
            r#"{
                "weather": {"name": "Storm MCP", "description": "Severe weather alerts", "functions": ["getAlerts"]},
                "search": {"name": "Search MCP", "description": "Web search", "functions": ["search"]}
            }"#,
        );

        let result = load(&path);
        assert!(result.loaded);

        let weather = result.catalog.get("weather").unwrap();
        assert_eq!(weather.name, "Storm MCP");
        assert_eq!(weather.functions, vec!["getAlerts"]);

        // Untouched defaults keep their values
        let defaults = default_catalog();
        assert_eq!(result.catalog.get("todo"), defaults.get("todo"));
        assert_eq!(result.catalog.get("calendar"), defaults.get("calendar"));

        let ids: Vec<&str> = result.catalog.ids().collect();
        assert_eq!(ids, vec!["weather", "todo", "calendar", "search"]);
    }

    #[test]
    fn test_malformed_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_catalog(&temp_dir, "{ not json");

        let result = load(&path);
        assert!(!result.loaded);
        assert_eq!(result.catalog, default_catalog());
    }

    #[test]
    fn test_non_object_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_catalog(&temp_dir, r#"["weather", "todo"]"#);

        let result = load(&path);
        assert!(!result.loaded);
        assert_eq!(result.catalog.len(), 3);
    }

    #[test]
    fn test_publish_bumps_generation_and_keeps_old_snapshot() {
        let store = CatalogStore::default();
        let before = store.snapshot();
        assert_eq!(before.generation, 0);

        let replacement = Catalog::new().with_entry(
            "only",
            Descriptor::new("Only MCP", "The only entry", ["run"]),
        );
        store.publish(replacement);

        let after = store.snapshot();
        assert_eq!(after.generation, 1);
        assert_eq!(after.catalog.len(), 1);

        // A request holding the old snapshot still sees the full old catalog
        assert_eq!(before.catalog.len(), 3);
        assert!(before.catalog.contains("weather"));
    }

    #[test]
    fn test_reload_reports_load_status() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_catalog(
            &temp_dir,
            r#"{"notes": {"name": "Notes MCP", "description": "Notes", "functions": []}}"#,
        );

        let (store, loaded) = CatalogStore::load(temp_dir.path().join("missing.json"));
        assert!(!loaded);
        assert!(!store.snapshot().catalog.contains("notes"));

        assert!(store.reload(&path));
        let snapshot = store.snapshot();
        assert!(snapshot.catalog.contains("notes"));
        assert_eq!(snapshot.generation, 1);
    }
}

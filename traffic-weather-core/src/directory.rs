use anyhow::{Context, Result};
use indexmap::IndexMap;
use std::{fs, path::Path};
use tracing::debug;

use crate::model::DeviceRecord;

/// Read access to the store of device records.
///
/// An unknown id is not an error: `find_by_id` returns `None`.
#[cfg_attr(test, mockall::automock)]
pub trait DeviceDirectory: Send + Sync {
    fn list_all(&self) -> Vec<DeviceRecord>;

    fn find_by_id(&self, id: &str) -> Option<DeviceRecord>;
}

/// Directory held in memory, in insertion order. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDeviceDirectory {
    devices: IndexMap<String, DeviceRecord>,
}

impl InMemoryDeviceDirectory {
    /// Later records replace earlier ones with the same id, keeping the first position.
    pub fn new(records: impl IntoIterator<Item = DeviceRecord>) -> Self {
        let devices = records.into_iter().map(|r| (r.id.clone(), r)).collect();
        Self { devices }
    }

    /// Load a JSON array of device records.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read devices file: {}", path.display()))?;

        let records: Vec<DeviceRecord> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse devices file: {}", path.display()))?;

        let directory = Self::new(records);
        debug!(count = directory.len(), path = %path.display(), "Loaded device directory");
        Ok(directory)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl DeviceDirectory for InMemoryDeviceDirectory {
    fn list_all(&self) -> Vec<DeviceRecord> {
        self.devices.values().cloned().collect()
    }

    fn find_by_id(&self, id: &str) -> Option<DeviceRecord> {
        self.devices.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn record(id: &str, lat: f64) -> DeviceRecord {
        DeviceRecord {
            id: id.to_string(),
            last_heartbeat: "2024-05-01T12:00:00Z".parse().unwrap(),
            longitude: 20.0,
            latitude: lat,
            height: 1.0,
            enabled: true,
            connected: true,
        }
    }

    #[test]
    fn find_by_id_is_exact_match() {
        let dir = InMemoryDeviceDirectory::new(vec![record("dev-1", 10.0)]);

        assert_eq!(dir.find_by_id("dev-1").map(|r| r.id), Some("dev-1".to_string()));
        assert!(dir.find_by_id("DEV-1").is_none());
        assert!(dir.find_by_id("dev-").is_none());
        assert!(dir.find_by_id("").is_none());
    }

    #[test]
    fn list_all_keeps_insertion_order() {
        let dir = InMemoryDeviceDirectory::new(vec![
            record("b", 1.0),
            record("a", 2.0),
            record("c", 3.0),
        ]);

        let ids: Vec<_> = dir.list_all().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, ["b", "a", "c"]);
    }

    #[test]
    fn duplicate_id_replaces_earlier_record() {
        let dir = InMemoryDeviceDirectory::new(vec![
            record("a", 1.0),
            record("b", 2.0),
            record("a", 9.0),
        ]);

        assert_eq!(dir.len(), 2);
        assert_eq!(dir.find_by_id("a").unwrap().latitude, 9.0);
        assert_eq!(dir.list_all()[0].id, "a");
    }

    #[test]
    fn loads_records_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id":"dev-1","last_heartbeat":"2024-05-01T12:00:00Z","longitude":20.0,
                 "latitude":10.0,"height":2.0,"enabled":true,"connected":false}}]"#
        )
        .unwrap();

        let dir = InMemoryDeviceDirectory::from_json_file(file.path()).unwrap();

        let dev = dir.find_by_id("dev-1").expect("device loaded");
        assert_eq!(dev.latitude, 10.0);
        assert!(!dev.connected);
    }

    #[test]
    fn empty_array_is_an_empty_directory() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[]").unwrap();

        let dir = InMemoryDeviceDirectory::from_json_file(file.path()).unwrap();
        assert!(dir.is_empty());
        assert!(dir.list_all().is_empty());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = InMemoryDeviceDirectory::from_json_file(Path::new("/nonexistent/devices.json"))
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read devices file"));
    }
}

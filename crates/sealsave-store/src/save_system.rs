use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::join_all;
use sealsave_core::{Record, SaveError};
use sealsave_crypto::KeyManager;
use sealsave_serializer::{Serializer, SerializerRegistry, CONFIGURABLE_JSON};
use tracing::{error, info, instrument};

use crate::{
    paths,
    report::{BatchItem, BatchReport},
};

/// Persistence facade: owns the key context and the serializer registry.
///
/// Every operation takes an optional format id; `None` selects the default
/// format (`json-config` unless overridden).
pub struct SaveSystem {
    root: PathBuf,
    keys: KeyManager,
    registry: SerializerRegistry,
    default_format: String,
}

impl SaveSystem {
    /// Facade over `root` with the built-in formats registered.
    pub fn new(root: impl Into<PathBuf>, keys: KeyManager) -> Self {
        Self {
            root: root.into(),
            keys,
            registry: SerializerRegistry::with_builtin(),
            default_format: CONFIGURABLE_JSON.to_string(),
        }
    }

    pub fn with_registry(mut self, registry: SerializerRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_default_format(mut self, format_id: impl Into<String>) -> Self {
        self.default_format = format_id.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn keys(&self) -> &KeyManager {
        &self.keys
    }

    pub fn registry(&self) -> &SerializerRegistry {
        &self.registry
    }

    pub fn default_format(&self) -> &str {
        &self.default_format
    }

    /// Path a single save under `file_name` is written to.
    pub fn path_for(&self, file_name: &str) -> Result<PathBuf, SaveError> {
        paths::file_path(&self.root, file_name)
    }

    /// Path of the batch entry for `record_name` under `base_name`.
    pub fn item_path_for(&self, base_name: &str, record_name: &str) -> Result<PathBuf, SaveError> {
        paths::item_path(&self.root, base_name, record_name)
    }

    fn serializer(&self, format: Option<&str>) -> Result<Arc<dyn Serializer>, SaveError> {
        self.registry.resolve(format.unwrap_or(&self.default_format))
    }

    fn prepare(
        &self,
        file_name: &str,
        format: Option<&str>,
    ) -> Result<(Arc<dyn Serializer>, PathBuf), SaveError> {
        let serializer = self.serializer(format)?;
        let path = self
            .path_for(file_name)
            .inspect_err(|err| error!("{err}"))?;
        Ok((serializer, path))
    }

    /// Encrypt and write `record` to `{file_name}.dat`, overwriting.
    #[instrument(skip_all, fields(file_name = %file_name, format = ?format))]
    pub fn save<R: Record>(
        &self,
        record: &R,
        file_name: &str,
        format: Option<&str>,
    ) -> Result<(), SaveError> {
        let (serializer, path) = self.prepare(file_name, format)?;
        serializer.serialize(&self.keys, record, &path)
    }

    /// Populate `record` in place from `{file_name}.dat`.
    ///
    /// A missing file is logged and reported as `NotFound`; the record is
    /// left untouched.
    #[instrument(skip_all, fields(file_name = %file_name, format = ?format))]
    pub fn load<R: Record>(
        &self,
        record: &mut R,
        file_name: &str,
        format: Option<&str>,
    ) -> Result<(), SaveError> {
        let (serializer, path) = self.prepare(file_name, format)?;
        serializer.deserialize(&self.keys, record, &path)
    }

    #[instrument(skip_all, fields(file_name = %file_name, format = ?format))]
    pub async fn save_async<R: Record>(
        &self,
        record: &R,
        file_name: &str,
        format: Option<&str>,
    ) -> Result<(), SaveError> {
        let (serializer, path) = self.prepare(file_name, format)?;
        serializer.serialize_async(&self.keys, record, &path).await
    }

    #[instrument(skip_all, fields(file_name = %file_name, format = ?format))]
    pub async fn load_async<R: Record>(
        &self,
        record: &mut R,
        file_name: &str,
        format: Option<&str>,
    ) -> Result<(), SaveError> {
        let (serializer, path) = self.prepare(file_name, format)?;
        serializer
            .deserialize_async(&self.keys, record, &path)
            .await
    }

    /// Decrypted JSON of `{file_name}.dat`, for inspection.
    #[instrument(skip_all, fields(file_name = %file_name, format = ?format))]
    pub fn load_to_string(&self, file_name: &str, format: Option<&str>) -> Result<String, SaveError> {
        let (serializer, path) = self.prepare(file_name, format)?;
        serializer.deserialize_to_string(&self.keys, &path)
    }

    /// Save each record to `{base_name}_{record.name()}.dat`.
    ///
    /// Failures are per record; only an empty batch, a bad base name or an
    /// unknown format abort the whole call.
    #[instrument(skip_all, fields(base_name = %base_name, count = records.len()))]
    pub fn save_all<R: Record>(
        &self,
        records: &[R],
        base_name: &str,
        format: Option<&str>,
    ) -> Result<BatchReport, SaveError> {
        let serializer = self.prepare_batch(records.len(), base_name, format)?;
        let items = records
            .iter()
            .map(|record| {
                let result = self
                    .item_path_for(base_name, record.name())
                    .and_then(|path| serializer.serialize(&self.keys, record, &path));
                self.finish_item(record.name(), result)
            })
            .collect();
        Ok(self.summarize("saved", items))
    }

    #[instrument(skip_all, fields(base_name = %base_name, count = records.len()))]
    pub fn load_all<R: Record>(
        &self,
        records: &mut [R],
        base_name: &str,
        format: Option<&str>,
    ) -> Result<BatchReport, SaveError> {
        let serializer = self.prepare_batch(records.len(), base_name, format)?;
        let items = records
            .iter_mut()
            .map(|record| {
                let name = record.name().to_string();
                let result = self
                    .item_path_for(base_name, &name)
                    .and_then(|path| serializer.deserialize(&self.keys, record, &path));
                self.finish_item(&name, result)
            })
            .collect();
        Ok(self.summarize("loaded", items))
    }

    /// Concurrent batch save: every write is started before any is awaited,
    /// and a failing record never cancels its siblings.
    #[instrument(skip_all, fields(base_name = %base_name, count = records.len()))]
    pub async fn save_all_async<R: Record>(
        &self,
        records: &[R],
        base_name: &str,
        format: Option<&str>,
    ) -> Result<BatchReport, SaveError> {
        let serializer = self.prepare_batch(records.len(), base_name, format)?;
        let tasks = records.iter().map(|record| {
            let serializer = Arc::clone(&serializer);
            async move {
                let result = match self.item_path_for(base_name, record.name()) {
                    Ok(path) => serializer.serialize_async(&self.keys, record, &path).await,
                    Err(err) => Err(err),
                };
                self.finish_item(record.name(), result)
            }
        });
        let items = join_all(tasks).await;
        Ok(self.summarize("saved", items))
    }

    #[instrument(skip_all, fields(base_name = %base_name, count = records.len()))]
    pub async fn load_all_async<R: Record>(
        &self,
        records: &mut [R],
        base_name: &str,
        format: Option<&str>,
    ) -> Result<BatchReport, SaveError> {
        let serializer = self.prepare_batch(records.len(), base_name, format)?;
        let tasks = records.iter_mut().map(|record| {
            let serializer = Arc::clone(&serializer);
            async move {
                let name = record.name().to_string();
                let result = match self.item_path_for(base_name, &name) {
                    Ok(path) => {
                        serializer
                            .deserialize_async(&self.keys, record, &path)
                            .await
                    }
                    Err(err) => Err(err),
                };
                self.finish_item(&name, result)
            }
        });
        let items = join_all(tasks).await;
        Ok(self.summarize("loaded", items))
    }

    /// Decrypted JSON for each `{base_name}_{name}.dat`.
    #[instrument(skip_all, fields(base_name = %base_name, count = record_names.len()))]
    pub fn load_all_to_string<S: AsRef<str>>(
        &self,
        record_names: &[S],
        base_name: &str,
        format: Option<&str>,
    ) -> Result<BatchReport<String>, SaveError> {
        let serializer = self.prepare_batch(record_names.len(), base_name, format)?;
        let items = record_names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                let result = self
                    .item_path_for(base_name, name)
                    .and_then(|path| serializer.deserialize_to_string(&self.keys, &path));
                self.finish_item(name, result)
            })
            .collect();
        Ok(self.summarize("read", items))
    }

    fn prepare_batch(
        &self,
        len: usize,
        base_name: &str,
        format: Option<&str>,
    ) -> Result<Arc<dyn Serializer>, SaveError> {
        if len == 0 {
            let err = SaveError::validation("record list is empty");
            error!("{err}");
            return Err(err);
        }
        let serializer = self.serializer(format)?;
        // Validates the base name once so a bad one fails the whole call.
        paths::file_path(&self.root, base_name).inspect_err(|err| error!("{err}"))?;
        Ok(serializer)
    }

    fn finish_item<T>(&self, name: &str, result: Result<T, SaveError>) -> BatchItem<T> {
        if let Err(err) = &result {
            error!(record = name, "batch item skipped: {err}");
        }
        BatchItem {
            name: name.to_string(),
            result,
        }
    }

    fn summarize<T>(&self, verb: &str, items: Vec<BatchItem<T>>) -> BatchReport<T> {
        let report = BatchReport::new(items);
        info!(
            "{verb} {} of {} records",
            report.success_count(),
            report.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sealsave_core::{InMemoryKeyStore, KeyError, KeyStore};
    use sealsave_serializer::{BINARY_JSON, STRUCTURAL_JSON};
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct PlayerStats {
        name: String,
        health: i32,
        experience: i32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    }

    impl Record for PlayerStats {
        fn name(&self) -> &str {
            &self.name
        }
    }

    fn stats(name: &str, health: i32) -> PlayerStats {
        PlayerStats {
            name: name.into(),
            health,
            experience: health * 10,
            title: None,
        }
    }

    fn system(root: &Path) -> SaveSystem {
        let keys = KeyManager::new(Arc::new(InMemoryKeyStore::new()));
        keys.initialize(None).expect("init keys");
        SaveSystem::new(root, keys)
    }

    #[test]
    fn save_writes_base64_without_plaintext_and_reloads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let saves = system(dir.path());

        saves
            .save(&stats("Hero", 100), "stats", None)
            .expect("save");

        let path = dir.path().join("stats.dat");
        let stored = std::fs::read_to_string(&path).expect("stats.dat exists");
        assert!(!stored.contains("Hero"));
        assert!(!stored.is_empty());

        let mut fresh = PlayerStats::default();
        saves.load(&mut fresh, "stats", None).expect("load");
        assert_eq!(fresh.health, 100);
        assert_eq!(fresh.experience, 1000);
    }

    #[test]
    fn every_builtin_format_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let saves = system(dir.path());
        let mut original = stats("Mage", 42);
        original.title = Some("Archmage".into());

        for format in [CONFIGURABLE_JSON, STRUCTURAL_JSON, BINARY_JSON] {
            let file = format!("slot-{format}");
            saves.save(&original, &file, Some(format)).expect("save");
            let mut loaded = PlayerStats {
                name: "Mage".into(),
                ..PlayerStats::default()
            };
            saves.load(&mut loaded, &file, Some(format)).expect("load");
            assert_eq!(loaded, original, "format {format}");
        }
    }

    #[test]
    fn load_missing_file_reports_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let saves = system(dir.path());
        let mut record = stats("Hero", 5);

        let err = saves
            .load(&mut record, "never-saved", None)
            .expect_err("missing");
        assert!(err.is_not_found());
        assert_eq!(record, stats("Hero", 5));
    }

    #[test]
    fn unknown_format_is_not_substituted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let saves = system(dir.path());

        let err = saves
            .save(&stats("Hero", 1), "stats", Some("xml"))
            .expect_err("xml");
        assert!(matches!(err, SaveError::UnsupportedFormat { .. }));
        assert!(!dir.path().join("stats.dat").exists());
    }

    #[test]
    fn invalid_file_name_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let saves = system(dir.path());
        let err = saves
            .save(&stats("Hero", 1), "../escape", None)
            .expect_err("bad name");
        assert!(matches!(err, SaveError::Validation { .. }));
    }

    #[test]
    fn save_overwrites_previous_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let saves = system(dir.path());
        saves.save(&stats("Hero", 1), "stats", None).expect("first");
        saves.save(&stats("Hero", 2), "stats", None).expect("second");

        let mut loaded = PlayerStats::default();
        saves.load(&mut loaded, "stats", None).expect("load");
        assert_eq!(loaded.health, 2);
    }

    #[test]
    fn load_to_string_exposes_decrypted_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let saves = system(dir.path());
        saves.save(&stats("Hero", 77), "stats", None).expect("save");

        let json = saves.load_to_string("stats", None).expect("to string");
        let value: serde_json::Value = serde_json::from_str(&json).expect("json");
        assert_eq!(value["health"], 77);
        assert!(value.get("name").is_none(), "name is excluded by default");
    }

    #[test]
    fn custom_default_format_is_used() {
        let dir = tempfile::tempdir().expect("tempdir");
        let saves = system(dir.path()).with_default_format(STRUCTURAL_JSON);
        assert_eq!(saves.default_format(), STRUCTURAL_JSON);
        saves.save(&stats("Hero", 3), "stats", None).expect("save");

        let json = saves
            .load_to_string("stats", Some(STRUCTURAL_JSON))
            .expect("to string");
        assert!(json.contains("\"name\": \"Hero\""));
    }

    #[test]
    fn save_fails_fast_after_key_reset() {
        let dir = tempfile::tempdir().expect("tempdir");
        let saves = system(dir.path());
        saves.keys().reset_keys().expect("reset");

        let err = saves
            .save(&stats("Hero", 1), "stats", None)
            .expect_err("no keys");
        assert!(matches!(err, SaveError::Key(KeyError::Uninitialized)));
    }

    #[test]
    fn data_survives_a_restart_with_the_same_key_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let key_store = InMemoryKeyStore::new();

        let first_keys = KeyManager::new(Arc::new(key_store.clone()));
        first_keys.initialize(None).expect("init");
        SaveSystem::new(dir.path(), first_keys)
            .save(&stats("Hero", 55), "stats", None)
            .expect("save");

        let restarted = KeyManager::new(Arc::new(key_store.clone()));
        restarted.initialize(None).expect("re-init");
        assert!(key_store.load_key().is_some());
        let mut loaded = PlayerStats::default();
        SaveSystem::new(dir.path(), restarted)
            .load(&mut loaded, "stats", None)
            .expect("load after restart");
        assert_eq!(loaded.health, 55);
    }

    #[test]
    fn batch_load_skips_missing_item() {
        let dir = tempfile::tempdir().expect("tempdir");
        let saves = system(dir.path());
        let party = vec![stats("knight", 120), stats("mage", 60), stats("rogue", 80)];

        let report = saves.save_all(&party, "party", None).expect("save all");
        assert!(report.is_complete());
        assert!(dir.path().join("party_mage.dat").exists());

        std::fs::remove_file(dir.path().join("party_mage.dat")).expect("delete mage");

        let mut loaded: Vec<PlayerStats> = ["knight", "mage", "rogue"]
            .into_iter()
            .map(|name| stats(name, 0))
            .collect();
        let report = saves.load_all(&mut loaded, "party", None).expect("load all");

        assert_eq!(report.len(), 3);
        assert_eq!(report.success_count(), 2);
        let failed: Vec<_> = report.failed().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, "mage");
        assert!(failed[0].1.is_not_found());

        assert_eq!(loaded[0].health, 120);
        assert_eq!(loaded[1].health, 0);
        assert_eq!(loaded[2].health, 80);
    }

    #[test]
    fn empty_batch_is_a_validation_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let saves = system(dir.path());
        let err = saves
            .save_all::<PlayerStats>(&[], "party", None)
            .expect_err("empty batch");
        assert!(matches!(err, SaveError::Validation { .. }));
    }

    #[test]
    fn batch_item_with_bad_name_does_not_abort_siblings() {
        let dir = tempfile::tempdir().expect("tempdir");
        let saves = system(dir.path());
        let party = vec![stats("knight", 1), stats("", 2), stats("rogue", 3)];

        let report = saves.save_all(&party, "party", None).expect("save all");
        assert_eq!(report.success_count(), 2);
        assert!(dir.path().join("party_knight.dat").exists());
        assert!(dir.path().join("party_rogue.dat").exists());
    }

    #[test]
    fn load_all_to_string_reports_each_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let saves = system(dir.path());
        let party = vec![stats("knight", 9), stats("rogue", 4)];
        saves.save_all(&party, "party", None).expect("save all");

        let report = saves
            .load_all_to_string(&["knight", "bard", "rogue"], "party", None)
            .expect("to string");
        assert_eq!(report.success_count(), 2);
        let knight = report.items()[0].result.as_ref().expect("knight json");
        assert!(knight.contains("\"health\": 9"));
        assert!(report.items()[1]
            .result
            .as_ref()
            .is_err_and(SaveError::is_not_found));
    }

    #[tokio::test]
    async fn async_single_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let saves = system(dir.path());

        saves
            .save_async(&stats("Hero", 100), "stats", None)
            .await
            .expect("save async");
        let mut fresh = PlayerStats::default();
        saves
            .load_async(&mut fresh, "stats", None)
            .await
            .expect("load async");
        assert_eq!(fresh.health, 100);
    }

    #[tokio::test]
    async fn async_batch_collects_partial_failures() {
        let dir = tempfile::tempdir().expect("tempdir");
        let saves = system(dir.path());
        let party: Vec<PlayerStats> = (1..=5).map(|i| stats(&format!("unit{i}"), i)).collect();

        let report = saves
            .save_all_async(&party, "army", Some(BINARY_JSON))
            .await
            .expect("save all async");
        assert!(report.is_complete());

        std::fs::remove_file(dir.path().join("army_unit3.dat")).expect("delete unit3");

        let mut loaded: Vec<PlayerStats> =
            (1..=5).map(|i| stats(&format!("unit{i}"), 0)).collect();
        let report = saves
            .load_all_async(&mut loaded, "army", Some(BINARY_JSON))
            .await
            .expect("load all async");

        assert_eq!(report.success_count(), 4);
        let names: Vec<_> = report.items().iter().map(|item| item.name.as_str()).collect();
        assert_eq!(names, vec!["unit1", "unit2", "unit3", "unit4", "unit5"]);
        assert!(report.items()[2]
            .result
            .as_ref()
            .is_err_and(SaveError::is_not_found));
        assert_eq!(loaded[0].health, 1);
        assert_eq!(loaded[2].health, 0);
        assert_eq!(loaded[4].health, 5);
    }
}

// File-backed guild configuration store
// The whole table is rewritten after every mutation

use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::NamedTempFile;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::models::guild::{ConfigError, ConfigField, ConfigUpdate, GuildConfig};

/// Guild ID -> config
pub type ConfigTable = BTreeMap<u64, GuildConfig>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Owns the in-memory config table and its file mirror.
///
/// Every mutation holds the write lock across mutate + save, so concurrent
/// updates for different guilds never lose each other's writes.
pub struct ConfigStore {
    path: PathBuf,
    table: RwLock<ConfigTable>,
}

impl ConfigStore {
    /// Load the table from `path`. Never fails: a missing or corrupt file
    /// yields an empty table.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let table = Self::load(&path).await;
        info!(path = ?path, guilds = table.len(), "Guild configs loaded");
        Self {
            path,
            table: RwLock::new(table),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read durable storage
    pub async fn load(path: &Path) -> ConfigTable {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = ?path, "No config file yet, starting empty");
                return ConfigTable::new();
            }
            Err(e) => {
                warn!(path = ?path, "Failed to read config file, using defaults: {:?}", e);
                return ConfigTable::new();
            }
        };

        // Keys must be numeric; entries are rebuilt one field at a time
        let raw = match serde_json::from_str::<BTreeMap<u64, Value>>(&content) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = ?path, "Config file is malformed, using defaults: {}", e);
                return ConfigTable::new();
            }
        };

        raw.into_iter()
            .map(|(guild_id, entry)| {
                let (config, rejected) = GuildConfig::from_stored(&entry);
                for field in rejected {
                    warn!(
                        guild_id,
                        %field,
                        value = %entry.get(field.key()).unwrap_or(&entry),
                        "Stored config value invalid, using default"
                    );
                }
                (guild_id, config)
            })
            .collect()
    }

    /// Serialize `table` to `path` atomically. Each save writes its own
    /// uniquely named temp file next to `path`, so concurrent saves to the
    /// same path never share one and a failed save leaves nothing behind.
    pub async fn save_to(path: &Path, table: &ConfigTable) -> Result<(), StoreError> {
        let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent).await?;
                parent.to_path_buf()
            }
            None => PathBuf::from("."),
        };

        let json = serde_json::to_string_pretty(table)?;
        let path = path.to_path_buf();

        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut tmp = NamedTempFile::new_in(&dir)?;
            tmp.write_all(json.as_bytes())?;
            tmp.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(std::io::Error::other)??;
        Ok(())
    }

    /// Save and report failure without touching in-memory state
    async fn persist(&self, table: &ConfigTable) {
        match Self::save_to(&self.path, table).await {
            Ok(()) => debug!(path = ?self.path, guilds = table.len(), "Guild configs saved"),
            Err(e) => warn!(path = ?self.path, "Failed to save guild configs: {}", e),
        }
    }

    /// Return the guild's config, creating and persisting defaults on first access
    pub async fn get_or_create(&self, guild_id: u64) -> GuildConfig {
        if let Some(config) = self.table.read().await.get(&guild_id) {
            return config.clone();
        }

        let mut table = self.table.write().await;
        if let Some(config) = table.get(&guild_id) {
            return config.clone();
        }

        let config = GuildConfig::default();
        table.insert(guild_id, config.clone());
        info!(guild_id, "Created default welcome config");
        self.persist(&table).await;
        config
    }

    /// Apply one field change and persist before returning
    pub async fn update(&self, guild_id: u64, update: ConfigUpdate) -> GuildConfig {
        let field = update.field();
        let mut table = self.table.write().await;
        let config = table.entry(guild_id).or_default();
        config.apply(update);
        let updated = config.clone();

        info!(guild_id, %field, "Updated welcome config");
        self.persist(&table).await;
        updated
    }

    /// Parse raw user input for `field` and apply it. Invalid input leaves
    /// the stored config untouched.
    pub async fn set_field(
        &self,
        guild_id: u64,
        field: ConfigField,
        raw: &str,
    ) -> Result<GuildConfig, ConfigError> {
        let update = ConfigUpdate::parse(field, raw)?;
        Ok(self.update(guild_id, update).await)
    }

    /// Drop the guild's entry; the next access recreates defaults.
    /// Returns whether an entry existed.
    pub async fn reset(&self, guild_id: u64) -> bool {
        let mut table = self.table.write().await;
        let existed = table.remove(&guild_id).is_some();
        info!(guild_id, existed, "Reset welcome config");
        self.persist(&table).await;
        existed
    }

    /// Write the current table to `<prefix>_<YYYYMMDD_HHMMSS>.json`.
    /// The primary file is not touched.
    pub async fn backup(&self, prefix: &str) -> Result<PathBuf, StoreError> {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = PathBuf::from(format!("{}_{}.json", prefix, timestamp));

        let table = self.table.read().await;
        Self::save_to(&path, &table).await?;
        info!(path = ?path, guilds = table.len(), "Guild config backup written");
        Ok(path)
    }

    /// Write the table out, e.g. on shutdown
    pub async fn flush(&self) -> Result<(), StoreError> {
        let table = self.table.read().await;
        Self::save_to(&self.path, &table).await
    }

    #[cfg(test)]
    pub async fn snapshot(&self) -> ConfigTable {
        self.table.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::guild::{EmbedColor, DEFAULT_EMBED_COLOR, DEFAULT_WELCOME_MESSAGE};
    use std::sync::Arc;

    fn store_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("guild_configs.json")
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::open(store_path(&dir)).await;
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_malformed_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(&dir);
        std::fs::write(&path, "{ not json").unwrap();
        assert!(ConfigStore::load(&path).await.is_empty());

        std::fs::write(&path, r#"{ "abc": {} }"#).unwrap();
        assert!(ConfigStore::load(&path).await.is_empty());
    }

    #[tokio::test]
    async fn test_get_or_create_persists_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(&dir);
        let store = ConfigStore::open(&path).await;

        let config = store.get_or_create(123).await;
        assert_eq!(config, GuildConfig::default());

        let loaded = ConfigStore::load(&path).await;
        assert_eq!(loaded.get(&123), Some(&GuildConfig::default()));
    }

    #[tokio::test]
    async fn test_keys_stored_as_decimal_strings() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(&dir);
        let store = ConfigStore::open(&path).await;
        store.get_or_create(987654321012345678).await;

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let entry = &raw["987654321012345678"];
        assert_eq!(entry["embed_color"], 0x00ff00);
        assert!(entry["welcome_channel"].is_null());
        assert_eq!(entry["dm_welcome"], false);
    }

    #[tokio::test]
    async fn test_update_is_field_independent() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::open(store_path(&dir)).await;

        store.update(1, ConfigUpdate::WelcomeChannel(Some(555))).await;
        store
            .update(1, ConfigUpdate::DmMessage("Hello there".into()))
            .await;

        let config = store.get_or_create(1).await;
        assert_eq!(
            config,
            GuildConfig {
                welcome_channel: Some(555),
                dm_message: "Hello there".into(),
                ..GuildConfig::default()
            }
        );
    }

    #[tokio::test]
    async fn test_set_field_color() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::open(store_path(&dir)).await;

        let err = store.set_field(7, ConfigField::EmbedColor, "zz0000").await;
        assert!(matches!(err, Err(ConfigError::InvalidColor(_))));
        assert_eq!(store.get_or_create(7).await.embed_color, 0x00ff00);

        let config = store
            .set_field(7, ConfigField::EmbedColor, "ff00aa")
            .await
            .unwrap();
        assert_eq!(config.embed_color, 0xff00aa);
    }

    #[tokio::test]
    async fn test_reset_restores_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(&dir);
        let store = ConfigStore::open(&path).await;

        store.update(9, ConfigUpdate::DmWelcome(true)).await;
        assert!(store.reset(9).await);
        assert!(!ConfigStore::load(&path).await.contains_key(&9));
        assert_eq!(store.get_or_create(9).await, GuildConfig::default());
        assert!(!store.reset(10).await);
    }

    #[tokio::test]
    async fn test_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(&dir);
        let store = ConfigStore::open(&path).await;

        store.get_or_create(1).await;
        store.update(2, ConfigUpdate::AutoRole(Some(u64::MAX))).await;
        store
            .update(2, ConfigUpdate::WelcomeImageUrl(Some("https://img/x.png".into())))
            .await;
        store
            .update(2, ConfigUpdate::EmbedColor(EmbedColor::new(0x123456).unwrap()))
            .await;

        let reopened = ConfigStore::open(&path).await;
        assert_eq!(reopened.snapshot().await, store.snapshot().await);
    }

    #[tokio::test]
    async fn test_out_of_range_color_sanitized_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(&dir);
        std::fs::write(&path, r#"{ "5": { "embed_color": 4294967295 } }"#).unwrap();

        let table = ConfigStore::load(&path).await;
        assert_eq!(table[&5].embed_color, DEFAULT_EMBED_COLOR);
    }

    #[tokio::test]
    async fn test_bad_entry_does_not_drop_other_guilds() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(&dir);
        std::fs::write(
            &path,
            r#"{
                "1": { "welcome_channel": 10 },
                "5": { "embed_color": 1099511627775, "welcome_message": null, "auto_role": 77 },
                "6": { "auto_role": -3, "dm_welcome": "yes" }
            }"#,
        )
        .unwrap();

        let store = ConfigStore::open(&path).await;
        assert_eq!(store.len().await, 3);
        assert_eq!(store.get_or_create(1).await.welcome_channel, Some(10));

        let five = store.get_or_create(5).await;
        assert_eq!(five.embed_color, DEFAULT_EMBED_COLOR);
        assert_eq!(five.welcome_message, DEFAULT_WELCOME_MESSAGE);
        assert_eq!(five.auto_role, Some(77));

        let six = store.get_or_create(6).await;
        assert_eq!(six.auto_role, None);
        assert!(!six.dm_welcome);

        // The next write keeps every guild that was on disk
        store.get_or_create(2).await;
        let reloaded = ConfigStore::load(&path).await;
        assert_eq!(reloaded.len(), 4);
        assert_eq!(reloaded[&1].welcome_channel, Some(10));
        assert_eq!(reloaded[&5].auto_role, Some(77));
    }

    #[tokio::test]
    async fn test_save_failure_keeps_memory_state() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in place of the file makes the rename fail
        let path = dir.path().join("blocked");
        std::fs::create_dir_all(path.join("inner")).unwrap();
        let store = ConfigStore::open(&path).await;

        store.update(3, ConfigUpdate::DmWelcome(true)).await;
        assert!(store.get_or_create(3).await.dm_welcome);
        assert!(store.flush().await.is_err());

        // No temp files are left next to the target
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("blocked")]);
    }

    #[tokio::test]
    async fn test_backup_is_separate_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(&dir);
        let store = ConfigStore::open(&path).await;
        store.update(4, ConfigUpdate::DmWelcome(true)).await;

        let prefix = dir.path().join("backup");
        let backup = store.backup(prefix.to_str().unwrap()).await.unwrap();

        let name = backup.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("backup_"));
        assert!(name.ends_with(".json"));
        assert_eq!(name.len(), "backup_YYYYMMDD_HHMMSS.json".len());
        assert_ne!(backup, path);
        assert_eq!(ConfigStore::load(&backup).await, store.snapshot().await);
    }

    #[tokio::test]
    async fn test_concurrent_updates_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(&dir);
        let store = Arc::new(ConfigStore::open(&path).await);

        let handles: Vec<_> = (0..20u64)
            .map(|guild_id| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .update(guild_id, ConfigUpdate::WelcomeChannel(Some(guild_id + 100)))
                        .await;
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let loaded = ConfigStore::load(&path).await;
        assert_eq!(loaded.len(), 20);
        for guild_id in 0..20u64 {
            assert_eq!(loaded[&guild_id].welcome_channel, Some(guild_id + 100));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_to_same_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(&dir);
        let store = Arc::new(ConfigStore::open(&path).await);
        for guild_id in 0..50u64 {
            store.update(guild_id, ConfigUpdate::DmWelcome(true)).await;
        }
        let prefix = dir.path().join("backup").to_str().unwrap().to_string();

        // Backups within the same second share a target path
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                let prefix = prefix.clone();
                tokio::spawn(async move {
                    if i % 2 == 0 {
                        store.backup(&prefix).await.map(|_| ())
                    } else {
                        store.flush().await
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let expected = store.snapshot().await;
        assert_eq!(ConfigStore::load(&path).await, expected);

        let mut backups = 0;
        for entry in std::fs::read_dir(dir.path()).unwrap() {
            let entry = entry.unwrap().path();
            let name = entry.file_name().unwrap().to_str().unwrap().to_string();
            if name.starts_with("backup_") {
                assert_eq!(ConfigStore::load(&entry).await, expected);
                backups += 1;
            } else {
                assert_eq!(name, "guild_configs.json");
            }
        }
        assert!(backups >= 1);
    }
}

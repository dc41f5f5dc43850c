// Options shared by every command and the service they open.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::debug;

use folio_engine::{ContentService, EngineConfig, SnowflakeIds, SqliteStore};

pub type Service = ContentService<SqliteStore, SnowflakeIds>;

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Config file (defaults to `~/.folio/config.toml`).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Database file, overriding the configured one.
    #[arg(long, global = true, value_name = "FILE")]
    pub db: Option<PathBuf>,

    /// Editor id recorded on changes.
    #[arg(long, global = true, value_name = "ID")]
    pub editor: Option<i64>,
}

impl GlobalArgs {
    pub fn load_config(&self) -> anyhow::Result<EngineConfig> {
        EngineConfig::load(self.config.as_deref()).context("failed to load folio config")
    }

    pub fn open_service(&self) -> anyhow::Result<Service> {
        let config = self.load_config()?;
        let db_path = match &self.db {
            Some(path) => path.clone(),
            None => config
                .resolved_database_path()
                .context("could not determine home directory for the default database")?,
        };
        debug!(db = %db_path.display(), "opening page database");
        let store = SqliteStore::open(&db_path)?;
        Ok(ContentService::new(store, SnowflakeIds::default(), config))
    }
}

#[cfg(test)]
mod tests {
    use folio_engine::NewPage;

    use super::*;

    #[test]
    fn open_service_uses_config_and_db_override() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, "window_capacity = 3\n").expect("config should be written");
        let global = GlobalArgs {
            config: Some(config_path),
            db: Some(dir.path().join("nested").join("wiki.db")),
            editor: None,
        };

        let mut service = global.open_service().expect("service should open");
        assert_eq!(service.config().window_capacity, 3);
        let page = service
            .create_page(NewPage::document(1, None, "Notes", "hello"))
            .expect("page should be created");

        let reopened = global.open_service().expect("service should reopen");
        assert_eq!(reopened.page(page.id).expect("page should persist").title, "Notes");
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let global = GlobalArgs {
            config: Some(dir.path().join("absent.toml")),
            db: Some(dir.path().join("wiki.db")),
            editor: None,
        };
        assert!(global.open_service().is_err());
    }
}

// SQLite-backed page store.
//
// Two tables: `pages` (tree nodes with their inline version window as JSON)
// and `archived_versions` (entries evicted from a window).

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use folio_common::types::{
    ArchivedVersion, ChangeStats, DocumentState, Page, PageBody, PageId, PageKind, ProjectId,
    VersionEntry, VersionNo,
};
use folio_common::window::RecentVersions;

use super::PageStore;

const MIGRATION_V1_SQL: &str = r#"
CREATE TABLE pages (
    id                  INTEGER PRIMARY KEY,
    project_id          INTEGER NOT NULL,
    title               TEXT NOT NULL,
    kind                TEXT NOT NULL,
    parent_id           INTEGER NULL,
    path                TEXT NOT NULL,
    sort_order          INTEGER NOT NULL,
    content             TEXT NULL,
    current_version     INTEGER NOT NULL DEFAULT 1,
    content_hash        TEXT NULL,
    recent_versions     TEXT NOT NULL DEFAULT '[]',
    is_public           INTEGER NOT NULL DEFAULT 0,
    created_by          INTEGER NULL,
    updated_by          INTEGER NULL,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);

CREATE INDEX pages_children_idx
    ON pages (project_id, parent_id, sort_order);

CREATE INDEX pages_path_idx
    ON pages (project_id, path);

CREATE TABLE archived_versions (
    id                  INTEGER PRIMARY KEY,
    page_id             INTEGER NOT NULL,
    project_id          INTEGER NOT NULL,
    version             INTEGER NOT NULL,
    patch               TEXT NOT NULL,
    description         TEXT NOT NULL,
    editor_id           INTEGER NULL,
    created_at          TEXT NOT NULL,
    added_lines         INTEGER NOT NULL DEFAULT 0,
    deleted_lines       INTEGER NOT NULL DEFAULT 0,
    changed_chars       INTEGER NOT NULL DEFAULT 0,
    content_hash        TEXT NOT NULL,
    archived_at         TEXT NOT NULL,
    UNIQUE (page_id, version)
);

CREATE INDEX archived_versions_project_idx
    ON archived_versions (project_id);
"#;

const MIGRATIONS: &[(i64, &str)] = &[(1, MIGRATION_V1_SQL)];

const PAGE_COLUMNS: &str = "id, project_id, title, kind, parent_id, path, sort_order, content, \
     current_version, content_hash, recent_versions, is_public, created_by, updated_by, \
     created_at, updated_at";

const ARCHIVE_COLUMNS: &str = "id, page_id, project_id, version, patch, description, editor_id, \
     created_at, added_lines, deleted_lines, changed_chars, content_hash, archived_at";

const PAGE_UPSERT: &str = "ON CONFLICT(id) DO UPDATE SET \
    project_id = excluded.project_id, title = excluded.title, \
    kind = excluded.kind, parent_id = excluded.parent_id, \
    path = excluded.path, sort_order = excluded.sort_order, \
    content = excluded.content, current_version = excluded.current_version, \
    content_hash = excluded.content_hash, \
    recent_versions = excluded.recent_versions, \
    is_public = excluded.is_public, created_by = excluded.created_by, \
    updated_by = excluded.updated_by, created_at = excluded.created_at, \
    updated_at = excluded.updated_at";

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database parent directory `{}`", parent.display())
            })?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open page database at `{}`", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .context("failed to configure sqlite pragmas for page database")?;

        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        Self::init(conn)
    }

    fn init(mut conn: Connection) -> Result<Self> {
        ensure_migration_table(&conn)?;
        apply_pending_migrations(&mut conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn schema_version(&self) -> Result<i64> {
        current_schema_version(&self.conn)
    }

    fn query_pages(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Page>> {
        let mut stmt = self.conn.prepare(sql).context("failed to prepare pages query")?;
        let rows = stmt.query_map(params, row_to_page).context("failed to query pages")?;
        rows.collect::<std::result::Result<Vec<_>, _>>().context("failed to collect pages rows")
    }

    /// Writes one page row. With an empty `on_conflict` clause an existing
    /// id is a constraint error.
    fn write_page(&mut self, page: &Page, on_conflict: &str) -> Result<()> {
        let (content, current_version, content_hash, recent_versions) = match &page.body {
            PageBody::Directory => (None, 1, None, "[]".to_owned()),
            PageBody::Document(doc) => (
                Some(doc.content.as_str()),
                doc.current_version,
                Some(doc.content_hash.as_str()),
                serde_json::to_string(&doc.recent_versions)
                    .context("failed to encode version window")?,
            ),
        };

        self.conn.execute(
            &format!(
                "INSERT INTO pages ({PAGE_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16) \
                 {on_conflict}"
            ),
            params![
                page.id,
                page.project_id,
                page.title,
                page.kind().as_str(),
                page.parent_id,
                page.path,
                page.sort_order,
                content,
                current_version,
                content_hash,
                recent_versions,
                page.is_public,
                page.created_by,
                page.updated_by,
                page.created_at.to_rfc3339(),
                page.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn query_archived(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<ArchivedVersion>> {
        let mut stmt =
            self.conn.prepare(sql).context("failed to prepare archived_versions query")?;
        let rows = stmt
            .query_map(params, row_to_archived)
            .context("failed to query archived_versions")?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to collect archived_versions rows")
    }
}

impl PageStore for SqliteStore {
    fn insert_page(&mut self, page: &Page) -> Result<()> {
        self.write_page(page, "")
            .with_context(|| format!("failed to insert pages row {}", page.id))
    }

    fn save_page(&mut self, page: &Page) -> Result<()> {
        self.write_page(page, PAGE_UPSERT)
            .with_context(|| format!("failed to save pages row {}", page.id))
    }

    fn find_page(&self, id: PageId) -> Result<Option<Page>> {
        self.conn
            .query_row(
                &format!("SELECT {PAGE_COLUMNS} FROM pages WHERE id = ?1"),
                params![id],
                row_to_page,
            )
            .optional()
            .with_context(|| format!("failed to read pages row {id}"))
    }

    fn find_children(
        &self,
        project_id: ProjectId,
        parent_id: Option<PageId>,
    ) -> Result<Vec<Page>> {
        self.query_pages(
            &format!(
                "SELECT {PAGE_COLUMNS} FROM pages \
                 WHERE project_id = ?1 AND parent_id IS ?2 \
                 ORDER BY sort_order ASC, id ASC"
            ),
            params![project_id, parent_id],
        )
    }

    fn find_by_project(&self, project_id: ProjectId) -> Result<Vec<Page>> {
        self.query_pages(
            &format!(
                "SELECT {PAGE_COLUMNS} FROM pages WHERE project_id = ?1 ORDER BY path ASC, id ASC"
            ),
            params![project_id],
        )
    }

    fn max_sort_order(
        &self,
        project_id: ProjectId,
        parent_id: Option<PageId>,
    ) -> Result<Option<i64>> {
        self.conn
            .query_row(
                "SELECT MAX(sort_order) FROM pages WHERE project_id = ?1 AND parent_id IS ?2",
                params![project_id, parent_id],
                |row| row.get(0),
            )
            .context("failed to read max sort_order")
    }

    fn max_assigned_id(&self) -> Result<Option<i64>> {
        self.conn
            .query_row(
                "SELECT MAX(id) FROM (SELECT MAX(id) AS id FROM pages \
                 UNION ALL SELECT MAX(id) FROM archived_versions)",
                [],
                |row| row.get(0),
            )
            .context("failed to read highest assigned id")
    }

    fn delete_page(&mut self, id: PageId) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM pages WHERE id = ?1", params![id])
            .with_context(|| format!("failed to delete pages row {id}"))?;
        Ok(changed > 0)
    }

    fn save_archived(&mut self, archived: &ArchivedVersion) -> Result<()> {
        let entry = &archived.entry;
        self.conn
            .execute(
                &format!(
                    "INSERT INTO archived_versions ({ARCHIVE_COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
                ),
                params![
                    archived.id,
                    archived.page_id,
                    archived.project_id,
                    entry.version,
                    entry.patch,
                    entry.description,
                    entry.editor_id,
                    entry.created_at.to_rfc3339(),
                    entry.stats.added_lines,
                    entry.stats.deleted_lines,
                    entry.stats.changed_chars,
                    entry.content_hash,
                    archived.archived_at.to_rfc3339(),
                ],
            )
            .with_context(|| {
                format!(
                    "failed to archive version {} of page {}",
                    entry.version, archived.page_id
                )
            })?;
        Ok(())
    }

    fn find_archived_versions(&self, page_id: PageId) -> Result<Vec<ArchivedVersion>> {
        self.query_archived(
            &format!(
                "SELECT {ARCHIVE_COLUMNS} FROM archived_versions \
                 WHERE page_id = ?1 ORDER BY version ASC"
            ),
            params![page_id],
        )
    }

    fn find_archived_range(
        &self,
        page_id: PageId,
        from: VersionNo,
        to: VersionNo,
    ) -> Result<Vec<ArchivedVersion>> {
        self.query_archived(
            &format!(
                "SELECT {ARCHIVE_COLUMNS} FROM archived_versions \
                 WHERE page_id = ?1 AND version BETWEEN ?2 AND ?3 ORDER BY version ASC"
            ),
            params![page_id, from, to],
        )
    }

    fn delete_archived_versions(&mut self, page_id: PageId) -> Result<usize> {
        self.conn
            .execute("DELETE FROM archived_versions WHERE page_id = ?1", params![page_id])
            .with_context(|| format!("failed to purge archived versions of page {page_id}"))
    }

    fn delete_archived_by_project(&mut self, project_id: ProjectId) -> Result<usize> {
        self.conn
            .execute("DELETE FROM archived_versions WHERE project_id = ?1", params![project_id])
            .with_context(|| format!("failed to purge archived versions of project {project_id}"))
    }

    fn count_archived_by_project(&self, project_id: ProjectId) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM archived_versions WHERE project_id = ?1",
                params![project_id],
                |row| row.get(0),
            )
            .context("failed to count archived versions")?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    fn begin(&mut self) -> Result<()> {
        if !self.conn.is_autocommit() {
            bail!("a transaction is already open on the page database");
        }
        self.conn.execute_batch("BEGIN IMMEDIATE").context("failed to begin transaction")
    }

    fn commit(&mut self) -> Result<()> {
        self.conn.execute_batch("COMMIT").context("failed to commit transaction")
    }

    fn rollback(&mut self) -> Result<()> {
        if self.conn.is_autocommit() {
            return Ok(());
        }
        self.conn.execute_batch("ROLLBACK").context("failed to roll back transaction")
    }
}

// ── Row decoding ───────────────────────────────────────────────────

fn conversion_error(
    idx: usize,
    error: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(error))
}

fn parse_timestamp(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|error| conversion_error(idx, error))
}

fn row_to_page(row: &rusqlite::Row<'_>) -> rusqlite::Result<Page> {
    let kind_raw: String = row.get(3)?;
    let kind = kind_raw.parse::<PageKind>().map_err(|message| {
        conversion_error(3, std::io::Error::new(std::io::ErrorKind::InvalidData, message))
    })?;

    let body = match kind {
        PageKind::Directory => PageBody::Directory,
        PageKind::Document => {
            let window_raw: String = row.get(10)?;
            let recent_versions: RecentVersions =
                serde_json::from_str(&window_raw).map_err(|error| conversion_error(10, error))?;
            PageBody::Document(DocumentState {
                content: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
                current_version: row.get(8)?,
                content_hash: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
                recent_versions,
            })
        }
    };

    Ok(Page {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        parent_id: row.get(4)?,
        path: row.get(5)?,
        sort_order: row.get(6)?,
        body,
        is_public: row.get(11)?,
        created_by: row.get(12)?,
        updated_by: row.get(13)?,
        created_at: parse_timestamp(row, 14)?,
        updated_at: parse_timestamp(row, 15)?,
    })
}

fn row_to_archived(row: &rusqlite::Row<'_>) -> rusqlite::Result<ArchivedVersion> {
    Ok(ArchivedVersion {
        id: row.get(0)?,
        page_id: row.get(1)?,
        project_id: row.get(2)?,
        entry: VersionEntry {
            version: row.get(3)?,
            patch: row.get(4)?,
            description: row.get(5)?,
            editor_id: row.get(6)?,
            created_at: parse_timestamp(row, 7)?,
            stats: ChangeStats {
                added_lines: row.get(8)?,
                deleted_lines: row.get(9)?,
                changed_chars: row.get(10)?,
            },
            content_hash: row.get(11)?,
        },
        archived_at: parse_timestamp(row, 12)?,
    })
}

// ── Migrations ─────────────────────────────────────────────────────

fn ensure_migration_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY,
            applied_at  TEXT NOT NULL
        );
        ",
    )
    .context("failed to ensure schema_migrations table exists")
}

fn current_schema_version(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_migrations", [], |row| row.get(0))
        .context("failed to read current schema version")
}

fn apply_pending_migrations(conn: &mut Connection) -> Result<()> {
    let mut current_version = current_schema_version(conn)?;

    for (version, sql) in MIGRATIONS {
        if *version <= current_version {
            continue;
        }

        let tx = conn.transaction().context("failed to start migration transaction")?;
        tx.execute_batch(sql)
            .with_context(|| format!("failed to apply page database migration v{version}"))?;
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, datetime('now'))",
            params![version],
        )
        .with_context(|| format!("failed to record migration v{version}"))?;
        tx.commit().with_context(|| format!("failed to commit migration v{version}"))?;
        current_version = *version;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tempfile::TempDir;

    use super::*;
    use folio_common::types::INITIAL_VERSION;

    fn page(id: PageId, parent_id: Option<PageId>, path: &str, body: PageBody) -> Page {
        let now = Utc::now();
        Page {
            id,
            project_id: 1,
            title: path.rsplit('/').next().unwrap_or_default().to_owned(),
            parent_id,
            path: path.to_owned(),
            sort_order: id,
            body,
            is_public: false,
            created_by: Some(9),
            updated_by: Some(9),
            created_at: now,
            updated_at: now,
        }
    }

    fn entry(version: VersionNo) -> VersionEntry {
        VersionEntry {
            version,
            patch: format!("@@ -1,1 +1,1 @@\n-v{}\n+v{version}", version - 1),
            description: "Update content".into(),
            editor_id: Some(9),
            created_at: Utc::now(),
            stats: ChangeStats { added_lines: 1, deleted_lines: 1, changed_chars: 0 },
            content_hash: format!("hash-{version}"),
        }
    }

    #[test]
    fn open_creates_schema_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db").join("folio.db");
        {
            let store = SqliteStore::open(&path).expect("store should open");
            assert_eq!(store.schema_version().expect("schema version should be readable"), 1);
        }
        let store = SqliteStore::open(&path).expect("second open should succeed");
        let rows: i64 = store
            .connection()
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .expect("schema migration count query should succeed");
        assert_eq!(rows, 1);
    }

    #[test]
    fn document_roundtrips_with_window() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut doc = DocumentState::initial("hello".into());
        doc.current_version = 3;
        doc.recent_versions = RecentVersions::from_entries([entry(2), entry(3)]);
        let original = page(10, None, "/Notes", PageBody::Document(doc));

        store.save_page(&original).unwrap();
        let loaded = store.find_page(10).unwrap().expect("page should exist");
        assert_eq!(loaded, original);
    }

    #[test]
    fn directory_roundtrips() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let dir = page(1, None, "/Docs", PageBody::Directory);
        store.save_page(&dir).unwrap();
        let loaded = store.find_page(1).unwrap().unwrap();
        assert!(loaded.is_directory());
        assert_eq!(loaded.current_version(), INITIAL_VERSION);
    }

    #[test]
    fn save_page_updates_existing_row() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut doc = page(1, None, "/A", PageBody::Document(DocumentState::initial("x".into())));
        store.save_page(&doc).unwrap();
        doc.title = "B".into();
        doc.path = "/B".into();
        store.save_page(&doc).unwrap();

        let all = store.find_by_project(1).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].path, "/B");
    }

    #[test]
    fn insert_page_rejects_taken_id() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let first = page(1, None, "/A", PageBody::Document(DocumentState::initial("a".into())));
        store.insert_page(&first).unwrap();

        let mut second = page(1, None, "/B", PageBody::Directory);
        second.title = "B".into();
        assert!(store.insert_page(&second).is_err());
        assert_eq!(store.find_page(1).unwrap().expect("page should exist"), first);
    }

    #[test]
    fn max_assigned_id_spans_pages_and_archive() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.max_assigned_id().unwrap(), None);
        store.insert_page(&page(5, None, "/A", PageBody::Directory)).unwrap();
        assert_eq!(store.max_assigned_id().unwrap(), Some(5));
        store
            .save_archived(&ArchivedVersion {
                id: 42,
                page_id: 5,
                project_id: 1,
                entry: entry(2),
                archived_at: Utc::now(),
            })
            .unwrap();
        assert_eq!(store.max_assigned_id().unwrap(), Some(42));
    }

    #[test]
    fn children_are_ordered_and_root_is_null_parent() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.save_page(&page(1, None, "/Root", PageBody::Directory)).unwrap();
        let mut late = page(3, Some(1), "/Root/Late", PageBody::Directory);
        late.sort_order = 1;
        store.save_page(&late).unwrap();
        let mut early = page(2, Some(1), "/Root/Early", PageBody::Directory);
        early.sort_order = 5;
        store.save_page(&early).unwrap();

        let roots = store.find_children(1, None).unwrap();
        assert_eq!(roots.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1]);

        let children = store.find_children(1, Some(1)).unwrap();
        assert_eq!(children.iter().map(|p| p.id).collect::<Vec<_>>(), vec![3, 2]);
        assert_eq!(store.max_sort_order(1, Some(1)).unwrap(), Some(5));
        assert_eq!(store.max_sort_order(1, Some(99)).unwrap(), None);
    }

    #[test]
    fn archive_rows_roundtrip_and_purge() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        for version in [3, 2, 4] {
            store
                .save_archived(&ArchivedVersion {
                    id: i64::from(version),
                    page_id: 7,
                    project_id: 1,
                    entry: entry(version),
                    archived_at: Utc::now(),
                })
                .unwrap();
        }

        let all = store.find_archived_versions(7).unwrap();
        assert_eq!(all.iter().map(|r| r.entry.version).collect::<Vec<_>>(), vec![2, 3, 4]);
        let range = store.find_archived_range(7, 3, 4).unwrap();
        assert_eq!(range.iter().map(|r| r.entry.version).collect::<Vec<_>>(), vec![3, 4]);
        assert_eq!(store.count_archived_by_project(1).unwrap(), 3);

        assert_eq!(store.delete_archived_versions(7).unwrap(), 3);
        assert!(store.find_archived_versions(7).unwrap().is_empty());
    }

    #[test]
    fn duplicate_archived_version_is_rejected() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let row = ArchivedVersion {
            id: 1,
            page_id: 7,
            project_id: 1,
            entry: entry(2),
            archived_at: Utc::now(),
        };
        store.save_archived(&row).unwrap();
        let dup = ArchivedVersion { id: 2, ..row };
        assert!(store.save_archived(&dup).is_err());
    }

    #[test]
    fn rollback_discards_writes() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.begin().unwrap();
        store.save_page(&page(1, None, "/Gone", PageBody::Directory)).unwrap();
        store.rollback().unwrap();
        assert!(store.find_page(1).unwrap().is_none());

        store.begin().unwrap();
        store.save_page(&page(2, None, "/Kept", PageBody::Directory)).unwrap();
        store.commit().unwrap();
        assert!(store.find_page(2).unwrap().is_some());
    }

    #[test]
    fn nested_begin_is_rejected() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.begin().unwrap();
        assert!(store.begin().is_err());
        store.rollback().unwrap();
    }
}

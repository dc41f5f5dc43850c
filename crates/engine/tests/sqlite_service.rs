use folio_engine::store::PageStore;
use folio_engine::{ContentService, EngineConfig, NewPage, SnowflakeIds, SqliteStore};
use tempfile::TempDir;

fn open(path: &std::path::Path) -> ContentService<SqliteStore, SnowflakeIds> {
    let config = EngineConfig { window_capacity: 3, ..EngineConfig::default() };
    let store = SqliteStore::open(path).expect("database should open");
    ContentService::new(store, SnowflakeIds::default(), config)
}

#[test]
fn history_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("folio.db");

    let page_id = {
        let mut svc = open(&db);
        let folder = svc.create_page(NewPage::directory(7, None, "Lab")).unwrap();
        let page = svc
            .create_page(NewPage::document(7, Some(folder.id), "Protocol", "step 1"))
            .unwrap();
        for n in 2..=6 {
            let content = (1..=n).map(|i| format!("step {i}")).collect::<Vec<_>>().join("\n");
            svc.update_content(page.id, &content, Some("add step"), Some(42)).unwrap();
        }
        page.id
    };

    let svc = open(&db);
    let page = svc.page(page_id).unwrap();
    assert_eq!(page.path, "/Lab/Protocol");
    assert_eq!(page.current_version(), 6);
    assert_eq!(svc.store().find_archived_versions(page_id).unwrap().len(), 2);

    assert_eq!(svc.version_content(page_id, 1).unwrap(), "step 1");
    assert_eq!(svc.version_content(page_id, 3).unwrap(), "step 1\nstep 2\nstep 3");
    svc.verify_history(page_id).unwrap();

    let history = svc.history(page_id).unwrap();
    assert_eq!(history.len(), 5);
    assert!(history.iter().all(|s| s.description == "add step" && s.editor_id == Some(42)));
}

#[test]
fn failed_edit_leaves_database_untouched() {
    let dir = TempDir::new().unwrap();
    let mut svc = open(&dir.path().join("folio.db"));
    let folder = svc.create_page(NewPage::directory(1, None, "Folder")).unwrap();
    let child = svc.create_page(NewPage::directory(1, Some(folder.id), "Child")).unwrap();

    assert!(svc.move_page(folder.id, Some(child.id), None).is_err());
    assert!(svc.update_content(folder.id, "text", None, None).is_err());

    // The connection is usable after rollback.
    let moved = svc.move_page(child.id, None, None).unwrap();
    assert_eq!(moved.path, "/Child");
    assert_eq!(svc.store().find_by_project(1).unwrap().len(), 2);
}

#[test]
fn two_writers_on_one_database_never_share_ids() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("folio.db");
    let mut first = open(&db);
    let mut second = open(&db);

    let mut created = Vec::new();
    for n in 0..200 {
        let a = first
            .create_page(NewPage::document(1, None, &format!("A{n}"), "alpha"))
            .expect("first writer should create its page");
        let b = second
            .create_page(NewPage::document(1, None, &format!("B{n}"), "beta"))
            .expect("second writer should create its page");
        assert_ne!(a.id, b.id);
        created.push((a.id, format!("A{n}"), "alpha"));
        created.push((b.id, format!("B{n}"), "beta"));
    }

    let reader = open(&db);
    assert_eq!(reader.store().find_by_project(1).unwrap().len(), 400);
    for (id, title, content) in created {
        let page = reader.page(id).expect("every created page should survive");
        assert_eq!(page.title, title);
        assert_eq!(page.content(), Some(content));
    }
}

#[test]
fn archived_rows_from_two_writers_get_distinct_ids() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("folio.db");
    let mut first = open(&db);
    let mut second = open(&db);

    let left = first.create_page(NewPage::document(1, None, "Left", "0")).unwrap();
    let right = second.create_page(NewPage::document(1, None, "Right", "0")).unwrap();
    for n in 1..=6 {
        first.update_content(left.id, &n.to_string(), None, None).unwrap();
        second.update_content(right.id, &n.to_string(), None, None).unwrap();
    }

    let reader = open(&db);
    let mut ids: Vec<i64> = [left.id, right.id]
        .iter()
        .flat_map(|page_id| reader.store().find_archived_versions(*page_id).unwrap())
        .map(|row| row.id)
        .collect();
    assert_eq!(ids.len(), 6);
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 6);
}

use folio_engine::{ContentService, EngineConfig, MemoryStore, NewPage, SequentialIds};
use proptest::collection::vec;
use proptest::prelude::*;

fn document() -> impl Strategy<Value = String> {
    vec(
        prop_oneof![
            Just(String::new()),
            Just("# Title".to_string()),
            Just("- item".to_string()),
            "[a-d ]{0,6}",
        ],
        0..12,
    )
    .prop_map(|lines| lines.join("\n"))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        max_shrink_iters: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn every_recorded_version_is_reconstructible(
        initial in document(),
        edits in vec(document(), 1..25),
        capacity in 1usize..6,
    ) {
        let config = EngineConfig { window_capacity: capacity, ..EngineConfig::default() };
        let mut svc = ContentService::new(MemoryStore::new(), SequentialIds::default(), config);
        let page = svc.create_page(NewPage::document(1, None, "Doc", &initial)).unwrap();

        // Distinct consecutive contents only; unchanged edits record nothing.
        let mut expected = vec![initial.clone()];
        for edit in &edits {
            let outcome = svc.update_content(page.id, edit, None, None).unwrap();
            if outcome.entry.is_some() {
                expected.push(edit.clone());
            } else {
                prop_assert_eq!(expected.last(), Some(edit));
            }
        }

        let current = svc.page(page.id).unwrap();
        prop_assert_eq!(current.current_version() as usize, expected.len());
        let window_len = current.document().unwrap().recent_versions.len();
        prop_assert!(window_len <= capacity);

        for (idx, content) in expected.iter().enumerate() {
            let rebuilt = svc.version_content(page.id, (idx + 1) as u32).unwrap();
            prop_assert_eq!(&rebuilt, content);
        }

        let history = svc.history(page.id).unwrap();
        let versions: Vec<u32> = history.iter().map(|s| s.version).collect();
        let continuous: Vec<u32> = (2..=expected.len() as u32).collect();
        prop_assert_eq!(versions, continuous);
    }
}

use std::sync::Once;

use pagepress_core::{ConfigError, ConfigSnapshot, PageConfigStore, Profile};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(press_logging::initialize_for_tests);
}

#[test]
fn initialize_defaults_every_page_to_medium() {
    init_logging();
    for page_count in [1usize, 2, 7, 120] {
        let mut store = PageConfigStore::default();
        store.initialize(page_count).unwrap();
        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.len(), page_count);
        let keys: Vec<usize> = snapshot.iter().map(|(index, _)| index).collect();
        assert_eq!(keys, (0..page_count).collect::<Vec<_>>());
        assert!(snapshot.iter().all(|(_, profile)| profile == Profile::Medium));
    }
}

#[test]
fn initialize_rejects_empty_documents() {
    let mut store = PageConfigStore::default();
    assert_eq!(store.initialize(0), Err(ConfigError::InvalidDocument));
    assert!(!store.is_initialized());
}

#[test]
fn set_profile_touches_only_one_page() {
    init_logging();
    let mut store = PageConfigStore::default();
    store.initialize(4).unwrap();
    store.set_profile(2, Profile::VeryHigh).unwrap();

    let snapshot = store.snapshot().unwrap();
    assert_eq!(snapshot.get(2), Some(Profile::VeryHigh));
    for index in [0, 1, 3] {
        assert_eq!(snapshot.get(index), Some(Profile::Medium));
    }
}

#[test]
fn set_profile_validates_index_and_code() {
    let mut store = PageConfigStore::default();
    store.initialize(3).unwrap();

    assert_eq!(
        store.set_profile(3, Profile::High),
        Err(ConfigError::IndexOutOfRange {
            index: 3,
            page_count: 3
        })
    );
    assert!(matches!(
        store.set_profile_code(0, 9),
        Err(ConfigError::InvalidProfile(_))
    ));
    assert_eq!(store.profile(0), Some(Profile::Medium));
}

#[test]
fn set_all_profiles_applies_to_every_page() {
    init_logging();
    let mut store = PageConfigStore::default();
    store.initialize(5).unwrap();
    store.set_profile(1, Profile::Standard).unwrap();
    store.set_all_profiles(Profile::High).unwrap();

    let snapshot = store.snapshot().unwrap();
    assert!(snapshot.iter().all(|(_, profile)| profile == Profile::High));
}

#[test]
fn rejected_bulk_apply_leaves_pages_untouched() {
    let mut store = PageConfigStore::new(false);
    store.initialize(3).unwrap();
    store.set_profile(0, Profile::LightHq).unwrap();
    let before = store.snapshot().unwrap();

    assert!(store.set_all_profiles(Profile::OcrSplit).is_err());
    assert!(store.set_all_profile_codes(0).is_err());
    assert_eq!(store.snapshot().unwrap(), before);
}

#[test]
fn ocr_is_a_capability_flag() {
    let mut disabled = PageConfigStore::new(false);
    disabled.initialize(2).unwrap();
    assert!(disabled.set_profile(0, Profile::OcrSplit).is_err());

    let mut enabled = PageConfigStore::new(true);
    enabled.initialize(2).unwrap();
    enabled.set_profile(0, Profile::OcrSplit).unwrap();
    assert!(enabled.uses_ocr());
}

#[test]
fn cleared_store_refuses_mutation() {
    let mut store = PageConfigStore::default();
    store.initialize(2).unwrap();
    store.clear();

    assert_eq!(
        store.set_profile(0, Profile::High),
        Err(ConfigError::NotInitialized)
    );
    assert_eq!(
        store.set_all_profiles(Profile::High),
        Err(ConfigError::NotInitialized)
    );
    assert_eq!(store.snapshot(), Err(ConfigError::NotInitialized));
}

#[test]
fn snapshot_survives_the_wire_key_for_key() {
    let mut store = PageConfigStore::default();
    store.initialize(6).unwrap();
    for (index, profile) in Profile::ALL.iter().enumerate() {
        store.set_profile(index, *profile).unwrap();
    }
    let original = store.snapshot().unwrap();

    let sent = original.to_json();
    let received = ConfigSnapshot::from_json(&sent).unwrap();
    assert_eq!(received, original);

    let rebuilt = PageConfigStore::from_snapshot(&received, true).unwrap();
    assert_eq!(rebuilt.snapshot().unwrap(), original);
}

#[test]
fn snapshot_with_gaps_cannot_rebuild_a_store() {
    let snapshot = ConfigSnapshot::from_json(r#"{"0": 1, "2": 3}"#).unwrap();
    assert_eq!(
        PageConfigStore::from_snapshot(&snapshot, true),
        Err(ConfigError::IndexOutOfRange {
            index: 2,
            page_count: 2
        })
    );
}

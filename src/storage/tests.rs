use super::*;
use uuid::Uuid;

fn temp_db_path() -> std::path::PathBuf {
    std::env::temp_dir().join(format!("waylist-storage-{}.db", Uuid::now_v7()))
}

#[test]
fn missing_key_loads_as_empty_list() {
    let storage = Storage::open_in_memory().expect("open");
    let values: Vec<String> = storage.load(KEY_RECOMMENDATIONS).expect("load");
    assert!(values.is_empty());
}

#[test]
fn save_then_load_round_trips_an_array() {
    let storage = Storage::open_in_memory().expect("open");
    let values = vec!["one".to_string(), "two".to_string()];
    storage.save(KEY_COLLECTIONS, &values).expect("save");
    let loaded: Vec<String> = storage.load(KEY_COLLECTIONS).expect("load");
    assert_eq!(loaded, values);
}

#[test]
fn save_replaces_the_previous_value() {
    let storage = Storage::open_in_memory().expect("open");
    storage
        .save(KEY_ROUTES, &["a".to_string(), "b".to_string()])
        .expect("save");
    storage.save(KEY_ROUTES, &["c".to_string()]).expect("save");
    let loaded: Vec<String> = storage.load(KEY_ROUTES).expect("load");
    assert_eq!(loaded, vec!["c".to_string()]);
}

#[test]
fn meta_round_trips_and_overwrites() {
    let storage = Storage::open_in_memory().expect("open");
    assert_eq!(storage.get_meta("user_id").expect("get"), None);
    storage.set_meta("user_id", "u-1").expect("set");
    storage.set_meta("user_id", "u-2").expect("set");
    assert_eq!(
        storage.get_meta("user_id").expect("get"),
        Some("u-2".to_string())
    );
}

#[test]
fn open_records_schema_version() {
    let storage = Storage::open_in_memory().expect("open");
    assert_eq!(
        storage.get_meta("schema_version").expect("get"),
        Some(CURRENT_SCHEMA_VERSION.to_string())
    );
}

#[test]
fn reopening_a_file_db_preserves_data() {
    let path = temp_db_path();
    let path_str = path.to_str().expect("utf-8 temp path");
    {
        let storage = Storage::open(path_str).expect("open");
        storage
            .save(KEY_TRIPS, &["persisted".to_string()])
            .expect("save");
    }
    let storage = Storage::open(path_str).expect("reopen");
    let loaded: Vec<String> = storage.load(KEY_TRIPS).expect("load");
    assert_eq!(loaded, vec!["persisted".to_string()]);
    let _ = std::fs::remove_file(&path);
}

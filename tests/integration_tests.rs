//! Integration tests for aerodb
//!
//! These run the full stack - registry, orchestrator, pipeline, SQLite -
//! against in-memory or tempdir databases. No external services required.

use aerodb::config::{DatabaseConfig, EnforcementLevel};
use aerodb::model::{Airport, Navaid, Runway};
use aerodb::query::{Filter, Sort};
use aerodb::store::{SqliteManager, StorageManager};
use aerodb::{Database, Initialization};
use std::sync::Arc;
use tempfile::tempdir;

fn airport(id: i64, icao: &str, elevation: f64, latitude: f64) -> Airport {
    Airport {
        id,
        icao_ident: icao.into(),
        name: format!("{} field", icao),
        city: None,
        field_elevation: elevation,
        latitude,
        longitude: -122.0,
        towered: false,
    }
}

fn runway(id: i64, airport_id: i64, designator: &str, length_ft: i64) -> Runway {
    Runway {
        id,
        airport_id,
        designator: designator.into(),
        length_ft,
        width_ft: 150,
        surface: Some("ASPH".into()),
    }
}

/// Fresh in-memory database with the full model registered and built
fn fresh_db(config: DatabaseConfig) -> Database {
    let manager: Arc<dyn StorageManager> = Arc::new(SqliteManager::in_memory());
    let mut db = Database::new(manager, config).unwrap();
    db.register::<Airport>().unwrap();
    db.register::<Runway>().unwrap();
    db.register::<Navaid>().unwrap();
    assert_eq!(db.initialize().unwrap(), Initialization::ReloadRequired);
    db
}

fn small_batch_config() -> DatabaseConfig {
    DatabaseConfig {
        batch_size: 10,
        workers: 2,
        ..DatabaseConfig::default()
    }
}

#[test]
fn test_registration_orders_respect_foreign_keys() {
    let db = fresh_db(DatabaseConfig::default());
    let mut registry = db.registry().clone();

    let parent_first = registry.parent_first().unwrap();
    let child_first = registry.child_first().unwrap();
    let pos = |order: &[String], name: &str| order.iter().position(|t| t == name).unwrap();

    assert!(pos(&parent_first, "airports") < pos(&parent_first, "runways"));
    assert!(pos(&child_first, "runways") < pos(&child_first, "airports"));
}

#[test]
fn test_upsert_roundtrip_by_primary_key() {
    let db = fresh_db(small_batch_config());

    let original = airport(1, "KSFO", 13.0, 37.6);
    let mut pipeline = db.pipeline().unwrap();
    pipeline.add_record(&original).unwrap();
    pipeline.finalize().unwrap();

    let by_id = Filter::equals::<Airport>("id", 1);
    let fetched: Airport = db.select(Some(&by_id)).unwrap();
    assert_eq!(fetched, original);

    // Re-inserting the same primary key replaces the row
    let replacement = Airport {
        name: "San Francisco International".into(),
        towered: true,
        ..original.clone()
    };
    let mut pipeline = db.pipeline().unwrap();
    pipeline.add_record(&replacement).unwrap();
    pipeline.finalize().unwrap();

    let all: Vec<Airport> = db.select_all(Some(&by_id), None);
    assert_eq!(all.len(), 1);
    assert_eq!(all[0], replacement);
}

#[test]
fn test_placeholder_parent_then_hydration() {
    let db = fresh_db(small_batch_config());

    // Runways arrive before their airport; placeholders keep the foreign
    // key satisfied until the real airport row lands.
    let mut pipeline = db.pipeline().unwrap();
    pipeline
        .add_key("airports", aerodb::value::Value::Integer(1))
        .unwrap();
    pipeline.add_record(&runway(10, 1, "10L/28R", 11_870)).unwrap();
    pipeline.add_record(&runway(11, 1, "10R/28L", 11_381)).unwrap();
    pipeline.finalize().unwrap();

    let runways: Vec<Runway> = db.select_all(None, None);
    assert_eq!(runways.len(), 2);
    assert!(runways.iter().all(|r| r.airport_id == 1));

    // Hydrate the placeholder in a later batch
    let real = airport(1, "KSFO", 13.0, 37.6);
    let mut pipeline = db.pipeline().unwrap();
    pipeline.add_record(&real).unwrap();
    pipeline.finalize().unwrap();

    let fetched: Airport = db
        .select(Some(&Filter::equals::<Airport>("id", 1)))
        .unwrap();
    assert_eq!(fetched.icao_ident, "KSFO");
}

#[test]
fn test_hydration_beats_placeholder_in_same_batch() {
    let db = fresh_db(small_batch_config());

    let mut pipeline = db.pipeline().unwrap();
    // Placeholder and full record for the same key in one batch, in the
    // unfavorable order
    pipeline.add_record(&airport(1, "KSFO", 13.0, 37.6)).unwrap();
    pipeline
        .add_key("airports", aerodb::value::Value::Integer(1))
        .unwrap();
    pipeline.finalize().unwrap();

    let fetched: Airport = db
        .select(Some(&Filter::equals::<Airport>("id", 1)))
        .unwrap();
    assert_eq!(fetched.icao_ident, "KSFO");
}

#[test]
fn test_join_fanout_collapses_to_distinct_roots() {
    let db = fresh_db(small_batch_config());

    let mut pipeline = db.pipeline().unwrap();
    for id in 1..=3 {
        pipeline
            .add_record(&airport(id, &format!("KAP{}", id), 100.0, 40.0))
            .unwrap();
    }
    let mut rwy_id = 0;
    for airport_id in 1..=3 {
        for _ in 0..4 {
            rwy_id += 1;
            pipeline
                .add_record(&runway(rwy_id, airport_id, "09/27", 6_000))
                .unwrap();
        }
    }
    pipeline.finalize().unwrap();

    // Filtering on a runway attribute forces the join; each airport matches
    // through 4 runways but comes back once
    let through_runways = Filter::greater_than::<Runway>("length_ft", 0);
    let sort = Sort::ascending::<Airport>("id");
    let airports: Vec<Airport> = db.select_all(Some(&through_runways), Some(&sort));
    assert_eq!(airports.len(), 3);
    assert_eq!(
        airports.iter().map(|a| a.id).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
}

#[test]
fn test_conjunction_filter_exact_subset() {
    let db = fresh_db(small_batch_config());

    let seed = [
        (1, "KAAA", 5.0, 35.0),
        (2, "KBBB", 20.0, 45.0),
        (3, "KCCC", 150.0, 55.0),
        (4, "KDDD", 13.0, 49.9),
        (5, "KEEE", 5200.0, 39.7),
    ];
    let mut pipeline = db.pipeline().unwrap();
    for (id, icao, elevation, latitude) in seed {
        pipeline
            .add_record(&airport(id, icao, elevation, latitude))
            .unwrap();
    }
    pipeline.finalize().unwrap();

    let filter = Filter::greater_than::<Airport>("field_elevation", 12)
        .and(Filter::less_than::<Airport>("latitude", 50.0));
    let sort = Sort::ascending::<Airport>("id");
    let matched: Vec<Airport> = db.select_all(Some(&filter), Some(&sort));
    assert_eq!(
        matched.iter().map(|a| a.id).collect::<Vec<_>>(),
        vec![2, 4, 5]
    );
}

#[test]
fn test_filter_associativity_matches_same_rows() {
    let db = fresh_db(small_batch_config());

    let mut pipeline = db.pipeline().unwrap();
    for (id, elevation, latitude) in
        [(1, 5.0, 35.0), (2, 20.0, 45.0), (3, 150.0, 55.0), (4, 13.0, 49.0)]
    {
        pipeline
            .add_record(&airport(id, &format!("K{:03}", id), elevation, latitude))
            .unwrap();
    }
    pipeline.finalize().unwrap();

    let a = || Filter::greater_than::<Airport>("field_elevation", 12);
    let b = || Filter::less_than::<Airport>("latitude", 50.0);
    let c = || Filter::not_equals::<Airport>("id", 4);

    let left = a().and(b()).and(c());
    let right = a().and(b().and(c()));

    let sort = Sort::ascending::<Airport>("id");
    let left_ids: Vec<i64> = db
        .select_all::<Airport>(Some(&left), Some(&sort))
        .iter()
        .map(|x| x.id)
        .collect();
    let right_ids: Vec<i64> = db
        .select_all::<Airport>(Some(&right), Some(&sort))
        .iter()
        .map(|x| x.id)
        .collect();

    assert_eq!(left_ids, vec![2]);
    assert_eq!(left_ids, right_ids);
}

#[test]
fn test_batch_flush_counts() {
    let db = fresh_db(small_batch_config());

    // batch_size = 10: 25 adds cut two full batches, finalize flushes the
    // residual five exactly once
    let mut pipeline = db.pipeline().unwrap();
    for id in 1..=25 {
        pipeline
            .add_record(&airport(id, &format!("K{:03}", id), 10.0, 40.0))
            .unwrap();
    }
    let stats = pipeline.finalize().unwrap();

    assert_eq!(stats.batches_flushed(), 3);
    assert_eq!(stats.rows_written(), 25);
    assert_eq!(stats.insert_failures(), 0);

    let all: Vec<Airport> = db.select_all(None, None);
    assert_eq!(all.len(), 25);
}

#[test]
fn test_force_rebuild_always_drops_and_rebuilds() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nasr.db");

    // First run: fresh file, version stamp written, data loaded
    {
        let manager: Arc<dyn StorageManager> = Arc::new(SqliteManager::new(&path));
        let mut db = Database::new(
            manager,
            DatabaseConfig {
                enforcement: EnforcementLevel::Ignore,
                ..DatabaseConfig::default()
            },
        )
        .unwrap();
        db.register::<Airport>().unwrap();
        assert_eq!(db.initialize().unwrap(), Initialization::ReloadRequired);

        let mut pipeline = db.pipeline().unwrap();
        pipeline.add_record(&airport(1, "KSFO", 13.0, 37.6)).unwrap();
        pipeline.finalize().unwrap();
        db.close().unwrap();
    }

    // Second run: version matches, no force - data survives
    {
        let manager: Arc<dyn StorageManager> = Arc::new(SqliteManager::new(&path));
        let mut db = Database::new(
            manager,
            DatabaseConfig {
                enforcement: EnforcementLevel::Ignore,
                ..DatabaseConfig::default()
            },
        )
        .unwrap();
        db.register::<Airport>().unwrap();
        assert_eq!(db.initialize().unwrap(), Initialization::UpToDate);
        let all: Vec<Airport> = db.select_all(None, None);
        assert_eq!(all.len(), 1);
        db.close().unwrap();
    }

    // Third run: force flag set - rebuild happens despite matching version
    {
        let manager: Arc<dyn StorageManager> = Arc::new(SqliteManager::new(&path));
        let mut db = Database::new(
            manager,
            DatabaseConfig {
                force_rebuild: true,
                enforcement: EnforcementLevel::Ignore,
                ..DatabaseConfig::default()
            },
        )
        .unwrap();
        db.register::<Airport>().unwrap();
        assert_eq!(db.initialize().unwrap(), Initialization::ReloadRequired);
        let all: Vec<Airport> = db.select_all(None, None);
        assert!(all.is_empty());
        db.close().unwrap();
    }
}

#[test]
fn test_stale_effective_range_triggers_rebuild() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nasr.db");

    // Load data whose effective range ended yesterday
    {
        let manager: Arc<dyn StorageManager> = Arc::new(SqliteManager::new(&path));
        let mut db = Database::new(
            manager,
            DatabaseConfig::default(),
        )
        .unwrap();
        db.register::<Airport>().unwrap();
        db.initialize().unwrap();

        let mut pipeline = db.pipeline().unwrap();
        pipeline.add_record(&airport(1, "KSFO", 13.0, 37.6)).unwrap();
        pipeline.finalize().unwrap();

        let now = chrono::Utc::now();
        db.set_effective_range(now - chrono::Duration::days(56), now - chrono::Duration::days(28))
            .unwrap();
        db.close().unwrap();
    }

    // Lenient enforcement: stale data forces a rebuild (re-ingest required)
    {
        let manager: Arc<dyn StorageManager> = Arc::new(SqliteManager::new(&path));
        let mut db = Database::new(
            manager,
            DatabaseConfig {
                enforcement: EnforcementLevel::Lenient,
                ..DatabaseConfig::default()
            },
        )
        .unwrap();
        db.register::<Airport>().unwrap();
        assert_eq!(db.initialize().unwrap(), Initialization::ReloadRequired);
        let all: Vec<Airport> = db.select_all(None, None);
        assert!(all.is_empty());
    }
}

#[test]
fn test_cascade_delete_removes_child_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nasr.db");

    {
        let manager: Arc<dyn StorageManager> = Arc::new(SqliteManager::new(&path));
        let mut db = Database::new(
            manager,
            DatabaseConfig::default(),
        )
        .unwrap();
        db.register::<Airport>().unwrap();
        db.register::<Runway>().unwrap();
        db.initialize().unwrap();

        let mut pipeline = db.pipeline().unwrap();
        pipeline.add_record(&airport(1, "KSFO", 13.0, 37.6)).unwrap();
        pipeline.add_record(&runway(10, 1, "10L/28R", 11_870)).unwrap();
        pipeline.add_record(&runway(11, 1, "10R/28L", 11_381)).unwrap();
        pipeline.finalize().unwrap();

        let runways: Vec<Runway> = db.select_all(None, None);
        assert_eq!(runways.len(), 2);
        db.close().unwrap();
    }

    // Deleting the parent row cascades through the schema's ON DELETE CASCADE
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA foreign_keys = ON").unwrap();
    conn.execute("DELETE FROM airports WHERE id = 1", []).unwrap();
    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM runways", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
}

#[test]
fn test_navaids_are_independent_of_airports() {
    let db = fresh_db(small_batch_config());

    let navaid = Navaid {
        id: 1,
        ident: "SFO".into(),
        navaid_type: "VOR/DME".into(),
        frequency_khz: 115_800.0,
        latitude: 37.6195,
        longitude: -122.3739,
        elevation: Some(13.0),
    };
    let mut pipeline = db.pipeline().unwrap();
    pipeline.add_record(&navaid).unwrap();
    pipeline.finalize().unwrap();

    let fetched: Navaid = db
        .select(Some(&Filter::like::<Navaid>("ident", "SF%")))
        .unwrap();
    assert_eq!(fetched, navaid);
}

#[test]
fn test_select_with_no_matches_is_empty_not_error() {
    let db = fresh_db(small_batch_config());
    let none: Vec<Airport> = db.select_all(
        Some(&Filter::equals::<Airport>("icao_ident", "NOPE")),
        None,
    );
    assert!(none.is_empty());
    assert!(db
        .select::<Airport>(Some(&Filter::equals::<Airport>("id", 999)))
        .is_none());
}

use chrono::{NaiveDate, TimeZone, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fs;

use drill::challenges::ChallengeKind;
use drill::scheduler::WeightEffect;
use drill::store::{DataDir, StoreKind};
use drill::DrillError;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
}

fn fresh() -> (tempfile::TempDir, DataDir) {
    let dir = tempfile::tempdir().unwrap();
    let data = DataDir::new(dir.path().join("drill"));
    data.init(false).unwrap();
    (dir, data)
}

fn snapshot_bytes(data: &DataDir) -> Vec<Vec<u8>> {
    StoreKind::ALL
        .into_iter()
        .map(|k| fs::read(data.path(k)).unwrap())
        .collect()
}

#[test]
fn init_generate_feedback_round() {
    let (_dir, data) = fresh();
    let now = Utc.with_ymd_and_hms(2026, 10, 17, 7, 0, 0).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let mut snap = data.load().unwrap();
    let out = snap.state.generate(false, today(), now, &mut rng).unwrap();
    let written = data.commit(&snap).unwrap();
    assert!(written.contains(&StoreKind::Log));
    assert!(!written.contains(&StoreKind::Config));

    let id = out.challenge.id.clone();
    let mut snap = data.load().unwrap();
    assert_eq!(snap.state.log.get(&id).unwrap().attempts, 0);
    let fb = snap.state.feedback(&id, 9, today()).unwrap();
    data.commit(&snap).unwrap();

    let reloaded = data.load().unwrap();
    let record = reloaded.state.log.get(&id).unwrap();
    assert_eq!(record.attempts, 1);
    assert_eq!(record.feedback_history, vec![9]);
    match (out.challenge.kind, fb.effect) {
        (ChallengeKind::Regular, WeightEffect::Adjusted { old, new }) => {
            assert_eq!(old, 0.20);
            assert!((new - 0.50).abs() < 1e-12);
            let entry = reloaded.state.weights.get(&record.concept).unwrap();
            assert_eq!(entry.last_practiced, Some(today()));
        }
        (ChallengeKind::Wildcard, WeightEffect::Wildcard { .. }) => {
            // rating 9 on the first attempt is a challenging promotion
            assert_eq!(reloaded.state.weights.weight(&record.concept), Some(0.35));
        }
        (kind, effect) => panic!("mismatched {kind:?} / {effect:?}"),
    }
}

#[test]
fn load_then_commit_is_byte_identical() {
    let (_dir, data) = fresh();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut snap = data.load().unwrap();
    for _ in 0..5 {
        snap.state.generate(false, today(), Utc::now(), &mut rng).unwrap();
    }
    data.commit(&snap).unwrap();

    let before = snapshot_bytes(&data);
    let snap = data.load().unwrap();
    assert!(data.commit(&snap).unwrap().is_empty());
    assert_eq!(snapshot_bytes(&data), before);
}

#[test]
fn external_write_is_a_conflict() {
    let (_dir, data) = fresh();
    let mut snap = data.load().unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    snap.state.generate(true, today(), Utc::now(), &mut rng).unwrap();

    // someone else touches the log between load and commit
    let mut other = data.load().unwrap();
    other
        .state
        .generate(true, today(), Utc::now(), &mut rng)
        .unwrap();
    data.commit(&other).unwrap();
    let after_other = snapshot_bytes(&data);

    let err = data.commit(&snap).unwrap_err();
    assert!(matches!(err, DrillError::Conflict { store: "challenge log" }));
    assert_eq!(err.exit_code(), 5);
    assert_eq!(snapshot_bytes(&data), after_other);
}

#[test]
fn conflict_on_one_store_blocks_every_write() {
    let (_dir, data) = fresh();
    let mut snap = data.load().unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let id = snap
        .state
        .generate(false, today(), Utc::now(), &mut rng)
        .unwrap()
        .challenge
        .id;
    data.commit(&snap).unwrap();

    let mut snap = data.load().unwrap();
    // 8 moves a regular weight and promotes a wildcard, so weights change
    snap.state.feedback(&id, 8, today()).unwrap();
    // weights change underneath us; the log write must not happen either
    let weights_path = data.path(StoreKind::Weights);
    let mut edited = fs::read_to_string(&weights_path).unwrap();
    edited.push('\n');
    fs::write(&weights_path, &edited).unwrap();
    let log_before = fs::read(data.path(StoreKind::Log)).unwrap();

    assert!(matches!(
        data.commit(&snap),
        Err(DrillError::Conflict { store: "weights" })
    ));
    assert_eq!(fs::read(data.path(StoreKind::Log)).unwrap(), log_before);
}

#[test]
fn rejected_feedback_leaves_files_untouched() {
    let (_dir, data) = fresh();
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut snap = data.load().unwrap();
    let id = snap
        .state
        .generate(false, today(), Utc::now(), &mut rng)
        .unwrap()
        .challenge
        .id;
    data.commit(&snap).unwrap();
    let before = snapshot_bytes(&data);

    let mut snap = data.load().unwrap();
    let err = snap.state.feedback("2026-10-17-R-999", 5, today()).unwrap_err();
    assert!(matches!(err, DrillError::NotFound(_)));
    assert_eq!(err.exit_code(), 3);
    let err = snap.state.feedback(&id, 11, today()).unwrap_err();
    assert!(matches!(err, DrillError::Validation(_)));
    assert_eq!(err.exit_code(), 2);
    let err = snap.state.feedback(&id, 0, today()).unwrap_err();
    assert!(matches!(err, DrillError::Validation(_)));

    // the failed calls left nothing to write
    assert!(data.commit(&snap).unwrap().is_empty());
    assert_eq!(snapshot_bytes(&data), before);
}

#[test]
fn missing_store_aborts_load() {
    let (_dir, data) = fresh();
    fs::remove_file(data.path(StoreKind::Wildcards)).unwrap();
    let err = data.load().unwrap_err();
    assert!(matches!(err, DrillError::MissingData { store: "wildcards", .. }));
    assert_eq!(err.exit_code(), 4);
    // config alone still loads
    assert!(data.load_config().is_ok());
}

#[test]
fn legacy_flat_weights_load_and_upgrade() {
    let (_dir, data) = fresh();
    fs::write(
        data.path(StoreKind::Weights),
        r#"{ "algorithms": 0.6, "testing": 0.05 }"#,
    )
    .unwrap();

    let mut snap = data.load().unwrap();
    assert_eq!(snap.state.weights.weight("algorithms"), Some(0.6));
    assert_eq!(snap.state.weights.get("testing").unwrap().last_practiced, None);

    let mut rng = ChaCha8Rng::seed_from_u64(5);
    snap.state.config.wildcard_probabilities.foundation = 0.0;
    snap.state.config.wildcard_probabilities.learning = 0.0;
    let id = snap
        .state
        .generate(false, today(), Utc::now(), &mut rng)
        .unwrap()
        .challenge
        .id;
    snap.state.feedback(&id, 5, today()).unwrap();
    // config was edited in memory too; keep the test on the weights file
    snap.state.config = data.load_config().unwrap().value;
    data.commit(&snap).unwrap();

    let text = fs::read_to_string(data.path(StoreKind::Weights)).unwrap();
    let v: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert!(v["algorithms"]["weight"].is_number());
    assert!(v["testing"]["weight"].is_number());
}

#[test]
fn init_refuses_to_overwrite() {
    let (_dir, data) = fresh();
    let mut snap = data.load().unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(9);
    snap.state.generate(true, today(), Utc::now(), &mut rng).unwrap();
    data.commit(&snap).unwrap();
    let before = snapshot_bytes(&data);

    let err = data.init(false).unwrap_err();
    assert!(matches!(err, DrillError::Validation(_)));
    assert_eq!(snapshot_bytes(&data), before);

    data.init(true).unwrap();
    assert!(data.load().unwrap().state.log.is_empty());
}

#[test]
fn config_update_persists_and_validates() {
    let (_dir, data) = fresh();
    let mut loaded = data.load_config().unwrap();
    let old = loaded.value.set("mastery-wildcard", "0.5").unwrap();
    assert_eq!(old, 0.40);
    assert_eq!(data.commit_config(&loaded).unwrap(), vec![StoreKind::Config]);
    assert_eq!(data.load_config().unwrap().value.get("mastery-wildcard").unwrap(), 0.5);

    let before = fs::read(data.path(StoreKind::Config)).unwrap();
    let mut loaded = data.load_config().unwrap();
    // would make probabilities non-decreasing
    assert!(loaded.value.set("foundation-wildcard", "0.9").is_err());
    assert!(loaded.value.set("no-such-key", "1").is_err());
    assert!(data.commit_config(&loaded).unwrap().is_empty());
    assert_eq!(fs::read(data.path(StoreKind::Config)).unwrap(), before);
}

#[test]
fn corrupt_log_reports_store_and_path() {
    let (_dir, data) = fresh();
    fs::write(data.path(StoreKind::Log), "[1, 2").unwrap();
    match data.load() {
        Err(e @ DrillError::Corrupt { .. }) => {
            assert_eq!(e.exit_code(), 1);
            assert!(e.to_string().contains("challenges-log.json"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn failed_write_leaves_every_store_unchanged() {
    let (_dir, data) = fresh();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut snap = data.load().unwrap();
    let id = snap
        .state
        .generate(false, today(), Utc::now(), &mut rng)
        .unwrap()
        .challenge
        .id;
    data.commit(&snap).unwrap();
    let before = snapshot_bytes(&data);

    let mut snap = data.load().unwrap();
    // 9 changes the weights on either path, and the log always
    snap.state.feedback(&id, 9, today()).unwrap();
    // the log's tmp path cannot be written as a file
    let log_tmp = data.path(StoreKind::Log).with_extension("tmp");
    fs::create_dir(&log_tmp).unwrap();

    let err = data.commit(&snap).unwrap_err();
    assert!(matches!(err, DrillError::Io(_)));
    assert_eq!(err.exit_code(), 1);
    assert_eq!(snapshot_bytes(&data), before);
    assert!(!data.path(StoreKind::Weights).with_extension("tmp").exists());

    // once the obstacle is gone the same snapshot commits whole
    fs::remove_dir(&log_tmp).unwrap();
    let written = data.commit(&snap).unwrap();
    assert!(written.contains(&StoreKind::Weights));
    assert!(written.contains(&StoreKind::Log));
    assert_eq!(data.load().unwrap().state.log.get(&id).unwrap().attempts, 1);
}

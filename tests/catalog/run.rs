use bgcstore::catalog::reference::RunStatus;
use bgcstore::catalog::run::{advance_run_status, create_run, get_run};
use bgcstore::core::time::parse_stamp;
use bgcstore::{EntityKind, RunId, Store, StoreError};
use serde_json::json;
use tempfile::tempdir;

#[test]
fn test_run_starts_with_params() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();

    let params = json!({"threshold": 300.0, "complete_only": true, "dataset": "ds1"});
    let id = create_run(&store, &params).unwrap();
    let run = get_run(&store, id).unwrap();
    assert_eq!(run.status, RunStatus::RunStarted);
    assert_eq!(run.params, params);
    assert_eq!(run.created_at, run.updated_at);
    assert!(parse_stamp(&run.created_at).is_some());

    assert!(get_run(&store, RunId(9)).unwrap_err().is_not_found(EntityKind::Run));
}

#[test]
fn test_run_status_walks_forward_only() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();
    let id = create_run(&store, &json!({})).unwrap();

    let err = advance_run_status(&store, id, RunStatus::FeaturesExtracted).unwrap_err();
    assert!(matches!(err, StoreError::InvalidTransition { .. }), "{err}");

    for next in &RunStatus::ALL[1..] {
        advance_run_status(&store, id, *next).unwrap();
        assert_eq!(get_run(&store, id).unwrap().status, *next);
    }

    let err = advance_run_status(&store, id, RunStatus::RunFinished).unwrap_err();
    assert!(matches!(err, StoreError::InvalidTransition { .. }));
    let err = advance_run_status(&store, RunId(77), RunStatus::BiosynScanned).unwrap_err();
    assert!(err.is_not_found(EntityKind::Run));
}

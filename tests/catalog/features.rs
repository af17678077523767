use bgcstore::catalog::dataset::{BgcInput, advance_status, create_dataset, register_bgc};
use bgcstore::catalog::features::{
    dataset_feature_matrix, feature_vector, require_status_at_least, set_feature_value,
    write_feature_vector,
};
use bgcstore::catalog::hmm::{HmmInput, register_hmm};
use bgcstore::catalog::reference::{BgcStatus, BgcType, HmmModelType};
use bgcstore::{BgcId, DatasetId, EntityKind, HmmId, Store, StoreError};
use tempfile::tempdir;

fn bgc(store: &Store, ds: DatasetId, name: &str) -> BgcId {
    register_bgc(
        store,
        ds,
        &BgcInput {
            name: name.to_string(),
            bgc_type: BgcType::As5,
            on_contig_edge: false,
            length_nt: 30_000,
            orig_folder: "f".to_string(),
            orig_filename: format!("{name}.gbk"),
            product: None,
            organism: None,
        },
    )
    .unwrap()
}

fn hmm(store: &Store, name: &str) -> HmmId {
    register_hmm(
        store,
        &HmmInput {
            accession: None,
            name: name.to_string(),
            model_length: 100,
            model_type: HmmModelType::BigsliceSubpfam,
        },
    )
    .unwrap()
}

fn scan_to(store: &Store, bgc: BgcId, target: BgcStatus) {
    for next in [
        BgcStatus::FullHmmScanned,
        BgcStatus::SubpfamScanned,
        BgcStatus::FeaturesExtracted,
    ] {
        if next > target {
            break;
        }
        advance_status(store, bgc, next).unwrap();
    }
}

#[test]
fn test_feature_value_is_written_once() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();
    let ds = create_dataset(&store, "ds1", "/data", "").unwrap();
    let b = bgc(&store, ds, "bgcA");
    let h = hmm(&store, "PKS_KS.1");

    set_feature_value(&store, b, h, 3).unwrap();
    let err = set_feature_value(&store, b, h, 5).unwrap_err();
    assert!(err.is_duplicate(EntityKind::Feature), "{err}");
    assert_eq!(feature_vector(&store, b).unwrap().get(&h), Some(&3));

    let err = set_feature_value(&store, b, HmmId(404), 1).unwrap_err();
    assert!(err.is_not_found(EntityKind::Hmm));
    let err = set_feature_value(&store, BgcId(404), h, 1).unwrap_err();
    assert!(err.is_not_found(EntityKind::Bgc));
}

#[test]
fn test_vector_write_needs_subpfam_scan() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();
    let ds = create_dataset(&store, "ds1", "/data", "").unwrap();
    let b = bgc(&store, ds, "bgcA");
    let h1 = hmm(&store, "h1");
    let h2 = hmm(&store, "h2");

    scan_to(&store, b, BgcStatus::FullHmmScanned);
    let err = write_feature_vector(&store, b, &[(h1, 10)]).unwrap_err();
    match err {
        StoreError::StatusPrecondition {
            required, actual, ..
        } => {
            assert_eq!(required, "SUBPFAM_SCANNED");
            assert_eq!(actual, "FULL_HMM_SCANNED");
        }
        other => panic!("expected StatusPrecondition, got {other}"),
    }
    assert!(require_status_at_least(&store, b, BgcStatus::FullHmmScanned).is_ok());

    advance_status(&store, b, BgcStatus::SubpfamScanned).unwrap();
    write_feature_vector(&store, b, &[(h1, 10), (h2, 0)]).unwrap();

    let vector = feature_vector(&store, b).unwrap();
    assert_eq!(vector.len(), 2);
    assert_eq!(vector[&h1], 10);
    assert_eq!(vector[&h2], 0);
}

#[test]
fn test_vector_write_is_atomic() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();
    let ds = create_dataset(&store, "ds1", "/data", "").unwrap();
    let b = bgc(&store, ds, "bgcA");
    let h1 = hmm(&store, "h1");
    let h2 = hmm(&store, "h2");
    scan_to(&store, b, BgcStatus::SubpfamScanned);

    set_feature_value(&store, b, h2, 7).unwrap();
    let err = write_feature_vector(&store, b, &[(h1, 1), (h2, 2)]).unwrap_err();
    assert!(err.is_duplicate(EntityKind::Feature));

    let vector = feature_vector(&store, b).unwrap();
    assert_eq!(vector.get(&h1), None);
    assert_eq!(vector[&h2], 7);
}

#[test]
fn test_dataset_feature_matrix() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();
    let ds = create_dataset(&store, "ds1", "/data", "").unwrap();
    let other = create_dataset(&store, "ds2", "/data2", "").unwrap();
    let hmms: Vec<HmmId> = (0..4).map(|i| hmm(&store, &format!("h{i}"))).collect();

    let mut bgcs = Vec::new();
    for i in 0..6 {
        let b = bgc(&store, ds, &format!("bgc{i}"));
        scan_to(&store, b, BgcStatus::SubpfamScanned);
        let values: Vec<(HmmId, i64)> = hmms
            .iter()
            .enumerate()
            .filter(|(j, _)| (i + j) % 2 == 0)
            .map(|(j, h)| (*h, (i * 10 + j) as i64))
            .collect();
        write_feature_vector(&store, b, &values).unwrap();
        bgcs.push(b);
    }
    let stray = bgc(&store, other, "stray");
    set_feature_value(&store, stray, hmms[0], 99).unwrap();

    let matrix = dataset_feature_matrix(&store, ds).unwrap();
    let ids: Vec<BgcId> = matrix.iter().map(|(b, _)| *b).collect();
    assert_eq!(ids, bgcs);
    for (i, (_, vector)) in matrix.iter().enumerate() {
        assert_eq!(vector.len(), 2);
        for (j, h) in hmms.iter().enumerate() {
            let expected = ((i + j) % 2 == 0).then_some((i * 10 + j) as i64);
            assert_eq!(vector.get(h).copied(), expected);
        }
    }

    assert!(dataset_feature_matrix(&store, DatasetId(404)).is_err());
}

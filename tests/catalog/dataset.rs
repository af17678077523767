use bgcstore::catalog::dataset::{
    BgcInput, advance_status, backfill_annotation, create_dataset, dataset_by_name, get_bgc,
    get_dataset, get_status, list_by_dataset, list_datasets, register_bgc,
};
use bgcstore::catalog::reference::{BgcStatus, BgcType};
use bgcstore::{BgcId, DatasetId, EntityKind, Store, StoreError};
use tempfile::tempdir;

fn bgc_input(name: &str, folder: &str, filename: &str) -> BgcInput {
    BgcInput {
        name: name.to_string(),
        bgc_type: BgcType::As5,
        on_contig_edge: false,
        length_nt: 45_000,
        orig_folder: folder.to_string(),
        orig_filename: filename.to_string(),
        product: None,
        organism: None,
    }
}

#[test]
fn test_duplicate_dataset_name_leaves_original_intact() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();

    let id = create_dataset(&store, "ds1", "/data/ds1", "first").unwrap();
    let err = create_dataset(&store, "ds1", "/elsewhere", "second").unwrap_err();
    assert!(err.is_duplicate(EntityKind::Dataset), "{err}");

    let ds = get_dataset(&store, id).unwrap();
    assert_eq!(ds.orig_folder, "/data/ds1");
    assert_eq!(ds.description, "first");
    assert_eq!(list_datasets(&store).unwrap().len(), 1);
    assert_eq!(dataset_by_name(&store, "ds1").unwrap(), Some(ds));
    assert_eq!(dataset_by_name(&store, "ds2").unwrap(), None);
}

#[test]
fn test_bgc_source_is_unique_within_dataset() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();
    let ds1 = create_dataset(&store, "ds1", "/data/ds1", "").unwrap();
    let ds2 = create_dataset(&store, "ds2", "/data/ds2", "").unwrap();

    let input = bgc_input("bgcA", "genomes/a", "region001.gbk");
    register_bgc(&store, ds1, &input).unwrap();
    let err = register_bgc(&store, ds1, &input).unwrap_err();
    assert!(err.is_duplicate(EntityKind::Bgc), "{err}");

    // Same folder/filename in another dataset is a different BGC.
    register_bgc(&store, ds2, &input).unwrap();
}

#[test]
fn test_register_bgc_unknown_dataset() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();

    let err = register_bgc(&store, DatasetId(42), &bgc_input("x", "f", "x.gbk")).unwrap_err();
    assert!(err.is_not_found(EntityKind::Dataset), "{err}");
}

#[test]
fn test_new_bgc_fields_round_trip() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();
    let ds = create_dataset(&store, "ds1", "/data/ds1", "").unwrap();

    let mut input = bgc_input("bgcA", "genomes/a", "region001.gbk");
    input.on_contig_edge = true;
    input.product = Some("nrps".to_string());
    let id = register_bgc(&store, ds, &input).unwrap();

    let bgc = get_bgc(&store, id).unwrap();
    assert_eq!(bgc.dataset_id, ds);
    assert_eq!(bgc.bgc_type, BgcType::As5);
    assert!(bgc.on_contig_edge);
    assert_eq!(bgc.length_nt, 45_000);
    assert_eq!(bgc.product.as_deref(), Some("nrps"));
    assert_eq!(bgc.organism, None);
    assert_eq!(bgc.status, BgcStatus::Loaded);
}

#[test]
fn test_status_lattice() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();
    let ds = create_dataset(&store, "ds1", "/data/ds1", "").unwrap();
    let bgc = register_bgc(&store, ds, &bgc_input("bgcA", "a", "a.gbk")).unwrap();

    assert_eq!(get_status(&store, bgc).unwrap(), BgcStatus::Loaded);

    let err = advance_status(&store, bgc, BgcStatus::SubpfamScanned).unwrap_err();
    assert!(matches!(err, StoreError::InvalidTransition { .. }), "{err}");
    assert_eq!(get_status(&store, bgc).unwrap(), BgcStatus::Loaded);

    for next in [
        BgcStatus::FullHmmScanned,
        BgcStatus::SubpfamScanned,
        BgcStatus::FeaturesExtracted,
    ] {
        advance_status(&store, bgc, next).unwrap();
        assert_eq!(get_status(&store, bgc).unwrap(), next);
    }

    // No going back, no staying put, nothing after the last state.
    for target in [BgcStatus::Loaded, BgcStatus::FeaturesExtracted] {
        let err = advance_status(&store, bgc, target).unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
    }
    assert_eq!(get_status(&store, bgc).unwrap(), BgcStatus::FeaturesExtracted);
}

#[test]
fn test_status_of_unknown_bgc() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();

    let err = advance_status(&store, BgcId(99), BgcStatus::FullHmmScanned).unwrap_err();
    assert!(err.is_not_found(EntityKind::Bgc));
    assert!(get_status(&store, BgcId(99)).unwrap_err().is_not_found(EntityKind::Bgc));
}

#[test]
fn test_list_by_dataset_is_in_insertion_order() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();
    let ds1 = create_dataset(&store, "ds1", "/data/ds1", "").unwrap();
    let ds2 = create_dataset(&store, "ds2", "/data/ds2", "").unwrap();

    for name in ["c", "a", "b"] {
        register_bgc(&store, ds1, &bgc_input(name, "f", &format!("{name}.gbk"))).unwrap();
    }
    register_bgc(&store, ds2, &bgc_input("other", "f", "other.gbk")).unwrap();

    let names: Vec<String> = list_by_dataset(&store, ds1)
        .unwrap()
        .into_iter()
        .map(|b| b.name)
        .collect();
    assert_eq!(names, vec!["c", "a", "b"]);
    assert!(list_by_dataset(&store, DatasetId(77)).is_err());
}

#[test]
fn test_backfill_annotation_keeps_unset_fields() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();
    let ds = create_dataset(&store, "ds1", "/data/ds1", "").unwrap();
    let mut input = bgc_input("bgcA", "a", "a.gbk");
    input.product = Some("t1pks".to_string());
    let bgc = register_bgc(&store, ds, &input).unwrap();

    backfill_annotation(&store, bgc, Some("Streptomyces coelicolor"), None).unwrap();
    let stored = get_bgc(&store, bgc).unwrap();
    assert_eq!(stored.organism.as_deref(), Some("Streptomyces coelicolor"));
    assert_eq!(stored.product.as_deref(), Some("t1pks"));

    let err = backfill_annotation(&store, BgcId(500), Some("x"), None).unwrap_err();
    assert!(err.is_not_found(EntityKind::Bgc));
}

use bgcstore::catalog::dataset::{BgcInput, create_dataset, register_bgc};
use bgcstore::catalog::hmm::{HmmInput, register_hmm};
use bgcstore::catalog::reference::{BgcType, HmmModelType};
use bgcstore::catalog::sequence::{
    CdsInput, HspAlignment, HspFamily, HspInput, cds_for_bgc, get_alignment, get_cds,
    hsp_parents, hsps_above_score, hsps_for_cds, link_subpfam_hsp, msa_segments_for_cds,
    record_alignment, record_hsp, record_hsps, record_msa_segment, register_cds,
};
use bgcstore::{BgcId, CdsId, EntityKind, HmmId, HspId, Store, StoreError};
use tempfile::{TempDir, tempdir};

struct Fixture {
    _tmp: TempDir,
    store: Store,
    bgc: BgcId,
    cds: CdsId,
    hmm: HmmId,
}

fn cds_input(orf_id: i64) -> CdsInput {
    CdsInput {
        orf_id,
        nt_start: 100,
        nt_end: 1_300,
        strand: 1,
        locus_tag: Some(format!("SCO_{orf_id:04}")),
        protein_id: None,
        product: Some("polyketide synthase".to_string()),
        biosynthetic: true,
        aa_seq: "MKRLTEQ".to_string(),
    }
}

fn hmm_input(name: &str) -> HmmInput {
    HmmInput {
        accession: None,
        name: name.to_string(),
        model_length: 250,
        model_type: HmmModelType::BigslicePfam,
    }
}

fn alignment() -> HspAlignment {
    HspAlignment {
        env_start: 10,
        env_end: 260,
        model_start: 1,
        model_end: 250,
        model_gaps: "".to_string(),
        cds_start: 12,
        cds_end: 258,
        cds_gaps: "45-47".to_string(),
    }
}

fn hsp(serial_nr: i64, cds: CdsId, hmm: HmmId, bitscore: f64) -> HspInput {
    HspInput {
        serial_nr,
        cds_id: cds,
        hmm_id: hmm,
        bitscore,
    }
}

fn fixture() -> Fixture {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();
    let ds = create_dataset(&store, "ds1", "/data/ds1", "").unwrap();
    let bgc = register_bgc(
        &store,
        ds,
        &BgcInput {
            name: "bgcA".to_string(),
            bgc_type: BgcType::As5,
            on_contig_edge: false,
            length_nt: 45_000,
            orig_folder: "a".to_string(),
            orig_filename: "region001.gbk".to_string(),
            product: None,
            organism: None,
        },
    )
    .unwrap();
    let cds = register_cds(&store, bgc, &cds_input(1)).unwrap();
    let hmm = register_hmm(&store, &hmm_input("PKS_KS")).unwrap();
    Fixture {
        _tmp: tmp,
        store,
        bgc,
        cds,
        hmm,
    }
}

#[test]
fn test_register_cds_validation() {
    let f = fixture();

    let err = register_cds(&f.store, f.bgc, &cds_input(1)).unwrap_err();
    assert!(err.is_duplicate(EntityKind::Cds), "{err}");

    let mut bad_strand = cds_input(2);
    bad_strand.strand = 2;
    assert!(matches!(
        register_cds(&f.store, f.bgc, &bad_strand).unwrap_err(),
        StoreError::InvalidStrand(2)
    ));

    let mut empty = cds_input(3);
    empty.aa_seq.clear();
    assert!(matches!(
        register_cds(&f.store, f.bgc, &empty).unwrap_err(),
        StoreError::EmptySequence
    ));

    let mut reversed = cds_input(4);
    reversed.nt_end = 50;
    assert!(matches!(
        register_cds(&f.store, f.bgc, &reversed).unwrap_err(),
        StoreError::InvalidRange { .. }
    ));

    let err = register_cds(&f.store, BgcId(404), &cds_input(5)).unwrap_err();
    assert!(err.is_not_found(EntityKind::Bgc));

    let mut reverse_strand = cds_input(6);
    reverse_strand.strand = -1;
    register_cds(&f.store, f.bgc, &reverse_strand).unwrap();

    let orfs: Vec<i64> = cds_for_bgc(&f.store, f.bgc)
        .unwrap()
        .iter()
        .map(|c| c.orf_id)
        .collect();
    assert_eq!(orfs, vec![1, 6]);
    let stored = get_cds(&f.store, f.cds).unwrap();
    assert_eq!(stored.locus_tag.as_deref(), Some("SCO_0001"));
    assert!(stored.biosynthetic);
}

#[test]
fn test_hsp_families_are_independent() {
    let f = fixture();

    record_hsp(&f.store, HspFamily::Primary, &hsp(1, f.cds, f.hmm, 10.0)).unwrap();
    let err = record_hsp(&f.store, HspFamily::Primary, &hsp(1, f.cds, f.hmm, 10.0)).unwrap_err();
    assert!(err.is_duplicate(EntityKind::Hsp), "{err}");

    record_hsp(&f.store, HspFamily::Bigslice, &hsp(1, f.cds, f.hmm, 10.0)).unwrap();

    // A second scan pass may hit the same pair under a new serial number.
    record_hsp(&f.store, HspFamily::Primary, &hsp(2, f.cds, f.hmm, 12.0)).unwrap();

    assert_eq!(hsps_for_cds(&f.store, HspFamily::Primary, f.cds).unwrap().len(), 2);
    assert_eq!(hsps_for_cds(&f.store, HspFamily::Bigslice, f.cds).unwrap().len(), 1);
}

#[test]
fn test_hsp_requires_existing_cds_and_hmm() {
    let f = fixture();

    let err = record_hsp(&f.store, HspFamily::Primary, &hsp(1, CdsId(77), f.hmm, 1.0)).unwrap_err();
    assert!(err.is_not_found(EntityKind::Cds));
    let err = record_hsp(&f.store, HspFamily::Primary, &hsp(1, f.cds, HmmId(77), 1.0)).unwrap_err();
    assert!(err.is_not_found(EntityKind::Hmm));
}

#[test]
fn test_hsp_rejects_non_finite_bitscore() {
    let f = fixture();

    for score in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let err = record_hsp(&f.store, HspFamily::Primary, &hsp(1, f.cds, f.hmm, score)).unwrap_err();
        assert!(matches!(err, StoreError::ValidationError(_)), "{err}");
    }

    let batch = vec![hsp(1, f.cds, f.hmm, 12.0), hsp(2, f.cds, f.hmm, f64::NAN)];
    let err = record_hsps(&f.store, HspFamily::Bigslice, &batch).unwrap_err();
    assert!(matches!(err, StoreError::ValidationError(_)), "{err}");
    assert!(hsps_for_cds(&f.store, HspFamily::Bigslice, f.cds).unwrap().is_empty());
}

#[test]
fn test_hsp_batch_is_all_or_nothing() {
    let f = fixture();
    let other = register_hmm(&f.store, &hmm_input("Condensation")).unwrap();

    let batch = vec![
        hsp(1, f.cds, f.hmm, 50.0),
        hsp(1, f.cds, other, 40.0),
        hsp(1, f.cds, f.hmm, 50.0),
    ];
    let err = record_hsps(&f.store, HspFamily::Primary, &batch).unwrap_err();
    assert!(err.is_duplicate(EntityKind::Hsp));
    assert!(hsps_for_cds(&f.store, HspFamily::Primary, f.cds).unwrap().is_empty());

    let ids = record_hsps(&f.store, HspFamily::Primary, &batch[..2]).unwrap();
    assert_eq!(ids.len(), 2);
}

#[test]
fn test_hsp_queries_order_by_bitscore() {
    let f = fixture();
    let h2 = register_hmm(&f.store, &hmm_input("AMP-binding")).unwrap();
    let h3 = register_hmm(&f.store, &hmm_input("PP-binding")).unwrap();
    let cds2 = register_cds(&f.store, f.bgc, &cds_input(2)).unwrap();

    record_hsp(&f.store, HspFamily::Primary, &hsp(1, f.cds, f.hmm, 20.5)).unwrap();
    record_hsp(&f.store, HspFamily::Primary, &hsp(1, f.cds, h2, 85.3)).unwrap();
    record_hsp(&f.store, HspFamily::Primary, &hsp(1, f.cds, h3, 42.0)).unwrap();
    record_hsp(&f.store, HspFamily::Primary, &hsp(1, cds2, h2, 99.0)).unwrap();
    record_hsp(&f.store, HspFamily::Bigslice, &hsp(1, cds2, h3, 500.0)).unwrap();

    let scores: Vec<f64> = hsps_for_cds(&f.store, HspFamily::Primary, f.cds)
        .unwrap()
        .iter()
        .map(|h| h.bitscore)
        .collect();
    assert_eq!(scores, vec![85.3, 42.0, 20.5]);

    let above: Vec<f64> = hsps_above_score(&f.store, HspFamily::Primary, 42.0)
        .unwrap()
        .iter()
        .map(|h| h.bitscore)
        .collect();
    assert_eq!(above, vec![99.0, 85.3, 42.0]);

    let bigslice = hsps_above_score(&f.store, HspFamily::Bigslice, 0.0).unwrap();
    assert_eq!(bigslice.len(), 1);
    assert_eq!(bigslice[0].family, HspFamily::Bigslice);
}

#[test]
fn test_alignment_is_one_per_hsp() {
    let f = fixture();
    let id = record_hsp(&f.store, HspFamily::Primary, &hsp(1, f.cds, f.hmm, 30.0)).unwrap();

    record_alignment(&f.store, HspFamily::Primary, id, &alignment()).unwrap();
    let err = record_alignment(&f.store, HspFamily::Primary, id, &alignment()).unwrap_err();
    assert!(err.is_duplicate(EntityKind::HspAlignment), "{err}");
    assert_eq!(
        get_alignment(&f.store, HspFamily::Primary, id).unwrap(),
        Some(alignment())
    );
    assert_eq!(get_alignment(&f.store, HspFamily::Bigslice, id).unwrap(), None);

    let err = record_alignment(&f.store, HspFamily::Primary, HspId(404), &alignment()).unwrap_err();
    assert!(err.is_not_found(EntityKind::Hsp));

    // The bigslice family has its own hit ids; this one does not exist there.
    let err = record_alignment(&f.store, HspFamily::Bigslice, id, &alignment()).unwrap_err();
    assert!(err.is_not_found(EntityKind::Hsp));
}

#[test]
fn test_alignment_ranges() {
    let f = fixture();
    let id = record_hsp(&f.store, HspFamily::Primary, &hsp(1, f.cds, f.hmm, 30.0)).unwrap();

    let mut bad = alignment();
    bad.model_end = 0;
    let err = record_alignment(&f.store, HspFamily::Primary, id, &bad).unwrap_err();
    assert!(matches!(err, StoreError::InvalidRange { field: "model", .. }), "{err}");

    let mut bad = alignment();
    bad.cds_start = 300;
    assert!(record_alignment(&f.store, HspFamily::Primary, id, &bad).is_err());
    assert_eq!(get_alignment(&f.store, HspFamily::Primary, id).unwrap(), None);
}

#[test]
fn test_subpfam_hsp_links() {
    let f = fixture();
    let sub_hmm = register_hmm(&f.store, &hmm_input("PKS_KS.1")).unwrap();
    let parent = record_hsp(&f.store, HspFamily::Primary, &hsp(1, f.cds, f.hmm, 80.0)).unwrap();
    let sub = record_hsp(&f.store, HspFamily::Primary, &hsp(1, f.cds, sub_hmm, 60.0)).unwrap();

    let err = link_subpfam_hsp(&f.store, HspFamily::Primary, sub, sub).unwrap_err();
    assert!(matches!(err, StoreError::SelfReference { .. }));

    link_subpfam_hsp(&f.store, HspFamily::Primary, sub, parent).unwrap();
    let err = link_subpfam_hsp(&f.store, HspFamily::Primary, sub, parent).unwrap_err();
    assert!(err.is_duplicate(EntityKind::HspSubProfileLink), "{err}");

    let err = link_subpfam_hsp(&f.store, HspFamily::Primary, parent, sub).unwrap_err();
    assert!(matches!(err, StoreError::CycleDetected { .. }), "{err}");

    assert_eq!(
        hsp_parents(&f.store, HspFamily::Primary, sub).unwrap(),
        vec![parent]
    );
    assert!(hsp_parents(&f.store, HspFamily::Primary, parent).unwrap().is_empty());
}

#[test]
fn test_msa_segments() {
    let f = fixture();

    record_msa_segment(&f.store, f.cds, f.hmm, 10, 260, "MKR--LTEQ").unwrap();
    let err = record_msa_segment(&f.store, f.cds, f.hmm, 10, 260, "other").unwrap_err();
    assert!(err.is_duplicate(EntityKind::MsaSegment), "{err}");

    record_msa_segment(&f.store, f.cds, f.hmm, 300, 420, "AAA").unwrap();

    let err = record_msa_segment(&f.store, f.cds, f.hmm, 50, 40, "x").unwrap_err();
    assert!(matches!(err, StoreError::InvalidRange { .. }));
    let err = record_msa_segment(&f.store, CdsId(404), f.hmm, 1, 2, "x").unwrap_err();
    assert!(err.is_not_found(EntityKind::Cds));

    let segments = msa_segments_for_cds(&f.store, f.cds).unwrap();
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].alignment, "MKR--LTEQ");
    assert_eq!(segments[1].env_start, 300);
}

// Integration tests for the proration engine:
//   the two-block scenario, mass conservation, ceilings, round trips, dissolve.

use apportion::{
    aggregate, aggregate_spatial, assign, assign_by_geo_id, dissolve, prorate, prorate_spatial,
    Diagnostic, EngineError, Fallback, GeoType, GeometrySet, Tolerance,
};
use geo::{polygon, Area, MultiPolygon};

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
    MultiPolygon::new(vec![polygon![
        (x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1), (x: x0, y: y0),
    ]])
}

fn set(name: &str, ty: GeoType, units: Vec<(&str, MultiPolygon<f64>)>) -> GeometrySet {
    let (ids, shapes): (Vec<String>, Vec<_>) = units.into_iter().map(|(id, shape)| (id.to_string(), shape)).unzip();
    GeometrySet::new(name, ty, ids, shapes, Some(26915)).unwrap()
}

fn cols(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

/// One group S = [0,4]x[0,1] holding 100 people, split into blocks
/// A = [0,1]x[0,1] (weight 10) and B = [1,4]x[0,1] (weight 30).
fn two_blocks() -> (GeometrySet, GeometrySet) {
    let mut group = set("groups", GeoType::Group, vec![("270530001001", rect(0.0, 0.0, 4.0, 1.0))]);
    group.set_column_f64("TOTPOP", vec![40.0]).unwrap();
    group.set_column_f64("POP19", vec![100.0]).unwrap();

    let mut blocks = set("blocks", GeoType::Block, vec![
        ("270530001001000", rect(0.0, 0.0, 1.0, 1.0)),
        ("270530001001001", rect(1.0, 0.0, 4.0, 1.0)),
    ]);
    blocks.set_column_f64("TOTPOP", vec![10.0, 30.0]).unwrap();
    (group, blocks)
}

#[test]
fn two_block_scenario() {
    let (group, mut blocks) = two_blocks();
    let report = prorate_spatial(&mut blocks, &group, "TOTPOP", "TOTPOP", &cols(&["POP19"]), Fallback::Drop).unwrap();

    assert_eq!(blocks.column_f64("POP19").unwrap(), vec![25.0, 75.0]);
    assert!(report.diagnostics(&Tolerance::default()).is_empty());

    let mut back = set("groups", GeoType::Group, vec![("270530001001", rect(0.0, 0.0, 4.0, 1.0))]);
    let assignment = assign(&blocks, &back).unwrap();
    let report = aggregate(&blocks, &mut back, &assignment, &cols(&["POP19"])).unwrap();
    assert_eq!(back.column_f64("POP19").unwrap(), vec![100.0]);
    assert!(report.is_balanced(&Tolerance::default()));
}

/// Three groups over a 3x2 grid of blocks, one group with no weight at all.
fn grid() -> (GeometrySet, GeometrySet) {
    let mut groups = set("groups", GeoType::Group, vec![
        ("g1", rect(0.0, 0.0, 2.0, 2.0)),
        ("g2", rect(2.0, 0.0, 4.0, 2.0)),
        ("g3", rect(4.0, 0.0, 6.0, 2.0)),
    ]);
    groups.set_column_f64("TOTPOP", vec![9.0, 12.0, 6.0]).unwrap();
    groups.set_column_f64("BLACK", vec![3.0, 12.0, 1.0]).unwrap();
    groups.set_column_f64("HISP", vec![0.5, 7.25, 2.0]).unwrap();
    groups.set_column_f64("w", vec![4.0, 4.0, 0.0]).unwrap();

    let mut blocks = set("blocks", GeoType::Custom, (0..6)
        .map(|i| {
            let (x, y) = ((i % 3) as f64 * 2.0, (i / 3) as f64);
            (["b0", "b1", "b2", "b3", "b4", "b5"][i], rect(x, y, x + 2.0, y + 1.0))
        })
        .collect());
    // g3 covers b2 and b5, both empty
    blocks.set_column_f64("w", vec![1.0, 2.0, 0.0, 3.0, 2.0, 0.0]).unwrap();
    (groups, blocks)
}

#[test]
fn mass_is_conserved_except_for_zero_weight_groups() {
    let (groups, mut blocks) = grid();
    let assignment = assign(&blocks, &groups).unwrap();
    assert!(assignment.unassigned().is_empty());

    let columns = cols(&["TOTPOP", "BLACK", "HISP"]);
    let report = prorate(&mut blocks, &groups, &assignment, "w", "w", &columns).unwrap();
    let tol = Tolerance::default();

    assert_eq!(report.zero_weight_groups.len(), 1);
    assert_eq!(report.zero_weight_groups[0].0.id(), "g3");
    for (balance, lost) in report.balances.iter().zip([6.0, 1.0, 2.0]) {
        assert!(tol.is_close(balance.target_sum + lost, balance.source_sum), "{balance:?}");
    }
    assert!(blocks.column_f64("BLACK").unwrap().iter().all(|v| v.is_finite() && *v >= 0.0));
}

#[test]
fn prorated_columns_stay_under_their_total() {
    let (groups, mut blocks) = grid();
    let assignment = assign(&blocks, &groups).unwrap();
    let mut report = prorate(&mut blocks, &groups, &assignment, "w", "w", &cols(&["TOTPOP", "BLACK", "HISP"])).unwrap();

    let total = blocks.column_f64("TOTPOP").unwrap();
    for column in ["BLACK", "HISP"] {
        for (value, total) in blocks.column_f64(column).unwrap().iter().zip(&total) {
            assert!(*value <= total + 1e-9);
        }
    }
    report.check_ceiling(&blocks, "TOTPOP").unwrap();
    assert!(report.ceiling_violations.is_empty());
}

#[test]
fn aggregate_undoes_prorate_for_weighted_groups() {
    let (mut groups, mut blocks) = grid();
    let assignment = assign(&blocks, &groups).unwrap();
    prorate(&mut blocks, &groups, &assignment, "w", "w", &cols(&["BLACK"])).unwrap();

    let original = groups.column_f64("BLACK").unwrap();
    aggregate(&blocks, &mut groups, &assignment, &cols(&["BLACK"])).unwrap();
    let round_trip = groups.column_f64("BLACK").unwrap();

    let tol = Tolerance::default();
    assert!(tol.is_close(round_trip[0], original[0]));
    assert!(tol.is_close(round_trip[1], original[1]));
    assert_eq!(round_trip[2], 0.0);
}

#[test]
fn repeated_runs_are_identical() {
    let run = || {
        let (groups, mut blocks) = grid();
        prorate_spatial(&mut blocks, &groups, "w", "w", &cols(&["HISP"]), Fallback::Nearest).unwrap();
        blocks.column_f64("HISP").unwrap()
    };
    let first = run();
    for _ in 0..3 {
        assert_eq!(run(), first);
    }
}

#[test]
fn weighted_grid_has_no_weight_mismatches() {
    let (groups, mut blocks) = grid();
    let assignment = assign(&blocks, &groups).unwrap();
    let report = prorate(&mut blocks, &groups, &assignment, "w", "w", &cols(&["TOTPOP"])).unwrap();
    assert!(report.weight_mismatches.is_empty());
}

/// Group S = [0,2]x[0,1] and a far group T; block B = [3,4]x[0,1] overlaps neither.
fn stray_block() -> (GeometrySet, GeometrySet) {
    let mut groups = set("groups", GeoType::Custom, vec![
        ("S", rect(0.0, 0.0, 2.0, 1.0)),
        ("T", rect(10.0, 0.0, 12.0, 1.0)),
    ]);
    groups.set_column_f64("w", vec![2.0, 0.0]).unwrap();
    groups.set_column_f64("pop", vec![10.0, 0.0]).unwrap();

    let mut blocks = set("blocks", GeoType::Custom, vec![
        ("A", rect(0.0, 0.0, 1.0, 1.0)),
        ("B", rect(3.0, 0.0, 4.0, 1.0)),
    ]);
    blocks.set_column_f64("w", vec![1.0, 1.0]).unwrap();
    (groups, blocks)
}

#[test]
fn nearest_fallback_is_reported_by_prorate() {
    let (groups, mut blocks) = stray_block();
    let report = prorate_spatial(&mut blocks, &groups, "w", "w", &cols(&["pop"]), Fallback::Nearest).unwrap();

    assert_eq!(blocks.column_f64("pop").unwrap(), vec![5.0, 5.0]);
    assert!(report.unassigned.is_empty());
    assert_eq!(report.nearest_filled.len(), 1);
    assert_eq!(report.nearest_filled[0].id(), "B");
    assert!(report.diagnostics(&Tolerance::default()).iter()
        .any(|d| matches!(d, Diagnostic::NearestFilled { geo_id } if geo_id.id() == "B")));

    let (groups, mut blocks) = stray_block();
    let report = prorate_spatial(&mut blocks, &groups, "w", "w", &cols(&["pop"]), Fallback::Drop).unwrap();
    assert!(report.nearest_filled.is_empty());
    assert_eq!(report.unassigned[0].id(), "B");
}

#[test]
fn nearest_fallback_is_reported_by_aggregate() {
    let (mut groups, blocks) = stray_block();
    let report = aggregate_spatial(&blocks, &mut groups, &cols(&["w"]), Fallback::Nearest).unwrap();

    assert_eq!(groups.column_f64("w").unwrap(), vec![2.0, 0.0]);
    assert_eq!(report.nearest_filled[0].id(), "B");
    assert!(report.is_balanced(&Tolerance::default()));
    assert!(report.diagnostics(&Tolerance::default()).iter()
        .any(|d| matches!(d, Diagnostic::NearestFilled { .. })));
}

#[test]
fn crs_mismatch_is_rejected() {
    let (groups, blocks) = grid();
    let moved = GeometrySet::new(
        "groups", GeoType::Group,
        groups.geo_ids().iter().map(|geo_id| geo_id.id().to_string()).collect(),
        groups.shapes().to_vec(),
        Some(4269),
    ).unwrap();
    assert!(matches!(assign(&blocks, &moved), Err(EngineError::CrsMismatch { fine: 26915, coarse: 4269 })));
}

#[test]
fn nested_levels_assign_by_prefix() {
    let (group, blocks) = two_blocks();
    let assignment = assign_by_geo_id(&blocks, &group).unwrap();
    assert_eq!(assignment.parents(), &[Some(0), Some(0)]);

    assert!(matches!(
        assign_by_geo_id(&group, &blocks),
        Err(EngineError::NotNested { fine: GeoType::Group, coarse: GeoType::Block })
    ));
}

#[test]
fn dissolve_unions_and_sums_by_district() {
    let (_, mut blocks) = grid();
    let table = polars::df!(
        "geo_id" => ["b0", "b1", "b2", "b3", "b4", "b5"],
        "CONGDIST" => [Some(1i64), Some(1), Some(2), Some(1), Some(2), None],
    ).unwrap();
    blocks.merge_data(table, "geo_id").unwrap();

    let (districts, report) = dissolve(&blocks, "CONGDIST", &cols(&["w"]), "districts").unwrap();
    let report = report.unwrap();

    assert_eq!(districts.geo_ids().iter().map(|g| g.id()).collect::<Vec<_>>(), vec!["1", "2"]);
    assert_eq!(districts.column_f64("w").unwrap(), vec![6.0, 2.0]);
    assert_eq!(report.unassigned[0].id(), "b5");

    let areas = districts.shapes().iter().map(|shape| shape.unsigned_area()).collect::<Vec<_>>();
    assert!((areas[0] - 6.0).abs() < 1e-6 && (areas[1] - 4.0).abs() < 1e-6);
}

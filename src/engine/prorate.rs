use overlay::Assignment;
use tracing::debug;

use crate::{
    engine::{assign_with_fallback, report::{ColumnBalance, ProrateReport, Tolerance}, Fallback},
    error::{EngineError, Result},
    layer::GeometrySet,
};

/// Distribute `columns` of `source` over the units of `target` assigned to them.
///
/// Each target unit `t` assigned to source unit `s` receives
/// `w(t) / Σ w(u) * s.c` for every column `c`, where the sum runs over all
/// target units assigned to `s` and `w` is `target_weight`. Groups whose
/// weights sum to zero, and unassigned target units, receive exactly 0.
///
/// `source_weight` is only used to report groups whose summed target weight
/// disagrees with the source unit's own weight.
pub fn prorate(
    target: &mut GeometrySet,
    source: &GeometrySet,
    assignment: &Assignment,
    target_weight: &str,
    source_weight: &str,
    columns: &[String],
) -> Result<ProrateReport> {
    if assignment.len() != target.len() {
        return Err(EngineError::LengthMismatch {
            what: format!("assignment of {}", target.name()),
            expected: target.len(),
            found: assignment.len(),
        });
    }

    let weights = target.column_f64(target_weight)?;
    if let Some((i, &value)) = weights.iter().enumerate().find(|&(_, &w)| w < 0.0 || w.is_nan()) {
        return Err(EngineError::NegativeWeight {
            column: target_weight.to_string(),
            geo_id: target.geo_ids()[i].to_string(),
            value,
        });
    }
    let source_weights = source.column_f64(source_weight)?;

    // Read every value column before touching the target.
    let values = columns.iter()
        .map(|column| source.column_f64(column))
        .collect::<Result<Vec<_>>>()?;

    // Sum of target weights per source unit.
    let groups = assignment.groups(source.len());
    let group_weights = groups.iter()
        .map(|children| children.iter().map(|&i| weights[i]).sum::<f64>())
        .collect::<Vec<_>>();

    // Share of its source unit's value that each target unit receives.
    let shares = (0..target.len())
        .map(|i| match assignment.get(i) {
            Some(j) if group_weights[j as usize] > 0.0 => weights[i] / group_weights[j as usize],
            _ => 0.0,
        })
        .collect::<Vec<_>>();

    let tol = Tolerance::default();
    let mut report = ProrateReport {
        unassigned: crate::engine::unassigned_ids(target, assignment),
        ..Default::default()
    };
    for (j, children) in groups.iter().enumerate().filter(|(_, children)| !children.is_empty()) {
        if group_weights[j] == 0.0 {
            report.zero_weight_groups.push((source.geo_ids()[j].clone(), children.len()));
        }
        if !tol.is_close(group_weights[j], source_weights[j]) {
            report.weight_mismatches.push((source.geo_ids()[j].clone(), source_weights[j], group_weights[j]));
        }
    }

    for (column, source_values) in columns.iter().zip(values) {
        let prorated = (0..target.len())
            .map(|i| match assignment.get(i) {
                Some(j) => shares[i] * source_values[j as usize],
                None => 0.0,
            })
            .collect::<Vec<_>>();

        report.balances.push(ColumnBalance {
            column: column.clone(),
            source_sum: source_values.iter().sum(),
            target_sum: prorated.iter().sum(),
        });
        target.set_column_f64(column, prorated)?;
    }

    debug!(
        "[engine::prorate] {} -> {}: {} columns weighted by {target_weight}",
        source.name(), target.name(), columns.len(),
    );
    Ok(report)
}

/// [`prorate`] with a spatial assignment computed on the spot.
pub fn prorate_spatial(
    target: &mut GeometrySet,
    source: &GeometrySet,
    target_weight: &str,
    source_weight: &str,
    columns: &[String],
    fallback: Fallback,
) -> Result<ProrateReport> {
    let (assignment, nearest_filled) = assign_with_fallback(target, source, fallback)?;
    let report = prorate(target, source, &assignment, target_weight, source_weight, columns)?;
    Ok(ProrateReport { nearest_filled, ..report })
}

#[cfg(test)]
mod tests {
    use geo::MultiPolygon;

    use crate::types::GeoType;
    use super::*;

    fn set(name: &str, ids: &[&str]) -> GeometrySet {
        GeometrySet::new(
            name, GeoType::Custom,
            ids.iter().map(|id| id.to_string()).collect(),
            vec![MultiPolygon::new(vec![]); ids.len()],
            None,
        ).unwrap()
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn splits_by_target_weight_share() {
        let mut fine = set("fine", &["A", "B"]);
        fine.set_column_f64("w", vec![10.0, 30.0]).unwrap();
        let mut coarse = set("coarse", &["S"]);
        coarse.set_column_f64("w", vec![40.0]).unwrap();
        coarse.set_column_f64("pop", vec![100.0]).unwrap();

        let assignment = Assignment::from_parents(vec![Some(0), Some(0)]);
        let report = prorate(&mut fine, &coarse, &assignment, "w", "w", &cols(&["pop"])).unwrap();

        assert_eq!(fine.column_f64("pop").unwrap(), vec![25.0, 75.0]);
        assert!(report.diagnostics(&Tolerance::default()).is_empty());
        assert_eq!(report.balances[0].delta(), 0.0);
    }

    #[test]
    fn zero_weight_group_is_zero_filled() {
        let mut fine = set("fine", &["A", "B", "C"]);
        fine.set_column_f64("w", vec![0.0, 0.0, 5.0]).unwrap();
        let mut coarse = set("coarse", &["S", "T"]);
        coarse.set_column_f64("w", vec![0.0, 5.0]).unwrap();
        coarse.set_column_f64("pop", vec![12.0, 7.0]).unwrap();

        let assignment = Assignment::from_parents(vec![Some(0), Some(0), Some(1)]);
        let report = prorate(&mut fine, &coarse, &assignment, "w", "w", &cols(&["pop"])).unwrap();

        let values = fine.column_f64("pop").unwrap();
        assert_eq!(values, vec![0.0, 0.0, 7.0]);
        assert!(values.iter().all(|v| !v.is_nan()));
        assert_eq!(report.zero_weight_groups.len(), 1);
        assert_eq!(report.zero_weight_groups[0].0.id(), "S");
        assert_eq!(report.balances[0].delta(), -12.0);
    }

    #[test]
    fn unassigned_targets_get_zero_and_are_reported() {
        let mut fine = set("fine", &["A", "B"]);
        fine.set_column_f64("w", vec![1.0, 1.0]).unwrap();
        let mut coarse = set("coarse", &["S"]);
        coarse.set_column_f64("w", vec![1.0]).unwrap();
        coarse.set_column_f64("pop", vec![9.0]).unwrap();

        let assignment = Assignment::from_parents(vec![Some(0), None]);
        let report = prorate(&mut fine, &coarse, &assignment, "w", "w", &cols(&["pop"])).unwrap();

        assert_eq!(fine.column_f64("pop").unwrap(), vec![9.0, 0.0]);
        assert_eq!(report.unassigned.len(), 1);
        assert_eq!(report.unassigned[0].id(), "B");
    }

    #[test]
    fn missing_columns_fail_before_writing() {
        let mut fine = set("fine", &["A"]);
        fine.set_column_f64("w", vec![1.0]).unwrap();
        let mut coarse = set("coarse", &["S"]);
        coarse.set_column_f64("w", vec![1.0]).unwrap();
        coarse.set_column_f64("pop", vec![1.0]).unwrap();
        let assignment = Assignment::from_parents(vec![Some(0)]);

        let err = prorate(&mut fine, &coarse, &assignment, "w", "w", &cols(&["pop", "vap"])).unwrap_err();
        assert!(matches!(err, EngineError::MissingColumn { ref column, .. } if column == "vap"));
        assert!(!fine.has_column("pop"));

        let err = prorate(&mut fine, &coarse, &assignment, "nope", "w", &cols(&["pop"])).unwrap_err();
        assert!(matches!(err, EngineError::MissingColumn { ref column, .. } if column == "nope"));
    }

    #[test]
    fn negative_weights_are_rejected() {
        let mut fine = set("fine", &["A"]);
        fine.set_column_f64("w", vec![-1.0]).unwrap();
        let mut coarse = set("coarse", &["S"]);
        coarse.set_column_f64("w", vec![1.0]).unwrap();
        let assignment = Assignment::from_parents(vec![Some(0)]);
        let err = prorate(&mut fine, &coarse, &assignment, "w", "w", &[]).unwrap_err();
        assert!(matches!(err, EngineError::NegativeWeight { value, .. } if value == -1.0));
    }

    #[test]
    fn weight_mismatch_is_reported() {
        let mut fine = set("fine", &["A", "B"]);
        fine.set_column_f64("w", vec![10.0, 20.0]).unwrap();
        let mut coarse = set("coarse", &["S"]);
        coarse.set_column_f64("w", vec![40.0]).unwrap();
        coarse.set_column_f64("pop", vec![90.0]).unwrap();
        let assignment = Assignment::from_parents(vec![Some(0), Some(0)]);

        let report = prorate(&mut fine, &coarse, &assignment, "w", "w", &cols(&["pop"])).unwrap();
        assert_eq!(report.weight_mismatches.len(), 1);
        assert_eq!(report.weight_mismatches[0].1, 40.0);
        assert_eq!(report.weight_mismatches[0].2, 30.0);
        let values = fine.column_f64("pop").unwrap();
        assert!((values[0] - 30.0).abs() < 1e-9 && (values[1] - 60.0).abs() < 1e-9);
    }

    #[test]
    fn ceiling_violation_is_reported() {
        let mut fine = set("fine", &["A", "B"]);
        fine.set_column_f64("w", vec![1.0, 1.0]).unwrap();
        fine.set_column_f64("TOTPOP", vec![5.0, 5.0]).unwrap();
        let mut coarse = set("coarse", &["S"]);
        coarse.set_column_f64("w", vec![2.0]).unwrap();
        coarse.set_column_f64("BLACK", vec![12.0]).unwrap();
        let assignment = Assignment::from_parents(vec![Some(0), Some(0)]);

        let mut report = prorate(&mut fine, &coarse, &assignment, "w", "w", &cols(&["BLACK"])).unwrap();
        report.check_ceiling(&fine, "TOTPOP").unwrap();
        assert_eq!(report.ceiling_violations, vec![("BLACK".to_string(), 12.0, "TOTPOP".to_string(), 10.0)]);
    }
}

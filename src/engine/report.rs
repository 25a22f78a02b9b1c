use std::fmt;

use tracing::{info, warn};

use crate::{error::Result, layer::GeometrySet, types::GeoId};

/// `isclose`-style comparison: `|a - b| <= atol + rtol * |b|`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub rtol: f64,
    pub atol: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self { rtol: 1e-5, atol: 1e-8 }
    }
}

impl Tolerance {
    #[inline]
    pub fn is_close(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.atol + self.rtol * b.abs()
    }
}

/// Source and target totals of one column after a prorate or aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnBalance {
    pub column: String,
    pub source_sum: f64,
    pub target_sum: f64,
}

impl ColumnBalance {
    /// Target minus source.
    #[inline] pub fn delta(&self) -> f64 { self.target_sum - self.source_sum }

    /// Delta relative to the source total (0 when both are 0).
    pub fn relative_delta(&self) -> f64 {
        if self.source_sum == 0.0 {
            if self.target_sum == 0.0 { 0.0 } else { f64::INFINITY }
        } else {
            self.delta() / self.source_sum.abs()
        }
    }

    #[inline] pub fn is_close(&self, tol: &Tolerance) -> bool {
        tol.is_close(self.target_sum, self.source_sum)
    }
}

/// A recoverable data-quality finding. None of these stop a job.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// All units assigned to this source unit have zero weight; they were zero-filled.
    ZeroWeightGroup { source: GeoId, children: usize },
    /// A unit has no counterpart in the other set.
    UnassignedUnit { geo_id: GeoId },
    /// A unit overlapped nothing and was assigned to the unit with the nearest centroid.
    NearestFilled { geo_id: GeoId },
    /// A target unit received no source units and was zero-filled.
    EmptyTarget { geo_id: GeoId },
    /// Column totals diverge beyond tolerance.
    MassConservation { column: String, source_sum: f64, target_sum: f64 },
    /// A prorated column sums to more than the total-population column.
    CeilingExceeded { column: String, sum: f64, ceiling_column: String, ceiling: f64 },
    /// The summed target weights of a group disagree with the source unit's own weight.
    WeightMismatch { source: GeoId, source_weight: f64, target_weight: f64 },
    /// A reported total was replaced by the sum of its detail lines.
    TotalNormalized { geo_id: GeoId, reported: f64, computed: f64 },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::ZeroWeightGroup { source, children } =>
                write!(f, "{source}: {children} assigned units all have zero weight; filled with 0"),
            Diagnostic::UnassignedUnit { geo_id } =>
                write!(f, "{geo_id}: no spatial counterpart"),
            Diagnostic::NearestFilled { geo_id } =>
                write!(f, "{geo_id}: no overlap; assigned to the nearest unit"),
            Diagnostic::EmptyTarget { geo_id } =>
                write!(f, "{geo_id}: no units assigned; filled with 0"),
            Diagnostic::MassConservation { column, source_sum, target_sum } =>
                write!(f, "{column}: target sum {target_sum} differs from source sum {source_sum} by {}", target_sum - source_sum),
            Diagnostic::CeilingExceeded { column, sum, ceiling_column, ceiling } =>
                write!(f, "{column}: sum {sum} exceeds {ceiling_column} sum {ceiling}"),
            Diagnostic::WeightMismatch { source, source_weight, target_weight } =>
                write!(f, "{source}: source weight {source_weight} but assigned units sum to {target_weight}"),
            Diagnostic::TotalNormalized { geo_id, reported, computed } =>
                write!(f, "{geo_id}: reported total {reported} replaced by line sum {computed}"),
        }
    }
}

/// Log a list of diagnostics under `tag`, summarizing long lists.
pub fn log_diagnostics(tag: &str, diagnostics: &[Diagnostic]) {
    const SHOWN: usize = 20;
    for diagnostic in diagnostics.iter().take(SHOWN) {
        warn!("[{tag}] {diagnostic}");
    }
    if diagnostics.len() > SHOWN {
        warn!("[{tag}] ... and {} more", diagnostics.len() - SHOWN);
    }
}

fn nearest_diagnostics(filled: &[GeoId]) -> impl Iterator<Item = Diagnostic> + '_ {
    filled.iter().map(|geo_id| Diagnostic::NearestFilled { geo_id: geo_id.clone() })
}

fn balance_diagnostics(balances: &[ColumnBalance], tol: &Tolerance) -> impl Iterator<Item = Diagnostic> {
    balances.iter()
        .filter(|balance| !balance.is_close(tol))
        .map(|balance| Diagnostic::MassConservation {
            column: balance.column.clone(),
            source_sum: balance.source_sum,
            target_sum: balance.target_sum,
        })
}

/// Outcome of a proration.
#[derive(Debug, Clone, Default)]
pub struct ProrateReport {
    /// Target units with no source unit; their columns were set to 0.
    pub unassigned: Vec<GeoId>,
    /// Target units assigned by nearest centroid because they overlapped nothing.
    pub nearest_filled: Vec<GeoId>,
    /// Source units whose assigned targets all had zero weight, with group sizes.
    pub zero_weight_groups: Vec<(GeoId, usize)>,
    /// Source units whose weight disagrees with the summed target weights.
    pub weight_mismatches: Vec<(GeoId, f64, f64)>,
    pub balances: Vec<ColumnBalance>,
    /// Columns whose target sum exceeds the ceiling column, with both sums.
    pub ceiling_violations: Vec<(String, f64, String, f64)>,
}

impl ProrateReport {
    /// Flag every prorated column whose target sum exceeds the sum of `total_column`.
    pub fn check_ceiling(&mut self, target: &GeometrySet, total_column: &str) -> Result<()> {
        let ceiling = target.column_sum(total_column)?;
        for balance in &self.balances {
            if balance.column != total_column && balance.target_sum > ceiling {
                self.ceiling_violations.push((
                    balance.column.clone(),
                    balance.target_sum,
                    total_column.to_string(),
                    ceiling,
                ));
            }
        }
        Ok(())
    }

    /// All findings of this report.
    pub fn diagnostics(&self, tol: &Tolerance) -> Vec<Diagnostic> {
        self.unassigned.iter()
            .map(|geo_id| Diagnostic::UnassignedUnit { geo_id: geo_id.clone() })
            .chain(nearest_diagnostics(&self.nearest_filled))
            .chain(self.zero_weight_groups.iter()
                .map(|(source, children)| Diagnostic::ZeroWeightGroup { source: source.clone(), children: *children }))
            .chain(self.weight_mismatches.iter()
                .map(|(source, source_weight, target_weight)| Diagnostic::WeightMismatch {
                    source: source.clone(),
                    source_weight: *source_weight,
                    target_weight: *target_weight,
                }))
            .chain(balance_diagnostics(&self.balances, tol))
            .chain(self.ceiling_violations.iter()
                .map(|(column, sum, ceiling_column, ceiling)| Diagnostic::CeilingExceeded {
                    column: column.clone(),
                    sum: *sum,
                    ceiling_column: ceiling_column.clone(),
                    ceiling: *ceiling,
                }))
            .collect()
    }

    /// Log per-column deltas at info level and all findings at warn level.
    pub fn log(&self, tag: &str, tol: &Tolerance) {
        for balance in &self.balances {
            info!("[{tag}] {} delta={:.6} ({:.3e})", balance.column, balance.delta().abs(), balance.relative_delta());
        }
        log_diagnostics(tag, &self.diagnostics(tol));
    }
}

/// Outcome of an aggregation.
#[derive(Debug, Clone, Default)]
pub struct AggregateReport {
    /// Source units with no target unit; their values are not counted.
    pub unassigned: Vec<GeoId>,
    /// Source units assigned by nearest centroid because they overlapped nothing.
    pub nearest_filled: Vec<GeoId>,
    /// Target units that received no source units; filled with 0.
    pub empty_targets: Vec<GeoId>,
    pub balances: Vec<ColumnBalance>,
}

impl AggregateReport {
    /// All findings of this report.
    pub fn diagnostics(&self, tol: &Tolerance) -> Vec<Diagnostic> {
        self.unassigned.iter()
            .map(|geo_id| Diagnostic::UnassignedUnit { geo_id: geo_id.clone() })
            .chain(nearest_diagnostics(&self.nearest_filled))
            .chain(self.empty_targets.iter().map(|geo_id| Diagnostic::EmptyTarget { geo_id: geo_id.clone() }))
            .chain(balance_diagnostics(&self.balances, tol))
            .collect()
    }

    /// True if every column total matches within `tol`.
    pub fn is_balanced(&self, tol: &Tolerance) -> bool {
        self.balances.iter().all(|balance| balance.is_close(tol))
    }

    /// Log per-column deltas at info level and all findings at warn level.
    pub fn log(&self, tag: &str, tol: &Tolerance) {
        for balance in &self.balances {
            info!("[{tag}] {} delta={:.6}", balance.column, balance.delta().abs());
        }
        log_diagnostics(tag, &self.diagnostics(tol));
    }
}

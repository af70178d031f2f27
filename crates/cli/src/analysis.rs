//! Per-feature analysis: enrichment plus spatial autocorrelation

use anyhow::{bail, Context, Result};
use geomoran_algorithms::regions::{classify_point, enrichment, Enrichment, Region};
use geomoran_algorithms::spatial::{knn_weights, KnnWeightsParams};
use geomoran_algorithms::statistics::{
    global_morans_i, permutation_test, Degeneracy, MoransIResult, PermutationOutcome,
    PermutationParams,
};
use geomoran_core::FeatureDataset;
use serde::Serialize;
use tracing::{debug, info};

/// Autocorrelation is only attempted on datasets at least this large.
pub const MIN_SITES_FOR_MORAN: usize = 5;

/// Which categories of which feature count as "having the trait"
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSpec {
    pub feature_id: String,
    pub values: Vec<i64>,
    pub label: Option<String>,
}

impl TargetSpec {
    /// Parse `FEATURE=V1,V2[:LABEL]`, e.g. `18A=4,5,6:Absence of Nasals`.
    pub fn parse(s: &str) -> Result<Self> {
        let (feature_id, rest) = s
            .split_once('=')
            .with_context(|| format!("Target must be FEATURE=VALUES[:LABEL], got: {s}"))?;
        let (values, label) = match rest.split_once(':') {
            Some((v, l)) => (v, Some(l.trim().to_string()).filter(|l| !l.is_empty())),
            None => (rest, None),
        };
        let values = values
            .split(',')
            .map(|v| {
                v.trim()
                    .parse::<i64>()
                    .with_context(|| format!("Invalid category value: {v:?}"))
            })
            .collect::<Result<Vec<_>>>()?;
        let feature_id = feature_id.trim();
        if feature_id.is_empty() {
            bail!("Target has no feature id: {s}");
        }
        Ok(Self {
            feature_id: feature_id.to_string(),
            values,
            label,
        })
    }
}

/// Options shared by every feature analysed in a run
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    pub weights: KnnWeightsParams,
    /// `None` skips the permutation test
    pub permutation: Option<PermutationParams>,
}

impl AnalysisOptions {
    /// Check every parameter, whether or not a dataset will reach it.
    pub fn validate(&self) -> Result<()> {
        self.weights.validate().context("Invalid weights parameters")?;
        if let Some(params) = &self.permutation {
            params.validate().context("Invalid permutation parameters")?;
        }
        Ok(())
    }
}

/// A site carrying the trait, for listing in reports
#[derive(Debug, Clone, Serialize)]
pub struct TargetSite {
    pub code: String,
    pub name: String,
    pub region: Region,
}

/// Everything reported for one feature/target combination
#[derive(Debug, Clone, Serialize)]
pub struct FeatureAnalysis {
    pub feature_id: String,
    pub feature_name: String,
    pub label: String,
    pub target_values: Vec<i64>,
    pub total_sites: usize,
    pub target_count: usize,
    pub target_percentage: f64,
    pub enrichment: Enrichment,
    pub morans_i: MoransIResult,
    /// `None` when the permutation test was not requested
    pub permutation: Option<PermutationOutcome>,
    pub target_sites: Vec<TargetSite>,
}

/// Analyse one feature against a refugia baseline.
///
/// The indicator vector marks sites whose category is in `target.values`.
/// Datasets with fewer than [`MIN_SITES_FOR_MORAN`] sites report the
/// trivial Moran's I; the permutation test (when requested) runs through
/// its own applicability check.
///
/// Invalid options fail up front, even for datasets too small to use them.
pub fn analyze_feature(
    dataset: &FeatureDataset,
    target: &TargetSpec,
    baseline_refugia_percentage: f64,
    options: &AnalysisOptions,
) -> Result<FeatureAnalysis> {
    options.validate()?;
    let targets = dataset.target_sites(&target.values);
    let indicator = dataset.indicator(&target.values);
    let enrichment = enrichment(targets.iter().map(|s| &s.point), baseline_refugia_percentage);

    let (morans_i, permutation) = if dataset.len() >= MIN_SITES_FOR_MORAN {
        let weights = knn_weights(&dataset.point_set(), options.weights.clone())
            .context("Failed to build spatial weights")?;
        let morans_i = global_morans_i(&indicator, &weights)?;
        let permutation = options
            .permutation
            .as_ref()
            .map(|params| permutation_test(&indicator, &weights, params))
            .transpose()?;
        (morans_i, permutation)
    } else {
        debug!(
            "Feature {} has {} sites, skipping autocorrelation",
            dataset.id,
            dataset.len()
        );
        (MoransIResult::trivial(dataset.len(), Degeneracy::TooFewPoints), None)
    };

    let label = target
        .label
        .clone()
        .unwrap_or_else(|| format!("{} = {}", dataset.name, join_values(&target.values)));
    info!(
        "{}: {}/{} sites, I = {:.4}, p = {:.6}",
        label,
        targets.len(),
        dataset.len(),
        morans_i.i,
        morans_i.p_value
    );

    let target_percentage = if dataset.is_empty() {
        0.0
    } else {
        100.0 * targets.len() as f64 / dataset.len() as f64
    };

    Ok(FeatureAnalysis {
        feature_id: dataset.id.clone(),
        feature_name: dataset.name.clone(),
        label,
        target_values: target.values.clone(),
        total_sites: dataset.len(),
        target_count: targets.len(),
        target_percentage,
        enrichment,
        morans_i,
        permutation,
        target_sites: targets
            .iter()
            .map(|s| TargetSite {
                code: s.code.clone(),
                name: s.name.clone(),
                region: classify_point(&s.point),
            })
            .collect(),
    })
}

fn join_values(values: &[i64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

//! Text and JSON rendering of analysis results

use crate::analysis::FeatureAnalysis;
use anyhow::{Context, Result};
use geomoran_algorithms::regions::{Baseline, Region, RegionCounts};
use serde::Serialize;
use std::fmt;

/// Target lists longer than this are left out of the text report.
const MAX_LISTED_SITES: usize = 25;

/// Baseline of one input chapter
#[derive(Debug, Clone, Serialize)]
pub struct ChapterBaseline {
    pub feature_id: String,
    pub baseline: Baseline,
}

/// Everything produced by one `analyze` run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Over deduplicated sites of all inputs
    pub baseline: Baseline,
    pub chapters: Vec<ChapterBaseline>,
    pub features: Vec<FeatureAnalysis>,
}

impl Report {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize report")
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", BaselineBlock(&self.baseline))?;
        if !self.chapters.is_empty() {
            writeln!(f, "\nPer-chapter baselines:")?;
            for c in &self.chapters {
                writeln!(
                    f,
                    "  {}: N={:3}, Refugia={:.1}%",
                    c.feature_id, c.baseline.total, c.baseline.refugia_percentage
                )?;
            }
        }
        for feature in &self.features {
            write!(f, "{}", FeatureBlock::new(feature, &self.baseline))?;
        }
        if !self.features.is_empty() {
            write!(f, "{}", SummaryTable::new(&self.features, &self.baseline))?;
            write!(f, "{}", RegionalTable::new(&self.features))?;
        }
        Ok(())
    }
}

// ─── Baseline ───────────────────────────────────────────────────────────

/// Regional distribution of a baseline sample
pub struct BaselineBlock<'a>(pub &'a Baseline);

impl fmt::Display for BaselineBlock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        writeln!(f, "Combined unique sites: {}", b.total)?;
        writeln!(f, "\nRegional distribution (baseline):")?;
        for region in Region::ALL {
            writeln!(
                f,
                "  {:<12} {:4} ({:5.1}%)",
                format!("{}:", region.label()),
                b.counts.get(region),
                b.counts.percentage(region)
            )?;
        }
        writeln!(
            f,
            "\n  Refugia total: {} ({:.2}%)",
            b.refugia_total, b.refugia_percentage
        )
    }
}

// ─── Per-feature block ──────────────────────────────────────────────────

pub struct FeatureBlock<'a> {
    analysis: &'a FeatureAnalysis,
    baseline: &'a Baseline,
}

impl<'a> FeatureBlock<'a> {
    pub fn new(analysis: &'a FeatureAnalysis, baseline: &'a Baseline) -> Self {
        Self { analysis, baseline }
    }
}

impl fmt::Display for FeatureBlock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.analysis;
        let e = &r.enrichment;
        let rule = "=".repeat(70);

        writeln!(f, "\n{rule}")?;
        writeln!(f, "FEATURE: {}", r.label)?;
        writeln!(f, "WALS chapter: {} - {}", r.feature_id, r.feature_name)?;
        writeln!(f, "{rule}")?;

        writeln!(f, "\nSample size:")?;
        writeln!(f, "  Total sites in chapter: {}", r.total_sites)?;
        writeln!(
            f,
            "  Sites with target value: {} ({:.1}%)",
            r.target_count, r.target_percentage
        )?;

        writeln!(f, "\nRegional distribution:")?;
        write_region_lines(f, &e.counts)?;

        writeln!(f, "\nEnrichment:")?;
        writeln!(f, "  Baseline refugia %: {:.1}%", self.baseline.refugia_percentage)?;
        writeln!(f, "  Feature refugia %:  {:.1}%", e.refugia_percentage)?;
        writeln!(f, "  Enrichment factor:  {:.2}x", e.enrichment_factor)?;

        let m = &r.morans_i;
        writeln!(f, "\nSpatial autocorrelation (Moran's I):")?;
        writeln!(f, "  Moran's I: {:.4}", m.i)?;
        writeln!(f, "  Z-score:   {:.2}", m.z_score)?;
        writeln!(f, "  P-value:   {:.6}", m.p_value)?;
        if !m.is_computable() {
            writeln!(f, "  (not computable: {:?})", m.status)?;
        }
        if let Some(outcome) = &r.permutation {
            match outcome.result() {
                Some(p) => writeln!(
                    f,
                    "  Permutation p-value: {:.4} ({} permutations)",
                    p.p_value, p.permutations
                )?,
                None => writeln!(f, "  Permutation test: not applicable")?,
            }
        }

        if r.target_sites.len() <= MAX_LISTED_SITES {
            writeln!(f, "\nTarget sites ({} total):", r.target_sites.len())?;
            let mut sites: Vec<_> = r.target_sites.iter().collect();
            sites.sort_by(|a, b| a.name.cmp(&b.name));
            for s in sites {
                writeln!(f, "  {} ({}): {}", s.name, s.code, s.region)?;
            }
        }
        Ok(())
    }
}

fn write_region_lines(f: &mut fmt::Formatter<'_>, counts: &RegionCounts) -> fmt::Result {
    for region in Region::ALL {
        let label = format!("{}:", region.label());
        if counts.total() > 0 {
            writeln!(
                f,
                "  {:<12} {:3} ({:.1}%)",
                label,
                counts.get(region),
                counts.percentage(region)
            )?;
        } else {
            writeln!(f, "  {label:<12} 0")?;
        }
    }
    Ok(())
}

// ─── Summary tables ─────────────────────────────────────────────────────

/// One row per feature, sorted by ascending enrichment, after a baseline row
pub struct SummaryTable<'a> {
    rows: Vec<&'a FeatureAnalysis>,
    baseline: &'a Baseline,
}

impl<'a> SummaryTable<'a> {
    pub fn new(features: &'a [FeatureAnalysis], baseline: &'a Baseline) -> Self {
        let mut rows: Vec<_> = features.iter().collect();
        rows.sort_by(|a, b| {
            a.enrichment
                .enrichment_factor
                .total_cmp(&b.enrichment.enrichment_factor)
        });
        Self { rows, baseline }
    }
}

impl fmt::Display for SummaryTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heavy = "=".repeat(105);
        let light = "-".repeat(105);

        writeln!(f, "\n{heavy}")?;
        writeln!(f, "Summary statistics for all features")?;
        writeln!(f, "{heavy}")?;
        writeln!(
            f,
            "{:<40} {:>10} {:>10} {:>12} {:>10} {:>12}",
            "Feature", "% Refugia", "% Non-Ref", "Enrichment", "Moran I", "P-value"
        )?;
        writeln!(f, "{light}")?;
        writeln!(
            f,
            "{:<40} {:>9.1}% {:>9.1}% {:>12} {:>10} {:>12}",
            "Total (global baseline)",
            self.baseline.refugia_percentage,
            100.0 - self.baseline.refugia_percentage,
            "1.00x",
            "~0",
            "N/A"
        )?;
        writeln!(f, "{light}")?;

        for r in &self.rows {
            let e = &r.enrichment;
            writeln!(
                f,
                "{:<40} {:>9.1}% {:>9.1}% {:>11.2}x {:>10.4} {:>12}",
                truncate(&r.label, 40),
                e.refugia_percentage,
                e.non_refugia_percentage,
                e.enrichment_factor,
                r.morans_i.i,
                format_p_value(r.morans_i.p_value)
            )?;
        }
        writeln!(f, "{heavy}")
    }
}

/// Counts and shares per region, sorted by descending enrichment
pub struct RegionalTable<'a> {
    rows: Vec<&'a FeatureAnalysis>,
}

impl<'a> RegionalTable<'a> {
    pub fn new(features: &'a [FeatureAnalysis]) -> Self {
        let mut rows: Vec<_> = features.iter().collect();
        rows.sort_by(|a, b| {
            b.enrichment
                .enrichment_factor
                .total_cmp(&a.enrichment.enrichment_factor)
        });
        Self { rows }
    }
}

impl fmt::Display for RegionalTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heavy = "=".repeat(90);

        writeln!(f, "\n{heavy}")?;
        writeln!(f, "Detailed regional breakdown")?;
        writeln!(f, "{heavy}")?;
        writeln!(
            f,
            "{:<35} {:>12} {:>12} {:>12} {:>12}",
            "Feature", "Americas", "Sahul", "Caucasus", "Non-Ref"
        )?;
        writeln!(f, "{}", "-".repeat(90))?;

        // Features with no target sites have nothing to break down
        for r in self.rows.iter().filter(|r| r.enrichment.total > 0) {
            let counts = &r.enrichment.counts;
            write!(f, "{:<35}", truncate(&r.label, 35))?;
            for region in Region::ALL {
                write!(
                    f,
                    " {:>5} ({:>4.1}%)",
                    counts.get(region),
                    counts.percentage(region)
                )?;
            }
            writeln!(f)?;
        }
        writeln!(f, "{heavy}")
    }
}

/// `< 0.001` below the reporting floor, four decimals otherwise
pub fn format_p_value(p: f64) -> String {
    if p < 0.001 {
        "< 0.001".to_string()
    } else {
        format!("{p:.4}")
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

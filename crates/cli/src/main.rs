//! geomoran CLI - spatial autocorrelation of categorical features

mod analysis;
mod report;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use analysis::{analyze_feature, AnalysisOptions, TargetSpec};
use geomoran_algorithms::regions::{baseline, dedup_sites, Baseline};
use geomoran_algorithms::spatial::{haversine_km, knn_weights, KnnWeightsParams, WeightScheme};
use geomoran_algorithms::statistics::PermutationParams;
use geomoran_core::io::read_wals_feature;
use geomoran_core::{FeatureDataset, GeoPoint};
use geomoran_parallel::ProcessingMode;
use report::{ChapterBaseline, Report};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "geomoran")]
#[command(author, version, long_about = None)]
#[command(about = "Spatial autocorrelation of categorical features")]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrichment and Moran's I for one or more target features
    Analyze {
        /// WALS feature XML files (all of them form the baseline)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Target as FEATURE=V1,V2[:LABEL], e.g. "18A=4,5,6:Absence of nasals"
        #[arg(short, long = "target", required = true)]
        targets: Vec<String>,
        /// Number of nearest neighbors
        #[arg(short, long, default_value = "5")]
        k: usize,
        /// Weighting: inverse-distance, binary
        #[arg(long, default_value = "inverse-distance")]
        weighting: String,
        /// Run a permutation test with this many relabelings
        #[arg(short, long)]
        permutations: Option<usize>,
        /// Root seed for the permutation test
        #[arg(long, default_value = "42")]
        seed: u64,
        /// Worker threads (default: all cores, 1 = sequential)
        #[arg(long)]
        threads: Option<usize>,
        /// Abort the permutation test after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Output format: text, json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Regional distribution of the combined sites of several files
    Baseline {
        /// WALS feature XML files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Output format: text, json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Show the k-nearest-neighbor weights of a file
    Weights {
        /// WALS feature XML file
        input: PathBuf,
        #[arg(short, long, default_value = "5")]
        k: usize,
        #[arg(long, default_value = "inverse-distance")]
        weighting: String,
    },
    /// Great-circle distance in kilometres
    Distance {
        #[arg(allow_negative_numbers = true)]
        lat1: f64,
        #[arg(allow_negative_numbers = true)]
        lng1: f64,
        #[arg(allow_negative_numbers = true)]
        lat2: f64,
        #[arg(allow_negative_numbers = true)]
        lng2: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set default subscriber")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Read every file, skipping placeholder documents
fn read_datasets(paths: &[PathBuf]) -> Result<Vec<FeatureDataset>> {
    let pb = spinner("Reading feature files...");
    let mut datasets = Vec::with_capacity(paths.len());
    for path in paths {
        let parsed = read_wals_feature(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        match parsed {
            Some(ds) => {
                info!("{} ({}): {} sites", ds.id, ds.name, ds.len());
                datasets.push(ds);
            }
            None => warn!("{}: no feature data, skipped", path.display()),
        }
    }
    pb.finish_and_clear();
    if datasets.is_empty() {
        anyhow::bail!("No feature data loaded");
    }
    Ok(datasets)
}

fn combined_baseline(datasets: &[FeatureDataset]) -> (Baseline, Vec<ChapterBaseline>) {
    let unique = dedup_sites(datasets);
    let combined = baseline(unique.iter().map(|s| &s.point));
    info!(
        "Baseline: {} unique sites, {:.2}% in refugia",
        combined.total, combined.refugia_percentage
    );

    let mut chapters: Vec<_> = datasets
        .iter()
        .map(|ds| ChapterBaseline {
            feature_id: ds.id.clone(),
            baseline: baseline(ds.sites.iter().map(|s| &s.point)),
        })
        .collect();
    chapters.sort_by(|a, b| a.feature_id.cmp(&b.feature_id));
    (combined, chapters)
}

/// Build and check analysis options before any file is read
fn analysis_options(
    k: usize,
    weighting: &str,
    permutations: Option<usize>,
    seed: u64,
    threads: Option<usize>,
    timeout_secs: Option<u64>,
) -> Result<AnalysisOptions> {
    let mode = ProcessingMode::from_threads(threads);
    mode.validate().context("Invalid thread count")?;
    let options = AnalysisOptions {
        weights: KnnWeightsParams {
            k,
            scheme: parse_weighting(weighting)?,
        },
        permutation: permutations.map(|permutations| PermutationParams {
            permutations,
            seed,
            mode,
            deadline: timeout_secs.map(Duration::from_secs),
        }),
    };
    options.validate()?;
    Ok(options)
}

fn print_report(report: &Report, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{report}"),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }
    Ok(())
}

fn parse_weighting(s: &str) -> Result<WeightScheme> {
    match s.to_lowercase().as_str() {
        "inverse-distance" | "inverse_distance" | "idw" => Ok(WeightScheme::InverseDistance),
        "binary" => Ok(WeightScheme::Binary),
        _ => anyhow::bail!("Unknown weighting: {}. Use inverse-distance or binary.", s),
    }
}

fn parse_format(s: &str) -> Result<OutputFormat> {
    match s.to_lowercase().as_str() {
        "text" | "txt" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        _ => anyhow::bail!("Unknown format: {}. Use text or json.", s),
    }
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        // ── Analyze ──────────────────────────────────────────────────
        Commands::Analyze {
            inputs,
            targets,
            k,
            weighting,
            permutations,
            seed,
            threads,
            timeout_secs,
            format,
        } => {
            let format = parse_format(&format)?;
            let targets = targets
                .iter()
                .map(|t| TargetSpec::parse(t))
                .collect::<Result<Vec<_>>>()?;
            let options =
                analysis_options(k, &weighting, permutations, seed, threads, timeout_secs)?;

            let datasets = read_datasets(&inputs)?;
            let (combined, chapters) = combined_baseline(&datasets);

            let start = Instant::now();
            let mut features = Vec::with_capacity(targets.len());
            for target in &targets {
                let Some(dataset) = datasets.iter().find(|d| d.id == target.feature_id) else {
                    warn!("Feature {} not loaded, skipping", target.feature_id);
                    continue;
                };
                let pb = spinner(&format!("Analysing {}...", target.feature_id));
                let result = analyze_feature(dataset, target, combined.refugia_percentage, &options)
                    .with_context(|| format!("Failed to analyse feature {}", target.feature_id))?;
                pb.finish_and_clear();
                features.push(result);
            }
            info!("Analysis complete in {:.2?}", start.elapsed());

            let report = Report {
                baseline: combined,
                chapters,
                features,
            };
            print_report(&report, format)?;
        }

        // ── Baseline ─────────────────────────────────────────────────
        Commands::Baseline { inputs, format } => {
            let format = parse_format(&format)?;
            let datasets = read_datasets(&inputs)?;
            let (combined, chapters) = combined_baseline(&datasets);
            let report = Report {
                baseline: combined,
                chapters,
                features: Vec::new(),
            };
            print_report(&report, format)?;
        }

        // ── Weights ──────────────────────────────────────────────────
        Commands::Weights {
            input,
            k,
            weighting,
        } => {
            let params = KnnWeightsParams {
                k,
                scheme: parse_weighting(&weighting)?,
            };
            params.validate().context("Invalid weights parameters")?;
            let datasets = read_datasets(std::slice::from_ref(&input))?;
            let ds = &datasets[0];

            let start = Instant::now();
            let weights = knn_weights(&ds.point_set(), params.clone())
                .context("Failed to build spatial weights")?;
            let elapsed = start.elapsed();

            println!(
                "{} ({}): {} sites, k = {}, {}",
                ds.id,
                ds.name,
                weights.n(),
                params.k,
                params.scheme.as_str()
            );
            println!(
                "Total weight: {:.4}, row-standardized: {}",
                weights.total(),
                weights.is_row_standardized()
            );
            let row_sums = weights.row_sums();
            for (i, site) in ds.sites.iter().enumerate() {
                let neighbors: Vec<String> = weights
                    .neighbors(i)
                    .into_iter()
                    .map(|(j, w)| format!("{}:{:.3}", ds.sites[j].code, w))
                    .collect();
                println!(
                    "  {:>4} {:<8} sum={:.3}  {}",
                    i,
                    site.code,
                    row_sums[i],
                    neighbors.join(" ")
                );
            }
            println!("  Processing time: {:.2?}", elapsed);
        }

        // ── Distance ─────────────────────────────────────────────────
        Commands::Distance {
            lat1,
            lng1,
            lat2,
            lng2,
        } => {
            let a = GeoPoint::new(lat1, lng1).context("Invalid first location")?;
            let b = GeoPoint::new(lat2, lng2).context("Invalid second location")?;
            println!("{:.3} km", haversine_km(&a, &b));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CHAPTER_1A: &str = r#"<feature number="1A" name="Consonant Inventories">
<v numeric="1" description="Small">
<l c="prh" n="Piraha" lng="-62.0" lat="-7.0"/>
<l c="ain" n="Ainu" lng="143.0" lat="43.0"/>
</v>
</feature>"#;

    const CHAPTER_2A: &str = r#"<feature number="2A" name="Vowel Quality Inventories">
<v numeric="3" description="Large">
<l c="ain" n="Ainu" lng="143.0" lat="43.001"/>
<l c="geo" n="Georgian" lng="44.0" lat="42.0"/>
</v>
</feature>"#;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_datasets_skips_placeholders() {
        let a = write_temp(CHAPTER_1A);
        let placeholder = write_temp("<!-- paste 131A here -->");
        let paths = vec![a.path().to_path_buf(), placeholder.path().to_path_buf()];
        let datasets = read_datasets(&paths).unwrap();
        assert_eq!(datasets.len(), 1);
        assert_eq!(datasets[0].id, "1A");
    }

    #[test]
    fn test_read_datasets_requires_data() {
        let placeholder = write_temp("");
        assert!(read_datasets(&[placeholder.path().to_path_buf()]).is_err());
    }

    #[test]
    fn test_combined_baseline_dedups_across_chapters() {
        let b = write_temp(CHAPTER_2A);
        let a = write_temp(CHAPTER_1A);
        let datasets = read_datasets(&[b.path().to_path_buf(), a.path().to_path_buf()]).unwrap();
        let (combined, chapters) = combined_baseline(&datasets);

        // Ainu appears in both chapters at the same rounded location
        assert_eq!(combined.total, 3);
        assert_eq!(combined.refugia_total, 2);
        assert_relative_eq!(combined.refugia_percentage, 200.0 / 3.0, epsilon = 1e-9);

        let ids: Vec<&str> = chapters.iter().map(|c| c.feature_id.as_str()).collect();
        assert_eq!(ids, vec!["1A", "2A"]);
        assert_relative_eq!(chapters[0].baseline.refugia_percentage, 50.0);
    }

    #[test]
    fn test_parse_options() {
        assert_eq!(parse_weighting("binary").unwrap(), WeightScheme::Binary);
        assert_eq!(parse_weighting("IDW").unwrap(), WeightScheme::InverseDistance);
        assert!(parse_weighting("gaussian").is_err());
        assert_eq!(parse_format("json").unwrap(), OutputFormat::Json);
        assert!(parse_format("csv").is_err());
    }

    #[test]
    fn test_analysis_options_rejected_up_front() {
        let ok = analysis_options(5, "binary", Some(99), 7, Some(2), Some(30)).unwrap();
        let perm = ok.permutation.unwrap();
        assert_eq!(perm.mode, ProcessingMode::ParallelWith(2));
        assert_eq!(perm.deadline, Some(Duration::from_secs(30)));
        assert_eq!(ok.weights.scheme, WeightScheme::Binary);

        assert!(analysis_options(0, "binary", None, 42, None, None).is_err());
        assert!(analysis_options(5, "binary", Some(0), 42, None, None).is_err());
        assert!(analysis_options(5, "binary", None, 42, Some(0), None).is_err());
        assert!(analysis_options(5, "gaussian", None, 42, None, None).is_err());
    }

    #[test]
    fn test_cli_parses_analyze() {
        let cli = Cli::try_parse_from([
            "geomoran",
            "analyze",
            "1a.xml",
            "2a.xml",
            "--target",
            "1A=1:Small",
            "-t",
            "2A=3",
            "-k",
            "8",
            "--permutations",
            "99",
        ])
        .unwrap();
        match cli.command {
            Commands::Analyze {
                inputs,
                targets,
                k,
                permutations,
                seed,
                ..
            } => {
                assert_eq!(inputs.len(), 2);
                assert_eq!(targets, vec!["1A=1:Small", "2A=3"]);
                assert_eq!(k, 8);
                assert_eq!(permutations, Some(99));
                assert_eq!(seed, 42);
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_cli_parses_negative_coordinates() {
        let cli =
            Cli::try_parse_from(["geomoran", "distance", "-7.0", "-62.0", "43.0", "143.0"])
                .unwrap();
        assert!(matches!(cli.command, Commands::Distance { lat1, .. } if lat1 == -7.0));
    }
}

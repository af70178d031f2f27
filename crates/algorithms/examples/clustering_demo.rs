//! Clustering demo: Moran's I on synthetic point patterns
//!
//! Places 60 locations on a coarse lat/lng lattice and labels them three ways:
//!   1. clustered  - trait confined to the western half
//!   2. dispersed  - alternating checkerboard
//!   3. random     - seeded coin flips
//!
//! For each pattern prints the analytic Moran's I, z-score and p-value,
//! then the permutation p-value from 999 relabelings.
//!
//! Run:
//!   cargo run -p geomoran-algorithms --example clustering_demo

use geomoran_algorithms::spatial::{knn_weights, KnnWeightsParams};
use geomoran_algorithms::statistics::{global_morans_i, permutation_test, PermutationParams};
use geomoran_core::{GeoPoint, PointSet};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const ROWS: usize = 6;
const COLS: usize = 10;

fn main() -> geomoran_core::Result<()> {
    let points = build_lattice()?;
    let weights = knn_weights(&points, KnnWeightsParams::default())?;
    println!(
        "Lattice: {} x {} = {} locations, k = 5 inverse-distance weights",
        ROWS,
        COLS,
        points.len()
    );

    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let patterns: [(&str, Vec<f64>); 3] = [
        (
            "clustered",
            (0..ROWS * COLS)
                .map(|i| if i % COLS < COLS / 2 { 1.0 } else { 0.0 })
                .collect(),
        ),
        (
            "dispersed",
            (0..ROWS * COLS)
                .map(|i| ((i / COLS + i % COLS) % 2) as f64)
                .collect(),
        ),
        (
            "random",
            (0..ROWS * COLS)
                .map(|_| if rng.gen_bool(0.5) { 1.0 } else { 0.0 })
                .collect(),
        ),
    ];

    let params = PermutationParams::default();
    for (name, values) in &patterns {
        let result = global_morans_i(values, &weights)?;
        let perm = permutation_test(values, &weights, &params)?;
        println!("\n{name}:");
        println!("  Moran's I: {:>8.4}  (expected {:.4})", result.i, result.expected);
        println!("  z-score:   {:>8.2}", result.z_score);
        println!("  p-value:   {:>8.6}", result.p_value);
        match perm.p_value() {
            Some(p) => println!("  perm. p:   {:>8.4}", p),
            None => println!("  perm. p:   n/a"),
        }
    }

    Ok(())
}

fn build_lattice() -> geomoran_core::Result<PointSet> {
    let mut points = Vec::with_capacity(ROWS * COLS);
    for r in 0..ROWS {
        for c in 0..COLS {
            points.push(GeoPoint::new(r as f64 * 2.0, c as f64 * 2.0)?);
        }
    }
    Ok(PointSet::new(points))
}

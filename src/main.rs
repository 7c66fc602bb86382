use std::time::Instant;

use gco_rust::{EnergyValue, GraphCutOptimizer, Result};
use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};

const WIDTH: usize = 64;
const HEIGHT: usize = 48;
const NUM_LABELS: usize = 8;
const NOISE: f64 = 0.2;

// Piecewise-constant image of vertical bands, with a fraction of pixels replaced by noise
fn noisy_bands(rng: &mut StdRng) -> Vec<usize> {
    (0..WIDTH * HEIGHT)
        .map(|site| {
            if rng.gen_bool(NOISE) {
                rng.gen_range(0..NUM_LABELS)
            } else {
                (site % WIDTH) * NUM_LABELS / WIDTH
            }
        })
        .collect()
}

fn build(observed: &[usize]) -> Result<GraphCutOptimizer> {
    let mut optimizer = GraphCutOptimizer::grid(WIDTH, HEIGHT, NUM_LABELS)?;
    let data: Vec<EnergyValue> = observed
        .iter()
        .flat_map(|&pixel| {
            (0..NUM_LABELS).map(move |label| 4 * pixel.abs_diff(label).min(3) as EnergyValue)
        })
        .collect();
    optimizer.set_data_costs(&data)?;

    // Truncated linear pair cost
    let smooth: Vec<EnergyValue> = (0..NUM_LABELS * NUM_LABELS)
        .map(|i| 3 * (i / NUM_LABELS).abs_diff(i % NUM_LABELS).min(2) as EnergyValue)
        .collect();
    optimizer.set_smooth_costs(&smooth)?;
    optimizer.set_labels(0, observed)?;
    optimizer.set_verbosity(1);
    optimizer.set_seed(0);
    Ok(optimizer)
}

fn main() -> Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info"); // change "info" to "debug" for debug-level logging, etc.
    }
    env_logger::init();

    let mut rng = StdRng::seed_from_u64(42);
    let observed = noisy_bands(&mut rng);

    let mut optimizer = build(&observed)?;
    info!("Initial energy {}", optimizer.energy_breakdown());
    let start = Instant::now();
    let summary = optimizer.expansion(None)?;
    info!(
        "Expansion finished in {:?}: {}",
        start.elapsed(),
        summary
    );

    let mut optimizer = build(&observed)?;
    optimizer.set_random_label_order(true);
    let start = Instant::now();
    let summary = optimizer.swap(None)?;
    info!("Swap finished in {:?}: {}", start.elapsed(), summary);

    Ok(())
}

#![allow(clippy::missing_docs_in_private_items)]
#![allow(clippy::arithmetic_side_effects)]
#![allow(clippy::indexing_slicing)]
#![allow(clippy::pedantic)]
#![allow(warnings)]

use collide::{ChainedMap, LoadFactor, Map, MapConfig, OpenAddressingMap};
use plotters::prelude::*;
use rand::{Rng, seq::SliceRandom};

// Requested capacity of every table in the study; the maps round it up to a prime
const TABLE_SIZE: usize = 100_000;
// Fill levels from 0.1 to 0.9
const NUM_LOAD_FACTORS: usize = 9;
// Fraction of keys removed before measuring the "after removals" series
const REMOVED_FRACTION: usize = 4;

const METHODS: [&str; 3] =
    ["Double Hashing", "Double Hashing (after removals)", "Separate Chaining"];

// Tables that never grow during the study, so every fill level is measured at the same size
fn study_config() -> MapConfig {
    MapConfig::default()
        .with_initial_capacity(TABLE_SIZE)
        .with_load_factor(LoadFactor::clamped(95))
}

#[derive(Debug, Default, Clone, Copy)]
struct ProbeStats {
    average: f64,
    worst: usize,
}

fn summarize(counts: impl Iterator<Item = usize>) -> ProbeStats {
    let mut total: usize = 0;
    let mut n: usize = 0;
    let mut worst: usize = 0;
    for count in counts {
        total += count;
        n += 1;
        worst = worst.max(count);
    }
    let average = if n == 0 { 0.0 } else { total as f64 / n as f64 };
    ProbeStats { average, worst }
}

fn double_hashing(keys: &[u64]) -> ProbeStats {
    let mut map: OpenAddressingMap<u64, u64> = OpenAddressingMap::with_config(study_config());
    for &key in keys {
        map.insert(key, key);
    }
    summarize(keys.iter().map(|key| map.probe_count(key)))
}

// Removes every REMOVED_FRACTION-th key first, leaving tombstones on the remaining probe paths
fn double_hashing_after_removals(keys: &[u64]) -> ProbeStats {
    let mut map: OpenAddressingMap<u64, u64> = OpenAddressingMap::with_config(study_config());
    for &key in keys {
        map.insert(key, key);
    }
    for key in keys.iter().step_by(REMOVED_FRACTION) {
        map.remove(key);
    }
    let survivors = keys.iter().enumerate().filter(|(i, _)| i % REMOVED_FRACTION != 0);
    summarize(survivors.map(|(_, key)| map.probe_count(key)))
}

// For chaining, a lookup examines at most the whole chain of the key's bucket
fn separate_chaining(keys: &[u64]) -> ProbeStats {
    let mut map: ChainedMap<u64, u64> = ChainedMap::with_config(study_config());
    for &key in keys {
        map.insert(key, key);
    }
    summarize(keys.iter().map(|key| map.chain_length(key)))
}

// One line per method, x = fill level, y = the measured cost
fn draw_chart(
    file_name: &str,
    caption: &str,
    y_desc: &str,
    load_factors: &[f64],
    series: &[Vec<f64>],
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(file_name, (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_y = series.iter().flatten().copied().fold(1.0, f64::max) * 1.1;
    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 32))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..1.0, 0.0..max_y)?;
    chart.configure_mesh().x_desc("Load Factor").y_desc(y_desc).draw()?;

    for (idx, (&method, values)) in METHODS.iter().zip(series).enumerate() {
        let style = Palette99::pick(idx).stroke_width(2);
        let points: Vec<(f64, f64)> = load_factors.iter().copied().zip(values.iter().copied()).collect();
        chart
            .draw_series(LineSeries::new(points.iter().copied(), style))?
            .label(method)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
        chart.draw_series(points.iter().map(|&point| Circle::new(point, 4, style.filled())))?;
    }

    chart.configure_series_labels().background_style(&WHITE).border_style(&BLACK).draw()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let capacity = study_config().resolved_capacity();
    let load_factors: Vec<f64> = (0..NUM_LOAD_FACTORS)
        .map(|i| 0.1 + (0.9 - 0.1) * (i as f64) / ((NUM_LOAD_FACTORS - 1) as f64))
        .collect();
    let num_keys: Vec<usize> =
        load_factors.iter().map(|&load| (capacity as f64 * load) as usize).collect();

    println!("Table capacity: {capacity}");
    println!("Load factors: {:?}", load_factors);

    let mut rng = rand::rng();
    let max_keys_needed = num_keys.iter().copied().max().unwrap_or(0);
    let mut keys: Vec<u64> = (0..max_keys_needed * 2).map(|_| rng.random::<u64>()).collect();
    keys.sort_unstable();
    keys.dedup();
    // Restore a random order after deduplicating
    keys.shuffle(&mut rng);
    keys.truncate(max_keys_needed);

    let mut average_probes: Vec<Vec<f64>> = vec![Vec::new(); METHODS.len()];
    let mut worst_case_probes: Vec<Vec<f64>> = vec![Vec::new(); METHODS.len()];

    for (&load, &n_keys) in load_factors.iter().zip(&num_keys) {
        println!("Testing with {} keys (load factor {:.2})", n_keys, load);
        let sample = &keys[..n_keys.min(keys.len())];

        for (method_idx, &method) in METHODS.iter().enumerate() {
            let stats = match method_idx {
                0 => double_hashing(sample),
                1 => double_hashing_after_removals(sample),
                _ => separate_chaining(sample),
            };
            average_probes[method_idx].push(stats.average);
            worst_case_probes[method_idx].push(stats.worst as f64);

            println!("  {}: Avg probes = {:.2}, Worst = {}", method, stats.average, stats.worst);
        }
    }

    draw_chart(
        "average_probes.png",
        "Average Lookup Cost by Collision Strategy",
        "Average Slots Examined",
        &load_factors,
        &average_probes,
    )?;
    draw_chart(
        "worst_case_probes.png",
        "Worst-Case Lookup Cost by Collision Strategy",
        "Worst-Case Slots Examined",
        &load_factors,
        &worst_case_probes,
    )?;

    println!("Generated plot images: average_probes.png, worst_case_probes.png");

    Ok(())
}

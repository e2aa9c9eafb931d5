//! Murmur Averaging Demo
//!
//! Run the epidemic averaging protocol under both drivers and print the
//! accepted report and total communication cost.

use std::env;
use std::time::Duration;

use murmur_sim::{run_concurrent, run_sequential, SimulationConfig};
use murmur_topology::random_connected;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Parse command line args
    let args: Vec<String> = env::args().collect();

    let node_count: usize = args.get(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(10);

    let seed: u64 = args.get(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);

    let topology = random_connected(node_count, 0.15, seed);
    let values: Vec<f64> = (0..node_count).map(|i| i as f64).collect();

    println!("Murmur Averaging Simulator");
    println!("==========================");
    println!();
    println!("Adjacency matrix ({} nodes, seed {}):", node_count, seed);
    for row in topology.to_matrix() {
        println!("{:?}", row);
    }
    println!();

    let config = SimulationConfig::default()
        .with_seed(seed)
        .with_receive_window(Duration::from_millis(50));

    let sequential = run_sequential(&topology, &values, &config)?;
    println!("Sequential driver:");
    println!(
        "  {} reported average {:.4} over {} nodes in {} rounds",
        sequential.report.from,
        sequential.report.average,
        sequential.report.known_sources,
        sequential.rounds
    );
    println!("  Total communication cost: ${}", sequential.total_cost);
    println!();

    let concurrent = run_concurrent(&topology, &values, &config).await?;
    println!("Concurrent driver:");
    println!(
        "  {} reported average {:.4} over {} nodes in {} rounds",
        concurrent.report.from,
        concurrent.report.average,
        concurrent.report.known_sources,
        concurrent.rounds
    );
    println!("  Total communication cost: ${}", concurrent.total_cost);

    Ok(())
}

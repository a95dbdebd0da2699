//! Warehouse Placement CLI
//!
//! Usage:
//!   warehouse-place [OPTIONS] --x <X> --z <Z> <PLAN>
//!
//! Options:
//!   -c, --config <FILE>  Placement configuration (TOML)
//!   --snap-only          List snap points without solving
//!   -v, --verbose        Log solver progress to stderr
//!   -h, --help           Print help

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use warehouse_placement::placement::Ray;
use warehouse_placement::{PlacementConfig, PlacementScene, PlacementSession};

/// Height the vertical pointer ray is cast from
const RAY_HEIGHT: f64 = 1000.0;

#[derive(Parser)]
#[command(name = "warehouse-place")]
#[command(about = "Resolve object placements on a warehouse floor plan")]
struct Cli {
    /// Floor plan file (TOML) with a [target] table
    plan: PathBuf,

    /// Cursor X position in feet
    #[arg(short, long, allow_negative_numbers = true)]
    x: f64,

    /// Cursor Z position in feet
    #[arg(short, long, allow_negative_numbers = true)]
    z: f64,

    /// Placement configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// List snap points without solving
    #[arg(long)]
    snap_only: bool,

    /// Log solver progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "warn,warehouse_placement=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config = match &cli.config {
        Some(path) => match PlacementConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => PlacementConfig::default(),
    };

    // Load floor plan and target
    let scene = match PlacementScene::from_file(&cli.plan, &config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading plan '{}': {}", cli.plan.display(), e);
            std::process::exit(1);
        }
    };
    let Some(target) = scene.target else {
        eprintln!(
            "Error: plan '{}' has no [target] table describing the object to place",
            cli.plan.display()
        );
        std::process::exit(1);
    };

    tracing::info!(
        plan = scene.plan.name.as_deref().unwrap_or("<unnamed>"),
        elements = scene.plan.len(),
        target = %target.id,
        "Loaded floor plan"
    );

    let mut session = PlacementSession::new(target, config);
    let ray = Ray::vertical(cli.x, cli.z, RAY_HEIGHT);
    let outcome = match session.pointer_moved(&ray, None, &scene.plan.snapshot(), &scene.plan) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    println!("snap points:");
    for point in &outcome.snap_points {
        println!(
            "  {:<15} {:.2}  ({:.2}, {:.2})  {}",
            point.kind.as_str(),
            point.confidence,
            point.position.x,
            point.position.z,
            point.description.as_deref().unwrap_or("")
        );
    }

    if cli.snap_only {
        return;
    }

    println!("{}", outcome);
    if !outcome.is_valid() {
        std::process::exit(1);
    }
}

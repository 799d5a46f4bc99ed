//! Logistics Network Design Core - Command Line Interface
//!
//! A thin driver binary: loads a serialized instance, runs the pre-cluster
//! + MIP pipeline, and prints a summary.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;

use lnd_solver::costs::{build_costs, CostParams};
use lnd_solver::cluster::pre_cluster;
use lnd_solver::instance_io::load_instance;
use lnd_solver::solver::{SolverDriver, SolverStatus, Variant as SolverVariant, DEFAULT_TIME_LIMIT_SECS};

#[derive(Parser)]
#[command(name = "lnd-solver")]
#[command(author = "M2 AI2D Student")]
#[command(version = "1.0")]
#[command(about = "Two-stage capacitated multi-product facility-location solver")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pre-cluster candidate DCs, build the chosen MIP variant, and solve.
    Solve {
        /// Path to the instance JSON file.
        #[arg(short, long)]
        instance: PathBuf,

        /// MIP variant to build.
        #[arg(short, long, value_enum, default_value = "multi-source")]
        variant: Variant,

        /// Target number of pre-clustered DC candidates.
        #[arg(short = 'k', long)]
        cluster_k: usize,

        /// Maximum number of DCs the MIP is allowed to open.
        #[arg(long)]
        dc_num: u32,

        /// Solver wall-clock time limit in seconds.
        #[arg(short, long, default_value_t = DEFAULT_TIME_LIMIT_SECS)]
        time_limit: f64,

        /// Write the solve outcome to this JSON file.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output.
        #[arg(long)]
        verbose: bool,
    },

    /// Print summary statistics for an instance without solving.
    Analyze {
        /// Path to the instance JSON file.
        #[arg(short, long)]
        instance: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Variant {
    MultiSource,
    SingleSource,
}

impl From<Variant> for SolverVariant {
    fn from(v: Variant) -> Self {
        match v {
            Variant::MultiSource => SolverVariant::MultiSource,
            Variant::SingleSource => SolverVariant::SingleSource,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve { instance, variant, cluster_k, dc_num, time_limit, output, verbose } => {
            solve_instance(&instance, variant, cluster_k, dc_num, time_limit, output, verbose);
        }
        Commands::Analyze { instance } => {
            analyze_instance(&instance);
        }
    }
}

fn solve_instance(
    path: &PathBuf,
    variant: Variant,
    cluster_k: usize,
    dc_num: u32,
    time_limit: f64,
    output: Option<PathBuf>,
    verbose: bool,
) {
    println!("Loading instance from {:?}...", path);

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "instance".to_string());

    let instance = match load_instance(path, name) {
        Ok(inst) => inst,
        Err(e) => {
            eprintln!("Error loading instance: {}", e);
            std::process::exit(1);
        }
    };

    if verbose {
        println!(
            "{} plants, {} DCs, {} customers, {} products",
            instance.plants.len(),
            instance.dcs.len(),
            instance.customers.len(),
            instance.products.len()
        );
    }

    println!("Pre-clustering {} DCs down to {}...", instance.dcs.len(), cluster_k);
    let dc_candidates = match pre_cluster(&instance, cluster_k) {
        Ok(dcs) => dcs,
        Err(e) => {
            eprintln!("Error pre-clustering: {}", e);
            std::process::exit(1);
        }
    };

    let costs = build_costs(&instance, &CostParams::default());

    println!("Building {:?} MIP over {} candidate DCs...", variant, dc_candidates.len());
    let start = Instant::now();

    let mip = match SolverDriver::build(&instance, &costs, variant.into(), &dc_candidates, dc_num) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error building model: {}", e);
            std::process::exit(1);
        }
    };

    let outcome = match SolverDriver::solve(mip, &instance, time_limit) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error solving: {}", e);
            std::process::exit(1);
        }
    };

    let elapsed = start.elapsed().as_secs_f64();

    println!("========== Solve Result ==========");
    println!("Status:    {:?}", outcome.status);
    println!("Objective: {:.2}", outcome.objective);
    println!("Opened DCs: {:?}", outcome.opened_dcs);
    println!("Flows:     {} records", outcome.flows.len());
    println!("Elapsed:   {:.2}s", elapsed);

    if let SolverStatus::Infeasible { unmet } = &outcome.status {
        println!("WARNING: {} (customer, product) pairs have unmet demand", unmet.len());
    }

    if let Some(out_path) = output {
        let json = serde_json::to_string_pretty(&OutcomeReport::from(&outcome)).unwrap();
        std::fs::write(&out_path, json).expect("failed to write output");
    }
}

fn analyze_instance(path: &PathBuf) {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "instance".to_string());

    let instance = match load_instance(path, name) {
        Ok(inst) => inst,
        Err(e) => {
            eprintln!("Error loading instance: {}", e);
            std::process::exit(1);
        }
    };

    println!("========== Instance Analysis ==========\n");
    println!("Name:       {}", instance.name);
    println!("Plants:     {}", instance.plants.len());
    println!("DCs:        {}", instance.dcs.len());
    println!("Customers:  {}", instance.customers.len());
    println!("Products:   {}", instance.products.len());

    let total_demand: f64 = instance.customers.keys().map(|k| instance.total_demand(k)).sum();
    println!("Total demand across all products: {:.2}", total_demand);

    let total_dc_capacity: f64 = instance.dcs.keys().map(|j| instance.dc_ub[j]).sum();
    println!("Total DC throughput capacity: {:.2}", total_dc_capacity);
}

#[derive(serde::Serialize)]
struct OutcomeReport {
    opened_dcs: Vec<String>,
    objective: f64,
    status: String,
    flow_count: usize,
}

impl From<&lnd_solver::solver::SolveOutcome> for OutcomeReport {
    fn from(outcome: &lnd_solver::solver::SolveOutcome) -> Self {
        OutcomeReport {
            opened_dcs: outcome.opened_dcs.clone(),
            objective: outcome.objective,
            status: format!("{:?}", outcome.status),
            flow_count: outcome.flows.len(),
        }
    }
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gm_engine::{CalculationParameters, EngineError, PartResultsCollection};
use gm_mesh::MeshError;
use gm_results::{PositionType, ResultAddress, StatisticsScope};
use nalgebra::Point3;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

mod synthetic;

use synthetic::{ModelShape, build_collection};

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("{0}")]
    Engine(#[from] EngineError),

    #[error("{0}")]
    Mesh(#[from] MeshError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown position type '{0}'")]
    Position(String),
}

type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "gm-cli")]
#[command(about = "Geomechanical results engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Model and result selection shared by the query commands.
#[derive(clap::Args, Debug)]
struct ModelArgs {
    /// Cells along I
    #[arg(long, default_value_t = 4)]
    ni: usize,
    /// Cells along J
    #[arg(long, default_value_t = 4)]
    nj: usize,
    /// Cells along K
    #[arg(long, default_value_t = 3)]
    nk: usize,
    /// Number of time steps
    #[arg(long, default_value_t = 3)]
    steps: usize,
    /// Calculation parameters (YAML)
    #[arg(long)]
    params: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct AddressArgs {
    /// Field name, e.g. SE, ST, POR-Bar
    #[arg(long)]
    field: String,
    /// Component name, e.g. S1 (empty for scalar fields)
    #[arg(long, default_value = "")]
    component: String,
    /// Position type: Nodal, Element, ElementNodal, ElementNodalFace, FormationNames, Differentials
    #[arg(long, default_value = "ElementNodal")]
    position: String,
    /// Difference to this base frame
    #[arg(long)]
    time_lapse: Option<usize>,
    /// Divide by hydrostatic pressure
    #[arg(long)]
    normalized: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print statistics of a result as JSON
    Stats {
        #[command(flatten)]
        model: ModelArgs,
        #[command(flatten)]
        address: AddressArgs,
        /// Single frame; all frames when omitted
        #[arg(long)]
        frame: Option<usize>,
    },
    /// List native and derived field names at a position
    Fields {
        #[arg(long, default_value = "ElementNodal")]
        position: String,
    },
    /// Print the default calculation parameters as YAML
    Params,
    /// Print the value history at a point as JSON
    History {
        #[command(flatten)]
        model: ModelArgs,
        #[command(flatten)]
        address: AddressArgs,
        #[arg(long)]
        x: f64,
        #[arg(long)]
        y: f64,
        #[arg(long)]
        z: f64,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Stats {
            model,
            address,
            frame,
        } => cmd_stats(&model, &address, frame),
        Commands::Fields { position } => cmd_fields(&position),
        Commands::Params => cmd_params(),
        Commands::History {
            model,
            address,
            x,
            y,
            z,
        } => cmd_history(&model, &address, Point3::new(x, y, z)),
    }
}

fn parse_position(label: &str) -> CliResult<PositionType> {
    PositionType::from_label(label).ok_or_else(|| CliError::Position(label.to_string()))
}

fn parse_address(args: &AddressArgs) -> CliResult<ResultAddress> {
    let mut address = ResultAddress::new(parse_position(&args.position)?, &args.field, &args.component);
    if let Some(base) = args.time_lapse {
        address = address.with_time_lapse(base);
    }
    if args.normalized {
        address = address.normalized();
    }
    Ok(address)
}

fn open_model(args: &ModelArgs) -> CliResult<PartResultsCollection> {
    let mut results = build_collection(ModelShape {
        cells: [args.ni, args.nj, args.nk],
        steps: args.steps,
    })?;
    if let Some(path) = &args.params {
        results.set_parameters(CalculationParameters::load_yaml(path)?)?;
    }
    Ok(results)
}

#[derive(Serialize)]
struct StatsReport<'a> {
    address: String,
    scope: String,
    #[serde(flatten)]
    stats: &'a gm_results::ScalarStatistics,
    mean: Option<f64>,
}

fn cmd_stats(model: &ModelArgs, address: &AddressArgs, frame: Option<usize>) -> CliResult<()> {
    let results = open_model(model)?;
    let address = parse_address(address)?;
    let scope = frame.map_or(StatisticsScope::AllFrames, StatisticsScope::Frame);
    let stats = results.statistics(&address, scope)?;
    let report = StatsReport {
        address: address.to_string(),
        scope: format!("{scope:?}"),
        stats: &stats,
        mean: stats.mean(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_fields(position: &str) -> CliResult<()> {
    let position = parse_position(position)?;
    let results = build_collection(ModelShape {
        cells: [1, 1, 1],
        steps: 1,
    })?;
    for (field, components) in results.scalar_field_and_component_names(position) {
        println!("{field}: {}", components.join(" "));
    }
    Ok(())
}

fn cmd_params() -> CliResult<()> {
    print!("{}", CalculationParameters::default().to_yaml_string()?);
    Ok(())
}

#[derive(Serialize)]
struct HistoryReport {
    address: String,
    point: [f64; 3],
    steps: Vec<String>,
    values: Option<Vec<Option<f32>>>,
}

fn cmd_history(model: &ModelArgs, address: &AddressArgs, point: Point3<f64>) -> CliResult<()> {
    let results = open_model(model)?;
    let address = parse_address(address)?;
    let values = results
        .time_history(&address, &point)?
        .map(|v| v.into_iter().map(|x| x.is_finite().then_some(x)).collect());
    let report = HistoryReport {
        address: address.to_string(),
        point: [point.x, point.y, point.z],
        steps: results.step_names().to_vec(),
        values,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

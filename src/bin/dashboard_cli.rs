//! Command-line front-end: load a dataset, run one selection through the
//! pipeline and print the resulting view model as JSON.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use covid_explorer::{Dashboard, DashboardConfig, Scale, Selection};

/// Explore the COVID-19 dataset from the terminal
#[derive(Parser, Debug)]
#[command(name = "dashboard-cli")]
#[command(about = "Filter the COVID-19 dataset and print dashboard view models as JSON")]
struct Args {
    /// Normalized dataset (CSV)
    #[arg(short, long)]
    data: PathBuf,

    /// Optional YAML configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// First date ordinal (defaults to the first indexed date)
    #[arg(long)]
    start: Option<usize>,

    /// Last date ordinal (defaults to the last indexed date)
    #[arg(long)]
    end: Option<usize>,

    /// Country to include; repeat for several. Omit for every location.
    #[arg(long = "country")]
    countries: Vec<String>,

    /// Indicator for the map and line views (defaults to the configured one)
    #[arg(long)]
    indicator: Option<String>,

    /// Axis scale: linear or symlog
    #[arg(long, default_value = "linear")]
    scale: Scale,

    /// Attach raw points to the line view
    #[arg(long, default_value = "false")]
    points: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Range-control tick labels and the selected range read-out
    Ticks,
    /// Animated map frames
    Map,
    /// Comparative line plot
    Line,
    /// One indicator chart by name, or all of them
    Chart { name: Option<String> },
    /// Selectable locations
    Locations,
}

fn main() -> anyhow::Result<()> {
    // RUST_LOG takes precedence, fallback to warn so stdout stays JSON only
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => DashboardConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DashboardConfig::default(),
    };
    let dashboard = Dashboard::from_csv(&args.data, config)
        .with_context(|| format!("loading dataset {}", args.data.display()))?;

    let selection = selection(&args, &dashboard);
    tracing::info!(?selection, "running selection");

    let json = match &args.command {
        Command::Ticks => serde_json::to_string(&serde_json::json!({
            "ticks": dashboard.index().ticks(),
            "range": dashboard.range_label(&selection)?,
        }))?,
        Command::Map => dashboard.map_frames(&selection)?.to_json()?,
        Command::Line => dashboard.line_chart(&selection)?.to_json()?,
        Command::Chart { name: Some(name) } => {
            let chart = dashboard.chart(name)?;
            dashboard.indicator_chart(&selection, chart)?.to_json()?
        }
        Command::Chart { name: None } => {
            serde_json::to_string(&dashboard.indicator_charts(&selection)?)?
        }
        Command::Locations => serde_json::to_string(&dashboard.store().locations()?)?,
    };
    println!("{json}");
    Ok(())
}

fn selection(args: &Args, dashboard: &Dashboard) -> Selection {
    let mut selection = Selection::new(
        args.indicator
            .clone()
            .unwrap_or_else(|| dashboard.config().default_indicator.clone()),
    )
    .with_countries(args.countries.iter().cloned())
    .with_scale(args.scale)
    .with_points(args.points);

    if args.start.is_some() || args.end.is_some() {
        selection = selection.with_date_range(
            args.start.unwrap_or(0),
            args.end
                .unwrap_or_else(|| dashboard.index().last_ordinal()),
        );
    }
    selection
}

//! linewatch - weather threshold alerts for transmission-line towers.

use std::error::Error;
use std::path::PathBuf;

use chrono::{Duration, Local};
use clap::{Parser, Subcommand};

use linewatch_service::alert::severity::count_by_severity;
use linewatch_service::alert::view::{filter_and_sort, AlertFilter};
use linewatch_service::config::Config;
use linewatch_service::export::export_alerts;
use linewatch_service::ingest::open_meteo::{Endpoint, OpenMeteoClient};
use linewatch_service::logging::{self, Source};
use linewatch_service::points::{load_points, points_on_route};
use linewatch_service::query::{
    resolve_point, validate_coordinates, validate_lookback, validate_scan_window,
};
use linewatch_service::report::{
    build_point_report, manual_point, render_executive_summary, render_point_report, ExecutiveSummary,
};
use linewatch_service::scan::{CancelToken, ScanConfig, Scanner};
use linewatch_service::variables::TEMPERATURE_MAX;

#[derive(Parser)]
#[command(
    name = "linewatch",
    version,
    about = "Weather threshold alerts for transmission-line towers"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the registered points
    Points {
        /// Only points on this route
        #[arg(long)]
        route: Option<String>,
    },

    /// Scan every point for threshold breaches in a date window
    ///
    /// Interrupting the process (Ctrl-C) ends the scan immediately and
    /// nothing is exported. Stopping between chunks while keeping the
    /// alerts gathered so far is available to library callers through
    /// `scan::CancelToken`.
    Scan {
        /// First day, YYYY-MM-DD
        #[arg(long)]
        start: Option<String>,

        /// Last day, YYYY-MM-DD
        #[arg(long)]
        end: Option<String>,

        /// `all` or a monitored variable key, e.g. windspeed_10m_max
        #[arg(short, long, default_value = "all")]
        filter: AlertFilter,

        /// Query the historical archive instead of the forecast
        #[arg(long)]
        archive: bool,

        /// Write alertas_<filter>.csv and .txt into this directory
        #[arg(long)]
        export_dir: Option<PathBuf>,
    },

    /// Historical summary for one registered point or a coordinate
    Point {
        /// Registered point id
        #[arg(long, conflicts_with_all = ["lat", "lon"], required_unless_present = "lat")]
        id: Option<String>,

        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Last day of the window, YYYY-MM-DD (default: yesterday)
        #[arg(long)]
        end: Option<String>,

        /// Window length in days, 7 to 56
        #[arg(long, default_value_t = 28)]
        days_back: i64,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        logging::error(Source::System, None, &e.to_string());
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = Config::load(&cli.config)?;
    logging::init_logger(config.parsed_log_level()?, config.log_file.as_deref(), false);

    let points = load_points(&config.points_file)?;
    logging::debug(
        Source::Registry,
        None,
        &format!("Loaded {} points from {}", points.len(), config.points_file),
    );

    match cli.command {
        Command::Points { route } => {
            let selected: Vec<_> = match route.as_deref() {
                Some(route) => points_on_route(&points, route),
                None => points.iter().collect(),
            };
            for p in &selected {
                println!(
                    "{:<12} {:>11.6} {:>11.6}  {}{}",
                    p.id,
                    p.latitude,
                    p.longitude,
                    p.label(),
                    p.route.as_deref().map(|r| format!(" ({})", r)).unwrap_or_default()
                );
            }
            println!("{} puntos", selected.len());
        }

        Command::Scan {
            start,
            end,
            filter,
            archive,
            export_dir,
        } => {
            let endpoint = if archive { Endpoint::Archive } else { Endpoint::Forecast };
            let request = validate_scan_window(
                start.as_deref(),
                end.as_deref(),
                config.max_window_days,
                endpoint,
            )?;

            let client = OpenMeteoClient::from_config(&config)?;
            let scanner = Scanner::new(client, ScanConfig::from_config(&config));
            let cancel = CancelToken::new();
            let outcome = scanner.scan(&points, &request, &cancel, |step| {
                println!("{}", step);
            })?;

            let alerts = filter_and_sort(&outcome.alerts, &filter);
            let counts = count_by_severity(&alerts);

            if outcome.all_failed() {
                logging::error(
                    Source::Scan,
                    None,
                    "Every point failed; the empty result does not mean calm weather",
                );
            }

            if alerts.is_empty() {
                println!("No se detectaron alertas.");
            }
            for a in &alerts {
                println!(
                    "{}  {:<24} {} {:<22} {:>12}  {}",
                    a.date,
                    a.point_label,
                    a.icon,
                    a.alert_label,
                    a.formatted_value(),
                    a.severity()
                );
            }
            println!(
                "Total: {} | Alta: {} | Media: {} | Baja: {}",
                counts.total(),
                counts.alta,
                counts.media,
                counts.baja
            );
            if !outcome.failures.is_empty() {
                println!(
                    "{} de {} puntos sin respuesta",
                    outcome.failures.len(),
                    outcome.points_scanned
                );
            }

            if let Some(dir) = export_dir {
                let paths = export_alerts(&dir, &alerts, &filter)?;
                logging::info(
                    Source::Export,
                    None,
                    &format!(
                        "Wrote {} and {}",
                        paths.spreadsheet.display(),
                        paths.report.display()
                    ),
                );
            }
        }

        Command::Point {
            id,
            lat,
            lon,
            end,
            days_back,
        } => {
            let today = Local::now().date_naive();
            let end = end.unwrap_or_else(|| (today - Duration::days(1)).format("%Y-%m-%d").to_string());
            let window = validate_lookback(Some(end.as_str()), days_back, today)?;

            let (point, manual) = match (id, lat, lon) {
                (Some(id), _, _) => (resolve_point(&points, &id)?.clone(), false),
                (None, Some(lat), Some(lon)) => {
                    let (lat, lon) = validate_coordinates(lat, lon)?;
                    (manual_point(lat, lon), true)
                }
                _ => return Err("either --id or both --lat and --lon are required".into()),
            };

            let client = OpenMeteoClient::from_config(&config)?;
            let report = build_point_report(&client, &point, window).inspect_err(|e| {
                logging::log_point_failure(&point.id, "archive fetch", e);
            })?;

            if manual {
                match report.stats_for(TEMPERATURE_MAX) {
                    Some(t) => println!(
                        "{}: temperatura máx. promedio {:.1} °C (mín {:.1}, máx {:.1})",
                        point.label(),
                        t.avg,
                        t.min,
                        t.max
                    ),
                    None => println!("{}: sin datos de temperatura", point.label()),
                }
                print!("{}", render_executive_summary(&ExecutiveSummary::from_report(&report)));
            } else {
                print!("{}", render_point_report(&report));
            }
        }
    }

    Ok(())
}

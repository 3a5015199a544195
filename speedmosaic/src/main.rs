use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use geo::Coord;
use speedmosaic::{
    app::{route_app, AppError, JobManager, RouteApp},
    config::MosaicConfiguration,
    model::{
        job::{JobState, MosaicJobParams},
        link::LinkId,
        mosaic::DateRange,
    },
};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct MosaicAppArguments {
    #[command(subcommand)]
    app: App,
}

#[derive(Subcommand)]
pub enum App {
    /// shortest route through two or more points, written as GeoJSON
    Route {
        #[arg(long, help = "path to link dataset (.csv or .shp)")]
        link_file: Option<String>,
        #[arg(
            long = "point",
            allow_hyphen_values = true,
            help = "route point as 'x,y'; repeat in order, first is start, last is end"
        )]
        points: Vec<String>,
        #[arg(long, help = "path to .toml or .json file with speedmosaic parameters")]
        configuration_file: Option<String>,
        #[arg(long, help = "write the route here instead of stdout")]
        output_file: Option<String>,
    },
    /// probe speed mosaic along a route, rendered as png
    Mosaic {
        #[arg(long, help = "path to link dataset (.csv or .shp)")]
        link_file: Option<String>,
        #[arg(long, help = "path to probe dataset (.csv)")]
        probe_file: Option<String>,
        #[arg(
            long = "point",
            allow_hyphen_values = true,
            help = "route point as 'x,y'; used when no link ids are given"
        )]
        points: Vec<String>,
        #[arg(long, value_delimiter = ',', help = "comma-separated route link ids")]
        link_ids: Vec<String>,
        #[arg(long, help = "first day of the mosaic, YYYY-MM-DD")]
        start_date: String,
        #[arg(long, help = "last day of the mosaic (inclusive), defaults to start date")]
        end_date: Option<String>,
        #[arg(long, default_value_t = 60, help = "time bucket width in minutes")]
        time_pitch_minutes: i64,
        #[arg(long, default_value = "", help = "data credit printed on the image")]
        data_credit: String,
        #[arg(long, help = "title printed on the image")]
        title: Option<String>,
        #[arg(long, help = "path to .toml or .json file with speedmosaic parameters")]
        configuration_file: Option<String>,
        #[arg(long, help = "output path for mosaic artifacts")]
        output_directory: Option<String>,
    },
    /// print the default configuration as TOML
    DefaultConfig,
}

pub fn run(app: &App) -> Result<(), AppError> {
    env_logger::init();
    match app {
        App::Route {
            link_file,
            points,
            configuration_file,
            output_file,
        } => {
            let conf = read_configuration(configuration_file)?;
            let link_file = dataset_path(link_file, &conf.datasets.link_dataset, "link")?;
            let points = parse_points(points)?;
            let router = RouteApp::load(&link_file, &conf.graph)?;
            let result = router.route(&points)?;
            log::info!(
                "route over {} links, {:.1} m",
                result.link_ids.len(),
                result.length_meters
            );
            let response = serde_json::to_string_pretty(&route_app::route_response(&result))?;
            match output_file {
                Some(f) => std::fs::write(f, response)?,
                None => println!("{response}"),
            }
            Ok(())
        }
        App::Mosaic {
            link_file,
            probe_file,
            points,
            link_ids,
            start_date,
            end_date,
            time_pitch_minutes,
            data_credit,
            title,
            configuration_file,
            output_directory,
        } => {
            let mut conf = read_configuration(configuration_file)?;
            if let Some(d) = output_directory {
                conf.jobs.output_directory = PathBuf::from(d);
            }
            let link_file = dataset_path(link_file, &conf.datasets.link_dataset, "link")?;
            let probe_file = dataset_path(probe_file, &conf.datasets.probe_dataset, "probe")?;
            let date_range = parse_date_range(start_date, end_date.as_deref())?;

            let (link_ids, route_geometry) = if !link_ids.is_empty() {
                let ids = link_ids.iter().map(|l| LinkId::from(l.trim())).collect();
                (ids, None)
            } else if !points.is_empty() {
                let router = RouteApp::load(&link_file, &conf.graph)?;
                let result = router.route(&parse_points(points)?)?;
                (result.link_ids, Some(result.geometry))
            } else {
                return Err(AppError::InvalidArgument(String::from(
                    "mosaic requires --link-ids or at least two --point values",
                )));
            };

            let params = MosaicJobParams {
                link_ids,
                route_geometry,
                date_range,
                time_pitch_minutes: *time_pitch_minutes,
                data_credit: data_credit.clone(),
                title: title.clone(),
                link_dataset: link_file,
                probe_dataset: probe_file,
            };
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(run_mosaic_job(&conf, params))
        }
        App::DefaultConfig => {
            let conf = MosaicConfiguration::default();
            println!("{}", toml::to_string_pretty(&conf)?);
            Ok(())
        }
    }
}

async fn run_mosaic_job(
    conf: &MosaicConfiguration,
    params: MosaicJobParams,
) -> Result<(), AppError> {
    let manager = JobManager::new(conf, tokio::runtime::Handle::current())?;
    let job_id = manager.submit(params)?;
    eprintln!("submitted job {job_id}");
    let poll_interval = Duration::from_millis(conf.jobs.poll_interval_millis);
    let snapshot = manager.wait(job_id, poll_interval).await?;
    manager.shutdown().await;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    match snapshot.state {
        JobState::Failed { failure } => {
            Err(AppError::JobFailed(format!("{job_id} failed: {failure}")))
        }
        _ => {
            eprintln!("finished.");
            Ok(())
        }
    }
}

fn read_configuration(file: &Option<String>) -> Result<MosaicConfiguration, AppError> {
    if let Some(f) = file {
        log::info!("reading speedmosaic configuration from {f}");
    }
    let conf = MosaicConfiguration::load(file.as_deref().map(Path::new))?;
    Ok(conf)
}

fn dataset_path(
    arg: &Option<String>,
    configured: &Option<PathBuf>,
    kind: &str,
) -> Result<PathBuf, AppError> {
    match (arg, configured) {
        (Some(a), _) => Ok(PathBuf::from(a)),
        (None, Some(c)) => Ok(c.clone()),
        (None, None) => Err(AppError::InvalidArgument(format!(
            "no {kind} dataset given on the command line or in the configuration"
        ))),
    }
}

fn parse_points(points: &[String]) -> Result<Vec<Coord<f64>>, AppError> {
    points
        .iter()
        .map(|p| route_app::parse_point(p).map_err(AppError::InvalidArgument))
        .collect()
}

fn parse_date_range(start: &str, end: Option<&str>) -> Result<DateRange, AppError> {
    let parse = |s: &str| {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map_err(|e| AppError::InvalidArgument(format!("invalid date '{s}': {e}")))
    };
    let first = parse(start)?;
    let last = match end {
        Some(e) => parse(e)?,
        None => first,
    };
    DateRange::from_dates(first, last).map_err(AppError::InvalidArgument)
}

fn main() {
    let args = MosaicAppArguments::parse();
    if let Err(e) = run(&args.app) {
        log::error!("speedmosaic failed: {e}");
        eprintln!("{e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_range() {
        let one_day = parse_date_range("2025-11-07", None).expect("date should parse");
        assert_eq!(one_day.duration(), chrono::Duration::days(1));
        let three_days =
            parse_date_range("2025-11-07", Some("2025-11-09")).expect("dates should parse");
        assert_eq!(three_days.duration(), chrono::Duration::days(3));
        assert!(parse_date_range("2025-11-09", Some("2025-11-07")).is_err());
        assert!(parse_date_range("11/07/2025", None).is_err());
    }

    #[test]
    fn test_cli_parses_negative_points() {
        let args = MosaicAppArguments::try_parse_from([
            "speedmosaic",
            "route",
            "--link-file",
            "links.csv",
            "--point",
            "-105.0,39.7",
            "--point",
            "-104.9,39.8",
        ])
        .expect("arguments should parse");
        match args.app {
            App::Route { points, .. } => assert_eq!(points.len(), 2),
            _ => panic!("expected route subcommand"),
        }
    }
}

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use polaris_pilot::angles::{from_sexagesimal, to_sexagesimal, wrap_to_24, AngleUnit};
use polaris_pilot::config::Config;
use polaris_pilot::sky::{get_az_alt, local_sidereal_time, ra_at_altitude_zero, Site};
use polaris_pilot::status::{StatusSink, StatusSnapshot};
use polaris_pilot::telemetry::{TelemetryClient, WebSocketConnector};

#[derive(Parser)]
#[command(name = "pilot")]
#[command(about = "Mount pilot: coordinate tools and telemetry listener")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a decimal angle in sexagesimal form
    Dms {
        #[arg(allow_hyphen_values = true)]
        value: f64,
        /// Treat the value as hours instead of degrees
        #[arg(long)]
        hours: bool,
        #[arg(long, default_value_t = 1)]
        precision: u32,
    },
    /// Parse a sexagesimal angle into decimal
    Parse {
        #[arg(allow_hyphen_values = true)]
        text: String,
        #[arg(long)]
        hours: bool,
    },
    /// Horizontal position of an equatorial coordinate
    Azalt {
        /// Right ascension in hours, decimal or h:m:s
        #[arg(long, allow_hyphen_values = true)]
        ra: String,
        /// Declination in degrees, decimal or d:m:s
        #[arg(long, allow_hyphen_values = true)]
        dec: String,
        #[arg(long, allow_hyphen_values = true, requires = "lon")]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true, requires = "lat")]
        lon: Option<f64>,
        #[arg(long)]
        config: Option<String>,
        /// RFC 3339 timestamp, defaults to now
        #[arg(long)]
        time: Option<String>,
    },
    /// Follow the telemetry feed until Ctrl-C
    Listen {
        #[arg(long)]
        config: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long = "topic")]
        topics: Vec<String>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Dms {
            value,
            hours,
            precision,
        } => dms(value, unit(hours), precision),
        Commands::Parse { text, hours } => {
            println!("{}", from_sexagesimal(&text, unit(hours)));
            ExitCode::SUCCESS
        }
        Commands::Azalt {
            ra,
            dec,
            lat,
            lon,
            config,
            time,
        } => azalt(&ra, &dec, lat.zip(lon), config.as_deref(), time.as_deref()),
        Commands::Listen {
            config,
            url,
            topics,
        } => listen(config.as_deref(), url, topics),
    }
}

fn unit(hours: bool) -> AngleUnit {
    if hours {
        AngleUnit::Hours
    } else {
        AngleUnit::Degrees
    }
}

fn dms(value: f64, unit: AngleUnit, precision: u32) -> ExitCode {
    match to_sexagesimal(value, precision, unit) {
        Some(s) => {
            println!("{}", s);
            ExitCode::SUCCESS
        }
        None => {
            eprintln!("Angle out of range: {}", value);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&str>) -> Result<Config, ExitCode> {
    match path {
        Some(path) => Config::from_file(path).map_err(|e| {
            eprintln!("Config error: {}", e);
            ExitCode::FAILURE
        }),
        None => Ok(Config::default()),
    }
}

fn format_angle(value: f64, unit: AngleUnit) -> String {
    to_sexagesimal(value, 1, unit)
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn azalt(
    ra: &str,
    dec: &str,
    coordinates: Option<(f64, f64)>,
    config: Option<&str>,
    time: Option<&str>,
) -> ExitCode {
    let site = match coordinates {
        Some((lat, lon)) => Site::new(lat, lon),
        None => match load_config(config) {
            Ok(config) => match config.site.site() {
                Ok(site) => site,
                Err(e) => {
                    eprintln!("Config error: {}", e);
                    return ExitCode::FAILURE;
                }
            },
            Err(code) => return code,
        },
    };
    let Some(site) = site else {
        eprintln!("No valid observer location; pass --lat/--lon or a config with a site");
        return ExitCode::FAILURE;
    };

    let time: DateTime<Utc> = match time {
        Some(t) => match DateTime::parse_from_rfc3339(t) {
            Ok(t) => t.with_timezone(&Utc),
            Err(e) => {
                eprintln!("Invalid time {}: {}", t, e);
                return ExitCode::FAILURE;
            }
        },
        None => Utc::now(),
    };

    let ra_hours = from_sexagesimal(ra, AngleUnit::Hours);
    let dec_deg = from_sexagesimal(dec, AngleUnit::Degrees);
    let Some(position) = get_az_alt(ra_hours, dec_deg, site.latitude_deg, site.longitude_deg, time)
    else {
        eprintln!("Coordinates are not finite");
        return ExitCode::FAILURE;
    };

    let lst_hours = wrap_to_24(local_sidereal_time(time, site.longitude_deg) / 15.0);
    println!("time      {}", time.to_rfc3339());
    println!("site      {:.4}, {:.4}", site.latitude_deg, site.longitude_deg);
    println!("azimuth   {}", format_angle(position.azimuth_deg, AngleUnit::Degrees));
    println!("altitude  {}", format_angle(position.altitude_deg, AngleUnit::Degrees));
    println!("lst       {}", format_angle(lst_hours, AngleUnit::Hours));
    match ra_at_altitude_zero(dec_deg, site.latitude_deg, lst_hours) {
        Some(crossing) => {
            println!(
                "rising ra {}",
                format_angle(crossing.rising_ra_hours, AngleUnit::Hours)
            );
            println!(
                "setting ra {}",
                format_angle(crossing.setting_ra_hours, AngleUnit::Hours)
            );
        }
        None if position.is_above_horizon() => println!("never sets"),
        None => println!("never rises"),
    }
    ExitCode::SUCCESS
}

struct LogStatus;

impl StatusSink for LogStatus {
    fn publish(&self, status: StatusSnapshot) {
        log::info!(
            "status: az {} alt {} tracking {} slewing {} parked {}",
            format_angle(status.azimuth, AngleUnit::Degrees),
            format_angle(status.altitude, AngleUnit::Degrees),
            status.tracking,
            status.slewing,
            status.atpark
        );
    }
}

fn listen(config: Option<&str>, url: Option<String>, topics: Vec<String>) -> ExitCode {
    let config = match load_config(config) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let Some(url) = url.or_else(|| config.telemetry.url.clone()) else {
        eprintln!("No telemetry url; pass --url or set telemetry.url");
        return ExitCode::FAILURE;
    };
    let topics = if topics.is_empty() {
        config.telemetry.topics.clone()
    } else {
        topics
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(async move {
        let mut client = TelemetryClient::spawn(
            config.telemetry.session_settings(),
            Arc::new(WebSocketConnector),
            Arc::new(LogStatus),
        );
        for topic in &topics {
            if let Err(e) = client.subscribe(topic.as_str(), serde_json::json!({})) {
                eprintln!("Subscribe failed: {}", e);
                return ExitCode::FAILURE;
            }
        }
        if let Err(e) = client.connect(url) {
            eprintln!("Connect failed: {}", e);
            return ExitCode::FAILURE;
        }

        let mut transitions = client.transitions();
        let mut report = tokio::time::interval(Duration::from_secs(10));
        let mut seen: HashMap<String, usize> = HashMap::new();
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                state = transitions.recv() => match state {
                    Ok(state) => log::info!("connection {}", state),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        log::warn!("missed {} connection state changes", missed)
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = report.tick() => {
                    for topic in &topics {
                        let records = client.history(topic);
                        let last = seen.entry(topic.clone()).or_insert(0);
                        if records.len() != *last {
                            if let Some(latest) = records.last() {
                                log::info!("{} ({} buffered): {}", topic, records.len(), latest.data);
                            }
                            *last = records.len();
                        }
                    }
                }
            }
        }

        let _ = client.disconnect();
        client.shutdown().await;
        ExitCode::SUCCESS
    })
}

use std::process;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use lokitime::PortalClient;
use lokitime::types::DateRange;

#[derive(Parser)]
#[command(name = "lokitime")]
#[command(about = "A lokitime.com reservation calendar client", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[arg(
        long,
        env = "LOKITIME_BASE_URL",
        global = true,
        help = "Portal base URL (defaults to https://www.lokitime.com/kiinteisto)"
    )]
    base_url: Option<String>,

    #[arg(short, long, env = "LOKITIME_USERNAME", global = true, help = "Portal username")]
    username: Option<String>,

    #[arg(
        short,
        long,
        env = "LOKITIME_PASSWORD",
        hide_env_values = true,
        global = true,
        help = "Portal password"
    )]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List the reservation calendars available to the account
    Calendars {
        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Fetch reservations of a calendar between two dates (inclusive)
    Range {
        #[arg(short, long, help = "Calendar id as listed by `calendars`")]
        calendar: String,

        #[arg(
            long,
            value_name = "YYYY-MM-DD",
            help = "First day of the range",
            value_parser = parse_date,
        )]
        start_date: NaiveDate,

        #[arg(
            long,
            value_name = "YYYY-MM-DD",
            help = "Last day of the range",
            value_parser = parse_date,
        )]
        end_date: NaiveDate,
    },
    /// Fetch today's reservations of a calendar
    Today {
        #[arg(short, long, help = "Calendar id as listed by `calendars`")]
        calendar: String,
    },
    /// Fetch reservations of a calendar for the current week, Monday to Sunday
    Week {
        #[arg(short, long, help = "Calendar id as listed by `calendars`")]
        calendar: String,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| e.to_string())
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

fn required(value: Option<String>, name: &str, env: &str) -> String {
    value.unwrap_or_else(|| {
        log::error!("Missing {name}: pass --{name} or set {env}");
        process::exit(1);
    })
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    let username = required(cli.username, "username", "LOKITIME_USERNAME");
    let password = required(cli.password, "password", "LOKITIME_PASSWORD");

    let client = match cli.base_url {
        Some(url) => PortalClient::with_base_url(url),
        None => PortalClient::new(),
    };
    let client = client.unwrap_or_else(|e| {
        log::error!("Error creating client: {}", e);
        process::exit(1);
    });

    if let Err(e) = client.authenticate(&username, &password).await {
        log::error!("Login failed: {}", e);
        process::exit(1);
    }

    match cli.command {
        Commands::Calendars { format } => {
            let calendars = client.list_calendars().await.unwrap_or_else(|e| {
                log::error!("Error fetching calendars: {}", e);
                process::exit(1);
            });

            match format {
                OutputFormat::Json => serialize_json(&calendars),
                OutputFormat::Text => {
                    if calendars.is_empty() {
                        println!("No calendars available.");
                    } else {
                        for (i, calendar) in calendars.iter().enumerate() {
                            println!("{:>3}. {}", i + 1, calendar);
                        }
                    }
                }
            }
        }

        Commands::Range {
            calendar,
            start_date,
            end_date,
        } => {
            let range = DateRange::new(start_date, end_date)
                .validate()
                .unwrap_or_else(|e| {
                    log::error!("Invalid args: {e}");
                    process::exit(1);
                });

            let reservations = client
                .fetch_reservations(&calendar, range)
                .await
                .unwrap_or_else(|e| {
                    log::error!("Error fetching reservations for {}: {}", range, e);
                    process::exit(1);
                });
            serialize_json(&reservations);
        }

        Commands::Today { calendar } => {
            let reservations = client
                .fetch_calendar_today(&calendar)
                .await
                .unwrap_or_else(|e| {
                    log::error!("Error fetching today's reservations: {}", e);
                    process::exit(1);
                });
            serialize_json(&reservations);
        }

        Commands::Week { calendar } => {
            let reservations = client
                .fetch_calendar_this_week(&calendar)
                .await
                .unwrap_or_else(|e| {
                    log::error!("Error fetching this week's reservations: {}", e);
                    process::exit(1);
                });
            serialize_json(&reservations);
        }
    }
}

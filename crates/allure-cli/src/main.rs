use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use allure::config::current_year;
use allure::export::{RankedRow, to_rows, write_csv};
use allure::klikego::{RosterScraper, parse_race_reference};
use allure::types::{Course, Sex};
use allure::{HttpClient, Pipeline, RankingConfig, RankingRequest};
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "allure")]
#[command(about = "Rank a race's entrants by their best recent performance", long_about = None)]
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
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// List the courses of a race
    Courses {
        #[arg(help = "Klikego race link or race reference")]
        race: String,

        #[arg(long, help = "Also list gender and age-category selectors")]
        all: bool,
    },
    /// List every entrant of a course
    Roster {
        #[arg(help = "Klikego race link or race reference")]
        race: String,

        #[arg(short, long, help = "Course id or name, see the courses command")]
        course: String,
    },
    /// Rank the entrants of a course by their best performance
    Rank {
        #[arg(help = "Klikego race link or race reference")]
        race: String,

        #[arg(short, long, help = "Course id or name, see the courses command")]
        course: String,

        #[arg(long, default_value_t = 18, help = "Minimum age, inclusive")]
        min_age: u32,

        #[arg(long, default_value_t = 100, help = "Maximum age, inclusive")]
        max_age: u32,

        #[arg(long, value_parser = parse_sex, help = "Only rank 'm' or 'f' athletes")]
        sex: Option<Sex>,

        #[arg(long, value_name = "FILE", help = "JSON file with ranking settings")]
        config: Option<PathBuf>,

        #[arg(long, help = "Ignore results shorter than this many kilometers")]
        min_distance: Option<f64>,

        #[arg(long, help = "Ignore speeds at or above this many km/h")]
        speed_ceiling: Option<f64>,

        #[arg(long, help = "Concurrent athlete lookups")]
        workers: Option<usize>,

        #[arg(long, help = "Results season to search")]
        season: Option<i32>,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,

        #[arg(long, value_name = "FILE", help = "Write the ranking to a file instead of stdout")]
        out: Option<PathBuf>,
    },
}

fn parse_sex(s: &str) -> Result<Sex, String> {
    Sex::from_str(s).map_err(|e| e.to_string())
}

fn fail(context: &str, e: impl std::fmt::Display) -> ! {
    log::error!("{}: {}", context, e);
    process::exit(1);
}

fn serialize_json<T: serde::Serialize>(value: &T, out: &mut dyn Write) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            if let Err(e) = writeln!(out, "{}", json) {
                fail("Error writing output", e);
            }
        }
        Err(e) => fail("Error serializing to JSON", e),
    }
}

fn output(path: Option<&PathBuf>) -> Box<dyn Write> {
    match path {
        Some(path) => match File::create(path) {
            Ok(file) => Box::new(file),
            Err(e) => fail(&format!("Error creating {}", path.display()), e),
        },
        None => Box::new(io::stdout().lock()),
    }
}

async fn resolve_course(scraper: &RosterScraper<'_, HttpClient>, race: &str, wanted: &str) -> Course {
    let catalog = scraper
        .fetch_course_catalog(race)
        .await
        .unwrap_or_else(|e| fail("Error fetching courses", e));

    catalog.resolve(wanted).cloned().unwrap_or_else(|| {
        let known: Vec<_> = catalog.races().map(|c| c.name.as_str()).collect();
        fail(
            &format!("Unknown course '{}'", wanted),
            format!("available courses: {}", known.join(", ")),
        )
    })
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    let client = HttpClient::new().unwrap_or_else(|e| fail("Error creating HTTP client", e));

    match cli.command {
        Commands::Courses { race, all } => {
            let scraper = RosterScraper::new(&client);
            let catalog = scraper
                .fetch_course_catalog(&race)
                .await
                .unwrap_or_else(|e| fail("Error fetching courses", e));

            let courses: Vec<&Course> = if all {
                catalog.iter().collect()
            } else {
                catalog.races().collect()
            };
            if courses.is_empty() {
                println!("No course to display.");
            }
            for (i, course) in courses.iter().enumerate() {
                println!("{:>3}. {}", i + 1, course);
            }
        }

        Commands::Roster { race, course } => {
            let reference =
                parse_race_reference(&race).unwrap_or_else(|e| fail("Invalid race", e));
            let scraper = RosterScraper::new(&client);
            let course = resolve_course(&scraper, &reference, &course).await;

            log::info!("Fetching entrants of {}...", course);
            let names = scraper
                .crawl_roster(&reference, &course.id, RankingConfig::default().max_roster_pages)
                .await;

            if names.is_empty() {
                println!("No entrant found.");
            }
            for (i, name) in names.iter().enumerate() {
                println!("{:>4}. {}", i + 1, name);
            }
        }

        Commands::Rank {
            race,
            course,
            min_age,
            max_age,
            sex,
            config,
            min_distance,
            speed_ceiling,
            workers,
            season,
            format,
            out,
        } => {
            let mut settings = match config {
                Some(path) => RankingConfig::from_file(&path)
                    .unwrap_or_else(|e| fail(&format!("Error loading {}", path.display()), e)),
                None => RankingConfig::default(),
            };
            if let Some(km) = min_distance {
                settings.min_distance_km = km;
            }
            if let Some(kph) = speed_ceiling {
                settings.speed_ceiling_kph = kph;
            }
            if let Some(workers) = workers {
                settings.workers = workers;
            }
            if let Some(season) = season {
                settings.season = season;
            }

            let pipeline =
                Pipeline::new(&client, settings).unwrap_or_else(|e| fail("Invalid settings", e));

            let reference =
                parse_race_reference(&race).unwrap_or_else(|e| fail("Invalid race", e));
            let course = resolve_course(pipeline.roster(), &reference, &course).await;
            log::info!("Ranking entrants of {}...", course);

            let request = RankingRequest {
                race: reference,
                course_id: course.id,
                min_age,
                max_age,
                sex,
            };
            let outcome = pipeline
                .run(&request, current_year())
                .await
                .unwrap_or_else(|e| fail("Error ranking entrants", e));

            if !outcome.rejected_names.is_empty() {
                log::warn!(
                    "{} badly formatted name(s) ignored: {}",
                    outcome.rejected_names.len(),
                    outcome.rejected_names.join(", ")
                );
            }

            let rows: Vec<RankedRow> = to_rows(&outcome.ranked);
            let mut out = output(out.as_ref());
            match format {
                OutputFormat::Json => serialize_json(&rows, &mut out),
                OutputFormat::Csv => {
                    write_csv(&rows, &mut out).unwrap_or_else(|e| fail("Error writing CSV", e))
                }
                OutputFormat::Text => {
                    let written = if rows.is_empty() {
                        writeln!(out, "No performance matches these filters.")
                    } else {
                        rows.iter()
                            .enumerate()
                            .try_for_each(|(i, row)| writeln!(out, "{:>3}. {}", i + 1, row))
                    };
                    written.unwrap_or_else(|e| fail("Error writing output", e));
                }
            }
        }
    }
}

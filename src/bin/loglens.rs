use std::path::{Path, PathBuf};
use std::time::Duration;
use structopt::StructOpt;

use loglens::config::Config;
use loglens::generator::SyntheticLogGenerator;
use loglens::input::SampleFetcher;
use loglens::output::{OutputFormat, OutputHandler};
use loglens::{GeminiAnalyzer, Session};

/// Security log analysis command line interface
#[derive(StructOpt, Debug)]
#[structopt(name = "loglens", about = "Security log ingestion and AI-assisted analysis")]
pub enum Cli {
    /// Generate a default configuration file
    Config {
        /// Output path for the configuration file
        #[structopt(short, long, default_value = "loglens.toml")]
        output: PathBuf,
    },
    /// Show summary statistics and the event timeline for a log file
    Stats {
        /// Path to log file (JSON, CSV or plain text)
        #[structopt(short, long)]
        file: PathBuf,
        /// Path to configuration file
        #[structopt(short, long, default_value = "loglens.toml")]
        config: PathBuf,
        /// Output format override: "console" or "json"
        #[structopt(long)]
        format: Option<String>,
    },
    /// Send a log file to the analyzer and print the report
    Analyze {
        /// Path to log file (JSON, CSV or plain text)
        #[structopt(short, long)]
        file: PathBuf,
        /// Path to configuration file
        #[structopt(short, long, default_value = "loglens.toml")]
        config: PathBuf,
        /// Write the report to the configured export directory
        #[structopt(long)]
        export: bool,
    },
    /// Ask a question about a log file
    Chat {
        /// Path to log file (JSON, CSV or plain text)
        #[structopt(short, long)]
        file: PathBuf,
        /// Question to ask
        #[structopt(short, long)]
        message: String,
        /// Path to configuration file
        #[structopt(short, long, default_value = "loglens.toml")]
        config: PathBuf,
    },
    /// Generate synthetic logs containing a brute-force pattern
    Demo {
        /// Number of log slots to generate
        #[structopt(short = "n", long, default_value = "150")]
        count: usize,
        /// Write the generated logs as JSON to this path
        #[structopt(short, long)]
        save: Option<PathBuf>,
        /// Also run an analysis on the generated logs
        #[structopt(long)]
        analyze: bool,
        /// Path to configuration file
        #[structopt(short, long, default_value = "loglens.toml")]
        config: PathBuf,
    },
    /// Fetch the sample log document and show its statistics
    Sample {
        /// URL of the sample document, overriding the configuration
        #[structopt(short, long)]
        url: Option<String>,
        /// Path to configuration file
        #[structopt(short, long, default_value = "loglens.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::from_args();

    match cli {
        Cli::Config { output } => {
            let config = Config::default();
            config.to_file(&output)?;
            println!("Default configuration written to: {:?}", output);
        }
        Cli::Stats { file, config, format } => {
            let config = Config::load_or_default(&config)?;
            let mut session = Session::new(config.limits.clone());
            session.load_raw(read_log_file(&file)?);

            let format = format.unwrap_or_else(|| config.output.format.clone());
            print_summary(&session, OutputFormat::from_str(&format))?;
        }
        Cli::Analyze { file, config, export } => {
            let config = Config::load_or_default(&config)?;
            let mut session = Session::new(config.limits.clone());
            session.load_raw(read_log_file(&file)?);

            run_analysis(&config, &mut session, export).await?;
        }
        Cli::Chat { file, message, config } => {
            let config = Config::load_or_default(&config)?;
            let analyzer = GeminiAnalyzer::new(&config.analyzer, config.api_key()?);
            let mut session = Session::new(config.limits.clone());
            session.load_raw(read_log_file(&file)?);

            session.chat(&analyzer, &message).await;
            if let Some(reply) = session.messages().last() {
                println!("{}", reply.content);
            }
        }
        Cli::Demo { count, save, analyze, config } => {
            let config = Config::load_or_default(&config)?;
            let batch = SyntheticLogGenerator::new().generate(count);
            log::info!("Generated {} synthetic record(s)", batch.len());

            if let Some(path) = save {
                std::fs::write(&path, batch.to_json_pretty()?)?;
                println!("Synthetic logs written to: {:?}", path);
            }

            let mut session = Session::new(config.limits.clone());
            session.load_batch(batch);
            print_summary(&session, OutputFormat::from_str(&config.output.format))?;

            if analyze {
                run_analysis(&config, &mut session, false).await?;
            }
        }
        Cli::Sample { url, config } => {
            let config = Config::load_or_default(&config)?;
            let url = url.or_else(|| config.sample.url.clone()).unwrap_or_default();

            let fetcher = SampleFetcher::new(Duration::from_secs(config.analyzer.timeout_seconds));
            match fetcher.fetch(&url).await {
                Ok(raw) => {
                    let mut session = Session::new(config.limits.clone());
                    session.load_raw(raw);
                    print_summary(&session, OutputFormat::from_str(&config.output.format))?;
                }
                Err(e) => {
                    eprintln!("Failed to load sample data: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

fn read_log_file(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    if !path.exists() {
        eprintln!("File not found: {:?}", path);
        std::process::exit(1);
    }
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn print_summary(session: &Session, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let mut handler = OutputHandler::new(format, None)?;
    handler.write_summary(&session.stats(), &session.timeline())?;
    handler.flush()?;
    Ok(())
}

async fn run_analysis(
    config: &Config,
    session: &mut Session,
    export: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let analyzer = GeminiAnalyzer::new(&config.analyzer, config.api_key()?);
    session.analyze(&analyzer).await;

    let mut handler = OutputHandler::new(OutputFormat::Console, None)?;
    if let Some(reply) = session.messages().last() {
        handler.write_text(&reply.content)?;
    }

    if export {
        match session.export() {
            Ok(report) => {
                let path = report.write_to_dir(&config.output.export_dir)?;
                println!("Report exported to: {:?}", path);
            }
            Err(e) => log::warn!("Nothing exported: {}", e),
        }
    }
    Ok(())
}

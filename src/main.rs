use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use lumi_html_reporter::report::{self, ReportFormat};
use lumi_html_reporter::runner::{self, RunnerResult};
use lumi_html_reporter::utils::config::ReporterConfig;

#[derive(Parser)]
#[command(name = "lumi-html-reporter")]
#[command(version)]
#[command(about = "Single-page HTML reports for multi-runner test runs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded run and write the report
    Render {
        /// Runner events, one JSON object per line
        events: PathBuf,

        /// Stats store snapshot (JSON)
        #[arg(short, long)]
        stats: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Screenshot directory
        #[arg(long)]
        screenshots: Option<PathBuf>,

        /// Output format (html, json, junit)
        #[arg(short, long)]
        format: Option<ReportFormat>,

        /// Reporter config file (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Replay a recorded run and print per-runner counts
    Summary {
        /// Runner events, one JSON object per line
        events: PathBuf,

        /// Stats store snapshot (JSON)
        #[arg(short, long)]
        stats: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            events,
            stats,
            output,
            screenshots,
            format,
            config,
        } => {
            let mut reporter_config = match config {
                Some(path) => ReporterConfig::load(&path)?,
                None => ReporterConfig::default(),
            };
            if let Some(output) = output {
                reporter_config.out_file = output;
            }
            if let Some(screenshots) = screenshots {
                reporter_config.screenshot_path = screenshots;
            }
            if let Some(format) = format {
                reporter_config.format = format;
            }

            println!(
                "{} Replaying events from: {}",
                "▶".green().bold(),
                events.display()
            );

            let aggregator = runner::replay_run(&events, &stats).await?;
            print_summary(aggregator.results());

            let paths = reporter_config.resolve(&std::env::current_dir()?);
            report::generate_report(aggregator.results(), reporter_config.format, &paths)?;
            println!(
                "{} {} report saved to: {}",
                "📊".to_string().blue(),
                reporter_config.format.to_string().cyan(),
                paths.out_file.display()
            );
        }

        Commands::Summary { events, stats } => {
            let aggregator = runner::replay_run(&events, &stats).await?;
            print_summary(aggregator.results());

            if aggregator.results().iter().any(RunnerResult::is_failing) {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn print_summary(results: &[RunnerResult]) {
    for result in results {
        let counts = &result.runner_tests_number;
        let marker = if result.is_failing() {
            "✗".red().bold()
        } else {
            "✓".green().bold()
        };
        let browser = result
            .capabilities
            .get("browserName")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");

        println!(
            "  {} {} ({}): {} passing, {} pending, {} failing, {} suite(s)",
            marker,
            result.cid.white().bold(),
            browser.cyan(),
            counts.passing.to_string().green(),
            counts.pending.to_string().yellow(),
            counts.failing.to_string().red(),
            result.suites.len()
        );
    }
}

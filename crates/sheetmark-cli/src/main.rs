//! sheetmark CLI — exam pattern setup and answer-sheet digitization.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "sheetmark",
    version,
    about = "Exam pattern configuration and answer-sheet digitization"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create starter config, record store and example pattern
    Init,

    /// Check a pattern file and print its estimated total
    Validate {
        /// Path to a pattern .toml file
        #[arg(long)]
        pattern: PathBuf,
    },

    /// Create an exam from a pattern file
    CreateExam {
        /// Path to a pattern .toml file
        #[arg(long)]
        pattern: PathBuf,

        /// Exam id (overrides the pattern's [exam] header)
        #[arg(long)]
        exam_id: Option<u64>,

        /// Course code, e.g. "20MCA101"
        #[arg(long)]
        course: Option<String>,

        /// Exam date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,

        /// Series label, e.g. "Series 2"
        #[arg(long)]
        series: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Digitize scanned answer sheets for an exam
    Digitize {
        /// Exam to record marks for
        #[arg(long)]
        exam_id: u64,

        /// Sheet image, or a directory of sheets
        #[arg(long)]
        sheets: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sheetmark=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate { pattern } => commands::validate::execute(pattern),
        Commands::CreateExam {
            pattern,
            exam_id,
            course,
            date,
            series,
            config,
        } => commands::create_exam::execute(pattern, exam_id, course, date, series, config),
        Commands::Digitize {
            exam_id,
            sheets,
            config,
        } => commands::digitize::execute(exam_id, sheets, config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod analysis;
mod charts;
mod concatenate;
mod error;
mod output;
mod profile_format;
mod report;

#[derive(Subcommand)]
enum Commands {
    /// Join every script under a directory into one file with header comments
    ConcatenateFiles {
        /// Directory searched recursively for source files
        #[arg(short, long, default_value = "./js")]
        root: PathBuf,

        /// File the concatenated sources are written to
        #[arg(short, long, default_value = "./tools/all_js_files_concatenated.js")]
        output: PathBuf,

        /// Extension of the files to collect
        #[arg(short, long, default_value = "js")]
        extension: String,

        /// Date written in the header (defaults to today, YYYY-MM-DD)
        #[arg(long)]
        generated_on: Option<String>,
    },
    /// Render an HTML dashboard from a profiler JSON capture
    ProfileReport {
        /// Capture exported by the profiler
        profile_data: PathBuf,
    },
}

#[derive(Parser)]
#[command(
    name = "frame-tools",
    version = "1.0",
    about = "source bundling and frame profile reports"
)]
struct Cli {
    /// Log debug diagnostics to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    init_tracing(cli.verbose);

    match cli.command {
        Commands::ConcatenateFiles {
            root,
            output,
            extension,
            generated_on,
        } => {
            println!(
                "{}",
                format!("====> Concatenating *.{} files under {}", extension, root.display())
                    .green()
            );
            let mut config = concatenate::ConcatConfig::new(root, output, extension);
            if let Some(date) = generated_on {
                config.generated_on = date;
            }
            match concatenate::concatenate_files(&config) {
                Ok(summary) => {
                    tracing::info!(files = summary.files, bytes = summary.bytes, "bundle written");
                    println!(
                        "{}",
                        format!(
                            "Successfully concatenated {} {} files to {}",
                            summary.files,
                            summary.label,
                            config.output.display()
                        )
                        .green()
                    );
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("{}", format!("====> Error concatenating files: {}", e).red());
                    ExitCode::from(1)
                }
            }
        }
        Commands::ProfileReport { profile_data } => {
            println!(
                "{}",
                format!("====> Generating report for {}", profile_data.display()).green()
            );
            match report::entry_point(&profile_data) {
                Ok(output_path) => {
                    println!(
                        "{}",
                        format!("Report generated: {}", output_path.display()).green()
                    );
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("{}", format!("====> Error generating report: {}", e).red());
                    ExitCode::from(1)
                }
            }
        }
    }
}

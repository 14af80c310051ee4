use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use mutaflow::{execute, Cli};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "mutaflow={level},mutaflow_core={level},mutaflow_analysis={level}"
        ))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn progress_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} validating [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    bar.set_style(style);
    bar
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let progress = progress_bar(cli.quiet);
    match execute(&cli, &progress) {
        Ok(summary) => {
            if !cli.quiet {
                eprintln!(
                    "{} {} of {} mutants compile ({} rejected)",
                    "✓".green().bold(),
                    summary.written.to_string().bold(),
                    summary.candidates,
                    summary.rejected()
                );
                if summary.warnings > 0 {
                    eprintln!("{} source has {} warning(s)", "!".yellow().bold(), summary.warnings);
                }
                eprintln!("  {}", summary.output.display().to_string().cyan());
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            progress.finish_and_clear();
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

//! Command-line driver for mutaflow
//!
//! [`execute`] runs a whole mutation job for one C# file and writes the
//! compiling mutants into a fresh `Output-<timestamp>` directory.

pub mod output;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{ArgAction, Parser};
use indicatif::ProgressBar;
use mutaflow_analysis::metrics::qualified_name;
use mutaflow_analysis::{Analyzer, CfgGraph, MutationMetrics, MutationReport};
use mutaflow_core::{CfgBuilder, MutaflowPipeline, MutationConfig};
use std::ffi::OsStr;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::output::{mutant_file_name, timestamp_dir_name, OutputDir};

pub const REPORT_FILE: &str = "report.json";

#[derive(Parser, Debug, Clone)]
#[command(name = "mutaflow")]
#[command(about = "Generates compiling mutants of a C# source file", long_about = None)]
#[command(version)]
pub struct Cli {
    /// C# file to mutate
    pub source: PathBuf,

    /// Directory that receives the `Output-<timestamp>` folder
    pub output_dir: PathBuf,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Also write report.json with metrics for the run
    #[arg(long)]
    pub report: bool,

    /// Also write one Graphviz file per method CFG
    #[arg(long)]
    pub dot: bool,

    /// Print every written mutant to stdout
    #[arg(long)]
    pub print: bool,
}

/// What a finished job produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output: PathBuf,
    pub candidates: usize,
    pub written: usize,
    pub warnings: usize,
}

impl RunSummary {
    pub fn rejected(&self) -> usize {
        self.candidates - self.written
    }
}

pub fn load_config(cli: &Cli) -> Result<MutationConfig> {
    match &cli.config {
        Some(path) => MutationConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(MutationConfig::default()),
    }
}

/// Runs one mutation job. `progress` advances once per validated candidate.
pub fn execute(cli: &Cli, progress: &ProgressBar) -> Result<RunSummary> {
    if cli.source.extension().and_then(OsStr::to_str) != Some("cs") {
        bail!("Please include a single C# file with file extension .cs");
    }

    let config = load_config(cli)?;
    let dataflow = config.dataflow;
    let source = fs::read_to_string(&cli.source)
        .with_context(|| format!("reading {}", cli.source.display()))?;

    let pipeline = MutaflowPipeline::from_config(config)?;
    let tree = pipeline
        .parse(&source)
        .with_context(|| format!("parsing {}", cli.source.display()))?;
    let diagnostics = pipeline.check(&tree)?;
    let candidates = pipeline.generate(&tree)?;
    let total = candidates.len();
    let mut metrics = MutationMetrics::from_candidates(&candidates);
    info!(candidates = total, "generated candidates");

    progress.set_length(total as u64);
    let survivors = pipeline.validate_with(candidates, |_, _| progress.inc(1));
    progress.finish_and_clear();
    metrics.record_survivors(&survivors);
    info!(valid = survivors.len(), rejected = total - survivors.len(), "validated candidates");

    let out = OutputDir::create(&cli.output_dir, &timestamp_dir_name(&Local::now()))?;
    for (index, mutant) in survivors.iter().enumerate() {
        let text = mutant.render();
        out.write(&mutant_file_name(index), &text)?;
        if cli.print {
            println!("// {}: {}", mutant_file_name(index), mutant.description());
            println!("{text}");
        }
    }

    if cli.dot {
        for method in tree.methods() {
            let cfg = CfgBuilder::new(&tree).build_method(method)?;
            let file = format!("{}.dot", qualified_name(&tree, method));
            debug!(file = %file, "writing CFG");
            out.write(&file, &CfgGraph::new(&tree, &cfg).to_dot())?;
        }
    }

    if cli.report {
        let analysis = Analyzer::with_options(dataflow).analyze(&tree)?;
        MutationReport::new(cli.source.display().to_string(), analysis, metrics, &survivors)
            .with_timestamp(Local::now().to_rfc3339())
            .write(&out.path().join(REPORT_FILE))?;
    }

    let output = out.commit()?;
    info!(path = %output.display(), "wrote mutants");

    Ok(RunSummary {
        output,
        candidates: total,
        written: survivors.len(),
        warnings: diagnostics.warnings().count(),
    })
}

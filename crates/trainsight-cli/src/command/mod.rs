use clap::{Parser, Subcommand};

use self::{analyze::AnalyzeArg, init_config::InitConfigArg, report::ReportArg};

mod analyze;
mod init_config;
mod report;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Log progress and diagnostics to stderr (repeat for more detail)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    /// What to run
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Print the participation analysis of a records file
    Analyze(#[clap(flatten)] AnalyzeArg),
    /// Write the participation analysis as JSON
    Report(#[clap(flatten)] ReportArg),
    /// Write the default analysis configuration
    InitConfig(#[clap(flatten)] InitConfigArg),
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    // RUST_LOG still takes precedence over the flag
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    init_logger(args.verbose);
    match args.mode {
        Mode::Analyze(arg) => analyze::run(&arg)?,
        Mode::Report(arg) => report::run(&arg)?,
        Mode::InitConfig(arg) => init_config::run(&arg)?,
    }
    Ok(())
}

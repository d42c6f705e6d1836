use std::path::PathBuf;

use clap::Args;

use crate::util::{self, Output};

#[derive(Debug, Clone, Args)]
pub(crate) struct ReportArg {
    /// Path to the records JSON file
    pub records: PathBuf,

    /// Path to the analysis configuration (built-in workforce layout if omitted)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output file path (stdout if omitted)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ReportArg) -> anyhow::Result<()> {
    let ReportArg {
        records,
        config,
        output,
    } = arg;

    let config = util::load_config(config.as_deref())?;
    let report = util::build_report(records, &config)?;
    Output::save_json(&report, output.clone())?;
    Ok(())
}

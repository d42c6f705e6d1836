use std::path::PathBuf;

use clap::Args;
use trainsight_analysis::config::AnalysisConfig;

use crate::util::Output;

#[derive(Debug, Clone, Args)]
pub(crate) struct InitConfigArg {
    /// Output file path (stdout if omitted)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub(crate) fn run(arg: &InitConfigArg) -> anyhow::Result<()> {
    let InitConfigArg { output } = arg;
    Output::save_json(&AnalysisConfig::default_workforce(), output.clone())?;
    if let Some(path) = output {
        eprintln!("Default configuration written to {}", path.display());
    }
    Ok(())
}

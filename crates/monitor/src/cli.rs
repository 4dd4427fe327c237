use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "resource-monitor",
    version,
    about = "Account resource summary driven by line commands on stdin"
)]
pub(crate) struct Args {
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
    #[arg(long, default_value = "config/fixtures.toml")]
    pub(crate) fixtures: PathBuf,
    #[arg(long)]
    pub(crate) log_dir: Option<PathBuf>,
    #[arg(long, default_value_t = false)]
    pub(crate) events: bool,
    /// How long to wait for in-flight lookups once stdin is closed.
    #[arg(long, default_value = "5s", value_parser = humantime::parse_duration)]
    pub(crate) drain_timeout: Duration,
}

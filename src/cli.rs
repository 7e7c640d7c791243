use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "berth",
    version,
    about = "A terminal dashboard for Docker containers, images, volumes and networks."
)]
pub struct CliArgs {
    /// Load configuration from this file instead of the discovered one
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Use ASCII glyphs instead of Nerd Font icons
    #[arg(long)]
    pub no_nerd_fonts: bool,

    /// Refresh interval in milliseconds (minimum 500)
    #[arg(long)]
    pub refresh_ms: Option<u64>,

    /// Theme overrides, e.g. primary=#b4befe,warning=yellow
    #[arg(long, value_delimiter = ',')]
    pub theme: Vec<String>,

    /// tracing filter (for example: info,debug,trace)
    #[arg(long, default_value = "info")]
    pub log_filter: String,
}

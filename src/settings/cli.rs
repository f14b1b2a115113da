use super::Parser;

#[derive(Parser, Debug)]
#[command(about = "Issues and rotates access/refresh token pairs")]
pub struct Cli {
    /// Settings file; defaults to settings/dev.toml in debug builds.
    #[arg(long)]
    pub settings: Option<String>,
}

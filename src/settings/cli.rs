use super::Parser;

/// Social graph API server.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Path of the settings file, without or with the `.toml` extension.
    #[arg(long)]
    pub settings: Option<String>,
}

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "quorum-server", version)]
#[command(about = "Chat-workspace poll service")]
pub struct Args {
    /// Path to the TOML config file. A missing file means built-in defaults.
    #[arg(short, long, default_value = "quorum.toml")]
    pub config: String,

    /// Listen address, overrides `server.bind_address`
    #[arg(long)]
    pub bind: Option<String>,
}

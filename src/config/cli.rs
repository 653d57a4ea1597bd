use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "vin-profile")]
#[command(about = "Decode a VIN across several providers into one car profile")]
pub struct CliConfig {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Serve profiles and summaries over HTTP
    Serve {
        /// Override `server.bind` from the config
        #[arg(long)]
        bind: Option<String>,
    },
    /// Print the merged profile for a VIN as JSON
    Profile { vin: String },
    /// Print the one-paragraph summary for a VIN
    Summary { vin: String },
}

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "conduit-server", about = "Conduit publishing server")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/conduit.toml")]
    pub config: String,
}

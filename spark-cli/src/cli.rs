use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "spark-cli")]
#[command(about = "Look up Spark avatars and follow Mercury events")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve avatar urls for one or more users
    Avatar {
        /// User ids (uuids) to look up
        #[arg(required = true)]
        user_ids: Vec<String>,
        /// Requested avatar size; defaults to the configured size
        #[arg(long)]
        size: Option<u32>,
    },
    /// Connect to Mercury and print events until interrupted
    Listen {
        /// Event names to subscribe to
        #[arg(long = "event", default_value = "event:conversation.activity")]
        events: Vec<String>,
    },
}

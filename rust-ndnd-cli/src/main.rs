use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

/// ndnd command line client
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Sets the level of verbosity
    #[clap(short, long, global = true)]
    verbose: bool,

    /// Subcommand to execute
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send an Interest and print the returned Data
    Interest {
        /// Name to request (NDN URI format)
        name: String,

        /// Router to connect to
        #[clap(short, long, default_value = "tcp4://127.0.0.1:6363")]
        router: String,

        /// Timeout in milliseconds
        #[clap(short, long, default_value = "4000")]
        timeout: u64,

        /// Accept Data under the requested prefix
        #[clap(long)]
        prefix: bool,

        /// Require fresh Data
        #[clap(long)]
        fresh: bool,
    },

    /// Answer Interests under a prefix with fixed content
    Serve {
        /// Name prefix to serve (NDN URI format)
        prefix: String,

        /// Content to answer with (string)
        content: String,

        /// Address to listen on
        #[clap(short, long, default_value = "tcp4://0.0.0.0:7000")]
        listen: String,

        /// Freshness period of the produced Data in milliseconds
        #[clap(short, long, default_value = "10000")]
        freshness: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(
        if cli.verbose { "debug" } else { "info" },
    ))
    .init();

    match cli.command {
        Commands::Interest {
            name,
            router,
            timeout,
            prefix,
            fresh,
        } => {
            commands::interest::send_interest(name, router, timeout, prefix, fresh).await?;
        }
        Commands::Serve {
            prefix,
            content,
            listen,
            freshness,
        } => {
            commands::serve::serve(prefix, content, listen, freshness).await?;
        }
    }

    Ok(())
}

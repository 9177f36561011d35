mod cmd;
mod config;
mod error;

use clap::Parser;
use config::{Cli, Commands};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Check => cmd::check::run(&cli.config),
        Commands::Encode(args) => cmd::codec::encode(&cli.config, args),
        Commands::Decode(args) => cmd::codec::decode(&cli.config, args),
        Commands::Get(args) => cmd::get::run(args),
    };
    match result {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

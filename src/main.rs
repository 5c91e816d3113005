use clap::Parser;
use cache_facade::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Demo(args) => cli::demo::run(args).await,
        Command::Ping => cli::store::ping().await,
        Command::Clear => cli::store::clear().await,
    }
}

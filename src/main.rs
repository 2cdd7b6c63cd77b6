use clap::Parser;

use rocket_releaser::{
    Result,
    cli::{self, Command},
    command,
};

fn initialize_logger(verbose: bool) -> Result<()> {
    let filter = if verbose {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };

    let config = simplelog::ConfigBuilder::new()
        .add_filter_allow_str("rocket_releaser")
        .build();

    simplelog::TermLogger::init(
        filter,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    Ok(())
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli_args = cli::Args::parse();

    initialize_logger(cli_args.verbose)?;

    match &cli_args.command {
        Command::Notes(args) => {
            let text = command::notes::execute(args).await?;

            if args.dry_run || cli_args.verbose {
                println!("{text}");
            }
        }
        Command::Healthcheck(args) => command::healthcheck::execute(args).await?,
    }

    Ok(())
}

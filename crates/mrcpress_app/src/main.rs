mod cli;
mod logging;
mod run;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    logging::initialize(args.log, args.verbose);
    let config = args.watch_config()?;
    run::run(config, args.once)
}

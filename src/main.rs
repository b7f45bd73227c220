use clap::Parser;
use inbox_recon::{app, logging, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let report = app::run(&cli)?;
    app::log_summary(&report);

    Ok(())
}

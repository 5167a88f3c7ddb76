use weblog_metrics::cli;

fn main() -> anyhow::Result<()> {
    let config = cli::parse_args()?;
    cli::init_logging(config.verbosity);
    cli::run(&config)
}

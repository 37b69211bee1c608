use clap::Parser;
use screener::cli::{run, Cli};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> std::process::ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "screener=info".into()))
        .init();

    run(Cli::parse())
}

use clap::Parser;

use minic::cli::{self, Cli};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = cli::run(cli) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

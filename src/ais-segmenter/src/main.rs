use ais_segmenter::{settings::Settings, startup::App};
use clap::Parser;
use tracing::{error, event, Level};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();

    let settings = Settings::parse();

    event!(Level::INFO, "starting ais-segmenter...");

    let app = App::build(settings);
    if let Err(e) = app.run().await {
        error!("ais-segmenter failed: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let format = std::env::var("AIS_SEGMENTER_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    // Logs go to stderr, stdout carries the tagged records.
    if format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .json()
            .flatten_event(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}

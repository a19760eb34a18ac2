//! Notch Capsule CLI.
//!
//! Inspects the configuration and replays hover scripts against a headless
//! capsule. Logging goes to stderr and is controlled with `RUST_LOG`.

use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("capsule_lib=info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    if let Err(err) = capsule_lib::cli::run() {
        eprintln!("capsule: {err}");
        std::process::exit(1);
    }
}

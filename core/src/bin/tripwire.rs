/// Tripwire CLI
///
/// Inspects configuration and runs a demo trigger against a real-time scheduler.
use tripwire_core::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run_cli().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

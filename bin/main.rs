//! citelens entry point

use std::process;

#[tokio::main]
async fn main() {
    if let Err(e) = citelens_interface::run_cli().await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

use lib::cli::interface::{exit_code, run_cli_interface};

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli_interface().await {
        log::error!("{err:#}");
        std::process::exit(exit_code(&err));
    }
}

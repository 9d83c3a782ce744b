mod cli;
mod core;
mod interfaces;
mod logging;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run_main().await {
        core::terminal::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

//! PseudoFlow CLI
//!
//! Run with: cargo run --bin pseudoflow -- <command>
//! Or after build: ./target/release/pseudoflow <command>

#[tokio::main]
async fn main() {
    pseudoflow::init_logging();

    if let Err(e) = pseudoflow::cli::run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

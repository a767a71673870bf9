//! Entry point for the `sakbe` binary.

use clap::Parser;

use sakbe_cli::{SakbeApp, SakbeArgs};

#[tokio::main]
async fn main() {
    let args = SakbeArgs::parse();

    let app = match SakbeApp::from_args(&args) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("sakbe: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = app.run(args).await {
        eprintln!("sakbe: {e}");
        std::process::exit(1);
    }
}

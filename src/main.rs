use clap::Parser;
use inflation_explorer::api::{Cli, Command, run_http_server, run_project_command};

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Serve(args) => run_http_server(args.addr()).await,
        Command::Project(args) => run_project_command(args),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

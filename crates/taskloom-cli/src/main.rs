use clap::Parser;
use taskloom::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    taskloom::init_logging(cli.log_level);

    match taskloom::run(cli).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(2);
        }
    }
}

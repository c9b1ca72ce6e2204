use clap::Parser;
use readflow::cli::TrimCli;
use readflow::error::Result;
use readflow::{exit_code, logging, runner};

fn run() -> Result<i32> {
    let cli = TrimCli::parse();
    logging::init(cli.run.verbose);
    runner::trim::execute_trim(&cli)
}

fn main() {
    match run() {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(exit_code::RUNTIME_FAILURE);
        }
    }
}

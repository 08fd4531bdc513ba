pub mod cli;
pub mod config;
pub mod executor;
pub mod manifest;
pub mod planner;
pub mod preflight;
pub mod runner;

/// Run the command line interface and return an exit code.
pub fn run_cli() -> i32 {
    match cli::run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            1
        }
    }
}

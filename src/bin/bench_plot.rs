use bench_plot::bench_plot::{parse_cli, run};
use log::warn;
use std::process;

fn main() {
    let config = parse_cli();

    let log_level = match config.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .target(env_logger::Target::Stdout)
        .init();

    match run(&config) {
        Ok(summary) => {
            if summary.failed() > 0 {
                warn!(
                    "{} of {} files could not be plotted",
                    summary.failed(),
                    summary.outcomes.len()
                );
            }
        }
        Err(e) if e.is_load_error() => {
            println!("Error loading CSV: {}", e);
            process::exit(1);
        }
        Err(e) => {
            println!("Warning: {}", e);
            process::exit(1);
        }
    }
}

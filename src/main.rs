mod app;
mod backup;
mod cli;
mod config;
mod diff;
mod logger;
mod report;
mod rules;
mod transforms;

use clap::Parser;

fn main() {
    let args = cli::Args::parse();
    logger::init(args.verbose);

    let outcome = match app::run(&args) {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::debug!("linefix failed: {err:?}");
            eprintln!("[ERR] {err}");
            std::process::exit(err.exit_code());
        }
    };

    match report::render(&outcome, args.json, args.diff) {
        Ok(text) => print!("{text}"),
        Err(err) => {
            eprintln!("[ERR] failed to render report: {err}");
            std::process::exit(2);
        }
    }
}

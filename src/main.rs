// Entry point.
//
// Cleans the market-monitoring price data and prepares it for model
// evaluation:
// - Step I turns the subdistrict sheet of the original spreadsheet into a raw
//   SMEB table and an interpolated testing table.
// - Step II turns the imputation team's supercoarse file into the training
//   table.
// Paths can be overridden through the environment (see `Config::from_env`).
mod config;
mod error;
mod extract;
mod interpolate;
mod loader;
mod output;
mod pipeline;
mod pivot;
mod training;
mod types;
mod unique;
mod util;

use std::process::ExitCode;

use config::Config;
use log::error;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env();
    match pipeline::run(&config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

use std::process::ExitCode;

use log::{debug, error};

mod app;

fn run(args: &[String]) -> anyhow::Result<Option<String>> {
    let app = app::build(app::default_settings())?;
    Ok(app.run(args)?)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "warn")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    debug!("arguments: {args:?}");

    match run(&args) {
        Ok(Some(output)) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

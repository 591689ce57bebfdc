use std::process::ExitCode;

use gl_workbench::{app::MainApp, config::Config, logging};

fn main() -> ExitCode {
    let config = Config::load_or_default();
    let level = config
        .as_ref()
        .map_or(log::LevelFilter::Info, |config| config.log_level);
    if let Err(e) = logging::init(level) {
        eprintln!("failed to install logger: {}", e);
    }

    match config.and_then(|config| MainApp::new(config).run()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

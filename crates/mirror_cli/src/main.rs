//! `site-mirror [ROOT...]`: mirror HTML trees into `out/` with their media localized.
use std::path::PathBuf;
use std::process::ExitCode;

use log::LevelFilter;
use mirror_engine::{MirrorConfig, MirrorDriver, MirrorError};
use mirror_logging::{mirror_error, mirror_info};

fn main() -> ExitCode {
    mirror_logging::initialize_terminal(LevelFilter::Info);

    let mut roots: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if roots.is_empty() {
        roots.push(PathBuf::from("."));
    }

    match run(&roots) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            mirror_error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(roots: &[PathBuf]) -> Result<(), MirrorError> {
    let driver = MirrorDriver::new(MirrorConfig::default())?;
    let summary = driver.mirror(roots)?;
    mirror_info!(
        "mirrored {} documents: {} references localized, {} left unchanged",
        summary.documents,
        summary.rewritten,
        summary.failed
    );
    Ok(())
}

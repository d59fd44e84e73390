#![warn(clippy::pedantic)]

mod kinds;
mod settings;
mod shell;

use anyhow::Result as AnyResult;

fn main() -> AnyResult<()> {
    let settings = settings::Settings::load();
    let has_term = std::io::IsTerminal::is_terminal(&std::io::stdin());
    // Log to a terminal, if available. Else, log to "log.out" in the working directory.
    if has_term {
        env_logger::builder()
            .filter_level(settings.log_level)
            .init();
    } else {
        let _ = simple_logging::log_to_file("log.out", settings.log_level);
    }
    if settings.did_fail_to_load() {
        log::warn!("Settings weren't available, defaulting.");
    } else if let Err(e) = settings.save() {
        log::warn!("Failed to save settings:\n{e:?}");
    }

    let registry = kinds::registry()?;
    let mut shell = shell::Shell::new(registry, settings);
    let mut stdout = std::io::stdout().lock();

    // Args are a simple list of scripts to run in order. Without any, commands come from stdin.
    let scripts: Vec<std::path::PathBuf> = std::env::args_os().skip(1).map(Into::into).collect();
    if scripts.is_empty() {
        shell.run(std::io::stdin().lock(), &mut stdout, has_term)?;
        return Ok(());
    }
    for path in &scripts {
        let file = match std::fs::File::open(path) {
            Ok(file) => file,
            Err(e) => {
                log::error!("failed to open script {path:?}: {e:#}");
                continue;
            }
        };
        log::info!("Running {path:?}");
        if shell.run(std::io::BufReader::new(file), &mut stdout, false)? == shell::Flow::Quit {
            break;
        }
    }
    Ok(())
}

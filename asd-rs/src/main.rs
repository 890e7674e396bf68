use std::path::Path;
use std::process::ExitCode;

use asd::cli::{self, ConfigFile, USAGE};
use asd::config::EngineConfig;
use asd::diagnostics::StderrSink;
use asd::script::{Interpreter, RunOutcome};

fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("asd: {e}");
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };
    if args.help {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    asd::init_tracing(args.debug);

    // ── Load user config ──────────────────────────────────────────────────────
    let mut config = match &args.config {
        ConfigFile::Skip => EngineConfig::default(),
        ConfigFile::Explicit(path) => load_config(path),
        ConfigFile::Search => match cli::find_user_config() {
            Some(path) => load_config(&path),
            None => EngineConfig::default(),
        },
    };
    args.apply_overrides(&mut config);

    // ── Run ───────────────────────────────────────────────────────────────────
    let sink = StderrSink { show_tips: config.show_tips };
    let mut interp = Interpreter::new(config, Some(Box::new(sink)));
    tracing::debug!(config = ?interp.config(), "effective config");

    let result = match (&args.code, &args.script) {
        (Some(code), _) => interp.run_script(code),
        (None, Some(path)) => interp.run_file(path),
        (None, None) => {
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(RunOutcome::Completed) | Ok(RunOutcome::Exited) => ExitCode::SUCCESS,
        // Structural errors have already been rendered as diagnostics.
        Err(asd::script::EngineError::Structural(_)) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("asd: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Load a config file, warning about unreadable files and bad lines.
fn load_config(path: &Path) -> EngineConfig {
    match EngineConfig::load_file(path) {
        Ok((config, errors)) => {
            for e in errors {
                eprintln!("asd: warning: {}: {e}", path.display());
            }
            config
        }
        Err(e) => {
            eprintln!("asd: warning: {}: {e}", path.display());
            EngineConfig::default()
        }
    }
}

//! Command-line argument parsing.
//!
//! Usage:
//!   asd [-f[<file>]] [-m<max>] [-s<seed>] [-dT] <script.asd>
//!   asd [-f[<file>]] [-m<max>] [-s<seed>] [-dT] -e<code>

use std::path::PathBuf;

use directories::{BaseDirs, ProjectDirs};

use crate::config::EngineConfig;

pub const USAGE: &str = "Usage: asd [-f[<file>]] [-m<max>] [-s<seed>] [-dT] <script.asd>\n       \
                         asd [-f[<file>]] [-m<max>] [-s<seed>] [-dT] -e<code>";

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Config-file specification.
    pub config: ConfigFile,
    /// WHILE iteration cap override (`-m<max>`).
    pub max_iterations: Option<usize>,
    /// RNG seed override (`-s<seed>`).
    pub seed: Option<u64>,
    /// Script text given inline (`-e<code>`).
    pub code: Option<String>,
    /// Debug logging (`-d`).
    pub debug: bool,
    /// Hide diagnostic tips (`-T`).
    pub no_tips: bool,
    /// Print usage and exit (`-h`).
    pub help: bool,
    /// Script file to run.
    pub script: Option<PathBuf>,
}

/// How to choose the user config file.
#[derive(Debug, Default)]
pub enum ConfigFile {
    /// Search the user config directory, `~/.asdrc`, then `./.asdrc` (default).
    #[default]
    Search,
    /// `-f` with no file argument: skip user config.
    Skip,
    /// `-f<file>`: load this specific file.
    Explicit(PathBuf),
}

impl CliArgs {
    /// Apply command-line overrides on top of a loaded config.
    pub fn apply_overrides(&self, config: &mut EngineConfig) {
        if let Some(max) = self.max_iterations {
            config.max_iterations = max;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if self.no_tips {
            config.show_tips = false;
        }
    }
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(raw.get(1..).unwrap_or_default())
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut positional: Vec<String> = Vec::new();
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        // `--` ends flag processing.
        if arg == "--" {
            i += 1;
            positional.extend(argv[i..].iter().cloned());
            break;
        }

        // Non-flag argument.
        if !arg.starts_with('-') || arg == "-" {
            positional.push(arg.to_owned());
            i += 1;
            continue;
        }

        // Flag argument: iterate over characters after the leading `-`.
        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            match chars[j] {
                'd' => args.debug = true,
                'T' => args.no_tips = true,
                'h' => args.help = true,

                // -f[<file>]
                'f' => {
                    if j + 1 < chars.len() {
                        let file: String = chars[j + 1..].iter().collect();
                        args.config = ConfigFile::Explicit(PathBuf::from(file));
                        j = chars.len();
                    } else {
                        // -f alone → skip user config.  A following word is
                        // the script, not a config file.
                        args.config = ConfigFile::Skip;
                    }
                }

                // -e<code>
                'e' => {
                    let code = take_value(argv, &mut i, &chars, &mut j, 'e')?;
                    args.code = Some(code);
                }

                // -m<max>
                'm' => {
                    let v = take_value(argv, &mut i, &chars, &mut j, 'm')?;
                    let max = v
                        .parse::<usize>()
                        .ok()
                        .filter(|&n| n > 0)
                        .ok_or_else(|| format!("invalid iteration cap: {v}"))?;
                    args.max_iterations = Some(max);
                }

                // -s<seed>
                's' => {
                    let v = take_value(argv, &mut i, &chars, &mut j, 's')?;
                    let seed = v.parse().map_err(|_| format!("invalid seed: {v}"))?;
                    args.seed = Some(seed);
                }

                c => return Err(format!("unknown option: -{c}")),
            }
            j += 1;
        }
        i += 1;
    }

    match positional.len() {
        0 => {}
        1 => args.script = Some(PathBuf::from(positional.remove(0))),
        n => return Err(format!("too many arguments ({n})")),
    }

    if !args.help {
        match (&args.script, &args.code) {
            (None, None) => return Err("no script given".to_owned()),
            (Some(_), Some(_)) => return Err("-e cannot be combined with a script file".to_owned()),
            _ => {}
        }
    }

    Ok(args)
}

/// The value of a flag: the rest of this argument, or the next argument.
fn take_value(
    argv: &[String],
    i: &mut usize,
    chars: &[char],
    j: &mut usize,
    flag: char,
) -> Result<String, String> {
    if *j + 1 < chars.len() {
        let s: String = chars[*j + 1..].iter().collect();
        *j = chars.len();
        Ok(s)
    } else if *i + 1 < argv.len() {
        *i += 1;
        Ok(argv[*i].clone())
    } else {
        Err(format!("-{flag} requires an argument"))
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

/// Search for the user config file in the standard locations.
/// Returns the first path that exists, or `None`.
pub fn find_user_config() -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dirs) = ProjectDirs::from("", "", "asd") {
        candidates.push(dirs.config_dir().join("asdrc"));
    }
    if let Some(base) = BaseDirs::new() {
        candidates.push(base.home_dir().join(".asdrc"));
    }
    candidates.push(PathBuf::from("./.asdrc"));
    candidates.into_iter().find(|p| p.is_file())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|&s| s.to_owned()).collect()
    }

    #[test]
    fn script_positional() {
        let a = parse_argv(&argv(&["hello.asd"])).unwrap();
        assert_eq!(a.script, Some(PathBuf::from("hello.asd")));
        assert!(matches!(a.config, ConfigFile::Search));
        assert!(!a.debug);
    }

    #[test]
    fn no_script_is_error() {
        assert!(parse_argv(&argv(&[])).is_err());
        assert!(parse_argv(&argv(&["-d"])).is_err());
    }

    #[test]
    fn help_needs_no_script() {
        assert!(parse_argv(&argv(&["-h"])).unwrap().help);
    }

    #[test]
    fn bool_flags() {
        let a = parse_argv(&argv(&["-d", "-T", "x.asd"])).unwrap();
        assert!(a.debug);
        assert!(a.no_tips);
    }

    #[test]
    fn combined_bool_flags() {
        let a = parse_argv(&argv(&["-dT", "x.asd"])).unwrap();
        assert!(a.debug && a.no_tips);
    }

    #[test]
    fn numeric_flags_embedded_and_separate() {
        let a = parse_argv(&argv(&["-m50", "-s", "7", "x.asd"])).unwrap();
        assert_eq!(a.max_iterations, Some(50));
        assert_eq!(a.seed, Some(7));
    }

    #[test]
    fn bad_numbers() {
        assert!(parse_argv(&argv(&["-m0", "x.asd"])).is_err());
        assert!(parse_argv(&argv(&["-mlots", "x.asd"])).is_err());
        assert!(parse_argv(&argv(&["-s-1", "x.asd"])).is_err());
        assert!(parse_argv(&argv(&["x.asd", "-m"])).is_err());
    }

    #[test]
    fn config_skip_keeps_script() {
        let a = parse_argv(&argv(&["-f", "x.asd"])).unwrap();
        assert!(matches!(a.config, ConfigFile::Skip));
        assert_eq!(a.script, Some(PathBuf::from("x.asd")));
    }

    #[test]
    fn config_explicit() {
        let a = parse_argv(&argv(&["-fmy.rc", "x.asd"])).unwrap();
        assert!(matches!(&a.config, ConfigFile::Explicit(p) if p == &PathBuf::from("my.rc")));
    }

    #[test]
    fn inline_code() {
        let a = parse_argv(&argv(&["-e", "PRINT hi"])).unwrap();
        assert_eq!(a.code.as_deref(), Some("PRINT hi"));
        assert!(parse_argv(&argv(&["-ePRINT hi", "x.asd"])).is_err());
    }

    #[test]
    fn too_many_positional() {
        assert!(parse_argv(&argv(&["a.asd", "b.asd"])).is_err());
    }

    #[test]
    fn unknown_flag() {
        assert!(parse_argv(&argv(&["-z", "x.asd"])).is_err());
    }

    #[test]
    fn overrides() {
        let a = parse_argv(&argv(&["-m9", "-s3", "-T", "x.asd"])).unwrap();
        let mut c = EngineConfig::default();
        a.apply_overrides(&mut c);
        assert_eq!(c.max_iterations, 9);
        assert_eq!(c.seed, Some(3));
        assert!(!c.show_tips);
        assert!(c.sleep);
    }
}

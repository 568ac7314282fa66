//! Command-line argument parsing.
//!
//! Usage:
//!   scrape <script.ron> [--action NAME] [--set KEY=VALUE]... [--config FILE]
//!          [--debug] [--log-file PATH]

use std::path::PathBuf;

pub const USAGE: &str = "\
usage: scrape <script.ron> [options]

options:
  --action NAME      run only the actions whose name attribute is NAME
  --set KEY=VALUE    seed a global variable (repeatable)
  --config FILE      read run settings from a RON file
  --debug            trace resolution, compilation and replay
  --log-file PATH    also write the log to PATH
  -h, --help         show this text";

/// Parsed command-line arguments.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub script: PathBuf,
    /// Blank runs every action.
    pub action: String,
    pub variables: Vec<(String, String)>,
    pub config: Option<PathBuf>,
    pub debug: bool,
    pub log_file: Option<PathBuf>,
    pub help: bool,
}

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(raw.get(1..).unwrap_or_default())
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut positional: Vec<String> = Vec::new();
    let mut rest = argv.iter();

    while let Some(arg) = rest.next() {
        // `--flag=value` and `--flag value` are both accepted.
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if arg.starts_with("--") => (flag, Some(value.to_owned())),
            _ => (arg.as_str(), None),
        };
        let mut value = |name: &str| -> Result<String, String> {
            inline
                .clone()
                .or_else(|| rest.next().cloned())
                .ok_or_else(|| format!("{name} requires an argument"))
        };

        match flag {
            "-h" | "--help" => args.help = true,
            "--debug" => args.debug = true,
            "--action" => args.action = value("--action")?,
            "--config" => args.config = Some(PathBuf::from(value("--config")?)),
            "--log-file" => args.log_file = Some(PathBuf::from(value("--log-file")?)),
            "--set" => {
                let pair = value("--set")?;
                let (key, val) = pair
                    .split_once('=')
                    .ok_or_else(|| format!("--set expects KEY=VALUE, got {pair:?}"))?;
                if key.trim().is_empty() {
                    return Err(format!("--set has an empty key: {pair:?}"));
                }
                args.variables.push((key.trim().to_owned(), val.to_owned()));
            }
            "--" => {
                positional.extend(rest.by_ref().cloned());
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(format!("unknown option: {other}"));
            }
            _ => positional.push(arg.clone()),
        }
    }

    if args.help {
        return Ok(args);
    }

    match positional.len() {
        0 => return Err("missing script file".to_owned()),
        1 => args.script = PathBuf::from(positional.remove(0)),
        n => return Err(format!("too many arguments ({n})")),
    }

    Ok(args)
}

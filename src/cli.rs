use std::{env, path::PathBuf};

use anyhow::{Result, anyhow};

const USAGE: &str = "usage: conjointd [config-path]";

pub fn config_path_from_args() -> Result<PathBuf> {
    config_path_from(env::args().skip(1))
}

/// Accepts the config path either bare (`conjointd ./conjointd.jsonc`) or
/// behind `--config`; at most one may be given.
fn config_path_from(args: impl IntoIterator<Item = String>) -> Result<PathBuf> {
    let mut args = args.into_iter();
    let mut config_path: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        let value = match arg.as_str() {
            "--config" => args
                .next()
                .ok_or_else(|| anyhow!("missing value for --config. {USAGE}"))?,
            flag if flag.starts_with('-') => {
                return Err(anyhow!("unknown argument: {flag}. {USAGE}"));
            }
            _ => arg,
        };
        if config_path.is_some() {
            return Err(anyhow!("config path given more than once. {USAGE}"));
        }
        config_path = Some(PathBuf::from(value));
    }

    Ok(config_path.unwrap_or_else(|| PathBuf::from("./conjointd.jsonc")))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::config_path_from;

    fn parse(args: &[&str]) -> anyhow::Result<PathBuf> {
        config_path_from(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn no_arguments_fall_back_to_the_default_path() {
        let path = parse(&[]).expect("empty argv should parse");
        assert_eq!(path, PathBuf::from("./conjointd.jsonc"));
    }

    #[test]
    fn bare_positional_path_is_accepted() {
        let path = parse(&["/etc/conjointd.jsonc"]).expect("positional path should parse");
        assert_eq!(path, PathBuf::from("/etc/conjointd.jsonc"));
    }

    #[test]
    fn config_flag_still_works() {
        let path = parse(&["--config", "custom.jsonc"]).expect("flag form should parse");
        assert_eq!(path, PathBuf::from("custom.jsonc"));
    }

    #[test]
    fn duplicate_paths_and_unknown_flags_are_rejected() {
        assert!(parse(&["a.jsonc", "b.jsonc"]).is_err());
        assert!(parse(&["--config", "a.jsonc", "b.jsonc"]).is_err());
        assert!(parse(&["--config"]).is_err());
        assert!(parse(&["--verbose"]).is_err());
    }
}

//! Persistent feeder defaults in `~/.sonde-decode/config.yaml`.
//!
//! Holds the M10 family to force (or `auto`), the GPS leap second count used
//! for Trimble time conversion, the output format and the dump toggle. CLI
//! flags override whatever is loaded here.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, warn};

use crate::family::SondeFamily;
use crate::fields::DEFAULT_LEAP_SECONDS;
use crate::types::SondeError;

/// Full configuration structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub decoder: DecoderConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecoderConfig {
    /// Fixed family, or `None` to detect per frame.
    pub family: Option<SondeFamily>,
    pub leap_seconds: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub dump: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = SondeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(SondeError::Config(format!("unknown output format: {other}"))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            decoder: DecoderConfig {
                family: None,
                leap_seconds: DEFAULT_LEAP_SECONDS,
            },
            output: OutputConfig {
                format: OutputFormat::Text,
                dump: false,
            },
        }
    }
}

/// Get the config directory path (`~/.sonde-decode/`).
pub fn config_dir() -> PathBuf {
    dirs_home().join(".sonde-decode")
}

/// Get the config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.yaml")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Load config from `~/.sonde-decode/config.yaml`.
///
/// Returns default config if the file doesn't exist or can't be read.
pub fn load_config() -> Config {
    load_config_from(&config_file())
}

pub fn load_config_from(path: &Path) -> Config {
    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(text) => parse_config(&text),
        Err(e) => {
            warn!(path = %path.display(), "cannot read config: {e}");
            Config::default()
        }
    }
}

/// Save config to `~/.sonde-decode/config.yaml`.
pub fn save_config(config: &Config) -> Result<PathBuf, SondeError> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir).map_err(|e| SondeError::Config(e.to_string()))?;

    let path = config_file();
    save_config_to(config, &path)?;
    Ok(path)
}

pub fn save_config_to(config: &Config, path: &Path) -> Result<(), SondeError> {
    std::fs::write(path, serialize_config(config)).map_err(|e| SondeError::Config(e.to_string()))
}

/// Parse simple YAML-like config text. Unknown keys are ignored; bad values
/// keep the default and log a warning.
pub fn parse_config(text: &str) -> Config {
    let mut config = Config::default();
    let mut current_section: Option<String> = None;

    for line in text.lines() {
        let line = strip_comment(line);
        let stripped = line.trim();
        if stripped.is_empty() {
            continue;
        }

        let is_indented = line.starts_with("  ") || line.starts_with('\t');

        let Some((key, val)) = stripped.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let val = val.trim();

        if !is_indented {
            current_section = val.is_empty().then(|| key.to_string());
            continue;
        }
        let Some(section) = current_section.as_deref() else {
            continue;
        };

        match (section, key) {
            ("decoder", "family") => match parse_string_value(val).as_deref() {
                None | Some("auto") => config.decoder.family = None,
                Some(name) => match name.parse() {
                    Ok(family) => config.decoder.family = Some(family),
                    Err(e) => warn!("config decoder.family: {e}"),
                },
            },
            ("decoder", "leap_seconds") => match val.parse::<i64>() {
                Ok(v) => config.decoder.leap_seconds = v,
                Err(_) => warn!("config decoder.leap_seconds: not an integer: {val}"),
            },
            ("output", "format") => {
                match parse_string_value(val).map(|v| v.parse::<OutputFormat>()) {
                    Some(Ok(format)) => config.output.format = format,
                    Some(Err(e)) => warn!("config output.format: {e}"),
                    None => {}
                }
            }
            ("output", "dump") => match val {
                "true" | "yes" => config.output.dump = true,
                "false" | "no" => config.output.dump = false,
                _ => warn!("config output.dump: not a boolean: {val}"),
            },
            _ => debug!(section, key, "ignoring unknown config key"),
        }
    }

    config
}

/// Drop a `#` comment that is not inside quotes.
fn strip_comment(line: &str) -> &str {
    let mut in_quotes = None;
    for (i, c) in line.char_indices() {
        match (c, in_quotes) {
            ('"' | '\'', None) => in_quotes = Some(c),
            (c, Some(q)) if c == q => in_quotes = None,
            ('#', None) => return &line[..i],
            _ => {}
        }
    }
    line
}

fn parse_string_value(val: &str) -> Option<String> {
    if val == "null" || val == "~" || val.is_empty() {
        return None;
    }
    // Strip quotes
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        return Some(val[1..val.len() - 1].to_string());
    }
    Some(val.to_string())
}

/// Serialize config to YAML-like text.
pub fn serialize_config(config: &Config) -> String {
    let mut lines = vec!["# sonde-decode configuration".to_string(), String::new()];

    lines.push("decoder:".into());
    let family = config.decoder.family.map_or("auto", SondeFamily::name);
    lines.push(format!("  family: \"{family}\"        # auto | m10-gtop | m10-trimble"));
    lines.push(format!("  leap_seconds: {}", config.decoder.leap_seconds));
    lines.push(String::new());

    lines.push("output:".into());
    lines.push(format!("  format: \"{}\"        # text | json", config.output.format));
    lines.push(format!("  dump: {}", config.output.dump));

    lines.join("\n") + "\n"
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

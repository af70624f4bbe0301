//! Flag defaults stored in rc files.
//!
//! A global file and a local `.inkframerc` hold command-line tokens, one or
//! more per line. They are merged with the actual command line, later sources
//! winning for valued options.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

pub const LOCAL_CONFIG_FILE: &str = ".inkframerc";

/// Debounce applied to file edits in watch mode when none is configured.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub watch: bool,
    pub embed: bool,
    pub service_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub debounce_ms: Option<u64>,
    pub log_file: Option<PathBuf>,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            watch: self.watch || other.watch,
            embed: self.embed || other.embed,
            service_url: other.service_url.clone().or_else(|| self.service_url.clone()),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
            debounce_ms: other.debounce_ms.or(self.debounce_ms),
            log_file: other.log_file.clone().or_else(|| self.log_file.clone()),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn debounce(&self) -> Duration {
        self.debounce_ms.map_or(DEFAULT_DEBOUNCE, Duration::from_millis)
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("inkframe").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("inkframe")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("inkframe").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join("inkframe").join("config");
        }
    }

    PathBuf::from(LOCAL_CONFIG_FILE)
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(LOCAL_CONFIG_FILE)
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# inkframe defaults (saved with --save)".to_string()];
    if flags.watch {
        lines.push("--watch".to_string());
    }
    if flags.embed {
        lines.push("--embed".to_string());
    }
    if let Some(url) = &flags.service_url {
        lines.push(format!("--service-url {url}"));
    }
    if let Some(secs) = flags.timeout_secs {
        lines.push(format!("--timeout-secs {secs}"));
    }
    if let Some(ms) = flags.debounce_ms {
        lines.push(format!("--debounce-ms {ms}"));
    }
    if let Some(path) = &flags.log_file {
        lines.push(format!("--log-file {}", path.display()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Extract known flags from a token list, skipping anything else.
///
/// Accepts both `--flag value` and `--flag=value`. Unparsable numbers are
/// ignored rather than rejected; clap validates the real command line.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline_value) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value)),
            _ => (token, None),
        };
        let mut value = || {
            inline_value.map(ToOwned::to_owned).or_else(|| {
                let next = tokens.get(i + 1).cloned();
                if next.is_some() {
                    i += 1;
                }
                next
            })
        };
        match name {
            "--watch" | "-w" => flags.watch = true,
            "--embed" => flags.embed = true,
            "--service-url" => flags.service_url = value(),
            "--timeout-secs" => flags.timeout_secs = value().and_then(|v| v.parse().ok()),
            "--debounce-ms" => flags.debounce_ms = value().and_then(|v| v.parse().ok()),
            "--log-file" => flags.log_file = value().map(PathBuf::from),
            _ => {}
        }
        i += 1;
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let flags = parse_flag_tokens(&args(&[
            "inkframe",
            "--watch",
            "--embed",
            "--service-url",
            "http://localhost:3000/svg/",
            "--timeout-secs=15",
            "--debounce-ms",
            "250",
            "--log-file=render.log",
            "flow.mmd",
        ]));
        assert!(flags.watch);
        assert!(flags.embed);
        assert_eq!(flags.service_url.as_deref(), Some("http://localhost:3000/svg/"));
        assert_eq!(flags.timeout_secs, Some(15));
        assert_eq!(flags.debounce_ms, Some(250));
        assert_eq!(flags.log_file, Some(PathBuf::from("render.log")));
    }

    #[test]
    fn test_parse_flag_tokens_accepts_short_watch() {
        let flags = parse_flag_tokens(&args(&["inkframe", "-w", "flow.mmd"]));
        assert!(flags.watch);
        assert!(!flags.embed);
    }

    #[test]
    fn test_parse_flag_tokens_ignores_bad_numbers() {
        let flags = parse_flag_tokens(&args(&["--timeout-secs", "soon", "--watch"]));
        assert_eq!(flags.timeout_secs, None);
        assert!(flags.watch);
    }

    #[test]
    fn test_trailing_flag_without_value() {
        let flags = parse_flag_tokens(&args(&["--service-url"]));
        assert_eq!(flags.service_url, None);
    }

    #[test]
    fn test_service_url_with_query_keeps_equals() {
        let flags = parse_flag_tokens(&args(&["--service-url=http://h/svg?theme=dark"]));
        assert_eq!(flags.service_url.as_deref(), Some("http://h/svg?theme=dark"));
    }

    #[test]
    fn test_durations_fall_back_to_defaults() {
        let flags = ConfigFlags::default();
        assert_eq!(flags.timeout(), None);
        assert_eq!(flags.debounce(), DEFAULT_DEBOUNCE);

        let flags = ConfigFlags {
            timeout_secs: Some(2),
            debounce_ms: Some(40),
            ..ConfigFlags::default()
        };
        assert_eq!(flags.timeout(), Some(Duration::from_secs(2)));
        assert_eq!(flags.debounce(), Duration::from_millis(40));
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config");
        let flags = ConfigFlags {
            watch: true,
            embed: true,
            service_url: Some("https://kroki.example/svg/".to_string()),
            timeout_secs: Some(30),
            debounce_ms: Some(300),
            log_file: Some(PathBuf::from("inkframe.log")),
        };

        save_config_flags(&path, &flags).unwrap();
        let loaded = load_config_flags(&path).unwrap();
        assert_eq!(loaded, flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
    }
}

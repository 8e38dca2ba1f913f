use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;
use cross_xdg::BaseDirs;

/// Wall-clock timeout used when nothing else sets one.
pub const DEFAULT_TIMEOUT_MS: u64 = 2_000;

/// Settings read from the `[run]` section of `bf.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    pub timeout_ms: Option<u64>,
    pub max_steps: Option<u64>,
}

/// Effective execution limits after resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub timeout_ms: u64,
    pub max_steps: Option<u64>,
}

static RUN_CONFIG: OnceLock<RunConfig> = OnceLock::new();

pub fn run_config() -> &'static RunConfig {
    RUN_CONFIG.get_or_init(|| load_from_toml().unwrap_or_default())
}

/// Resolve limits: flags -> env (`BF_TIMEOUT_MS`, `BF_MAX_STEPS`) -> config file -> defaults.
pub fn resolve_limits(timeout_ms: Option<u64>, max_steps: Option<u64>) -> Limits {
    let file = run_config();
    Limits {
        timeout_ms: timeout_ms
            .or_else(|| env_u64("BF_TIMEOUT_MS"))
            .or(file.timeout_ms)
            .unwrap_or(DEFAULT_TIMEOUT_MS),
        max_steps: max_steps
            .or_else(|| env_u64("BF_MAX_STEPS"))
            .or(file.max_steps),
    }
}

fn env_u64(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|s| s.trim().parse::<u64>().ok())
}

fn config_path() -> Option<PathBuf> {
    // Explicit override, mainly for tests and scripted use
    if let Some(path) = env::var_os("BF_CONFIG") {
        return Some(PathBuf::from(path));
    }

    // On Linux: resolves to /home/<user>/.config
    // On Windows: resolves to C:\Users\<user>\.config
    // On macOS: resolves to /Users/<user>/.config
    let base_dirs = BaseDirs::new().ok()?;
    let mut path = PathBuf::from(base_dirs.config_home());
    path.push("bf.toml");
    Some(path)
}

fn load_from_toml() -> Option<RunConfig> {
    let content = fs::read_to_string(config_path()?).ok()?;
    Some(parse_run_section(&content))
}

/// Very small hand-rolled parser: look for the [run] section and key = value pairs.
/// Unknown keys and unparsable values are ignored.
pub fn parse_run_section(content: &str) -> RunConfig {
    let mut in_run = false;
    let mut map: HashMap<String, String> = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') { continue; }
        if line.starts_with('[') && line.ends_with(']') {
            in_run = line[1..line.len() - 1].trim() == "run";
            continue;
        }
        if !in_run { continue; }
        if let Some((key, val_raw)) = line.split_once('=') {
            let val_raw = val_raw.trim();
            // Accept quoted or unquoted, and TOML's `_` digit separators
            let val = val_raw.trim_matches('"').replace('_', "");
            map.insert(key.trim().to_string(), val);
        }
    }

    let get = |key: &str| map.get(key).and_then(|v| v.parse::<u64>().ok());
    RunConfig {
        timeout_ms: get("timeout_ms"),
        max_steps: get("max_steps"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_section_only() {
        let cfg = parse_run_section(
            "# limits\n[colors]\ntimeout_ms = 1\n\n[run]\ntimeout_ms = 5_000\nmax_steps = \"100\"\n",
        );
        assert_eq!(cfg, RunConfig { timeout_ms: Some(5_000), max_steps: Some(100) });
    }

    #[test]
    fn ignores_garbage_values() {
        let cfg = parse_run_section("[run]\ntimeout_ms = soon\nmax_steps\n");
        assert_eq!(cfg, RunConfig::default());
    }

    #[test]
    fn flags_win_over_everything() {
        let limits = resolve_limits(Some(7), Some(9));
        assert_eq!(limits, Limits { timeout_ms: 7, max_steps: Some(9) });
    }
}

use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::JeevesConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["jeeves.toml", "jeeves.yaml", "jeeves.yml", "jeeves.json"];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<JeevesConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `explicit` when given (errors are returned, not swallowed)
/// 2. `./jeeves.{toml,yaml,yml,json}` (project-local)
/// 3. `~/.config/jeeves/jeeves.{toml,yaml,yml,json}` (user-global)
///
/// Returns `JeevesConfig::default()` if no config file is found. Env
/// overrides are applied in every case.
pub fn discover_and_load(explicit: Option<&Path>) -> anyhow::Result<JeevesConfig> {
    let mut config = if let Some(path) = explicit {
        debug!(path = %path.display(), "loading explicit config");
        load_config(path)?
    } else if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                JeevesConfig::default()
            },
        }
    } else {
        debug!("no config file found, using defaults");
        JeevesConfig::default()
    };
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

/// Apply `JEEVES_*` environment overrides on top of a loaded config.
pub fn apply_env_overrides(config: &mut JeevesConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(fkey) = lookup("JEEVES_FKEY").filter(|v| !v.is_empty()) {
        config.chat.fkey = Some(Secret::new(fkey));
    }
    if let Some(hostname) = lookup("JEEVES_HOSTNAME").filter(|v| !v.is_empty()) {
        config.chat.hostname = hostname;
    }
    if let Some(prefix) = lookup("JEEVES_COMMAND_PREFIX").filter(|v| !v.is_empty()) {
        config.commands.prefix = prefix;
    }
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    // User-global: ~/.config/jeeves/
    if let Some(config_dir) = config_dir() {
        for name in CONFIG_FILENAMES {
            let p = config_dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }

    None
}

/// Returns the user-global config directory (`~/.config/jeeves/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "jeeves").map(|d| d.config_dir().to_path_buf())
}

/// Returns the data directory used for diagnostic files, falling back to
/// `./data` when no home directory can be resolved.
pub fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "jeeves")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("data"))
}

impl JeevesConfig {
    /// Resolved location of the append-only exception log.
    #[must_use]
    pub fn exceptions_log_path(&self) -> PathBuf {
        self.diagnostics
            .exceptions_log
            .clone()
            .unwrap_or_else(|| data_dir().join("exceptions.txt"))
    }
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<JeevesConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, secrecy::ExposeSecret, std::io::Write};

    fn write_config(name: &str, body: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn loads_toml() {
        let (_dir, path) = write_config(
            "jeeves.toml",
            "[chat]\nhostname = \"chat.example.com\"\nrooms = [1]\n",
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.chat.hostname, "chat.example.com");
        assert_eq!(cfg.chat.rooms, vec![1]);
    }

    #[test]
    fn loads_yaml() {
        let (_dir, path) = write_config(
            "jeeves.yaml",
            "chat:\n  hostname: chat.example.com\n  secure: false\ncommands:\n  prefix: \"!\"\n",
        );
        let cfg = load_config(&path).unwrap();
        assert!(!cfg.chat.secure);
        assert_eq!(cfg.commands.prefix, "!");
    }

    #[test]
    fn loads_json() {
        let (_dir, path) = write_config("jeeves.json", r#"{"client":{"max_attempts":2}}"#);
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.client.max_attempts, 2);
    }

    #[test]
    fn rejects_unknown_extension() {
        let (_dir, path) = write_config("jeeves.ini", "hostname=x");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(discover_and_load(Some(&missing)).is_err());
    }

    #[test]
    fn env_overrides_replace_values() {
        let mut cfg = JeevesConfig::default();
        apply_env_overrides(&mut cfg, |name| match name {
            "JEEVES_FKEY" => Some("from-env".into()),
            "JEEVES_HOSTNAME" => Some("chat.meta.stackexchange.com".into()),
            "JEEVES_COMMAND_PREFIX" => Some(String::new()),
            _ => None,
        });
        assert_eq!(cfg.chat.fkey.unwrap().expose_secret(), "from-env");
        assert_eq!(cfg.chat.hostname, "chat.meta.stackexchange.com");
        // empty values are ignored
        assert_eq!(cfg.commands.prefix, "!!");
    }

    #[test]
    fn explicit_exceptions_log_wins() {
        let mut cfg = JeevesConfig::default();
        cfg.diagnostics.exceptions_log = Some(PathBuf::from("/tmp/jeeves-exceptions.txt"));
        assert_eq!(
            cfg.exceptions_log_path(),
            PathBuf::from("/tmp/jeeves-exceptions.txt")
        );
    }
}

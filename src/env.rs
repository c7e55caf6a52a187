//! `.env.dev` loading for local development.
//!
//! Production deployments supply configuration through real environment
//! variables, so a missing file is the expected case and is skipped silently.

use std::path::{Path, PathBuf};

const ENV_FILE: &str = ".env.dev";

/// Load `.env.dev` into the process environment if it exists.
///
/// The file is looked up next to the running executable first, then in the
/// current working directory. The first match wins. Returns the path that was
/// loaded, if any.
///
/// Must be called before anything reads the environment (see `main`).
pub fn load_env_file() -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            candidates.push(dir.join(ENV_FILE));
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join(ENV_FILE));
    }

    for path in candidates {
        if let Some(loaded) = load_env_from(&path) {
            return Some(loaded);
        }
    }

    tracing::debug!("No {ENV_FILE} found, relying on process environment");
    None
}

/// Load a specific env file if it exists. Returns the path on success,
/// `None` if the file is absent. Parse failures are logged and skipped
/// rather than aborting start-up.
pub fn load_env_from(path: &Path) -> Option<PathBuf> {
    if !path.exists() {
        return None;
    }
    match dotenv::from_path(path) {
        Ok(()) => {
            tracing::debug!("Loaded environment from {}", path.display());
            Some(path.to_path_buf())
        }
        Err(e) => {
            tracing::warn!("Failed to load {}: {e}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_env_from_sets_declared_keys() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".env.dev");
        std::fs::write(&path, "SRE_AGENT_TEST_KEY_A=alpha\nSRE_AGENT_TEST_KEY_B=beta\n")
            .unwrap();

        let loaded = load_env_from(&path);

        assert_eq!(loaded.as_deref(), Some(path.as_path()));
        assert_eq!(std::env::var("SRE_AGENT_TEST_KEY_A").unwrap(), "alpha");
        assert_eq!(std::env::var("SRE_AGENT_TEST_KEY_B").unwrap(), "beta");
    }

    #[test]
    fn load_env_from_missing_file_is_not_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".env.dev");

        assert!(load_env_from(&path).is_none());
    }
}

//! Discovery of the `.folio/` directory.
//!
//! The `.folio/` directory holds a project's `config.yaml` and, unless the
//! configuration points elsewhere, its store (`bundles/`, `worksheets/`).

use std::path::{Path, PathBuf};

/// The name of the folio metadata directory.
pub const FOLIO_DIR_NAME: &str = ".folio";

/// The environment variable that overrides discovery.
pub const FOLIO_DIR_ENV: &str = "FOLIO_DIR";

/// Walk up the directory tree from `start` looking for a `.folio/` directory.
///
/// The `FOLIO_DIR` environment variable, if it names an existing directory,
/// takes precedence over the search.
///
/// ```no_run
/// use folio_config::folio_dir::find_folio_dir;
/// use std::path::Path;
///
/// if let Some(dir) = find_folio_dir(Path::new(".")) {
///     println!("Found folio dir at {}", dir.display());
/// }
/// ```
pub fn find_folio_dir(start: &Path) -> Option<PathBuf> {
    if let Ok(env_dir) = std::env::var(FOLIO_DIR_ENV) {
        let env_path = PathBuf::from(&env_dir);
        if env_path.is_dir() {
            return Some(env_path);
        }
    }
    find_folio_dir_from(start)
}

/// Like [`find_folio_dir`], ignoring the environment.
pub fn find_folio_dir_from(start: &Path) -> Option<PathBuf> {
    let start = start.canonicalize().ok()?;
    start
        .ancestors()
        .map(|dir| dir.join(FOLIO_DIR_NAME))
        .find(|candidate| candidate.is_dir())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn finds_dir_in_start() {
        let dir = tempfile::tempdir().unwrap();
        let folio = dir.path().join(".folio");
        std::fs::create_dir(&folio).unwrap();

        let found = find_folio_dir_from(dir.path()).unwrap();
        assert_eq!(found.canonicalize().unwrap(), folio.canonicalize().unwrap());
    }

    #[test]
    fn finds_dir_from_child() {
        let dir = tempfile::tempdir().unwrap();
        let folio = dir.path().join(".folio");
        std::fs::create_dir(&folio).unwrap();
        let child = dir.path().join("runs").join("deep");
        std::fs::create_dir_all(&child).unwrap();

        let found = find_folio_dir_from(&child).unwrap();
        assert_eq!(found.canonicalize().unwrap(), folio.canonicalize().unwrap());
    }

    #[test]
    fn missing_start_is_none() {
        assert_eq!(find_folio_dir_from(Path::new("/nonexistent/folio/start")), None);
    }
}

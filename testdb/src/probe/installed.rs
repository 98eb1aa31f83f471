//! Executable discovery on the search path.

use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Names of the PostgreSQL executables testdb drives.
///
/// # Examples
///
/// ```
/// use testdb::probe::Binaries;
///
/// let binaries = Binaries::default();
/// assert_eq!(binaries.server, "postgres");
/// assert_eq!(binaries.required().len(), 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binaries {
    /// Server daemon.
    pub server: String,
    /// Data directory initializer.
    pub initializer: String,
    /// Database creator.
    pub creator: String,
    /// Database dropper.
    pub dropper: String,
    /// Interactive client shell, used in list mode.
    pub client: String,
    /// User creator. Not part of the required set.
    pub user_creator: String,
}

impl Default for Binaries {
    fn default() -> Self {
        Self {
            server: "postgres".to_string(),
            initializer: "initdb".to_string(),
            creator: "createdb".to_string(),
            dropper: "dropdb".to_string(),
            client: "psql".to_string(),
            user_creator: "createuser".to_string(),
        }
    }
}

impl Binaries {
    /// The executables that must be present for provisioning to work.
    #[must_use]
    pub fn required(&self) -> [&str; 5] {
        [
            &self.server,
            &self.initializer,
            &self.creator,
            &self.dropper,
            &self.client,
        ]
    }

    /// Process name of the server: the last path component of `server`.
    ///
    /// ```
    /// use testdb::probe::Binaries;
    ///
    /// let binaries = Binaries {
    ///     server: "/usr/lib/postgresql/16/bin/postgres".to_string(),
    ///     ..Binaries::default()
    /// };
    /// assert_eq!(binaries.server_process_name(), "postgres");
    /// ```
    #[must_use]
    pub fn server_process_name(&self) -> &str {
        Path::new(&self.server)
            .file_name()
            .and_then(OsStr::to_str)
            .unwrap_or(&self.server)
    }
}

/// The outcome of an installation check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstalledSet {
    missing: Vec<String>,
}

impl InstalledSet {
    /// Build a result from the names that were not found.
    #[must_use]
    pub fn from_missing(missing: Vec<String>) -> Self {
        Self { missing }
    }

    /// Executables that were not found, in lookup order.
    #[must_use]
    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    /// `true` iff nothing is missing.
    #[must_use]
    pub fn all_present(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Check which of `names` are absent from the search path.
///
/// Never fails: absence is reported in the result.
///
/// # Examples
///
/// ```
/// use testdb::probe::check_names_installed;
///
/// let result = check_names_installed(&["testdb-no-such-tool"]);
/// assert!(!result.all_present());
/// assert_eq!(result.missing(), ["testdb-no-such-tool"]);
/// ```
#[must_use]
pub fn check_names_installed(names: &[&str]) -> InstalledSet {
    let missing = names
        .iter()
        .filter(|name| find_executable(name).is_none())
        .map(|name| (*name).to_string())
        .collect();
    InstalledSet::from_missing(missing)
}

/// Check that every required PostgreSQL executable is installed.
#[must_use]
pub fn check_installed(binaries: &Binaries) -> InstalledSet {
    check_names_installed(&binaries.required())
}

/// Locate an executable by name.
///
/// Names containing a path separator are checked as given; bare names are
/// looked up in each `PATH` entry in order.
#[must_use]
pub fn find_executable(name: &str) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }

    let direct = Path::new(name);
    if direct.components().count() > 1 {
        return is_executable(direct).then(|| direct.to_path_buf());
    }

    let search_path = env::var_os("PATH")?;
    find_in(&search_path, name)
}

fn find_in(search_path: &OsStr, name: &str) -> Option<PathBuf> {
    env::split_paths(search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[cfg(unix)]
    fn write_script(dir: &Path, name: &str, mode: u32) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    #[test]
    fn test_installed_set_all_present_iff_empty() {
        assert!(InstalledSet::default().all_present());
        let set = InstalledSet::from_missing(vec!["psql".to_string()]);
        assert!(!set.all_present());
        assert_eq!(set.missing(), ["psql"]);
    }

    #[test]
    fn test_required_binaries_exclude_user_creator() {
        let binaries = Binaries::default();
        assert_eq!(
            binaries.required(),
            ["postgres", "initdb", "createdb", "dropdb", "psql"]
        );
    }

    #[test]
    fn test_missing_names_keep_lookup_order() {
        let result = check_names_installed(&["testdb-missing-b", "testdb-missing-a"]);
        assert_eq!(result.missing(), ["testdb-missing-b", "testdb-missing-a"]);
    }

    #[test]
    fn test_empty_name_is_never_found() {
        assert!(find_executable("").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_find_in_search_path() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let expected = write_script(second.path(), "initdb", 0o755);

        let search = env::join_paths([first.path(), second.path()]).unwrap();
        assert_eq!(find_in(&search, "initdb"), Some(expected));
        assert_eq!(find_in(&search, "createdb"), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_executable_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        write_script(dir.path(), "psql", 0o644);

        let search = env::join_paths([dir.path()]).unwrap();
        assert_eq!(find_in(&search, "psql"), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_explicit_path_is_checked_directly() {
        let dir = TempDir::new().unwrap();
        let script = write_script(dir.path(), "postgres", 0o755);

        let name = script.to_str().unwrap();
        assert_eq!(find_executable(name), Some(script.clone()));
        assert!(find_executable(dir.path().join("nope").to_str().unwrap()).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_is_not_executable() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("postgres")).unwrap();

        let search = env::join_paths([dir.path()]).unwrap();
        assert_eq!(find_in(&search, "postgres"), None);
    }
}

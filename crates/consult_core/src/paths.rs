use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Consult configuration directory (~/.consult)
pub fn consult_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
        .join(".consult")
}

/// Path of the user-level config.toml
pub fn config_toml_path() -> PathBuf {
    consult_dir().join("config.toml")
}

/// Default location of the persisted bearer credential
pub fn credential_path() -> PathBuf {
    consult_dir().join("credential")
}

/// Default location of the persisted session cookies
pub fn cookie_path() -> PathBuf {
    consult_dir().join("cookies.json")
}

/// Writes `contents` to `path`, readable by the owner only.
///
/// On unix the file is created with mode 0600 and an existing file is
/// narrowed to 0600 before anything is written to it.
pub fn write_private_file(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents)?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_live_under_consult_dir() {
        let dir = consult_dir();
        assert!(dir.ends_with(".consult"));
        assert_eq!(config_toml_path().parent(), Some(dir.as_path()));
        assert_eq!(credential_path().parent(), Some(dir.as_path()));
        assert_eq!(cookie_path().parent(), Some(dir.as_path()));
    }

    #[test]
    fn private_file_replaces_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("secret");

        write_private_file(&path, b"first value").expect("first write");
        write_private_file(&path, b"second").expect("second write");
        assert_eq!(fs::read_to_string(&path).expect("read"), "second");
    }

    #[cfg(unix)]
    #[test]
    fn private_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("secret");

        write_private_file(&path, b"token").expect("create");
        let mode = fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).expect("widen");
        write_private_file(&path, b"token").expect("rewrite");
        let mode = fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

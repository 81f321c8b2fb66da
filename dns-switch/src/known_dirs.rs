//! Where we look for our config file
//!
//! On Linux it uses `dirs` which is a convenience wrapper for getting XDG environment vars
//!
//! On Windows it uses `known_folders` which calls into Windows for forwards-compatibility

#[cfg(any(target_os = "linux", target_os = "windows"))]
use crate::BUNDLE_ID;
use std::path::PathBuf;

/// e.g. `/home/alice/.config/dns-switch/config.toml`
#[cfg(target_os = "linux")]
pub fn config_file() -> Option<PathBuf> {
    Some(
        dirs::config_local_dir()?
            .join(BUNDLE_ID)
            .join("config.toml"),
    )
}

/// e.g. `C:\Users\Alice\AppData\Local\dns-switch\config\config.toml`
///
/// Per-user and doesn't roam across different PCs in the same domain.
#[cfg(target_os = "windows")]
pub fn config_file() -> Option<PathBuf> {
    use known_folders::{KnownFolder, get_known_folder_path};

    Some(
        get_known_folder_path(KnownFolder::LocalAppData)?
            .join(BUNDLE_ID)
            .join("config")
            .join("config.toml"),
    )
}

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
pub fn config_file() -> Option<PathBuf> {
    None
}

#[cfg(test)]
mod tests {
    #[cfg(any(target_os = "linux", target_os = "windows"))]
    #[test]
    fn config_file_is_in_our_subdir() {
        let Some(path) = super::config_file() else {
            // No home dir, e.g. in a minimal container
            return;
        };

        assert!(path.ends_with("config.toml"));
        assert!(path.components().any(|c| c.as_os_str() == super::BUNDLE_ID));
    }
}

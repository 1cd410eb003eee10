use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMode {
    Copy,
    /// Link the bundle so edits show up without reinstalling.
    Symlink,
}

/// Where the Stream Deck application loads plugins from on this machine.
pub fn plugins_dir() -> Result<PathBuf, ToolError> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir().map(|home| {
            home.join("Library")
                .join("Application Support")
                .join("com.elgato.StreamDeck")
        })
    } else if cfg!(target_os = "windows") {
        // Roaming app data, i.e. %APPDATA%
        dirs::config_dir().map(|appdata| appdata.join("Elgato").join("StreamDeck"))
    } else {
        return Err(ToolError::UnsupportedPlatform(std::env::consts::OS));
    };

    base.map(|dir| dir.join("Plugins"))
        .ok_or(ToolError::UnsupportedPlatform(std::env::consts::OS))
}

/// Install `bundle` into `plugins_dir`, replacing any previous install.
pub fn install(bundle: &Path, plugins_dir: &Path, mode: InstallMode) -> Result<PathBuf, ToolError> {
    info!("source: {}", bundle.display());
    if !plugins_dir.is_dir() {
        return Err(ToolError::PluginsDirMissing(plugins_dir.to_path_buf()));
    }

    let bundle = bundle
        .canonicalize()
        .map_err(ToolError::io("resolve", bundle))?;
    let Some(bundle_name) = bundle.file_name() else {
        return Err(ToolError::Io {
            action: "name",
            path: bundle.clone(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "bundle path has no file name"),
        });
    };
    let dest = plugins_dir.join(bundle_name);
    info!("destination: {}", dest.display());

    if remove_existing(&dest)? {
        info!("removed existing plugin");
    }

    match mode {
        InstallMode::Symlink => {
            symlink_dir(&bundle, &dest).map_err(ToolError::io("symlink", &dest))?;
            info!("symlink created; changes to the source show up immediately");
        }
        InstallMode::Copy => {
            let files = copy_recursive(&bundle, &dest)?;
            info!("copied {files} plugin files");
        }
    }

    info!("installation complete; restart Stream Deck to load the plugin");
    Ok(dest)
}

/// Returns whether anything was removed. Symlinks are unlinked, never followed.
fn remove_existing(dest: &Path) -> Result<bool, ToolError> {
    let meta = match fs::symlink_metadata(dest) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(ToolError::io("inspect", dest)(e)),
    };

    let result = if meta.file_type().is_symlink() {
        remove_symlink(dest)
    } else if meta.is_dir() {
        fs::remove_dir_all(dest)
    } else {
        fs::remove_file(dest)
    };
    result.map_err(ToolError::io("remove", dest))?;
    Ok(true)
}

/// Copy a directory tree, returning the number of files copied.
pub fn copy_recursive(src: &Path, dest: &Path) -> Result<u64, ToolError> {
    let meta = fs::metadata(src).map_err(ToolError::io("inspect", src))?;
    if !meta.is_dir() {
        fs::copy(src, dest).map_err(ToolError::io("copy", src))?;
        return Ok(1);
    }

    fs::create_dir_all(dest).map_err(ToolError::io("create", dest))?;
    let mut copied = 0;
    for entry in fs::read_dir(src).map_err(ToolError::io("read", src))? {
        let entry = entry.map_err(ToolError::io("read", src))?;
        copied += copy_recursive(&entry.path(), &dest.join(entry.file_name()))?;
    }
    Ok(copied)
}

#[cfg(unix)]
fn symlink_dir(src: &Path, dest: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dest)
}

#[cfg(windows)]
fn symlink_dir(src: &Path, dest: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(src, dest)
}

#[cfg(unix)]
fn remove_symlink(path: &Path) -> io::Result<()> {
    fs::remove_file(path)
}

#[cfg(windows)]
fn remove_symlink(path: &Path) -> io::Result<()> {
    // Directory symlinks are directories to the Windows API.
    fs::remove_dir(path).or_else(|_| fs::remove_file(path))
}

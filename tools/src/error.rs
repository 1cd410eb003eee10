use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode icon {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to write plugin archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("invalid manifest {}: {source}", .path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Stream Deck plugins directory not found at {}; make sure Stream Deck is installed", .0.display())]
    PluginsDirMissing(PathBuf),
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(&'static str),
    #[error("`{command}` failed ({status}); make sure the gh CLI is installed and authenticated")]
    CommandFailed { command: String, status: String },
}

impl ToolError {
    /// Adapter for `map_err` that tags an I/O failure with what was attempted.
    pub fn io(action: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io {
            action,
            path,
            source,
        }
    }
}

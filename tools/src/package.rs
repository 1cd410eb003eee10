use std::ffi::OsStr;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::Deserialize;
use tracing::{info, warn};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ToolError;

pub const PACKAGE_NAME: &str = "com.jmolund.bf6stats";
pub const ARCHIVE_EXTENSION: &str = "streamDeckPlugin";
pub const RELEASE_TITLE: &str = "BF6 Stats";

const SKIPPED_FILES: &[&str] = &[".DS_Store"];

/// The fields of `manifest.json` the packager needs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Manifest {
    pub version: String,
    #[serde(default)]
    pub name: Option<String>,
}

pub fn read_manifest(plugin_dir: &Path) -> Result<Manifest, ToolError> {
    let path = plugin_dir.join("manifest.json");
    let raw = fs::read(&path).map_err(ToolError::io("read", &path))?;
    serde_json::from_slice(&raw).map_err(|source| ToolError::Manifest { path, source })
}

pub fn archive_file_name() -> String {
    format!("{PACKAGE_NAME}.{ARCHIVE_EXTENSION}")
}

/// Copy a freshly built plugin executable into the bundle next to the manifest.
pub fn stage_binary(plugin_dir: &Path, binary: &Path) -> Result<PathBuf, ToolError> {
    let Some(name) = binary.file_name() else {
        return Err(ToolError::Io {
            action: "stage",
            path: binary.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "binary path has no file name"),
        });
    };
    let dest = plugin_dir.join(name);
    fs::copy(binary, &dest).map_err(ToolError::io("copy", binary))?;
    info!("staged {}", dest.display());
    Ok(dest)
}

/// Zip the bundle into `<dist_dir>/com.jmolund.bf6stats.streamDeckPlugin`.
/// Entries are rooted at the bundle directory name.
pub fn build_archive(plugin_dir: &Path, dist_dir: &Path) -> Result<PathBuf, ToolError> {
    fs::create_dir_all(dist_dir).map_err(ToolError::io("create", dist_dir))?;

    let output = dist_dir.join(archive_file_name());
    if output.exists() {
        fs::remove_file(&output).map_err(ToolError::io("remove", &output))?;
    }

    let root = plugin_dir
        .canonicalize()
        .map_err(ToolError::io("resolve", plugin_dir))?;
    let root_name = root
        .file_name()
        .and_then(OsStr::to_str)
        .unwrap_or("plugin.sdPlugin")
        .to_string();

    let file = File::create(&output).map_err(ToolError::io("create", &output))?;
    let mut zip = ZipWriter::new(file);
    zip.add_directory(format!("{root_name}/"), entry_options())?;
    let entries = add_tree(&mut zip, &root, &root_name)?;
    zip.finish()?;

    info!("created {} ({entries} entries)", output.display());
    Ok(output)
}

fn entry_options() -> FileOptions {
    FileOptions::default().compression_method(CompressionMethod::Deflated)
}

fn add_tree(zip: &mut ZipWriter<File>, dir: &Path, prefix: &str) -> Result<usize, ToolError> {
    let mut entries = fs::read_dir(dir)
        .map_err(ToolError::io("read", dir))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(ToolError::io("read", dir))?;
    entries.sort_by_key(|entry| entry.file_name());

    let mut count = 0;
    for entry in entries {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            warn!("skipping non UTF-8 path {}", entry.path().display());
            continue;
        };
        if SKIPPED_FILES.contains(&name) {
            continue;
        }

        let path = entry.path();
        let entry_name = format!("{prefix}/{name}");
        let meta = fs::metadata(&path).map_err(ToolError::io("inspect", &path))?;
        if meta.is_dir() {
            zip.add_directory(format!("{entry_name}/"), entry_options())?;
            count += 1 + add_tree(zip, &path, &entry_name)?;
        } else {
            zip.start_file(entry_name, file_options(&meta))?;
            let mut source = File::open(&path).map_err(ToolError::io("open", &path))?;
            io::copy(&mut source, zip).map_err(ToolError::io("compress", &path))?;
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(unix)]
fn file_options(meta: &fs::Metadata) -> FileOptions {
    use std::os::unix::fs::PermissionsExt;
    entry_options().unix_permissions(meta.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn file_options(_meta: &fs::Metadata) -> FileOptions {
    entry_options()
}

pub fn release_notes(archive_name: &str) -> String {
    format!(
        "## Installation\n\n\
         1. Download `{archive_name}`\n\
         2. Double-click the file to install\n\
         3. The plugin will appear in your Stream Deck app under \"{RELEASE_TITLE}\"\n\n\
         ## Features\n\
         - Display your Battlefield 6 player statistics on Stream Deck\n"
    )
}

/// Publish `archive` as GitHub release `v{version}` through the `gh` CLI,
/// replacing an existing release with the same tag.
pub fn publish(version: &str, archive: &Path, dist_dir: &Path) -> Result<(), ToolError> {
    let tag = format!("v{version}");
    info!("publishing release {tag} to GitHub");

    let notes = dist_dir.join("release-notes.md");
    fs::write(&notes, release_notes(&archive_file_name()))
        .map_err(ToolError::io("write", &notes))?;

    let result = create_release(&tag, version, archive, &notes);

    if let Err(e) = fs::remove_file(&notes) {
        warn!(error = %e, "failed to remove {}", notes.display());
    }
    result
}

fn create_release(tag: &str, version: &str, archive: &Path, notes: &Path) -> Result<(), ToolError> {
    let exists = gh(["release", "view", tag], true)?;
    if exists {
        info!("release {tag} already exists, deleting");
        expect_success(["release", "delete", tag, "-y"])?;
    }

    let title = format!("{RELEASE_TITLE} {tag}");
    expect_success([
        OsStr::new("release"),
        OsStr::new("create"),
        OsStr::new(tag),
        archive.as_os_str(),
        OsStr::new("--title"),
        OsStr::new(&title),
        OsStr::new("--notes-file"),
        notes.as_os_str(),
    ])?;

    info!("published release {tag} for version {version}");
    Ok(())
}

/// Run `gh` and report whether it exited successfully.
fn gh<I, S>(args: I, quiet: bool) -> Result<bool, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new("gh");
    command.args(args);
    if quiet {
        command.stdout(Stdio::null()).stderr(Stdio::null());
    }
    let status = command
        .status()
        .map_err(ToolError::io("run", PathBuf::from("gh")))?;
    Ok(status.success())
}

fn expect_success<I, S>(args: I) -> Result<(), ToolError>
where
    I: IntoIterator<Item = S> + Clone,
    S: AsRef<OsStr>,
{
    let mut command = Command::new("gh");
    command.args(args.clone());
    let status = command
        .status()
        .map_err(ToolError::io("run", PathBuf::from("gh")))?;
    if status.success() {
        return Ok(());
    }
    let rendered = args
        .into_iter()
        .map(|arg| arg.as_ref().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    Err(ToolError::CommandFailed {
        command: format!("gh {rendered}"),
        status: status.to_string(),
    })
}

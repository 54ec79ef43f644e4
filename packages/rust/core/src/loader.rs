//! Repository loading: local copy or shallow clone into a working directory.
//!
//! A thin filesystem/VCS wrapper. The ingestion pipeline only ever sees the
//! returned local path.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use readmegen_shared::{ReadmeGenError, Result};

/// Load a repository into `work_dir` and return the local working copy path.
///
/// A local directory is copied (skipping `.git`); anything else is treated
/// as a remote URL and shallow-cloned with the `git` binary. Failure raises
/// [`ReadmeGenError::Git`].
pub fn load_repository(source: &str, work_dir: &Path) -> Result<PathBuf> {
    let source_path = Path::new(source);
    if source_path.is_dir() {
        let name = source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ReadmeGenError::Git(format!("invalid local path: {source}")))?;
        let target = work_dir.join(name);
        copy_directory(source_path, &target)?;
        info!(source, target = %target.display(), "copied local repository");
        Ok(target)
    } else {
        let target = work_dir.join(repo_name_from_url(source));
        clone_repository(source, &target)?;
        info!(source, target = %target.display(), "cloned remote repository");
        Ok(target)
    }
}

/// Derive a directory name from a repository URL.
pub fn repo_name_from_url(url: &str) -> String {
    url.trim_end_matches('/')
        .trim_end_matches(".git")
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("repository")
        .to_string()
}

/// Shallow single-branch clone via the `git` binary.
fn clone_repository(repo_url: &str, target: &Path) -> Result<()> {
    let status = Command::new("git")
        .arg("clone")
        .arg("--depth")
        .arg("1")
        .arg("--single-branch")
        .arg(repo_url)
        .arg(target)
        .status()
        .map_err(|e| ReadmeGenError::Git(format!("failed to launch git: {e}")))?;

    if !status.success() {
        return Err(ReadmeGenError::Git(format!(
            "git clone of {repo_url} exited with {status}"
        )));
    }
    Ok(())
}

/// Copy a directory tree, skipping `.git`.
fn copy_directory(source: &Path, target: &Path) -> Result<()> {
    std::fs::create_dir_all(target).map_err(|e| ReadmeGenError::io(target, e))?;

    for entry in std::fs::read_dir(source).map_err(|e| ReadmeGenError::io(source, e))? {
        let entry = entry.map_err(|e| ReadmeGenError::io(source, e))?;
        let file_name = entry.file_name();
        if file_name == ".git" {
            debug!("skipping .git during copy");
            continue;
        }

        let src = entry.path();
        let dst = target.join(&file_name);
        let file_type = entry.file_type().map_err(|e| ReadmeGenError::io(&src, e))?;

        if file_type.is_dir() {
            copy_directory(&src, &dst)?;
        } else if file_type.is_file() {
            std::fs::copy(&src, &dst).map_err(|e| ReadmeGenError::io(&src, e))?;
        }
        // Symlinks are skipped: a working copy snapshot has no use for them
    }
    Ok(())
}

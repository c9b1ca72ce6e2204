use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::error::Result;

/// Walks `root` in file-name order and returns every file (or link to one) whose name
/// equals `file_name`. Traversal errors are returned, not skipped.
pub fn find_named_files(root: &Path, file_name: &str) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if is_named_file(&entry, file_name) {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

/// Symlinks count as files unless they point at a directory. A dangling link
/// is kept so the copy or trim step reports it.
fn is_named_file(entry: &DirEntry, file_name: &str) -> bool {
    if entry.file_name() != file_name {
        return false;
    }
    if entry.path_is_symlink() {
        !entry.path().is_dir()
    } else {
        entry.file_type().is_file()
    }
}

/// Makes `path` absolute against the current directory and removes `.` and
/// `..` components lexically. Symlinks are not resolved.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok(normalize(&joined))
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !matches!(
                    out.components().next_back(),
                    Some(Component::RootDir | Component::Prefix(_)) | None
                ) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Replaces a leading `~` with `$HOME`. Anything else is returned unchanged.
pub fn expand_home(token: &str) -> String {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    expand_home_with(token, home.as_deref())
}

pub(crate) fn expand_home_with(token: &str, home: Option<&Path>) -> String {
    let Some(home) = home else {
        return token.to_string();
    };
    if token == "~" {
        return home.display().to_string();
    }
    match token.strip_prefix("~/") {
        Some(rest) => home.join(rest).display().to_string(),
        None => token.to_string(),
    }
}

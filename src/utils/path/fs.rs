//! Filesystem path resolution.

use std::path::{Component, Path, PathBuf};

/// Resolve a user-supplied path (CLI flag, config value) to absolute form.
///
/// Expands a leading `~`, joins relative paths onto the current directory and
/// removes `.`/`..` lexically. Symlinks are kept as written, so the watched
/// directory is the one the user named.
///
/// # Example
/// ```ignore
/// let file = resolve_user_path("~/notes/todo.md");
/// ```
pub fn resolve_user_path(raw: &str) -> PathBuf {
    let expanded = shellexpand::tilde(raw).into_owned();
    let path = PathBuf::from(expanded);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir().map_or_else(|_| path.clone(), |cwd| cwd.join(&path))
    };
    clean_path(&absolute)
}

/// Lexically normalize a path: drop `.`, fold `..` into its parent.
///
/// `..` never climbs above the root of an absolute path.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let at_root = matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir | Component::Prefix(_))
                );
                if !at_root {
                    out.pop();
                } else if !path.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

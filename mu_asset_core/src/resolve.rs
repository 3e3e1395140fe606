use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::AssetPath;

/// Finds the file at `path` under `root`.
///
/// The exact spelling is tried first. Otherwise every component is looked up
/// case-insensitively in its parent directory, preferring an exact match
/// where several entries differ only in case.
pub(crate) fn find_file(root: &Path, path: &AssetPath) -> io::Result<Option<PathBuf>> {
    if path.is_empty() {
        return Ok(None);
    }

    let exact = root.join(path.as_str());
    if exact.is_file() {
        return Ok(Some(exact));
    }

    let mut target = root.to_path_buf();
    for part in path.components() {
        if target.join(part).exists() {
            target.push(part);
            continue;
        }

        if !target.is_dir() {
            return Ok(None);
        }

        let found = fs::read_dir(&target)?.find_map(|res| {
            res.ok().and_then(|entry| {
                let file_name = entry.file_name();
                file_name.eq_ignore_ascii_case(part).then_some(file_name)
            })
        });

        match found {
            Some(file_name) => {
                debug!(
                    part,
                    found = %file_name.to_string_lossy(),
                    "matched path component ignoring case"
                );
                target.push(file_name);
            }
            None => return Ok(None),
        }
    }

    Ok(target.is_file().then_some(target))
}

/// Locations to look for the file at `path`, in order: the path itself, then
/// the same file name inside the `fallback` folder next to it.
pub(crate) fn candidates(path: &AssetPath, fallback: &str) -> [AssetPath; 2] {
    let in_fallback = path.parent_join(&format!("{fallback}/{}", path.file_name()));
    [path.clone(), in_fallback]
}

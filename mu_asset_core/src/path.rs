use std::{
    fmt::{self, Display},
    hash::{Hash, Hasher},
};

/// A normalized, case-preserving path of an asset relative to the data root.
///
/// Separators are always `/`, with no leading, trailing or repeated ones and
/// no `.` components. `..` removes the preceding component and is dropped at
/// the start, so a path never leaves the data root. Comparison and hashing
/// ignore ASCII case, since the client addresses files case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct AssetPath {
    path: String,
}

impl AssetPath {
    #[must_use]
    pub fn new(path: &str) -> Self {
        let mut parts = Vec::new();
        for part in path.split(['/', '\\']) {
            match part {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                part => parts.push(part),
            }
        }

        Self {
            path: parts.join("/"),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.path.split('/').filter(|part| !part.is_empty())
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }

    /// Everything before the file name, empty for files in the root.
    #[must_use]
    pub fn parent(&self) -> &str {
        self.path.rsplit_once('/').map_or("", |(parent, _)| parent)
    }

    #[must_use]
    pub fn file_stem(&self) -> &str {
        let file_name = self.file_name();
        match file_name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => file_name,
        }
    }

    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        match self.file_name().rsplit_once('.') {
            Some((stem, extension)) if !stem.is_empty() => Some(extension),
            _ => None,
        }
    }

    #[must_use]
    pub fn with_extension(&self, extension: &str) -> Self {
        self.with_file_name(&format!("{}.{extension}", self.file_stem()))
    }

    #[must_use]
    pub fn with_file_name(&self, file_name: &str) -> Self {
        self.parent_join(file_name)
    }

    /// Appends `path` to the parent of this path.
    #[must_use]
    pub fn parent_join(&self, path: &str) -> Self {
        let parent = self.parent();
        if parent.is_empty() {
            Self::new(path)
        } else {
            Self::new(&format!("{parent}/{path}"))
        }
    }
}

impl PartialEq for AssetPath {
    fn eq(&self, other: &Self) -> bool {
        self.path.eq_ignore_ascii_case(&other.path)
    }
}

impl Eq for AssetPath {}

impl Hash for AssetPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path
            .bytes()
            .for_each(|b| state.write_u8(b.to_ascii_lowercase()));
    }
}

impl Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl From<&str> for AssetPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for AssetPath {
    fn from(path: String) -> Self {
        Self::new(&path)
    }
}

impl From<&String> for AssetPath {
    fn from(path: &String) -> Self {
        Self::new(path)
    }
}

impl From<&AssetPath> for AssetPath {
    fn from(path: &AssetPath) -> Self {
        path.clone()
    }
}

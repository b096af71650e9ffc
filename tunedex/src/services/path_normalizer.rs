//! Public path derivation
//!
//! Maps an on-disk path under the scan root to the URL path it is served at,
//! e.g. `/music/Best Of/01 Intro.mp3` under root `/music` → `/static/Best%20Of/01%20Intro.mp3`.
//! Pure string/path manipulation: no filesystem access.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// Path does not live under the scan root
    #[error("{path} is outside scan root {root}")]
    OutsideRoot { root: PathBuf, path: PathBuf },

    /// Path names the root itself
    #[error("{0} has no file component below the scan root")]
    Empty(PathBuf),

    /// Component is not valid UTF-8 and cannot be expressed in a URL
    #[error("{0} is not valid UTF-8")]
    NonUtf8(PathBuf),
}

/// Derives public paths for files under one scan root
#[derive(Debug, Clone)]
pub struct PathNormalizer {
    root: PathBuf,
    prefix: String,
}

impl PathNormalizer {
    /// `prefix` is normalized to a single leading and trailing `/` (`static` → `/static/`)
    pub fn new(root: impl Into<PathBuf>, prefix: &str) -> Self {
        let trimmed = prefix.trim_matches('/');
        let prefix = if trimmed.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", trimmed)
        };

        Self {
            root: root.into(),
            prefix,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Public, percent-escaped path for `path`
    ///
    /// Fails when `path` is not below the root, including paths that climb out with `..`.
    pub fn public_path(&self, path: &Path) -> Result<String, PathError> {
        let outside = || PathError::OutsideRoot {
            root: self.root.clone(),
            path: path.to_path_buf(),
        };

        let relative = path.strip_prefix(&self.root).map_err(|_| outside())?;

        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(segment) => {
                    let segment = segment
                        .to_str()
                        .ok_or_else(|| PathError::NonUtf8(path.to_path_buf()))?;
                    segments.push(urlencoding::encode(segment).into_owned());
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(outside());
                }
            }
        }

        if segments.is_empty() {
            return Err(PathError::Empty(path.to_path_buf()));
        }

        Ok(format!("{}{}", self.prefix, segments.join("/")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> PathNormalizer {
        PathNormalizer::new("/srv/music", "/static/")
    }

    #[test]
    fn test_spaces_are_escaped() {
        let public = normalizer()
            .public_path(Path::new("/srv/music/Best Of/01 Intro.mp3"))
            .unwrap();
        assert_eq!(public, "/static/Best%20Of/01%20Intro.mp3");
        assert!(!public.contains(char::is_whitespace));
    }

    #[test]
    fn test_reserved_characters_are_escaped() {
        let public = normalizer()
            .public_path(Path::new("/srv/music/AC#DC/what?.flac"))
            .unwrap();
        assert_eq!(public, "/static/AC%23DC/what%3F.flac");
    }

    #[test]
    fn test_prefix_is_normalized() {
        let n = PathNormalizer::new("/srv/music", "files");
        assert_eq!(n.prefix(), "/files/");
        assert_eq!(
            n.public_path(Path::new("/srv/music/a.mp3")).unwrap(),
            "/files/a.mp3"
        );

        let bare = PathNormalizer::new("/srv/music", "");
        assert_eq!(bare.public_path(Path::new("/srv/music/a.mp3")).unwrap(), "/a.mp3");
    }

    #[test]
    fn test_outside_root_fails() {
        let result = normalizer().public_path(Path::new("/etc/passwd"));
        assert!(matches!(result, Err(PathError::OutsideRoot { .. })));
    }

    #[test]
    fn test_sibling_with_common_prefix_is_outside() {
        // strip_prefix works on components, so /srv/music2 is not under /srv/music
        let result = normalizer().public_path(Path::new("/srv/music2/a.mp3"));
        assert!(matches!(result, Err(PathError::OutsideRoot { .. })));
    }

    #[test]
    fn test_parent_dir_escape_fails() {
        let result = normalizer().public_path(Path::new("/srv/music/../secret.mp3"));
        assert!(matches!(result, Err(PathError::OutsideRoot { .. })));
    }

    #[test]
    fn test_root_itself_fails() {
        let result = normalizer().public_path(Path::new("/srv/music"));
        assert!(matches!(result, Err(PathError::Empty(_))));
    }

    #[test]
    fn test_relative_root() {
        let n = PathNormalizer::new(".", "/static/");
        assert_eq!(
            n.public_path(Path::new("./Album/track 1.ogg")).unwrap(),
            "/static/Album/track%201.ogg"
        );
    }
}

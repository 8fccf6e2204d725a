//! Lexical path helpers used to link screenshots from the report.
//!
//! Nothing here touches the filesystem: paths are normalized by their
//! components only, so results do not depend on what exists on disk.

use std::path::{Component, Path, PathBuf};

/// Resolve `.` and `..` components without consulting the filesystem.
///
/// `..` at the root is dropped; leading `..` in a relative path is kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    parts.iter().collect()
}

/// Path of `target` relative to the directory `base`, with `/` separators.
///
/// Both paths are normalized first. When only one of them is absolute
/// there is no common anchor, and the normalized target is returned as is.
pub fn relative_path(base: &Path, target: &Path) -> String {
    let base = normalize(base);
    let target = normalize(target);

    if base.is_absolute() != target.is_absolute() {
        return target.to_string_lossy().into_owned();
    }

    let base_parts: Vec<Component> = base.components().collect();
    let target_parts: Vec<Component> = target.components().collect();
    let common = base_parts
        .iter()
        .zip(&target_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<String> = vec!["..".to_string(); base_parts.len() - common];
    segments.extend(
        target_parts[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(
            normalize(Path::new("/a/./b/../c/")),
            PathBuf::from("/a/c")
        );
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize(Path::new("../a/./b")), PathBuf::from("../a/b"));
        assert_eq!(normalize(Path::new("a/..")), PathBuf::from(""));
    }

    #[test]
    fn test_relative_child() {
        assert_eq!(
            relative_path(Path::new("/reports"), Path::new("/reports/shots/a.png")),
            "shots/a.png"
        );
    }

    #[test]
    fn test_relative_sibling() {
        assert_eq!(
            relative_path(
                Path::new("/work/dist"),
                Path::new("/work/screenshots/./run/../b.png")
            ),
            "../screenshots/b.png"
        );
        assert_eq!(
            relative_path(Path::new("/work/dist/html/"), Path::new("/tmp/c.png")),
            "../../../tmp/c.png"
        );
    }

    #[test]
    fn test_relative_same_path() {
        assert_eq!(relative_path(Path::new("/a/b"), Path::new("/a/./b")), "");
    }

    #[test]
    fn test_relative_mixed_kinds() {
        assert_eq!(
            relative_path(Path::new("/reports"), Path::new("shots/./a.png")),
            "shots/a.png"
        );
    }
}

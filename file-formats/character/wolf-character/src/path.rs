use std::path::{Path, PathBuf};

/// Finds an existing file for `path`.
///
/// A path with an extension that exists is returned as is. Otherwise the
/// extension is replaced by each of `alternatives` in turn (with or without
/// the leading dot) and the first existing candidate wins.
pub fn resolve_path(path: impl AsRef<Path>, alternatives: &[&str]) -> Option<PathBuf> {
    let path = path.as_ref();
    if path.extension().is_some() && path.exists() {
        return Some(path.to_path_buf());
    }

    alternatives
        .iter()
        .map(|ext| path.with_extension(ext.trim_start_matches('.')))
        .find(|candidate| candidate.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_existing_path_kept() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("head.mdc");
        fs::write(&file, b"").unwrap();
        assert_eq!(resolve_path(&file, &[".md3"]), Some(file));
    }

    #[test]
    fn test_alternative_extensions_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("body.jpg"), b"").unwrap();
        fs::write(dir.path().join("body.png"), b"").unwrap();

        let resolved = resolve_path(dir.path().join("body.tga"), &[".jpg", "png"]);
        assert_eq!(resolved, Some(dir.path().join("body.jpg")));

        let resolved = resolve_path(dir.path().join("body"), &["png"]);
        assert_eq!(resolved, Some(dir.path().join("body.png")));
    }

    #[test]
    fn test_nothing_found() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_path(dir.path().join("head.md3"), &[".mdc"]), None);
    }
}

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::path::resolve_path;
use crate::skin::SkinFile;

/// Image extensions tried when a skin names a texture that does not exist.
pub const IMAGE_EXTENSIONS: [&str; 2] = [".tga", ".jpg"];

/// Surface name to texture file, shared by every model of a character.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextureTable {
    textures: BTreeMap<String, PathBuf>,
}

impl TextureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every texture mapping of `skin` whose file can be found.
    ///
    /// Later skins override earlier ones for the same surface. Returns the
    /// number of textures added.
    pub fn add_skin(&mut self, skin: &SkinFile) -> usize {
        let mut added = 0;
        for (surface, texture) in &skin.textures {
            match resolve_path(texture, &IMAGE_EXTENSIONS) {
                Some(path) => {
                    self.textures.insert(surface.clone(), path);
                    added += 1;
                }
                None => log::warn!(
                    "No texture for surface {surface:?} at {}",
                    texture.display()
                ),
            }
        }
        added
    }

    pub fn get(&self, surface: &str) -> Option<&Path> {
        self.textures.get(surface).map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.textures
            .iter()
            .map(|(surface, path)| (surface.as_str(), path.as_path()))
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_textures_resolved_through_alternatives() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("body.jpg"), b"").unwrap();
        fs::write(dir.path().join("head.tga"), b"").unwrap();

        let skin = SkinFile::parse(
            "body,models/body.tga\nhead,models/head.tga\nhat,models/hat.tga\n",
            dir.path(),
        );
        let mut table = TextureTable::new();
        assert_eq!(table.add_skin(&skin), 2);

        assert_eq!(table.get("body"), Some(dir.path().join("body.jpg").as_path()));
        assert_eq!(table.get("head"), Some(dir.path().join("head.tga").as_path()));
        assert_eq!(table.get("hat"), None);
    }
}

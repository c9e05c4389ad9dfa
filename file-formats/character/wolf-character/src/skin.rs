use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Prefix of keys naming a model attached to a tag.
pub const ATTACHMENT_PREFIX: &str = "md3_";

/// Contents of a `.skin` file.
///
/// Each line is `key,value`. An empty value makes the key a tag name, a key
/// starting with `md3_` names an attached model, and any other key maps a
/// mesh to a texture in the skin's own folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SkinFile {
    pub tags: Vec<String>,
    pub textures: BTreeMap<String, PathBuf>,
    pub attachments: BTreeMap<String, String>,
}

impl SkinFile {
    /// Parses skin text. Texture file names are placed in `folder`.
    pub fn parse(text: &str, folder: &Path) -> Self {
        let mut skin = Self::default();

        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with("//") {
                continue;
            }
            let Some((key, value)) = line.split_once(',') else {
                continue;
            };
            let key = key.trim();
            let value = strip_quotes(value.trim());

            if value.is_empty() {
                skin.tags.push(key.to_string());
            } else if key.starts_with(ATTACHMENT_PREFIX) {
                skin.attachments.insert(key.to_string(), value.to_string());
            } else {
                let file_name = Path::new(value)
                    .file_name()
                    .map_or_else(|| PathBuf::from(value), PathBuf::from);
                skin.textures.insert(key.to_string(), folder.join(file_name));
            }
        }

        skin
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let folder = path.parent().unwrap_or_else(|| Path::new(""));
        let skin = Self::parse(&text, folder);
        log::debug!(
            "Skin {}: {} textures, {} tags, {} attachments",
            path.display(),
            skin.textures.len(),
            skin.tags.len(),
            skin.attachments.len()
        );
        Ok(skin)
    }

    /// Like [`load`](Self::load), but a missing or unreadable file gives an
    /// empty skin.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::load(path).unwrap_or_else(|e| {
            log::warn!("Cannot open skin {}: {}", path.display(), e);
            Self::default()
        })
    }

    pub fn attachment(&self, key: &str) -> Option<&str> {
        self.attachments.get(key).map(String::as_str)
    }

    pub fn texture(&self, mesh: &str) -> Option<&Path> {
        self.textures.get(mesh).map(PathBuf::as_path)
    }
}

/// Removes one pair of surrounding double quotes.
fn strip_quotes(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

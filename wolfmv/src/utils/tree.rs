//! Tree rendering for model structure views

use console::Style;
use std::collections::BTreeMap;
use std::path::Path;

use crate::utils::format::format_bytes;

/// A node in a rendered structure tree
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub name: String,
    pub node_type: NodeType,
    pub size: Option<u64>,
    pub children: Vec<TreeNode>,
    pub metadata: BTreeMap<String, String>,
    pub external_refs: Vec<ExternalRef>,
}

/// What a node stands for in the model file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Root,
    Header,
    Group,
    Frame,
    Tag,
    Bone,
    Surface,
}

/// A file the model names but does not contain
#[derive(Debug, Clone)]
pub struct ExternalRef {
    pub path: String,
    pub ref_type: RefType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefType {
    Texture,
    Shader,
    Model,
    Skin,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct TreeOptions {
    pub max_depth: Option<usize>,
    pub show_external_refs: bool,
    pub no_color: bool,
    pub show_metadata: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            show_external_refs: true,
            no_color: false,
            show_metadata: true,
        }
    }
}

impl TreeNode {
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            name: name.into(),
            node_type,
            size: None,
            children: Vec::new(),
            metadata: BTreeMap::new(),
            external_refs: Vec::new(),
        }
    }

    #[must_use]
    pub fn add_child(mut self, child: TreeNode) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: &str, value: impl ToString) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    #[must_use]
    pub fn with_external_ref(mut self, path: &str) -> Self {
        self.external_refs.push(ExternalRef {
            path: path.to_string(),
            ref_type: detect_ref_type(path),
        });
        self
    }
}

impl ExternalRef {
    pub fn icon(&self) -> &'static str {
        match self.ref_type {
            RefType::Texture => "🖼️",
            RefType::Shader => "🎨",
            RefType::Model => "🏗️",
            RefType::Skin => "📄",
            RefType::Unknown => "📁",
        }
    }

    pub fn style(&self, no_color: bool) -> Style {
        if no_color {
            Style::new()
        } else {
            Style::new().yellow()
        }
    }
}

impl NodeType {
    pub fn icon(self) -> &'static str {
        match self {
            NodeType::Root => "📁",
            NodeType::Header => "📋",
            NodeType::Group => "📦",
            NodeType::Frame => "🎞️",
            NodeType::Tag => "📌",
            NodeType::Bone => "🦴",
            NodeType::Surface => "🔺",
        }
    }

    pub fn style(self, no_color: bool) -> Style {
        if no_color {
            Style::new()
        } else {
            match self {
                NodeType::Root => Style::new().bold().cyan(),
                NodeType::Header => Style::new().bold().yellow(),
                NodeType::Group => Style::new().blue(),
                NodeType::Frame => Style::new().magenta(),
                NodeType::Tag => Style::new().yellow(),
                NodeType::Bone => Style::new().green(),
                NodeType::Surface => Style::new().cyan(),
            }
        }
    }
}

/// Render a tree to a string, one node per line
pub fn render_tree(root: &TreeNode, options: &TreeOptions) -> String {
    let mut output = String::new();
    render_node(root, &mut output, "", true, 0, options);
    output
}

fn render_node(
    node: &TreeNode,
    output: &mut String,
    prefix: &str,
    is_last: bool,
    depth: usize,
    options: &TreeOptions,
) {
    if options.max_depth.is_some_and(|max| depth > max) {
        return;
    }

    let connector = if depth == 0 {
        ""
    } else if is_last {
        "└── "
    } else {
        "├── "
    };
    let style = node.node_type.style(options.no_color);

    output.push_str(&format!(
        "{}{}{} {}",
        prefix,
        connector,
        node.node_type.icon(),
        style.apply_to(&node.name)
    ));
    if let Some(size) = node.size {
        output.push_str(&format!(" ({})", format_bytes(size)));
    }
    output.push('\n');

    let detail_prefix = format!(
        "{}{}    ",
        prefix,
        match (depth, is_last) {
            (0, _) => "",
            (_, true) => "    ",
            (_, false) => "│   ",
        }
    );

    if options.show_metadata {
        let key_style = if options.no_color {
            Style::new()
        } else {
            Style::new().dim()
        };
        for (key, value) in &node.metadata {
            output.push_str(&format!(
                "{}🏷️  {}: {}\n",
                detail_prefix,
                key_style.apply_to(key),
                value
            ));
        }
    }

    if options.show_external_refs {
        for ext_ref in &node.external_refs {
            output.push_str(&format!(
                "{}└─→ {} {}\n",
                detail_prefix,
                ext_ref.icon(),
                ext_ref.style(options.no_color).apply_to(&ext_ref.path)
            ));
        }
    }

    let child_prefix = if depth == 0 {
        String::new()
    } else {
        format!("{}{}", prefix, if is_last { "    " } else { "│   " })
    };
    for (i, child) in node.children.iter().enumerate() {
        let is_last_child = i + 1 == node.children.len();
        render_node(child, output, &child_prefix, is_last_child, depth + 1, options);
    }
}

/// Guess what a referenced file is from its extension
pub fn detect_ref_type(path: &str) -> RefType {
    let extension = Path::new(path)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase());

    match extension.as_deref() {
        Some("tga" | "jpg" | "jpeg") => RefType::Texture,
        Some("shader") => RefType::Shader,
        Some("md3" | "mdc" | "mds") => RefType::Model,
        Some("skin") => RefType::Skin,
        // Shader names usually carry no extension at all
        None if path.contains('/') => RefType::Shader,
        _ => RefType::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_rendering() {
        let root = TreeNode::new("body.mds", NodeType::Root)
            .with_size(2048)
            .with_metadata("version", 4)
            .add_child(TreeNode::new("Header", NodeType::Header).with_metadata("bones", 2))
            .add_child(
                TreeNode::new("Surfaces", NodeType::Group).add_child(
                    TreeNode::new("torso", NodeType::Surface)
                        .with_external_ref("models/players/soldier/body.tga"),
                ),
            );

        let options = TreeOptions {
            no_color: true,
            ..TreeOptions::default()
        };
        let output = render_tree(&root, &options);

        assert!(output.contains("body.mds (2.05 kB)"));
        assert!(output.contains("├── 📋 Header"));
        assert!(output.contains("└── 📦 Surfaces"));
        assert!(output.contains("    └── 🔺 torso"));
        assert!(output.contains("models/players/soldier/body.tga"));
        assert!(output.contains("version: 4"));
    }

    #[test]
    fn test_max_depth_cuts_children() {
        let root = TreeNode::new("root", NodeType::Root)
            .add_child(TreeNode::new("child", NodeType::Group).add_child(TreeNode::new("leaf", NodeType::Bone)));
        let options = TreeOptions {
            max_depth: Some(1),
            no_color: true,
            ..TreeOptions::default()
        };
        let output = render_tree(&root, &options);
        assert!(output.contains("child"));
        assert!(!output.contains("leaf"));
    }

    #[test]
    fn test_ref_type_detection() {
        assert_eq!(detect_ref_type("body.tga"), RefType::Texture);
        assert_eq!(detect_ref_type("HEAD.JPG"), RefType::Texture);
        assert_eq!(detect_ref_type("models/players/head.mdc"), RefType::Model);
        assert_eq!(detect_ref_type("body_default.skin"), RefType::Skin);
        assert_eq!(detect_ref_type("models/players/soldier/body"), RefType::Shader);
        assert_eq!(detect_ref_type("notes"), RefType::Unknown);
    }
}

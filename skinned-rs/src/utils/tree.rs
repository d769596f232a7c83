//! Bone hierarchy rendering

use console::Style;
use skinned_data::Skeleton;

/// A node in a rendered hierarchy
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub name: String,
    pub node_type: NodeType,
    pub children: Vec<TreeNode>,
    pub metadata: Vec<(String, String)>,
}

/// Kinds of nodes in the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Root,
    /// Bone animated by at least one clip
    Animated,
    /// Bone that only ever holds its bind pose
    Static,
}

/// Options for tree rendering
#[derive(Debug, Clone)]
pub struct TreeOptions {
    pub max_depth: Option<usize>,
    pub no_color: bool,
    pub show_metadata: bool,
    pub compact: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            no_color: false,
            show_metadata: true,
            compact: false,
        }
    }
}

impl TreeNode {
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            name: name.into(),
            node_type,
            children: Vec::new(),
            metadata: Vec::new(),
        }
    }

    pub fn add_child(mut self, child: TreeNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_metadata(mut self, key: &str, value: impl ToString) -> Self {
        self.metadata.push((key.to_string(), value.to_string()));
        self
    }
}

impl NodeType {
    pub fn icon(&self) -> &'static str {
        match self {
            NodeType::Root => "◆",
            NodeType::Animated => "●",
            NodeType::Static => "○",
        }
    }

    pub fn style(&self, no_color: bool) -> Style {
        if no_color {
            Style::new()
        } else {
            match self {
                NodeType::Root => Style::new().bold().cyan(),
                NodeType::Animated => Style::new().green(),
                NodeType::Static => Style::new().dim(),
            }
        }
    }
}

/// Build the tree rooted at `bone`
pub fn bone_tree(skeleton: &Skeleton, bone: usize) -> TreeNode {
    let name = skeleton
        .bone(bone)
        .map_or_else(|| format!("bone_{bone}"), |b| b.name.clone());

    let clips: Vec<&str> = skeleton
        .clip_names()
        .into_iter()
        .filter(|clip| {
            skeleton
                .clip(clip)
                .is_ok_and(|clip| clip.bone_animation(bone).is_some_and(|anim| !anim.is_empty()))
        })
        .collect();

    let node_type = if bone == 0 {
        NodeType::Root
    } else if clips.is_empty() {
        NodeType::Static
    } else {
        NodeType::Animated
    };

    let mut node = TreeNode::new(name, node_type).with_metadata("index", bone);
    if !clips.is_empty() {
        node = node.with_metadata("clips", clips.join(", "));
    }

    skeleton
        .children(bone)
        .fold(node, |node, child| node.add_child(bone_tree(skeleton, child)))
}

/// Render a tree structure to string
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
    if let Some(max_depth) = options.max_depth
        && depth > max_depth
    {
        return;
    }

    let style = node.node_type.style(options.no_color);
    let connector = if depth == 0 {
        ""
    } else if is_last {
        "└── "
    } else {
        "├── "
    };

    output.push_str(&format!(
        "{prefix}{connector}{} {}",
        node.node_type.icon(),
        style.apply_to(&node.name)
    ));

    if options.show_metadata && options.compact && !node.metadata.is_empty() {
        let parts: Vec<String> = node
            .metadata
            .iter()
            .map(|(key, value)| format!("{key}:{value}"))
            .collect();
        output.push_str(&format!(" [{}]", parts.join(", ")));
    }
    output.push('\n');

    let child_prefix = if depth == 0 {
        String::new()
    } else {
        format!("{prefix}{}", if is_last { "    " } else { "│   " })
    };

    if options.show_metadata && !options.compact {
        let meta_style = if options.no_color {
            Style::new()
        } else {
            Style::new().dim()
        };
        for (key, value) in &node.metadata {
            output.push_str(&format!(
                "{child_prefix}    {}: {value}\n",
                meta_style.apply_to(key)
            ));
        }
    }

    for (i, child) in node.children.iter().enumerate() {
        let is_last_child = i == node.children.len() - 1;
        render_node(
            child,
            output,
            &child_prefix,
            is_last_child,
            depth + 1,
            options,
        );
    }
}

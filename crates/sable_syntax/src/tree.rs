//! The syntax tree and its node identities.

use crate::kinds::SyntaxKind;
use sable_core::text::TextSpan;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Node ID for referencing syntax nodes by index.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const INVALID: NodeId = NodeId(u32::MAX);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Errors raised while loading a tree produced outside this crate.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("failed to read syntax tree '{path}'")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed syntax tree document")]
    Json(#[from] serde_json::Error),
    #[error("syntax tree has no nodes")]
    Empty,
    #[error("the last node must be a compilation unit, found a {found}")]
    RootNotCompilationUnit { found: &'static str },
    #[error("node {child} must precede its parent {parent}")]
    ChildAfterParent { parent: NodeId, child: NodeId },
    #[error("node {child} is claimed by both {first} and {second}")]
    SharedChild { child: NodeId, first: NodeId, second: NodeId },
    #[error("node {0} is not reachable from the compilation unit")]
    OrphanNode(NodeId),
}

/// The serialized form of a tree: node kinds in index order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeDocument {
    pub file_name: String,
    pub nodes: Vec<SyntaxKind>,
}

/// A node of the tree. The span covers the node's own position and the
/// positions of all its descendants; positions are node indices.
#[derive(Debug, Clone)]
pub struct SyntaxNode {
    pub kind: SyntaxKind,
    pub span: TextSpan,
    pub parent: Option<NodeId>,
}

/// An immutable syntax tree with parent links.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    file_name: String,
    nodes: Vec<SyntaxNode>,
    root: NodeId,
}

impl SyntaxTree {
    /// Validate a flat node list and link it into a tree. The last node is
    /// the root and must be a compilation unit.
    pub fn from_document(document: TreeDocument) -> Result<SyntaxTree, TreeError> {
        let TreeDocument { file_name, nodes } = document;
        let Some(root) = nodes.last() else {
            return Err(TreeError::Empty);
        };
        if !matches!(root, SyntaxKind::CompilationUnit { .. }) {
            return Err(TreeError::RootNotCompilationUnit { found: root.label() });
        }

        let mut parents: Vec<Option<NodeId>> = vec![None; nodes.len()];
        for (index, kind) in nodes.iter().enumerate() {
            let parent = NodeId(index as u32);
            for child in kind.children() {
                if child.index() >= index {
                    return Err(TreeError::ChildAfterParent { parent, child });
                }
                if let Some(first) = parents[child.index()] {
                    return Err(TreeError::SharedChild { child, first, second: parent });
                }
                parents[child.index()] = Some(parent);
            }
        }
        let root_index = nodes.len() - 1;
        if let Some(orphan) = parents[..root_index].iter().position(Option::is_none) {
            return Err(TreeError::OrphanNode(NodeId(orphan as u32)));
        }

        Ok(Self::link(file_name, nodes, parents))
    }

    pub fn from_json(json: &str) -> Result<SyntaxTree, TreeError> {
        let document: TreeDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    pub fn from_file(path: &Path) -> Result<SyntaxTree, TreeError> {
        let json = std::fs::read_to_string(path).map_err(|source| TreeError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub(crate) fn link(file_name: String, kinds: Vec<SyntaxKind>, parents: Vec<Option<NodeId>>) -> SyntaxTree {
        let mut nodes: Vec<SyntaxNode> = Vec::with_capacity(kinds.len());
        for (index, (kind, parent)) in kinds.into_iter().zip(parents).enumerate() {
            let own = index as u32;
            let start = kind
                .children()
                .iter()
                .map(|child| nodes[child.index()].span.start)
                .fold(own, u32::min);
            nodes.push(SyntaxNode {
                kind,
                span: TextSpan::from_bounds(start, own + 1),
                parent,
            });
        }
        let root = NodeId(nodes.len() as u32 - 1);
        SyntaxTree { file_name, nodes, root }
    }

    pub fn to_document(&self) -> TreeDocument {
        TreeDocument {
            file_name: self.file_name.clone(),
            nodes: self.nodes.iter().map(|node| node.kind.clone()).collect(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> &SyntaxKind {
        &self.nodes[id.index()].kind
    }

    #[inline]
    pub fn span(&self, id: NodeId) -> TextSpan {
        self.nodes[id.index()].span
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    /// `id` followed by each of its ancestors up to the root.
    pub fn ancestors_and_self(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |&node| self.parent(node))
    }

    /// Whether `node` is `ancestor` or lies inside it.
    pub fn is_within(&self, node: NodeId, ancestor: NodeId) -> bool {
        self.span(ancestor).covers(&self.span(node))
    }

    /// The members of the compilation unit.
    pub fn members(&self) -> &[NodeId] {
        match self.kind(self.root) {
            SyntaxKind::CompilationUnit { members } => members,
            _ => unreachable!("tree root is always a compilation unit"),
        }
    }

    /// Text of the name written at `id`, for diagnostics.
    pub fn text_of(&self, id: NodeId) -> String {
        match self.kind(id) {
            SyntaxKind::Name { name } | SyntaxKind::MemberBinding { name } => name.clone(),
            SyntaxKind::MemberAccess { receiver, name } => format!("{}.{}", self.text_of(*receiver), name),
            SyntaxKind::TypeName { name, template_arguments, is_unbound } => {
                if *is_unbound {
                    format!("{}<>", name)
                } else if template_arguments.is_empty() {
                    name.clone()
                } else {
                    let args: Vec<_> = template_arguments.iter().map(|arg| self.text_of(*arg)).collect();
                    format!("{}<{}>", name, args.join(", "))
                }
            }
            SyntaxKind::NullableType { element } => format!("{}?", self.text_of(*element)),
            other => other.declared_name().map(str::to_string).unwrap_or_else(|| other.label().to_string()),
        }
    }
}

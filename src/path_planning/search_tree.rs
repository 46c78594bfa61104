//! Append-only tree of accepted poses.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. A parent owns the
//! ordered list of its children; a child only keeps its parent's index, which
//! is used to walk back to the root when a route is rebuilt.

use crate::common::Pose2D;

/// Opaque handle to a node of one [`SearchTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Insertion rank of the node (the root is 0)
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct TreeNode {
    pose: Pose2D,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct SearchTree {
    nodes: Vec<TreeNode>,
}

impl SearchTree {
    /// A tree holding only `root`
    pub fn new(root: Pose2D) -> Self {
        Self {
            nodes: vec![TreeNode {
                pose: root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the tree holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add `pose` as the last child of `parent`.
    ///
    /// # Panics
    /// Panics if `parent` does not belong to this tree.
    pub fn insert(&mut self, parent: NodeId, pose: Pose2D) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes[parent.0].children.push(id);
        self.nodes.push(TreeNode {
            pose,
            parent: Some(parent),
            children: Vec::new(),
        });
        id
    }

    pub fn pose(&self, id: NodeId) -> Pose2D {
        self.nodes[id.0].pose
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Depth-first search from the root for a node whose pose equals `pose` exactly
    pub fn find(&self, pose: &Pose2D) -> Option<NodeId> {
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            if node.pose == *pose {
                return Some(id);
            }
            // reversed so the first child is visited first
            stack.extend(node.children.iter().rev());
        }
        None
    }

    /// Number of edges between `id` and the root
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count() - 1
    }

    /// `id` followed by each parent up to the root
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |&n| self.parent(n))
    }

    /// True if `ancestor` lies on the parent chain of `id` (or is `id`)
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|n| n == ancestor)
    }

    /// Node handles from the root down to `id`
    pub fn path_from_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path: Vec<NodeId> = self.ancestors(id).collect();
        path.reverse();
        path
    }

    /// All node handles in insertion order
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// (parent pose, child pose) for every edge
    pub fn edges(&self) -> Vec<(Pose2D, Pose2D)> {
        self.nodes
            .iter()
            .filter_map(|node| node.parent.map(|p| (self.nodes[p.0].pose, node.pose)))
            .collect()
    }
}

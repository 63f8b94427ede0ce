use crate::types::NodeId;
use glam::Vec3;

/// Distance under which a candidate is considered the same as an existing child.
pub const DUPLICATE_EPSILON: f32 = 1e-4;

#[derive(Clone, Debug, PartialEq)]
pub struct SkeletonNode {
    pub pos: Vec3,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub normal: Vec3,
}

/// Append-only arena of skeleton nodes. Index 0 is the root.
#[derive(Clone, Debug, PartialEq)]
pub struct Skeleton {
    pub nodes: Vec<SkeletonNode>,
}

impl SkeletonNode {
    pub fn new_root(pos: Vec3) -> Self {
        Self {
            pos,
            parent: None,
            children: Vec::with_capacity(4),
            normal: Vec3::ZERO,
        }
    }

    pub fn new_child(pos: Vec3, parent: NodeId) -> Self {
        Self {
            pos,
            parent: Some(parent),
            children: Vec::with_capacity(4),
            normal: Vec3::ZERO,
        }
    }
}

impl Skeleton {
    pub fn new(root_pos: Vec3) -> Self {
        Self {
            nodes: vec![SkeletonNode::new_root(root_pos)],
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> &SkeletonNode {
        &self.nodes[0]
    }

    pub fn add_child(&mut self, parent: NodeId, pos: Vec3) -> NodeId {
        let id: NodeId = self.nodes.len();
        self.nodes.push(SkeletonNode::new_child(pos, parent));
        self.nodes[parent].children.push(id);
        id
    }

    /// Returns `true` if some child of `id` lies within `eps` of `pos`.
    pub fn has_child_near(&self, id: NodeId, pos: Vec3, eps: f32) -> bool {
        self.nodes[id]
            .children
            .iter()
            .any(|&c| self.nodes[c].pos.distance(pos) <= eps)
    }

    /// Moves the child in `slot` of `from`'s child list over to `to`.
    ///
    /// The slot is filled by the last child of `from`, so the order of the
    /// remaining children is not preserved.
    ///
    /// ### Returns
    /// The id of the moved child.
    pub fn reparent(&mut self, from: NodeId, slot: usize, to: NodeId) -> NodeId {
        let child = self.nodes[from].children.swap_remove(slot);
        self.nodes[to].children.push(child);
        self.nodes[child].parent = Some(to);
        child
    }

    /// Number of parent hops from `id` to the root, or `None` if the chain
    /// does not reach a parentless node within `len()` hops.
    pub fn depth(&self, id: NodeId) -> Option<usize> {
        let mut hops = 0;
        let mut cur = id;
        while let Some(p) = self.nodes[cur].parent {
            hops += 1;
            if hops > self.nodes.len() {
                return None;
            }
            cur = p;
        }
        Some(hops)
    }

    /// Axis-aligned bounds of all node positions, as `(min, max)`.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = self.nodes.first()?.pos;
        Some(
            self.nodes
                .iter()
                .fold((first, first), |(lo, hi), n| (lo.min(n.pos), hi.max(n.pos))),
        )
    }
}

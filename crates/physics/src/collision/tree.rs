//! # Dynamic Bounding Volume Tree
//!
//! Broad-phase acceleration structure: one fattened AABB per body, kept in a
//! balanced binary tree that is restructured incrementally as bodies move.
//! Nodes live in a flat arena addressed by integer index with a free list for
//! recycled slots, so parent/child cycles never become an ownership problem.
//!
//! A node is exactly one of: leaf (owning body, no children), internal
//! (exactly two children, no body), or free. Internal AABBs are the union of
//! their children; leaf AABBs are the body's tight box expanded by a fixed
//! margin so that small motions do not force a remove/insert every step.

use std::collections::HashMap;

use glam::Vec2;
use tracing::trace;

use crate::aabb::Aabb;
use crate::body::{Body, BodyId};

const NULL: i32 = -1;

/// Default fat-box margin added around every leaf.
pub const DEFAULT_MARGIN: f32 = 0.1;

#[derive(Clone, Debug)]
struct Node {
    body: Option<BodyId>,
    aabb: Aabb,
    /// Tight (unfattened) box, tracked for leaves only.
    tight: Aabb,
    parent: i32,
    left: i32,
    right: i32,
    height: i32,
}

impl Node {
    fn is_leaf(&self) -> bool {
        self.left == NULL
    }
}

/// Incrementally maintained broad-phase tree over a set of bodies.
#[derive(Clone, Debug)]
pub struct DynamicTree {
    nodes: Vec<Node>,
    root: i32,
    free: Vec<i32>,
    leaves: HashMap<BodyId, i32>,
    margin: f32,
}

impl Default for DynamicTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicTree {
    /// Create an empty tree with the default fat margin.
    #[must_use]
    pub fn new() -> Self {
        Self::with_margin(DEFAULT_MARGIN)
    }

    /// Create an empty tree with a custom fat margin.
    #[must_use]
    pub fn with_margin(margin: f32) -> Self {
        Self {
            nodes: Vec::new(),
            root: NULL,
            free: Vec::new(),
            leaves: HashMap::new(),
            margin,
        }
    }

    /// Number of tracked bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// Whether the tree tracks no bodies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Insert a body, creating a fattened leaf for it.
    ///
    /// Inserting a body that is already present refreshes its leaf instead.
    pub fn insert(&mut self, body: &Body) {
        if self.leaves.contains_key(&body.id) {
            self.update(body);
            return;
        }
        let tight = Aabb::from_body(body);
        let leaf = self.alloc_node(tight.expand(self.margin), tight, Some(body.id));
        self.leaves.insert(body.id, leaf);
        self.insert_leaf(leaf);
        trace!(body = body.id, nodes = self.nodes.len(), "tree insert");
    }

    /// Remove a body's leaf. Unknown bodies are a no-op.
    pub fn remove(&mut self, id: BodyId) {
        let Some(leaf) = self.leaves.remove(&id) else {
            return;
        };
        self.remove_leaf(leaf);
        self.free_node(leaf);
        trace!(body = id, "tree remove");
    }

    /// Refresh a body's leaf after motion.
    ///
    /// Only re-inserts when the tight box has escaped the fattened leaf box;
    /// unknown bodies are a no-op.
    pub fn update(&mut self, body: &Body) {
        let Some(&leaf) = self.leaves.get(&body.id) else {
            return;
        };
        let tight = Aabb::from_body(body);
        if self.nodes[leaf as usize].aabb.contains(&tight) {
            self.nodes[leaf as usize].tight = tight;
            return;
        }
        self.remove_leaf(leaf);
        {
            let node = &mut self.nodes[leaf as usize];
            node.aabb = tight.expand(self.margin);
            node.tight = tight;
        }
        self.insert_leaf(leaf);
        trace!(body = body.id, "tree leaf refit");
    }

    /// All bodies whose fattened leaf box overlaps `aabb`.
    #[must_use]
    pub fn query(&self, aabb: &Aabb) -> Vec<BodyId> {
        let mut out = Vec::new();
        let mut stack = Vec::new();
        if self.root != NULL {
            stack.push(self.root);
        }
        while let Some(i) = stack.pop() {
            let node = &self.nodes[i as usize];
            if !node.aabb.overlaps(aabb) {
                continue;
            }
            if let Some(body) = node.body {
                out.push(body);
            } else {
                stack.push(node.left);
                stack.push(node.right);
            }
        }
        out
    }

    /// All other bodies whose fattened leaf box overlaps this body's.
    #[must_use]
    pub fn query_body(&self, body: &Body) -> Vec<BodyId> {
        let aabb = Aabb::from_body(body).expand(self.margin);
        let mut out = self.query(&aabb);
        out.retain(|&id| id != body.id);
        out
    }

    /// All bodies whose fattened leaf box is crossed by the ray.
    #[must_use]
    pub fn raycast(&self, origin: Vec2, dir: Vec2) -> Vec<BodyId> {
        let mut out = Vec::new();
        let mut stack = Vec::new();
        if self.root != NULL {
            stack.push(self.root);
        }
        while let Some(i) = stack.pop() {
            let node = &self.nodes[i as usize];
            if !node.aabb.raycast(origin, dir) {
                continue;
            }
            if let Some(body) = node.body {
                out.push(body);
            } else {
                stack.push(node.left);
                stack.push(node.right);
            }
        }
        out
    }

    /// Candidate collision pairs: bodies whose tight boxes overlap.
    ///
    /// A top-down dual descent prunes subtrees whose fattened AABBs do not
    /// overlap; each surviving leaf pair is emitted once, lower id first.
    #[must_use]
    pub fn generate(&self) -> Vec<(BodyId, BodyId)> {
        let mut out = Vec::new();
        if self.root != NULL {
            self.pairs_within(self.root, &mut out);
        }
        out
    }

    fn pairs_within(&self, i: i32, out: &mut Vec<(BodyId, BodyId)>) {
        let node = &self.nodes[i as usize];
        if node.is_leaf() {
            return;
        }
        self.pairs_between(node.left, node.right, out);
        self.pairs_within(node.left, out);
        self.pairs_within(node.right, out);
    }

    fn pairs_between(&self, a: i32, b: i32, out: &mut Vec<(BodyId, BodyId)>) {
        let na = &self.nodes[a as usize];
        let nb = &self.nodes[b as usize];
        if !na.aabb.overlaps(&nb.aabb) {
            return;
        }
        match (na.body, nb.body) {
            (Some(ba), Some(bb)) => {
                if na.tight.overlaps(&nb.tight) {
                    out.push((ba.min(bb), ba.max(bb)));
                }
            }
            (Some(_), None) => {
                self.pairs_between(a, nb.left, out);
                self.pairs_between(a, nb.right, out);
            }
            _ => {
                self.pairs_between(na.left, b, out);
                self.pairs_between(na.right, b, out);
            }
        }
    }

    fn alloc_node(&mut self, aabb: Aabb, tight: Aabb, body: Option<BodyId>) -> i32 {
        let node = Node {
            body,
            aabb,
            tight,
            parent: NULL,
            left: NULL,
            right: NULL,
            height: 0,
        };
        if let Some(i) = self.free.pop() {
            self.nodes[i as usize] = node;
            i
        } else {
            self.nodes.push(node);
            i32::try_from(self.nodes.len() - 1).expect("tree node count exceeds i32")
        }
    }

    fn free_node(&mut self, i: i32) {
        let node = &mut self.nodes[i as usize];
        node.body = None;
        node.parent = NULL;
        node.left = NULL;
        node.right = NULL;
        node.height = -1;
        self.free.push(i);
    }

    fn insert_leaf(&mut self, leaf: i32) {
        if self.root == NULL {
            self.root = leaf;
            self.nodes[leaf as usize].parent = NULL;
            return;
        }

        // Find the sibling that minimizes total perimeter cost. The descent
        // prunes a subtree as soon as creating the new parent right here is
        // cheaper than the lower bound of descending further.
        let leaf_aabb = self.nodes[leaf as usize].aabb;
        let mut index = self.root;
        while !self.nodes[index as usize].is_leaf() {
            let node = &self.nodes[index as usize];
            let left = node.left;
            let right = node.right;

            let area = node.aabb.perimeter();
            let combined = Aabb::unite(&node.aabb, &leaf_aabb).perimeter();
            let cost_here = 2.0 * combined;
            let inheritance = 2.0 * (combined - area);

            let descend_cost = |child: i32| -> f32 {
                let c = &self.nodes[child as usize];
                let united = Aabb::unite(&c.aabb, &leaf_aabb).perimeter();
                if c.is_leaf() {
                    united + inheritance
                } else {
                    (united - c.aabb.perimeter()) + inheritance
                }
            };
            let cost_left = descend_cost(left);
            let cost_right = descend_cost(right);

            if cost_here < cost_left && cost_here < cost_right {
                break;
            }
            index = if cost_left < cost_right { left } else { right };
        }
        let sibling = index;

        // Splice a new internal parent above the chosen sibling.
        let old_parent = self.nodes[sibling as usize].parent;
        let merged = Aabb::unite(&self.nodes[sibling as usize].aabb, &leaf_aabb);
        let new_parent = self.alloc_node(merged, merged, None);
        self.nodes[new_parent as usize].parent = old_parent;
        self.nodes[new_parent as usize].height = self.nodes[sibling as usize].height + 1;
        self.nodes[new_parent as usize].left = sibling;
        self.nodes[new_parent as usize].right = leaf;
        self.nodes[sibling as usize].parent = new_parent;
        self.nodes[leaf as usize].parent = new_parent;

        if old_parent == NULL {
            self.root = new_parent;
        } else if self.nodes[old_parent as usize].left == sibling {
            self.nodes[old_parent as usize].left = new_parent;
        } else {
            self.nodes[old_parent as usize].right = new_parent;
        }

        self.refit_upward(self.nodes[leaf as usize].parent);
    }

    fn remove_leaf(&mut self, leaf: i32) {
        if leaf == self.root {
            self.root = NULL;
            return;
        }
        let parent = self.nodes[leaf as usize].parent;
        let grandparent = self.nodes[parent as usize].parent;
        let sibling = if self.nodes[parent as usize].left == leaf {
            self.nodes[parent as usize].right
        } else {
            self.nodes[parent as usize].left
        };

        // Elevate the sibling into the vacated parent slot.
        if grandparent == NULL {
            self.root = sibling;
            self.nodes[sibling as usize].parent = NULL;
            self.free_node(parent);
        } else {
            if self.nodes[grandparent as usize].left == parent {
                self.nodes[grandparent as usize].left = sibling;
            } else {
                self.nodes[grandparent as usize].right = sibling;
            }
            self.nodes[sibling as usize].parent = grandparent;
            self.free_node(parent);
            self.refit_upward(grandparent);
        }
    }

    /// Rebalance and re-derive AABB/height for every ancestor, bottom-up.
    fn refit_upward(&mut self, mut index: i32) {
        while index != NULL {
            index = self.balance(index);
            let left = self.nodes[index as usize].left;
            let right = self.nodes[index as usize].right;
            let node_height =
                1 + self.nodes[left as usize].height.max(self.nodes[right as usize].height);
            let merged = Aabb::unite(
                &self.nodes[left as usize].aabb,
                &self.nodes[right as usize].aabb,
            );
            let node = &mut self.nodes[index as usize];
            node.height = node_height;
            node.aabb = merged;
            node.tight = merged;
            index = node.parent;
        }
    }

    /// AVL rotation at `a` when its subtrees differ in height by more than
    /// one. Covers the LL/LR/RL/RR cases; returns the new subtree root.
    fn balance(&mut self, a: i32) -> i32 {
        let node_a = &self.nodes[a as usize];
        if node_a.is_leaf() || node_a.height < 2 {
            return a;
        }
        let b = node_a.left;
        let c = node_a.right;
        let balance = self.nodes[c as usize].height - self.nodes[b as usize].height;

        if balance > 1 {
            self.rotate_up(a, c, b)
        } else if balance < -1 {
            self.rotate_up(a, b, c)
        } else {
            a
        }
    }

    /// Rotate child `up` above `a`; `other` is a's remaining child.
    fn rotate_up(&mut self, a: i32, up: i32, other: i32) -> i32 {
        let f = self.nodes[up as usize].left;
        let g = self.nodes[up as usize].right;
        let a_parent = self.nodes[a as usize].parent;

        self.nodes[up as usize].left = a;
        self.nodes[up as usize].parent = a_parent;
        self.nodes[a as usize].parent = up;

        if a_parent == NULL {
            self.root = up;
        } else if self.nodes[a_parent as usize].left == a {
            self.nodes[a_parent as usize].left = up;
        } else {
            self.nodes[a_parent as usize].right = up;
        }

        // The taller grandchild stays under the promoted node.
        let (keep, give) = if self.nodes[f as usize].height > self.nodes[g as usize].height {
            (f, g)
        } else {
            (g, f)
        };
        self.nodes[up as usize].right = keep;
        self.nodes[keep as usize].parent = up;

        self.nodes[a as usize].left = other;
        self.nodes[a as usize].right = give;
        self.nodes[give as usize].parent = a;

        self.refit_node(a);
        self.refit_node(up);
        up
    }

    fn refit_node(&mut self, i: i32) {
        let left = self.nodes[i as usize].left;
        let right = self.nodes[i as usize].right;
        let height = 1 + self.nodes[left as usize].height.max(self.nodes[right as usize].height);
        let merged = Aabb::unite(
            &self.nodes[left as usize].aabb,
            &self.nodes[right as usize].aabb,
        );
        let node = &mut self.nodes[i as usize];
        node.height = height;
        node.aabb = merged;
        node.tight = merged;
    }

    /// Check every structural invariant; used by tests and debug assertions.
    #[must_use]
    pub fn validate(&self) -> bool {
        if self.root == NULL {
            return self.leaves.is_empty();
        }
        self.nodes[self.root as usize].parent == NULL && self.validate_node(self.root)
    }

    fn validate_node(&self, i: i32) -> bool {
        let node = &self.nodes[i as usize];
        if node.is_leaf() {
            return node.right == NULL && node.body.is_some() && node.height == 0;
        }
        if node.body.is_some() || node.left == NULL || node.right == NULL {
            return false;
        }
        let left = &self.nodes[node.left as usize];
        let right = &self.nodes[node.right as usize];
        if left.parent != i || right.parent != i {
            return false;
        }
        if (left.height - right.height).abs() > 1 {
            return false;
        }
        if node.height != 1 + left.height.max(right.height) {
            return false;
        }
        let merged = Aabb::unite(&left.aabb, &right.aabb);
        let close = (merged.center - node.aabb.center).length() < 1e-3
            && (merged.half_width - node.aabb.half_width).abs() < 1e-3
            && (merged.half_height - node.aabb.half_height).abs() < 1e-3;
        close && self.validate_node(node.left) && self.validate_node(node.right)
    }

    /// Fattened leaf box for a body, if it is tracked.
    #[must_use]
    pub fn leaf_aabb(&self, id: BodyId) -> Option<Aabb> {
        self.leaves.get(&id).map(|&i| self.nodes[i as usize].aabb)
    }
}

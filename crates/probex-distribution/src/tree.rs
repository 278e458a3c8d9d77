//! Red-black tree keyed by weight and augmented with subtree weight sums.
//!
//! Every node stores `sum = left.sum + weight + right.sum`. That makes the
//! weighted-random draw a single root-to-node descent: a point drawn from
//! `[0, root.sum)` lands in exactly one node's interval
//! `[left.sum, left.sum + weight)` relative to its own subtree.
//!
//! ```text
//!                 (w=0.4, sum=1.0)
//!                /                \
//!     (w=0.1, sum=0.1)      (w=0.5, sum=0.5)
//!
//!   draw 0.05  -> left.sum = 0.1 > 0.05       -> go left, take 0.1
//!   draw 0.30  -> 0.1 <= 0.30 <= 0.1 + 0.4    -> take root
//!   draw 0.70  -> 0.70 > 0.5, subtract 0.5    -> go right with 0.20
//! ```
//!
//! Keys are not unique. Insertion sends `<` left and `>=` right, so equal
//! weights are placed after the ones already present and the rightmost node
//! is always the most recently inserted maximum.
//!
//! Nodes live in an arena; index [`NIL`] is the shared black sentinel leaf
//! whose `sum` is always zero. The insert and delete fixups follow Cormen,
//! Leiserson and Rivest, with the two sums touched by each rotation repaired
//! in place.

use crate::weighted::Weighted;
use crate::{check_weight, Distribution, DistributionError};
use rand::Rng;

/// Index of the sentinel leaf.
const NIL: usize = 0;

struct Node<E> {
    element: Option<E>,
    weight: f64,
    sum: f64,
    left: usize,
    right: usize,
    parent: usize,
    red: bool,
}

impl<E> Node<E> {
    fn leaf() -> Self {
        Self {
            element: None,
            weight: 0.0,
            sum: 0.0,
            left: NIL,
            right: NIL,
            parent: NIL,
            red: false,
        }
    }
}

/// A [`Distribution`] backed by a weight-augmented red-black tree.
pub struct WeightedTree<E> {
    nodes: Vec<Node<E>>,
    /// Arena slots released by removals, reused by later insertions.
    free: Vec<usize>,
    root: usize,
    len: usize,
}

impl<E> WeightedTree<E> {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::leaf()],
            free: Vec::new(),
            root: NIL,
            len: 0,
        }
    }

    /// Number of elements stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Sum of all stored weights.
    pub fn total_weight(&self) -> f64 {
        self.nodes[self.root].sum
    }

    fn alloc(&mut self, element: E, weight: f64) -> usize {
        let node = Node {
            element: Some(element),
            weight,
            sum: weight,
            left: NIL,
            right: NIL,
            parent: NIL,
            red: true,
        };
        match self.free.pop() {
            Some(index) => {
                self.nodes[index] = node;
                index
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, index: usize) -> Option<E> {
        let element = self.nodes[index].element.take();
        self.nodes[index] = Node::leaf();
        self.free.push(index);
        element
    }

    fn is_red(&self, index: usize) -> bool {
        self.nodes[index].red
    }

    /// Colour a node. The sentinel stays black whatever is requested.
    fn set_red(&mut self, index: usize, red: bool) {
        if index != NIL {
            self.nodes[index].red = red;
        }
    }

    fn update_sum(&mut self, index: usize) {
        let node = &self.nodes[index];
        let sum = self.nodes[node.left].sum + node.weight + self.nodes[node.right].sum;
        self.nodes[index].sum = sum;
    }

    /// Recompute sums from `index` up to the root.
    fn update_sums_upward(&mut self, mut index: usize) {
        while index != NIL {
            self.update_sum(index);
            index = self.nodes[index].parent;
        }
    }

    fn replace_child(&mut self, parent: usize, old: usize, new: usize) {
        if parent == NIL {
            self.root = new;
        } else if self.nodes[parent].left == old {
            self.nodes[parent].left = new;
        } else {
            self.nodes[parent].right = new;
        }
    }

    fn rotate_left(&mut self, node: usize) {
        let parent = self.nodes[node].parent;
        let child = self.nodes[node].right;
        let inner = self.nodes[child].left;

        self.nodes[node].right = inner;
        if inner != NIL {
            self.nodes[inner].parent = node;
        }
        self.nodes[child].parent = parent;
        self.replace_child(parent, node, child);
        self.nodes[child].left = node;
        self.nodes[node].parent = child;

        // node is now below child
        self.update_sum(node);
        self.update_sum(child);
    }

    fn rotate_right(&mut self, node: usize) {
        let parent = self.nodes[node].parent;
        let child = self.nodes[node].left;
        let inner = self.nodes[child].right;

        self.nodes[node].left = inner;
        if inner != NIL {
            self.nodes[inner].parent = node;
        }
        self.nodes[child].parent = parent;
        self.replace_child(parent, node, child);
        self.nodes[child].right = node;
        self.nodes[node].parent = child;

        self.update_sum(node);
        self.update_sum(child);
    }

    fn insert(&mut self, element: E, weight: f64) {
        let mut parent = NIL;
        let mut current = self.root;
        while current != NIL {
            parent = current;
            current = if weight < self.nodes[current].weight {
                self.nodes[current].left
            } else {
                self.nodes[current].right
            };
        }

        let node = self.alloc(element, weight);
        self.nodes[node].parent = parent;
        if parent == NIL {
            self.root = node;
        } else if weight < self.nodes[parent].weight {
            self.nodes[parent].left = node;
        } else {
            self.nodes[parent].right = node;
        }
        self.len += 1;

        self.update_sums_upward(parent);
        self.insert_fixup(node);
    }

    fn insert_fixup(&mut self, mut node: usize) {
        while self.is_red(self.nodes[node].parent) {
            let parent = self.nodes[node].parent;
            let grandparent = self.nodes[parent].parent;
            if parent == self.nodes[grandparent].left {
                let aunt = self.nodes[grandparent].right;
                if self.is_red(aunt) {
                    self.set_red(parent, false);
                    self.set_red(aunt, false);
                    self.set_red(grandparent, true);
                    node = grandparent;
                } else {
                    if node == self.nodes[parent].right {
                        node = parent;
                        self.rotate_left(node);
                    }
                    let parent = self.nodes[node].parent;
                    self.set_red(parent, false);
                    self.set_red(grandparent, true);
                    self.rotate_right(grandparent);
                }
            } else {
                let aunt = self.nodes[grandparent].left;
                if self.is_red(aunt) {
                    self.set_red(parent, false);
                    self.set_red(aunt, false);
                    self.set_red(grandparent, true);
                    node = grandparent;
                } else {
                    if node == self.nodes[parent].left {
                        node = parent;
                        self.rotate_right(node);
                    }
                    let parent = self.nodes[node].parent;
                    self.set_red(parent, false);
                    self.set_red(grandparent, true);
                    self.rotate_left(grandparent);
                }
            }
        }
        let root = self.root;
        self.set_red(root, false);
    }

    /// Locate the node whose interval contains a uniform point of
    /// `[0, root.sum)`.
    fn locate_random<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let mut choice = self.nodes[self.root].sum * rng.gen::<f64>();
        let mut current = self.root;
        loop {
            let node = &self.nodes[current];
            let left_sum = self.nodes[node.left].sum;
            if choice < left_sum {
                current = node.left;
            } else if choice > left_sum + node.weight && node.right != NIL {
                choice -= left_sum + node.weight;
                current = node.right;
            } else {
                return current;
            }
        }
    }

    fn locate_max(&self) -> usize {
        let mut current = self.root;
        while self.nodes[current].right != NIL {
            current = self.nodes[current].right;
        }
        current
    }

    /// Unlink `target` from the tree and return its payload.
    fn delete(&mut self, target: usize) -> Result<Weighted<E>, DistributionError> {
        // A node with two children trades places with its in-order successor,
        // which has at most one child and is the node physically unlinked.
        let mut removed = target;
        if self.nodes[target].left != NIL && self.nodes[target].right != NIL {
            removed = self.nodes[target].right;
            while self.nodes[removed].left != NIL {
                removed = self.nodes[removed].left;
            }
        }

        let child = if self.nodes[removed].left != NIL {
            self.nodes[removed].left
        } else {
            self.nodes[removed].right
        };

        let mut parent = self.nodes[removed].parent;
        if child != NIL {
            self.nodes[child].parent = parent;
        }
        self.replace_child(parent, removed, child);

        // The unlinked slot ends up carrying the target's payload.
        if removed != target {
            let successor = self.nodes[removed].element.take();
            let successor_weight = self.nodes[removed].weight;
            let element = std::mem::replace(&mut self.nodes[target].element, successor);
            let weight = std::mem::replace(&mut self.nodes[target].weight, successor_weight);
            self.nodes[removed].element = element;
            self.nodes[removed].weight = weight;
        }

        // target, when it differs from removed, is an ancestor of parent
        self.update_sums_upward(parent);

        if !self.is_red(removed) {
            let mut fix = child;
            while fix != self.root && !self.is_red(fix) {
                if self.nodes[parent].left == fix {
                    let mut sibling = self.nodes[parent].right;
                    if self.is_red(sibling) {
                        self.set_red(sibling, false);
                        self.set_red(parent, true);
                        self.rotate_left(parent);
                        sibling = self.nodes[parent].right;
                    }
                    let near = self.nodes[sibling].left;
                    let far = self.nodes[sibling].right;
                    if !self.is_red(near) && !self.is_red(far) {
                        self.set_red(sibling, true);
                        fix = parent;
                        parent = self.nodes[fix].parent;
                    } else {
                        if !self.is_red(far) {
                            self.set_red(near, false);
                            self.set_red(sibling, true);
                            self.rotate_right(sibling);
                            sibling = self.nodes[parent].right;
                        }
                        let parent_red = self.is_red(parent);
                        self.set_red(sibling, parent_red);
                        self.set_red(parent, false);
                        let far = self.nodes[sibling].right;
                        self.set_red(far, false);
                        self.rotate_left(parent);
                        fix = self.root;
                    }
                } else {
                    let mut sibling = self.nodes[parent].left;
                    if self.is_red(sibling) {
                        self.set_red(sibling, false);
                        self.set_red(parent, true);
                        self.rotate_right(parent);
                        sibling = self.nodes[parent].left;
                    }
                    let near = self.nodes[sibling].right;
                    let far = self.nodes[sibling].left;
                    if !self.is_red(near) && !self.is_red(far) {
                        self.set_red(sibling, true);
                        fix = parent;
                        parent = self.nodes[fix].parent;
                    } else {
                        if !self.is_red(far) {
                            self.set_red(near, false);
                            self.set_red(sibling, true);
                            self.rotate_left(sibling);
                            sibling = self.nodes[parent].left;
                        }
                        let parent_red = self.is_red(parent);
                        self.set_red(sibling, parent_red);
                        self.set_red(parent, false);
                        let far = self.nodes[sibling].left;
                        self.set_red(far, false);
                        self.rotate_right(parent);
                        fix = self.root;
                    }
                }
            }
            self.set_red(fix, false);
        }

        let weight = self.nodes[removed].weight;
        self.len -= 1;
        let element = self.release(removed).ok_or(DistributionError::Empty)?;
        Ok(Weighted::new(element, weight))
    }

    /// Verify the red-black and sum-augmentation invariants.
    ///
    /// Returns the black height of the tree on success. Intended for tests
    /// and debugging; walks the whole tree.
    pub fn check_invariants(&self) -> Result<usize, String> {
        if self.is_red(self.root) {
            return Err("root is red".to_string());
        }
        if self.nodes[NIL].red || self.nodes[NIL].sum != 0.0 {
            return Err("sentinel leaf was modified".to_string());
        }
        if self.root != NIL && self.nodes[self.root].parent != NIL {
            return Err("root has a parent".to_string());
        }
        let (height, count) = self.check_subtree(self.root)?;
        if count != self.len {
            return Err(format!("len is {} but tree holds {}", self.len, count));
        }
        Ok(height)
    }

    fn check_subtree(&self, index: usize) -> Result<(usize, usize), String> {
        if index == NIL {
            return Ok((1, 0));
        }
        let node = &self.nodes[index];
        if node.element.is_none() {
            return Err(format!("node {index} has no element"));
        }
        for child in [node.left, node.right] {
            if child != NIL && self.nodes[child].parent != index {
                return Err(format!("node {child} has a stale parent link"));
            }
        }
        if node.left != NIL && self.nodes[node.left].weight > node.weight {
            return Err(format!("node {index} has a heavier left child"));
        }
        if node.right != NIL && self.nodes[node.right].weight < node.weight {
            return Err(format!("node {index} has a right child that is lighter"));
        }
        if node.red && (self.is_red(node.left) || self.is_red(node.right)) {
            return Err(format!("red node {index} has a red child"));
        }

        let (left_height, left_count) = self.check_subtree(node.left)?;
        let (right_height, right_count) = self.check_subtree(node.right)?;
        if left_height != right_height {
            return Err(format!(
                "node {index} has black heights {left_height} and {right_height}"
            ));
        }

        let expected = self.nodes[node.left].sum + node.weight + self.nodes[node.right].sum;
        if (node.sum - expected).abs() > 1e-9 * expected.abs().max(1.0) {
            return Err(format!(
                "node {index} has sum {} but children give {expected}",
                node.sum
            ));
        }

        let height = left_height + usize::from(!node.red);
        Ok((height, left_count + right_count + 1))
    }
}

impl<E> Default for WeightedTree<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Distribution<E> for WeightedTree<E> {
    fn is_empty(&self) -> bool {
        self.root == NIL
    }

    fn add(&mut self, element: E, weight: f64) -> Result<(), DistributionError> {
        check_weight(weight)?;
        self.insert(element, weight);
        Ok(())
    }

    fn remove<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Weighted<E>, DistributionError> {
        if self.is_empty() {
            return Err(DistributionError::Empty);
        }
        let target = self.locate_random(rng);
        self.delete(target)
    }

    fn remove_max(&mut self) -> Result<Weighted<E>, DistributionError> {
        if self.is_empty() {
            return Err(DistributionError::Empty);
        }
        let target = self.locate_max();
        self.delete(target)
    }
}

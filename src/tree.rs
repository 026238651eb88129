//! Arena-based node storage for the scene graph.
//!
//! The Tree owns every node of the scene using a sparse-set architecture
//! with generational indices. Parent links are plain ids, so the only
//! owning relationship is the parent's ordered child list.
//!
//! ## Key Features
//!
//! - **Generational Indices**: NodeId contains index + generation so a stale
//!   id never resolves to a node that later reused the same slot.
//!
//! - **Dense Storage**: Nodes stored contiguously; the sparse map gives O(1)
//!   lookup from a stable NodeId to its dense slot.
//!
//! - **Swap-Remove**: O(1) removal without creating holes in dense storage.
//!
//! - **Single Owner**: every attach first detaches the child from its previous
//!   parent, and attaching a node under its own descendant is refused.

/// Unique identifier for a node in the tree.
///
/// - `index`: Position in the sparse array (reusable after removal)
/// - `generation`: Version counter that increments when a slot is reused
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

/// Entry in the sparse map, pointing to a dense array slot.
struct SparseEntry {
    dense_index: usize,
    generation: u32,
}

struct Slot<T> {
    value: T,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Back-pointer to sparse array index (for swap-remove fixup)
    sparse_index: u32,
}

pub struct Tree<T> {
    dense: Vec<Slot<T>>,
    sparse: Vec<Option<SparseEntry>>,
    free_indices: Vec<u32>,
    /// Last known generation per sparse slot, so reuse bumps it.
    generations: Vec<u32>,
}

impl<T> Tree<T> {
    pub fn new() -> Self {
        Self {
            dense: Vec::new(),
            sparse: Vec::new(),
            free_indices: Vec::new(),
            generations: Vec::new(),
        }
    }

    /// Store a detached value and return its id.
    pub fn insert(&mut self, value: T) -> NodeId {
        let (sparse_index, generation) = if let Some(idx) = self.free_indices.pop() {
            let generation = self.generations[idx as usize].wrapping_add(1);
            self.generations[idx as usize] = generation;
            (idx, generation)
        } else {
            let idx = self.sparse.len() as u32;
            self.sparse.push(None);
            self.generations.push(0);
            (idx, 0)
        };

        let dense_index = self.dense.len();
        self.dense.push(Slot {
            value,
            parent: None,
            children: Vec::new(),
            sparse_index,
        });
        self.sparse[sparse_index as usize] = Some(SparseEntry {
            dense_index,
            generation,
        });

        NodeId::new(sparse_index, generation)
    }

    /// Remove a node and its whole subtree. Returns the number of removed
    /// nodes (0 for a stale id).
    pub fn remove(&mut self, id: NodeId) -> usize {
        if !self.contains(id) {
            return 0;
        }
        self.detach(id);
        let doomed = self.descendants(id);
        for &node in &doomed {
            self.remove_slot(node);
        }
        doomed.len()
    }

    fn remove_slot(&mut self, id: NodeId) {
        let dense_index = match self.dense_index(id) {
            Some(idx) => idx,
            None => return,
        };
        let last_dense_index = self.dense.len() - 1;
        self.dense.swap_remove(dense_index);

        if dense_index != last_dense_index {
            let moved_sparse_idx = self.dense[dense_index].sparse_index;
            if let Some(ref mut entry) = self.sparse[moved_sparse_idx as usize] {
                entry.dense_index = dense_index;
            }
        }

        self.sparse[id.index as usize] = None;
        self.free_indices.push(id.index);
    }

    fn dense_index(&self, id: NodeId) -> Option<usize> {
        self.sparse
            .get(id.index as usize)
            .and_then(|e| e.as_ref())
            .filter(|e| e.generation == id.generation)
            .map(|e| e.dense_index)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.dense_index(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.dense_index(id).map(|idx| &self.dense[idx].value)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.dense_index(id).map(|idx| &mut self.dense[idx].value)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.dense_index(id).and_then(|idx| self.dense[idx].parent)
    }

    /// Children in document order. Empty for stale ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.dense_index(id) {
            Some(idx) => &self.dense[idx].children,
            None => &[],
        }
    }

    pub fn index_of(&self, child: NodeId) -> Option<usize> {
        let parent = self.parent(child)?;
        self.children(parent).iter().position(|&c| c == child)
    }

    /// Whether `ancestor` is a strict ancestor of `node`.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    /// Ancestors from the direct parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(p) = current {
            out.push(p);
            current = self.parent(p);
        }
        out
    }

    /// The node itself followed by its whole subtree in pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Unlink a node from its parent. Returns the old parent and index.
    pub fn detach(&mut self, child: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(child)?;
        let index = self.index_of(child)?;
        if let Some(parent_dense) = self.dense_index(parent) {
            self.dense[parent_dense].children.remove(index);
        }
        if let Some(child_dense) = self.dense_index(child) {
            self.dense[child_dense].parent = None;
        }
        Some((parent, index))
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let len = self.children(parent).len();
        self.insert_child(parent, child, len)
    }

    /// Attach `child` under `parent` at `index` (clamped to the child count),
    /// detaching it from any previous parent first.
    ///
    /// Refuses to create a cycle or to touch stale ids.
    pub fn insert_child(&mut self, parent: NodeId, child: NodeId, index: usize) -> bool {
        if parent == child
            || !self.contains(parent)
            || !self.contains(child)
            || self.is_ancestor(child, parent)
        {
            return false;
        }
        self.detach(child);
        let Some(parent_dense) = self.dense_index(parent) else {
            return false;
        };
        let children = &mut self.dense[parent_dense].children;
        let index = index.min(children.len());
        children.insert(index, child);
        if let Some(child_dense) = self.dense_index(child) {
            self.dense[child_dense].parent = Some(parent);
        }
        true
    }

    /// Move a child to a new position among its siblings.
    pub fn move_child(&mut self, child: NodeId, index: usize) -> bool {
        match self.parent(child) {
            Some(parent) => self.insert_child(parent, child, index),
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.dense.clear();
        self.sparse.clear();
        self.free_indices.clear();
        self.generations.clear();
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_single_owner(tree: &Tree<&'static str>, root: NodeId) {
        for node in tree.descendants(root) {
            if node == root {
                continue;
            }
            let parent = tree.parent(node).expect("non-root node has a parent");
            let count = tree.children(parent).iter().filter(|&&c| c == node).count();
            assert_eq!(count, 1);
        }
    }

    #[test]
    fn test_tree_insert_remove() {
        let mut tree = Tree::new();
        let id = tree.insert("a");
        assert!(tree.contains(id));
        assert_eq!(tree.remove(id), 1);
        assert!(!tree.contains(id));
    }

    #[test]
    fn test_tree_generational_index() {
        let mut tree = Tree::new();
        let id1 = tree.insert("a");
        tree.remove(id1);
        let id2 = tree.insert("b");

        assert!(!tree.contains(id1));
        assert!(tree.contains(id2));
        assert_eq!(id1.index, id2.index);
        assert_ne!(id1.generation, id2.generation);
        assert_eq!(tree.get(id1), None);
    }

    #[test]
    fn test_remove_takes_subtree() {
        let mut tree = Tree::new();
        let root = tree.insert("root");
        let a = tree.insert("a");
        let b = tree.insert("b");
        let c = tree.insert("c");
        tree.append_child(root, a);
        tree.append_child(a, b);
        tree.append_child(root, c);

        assert_eq!(tree.remove(a), 2);
        assert!(!tree.contains(b));
        assert_eq!(tree.children(root), &[c]);
        assert_eq!(tree.get(c), Some(&"c"));
    }

    #[test]
    fn test_reparent_keeps_single_owner() {
        let mut tree = Tree::new();
        let root = tree.insert("root");
        let a = tree.insert("a");
        let b = tree.insert("b");
        let leaf = tree.insert("leaf");
        tree.append_child(root, a);
        tree.append_child(root, b);
        tree.append_child(a, leaf);

        assert!(tree.insert_child(b, leaf, 0));
        assert!(tree.insert_child(a, leaf, 99));
        assert!(tree.insert_child(b, leaf, 0));

        assert_eq!(tree.parent(leaf), Some(b));
        assert!(tree.children(a).is_empty());
        assert_single_owner(&tree, root);
    }

    #[test]
    fn test_refuses_cycles() {
        let mut tree = Tree::new();
        let root = tree.insert("root");
        let a = tree.insert("a");
        let b = tree.insert("b");
        tree.append_child(root, a);
        tree.append_child(a, b);

        assert!(!tree.insert_child(b, a, 0));
        assert!(!tree.append_child(a, a));
        assert_eq!(tree.parent(a), Some(root));
    }

    #[test]
    fn test_move_within_parent() {
        let mut tree = Tree::new();
        let root = tree.insert("root");
        let ids: Vec<_> = ["a", "b", "c"].iter().map(|n| tree.insert(*n)).collect();
        for &id in &ids {
            tree.append_child(root, id);
        }
        tree.move_child(ids[2], 0);
        assert_eq!(tree.children(root), &[ids[2], ids[0], ids[1]]);
        assert_eq!(tree.index_of(ids[1]), Some(2));
    }

    #[test]
    fn test_descendants_pre_order() {
        let mut tree = Tree::new();
        let root = tree.insert("root");
        let a = tree.insert("a");
        let a1 = tree.insert("a1");
        let b = tree.insert("b");
        tree.append_child(root, a);
        tree.append_child(a, a1);
        tree.append_child(root, b);
        let names: Vec<_> = tree
            .descendants(root)
            .into_iter()
            .filter_map(|id| tree.get(id).copied())
            .collect();
        assert_eq!(names, vec!["root", "a", "a1", "b"]);
    }

    #[test]
    fn test_tree_swap_remove_fixup() {
        let mut tree = Tree::new();
        let id1 = tree.insert("1");
        let id2 = tree.insert("2");
        let id3 = tree.insert("3");

        tree.remove(id1);

        assert!(!tree.contains(id1));
        assert_eq!(tree.get(id2), Some(&"2"));
        assert_eq!(tree.get(id3), Some(&"3"));
    }
}

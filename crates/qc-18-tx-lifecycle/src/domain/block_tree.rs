//! # Block Tree
//!
//! Arena of non-pruned blocks indexed by hash. Parent links are the only
//! source of truth; child lists are derived and kept in arrival order so that
//! traversals are deterministic.
//!
//! ```text
//!            root (last finalized)
//!           /    \
//!          A      A'      <- siblings, A' pruned once A is finalized
//!          |      |
//!          B      B'
//! ```
//!
//! Bodies are fetched lazily through a caller-supplied fetcher and cached on
//! the node, so a block body is fetched at most once while it is tracked.

use super::value_objects::{BlockHash, TxId};
use crate::error::{TrackerError, TrackerResult};
use std::collections::{HashMap, HashSet};

/// Cached transaction list of a block.
#[derive(Clone, Debug, Default)]
pub struct BlockBody {
    txs: Vec<TxId>,
    index: HashSet<TxId>,
}

impl BlockBody {
    pub fn new(txs: Vec<TxId>) -> Self {
        let index = txs.iter().cloned().collect();
        Self { txs, index }
    }

    pub fn contains(&self, tx_id: &TxId) -> bool {
        self.index.contains(tx_id)
    }

    pub fn transactions(&self) -> &[TxId] {
        &self.txs
    }
}

/// A tracked block
#[derive(Clone, Debug)]
pub struct BlockNode {
    pub hash: BlockHash,
    /// Parent hash. For the root this may name an untracked ancestor.
    pub parent: Option<BlockHash>,
    /// Children in arrival order
    pub children: Vec<BlockHash>,
    body: Option<BlockBody>,
}

impl BlockNode {
    fn new(hash: BlockHash, parent: Option<BlockHash>) -> Self {
        Self {
            hash,
            parent,
            children: Vec::new(),
            body: None,
        }
    }

    pub fn has_cached_body(&self) -> bool {
        self.body.is_some()
    }
}

/// Fork tree of all live blocks.
#[derive(Debug)]
pub struct BlockTree {
    blocks: HashMap<BlockHash, BlockNode>,
    root: Option<BlockHash>,
    max_depth: usize,
}

impl BlockTree {
    pub fn new(max_depth: usize) -> Self {
        Self {
            blocks: HashMap::new(),
            root: None,
            max_depth,
        }
    }

    pub fn root(&self) -> Option<&BlockHash> {
        self.root.as_ref()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn contains(&self, hash: &BlockHash) -> bool {
        self.blocks.contains_key(hash)
    }

    pub fn get(&self, hash: &BlockHash) -> Option<&BlockNode> {
        self.blocks.get(hash)
    }

    /// Register a new block under `parent`.
    ///
    /// The first block becomes the root whatever its parent is. After that
    /// every block must name a tracked parent.
    pub fn insert(&mut self, hash: BlockHash, parent: Option<BlockHash>) -> TrackerResult<()> {
        if self.blocks.contains_key(&hash) {
            return Err(TrackerError::DuplicateBlock { block_hash: hash });
        }

        let Some(root) = self.root.clone() else {
            self.blocks
                .insert(hash.clone(), BlockNode::new(hash.clone(), parent));
            self.root = Some(hash);
            return Ok(());
        };

        let Some(parent_hash) = parent else {
            return Err(TrackerError::OrphanBlock {
                block_hash: hash,
                root,
            });
        };

        let Some(parent_node) = self.blocks.get_mut(&parent_hash) else {
            return Err(TrackerError::UnknownParent {
                block_hash: hash,
                parent: parent_hash,
            });
        };

        parent_node.children.push(hash.clone());
        self.blocks
            .insert(hash.clone(), BlockNode::new(hash, Some(parent_hash)));
        Ok(())
    }

    /// Undo the insertion of a childless block.
    ///
    /// Used to roll back a block event that failed half-way.
    pub(crate) fn detach_leaf(&mut self, hash: &BlockHash) {
        let Some(node) = self.blocks.get(hash) else {
            return;
        };
        if !node.children.is_empty() {
            return;
        }

        let parent = node.parent.clone();
        self.blocks.remove(hash);

        if self.root.as_ref() == Some(hash) {
            self.root = None;
        } else if let Some(parent) = parent.and_then(|p| self.blocks.get_mut(&p)) {
            parent.children.retain(|c| c != hash);
        }
    }

    /// Cached body of `hash`, fetching it on first access.
    pub fn body<F>(&mut self, hash: &BlockHash, fetch: F) -> TrackerResult<&BlockBody>
    where
        F: FnOnce(&BlockHash) -> TrackerResult<Vec<TxId>>,
    {
        let node = self
            .blocks
            .get_mut(hash)
            .ok_or_else(|| TrackerError::UnknownBlock {
                block_hash: hash.clone(),
            })?;

        match &mut node.body {
            Some(body) => Ok(body),
            slot @ None => Ok(slot.insert(BlockBody::new(fetch(hash)?))),
        }
    }

    /// Parent of a tracked block, if that parent is tracked too.
    fn tracked_parent(&self, hash: &BlockHash) -> Option<&BlockHash> {
        if self.root.as_ref() == Some(hash) {
            return None;
        }
        self.blocks
            .get(hash)
            .and_then(|node| node.parent.as_ref())
            .filter(|parent| self.blocks.contains_key(*parent))
    }

    /// Hashes from `hash` up to the root, `hash` first.
    pub fn path_to_root(&self, hash: &BlockHash) -> TrackerResult<Vec<BlockHash>> {
        if !self.blocks.contains_key(hash) {
            return Err(TrackerError::UnknownBlock {
                block_hash: hash.clone(),
            });
        }

        let mut path = vec![hash.clone()];
        let mut current = hash;
        while let Some(parent) = self.tracked_parent(current) {
            if path.len() >= self.max_depth {
                return Err(TrackerError::AncestryTooDeep {
                    block_hash: hash.clone(),
                    max_depth: self.max_depth,
                });
            }
            path.push(parent.clone());
            current = parent;
        }
        Ok(path)
    }

    /// Hashes from `ancestor` down to `to`, oldest first.
    ///
    /// Returns `None` when `ancestor` is not on `to`'s chain.
    pub fn path_from(
        &self,
        ancestor: &BlockHash,
        to: &BlockHash,
    ) -> TrackerResult<Option<Vec<BlockHash>>> {
        let mut path = self.path_to_root(to)?;
        let Some(pos) = path.iter().position(|h| h == ancestor) else {
            return Ok(None);
        };
        path.truncate(pos + 1);
        path.reverse();
        Ok(Some(path))
    }

    /// True if `candidate` is `of` or one of its ancestors.
    pub fn is_ancestor(&self, candidate: &BlockHash, of: &BlockHash) -> TrackerResult<bool> {
        Ok(self.path_to_root(of)?.iter().any(|h| h == candidate))
    }

    /// Blocks sharing the parent of `hash`, excluding `hash` itself.
    pub fn siblings_of(&self, hash: &BlockHash) -> Vec<BlockHash> {
        self.tracked_parent(hash)
            .and_then(|parent| self.blocks.get(parent))
            .map(|parent| {
                parent
                    .children
                    .iter()
                    .filter(|c| *c != hash)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `hash` and every tracked block below it, parents before children.
    pub fn descendants(&self, hash: &BlockHash) -> Vec<BlockHash> {
        let mut found = Vec::new();
        let mut stack = vec![hash.clone()];

        while let Some(current) = stack.pop() {
            let Some(node) = self.blocks.get(&current) else {
                continue;
            };
            stack.extend(node.children.iter().rev().cloned());
            found.push(current);
        }
        found
    }

    /// Remove `subtree_root` and all its descendants, except the subtree
    /// rooted at `excluding`.
    ///
    /// Returns the removed hashes, parents before children. If the removed
    /// subtree contained the root, the excluded block becomes the new root.
    pub fn prune(
        &mut self,
        subtree_root: &BlockHash,
        excluding: Option<&BlockHash>,
    ) -> Vec<BlockHash> {
        if !self.blocks.contains_key(subtree_root) || excluding == Some(subtree_root) {
            return Vec::new();
        }

        let detached_parent = self.tracked_parent(subtree_root).cloned();
        let mut removed = Vec::new();
        let mut stack = vec![subtree_root.clone()];

        while let Some(hash) = stack.pop() {
            if excluding == Some(&hash) {
                continue;
            }
            let Some(node) = self.blocks.remove(&hash) else {
                continue;
            };
            // Reverse so children pop in arrival order
            stack.extend(node.children.into_iter().rev());
            removed.push(hash);
        }

        if let Some(parent) = detached_parent.and_then(|p| self.blocks.get_mut(&p)) {
            parent.children.retain(|c| c != subtree_root);
        }

        if self
            .root
            .as_ref()
            .is_some_and(|root| !self.blocks.contains_key(root))
        {
            self.root = excluding.filter(|e| self.blocks.contains_key(*e)).cloned();
        }

        removed
    }

    /// Make `new_root` the root, dropping every block that does not descend
    /// from it. Returns the removed hashes.
    pub fn reroot(&mut self, new_root: &BlockHash) -> TrackerResult<Vec<BlockHash>> {
        if !self.blocks.contains_key(new_root) {
            return Err(TrackerError::UnknownBlock {
                block_hash: new_root.clone(),
            });
        }
        let Some(root) = self.root.clone() else {
            return Ok(Vec::new());
        };
        Ok(self.prune(&root, Some(new_root)))
    }
}

//! Rooted phylogenetic trees over integer leaf labels.
//!
//! # Representation
//! A tree is either a single leaf or an internal node holding at least two
//! subtrees. Siblings are always kept sorted, so two structurally identical
//! trees have identical representations and the derived `Eq`, `Ord` and
//! `Hash` are structural.
//!
//! # Ordering
//! Leaves sort before internal nodes; leaves compare by label and internal
//! nodes compare their child lists lexicographically:
//! ```text
//! 1 < 2 < (1,2) < (1,(2,3)) < (2,(1,3)) < ((1,2),(3,4))
//! ```
//! This is the total order used to pick normal forms.
//!
//! # Notation
//! `Display` and `FromStr` use tuple notation, e.g. `(1,(2,3))` for the
//! rooted triple that groups 2 and 3.

use std::fmt;
use std::str::FromStr;

use phylotree::tree::Tree as PhyloTree;

use crate::error::{Error, Result};

/// A leaf label.
pub type Leaf = u32;

/// Largest label accepted when parsing. Clusters are bitsets indexed by
/// label, so their size grows with the largest label.
pub const MAX_LEAF_LABEL: Leaf = 65_535;

/// Deepest parenthesis nesting accepted when parsing.
pub const MAX_NESTING: usize = 4096;

fn check_label(leaf: Leaf) -> std::result::Result<Leaf, String> {
    if leaf > MAX_LEAF_LABEL {
        Err(format!("label {leaf} exceeds {MAX_LEAF_LABEL}"))
    } else {
        Ok(leaf)
    }
}

/// A rooted, unordered, leaf-labeled tree without degree-1 internal nodes.
///
/// Build internal nodes through [`Tree::from_subtrees`] (or parse them) so
/// that siblings are sorted and single-child nodes are collapsed.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tree {
    Leaf(Leaf),
    Node(Vec<Tree>),
}

impl Tree {
    /// Combine subtrees under a common parent.
    ///
    /// Returns `None` for no subtrees and the subtree itself when only one is
    /// given; otherwise the subtrees are sorted into canonical order.
    pub fn from_subtrees(mut subtrees: Vec<Tree>) -> Option<Tree> {
        match subtrees.len() {
            0 => None,
            1 => subtrees.pop(),
            _ => {
                subtrees.sort_unstable();
                Some(Tree::Node(subtrees))
            }
        }
    }

    /// The fully unresolved tree: every leaf hangs directly off the root.
    ///
    /// A single label yields that leaf; an empty slice yields `None`.
    pub fn star(leaves: &[Leaf]) -> Option<Tree> {
        Tree::from_subtrees(leaves.iter().copied().map(Tree::Leaf).collect())
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Tree::Leaf(_))
    }

    /// Children of an internal node; empty for a leaf.
    pub fn children(&self) -> &[Tree] {
        match self {
            Tree::Leaf(_) => &[],
            Tree::Node(children) => children,
        }
    }

    /// Sorted labels of all leaves in the tree.
    pub fn leaf_set(&self) -> Vec<Leaf> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves.sort_unstable();
        leaves
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            Tree::Leaf(_) => 1,
            Tree::Node(children) => children.iter().map(Tree::leaf_count).sum(),
        }
    }

    fn collect_leaves(&self, out: &mut Vec<Leaf>) {
        match self {
            Tree::Leaf(leaf) => out.push(*leaf),
            Tree::Node(children) => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }

    /// Convert a `phylotree` tree whose leaves are named by integer labels.
    ///
    /// Internal node names and branch lengths are ignored; nodes with a
    /// single child are collapsed.
    ///
    /// # Errors
    /// Returns [`Error::Newick`] for unnamed or non-integer leaves, labels
    /// above [`MAX_LEAF_LABEL`], repeated labels, nesting deeper than
    /// [`MAX_NESTING`], or a malformed tree.
    pub fn from_phylo(tree: &PhyloTree) -> Result<Tree> {
        let root = tree.get_root().map_err(|e| Error::Newick(e.to_string()))?;
        let converted = Self::from_phylo_node(tree, root, 0)?;
        let leaves = converted.leaf_set();
        if leaves.windows(2).any(|w| w[0] == w[1]) {
            return Err(Error::Newick(format!("repeated leaf labels in {converted}")));
        }
        Ok(converted)
    }

    fn from_phylo_node(tree: &PhyloTree, node_id: usize, depth: usize) -> Result<Tree> {
        if depth > MAX_NESTING {
            return Err(Error::Newick(format!("nesting deeper than {MAX_NESTING}")));
        }
        let node = tree.get(&node_id).map_err(|e| Error::Newick(e.to_string()))?;

        if node.children.is_empty() {
            let name = node
                .name
                .as_deref()
                .ok_or_else(|| Error::Newick(format!("leaf {node_id} has no name")))?;
            let leaf = name
                .trim()
                .parse::<Leaf>()
                .map_err(|_| Error::Newick(format!("leaf name {name:?} is not an integer label")))?;
            return check_label(leaf).map(Tree::Leaf).map_err(Error::Newick);
        }

        let subtrees = node
            .children
            .iter()
            .map(|&child_id| Self::from_phylo_node(tree, child_id, depth + 1))
            .collect::<Result<Vec<_>>>()?;
        Tree::from_subtrees(subtrees).ok_or_else(|| Error::Newick("empty subtree".to_string()))
    }

    /// Parse a Newick string through `phylotree`.
    ///
    /// A missing trailing `;` is added.
    pub fn from_newick(newick: &str) -> Result<Tree> {
        let trimmed = newick.trim();
        let owned;
        let input = if trimmed.ends_with(';') {
            trimmed
        } else {
            owned = format!("{trimmed};");
            &owned
        };
        let phylo = PhyloTree::from_newick(input).map_err(|e| Error::Newick(e.to_string()))?;
        Self::from_phylo(&phylo)
    }

    /// Newick rendering without branch lengths, e.g. `(1,(2,3));`.
    pub fn to_newick(&self) -> String {
        format!("{self};")
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tree::Leaf(leaf) => write!(f, "{leaf}"),
            Tree::Node(children) => {
                write!(f, "(")?;
                for (k, child) in children.iter().enumerate() {
                    if k > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{child}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl FromStr for Tree {
    type Err = Error;

    /// Parse tuple notation such as `(1,(2,3))`. Whitespace is ignored.
    ///
    /// Labels above [`MAX_LEAF_LABEL`] and nesting deeper than
    /// [`MAX_NESTING`] are rejected with [`Error::Parse`].
    fn from_str(s: &str) -> Result<Tree> {
        let mut parser = TupleParser { bytes: s.as_bytes(), pos: 0 };
        let tree = parser.tree()?;
        parser.skip_whitespace();
        if parser.pos != parser.bytes.len() {
            return Err(Error::Parse(format!("trailing input at byte {} in {s:?}", parser.pos)));
        }
        let leaves = tree.leaf_set();
        if let Some(w) = leaves.windows(2).find(|w| w[0] == w[1]) {
            return Err(Error::Parse(format!("leaf {} appears more than once in {s:?}", w[0])));
        }
        Ok(tree)
    }
}

struct TupleParser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl TupleParser<'_> {
    fn skip_whitespace(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_whitespace();
        self.bytes.get(self.pos).copied()
    }

    /// Iterative descent: `open` holds the children read so far for every
    /// unclosed parenthesis.
    fn tree(&mut self) -> Result<Tree> {
        let mut open: Vec<Vec<Tree>> = Vec::new();
        loop {
            let mut done = match self.peek() {
                Some(b'(') => {
                    if open.len() == MAX_NESTING {
                        return Err(Error::Parse(format!(
                            "nesting deeper than {MAX_NESTING} at byte {}",
                            self.pos
                        )));
                    }
                    self.pos += 1;
                    open.push(Vec::new());
                    continue;
                }
                Some(b) if b.is_ascii_digit() => self.leaf()?,
                other => return Err(self.unexpected(other, "'(' or a leaf label")),
            };

            loop {
                let Some(siblings) = open.last_mut() else {
                    return Ok(done);
                };
                siblings.push(done);
                match self.peek() {
                    Some(b',') => {
                        self.pos += 1;
                        break;
                    }
                    Some(b')') => {
                        self.pos += 1;
                        let children = std::mem::take(siblings);
                        open.pop();
                        done = Tree::from_subtrees(children).ok_or_else(|| Error::Parse("empty node".to_string()))?;
                    }
                    other => return Err(self.unexpected(other, "',' or ')'")),
                }
            }
        }
    }

    fn leaf(&mut self) -> Result<Tree> {
        let start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        // Only ASCII digits were consumed.
        let digits = std::str::from_utf8(&self.bytes[start..self.pos]).map_err(|e| Error::Parse(e.to_string()))?;
        let leaf = digits
            .parse::<Leaf>()
            .map_err(|e| Error::Parse(format!("label {digits}: {e}")))?;
        check_label(leaf).map(Tree::Leaf).map_err(Error::Parse)
    }

    fn unexpected(&self, found: Option<u8>, wanted: &str) -> Error {
        match found {
            Some(b) => Error::Parse(format!("expected {wanted} at byte {}, found {:?}", self.pos, b as char)),
            None => Error::Parse(format!("expected {wanted}, found end of input")),
        }
    }
}

// Copyright 2020 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::BinaryHeap;
use std::collections::HashSet;

use tracing::debug;
use tracing::trace;

use crate::code::SymbolCode;
use crate::code::SymbolCodes;
use crate::error::Error;
use crate::error::Result;
use crate::util::MinKeyed;
use crate::SymbolCounts;

/// Longest path accepted when rebuilding a tree from serialized paths.
pub const MAX_PATH_LEN: usize = 4096;

#[derive(Clone, Debug)]
pub struct HuffParent {
    pub frequency: u64,
    pub zero: Box<HuffNode>,
    pub one: Box<HuffNode>,
}

#[derive(Clone, Copy, Debug)]
pub struct HuffLeaf {
    pub symbol: u32,
    pub frequency: u64,
}

#[derive(Clone, Debug)]
pub enum HuffNode {
    Parent(HuffParent),
    Leaf(HuffLeaf),
}

impl HuffNode {
    pub fn frequency(&self) -> u64 {
        match self {
            HuffNode::Parent(p) => p.frequency,
            HuffNode::Leaf(l) => l.frequency,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, HuffNode::Leaf(_))
    }
}

/// A full binary tree whose leaves are symbols. The route to a leaf is that
/// symbol's code.
///
/// Trees come from one of two places: [`build_tree`] merges leaves bottom-up
/// by frequency, and [`TreeBuilder`] grows one top-down from (symbol, path)
/// pairs. Either way the tree is read-only once it exists.
#[derive(Clone, Debug)]
pub struct CodeTree {
    root: HuffNode,
}

impl CodeTree {
    pub fn root(&self) -> &HuffNode {
        &self.root
    }

    /// Rebuilds a tree from (symbol, path) pairs, e.g. the output of
    /// [`CodeTree::paths`].
    pub fn from_paths<I>(pairs: I) -> Result<CodeTree>
    where
        I: IntoIterator<Item = (u32, SymbolCode)>,
    {
        let mut builder = TreeBuilder::new();
        for (symbol, path) in pairs {
            builder.insert(symbol, &path)?;
        }
        builder.finish()
    }

    /// Every leaf with its path, zero subtree before one subtree.
    pub fn paths(&self) -> Paths<'_> {
        Paths {
            stack: vec![(&self.root, SymbolCode::new())],
        }
    }

    pub fn codes(&self) -> SymbolCodes {
        SymbolCodes {
            codes: self.paths().collect(),
        }
    }
}

/// Depth-first walk over the leaves of a [`CodeTree`]. Uses an explicit stack
/// so deep trees cannot exhaust the call stack.
pub struct Paths<'a> {
    stack: Vec<(&'a HuffNode, SymbolCode)>,
}

impl<'a> Iterator for Paths<'a> {
    type Item = (u32, SymbolCode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((node, path)) = self.stack.pop() {
            match node {
                HuffNode::Leaf(l) => return Some((l.symbol, path)),
                HuffNode::Parent(p) => {
                    let mut one_path = path.clone();
                    one_path.push(true);
                    let mut zero_path = path;
                    zero_path.push(false);

                    // Pushed second so it is visited first.
                    self.stack.push((p.one.as_ref(), one_path));
                    self.stack.push((p.zero.as_ref(), zero_path));
                }
            }
        }
        None
    }
}

/// Builds an optimal prefix code tree for `symbol_counts`.
///
/// Every symbol with a nonzero count becomes a leaf, plus one leaf for the
/// eof symbol (one past the end of the table) with frequency 1. Nodes are
/// merged two at a time, lowest frequency first. Ties go to the node that
/// entered the queue earliest: leaves in ascending symbol order, then eof,
/// then merged nodes in the order they were created. The first node popped
/// becomes the zero child.
pub fn build_tree(symbol_counts: &SymbolCounts) -> Result<CodeTree> {
    let eof = symbol_counts.eof()?;

    let mut leaves: Vec<HuffLeaf> = symbol_counts
        .counts
        .iter()
        .enumerate()
        .filter(|&(_, &count)| count > 0)
        .map(|(symbol, &count)| HuffLeaf {
            symbol: symbol as u32,
            frequency: count as u64,
        })
        .collect();
    leaves.push(HuffLeaf {
        symbol: eof,
        frequency: 1,
    });

    let mut node_queue: BinaryHeap<_> = leaves
        .into_iter()
        .enumerate()
        .map(|(sequence, leaf)| MinKeyed {
            key: (leaf.frequency, sequence as u64),
            value: HuffNode::Leaf(leaf),
        })
        .collect();

    debug!(leaves = node_queue.len(), eof, "building code tree");

    let mut sequence = node_queue.len() as u64;
    let root = loop {
        let first = node_queue.pop().ok_or(Error::EmptyTree)?;
        let second = match node_queue.pop() {
            Some(second) => second,
            None => break first.value,
        };

        let new_weight = first.key.0 + second.key.0;
        trace!(
            zero = first.key.0,
            one = second.key.0,
            merged = new_weight,
            "merging nodes"
        );

        let new_node = HuffNode::Parent(HuffParent {
            frequency: new_weight,
            zero: Box::new(first.value),
            one: Box::new(second.value),
        });

        node_queue.push(MinKeyed {
            key: (new_weight, sequence),
            value: new_node,
        });
        sequence += 1;
    };

    Ok(CodeTree { root })
}

enum Slot {
    Empty,
    Leaf(u32),
    Parent { zero: Box<Slot>, one: Box<Slot> },
}

impl Slot {
    fn split() -> Slot {
        Slot::Parent {
            zero: Box::new(Slot::Empty),
            one: Box::new(Slot::Empty),
        }
    }
}

/// Grows a [`CodeTree`] one (symbol, path) pair at a time.
///
/// Each insert walks down from the root, creating internal nodes as needed,
/// and places the symbol where the path ends. Paths that would make the code
/// ambiguous are rejected.
pub struct TreeBuilder {
    root: Slot,
    seen: HashSet<u32>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        TreeBuilder::new()
    }
}

impl TreeBuilder {
    pub fn new() -> TreeBuilder {
        TreeBuilder {
            root: Slot::Empty,
            seen: HashSet::new(),
        }
    }

    pub fn insert(&mut self, symbol: u32, path: &SymbolCode) -> Result<()> {
        if path.len() > MAX_PATH_LEN {
            return Err(Error::PathTooLong {
                symbol,
                len: path.len(),
                max: MAX_PATH_LEN,
            });
        }
        if self.seen.contains(&symbol) {
            return Err(Error::PathConflict {
                symbol,
                reason: "appears more than once",
            });
        }

        let mut node = &mut self.root;
        for bit in path.iter() {
            if matches!(node, Slot::Empty) {
                *node = Slot::split();
            }
            node = match node {
                Slot::Parent { zero, one } => {
                    if bit {
                        one.as_mut()
                    } else {
                        zero.as_mut()
                    }
                }
                Slot::Leaf(_) => {
                    return Err(Error::PathConflict {
                        symbol,
                        reason: "runs through another symbol's leaf",
                    })
                }
                Slot::Empty => unreachable!("empty slot was just split"),
            };
        }

        match node {
            Slot::Empty => {}
            Slot::Leaf(_) => {
                return Err(Error::PathConflict {
                    symbol,
                    reason: "is already taken by another symbol",
                })
            }
            Slot::Parent { .. } => {
                return Err(Error::PathConflict {
                    symbol,
                    reason: "is a prefix of another symbol's path",
                })
            }
        }
        *node = Slot::Leaf(symbol);

        trace!(symbol, %path, "inserted path");
        self.seen.insert(symbol);
        Ok(())
    }

    /// Checks that every internal node got both children and returns the
    /// finished tree.
    pub fn finish(self) -> Result<CodeTree> {
        if let Slot::Empty = self.root {
            return Err(Error::EmptyTree);
        }

        let symbols = self.seen.len();
        let mut path = SymbolCode::new();
        let root = into_node(self.root, &mut path)?;
        debug!(symbols, "rebuilt code tree from paths");
        Ok(CodeTree { root })
    }
}

// Depth is bounded by MAX_PATH_LEN.
fn into_node(slot: Slot, path: &mut SymbolCode) -> Result<HuffNode> {
    match slot {
        Slot::Empty => Err(Error::IncompleteTree(path.to_string())),
        Slot::Leaf(symbol) => Ok(HuffNode::Leaf(HuffLeaf {
            symbol,
            frequency: 0,
        })),
        Slot::Parent { zero, one } => {
            let mut zero_path = path.clone();
            zero_path.push(false);
            let zero = into_node(*zero, &mut zero_path)?;

            path.push(true);
            let one = into_node(*one, path)?;

            Ok(HuffNode::Parent(HuffParent {
                frequency: 0,
                zero: Box::new(zero),
                one: Box::new(one),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(counts: &[u32]) -> SymbolCounts {
        SymbolCounts::new(counts.to_vec())
    }

    fn path(s: &str) -> SymbolCode {
        s.parse().unwrap()
    }

    fn path_strings(tree: &CodeTree) -> Vec<(u32, String)> {
        tree.paths().map(|(s, p)| (s, p.to_string())).collect()
    }

    fn check_frequencies(node: &HuffNode) {
        if let HuffNode::Parent(p) = node {
            assert_eq!(p.frequency, p.zero.frequency() + p.one.frequency());
            assert!(p.frequency >= p.zero.frequency());
            assert!(p.frequency >= p.one.frequency());
            check_frequencies(&p.zero);
            check_frequencies(&p.one);
        }
    }

    #[test]
    fn single_symbol_table_gets_eof_sibling() {
        let tree = build_tree(&counts(&[5])).unwrap();
        let HuffNode::Parent(root) = tree.root() else {
            panic!("expected an internal root");
        };
        assert_eq!(root.frequency, 6);
        assert_eq!(path_strings(&tree), vec![(1, "0".into()), (0, "1".into())]);
    }

    #[test]
    fn only_eof_leaf_for_empty_table() {
        for table in [&[][..], &[0, 0, 0][..]] {
            let tree = build_tree(&counts(table)).unwrap();
            assert!(tree.root().is_leaf());
            assert_eq!(
                path_strings(&tree),
                vec![(table.len() as u32, String::new())]
            );
        }
    }

    #[test]
    fn one_used_symbol_in_wide_table() {
        let mut table = vec![0; 11];
        table[0] = 3;
        let tree = build_tree(&counts(&table)).unwrap();
        assert_eq!(path_strings(&tree), vec![(11, "0".into()), (0, "1".into())]);
    }

    #[test]
    fn last_entry_is_a_real_symbol_not_eof() {
        let tree = build_tree(&counts(&[3, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1])).unwrap();
        assert_eq!(
            path_strings(&tree),
            vec![(10, "00".into()), (11, "01".into()), (0, "1".into())]
        );
    }

    #[test]
    fn ties_go_to_earliest_node() {
        let tree = build_tree(&counts(&[1, 1, 1])).unwrap();
        assert_eq!(
            path_strings(&tree),
            vec![
                (0, "00".into()),
                (1, "01".into()),
                (2, "10".into()),
                (3, "11".into()),
            ]
        );
    }

    #[test]
    fn sentinel_appears_exactly_once() {
        let tables: Vec<Vec<u32>> = vec![
            vec![],
            vec![7],
            vec![0, 4, 0, 9, 1, 1],
            (0..200).map(|i| (i * 37 % 11) as u32).collect(),
        ];
        for table in tables {
            let eof = table.len() as u32;
            let tree = build_tree(&counts(&table)).unwrap();
            assert_eq!(tree.paths().filter(|&(s, _)| s == eof).count(), 1);

            let expected = table.iter().filter(|&&c| c > 0).count() + 1;
            assert_eq!(tree.paths().count(), expected);
        }
    }

    #[test]
    fn frequencies_add_up() {
        let table: Vec<u32> = (0..64).map(|i| (i * i % 17) as u32).collect();
        let tree = build_tree(&counts(&table)).unwrap();
        check_frequencies(tree.root());

        let total: u64 = table.iter().map(|&c| c as u64).sum::<u64>() + 1;
        assert_eq!(tree.root().frequency(), total);
    }

    #[test]
    fn built_codes_are_prefix_free() {
        let table: Vec<u32> = (0..40).map(|i| 1 + (i * 7 % 13) as u32).collect();
        let codes: Vec<SymbolCode> = build_tree(&counts(&table))
            .unwrap()
            .paths()
            .map(|(_, p)| p)
            .collect();

        for (i, a) in codes.iter().enumerate() {
            for (j, b) in codes.iter().enumerate() {
                if i != j {
                    assert!(!a.is_prefix_of(b), "{} is a prefix of {}", a, b);
                }
            }
        }
    }

    #[test]
    fn frequent_symbols_get_shorter_codes() {
        let tree = build_tree(&counts(&[100, 1, 1, 1, 50])).unwrap();
        let codes = tree.codes();
        let len = |s| codes.get(s).unwrap().len();
        assert!(len(0) <= len(4));
        assert!(len(4) <= len(1));
    }

    #[test]
    fn rebuilt_tree_has_same_paths() {
        let table: Vec<u32> = (0..30).map(|i| (i * 11 % 7) as u32).collect();
        let tree = build_tree(&counts(&table)).unwrap();
        let rebuilt = CodeTree::from_paths(tree.paths()).unwrap();
        assert_eq!(path_strings(&rebuilt), path_strings(&tree));
    }

    #[test]
    fn rebuild_does_not_depend_on_order() {
        let tree = CodeTree::from_paths(vec![
            (7, path("11")),
            (3, path("0")),
            (9, path("10")),
        ])
        .unwrap();
        assert_eq!(
            path_strings(&tree),
            vec![(3, "0".into()), (9, "10".into()), (7, "11".into())]
        );
    }

    #[test]
    fn rebuild_single_leaf() {
        let tree = CodeTree::from_paths(vec![(4, SymbolCode::new())]).unwrap();
        assert!(tree.root().is_leaf());
        assert_eq!(path_strings(&tree), vec![(4, String::new())]);
    }

    #[test]
    fn rebuild_rejects_empty_input() {
        assert!(matches!(
            CodeTree::from_paths(Vec::<(u32, SymbolCode)>::new()),
            Err(Error::EmptyTree)
        ));
    }

    #[test]
    fn rebuild_rejects_overlapping_paths() {
        let cases = vec![
            vec![(1, path("0")), (2, path("01"))],
            vec![(1, path("01")), (2, path("0"))],
            vec![(1, path("01")), (2, path("01"))],
            vec![(1, path("0")), (1, path("1"))],
        ];
        for pairs in cases {
            assert!(matches!(
                CodeTree::from_paths(pairs),
                Err(Error::PathConflict { .. })
            ));
        }
    }

    #[test]
    fn rebuild_rejects_missing_child() {
        let err = CodeTree::from_paths(vec![(1, path("00")), (2, path("1"))]).unwrap_err();
        match err {
            Error::IncompleteTree(p) => assert_eq!(p, "01"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn rebuild_rejects_overlong_path() {
        let long: SymbolCode = "0".repeat(MAX_PATH_LEN + 1).parse().unwrap();
        assert!(matches!(
            CodeTree::from_paths(vec![(1, long)]),
            Err(Error::PathTooLong { .. })
        ));
    }
}

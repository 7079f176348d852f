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

use std::io::Cursor;

use proptest::prelude::*;

use hufftree::build_tree;
use hufftree::decode;
use hufftree::encode;
use hufftree::read_tree;
use hufftree::write_tree;
use hufftree::BitIter;
use hufftree::CodeTree;
use hufftree::Error;
use hufftree::HuffNode;
use hufftree::SymbolCounts;

/// A count table and a shuffled message that uses each symbol exactly as
/// often as the table says.
fn table_and_message() -> impl Strategy<Value = (Vec<u32>, Vec<u32>)> {
    prop::collection::vec(0u32..8, 0..40).prop_flat_map(|table| {
        let message: Vec<u32> = table
            .iter()
            .enumerate()
            .flat_map(|(symbol, &count)| std::iter::repeat(symbol as u32).take(count as usize))
            .collect();
        (Just(table), Just(message).prop_shuffle())
    })
}

fn tree_for(table: &[u32]) -> CodeTree {
    build_tree(&SymbolCounts::new(table.to_vec())).unwrap()
}

fn path_strings(tree: &CodeTree) -> Vec<(u32, String)> {
    tree.paths().map(|(s, p)| (s, p.to_string())).collect()
}

fn encoded_bits(tree: &CodeTree, message: &[u32], eof: u32) -> Vec<bool> {
    let mut bytes: Vec<u8> = Vec::new();
    let bits = encode(message.iter().copied(), &mut bytes, &tree.codes(), eof).unwrap();
    BitIter::new(bytes.into_iter()).take(bits as usize).collect()
}

fn check_merges(node: &HuffNode) -> bool {
    match node {
        HuffNode::Leaf(_) => true,
        HuffNode::Parent(p) => {
            p.frequency == p.zero.frequency() + p.one.frequency()
                && p.frequency >= p.zero.frequency()
                && p.frequency >= p.one.frequency()
                && check_merges(&p.zero)
                && check_merges(&p.one)
        }
    }
}

proptest! {
    #[test]
    fn message_survives_write_read_encode_decode((table, message) in table_and_message()) {
        let eof = table.len() as u32;
        let tree = tree_for(&table);

        let mut tree_text: Vec<u8> = Vec::new();
        write_tree(&tree, &mut tree_text).unwrap();
        let rebuilt = read_tree(Cursor::new(tree_text)).unwrap();

        let mut bytes: Vec<u8> = Vec::new();
        encode(message.iter().copied(), &mut bytes, &tree.codes(), eof).unwrap();

        let mut out: Vec<u32> = Vec::new();
        let decoded = decode(BitIter::new(bytes.into_iter()), &mut out, &rebuilt, eof).unwrap();
        prop_assert_eq!(decoded, message.len() as u64);
        prop_assert_eq!(out, message);
    }

    #[test]
    fn codes_are_prefix_free(table in prop::collection::vec(0u32..1000, 0..60)) {
        let codes: Vec<_> = tree_for(&table).paths().map(|(_, p)| p).collect();
        for (i, a) in codes.iter().enumerate() {
            for (j, b) in codes.iter().enumerate() {
                if i != j {
                    prop_assert!(!a.is_prefix_of(b), "{} is a prefix of {}", a, b);
                }
            }
        }
    }

    #[test]
    fn eof_leaf_appears_exactly_once(table in prop::collection::vec(0u32..5, 0..60)) {
        let eof = table.len() as u32;
        let tree = tree_for(&table);
        prop_assert_eq!(tree.paths().filter(|&(s, _)| s == eof).count(), 1);

        let used = table.iter().filter(|&&c| c > 0).count();
        prop_assert_eq!(tree.paths().count(), used + 1);
    }

    #[test]
    fn rebuilt_tree_has_same_paths(table in prop::collection::vec(0u32..100, 0..60)) {
        let tree = tree_for(&table);
        let rebuilt = CodeTree::from_paths(tree.paths()).unwrap();
        prop_assert_eq!(path_strings(&rebuilt), path_strings(&tree));
    }

    #[test]
    fn merged_frequencies_add_up(table in prop::collection::vec(0u32..10_000, 0..60)) {
        let tree = tree_for(&table);
        prop_assert!(check_merges(tree.root()));

        let total: u64 = table.iter().map(|&c| c as u64).sum::<u64>() + 1;
        prop_assert_eq!(tree.root().frequency(), total);
    }

    #[test]
    fn missing_last_bit_is_truncation((table, message) in table_and_message()) {
        let eof = table.len() as u32;
        let tree = tree_for(&table);
        let mut bits = encoded_bits(&tree, &message, eof);
        prop_assume!(!bits.is_empty());
        bits.pop();

        let mut out: Vec<u32> = Vec::new();
        let truncated = matches!(
            decode(bits, &mut out, &tree, eof),
            Err(Error::Truncated { .. })
        );
        prop_assert!(truncated);
    }
}

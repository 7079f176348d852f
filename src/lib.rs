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

//! Huffman code trees over integer symbols.
//!
//! A tree is built from symbol counts with [`build_tree`], stored as a list of
//! (symbol, path) lines with [`write_tree`], rebuilt from those lines with
//! [`read_tree`], and used to [`encode`] and [`decode`] bit streams. Every
//! tree built from counts carries an extra eof symbol, one past the end of the
//! count table, which terminates each encoded stream.

mod code;
mod codec;
mod error;
mod tree;
mod util;

pub use code::InvalidPathChar;
pub use code::SymbolCode;
pub use code::SymbolCodes;
pub use codec::decode;
pub use codec::encode;
pub use codec::read_tree;
pub use codec::write_tree;
pub use codec::ByteSink;
pub use codec::PathReader;
pub use codec::SymbolSink;
pub use error::Error;
pub use error::Result;
pub use tree::build_tree;
pub use tree::CodeTree;
pub use tree::HuffLeaf;
pub use tree::HuffNode;
pub use tree::HuffParent;
pub use tree::Paths;
pub use tree::TreeBuilder;
pub use tree::MAX_PATH_LEN;
pub use util::BitIter;
pub use util::BitWriter;

/// Number of distinct byte values; also the eof symbol for byte input.
pub const BYTE_EOF: u32 = 256;

/// Stores the occurrence count of each symbol `0..counts.len()`. The symbol
/// `counts.len()` is reserved for eof.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SymbolCounts {
    pub counts: Vec<u32>,
}

impl SymbolCounts {
    pub fn new(counts: Vec<u32>) -> SymbolCounts {
        SymbolCounts { counts }
    }

    /// The reserved end-of-stream symbol for this table.
    pub fn eof(&self) -> Result<u32> {
        u32::try_from(self.counts.len()).map_err(|_| Error::TableTooLarge(self.counts.len()))
    }
}

impl From<Vec<u32>> for SymbolCounts {
    fn from(counts: Vec<u32>) -> Self {
        SymbolCounts::new(counts)
    }
}

/// Counts each byte value in `input`. The result always has 256 entries, so
/// its eof symbol is [`BYTE_EOF`].
pub fn count_symbols<I: IntoIterator<Item = u8>>(input: I) -> SymbolCounts {
    let mut counts = vec![0u32; BYTE_EOF as usize];
    for b in input {
        counts[b as usize] = counts[b as usize].saturating_add(1);
    }

    SymbolCounts { counts }
}

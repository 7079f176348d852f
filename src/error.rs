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

use std::io;

use thiserror::Error;

/// Everything that can go wrong while building, reading, writing, encoding or
/// decoding a code tree.
#[derive(Error, Debug)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// The serialized tree is not a sequence of (symbol, path) line pairs.
    #[error("malformed code tree at line {line}: {reason}")]
    Format { line: usize, reason: String },

    /// The bit source ran dry before the eof leaf was reached.
    #[error("encoded stream ended early after {decoded} symbols")]
    Truncated { decoded: u64 },

    /// The frequency table has no room left for the eof symbol.
    #[error("frequency table with {0} entries is too large")]
    TableTooLarge(usize),

    #[error("path for symbol {symbol} {reason}")]
    PathConflict { symbol: u32, reason: &'static str },

    #[error("path for symbol {symbol} is {len} bits long, limit is {max}")]
    PathTooLong { symbol: u32, len: usize, max: usize },

    /// A reconstructed tree has an internal node with only one child.
    #[error("code tree is incomplete: no symbol for path {0}")]
    IncompleteTree(String),

    #[error("code tree has no symbols")]
    EmptyTree,

    /// The whole tree is a single leaf that is not the eof symbol.
    #[error("code tree is a single leaf for symbol {symbol}, not eof {eof}")]
    DegenerateTree { symbol: u32, eof: u32 },

    #[error("code tree has no leaf for eof symbol {0}")]
    MissingEof(u32),

    #[error("symbol {0} has no code")]
    UnknownSymbol(u32),

    #[error("symbol {0} does not fit in the output")]
    SymbolOutOfRange(u32),
}

pub type Result<T> = std::result::Result<T, Error>;

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

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use bv::BitVec;
use bv::Bits;

/// The route from the root of a code tree to one leaf. `false` (written `0`)
/// takes the zero child, `true` (written `1`) the one child. The same bits are
/// the leaf symbol's code in an encoded stream.
#[derive(Clone, Debug)]
pub struct SymbolCode {
    bits: BitVec<u8>,
}

impl SymbolCode {
    pub fn new() -> SymbolCode {
        SymbolCode {
            bits: BitVec::new(),
        }
    }

    pub fn push(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    pub fn len(&self) -> usize {
        self.bits.bit_len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bits.bit_len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.bits.bit_len()).map(move |i| self.bits.get_bit(i))
    }

    /// Whether `self` is a (not necessarily proper) prefix of `other`.
    pub fn is_prefix_of(&self, other: &SymbolCode) -> bool {
        self.len() <= other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl Default for SymbolCode {
    fn default() -> SymbolCode {
        SymbolCode::new()
    }
}

impl Bits for SymbolCode {
    type Block = u8;

    fn bit_len(&self) -> u64 {
        self.bits.bit_len()
    }

    fn get_block(&self, position: usize) -> Self::Block {
        self.bits.get_block(position)
    }
}

impl PartialEq for SymbolCode {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl Eq for SymbolCode {}

impl fmt::Display for SymbolCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.iter() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Returned when a path string holds something other than `0` and `1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidPathChar(pub char);

impl fmt::Display for InvalidPathChar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid path character {:?}", self.0)
    }
}

impl FromStr for SymbolCode {
    type Err = InvalidPathChar;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut code = SymbolCode::new();
        for c in s.chars() {
            match c {
                '0' => code.push(false),
                '1' => code.push(true),
                other => return Err(InvalidPathChar(other)),
            }
        }
        Ok(code)
    }
}

/// Stores the code for each symbol present in a tree.
#[derive(Clone, Debug, Default)]
pub struct SymbolCodes {
    pub codes: BTreeMap<u32, SymbolCode>,
}

impl SymbolCodes {
    pub fn get(&self, symbol: u32) -> Option<&SymbolCode> {
        self.codes.get(&symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &SymbolCode)> + '_ {
        self.codes.iter().map(|(&symbol, code)| (symbol, code))
    }
}

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

use std::cmp;
use std::io;
use std::io::prelude::*;
use std::iter::Iterator;

use bv::BitVec;
use bv::Bits;

/// `MinKeyed` stores a key-value pair and orders by the key, smallest first.
///
/// `std::collections::BinaryHeap` is a max-heap. Wrapping values in
/// `MinKeyed` turns it into a min-heap over a user-provided priority key
/// without requiring the stored value to be comparable at all.
#[derive(Clone, Copy, Debug)]
pub struct MinKeyed<K, T> {
    pub key: K,
    pub value: T,
}

impl<K: PartialEq, T> PartialEq for MinKeyed<K, T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<K: Eq, T> Eq for MinKeyed<K, T> {}

impl<K: Ord, T> Ord for MinKeyed<K, T> {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        other.key.cmp(&self.key)
    }
}

impl<K: Ord, T> PartialOrd for MinKeyed<K, T> {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Splits a byte stream into bits, least significant bit first.
pub struct BitIter<Inner> {
    inner: Inner,
    cur: u8,
    bit_index: u8,
}

impl<I: Iterator<Item = u8>> BitIter<I> {
    pub fn new(inner: I) -> BitIter<I> {
        BitIter {
            inner,
            cur: 0,
            bit_index: 8,
        }
    }
}

impl<I: Iterator<Item = u8>> Iterator for BitIter<I> {
    type Item = bool;

    fn next(&mut self) -> Option<Self::Item> {
        if self.bit_index == 8 {
            self.cur = self.inner.next()?;
            self.bit_index = 0;
        }

        self.bit_index += 1;
        Some(self.cur.get_bit(self.bit_index as u64 - 1))
    }
}

/// Packs bits into bytes in the order `BitIter` reads them back.
///
/// Whole bytes are handed to the inner writer as soon as they fill up. The
/// last partial byte is zero-padded by `finish`.
pub struct BitWriter<W> {
    inner: W,
    pending: BitVec<u8>,
    bits_written: u64,
}

impl<W: Write> BitWriter<W> {
    pub fn new(inner: W) -> BitWriter<W> {
        BitWriter {
            inner,
            pending: BitVec::new(),
            bits_written: 0,
        }
    }

    pub fn bits_written(&self) -> u64 {
        self.bits_written
    }

    pub fn push_bits<B: Bits<Block = u8> + ?Sized>(&mut self, bits: &B) -> io::Result<()> {
        for i in 0..bits.bit_len() {
            self.pending.push(bits.get_bit(i));
        }
        self.bits_written += bits.bit_len();

        let full_bytes = (self.pending.bit_len() / 8) as usize;
        for i in 0..full_bytes {
            let block = self.pending.get_block(i);
            self.inner.write_all(std::slice::from_ref(&block))?;
        }

        let remainder_len = self.pending.bit_len() - full_bytes as u64 * 8;
        if remainder_len > 0 && full_bytes > 0 {
            let remainder = self.pending.get_block(full_bytes);
            self.pending.clear();
            for i in 0..remainder_len {
                self.pending.push(remainder.get_bit(i));
            }
        } else if remainder_len == 0 {
            self.pending.clear();
        }

        Ok(())
    }

    /// Pads and writes the final byte, flushes, and returns the inner writer.
    pub fn finish(mut self) -> io::Result<W> {
        if self.pending.bit_len() > 0 {
            while self.pending.bit_len() % 8 != 0 {
                self.pending.push(false);
            }
            let block = self.pending.get_block(0);
            self.inner.write_all(std::slice::from_ref(&block))?;
            self.pending.clear();
        }

        self.inner.flush()?;
        Ok(self.inner)
    }
}

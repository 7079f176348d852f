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
use std::io::prelude::*;

use tracing::debug;

use crate::code::SymbolCode;
use crate::code::SymbolCodes;
use crate::error::Error;
use crate::error::Result;
use crate::tree::CodeTree;
use crate::tree::HuffNode;
use crate::tree::TreeBuilder;
use crate::util::BitWriter;

/// Receives decoded symbols one at a time.
pub trait SymbolSink {
    fn write_symbol(&mut self, symbol: u32) -> Result<()>;
}

impl SymbolSink for Vec<u32> {
    fn write_symbol(&mut self, symbol: u32) -> Result<()> {
        self.push(symbol);
        Ok(())
    }
}

/// Writes each symbol as one byte. Symbols above 255 are an error.
pub struct ByteSink<W> {
    inner: W,
}

impl<W: Write> ByteSink<W> {
    pub fn new(inner: W) -> ByteSink<W> {
        ByteSink { inner }
    }

    /// Flushes and returns the inner writer.
    pub fn finish(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> SymbolSink for ByteSink<W> {
    fn write_symbol(&mut self, symbol: u32) -> Result<()> {
        let byte = u8::try_from(symbol).map_err(|_| Error::SymbolOutOfRange(symbol))?;
        self.inner.write_all(std::slice::from_ref(&byte))?;
        Ok(())
    }
}

/// Writes `tree` as alternating symbol and path lines:
///
/// ```text
/// 11
/// 0
/// 0
/// 1
/// ```
pub fn write_tree<W: Write>(tree: &CodeTree, output: &mut W) -> Result<()> {
    for (symbol, path) in tree.paths() {
        writeln!(output, "{}", symbol)?;
        writeln!(output, "{}", path)?;
    }
    output.flush()?;
    Ok(())
}

/// Reads (symbol, path) pairs from the line format produced by
/// [`write_tree`], one pair per call to `next`.
///
/// Lines end in `\n` or `\r\n`. A line that is not valid UTF-8 is a format
/// error like any other bad character.
pub struct PathReader<R> {
    lines: io::Split<R>,
    line: usize,
}

impl<R: BufRead> PathReader<R> {
    pub fn new(input: R) -> PathReader<R> {
        PathReader {
            lines: input.split(b'\n'),
            line: 0,
        }
    }

    fn next_line(&mut self) -> Option<Result<String>> {
        let line = self.lines.next()?;
        self.line += 1;
        Some(line.map_err(Error::from).and_then(|mut bytes| {
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
            String::from_utf8(bytes).map_err(|e| {
                self.format_error(format!(
                    "invalid UTF-8 at byte {}",
                    e.utf8_error().valid_up_to()
                ))
            })
        }))
    }

    fn format_error(&self, reason: String) -> Error {
        Error::Format {
            line: self.line,
            reason,
        }
    }

    fn parse_symbol(&self, text: &str) -> Result<u32> {
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(self.format_error(format!("expected a symbol, got {:?}", text)));
        }
        text.parse()
            .map_err(|_| self.format_error(format!("symbol {} is out of range", text)))
    }

    fn read_pair(&mut self, symbol_line: Result<String>) -> Result<(u32, SymbolCode)> {
        let symbol = self.parse_symbol(&symbol_line?)?;
        let path_line = match self.next_line() {
            Some(line) => line?,
            None => {
                self.line += 1;
                return Err(self.format_error(format!("missing path for symbol {}", symbol)));
            }
        };
        let path = path_line
            .parse::<SymbolCode>()
            .map_err(|e| self.format_error(e.to_string()))?;
        Ok((symbol, path))
    }
}

impl<R: BufRead> Iterator for PathReader<R> {
    type Item = Result<(u32, SymbolCode)>;

    fn next(&mut self) -> Option<Self::Item> {
        let symbol_line = self.next_line()?;
        Some(self.read_pair(symbol_line))
    }
}

/// Rebuilds a tree from the output of [`write_tree`], inserting each pair as
/// soon as it is read.
pub fn read_tree<R: BufRead>(input: R) -> Result<CodeTree> {
    let mut builder = TreeBuilder::new();
    for pair in PathReader::new(input) {
        let (symbol, path) = pair?;
        builder.insert(symbol, &path)?;
    }
    builder.finish()
}

/// Encodes `input` followed by `eof` with `symbol_codes`, packing bits into
/// bytes. Returns the number of bits written, not counting padding.
pub fn encode<I: IntoIterator<Item = u32>, W: Write>(
    input: I,
    output: &mut W,
    symbol_codes: &SymbolCodes,
    eof: u32,
) -> Result<u64> {
    let eof_code = symbol_codes.get(eof).ok_or(Error::UnknownSymbol(eof))?;
    let mut writer = BitWriter::new(output);

    let mut symbols = 0u64;
    for symbol in input {
        let code = symbol_codes
            .get(symbol)
            .ok_or(Error::UnknownSymbol(symbol))?;
        writer.push_bits(code)?;
        symbols += 1;
    }
    writer.push_bits(eof_code)?;

    let bits = writer.bits_written();
    writer.finish()?;
    debug!(symbols, bits, "encoded stream");
    Ok(bits)
}

/// Decodes symbols from `bits` into `sink` until the `eof` leaf is reached.
/// Returns the number of symbols written to `sink`.
///
/// Running out of bits before eof is an error, as is a tree without an eof
/// leaf or a tree that is a single non-eof leaf.
pub fn decode<I, S>(bits: I, sink: &mut S, tree: &CodeTree, eof: u32) -> Result<u64>
where
    I: IntoIterator<Item = bool>,
    S: SymbolSink + ?Sized,
{
    let root = tree.root();
    if let HuffNode::Leaf(l) = root {
        if l.symbol != eof {
            return Err(Error::DegenerateTree {
                symbol: l.symbol,
                eof,
            });
        }
    }
    if !tree.paths().any(|(symbol, _)| symbol == eof) {
        return Err(Error::MissingEof(eof));
    }

    let mut bits = bits.into_iter();
    let mut decoded = 0u64;
    let mut node = root;
    loop {
        match node {
            HuffNode::Leaf(l) => {
                if l.symbol == eof {
                    break;
                }
                sink.write_symbol(l.symbol)?;
                decoded += 1;
                node = root;
            }
            HuffNode::Parent(p) => {
                node = match bits.next() {
                    Some(true) => p.one.as_ref(),
                    Some(false) => p.zero.as_ref(),
                    None => return Err(Error::Truncated { decoded }),
                };
            }
        }
    }

    debug!(decoded, "decoded stream");
    Ok(decoded)
}

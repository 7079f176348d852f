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

use std::fs;
use std::fs::File;
use std::io::BufReader;
use std::io::BufWriter;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use tracing::info;
use tracing::Level;

use hufftree::build_tree;
use hufftree::count_symbols;
use hufftree::decode;
use hufftree::encode;
use hufftree::read_tree;
use hufftree::write_tree;
use hufftree::BitIter;
use hufftree::ByteSink;
use hufftree::CodeTree;
use hufftree::BYTE_EOF;

/// Huffman-code files, keeping the code tree in a separate text file.
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// More log output; repeat for more detail.
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[clap(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Builds a code for INPUT and writes the tree and the encoded bits.
    Encode {
        input: PathBuf,
        code_file: PathBuf,
        bits_file: PathBuf,
    },

    /// Decodes BITS_FILE with the tree in CODE_FILE into OUTPUT.
    Decode {
        code_file: PathBuf,
        bits_file: PathBuf,
        output: PathBuf,

        /// Symbol that ends the encoded stream.
        #[clap(long, default_value_t = BYTE_EOF)]
        eof: u32,
    },

    /// Prints each symbol in CODE_FILE with its code.
    Codes { code_file: PathBuf },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match args.mode {
        Mode::Encode {
            input,
            code_file,
            bits_file,
        } => encode_file(&input, &code_file, &bits_file),
        Mode::Decode {
            code_file,
            bits_file,
            output,
            eof,
        } => decode_file(&code_file, &bits_file, &output, eof),
        Mode::Codes { code_file } => print_codes(&code_file),
    }
}

fn encode_file(input: &Path, code_file: &Path, bits_file: &Path) -> anyhow::Result<()> {
    let data = fs::read(input).with_context(|| format!("reading {}", input.display()))?;

    let symbol_counts = count_symbols(data.iter().copied());
    let tree = build_tree(&symbol_counts)?;

    let mut code_out = BufWriter::new(
        File::create(code_file).with_context(|| format!("creating {}", code_file.display()))?,
    );
    write_tree(&tree, &mut code_out)
        .with_context(|| format!("writing {}", code_file.display()))?;

    let mut bits_out = BufWriter::new(
        File::create(bits_file).with_context(|| format!("creating {}", bits_file.display()))?,
    );
    let bits = encode(
        data.iter().map(|&b| b as u32),
        &mut bits_out,
        &tree.codes(),
        BYTE_EOF,
    )
    .with_context(|| format!("writing {}", bits_file.display()))?;

    info!(
        input_bytes = data.len(),
        encoded_bits = bits,
        "encoded {}",
        input.display()
    );
    Ok(())
}

fn decode_file(code_file: &Path, bits_file: &Path, output: &Path, eof: u32) -> anyhow::Result<()> {
    let tree = load_tree(code_file)?;
    let encoded = fs::read(bits_file).with_context(|| format!("reading {}", bits_file.display()))?;

    let mut sink = ByteSink::new(BufWriter::new(
        File::create(output).with_context(|| format!("creating {}", output.display()))?,
    ));
    let decoded = decode(BitIter::new(encoded.into_iter()), &mut sink, &tree, eof)
        .with_context(|| format!("decoding {}", bits_file.display()))?;
    sink.finish()
        .with_context(|| format!("writing {}", output.display()))?;

    info!(decoded, "decoded {}", bits_file.display());
    Ok(())
}

fn print_codes(code_file: &Path) -> anyhow::Result<()> {
    let tree = load_tree(code_file)?;
    for (symbol, code) in tree.codes().iter() {
        match char::from_u32(symbol).filter(|c| c.is_ascii_graphic()) {
            Some(c) => println!("{}\t{}\t{}", symbol, c, code),
            None => println!("{}\t\t{}", symbol, code),
        }
    }
    Ok(())
}

fn load_tree(code_file: &Path) -> anyhow::Result<CodeTree> {
    let file = File::open(code_file).with_context(|| format!("opening {}", code_file.display()))?;
    let tree = read_tree(BufReader::new(file))
        .with_context(|| format!("reading code tree from {}", code_file.display()))?;
    Ok(tree)
}

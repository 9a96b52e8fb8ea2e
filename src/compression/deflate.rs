//! Deflate engine
//!
//! Compression producing RFC 1950 / RFC 1951 streams: a hash-chain LZ77
//! pass tokenizes the input, then the block is emitted as stored, fixed-
//! Huffman or dynamic-Huffman — whichever the computed bit cost makes
//! smallest. The whole input becomes one final block.

use log::debug;

use super::checksum::adler32;
use super::huffman::{canonical_codes, fixed_distance_lengths, fixed_literal_lengths,
    package_merge_lengths};
use super::{
    distance_to_code, length_to_code, Result, CODE_LENGTH_ORDER, DIST_EXTRA, END_OF_BLOCK,
    LENGTH_EXTRA,
};
use crate::io::BitWriter;

const WINDOW_SIZE: usize = 32 * 1024;
const WINDOW_MASK: usize = WINDOW_SIZE - 1;
const HASH_BITS: u32 = 15;
const HASH_SIZE: usize = 1 << HASH_BITS;
const MIN_MATCH: usize = 3;
const MAX_MATCH: usize = 258;
const MAX_CHAIN: usize = 128;
// A match this long ends the chain search early.
const NICE_LENGTH: usize = 128;
const MAX_STORED_BLOCK: usize = 65_535;
const NIL: usize = usize::MAX;

const LITERAL_ALPHABET: usize = 286;
const DISTANCE_ALPHABET: usize = 30;

/// Standard zlib header: deflate, 32 KiB window, default level.
const ZLIB_HEADER: [u8; 2] = [0x78, 0x9C];

#[derive(Debug, Clone, Copy)]
enum Token {
    Literal(u8),
    Match { length: u16, distance: u16 },
}

/// Compression state machine producing DEFLATE streams.
pub struct Deflater {
    input: Vec<u8>,
    wrap: bool,
    total_in: u64,
    total_out: u64,
}

impl Deflater {
    /// Creates a deflater producing zlib-wrapped streams (RFC 1950).
    pub fn new() -> Self {
        Self::with_wrap(true)
    }

    /// Creates a deflater producing raw deflate bodies (RFC 1951).
    pub fn raw() -> Self {
        Self::with_wrap(false)
    }

    fn with_wrap(wrap: bool) -> Self {
        Deflater {
            input: Vec::new(),
            wrap,
            total_in: 0,
            total_out: 0,
        }
    }

    /// Passes a block of bytes to compress.
    pub fn set_input(&mut self, data: &[u8]) {
        self.input = data.to_vec();
    }

    /// Returns the compressor to its initial state.
    pub fn reset(&mut self) {
        let wrap = self.wrap;
        *self = Self::with_wrap(wrap);
    }

    /// Total uncompressed bytes consumed.
    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    /// Total compressed bytes produced.
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Compresses the current input and returns the produced stream.
    pub fn deflate(&mut self) -> Result<Vec<u8>> {
        let tokens = tokenize(&self.input);
        let (lit_freq, dist_freq) = frequencies(&tokens);
        let extra_bits = match_extra_bits(&tokens);

        let stored_cost = stored_cost_bits(self.input.len());
        let fixed_cost = 3 + fixed_body_cost(&lit_freq, &dist_freq, extra_bits);
        let dynamic = DynamicPlan::build(&lit_freq, &dist_freq, extra_bits)?;
        let dynamic_cost = 3 + dynamic.cost_bits;
        debug!(
            "block costs (bits): stored {stored_cost}, fixed {fixed_cost}, dynamic {dynamic_cost}"
        );

        let mut bits = BitWriter::new();
        if stored_cost <= fixed_cost && stored_cost <= dynamic_cost {
            emit_stored(&mut bits, &self.input);
        } else if fixed_cost <= dynamic_cost {
            emit_fixed(&mut bits, &tokens)?;
        } else {
            emit_dynamic(&mut bits, &tokens, &dynamic);
        }
        bits.align_to_byte();
        let body = bits.into_bytes();

        let mut output = Vec::with_capacity(body.len() + 6);
        if self.wrap {
            output.extend_from_slice(&ZLIB_HEADER);
        }
        output.extend_from_slice(&body);
        if self.wrap {
            output.extend_from_slice(&adler32(&self.input).to_be_bytes());
        }

        self.total_in += self.input.len() as u64;
        self.total_out += output.len() as u64;
        debug!(
            "deflated {} bytes into {} bytes",
            self.input.len(),
            output.len()
        );
        Ok(output)
    }
}

impl Default for Deflater {
    fn default() -> Self {
        Self::new()
    }
}

fn hash3(data: &[u8], index: usize) -> usize {
    let value = u32::from(data[index])
        | (u32::from(data[index + 1]) << 8)
        | (u32::from(data[index + 2]) << 16);
    (value.wrapping_mul(0x9E37_79B1) >> (32 - HASH_BITS)) as usize
}

fn match_length(data: &[u8], candidate: usize, position: usize) -> usize {
    let limit = (data.len() - position).min(MAX_MATCH);
    let mut len = 0;
    while len < limit && data[candidate + len] == data[position + len] {
        len += 1;
    }
    len
}

/// Greedy LZ77 pass over hash chains of three-byte prefixes.
fn tokenize(data: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let n = data.len();
    if n == 0 {
        return tokens;
    }

    let mut head = vec![NIL; HASH_SIZE];
    let mut prev = vec![NIL; WINDOW_SIZE];
    let insert = |head: &mut Vec<usize>, prev: &mut Vec<usize>, p: usize| {
        let h = hash3(data, p);
        prev[p & WINDOW_MASK] = head[h];
        head[h] = p;
    };

    let mut position = 0usize;
    while position < n {
        let mut best_len = 0usize;
        let mut best_dist = 0usize;
        if position + MIN_MATCH <= n {
            let mut candidate = head[hash3(data, position)];
            let mut chain = 0usize;
            while candidate != NIL && chain < MAX_CHAIN {
                if candidate >= position || position - candidate > WINDOW_SIZE {
                    break;
                }
                let len = match_length(data, candidate, position);
                if len > best_len {
                    best_len = len;
                    best_dist = position - candidate;
                    if len >= NICE_LENGTH {
                        break;
                    }
                }
                let link = prev[candidate & WINDOW_MASK];
                // Chain links must strictly decrease; anything else is a
                // slot overwritten by a newer position.
                if link == NIL || link >= candidate {
                    break;
                }
                candidate = link;
                chain += 1;
            }
        }

        if best_len >= MIN_MATCH {
            tokens.push(Token::Match {
                length: best_len as u16,
                distance: best_dist as u16,
            });
            for p in position..position + best_len {
                if p + MIN_MATCH <= n {
                    insert(&mut head, &mut prev, p);
                }
            }
            position += best_len;
        } else {
            tokens.push(Token::Literal(data[position]));
            if position + MIN_MATCH <= n {
                insert(&mut head, &mut prev, position);
            }
            position += 1;
        }
    }
    tokens
}

fn frequencies(tokens: &[Token]) -> (Vec<u32>, Vec<u32>) {
    let mut lit = vec![0u32; LITERAL_ALPHABET];
    let mut dist = vec![0u32; DISTANCE_ALPHABET];
    lit[END_OF_BLOCK as usize] = 1;
    for token in tokens {
        match token {
            Token::Literal(byte) => lit[*byte as usize] += 1,
            Token::Match { length, distance } => {
                lit[length_to_code(*length).0 as usize] += 1;
                dist[distance_to_code(*distance).0 as usize] += 1;
            }
        }
    }
    (lit, dist)
}

fn match_extra_bits(tokens: &[Token]) -> usize {
    tokens
        .iter()
        .map(|token| match token {
            Token::Literal(_) => 0,
            Token::Match { length, distance } => {
                usize::from(LENGTH_EXTRA[(length_to_code(*length).0 - 257) as usize])
                    + usize::from(DIST_EXTRA[distance_to_code(*distance).0 as usize])
            }
        })
        .sum()
}

fn stored_cost_bits(input_len: usize) -> usize {
    let blocks = input_len.div_ceil(MAX_STORED_BLOCK).max(1);
    // Per block: 3 header bits, up to 7 padding bits, LEN and NLEN.
    blocks * (3 + 7 + 32) + input_len * 8
}

fn body_cost(lit_freq: &[u32], lit_len: &[u8], dist_freq: &[u32], dist_len: &[u8]) -> usize {
    let lit: usize = lit_freq
        .iter()
        .zip(lit_len)
        .map(|(&f, &l)| f as usize * l as usize)
        .sum();
    let dist: usize = dist_freq
        .iter()
        .zip(dist_len)
        .map(|(&f, &l)| f as usize * l as usize)
        .sum();
    lit + dist
}

fn fixed_body_cost(lit_freq: &[u32], dist_freq: &[u32], extra_bits: usize) -> usize {
    let lit_len = fixed_literal_lengths();
    let dist_len = fixed_distance_lengths();
    body_cost(lit_freq, &lit_len[..LITERAL_ALPHABET], dist_freq, &dist_len[..DISTANCE_ALPHABET])
        + extra_bits
}

#[derive(Debug, Clone, Copy)]
struct RleOp {
    symbol: u8,
    extra_bits: u8,
    extra_value: u16,
}

/// Run-length encodes a code-length sequence with the 16/17/18 escapes.
fn rle_encode(lengths: &[u8]) -> Vec<RleOp> {
    let mut ops = Vec::new();
    let mut index = 0;
    while index < lengths.len() {
        let value = lengths[index];
        let mut run = 1;
        while index + run < lengths.len() && lengths[index + run] == value {
            run += 1;
        }
        index += run;

        if value == 0 {
            let mut rest = run;
            while rest >= 11 {
                let take = rest.min(138);
                ops.push(RleOp {
                    symbol: 18,
                    extra_bits: 7,
                    extra_value: (take - 11) as u16,
                });
                rest -= take;
            }
            if rest >= 3 {
                ops.push(RleOp {
                    symbol: 17,
                    extra_bits: 3,
                    extra_value: (rest - 3) as u16,
                });
                rest = 0;
            }
            for _ in 0..rest {
                ops.push(RleOp {
                    symbol: 0,
                    extra_bits: 0,
                    extra_value: 0,
                });
            }
        } else {
            ops.push(RleOp {
                symbol: value,
                extra_bits: 0,
                extra_value: 0,
            });
            let mut rest = run - 1;
            while rest >= 3 {
                let take = rest.min(6);
                ops.push(RleOp {
                    symbol: 16,
                    extra_bits: 2,
                    extra_value: (take - 3) as u16,
                });
                rest -= take;
            }
            for _ in 0..rest {
                ops.push(RleOp {
                    symbol: value,
                    extra_bits: 0,
                    extra_value: 0,
                });
            }
        }
    }
    ops
}

struct DynamicPlan {
    lit_lengths: Vec<u8>,
    lit_codes: Vec<u16>,
    dist_lengths: Vec<u8>,
    dist_codes: Vec<u16>,
    cl_lengths: Vec<u8>,
    cl_codes: Vec<u16>,
    rle: Vec<RleOp>,
    hlit: usize,
    hdist: usize,
    hclen: usize,
    cost_bits: usize,
}

impl DynamicPlan {
    fn build(lit_freq: &[u32], dist_freq: &[u32], extra_bits: usize) -> Result<Self> {
        let lit_lengths = package_merge_lengths(lit_freq, 15);
        let dist_lengths = package_merge_lengths(dist_freq, 15);
        let lit_codes = canonical_codes(&lit_lengths)?;
        let dist_codes = canonical_codes(&dist_lengths)?;

        let hlit = trimmed_len(&lit_lengths, 257);
        let hdist = trimmed_len(&dist_lengths, 1);
        let mut combined = Vec::with_capacity(hlit + hdist);
        combined.extend_from_slice(&lit_lengths[..hlit]);
        combined.extend_from_slice(&dist_lengths[..hdist]);
        let rle = rle_encode(&combined);

        let mut cl_freq = vec![0u32; 19];
        for op in &rle {
            cl_freq[op.symbol as usize] += 1;
        }
        let cl_lengths = package_merge_lengths(&cl_freq, 7);
        let cl_codes = canonical_codes(&cl_lengths)?;

        let mut hclen = 4;
        for (slot, &symbol) in CODE_LENGTH_ORDER.iter().enumerate() {
            if cl_lengths[symbol] != 0 {
                hclen = hclen.max(slot + 1);
            }
        }

        let header_bits: usize = 14
            + 3 * hclen
            + rle
                .iter()
                .map(|op| cl_lengths[op.symbol as usize] as usize + op.extra_bits as usize)
                .sum::<usize>();
        let cost_bits = header_bits
            + body_cost(lit_freq, &lit_lengths, dist_freq, &dist_lengths)
            + extra_bits;

        Ok(DynamicPlan {
            lit_lengths,
            lit_codes,
            dist_lengths,
            dist_codes,
            cl_lengths,
            cl_codes,
            rle,
            hlit,
            hdist,
            hclen,
            cost_bits,
        })
    }
}

fn trimmed_len(lengths: &[u8], minimum: usize) -> usize {
    let mut len = lengths.len();
    while len > minimum && lengths[len - 1] == 0 {
        len -= 1;
    }
    len
}

fn emit_stored(bits: &mut BitWriter, input: &[u8]) {
    let mut chunks: Vec<&[u8]> = input.chunks(MAX_STORED_BLOCK).collect();
    if chunks.is_empty() {
        chunks.push(&[]);
    }
    let last = chunks.len() - 1;
    for (index, chunk) in chunks.iter().enumerate() {
        bits.write_bit(u8::from(index == last));
        bits.write_bits_low_first(0, 2);
        bits.align_to_byte();
        let len = chunk.len() as u16;
        bits.write_aligned_bytes(&len.to_le_bytes());
        bits.write_aligned_bytes(&(!len).to_le_bytes());
        bits.write_aligned_bytes(chunk);
    }
}

fn emit_tokens(
    bits: &mut BitWriter,
    tokens: &[Token],
    lit_codes: &[u16],
    lit_lengths: &[u8],
    dist_codes: &[u16],
    dist_lengths: &[u8],
) {
    for token in tokens {
        match token {
            Token::Literal(byte) => {
                let symbol = *byte as usize;
                bits.write_code_high_first(lit_codes[symbol].into(), lit_lengths[symbol]);
            }
            Token::Match { length, distance } => {
                let (symbol, extra_bits, extra_value) = length_to_code(*length);
                bits.write_code_high_first(
                    lit_codes[symbol as usize].into(),
                    lit_lengths[symbol as usize],
                );
                bits.write_bits_low_first(extra_value.into(), extra_bits);

                let (symbol, extra_bits, extra_value) = distance_to_code(*distance);
                bits.write_code_high_first(
                    dist_codes[symbol as usize].into(),
                    dist_lengths[symbol as usize],
                );
                bits.write_bits_low_first(extra_value.into(), extra_bits);
            }
        }
    }
    let end = END_OF_BLOCK as usize;
    bits.write_code_high_first(lit_codes[end].into(), lit_lengths[end]);
}

fn emit_fixed(bits: &mut BitWriter, tokens: &[Token]) -> Result<()> {
    let lit_lengths = fixed_literal_lengths();
    let dist_lengths = fixed_distance_lengths();
    let lit_codes = canonical_codes(&lit_lengths)?;
    let dist_codes = canonical_codes(&dist_lengths)?;

    bits.write_bit(1);
    bits.write_bits_low_first(1, 2);
    emit_tokens(
        bits,
        tokens,
        &lit_codes,
        &lit_lengths[..],
        &dist_codes,
        &dist_lengths[..],
    );
    Ok(())
}

fn emit_dynamic(bits: &mut BitWriter, tokens: &[Token], plan: &DynamicPlan) {
    bits.write_bit(1);
    bits.write_bits_low_first(2, 2);
    bits.write_bits_low_first((plan.hlit - 257) as u32, 5);
    bits.write_bits_low_first((plan.hdist - 1) as u32, 5);
    bits.write_bits_low_first((plan.hclen - 4) as u32, 4);
    for &symbol in CODE_LENGTH_ORDER.iter().take(plan.hclen) {
        bits.write_bits_low_first(plan.cl_lengths[symbol].into(), 3);
    }
    for op in &plan.rle {
        let symbol = op.symbol as usize;
        bits.write_code_high_first(plan.cl_codes[symbol].into(), plan.cl_lengths[symbol]);
        if op.extra_bits > 0 {
            bits.write_bits_low_first(op.extra_value.into(), op.extra_bits);
        }
    }
    emit_tokens(
        bits,
        tokens,
        &plan.lit_codes,
        &plan.lit_lengths,
        &plan.dist_codes,
        &plan.dist_lengths,
    );
}

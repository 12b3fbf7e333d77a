//! Static (two-pass) Huffman codec.
//!
//! Pass one tallies byte frequencies; pass two builds the tree, assigns
//! codes, and emits a self-describing payload: a code table followed by
//! the bitstream. The decoder never sees the frequencies, only the table,
//! so the tie-break used while merging nodes does not need to match
//! between encoder and decoder.
//!
//! Payload layout: `tableSize:u16 LE`, `dataSize:u64 LE`, `padding:u8`,
//! then `tableSize` records of `(symbol:u8, codeLen:u8, code:codeLen bits)`,
//! then the bitstream padded to a byte boundary.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use crate::Error;
use crate::bitio::{BitWriter,BitReader};
use crate::progress::ProgressCounter;

struct Node {
    byte: Option<u8>,
    freq: u64,
    left: Option<usize>,
    right: Option<usize>
}

impl Node {
    fn leaf(byte: u8,freq: u64) -> Self {
        Self { byte: Some(byte), freq, left: None, right: None }
    }
    fn internal(freq: u64,left: usize,right: usize) -> Self {
        Self { byte: None, freq, left: Some(left), right: Some(right) }
    }
    fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Builds the Huffman tree for `freq` (indexed by byte value) and returns
/// the arena plus the index of the root. Symbols with zero frequency are
/// excluded from the tree entirely.
fn build_tree(freq: &[u64;256]) -> (Vec<Node>,usize) {
    let mut arena: Vec<Node> = Vec::new();
    // (Reverse(freq), insertion order, arena index) so ties resolve by
    // earliest-created node, matching a stable merge order.
    let mut heap: BinaryHeap<Reverse<(u64,usize,usize)>> = BinaryHeap::new();
    let mut order = 0usize;
    for (byte,&f) in freq.iter().enumerate() {
        if f > 0 {
            arena.push(Node::leaf(byte as u8,f));
            heap.push(Reverse((f,order,arena.len() - 1)));
            order += 1;
        }
    }
    if arena.is_empty() {
        return (arena,0);
    }
    while heap.len() > 1 {
        let Reverse((f1,_,i1)) = heap.pop().unwrap();
        let Reverse((f2,_,i2)) = heap.pop().unwrap();
        arena.push(Node::internal(f1 + f2,i1,i2));
        let root_idx = arena.len() - 1;
        heap.push(Reverse((f1 + f2,order,root_idx)));
        order += 1;
    }
    let Reverse((_,_,root)) = heap.pop().unwrap();
    (arena,root)
}

/// Walks the tree depth-first, recording each leaf's code as a bit vector
/// (`false` = left/0, `true` = right/1). A single-leaf tree gets the
/// one-bit code `[false]`.
fn make_table(arena: &[Node],root: usize) -> Vec<(u8,Vec<bool>)> {
    let mut table = Vec::new();
    if arena[root].is_leaf() {
        table.push((arena[root].byte.unwrap(),vec![false]));
        return table;
    }
    let mut stack: Vec<(usize,Vec<bool>)> = vec![(root,Vec::new())];
    while let Some((idx,code)) = stack.pop() {
        let node = &arena[idx];
        if node.is_leaf() {
            table.push((node.byte.unwrap(),code));
            continue;
        }
        if let Some(r) = node.right {
            let mut c = code.clone();
            c.push(true);
            stack.push((r,c));
        }
        if let Some(l) = node.left {
            let mut c = code.clone();
            c.push(false);
            stack.push((l,c));
        }
    }
    table
}

pub fn encode(data: &[u8],progress: &ProgressCounter) -> Result<Vec<u8>,Error> {
    let mut freq = [0u64;256];
    for &b in data {
        freq[b as usize] += 1;
    }
    let (arena,root) = build_tree(&freq);
    let table = make_table(&arena,root);
    let mut lookup: Vec<Option<&Vec<bool>>> = vec![None;256];
    for (byte,code) in &table {
        lookup[*byte as usize] = Some(code);
    }

    let mut body = Vec::new();
    let padding;
    {
        let mut writer = BitWriter::create(&mut body);
        for (byte,code) in &table {
            writer.write_byte(*byte)?;
            writer.write_byte(code.len() as u8)?;
            for bit in code {
                writer.write_bit(*bit)?;
            }
        }
        for &b in data {
            let code = lookup[b as usize].expect("every byte in data has a table entry");
            for bit in code {
                writer.write_bit(*bit)?;
            }
            progress.add(1);
        }
        writer.flush()?;
        padding = writer.padding_bits();
    }

    let mut out = Vec::with_capacity(11 + body.len());
    out.extend_from_slice(&(table.len() as u16).to_le_bytes());
    out.extend_from_slice(&(data.len() as u64).to_le_bytes());
    out.push(padding);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decodes one file's payload and returns `(decoded bytes, bytes of
/// `payload` consumed)` so callers packing several files back to back know
/// where the next file's payload begins.
pub fn decode(payload: &[u8],progress: &ProgressCounter) -> Result<(Vec<u8>,usize),Error> {
    if payload.len() < 11 {
        return Err(Error::MalformedStream("static huffman header truncated".to_string()));
    }
    let table_size = u16::from_le_bytes([payload[0],payload[1]]) as usize;
    let data_size = u64::from_le_bytes(payload[2..10].try_into().unwrap());
    let padding = payload[10];
    let mut reader = BitReader::create(&payload[11..]);

    #[derive(Default)]
    struct DecNode { byte: Option<u8>, left: Option<usize>, right: Option<usize> }
    let mut arena: Vec<DecNode> = vec![DecNode::default()];
    const ROOT: usize = 0;

    for _ in 0..table_size {
        let symbol = reader.read_byte()?;
        let code_len = reader.read_byte()?;
        let mut current = ROOT;
        for _ in 0..code_len {
            if arena[current].byte.is_some() {
                return Err(Error::MalformedStream("huffman code passes through an already-assigned leaf".to_string()));
            }
            let bit = reader.read_bit()?;
            let next = if bit { arena[current].right } else { arena[current].left };
            let next = match next {
                Some(n) => n,
                None => {
                    arena.push(DecNode::default());
                    let n = arena.len() - 1;
                    if bit { arena[current].right = Some(n); } else { arena[current].left = Some(n); }
                    n
                }
            };
            current = next;
        }
        if arena[current].byte.is_some() || arena[current].left.is_some() || arena[current].right.is_some() {
            return Err(Error::MalformedStream("huffman table has a colliding or non-leaf code".to_string()));
        }
        arena[current].byte = Some(symbol);
    }

    let mut out = Vec::with_capacity(data_size as usize);
    for _ in 0..data_size {
        let mut current = ROOT;
        loop {
            if let Some(b) = arena[current].byte {
                if arena[current].left.is_none() && arena[current].right.is_none() {
                    out.push(b);
                    progress.add(1);
                    break;
                }
            }
            let bit = reader.read_bit()?;
            current = if bit {
                arena[current].right.ok_or_else(|| Error::MalformedStream("missing right child".to_string()))?
            } else {
                arena[current].left.ok_or_else(|| Error::MalformedStream("missing left child".to_string()))?
            };
        }
    }
    for _ in 0..padding {
        let _ = reader.read_bit();
    }
    Ok((out,11 + reader.bytes_consumed()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(data: &[u8]) {
        let progress = ProgressCounter::new();
        let encoded = encode(data,&progress).unwrap();
        let (decoded,consumed) = decode(&encoded,&ProgressCounter::new()).unwrap();
        assert_eq!(decoded,data);
        assert_eq!(consumed,encoded.len());
    }

    #[test]
    fn empty_input() {
        round_trip(&[]);
    }

    #[test]
    fn single_symbol_one_leaf_tree() {
        round_trip(&[0x41]);
        let encoded = encode(&[0x41],&ProgressCounter::new()).unwrap();
        let table_size = u16::from_le_bytes([encoded[0],encoded[1]]);
        assert_eq!(table_size,1);
    }

    #[test]
    fn repeated_symbol() {
        round_trip(&vec![0x41;1000]);
    }

    #[test]
    fn two_symbol_alphabet() {
        round_trip(b"ABABABAB");
    }

    #[test]
    fn all_256_alphabet() {
        let mut data: Vec<u8> = (0..=255).collect();
        data.extend((0..=255).rev());
        round_trip(&data);
        let encoded = encode(&data,&ProgressCounter::new()).unwrap();
        let table_size = u16::from_le_bytes([encoded[0],encoded[1]]);
        assert_eq!(table_size,256);
    }

    #[test]
    fn progress_matches_input_length() {
        let data = vec![1,2,3,4,5];
        let progress = ProgressCounter::new();
        encode(&data,&progress).unwrap();
        assert_eq!(progress.get(),data.len() as u64);
    }
}

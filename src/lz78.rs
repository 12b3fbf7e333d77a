//! LZ78 dictionary codec.
//!
//! Each token names a dictionary index (0 means "no prefix") plus one
//! literal byte that extends it; the resulting sequence becomes the next
//! dictionary entry. Every write is byte-aligned (16-bit index + 8-bit
//! byte, or a raw byte), so unlike the Huffman codecs this payload carries
//! no padding-bit count.
//!
//! The dictionary holds at most 65,535 entries. Once it fills, encoding
//! resets it and splices in a raw byte where a token would otherwise go;
//! the decoder mirrors that with the same capacity check.
//!
//! Token layout: `index:16`, `next_byte:8` (24 bits).
//!
//! Payload layout: `tokenCount:u64 LE`, `trailingSize:u16 LE`, the first
//! raw byte, the token stream (with raw bytes substituted at dictionary
//! resets), then `trailingSize` raw bytes left over at the end of input.

use std::collections::HashMap;
use crate::Error;
use crate::bitio::{BitWriter,BitReader};
use crate::progress::ProgressCounter;

const MAX_DICT_SIZE: u32 = 65535;

struct Token {
    index: u16,
    next_byte: u8
}

fn write_token<W: std::io::Write>(token: &Token,writer: &mut BitWriter<W>) -> Result<(),Error> {
    writer.write_bits(16,token.index as u64)?;
    writer.write_byte(token.next_byte)?;
    Ok(())
}

fn read_token<R: std::io::Read>(reader: &mut BitReader<R>) -> Result<Token,Error> {
    let index = reader.read_bits(16)? as u16;
    let next_byte = reader.read_byte()?;
    Ok(Token { index,next_byte })
}

pub fn encode(data: &[u8],progress: &ProgressCounter) -> Result<Vec<u8>,Error> {
    let mut body = Vec::new();
    let mut token_count: u64 = 0;
    let mut trailing_size: u16 = 0;

    if !data.is_empty() {
        let mut writer = BitWriter::create(&mut body);
        let mut dictionary: HashMap<Vec<u8>,u16> = HashMap::new();
        let mut current: Vec<u8> = Vec::new();
        let mut pos = 1usize;
        let mut next_index: u32 = 1;

        let first = data[0];
        writer.write_byte(first)?;
        progress.add(1);
        current.push(first);
        dictionary.insert(current.clone(),next_index as u16);
        next_index += 1;
        token_count += 1;
        current.clear();

        'outer: while pos < data.len() {
            let byte = data[pos];
            pos += 1;
            progress.add(1);

            let mut candidate = current.clone();
            candidate.push(byte);

            if dictionary.contains_key(&candidate) {
                current = candidate;
            } else {
                let index = if current.is_empty() { 0 } else { *dictionary.get(&current).expect("prefix always dictionary-resident") };
                write_token(&Token { index,next_byte: byte },&mut writer)?;
                dictionary.insert(candidate,next_index as u16);
                next_index += 1;
                current.clear();
                token_count += 1;
            }

            if next_index >= MAX_DICT_SIZE {
                if !current.is_empty() {
                    for &b in &current { writer.write_byte(b)?; }
                    trailing_size = current.len() as u16;
                    token_count += 1;
                    current.clear();
                    break 'outer;
                }

                dictionary.clear();
                if pos >= data.len() {
                    break 'outer;
                }
                let byte = data[pos];
                pos += 1;
                progress.add(1);
                writer.write_byte(byte)?;
                current.push(byte);
                dictionary.insert(current.clone(),1);
                next_index = 2;
                current.clear();
                token_count += 1;
            }
        }

        if !current.is_empty() {
            trailing_size = current.len() as u16;
            for &b in &current { writer.write_byte(b)?; }
        }
        writer.flush()?;
    }

    let mut out = Vec::with_capacity(10 + body.len());
    out.extend_from_slice(&token_count.to_le_bytes());
    out.extend_from_slice(&trailing_size.to_le_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decodes one file's payload and returns `(decoded bytes, bytes of
/// `payload` consumed)` so callers packing several files back to back know
/// where the next file's payload begins.
pub fn decode(payload: &[u8],progress: &ProgressCounter) -> Result<(Vec<u8>,usize),Error> {
    if payload.len() < 10 {
        return Err(Error::MalformedStream("lz78 header truncated".to_string()));
    }
    let token_count = u64::from_le_bytes(payload[0..8].try_into().unwrap());
    let trailing_size = u16::from_le_bytes([payload[8],payload[9]]);
    let mut reader = BitReader::create(&payload[10..]);
    let mut out: Vec<u8> = Vec::new();

    if token_count == 0 {
        return Ok((out,10));
    }

    let mut dictionary: Vec<Vec<u8>> = Vec::new();
    let mut next_index: u32 = 2;
    let mut decoded_count: u64 = 1;

    let first = reader.read_byte()?;
    out.push(first);
    progress.add(1);
    dictionary.push(vec![first]);

    while decoded_count < token_count {
        let token = read_token(&mut reader)?;
        let mut sequence = if token.index == 0 {
            Vec::new()
        } else {
            let idx = token.index as usize;
            if idx > dictionary.len() {
                return Err(Error::MalformedStream("lz78 dictionary index out of range".to_string()));
            }
            dictionary[idx - 1].clone()
        };
        sequence.push(token.next_byte);
        dictionary.push(sequence.clone());
        out.extend_from_slice(&sequence);
        progress.add(sequence.len() as u64);
        decoded_count += 1;
        next_index += 1;

        if next_index >= MAX_DICT_SIZE && decoded_count != token_count - 1 {
            dictionary.clear();
            let byte = reader.read_byte()?;
            out.push(byte);
            progress.add(1);
            dictionary.push(vec![byte]);
            decoded_count += 1;
            next_index = 2;
        }
    }

    for _ in 0..trailing_size {
        let byte = reader.read_byte()?;
        out.push(byte);
        progress.add(1);
    }

    Ok((out,10 + reader.bytes_consumed()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(data: &[u8]) {
        let progress = ProgressCounter::new();
        let encoded = encode(data,&progress).unwrap();
        assert_eq!(progress.get(),data.len() as u64);
        let (decoded,consumed) = decode(&encoded,&ProgressCounter::new()).unwrap();
        assert_eq!(decoded,data);
        assert_eq!(consumed,encoded.len());
    }

    #[test]
    fn empty_input() {
        round_trip(&[]);
    }

    #[test]
    fn single_symbol() {
        round_trip(&[0x41]);
    }

    #[test]
    fn repeated_symbol_builds_dictionary_chain() {
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
    }

    #[test]
    fn non_repeating_input_falls_back_to_literal_tokens() {
        let data: Vec<u8> = (0..=255).collect();
        round_trip(&data);
    }

    #[test]
    fn leaves_no_padding_byte_since_all_writes_are_byte_aligned() {
        let encoded = encode(b"hello world",&ProgressCounter::new()).unwrap();
        assert!(encoded.len() >= 10);
    }

    #[test]
    fn single_symbol_matches_golden_vector() {
        // token_count:u64 LE = 1, trailing_size:u16 LE = 0, body = [0x41]
        let expected: [u8; 11] = [0x01,0x00,0x00,0x00,0x00,0x00,0x00,0x00,0x00,0x00,0x41];
        let encoded = encode(&[0x41],&ProgressCounter::new()).unwrap();
        assert_eq!(hex::encode(&encoded),hex::encode(expected));
    }
}

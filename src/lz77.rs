//! LZ77 sliding-window codec.
//!
//! A 511-byte search buffer and a 63-byte look-ahead buffer slide over the
//! input; each step emits a 25-bit token describing either a literal byte
//! or a back-reference plus the byte that follows it.
//!
//! Token layout, MSB-first: `offset:9` (0 = literal), `length:6`,
//! `next_char:8`, `isEOF:1`, `hasNextChar:1`.
//!
//! Payload layout: `padding:u8`, then the token stream; the final token
//! has `isEOF = 1`.

use crate::Error;
use crate::bitio::{BitWriter,BitReader};
use crate::progress::ProgressCounter;

const SEARCH_SIZE: usize = 511;
const LOOKAHEAD_SIZE: usize = 63;
const MIN_MATCH: usize = 3;

struct Token {
    offset: u16,
    length: u8,
    next_char: u8,
    is_eof: bool,
    has_next_char: bool
}

fn write_token<W: std::io::Write>(token: &Token,writer: &mut BitWriter<W>) -> Result<(),Error> {
    writer.write_bits(9,token.offset as u64)?;
    writer.write_bits(6,token.length as u64)?;
    writer.write_byte(token.next_char)?;
    writer.write_bit(token.is_eof)?;
    writer.write_bit(token.has_next_char)?;
    Ok(())
}

fn read_token<R: std::io::Read>(reader: &mut BitReader<R>) -> Result<Token,Error> {
    let offset = reader.read_bits(9)? as u16;
    let length = reader.read_bits(6)? as u8;
    let next_char = reader.read_byte()?;
    let is_eof = reader.read_bit()?;
    let has_next_char = reader.read_bit()?;
    Ok(Token { offset,length,next_char,is_eof,has_next_char })
}

/// Longest match for `lookahead` found in `search`, and its offset (1-based,
/// counted back from the end of `search`). Ties keep the smallest offset
/// (the first one found, scanning from the most distant byte forward).
fn longest_match(search: &[u8],lookahead: &[u8]) -> (usize,usize) {
    let mut best_offset = 0;
    let mut best_len = 0;
    for offset in 1..=search.len() {
        let start = search.len() - offset;
        let mut len = 0;
        while len < lookahead.len() && start + len < search.len() && search[start + len] == lookahead[len] {
            len += 1;
        }
        if len > best_len {
            best_len = len;
            best_offset = offset;
        }
    }
    (best_offset,best_len)
}

/// Shifts `amount` bytes from lookahead into the search buffer (trimming it
/// to `SEARCH_SIZE`), then refills the lookahead buffer from `input`.
/// Returns the number of bytes freshly read from `input`.
fn slide(input: &mut std::slice::Iter<u8>,search: &mut Vec<u8>,lookahead: &mut Vec<u8>,amount: usize) -> usize {
    let amount = amount.min(lookahead.len());
    if amount == 0 {
        return 0;
    }
    search.extend(lookahead.drain(0..amount));
    if search.len() > SEARCH_SIZE {
        let excess = search.len() - SEARCH_SIZE;
        search.drain(0..excess);
    }
    let mut read = 0;
    while lookahead.len() < LOOKAHEAD_SIZE {
        match input.next() {
            Some(&b) => { lookahead.push(b); read += 1; },
            None => break
        }
    }
    read
}

pub fn encode(data: &[u8],progress: &ProgressCounter) -> Result<Vec<u8>,Error> {
    let mut body = Vec::new();
    let padding;
    {
        let mut writer = BitWriter::create(&mut body);
        let mut input = data.iter();
        let mut search: Vec<u8> = Vec::new();
        let mut lookahead: Vec<u8> = Vec::new();
        while lookahead.len() < LOOKAHEAD_SIZE {
            match input.next() {
                Some(&b) => { lookahead.push(b); progress.add(1); },
                None => break
            }
        }

        while !lookahead.is_empty() {
            let (offset,length) = longest_match(&search,&lookahead);

            if length >= MIN_MATCH {
                let mut token = Token { offset: offset as u16, length: length as u8, next_char: 0, is_eof: false, has_next_char: true };
                if length < lookahead.len() {
                    token.next_char = lookahead[length];
                    progress.add(slide(&mut input,&mut search,&mut lookahead,length + 1) as u64);
                    if lookahead.is_empty() {
                        token.is_eof = true;
                        write_token(&token,&mut writer)?;
                        break;
                    }
                } else {
                    progress.add(slide(&mut input,&mut search,&mut lookahead,length) as u64);
                    if lookahead.is_empty() {
                        token.is_eof = true;
                        token.has_next_char = false;
                        write_token(&token,&mut writer)?;
                        break;
                    }
                    token.next_char = lookahead[0];
                    progress.add(slide(&mut input,&mut search,&mut lookahead,1) as u64);
                }
                write_token(&token,&mut writer)?;
            } else {
                let mut token = Token { offset: 0, length: 0, next_char: lookahead[0], is_eof: false, has_next_char: true };
                progress.add(slide(&mut input,&mut search,&mut lookahead,1) as u64);
                if lookahead.is_empty() {
                    token.is_eof = true;
                    write_token(&token,&mut writer)?;
                    break;
                }
                write_token(&token,&mut writer)?;
            }
        }
        writer.flush()?;
        padding = writer.padding_bits();
    }
    let mut out = Vec::with_capacity(1 + body.len());
    out.push(padding);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decodes one file's payload and returns `(decoded bytes, bytes of
/// `payload` consumed)` so callers packing several files back to back know
/// where the next file's payload begins.
pub fn decode(payload: &[u8],progress: &ProgressCounter) -> Result<(Vec<u8>,usize),Error> {
    if payload.is_empty() {
        return Err(Error::MalformedStream("lz77 payload missing padding byte".to_string()));
    }
    let padding = payload[0];
    let mut reader = BitReader::create(&payload[1..]);
    let mut out: Vec<u8> = Vec::new();
    let mut saw_token = false;

    loop {
        let token = match read_token(&mut reader) {
            Ok(token) => token,
            // An empty file encodes to zero tokens, not a token stream that
            // happens to be empty; the very first read hitting end-of-input
            // means there was nothing to decode, not a truncated stream.
            Err(Error::EndOfInput) if !saw_token => break,
            Err(e) => return Err(e)
        };
        saw_token = true;
        if token.offset == 0 {
            out.push(token.next_char);
            progress.add(1);
        } else {
            let offset = token.offset as usize;
            if offset > out.len() {
                return Err(Error::MalformedStream("lz77 back-reference exceeds output history".to_string()));
            }
            let start = out.len() - offset;
            for i in 0..token.length as usize {
                let b = out[start + i];
                out.push(b);
                progress.add(1);
            }
            if token.has_next_char {
                out.push(token.next_char);
                progress.add(1);
            }
        }
        if token.is_eof {
            break;
        }
    }
    for _ in 0..padding {
        let _ = reader.read_bit();
    }
    Ok((out,1 + reader.bytes_consumed()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(data: &[u8]) {
        let encoded = encode(data,&ProgressCounter::new()).unwrap();
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
    fn repeated_symbol_produces_back_references() {
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
    fn window_bounds_are_respected() {
        let search: Vec<u8> = vec![1,2,3];
        let lookahead: Vec<u8> = vec![2,3,4];
        let (offset,length) = longest_match(&search,&lookahead);
        assert_eq!((offset,length),(2,2));
    }

    #[test]
    fn long_repetitive_input_stays_within_window() {
        let data: Vec<u8> = (0..2000).map(|i| (i % 7) as u8).collect();
        round_trip(&data);
    }
}

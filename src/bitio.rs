//! Bit-level I/O shared by all four codecs.
//!
//! Bits are packed MSB-first within each byte. `BitWriter` buffers whole
//! bytes in chunks before handing them to the underlying `Write`, and
//! `BitReader` pulls one byte at a time from the underlying `Read` as its
//! bit cursor advances past a byte boundary.

use std::io::{Read,Write};
use crate::Error;

const BUFFER_SIZE: usize = 4096;

/// Accumulates bits into bytes and writes them to `out` in buffered chunks.
pub struct BitWriter<W: Write> {
    out: W,
    buf: Vec<u8>,
    bit_register: u8,
    bit_count: u8,
    padding_bits: u8
}

impl<W: Write> BitWriter<W> {
    pub fn create(out: W) -> Self {
        Self {
            out,
            buf: Vec::with_capacity(BUFFER_SIZE),
            bit_register: 0,
            bit_count: 0,
            padding_bits: 0
        }
    }
    /// Number of zero bits appended by the most recent `flush`.
    pub fn padding_bits(&self) -> u8 {
        self.padding_bits
    }
    pub fn write_bit(&mut self,bit: bool) -> Result<(),Error> {
        self.bit_register = (self.bit_register << 1) | (bit as u8);
        self.bit_count += 1;
        if self.bit_count == 8 {
            self.buf.push(self.bit_register);
            self.bit_register = 0;
            self.bit_count = 0;
            if self.buf.len() >= BUFFER_SIZE {
                self.drain_buffer()?;
            }
        }
        Ok(())
    }
    pub fn write_byte(&mut self,byte: u8) -> Result<(),Error> {
        for i in (0..8).rev() {
            self.write_bit((byte >> i) & 1 != 0)?;
        }
        Ok(())
    }
    pub fn write_bits(&mut self,num_bits: u32,value: u64) -> Result<(),Error> {
        for i in (0..num_bits).rev() {
            self.write_bit((value >> i) & 1 != 0)?;
        }
        Ok(())
    }
    fn drain_buffer(&mut self) -> Result<(),Error> {
        self.out.write_all(&self.buf)?;
        self.buf.clear();
        Ok(())
    }
    /// Pads the partial byte (if any) with zero bits, tracks the padding
    /// count, and writes every buffered byte through to `out`. Idempotent
    /// when nothing is pending.
    pub fn flush(&mut self) -> Result<(),Error> {
        while self.bit_count != 0 {
            self.write_bit(false)?;
            self.padding_bits += 1;
        }
        self.drain_buffer()?;
        self.out.flush()?;
        Ok(())
    }
}

/// Reads individual bits MSB-first from `in_`, refilling its byte cache on demand.
pub struct BitReader<R: Read> {
    in_: R,
    current_byte: u8,
    bit_pos: u8,
    bytes_read: usize
}

impl<R: Read> BitReader<R> {
    pub fn create(in_: R) -> Self {
        Self { in_, current_byte: 0, bit_pos: 8, bytes_read: 0 }
    }
    /// Bytes pulled from the underlying reader so far. Since callers only
    /// ever read exactly as many bits as were written (data bits plus the
    /// declared padding), this equals the byte length of the consumed
    /// payload once decoding finishes.
    pub fn bytes_consumed(&self) -> usize {
        self.bytes_read
    }
    pub fn read_bit(&mut self) -> Result<bool,Error> {
        if self.bit_pos >= 8 {
            let mut byte = [0u8;1];
            match self.in_.read(&mut byte)? {
                1 => { self.current_byte = byte[0]; self.bytes_read += 1; },
                _ => return Err(Error::EndOfInput)
            }
            self.bit_pos = 0;
        }
        let bit = (self.current_byte >> (7 - self.bit_pos)) & 1 != 0;
        self.bit_pos += 1;
        Ok(bit)
    }
    pub fn read_bits(&mut self,num_bits: u32) -> Result<u64,Error> {
        if num_bits > 64 {
            return Err(Error::MalformedStream("requested more than 64 bits".to_string()));
        }
        let mut result: u64 = 0;
        for _ in 0..num_bits {
            result = (result << 1) | (self.read_bit()? as u64);
        }
        Ok(result)
    }
    pub fn read_byte(&mut self) -> Result<u8,Error> {
        Ok(self.read_bits(8)? as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_arbitrary_bits() {
        let bits = [true,false,false,true,true,true,false,false,true,false,true];
        let mut out = Vec::new();
        {
            let mut w = BitWriter::create(&mut out);
            for b in bits {
                w.write_bit(b).unwrap();
            }
            w.flush().unwrap();
            assert_eq!(w.padding_bits() as usize,(8 - bits.len() % 8) % 8);
        }
        let mut r = BitReader::create(&out[..]);
        for b in bits {
            assert_eq!(r.read_bit().unwrap(),b);
        }
    }

    #[test]
    fn byte_round_trip() {
        let mut out = Vec::new();
        let mut w = BitWriter::create(&mut out);
        w.write_byte(0xA5).unwrap();
        w.flush().unwrap();
        assert_eq!(w.padding_bits(),0);
        let mut r = BitReader::create(&out[..]);
        assert_eq!(r.read_byte().unwrap(),0xA5);
    }

    #[test]
    fn read_past_end_is_end_of_input() {
        let out: Vec<u8> = Vec::new();
        let mut r = BitReader::create(&out[..]);
        match r.read_bit() {
            Err(Error::EndOfInput) => (),
            other => panic!("expected EndOfInput, got {:?}",other.map(|_| ()))
        }
    }
}

//! Multi-file archive container.
//!
//! Packages an ordered list of files behind one of the four codecs into a
//! single container: a fixed header, per-file metadata, then the
//! concatenated compressed payloads in file order.
//!
//! Header layout: `"arch"` magic (4 bytes), `fileCount:u32 LE`, `alg:u8`.
//! Per-file metadata, repeated `fileCount` times ahead of any payload:
//! `nameLen:u32 LE`, `name` (opaque bytes, `nameLen` of them), then
//! `originalSize:u64 LE`. A name is whatever bytes the host file system
//! handed back; it is not required to be valid UTF-8. Each codec's own
//! payload is self-delimiting (its decoder reports how many bytes it
//! consumed), so no separate compressed-size field is needed.

use std::ffi::OsString;
use std::fs;
use std::os::unix::ffi::{OsStrExt,OsStringExt};
use std::path::Path;
use crate::Error;
use crate::progress::ProgressCounter;
use crate::{static_huffman,adaptive_huffman,lz77,lz78};

const MAGIC: &[u8;4] = b"arch";

/// Per-run tunables not fixed by the format itself.
#[derive(Clone)]
pub struct Options {
    /// When false, `unpack_with_options` refuses to overwrite a file
    /// already present at the destination path.
    pub overwrite: bool
}

pub const STD_OPTIONS: Options = Options { overwrite: true };

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum CompressAlg {
    StaticHuffman = 0,
    AdaptiveHuffman = 1,
    Lz77 = 2,
    Lz78 = 3
}

impl CompressAlg {
    fn from_u8(v: u8) -> Result<Self,Error> {
        match v {
            0 => Ok(CompressAlg::StaticHuffman),
            1 => Ok(CompressAlg::AdaptiveHuffman),
            2 => Ok(CompressAlg::Lz77),
            3 => Ok(CompressAlg::Lz78),
            other => Err(Error::InvalidArchive(format!("unknown algorithm id {other}")))
        }
    }
}

impl std::str::FromStr for CompressAlg {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self,Error> {
        match s {
            "static-huffman" => Ok(CompressAlg::StaticHuffman),
            "adaptive-huffman" => Ok(CompressAlg::AdaptiveHuffman),
            "lz77" => Ok(CompressAlg::Lz77),
            "lz78" => Ok(CompressAlg::Lz78),
            other => Err(Error::InvalidArchive(format!("unknown algorithm name '{other}'")))
        }
    }
}

impl std::fmt::Display for CompressAlg {
    fn fmt(&self,f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CompressAlg::StaticHuffman => "static-huffman",
            CompressAlg::AdaptiveHuffman => "adaptive-huffman",
            CompressAlg::Lz77 => "lz77",
            CompressAlg::Lz78 => "lz78"
        };
        write!(f,"{s}")
    }
}

fn encode_with(alg: CompressAlg,data: &[u8],progress: &ProgressCounter) -> Result<Vec<u8>,Error> {
    match alg {
        CompressAlg::StaticHuffman => static_huffman::encode(data,progress),
        CompressAlg::AdaptiveHuffman => adaptive_huffman::encode(data,progress),
        CompressAlg::Lz77 => lz77::encode(data,progress),
        CompressAlg::Lz78 => lz78::encode(data,progress)
    }
}

/// Decodes one file's payload from the front of `remaining`. Returns the
/// decoded bytes and how many bytes of `remaining` were consumed.
fn decode_with(alg: CompressAlg,remaining: &[u8],progress: &ProgressCounter) -> Result<(Vec<u8>,usize),Error> {
    match alg {
        CompressAlg::StaticHuffman => static_huffman::decode(remaining,progress),
        CompressAlg::AdaptiveHuffman => adaptive_huffman::decode(remaining,progress),
        CompressAlg::Lz77 => lz77::decode(remaining,progress),
        CompressAlg::Lz78 => lz78::decode(remaining,progress)
    }
}

fn check_unique_names(files: &[(Vec<u8>,Vec<u8>)]) -> Result<(),Error> {
    let mut seen = std::collections::HashSet::new();
    for (name,_) in files {
        if !seen.insert(name.as_slice()) {
            return Err(Error::InvalidArchive(format!("duplicate file name '{}' in archive",String::from_utf8_lossy(name))));
        }
    }
    Ok(())
}

/// Packs `files` (name, contents) into one archive buffer, tracking total
/// bytes consumed in `progress`. Rejects duplicate file names up front,
/// since the unpacker would otherwise overwrite one file with another. Names
/// are opaque bytes and are not required to be valid UTF-8.
pub fn pack_to_buffer_with_progress_raw(files: &[(Vec<u8>,Vec<u8>)],alg: CompressAlg,progress: &ProgressCounter) -> Result<Vec<u8>,Error> {
    check_unique_names(files)?;

    let mut out = Vec::new();
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&(files.len() as u32).to_le_bytes());
    out.push(alg as u8);

    for (name,data) in files {
        out.extend_from_slice(&(name.len() as u32).to_le_bytes());
        out.extend_from_slice(name);
        out.extend_from_slice(&(data.len() as u64).to_le_bytes());
    }

    for (_,data) in files {
        let payload = encode_with(alg,data,progress)?;
        out.extend_from_slice(&payload);
    }

    Ok(out)
}

/// Packs `files` into one archive buffer, discarding progress.
pub fn pack_to_buffer_raw(files: &[(Vec<u8>,Vec<u8>)],alg: CompressAlg) -> Result<Vec<u8>,Error> {
    pack_to_buffer_with_progress_raw(files,alg,&ProgressCounter::new())
}

/// Packs `files` (name, contents) into one archive buffer. Thin UTF-8
/// convenience wrapper over `pack_to_buffer_with_progress_raw`.
pub fn pack_to_buffer_with_progress(files: &[(String,Vec<u8>)],alg: CompressAlg,progress: &ProgressCounter) -> Result<Vec<u8>,Error> {
    let raw: Vec<(Vec<u8>,Vec<u8>)> = files.iter().map(|(n,d)| (n.as_bytes().to_vec(),d.clone())).collect();
    pack_to_buffer_with_progress_raw(&raw,alg,progress)
}

/// Packs `files` into one archive buffer, discarding progress.
pub fn pack_to_buffer(files: &[(String,Vec<u8>)],alg: CompressAlg) -> Result<Vec<u8>,Error> {
    pack_to_buffer_with_progress(files,alg,&ProgressCounter::new())
}

struct FileMeta {
    name: Vec<u8>,
    original_size: u64
}

fn read_header(data: &[u8]) -> Result<(CompressAlg,Vec<FileMeta>,usize),Error> {
    if data.len() < 9 || &data[0..4] != MAGIC {
        return Err(Error::InvalidArchive("missing 'arch' signature".to_string()));
    }
    let file_count = u32::from_le_bytes(data[4..8].try_into().unwrap()) as usize;
    let alg = CompressAlg::from_u8(data[8])?;

    let mut cursor = 9usize;
    let mut metas = Vec::with_capacity(file_count);
    for _ in 0..file_count {
        if cursor + 4 > data.len() {
            return Err(Error::InvalidArchive("truncated file metadata".to_string()));
        }
        let name_len = u32::from_le_bytes(data[cursor..cursor + 4].try_into().unwrap()) as usize;
        cursor += 4;
        if cursor + name_len + 8 > data.len() {
            return Err(Error::InvalidArchive("truncated file metadata".to_string()));
        }
        let name = data[cursor..cursor + name_len].to_vec();
        cursor += name_len;
        let original_size = u64::from_le_bytes(data[cursor..cursor + 8].try_into().unwrap());
        cursor += 8;
        metas.push(FileMeta { name,original_size });
    }
    Ok((alg,metas,cursor))
}

/// Unpacks an archive buffer into `(name, contents)` pairs in archive order.
/// Names are returned as the opaque bytes stored in the archive.
pub fn unpack_from_buffer_with_progress_raw(data: &[u8],progress: &ProgressCounter) -> Result<Vec<(Vec<u8>,Vec<u8>)>,Error> {
    let (alg,metas,mut cursor) = read_header(data)?;

    let mut results = Vec::with_capacity(metas.len());
    for meta in metas {
        let remaining = &data[cursor..];
        let (decoded,consumed) = decode_with(alg,remaining,progress)?;
        if decoded.len() as u64 != meta.original_size {
            return Err(Error::InvalidArchive(format!(
                "'{}' decoded to {} bytes, expected {}",String::from_utf8_lossy(&meta.name),decoded.len(),meta.original_size
            )));
        }
        cursor += consumed;
        results.push((meta.name,decoded));
    }

    Ok(results)
}

/// Unpacks an archive buffer, discarding progress.
pub fn unpack_from_buffer_raw(data: &[u8]) -> Result<Vec<(Vec<u8>,Vec<u8>)>,Error> {
    unpack_from_buffer_with_progress_raw(data,&ProgressCounter::new())
}

/// Unpacks an archive buffer into `(name, contents)` pairs in archive order.
/// Thin UTF-8 convenience wrapper over `unpack_from_buffer_with_progress_raw`;
/// fails if any stored name is not valid UTF-8.
pub fn unpack_from_buffer_with_progress(data: &[u8],progress: &ProgressCounter) -> Result<Vec<(String,Vec<u8>)>,Error> {
    let raw = unpack_from_buffer_with_progress_raw(data,progress)?;
    raw.into_iter()
        .map(|(name,contents)| {
            String::from_utf8(name)
                .map(|name| (name,contents))
                .map_err(|_| Error::InvalidArchive("file name is not valid UTF-8".to_string()))
        })
        .collect()
}

/// Unpacks an archive buffer, discarding progress.
pub fn unpack_from_buffer(data: &[u8]) -> Result<Vec<(String,Vec<u8>)>,Error> {
    unpack_from_buffer_with_progress(data,&ProgressCounter::new())
}

/// Reads `paths` from disk (using each path's file name, not its full path,
/// as the archive entry name) and writes a packed archive to `archive_path`.
/// File names are stored as the raw bytes the file system returns, so a
/// name that is not valid UTF-8 round-trips exactly instead of being
/// replaced with the Unicode replacement character.
pub fn pack(paths: &[std::path::PathBuf],archive_path: &Path,alg: CompressAlg,progress: &ProgressCounter) -> Result<(),Error> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path.file_name()
            .ok_or_else(|| Error::InvalidArchive(format!("'{}' has no file name",path.display())))?
            .as_bytes()
            .to_vec();
        let data = fs::read(path)?;
        files.push((name,data));
    }
    let packed = pack_to_buffer_with_progress_raw(&files,alg,progress)?;
    fs::write(archive_path,packed)?;
    Ok(())
}

/// Unpacks `archive_path` into `out_dir` under `options`, creating `out_dir`
/// if needed. When `options.overwrite` is false, refuses to clobber a file
/// already present at the destination.
pub fn unpack_with_options(archive_path: &Path,out_dir: &Path,progress: &ProgressCounter,options: &Options) -> Result<(),Error> {
    let data = fs::read(archive_path)?;
    let files = unpack_from_buffer_with_progress_raw(&data,progress)?;
    fs::create_dir_all(out_dir)?;
    for (name,contents) in files {
        let out_path = out_dir.join(OsString::from_vec(name));
        if !options.overwrite && out_path.exists() {
            return Err(Error::OutputExists(out_path.display().to_string()));
        }
        fs::write(out_path,contents)?;
    }
    Ok(())
}

/// Unpacks `archive_path` into `out_dir`, creating it if needed, always
/// overwriting existing files.
pub fn unpack(archive_path: &Path,out_dir: &Path,progress: &ProgressCounter) -> Result<(),Error> {
    unpack_with_options(archive_path,out_dir,progress,&STD_OPTIONS)
}

/// Total uncompressed bytes declared by an archive's metadata, for sizing
/// a `ProgressCounter` before unpacking starts.
pub fn total_original_size(data: &[u8]) -> Result<u64,Error> {
    let (_,metas,_) = read_header(data)?;
    Ok(metas.iter().map(|m| m.original_size).sum())
}

//! Content hashes: SHA-1 and ED2K (chunked MD4-of-MD4s).

use std::io::{Read, Seek, SeekFrom};

use md4::Digest as Md4Digest;
use sha1::Digest as Sha1Digest;

/// eDonkey2000 chunk size, in bytes.
const CHUNK_SIZE: u64 = 9_728_000;

/// Streaming ED2K accumulator. Feeds each chunk's MD4 digest into an
/// outer MD4; collapses to a single inner digest for files of one chunk
/// or fewer bytes.
struct Ed2k {
    inner: md4::Md4,
    outer: md4::Md4,
    chunk_bytes: u64,
    chunks_seen: u64,
}

impl Ed2k {
    fn new() -> Self {
        Self {
            inner: md4::Md4::new(),
            outer: md4::Md4::new(),
            chunk_bytes: 0,
            chunks_seen: 0,
        }
    }

    fn write(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            let room = (CHUNK_SIZE - self.chunk_bytes) as usize;
            let take = room.min(data.len());
            self.inner.update(&data[..take]);
            self.chunk_bytes += take as u64;
            data = &data[take..];

            // Only flush once we know another chunk follows -- a file whose
            // length is an exact multiple of the chunk size must NOT flush
            // its final chunk here, or a single-chunk file would collapse
            // to MD4(MD4(data)) instead of plain MD4(data).
            if self.chunk_bytes == CHUNK_SIZE && !data.is_empty() {
                self.flush_chunk();
            }
        }
    }

    fn flush_chunk(&mut self) {
        let digest = std::mem::replace(&mut self.inner, md4::Md4::new()).finalize();
        self.outer.update(digest);
        self.chunk_bytes = 0;
        self.chunks_seen += 1;
    }

    fn finish(mut self) -> [u8; 16] {
        if self.chunks_seen == 0 {
            // Never flushed: the whole file fit in one chunk (including
            // exactly `CHUNK_SIZE` bytes), so the root hash is plain MD4.
            self.inner.finalize().into()
        } else {
            // At least one earlier chunk was flushed, so the file spans
            // more than one chunk; fold the final (full or partial) chunk
            // in and hash the concatenation of per-chunk digests.
            let digest = self.inner.finalize();
            self.outer.update(digest);
            self.outer.finalize().into()
        }
    }
}

fn seek_start<R: Seek>(reader: &mut R) -> std::io::Result<()> {
    reader.seek(SeekFrom::Start(0))?;
    Ok(())
}

/// Lowercase hex SHA-1 of the full contents of `reader`, which is left
/// positioned at offset 0 afterwards.
pub fn sha1_hash<R: Read + Seek>(reader: &mut R) -> std::io::Result<String> {
    seek_start(reader)?;
    let mut hasher = sha1::Sha1::new();
    std::io::copy(reader, &mut hasher)?;
    let digest = hasher.finalize();
    seek_start(reader)?;
    Ok(hex::encode(digest))
}

/// Lowercase hex ED2K root hash of the full contents of `reader`, which is
/// left positioned at offset 0 afterwards.
pub fn ed2k_hash<R: Read + Seek>(reader: &mut R) -> std::io::Result<String> {
    seek_start(reader)?;

    let mut ed2k = Ed2k::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        ed2k.write(&buf[..n]);
    }

    seek_start(reader)?;
    Ok(hex::encode(ed2k.finish()))
}

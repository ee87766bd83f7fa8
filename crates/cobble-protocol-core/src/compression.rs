use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read as _, Write as _};

/// Gzip `data` as one stream whose plaintext starts with the big-endian
/// 32-bit uncompressed length.
pub fn compress_with_length(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let len = i32::try_from(data.len()).map_err(|_| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "payload too large")
    })?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&len.to_be_bytes())?;
    encoder.write_all(data)?;
    encoder.finish()
}

/// Inverse of [`compress_with_length`].
pub fn decompress_with_length(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut prefix = [0u8; 4];
    decoder.read_exact(&mut prefix)?;
    let len = i32::from_be_bytes(prefix);
    let len = usize::try_from(len).map_err(|_| {
        std::io::Error::new(std::io::ErrorKind::InvalidData, "negative length prefix")
    })?;
    let mut out = vec![0u8; len];
    decoder.read_exact(&mut out)?;
    Ok(out)
}

use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use marti_core::ContentHash;

use crate::store::StoredBlob;

const CHUNK_SIZE: usize = 64 * 1024;

/// Copy `reader` into `writer` chunk by chunk while computing the `SHA-256`
/// digest of everything copied.
///
/// The payload is never held in memory as a whole.
pub async fn copy_hashed<R, W>(reader: &mut R, writer: &mut W) -> std::io::Result<StoredBlob>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut size = 0u64;

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        writer.write_all(&buf[..n]).await?;
        size += n as u64;
    }
    writer.flush().await?;

    Ok(StoredBlob {
        hash: ContentHash::new(hex::encode(hasher.finalize())),
        size,
    })
}

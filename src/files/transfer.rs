//! Direct peer-to-peer file transfer over TCP.
//!
//! Request: the raw file name as the first payload of the connection.
//! Response: `u64` big-endian length followed by the file bytes. A server
//! that cannot serve the name closes without sending a header.

use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;

use super::store::{FileStore, validate_file_name};
use crate::error::TransferError;
use crate::transport::tcp::{read_framed_body, read_length_prefix, write_framed};

const MAX_REQUEST_SIZE: usize = 1024;

/// Serves one download request on an accepted connection.
pub async fn serve_request(
    mut stream: TcpStream,
    store: &FileStore,
    chunk_size: usize,
) -> Result<u64, TransferError> {
    let mut request = [0u8; MAX_REQUEST_SIZE];
    let n = stream.read(&mut request).await?;
    let name = String::from_utf8_lossy(&request[..n]).trim().to_string();

    let path = store.resolve(&name)?;
    let mut file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!("Requested file {} unavailable: {}", name, e);
            return Err(e.into());
        }
    };
    let len = file.metadata().await?.len();

    let sent = write_framed(&mut file, len, &mut stream, chunk_size).await?;
    stream.shutdown().await?;
    tracing::info!("Served {} ({} bytes)", name, sent);

    Ok(sent)
}

/// Requests `filename` from `host:port` and writes it to `dest`.
///
/// The destination is only created once the length header arrived. On an
/// interrupted body the partial file stays on disk.
pub async fn fetch_file<P>(
    host: &str,
    port: u16,
    filename: &str,
    dest: &Path,
    chunk_size: usize,
    progress: P,
) -> Result<u64, TransferError>
where
    P: FnMut(u64, u64),
{
    validate_file_name(filename)?;

    let addr = format!("{}:{}", host, port);
    let mut stream = TcpStream::connect(&addr)
        .await
        .map_err(|source| TransferError::Connect {
            addr: addr.clone(),
            source,
        })?;

    stream.write_all(filename.as_bytes()).await?;
    stream.flush().await?;

    let total = read_length_prefix(&mut stream).await?;
    tracing::debug!("Receiving {} ({} bytes) from {}", filename, total, addr);

    let file = tokio::fs::File::create(dest).await?;
    let mut writer = BufWriter::new(file);
    let received = read_framed_body(&mut stream, total, &mut writer, chunk_size, progress).await?;

    Ok(received)
}

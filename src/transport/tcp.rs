//! Stream side of the transport: the accept loop and the length-prefixed
//! framing used for file bodies.
//!
//! Frame layout: `u64` big-endian length, then exactly that many bytes.

use std::future::Future;
use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::error::{TransferError, TransportError};

pub struct TcpServer {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpServer {
    pub async fn bind(port: u16) -> Result<Self, TransportError> {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind {
                what: "tcp listener",
                addr,
                source,
            })?;
        let local_addr = listener.local_addr().map_err(TransportError::Receive)?;
        tracing::info!("TCP server listening on {}", local_addr);

        Ok(Self {
            listener,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Runs the accept loop, spawning `handler` for each connection.
    pub fn serve<F, Fut>(self, handler: F, shutdown: Arc<AtomicBool>, poll: Duration) -> JoinHandle<()>
    where
        F: Fn(TcpStream, SocketAddr) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(async move {
            while !shutdown.load(Ordering::Relaxed) {
                let accepted = match tokio::time::timeout(poll, self.listener.accept()).await {
                    Ok(accepted) => accepted,
                    Err(_) => continue,
                };

                match accepted {
                    Ok((stream, addr)) => {
                        tracing::debug!("Incoming TCP connection from {}", addr);
                        tokio::spawn(handler(stream, addr));
                    }
                    Err(e) => {
                        tracing::error!("TCP accept loop aborted: {}", e);
                        return;
                    }
                }
            }
            tracing::debug!("TCP accept loop stopped");
        })
    }
}

/// Writes the length header, then streams `len` bytes from `reader` in
/// `chunk_size` pieces.
pub async fn write_framed<R, W>(
    reader: &mut R,
    len: u64,
    writer: &mut W,
    chunk_size: usize,
) -> Result<u64, TransferError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    writer.write_all(&len.to_be_bytes()).await?;

    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut sent = 0u64;
    while sent < len {
        let want = (len - sent).min(buf.len() as u64) as usize;
        let n = reader.read(&mut buf[..want]).await?;
        if n == 0 {
            return Err(TransferError::Incomplete {
                received: sent,
                expected: len,
            });
        }
        writer.write_all(&buf[..n]).await?;
        sent += n as u64;
    }
    writer.flush().await?;

    Ok(sent)
}

/// Reads the 8-byte length header.
pub async fn read_length_prefix<R>(reader: &mut R) -> Result<u64, TransferError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 8];
    match reader.read_exact(&mut header).await {
        Ok(_) => Ok(u64::from_be_bytes(header)),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(TransferError::MissingHeader),
        Err(e) => Err(e.into()),
    }
}

/// Copies exactly `total` bytes from `reader` to `writer`, calling
/// `progress(received, total)` after every chunk.
///
/// A closed or reset connection before `total` bytes ends with
/// [`TransferError::Incomplete`]; whatever arrived has been written.
pub async fn read_framed_body<R, W, P>(
    reader: &mut R,
    total: u64,
    writer: &mut W,
    chunk_size: usize,
    mut progress: P,
) -> Result<u64, TransferError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    P: FnMut(u64, u64),
{
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut received = 0u64;

    while received < total {
        let want = (total - received).min(buf.len() as u64) as usize;
        let n = match reader.read(&mut buf[..want]).await {
            Ok(n) => n,
            Err(e) if is_disconnect(e.kind()) => 0,
            Err(e) => {
                writer.flush().await?;
                return Err(e.into());
            }
        };
        if n == 0 {
            writer.flush().await?;
            return Err(TransferError::Incomplete {
                received,
                expected: total,
            });
        }
        writer.write_all(&buf[..n]).await?;
        received += n as u64;
        progress(received, total);
    }
    writer.flush().await?;

    Ok(received)
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof
    )
}

//! Merged stdout/stderr of a job process.
//!
//! Both streams are one pipe, so lines reach the log processor in the order
//! the job wrote them. An `::add-mask::` on stdout therefore always lands
//! before a secret echoed on stderr.
use std::io::{self, PipeReader};
use std::process::Stdio;

#[cfg(unix)]
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::debug;

use rnr_report::LogWriter;

/// Read end plus the two write-end handles for the child's stdout and stderr.
pub(crate) fn merged_pipe() -> io::Result<(PipeReader, Stdio, Stdio)> {
    let (reader, writer) = std::io::pipe()?;
    let stderr = writer.try_clone()?;
    Ok((reader, Stdio::from(writer), Stdio::from(stderr)))
}

/// Forward every line of `reader` into `writer` until EOF.
#[cfg(unix)]
pub(crate) fn spawn_pump(reader: PipeReader, writer: LogWriter) -> io::Result<JoinHandle<()>> {
    use std::os::fd::OwnedFd;
    use tokio::net::unix::pipe::Receiver;

    let rx = Receiver::from_owned_fd(OwnedFd::from(reader))?;
    Ok(tokio::spawn(pump(rx, writer)))
}

#[cfg(not(unix))]
pub(crate) fn spawn_pump(reader: PipeReader, writer: LogWriter) -> io::Result<JoinHandle<()>> {
    use std::io::BufRead;

    let handle = tokio::runtime::Handle::current();
    Ok(tokio::task::spawn_blocking(move || {
        let mut reader = io::BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf).into_owned();
                    if handle.block_on(writer.write_line(line)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    debug!(error = %e, "job output closed");
                    break;
                }
            }
        }
    }))
}

#[cfg(unix)]
async fn pump<R: AsyncRead + Unpin>(reader: R, writer: LogWriter) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                if writer.write_line(line.into_owned()).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!(error = %e, "job output closed");
                break;
            }
        }
    }
}

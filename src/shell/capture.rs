//! Draining child output streams into a single value.

use super::outcome::Captured;
use crate::config::{Capture, Normalize};
use crate::error::{Result, ShellError, StreamName};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

/// Read `stream` to its end and turn the bytes into a [`Captured`] value.
///
/// A [`Capture::Custom`] transform receives the full buffer and its result is
/// returned as is. Otherwise the bytes are decoded as UTF-8 (invalid
/// sequences replaced) and passed through `normalize`.
pub async fn capture<R>(
    mut stream: R,
    name: StreamName,
    mode: &Capture,
    normalize: &Normalize,
) -> Result<Captured>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    stream
        .read_to_end(&mut buf)
        .await
        .map_err(|source| ShellError::Capture {
            stream: name,
            source,
        })?;
    debug!(stream = %name, bytes = buf.len(), "stream drained");

    match mode {
        Capture::Custom(transform) => {
            transform(buf).map_err(|source| ShellError::Transform {
                stream: name,
                source,
            })
        }
        Capture::Enabled | Capture::Disabled => {
            let text = String::from_utf8_lossy(&buf).into_owned();
            Ok(Captured::Text(normalize.apply(text)))
        }
    }
}

use bytes::Bytes;
use std::{
    fs::File,
    io::{self, Read},
    path::Path,
};
use tracing::{debug, info, warn};

/// Read the server certificate once, as raw DER bytes.
///
/// A missing file, a read error or a short read all mean "no certificate
/// configured" and never fail startup.
pub fn load_certificate(path: impl AsRef<Path>) -> Option<Bytes> {
    let path = path.as_ref();
    match read_exact_len(path) {
        Ok(der) => {
            info!(path = %path.display(), len = der.len(), "Server certificate loaded");
            Some(der)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No server certificate configured");
            None
        }
        Err(e) => {
            warn!(path = %path.display(), "Ignoring unreadable server certificate: {}", e);
            None
        }
    }
}

fn read_exact_len(path: &Path) -> io::Result<Bytes> {
    let mut file = File::open(path)?;
    let expected = file.metadata()?.len();
    let mut der = Vec::new();
    der.try_reserve(expected as usize)
        .map_err(|e| io::Error::new(io::ErrorKind::OutOfMemory, e))?;
    let read = file.read_to_end(&mut der)?;
    if (read as u64) < expected {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("read {read} of {expected} bytes"),
        ));
    }
    Ok(Bytes::from(der))
}

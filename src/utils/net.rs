//! Blocking HTTP primitives for SDK and bundle downloads.

use std::fs::File;
use std::io;
use std::path::Path;

use crate::error::{Error, Result};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build the shared blocking client.
///
/// The default 30s request timeout is disabled: SDK downloads run to
/// several gigabytes and a hung transfer is bounded by the CI job timeout
/// instead.
pub fn client() -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .user_agent(format!("ortci/{}", VERSION))
        .timeout(None)
        .build()
        .map_err(Error::from)
}

/// Download a URL to a local file, streaming the body to disk.
///
/// A non-success status is fatal; the body is never buffered whole in
/// memory.
pub fn download_to_file(
    client: &reqwest::blocking::Client,
    url: &str,
    dest: &Path,
) -> Result<()> {
    let mut response = client.get(url).send()?;

    if !response.status().is_success() {
        return Err(Error::http_status(
            format!("download {}", url),
            response.status().as_u16(),
        ));
    }

    let mut file = File::create(dest)?;
    io::copy(&mut response, &mut file)?;
    Ok(())
}

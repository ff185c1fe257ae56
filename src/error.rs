//! Errors returned by the content loader and the repository stats client.
use std::path::PathBuf;

use snafu::prelude::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum FolioError {
    /// Connection, timeout or body read failure.
    #[snafu(display("HTTP error GET {url}"))]
    Http { url: String, source: reqwest::Error },

    /// The server answered, but not with a 2xx status.
    #[snafu(display("GET {url} failed with status {status}"))]
    Status { url: String, status: u16 },

    #[snafu(display("Invalid GitHub URL: {url}"))]
    InvalidRepoUrl { url: String },

    /// A payload did not have the expected shape.
    #[snafu(display("Deserialization of {what}: {source}"))]
    Deserialization {
        what: String,
        source: serde_json::Error,
    },

    #[snafu(display("Failed to read {}: {source}", path.display()))]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Transport could not produce a response for another reason.
    #[snafu(display("{message}"))]
    Unavailable { message: String },
}

pub type Result<T, E = FolioError> = std::result::Result<T, E>;

use std::io;

use thiserror::Error;

/// Failures on the serial channel. Each variant names the operation that
/// failed, so a report tells the user what the client was doing at the time.
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("channel {path} unavailable: {source}")]
    Unavailable {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("clearing input on {path} failed: {source}")]
    Clear {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("writing to {path} failed: {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("reading from {path} failed: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Why a response could not be shown as structured data
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("no JSON object delimiters in response")]
    NoObject,

    #[error("malformed JSON object: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("could not parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("invalid config {path}: {reason}")]
    Invalid { path: String, reason: String },
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server answered {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("could not write archive: {0}")]
    Io(#[from] io::Error),
}

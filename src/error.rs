// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading a declaration file
#[derive(Error, Debug)]
pub enum DeclarationError {
    #[error("Failed to read declaration file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse declaration JSON in {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised while validating a declaration, before any side effect
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("You cannot use the same '{field}' on more than 1 episode (duplicate value: {value})")]
    Duplicate { field: &'static str, value: String },

    #[error("Missing required field '{field}'")]
    MissingField { field: String },

    #[error("Episode {number} has an invalid pubdate '{value}': {source}")]
    InvalidTimestamp {
        number: u32,
        value: String,
        #[source]
        source: TimestampError,
    },

    #[error("Invalid URL in '{field}': {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },
}

/// Errors that can occur while parsing a declared publish timestamp
#[derive(Error, Debug)]
pub enum TimestampError {
    #[error("timestamp is empty")]
    Empty,

    #[error("unrecognized timestamp format '{value}': {source}")]
    Unrecognized {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Errors that can occur while inspecting local media files
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Failed to read media file {path}: {source}")]
    SizeUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors reported by an object store
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to list objects in bucket {bucket} under '{prefix}': {source}")]
    ListFailed {
        bucket: String,
        prefix: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read tags of {key} in bucket {bucket}: {source}")]
    TagsFailed {
        bucket: String,
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid object metadata for {key}: {source}")]
    MetadataInvalid {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to put {key} into bucket {bucket}: {source}")]
    PutFailed {
        bucket: String,
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read upload source {path}: {source}")]
    SourceReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while reconciling declared episodes with remote state
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Episode {number} was found in storage at {key} without a guid; a feed item needs one")]
    MissingIdentifier { number: u32, key: String },
}

/// Errors that can occur while assembling or verifying the feed document
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Cannot assemble feed: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Failed to write XML: {0}")]
    Write(#[source] quick_xml::Error),

    #[error("Generated feed contains invalid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("Failed to parse RSS feed: {0}")]
    ParseFailed(#[from] rss::Error),

    #[error("Invalid URL in feed: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Generated feed has {found} items, expected {expected}")]
    ItemCountMismatch { expected: usize, found: usize },
}

/// Top-level errors for a publish run
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Declaration error: {0}")]
    Declaration(#[from] DeclarationError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),

    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("Failed to write feed document {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage rejected upload of {key}")]
    UploadRejected { key: String },
}

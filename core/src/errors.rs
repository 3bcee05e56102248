use axres::{ArscError, AxmlError};
use axres_zip::ZipError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApkError {
    /// Generic I/O error while trying to read or write data
    #[error(transparent)]
    IoError(#[from] io::Error),

    /// Got invalid input (for example, empty file or not apk)
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// Error occurred while parsing AndroidManifest.xml
    #[error("got error while parsing AndroidManifest.xml")]
    ManifestError(#[from] AxmlError),

    /// Error occurred while parsing resources.arsc
    #[error("got error while parsing resources.arsc")]
    ResourceError(#[from] ArscError),

    /// Error occurred while parsing apk as zip archive
    #[error("got error while parsing apk archive")]
    ZipError(#[from] ZipError),
}

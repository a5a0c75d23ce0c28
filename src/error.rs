use thiserror::Error;

use crate::feed::XmlError;
use crate::fetcher::FetchError;

/// Why a configuration or feed document could not be produced.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("error parsing JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("configuration document is empty or not an object")]
    EmptyConfig,
    #[error("error parsing XML: {0}")]
    Xml(#[from] XmlError),
}

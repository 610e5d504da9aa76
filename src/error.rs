//! Typed error kinds shared across the catalogue, instruction handlers,
//! compiler and diff engine (see spec §7: "names carry the contract, not
//! the code").

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("instruction `{instruction}` is required but was not provided")]
    MissingInstruction { instruction: &'static str },

    #[error("instructions `{a}` and `{b}` are mutually exclusive")]
    MutuallyExclusiveInstructions { a: &'static str, b: &'static str },

    #[error("field `{slug}` was not found on model `{model}`")]
    FieldNotFound { model: String, slug: String },

    #[error("model `{slug}` was not found in the catalogue")]
    ModelNotFound { slug: String },

    #[error("preset `{slug}` was not found on model `{model}`")]
    PresetNotFound { model: String, slug: String },

    #[error("invalid value for field `{field}`: {reason}")]
    InvalidFieldValue { field: String, reason: String },

    #[error("cycle detected among model link targets: {involved:?}")]
    CycleDetected { involved: Vec<String> },

    #[error("the driver aborted the query batch: {reason}")]
    DriverAborted { reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

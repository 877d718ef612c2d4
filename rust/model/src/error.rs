// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for model-access operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or querying a model
#[derive(Error, Debug)]
pub enum Error {
    #[error("not a STEP file: missing ISO-10303-21 header")]
    NotStep,

    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse entity: {0}")]
    Parse(String),

    #[error("entity #{0} not found")]
    EntityNotFound(u32),
}

impl Error {
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        Error::Parse(message.into())
    }
}

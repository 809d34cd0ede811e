//! Fatal front-end errors
//!
//! Problems in the program being compiled are never fatal; they are queued as
//! [`crate::diagnostics::Diagnostic`]s. The errors here are the ones that stop
//! a run outright: the source cannot be opened, or reading it fails.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontEndError {
    #[error("cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read source: {0}")]
    Read(#[from] io::Error),
}

//! Small helpers shared by the workspace binaries.

#![deny(missing_docs)]

pub mod env;

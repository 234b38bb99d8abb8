//! sbd: typed, hierarchical settings bundles.
//!
//! A [`domain::Bundle`] owns root [`domain::Group`]s; groups own entries and
//! nested groups. Bundles are read from and written to JSON documents.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

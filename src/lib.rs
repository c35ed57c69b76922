//! Core library for the esg-form-tools command line application.
//!
//! The library consolidates ESG metric requirements extracted from two
//! independent origins (regulatory filings and investor frameworks) and
//! renders them as a multi-tab Excel data-capture form. The modules are
//! structured to keep responsibilities narrow and composable: the record
//! model lives in [`model`], the merge and dedup logic in [`consolidate`],
//! sheet construction in [`layout`], the workbook writer under [`io`], and
//! run orchestration in [`pipeline`]. Extraction itself sits behind the
//! [`extract::ExtractionAdapter`] boundary and is not performed here.

pub mod consolidate;
pub mod error;
pub mod extract;
pub mod io;
pub mod layout;
pub mod model;
pub mod pipeline;

pub use error::{Result, ToolError};

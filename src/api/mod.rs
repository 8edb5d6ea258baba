//! Wiki.js GraphQL access used by the CLI commands and the TUI screens.

pub mod batch;
pub mod client;
pub mod export;
pub mod pages;

pub use batch::{BatchFailure, BatchReport, delete_pages};
pub use client::{WikiClient, parse_graphql_response};
pub use export::{ExportSummary, PageExport, export_pages};
pub use pages::{Page, PageApi, ResponseResult};

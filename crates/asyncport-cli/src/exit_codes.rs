//! Process exit codes
//!
//! Pipelines branch on these, so each failure class keeps its own code.

/// Import completed, including a release with version fallback warnings
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// The catalog rejected a request or returned unexpected content
pub const CATALOG_ERROR: i32 = 2;

/// The verify pass or an exact version found the catalog out of step with the documents
pub const INCONSISTENCY_ERROR: i32 = 3;

/// A document could not be parsed or lacks required information
pub const DOCUMENT_ERROR: i32 = 4;

/// IO error - file not found, unreadable pattern match, summary not writable
pub const IO_ERROR: i32 = 5;

/// A document uses an AsyncAPI feature the importer does not handle
pub const UNSUPPORTED_ERROR: i32 = 6;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;

//! Constants used throughout the Lawmark core crate.

/// Default SQLite database file when no explicit path is configured.
pub const DEFAULT_DATABASE_PATH: &str = "lawmark.db";

/// Page size used by listings and search when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Upper bound applied to any requested page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// How long a connection waits on a locked database before failing.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Lower bound of a search date range when only `to_date` is given.
pub const SEARCH_DATE_FLOOR: &str = "2000-01-01";

/// Date format accepted by search and statistics date parameters.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// NPA code assigned to documents created without one. Every catalogue must contain it.
pub const DEFAULT_NPA: &str = "NOTSELECTED";

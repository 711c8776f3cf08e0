/// Tokens shorter than this are never sent to the dictionary.
pub const MIN_LOOKUP_LEN: usize = 2;

/// Bucket count used by the density chart when the caller gives none.
pub const DEFAULT_BUCKETS: usize = 50;

/// Largest bucket count the CLI and HTTP API accept unless configured otherwise.
pub const DEFAULT_MAX_BUCKETS: usize = 10_000;

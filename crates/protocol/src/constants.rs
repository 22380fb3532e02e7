/// Default size of one read request (32 KiB).
///
/// Matches the largest read every common server honours without
/// splitting; OpenSSH answers up to 256 KiB but others cap lower.
pub const DEFAULT_CHUNK_SIZE: u32 = 32 * 1024;

/// Default number of read requests kept in flight per transfer.
pub const DEFAULT_CONCURRENCY: usize = 64;

/// Largest chunk size accepted in transfer options (4 MiB).
pub const MAX_CHUNK_SIZE: u32 = 4 * 1024 * 1024;

/// Largest number of concurrent reads accepted in transfer options.
pub const MAX_CONCURRENCY: usize = 1024;

// File type bits carried in the permissions attribute.
pub const S_IFMT: u32 = 0o170000;
pub const S_IFDIR: u32 = 0o040000;
pub const S_IFREG: u32 = 0o100000;

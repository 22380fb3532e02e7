//! Chunked bulk download of a single remote file over SFTP.
//!
//! [`fast_get`] stats the remote file, opens it, and keeps up to
//! `concurrency` byte-range reads in flight while writing the results to
//! the local destination strictly in offset order. Memory stays bounded
//! by the read window regardless of file size.

mod checksum;
mod chunked;
mod coordinator;
mod encoding;
mod error;
mod path;
mod progress;
mod sink;
mod types;

pub use checksum::{calculate_file_checksum, checksum_bytes};
pub use chunked::{Chunk, RemoteReadStream};
pub use coordinator::{TransferCoordinator, fast_get};
pub use encoding::Transcoder;
pub use error::{ErrorKind, NO_SUCH_FILE, RemoteOp, TransferError, classify};
pub use path::{resolve_local, resolve_remote};
pub use progress::{Progress, ProgressCallback, SpeedCalculator};
pub use sink::LocalWriteSink;
pub use types::{
    ChunkPlan, ChunkRequest, TransferOptions, TransferRequest, TransferResult, TransferState,
};

pub use fastget_protocol::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_CONCURRENCY};

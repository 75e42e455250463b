//! Filesystem abstraction for ccmd
//!
//! Provides a narrow filesystem capability ([`FileSystem`]) with a real OS
//! adapter and an in-memory double, plus the atomic write, backup and YAML
//! codec helpers the stores are built on.

pub mod checksum;
pub mod codec;
pub mod error;
pub mod filesystem;
pub mod io;
pub mod memory;
pub mod os;
pub mod path;

pub use error::{Error, Result};
pub use filesystem::{FileKind, FileStat, FileSystem};
pub use memory::{FaultOp, MemoryFs};
pub use os::OsFs;
pub use path::lexical_normalize;

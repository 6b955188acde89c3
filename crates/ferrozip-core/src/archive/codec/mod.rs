//! ZIP container codec
//!
//! Reading walks the central directory from the end of the file and keeps
//! every record it finds, so archives holding several entries under the
//! same name are seen in full. Writing streams each entry through deflate
//! or stores it, then patches its local header in place.
//!
//! Supported: stored and deflated entries, ZIP64 sizes, offsets and entry
//! counts, Unix modes, the extended timestamp field. Not supported:
//! encryption, multi-disk archives, other compression methods.

mod format;
mod reader;
mod writer;

pub use format::CentralRecord;
pub use reader::{ArchiveReader, EntryReader};
pub use writer::{ArchiveWriter, EntryHeader};

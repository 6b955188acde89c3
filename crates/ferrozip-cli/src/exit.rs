//! Process exit codes

use ferrozip_core::Error;

/// Map errors to exit codes:
/// - 0: Success
/// - 1: General or configuration error
/// - 2: IO error or missing file
/// - 3: Unsafe entry path or existing file
/// - 4: Invalid or unreadable archive
pub fn map_error_to_exit_code(err: &anyhow::Error) -> i32 {
    if let Some(core_err) = err.downcast_ref::<Error>() {
        match core_err {
            Error::Config(_) => 1,
            Error::Io(_) => 2,
            Error::PathIo { .. } => 2,
            Error::NotFound(_) => 2,
            Error::PathTraversal(_) => 3,
            Error::FileExists(_) => 3,
            Error::InvalidArchive { .. } => 4,
            Error::Zip(_) => 4,
        }
    } else if err.is::<std::io::Error>() {
        2
    } else {
        1
    }
}

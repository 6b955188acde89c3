//! ferrozip-cli - shared plumbing for the `fzip` and `fzunzip` commands
//!
//! Both binaries install the same logging, map core errors onto the same
//! exit codes, and parse Info-ZIP style `-0` … `-9` level flags. The
//! `unzip -l` table renderer also lives here so it can be tested without
//! spawning a process.

pub mod exit;
pub mod level;
pub mod listing;
pub mod logging;

pub use exit::map_error_to_exit_code;
pub use level::LevelFlags;
pub use listing::render_listing;
pub use logging::setup_logging;

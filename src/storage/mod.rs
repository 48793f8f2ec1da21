//! File system storage management
//!
//! Path confinement, validation and the operations built on top of them.

pub mod filesystem;
pub mod operations;
pub mod resolver;
pub mod results;
pub mod validation;

pub use operations::{
    delete_entry, list_directory, make_directory, prepare_download, read_text_file, rename_entry,
    save_uploads, stat_entry, write_text_file,
};
pub use resolver::PathResolver;
pub use results::{
    DeleteResult, DirectoryEntry, DownloadTarget, EntryKind, UploadItem, UploadRejection,
    UploadReport,
};
pub use validation::{TEXT_EXTENSIONS, is_text_like};

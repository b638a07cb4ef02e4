//! Collaborator traits (ports)

mod user_directory;

pub use user_directory::{DirectoryResult, UserDirectory};

//! File-level I/O: the CSV codec and the filesystem collaborators.

pub mod csv;
pub mod fs;

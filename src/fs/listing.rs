use chrono::{DateTime, Utc};

use super::{FileInfo, Fs, Object};
use crate::{
    path,
    protocol::{Entry, EntryType},
};

/// A subdirectory found in a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    remote: String,
    mod_time: DateTime<Utc>,
}

impl Directory {
    pub fn remote(&self) -> &str {
        &self.remote
    }

    pub fn mod_time(&self) -> DateTime<Utc> {
        self.mod_time
    }
}

/// Entries returned by [`Fs::list`].
#[derive(Debug, Clone)]
pub enum DirEntry {
    Dir(Directory),
    Object(Object),
}

impl DirEntry {
    /// Path relative to the filesystem root
    pub fn remote(&self) -> &str {
        match self {
            Self::Dir(dir) => dir.remote(),
            Self::Object(object) => object.remote(),
        }
    }
}

/// Turns the raw listing of `dir` into entries, dropping `.` and `..`.
/// Links are reported as objects.
pub(super) fn convert(fs: &Fs, dir: &str, entries: Vec<Entry>) -> Vec<DirEntry> {
    entries
        .into_iter()
        .filter(|e| !(e.entry_type == EntryType::Folder && (e.name == "." || e.name == "..")))
        .map(|entry| {
            let remote = if dir.is_empty() {
                entry.name.clone()
            } else {
                path::join(dir, &entry.name)
            };

            match entry.entry_type {
                EntryType::Folder => DirEntry::Dir(Directory {
                    remote,
                    mod_time: entry.time,
                }),
                EntryType::File | EntryType::Link => {
                    let info = FileInfo::from_entry(&remote, &entry);
                    DirEntry::Object(Object::new(fs.clone(), &remote, info))
                }
            }
        })
        .collect()
}

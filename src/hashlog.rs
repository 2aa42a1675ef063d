//! `.hashlog` files map the FNV-1a hashes written by
//! [`HashLayout`](crate::layouts::HashLayout) back to logger names and
//! message patterns.
//!
//! ```text
//! [u32 count] { [u32 hash][u16 length][bytes] } * count
//! ```

use std::{
    collections::{hash_map::Entry, HashMap},
    fs::File,
    io::{BufWriter, ErrorKind, Read, Write},
    path::{Path, PathBuf},
};

use crate::{
    codec::{Cursor, PutLe},
    error::{IoResultExt, LoggingError, Result},
    layouts::{binary::clip, fnv1a},
    record::Record,
};

pub const HASHLOG_FILE_NAME: &str = ".hashlog";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Hashlog {
    entries: HashMap<u32, String>,
}

impl Hashlog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locates the map for `path`: the path itself if it is a file,
    /// otherwise `.hashlog` in that directory or the closest ancestor.
    pub fn find(path: &Path) -> Option<PathBuf> {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        path.ancestors()
            .map(|dir| dir.join(HASHLOG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Map file named by a user supplied path. A directory is searched like
    /// [`Hashlog::find`] and falls back to a new `.hashlog` inside it.
    pub fn locate(path: &Path) -> PathBuf {
        if path.is_dir() {
            Self::find(path).unwrap_or_else(|| path.join(HASHLOG_FILE_NAME))
        } else {
            path.to_path_buf()
        }
    }

    /// Reads a map file. A missing file yields an empty map.
    pub fn load(path: &Path) -> Result<Self> {
        let mut data = Vec::new();
        match File::open(path) {
            Ok(mut file) => {
                file.read_to_end(&mut data).with_path(path)?;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(LoggingError::io(path, e)),
        }
        Self::parse(&data)
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        let count = cursor.u32()?;
        let mut entries = HashMap::with_capacity(count as usize);
        for _ in 0..count {
            let hash = cursor.u32()?;
            let len = cursor.u16()? as usize;
            entries.insert(hash, cursor.str(len)?.to_string());
        }
        Ok(Self { entries })
    }

    /// Serialized map, entries ordered by hash.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut hashes: Vec<_> = self.entries.keys().copied().collect();
        hashes.sort_unstable();

        let mut data = Vec::new();
        data.put_u32(hashes.len() as u32);
        for hash in hashes {
            let value = clip(&self.entries[&hash], u16::MAX as usize);
            data.put_u32(hash);
            data.put_u16(value.len() as u16);
            data.extend_from_slice(value.as_bytes());
        }
        data
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut file = BufWriter::new(File::create(path).with_path(path)?);
        file.write_all(&self.to_bytes()).with_path(path)?;
        file.flush().with_path(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, hash: u32) -> Option<&str> {
        self.entries.get(&hash).map(String::as_str)
    }

    /// The string for `hash`, or the hash itself in hex when unknown.
    pub fn resolve(&self, hash: u32) -> String {
        match self.get(hash) {
            Some(value) => value.to_string(),
            None => format!("0x{:X}", hash),
        }
    }

    /// Adds `value` under its hash. Returns `true` if it was new; a
    /// different string with the same hash is a collision.
    pub fn insert(&mut self, value: &str) -> Result<bool> {
        let hash = fnv1a(value);
        match self.entries.entry(hash) {
            Entry::Vacant(entry) => {
                entry.insert(value.to_string());
                Ok(true)
            }
            Entry::Occupied(entry) if entry.get() == value => Ok(false),
            Entry::Occupied(entry) => Err(LoggingError::HashCollision {
                hash,
                previous: entry.get().clone(),
                conflict: value.to_string(),
            }),
        }
    }

    /// Learns the logger name and message pattern of `record`.
    pub fn update_from(&mut self, record: &Record) -> Result<bool> {
        let logger = self.insert(&record.logger)?;
        let message = self.insert(&record.message)?;
        Ok(logger || message)
    }
}

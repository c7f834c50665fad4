//! Cassette file names as stored in the name block.

use std::fmt;
use std::path::Path;

pub const NAME_LEN: usize = 8;
pub const EXT_LEN: usize = 3;

/// Kind of source file, decided from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// `.bas`: BASIC source text
    Basic,
    /// `.bac`: tokenized BASIC, sent as is
    Compiled,
    /// Any other extension, treated as text
    Other,
    /// No extension at all
    Bare,
}

impl FileKind {
    /// A dot file such as `.bas` counts as having that extension.
    pub fn from_path(path: &Path) -> Self {
        let ext = path.extension().or_else(|| {
            path.file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_prefix('.'))
                .map(std::ffi::OsStr::new)
        });
        match ext.map(|e| e.to_string_lossy().to_ascii_lowercase()) {
            Some(ext) if ext == "bas" => FileKind::Basic,
            Some(ext) if ext == "bac" => FileKind::Compiled,
            Some(_) => FileKind::Other,
            None => FileKind::Bare,
        }
    }

    pub fn ext_tag(self) -> [u8; EXT_LEN] {
        match self {
            FileKind::Basic => *b"BAS",
            _ => *b"BAC",
        }
    }

    /// Text sources get `\n` translated to the ABC's `\r`.
    pub fn converts_lines(self) -> bool {
        matches!(self, FileKind::Basic | FileKind::Other)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CassetteName {
    name: [u8; NAME_LEN],
    ext: [u8; EXT_LEN],
}

impl CassetteName {
    /// Uppercase, truncate and space-pad `name` and `ext`.
    pub fn new(name: &str, ext: &str) -> Self {
        Self {
            name: pad_upper(name.as_bytes()),
            ext: pad_upper(ext.as_bytes()),
        }
    }

    /// Name used when reading from stdin.
    pub fn stdin() -> Self {
        Self {
            name: *b"TESTTT  ",
            ext: *b"BAC",
        }
    }

    /// Derive the cassette name from a file path: the part of the base name
    /// before the first `.`, plus the extension tag of its [`FileKind`].
    pub fn from_path(path: &Path) -> Self {
        let base = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = base.split('.').next().unwrap_or("");

        Self {
            name: pad_upper(stem.as_bytes()),
            ext: FileKind::from_path(path).ext_tag(),
        }
    }

    pub fn name(&self) -> &[u8; NAME_LEN] {
        &self.name
    }

    pub fn ext(&self) -> &[u8; EXT_LEN] {
        &self.ext
    }
}

impl Default for CassetteName {
    fn default() -> Self {
        Self::stdin()
    }
}

impl fmt::Display for CassetteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}",
            String::from_utf8_lossy(&self.name),
            String::from_utf8_lossy(&self.ext)
        )
    }
}

fn pad_upper<const N: usize>(src: &[u8]) -> [u8; N] {
    let mut out = [b' '; N];
    for (dst, &c) in out.iter_mut().zip(src) {
        *dst = c.to_ascii_uppercase();
    }
    out
}

use glob::Pattern;

use crate::error::Result;
use crate::file::CabFile;
use crate::parser;
use crate::writer;

/// An in-memory cabinet: an insertion-ordered collection of [`CabFile`]
/// entries keyed by name, plus the archive-level metadata needed to
/// round-trip a parsed cabinet byte for byte.
///
/// ```no_run
/// use cabarchive::{CabArchive, CabFile};
///
/// let mut archive = CabArchive::new();
/// archive.insert(CabFile::new("hello.txt", b"hello world".to_vec()));
/// let cabinet: Vec<u8> = archive.save(true, true)?;
/// let parsed = CabArchive::parse(&cabinet)?;
/// assert_eq!(parsed.get("hello.txt").unwrap().len(), 11);
/// # Ok::<(), cabarchive::Error>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct CabArchive {
    files: Vec<CabFile>,
    set_id: u16,
    reserve_data: Vec<u8>,
}

impl CabArchive {
    /// Creates an empty archive.
    pub fn new() -> CabArchive {
        CabArchive::default()
    }

    /// Parses a cabinet from a byte buffer.
    pub fn parse(buf: &[u8]) -> Result<CabArchive> {
        parser::parse(buf, false)
    }

    /// Parses a cabinet, keeping only the final path segment of each
    /// stored name.
    pub fn parse_flattened(buf: &[u8]) -> Result<CabArchive> {
        parser::parse(buf, true)
    }

    /// Adds a file to the archive. If an entry with the same name already
    /// exists it is replaced, keeping its position in iteration order.
    pub fn insert(&mut self, file: CabFile) {
        for existing in self.files.iter_mut() {
            if existing.name() == file.name() {
                *existing = file;
                return;
            }
        }
        self.files.push(file);
    }

    /// Looks up a file by its exact name.
    pub fn get(&self, name: &str) -> Option<&CabFile> {
        self.files.iter().find(|file| file.name() == name)
    }

    /// Looks up a file by its exact name, mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut CabFile> {
        self.files.iter_mut().find(|file| file.name() == name)
    }

    /// Returns true if the archive holds a file with this exact name.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Finds the first file whose name matches a glob pattern. An invalid
    /// pattern matches nothing.
    pub fn find_file(&self, pattern: &str) -> Option<&CabFile> {
        let pattern = Pattern::new(pattern).ok()?;
        self.files.iter().find(|file| pattern.matches(file.name()))
    }

    /// Finds all files whose names match a glob pattern, in iteration
    /// order.
    pub fn find_files(&self, pattern: &str) -> Vec<&CabFile> {
        match Pattern::new(pattern) {
            Ok(pattern) => self
                .files
                .iter()
                .filter(|file| pattern.matches(file.name()))
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Iterates over the files in insertion order.
    pub fn iter(&self) -> std::slice::Iter<CabFile> {
        self.files.iter()
    }

    /// Iterates over the file names in insertion order.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(CabFile::name)
    }

    /// The number of files in the archive.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if the archive holds no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The cabinet set id, kept only for round-trip fidelity.
    pub fn cabinet_set_id(&self) -> u16 {
        self.set_id
    }

    /// Sets the cabinet set id written into the header on save.
    pub fn set_cabinet_set_id(&mut self, set_id: u16) {
        self.set_id = set_id;
    }

    /// The application-defined reserved header bytes from the parsed
    /// cabinet, if any. These are not written back out.
    pub fn reserve_data(&self) -> &[u8] {
        &self.reserve_data
    }

    pub(crate) fn set_reserve_data(&mut self, data: Vec<u8>) {
        self.reserve_data = data;
    }

    /// Serializes the archive to cabinet bytes, MSZIP-compressed when
    /// `compress` is set and in ascending name order when `sort` is set.
    pub fn save(&self, compress: bool, sort: bool) -> Result<Vec<u8>> {
        writer::write(self, compress, sort)
    }
}

impl<'a> IntoIterator for &'a CabArchive {
    type Item = &'a CabFile;
    type IntoIter = std::slice::Iter<'a, CabFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

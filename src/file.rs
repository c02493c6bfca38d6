use time::PrimitiveDateTime;

use crate::consts;
use crate::datetime::{datetime_from_bits, datetime_to_bits};

/// One named entry in a cabinet.
///
/// Owns its decoded contents; an entry may also be metadata-only, in which
/// case it contributes zero bytes when the archive is saved. Timestamps are
/// kept as the raw packed DOS bits so that parsing and re-saving a cabinet
/// reproduces them exactly, even when they do not decode to a valid
/// calendar date.
#[derive(Clone, Debug)]
pub struct CabFile {
    name: String,
    data: Option<Vec<u8>>,
    date: u16,
    time: u16,
    is_read_only: bool,
    is_hidden: bool,
    is_system: bool,
    is_archive: bool,
    is_exec: bool,
}

impl CabFile {
    /// Creates a file entry with the given contents and all attribute
    /// flags cleared. The timestamp defaults to zero bits (which do not
    /// decode to a valid date) so that output is reproducible; call
    /// [`set_datetime`](CabFile::set_datetime) for a real timestamp.
    pub fn new<S: Into<String>>(name: S, data: Vec<u8>) -> CabFile {
        CabFile {
            name: name.into(),
            data: Some(data),
            date: 0,
            time: 0,
            is_read_only: false,
            is_hidden: false,
            is_system: false,
            is_archive: false,
            is_exec: false,
        }
    }

    /// Creates an entry with no contents at all.
    pub fn metadata_only<S: Into<String>>(name: S) -> CabFile {
        CabFile { data: None, ..CabFile::new(name, Vec::new()) }
    }

    /// The name under which this entry is stored, with path separators
    /// preserved as parsed.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The decoded contents, or `None` for a metadata-only entry.
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Replaces the contents.
    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data = Some(data);
    }

    /// The content length in bytes; zero for a metadata-only entry.
    pub fn len(&self) -> usize {
        match self.data {
            Some(ref data) => data.len(),
            None => 0,
        }
    }

    /// Returns true if the entry holds no content bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The stored timestamp, if its bits decode to a valid date and time.
    pub fn datetime(&self) -> Option<PrimitiveDateTime> {
        datetime_from_bits(self.date, self.time)
    }

    /// Sets the stored timestamp; `None` clears it to zero bits. Dates
    /// outside the representable 1980-2107 range lose precision rather
    /// than failing.
    pub fn set_datetime(&mut self, datetime: Option<PrimitiveDateTime>) {
        let (date, time) = match datetime {
            Some(datetime) => datetime_to_bits(datetime),
            None => (0, 0),
        };
        self.date = date;
        self.time = time;
    }

    /// The read-only attribute flag.
    pub fn is_read_only(&self) -> bool {
        self.is_read_only
    }

    /// Sets the read-only attribute flag.
    pub fn set_is_read_only(&mut self, value: bool) {
        self.is_read_only = value;
    }

    /// The hidden attribute flag.
    pub fn is_hidden(&self) -> bool {
        self.is_hidden
    }

    /// Sets the hidden attribute flag.
    pub fn set_is_hidden(&mut self, value: bool) {
        self.is_hidden = value;
    }

    /// The system-file attribute flag.
    pub fn is_system(&self) -> bool {
        self.is_system
    }

    /// Sets the system-file attribute flag.
    pub fn set_is_system(&mut self, value: bool) {
        self.is_system = value;
    }

    /// The "modified since last backup" flag.
    pub fn is_archive(&self) -> bool {
        self.is_archive
    }

    /// Sets the "modified since last backup" flag.
    pub fn set_is_archive(&mut self, value: bool) {
        self.is_archive = value;
    }

    /// The executable attribute flag.
    pub fn is_exec(&self) -> bool {
        self.is_exec
    }

    /// Sets the executable attribute flag.
    pub fn set_is_exec(&mut self, value: bool) {
        self.is_exec = value;
    }

    /// True if storing this entry's name requires the UTF-8 attribute
    /// bit. Derived from the name, never stored.
    pub fn name_is_utf8(&self) -> bool {
        !self.name.is_ascii()
    }

    /// The name as written to the wire, with Win32 path separators.
    pub(crate) fn name_win32(&self) -> String {
        self.name.replace('/', "\\")
    }

    pub(crate) fn datetime_bits(&self) -> (u16, u16) {
        (self.date, self.time)
    }

    pub(crate) fn set_datetime_bits(&mut self, date: u16, time: u16) {
        self.date = date;
        self.time = time;
    }

    pub(crate) fn attribute_bits(&self) -> u16 {
        let mut attributes = 0;
        if self.is_read_only {
            attributes |= consts::ATTR_READ_ONLY;
        }
        if self.is_hidden {
            attributes |= consts::ATTR_HIDDEN;
        }
        if self.is_system {
            attributes |= consts::ATTR_SYSTEM;
        }
        if self.is_archive {
            attributes |= consts::ATTR_ARCH;
        }
        if self.is_exec {
            attributes |= consts::ATTR_EXEC;
        }
        if self.name_is_utf8() {
            attributes |= consts::ATTR_NAME_IS_UTF;
        }
        attributes
    }

    pub(crate) fn set_attribute_bits(&mut self, attributes: u16) {
        self.is_read_only = attributes & consts::ATTR_READ_ONLY != 0;
        self.is_hidden = attributes & consts::ATTR_HIDDEN != 0;
        self.is_system = attributes & consts::ATTR_SYSTEM != 0;
        self.is_archive = attributes & consts::ATTR_ARCH != 0;
        self.is_exec = attributes & consts::ATTR_EXEC != 0;
    }
}

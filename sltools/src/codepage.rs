//! Reading and writing string table files under the fixed `windows-1251` codepage.

use std::{
    borrow::Cow,
    fs,
    path::{Path, PathBuf},
};

use encoding_rs::{Encoding, WINDOWS_1251};

use crate::error::Error;

/// The only codepage string tables are stored in.
pub const CODEPAGE: &Encoding = WINDOWS_1251;

/// Supplies decoded file contents to the include resolver and batch operations.
///
/// # Example
///
/// ```rust,no_run
/// use sltools::codepage::{CodepageSource, FileSource};
/// let text = CodepageSource.read_text("gamedata/configs/text/eng/st_items.xml".as_ref())?;
/// # Ok::<(), sltools::Error>(())
/// ```
pub trait FileSource {
    /// Reads and decodes the whole file at `path`.
    fn read_text(&self, path: &Path) -> Result<String, Error>;
}

/// Reads files from disk and decodes them as `windows-1251`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodepageSource;

impl FileSource for CodepageSource {
    fn read_text(&self, path: &Path) -> Result<String, Error> {
        read_document(path)
    }
}

/// Decodes raw bytes. Returns `None` if any byte sequence is malformed.
pub fn decode(bytes: &[u8]) -> Option<Cow<'_, str>> {
    CODEPAGE.decode_without_bom_handling_and_without_replacement(bytes)
}

/// Encodes text; characters the codepage can't represent become numeric
/// character references (`&#NNNN;`).
pub fn encode(text: &str) -> Cow<'_, [u8]> {
    let (bytes, _, had_unmappable) = CODEPAGE.encode(text);
    if had_unmappable {
        log::warn!("Some characters are not representable in windows-1251, writing them as character references");
    }
    bytes
}

/// Reads `path` and decodes it.
pub fn read_document(path: &Path) -> Result<String, Error> {
    let bytes = fs::read(path)?;
    decode(&bytes)
        .map(Cow::into_owned)
        .ok_or_else(|| Error::Encoding {
            path: PathBuf::from(path),
        })
}

/// Encodes `text` and writes it to `path`, replacing the file.
pub fn write_document(path: &Path, text: &str) -> Result<(), Error> {
    fs::write(path, encode(text))?;
    Ok(())
}

use std::fs::File;
use std::io::{self, BufWriter, Read};
use std::path::Path;

use tracing::debug;

use crate::document::Document;
use crate::error::{Error, ErrorKind, ParseError};
use crate::printer::PrintOptions;

/// ## Files
impl Document {
    /// Replace the content of the document with the XML in a file.
    ///
    /// A missing file fails with [`ErrorKind::FileNotFound`], a file that
    /// cannot be opened with [`ErrorKind::FileCouldNotBeOpened`] and a read
    /// failure with [`ErrorKind::FileReadError`]. The error is also recorded
    /// on the document.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), ParseError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading document");
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                let kind = if e.kind() == io::ErrorKind::NotFound {
                    ErrorKind::FileNotFound
                } else {
                    ErrorKind::FileCouldNotBeOpened
                };
                return Err(self.fail(file_error(kind, path)));
            }
        };
        self.read_from(file).map_err(|mut err| {
            if err.kind() == ErrorKind::FileReadError {
                err = file_error(ErrorKind::FileReadError, path);
                self.error = Some(err.clone());
            }
            err
        })
    }

    /// Replace the content of the document with XML read from `reader`.
    /// The whole input is read before parsing.
    pub fn read_from(&mut self, mut reader: impl Read) -> Result<(), ParseError> {
        let mut data = Vec::new();
        if let Err(e) = reader.read_to_end(&mut data) {
            debug!(error = %e, "reading document failed");
            return Err(self.fail(ParseError::new(ErrorKind::FileReadError, 0)));
        }
        self.parse(data)
    }

    /// Write the document to a file, replacing it if it exists.
    pub fn save_file(&self, path: impl AsRef<Path>, compact: bool) -> Result<(), Error> {
        let path = path.as_ref();
        debug!(path = %path.display(), compact, "saving document");
        let file = File::create(path)?;
        let options = PrintOptions {
            compact,
            ..Default::default()
        };
        self.write_with(BufWriter::new(file), &options)
    }
}

fn file_error(kind: ErrorKind, path: &Path) -> ParseError {
    ParseError::with_context(kind, 0, format!("filename={}", path.display()))
}

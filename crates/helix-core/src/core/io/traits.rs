use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Defines the interface for reading and writing the text formats exchanged with the user.
///
/// Implementors handle the format-specific parsing and serialization of one record type;
/// the path-based helpers are provided on top of the reader/writer methods.
pub trait RecordFile {
    /// The in-memory value stored in one file.
    type Record;

    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads a record from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<Self::Record, Self::Error>;

    /// Writes a record to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails or I/O operations encounter issues.
    fn write_to(record: &Self::Record, writer: &mut impl Write) -> Result<(), Self::Error>;

    /// Reads a record from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self::Record, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Writes a record to a file path, creating or truncating the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<P: AsRef<Path>>(record: &Self::Record, path: P) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(record, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

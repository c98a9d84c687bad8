use std::fs::File;
use std::io::{BufReader, Error as IOError, ErrorKind, Read, Result as IOResult, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A seekable cursor into a raw disc image.
pub trait ReadStream: Read + Seek {}

impl<T: Read + Seek> ReadStream for T {}

/// Source of raw (still encrypted) disc image bytes.
///
/// Every call to `begin_read_stream` must hand out a cursor that is independent
/// from all others, so several partition streams can be open at the same time.
pub trait DiscIO {
    fn begin_read_stream(&self, offset: u64) -> IOResult<Box<dyn ReadStream>>;
    fn size(&self) -> Option<u64>;
}

/// Disc image held in memory.
#[derive(Clone, Debug)]
pub struct MemoryDiscIO {
    buffer: Arc<[u8]>,
}

impl MemoryDiscIO {
    pub fn new<B: Into<Arc<[u8]>>>(buf: B) -> MemoryDiscIO {
        MemoryDiscIO { buffer: buf.into() }
    }
}

impl DiscIO for MemoryDiscIO {
    fn begin_read_stream(&self, offset: u64) -> IOResult<Box<dyn ReadStream>> {
        let mut reader = SliceReader::new(Arc::clone(&self.buffer));
        reader.seek(SeekFrom::Start(offset))?;
        Ok(Box::new(reader))
    }

    fn size(&self) -> Option<u64> {
        Some(self.buffer.len() as u64)
    }
}

/// Disc image read from a file; each stream opens its own handle.
#[derive(Clone, Debug)]
pub struct FileDiscIO {
    path: PathBuf,
    len: u64,
}

impl FileDiscIO {
    pub fn open<P: AsRef<Path>>(path: P) -> IOResult<FileDiscIO> {
        let len = std::fs::metadata(path.as_ref())?.len();
        Ok(FileDiscIO { path: path.as_ref().to_path_buf(), len })
    }
}

impl DiscIO for FileDiscIO {
    fn begin_read_stream(&self, offset: u64) -> IOResult<Box<dyn ReadStream>> {
        let mut reader = BufReader::new(File::open(&self.path)?);
        reader.seek(SeekFrom::Start(offset))?;
        Ok(Box::new(reader))
    }

    fn size(&self) -> Option<u64> {
        Some(self.len)
    }
}

struct SliceReader {
    buffer: Arc<[u8]>,
    cursor: u64,
}

impl SliceReader {
    fn new(buffer: Arc<[u8]>) -> SliceReader {
        SliceReader { buffer, cursor: 0 }
    }
}

impl Seek for SliceReader {
    fn seek(&mut self, pos: SeekFrom) -> IOResult<u64> {
        let new_pos = match pos {
            SeekFrom::Start(offset) => offset as i128,
            SeekFrom::Current(offset) => self.cursor as i128 + offset as i128,
            SeekFrom::End(offset) => self.buffer.len() as i128 + offset as i128,
        };
        if new_pos < 0 {
            return Err(IOError::from(ErrorKind::InvalidInput));
        }
        // Positions past the end are allowed; reads there return nothing.
        self.cursor = new_pos as u64;
        Ok(self.cursor)
    }
}

impl Read for SliceReader {
    fn read(&mut self, buf: &mut [u8]) -> IOResult<usize> {
        if self.cursor >= self.buffer.len() as u64 {
            return Ok(0);
        }
        let len_to_read = std::cmp::min(buf.len(), self.buffer.len() - self.cursor as usize);
        buf[..len_to_read].copy_from_slice(&self.buffer[self.cursor as usize..][..len_to_read]);
        self.cursor += len_to_read as u64;
        Ok(len_to_read)
    }
}

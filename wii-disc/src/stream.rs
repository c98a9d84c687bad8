use crate::consts;
use crate::crypto::{AesKey, BlockCipher};
use crate::disc_io::ReadStream;
use crate::error::WiiDiscError;
use log::trace;
use std::io::{Error as IOError, ErrorKind, Read, Result as IOResult, Seek, SeekFrom};

const SECTOR_SIZE: u64 = consts::WII_SECTOR_SIZE as u64;
const SECTOR_DATA_SIZE: u64 = consts::WII_SECTOR_DATA_SIZE as u64;

/// Plaintext of the most recently decrypted block.
struct BlockCache {
    block: Option<u64>,
    data: Box<[u8]>,
}

/// Seekable plaintext view of a partition's encrypted payload.
///
/// Logical offset `n` lives in physical block `n / 0x7C00`, at
/// `n % 0x7C00` bytes into that block's data area. One block is decrypted at a
/// time and kept until a read or seek needs another one.
pub struct PartReadStream {
    cipher: BlockCipher,
    base_offset: u64,
    offset: u64,
    dio: Box<dyn ReadStream>,
    // Block the raw cursor currently sits at the start of.
    dio_block: Option<u64>,
    enc_buf: Box<[u8]>,
    cache: BlockCache,
}

impl PartReadStream {
    /// Opens a stream over the payload starting at absolute `base_offset` in
    /// the image, positioned at logical `offset`.
    pub fn new(dio: Box<dyn ReadStream>, key: AesKey, base_offset: u64, offset: u64) -> Result<Self, WiiDiscError> {
        let mut stream = PartReadStream {
            cipher: BlockCipher::new(key),
            base_offset,
            offset,
            dio,
            dio_block: None,
            enc_buf: vec![0u8; consts::WII_SECTOR_SIZE].into_boxed_slice(),
            cache: BlockCache {
                block: None,
                data: vec![0u8; consts::WII_SECTOR_DATA_SIZE].into_boxed_slice(),
            },
        };
        stream.load_block(offset / SECTOR_DATA_SIZE)?;
        Ok(stream)
    }

    /// Current logical offset.
    pub fn position(&self) -> u64 {
        self.offset
    }

    /// Absolute image offset of the first encrypted block.
    pub fn base_offset(&self) -> u64 {
        self.base_offset
    }

    fn load_block(&mut self, block: u64) -> Result<(), WiiDiscError> {
        if self.cache.block == Some(block) {
            return Ok(());
        }
        self.cache.block = None;
        let pos = block
            .checked_mul(SECTOR_SIZE)
            .and_then(|off| off.checked_add(self.base_offset))
            .ok_or_else(|| IOError::new(ErrorKind::InvalidInput, "partition block lies beyond the addressable image"))?;
        if self.dio_block != Some(block) {
            self.dio_block = None;
            self.dio.seek(SeekFrom::Start(pos))?;
        }
        trace!("decrypting partition block {} at {:#x}", block, pos);
        if let Err(err) = self.dio.read_exact(&mut self.enc_buf) {
            self.dio_block = None;
            return Err(err.into());
        }
        self.dio_block = Some(block + 1);

        let mut iv = [0u8; consts::WII_KEY_SIZE];
        iv.copy_from_slice(&self.enc_buf[consts::WII_SECTOR_IV_OFF..][..consts::WII_KEY_SIZE]);
        self.cipher.decrypt(&iv, &self.enc_buf[consts::WII_SECTOR_HASH_SIZE..], &mut self.cache.data)?;
        self.cache.block = Some(block);
        Ok(())
    }
}

impl Read for PartReadStream {
    fn read(&mut self, buf: &mut [u8]) -> IOResult<usize> {
        let mut block = self.offset / SECTOR_DATA_SIZE;
        let mut cache_offset = (self.offset % SECTOR_DATA_SIZE) as usize;
        let mut read = 0;
        while read < buf.len() {
            if let Err(err) = self.load_block(block) {
                // Hand back what was copied so far; the next call reports the error.
                if read > 0 {
                    break;
                }
                return Err(err.into());
            }
            let len = std::cmp::min(buf.len() - read, consts::WII_SECTOR_DATA_SIZE - cache_offset);
            buf[read..read + len].copy_from_slice(&self.cache.data[cache_offset..cache_offset + len]);
            read += len;
            self.offset += len as u64;
            cache_offset = 0;
            block += 1;
        }
        Ok(read)
    }
}

impl Seek for PartReadStream {
    fn seek(&mut self, pos: SeekFrom) -> IOResult<u64> {
        self.offset = match pos {
            SeekFrom::Start(offset) => offset,
            SeekFrom::Current(offset) => {
                let new_pos = self.offset as i128 + offset as i128;
                if new_pos < 0 || new_pos > u64::MAX as i128 {
                    return Err(IOError::from(ErrorKind::InvalidInput));
                }
                new_pos as u64
            }
            SeekFrom::End(_) => {
                return Err(IOError::new(
                    ErrorKind::InvalidInput,
                    "partition streams cannot seek relative to the end",
                ));
            }
        };
        self.load_block(self.offset / SECTOR_DATA_SIZE)?;
        Ok(self.offset)
    }
}

impl std::fmt::Debug for PartReadStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartReadStream")
            .field("base_offset", &self.base_offset)
            .field("offset", &self.offset)
            .field("cached_block", &self.cache.block)
            .finish()
    }
}

// Extends byteorder's ReadBytesExt with the helpers the disc records need.
use crate::error::WiiDiscError;
use byteorder::{ReadBytesExt, BE};
use std::io::{Read, Result};

/// Extends [`Read`] with fixed-size and offset-unit readers.
///
/// Most on-disc offsets of a Wii partition are stored divided by 4. Use
/// [`read_shifted_u32`] for those fields so the caller only ever sees true
/// byte offsets.
///
/// [`Read`]: https://doc.rust-lang.org/std/io/trait.Read.html
/// [`read_shifted_u32`]: trait.WiiReadExt.html#method.read_shifted_u32
pub trait WiiReadExt: Read {
    /// Reads exactly `N` bytes into an array.
    ///
    /// # Errors
    ///
    /// This method returns the same errors as [`Read::read_exact`].
    ///
    /// [`Read::read_exact`]: https://doc.rust-lang.org/std/io/trait.Read.html#method.read_exact
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Reads a big-endian u32 stored in 4-byte units and returns it as a byte
    /// offset.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use wii_disc::io_ext::WiiReadExt;
    ///
    /// let mut rdr: &[u8] = &[0x00, 0x01, 0x40, 0x00];
    /// assert_eq!(rdr.read_shifted_u32().unwrap(), 0x50000);
    /// ```
    fn read_shifted_u32(&mut self) -> Result<u64> {
        Ok((self.read_u32::<BE>()? as u64) << 2)
    }

    /// Consumes and discards exactly `n` bytes.
    fn skip(&mut self, n: u64) -> Result<()> {
        let mut scratch = [0u8; 64];
        let mut remaining = n;
        while remaining > 0 {
            let len = std::cmp::min(remaining, scratch.len() as u64) as usize;
            self.read_exact(&mut scratch[..len])?;
            remaining -= len as u64;
        }
        Ok(())
    }
}

/// All types that implement `Read` get methods defined in `WiiReadExt`
/// for free.
impl<R: Read + ?Sized> WiiReadExt for R {}

/// A record with a fixed on-disc size that is parsed straight off a reader.
pub trait Unpackable: Sized {
    const BLOCK_SIZE: usize;

    /// Consumes exactly `BLOCK_SIZE` bytes from `reader`.
    fn unpack<R: Read + ?Sized>(reader: &mut R) -> std::result::Result<Self, WiiDiscError>;
}

use crate::cert::CertificateChain;
use crate::consts;
use crate::crypto::{decrypt_title_key, AesKey};
use crate::disc_io::{DiscIO, ReadStream};
use crate::error::WiiDiscError;
use crate::io_ext::{Unpackable, WiiReadExt};
use crate::options::OpenOptions;
use crate::stream::PartReadStream;
use crate::ticket::Ticket;
use crate::tmd::TitleMetaData;
use byteorder::{ReadBytesExt, BE};
use failure::{Error, ResultExt};
use log::{debug, info};
use std::convert::TryFrom;
use std::io::{Read, Seek, SeekFrom};
use std::sync::Arc;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PartitionKind {
    Data,
    Update,
    Channel,
}

impl TryFrom<u32> for PartitionKind {
    type Error = WiiDiscError;

    fn try_from(kind: u32) -> Result<Self, Self::Error> {
        match kind {
            0 => Ok(PartitionKind::Data),
            1 => Ok(PartitionKind::Update),
            2 => Ok(PartitionKind::Channel),
            _ => Err(WiiDiscError::UnknownPartitionKind { kind }),
        }
    }
}

impl From<PartitionKind> for u32 {
    fn from(k: PartitionKind) -> Self {
        match k {
            PartitionKind::Data => 0,
            PartitionKind::Update => 1,
            PartitionKind::Channel => 2,
        }
    }
}

impl std::fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            PartitionKind::Data => "DATA",
            PartitionKind::Update => "UPDATE",
            PartitionKind::Channel => "CHANNEL",
        })
    }
}

/// Ticket plus the location table that follows it. All offsets are resolved
/// to bytes, relative to the start of the partition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartitionHeader {
    pub ticket: Ticket,
    pub tmd_size: u64,
    pub tmd_offset: u64,
    pub cert_size: u64,
    pub cert_offset: u64,
    pub h3_offset: u64,
    pub data_offset: u64,
    pub data_size: u64,
}

impl Unpackable for PartitionHeader {
    const BLOCK_SIZE: usize = consts::WII_PART_HEADER_SIZE;

    fn unpack<R: Read + ?Sized>(reader: &mut R) -> Result<Self, WiiDiscError> {
        Ok(PartitionHeader {
            ticket: Ticket::unpack(reader)?,
            tmd_size: reader.read_u32::<BE>()? as u64,
            tmd_offset: reader.read_shifted_u32()?,
            cert_size: reader.read_u32::<BE>()? as u64,
            cert_offset: reader.read_shifted_u32()?,
            h3_offset: reader.read_shifted_u32()?,
            data_offset: reader.read_shifted_u32()?,
            data_size: reader.read_shifted_u32()?,
        })
    }
}

/// Where the boot files sit inside the decrypted partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootInfo {
    pub game_id: [u8; 6],
    pub game_title: String,
    pub dol_offset: u64,
    pub fst_offset: u64,
    pub fst_size: u64,
    pub apploader_size: u32,
}

impl BootInfo {
    pub fn read(stream: &mut PartReadStream) -> Result<Self, WiiDiscError> {
        stream.seek(SeekFrom::Start(0))?;
        let game_id = stream.read_array()?;
        stream.seek(SeekFrom::Start(0x20))?;
        let title: [u8; 0x40] = stream.read_array()?;
        let title_len = title.iter().position(|b| *b == 0).unwrap_or(title.len());
        let game_title = String::from_utf8_lossy(&title[..title_len]).into_owned();

        stream.seek(SeekFrom::Start(consts::WII_BOOT_OFFSETS_OFF))?;
        let dol_offset = stream.read_shifted_u32()?;
        let fst_offset = stream.read_shifted_u32()?;
        let fst_size = stream.read_shifted_u32()?;

        stream.seek(SeekFrom::Start(consts::WII_APPLOADER_OFF + 0x14))?;
        let body_size = stream.read_u32::<BE>()?;
        let trailer_size = stream.read_u32::<BE>()?;
        let apploader_size = consts::WII_APPLOADER_HEADER_SIZE
            .wrapping_add(body_size)
            .wrapping_add(trailer_size);
        Ok(BootInfo {
            game_id,
            game_title,
            dol_offset,
            fst_offset,
            fst_size,
            apploader_size,
        })
    }

    pub fn game_id_str(&self) -> String {
        String::from_utf8_lossy(&self.game_id).into_owned()
    }
}

// Seeks to `pos`, runs one parse step and reports where the cursor ended up.
fn parse_at<T, F>(s: &mut dyn ReadStream, pos: u64, step: F) -> Result<(T, u64), WiiDiscError>
where
    F: FnOnce(&mut dyn ReadStream) -> Result<T, WiiDiscError>,
{
    s.seek(SeekFrom::Start(pos))?;
    let value = step(&mut *s)?;
    let end = s.seek(SeekFrom::Current(0))?;
    Ok((value, end))
}

/// One encrypted partition of a Wii disc.
pub struct Partition {
    io: Arc<dyn DiscIO>,
    kind: PartitionKind,
    offset: u64,
    header: PartitionHeader,
    tmd: TitleMetaData,
    cert_chain: CertificateChain,
    part_key: AesKey,
    boot_info: Option<BootInfo>,
}

impl Partition {
    pub fn open(io: Arc<dyn DiscIO>, kind: PartitionKind, offset: u64) -> Result<Partition, Error> {
        Partition::open_with_options(io, kind, offset, &OpenOptions::default())
    }

    /// Parses the partition starting at absolute byte `offset` and derives its
    /// key. Any malformed record fails the whole partition.
    pub fn open_with_options(io: Arc<dyn DiscIO>, kind: PartitionKind, offset: u64, opts: &OpenOptions) -> Result<Partition, Error> {
        let mut s = io
            .begin_read_stream(offset)
            .context("Couldn't seek to partition")?;

        let (header, _) = parse_at(&mut *s, offset, |r| PartitionHeader::unpack(r))
            .context("Couldn't read partition header")?;
        debug!(
            "{} partition at {:#x}: tmd {:#x}+{:#x}, certs {:#x}+{:#x}, h3 {:#x}, data {:#x}+{:#x}",
            kind, offset, header.tmd_offset, header.tmd_size, header.cert_offset, header.cert_size,
            header.h3_offset, header.data_offset, header.data_size
        );

        let strict = opts.strict_tmd_signature;
        let (tmd, tmd_end) = parse_at(&mut *s, offset + header.tmd_offset, |r| TitleMetaData::read(r, strict))
            .context("Couldn't parse partition TMD")?;
        debug!("TMD lists {} content(s), ends at {:#x}", tmd.contents.len(), tmd_end);

        let (cert_chain, _) = parse_at(&mut *s, offset + header.cert_offset, |r| CertificateChain::read(r))
            .context("Couldn't parse certificate chain")?;

        let part_key = decrypt_title_key(&header.ticket).context("Couldn't decrypt title key")?;

        let mut partition = Partition {
            io,
            kind,
            offset,
            header,
            tmd,
            cert_chain,
            part_key,
            boot_info: None,
        };
        if opts.read_boot_info {
            let mut ds = partition
                .begin_read_stream(0)
                .context("Couldn't decrypt partition boot block")?;
            let boot_info = BootInfo::read(&mut ds).context("Couldn't read partition boot info")?;
            debug!(
                "boot info: game {} dol {:#x} fst {:#x}+{:#x}",
                boot_info.game_id_str(),
                boot_info.dol_offset,
                boot_info.fst_offset,
                boot_info.fst_size
            );
            partition.boot_info = Some(boot_info);
        }
        info!("Opened {} partition at {:#x}", kind, offset);
        Ok(partition)
    }

    /// Opens a decrypting stream positioned at logical `offset`.
    pub fn begin_read_stream(&self, offset: u64) -> Result<PartReadStream, WiiDiscError> {
        let base = self.data_offset();
        let dio = self.io.begin_read_stream(base)?;
        PartReadStream::new(dio, self.part_key, base, offset)
    }

    pub fn kind(&self) -> PartitionKind {
        self.kind
    }

    /// Absolute byte offset of the partition in the image.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Absolute byte offset of the first encrypted payload block.
    pub fn data_offset(&self) -> u64 {
        self.offset + self.header.data_offset
    }

    /// Size of the encrypted payload, in bytes.
    pub fn data_size(&self) -> u64 {
        self.header.data_size
    }

    /// Size of the payload once decrypted (whole blocks only).
    pub fn decrypted_size(&self) -> u64 {
        (self.header.data_size / consts::WII_SECTOR_SIZE as u64) * consts::WII_SECTOR_DATA_SIZE as u64
    }

    pub fn header(&self) -> &PartitionHeader {
        &self.header
    }

    pub fn ticket(&self) -> &Ticket {
        &self.header.ticket
    }

    pub fn tmd(&self) -> &TitleMetaData {
        &self.tmd
    }

    pub fn cert_chain(&self) -> &CertificateChain {
        &self.cert_chain
    }

    pub fn boot_info(&self) -> Option<&BootInfo> {
        self.boot_info.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn part_key(&self) -> &AesKey {
        &self.part_key
    }
}

impl std::fmt::Debug for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Partition")
            .field("kind", &self.kind)
            .field("offset", &self.offset)
            .field("data_offset", &self.data_offset())
            .field("data_size", &self.header.data_size)
            .field("boot_info", &self.boot_info)
            .finish()
    }
}

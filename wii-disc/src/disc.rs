use crate::consts;
use crate::disc_io::DiscIO;
use crate::error::WiiDiscError;
use crate::io_ext::WiiReadExt;
use crate::options::OpenOptions;
use crate::partition::{Partition, PartitionKind};
use byteorder::{ReadBytesExt, BE};
use failure::{Error, ResultExt};
use log::{debug, info};
use std::convert::TryFrom;
use std::io::{Seek, SeekFrom};
use std::sync::Arc;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PartInfoEntry {
    pub offset: u64,
    pub kind: PartitionKind,
}

/// The partition directory: where it lives and the slots it lists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartInfo {
    pub offset: u64,
    pub entries: Vec<PartInfoEntry>,
}

/// Reads the partition directory without opening any partition.
///
/// At most [`consts::WII_MAX_PARTITIONS`] slots are read, whatever count the
/// header declares. A slot with an unknown kind fails the whole read.
pub fn read_part_info(io: &dyn DiscIO) -> Result<PartInfo, WiiDiscError> {
    let mut s = io.begin_read_stream(consts::WII_PART_INFO_OFF)?;
    let declared = s.read_u32::<BE>()?;
    let offset = s.read_shifted_u32()?;
    let n_part = std::cmp::min(declared as usize, consts::WII_MAX_PARTITIONS);
    if n_part < declared as usize {
        debug!("partition table declares {} slots, reading {}", declared, n_part);
    }

    s.seek(SeekFrom::Start(offset))?;
    let mut entries = Vec::with_capacity(n_part);
    for _ in 0..n_part {
        let part_offset = s.read_shifted_u32()?;
        let kind = PartitionKind::try_from(s.read_u32::<BE>()?)?;
        entries.push(PartInfoEntry {
            offset: part_offset,
            kind,
        });
    }
    Ok(PartInfo { offset, entries })
}

/// A Wii disc image with every listed partition opened.
#[derive(Debug)]
pub struct WiiDisc {
    part_info: PartInfo,
    partitions: Vec<Partition>,
}

impl WiiDisc {
    pub fn open(io: Arc<dyn DiscIO>) -> Result<WiiDisc, Error> {
        WiiDisc::open_with_options(io, &OpenOptions::default())
    }

    pub fn open_with_options(io: Arc<dyn DiscIO>, opts: &OpenOptions) -> Result<WiiDisc, Error> {
        let part_info = read_part_info(io.as_ref()).context("Couldn't read partition table")?;
        info!(
            "Partition table at {:#x} lists {} partition(s)",
            part_info.offset,
            part_info.entries.len()
        );
        let mut partitions = Vec::with_capacity(part_info.entries.len());
        for entry in &part_info.entries {
            let part = Partition::open_with_options(Arc::clone(&io), entry.kind, entry.offset, opts)
                .with_context(|_| format!("Couldn't open {} partition at {:#x}", entry.kind, entry.offset))?;
            partitions.push(part);
        }
        Ok(WiiDisc {
            part_info,
            partitions,
        })
    }

    pub fn part_info(&self) -> &PartInfo {
        &self.part_info
    }

    /// Partitions in directory order.
    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    /// First partition of kind `Data`, if any.
    pub fn data_partition(&self) -> Option<&Partition> {
        self.partitions.iter().find(|p| p.kind() == PartitionKind::Data)
    }
}

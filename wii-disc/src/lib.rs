extern crate byteorder;
#[macro_use]
extern crate lazy_static;
extern crate block_modes;
extern crate aes;
extern crate failure;
extern crate log;

pub mod io_ext;
pub mod disc_io;
pub mod error;
pub mod crypto;
pub mod ticket;
pub mod tmd;
pub mod cert;
pub mod stream;
pub mod options;
pub mod partition;
pub mod disc;

#[cfg(test)]
mod test_util;

pub use crate::disc::{read_part_info, PartInfo, PartInfoEntry, WiiDisc};
pub use crate::disc_io::{DiscIO, FileDiscIO, MemoryDiscIO, ReadStream};
pub use crate::error::{ErrorKind, WiiDiscError};
pub use crate::options::OpenOptions;
pub use crate::partition::{BootInfo, Partition, PartitionHeader, PartitionKind};
pub use crate::stream::PartReadStream;

pub mod consts {
    pub const WII_KEY_SIZE: usize = 16;
    pub const WII_CKEY_AMNT: usize = 2;
    pub const WII_HASH_SIZE: usize = 20;

    pub const WII_SECTOR_HASH_SIZE: usize = 0x400;
    pub const WII_SECTOR_SIZE: usize = 0x8000;
    pub const WII_SECTOR_DATA_SIZE: usize = WII_SECTOR_SIZE - WII_SECTOR_HASH_SIZE;
    pub const WII_SECTOR_IV_OFF: usize = 0x3D0;

    pub const WII_PART_INFO_OFF: u64 = 0x40000;
    pub const WII_MAX_PARTITIONS: usize = 4;

    pub const WII_TICKET_SIZE: usize = 676;
    pub const WII_PART_HEADER_SIZE: usize = 0x2C0;
    pub const WII_TMD_HEADER_SIZE: usize = 484;
    pub const WII_TMD_CONTENT_SIZE: usize = 36;
    pub const WII_CERT_SIG_PAD: usize = 60;
    pub const WII_CERT_TRAILING_PAD: usize = 52;

    pub const WII_BOOT_OFFSETS_OFF: u64 = 0x420;
    pub const WII_APPLOADER_OFF: u64 = 0x2440;
    pub const WII_APPLOADER_HEADER_SIZE: u32 = 32;
}

// Index 0 is the standard common key, index 1 the Korean one.
const COMMON_KEY_: [[u8; consts::WII_KEY_SIZE]; consts::WII_CKEY_AMNT] = [
    [2, 26, 224, 229, 43, 205, 59, 3, 6, 0, 157, 118, 65, 31, 22, 93],
    [57, 175, 232, 37, 218, 229, 37, 254, 42, 84, 140, 244, 95, 4, 39, 109],
];
const COMMON_KEY_MASK: [[u8; consts::WII_KEY_SIZE]; consts::WII_CKEY_AMNT] = [
    [233, 254, 202, 199, 117, 72, 168, 231, 78, 217, 88, 51, 50, 158, 188, 170],
    [90, 23, 195, 145, 46, 132, 107, 208, 57, 166, 114, 15, 229, 72, 188, 19],
];

lazy_static! {
    pub static ref COMMON_KEY: [[u8; consts::WII_KEY_SIZE]; consts::WII_CKEY_AMNT] = {
        let mut ck = [[0 as u8; consts::WII_KEY_SIZE]; consts::WII_CKEY_AMNT];
        for j in 0..consts::WII_CKEY_AMNT {
            for i in 0..consts::WII_KEY_SIZE {
                ck[j][i] = COMMON_KEY_[j][i] ^ COMMON_KEY_MASK[j][i];
            }
        }
        ck
    };
}

use crate::cert::SigType;
use crate::consts;
use crate::error::WiiDiscError;
use crate::io_ext::{Unpackable, WiiReadExt};
use byteorder::{ReadBytesExt, BE};
use log::warn;
use std::convert::TryFrom;
use std::io::{self, Read};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TmdContent {
    pub id: u32,
    pub index: u16,
    pub content_type: u16,
    pub size: u64,
    pub hash: [u8; consts::WII_HASH_SIZE],
}

impl Unpackable for TmdContent {
    const BLOCK_SIZE: usize = consts::WII_TMD_CONTENT_SIZE;

    fn unpack<R: Read + ?Sized>(reader: &mut R) -> Result<Self, WiiDiscError> {
        Ok(TmdContent {
            id: reader.read_u32::<BE>()?,
            index: reader.read_u16::<BE>()?,
            content_type: reader.read_u16::<BE>()?,
            size: reader.read_u64::<BE>()?,
            hash: reader.read_array()?,
        })
    }
}

/// The title metadata record of a partition.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleMetaData {
    pub sig_type: u32,
    pub sig: [u8; 0x100],
    pub sig_issuer: [u8; 0x40],
    pub version: u8,
    pub ca_crl_version: u8,
    pub signer_crl_version: u8,
    pub ios_id_major: u32,
    pub ios_id_minor: u32,
    pub title_id_major: u32,
    pub title_id_minor: [u8; 4],
    pub title_type: u32,
    pub group_id: u16,
    pub access_flags: u32,
    pub title_version: u16,
    pub num_contents: u16,
    pub boot_index: u16,
    pub contents: Vec<TmdContent>,
}

impl TitleMetaData {
    /// Parses the fixed header then `num_contents` content entries.
    ///
    /// With `strict` set, a signature type other than RSA-4096/RSA-2048 is
    /// rejected before any content entry is read.
    pub fn read<R: Read + ?Sized>(reader: &mut R, strict: bool) -> Result<Self, WiiDiscError> {
        let sig_type = reader.read_u32::<BE>()?;
        match SigType::try_from(sig_type) {
            Ok(SigType::Rsa4096) | Ok(SigType::Rsa2048) => (),
            _ if strict => return Err(WiiDiscError::UnknownSignatureType { sig_type }),
            _ => warn!("TMD has unexpected signature type {:#010X}", sig_type),
        }
        let sig = reader.read_array()?;
        reader.skip(0x3C)?;
        let sig_issuer = reader.read_array()?;
        let version = reader.read_u8()?;
        let ca_crl_version = reader.read_u8()?;
        let signer_crl_version = reader.read_u8()?;
        reader.skip(1)?;
        let ios_id_major = reader.read_u32::<BE>()?;
        let ios_id_minor = reader.read_u32::<BE>()?;
        let title_id_major = reader.read_u32::<BE>()?;
        let title_id_minor = reader.read_array()?;
        let title_type = reader.read_u32::<BE>()?;
        let group_id = reader.read_u16::<BE>()?;
        reader.skip(0x3E)?;
        let access_flags = reader.read_u32::<BE>()?;
        let title_version = reader.read_u16::<BE>()?;
        let num_contents = reader.read_u16::<BE>()?;
        let boot_index = reader.read_u16::<BE>()?;
        reader.skip(2)?;

        let mut contents = Vec::with_capacity(num_contents as usize);
        for read in 0..num_contents {
            let entry = TmdContent::unpack(reader).map_err(|err| match err {
                WiiDiscError::Io(ref ioerr) if ioerr.kind() == io::ErrorKind::UnexpectedEof => {
                    WiiDiscError::ContentCountMismatch {
                        declared: num_contents,
                        read,
                    }
                }
                other => other,
            })?;
            contents.push(entry);
        }
        Ok(TitleMetaData {
            sig_type,
            sig,
            sig_issuer,
            version,
            ca_crl_version,
            signer_crl_version,
            ios_id_major,
            ios_id_minor,
            title_id_major,
            title_id_minor,
            title_type,
            group_id,
            access_flags,
            title_version,
            num_contents,
            boot_index,
            contents,
        })
    }

    pub fn signature_type(&self) -> Result<SigType, WiiDiscError> {
        SigType::try_from(self.sig_type)
    }

    pub fn title_id(&self) -> [u8; 8] {
        let mut id = [0u8; 8];
        id[..4].copy_from_slice(&self.title_id_major.to_be_bytes());
        id[4..].copy_from_slice(&self.title_id_minor);
        id
    }

    pub fn issuer(&self) -> String {
        String::from_utf8_lossy(&self.sig_issuer).trim_end_matches('\0').to_owned()
    }

    /// Content entry that the system boots, if listed.
    pub fn boot_content(&self) -> Option<&TmdContent> {
        self.contents.iter().find(|c| c.index == self.boot_index)
    }

    /// On-disc size of this record, header plus content table.
    pub fn byte_len(&self) -> usize {
        consts::WII_TMD_HEADER_SIZE + self.contents.len() * consts::WII_TMD_CONTENT_SIZE
    }
}

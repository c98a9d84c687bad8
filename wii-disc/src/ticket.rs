use crate::consts;
use crate::crypto::{decrypt_title_key, AesKey};
use crate::error::WiiDiscError;
use crate::io_ext::{Unpackable, WiiReadExt};
use byteorder::{ReadBytesExt, BE};
use std::io::Read;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct TimeLimit {
    pub enable_time_limit: u32,
    pub time_limit: u32,
}

/// The license record stored at the start of every partition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ticket {
    pub sig_type: u32,
    pub sig: [u8; 0x100],
    pub sig_issuer: [u8; 0x40],
    pub ecdh: [u8; 0x3C],
    /// Title key, encrypted with the common key.
    pub title_key: [u8; 0x10],
    pub ticket_id: [u8; 8],
    pub console_id: [u8; 4],
    pub title_id: [u8; 8],
    pub ticket_version: u16,
    pub permitted_titles_mask: u32,
    pub permit_mask: u32,
    pub title_export_allowed: u8,
    pub common_key_index: u8,
    pub content_access_permissions: [u8; 0x40],
    pub time_limits: [TimeLimit; 8],
}

impl Unpackable for Ticket {
    const BLOCK_SIZE: usize = consts::WII_TICKET_SIZE;

    fn unpack<R: Read + ?Sized>(reader: &mut R) -> Result<Self, WiiDiscError> {
        let sig_type = reader.read_u32::<BE>()?;
        let sig = reader.read_array()?;
        reader.skip(0x3C)?;
        let sig_issuer = reader.read_array()?;
        let ecdh = reader.read_array()?;
        reader.skip(3)?;
        let title_key = reader.read_array()?;
        reader.skip(1)?;
        let ticket_id = reader.read_array()?;
        let console_id = reader.read_array()?;
        let title_id = reader.read_array()?;
        reader.skip(2)?;
        let ticket_version = reader.read_u16::<BE>()?;
        let permitted_titles_mask = reader.read_u32::<BE>()?;
        let permit_mask = reader.read_u32::<BE>()?;
        let title_export_allowed = reader.read_u8()?;
        let common_key_index = reader.read_u8()?;
        reader.skip(0x30)?;
        let content_access_permissions = reader.read_array()?;
        reader.skip(2)?;
        let mut time_limits = [TimeLimit::default(); 8];
        for limit in time_limits.iter_mut() {
            limit.enable_time_limit = reader.read_u32::<BE>()?;
            limit.time_limit = reader.read_u32::<BE>()?;
        }
        Ok(Ticket {
            sig_type,
            sig,
            sig_issuer,
            ecdh,
            title_key,
            ticket_id,
            console_id,
            title_id,
            ticket_version,
            permitted_titles_mask,
            permit_mask,
            title_export_allowed,
            common_key_index,
            content_access_permissions,
            time_limits,
        })
    }
}

impl Ticket {
    /// Name of the certificate that signed this ticket.
    pub fn issuer(&self) -> String {
        String::from_utf8_lossy(&self.sig_issuer).trim_end_matches('\0').to_owned()
    }

    pub fn title_export_allowed(&self) -> bool {
        self.title_export_allowed != 0
    }

    /// Decrypts the title key with the common key selected by this ticket.
    pub fn title_key_dec(&self) -> Result<AesKey, WiiDiscError> {
        decrypt_title_key(self)
    }
}

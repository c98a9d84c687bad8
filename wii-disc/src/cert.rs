use crate::consts;
use crate::error::WiiDiscError;
use crate::io_ext::WiiReadExt;
use byteorder::{ReadBytesExt, BE};
use std::convert::TryFrom;
use std::io::Read;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SigType {
    Rsa4096,
    Rsa2048,
    EllipticalCurve,
}

impl SigType {
    /// Length of the signature that follows the tag.
    pub fn sig_len(self) -> usize {
        match self {
            SigType::Rsa4096 => 512,
            SigType::Rsa2048 => 256,
            SigType::EllipticalCurve => 64,
        }
    }
}

impl TryFrom<u32> for SigType {
    type Error = WiiDiscError;

    fn try_from(sig_type: u32) -> Result<Self, Self::Error> {
        match sig_type {
            0x0001_0000 => Ok(SigType::Rsa4096),
            0x0001_0001 => Ok(SigType::Rsa2048),
            0x0001_0002 => Ok(SigType::EllipticalCurve),
            _ => Err(WiiDiscError::UnknownSignatureType { sig_type }),
        }
    }
}

impl From<SigType> for u32 {
    fn from(s: SigType) -> Self {
        match s {
            SigType::Rsa4096 => 0x0001_0000,
            SigType::Rsa2048 => 0x0001_0001,
            SigType::EllipticalCurve => 0x0001_0002,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KeyType {
    Rsa4096,
    Rsa2048,
}

impl KeyType {
    /// Length of the public key that follows the subject.
    pub fn key_len(self) -> usize {
        match self {
            KeyType::Rsa4096 => 512,
            KeyType::Rsa2048 => 256,
        }
    }
}

impl TryFrom<u32> for KeyType {
    type Error = WiiDiscError;

    fn try_from(key_type: u32) -> Result<Self, Self::Error> {
        match key_type {
            0 => Ok(KeyType::Rsa4096),
            1 => Ok(KeyType::Rsa2048),
            _ => Err(WiiDiscError::UnknownKeyType { key_type }),
        }
    }
}

impl From<KeyType> for u32 {
    fn from(k: KeyType) -> Self {
        match k {
            KeyType::Rsa4096 => 0,
            KeyType::Rsa2048 => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub sig_type: SigType,
    pub sig: Vec<u8>,
    pub issuer: [u8; 0x40],
    pub key_type: KeyType,
    pub subject: [u8; 0x40],
    pub key: Vec<u8>,
    pub modulus: u32,
    pub pub_exp: u32,
}

impl Certificate {
    /// Parses one certificate. The signature and key lengths depend on their
    /// type tags, so an unknown tag aborts the whole chain.
    pub fn read<R: Read + ?Sized>(reader: &mut R) -> Result<Self, WiiDiscError> {
        let sig_type = SigType::try_from(reader.read_u32::<BE>()?)?;
        let mut sig = vec![0u8; sig_type.sig_len()];
        reader.read_exact(&mut sig)?;
        reader.skip(consts::WII_CERT_SIG_PAD as u64)?;

        let issuer = reader.read_array()?;
        let key_type = KeyType::try_from(reader.read_u32::<BE>()?)?;
        let subject = reader.read_array()?;
        let mut key = vec![0u8; key_type.key_len()];
        reader.read_exact(&mut key)?;

        let modulus = reader.read_u32::<BE>()?;
        let pub_exp = reader.read_u32::<BE>()?;
        reader.skip(consts::WII_CERT_TRAILING_PAD as u64)?;
        Ok(Certificate {
            sig_type,
            sig,
            issuer,
            key_type,
            subject,
            key,
            modulus,
            pub_exp,
        })
    }

    pub fn issuer(&self) -> String {
        String::from_utf8_lossy(&self.issuer).trim_end_matches('\0').to_owned()
    }

    pub fn subject(&self) -> String {
        String::from_utf8_lossy(&self.subject).trim_end_matches('\0').to_owned()
    }

    /// Number of bytes this certificate occupies on disc.
    pub fn byte_len(&self) -> usize {
        4 + self.sig.len() + consts::WII_CERT_SIG_PAD + 0x40 + 4 + 0x40 + self.key.len() + 8 + consts::WII_CERT_TRAILING_PAD
    }
}

/// Root, TMD signer and ticket signer certificates, in on-disc order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateChain {
    pub ca: Certificate,
    pub tmd: Certificate,
    pub ticket: Certificate,
}

impl CertificateChain {
    pub fn read<R: Read + ?Sized>(reader: &mut R) -> Result<Self, WiiDiscError> {
        let ca = Certificate::read(reader)?;
        let tmd = Certificate::read(reader)?;
        let ticket = Certificate::read(reader)?;
        Ok(CertificateChain { ca, tmd, ticket })
    }

    pub fn byte_len(&self) -> usize {
        self.ca.byte_len() + self.tmd.byte_len() + self.ticket.byte_len()
    }
}

use failure::Fail;
use std::io::{Error as IOError, ErrorKind as IOErrorKind};

/// Broad classes of failure while opening a disc or reading a partition.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The on-disc layout is ambiguous or malformed.
    Format,
    /// The title key could not be derived.
    KeyDerivation,
    /// The underlying image could not be read.
    Io,
}

#[derive(Debug, Fail)]
pub enum WiiDiscError {
    #[fail(display = "Unknown signature type: {:#010X}", sig_type)]
    UnknownSignatureType {
        sig_type: u32,
    },
    #[fail(display = "Unknown public key type: {:#010X}", key_type)]
    UnknownKeyType {
        key_type: u32,
    },
    #[fail(display = "Invalid partition type: {}", kind)]
    UnknownPartitionKind {
        kind: u32,
    },
    #[fail(display = "TMD declares {} contents but only {} could be read", declared, read)]
    ContentCountMismatch {
        declared: u16,
        read: u16,
    },
    #[fail(display = "Common key index {} is out of range", index)]
    InvalidCommonKeyIndex {
        index: u8,
    },
    #[fail(display = "Could not decrypt block")]
    AesDecryptError,
    #[fail(display = "I/O error: {}", _0)]
    Io(#[cause] IOError),
}

impl WiiDiscError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WiiDiscError::UnknownSignatureType { .. }
            | WiiDiscError::UnknownKeyType { .. }
            | WiiDiscError::UnknownPartitionKind { .. }
            | WiiDiscError::ContentCountMismatch { .. }
            | WiiDiscError::AesDecryptError => ErrorKind::Format,
            WiiDiscError::InvalidCommonKeyIndex { .. } => ErrorKind::KeyDerivation,
            WiiDiscError::Io(..) => ErrorKind::Io,
        }
    }
}

impl From<IOError> for WiiDiscError {
    fn from(err: IOError) -> Self {
        WiiDiscError::Io(err)
    }
}

impl From<WiiDiscError> for IOError {
    fn from(err: WiiDiscError) -> Self {
        match err {
            WiiDiscError::Io(ioerr) => ioerr,
            other => IOError::new(IOErrorKind::InvalidData, other.compat()),
        }
    }
}

/// Finds the first `WiiDiscError` in the cause chain of a `failure::Error`.
pub fn find_disc_error(err: &failure::Error) -> Option<&WiiDiscError> {
    err.iter_chain().find_map(|cause| cause.downcast_ref::<WiiDiscError>())
}

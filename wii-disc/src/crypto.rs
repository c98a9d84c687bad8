use crate::consts;
use crate::error::WiiDiscError;
use crate::ticket::Ticket;
use crate::COMMON_KEY;
use aes::Aes128;
use block_modes::block_padding::NoPadding;
use block_modes::{BlockMode, Cbc};

// create an alias for convenience
type Aes128Cbc = Cbc<Aes128, NoPadding>;

pub type AesKey = [u8; consts::WII_KEY_SIZE];

pub fn aes_decrypt_inplace<'a>(data: &'a mut [u8], iv: &[u8], key: &[u8]) -> Result<&'a [u8], WiiDiscError> {
    let cipher = Aes128Cbc::new_var(key, iv).or(Err(WiiDiscError::AesDecryptError))?;
    cipher.decrypt(data).or(Err(WiiDiscError::AesDecryptError))
}

#[cfg(test)]
pub fn aes_encrypt_inplace<'a>(data: &'a mut [u8], iv: &[u8], key: &[u8]) -> Result<&'a [u8], WiiDiscError> {
    let size = data.len();
    let cipher = Aes128Cbc::new_var(key, iv).or(Err(WiiDiscError::AesDecryptError))?;
    cipher.encrypt(data, size).or(Err(WiiDiscError::AesDecryptError))
}

/// AES-128-CBC decryptor holding one partition key. The key schedule is
/// expanded per call, once for each block.
#[derive(Clone)]
pub struct BlockCipher {
    key: AesKey,
}

impl BlockCipher {
    pub fn new(key: AesKey) -> Self {
        BlockCipher { key }
    }

    pub fn set_key(&mut self, key: AesKey) {
        self.key = key;
    }

    /// Decrypts `ciphertext` into `plaintext`. Both must have the same length,
    /// a multiple of the AES block size.
    pub fn decrypt(&self, iv: &[u8; consts::WII_KEY_SIZE], ciphertext: &[u8], plaintext: &mut [u8]) -> Result<(), WiiDiscError> {
        if ciphertext.len() != plaintext.len() {
            return Err(WiiDiscError::AesDecryptError);
        }
        plaintext.copy_from_slice(ciphertext);
        aes_decrypt_inplace(plaintext, iv, &self.key)?;
        Ok(())
    }
}

impl std::fmt::Debug for BlockCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad("BlockCipher { .. }")
    }
}

/// Looks up a common key. Only indices 0 (standard) and 1 (Korean) exist.
pub fn common_key(index: u8) -> Result<&'static AesKey, WiiDiscError> {
    COMMON_KEY
        .get(index as usize)
        .ok_or(WiiDiscError::InvalidCommonKeyIndex { index })
}

// The title key IV is the Title ID followed by 8 zero bytes.
pub fn title_id_to_iv(title_id: &[u8; 8]) -> [u8; consts::WII_KEY_SIZE] {
    let mut iv = [0 as u8; consts::WII_KEY_SIZE];
    iv[..title_id.len()].copy_from_slice(title_id);
    iv
}

pub fn decrypt_title_key(tik: &Ticket) -> Result<AesKey, WiiDiscError> {
    let key = common_key(tik.common_key_index)?;
    let iv = title_id_to_iv(&tik.title_id);
    let mut buf = tik.title_key;
    aes_decrypt_inplace(&mut buf, &iv, key)?;
    Ok(buf)
}

// Builders for synthetic, fully encrypted disc images.
use crate::cert::{KeyType, SigType};
use crate::consts;
use crate::crypto::{aes_encrypt_inplace, title_id_to_iv, AesKey};
use crate::io_ext::Unpackable;
use crate::ticket::Ticket;
use crate::tmd::TmdContent;
use crate::COMMON_KEY;
use byteorder::{ByteOrder, BE};

fn put_str(buf: &mut [u8], s: &str) {
    buf[..s.len()].copy_from_slice(s.as_bytes());
}

pub struct TicketBuilder {
    part_key: AesKey,
    title_id: [u8; 8],
    common_key_index: u8,
}

impl TicketBuilder {
    pub fn new(part_key: AesKey) -> Self {
        TicketBuilder {
            part_key,
            title_id: *b"\x00\x01\x00\x00RMCE",
            common_key_index: 0,
        }
    }

    pub fn title_id(mut self, title_id: [u8; 8]) -> Self {
        self.title_id = title_id;
        self
    }

    pub fn common_key_index(mut self, index: u8) -> Self {
        self.common_key_index = index;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut buf = vec![0u8; consts::WII_TICKET_SIZE];
        BE::write_u32(&mut buf[0x00..], SigType::Rsa2048.into());
        put_str(&mut buf[0x140..0x180], "Root-CA00000001-XS00000003");
        let mut enc_key = self.part_key;
        let iv = title_id_to_iv(&self.title_id);
        aes_encrypt_inplace(&mut enc_key, &iv, &COMMON_KEY[self.common_key_index as usize]).unwrap();
        buf[0x1BF..0x1CF].copy_from_slice(&enc_key);
        buf[0x1DC..0x1E4].copy_from_slice(&self.title_id);
        buf[0x1F1] = self.common_key_index;
        buf
    }

    pub fn build_ticket(&self) -> Ticket {
        Ticket::unpack(&mut &self.build()[..]).unwrap()
    }
}

pub fn content(index: u16, size: u64) -> TmdContent {
    TmdContent {
        id: 0x100 + index as u32,
        index,
        content_type: 1,
        size,
        hash: [0xC0; consts::WII_HASH_SIZE],
    }
}

pub struct TmdBuilder {
    title_id: [u8; 8],
    title_version: u16,
    boot_index: u16,
    contents: Vec<TmdContent>,
}

impl TmdBuilder {
    pub fn new() -> Self {
        TmdBuilder {
            title_id: *b"\x00\x01\x00\x00RMCE",
            title_version: 0,
            boot_index: 0,
            contents: Vec::new(),
        }
    }

    pub fn title_id(mut self, title_id: [u8; 8]) -> Self {
        self.title_id = title_id;
        self
    }

    pub fn title_version(mut self, version: u16) -> Self {
        self.title_version = version;
        self
    }

    pub fn boot_index(mut self, index: u16) -> Self {
        self.boot_index = index;
        self
    }

    pub fn content(mut self, c: TmdContent) -> Self {
        self.contents.push(c);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut buf = vec![0u8; consts::WII_TMD_HEADER_SIZE];
        BE::write_u32(&mut buf[0x00..], SigType::Rsa2048.into());
        put_str(&mut buf[0x140..0x180], "Root-CA00000001-CP00000004");
        buf[0x18C..0x194].copy_from_slice(&self.title_id);
        BE::write_u16(&mut buf[0x1DC..], self.title_version);
        BE::write_u16(&mut buf[0x1DE..], self.contents.len() as u16);
        BE::write_u16(&mut buf[0x1E0..], self.boot_index);
        for c in &self.contents {
            let mut entry = [0u8; consts::WII_TMD_CONTENT_SIZE];
            BE::write_u32(&mut entry[0x00..], c.id);
            BE::write_u16(&mut entry[0x04..], c.index);
            BE::write_u16(&mut entry[0x06..], c.content_type);
            BE::write_u64(&mut entry[0x08..], c.size);
            entry[0x10..].copy_from_slice(&c.hash);
            buf.extend_from_slice(&entry);
        }
        buf
    }
}

pub fn cert_bytes(sig_type: SigType, key_type: KeyType, issuer: &str, subject: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut word = [0u8; 4];
    BE::write_u32(&mut word, sig_type.into());
    buf.extend_from_slice(&word);
    buf.extend(std::iter::repeat(0x5A).take(sig_type.sig_len()));
    buf.extend_from_slice(&[0u8; consts::WII_CERT_SIG_PAD]);
    let mut name = [0u8; 0x40];
    put_str(&mut name, issuer);
    buf.extend_from_slice(&name);
    BE::write_u32(&mut word, key_type.into());
    buf.extend_from_slice(&word);
    let mut name = [0u8; 0x40];
    put_str(&mut name, subject);
    buf.extend_from_slice(&name);
    buf.extend(std::iter::repeat(0xA5).take(key_type.key_len()));
    BE::write_u32(&mut word, 0x1234_5678);
    buf.extend_from_slice(&word);
    BE::write_u32(&mut word, 0x0001_0001);
    buf.extend_from_slice(&word);
    buf.extend_from_slice(&[0u8; consts::WII_CERT_TRAILING_PAD]);
    buf
}

pub fn default_chain_bytes() -> Vec<u8> {
    let mut buf = cert_bytes(SigType::Rsa4096, KeyType::Rsa2048, "Root", "CA00000001");
    buf.extend(cert_bytes(SigType::Rsa2048, KeyType::Rsa2048, "Root-CA00000001", "CP00000004"));
    buf.extend(cert_bytes(SigType::Rsa2048, KeyType::Rsa2048, "Root-CA00000001", "XS00000003"));
    buf
}

/// Deterministic plaintext payload with a boot block at its start.
pub fn sample_payload(len: usize) -> Vec<u8> {
    let mut buf: Vec<u8> = (0..len)
        .map(|i| ((i as u32).wrapping_mul(2_654_435_761) >> 24) as u8)
        .collect();
    if len >= 0x2460 {
        buf[..0x440].iter_mut().for_each(|b| *b = 0);
        put_str(&mut buf[0x00..0x06], "RMCE01");
        put_str(&mut buf[0x20..0x60], "SAMPLE TITLE");
        BE::write_u32(&mut buf[0x420..], 0x3000 >> 2);
        BE::write_u32(&mut buf[0x424..], 0x5_0000 >> 2);
        BE::write_u32(&mut buf[0x428..], 0x1800 >> 2);
        BE::write_u32(&mut buf[0x2440 + 0x14..], 0x1000);
        BE::write_u32(&mut buf[0x2440 + 0x18..], 0x200);
    }
    buf
}

fn block_iv(block: usize) -> [u8; 16] {
    let mut iv = [0u8; 16];
    for (i, b) in iv.iter_mut().enumerate() {
        *b = (block as u8).wrapping_mul(31).wrapping_add(i as u8 * 17) ^ 0x3C;
    }
    iv
}

/// Splits `plain` into 0x7C00 chunks and wraps each in an encrypted 0x8000
/// block carrying its own IV.
pub fn encrypt_payload(plain: &[u8], key: &AesKey) -> Vec<u8> {
    let mut out = Vec::new();
    for (idx, chunk) in plain.chunks(consts::WII_SECTOR_DATA_SIZE).enumerate() {
        let mut block = vec![0u8; consts::WII_SECTOR_SIZE];
        for (i, b) in block[..consts::WII_SECTOR_HASH_SIZE].iter_mut().enumerate() {
            *b = (i as u8) ^ (idx as u8);
        }
        let iv = block_iv(idx);
        block[consts::WII_SECTOR_IV_OFF..consts::WII_SECTOR_IV_OFF + 16].copy_from_slice(&iv);
        block[consts::WII_SECTOR_HASH_SIZE..][..chunk.len()].copy_from_slice(chunk);
        aes_encrypt_inplace(&mut block[consts::WII_SECTOR_HASH_SIZE..], &iv, key).unwrap();
        out.extend_from_slice(&block);
    }
    out
}

pub const PART_TMD_OFF: u64 = 0x2C0;
pub const PART_H3_OFF: u64 = 0x8000;
pub const PART_DATA_OFF: u64 = 0x20000;

/// Raw bytes of one partition: header, TMD, cert chain, encrypted payload.
pub fn build_partition(ticket: &[u8], tmd: &[u8], payload: &[u8], key: &AesKey) -> Vec<u8> {
    let chain = default_chain_bytes();
    let cert_off = (PART_TMD_OFF as usize + tmd.len() + 0x1F) & !0x1F;
    let data = encrypt_payload(payload, key);
    let mut buf = vec![0u8; PART_DATA_OFF as usize];
    buf[..ticket.len()].copy_from_slice(ticket);
    BE::write_u32(&mut buf[0x2A4..], tmd.len() as u32);
    BE::write_u32(&mut buf[0x2A8..], (PART_TMD_OFF >> 2) as u32);
    BE::write_u32(&mut buf[0x2AC..], chain.len() as u32);
    BE::write_u32(&mut buf[0x2B0..], (cert_off >> 2) as u32);
    BE::write_u32(&mut buf[0x2B4..], (PART_H3_OFF >> 2) as u32);
    BE::write_u32(&mut buf[0x2B8..], (PART_DATA_OFF >> 2) as u32);
    BE::write_u32(&mut buf[0x2BC..], (data.len() >> 2) as u32);
    buf[PART_TMD_OFF as usize..][..tmd.len()].copy_from_slice(tmd);
    buf[cert_off..][..chain.len()].copy_from_slice(&chain);
    buf.extend_from_slice(&data);
    buf
}

pub const FIRST_PART_OFF: u64 = 0x50000;
pub const PART_TABLE_OFF: u64 = 0x40020;

/// Lays out a disc image with a partition table pointing at each partition.
pub struct DiscBuilder {
    parts: Vec<(u32, Vec<u8>)>,
    declared_count: Option<u32>,
}

impl DiscBuilder {
    pub fn new() -> Self {
        DiscBuilder { parts: Vec::new(), declared_count: None }
    }

    pub fn partition(mut self, kind: u32, raw: Vec<u8>) -> Self {
        self.parts.push((kind, raw));
        self
    }

    pub fn declared_count(mut self, count: u32) -> Self {
        self.declared_count = Some(count);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut buf = vec![0u8; FIRST_PART_OFF as usize];
        let count = self.declared_count.unwrap_or(self.parts.len() as u32);
        BE::write_u32(&mut buf[consts::WII_PART_INFO_OFF as usize..], count);
        BE::write_u32(&mut buf[consts::WII_PART_INFO_OFF as usize + 4..], (PART_TABLE_OFF >> 2) as u32);
        for (i, (kind, raw)) in self.parts.iter().enumerate() {
            let offset = buf.len() as u64;
            let entry = PART_TABLE_OFF as usize + 8 * i;
            BE::write_u32(&mut buf[entry..], (offset >> 2) as u32);
            BE::write_u32(&mut buf[entry + 4..], *kind);
            buf.extend_from_slice(raw);
            let aligned = (buf.len() + consts::WII_SECTOR_SIZE - 1) & !(consts::WII_SECTOR_SIZE - 1);
            buf.resize(aligned, 0);
        }
        buf
    }
}

/// Options for opening a disc or a single partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    /// Reject a TMD whose signature type is neither RSA-4096 nor RSA-2048.
    pub strict_tmd_signature: bool,
    /// Decrypt the boot block of each partition while opening it.
    pub read_boot_info: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        OpenOptions {
            strict_tmd_signature: true,
            read_boot_info: true,
        }
    }
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict_tmd_signature(mut self, strict: bool) -> Self {
        self.strict_tmd_signature = strict;
        self
    }

    pub fn read_boot_info(mut self, read: bool) -> Self {
        self.read_boot_info = read;
        self
    }
}

//! System ROM image loading (spec.md §6 "ROM images").
//!
//! Trimmed from `alivesay-rust-iic/src/rom.rs`: the Intel HEX loader had no
//! remaining call site once the monitor/disassembler tooling that used it
//! was dropped, so only the plain byte loader survives.

use std::fs;
use std::io;
use std::path::Path;

use crate::util::hexdump;

/// `$C100-$FFFF`, one page of system ROM (spec.md §3, "up to 4 physical
/// ROM pages").
pub const ROM_PAGE_SIZE: usize = 0x3F00;

pub struct Rom {
    pub data: Vec<u8>,
}

impl Rom {
    pub fn load_from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let data = fs::read(path)?;
        Self::load_from_bytes(&data)
    }

    pub fn load_from_bytes(bytes: &[u8]) -> io::Result<Self> {
        if bytes.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "ROM image is empty"));
        }
        if bytes.len() > ROM_PAGE_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("ROM too large: {} bytes (max {ROM_PAGE_SIZE})", bytes.len()),
            ));
        }

        let mut data = vec![0xFF; ROM_PAGE_SIZE];
        data[..bytes.len()].copy_from_slice(bytes);

        log::info!("rom loaded: {} bytes", bytes.len());
        hexdump(&data, Some(0), Some(bytes.len().min(0x100)));

        Ok(Self { data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_image_is_padded_with_0xff() {
        let rom = Rom::load_from_bytes(&[0xEA, 0xEA]).unwrap();
        assert_eq!(rom.data.len(), ROM_PAGE_SIZE);
        assert_eq!(rom.data[2], 0xFF);
    }

    #[test]
    fn oversized_image_is_rejected() {
        let bytes = vec![0u8; ROM_PAGE_SIZE + 1];
        assert!(Rom::load_from_bytes(&bytes).is_err());
    }

    #[test]
    fn empty_image_is_rejected() {
        assert!(Rom::load_from_bytes(&[]).is_err());
    }
}

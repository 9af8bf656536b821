//! DAN ][ SD card controller (spec.md §4.6), grounded directly on
//! `original_source/cardDan2Controller.go` — an 8255-PPI-style two-unit
//! block device speaking a byte-serial command protocol over Port A/C.
//!
//! The command framing here follows the original's actual behavior, not
//! spec.md's literal wording: a `$AC` byte resets the command buffer
//! *without being stored in it*, and a command fires once six more bytes
//! have arrived (`[command, unit, bufferL, bufferH, blockL, blockH]`) —
//! seven wire bytes per command, not six.

use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use crate::card::Card;

const RESPONSE_PAYLOAD_LEN: usize = 512;

/// The DAN ][ card's boot firmware, lifted verbatim from the Arduino
/// sketch's `PROGMEM` table (a tiny 6502 bootstrap loader, not a
/// copyrighted Apple-supplied ROM) — this is what command `0x8D`/`0xA0`
/// ("read bootblock") hands back.
#[rustfmt::skip]
const PROGMEM: [u8; 512] = [
    0xea, 0xa9, 0x20, 0x85, 0xf0, 0xa9, 0x60, 0x85, 0xf3, 0xa5, 0x43, 0x4a,
    0x4a, 0x4a, 0x4a, 0x29, 0x07, 0x09, 0xc0, 0x85, 0xf2, 0xa0, 0x00, 0x84,
    0xf1, 0x88, 0xb1, 0xf1, 0x85, 0xf1, 0x20, 0x93, 0xfe, 0x20, 0x89, 0xfe,
    0x20, 0x58, 0xfc, 0x20, 0xa2, 0x09, 0xa9, 0x00, 0x85, 0x25, 0x20, 0x22,
    0xfc, 0xa5, 0x25, 0x85, 0xf5, 0x85, 0xf6, 0x20, 0x90, 0x09, 0xa9, 0x00,
    0x85, 0x24, 0xa5, 0x25, 0x20, 0xe3, 0xfd, 0xe6, 0x24, 0x20, 0x7a, 0x09,
    0x20, 0x04, 0x09, 0xa9, 0x14, 0x85, 0x24, 0xa5, 0x25, 0x20, 0xe3, 0xfd,
    0xe6, 0x24, 0xa5, 0x43, 0x09, 0x80, 0x85, 0x43, 0x20, 0x7a, 0x09, 0x20,
    0x04, 0x09, 0xa5, 0x43, 0x29, 0x7f, 0x85, 0x43, 0xe6, 0x25, 0xa5, 0x25,
    0xc9, 0x10, 0x90, 0xbe, 0xa9, 0x00, 0x85, 0x24, 0xa9, 0x12, 0x85, 0x25,
    0x20, 0x22, 0xfc, 0xa2, 0x14, 0x20, 0x66, 0x09, 0x20, 0x61, 0x09, 0xa9,
    0x0a, 0x85, 0x24, 0xa5, 0xf7, 0x20, 0xf8, 0x08, 0xa9, 0x14, 0x85, 0x24,
    0x20, 0x5c, 0x09, 0xa9, 0x1e, 0x85, 0x24, 0xa5, 0xf8, 0x20, 0xf8, 0x08,
    0xa9, 0x0a, 0x85, 0x24, 0x20, 0xca, 0x08, 0x85, 0xf5, 0x20, 0xf8, 0x08,
    0xa9, 0x1e, 0x85, 0x24, 0x20, 0xca, 0x08, 0x85, 0xf6, 0x20, 0xf8, 0x08,
    0x20, 0x8c, 0x09, 0x4c, 0xb7, 0x09, 0xa5, 0xf7, 0x85, 0xf5, 0xa5, 0xf8,
    0x85, 0xf6, 0x20, 0x90, 0x09, 0x68, 0x68, 0x4c, 0xb7, 0x09, 0x20, 0x0c,
    0xfd, 0xc9, 0x9b, 0xf0, 0xe9, 0xc9, 0xa1, 0xf0, 0x20, 0xc9, 0xe1, 0x90,
    0x03, 0x38, 0xe9, 0x20, 0xc9, 0xc1, 0x90, 0x04, 0xc9, 0xc7, 0x90, 0x0b,
    0xc9, 0xb0, 0x90, 0xe2, 0xc9, 0xba, 0xb0, 0xde, 0x29, 0x0f, 0x60, 0x38,
    0xe9, 0x07, 0x29, 0x0f, 0x60, 0xa9, 0xff, 0x60, 0xc9, 0xff, 0xf0, 0x03,
    0x4c, 0xe3, 0xfd, 0xa9, 0xa1, 0x4c, 0xed, 0xfd, 0xa2, 0x00, 0xb0, 0x25,
    0xad, 0x05, 0x10, 0x30, 0x20, 0xad, 0x04, 0x10, 0x29, 0xf0, 0xc9, 0xf0,
    0xd0, 0x17, 0xad, 0x04, 0x10, 0x29, 0x0f, 0xf0, 0x10, 0x85, 0xf9, 0xbd,
    0x05, 0x10, 0x09, 0x80, 0x20, 0xed, 0xfd, 0xe8, 0xe4, 0xf9, 0xd0, 0xf3,
    0x60, 0x4c, 0x66, 0x09, 0xbc, 0xce, 0xcf, 0xa0, 0xd6, 0xcf, 0xcc, 0xd5,
    0xcd, 0xc5, 0xbe, 0x00, 0xc3, 0xc1, 0xd2, 0xc4, 0xa0, 0xb1, 0xba, 0x00,
    0xc4, 0xc1, 0xce, 0xa0, 0xdd, 0xdb, 0xa0, 0xd6, 0xcf, 0xcc, 0xd5, 0xcd,
    0xc5, 0xa0, 0xd3, 0xc5, 0xcc, 0xc5, 0xc3, 0xd4, 0xcf, 0xd2, 0x8d, 0x00,
    0xa9, 0xb2, 0x8d, 0x41, 0x09, 0xa2, 0x0c, 0x4c, 0x66, 0x09, 0xbd, 0x30,
    0x09, 0xf0, 0x0e, 0x20, 0xed, 0xfd, 0xe8, 0xd0, 0xf5, 0xa9, 0x00, 0x85,
    0x44, 0xa9, 0x10, 0x85, 0x45, 0x60, 0xa9, 0x01, 0x85, 0x42, 0x20, 0x71,
    0x09, 0xa9, 0x02, 0x85, 0x46, 0xa9, 0x00, 0x85, 0x47, 0x4c, 0xf0, 0x00,
    0xa9, 0x07, 0xd0, 0x02, 0xa9, 0x06, 0x85, 0x42, 0x20, 0x71, 0x09, 0xa5,
    0xf5, 0x85, 0x46, 0xa5, 0xf6, 0x85, 0x47, 0x4c, 0xf0, 0x00, 0xa9, 0x05,
    0x85, 0x42, 0x20, 0x71, 0x09, 0x20, 0xf0, 0x00, 0xad, 0x00, 0x10, 0x85,
    0xf7, 0xad, 0x01, 0x10, 0x85, 0xf8, 0x60, 0xa9, 0x00, 0x85, 0xf1, 0x6c,
    0xf1, 0x00,
];

/// Status codes reported in the 1-byte response prefix (spec.md §13).
pub mod status {
    pub const OK: u8 = 0x00;
    pub const BAD_COMMAND: u8 = 0x27;
    pub const IO_FAILURE: u8 = 0x28;
}

/// One of the card's two logical units: either a raw block device file
/// or a directory of `BLKDEVxx.PO`-style per-volume files.
pub struct DanSlot {
    pub path: PathBuf,
    pub file_no: u8,
    file_name: PathBuf,
}

impl DanSlot {
    pub fn new(path: PathBuf, file_no: u8) -> Self {
        let mut slot = Self { path, file_no, file_name: PathBuf::new() };
        slot.initialize_drive();
        slot
    }

    fn initialize_drive(&mut self) {
        if self.file_no == 255 {
            self.file_no = 0;
        }
        self.file_name = if self.file_no == 0 {
            self.path.clone()
        } else {
            self.path.join(format!("BLKDEV{:02X}.PO", self.file_no))
        };
    }

    fn block_position(&self, unit: u8, block: u16) -> u64 {
        if self.file_no == 0 {
            512 * (block as u64 + ((unit as u64 & 0x0f) << 12))
        } else {
            512 * block as u64
        }
    }

    fn status(&self) -> Result<(), std::io::Error> {
        OpenOptions::new().read(true).write(true).open(&self.file_name)?;
        Ok(())
    }

    fn read_block(&self, unit: u8, block: u16) -> Result<[u8; 512], std::io::Error> {
        let mut file = OpenOptions::new().read(true).write(true).open(&self.file_name)?;
        file.seek(SeekFrom::Start(self.block_position(unit, block)))?;
        let mut buffer = [0u8; 512];
        file.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    fn write_block(&self, unit: u8, block: u16, data: &[u8]) -> Result<(), std::io::Error> {
        let mut file = OpenOptions::new().read(true).write(true).open(&self.file_name)?;
        file.seek(SeekFrom::Start(self.block_position(unit, block)))?;
        file.write_all(data)?;
        Ok(())
    }
}

pub struct Dan2Card {
    command_buffer: Option<Vec<u8>>,
    response_buffer: VecDeque<u8>,

    receiving_write_buffer: bool,
    write_buffer: Vec<u8>,
    pending_write: Option<(u8, u16)>,

    port_b: u8,
    port_c: u8,

    pub slot_a: DanSlot,
    pub slot_b: DanSlot,

    rom: Option<Vec<u8>>,
}

impl Dan2Card {
    pub fn new(slot_a: DanSlot, slot_b: DanSlot) -> Self {
        Self {
            command_buffer: None,
            response_buffer: VecDeque::with_capacity(RESPONSE_PAYLOAD_LEN + 1),
            receiving_write_buffer: false,
            write_buffer: Vec::with_capacity(512),
            pending_write: None,
            port_b: 0,
            port_c: 0,
            slot_a,
            slot_b,
            rom: None,
        }
    }

    pub fn with_rom(mut self, rom: Vec<u8>) -> Self {
        self.rom = Some(rom);
        self
    }

    fn select_slot(&self, unit: u8) -> &DanSlot {
        if unit & 0x80 == 0 {
            &self.slot_a
        } else {
            &self.slot_b
        }
    }

    fn select_slot_mut(&mut self, unit: u8) -> &mut DanSlot {
        if unit & 0x80 == 0 {
            &mut self.slot_a
        } else {
            &mut self.slot_b
        }
    }

    fn send_response_code(&mut self, code: u8) {
        self.response_buffer.push_back(code);
    }

    fn send_response(&mut self, payload: &[u8]) {
        self.response_buffer.push_back(status::OK);
        self.response_buffer.extend(payload.iter().copied());
        let rest = RESPONSE_PAYLOAD_LEN.saturating_sub(payload.len());
        self.response_buffer.extend(std::iter::repeat(0u8).take(rest));
    }

    fn unit_buf_blk(buf: &[u8]) -> (u8, u16, u16) {
        let unit = buf[1];
        let buffer = buf[2] as u16 | (buf[3] as u16) << 8;
        let block = buf[4] as u16 | (buf[5] as u16) << 8;
        (unit, buffer, block)
    }

    fn process_command(&mut self) {
        let buf = self.command_buffer.clone().expect("processed only once buffered");
        let command = buf[0];
        match command {
            0 | 3 => {
                let (unit, _buffer, _block) = Self::unit_buf_blk(&buf);
                let slot = self.select_slot(unit);
                match slot.status() {
                    Ok(()) => self.send_response_code(status::OK),
                    Err(err) => {
                        log::warn!("dan2: status failed: {err}");
                        self.send_response_code(status::IO_FAILURE);
                    }
                }
                self.command_buffer = None;
            }
            1 => {
                let (unit, buffer, block) = Self::unit_buf_blk(&buf);
                log::trace!("dan2: read unit {unit:#04x} buffer {buffer:#06x} block {block}");
                let slot = self.select_slot(unit);
                match slot.read_block(unit, block) {
                    Ok(data) => self.send_response(&data),
                    Err(err) => {
                        log::warn!("dan2: read failed: {err}");
                        self.send_response_code(status::IO_FAILURE);
                    }
                }
                self.command_buffer = None;
            }
            2 => {
                let (unit, buffer, block) = Self::unit_buf_blk(&buf);
                log::trace!("dan2: write unit {unit:#04x} buffer {buffer:#06x} block {block}");
                self.receiving_write_buffer = true;
                self.write_buffer = Vec::with_capacity(512);
                self.pending_write = Some((unit, block));
                self.send_response_code(status::OK);
                self.command_buffer = None;
            }
            5 => {
                log::trace!("dan2: get volume");
                self.send_response(&[self.slot_a.file_no, self.slot_b.file_no]);
                self.command_buffer = None;
            }
            4 | 6 | 7 => {
                let (_unit, _buffer, block) = Self::unit_buf_blk(&buf);
                // The original only ever touches slotA here (never slotB) —
                // a bug in the upstream firmware driver, preserved as-is.
                self.slot_a.file_no = (block & 0xff) as u8;
                self.slot_a.initialize_drive();
                self.slot_a.file_no = ((block >> 8) & 0xff) as u8;
                self.slot_a.initialize_drive();

                if command == 4 {
                    self.send_response_code(status::OK);
                } else {
                    self.send_response(&[]);
                }
                self.command_buffer = None;
            }
            0x8D | 0xA0 => {
                log::trace!("dan2: read bootblock");
                self.send_response(&PROGMEM);
                self.command_buffer = None;
            }
            other => {
                log::warn!("dan2: unknown command {other:#04x}");
                self.send_response_code(status::BAD_COMMAND);
                self.command_buffer = None;
            }
        }
    }

    fn write_port_a(&mut self, data: u8) {
        if self.receiving_write_buffer {
            self.write_buffer.push(data);
            if self.write_buffer.len() == 512 {
                if let Some((unit, block)) = self.pending_write.take() {
                    let payload = std::mem::take(&mut self.write_buffer);
                    let slot = self.select_slot_mut(unit);
                    if let Err(err) = slot.write_block(unit, block, &payload) {
                        log::warn!("dan2: write failed: {err}");
                    }
                }
                self.receiving_write_buffer = false;
                self.write_buffer.clear();
            }
        } else if self.command_buffer.is_none() {
            if data == 0xAC {
                self.command_buffer = Some(Vec::with_capacity(6));
            }
        } else {
            let buf = self.command_buffer.as_mut().expect("checked above");
            buf.push(data);
            if buf.len() == 6 {
                self.process_command();
            }
        }
    }

    fn write_control(&mut self, data: u8) {
        if data & 0x80 == 0 {
            let bit = (data >> 1) & 0x08;
            if data & 1 == 0 {
                self.port_c &= !(1u8 << bit);
            } else {
                self.port_c |= 1u8 << bit;
            }
        } else if data != 0xFA {
            log::trace!("dan2: unsupported 8255 mode byte {data:#04x}, expected 0xFA");
        }
    }

    fn read_port_a(&mut self) -> u8 {
        self.response_buffer.pop_front().unwrap_or(0)
    }

    fn read_port_c(&self) -> u8 {
        let mut value = 0x80u8; // nOBF: output buffer never full
        if !self.response_buffer.is_empty() {
            value |= 0x20; // niBF: input buffer has data
        }
        value
    }
}

impl Card for Dan2Card {
    fn name(&self) -> &str {
        "DAN ][ Controller"
    }

    fn rom(&self) -> Option<&[u8]> {
        self.rom.as_deref()
    }

    /// Only A0/A1 are wired (spec.md §4.6); every other bit of the
    /// sub-address is ignored, matching the original's `address &= 0x03`.
    fn soft_switch(&mut self, sub_addr: u8, data: u8, is_write: bool) -> u8 {
        let address = sub_addr & 0x03;
        if is_write {
            match address {
                0 => self.write_port_a(data),
                3 => self.write_control(data),
                _ => {}
            }
            0
        } else {
            match address {
                0 => self.read_port_a(),
                2 => self.read_port_c(),
                _ => 0,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn temp_image(name: &str, len: usize) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("dan2_test_{name}_{:?}", std::thread::current().id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&vec![0u8; len]).unwrap();
        path
    }

    fn send_command(card: &mut Dan2Card, bytes: &[u8]) {
        card.soft_switch(0, 0xAC, true);
        for &b in bytes {
            card.soft_switch(0, b, true);
        }
    }

    #[test]
    fn set_volume_only_touches_slot_a() {
        let slot_a = DanSlot::new(temp_image("a", 512).parent().unwrap().to_path_buf(), 0);
        let slot_b = DanSlot::new(temp_image("b", 512).parent().unwrap().to_path_buf(), 0);
        let mut card = Dan2Card::new(slot_a, slot_b);
        let original_b = card.slot_b.file_no;

        // command 4, unit 0, buffer 0, block = 0x0203 (low=3 -> slotA,
        // high=2 -> slotA again per the preserved quirk)
        send_command(&mut card, &[4, 0x00, 0x00, 0x00, 0x03, 0x02]);

        assert_eq!(card.slot_a.file_no, 2);
        assert_eq!(card.slot_b.file_no, original_b, "slotB must never be touched by set-volume");
    }

    #[test]
    fn unknown_command_reports_bad_command_status() {
        let slot_a = DanSlot::new(std::env::temp_dir(), 0);
        let slot_b = DanSlot::new(std::env::temp_dir(), 0);
        let mut card = Dan2Card::new(slot_a, slot_b);
        send_command(&mut card, &[99, 0, 0, 0, 0, 0]);
        assert_eq!(card.soft_switch(0, 0, false), status::BAD_COMMAND);
    }

    #[test]
    fn read_bootblock_returns_progmem_with_success_prefix() {
        let slot_a = DanSlot::new(std::env::temp_dir(), 0);
        let slot_b = DanSlot::new(std::env::temp_dir(), 0);
        let mut card = Dan2Card::new(slot_a, slot_b);
        send_command(&mut card, &[0x8D, 0, 0, 0, 0, 0]);
        assert_eq!(card.soft_switch(0, 0, false), status::OK);
        assert_eq!(card.soft_switch(0, 0, false), PROGMEM[0]);
    }

    #[test]
    fn read_block_round_trips_through_write_block() {
        let dir = std::env::temp_dir();
        let image_path = temp_image("rw", 512 * 8);
        let mut slot_a = DanSlot::new(dir.clone(), 0);
        slot_a.path = image_path.clone();
        slot_a.file_no = 0;
        slot_a.initialize_drive();
        let slot_b = DanSlot::new(dir, 0);
        let mut card = Dan2Card::new(slot_a, slot_b);

        send_command(&mut card, &[2, 0x00, 0x00, 0x00, 0x01, 0x00]); // write block 1
        assert_eq!(card.soft_switch(0, 0, false), status::OK);
        for b in 0..512u16 {
            card.soft_switch(0, (b % 256) as u8, true);
        }

        send_command(&mut card, &[1, 0x00, 0x00, 0x00, 0x01, 0x00]); // read block 1
        assert_eq!(card.soft_switch(0, 0, false), status::OK);
        for b in 0..512u16 {
            assert_eq!(card.soft_switch(0, 0, false), (b % 256) as u8);
        }
    }
}

//! The $C000-$C0FF soft-switch I/O plane (spec.md §4.3).
//!
//! Every address in this strip can, on read or write, flip a machine-mode
//! bit and/or dispatch to a card's soft-switch handler. Both directions
//! must run the action table — several reads have side effects (`$C054`
//! clears PAGE2 the same as a write would), so callers must never treat a
//! read as pure.
//!
//! `$C000-$C08F` are motherboard-fixed (80STORE/RAMRD/RAMWRT/INTCXROM/
//! SLOTC3ROM/ALTZP, video mode bits, the keyboard latch, and the language
//! card control block at `$C080-$C08F`, wired the same as a permanently
//! installed "slot 0"). `$C090-$C0FF` dispatch to whichever card sits in
//! slots 1-7 (`crate::card`), with the low nibble passed through as the
//! card's sub-address.

use std::cell::Cell;

use crate::util::ior;

/// Language-card control bits, addressed two-at-a-time ($C08x/$C08x+1 is
/// read vs write-enable, the bank bit lives in the high nibble). Mirrors
/// `original_source/memoryManager.go`'s `lcActiveRead`/`lcActiveWrite`/
/// `lcAltBank`, and the teacher's `LcRamMode` table in `mmu.rs` (kept
/// there, since the MMU is what actually consults these bits).
#[derive(Debug, Clone, Copy, Default)]
pub struct LanguageCardMode {
    pub read_ram: bool,
    pub write_enabled: bool,
    pub bank2: bool,
}

pub struct IoPlane {
    // Apple //e paging switches (spec.md §3 "Soft-switch bit")
    pub altzp: Cell<bool>,
    pub ramrd: Cell<bool>,
    pub ramwrt: Cell<bool>,
    pub intcxrom: Cell<bool>,
    pub slotc3rom: Cell<bool>,
    pub store80: Cell<bool>,

    // Language card control, wired at $C080-$C08F
    lc_read: Cell<bool>,
    lc_write: Cell<bool>,
    lc_bank2: Cell<bool>,
    // Write-enable on the LC block requires two consecutive reads of an
    // odd address ($C081/83/89/8B/8D/8F); (last_addr, consecutive_count).
    lc_write_rr: [Cell<(u16, u8)>; 6],

    // Video-visible mode bits (spec.md §6 "Video source contract")
    pub text: Cell<bool>,
    pub mixed: Cell<bool>,
    pub hires: Cell<bool>,
    pub lores: Cell<bool>,
    pub page2: Cell<bool>,
    pub col80: Cell<bool>,
    pub altchar: Cell<bool>,
    pub dhires: Cell<bool>,

    // Keyboard strobe ($C000 / $C010)
    keyboard_latch: Cell<u8>,
    key_strobe: Cell<bool>,
}

impl Default for IoPlane {
    fn default() -> Self {
        Self::new()
    }
}

impl IoPlane {
    pub fn new() -> Self {
        Self {
            altzp: Cell::new(false),
            ramrd: Cell::new(false),
            ramwrt: Cell::new(false),
            intcxrom: Cell::new(true),
            slotc3rom: Cell::new(false),
            store80: Cell::new(false),

            lc_read: Cell::new(false),
            lc_write: Cell::new(false),
            lc_bank2: Cell::new(true),
            lc_write_rr: Default::default(),

            text: Cell::new(true),
            mixed: Cell::new(false),
            hires: Cell::new(false),
            lores: Cell::new(false),
            page2: Cell::new(false),
            col80: Cell::new(false),
            altchar: Cell::new(false),
            dhires: Cell::new(false),

            keyboard_latch: Cell::new(0),
            key_strobe: Cell::new(false),
        }
    }

    /// Resets the switches to their documented power-on/reset defaults
    /// (spec.md §8, end-to-end scenario 6).
    pub fn reset_to_power_on_defaults(&self) {
        self.altzp.set(false);
        self.ramrd.set(false);
        self.ramwrt.set(false);
        self.intcxrom.set(true);
        self.slotc3rom.set(false);
        self.store80.set(false);
        self.lc_read.set(false);
        self.lc_write.set(false);
        self.lc_bank2.set(true);
        for rr in &self.lc_write_rr {
            rr.set((0, 0));
        }
        self.text.set(true);
        self.mixed.set(false);
        self.hires.set(false);
        self.lores.set(false);
        self.page2.set(false);
        self.col80.set(false);
        self.altchar.set(false);
        self.dhires.set(false);
        self.key_strobe.set(false);
    }

    pub fn language_card_mode(&self) -> LanguageCardMode {
        LanguageCardMode {
            read_ram: self.lc_read.get(),
            write_enabled: self.lc_write.get(),
            bank2: self.lc_bank2.get(),
        }
    }

    /// Restores the language-card mode bits from a snapshot
    /// (`crate::machine::MachineSnapshot`). The double-read write-enable
    /// counters aren't part of the restored state; a resumed machine
    /// simply requires the normal two reads again to re-enable writes.
    pub fn restore_language_card_mode(&self, mode: LanguageCardMode) {
        self.lc_read.set(mode.read_ram);
        self.lc_write.set(mode.write_enabled);
        self.lc_bank2.set(mode.bank2);
    }

    /// A key arrived from the (out-of-core) keyboard adapter.
    pub fn post_key(&self, ascii: u8) {
        self.keyboard_latch.set(ascii | 0x80);
        self.key_strobe.set(true);
    }

    fn read_latch(&self) -> u8 {
        if self.key_strobe.get() {
            self.keyboard_latch.get()
        } else {
            self.keyboard_latch.get() & 0x7F
        }
    }

    /// Index of the read-read toggle counter for a given $C08x address, if
    /// that address requires the double-read write-enable protocol.
    fn lc_rr_slot(addr: u16) -> Option<usize> {
        match addr & 0x0F {
            0x1 => Some(0),
            0x3 => Some(1),
            0x9 => Some(2),
            0xB => Some(3),
            0xD => Some(4),
            0xF => Some(5),
            _ => None,
        }
    }

    fn apply_lc_mode(&self, addr: u16, via_read: bool) {
        let sub = addr & 0x0F;
        let bank2 = sub < 0x8;
        let read_ram = matches!(sub, 0x0 | 0x3 | 0x8 | 0xB);
        let write_target = matches!(sub, 0x1 | 0x3 | 0x9 | 0xB);

        if !via_read {
            self.lc_bank2.set(bank2);
            self.lc_read.set(read_ram);
            self.lc_write.set(write_target);
            return;
        }

        self.lc_bank2.set(bank2);
        self.lc_read.set(read_ram);

        match Self::lc_rr_slot(addr) {
            None => self.lc_write.set(write_target),
            Some(slot) => {
                let (last_addr, count) = self.lc_write_rr[slot].get();
                let count = if last_addr == addr { count + 1 } else { 1 };
                self.lc_write_rr[slot].set((addr, count));
                if count >= 2 {
                    self.lc_write.set(write_target);
                }
            }
        }
    }

    /// Read path. Must be called for every CPU read in `$C000-$C08F`;
    /// mirrors `original_source/memoryManager.go`'s switch accessors.
    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            0xC000 => self.read_latch(),
            0xC010 => {
                self.key_strobe.set(false);
                self.read_latch()
            }

            0xC011 => ior(self.lc_bank2.get() as u8),
            0xC012 => ior(self.lc_read.get() as u8),
            0xC013 => ior(self.ramrd.get() as u8),
            0xC014 => ior(self.ramwrt.get() as u8),
            0xC015 => ior(self.intcxrom.get() as u8),
            0xC016 => ior(self.altzp.get() as u8),
            0xC017 => ior(self.slotc3rom.get() as u8),
            0xC018 => ior(self.store80.get() as u8),
            0xC019 => 0x00, // RDVBLBAR: no beam-racing modeled, always "not blanking"

            0xC01A => ior(self.text.get() as u8),
            0xC01B => ior(self.mixed.get() as u8),
            0xC01C => ior(self.page2.get() as u8),
            0xC01D => ior(self.hires.get() as u8),
            0xC01E => ior(self.altchar.get() as u8),
            0xC01F => ior(self.col80.get() as u8),

            0xC050 => {
                self.text.set(false);
                0x00
            }
            0xC051 => {
                self.text.set(true);
                0x00
            }
            0xC052 => {
                self.mixed.set(false);
                0x00
            }
            0xC053 => {
                self.mixed.set(true);
                0x00
            }
            0xC054 => {
                self.page2.set(false);
                0x00
            }
            0xC055 => {
                self.page2.set(true);
                0x00
            }
            0xC056 => {
                self.hires.set(false);
                self.lores.set(true);
                0x00
            }
            0xC057 => {
                self.lores.set(false);
                self.hires.set(true);
                0x00
            }
            0xC05E => {
                self.dhires.set(true);
                0x00
            }
            0xC05F => {
                self.dhires.set(false);
                0x00
            }
            0xC060..=0xC06F => 0x00, // paddles/buttons: out of scope (input adapters)

            0xC080..=0xC08F => {
                self.apply_lc_mode(addr, true);
                0x00
            }

            _ => {
                log::debug!("io: unhandled soft-switch read at {addr:#06X}");
                0x00
            }
        }
    }

    /// Write path. Side effects mirror `read` wherever the original
    /// hardware makes a switch both read- and write-triggerable.
    pub fn write(&self, addr: u16, value: u8) -> u8 {
        match addr {
            0xC000 => self.store80.set(false),
            0xC001 => self.store80.set(true),
            0xC002 => self.ramrd.set(false),
            0xC003 => self.ramrd.set(true),
            0xC004 => self.ramwrt.set(false),
            0xC005 => self.ramwrt.set(true),
            0xC006 => self.intcxrom.set(false),
            0xC007 => self.intcxrom.set(true),
            0xC008 => self.altzp.set(false),
            0xC009 => self.altzp.set(true),
            0xC00A => self.slotc3rom.set(false),
            0xC00B => self.slotc3rom.set(true),
            0xC00C => self.col80.set(false),
            0xC00D => self.col80.set(true),
            0xC00E => self.altchar.set(false),
            0xC00F => self.altchar.set(true),
            0xC010 => self.key_strobe.set(false),

            0xC050 => self.text.set(false),
            0xC051 => self.text.set(true),
            0xC052 => self.mixed.set(false),
            0xC053 => self.mixed.set(true),
            0xC054 => self.page2.set(false),
            0xC055 => self.page2.set(true),
            0xC056 => {
                self.hires.set(false);
                self.lores.set(true);
            }
            0xC057 => {
                self.lores.set(false);
                self.hires.set(true);
            }
            0xC05E => self.dhires.set(true),
            0xC05F => self.dhires.set(false),
            0xC060..=0xC06F => {}

            0xC080..=0xC08F => self.apply_lc_mode(addr, false),

            _ => log::debug!("io: unhandled soft-switch write at {addr:#06X} = {value:#04X}"),
        }
        let _ = value;
        0x00
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboard_strobe_clears_on_c010_read() {
        let io = IoPlane::new();
        assert_eq!(io.read(0xC000), 0x00);
        io.post_key(b'A');
        assert_eq!(io.read(0xC000), 0xC1);
        io.read(0xC010);
        assert_eq!(io.read(0xC000), 0x41);
    }

    #[test]
    fn c081_requires_two_reads_to_enable_write() {
        let io = IoPlane::new();
        io.read(0xC081);
        assert!(!io.language_card_mode().write_enabled);
        io.read(0xC081);
        assert!(io.language_card_mode().write_enabled);
    }

    #[test]
    fn reset_restores_power_on_defaults() {
        let io = IoPlane::new();
        io.write(0xC006, 0); // INTCXROM off
        io.write(0xC009, 0); // ALTZP on
        io.reset_to_power_on_defaults();
        assert!(io.intcxrom.get());
        assert!(!io.altzp.get());
    }
}

//! Memory management unit: the address-decode cascade described in
//! spec.md §4.1, ported from `original_source/memoryManager.go`'s
//! `accessRead`/`accessWrite`/`accessCArea`/`accessLCArea` and restructured
//! around the teacher's `MemoryRange`-holding `MMU` (`alivesay-rust-iic/
//! src/mmu.rs`).
//!
//! The MMU owns every physical byte bank (main/aux RAM, ROM pages,
//! language-card banks) but not the soft-switch bits that choose between
//! them — those live in [`crate::io::IoPlane`] — nor the card ROM images,
//! which live in [`crate::card::CardCage`]. `read_byte`/`write_byte` take
//! both by reference and run the exact same cascade the real hardware's
//! address decoder runs, one bank selection per access, no caching.

use crate::card::CardCage;
use crate::io::IoPlane;
use crate::memory::{MemoryRange, OPEN_BUS_BYTE};

const ADDR_ZP_LIMIT: u16 = 0x01FF;
const ADDR_TEXT1_START: u16 = 0x0400;
const ADDR_TEXT1_LIMIT: u16 = 0x07FF;
const ADDR_HGR1_START: u16 = 0x2000;
const ADDR_HGR1_LIMIT: u16 = 0x3FFF;
const ADDR_MAIN_RAM_LIMIT: u16 = 0xBFFF;
const ADDR_C_AREA_START: u16 = 0xC100;
const ADDR_C8_RESET: u16 = 0xCFFF;
const ADDR_SLOT_LIMIT: u16 = 0xC7FF;
const ADDR_D_AREA_LIMIT: u16 = 0xDFFF;

/// One 16KB language-card block: the two banked $D000 pages plus the
/// shared $E000-$FFFF region (spec.md §3, "language-card RAM").
pub struct LcBank {
    pub d_main: MemoryRange,
    pub d_alt: MemoryRange,
    pub ef: MemoryRange,
}

impl LcBank {
    fn new() -> Self {
        Self {
            d_main: MemoryRange::new(0xD000, 0x1000, "LC-D-MAIN"),
            d_alt: MemoryRange::new(0xD000, 0x1000, "LC-D-ALT"),
            ef: MemoryRange::new(0xE000, 0x2000, "LC-EF"),
        }
    }
}

pub struct Mmu {
    ram: [MemoryRange; 2], // 0 = main, 1 = aux
    rom_pages: Vec<MemoryRange>,
    active_rom_page: usize,
    lc_banks: Vec<LcBank>,
    lc_selected_block: usize,
    active_slot: u8,
}

impl Mmu {
    pub fn new(rom_page_count: usize, lc_bank_count: usize) -> Self {
        assert!((1..=8).contains(&lc_bank_count), "spec.md §3: 1..8 language-card banks");
        let rom_page_count = rom_page_count.clamp(1, 4);
        Self {
            ram: [
                MemoryRange::new(0x0000, 0xC000, "MAIN"),
                MemoryRange::new(0x0000, 0xC000, "AUX"),
            ],
            rom_pages: (0..rom_page_count).map(|_| MemoryRange::new(0xC100, 0x3F00, "ROM")).collect(),
            active_rom_page: 0,
            lc_banks: (0..lc_bank_count).map(|_| LcBank::new()).collect(),
            lc_selected_block: 0,
            active_slot: 0,
        }
    }

    pub fn load_rom_page(&mut self, page: usize, bytes: &[u8]) {
        self.rom_pages[page].load_bytes(0, bytes);
    }

    pub fn set_active_rom_page(&mut self, page: usize) {
        self.active_rom_page = page.min(self.rom_pages.len() - 1);
    }

    pub fn active_rom_page(&self) -> usize {
        self.active_rom_page
    }

    /// Saturn-style bank select. Spec.md §4.1 documents ALTZP forcing
    /// block 1 regardless of this selection, but leaves the bank-select
    /// switch addresses themselves unspecified (DESIGN.md, Open Questions);
    /// this setter is the programmatic seam other components use instead.
    pub fn select_lc_block(&mut self, block: usize) {
        self.lc_selected_block = block.min(self.lc_banks.len() - 1);
    }

    pub fn set_active_slot(&mut self, slot: u8) {
        self.active_slot = slot;
    }

    pub fn main_ram(&self) -> &MemoryRange {
        &self.ram[0]
    }

    pub fn aux_ram(&self) -> &MemoryRange {
        &self.ram[1]
    }

    pub fn main_ram_mut(&mut self) -> &mut MemoryRange {
        &mut self.ram[0]
    }

    pub fn aux_ram_mut(&mut self) -> &mut MemoryRange {
        &mut self.ram[1]
    }

    pub fn active_slot(&self) -> u8 {
        self.active_slot
    }

    pub fn lc_selected_block(&self) -> usize {
        self.lc_selected_block
    }

    /// Raw `(d_main, d_alt, ef)` bytes per language-card bank, for
    /// snapshotting (`crate::machine::MachineSnapshot`).
    pub fn lc_bank_bytes(&self) -> Vec<(Vec<u8>, Vec<u8>, Vec<u8>)> {
        self.lc_banks
            .iter()
            .map(|b| (b.d_main.as_slice().to_vec(), b.d_alt.as_slice().to_vec(), b.ef.as_slice().to_vec()))
            .collect()
    }

    pub fn restore_lc_bank_bytes(&mut self, banks: &[(Vec<u8>, Vec<u8>, Vec<u8>)]) {
        for (bank, (d_main, d_alt, ef)) in self.lc_banks.iter_mut().zip(banks.iter()) {
            bank.d_main.load_bytes(0, d_main);
            bank.d_alt.load_bytes(0, d_alt);
            bank.ef.load_bytes(0, ef);
        }
    }

    fn lc_block(&self, io: &IoPlane) -> usize {
        if io.altzp.get() {
            1.min(self.lc_banks.len() - 1)
        } else {
            self.lc_selected_block
        }
    }

    fn access_lc_area(&self, addr: u16, io: &IoPlane) -> &MemoryRange {
        let bank = &self.lc_banks[self.lc_block(io)];
        if addr <= ADDR_D_AREA_LIMIT {
            if io.language_card_mode().bank2 {
                &bank.d_alt
            } else {
                &bank.d_main
            }
        } else {
            &bank.ef
        }
    }

    fn access_lc_area_mut(&mut self, addr: u16, io: &IoPlane) -> &mut MemoryRange {
        let block = self.lc_block(io);
        let bank2 = io.language_card_mode().bank2;
        let bank = &mut self.lc_banks[block];
        if addr <= ADDR_D_AREA_LIMIT {
            if bank2 {
                &mut bank.d_alt
            } else {
                &mut bank.d_main
            }
        } else {
            &mut bank.ef
        }
    }

    /// `$C100-$CFFF`: internal ROM vs. the active slot's card ROM, with the
    /// `$CFFF` reset-to-slot-0 convention for the shared $C800 extended
    /// window (spec.md §4.4).
    fn access_c_area(&mut self, addr: u16, io: &IoPlane, cards: &CardCage) -> Option<u8> {
        if io.intcxrom.get() {
            return Some(self.rom_pages[self.active_rom_page].peek(addr));
        }
        if addr <= ADDR_SLOT_LIMIT {
            let slot = ((addr >> 8) & 0x07) as u8;
            self.active_slot = slot;
            if !io.slotc3rom.get() && slot == 3 {
                return Some(self.rom_pages[self.active_rom_page].peek(addr));
            }
            let rom_offset = (addr & 0x00FF) as usize;
            return cards.get(slot).and_then(|c| c.rom()).map(|rom| rom[rom_offset]);
        }
        if addr == ADDR_C8_RESET {
            self.active_slot = 0;
        }
        if !io.slotc3rom.get() && self.active_slot == 3 {
            return Some(self.rom_pages[self.active_rom_page].peek(addr));
        }
        let ext_offset = (addr - 0xC800) as usize;
        cards.get(self.active_slot).and_then(|c| c.extended_rom()).map(|rom| rom[ext_offset])
    }

    pub fn read_byte(&mut self, addr: u16, io: &IoPlane, cards: &CardCage) -> u8 {
        if addr <= ADDR_ZP_LIMIT {
            return self.ram[io.altzp.get() as usize].peek(addr);
        }

        if addr <= ADDR_MAIN_RAM_LIMIT {
            let use_aux = self.dual_page_quirk(addr, io) || io.ramrd.get();
            return self.ram[use_aux as usize].peek(addr);
        }

        if (ADDR_C_AREA_START..=ADDR_C8_RESET).contains(&addr) {
            return self.access_c_area(addr, io, cards).unwrap_or(OPEN_BUS_BYTE);
        }

        if io.language_card_mode().read_ram {
            return self.access_lc_area(addr, io).peek(addr);
        }
        self.rom_pages[self.active_rom_page].peek(addr)
    }

    pub fn write_byte(&mut self, addr: u16, value: u8, io: &IoPlane) {
        if addr <= ADDR_ZP_LIMIT {
            self.ram[io.altzp.get() as usize].poke(addr, value);
            return;
        }

        if addr <= ADDR_MAIN_RAM_LIMIT {
            let use_aux = self.dual_page_quirk(addr, io) || io.ramwrt.get();
            self.ram[use_aux as usize].poke(addr, value);
            return;
        }

        // $C100-$CFFF is never writable through this path — card ROM and
        // the internal ROM shadow are both read-only.
        if (ADDR_C_AREA_START..=ADDR_C8_RESET).contains(&addr) {
            return;
        }

        if io.language_card_mode().write_enabled {
            self.access_lc_area_mut(addr, io).poke(addr, value);
        }
        // else: writes to $D000-$FFFF while the ROM is mapped are discarded.
    }

    /// The 80STORE dual-page quirk (spec.md §4.1 step 2): when `80STORE`
    /// and `PAGE2` are both set, text page 1 and hi-res page 1 read/write
    /// aux RAM regardless of RAMRD/RAMWRT — a //e-specific override that
    /// predates RAMRD/RAMWRT and only applies to these two fixed windows.
    fn dual_page_quirk(&self, addr: u16, io: &IoPlane) -> bool {
        if !io.store80.get() || !io.page2.get() {
            return false;
        }
        let in_text1 = (ADDR_TEXT1_START..=ADDR_TEXT1_LIMIT).contains(&addr);
        let in_hgr1 = io.hires.get() && (ADDR_HGR1_START..=ADDR_HGR1_LIMIT).contains(&addr);
        in_text1 || in_hgr1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> (Mmu, IoPlane, CardCage) {
        (Mmu::new(1, 1), IoPlane::new(), CardCage::new())
    }

    #[test]
    fn zero_page_follows_altzp() {
        let (mut mmu, io, cards) = fresh();
        mmu.write_byte(0x0080, 0x11, &io);
        io.altzp.set(true);
        mmu.write_byte(0x0080, 0x22, &io);
        io.altzp.set(false);
        assert_eq!(mmu.read_byte(0x0080, &io, &cards), 0x11);
        io.altzp.set(true);
        assert_eq!(mmu.read_byte(0x0080, &io, &cards), 0x22);
    }

    #[test]
    fn rom_shadows_d000_until_lc_read_enabled() {
        let (mut mmu, io, cards) = fresh();
        mmu.load_rom_page(0, &[0xEA; 0x3F00]);
        assert_eq!(mmu.read_byte(0xD000, &io, &cards), 0xEA);
        io.read(0xC080);
        assert_eq!(mmu.read_byte(0xD000, &io, &cards), 0x00);
    }

    #[test]
    fn lc_write_cycle_round_trips_then_shadows_rom() {
        let (mut mmu, io, cards) = fresh();
        mmu.load_rom_page(0, &[0x00; 0x3F00]);
        io.read(0xC081);
        io.read(0xC081);
        mmu.write_byte(0xD000, 0x77, &io);
        assert_eq!(mmu.read_byte(0xD000, &io, &cards), 0x77);

        io.read(0xC082); // LC read off, ROM shadows again
        assert_eq!(mmu.read_byte(0xD000, &io, &cards), 0x00);

        io.read(0xC080); // LC read back on
        assert_eq!(mmu.read_byte(0xD000, &io, &cards), 0x77);
    }

    #[test]
    fn altzp_forces_lc_block_one() {
        let mut mmu = Mmu::new(1, 2);
        let io = IoPlane::new();
        let cards = CardCage::new();
        io.read(0xC081);
        io.read(0xC081);
        mmu.write_byte(0xD000, 0xAA, &io);

        io.altzp.set(true);
        mmu.write_byte(0xD000, 0xBB, &io);
        io.altzp.set(false);
        assert_eq!(mmu.read_byte(0xD000, &io, &cards), 0xAA);
        io.altzp.set(true);
        assert_eq!(mmu.read_byte(0xD000, &io, &cards), 0xBB);
    }

    #[test]
    fn dual_page_quirk_routes_text1_to_aux_regardless_of_ramrd() {
        let (mut mmu, io, cards) = fresh();
        io.store80.set(true);
        io.page2.set(true);
        io.ramrd.set(false);
        mmu.write_byte(0x0400, 0x5A, &io);
        assert_eq!(mmu.aux_ram().peek(0x0400), 0x5A);
        assert_eq!(mmu.read_byte(0x0400, &io, &cards), 0x5A);
    }
}

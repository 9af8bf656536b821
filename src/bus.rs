//! Bus fabric: ties the clock, the I/O plane, the MMU, the interrupt
//! controller, and the card cage into the single `read_byte`/`write_byte`
//! surface the CPU drives (spec.md §2, "synchronous bus fabric").
//!
//! Generalized from `alivesay-rust-iic/src/bus.rs`'s `Bus`, which wired an
//! `IOU` + `MMU` pair behind an Apple //c/generic system-type switch; here
//! there is one system, and the switch that used to pick between "IIc
//! soft-switch routing" and "flat test RAM" instead picks between the
//! motherboard-fixed switches (`$C000-$C08F`) and a card's own strip
//! (`$C090-$C0FF`).

use crate::card::CardCage;
use crate::clock::Clock;
use crate::cpu::CpuType;
use crate::interrupts::InterruptController;
use crate::io::IoPlane;
use crate::mmu::Mmu;
use crate::rom::Rom;

const SLOT_STRIP_START: u16 = 0xC090;
const SLOT_STRIP_END: u16 = 0xC0FF;

pub struct Bus {
    pub io: IoPlane,
    pub mmu: Mmu,
    pub cards: CardCage,
    pub interrupts: InterruptController,
    pub clock: Clock,
}

impl Bus {
    pub fn new(_cpu_type: CpuType) -> Self {
        Self {
            io: IoPlane::new(),
            mmu: Mmu::new(1, 1),
            cards: CardCage::new(),
            interrupts: InterruptController::default(),
            clock: Clock::new(),
        }
    }

    pub fn with_capacity(rom_page_count: usize, lc_bank_count: usize) -> Self {
        Self {
            io: IoPlane::new(),
            mmu: Mmu::new(rom_page_count, lc_bank_count),
            cards: CardCage::new(),
            interrupts: InterruptController::default(),
            clock: Clock::new(),
        }
    }

    pub fn init_mmu(&mut self) {
        self.io.reset_to_power_on_defaults();
    }

    pub fn load_rom(&mut self, rom: Rom) {
        self.mmu.load_rom_page(self.mmu.active_rom_page(), &rom.data);
    }

    /// Advances the shared clock and paces every installed card's state
    /// machine forward by the same number of cycles (spec.md §4.4: cards
    /// "tick" against the bus clock, never a wall-clock timer).
    pub fn tick(&mut self, cycles: u64) {
        self.clock.tick(cycles);
        self.cards.tick_all(cycles);
    }

    pub fn read_byte(&mut self, addr: u16) -> u8 {
        match addr {
            0xC000..=0xC08F => self.io.read(addr),
            SLOT_STRIP_START..=SLOT_STRIP_END => self.read_card_strip(addr, false),
            _ => self.mmu.read_byte(addr, &self.io, &self.cards),
        }
    }

    pub fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.read_byte(addr) as u16;
        let hi = self.read_byte(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    pub fn write_byte(&mut self, addr: u16, value: u8) -> u8 {
        match addr {
            0xC000..=0xC08F => self.io.write(addr, value),
            SLOT_STRIP_START..=SLOT_STRIP_END => self.write_card_strip(addr, value),
            _ => {
                self.mmu.write_byte(addr, value, &self.io);
                0x00
            }
        }
    }

    pub fn write_bytes(&mut self, start: u16, bytes: &[u8]) {
        for (i, &byte) in bytes.iter().enumerate() {
            self.write_byte(start.wrapping_add(i as u16), byte);
        }
    }

    fn slot_and_sub_addr(addr: u16) -> (u8, u8) {
        let slot = (((addr >> 4) & 0x0F) - 8) as u8;
        (slot, (addr & 0x0F) as u8)
    }

    fn read_card_strip(&mut self, addr: u16, is_write: bool) -> u8 {
        let (slot, sub_addr) = Self::slot_and_sub_addr(addr);
        match self.cards.get_mut(slot) {
            Some(card) => card.soft_switch(sub_addr, 0, is_write),
            None => {
                log::debug!("bus: no card in slot {slot} for read {addr:#06X}");
                crate::memory::OPEN_BUS_BYTE
            }
        }
    }

    fn write_card_strip(&mut self, addr: u16, value: u8) -> u8 {
        let (slot, sub_addr) = Self::slot_and_sub_addr(addr);
        match self.cards.get_mut(slot) {
            Some(card) => card.soft_switch(sub_addr, value, true),
            None => {
                log::debug!("bus: no card in slot {slot} for write {addr:#06X} = {value:#04X}");
                0x00
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Card;

    struct Probe {
        last: Option<(u8, u8, bool)>,
    }
    impl Card for Probe {
        fn name(&self) -> &str {
            "probe"
        }
        fn soft_switch(&mut self, sub_addr: u8, data: u8, is_write: bool) -> u8 {
            self.last = Some((sub_addr, data, is_write));
            0x55
        }
    }

    #[test]
    fn slot_six_maps_to_c0e0() {
        let mut bus = Bus::new(CpuType::CMOS65C02);
        bus.cards.install(6, Box::new(Probe { last: None }));
        assert_eq!(bus.read_byte(0xC0E0), 0x55);
        assert_eq!(bus.read_byte(0xC0E5), 0x55);
    }

    #[test]
    fn unpopulated_slot_strip_is_open_bus() {
        let mut bus = Bus::new(CpuType::CMOS65C02);
        assert_eq!(bus.read_byte(0xC0A0), crate::memory::OPEN_BUS_BYTE);
    }

    #[test]
    fn tick_advances_clock_and_cards() {
        let mut bus = Bus::new(CpuType::CMOS65C02);
        bus.tick(10);
        assert_eq!(bus.clock.now(), 10);
    }
}

//! Card registration surface (spec.md §4.4).
//!
//! A card occupies one slot (1-7) and optionally contributes a 256-byte ROM
//! window at `$Cs00-$CsFF`, a 2KB extended ROM window at `$C800-$CFFF`
//! (shared by whichever card last claimed it — see `Mmu::access_c_area`),
//! and a soft-switch handler for its own `$C0s0-$C0sF` strip, where
//! `s = 8 + slot`. Modeled as a trait object rather than an enum because,
//! unlike the fixed motherboard switches in `io.rs`, the set of cards is
//! assembled at machine-configuration time and genuinely needs
//! extensibility (Design Notes §9: a small vtable only where external
//! cards need it, not on the bulk of the fetch path).

/// One plug-in card. `tick` is called once per CPU cycle so a card can run
/// its own clocked state machine (the Disk II LSS runs at half this rate
/// and self-paces against the ticks it's given).
pub trait Card {
    fn name(&self) -> &str;

    /// 256-byte ROM window at `$Cs00-$CsFF`. `None` leaves the window
    /// floating (open bus).
    fn rom(&self) -> Option<&[u8]> {
        None
    }

    /// 2KB extended ROM window at `$C800-$CFFF`, claimed only while this
    /// card is `activeSlot` (`Mmu::access_c_area`'s `$CFFF` reset rule).
    fn extended_rom(&self) -> Option<&[u8]> {
        None
    }

    /// `sub_addr` is the low byte of the address within this card's
    /// `$C0s0-$C0sF` strip. Returns the byte the bus should see for a read;
    /// ignored for writes.
    fn soft_switch(&mut self, sub_addr: u8, data: u8, is_write: bool) -> u8;

    /// Runs the card's internal state machine forward by `cycles` CPU
    /// cycles. Most cards (e.g. the DAN][ controller) ignore this.
    fn tick(&mut self, _cycles: u64) {}

    /// Downcasting seam: the composer needs this to sample a Disk II
    /// card's drive-activity LEDs without widening `Card` itself with
    /// disk-specific methods every other card would have to stub out.
    fn as_any(&self) -> &dyn std::any::Any
    where
        Self: 'static,
    {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any
    where
        Self: 'static,
    {
        self
    }
}

pub struct CardSlot {
    pub slot: u8,
    pub card: Box<dyn Card>,
}

#[derive(Default)]
pub struct CardCage {
    slots: [Option<CardSlot>; 8],
}

impl CardCage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `card` in `slot` (1-7; slot 0 is the motherboard-wired
    /// language card and isn't represented here).
    pub fn install(&mut self, slot: u8, card: Box<dyn Card>) {
        assert!((1..=7).contains(&slot), "card slot must be 1-7, got {slot}");
        self.slots[slot as usize] = Some(CardSlot { slot, card });
    }

    pub fn get(&self, slot: u8) -> Option<&dyn Card> {
        self.slots[slot as usize].as_ref().map(|s| s.card.as_ref())
    }

    pub fn get_mut(&mut self, slot: u8) -> Option<&mut (dyn Card + 'static)> {
        self.slots[slot as usize].as_mut().map(|s| s.card.as_mut())
    }

    pub fn tick_all(&mut self, cycles: u64) {
        for slot in self.slots.iter_mut().flatten() {
            slot.card.tick(cycles);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy(u8);
    impl Card for Dummy {
        fn name(&self) -> &str {
            "dummy"
        }
        fn soft_switch(&mut self, _sub_addr: u8, _data: u8, _is_write: bool) -> u8 {
            self.0
        }
    }

    #[test]
    fn install_and_fetch_round_trips() {
        let mut cage = CardCage::new();
        cage.install(6, Box::new(Dummy(0x42)));
        let card = cage.get_mut(6).expect("slot 6 populated");
        assert_eq!(card.soft_switch(0, 0, false), 0x42);
    }

    #[test]
    #[should_panic]
    fn slot_zero_rejected() {
        let mut cage = CardCage::new();
        cage.install(0, Box::new(Dummy(0)));
    }
}

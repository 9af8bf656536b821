//! Disk II controller: the card-facing soft-switch strip, wrapping the
//! [`Lss`] sequencer and a pair of [`Drive`]s (spec.md §4.5).

pub mod drive;
pub mod lss;
pub mod nib;
pub mod woz;

use crate::card::Card;
use drive::Drive;
use lss::Lss;

/// Addresses `$C0(8+s)0`.. assign one of eight control pairs; spec.md
/// §4.5's "Soft-switch strip" lists phases Q0-Q3, drive on/off, drive
/// select, and read/write mode, in that order — which happens to be the
/// real Disk II's own address layout (`$C0x0-7` phases, `$C0x8/9` motor,
/// `$C0xA/B` drive select, `$C0xC/D` Q6, `$C0xE/F` Q7).
pub struct Disk2Card {
    drives: [Drive; 2],
    selected_drive: usize,
    motor_on: bool,
    phases: u8,
    lss: Lss,
    half_cycle_acc: u64,
    rom: Option<Vec<u8>>,
}

impl Disk2Card {
    pub fn new(seed: u64) -> Self {
        Self {
            drives: [Drive::new(seed), Drive::new(seed.wrapping_add(1))],
            selected_drive: 0,
            motor_on: false,
            phases: 0,
            lss: Lss::new(),
            half_cycle_acc: 0,
            rom: None,
        }
    }

    /// Installs the slot ROM image (spec.md §6's resource loader supplies
    /// the bytes; this crate doesn't embed the copyrighted Disk II boot
    /// PROM).
    pub fn with_rom(mut self, rom: Vec<u8>) -> Self {
        self.rom = Some(rom);
        self
    }

    pub fn drive_mut(&mut self, which: usize) -> &mut Drive {
        &mut self.drives[which]
    }

    pub fn selected_drive(&self) -> usize {
        self.selected_drive
    }

    pub fn motor_on(&self) -> bool {
        self.motor_on
    }
}

impl Card for Disk2Card {
    fn name(&self) -> &str {
        "Disk II"
    }

    fn rom(&self) -> Option<&[u8]> {
        self.rom.as_deref()
    }

    /// Mirrors `original_source/cardDisk2SequencerDrive.go`'s switch
    /// semantics directly: each pair's odd address turns the control on,
    /// even turns it off, and every read returns the LSS data register
    /// (spec.md §4.5: "Reads of the odd-numbered addresses return the
    /// current data register; reads of the even-numbered read the data
    /// register without strobing").
    fn soft_switch(&mut self, sub_addr: u8, data: u8, is_write: bool) -> u8 {
        let on = sub_addr & 0x1 == 1;
        match sub_addr >> 1 {
            phase @ 0..=3 => {
                let mask = 1u8 << phase;
                self.phases = if on { self.phases | mask } else { self.phases & !mask };
                if on {
                    self.drives[self.selected_drive].move_head(self.phases);
                }
            }
            4 => {
                self.motor_on = on;
                self.drives[self.selected_drive].enabled = on;
            }
            5 => self.selected_drive = on as usize,
            6 => {
                self.lss.set_q6(on);
                if is_write && sub_addr == 0x0D {
                    self.lss.set_write_data(data);
                }
            }
            7 => self.lss.set_q7(on),
            _ => unreachable!("sub_addr is masked to 0..16 by the bus"),
        }

        if !is_write && on {
            self.lss.read_data_register()
        } else {
            self.lss.data_register()
        }
    }

    /// Paces the LSS at half the CPU rate while the motor is spinning
    /// (spec.md §4.5, "clocked at ½ the CPU rate").
    fn tick(&mut self, cycles: u64) {
        if !self.motor_on {
            self.half_cycle_acc = 0;
            return;
        }
        self.half_cycle_acc += cycles;
        while self.half_cycle_acc >= 2 {
            self.half_cycle_acc -= 2;
            let write_protected = self.drives[self.selected_drive].write_protected();
            if self.lss.q7() {
                // Write mode: the flux bit doesn't matter to the ROM's
                // load/shift-for-write arms.
                self.lss.step(false, write_protected);
            } else {
                let pulse = self.drives[self.selected_drive].read_pulse();
                self.lss.step(pulse, write_protected);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drive::Media;

    #[test]
    fn phase_write_moves_selected_drive_head() {
        let mut card = Disk2Card::new(1);
        card.soft_switch(0x9, 0, true); // motor on
        card.soft_switch(0x2, 0, false); // phase1 on -> step forward from qt0
        assert_eq!(card.drives[0].current_quarter_track, 1);
    }

    #[test]
    fn drive_select_switches_target_of_phase_moves() {
        let mut card = Disk2Card::new(1);
        card.soft_switch(0x9, 0, true);
        card.soft_switch(0xB, 0, false); // select drive 2
        assert_eq!(card.selected_drive(), 1);
        card.soft_switch(0x2, 0, false);
        assert_eq!(card.drives[1].current_quarter_track, 1);
        assert_eq!(card.drives[0].current_quarter_track, 0);
    }

    #[test]
    fn tick_is_a_noop_with_motor_off() {
        let mut card = Disk2Card::new(1);
        card.drives[0].insert(Media::Nibblized { tracks: vec![vec![0xFF; 8]], write_protected: false });
        card.tick(1000);
        assert_eq!(card.drives[0].position, 0);
    }

    #[test]
    fn tick_advances_lss_at_half_rate_with_motor_on() {
        let mut card = Disk2Card::new(1);
        card.drives[0].insert(Media::Nibblized { tracks: vec![vec![0xFF; 64]], write_protected: false });
        card.soft_switch(0x9, 0, true); // motor on
        card.drives[0].enabled = true;
        card.tick(20);
        assert_eq!(card.drives[0].position, 10);
    }
}

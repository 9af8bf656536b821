//! End-to-end scenarios (spec.md §8), driven through `Machine` rather than
//! a bare `CPU` so the composer's boot/reset/keyboard/command-channel
//! wiring is exercised, not just the bus fabric.

use apple2_core::card::Card;
use apple2_core::dan2::{status, Dan2Card, DanSlot};
use apple2_core::disk2::drive::Media;
use apple2_core::disk2::nib;
use apple2_core::disk2::Disk2Card;
use apple2_core::machine::{Command, Machine, MachineConfig};

fn bootable_config() -> MachineConfig {
    MachineConfig { language_card_banks: 1, ..Default::default() }
}

/// Scenario 1: keyboard latch round-trip with the high bit and the strobe.
#[test]
fn keyboard_post_sets_and_clears_strobe() {
    let (mut machine, _handles) = Machine::new(bootable_config()).unwrap();
    machine.run_steps(1000);

    assert_eq!(machine.bus().io.read(0xC000) & 0x80, 0x00);

    machine.post_key(b'A');
    assert_eq!(machine.bus().io.read(0xC000), 0xC1);

    machine.bus().io.read(0xC010);
    assert_eq!(machine.bus().io.read(0xC000), 0x41);
}

/// Scenario 6: a `Reset` command restores the documented power-on
/// defaults (PC re-seeding from the reset vector is already covered at
/// the `cpu::reset` unit level; here we check the soft-switch side the
/// composer is responsible for relaying).
#[test]
fn reset_command_restores_defaults() {
    let (mut machine, handles) = Machine::new(bootable_config()).unwrap();
    machine.bus_mut().io.write(0xC006, 0); // INTCXROM off
    machine.bus_mut().io.write(0xC009, 0); // ALTZP on

    handles.commands.send(Command::Reset).unwrap();
    handles.commands.send(Command::Kill).unwrap();
    machine.run();

    assert!(machine.bus().io.intcxrom.get());
    assert!(!machine.bus().io.altzp.get());
    assert!(!machine.bus().io.store80.get());
}

/// Scenario 5: LC write-enable cycle, driven through the bus exactly as
/// the CPU would (two reads of $C081 enable writes; toggling the
/// read-enable bit shadows ROM back in without losing the written byte).
#[test]
fn language_card_write_cycle_round_trips_through_machine_bus() {
    let (mut machine, _handles) = Machine::new(bootable_config()).unwrap();

    let bus = machine.bus_mut();
    bus.mmu.load_rom_page(0, &[0x00; 0x3F00]);
    bus.io.read(0xC081);
    bus.io.read(0xC081);
    bus.write_byte(0xD000, 0x77);
    assert_eq!(bus.read_byte(0xD000), 0x77);

    bus.io.read(0xC082); // LC read off, ROM shadows again
    assert_eq!(bus.read_byte(0xD000), 0x00);

    bus.io.read(0xC080); // LC read back on
    assert_eq!(bus.read_byte(0xD000), 0x77);
}

/// Scenario 4: a DAN][ write-read loop through a card instance (the same
/// object a `Machine` installs into a slot via `MachineConfig`).
#[test]
fn dan2_write_then_read_round_trips_through_card() {
    let dir = std::env::temp_dir();
    let image_path = dir.join(format!("apple2_e2e_dan2_{:?}.po", std::thread::current().id()));
    std::fs::write(&image_path, vec![0u8; 512 * 8]).unwrap();

    let mut slot_a = DanSlot::new(dir.clone(), 0);
    slot_a.path = image_path.clone();
    slot_a.file_no = 0;
    let slot_b = DanSlot::new(dir, 0);
    let mut card = Dan2Card::new(slot_a, slot_b);

    let send = |card: &mut Dan2Card, bytes: &[u8]| {
        card.soft_switch(0, 0xAC, true);
        for &b in bytes {
            card.soft_switch(0, b, true);
        }
    };

    send(&mut card, &[2, 0x00, 0x00, 0x00, 0x05, 0x00]); // write block 5
    assert_eq!(card.soft_switch(0, 0, false), status::OK);
    for _ in 0..512 {
        card.soft_switch(0, 0x55, true);
    }

    send(&mut card, &[1, 0x00, 0x00, 0x00, 0x05, 0x00]); // read block 5
    assert_eq!(card.soft_switch(0, 0, false), status::OK);
    for _ in 0..512 {
        assert_eq!(card.soft_switch(0, 0, false), 0x55);
    }

    let _ = std::fs::remove_file(&image_path);
}

/// Scenario 2 (scaled down per SPEC_FULL.md §8): a synthetic nibblized
/// track stands in for a real DOS 3.3 boot disk, since no copyrighted ROM
/// or disk image ships in this repo. Exercises the same `Machine` +
/// `Disk2Card` + `as_any_mut` downcast wiring a real boot would use.
#[test]
fn disk2_card_installed_via_machine_accepts_inserted_media() {
    let config = MachineConfig { language_card_banks: 1, disk2_slot: Some(6), ..Default::default() };
    let (mut machine, _handles) = Machine::new(config).unwrap();

    machine.load_disk(6, 0, "").unwrap_err(); // an empty/missing path must fail, not panic

    let track = nib::nib_encode_track(&[0xAA; nib::BYTES_PER_TRACK], 254, 17, &nib::DOS33_SECTOR_ORDER);
    let mut tracks = vec![Vec::new(); 35];
    tracks[17] = track;

    let card = machine.bus_mut().cards.get_mut(6).unwrap();
    let disk2 = card.as_any_mut().downcast_mut::<Disk2Card>().unwrap();
    disk2.drive_mut(0).insert(Media::Nibblized { tracks, write_protected: false });
    assert!(disk2.drive_mut(0).is_loaded());
}

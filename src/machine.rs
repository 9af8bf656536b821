//! The Apple2 composer (spec.md §4.7): wires a CPU/bus pair together, runs
//! the fetch-execute-tick loop, and serves the command/drive-status
//! channels a frontend drives the machine through.
//!
//! Grounded on `alivesay-rust-iic/src/main.rs`'s `run_cpu_console_mode`
//! (`loop { cpu.tick(); if cpu.bus.interrupts.halted { break } }`),
//! generalized with the `crossbeam_channel` command/status pair Design
//! Notes §9 and SPEC_FULL.md §4.7 call for — the teacher's loop has no
//! frontend-facing control surface at all, since its frontend is the
//! `winit` event loop running on the same thread.

use std::path::{Path, PathBuf};

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use serde::{Deserialize, Serialize};

use crate::card::Card;
use crate::cpu::{CpuType, Flags, CPU};
use crate::dan2::{Dan2Card, DanSlot};
use crate::disk2::drive::Media;
use crate::disk2::nib;
use crate::disk2::woz::Woz;
use crate::disk2::Disk2Card;
use crate::error::ResourceError;
use crate::io::LanguageCardMode;
use crate::resource::{load_resource, ResourceUri};
use crate::rom::Rom;

/// Frontend-issued control messages (spec.md §6 "Command channel
/// messages"). `LoadDisk`/`SaveState`/`LoadState` carry the extra
/// parameters the one-word names in spec.md leave unspecified.
#[derive(Debug, Clone)]
pub enum Command {
    Pause,
    Resume,
    Reset,
    Kill,
    LoadDisk { slot: u8, drive: usize, uri: String },
    SaveState { path: PathBuf },
    LoadState { path: PathBuf },
}

/// `{slot, drive, active}` (spec.md §6). Sampled once per step and sent
/// only on change, so the LED hint channel doesn't flood even though the
/// loop polls it every instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveStatus {
    pub slot: u8,
    pub drive: u8,
    pub active: bool,
}

/// The two ends a frontend holds: it sends `Command`s in and receives
/// `DriveStatus` hints out. The machine thread owns the opposite ends.
pub struct MachineHandles {
    pub commands: Sender<Command>,
    pub drive_status: Receiver<DriveStatus>,
}

/// Machine-level configuration, analogous to the teacher's `Args` but
/// covering the whole wired-up machine rather than just a ROM path
/// (SPEC_FULL.md §3 "Config (CLI) struct"). The CLI binary's own
/// `clap`-derived `Args` (in `main.rs`) is translated into this before
/// `Machine::new` is called, so the library itself has no `clap`
/// dependency.
#[derive(Debug, Clone, Default)]
pub struct MachineConfig {
    pub cpu_type: CpuType,
    pub rom_uri: Option<String>,
    pub language_card_banks: usize,
    pub seed: u64,
    pub disk2_slot: Option<u8>,
    pub disk2_rom_uri: Option<String>,
    /// `(slot, drive 0|1, uri)` — disks to load at boot.
    pub disk_images: Vec<(u8, usize, String)>,
    pub dan2_slot: Option<u8>,
    pub dan2_rom_uri: Option<String>,
    pub dan2_slot_a_path: Option<PathBuf>,
    pub dan2_slot_b_path: Option<PathBuf>,
}

impl Default for CpuType {
    fn default() -> Self {
        CpuType::CMOS65C02
    }
}

pub struct Machine {
    cpu: CPU,
    paused: bool,
    commands: Receiver<Command>,
    drive_status: Sender<DriveStatus>,
    last_drive_status: Option<DriveStatus>,
    disk2_slot: Option<u8>,
    seed: u64,
}

impl Machine {
    pub fn new(config: MachineConfig) -> anyhow::Result<(Self, MachineHandles)> {
        let mut cpu = CPU::new(config.cpu_type);
        cpu.bus = crate::bus::Bus::with_capacity(1, config.language_card_banks.max(1));

        if let Some(rom_uri) = &config.rom_uri {
            let rom = load_rom_resource(rom_uri)?;
            cpu.load_rom(rom);
        }

        if let Some(slot) = config.disk2_slot {
            let mut disk2 = Disk2Card::new(config.seed);
            if let Some(rom_uri) = &config.disk2_rom_uri {
                disk2 = disk2.with_rom(load_card_rom(rom_uri)?);
            }
            cpu.bus.cards.install(slot, Box::new(disk2));
        }

        if let Some(slot) = config.dan2_slot {
            let (Some(a_path), Some(b_path)) = (&config.dan2_slot_a_path, &config.dan2_slot_b_path) else {
                anyhow::bail!("dan2_slot configured without both slot-A and slot-B paths");
            };
            let mut dan2 = Dan2Card::new(DanSlot::new(a_path.clone(), 0), DanSlot::new(b_path.clone(), 0));
            if let Some(rom_uri) = &config.dan2_rom_uri {
                dan2 = dan2.with_rom(load_card_rom(rom_uri)?);
            }
            cpu.bus.cards.install(slot, Box::new(dan2));
        }

        cpu.init();

        let (command_tx, command_rx) = bounded(16);
        let (status_tx, status_rx) = bounded(2);

        let mut machine = Self {
            cpu,
            paused: false,
            commands: command_rx,
            drive_status: status_tx,
            last_drive_status: None,
            disk2_slot: config.disk2_slot,
            seed: config.seed,
        };

        for (slot, drive, uri) in &config.disk_images {
            machine.load_disk(*slot, *drive, uri)?;
        }

        Ok((machine, MachineHandles { commands: command_tx, drive_status: status_rx }))
    }

    pub fn cpu(&self) -> &CPU {
        &self.cpu
    }

    pub fn bus(&self) -> &crate::bus::Bus {
        &self.cpu.bus
    }

    pub fn bus_mut(&mut self) -> &mut crate::bus::Bus {
        &mut self.cpu.bus
    }

    /// Posts a key from the (out-of-core) keyboard adapter (spec.md §8,
    /// end-to-end scenario 1).
    pub fn post_key(&self, ascii: u8) {
        self.cpu.bus.io.post_key(ascii);
    }

    /// Runs until `Command::Kill` arrives, the command channel is
    /// dropped, or the CPU halts (`STP`). Pause is cooperative: while
    /// paused the loop just keeps draining the command channel (spec.md
    /// §4.7, §5 "Suspension points").
    pub fn run(&mut self) {
        loop {
            match self.drain_commands() {
                ControlFlow::Continue => {}
                ControlFlow::Stop => break,
            }

            if self.paused {
                std::thread::yield_now();
                continue;
            }

            self.cpu.step();
            self.sample_drive_status();

            if self.cpu.bus.interrupts.halted {
                log::info!("machine: cpu halted, stopping run loop");
                break;
            }
        }
    }

    /// Runs at most `steps` instructions, for tests and the CLI's
    /// `--steps` flag; otherwise behaves like [`Machine::run`].
    pub fn run_steps(&mut self, steps: u64) {
        for _ in 0..steps {
            match self.drain_commands() {
                ControlFlow::Continue => {}
                ControlFlow::Stop => return,
            }
            if self.paused {
                continue;
            }
            self.cpu.step();
            self.sample_drive_status();
            if self.cpu.bus.interrupts.halted {
                return;
            }
        }
    }

    fn drain_commands(&mut self) -> ControlFlow {
        loop {
            match self.commands.try_recv() {
                Ok(Command::Pause) => self.paused = true,
                Ok(Command::Resume) => self.paused = false,
                Ok(Command::Reset) => self.cpu.reset(),
                Ok(Command::Kill) => return ControlFlow::Stop,
                Ok(Command::LoadDisk { slot, drive, uri }) => {
                    if let Err(err) = self.load_disk(slot, drive, &uri) {
                        log::warn!("machine: load-disk failed: {err}");
                    }
                }
                Ok(Command::SaveState { path }) => {
                    if let Err(err) = self.save_state(&path) {
                        log::warn!("machine: save-state failed: {err}");
                    }
                }
                Ok(Command::LoadState { path }) => {
                    if let Err(err) = self.load_state(&path) {
                        log::warn!("machine: load-state failed: {err}");
                    }
                }
                Err(TryRecvError::Empty) => return ControlFlow::Continue,
                Err(TryRecvError::Disconnected) => return ControlFlow::Stop,
            }
        }
    }

    /// Non-blocking, drop-on-full send (spec.md §5: "non-blocking send
    /// with drop-on-full semantics"; Design Notes §9 describes the same
    /// queue as "overwrite-oldest", which `crossbeam_channel::Sender`
    /// can't do from the producer side without the receiver's
    /// cooperation — §5's wording is the more specific of the two and is
    /// what's implemented here, see DESIGN.md).
    fn sample_drive_status(&mut self) {
        let Some(slot) = self.disk2_slot else { return };
        let Some(card) = self.cpu.bus.cards.get_mut(slot) else { return };
        let Some(disk2) = card.as_any_mut().downcast_mut::<Disk2Card>() else { return };

        let status = DriveStatus { slot, drive: disk2.selected_drive() as u8, active: disk2.motor_on() };
        if self.last_drive_status == Some(status) {
            return;
        }
        self.last_drive_status = Some(status);
        match self.drive_status.try_send(status) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(_)) => log::trace!("machine: drive-status channel full, dropping update"),
        }
    }

    pub fn load_disk(&mut self, slot: u8, drive: usize, uri: &str) -> anyhow::Result<()> {
        let parsed: ResourceUri = uri.parse().expect("ResourceUri::from_str is infallible");
        let (bytes, _writeable) = load_resource(&parsed)?;
        let media = parse_diskette(&bytes, uri)?;

        let card = self.cpu.bus.cards.get_mut(slot).ok_or_else(|| anyhow::anyhow!("no card installed in slot {slot}"))?;
        let disk2 = card.as_any_mut().downcast_mut::<Disk2Card>().ok_or_else(|| anyhow::anyhow!("slot {slot} isn't a Disk II card"))?;
        disk2.drive_mut(drive).insert(media);
        log::info!("machine: loaded {uri} into slot {slot} drive {drive}");
        Ok(())
    }

    pub fn save_state(&self, path: &Path) -> anyhow::Result<()> {
        let snapshot = MachineSnapshot::capture(&self.cpu);
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, &snapshot)?;
        Ok(())
    }

    pub fn load_state(&mut self, path: &Path) -> anyhow::Result<()> {
        let file = std::fs::File::open(path)?;
        let snapshot: MachineSnapshot = serde_json::from_reader(file)?;
        snapshot.restore(&mut self.cpu);
        Ok(())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

enum ControlFlow {
    Continue,
    Stop,
}

fn load_rom_resource(uri: &str) -> anyhow::Result<Rom> {
    let parsed: ResourceUri = uri.parse().expect("ResourceUri::from_str is infallible");
    let (bytes, _writeable) = load_resource(&parsed)?;
    Ok(Rom::load_from_bytes(&bytes)?)
}

fn load_card_rom(uri: &str) -> anyhow::Result<Vec<u8>> {
    let parsed: ResourceUri = uri.parse().expect("ResourceUri::from_str is infallible");
    let (bytes, _writeable) = load_resource(&parsed)?;
    Ok(bytes)
}

/// Sniffs a loaded diskette image and builds the [`Media`] the Disk II
/// drive plays back (spec.md §6 "WOZ 1/2 files" / "NIB/DSK files").
fn parse_diskette(bytes: &[u8], uri: &str) -> anyhow::Result<Media> {
    if bytes.len() >= 8 && (bytes[0..4] == *b"WOZ1" || bytes[0..4] == *b"WOZ2") {
        return Ok(Media::Woz(Woz::parse(bytes)?));
    }

    const NIB_SIZE: usize = 232_960;
    const DSK_SIZE: usize = 143_360;
    const TRACK_COUNT: usize = 35;

    match bytes.len() {
        NIB_SIZE => {
            let track_len = NIB_SIZE / TRACK_COUNT;
            let tracks = bytes.chunks_exact(track_len).map(|t| t.to_vec()).collect();
            Ok(Media::Nibblized { tracks, write_protected: false })
        }
        DSK_SIZE => {
            let prodos_order = uri.trim_end_matches('"').to_ascii_lowercase().ends_with(".po");
            let order = if prodos_order { &nib::PRODOS_SECTOR_ORDER } else { &nib::DOS33_SECTOR_ORDER };
            let tracks = nib::dsk_to_tracks(bytes, order)?;
            Ok(Media::Nibblized { tracks, write_protected: false })
        }
        other => Err(ResourceError::UnsupportedFormat(format!("unrecognized diskette image size {other}")).into()),
    }
}

/// A serializable machine state (SPEC_FULL.md §4.7 "Apple2 composer —
/// extended"). Main/aux RAM, language-card bank contents, soft-switch
/// bits, and CPU registers are persisted; card ROM images (reloaded from
/// configuration) and per-card runtime state (Disk II head position, the
/// DAN][ command/response buffers) are deliberately not — see DESIGN.md's
/// resolution of the contradiction between SPEC_FULL.md's two passes over
/// this point.
#[derive(Debug, Serialize, Deserialize)]
pub struct MachineSnapshot {
    pub main_ram: Vec<u8>,
    pub aux_ram: Vec<u8>,
    pub lc_banks: Vec<(Vec<u8>, Vec<u8>, Vec<u8>)>,
    pub lc_selected_block: usize,
    pub active_rom_page: usize,
    pub active_slot: u8,
    pub io: IoSnapshot,
    pub cpu: CpuSnapshot,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct IoSnapshot {
    pub altzp: bool,
    pub ramrd: bool,
    pub ramwrt: bool,
    pub intcxrom: bool,
    pub slotc3rom: bool,
    pub store80: bool,
    pub text: bool,
    pub mixed: bool,
    pub hires: bool,
    pub lores: bool,
    pub page2: bool,
    pub col80: bool,
    pub altchar: bool,
    pub dhires: bool,
    pub lc_read: bool,
    pub lc_write: bool,
    pub lc_bank2: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CpuSnapshot {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub p: u8,
    pub pc: u16,
}

impl MachineSnapshot {
    pub fn capture(cpu: &CPU) -> Self {
        let lc_mode = cpu.bus.io.language_card_mode();
        Self {
            main_ram: cpu.bus.mmu.main_ram().as_slice().to_vec(),
            aux_ram: cpu.bus.mmu.aux_ram().as_slice().to_vec(),
            lc_banks: cpu.bus.mmu.lc_bank_bytes(),
            lc_selected_block: cpu.bus.mmu.lc_selected_block(),
            active_rom_page: cpu.bus.mmu.active_rom_page(),
            active_slot: cpu.bus.mmu.active_slot(),
            io: IoSnapshot {
                altzp: cpu.bus.io.altzp.get(),
                ramrd: cpu.bus.io.ramrd.get(),
                ramwrt: cpu.bus.io.ramwrt.get(),
                intcxrom: cpu.bus.io.intcxrom.get(),
                slotc3rom: cpu.bus.io.slotc3rom.get(),
                store80: cpu.bus.io.store80.get(),
                text: cpu.bus.io.text.get(),
                mixed: cpu.bus.io.mixed.get(),
                hires: cpu.bus.io.hires.get(),
                lores: cpu.bus.io.lores.get(),
                page2: cpu.bus.io.page2.get(),
                col80: cpu.bus.io.col80.get(),
                altchar: cpu.bus.io.altchar.get(),
                dhires: cpu.bus.io.dhires.get(),
                lc_read: lc_mode.read_ram,
                lc_write: lc_mode.write_enabled,
                lc_bank2: lc_mode.bank2,
            },
            cpu: CpuSnapshot { a: cpu.regs.a, x: cpu.regs.x, y: cpu.regs.y, sp: cpu.regs.sp, p: cpu.p.bits(), pc: cpu.pc },
        }
    }

    pub fn restore(&self, cpu: &mut CPU) {
        cpu.bus.mmu.main_ram_mut().load_bytes(0, &self.main_ram);
        cpu.bus.mmu.aux_ram_mut().load_bytes(0, &self.aux_ram);
        cpu.bus.mmu.restore_lc_bank_bytes(&self.lc_banks);
        cpu.bus.mmu.select_lc_block(self.lc_selected_block);
        cpu.bus.mmu.set_active_rom_page(self.active_rom_page);
        cpu.bus.mmu.set_active_slot(self.active_slot);

        cpu.bus.io.altzp.set(self.io.altzp);
        cpu.bus.io.ramrd.set(self.io.ramrd);
        cpu.bus.io.ramwrt.set(self.io.ramwrt);
        cpu.bus.io.intcxrom.set(self.io.intcxrom);
        cpu.bus.io.slotc3rom.set(self.io.slotc3rom);
        cpu.bus.io.store80.set(self.io.store80);
        cpu.bus.io.text.set(self.io.text);
        cpu.bus.io.mixed.set(self.io.mixed);
        cpu.bus.io.hires.set(self.io.hires);
        cpu.bus.io.lores.set(self.io.lores);
        cpu.bus.io.page2.set(self.io.page2);
        cpu.bus.io.col80.set(self.io.col80);
        cpu.bus.io.altchar.set(self.io.altchar);
        cpu.bus.io.dhires.set(self.io.dhires);
        cpu.bus.io.restore_language_card_mode(LanguageCardMode {
            read_ram: self.io.lc_read,
            write_enabled: self.io.lc_write,
            bank2: self.io.lc_bank2,
        });

        cpu.regs.a = self.cpu.a;
        cpu.regs.x = self.cpu.x;
        cpu.regs.y = self.cpu.y;
        cpu.regs.sp = self.cpu.sp;
        cpu.p = Flags::from_bits_truncate(self.cpu.p);
        cpu.pc = self.cpu.pc;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine_with_ram() -> Machine {
        let config = MachineConfig { language_card_banks: 1, ..Default::default() };
        let (machine, _handles) = Machine::new(config).expect("machine boots without a ROM");
        machine
    }

    #[test]
    fn kill_command_stops_the_run_loop() {
        let config = MachineConfig { language_card_banks: 1, ..Default::default() };
        let (mut machine, handles) = Machine::new(config).unwrap();
        handles.commands.send(Command::Kill).unwrap();
        machine.run(); // must return, not loop forever
    }

    #[test]
    fn pause_resume_gate_instruction_stepping() {
        let mut machine = machine_with_ram();
        let before = machine.cpu().bus.clock.now();
        machine.run_steps(5);
        assert!(machine.cpu().bus.clock.now() > before);
    }

    #[test]
    fn save_then_load_state_round_trips_ram() {
        let mut machine = machine_with_ram();
        machine.cpu.bus.mmu.main_ram_mut().poke(0x1234, 0x42);

        let path = std::env::temp_dir().join(format!("apple2_snapshot_test_{:?}.json", std::thread::current().id()));
        machine.save_state(&path).unwrap();

        machine.cpu.bus.mmu.main_ram_mut().poke(0x1234, 0x00);
        machine.load_state(&path).unwrap();
        assert_eq!(machine.cpu().bus.mmu.main_ram().peek(0x1234), 0x42);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn reset_command_reinitializes_soft_switches() {
        let config = MachineConfig { language_card_banks: 1, ..Default::default() };
        let (mut machine, handles) = Machine::new(config).unwrap();
        machine.cpu.bus.io.write(0xC009, 0); // ALTZP on

        handles.commands.send(Command::Reset).unwrap();
        handles.commands.send(Command::Kill).unwrap();
        machine.run();

        assert!(!machine.cpu().bus.io.altzp.get());
    }
}

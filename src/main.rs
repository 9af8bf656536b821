//! Headless CLI front end: parses arguments, assembles a
//! [`apple2_core::machine::MachineConfig`], and runs the machine to
//! completion or until Ctrl-C (spec.md §1's Non-goals exclude a GUI/audio
//! frontend; this binary is the thin driver a real frontend would be
//! built the same way on top of `apple2_core::machine::Machine`).
//!
//! Trimmed from `alivesay-rust-iic/src/main.rs`: the `winit`/`pixels`
//! event loop, the `Monitor` REPL, and the disassembler are all gone
//! along with the GUI dependencies that backed them (DESIGN.md,
//! "Dropped entirely"/"Dependency changes"); what's left is the same
//! shape as the teacher's `run_cpu_console_mode`, generalized to drive a
//! full `Machine` instead of a bare `CPU`.

use std::path::PathBuf;

use apple2_core::cpu::CpuType;
use apple2_core::machine::{Command, Machine, MachineConfig};
use clap::Parser;
use log::{error, info};

const BANNER: &str = r#"
     ██▀███   █    ██   ██████ ▄▄▄█████▓ ██▓ ██▓ ▄████▄
    ▓██ ▒ ██▒ ██  ▓██▒▒██    ▒ ▓  ██▒ ▓▒▓██▒▓██▒▒██▀ ▀█
    ▓██ ░▄█ ▒▓██  ▒██░░ ▓██▄   ▒ ▓██░ ▒░▒██▒▒██▒▒▓█    ▄
    ▒██▀▀█▄  ▓▓█  ░██░  ▒   ██▒░ ▓██▓ ░ ░██░░██░▒▓▓▄ ▄██▒
    ░██▓ ▒██▒▒▒█████▓ ▒██████▒▒  ▒██▒ ░ ░██░░██░▒ ▓███▀ ░
    ░ ▒▓ ░▒▓░░▒▓▒ ▒ ▒ ▒ ▒▓▒ ▒ ░  ▒ ░░   ░▓  ░▓  ░ ░▒ ▒  ░
    ░▒ ░ ▒░░░▒░ ░ ░ ░ ░▒  ░ ░    ░     ▒ ░ ▒ ░  ░  ▒
    ░░   ░  ░░░ ░ ░ ░  ░  ░    ░       ▒ ░ ▒ ░░
    ░        ░           ░            ░   ░  ░ ░
"#;

#[derive(Parser)]
#[command(version, about = "Apple II family emulator core")]
struct Args {
    /// System ROM image: a file path, `http(s)://` URL, or `<internal>/name`.
    #[arg(long)]
    rom: Option<String>,

    #[arg(long, value_enum, default_value = "cmos65c02")]
    cpu: CliCpuType,

    /// Number of 16KB language-card banks (1 for a stock //e, 8 for a
    /// Saturn 128K card).
    #[arg(long, default_value_t = 1)]
    language_card_banks: usize,

    /// Seed for the Disk II drives' weak-bit PRNG, for reproducible runs.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Install a Disk II controller in this slot (1-7).
    #[arg(long)]
    disk2_slot: Option<u8>,

    #[arg(long)]
    disk2_rom: Option<String>,

    /// `slot:drive:path` (drive is 0 or 1), repeatable.
    #[arg(long = "disk", value_parser = parse_disk_arg)]
    disks: Vec<(u8, usize, String)>,

    /// Install a DAN][ SD controller in this slot (1-7).
    #[arg(long)]
    dan2_slot: Option<u8>,

    #[arg(long)]
    dan2_rom: Option<String>,

    #[arg(long)]
    dan2_slot_a: Option<PathBuf>,

    #[arg(long)]
    dan2_slot_b: Option<PathBuf>,

    /// Run a fixed number of instructions instead of until halt/Ctrl-C
    /// (useful for smoke-testing a ROM without a frontend attached).
    #[arg(long)]
    steps: Option<u64>,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum CliCpuType {
    Nmos6502,
    Cmos65c02,
    Wdc65c02s,
}

impl From<CliCpuType> for CpuType {
    fn from(value: CliCpuType) -> Self {
        match value {
            CliCpuType::Nmos6502 => CpuType::NMOS6502,
            CliCpuType::Cmos65c02 => CpuType::CMOS65C02,
            CliCpuType::Wdc65c02s => CpuType::WDC65C02S,
        }
    }
}

fn parse_disk_arg(s: &str) -> Result<(u8, usize, String), String> {
    let mut parts = s.splitn(3, ':');
    let slot: u8 = parts.next().ok_or("missing slot")?.parse().map_err(|e| format!("bad slot: {e}"))?;
    let drive: usize = parts.next().ok_or("missing drive")?.parse().map_err(|e| format!("bad drive: {e}"))?;
    let path = parts.next().ok_or("missing path")?.to_string();
    Ok((slot, drive, path))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    println!("{BANNER}");

    let args = Args::parse();

    let config = MachineConfig {
        cpu_type: args.cpu.into(),
        rom_uri: args.rom,
        language_card_banks: args.language_card_banks,
        seed: args.seed,
        disk2_slot: args.disk2_slot,
        disk2_rom_uri: args.disk2_rom,
        disk_images: args.disks,
        dan2_slot: args.dan2_slot,
        dan2_rom_uri: args.dan2_rom,
        dan2_slot_a_path: args.dan2_slot_a,
        dan2_slot_b_path: args.dan2_slot_b,
    };

    let (mut machine, handles) = Machine::new(config)?;

    let commands = handles.commands.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        info!("main: ctrl-c received, requesting shutdown");
        let _ = commands.send(Command::Kill);
    }) {
        error!("main: failed to install ctrl-c handler: {err}");
    }

    match args.steps {
        Some(steps) => machine.run_steps(steps),
        None => machine.run(),
    }

    Ok(())
}

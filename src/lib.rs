//! `apple2_core`: an Apple II family emulator core — MMU, soft-switch I/O
//! plane, card framework, Disk II WOZ sequencer, DAN][ SD controller, and
//! the [`machine`] composer that wires them into a runnable machine.
//!
//! This crate has no video/audio/input backend of its own (spec.md §1's
//! Non-goals); `apple2-core`'s binary drives it headlessly, and a GUI
//! frontend would sit on top of [`machine::Machine`] and
//! [`video_source::VideoSource`] the same way.

pub mod bus;
pub mod card;
pub mod clock;
pub mod cpu;
pub mod dan2;
pub mod disk2;
pub mod error;
pub mod interrupts;
pub mod io;
pub mod machine;
pub mod memory;
pub mod mmu;
pub mod resource;
pub mod rom;
pub mod util;
pub mod video_source;

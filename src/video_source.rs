//! Read-only video snapshot contract (spec.md §6: "the frontend consumes
//! only this — no framebuffer rasterization lives in the core").
//!
//! Mode-mask bit layout kept from `alivesay-rust-iic/src/video.rs`'s
//! `VideoModeMask`/`VideoMode`; the rasterizer and `CHAR_ROM` that used to
//! sit alongside them are dropped, since drawing text/lo-res/hi-res glyphs
//! onto pixels is a frontend concern outside this crate's scope.

use crate::bus::Bus;

pub struct VideoModeMask;
#[rustfmt::skip]
impl VideoModeMask {
    pub const TEXT: u8    = 0b0000_0001;
    pub const LORES: u8   = 0b0000_0010;
    pub const HIRES: u8   = 0b0000_0100;
    pub const DHIRES: u8  = 0b0000_1000;
    pub const MIXED: u8   = 0b0001_0000;
    pub const PAGE2: u8   = 0b0010_0000;
    pub const COL80: u8   = 0b0100_0000;
    pub const ALTCHAR: u8 = 0b1000_0000;
}

/// A frontend reads `mode_mask()` to decide how to interpret `peek_main`/
/// `peek_aux` over the text/lo-res/hi-res windows; it never needs anything
/// else out of the core to draw a frame.
pub trait VideoSource {
    fn mode_mask(&self) -> u8;
    fn peek_main(&self, addr: u16) -> u8;
    fn peek_aux(&self, addr: u16) -> u8;
}

impl VideoSource for Bus {
    fn mode_mask(&self) -> u8 {
        let mut mask = 0u8;
        if self.io.text.get() {
            mask |= VideoModeMask::TEXT;
        }
        if self.io.lores.get() {
            mask |= VideoModeMask::LORES;
        }
        if self.io.hires.get() {
            mask |= VideoModeMask::HIRES;
        }
        if self.io.dhires.get() {
            mask |= VideoModeMask::DHIRES;
        }
        if self.io.mixed.get() {
            mask |= VideoModeMask::MIXED;
        }
        if self.io.page2.get() {
            mask |= VideoModeMask::PAGE2;
        }
        if self.io.col80.get() {
            mask |= VideoModeMask::COL80;
        }
        if self.io.altchar.get() {
            mask |= VideoModeMask::ALTCHAR;
        }
        mask
    }

    fn peek_main(&self, addr: u16) -> u8 {
        self.mmu.main_ram().peek(addr)
    }

    fn peek_aux(&self, addr: u16) -> u8 {
        self.mmu.aux_ram().peek(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::CpuType;

    #[test]
    fn mode_mask_reflects_io_switches() {
        let bus = Bus::new(CpuType::CMOS65C02);
        bus.io.write(0xC051, 0); // TEXT on
        bus.io.write(0xC055, 0); // PAGE2 on
        assert_eq!(bus.mode_mask() & VideoModeMask::TEXT, VideoModeMask::TEXT);
        assert_eq!(bus.mode_mask() & VideoModeMask::PAGE2, VideoModeMask::PAGE2);
    }
}

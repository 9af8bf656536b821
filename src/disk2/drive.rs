//! Disk II drive mechanics: quarter-track stepper, WOZ/DSK flux playback,
//! MC3470 read-latch latency and weak-bit synthesis (spec.md §4.5).
//!
//! Grounded on `original_source/cardDisk2SequencerDrive.go`'s
//! `moveHead`/`readPulse`/`insertDiskette`. The stepper's actual phase
//! arithmetic (`moveDriveStepper`) lives in the `component` package of the
//! original, which the retrieval pack doesn't include; the implementation
//! below follows spec.md §4.5's prose description directly (move one
//! quarter-track toward whichever of the two phases adjacent to the
//! current position is energized; an all-off phase byte is a no-op).

use super::woz::Woz;

pub const MAX_QUARTER_TRACK: u8 = 159;

/// Advances the head by at most one quarter-track per call, following the
/// Disk II's four-phase stepper motor: a phase one step ahead of the
/// current position pulls the head forward, one step behind pulls it
/// back. Two phases energized at once cancel unless one of them is the
/// current resting phase. `phases == 0` leaves the head where it is.
pub fn move_drive_stepper(phases: u8, current: u8) -> u8 {
    if phases == 0 {
        return current;
    }
    let cur_phase = (current % 4) as u32;
    let forward = 1u8 << ((cur_phase + 1) % 4);
    let backward = 1u8 << ((cur_phase + 3) % 4);

    let mut next = current as i16;
    if phases & forward != 0 {
        next += 1;
    } else if phases & backward != 0 {
        next -= 1;
    }
    next.clamp(0, MAX_QUARTER_TRACK as i16) as u8
}

/// Backing storage for a drive: either a read-only WOZ bitstream or a
/// writable re-nibblized DSK/NIB image (spec.md §4.5 "Writes").
pub enum Media {
    Woz(Woz),
    /// One GCR byte track per *physical* track (35 entries); quarter-tracks
    /// that aren't a multiple of 4 have no data, matching a real 5.25"
    /// disk's unused half-tracks.
    Nibblized { tracks: Vec<Vec<u8>>, write_protected: bool },
}

impl Media {
    fn write_protected(&self) -> bool {
        match self {
            Media::Woz(w) => w.write_protected(),
            Media::Nibblized { write_protected, .. } => *write_protected,
        }
    }
}

#[derive(Default)]
pub struct Drive {
    pub enabled: bool,
    pub current_quarter_track: u8,
    pub position: u32,
    pub position_max: u32,
    mc3470_buffer: u8,
    media: Option<Media>,
    rng: Option<fastrand::Rng>,
}

impl Drive {
    pub fn new(seed: u64) -> Self {
        Self {
            enabled: false,
            current_quarter_track: 0,
            position: 0,
            position_max: 1,
            mc3470_buffer: 0,
            media: None,
            rng: Some(fastrand::Rng::with_seed(seed)),
        }
    }

    pub fn insert(&mut self, media: Media) {
        log::info!("disk2: diskette inserted, write_protected={}", media.write_protected());
        self.media = Some(media);
        self.position = 0;
        self.mc3470_buffer = 0;
    }

    pub fn eject(&mut self) {
        self.media = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.media.is_some()
    }

    pub fn write_protected(&self) -> bool {
        self.media.as_ref().map(Media::write_protected).unwrap_or(true)
    }

    pub fn move_head(&mut self, phases: u8) {
        if !self.enabled {
            return;
        }
        self.current_quarter_track = move_drive_stepper(phases, self.current_quarter_track);
    }

    fn raw_track_bit(&mut self) -> bool {
        match self.media.as_ref() {
            Some(Media::Woz(woz)) => match woz.track_for_quarter(self.current_quarter_track) {
                Some(track) if track.bit_count > 0 => {
                    self.position_max = track.bit_count;
                    let bit = track.bit(self.position);
                    self.position = (self.position + 1) % self.position_max;
                    bit
                }
                _ => false,
            },
            Some(Media::Nibblized { tracks, .. }) => {
                let physical = (self.current_quarter_track / 4) as usize;
                match tracks.get(physical) {
                    Some(bytes) if !bytes.is_empty() => {
                        let bit_count = (bytes.len() * 8) as u32;
                        self.position_max = bit_count;
                        let idx = self.position as usize;
                        let byte = bytes[idx / 8];
                        let bit = (byte >> (7 - (idx % 8))) & 1 != 0;
                        self.position = (self.position + 1) % bit_count;
                        bit
                    }
                    _ => false,
                }
            }
            None => false,
        }
    }

    /// One flux-bit read, with the MC3470's one-bit pipeline latency and
    /// weak-bit synthesis on a run of zeros (spec.md §4.5, GLOSSARY
    /// "MC3470"). ~30% of synthesized bits come out as a 1.
    pub fn read_pulse(&mut self) -> bool {
        if !self.enabled || self.media.is_none() {
            return false;
        }
        let flux = self.raw_track_bit() as u8;
        self.mc3470_buffer = ((self.mc3470_buffer << 1) | flux) & 0x0F;

        let mut bit = (self.mc3470_buffer >> 1) & 0x1 != 0;
        if self.mc3470_buffer == 0 {
            let roll = self.rng.get_or_insert_with(|| fastrand::Rng::with_seed(0)).u8(0..100);
            if roll < 30 {
                bit = true;
            }
        }
        bit
    }

    /// Raw flux write at the current head position. Only meaningful for
    /// re-nibblized DSK/NIB media; WOZ bitstreams are read-only
    /// reconstructions of the original flux and writing to them is an
    /// implementation bug surface (spec.md §7 "Unimplemented").
    pub fn write_pulse(&mut self, byte: u8) {
        match self.media.as_mut() {
            Some(Media::Nibblized { tracks, .. }) => {
                let physical = (self.current_quarter_track / 4) as usize;
                if let Some(bytes) = tracks.get_mut(physical) {
                    if !bytes.is_empty() {
                        let idx = (self.position as usize / 8) % bytes.len();
                        bytes[idx] = byte;
                    }
                }
            }
            Some(Media::Woz(_)) => panic!("write not implemented on WOZ disk backing"),
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_zero_leaves_head_stationary() {
        assert_eq!(move_drive_stepper(0, 40), 40);
    }

    #[test]
    fn forward_phase_steps_by_one() {
        // at quarter-track 0 (resting phase 0), phase 1 is "forward".
        assert_eq!(move_drive_stepper(0b0010, 0), 1);
    }

    #[test]
    fn backward_phase_steps_by_one() {
        // at quarter-track 1 (resting phase 1), phase 0 is "backward".
        assert_eq!(move_drive_stepper(0b0001, 1), 0);
    }

    #[test]
    fn stepper_saturates_at_upper_bound() {
        // at quarter-track 159 (resting phase 3), phase 0 is "forward".
        assert_eq!(move_drive_stepper(0b0001, MAX_QUARTER_TRACK), MAX_QUARTER_TRACK);
    }

    #[test]
    fn stepper_saturates_at_lower_bound() {
        // at quarter-track 0 (resting phase 0), phase 3 is "backward".
        assert_eq!(move_drive_stepper(0b1000, 0), 0);
    }

    #[test]
    fn read_pulse_without_media_is_false_and_enabled_required() {
        let mut drive = Drive::new(1);
        assert!(!drive.read_pulse());
        drive.enabled = true;
        assert!(!drive.read_pulse());
    }

    #[test]
    fn weak_bit_synthesis_rate_is_roughly_30_percent() {
        let mut drive = Drive::new(42);
        drive.enabled = true;
        drive.insert(Media::Nibblized { tracks: vec![vec![0x00; 64]], write_protected: false });
        let mut ones = 0;
        for _ in 0..100 {
            if drive.read_pulse() {
                ones += 1;
            }
        }
        assert!((15..=50).contains(&ones), "got {ones} ones out of 100");
    }

    #[test]
    fn position_stays_below_position_max_after_reads() {
        let mut drive = Drive::new(7);
        drive.enabled = true;
        drive.insert(Media::Nibblized { tracks: vec![vec![0xAA; 8]], write_protected: false });
        for _ in 0..200 {
            drive.read_pulse();
            assert!(drive.position < drive.position_max);
        }
    }
}

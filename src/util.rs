pub fn hexdump(data: &[u8], start: Option<u16>, length: Option<usize>) {
    let start = start.unwrap_or(0x0000) as usize;
    let length = length.unwrap_or(data.len());

    let actual_length = length.min(data.len());
    if actual_length == 0 {
        return;
    }
    let end = start + actual_length - 1;

    let chunk_size = 16;
    log::trace!("hexdump: {:04X} - {:04X}", start, end);

    for chunk_start in (start..=end).step_by(chunk_size) {
        let mut line = format!("{:04X}: ", chunk_start);

        for i in chunk_start..chunk_start + chunk_size {
            if i <= end {
                line.push_str(&format!("{:02X} ", data[i - start]));
            } else {
                line.push_str("   ");
            }
        }

        line.push_str(" | ");

        for i in chunk_start..=end.min(chunk_start + chunk_size - 1) {
            let byte = data[i - start];
            let ascii = if byte.is_ascii_graphic() || byte == b' ' {
                byte as char
            } else {
                '.'
            };
            line.push(ascii);
        }

        log::trace!("{line}");
    }
}

#[inline]
pub fn ior(val: u8) -> u8 {
    if val != 0 {
        0x80
    } else {
        0x00
    }
}

/// Maps an ASCII byte to the high-bit-set keycode the Apple II keyboard
/// latch ($C000) presents to the CPU.
pub fn ascii_to_apple2_keycode(ch: u8) -> u8 {
    ch.to_ascii_uppercase() | 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keycode_sets_high_bit_and_uppercases() {
        assert_eq!(ascii_to_apple2_keycode(b'a'), 0xC1);
        assert_eq!(ascii_to_apple2_keycode(b'A'), 0xC1);
    }

    #[test]
    fn ior_maps_nonzero_to_0x80() {
        assert_eq!(ior(0), 0x00);
        assert_eq!(ior(1), 0x80);
    }
}

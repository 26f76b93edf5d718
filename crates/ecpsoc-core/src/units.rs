//! Frequency and size helpers.

pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * KIB;
pub const MHZ: u64 = 1_000_000;

/// Format a frequency in Hz for humans (e.g. `"66.000 MHz"`).
pub fn format_hz(hz: u64) -> String {
    if hz >= MHZ {
        format!("{}.{:03} MHz", hz / MHZ, (hz % MHZ) / 1_000)
    } else if hz >= 1_000 {
        format!("{}.{:03} kHz", hz / 1_000, hz % 1_000)
    } else {
        format!("{hz} Hz")
    }
}

/// Format a byte count using the largest exact binary unit.
pub fn format_bytes(bytes: u64) -> String {
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MiB", bytes / MIB)
    } else if bytes >= KIB && bytes % KIB == 0 {
        format!("{} KiB", bytes / KIB)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequencies() {
        assert_eq!(format_hz(25 * MHZ), "25.000 MHz");
        assert_eq!(format_hz(65_625_000), "65.625 MHz");
        assert_eq!(format_hz(12_500), "12.500 kHz");
        assert_eq!(format_hz(7), "7 Hz");
    }

    #[test]
    fn sizes() {
        assert_eq!(format_bytes(4 * MIB), "4 MiB");
        assert_eq!(format_bytes(0x8000), "32 KiB");
        assert_eq!(format_bytes(1500), "1500 B");
    }
}

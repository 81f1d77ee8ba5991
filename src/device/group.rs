use common::{IoKind, BITS};
use log::{debug, error, info};

/// Number of I/O expanders on the board. OPT and TTL share the last one.
pub const EXPANDER_COUNT: usize = 3;

/// Number of digital inputs behind `INP`
pub const INPUT_COUNT: usize = 8;

/// Largest value a bits mask may carry on the wire
const MAX_BITS_VALUE: u32 = 0xFFFF;

/// Split `<TAG>/<param>[/<value>]` into its parameter and value, or the
/// error text the device answers with
pub(super) fn parameters<'a>(parts: &[&'a str]) -> Result<(&'a str, &'a str), &'static str> {
    match parts {
        [] | [_] => Err("ERR: no parameter"),
        [_, parameter] => Ok((*parameter, "")),
        [_, parameter, value] => Ok((*parameter, *value)),
        _ => Err("ERR: too many parameters"),
    }
}

/// Digits only. Anything else, including an empty string, is `None`.
fn int_from_str(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// A run of outputs occupying `width` bits of an expander register,
/// starting at bit `offset`
#[derive(Clone, Debug)]
pub struct OutputBank {
    pub kind: IoKind,
    pub expander: usize,
    pub width: u8,
    pub offset: u8,
}

impl OutputBank {
    /// Panics if the bank does not fit in one 16-bit register
    pub fn new(kind: IoKind, expander: usize, width: u8, offset: u8) -> Self {
        assert!(
            (1..=16).contains(&width) && width as u32 + offset as u32 <= 16,
            "{} bank of width {} at offset {} does not fit a 16-bit expander",
            kind.tag(),
            width,
            offset
        );
        assert!(expander < EXPANDER_COUNT, "no expander {}", expander);

        OutputBank {
            kind,
            expander,
            width,
            offset,
        }
    }

    fn mask(&self) -> u16 {
        (u16::MAX >> (16 - self.width)) << self.offset
    }

    pub fn bits(&self, expanders: &[u16; EXPANDER_COUNT]) -> u16 {
        (expanders[self.expander] & self.mask()) >> self.offset
    }

    /// Level of one pin, numbered from 0
    pub fn level(&self, expanders: &[u16; EXPANDER_COUNT], pin: u32) -> Option<bool> {
        if pin >= self.width as u32 {
            return None;
        }
        Some(expanders[self.expander] & (1 << (pin + self.offset as u32)) != 0)
    }

    pub fn set_output(&self, expanders: &mut [u16; EXPANDER_COUNT], pin: u32, on: bool) -> bool {
        if pin >= self.width as u32 {
            return false;
        }

        let bit = 1u16 << (pin + self.offset as u32);
        debug!(
            "set pin {} {} @ {}",
            pin + self.offset as u32,
            if on { "on" } else { "off" },
            self.kind.tag()
        );

        if on {
            expanders[self.expander] |= bit;
        } else {
            expanders[self.expander] &= !bit;
        }
        true
    }

    /// Replace this bank's bits, leaving the rest of the register alone
    pub fn set_bits(&self, expanders: &mut [u16; EXPANDER_COUNT], bits: u16) -> bool {
        let range = 1u32 << self.width;
        if bits as u32 >= range {
            error!(
                "Cannot write bits {:#06x} as it exceeds {:#06x} on {}",
                bits,
                range,
                self.kind.tag()
            );
            return false;
        }

        info!("Write bits {:#06x} on {}", bits, self.kind.tag());
        let register = &mut expanders[self.expander];
        *register = (*register & !self.mask()) | ((bits << self.offset) & self.mask());
        true
    }

    pub fn operation(
        &self,
        expanders: &mut [u16; EXPANDER_COUNT],
        parameter: &str,
        value: &str,
    ) -> String {
        let succeeded = match int_from_str(parameter) {
            // Pins are numbered from 1 on the wire
            Some(index) if index > 0 => {
                let pin = index - 1;
                if value.is_empty() {
                    return match self.level(expanders, pin) {
                        Some(level) => format!("OK: {}", level as u8),
                        None => "ERR".to_string(),
                    };
                } else if value.contains("on") {
                    self.set_output(expanders, pin, true)
                } else if value.contains("off") {
                    self.set_output(expanders, pin, false)
                } else {
                    return "ERR: invalid value".to_string();
                }
            }
            _ if parameter == BITS => {
                if value.is_empty() {
                    return format!("OK: {}", self.bits(expanders));
                }
                match int_from_str(value) {
                    Some(bits) if bits <= MAX_BITS_VALUE => self.set_bits(expanders, bits as u16),
                    _ => return "ERR: invalid bits value".to_string(),
                }
            }
            _ => return "ERR: invalid parameter".to_string(),
        };

        let reply = if succeeded { "OK" } else { "ERR" };
        reply.to_string()
    }
}

/// Digital inputs, read-only and only as a whole
#[derive(Clone, Debug)]
pub struct InputBank {
    levels: [bool; INPUT_COUNT],
}

impl InputBank {
    pub fn new() -> Self {
        InputBank {
            levels: [false; INPUT_COUNT],
        }
    }

    pub fn set_level(&mut self, index: usize, level: bool) -> bool {
        match self.levels.get_mut(index) {
            Some(slot) => {
                *slot = level;
                true
            }
            None => false,
        }
    }

    pub fn bits(&self) -> u16 {
        self.levels
            .iter()
            .enumerate()
            .filter(|(_, &level)| level)
            .fold(0, |bits, (i, _)| bits | 1 << i)
    }

    pub fn operation(&self, parameter: &str) -> String {
        if parameter == BITS {
            self.bits().to_string()
        } else {
            "ERR: only bitwise read supported".to_string()
        }
    }
}

impl Default for InputBank {
    fn default() -> Self {
        InputBank::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameters() {
        assert_eq!(Err("ERR: no parameter"), parameters(&["MOS"]));
        assert_eq!(Ok(("1", "")), parameters(&["MOS", "1"]));
        assert_eq!(Ok(("bits", "")), parameters(&["MOS", "bits", ""]));
        assert_eq!(Ok(("1", "on")), parameters(&["MOS", "1", "on"]));
        assert_eq!(Err("ERR: too many parameters"), parameters(&["MOS", "1", "on", "x"]));
    }

    #[test]
    fn test_int_from_str() {
        assert_eq!(Some(44), int_from_str("44"));
        assert_eq!(None, int_from_str(""));
        assert_eq!(None, int_from_str("-1"));
        assert_eq!(None, int_from_str("0x10"));
        assert_eq!(None, int_from_str("99999999999999"));
    }

    #[test]
    fn test_shared_register() {
        let mut expanders = [0u16; EXPANDER_COUNT];
        let opto = OutputBank::new(IoKind::Opto, 2, 8, 8);
        let ttl = OutputBank::new(IoKind::Ttl, 2, 8, 0);

        assert!(ttl.set_bits(&mut expanders, 0xA5));
        assert!(opto.set_bits(&mut expanders, 0x3C));
        assert_eq!(0x3CA5, expanders[2]);

        assert!(ttl.set_bits(&mut expanders, 0));
        assert_eq!(0x3C00, expanders[2]);
        assert_eq!(0x3C, opto.bits(&expanders));
        assert_eq!(0, ttl.bits(&expanders));
    }

    #[test]
    fn test_bits_out_of_range() {
        let mut expanders = [0u16; EXPANDER_COUNT];
        let relay = OutputBank::new(IoKind::Relay, 1, 15, 0);

        assert!(relay.set_bits(&mut expanders, 0x7FFF));
        assert!(!relay.set_bits(&mut expanders, 0x8000));
        assert_eq!(0x7FFF, expanders[1]);
    }

    #[test]
    #[should_panic(expected = "does not fit")]
    fn test_zero_width_bank_is_rejected() {
        OutputBank::new(IoKind::Mosfet, 0, 0, 0);
    }

    #[test]
    #[should_panic(expected = "does not fit")]
    fn test_overflowing_bank_is_rejected() {
        OutputBank::new(IoKind::Opto, 2, 9, 8);
    }

    #[test]
    fn test_full_width_bank() {
        let mut expanders = [0u16; EXPANDER_COUNT];
        let mosfets = OutputBank::new(IoKind::Mosfet, 0, 16, 0);

        assert!(mosfets.set_bits(&mut expanders, 0xFFFF));
        assert_eq!(0xFFFF, mosfets.bits(&expanders));
    }

    #[test]
    fn test_pin_operations() {
        let mut expanders = [0u16; EXPANDER_COUNT];
        let opto = OutputBank::new(IoKind::Opto, 2, 8, 8);

        assert_eq!("OK", opto.operation(&mut expanders, "1", "on"));
        assert_eq!(0x0100, expanders[2]);
        assert_eq!("OK: 1", opto.operation(&mut expanders, "1", ""));
        assert_eq!("OK", opto.operation(&mut expanders, "1", "off"));
        assert_eq!("OK: 0", opto.operation(&mut expanders, "1", ""));
        assert_eq!("ERR", opto.operation(&mut expanders, "9", "on"));
        assert_eq!("ERR: invalid value", opto.operation(&mut expanders, "1", "toggle"));
        assert_eq!("ERR: invalid parameter", opto.operation(&mut expanders, "0", "on"));
        assert_eq!("ERR: invalid bits value", opto.operation(&mut expanders, "bits", "65536"));
        assert_eq!("ERR", opto.operation(&mut expanders, "bits", "256"));
    }

    #[test]
    fn test_inputs() {
        let mut inputs = InputBank::new();
        assert!(inputs.set_level(0, true));
        assert!(inputs.set_level(3, true));
        assert!(!inputs.set_level(INPUT_COUNT, true));

        assert_eq!(0b1001, inputs.bits());
        assert_eq!("9", inputs.operation("bits"));
        assert_eq!("ERR: only bitwise read supported", inputs.operation(""));
    }
}

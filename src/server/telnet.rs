//! Minimal telnet option handling.
//!
//! The server puts the client in character mode (server echo, suppressed
//! go-ahead) and asks for window size reports. Incoming IAC traffic is
//! stripped; only NAWS reports and interrupts are surfaced.

pub const IAC: u8 = 255;
pub const DONT: u8 = 254;
pub const DO: u8 = 253;
pub const WONT: u8 = 252;
pub const WILL: u8 = 251;
pub const SB: u8 = 250;
pub const IP: u8 = 244;
pub const BRK: u8 = 243;
pub const SE: u8 = 240;

/// What a local Ctrl+C would have sent
const ETX: u8 = 0x03;

pub const OPT_ECHO: u8 = 1;
pub const OPT_SGA: u8 = 3;
pub const OPT_NAWS: u8 = 31;

/// Sent once when a client connects
pub const NEGOTIATION: &[u8] = &[
    IAC, WILL, OPT_ECHO,
    IAC, WILL, OPT_SGA,
    IAC, DO, OPT_NAWS,
];

/// Longest sub-negotiation kept; anything longer is truncated
const MAX_SUBNEGOTIATION: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Data,
    Iac,
    /// WILL/WONT/DO/DONT, waiting for the option byte
    Option,
    Sub,
    SubIac,
}

/// Output of one `feed` call
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Parsed {
    /// Application bytes with telnet commands removed
    pub data: Vec<u8>,
    /// Window sizes reported through NAWS, in arrival order
    pub resizes: Vec<(u16, u16)>,
}

/// Streaming IAC parser. Commands may be split across reads.
#[derive(Debug, Clone)]
pub struct TelnetParser {
    state: State,
    sub: Vec<u8>,
}

impl Default for TelnetParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TelnetParser {
    pub fn new() -> Self {
        Self {
            state: State::Data,
            sub: Vec::new(),
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) -> Parsed {
        let mut parsed = Parsed::default();

        for &b in bytes {
            self.state = match self.state {
                State::Data if b == IAC => State::Iac,
                State::Data => {
                    parsed.data.push(b);
                    State::Data
                }
                State::Iac => match b {
                    // Escaped 0xFF
                    IAC => {
                        parsed.data.push(IAC);
                        State::Data
                    }
                    SB => {
                        self.sub.clear();
                        State::Sub
                    }
                    WILL | WONT | DO | DONT => State::Option,
                    // Clients in local-chars mode send Ctrl+C this way
                    IP | BRK => {
                        parsed.data.push(ETX);
                        State::Data
                    }
                    // NOP, GA, AYT and friends carry no payload
                    _ => State::Data,
                },
                State::Option => State::Data,
                State::Sub if b == IAC => State::SubIac,
                State::Sub => {
                    self.push_sub(b);
                    State::Sub
                }
                State::SubIac => match b {
                    SE => {
                        if let Some(size) = self.window_size() {
                            parsed.resizes.push(size);
                        }
                        State::Data
                    }
                    IAC => {
                        self.push_sub(IAC);
                        State::Sub
                    }
                    // Malformed; drop the sub-negotiation
                    _ => State::Data,
                },
            };
        }

        parsed
    }

    fn push_sub(&mut self, b: u8) {
        if self.sub.len() < MAX_SUBNEGOTIATION {
            self.sub.push(b);
        }
    }

    /// Decode a finished NAWS sub-negotiation: option, width (2 bytes),
    /// height (2 bytes), big-endian. Zero sizes mean "unknown".
    fn window_size(&self) -> Option<(u16, u16)> {
        match self.sub.as_slice() {
            &[OPT_NAWS, w1, w0, h1, h0] => {
                let width = u16::from_be_bytes([w1, w0]);
                let height = u16::from_be_bytes([h1, h0]);
                (width > 0 && height > 0).then_some((width, height))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naws(width: u16, height: u16) -> Vec<u8> {
        let [w1, w0] = width.to_be_bytes();
        let [h1, h0] = height.to_be_bytes();
        vec![IAC, SB, OPT_NAWS, w1, w0, h1, h0, IAC, SE]
    }

    #[test]
    fn test_plain_data_passes_through() {
        let mut parser = TelnetParser::new();
        let parsed = parser.feed(b"1b\r\0q");
        assert_eq!(parsed.data, b"1b\r\0q");
        assert!(parsed.resizes.is_empty());
    }

    #[test]
    fn test_negotiation_stripped() {
        let mut parser = TelnetParser::new();
        let parsed = parser.feed(&[IAC, DO, OPT_ECHO, b'1', IAC, WILL, OPT_NAWS, IAC, 241, b'q']);
        assert_eq!(parsed.data, b"1q");
    }

    #[test]
    fn test_naws_report() {
        let mut parser = TelnetParser::new();
        let mut input = b"2".to_vec();
        input.extend(naws(120, 40));
        input.push(b'b');

        let parsed = parser.feed(&input);
        assert_eq!(parsed.data, b"2b");
        assert_eq!(parsed.resizes, vec![(120, 40)]);
    }

    #[test]
    fn test_naws_split_across_reads() {
        let mut parser = TelnetParser::new();
        let input = naws(300, 100);
        let (a, b) = input.split_at(4);

        assert_eq!(parser.feed(a), Parsed::default());
        assert_eq!(parser.feed(b).resizes, vec![(300, 100)]);
    }

    #[test]
    fn test_naws_with_escaped_ff() {
        // Width 255 must be sent as IAC IAC
        let mut parser = TelnetParser::new();
        let input = [IAC, SB, OPT_NAWS, 0, IAC, IAC, 0, 50, IAC, SE];
        assert_eq!(parser.feed(&input).resizes, vec![(255, 50)]);
    }

    #[test]
    fn test_zero_size_ignored() {
        let mut parser = TelnetParser::new();
        assert!(parser.feed(&naws(0, 0)).resizes.is_empty());
    }

    #[test]
    fn test_escaped_iac_in_data() {
        let mut parser = TelnetParser::new();
        assert_eq!(parser.feed(&[b'a', IAC, IAC, b'b']).data, vec![b'a', 0xFF, b'b']);
    }

    #[test]
    fn test_unknown_subnegotiation_dropped() {
        let mut parser = TelnetParser::new();
        // Terminal type report
        let parsed = parser.feed(&[IAC, SB, 24, 0, b'x', b't', IAC, SE, b'4']);
        assert_eq!(parsed.data, b"4");
        assert!(parsed.resizes.is_empty());
    }

    #[test]
    fn test_interrupt_becomes_ctrl_c() {
        let mut parser = TelnetParser::new();
        assert_eq!(parser.feed(&[b'1', IAC, IP]).data, vec![b'1', 0x03]);
        assert_eq!(parser.feed(&[IAC, BRK, IAC, 246]).data, vec![0x03]);
    }

    #[test]
    fn test_negotiation_preamble() {
        assert_eq!(NEGOTIATION, &[255, 251, 1, 255, 251, 3, 255, 253, 31]);
    }
}

//! Key mapping for terminal input
//!
//! Decodes raw bytes from the remote terminal into key events, and key events
//! into state machine commands.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::{Command, Page};

const ESC: u8 = 0x1B;

/// Key mapper for converting terminal input to commands
pub struct KeyMapper;

impl KeyMapper {
    /// Decode and map a chunk of input in one go
    pub fn commands(bytes: &[u8]) -> Vec<Command> {
        Self::decode(bytes).iter().filter_map(Self::map).collect()
    }

    /// Map a key event to a command. Unbound keys map to `None`.
    pub fn map(event: &KeyEvent) -> Option<Command> {
        match (event.code, event.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Command::Quit),
            (_, mods) if !mods.is_empty() => None,
            (KeyCode::Char('q'), _) => Some(Command::Quit),
            (KeyCode::Char('b') | KeyCode::Esc, _) => Some(Command::Back),
            (KeyCode::Char(ch @ '1'..='4'), _) => {
                Page::from_number(ch as u8 - b'0').map(Command::SelectPage)
            }
            _ => None,
        }
    }

    /// Decode raw input bytes into key events.
    ///
    /// A lone ESC is the escape key. ESC followed by `[` or `O` starts a
    /// control sequence (arrows, function keys); ESC before any other
    /// character is that character with Alt held.
    pub fn decode(bytes: &[u8]) -> Vec<KeyEvent> {
        let mut events = Vec::new();
        let mut i = 0;

        while i < bytes.len() {
            let b = bytes[i];
            match b {
                ESC => match bytes.get(i + 1) {
                    None => {
                        events.push(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
                        i += 1;
                    }
                    Some(b'[') | Some(b'O') => {
                        let (code, len) = Self::decode_sequence(&bytes[i + 1..]);
                        if let Some(code) = code {
                            events.push(KeyEvent::new(code, KeyModifiers::NONE));
                        }
                        i += 1 + len;
                    }
                    Some(&ESC) => {
                        events.push(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
                        i += 1;
                    }
                    Some(_) => {
                        let (ch, len) = Self::decode_char(&bytes[i + 1..]);
                        if let Some(ch) = ch {
                            events.push(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::ALT));
                        }
                        i += 1 + len;
                    }
                },
                // Telnet sends CR NUL or CR LF for Enter
                b'\r' => {
                    events.push(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
                    i += match bytes.get(i + 1) {
                        Some(0) | Some(b'\n') => 2,
                        _ => 1,
                    };
                }
                b'\n' => {
                    events.push(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
                    i += 1;
                }
                b'\t' => {
                    events.push(KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE));
                    i += 1;
                }
                0x7F | 0x08 => {
                    events.push(KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE));
                    i += 1;
                }
                0x01..=0x1A => {
                    // Ctrl+letter
                    let ch = (b - 1 + b'a') as char;
                    events.push(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL));
                    i += 1;
                }
                _ => {
                    let (ch, len) = Self::decode_char(&bytes[i..]);
                    if let Some(ch) = ch {
                        if !ch.is_control() {
                            events.push(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE));
                        }
                    }
                    i += len;
                }
            }
        }

        events
    }

    /// Decode one UTF-8 character. Always consumes at least one byte.
    fn decode_char(bytes: &[u8]) -> (Option<char>, usize) {
        let Some(&first) = bytes.first() else {
            return (None, 0);
        };
        let seq_len = if first & 0x80 == 0 { 1 }
            else if first & 0xE0 == 0xC0 { 2 }
            else if first & 0xF0 == 0xE0 { 3 }
            else if first & 0xF8 == 0xF0 { 4 }
            else { return (None, 1) }; // Invalid lead byte, skip

        match bytes.get(..seq_len).and_then(|s| std::str::from_utf8(s).ok()) {
            Some(s) => (s.chars().next(), seq_len),
            None => (None, 1),
        }
    }

    /// Decode a CSI/SS3 sequence starting at the `[` or `O` introducer.
    /// Returns the key (if recognised) and the bytes consumed.
    fn decode_sequence(bytes: &[u8]) -> (Option<KeyCode>, usize) {
        let introducer = bytes[0];
        let mut len = 1;
        while let Some(&b) = bytes.get(len) {
            len += 1;
            // Final byte
            if (0x40..=0x7E).contains(&b) {
                let params = &bytes[1..len - 1];
                return (Self::sequence_key(introducer, params, b), len);
            }
        }
        // Truncated sequence: drop what we have
        (None, len)
    }

    fn sequence_key(introducer: u8, params: &[u8], last: u8) -> Option<KeyCode> {
        match (introducer, last) {
            (_, b'A') => Some(KeyCode::Up),
            (_, b'B') => Some(KeyCode::Down),
            (_, b'C') => Some(KeyCode::Right),
            (_, b'D') => Some(KeyCode::Left),
            (_, b'H') => Some(KeyCode::Home),
            (_, b'F') => Some(KeyCode::End),
            (b'O', b'P'..=b'S') => Some(KeyCode::F(last - b'P' + 1)),
            (b'[', b'~') => match params {
                b"2" => Some(KeyCode::Insert),
                b"3" => Some(KeyCode::Delete),
                b"5" => Some(KeyCode::PageUp),
                b"6" => Some(KeyCode::PageDown),
                _ => None,
            },
            _ => None,
        }
    }
}

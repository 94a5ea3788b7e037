//! Key translation for session input
//!
//! Turns crossterm key events into the byte sequences a remote PTY expects.
//! The wire carries input as UTF-8 text, so the result is a `String`; every
//! control sequence used here is valid UTF-8.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Translate a key event to its terminal input sequence
///
/// Returns `None` for keys with no terminal representation, such as
/// modifier-only keys.
pub fn encode_key(key: &KeyEvent) -> Option<String> {
    let modifiers = key.modifiers;

    match key.code {
        KeyCode::Char(c) => encode_char(c, modifiers),

        KeyCode::Enter => Some("\r".into()),
        KeyCode::Tab => {
            if modifiers.contains(KeyModifiers::SHIFT) {
                // Shift+Tab is CSI Z (backtab)
                Some("\x1b[Z".into())
            } else {
                Some("\t".into())
            }
        }
        KeyCode::Backspace => {
            if modifiers.contains(KeyModifiers::ALT) {
                Some("\x1b\x7f".into())
            } else {
                Some("\x7f".into())
            }
        }
        KeyCode::Esc => Some("\x1b".into()),

        KeyCode::Up => Some("\x1b[A".into()),
        KeyCode::Down => Some("\x1b[B".into()),
        KeyCode::Right => Some("\x1b[C".into()),
        KeyCode::Left => Some("\x1b[D".into()),

        KeyCode::Home => Some("\x1b[H".into()),
        KeyCode::End => Some("\x1b[F".into()),
        KeyCode::PageUp => Some("\x1b[5~".into()),
        KeyCode::PageDown => Some("\x1b[6~".into()),
        KeyCode::Insert => Some("\x1b[2~".into()),
        KeyCode::Delete => Some("\x1b[3~".into()),

        KeyCode::F(n) => encode_function_key(n),

        _ => None,
    }
}

fn encode_char(c: char, modifiers: KeyModifiers) -> Option<String> {
    if modifiers.contains(KeyModifiers::ALT) {
        // Alt prefixes the key with ESC
        let mut out = String::from("\x1b");
        match control_code(c, modifiers) {
            Some(code) => out.push(code),
            None => out.push(c),
        }
        return Some(out);
    }

    if modifiers.contains(KeyModifiers::CONTROL) {
        if let Some(code) = control_code(c, modifiers) {
            return Some(code.to_string());
        }
    }

    Some(c.to_string())
}

fn control_code(c: char, modifiers: KeyModifiers) -> Option<char> {
    if !modifiers.contains(KeyModifiers::CONTROL) {
        return None;
    }
    if c.is_ascii_alphabetic() {
        // Ctrl+A is 0x01, Ctrl+B is 0x02, ...
        return Some(((c.to_ascii_lowercase() as u8) - b'a' + 1) as char);
    }
    match c {
        '@' | ' ' => Some('\0'),
        '[' => Some('\x1b'),
        '\\' => Some('\x1c'),
        ']' => Some('\x1d'),
        '^' => Some('\x1e'),
        '_' => Some('\x1f'),
        '?' => Some('\x7f'),
        _ => None,
    }
}

fn encode_function_key(n: u8) -> Option<String> {
    let seq = match n {
        1 => "\x1bOP",
        2 => "\x1bOQ",
        3 => "\x1bOR",
        4 => "\x1bOS",
        5 => "\x1b[15~",
        6 => "\x1b[17~",
        7 => "\x1b[18~",
        8 => "\x1b[19~",
        9 => "\x1b[20~",
        10 => "\x1b[21~",
        11 => "\x1b[23~",
        12 => "\x1b[24~",
        _ => return None,
    };
    Some(seq.into())
}

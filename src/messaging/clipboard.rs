//! Clipboard writes over the terminal (OSC 52).
//!
//! The terminal emulator owns the clipboard, so this works over SSH and needs
//! no display server. Terminals without OSC 52 support ignore the sequence.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use crossterm::{Command, QueueableCommand};
use std::fmt;
use std::io::Write;

/// Set the system clipboard to the given text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyToClipboard<'a>(pub &'a str);

impl Command for CopyToClipboard<'_> {
    fn write_ansi(&self, f: &mut impl fmt::Write) -> fmt::Result {
        write!(f, "\x1b]52;c;{}\x07", STANDARD.encode(self.0))
    }

    #[cfg(windows)]
    fn execute_winapi(&self) -> std::io::Result<()> {
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "OSC 52 clipboard needs an ANSI terminal",
        ))
    }
}

/// Write `text` to the clipboard through `out` and flush.
pub fn copy_to_clipboard<W: Write>(out: &mut W, text: &str) -> std::io::Result<()> {
    out.queue(CopyToClipboard(text))?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_writes_osc52_sequence() {
        let mut buf = Vec::new();
        copy_to_clipboard(&mut buf, "print('hi')").unwrap();
        let written = String::from_utf8(buf).unwrap();
        assert_eq!(written, format!("\x1b]52;c;{}\x07", STANDARD.encode("print('hi')")));
    }

    #[test]
    fn test_copy_encodes_multiline_text() {
        let mut buf = Vec::new();
        copy_to_clipboard(&mut buf, "a\nb\n").unwrap();
        let written = String::from_utf8(buf).unwrap();
        let payload = written
            .strip_prefix("\x1b]52;c;")
            .and_then(|s| s.strip_suffix('\x07'))
            .unwrap();
        assert_eq!(STANDARD.decode(payload).unwrap(), b"a\nb\n");
    }
}

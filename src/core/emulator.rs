//! Byte-stream emulator: turns raw shell output into grid mutations.
//!
//! The emulator is deliberately minimal. It understands newline, carriage
//! return, backspace, and tab; every other control byte is dropped. Bytes
//! at 0x80 and above are decoded as UTF-8, with decoder state carried
//! across [`Emulator::append`] calls so feeding a stream byte-by-byte and
//! feeding it in one batch produce the same grid.
//!
//! Nothing in here returns an error. Out-of-range conditions are clamped
//! or dropped so a hostile byte stream can at worst print garbage.

use tracing::trace;
use unicode_width::UnicodeWidthChar;

use super::screen::{ScreenBuffer, Style};

const TAB_WIDTH: u16 = 8;

/// Incremental UTF-8 decoder for multi-byte sequences split across reads.
#[derive(Default)]
struct Utf8Pending {
    buf: [u8; 4],
    len: usize,
    need: usize,
}

impl Utf8Pending {
    fn start(&mut self, lead: u8, need: usize) {
        self.buf[0] = lead;
        self.len = 1;
        self.need = need;
    }

    fn reset(&mut self) {
        self.len = 0;
        self.need = 0;
    }

    fn is_active(&self) -> bool {
        self.need > 0
    }

    /// Feed one continuation byte. Returns a decoded char once the
    /// sequence is complete, or `None` while more bytes are needed.
    fn push(&mut self, byte: u8) -> Option<char> {
        self.buf[self.len] = byte;
        self.len += 1;
        if self.len < self.need {
            return None;
        }
        let decoded = std::str::from_utf8(&self.buf[..self.len])
            .ok()
            .and_then(|s| s.chars().next());
        self.reset();
        decoded
    }
}

/// Terminal emulator: one screen buffer plus cursor and current style.
pub struct Emulator {
    screen: ScreenBuffer,
    row: u16,
    col: u16,
    style: Style,
    pending: Utf8Pending,
}

impl Emulator {
    pub fn new(cols: u16, rows: u16, scrollback_limit: usize) -> Self {
        Self {
            screen: ScreenBuffer::new(cols, rows, scrollback_limit),
            row: 0,
            col: 0,
            style: Style::default(),
            pending: Utf8Pending::default(),
        }
    }

    pub fn cols(&self) -> u16 {
        self.screen.cols()
    }

    pub fn rows(&self) -> u16 {
        self.screen.rows()
    }

    /// Cursor position as `(row, col)`.
    pub fn cursor(&self) -> (u16, u16) {
        (self.row, self.col)
    }

    pub fn screen(&self) -> &ScreenBuffer {
        &self.screen
    }

    pub fn char_at(&self, col: u16, row: u16) -> char {
        self.screen.get(col, row)
    }

    pub fn row_text(&self, row: u16) -> String {
        self.screen.row_text(row)
    }

    /// Style applied to newly written cells.
    pub fn style(&self) -> Style {
        self.style
    }

    pub fn set_style(&mut self, style: Style) {
        self.style = style;
    }

    /// Feed raw output bytes through the state machine.
    pub fn append(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.feed(byte);
        }
    }

    fn feed(&mut self, byte: u8) {
        if self.pending.is_active() {
            if byte & 0xC0 == 0x80 {
                if let Some(ch) = self.pending.push(byte) {
                    self.put_char(ch);
                }
                return;
            }
            // Sequence broken off; drop it and reprocess this byte.
            self.pending.reset();
        }

        match byte {
            b'\n' => self.advance_row(),
            b'\r' => self.col = 0,
            0x08 => {
                if self.col > 0 {
                    self.col -= 1;
                }
            }
            0x09 => {
                // u32 arithmetic: the next stop can exceed u16 at extreme widths.
                let next_stop = (u32::from(self.col) / u32::from(TAB_WIDTH) + 1)
                    * u32::from(TAB_WIDTH);
                self.col = next_stop.min(u32::from(self.screen.cols() - 1)) as u16;
            }
            b if b < 0x20 || b == 0x7F => {
                trace!(byte = b, "dropping control byte");
            }
            b if b < 0x80 => self.put_char(b as char),
            b if b & 0xE0 == 0xC0 => self.pending.start(b, 2),
            b if b & 0xF0 == 0xE0 => self.pending.start(b, 3),
            b if b & 0xF8 == 0xF0 => self.pending.start(b, 4),
            b => {
                // Stray continuation or invalid lead byte.
                trace!(byte = b, "dropping invalid utf-8 byte");
            }
        }
    }

    /// Write one printable character at the cursor and advance, wrapping
    /// to the next line at the right edge.
    fn put_char(&mut self, ch: char) {
        let width = ch.width().unwrap_or(0) as u16;
        if width == 0 {
            return;
        }

        self.screen.set(self.col, self.row, ch, self.style);
        if width == 2 && self.col + 1 < self.screen.cols() {
            self.screen.set(self.col + 1, self.row, ' ', self.style);
        }

        self.col = self.col.saturating_add(width);
        if self.col >= self.screen.cols() {
            self.col = 0;
            self.advance_row();
        }
    }

    /// Move the cursor down one row, scrolling when it would leave the
    /// grid. Both newline handling and line wrap come through here so the
    /// two paths can never diverge.
    fn advance_row(&mut self) {
        if self.row + 1 >= self.screen.rows() {
            self.row = self.screen.rows() - 1;
            self.screen.scroll_up_one_line();
        } else {
            self.row += 1;
        }
    }

    /// Clear the grid and home the cursor, keeping geometry and style.
    pub fn clear(&mut self) {
        self.screen.clear();
        self.row = 0;
        self.col = 0;
    }

    /// Resize the grid, preserving content where it overlaps and clamping
    /// the cursor back into bounds. No-op when the size is unchanged.
    pub fn update_size(&mut self, cols: u16, rows: u16) {
        if cols.max(1) == self.screen.cols() && rows.max(1) == self.screen.rows() {
            return;
        }
        self.screen.resize(cols, rows);
        self.row = self.row.min(self.screen.rows() - 1);
        self.col = self.col.min(self.screen.cols() - 1);
    }
}

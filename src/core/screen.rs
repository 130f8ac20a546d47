//! Screen buffer: the 2-D character/style grid behind a session.
//!
//! The buffer is a `rows x cols` matrix of [`Cell`]s plus a bounded
//! scrollback of rows that have been scrolled off the top. It is mutated
//! exclusively by the emulator and read by whatever presentation layer
//! polls the session. Out-of-bounds access never fails: writes are dropped
//! and reads return a blank cell, so a misbehaving byte stream can never
//! tear down the session.

use std::collections::VecDeque;

use bitflags::bitflags;

bitflags! {
    /// Text effect mask stored alongside each cell.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct StyleFlags: u8 {
        const BOLD      = 0b0000_0001;
        const ITALIC    = 0b0000_0010;
        const UNDERLINE = 0b0000_0100;
    }
}

/// Packed cell style: indexed foreground, indexed background, effect mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Style {
    pub fg: u8,
    pub bg: u8,
    pub flags: StyleFlags,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fg: 7,
            bg: 0,
            flags: StyleFlags::empty(),
        }
    }
}

impl Style {
    /// Pack into a single word: `flags << 16 | bg << 8 | fg`.
    pub fn pack(self) -> u32 {
        u32::from(self.fg) | u32::from(self.bg) << 8 | u32::from(self.flags.bits()) << 16
    }

    /// Inverse of [`Style::pack`]. Unknown effect bits are discarded.
    pub fn unpack(word: u32) -> Self {
        Self {
            fg: (word & 0xFF) as u8,
            bg: (word >> 8 & 0xFF) as u8,
            flags: StyleFlags::from_bits_truncate((word >> 16 & 0xFF) as u8),
        }
    }

    /// Foreground as a crossterm color, for the presentation layer.
    pub fn fg_color(&self) -> crossterm::style::Color {
        crossterm::style::Color::AnsiValue(self.fg)
    }

    /// Background as a crossterm color, for the presentation layer.
    pub fn bg_color(&self) -> crossterm::style::Color {
        crossterm::style::Color::AnsiValue(self.bg)
    }
}

/// A single character cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub style: Style,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            style: Style::default(),
        }
    }
}

type Row = Vec<Cell>;

/// Grid of cells with a bounded scrollback.
///
/// Invariants: `rows >= 1`, `cols >= 1`, and every row holds exactly `cols`
/// cells at all times. Resizes rebuild rows wholesale so a reader never
/// observes a partially-sized grid.
pub struct ScreenBuffer {
    cols: u16,
    rows: u16,
    grid: VecDeque<Row>,
    scrollback: VecDeque<Row>,
    scrollback_limit: usize,
}

impl ScreenBuffer {
    pub fn new(cols: u16, rows: u16, scrollback_limit: usize) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        Self {
            cols,
            rows,
            grid: (0..rows).map(|_| blank_row(cols)).collect(),
            scrollback: VecDeque::new(),
            scrollback_limit,
        }
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// Write one cell. Out-of-bounds writes are silently dropped.
    pub fn set(&mut self, col: u16, row: u16, ch: char, style: Style) {
        if col < self.cols && row < self.rows {
            self.grid[row as usize][col as usize] = Cell { ch, style };
        }
    }

    /// Read one character. Out-of-bounds reads yield a space.
    pub fn get(&self, col: u16, row: u16) -> char {
        self.cell(col, row).map(|c| c.ch).unwrap_or(' ')
    }

    /// Full cell access for styled readers.
    pub fn cell(&self, col: u16, row: u16) -> Option<&Cell> {
        self.grid
            .get(row as usize)
            .and_then(|r| r.get(col as usize))
    }

    /// Shift every row up by one. Row 0 moves into scrollback and a blank
    /// row appears at the bottom. Rows are rotated through the deques, so
    /// steady-state scrolling does not reallocate: once the scrollback is
    /// full its oldest row is recycled as the new bottom row.
    pub fn scroll_up_one_line(&mut self) {
        let Some(evicted) = self.grid.pop_front() else {
            return;
        };

        if self.scrollback_limit == 0 {
            let mut bottom = evicted;
            clear_row(&mut bottom);
            self.grid.push_back(bottom);
            return;
        }

        let recycled = if self.scrollback.len() >= self.scrollback_limit {
            self.scrollback.pop_front()
        } else {
            None
        };
        self.scrollback.push_back(evicted);

        let mut bottom = recycled.unwrap_or_default();
        bottom.clear();
        bottom.resize(self.cols as usize, Cell::default());
        self.grid.push_back(bottom);
    }

    /// Resize the grid, preserving the overlapping top-left rectangle and
    /// clearing everything outside it. Rows are rebuilt and swapped in
    /// wholesale; no partial-size state is ever observable.
    pub fn resize(&mut self, new_cols: u16, new_rows: u16) {
        let new_cols = new_cols.max(1);
        let new_rows = new_rows.max(1);
        if new_cols == self.cols && new_rows == self.rows {
            return;
        }

        let mut grid: VecDeque<Row> = VecDeque::with_capacity(new_rows as usize);
        for r in 0..new_rows as usize {
            let mut row = blank_row(new_cols);
            if let Some(old) = self.grid.get(r) {
                let keep = (new_cols as usize).min(old.len());
                row[..keep].copy_from_slice(&old[..keep]);
            }
            grid.push_back(row);
        }
        self.grid = grid;

        for row in &mut self.scrollback {
            row.resize(new_cols as usize, Cell::default());
        }

        self.cols = new_cols;
        self.rows = new_rows;
    }

    /// Reset every cell to a blank without changing geometry.
    pub fn clear(&mut self) {
        for row in &mut self.grid {
            clear_row(row);
        }
    }

    /// Visible row as a string, trailing blanks included.
    pub fn row_text(&self, row: u16) -> String {
        self.grid
            .get(row as usize)
            .map(|r| r.iter().map(|c| c.ch).collect())
            .unwrap_or_default()
    }

    pub fn scrollback_len(&self) -> usize {
        self.scrollback.len()
    }

    /// Scrollback row as a string, oldest first.
    pub fn scrollback_row_text(&self, index: usize) -> Option<String> {
        self.scrollback
            .get(index)
            .map(|r| r.iter().map(|c| c.ch).collect())
    }
}

fn blank_row(cols: u16) -> Row {
    vec![Cell::default(); cols as usize]
}

fn clear_row(row: &mut Row) {
    for cell in row.iter_mut() {
        *cell = Cell::default();
    }
}

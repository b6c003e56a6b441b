//! Built-in reference back-end: an in-memory row buffer flushed as ANSI.
//!
//! This is the smallest real back-end the harness ships with. Build applies
//! the payload to a fixed-size grid of rows (text wrapped across rows, one
//! list item per row) and marks the rows that changed; render emits cursor
//! moves and row contents for dirty rows only, batched through crossterm
//! `queue!` into a writer and flushed once. Styling is deliberately absent:
//! this harness compares update propagation cost, not paint cost.

use super::{Adapter, AdapterError};
use crate::workload::Payload;
use crossterm::{cursor, queue, style};
use smallvec::SmallVec;
use std::io::{self, Write};

/// Dirty row indices for one frame. Most frames touch few rows.
type DirtyRows = SmallVec<[u16; 32]>;

/// In-memory row-buffer back-end.
pub struct BufferAdapter {
    width: u16,
    height: u16,
    /// Row contents, each padded to exactly `width` characters.
    rows: Vec<String>,
    dirty: Vec<bool>,
    writer: Box<dyn Write>,
}

impl BufferAdapter {
    /// Create an adapter discarding its ANSI output.
    ///
    /// The escape sequences are still fully produced, so render cost is
    /// realistic without requiring a live terminal.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self::with_writer(width, height, Box::new(io::sink()))
    }

    /// Create an adapter flushing ANSI into a caller-supplied writer.
    #[must_use]
    pub fn with_writer(width: u16, height: u16, writer: Box<dyn Write>) -> Self {
        let blank = " ".repeat(width as usize);
        Self {
            width,
            height,
            rows: vec![blank; height as usize],
            dirty: vec![false; height as usize],
            writer,
        }
    }

    /// Replace row `y` and mark it dirty if the content changed.
    fn set_row(&mut self, y: u16, content: &str) {
        let Some(row) = self.rows.get_mut(y as usize) else {
            return;
        };
        let mut padded: String = content.chars().take(self.width as usize).collect();
        let pad = (self.width as usize).saturating_sub(padded.chars().count());
        padded.extend(std::iter::repeat(' ').take(pad));
        if *row != padded {
            *row = padded;
            self.dirty[y as usize] = true;
        }
    }

    /// Row content, for assertions in tests.
    #[must_use]
    pub fn row(&self, y: u16) -> Option<&str> {
        self.rows.get(y as usize).map(String::as_str)
    }
}

impl Adapter for BufferAdapter {
    fn build(&mut self, payload: &Payload) -> Result<(), AdapterError> {
        match payload {
            Payload::Text { value } => {
                // Wrap the text across rows from the top; blank the rest.
                let chars: Vec<char> = value.chars().collect();
                for y in 0..self.height {
                    let start = (y as usize) * (self.width as usize);
                    let line: String = chars
                        .get(start..)
                        .map(|rest| rest.iter().take(self.width as usize).collect())
                        .unwrap_or_default();
                    self.set_row(y, &line);
                }
            }
            Payload::List { items, .. } => {
                // One item per row, in list order; rows past the list blank.
                for y in 0..self.height {
                    match items.get(y as usize) {
                        Some(item) => {
                            let line = format!("{} {}", item.id, item.text);
                            self.set_row(y, &line);
                        }
                        None => self.set_row(y, ""),
                    }
                }
            }
        }
        Ok(())
    }

    fn render(&mut self) -> Result<(), AdapterError> {
        let dirty: DirtyRows = (0..self.height).filter(|y| self.dirty[*y as usize]).collect();
        for y in dirty {
            queue!(
                self.writer,
                cursor::MoveTo(0, y),
                style::Print(self.rows[y as usize].as_str())
            )?;
            self.dirty[y as usize] = false;
        }
        self.writer.flush()?;
        Ok(())
    }

    fn destroy(&mut self) {
        for (row, dirty) in self.rows.iter_mut().zip(&mut self.dirty) {
            row.clear();
            *dirty = false;
        }
        let _ = self.writer.flush();
    }
}

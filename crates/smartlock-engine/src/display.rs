//! Virtual character LCD.
//!
//! Models the lock's 16x2 I2C display: fixed-width lines padded with spaces,
//! text truncated at the right edge and restricted to printable ASCII since
//! the HD44780 character ROM has nothing else worth showing.
//!
//! # Examples
//!
//! ```
//! use smartlock_engine::VirtualDisplay;
//!
//! let mut display = VirtualDisplay::default();
//! display.show_message("ACCESS GRANTED", "").unwrap();
//!
//! assert_eq!(display.get_line(0).unwrap(), "ACCESS GRANTED  ");
//! assert_eq!(display.text(), "ACCESS GRANTED\n");
//! ```
//!
//! ```
//! use smartlock_engine::{Alignment, VirtualDisplay};
//!
//! let mut display = VirtualDisplay::new(2, 16);
//! display.set_line_aligned(1, "add or delete", Alignment::Right).unwrap();
//! assert_eq!(display.get_line(1).unwrap(), "   add or delete");
//! ```

use smartlock_core::constants::{DISPLAY_COLUMNS, DISPLAY_ROWS};

use crate::error::{EngineError, Result};

/// Text alignment within a display line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// Text starts at column 0, padded with spaces on the right.
    Left,
    /// Text centered (extra space on the right if odd).
    Center,
    /// Text ends at the last column.
    Right,
}

/// In-memory model of a character LCD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualDisplay {
    lines: usize,
    columns: usize,
    buffer: Vec<String>,
}

impl VirtualDisplay {
    /// Blank display of `lines` rows by `columns` characters.
    pub fn new(lines: usize, columns: usize) -> Self {
        Self {
            lines,
            columns,
            buffer: vec![" ".repeat(columns); lines],
        }
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Write left-aligned text to a line.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidLine` if `line` is out of range.
    pub fn set_line(&mut self, line: usize, text: &str) -> Result<()> {
        self.set_line_aligned(line, text, Alignment::Left)
    }

    pub fn set_line_aligned(&mut self, line: usize, text: &str, align: Alignment) -> Result<()> {
        self.check_line(line)?;
        let sanitized = sanitize_text(text);
        self.buffer[line] = align_text(&sanitized, self.columns, align);
        Ok(())
    }

    /// Set the first two lines.
    pub fn set_lines(&mut self, line1: &str, line2: &str) -> Result<()> {
        self.set_line(0, line1)?;
        self.set_line(1, line2)?;
        Ok(())
    }

    /// Clear the screen, then write both lines. Mirrors `lcd.clear()`
    /// followed by prints on each row.
    pub fn show_message(&mut self, line1: &str, line2: &str) -> Result<()> {
        self.clear();
        self.set_lines(line1, line2)
    }

    /// Fill every line with spaces.
    pub fn clear(&mut self) {
        for line in &mut self.buffer {
            *line = " ".repeat(self.columns);
        }
    }

    /// A line exactly `columns` characters wide.
    pub fn get_line(&self, line: usize) -> Result<&str> {
        self.check_line(line)?;
        Ok(&self.buffer[line])
    }

    pub fn get_all_lines(&self) -> Vec<&str> {
        self.buffer.iter().map(|s| s.as_str()).collect()
    }

    /// Lines with trailing padding removed, joined by newlines.
    pub fn text(&self) -> String {
        self.buffer
            .iter()
            .map(|line| line.trim_end())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_blank(&self) -> bool {
        self.buffer.iter().all(|line| line.trim().is_empty())
    }

    fn check_line(&self, line: usize) -> Result<()> {
        if line >= self.lines {
            return Err(EngineError::InvalidLine {
                line,
                max: self.lines.saturating_sub(1),
            });
        }
        Ok(())
    }
}

impl Default for VirtualDisplay {
    /// The lock's 16x2 display.
    fn default() -> Self {
        Self::new(DISPLAY_ROWS, DISPLAY_COLUMNS)
    }
}

impl std::fmt::Display for VirtualDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let border = "-".repeat(self.columns);
        writeln!(f, "+{border}+")?;
        for line in &self.buffer {
            writeln!(f, "|{line}|")?;
        }
        write!(f, "+{border}+")
    }
}

/// Keep at most `max_chars` characters.
///
/// ```
/// use smartlock_engine::truncate_text;
///
/// assert_eq!(truncate_text("Scan master card!", 16), "Scan master card");
/// assert_eq!(truncate_text("LOCKED", 16), "LOCKED");
/// ```
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Pad or truncate text to exactly `width` characters.
///
/// ```
/// use smartlock_engine::{align_text, Alignment};
///
/// assert_eq!(align_text("OK", 6, Alignment::Left), "OK    ");
/// assert_eq!(align_text("OK", 6, Alignment::Center), "  OK  ");
/// assert_eq!(align_text("OK", 6, Alignment::Right), "    OK");
/// ```
pub fn align_text(text: &str, width: usize, alignment: Alignment) -> String {
    let char_count = text.chars().count();

    if char_count >= width {
        return truncate_text(text, width);
    }

    let padding = width - char_count;

    match alignment {
        Alignment::Left => format!("{}{}", text, " ".repeat(padding)),
        Alignment::Right => format!("{}{}", " ".repeat(padding), text),
        Alignment::Center => {
            let left_pad = padding / 2;
            let right_pad = padding - left_pad;
            format!("{}{}{}", " ".repeat(left_pad), text, " ".repeat(right_pad))
        }
    }
}

/// Replace anything outside printable ASCII with `?` and drop control
/// characters.
fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control())
        .map(|c| if c.is_ascii() { c } else { '?' })
        .collect()
}

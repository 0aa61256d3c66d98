/// Raw-mode terminal output without the `\r` bookkeeping
use std::io::{stdout, Stdout, Write};

use crossterm::style::{Color, ResetColor, SetForegroundColor};
use crossterm::{cursor, terminal, QueueableCommand};

pub struct TerminalContext {
    out: Stdout,
}

impl Default for TerminalContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalContext {
    pub fn new() -> Self {
        Self { out: stdout() }
    }

    pub fn clear_screen(&mut self) -> std::io::Result<()> {
        self.out.queue(cursor::MoveTo(0, 0))?;
        self.out.queue(terminal::Clear(terminal::ClearType::All))?;
        Ok(())
    }

    pub fn print_line(&mut self, text: &str) -> std::io::Result<()> {
        write!(self.out, "{text}\r\n")
    }

    pub fn print_colored_line(&mut self, text: &str, color: Color) -> std::io::Result<()> {
        self.out.queue(SetForegroundColor(color))?;
        write!(self.out, "{text}\r\n")?;
        self.out.queue(ResetColor)?;
        Ok(())
    }

    pub fn empty_line(&mut self) -> std::io::Result<()> {
        write!(self.out, "\r\n")
    }

    pub fn print(&mut self, text: &str) -> std::io::Result<()> {
        write!(self.out, "{text}")
    }

    /// Call once at the end of a frame.
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.out.flush()
    }
}

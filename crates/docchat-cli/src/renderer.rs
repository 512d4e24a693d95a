use std::io::{self, Write};

use colored::Colorize;
use session_manager::Renderer;

/// Streams the transcript to a writer.
///
/// `render` only remembers the latest transcript; text is written out on
/// `scroll_to_bottom`, so a paused session holds output back until follow resumes.
pub struct TerminalRenderer<W: Write> {
    out: W,
    latest: String,
    printed: usize,
}

impl TerminalRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            latest: String::new(),
            printed: 0,
        }
    }

    /// Bytes of the transcript not yet written out.
    pub fn held_back(&self) -> usize {
        self.latest.len() - self.printed
    }

    fn restart(&mut self) {
        self.latest.clear();
        self.printed = 0;
    }

    fn status_line(&mut self, line: &str) {
        let _ = writeln!(self.out, "{}", line);
        let _ = self.out.flush();
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn render(&mut self, transcript: &str) {
        // A transcript that is not an extension of what we printed belongs to a new connection.
        if !transcript.starts_with(&self.latest[..self.printed]) {
            self.printed = 0;
        }
        self.latest.clear();
        self.latest.push_str(transcript);
    }

    fn render_connecting_state(&mut self) {
        self.restart();
        self.status_line(&"📡 Loading...".dimmed().to_string());
    }

    fn render_ready_state(&mut self) {
        self.restart();
        self.status_line(&"What can I help you accomplish?".cyan().to_string());
    }

    fn scroll_to_bottom(&mut self) {
        if let Some(unprinted) = self.latest.get(self.printed..) {
            let _ = write!(self.out, "{}", unprinted);
            let _ = self.out.flush();
        }
        self.printed = self.latest.len();
    }
}

//! Terminal transcript renderer.
//!
//! Streams the session's message list to stdout as it grows. Only the suffix
//! that arrived since the last snapshot is written, so a long response prints
//! as a continuous stream instead of being redrawn. Status notices go to
//! stderr so stdout stays a clean transcript.

use crate::session::{LinkStatus, SessionState, SessionView};
use crate::types::{ChatMessage, SenderType};
use crossterm::style::{Color, Print, PrintStyledContent, Stylize};
use crossterm::QueueableCommand;
use std::io::{self, Write};

/// A piece of transcript output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// A new message begins. `close_previous` is set when the prior line is still open.
    Start { sender: SenderType, close_previous: bool },
    Text(String),
    /// The list was replaced by a shorter one (reconnect).
    Reset,
}

#[derive(Debug, Clone)]
struct Printed {
    thread_id: String,
    len: usize,
}

/// Tracks what has been printed so far.
#[derive(Debug, Default)]
pub struct TranscriptRenderer {
    color: bool,
    printed: Vec<Printed>,
    open: bool,
    last_state: SessionState,
    last_link: LinkStatus,
}

impl TranscriptRenderer {
    pub fn new(color: bool) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    /// Compute the output needed to bring the screen up to `messages`.
    ///
    /// User turns are recorded silently; the terminal already shows what the
    /// user typed.
    pub fn diff(&mut self, messages: &[ChatMessage]) -> Vec<Chunk> {
        let mut out = Vec::new();
        let diverged = messages.len() < self.printed.len()
            || self
                .printed
                .iter()
                .zip(messages)
                .any(|(p, m)| p.thread_id != m.thread_id || m.message.len() < p.len);
        if diverged {
            self.printed.clear();
            self.open = false;
            out.push(Chunk::Reset);
        }

        for (i, message) in messages.iter().enumerate() {
            if let Some(seen) = self.printed.get_mut(i) {
                let fresh = message.message.get(seen.len..).unwrap_or("");
                if !fresh.is_empty() {
                    seen.len = message.message.len();
                    if message.sender != SenderType::User {
                        out.push(Chunk::Text(fresh.to_string()));
                    }
                }
                continue;
            }

            self.printed.push(Printed {
                thread_id: message.thread_id.clone(),
                len: message.message.len(),
            });
            if message.sender == SenderType::User {
                if self.open {
                    out.push(Chunk::Text("\n".into()));
                    self.open = false;
                }
                continue;
            }
            out.push(Chunk::Start {
                sender: message.sender,
                close_previous: self.open,
            });
            self.open = true;
            if !message.message.is_empty() {
                out.push(Chunk::Text(message.message.clone()));
            }
        }
        out
    }

    /// Write whatever changed in `view` to `out`.
    pub fn render(&mut self, out: &mut impl Write, view: &SessionView) -> io::Result<()> {
        for chunk in self.diff(&view.messages) {
            match chunk {
                Chunk::Reset => {
                    out.queue(Print("\n"))?;
                    self.styled(out, "── conversation restarted ──\n", Color::DarkGrey)?;
                }
                Chunk::Start {
                    sender,
                    close_previous,
                } => {
                    if close_previous {
                        out.queue(Print("\n"))?;
                    }
                    let label = match sender {
                        SenderType::AnonymousAgent => "draft> ",
                        _ => "agent> ",
                    };
                    self.styled(out, label, Color::Cyan)?;
                }
                Chunk::Text(text) => {
                    out.queue(Print(text))?;
                }
            }
        }
        if self.open && !view.receiving {
            out.queue(Print("\n"))?;
            self.open = false;
        }
        out.flush()
    }

    /// Describe a state or link change since the last call, if any.
    pub fn status_change(&mut self, view: &SessionView) -> Option<String> {
        let mut notes = Vec::new();
        if view.state != self.last_state {
            self.last_state = view.state;
            notes.push(format!("session {}", view.state.label()));
        }
        if view.link != self.last_link {
            self.last_link = view.link;
            notes.push(match view.link {
                LinkStatus::Locking => "connection locked, redialing".to_string(),
                LinkStatus::Online => "connection restored".to_string(),
            });
        }
        if notes.is_empty() {
            None
        } else {
            Some(notes.join("; "))
        }
    }

    /// Write a dim notice line to stderr.
    pub fn notice(&self, text: &str) -> io::Result<()> {
        let mut err = io::stderr();
        self.styled(&mut err, &format!("[{text}]\n"), Color::DarkGrey)?;
        err.flush()
    }

    /// Write an error line to stderr.
    pub fn error(&self, text: &str) -> io::Result<()> {
        let mut err = io::stderr();
        self.styled(&mut err, &format!("error: {text}\n"), Color::Red)?;
        err.flush()
    }

    fn styled(&self, out: &mut impl Write, text: &str, color: Color) -> io::Result<()> {
        if self.color {
            out.queue(PrintStyledContent(text.with(color)))?;
        } else {
            out.queue(Print(text))?;
        }
        Ok(())
    }
}

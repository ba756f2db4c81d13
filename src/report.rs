//! Human-readable diagnostic blocks for the debug log.
//!
//! The layout is for people reading logs, not for parsers:
//!
//! ```text
//! ---------------------------------
//! | New item added in queue 'q'   |
//! | Size of the queue : 3         |
//! ---------------------------------
//! ```

use crate::entry::Entry;
use std::fmt;

const LINE_PREFIX: &str = "| ";
const LINE_SUFFIX: &str = " |";

/// Surround a multi-line message with a box.
pub(crate) fn framed(message: &str) -> String {
    let width = message.lines().map(|l| l.chars().count()).max().unwrap_or(0);
    let edge = "-".repeat(width + LINE_PREFIX.len() + LINE_SUFFIX.len());

    let mut out = String::with_capacity((edge.len() + 1) * (message.lines().count() + 3));
    out.push('\n');
    out.push_str(&edge);
    out.push('\n');
    for line in message.lines() {
        let pad = width - line.chars().count();
        out.push_str(LINE_PREFIX);
        out.push_str(line);
        out.extend(std::iter::repeat_n(' ', pad));
        out.push_str(LINE_SUFFIX);
        out.push('\n');
    }
    out.push_str(&edge);
    out
}

/// Sizes reported alongside every queue event.
pub(crate) struct Sizes {
    pub trail: usize,
    pub store: Option<usize>,
    pub max_size: usize,
}

impl fmt::Display for Sizes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Size of the queue : {}", self.trail)?;
        match self.store {
            Some(n) => writeln!(f, "Size of the assigned store : {n}")?,
            None => writeln!(f, "Size of the assigned store : none")?,
        }
        write!(f, "Max size of the assigned store : {}", self.max_size)
    }
}

pub(crate) fn added<K: fmt::Debug>(queue: &str, entry: &Entry<K>, sizes: &Sizes) -> String {
    framed(&format!("New item added in the queue '{queue}' : {entry}\n{sizes}"))
}

pub(crate) fn removed<K: fmt::Debug>(queue: &str, entry: &Entry<K>, sizes: &Sizes) -> String {
    framed(&format!("Row removed through the queue '{queue}' : {entry}\n{sizes}"))
}

pub(crate) fn assigned(queue: &str, sizes: &Sizes) -> String {
    framed(&format!("New store assigned to the queue '{queue}'\n{sizes}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framed_pads_every_line_to_the_same_width() {
        let out = framed("short\na longer line");
        let lines: Vec<&str> = out.lines().skip(1).collect();
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().all(|l| l.len() == lines[0].len()));
        assert_eq!(lines[1], "| short         |");
        assert_eq!(lines[0], "-".repeat(17));
    }
}

//! Repository list parsing and mirror naming
//!
//! The list file is line-oriented: blank lines and lines starting with `#`
//! are ignored, every other line is a remote URL used verbatim.

use std::io::BufRead;

use log::warn;

/// Classification of one list line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListLine {
    /// Blank line or `#` comment
    Ignored,
    /// A repository URL
    Url(String),
}

/// Classify a line. Exactly one trailing `\n` is stripped; everything else,
/// including a `\r`, is kept.
pub fn parse_line(line: &str) -> ListLine {
    let line = line.strip_suffix('\n').unwrap_or(line);
    if line.is_empty() || line.starts_with('#') {
        ListLine::Ignored
    } else {
        ListLine::Url(line.to_string())
    }
}

/// Directory name for the mirror of `url`: the final path component with
/// one trailing `.git` removed.
///
/// Trailing slashes are ignored, as POSIX `basename` does. Returns `None`
/// when the result is empty, `.` or `..`, which would otherwise point at
/// the mirror root or its parent.
pub fn mirror_name(url: &str) -> Option<String> {
    let trimmed = url.trim_end_matches('/');
    let base = match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    };
    let name = base.strip_suffix(".git").unwrap_or(base);
    match name {
        "" | "." | ".." => None,
        _ => Some(name.to_string()),
    }
}

/// Iterator over the URLs of a list, in file order.
///
/// Reads line by line with no length limit. Lines that are not valid UTF-8
/// are logged and skipped; a read error ends the iteration after being
/// yielded.
pub struct ListReader<R> {
    reader: R,
    buf: Vec<u8>,
    lineno: usize,
    done: bool,
}

impl<R: BufRead> ListReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            lineno: 0,
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for ListReader<R> {
    type Item = std::io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    self.lineno += 1;
                    let Ok(line) = std::str::from_utf8(&self.buf) else {
                        warn!("Skipping line {}: not valid UTF-8", self.lineno);
                        continue;
                    };
                    if let ListLine::Url(url) = parse_line(line) {
                        return Some(Ok(url));
                    }
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

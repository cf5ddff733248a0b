//! Here-document tracking.
//!
//! Grounded in the content-scanning approach of `here_doc_content` in the
//! teacher's `yash-syntax` lexer (delimiter unquoting, line-by-line
//! comparison, tab stripping for the `<<-` form), adapted to the external
//! scanner's call-by-call model: instead of looping to completion inside
//! one function, each call to [`crate::scanner::Scanner::scan`] advances
//! through at most one line (or one expansion boundary) of heredoc body
//! and returns control to the host.

use std::collections::VecDeque;

/// A single pending or in-progress here-document.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Heredoc {
    /// The body is not interpolated: the delimiter was quoted or
    /// escaped on the operator line (e.g. `<<'EOF'`, `<<\EOF`).
    pub is_raw: bool,
    /// The body has begun emitting content tokens.
    pub started: bool,
    /// Leading tabs are stripped from each body line (the `<<-` form).
    pub allows_indent: bool,
    /// The word that closes the body, already unquoted.
    pub delimiter: Vec<u8>,
}

impl Heredoc {
    /// Creates a heredoc record for a newly seen `<<` or `<<-` operator.
    #[must_use]
    pub fn new(allows_indent: bool) -> Self {
        Heredoc {
            is_raw: false,
            started: false,
            allows_indent,
            delimiter: Vec::new(),
        }
    }

    /// Tests whether `line`, after stripping leading tabs when
    /// [`allows_indent`](Self::allows_indent) is set, equals the
    /// delimiter exactly.
    #[must_use]
    pub fn line_closes_body(&self, line: &[u8]) -> bool {
        let candidate = if self.allows_indent {
            let stripped = line.iter().take_while(|&&b| b == b'\t').count();
            &line[stripped..]
        } else {
            line
        };
        candidate == self.delimiter.as_slice()
    }
}

/// FIFO of pending here-document bodies, ordered by the order their
/// `<<`/`<<-` operators were encountered on the command line.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct HeredocQueue {
    queue: VecDeque<Heredoc>,
}

impl HeredocQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        HeredocQueue {
            queue: VecDeque::new(),
        }
    }

    /// Appends a newly opened heredoc to the back of the queue (it will
    /// be the last one to have its body read).
    pub fn push_pending(&mut self, heredoc: Heredoc) {
        self.queue.push_back(heredoc);
    }

    /// Returns the heredoc whose body should be read next, if any.
    #[must_use]
    pub fn front(&self) -> Option<&Heredoc> {
        self.queue.front()
    }

    /// Returns a mutable reference to the heredoc whose body should be
    /// read next, if any.
    #[must_use]
    pub fn front_mut(&mut self) -> Option<&mut Heredoc> {
        self.queue.front_mut()
    }

    /// Returns a mutable reference to the most recently pushed heredoc,
    /// the one awaiting its delimiter word right after a `<<`/`<<-`
    /// operator.
    #[must_use]
    pub fn back_mut(&mut self) -> Option<&mut Heredoc> {
        self.queue.back_mut()
    }

    /// Removes the front heredoc, after its end delimiter has been
    /// matched.
    pub fn pop_front(&mut self) -> Option<Heredoc> {
        self.queue.pop_front()
    }

    /// True if there is at least one pending heredoc.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Number of heredocs currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True if no heredocs are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Iterates front-to-back, for serialization.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Heredoc> {
        self.queue.iter()
    }
}

impl FromIterator<Heredoc> for HeredocQueue {
    fn from_iter<I: IntoIterator<Item = Heredoc>>(iter: I) -> Self {
        HeredocQueue {
            queue: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_closes_body_exact_match() {
        let mut h = Heredoc::new(false);
        h.delimiter = b"EOF".to_vec();
        assert!(h.line_closes_body(b"EOF"));
        assert!(!h.line_closes_body(b"EOF "));
        assert!(!h.line_closes_body(b"\tEOF"));
    }

    #[test]
    fn line_closes_body_strips_tabs_when_indent_allowed() {
        let mut h = Heredoc::new(true);
        h.delimiter = b"EOF".to_vec();
        assert!(h.line_closes_body(b"\t\tEOF"));
        assert!(h.line_closes_body(b"EOF"));
        assert!(!h.line_closes_body(b" EOF")); // a space is not a tab
    }

    #[test]
    fn queue_is_fifo() {
        let mut q = HeredocQueue::new();
        let mut first = Heredoc::new(false);
        first.delimiter = b"A".to_vec();
        let mut second = Heredoc::new(false);
        second.delimiter = b"B".to_vec();
        q.push_pending(first);
        q.push_pending(second);

        assert_eq!(q.front().unwrap().delimiter, b"A");
        let popped = q.pop_front().unwrap();
        assert_eq!(popped.delimiter, b"A");
        assert_eq!(q.front().unwrap().delimiter, b"B");
    }
}

//! Anchor patterns over raw byte slices.
//!
//! The save format is located by literal byte anchors (names, labels,
//! record tags), so a handful of fixed shapes is all that is ever
//! needed: literal bytes, a bounded "any bytes" run, an alternation of
//! literals, and a run of a byte class. Matching is leftmost-first;
//! callers constrain the search window to disambiguate repeated
//! literals elsewhere in the buffer.

/// A half-open byte range `[start, end)` into the buffer. Spans are
/// recomputed by every operation, never cached across edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn slice<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        &buf[self.start..self.end]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteClass {
    Alnum,
    Digit,
}

impl ByteClass {
    fn matches(self, b: u8) -> bool {
        match self {
            ByteClass::Alnum => b.is_ascii_alphanumeric(),
            ByteClass::Digit => b.is_ascii_digit(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Pat {
    /// Exact byte sequence.
    Lit(Vec<u8>),
    /// One of several exact byte sequences, tried in order.
    Alt(Vec<Vec<u8>>),
    /// Zero to `max` arbitrary bytes; the shortest run that lets the
    /// rest of the pattern match wins.
    Any { max: usize },
    /// A greedy run of bytes from `class`, at least `min` long. Backs
    /// off so a trailing literal drawn from the same class (such as an
    /// `ID` suffix after an alphanumeric name) can still match.
    Run { class: ByteClass, min: usize },
}

impl Pat {
    pub fn lit(bytes: impl AsRef<[u8]>) -> Pat {
        Pat::Lit(bytes.as_ref().to_vec())
    }
}

#[derive(Debug)]
pub struct Match {
    pub span: Span,
    /// Byte range each token of the pattern consumed, in pattern order.
    /// Lets callers recover what a wildcard or class run landed on.
    pub token_spans: Vec<Span>,
}

#[derive(Debug, Clone)]
pub struct Pattern {
    tokens: Vec<Pat>,
}

impl Pattern {
    pub fn new(tokens: Vec<Pat>) -> Self {
        Pattern { tokens }
    }

    /// First (leftmost) match whose start lies inside `window`. The
    /// match itself may extend past `window.end` but not past the
    /// buffer.
    pub fn find(&self, buf: &[u8], window: Span) -> Option<Match> {
        let last_start = window.end.min(buf.len());
        for start in window.start..=last_start {
            let mut spans = Vec::with_capacity(self.tokens.len());
            if match_tokens(buf, &self.tokens, 0, start, &mut spans) {
                let end = spans.last().map(|s| s.end).unwrap_or(start);
                return Some(Match {
                    span: Span::new(start, end),
                    token_spans: spans,
                });
            }
        }
        None
    }

    pub fn find_from(&self, buf: &[u8], start: usize) -> Option<Match> {
        self.find(buf, Span::new(start, buf.len()))
    }
}

fn match_tokens(
    buf: &[u8],
    tokens: &[Pat],
    idx: usize,
    pos: usize,
    spans: &mut Vec<Span>,
) -> bool {
    let Some(token) = tokens.get(idx) else {
        return true;
    };

    match token {
        Pat::Lit(lit) => {
            if buf.len() - pos >= lit.len() && &buf[pos..pos + lit.len()] == lit.as_slice() {
                spans.push(Span::new(pos, pos + lit.len()));
                if match_tokens(buf, tokens, idx + 1, pos + lit.len(), spans) {
                    return true;
                }
                spans.pop();
            }
            false
        }
        Pat::Alt(alts) => {
            for lit in alts {
                if buf.len() - pos >= lit.len() && &buf[pos..pos + lit.len()] == lit.as_slice() {
                    spans.push(Span::new(pos, pos + lit.len()));
                    if match_tokens(buf, tokens, idx + 1, pos + lit.len(), spans) {
                        return true;
                    }
                    spans.pop();
                }
            }
            false
        }
        Pat::Any { max } => {
            let limit = (*max).min(buf.len() - pos);
            for len in 0..=limit {
                spans.push(Span::new(pos, pos + len));
                if match_tokens(buf, tokens, idx + 1, pos + len, spans) {
                    return true;
                }
                spans.pop();
            }
            false
        }
        Pat::Run { class, min } => {
            let mut run = 0usize;
            while pos + run < buf.len() && class.matches(buf[pos + run]) {
                run += 1;
            }
            if run < *min {
                return false;
            }
            let mut len = run;
            loop {
                spans.push(Span::new(pos, pos + len));
                if match_tokens(buf, tokens, idx + 1, pos + len, spans) {
                    return true;
                }
                spans.pop();
                if len == *min {
                    return false;
                }
                len -= 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whole(buf: &[u8]) -> Span {
        Span::new(0, buf.len())
    }

    #[test]
    fn finds_leftmost_literal() {
        let buf = b"..GoldDonated..GoldDonated";
        let pat = Pattern::new(vec![Pat::lit(b"GoldDonated")]);
        let m = pat.find(buf, whole(buf)).unwrap();
        assert_eq!(m.span, Span::new(2, 13));
    }

    #[test]
    fn window_constrains_the_start() {
        let buf = b"..GoldDonated..GoldDonated";
        let pat = Pattern::new(vec![Pat::lit(b"GoldDonated")]);
        let m = pat.find(buf, Span::new(5, buf.len())).unwrap();
        assert_eq!(m.span.start, 15);
    }

    #[test]
    fn any_is_non_greedy() {
        let buf = b"name....ID..ID";
        let pat = Pattern::new(vec![
            Pat::lit(b"name"),
            Pat::Any { max: 32 },
            Pat::lit(b"ID"),
        ]);
        let m = pat.find(buf, whole(buf)).unwrap();
        // Stops at the first ID, not the second.
        assert_eq!(m.span.end, 10);
        assert_eq!(m.token_spans[1], Span::new(4, 8));
    }

    #[test]
    fn run_backs_off_for_a_trailing_literal_in_class() {
        // The alnum run must give back the final "ID".
        let buf = b"Event_City_Campaign_42ID\x06";
        let pat = Pattern::new(vec![
            Pat::lit(b"Event_City_Campaign_"),
            Pat::Run {
                class: ByteClass::Alnum,
                min: 0,
            },
            Pat::lit(b"ID"),
        ]);
        let m = pat.find(buf, whole(buf)).unwrap();
        assert_eq!(m.token_spans[1].slice(buf), b"42");
        assert_eq!(m.span.end, 24);
    }

    #[test]
    fn alt_matches_any_of_its_literals() {
        let buf = b"\x18Event_";
        let pat = Pattern::new(vec![
            Pat::Alt(vec![vec![0x17], vec![0x18]]),
            Pat::lit(b"Event_"),
        ]);
        assert!(pat.find(buf, whole(buf)).is_some());
    }

    #[test]
    fn run_shorter_than_min_fails() {
        let buf = b"Quest_Campaign_07x";
        let pat = Pattern::new(vec![
            Pat::lit(b"Quest_Campaign_"),
            Pat::Run {
                class: ByteClass::Digit,
                min: 3,
            },
        ]);
        assert!(pat.find(buf, whole(buf)).is_none());
    }

    #[test]
    fn absent_pattern_yields_none() {
        let buf = b"nothing to see";
        let pat = Pattern::new(vec![Pat::lit(b"GoldDonated")]);
        assert!(pat.find(buf, whole(buf)).is_none());
    }
}

/// A position in the source text, cheap to save and restore.
#[derive(Debug, Clone, Copy)]
pub struct CursorSnapshot {
    position: usize,
    line: u32,
}

/// Walks a source string one character at a time, tracking byte position
/// and line number. ASCII is the common case for AtomC source and is
/// handled without going through `char` at all; non-ASCII bytes fall back
/// to decoding a `char` so identifiers and comments may still contain
/// multi-byte UTF-8 without corrupting the position count.
pub struct Cursor<'a> {
    source: &'a str,
    position: usize,
    line: u32,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            position: 0,
            line: 1,
        }
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.source.len()
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn current_char(&self) -> Option<char> {
        self.char_at(self.position)
    }

    pub fn peek_char(&self) -> Option<char> {
        let (_, len) = self.char_at_with_len(self.position)?;
        self.char_at(self.position + len)
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        self.char_at_with_len(offset).map(|(c, _)| c)
    }

    fn char_at_with_len(&self, offset: usize) -> Option<(char, usize)> {
        let bytes = self.source.as_bytes();
        let b = *bytes.get(offset)?;
        if b < 128 {
            Some((b as char, 1))
        } else {
            let c = self.source[offset..].chars().next()?;
            Some((c, c.len_utf8()))
        }
    }

    /// Consumes and returns the current character, advancing the line
    /// counter on `\n`.
    pub fn advance(&mut self) -> Option<char> {
        let (c, len) = self.char_at_with_len(self.position)?;
        self.position += len;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    pub fn snapshot(&self) -> CursorSnapshot {
        CursorSnapshot {
            position: self.position,
            line: self.line,
        }
    }

    pub fn restore(&mut self, snapshot: CursorSnapshot) {
        self.position = snapshot.position;
        self.line = snapshot.line;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_through_ascii() {
        let mut c = Cursor::new("ab");
        assert_eq!(c.advance(), Some('a'));
        assert_eq!(c.advance(), Some('b'));
        assert_eq!(c.advance(), None);
        assert!(c.is_at_end());
    }

    #[test]
    fn tracks_line_number_across_newlines() {
        let mut c = Cursor::new("a\nb\nc");
        assert_eq!(c.line(), 1);
        c.advance(); // a
        c.advance(); // \n
        assert_eq!(c.line(), 2);
        c.advance(); // b
        c.advance(); // \n
        assert_eq!(c.line(), 3);
    }

    #[test]
    fn snapshot_restore_round_trips() {
        let mut c = Cursor::new("abcd");
        c.advance();
        c.advance();
        let snap = c.snapshot();
        c.advance();
        c.advance();
        assert!(c.is_at_end());
        c.restore(snap);
        assert_eq!(c.current_char(), Some('c'));
    }

    #[test]
    fn handles_multibyte_utf8_in_comments() {
        let mut c = Cursor::new("é//ok");
        assert_eq!(c.advance(), Some('é'));
        assert_eq!(c.position(), 2);
    }
}

/// Caches the byte offsets of newlines in an input so that byte offsets (e.g. from a
/// [`Span`](crate::Span)) can be cheaply turned into human friendly line and column numbers.
pub struct NewlineCache {
    /// The byte offset of the start of each line. The first line always starts at 0.
    line_starts: Vec<usize>,
    /// Total number of bytes fed so far.
    len: usize,
}

impl Default for NewlineCache {
    fn default() -> Self {
        NewlineCache {
            line_starts: vec![0],
            len: 0,
        }
    }
}

impl NewlineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache from a complete input.
    pub fn from_input(src: &str) -> Self {
        let mut nlc = Self::default();
        nlc.feed(src);
        nlc
    }

    /// Feed more input into the cache. Successive calls are treated as if their `src`s were
    /// concatenated.
    pub fn feed(&mut self, src: &str) {
        let base = self.len;
        self.line_starts.extend(
            src.bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| base + i + 1),
        );
        self.len += src.len();
    }

    /// Convert a byte offset into a 1-based line number, or `None` if `byte` is beyond the
    /// input fed so far.
    pub fn byte_to_line_num(&self, byte: usize) -> Option<usize> {
        if byte > self.len {
            return None;
        }
        match self.line_starts.binary_search(&byte) {
            Ok(i) => Some(i + 1),
            Err(i) => Some(i),
        }
    }

    /// Convert a byte offset into 1-based `(line, column)` numbers, where columns count
    /// characters rather than bytes. `src` must be the concatenation of everything fed to the
    /// cache.
    pub fn byte_to_line_and_col(&self, src: &str, byte: usize) -> Option<(usize, usize)> {
        if src.len() != self.len || !src.is_char_boundary(byte.min(src.len())) {
            return None;
        }
        let line = self.byte_to_line_num(byte)?;
        let line_start = self.line_starts[line - 1];
        Some((line, src[line_start..byte].chars().count() + 1))
    }
}

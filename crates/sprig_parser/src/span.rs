use std::fmt::Display;

/// A byte offset into the source text
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BytePos(usize);

impl BytePos {
    pub fn new(pos: usize) -> Self {
        BytePos(pos)
    }

    /// Advance past the given character
    pub fn shift(self, ch: char) -> Self {
        BytePos(self.0 + ch.len_utf8())
    }

    pub fn offset(self) -> usize {
        self.0
    }
}

impl Display for BytePos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A half-open range `[start, end)` of the source text
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    start: BytePos,
    end: BytePos,
}

impl Span {
    pub fn new(start: BytePos, end: BytePos) -> Span {
        Span { start, end }
    }

    pub fn start(&self) -> BytePos {
        self.start
    }

    pub fn end(&self) -> BytePos {
        self.end
    }

    /// Slice the part of `source` covered by this span
    pub fn slice<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.start.offset()..self.end.offset())
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithSpan<T> {
    pub value: T,
    pub span: Span,
}

impl<T> WithSpan<T> {
    pub fn new(value: T, span: Span) -> WithSpan<T> {
        WithSpan { value, span }
    }
}

/// Byte offset in source code.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Pos(u32);

impl Pos {
    pub fn new(offset: u32) -> Self {
        Self(offset)
    }

    pub fn offset(self) -> u32 {
        self.0
    }
}

/// A byte range in source code, carried by tokens and diagnostics.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Span {
    start: Pos,
    end: Pos,
}

impl Span {
    /// Span for diagnostics with no source position.
    pub const DUMMY: Span = Span {
        start: Pos(0),
        end: Pos(0),
    };

    pub fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    pub fn start(self) -> Pos {
        self.start
    }

    pub fn end(self) -> Pos {
        self.end
    }
}

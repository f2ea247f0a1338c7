//! Small value types shared across the crate.

/// A range in surface text, measured in character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

impl Range {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn caret(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalize range so start <= end.
    pub fn normalize(self) -> Self {
        if self.start <= self.end {
            self
        } else {
            Self {
                start: self.end,
                end: self.start,
            }
        }
    }
}

impl From<std::ops::Range<usize>> for Range {
    fn from(r: std::ops::Range<usize>) -> Self {
        Self::new(r.start, r.end)
    }
}

impl From<Range> for std::ops::Range<usize> {
    fn from(r: Range) -> Self {
        r.start..r.end
    }
}

/// On-screen rectangle in viewport (client) coordinates, CSS px.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CaretRect {
    pub left: f64,
    pub top: f64,
    pub bottom: f64,
}

impl CaretRect {
    pub fn new(left: f64, top: f64, bottom: f64) -> Self {
        Self { left, top, bottom }
    }
}

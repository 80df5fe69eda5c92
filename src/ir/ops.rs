//! # Print Directives
//!
//! A fax is rendered into an ordered sequence of directives against the
//! printer interface before any byte reaches the device:
//!
//! ```text
//! FaxJob → Program (Vec<Op>, inspectable) → Device (ESC/POS bytes)
//! ```
//!
//! Each opcode is a single atomic printer operation, so a rendered job can be
//! compared in tests without decoding ESC/POS.

use crate::protocol::commands::Font;

/// Print directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Initialize printer (ESC @). Resets to default state.
    Init,

    /// Set line spacing in motion units, `None` restores the default.
    SetLineSpacing(Option<u8>),

    /// Select a font.
    SetFont(Font),

    /// Reset font and text styling to the printer defaults.
    ResetStyle,

    /// One line of text, already restricted to the printer repertoire.
    /// A line feed is emitted after it.
    TextLine(String),

    /// Line feed.
    Newline,

    /// Monochrome raster image, rows packed MSB-first.
    /// `data.len()` is `ceil(width / 8) * height`.
    Raster {
        width: u16,
        height: u16,
        data: Vec<u8>,
    },

    /// Feed to the cutter and cut.
    Cut,
}

impl Op {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Op::Init => "init",
            Op::SetLineSpacing(_) => "line-spacing",
            Op::SetFont(_) => "font",
            Op::ResetStyle => "reset-style",
            Op::TextLine(_) => "text",
            Op::Newline => "newline",
            Op::Raster { .. } => "raster",
            Op::Cut => "cut",
        }
    }
}

/// A rendered print program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub ops: Vec<Op>,
}

impl Program {
    /// Create an empty program.
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Add an op to the program.
    pub fn push(&mut self, op: Op) {
        self.ops.push(op);
    }

    /// Add multiple ops to the program.
    pub fn extend(&mut self, ops: impl IntoIterator<Item = Op>) {
        self.ops.extend(ops);
    }

    /// Get the number of ops in the program.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check if the program is empty.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Iterate over ops.
    pub fn iter(&self) -> impl Iterator<Item = &Op> {
        self.ops.iter()
    }

    /// Text of every `TextLine`, in order.
    pub fn text_lines(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::TextLine(line) => Some(line.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Dimensions of the first raster image, if any.
    pub fn raster_size(&self) -> Option<(u16, u16)> {
        self.ops.iter().find_map(|op| match op {
            Op::Raster { width, height, .. } => Some((*width, *height)),
            _ => None,
        })
    }
}

impl FromIterator<Op> for Program {
    fn from_iter<T: IntoIterator<Item = Op>>(iter: T) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Program {
    type Item = Op;
    type IntoIter = std::vec::IntoIter<Op>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Op;
    type IntoIter = std::slice::Iter<'a, Op>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_new() {
        let program = Program::new();
        assert!(program.is_empty());
    }

    #[test]
    fn test_program_push() {
        let mut program = Program::new();
        program.push(Op::Init);
        program.push(Op::SetFont(Font::B));
        program.push(Op::TextLine("Hello".into()));
        assert_eq!(program.len(), 3);
    }

    #[test]
    fn test_text_lines() {
        let program: Program = [
            Op::TextLine("one".into()),
            Op::Newline,
            Op::TextLine("two".into()),
        ]
        .into_iter()
        .collect();
        assert_eq!(program.text_lines(), vec!["one", "two"]);
        assert_eq!(program.raster_size(), None);
    }

    #[test]
    fn test_raster_size() {
        let program: Program = [Op::Raster {
            width: 8,
            height: 2,
            data: vec![0, 0],
        }]
        .into_iter()
        .collect();
        assert_eq!(program.raster_size(), Some((8, 2)));
    }
}

//! # Print Directives (IR)
//!
//! The layer between a rendered fax and raw ESC/POS bytes.
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────┐
//! │   FaxJob    │ ──► │   Program   │ ──► │ Codegen  │
//! │  (render)   │     │  (Vec<Op>)  │     │ (bytes)  │
//! └─────────────┘     └─────────────┘     └──────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use directslip::ir::{Op, Program};
//! use directslip::protocol::commands::Font;
//!
//! let mut program = Program::new();
//! program.push(Op::SetFont(Font::B));
//! program.push(Op::TextLine("HELLO".into()));
//! program.push(Op::Cut);
//!
//! let bytes = program.to_bytes();
//! assert!(!bytes.is_empty());
//! ```

mod codegen;
mod ops;

pub use ops::*;

//! Key chords for editor keymaps.
//!
//! Chords are written as `-`-separated modifiers followed by a key name, e.g.
//! `Mod-Shift-b` or `Ctrl--`. Parsing normalizes modifier aliases and key name
//! casing so that two spellings of one chord compare equal.

pub use chord::KeyChord;
pub use modifiers::{Modifiers, Platform};
pub use parser::ParseError;

mod chord;
mod modifiers;
mod parser;

//! A rich-text document kept as a tree of Blocks, Words and Characters.
//!
//! Every edit goes through [`Document::insert_chars_at`] or
//! [`Document::remove_chars_at`] (or the per-node handles) and leaves the tree
//! normalized: a Word ends in at most one separator, a Block ends in a
//! newline, and the flat character index mirrors the tree in order.

pub mod block;
pub mod character;
pub mod document;
pub mod render;
pub mod separator;
pub mod sync;
pub mod theme;
pub mod tree;
pub mod word;

pub use block::{Block, BlockId, BlockMut, BlockRef, BlockType};
pub use character::{CharId, Character};
pub use document::{Document, Removal, Selection};
pub use sync::{SyncReport, sync_text};
pub use tree::{TreeChild, TreeNode};
pub use word::{Word, WordId, WordMut, WordRef};

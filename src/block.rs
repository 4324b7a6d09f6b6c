use std::{fmt, mem, ops::Deref};

use log::debug;

use crate::character::CharId;
use crate::document::{Anchor, Document, Removal};
use crate::separator::BLOCK_NAMES;
use crate::tree::TreeNode;
use crate::word::{Word, WordId, WordRef};

slotmap::new_key_type! {
    pub struct BlockId;
}

/// Block-level element name. Only names from [`BLOCK_NAMES`] are accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockType(&'static str);

impl BlockType {
    pub const PARAGRAPH: Self = Self("p");
    pub const BLOCKQUOTE: Self = Self("blockquote");
    pub const PREFORMATTED: Self = Self("pre");
    pub const LIST_ITEM: Self = Self("li");

    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        BLOCK_NAMES
            .iter()
            .find(|candidate| candidate.eq_ignore_ascii_case(name))
            .map(|candidate| Self(*candidate))
    }

    pub fn heading(level: u8) -> Option<Self> {
        match level {
            1..=6 => Self::parse(&format!("h{level}")),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    pub fn heading_level(&self) -> Option<u8> {
        match self.0.as_bytes() {
            [b'h', level @ b'1'..=b'6'] => Some(level - b'0'),
            _ => None,
        }
    }
}

impl Default for BlockType {
    fn default() -> Self {
        Self::PARAGRAPH
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A run of Words ending in a newline (or, for the last Block, in the
/// terminator).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Block {
    pub(crate) words: Vec<WordId>,
    pub(crate) attached: bool,
    kind: BlockType,
}

impl Block {
    pub fn get_words(&self) -> &[WordId] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn kind(&self) -> BlockType {
        self.kind
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn position(&self, word: WordId) -> Option<usize> {
        self.words.iter().position(|candidate| *candidate == word)
    }

    pub(crate) fn set_kind(&mut self, kind: BlockType) {
        self.kind = kind;
    }
}

#[derive(Clone, Copy)]
pub struct BlockRef<'a> {
    doc: &'a Document,
    id: BlockId,
    block: &'a Block,
}

impl<'a> BlockRef<'a> {
    pub(crate) fn new(doc: &'a Document, id: BlockId) -> Option<Self> {
        let block = doc.block_nodes.get(id)?;
        Some(Self { doc, id, block })
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn words(&self) -> impl Iterator<Item = WordRef<'a>> + 'a {
        let doc = self.doc;
        self.block
            .words
            .iter()
            .filter_map(move |word| doc.word(*word))
    }

    pub fn word_at(&self, index: usize) -> Option<WordRef<'a>> {
        self.block
            .words
            .get(index)
            .and_then(|word| self.doc.word(*word))
    }

    /// Every character of every Word, in order. Separators are already the
    /// trailing characters of their Words.
    pub fn get_chars(&self) -> Vec<CharId> {
        self.block
            .words
            .iter()
            .filter_map(|word| self.doc.word_nodes.get(*word))
            .flat_map(|word| word.chars.iter().copied())
            .collect()
    }

    pub fn to_html(&self) -> String {
        let tag = self.block.kind.as_str();
        let content: String = self.words().map(|word| word.to_html()).collect();
        format!("<{tag}>{content}</{tag}>")
    }

    pub fn to_tree(&self, index: usize) -> TreeNode {
        let children = self
            .words()
            .enumerate()
            .map(|(position, word)| word.to_tree(&format!("{index}-{position}")).into())
            .collect();
        TreeNode::new(format!("b{index}"), "B")
            .with_kind(self.block.kind.as_str())
            .with_children(children)
    }
}

impl Deref for BlockRef<'_> {
    type Target = Block;

    fn deref(&self) -> &Block {
        self.block
    }
}

impl fmt::Display for BlockRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for word in self.words() {
            write!(f, "{word}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for BlockRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockRef")
            .field("id", &self.id)
            .field("kind", &self.block.kind)
            .field("text", &self.to_string())
            .finish()
    }
}

pub struct BlockMut<'a> {
    doc: &'a mut Document,
    id: BlockId,
}

impl<'a> BlockMut<'a> {
    pub(crate) fn new(doc: &'a mut Document, id: BlockId) -> Option<Self> {
        doc.block_nodes.contains_key(id).then_some(Self { doc, id })
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn set_type(&mut self, kind: BlockType) {
        if let Some(block) = self.doc.block_nodes.get_mut(self.id) {
            block.set_kind(kind);
        }
    }

    /// Inserts `word` after `reference` (at the end when it is absent or not
    /// in this Block) and splits it on interior separators.
    pub fn insert_after(&mut self, reference: Option<WordId>, word: WordId) {
        self.insert(Anchor::After(reference), word);
    }

    pub fn insert_before(&mut self, reference: Option<WordId>, word: WordId) {
        self.insert(Anchor::Before(reference), word);
    }

    fn insert(&mut self, anchor: Anchor<WordId>, word: WordId) {
        if !self.doc.word_nodes.contains_key(word) {
            return;
        }
        self.doc.attach_word(self.id, anchor, word);
        self.doc.split_word(word);
        self.doc.reindex();
    }

    /// Detaches `word`. `Removal::Emptied` means this Block had no Words
    /// left and removed itself from the Document.
    pub fn remove_word(&mut self, word: WordId) -> Removal {
        let removal = self.doc.unlink_word(self.id, word);
        if removal != Removal::Missing {
            self.doc.reindex();
        }
        removal
    }

    pub fn remove_words_after(&mut self, reference: WordId) -> Vec<WordId> {
        let removed = self.doc.remove_words_after(self.id, reference);
        if !removed.is_empty() {
            self.doc.reindex();
        }
        removed
    }

    pub fn insert_words_after(&mut self, words: &[WordId]) -> Option<BlockId> {
        let attached = self
            .doc
            .block_nodes
            .get(self.id)
            .is_some_and(Block::is_attached);
        if words.is_empty() || !attached {
            return None;
        }
        let block = self.doc.new_block_node(words.to_vec());
        self.doc.attach_block(Anchor::After(Some(self.id)), block);
        self.doc.split_block_words(block);
        self.doc.reindex();
        Some(block)
    }

    /// Moves the Words after `reference` out, inserts one new Block per
    /// group after this one, and appends the moved Words to the last new
    /// Block.
    pub fn split_and_insert_blocks(
        &mut self,
        reference: WordId,
        groups: Vec<Vec<WordId>>,
    ) -> Vec<BlockId> {
        let created = self.doc.split_and_insert_blocks(self.id, reference, groups);
        for block in &created {
            self.doc.split_block_words(*block);
        }
        self.doc.reindex();
        created
    }

    /// Drains `other` into this Block. Its first Word is fused with this
    /// Block's last Word; `other` is left empty and leaves the Document.
    pub fn merge(&mut self, other: BlockId) {
        self.doc.merge_blocks(self.id, other);
        self.doc.reindex();
    }
}

impl Document {
    pub(crate) fn new_block_node(&mut self, words: Vec<WordId>) -> BlockId {
        let block = self.block_nodes.insert(Block::default());
        for word in words {
            self.attach_word(block, Anchor::After(None), word);
        }
        block
    }

    pub(crate) fn attach_word(&mut self, block: BlockId, anchor: Anchor<WordId>, word: WordId) {
        if !self.block_nodes.contains_key(block) {
            return;
        }
        let Some(previous) = self.word_nodes.get(word).map(Word::parent) else {
            return;
        };
        if let Some(previous) = previous.and_then(|previous| self.block_nodes.get_mut(previous)) {
            previous.words.retain(|candidate| *candidate != word);
        }
        if let Some(node) = self.block_nodes.get_mut(block) {
            let index = anchor.index_in(&node.words);
            node.words.insert(index, word);
        }
        if let Some(node) = self.word_nodes.get_mut(word) {
            node.parent = Some(block);
        }
    }

    pub(crate) fn unlink_word(&mut self, block: BlockId, word: WordId) -> Removal {
        let Some(node) = self.block_nodes.get_mut(block) else {
            return Removal::Missing;
        };
        let Some(index) = node.position(word) else {
            return Removal::Missing;
        };
        node.words.remove(index);
        let emptied = node.words.is_empty();
        if let Some(word) = self.word_nodes.get_mut(word) {
            word.parent = None;
        }
        if emptied {
            self.unlink_block(block);
            self.block_nodes.remove(block);
            return Removal::Emptied;
        }
        Removal::Removed
    }

    pub(crate) fn attach_block(&mut self, anchor: Anchor<BlockId>, block: BlockId) {
        let Some(node) = self.block_nodes.get_mut(block) else {
            return;
        };
        node.attached = true;
        self.blocks.retain(|candidate| *candidate != block);
        let index = anchor.index_in(&self.blocks);
        self.blocks.insert(index, block);
    }

    pub(crate) fn unlink_block(&mut self, block: BlockId) -> Removal {
        let Some(index) = self.blocks.iter().position(|candidate| *candidate == block) else {
            return Removal::Missing;
        };
        self.blocks.remove(index);
        if let Some(node) = self.block_nodes.get_mut(block) {
            node.attached = false;
        }
        debug!("removed block {index}, {} left", self.blocks.len());
        Removal::Removed
    }

    pub(crate) fn remove_words_after(&mut self, block: BlockId, reference: WordId) -> Vec<WordId> {
        let Some(node) = self.block_nodes.get_mut(block) else {
            return Vec::new();
        };
        let Some(index) = node.position(reference) else {
            return Vec::new();
        };
        let trailing = node.words.split_off(index + 1);
        for word in &trailing {
            if let Some(word) = self.word_nodes.get_mut(*word) {
                word.parent = None;
            }
        }
        trailing
    }

    pub(crate) fn split_and_insert_blocks(
        &mut self,
        block: BlockId,
        reference: WordId,
        groups: Vec<Vec<WordId>>,
    ) -> Vec<BlockId> {
        let trailing = self.remove_words_after(block, reference);
        let mut created = Vec::with_capacity(groups.len());
        let mut previous = block;
        for words in groups {
            if words.is_empty() {
                continue;
            }
            let next = self.new_block_node(words);
            self.attach_block(Anchor::After(Some(previous)), next);
            created.push(next);
            previous = next;
        }

        let target = created.last().copied().unwrap_or(block);
        for word in trailing {
            self.attach_word(target, Anchor::After(None), word);
        }
        if !created.is_empty() {
            debug!("split block into {}", created.len() + 1);
        }
        created
    }

    /// Pops every Word off `other` into `id`. The first one is merged into
    /// the last Word of `id`; the rest follow it in order.
    pub(crate) fn merge_blocks(&mut self, id: BlockId, other: BlockId) {
        if id == other || !self.block_nodes.contains_key(id) {
            return;
        }
        let Some(incoming) = self
            .block_nodes
            .get_mut(other)
            .map(|block| mem::take(&mut block.words))
        else {
            return;
        };
        self.unlink_block(other);
        self.block_nodes.remove(other);
        for word in &incoming {
            if let Some(word) = self.word_nodes.get_mut(*word) {
                word.parent = None;
            }
        }
        debug!("merging block of {} word(s) into preceding block", incoming.len());

        let mut incoming = incoming.into_iter();
        let Some(first) = incoming.next() else {
            return;
        };
        let mut target = id;
        match self.block_nodes.get(id).and_then(|block| block.words.last().copied()) {
            Some(last) => {
                let join = self.word_nodes.get(first).and_then(Word::last);
                self.merge_words(last, first);
                if let Some(holder) = join
                    .and_then(|ch| self.word_of(ch))
                    .and_then(|word| self.block_of(word))
                {
                    target = holder;
                }
            }
            None => self.attach_word(id, Anchor::After(None), first),
        }
        for word in incoming {
            self.attach_word(target, Anchor::After(None), word);
        }
    }

    pub(crate) fn split_block_words(&mut self, block: BlockId) {
        let words = self
            .block_nodes
            .get(block)
            .map(|block| block.words.clone())
            .unwrap_or_default();
        for word in words {
            self.split_word(word);
        }
    }
}

#[cfg(test)]
#[path = "block_tests.rs"]
mod block_tests;

use std::fmt;

use log::{debug, trace};
use slotmap::SlotMap;

use crate::block::{Block, BlockId, BlockMut, BlockRef, BlockType};
use crate::character::{CharId, Character};
use crate::tree::TreeNode;
use crate::word::{Word, WordId, WordMut, WordRef};

/// Outcome of removing a child from its container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Removal {
    Missing,
    Removed,
    /// The child was removed and the container, now empty, removed itself
    /// from its own parent.
    Emptied,
}

/// Splice position relative to an optional sibling. A missing or unknown
/// sibling falls back to the start (`Before`) or the end (`After`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Anchor<K> {
    Before(Option<K>),
    After(Option<K>),
}

impl<K: PartialEq + Copy> Anchor<K> {
    pub(crate) fn index_in(&self, siblings: &[K]) -> usize {
        let find = |key: &Option<K>| key.and_then(|key| siblings.iter().position(|s| *s == key));
        match self {
            Anchor::Before(key) => find(key).unwrap_or(0),
            Anchor::After(key) => find(key).map(|index| index + 1).unwrap_or(siblings.len()),
        }
    }
}

/// Character offsets into the flat index, `start` inclusive, `end` exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn new(anchor: usize, focus: usize) -> Self {
        Self {
            start: anchor.min(focus),
            end: anchor.max(focus),
        }
    }

    pub fn collapsed(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }
}

/// The root of the tree: an ordered list of Blocks plus a flat index of
/// every Character in document order.
///
/// Nodes live in arenas owned by the Document and refer to their owner by
/// id. The flat index always equals the concatenation of every Block's
/// Words' Characters, and the last Character is the terminator unless the
/// tree was rearranged through the Block-level API.
pub struct Document {
    pub(crate) char_nodes: SlotMap<CharId, Character>,
    pub(crate) word_nodes: SlotMap<WordId, Word>,
    pub(crate) block_nodes: SlotMap<BlockId, Block>,
    pub(crate) blocks: Vec<BlockId>,
    pub(crate) chars: Vec<CharId>,
    pub(crate) tail: CharId,
}

impl Default for Document {
    fn default() -> Self {
        let mut doc = Self {
            char_nodes: SlotMap::with_key(),
            word_nodes: SlotMap::with_key(),
            block_nodes: SlotMap::with_key(),
            blocks: Vec::new(),
            chars: Vec::new(),
            tail: CharId::default(),
        };
        doc.seed();
        doc
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str) -> Self {
        let mut doc = Self::new();
        doc.insert_chars_at(0, text);
        doc
    }

    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    pub fn chars(&self) -> &[CharId] {
        &self.chars
    }

    pub fn tail(&self) -> CharId {
        self.tail
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// True when the Document holds nothing but its terminator.
    pub fn is_empty(&self) -> bool {
        self.chars
            .iter()
            .all(|ch| self.char_nodes.get(*ch).is_none_or(Character::is_terminator))
    }

    pub fn character(&self, id: CharId) -> Option<&Character> {
        self.char_nodes.get(id)
    }

    pub fn char_at(&self, index: usize) -> Option<&Character> {
        self.chars
            .get(index)
            .and_then(|ch| self.char_nodes.get(*ch))
    }

    pub fn word(&self, id: WordId) -> Option<WordRef<'_>> {
        WordRef::new(self, id)
    }

    pub fn word_mut(&mut self, id: WordId) -> Option<WordMut<'_>> {
        WordMut::new(self, id)
    }

    pub fn block(&self, id: BlockId) -> Option<BlockRef<'_>> {
        BlockRef::new(self, id)
    }

    pub fn block_mut(&mut self, id: BlockId) -> Option<BlockMut<'_>> {
        BlockMut::new(self, id)
    }

    pub fn block_at(&self, index: usize) -> Option<BlockRef<'_>> {
        self.blocks
            .get(index)
            .and_then(|block| self.block(*block))
    }

    pub fn word_of(&self, ch: CharId) -> Option<WordId> {
        self.char_nodes.get(ch).and_then(Character::parent)
    }

    pub fn block_of(&self, word: WordId) -> Option<BlockId> {
        self.word_nodes.get(word).and_then(Word::parent)
    }

    pub fn words(&self) -> impl Iterator<Item = WordRef<'_>> + '_ {
        self.blocks
            .iter()
            .filter_map(|block| self.block_nodes.get(*block))
            .flat_map(|block| block.words.iter())
            .filter_map(|word| self.word(*word))
    }

    pub fn create_char(&mut self, character: Character) -> CharId {
        let mut character = character;
        character.parent = None;
        self.char_nodes.insert(character)
    }

    pub fn create_chars(&mut self, text: &str) -> Vec<CharId> {
        text.chars()
            .map(|ch| self.char_nodes.insert(Character::new(ch)))
            .collect()
    }

    /// Creates a detached Word from `text`. An empty `text` yields a Word
    /// holding a single terminator.
    pub fn create_word(&mut self, text: &str) -> WordId {
        let chars = if text.is_empty() {
            vec![self.char_nodes.insert(Character::terminator())]
        } else {
            self.create_chars(text)
        };
        self.new_word_node(chars)
    }

    /// Creates a detached Word owning `chars`, taking them away from any
    /// Word that held them.
    pub fn create_word_from(&mut self, chars: &[CharId]) -> WordId {
        let word = self.new_word_node(Vec::new());
        self.insert_into_word(word, Anchor::After(None), chars);
        word
    }

    /// Creates a detached Block of `words`. Without words the Block gets a
    /// single terminator Word.
    pub fn create_block(&mut self, words: &[WordId]) -> BlockId {
        if words.is_empty() {
            let word = self.create_word("");
            return self.new_block_node(vec![word]);
        }
        let block = self.new_block_node(Vec::new());
        for &word in words {
            self.attach_word(block, Anchor::After(None), word);
        }
        block
    }

    /// Inserts `text` so that its first character lands at flat `index`.
    ///
    /// Typing at a Word boundary continues the adjacent Word unless the
    /// character before the boundary is itself a separator.
    pub fn insert_chars_at(&mut self, index: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        let index = index.min(self.editable_len());
        trace!("insert {} char(s) at {index}", text.chars().count());

        let new_chars = self.create_chars(text);
        let next = self.chars.get(index).copied();
        let prev = index
            .checked_sub(1)
            .and_then(|index| self.chars.get(index))
            .copied();
        let next_word = next.and_then(|ch| self.word_of(ch));
        let prev_word = prev.and_then(|ch| self.word_of(ch));

        match (prev, prev_word) {
            (Some(prev), Some(prev_word)) if Some(prev_word) != next_word => {
                let (separator, newline) = self
                    .char_nodes
                    .get(prev)
                    .map(|ch| (ch.is_separator(), ch.is_newline()))
                    .unwrap_or_default();
                if !separator {
                    self.insert_into_word(prev_word, Anchor::After(Some(prev)), &new_chars);
                } else if let Some(next_word) = next_word {
                    self.insert_into_word(next_word, Anchor::Before(None), &new_chars);
                } else {
                    let word = self.new_word_node(new_chars.clone());
                    self.attach_after_char(prev_word, newline, word);
                }
            }
            _ => match next_word {
                Some(next_word) => {
                    self.insert_into_word(next_word, Anchor::Before(next), &new_chars)
                }
                None => {
                    for ch in new_chars {
                        self.char_nodes.remove(ch);
                    }
                    return;
                }
            },
        }

        self.chars.splice(index..index, new_chars);
        self.refresh_tail();
    }

    fn attach_after_char(&mut self, prev_word: WordId, newline: bool, word: WordId) {
        let Some(block) = self.block_of(prev_word) else {
            return;
        };
        if newline {
            let created = self.new_block_node(vec![word]);
            self.attach_block(Anchor::After(Some(block)), created);
        } else {
            self.attach_word(block, Anchor::After(Some(prev_word)), word);
        }
        self.split_word(word);
    }

    /// Removes up to `count` characters starting at flat `index` and returns
    /// them detached. Terminators are never removed, and an emptied Document
    /// is re-seeded. Words that lose their trailing separator are merged with
    /// the Word that follows them.
    pub fn remove_chars_at(&mut self, index: usize, count: usize) -> Vec<Character> {
        let editable = self.editable_len();
        if index >= editable || count == 0 {
            return Vec::new();
        }
        let end = index.saturating_add(count).min(editable);
        trace!("remove {} char(s) at {index}", end - index);

        let removed: Vec<CharId> = self.chars[index..end]
            .iter()
            .copied()
            .filter(|ch| {
                self.char_nodes
                    .get(*ch)
                    .is_some_and(|ch| !ch.is_terminator())
            })
            .collect();
        for &ch in &removed {
            if let Some(word) = self.word_of(ch) {
                self.unlink_char(word, ch);
            }
        }
        self.rejoin();
        self.reindex();

        removed
            .into_iter()
            .filter_map(|ch| self.char_nodes.remove(ch))
            .collect()
    }

    /// Inserts `block` after `reference` (at the end when it is absent or
    /// unknown) and splits any of its Words that hold interior separators.
    pub fn insert_after(&mut self, reference: Option<BlockId>, block: BlockId) {
        if !self.block_nodes.contains_key(block) {
            return;
        }
        self.attach_block(Anchor::After(reference), block);
        let words = self
            .block_nodes
            .get(block)
            .map(|block| block.words.clone())
            .unwrap_or_default();
        for word in words {
            self.split_word(word);
        }
        self.reindex();
    }

    /// Detaches `block` from the Document. The Block and its Words stay in
    /// the arenas for reinsertion until they are dropped with
    /// [`Document::drop_block`].
    pub fn remove_block(&mut self, block: BlockId) -> Removal {
        let removal = self.unlink_block(block);
        if removal != Removal::Missing {
            self.reindex();
        }
        removal
    }

    /// Frees a detached Block together with its Words and Characters.
    /// Returns false for attached or unknown Blocks.
    pub fn drop_block(&mut self, block: BlockId) -> bool {
        if self.block_nodes.get(block).is_none_or(|node| node.attached) {
            return false;
        }
        if let Some(node) = self.block_nodes.remove(block) {
            for word in node.words {
                self.free_word(word);
            }
        }
        true
    }

    /// Frees a Word that no Block holds, e.g. one returned by
    /// `remove_words_after`.
    pub fn drop_word(&mut self, word: WordId) -> bool {
        if self.word_nodes.get(word).is_none_or(|node| node.parent.is_some()) {
            return false;
        }
        self.free_word(word);
        true
    }

    fn free_word(&mut self, word: WordId) {
        if let Some(node) = self.word_nodes.remove(word) {
            for ch in node.chars {
                self.char_nodes.remove(ch);
            }
        }
    }

    pub fn exec_action(&mut self, action: &str, selection: Selection) {
        if selection.start >= self.chars.len() {
            return;
        }
        let end = selection.end.min(self.chars.len());
        trace!("exec {action} on {}..{end}", selection.start);

        let mut current: Option<WordId> = None;
        for index in selection.start..end {
            let word = self.chars.get(index).and_then(|ch| self.word_of(*ch));
            if word != current {
                current = word;
                if let Some(word) = word {
                    self.toggle_word_prop(word, action);
                }
            }
        }
    }

    /// Retypes every Block touched by `selection`; a collapsed selection
    /// retypes the Block holding the caret.
    pub fn set_block_type(&mut self, selection: Selection, kind: BlockType) {
        if selection.start >= self.chars.len() {
            return;
        }
        let end = selection
            .end
            .max(selection.start + 1)
            .min(self.chars.len());

        let mut current: Option<BlockId> = None;
        for index in selection.start..end {
            let block = self
                .chars
                .get(index)
                .and_then(|ch| self.word_of(*ch))
                .and_then(|word| self.block_of(word));
            if block != current {
                current = block;
                if let Some(block) = block.and_then(|block| self.block_nodes.get_mut(block)) {
                    block.set_kind(kind);
                }
            }
        }
    }

    pub fn to_html(&self) -> String {
        self.blocks
            .iter()
            .filter_map(|block| self.block(*block))
            .map(|block| block.to_html())
            .collect()
    }

    pub fn to_tree(&self) -> TreeNode {
        let children = self
            .blocks
            .iter()
            .enumerate()
            .filter_map(|(index, block)| Some(self.block(*block)?.to_tree(index).into()))
            .collect();
        TreeNode::new("doc", "d").with_children(children)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.to_tree())
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.to_tree())
    }

    pub(crate) fn reindex(&mut self) {
        if self.blocks.is_empty() {
            self.seed();
            return;
        }
        let chars: Vec<CharId> = self
            .blocks
            .iter()
            .filter_map(|block| self.block_nodes.get(*block))
            .flat_map(|block| block.words.iter())
            .filter_map(|word| self.word_nodes.get(*word))
            .flat_map(|word| word.chars.iter().copied())
            .collect();
        self.chars = chars;
        self.refresh_tail();
    }

    fn refresh_tail(&mut self) {
        if let Some(last) = self.chars.last() {
            self.tail = *last;
        }
    }

    /// Offsets past this point only ever address the terminator.
    fn editable_len(&self) -> usize {
        let terminated = self
            .char_nodes
            .get(self.tail)
            .is_some_and(Character::is_terminator);
        if terminated {
            self.chars.len().saturating_sub(1)
        } else {
            self.chars.len()
        }
    }

    fn seed(&mut self) {
        debug!("seeding empty document");
        let tail = self.char_nodes.insert(Character::terminator());
        let word = self.new_word_node(vec![tail]);
        let block = self.new_block_node(vec![word]);
        if let Some(node) = self.block_nodes.get_mut(block) {
            node.attached = true;
        }
        self.blocks = vec![block];
        self.chars = vec![tail];
        self.tail = tail;
    }

    // Words without a trailing separator absorb the next Word; Blocks
    // without a closing newline absorb the next Block.
    fn rejoin(&mut self) {
        let mut block_index = 0;
        while let Some(&block) = self.blocks.get(block_index) {
            let mut word_index = 0;
            loop {
                let Some(node) = self.block_nodes.get(block) else {
                    break;
                };
                let Some(&word) = node.words.get(word_index) else {
                    break;
                };
                let next_word = node.words.get(word_index + 1).copied();
                let Some(view) = self.word(word) else {
                    break;
                };
                let (separator, newline) = (view.ends_with_separator(), view.ends_with_newline());

                match (next_word, self.blocks.get(block_index + 1).copied()) {
                    (Some(next), _) if !separator => self.merge_words(word, next),
                    (None, Some(next_block)) if !newline => self.merge_blocks(block, next_block),
                    _ => word_index += 1,
                }
            }
            block_index += 1;
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in self.blocks.iter().filter_map(|block| self.block(*block)) {
            write!(f, "{block}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("blocks", &self.blocks.len())
            .field("chars", &self.chars.len())
            .field("text", &self.to_string())
            .finish()
    }
}

impl From<&str> for Document {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod document_tests;

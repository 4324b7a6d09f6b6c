use std::{fmt, mem, ops::Deref};

use log::debug;

use crate::block::BlockId;
use crate::character::{CharId, Character};
use crate::document::{Anchor, Document, Removal};
use crate::tree::TreeNode;

slotmap::new_key_type! {
    pub struct WordId;
}

/// A run of characters ending in at most one separator.
///
/// Every Word except the last one of the Document ends with a space or a
/// newline; the last one ends with the terminator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Word {
    pub(crate) chars: Vec<CharId>,
    pub(crate) parent: Option<BlockId>,
}

impl Word {
    pub fn get_chars(&self) -> &[CharId] {
        &self.chars
    }

    pub fn parent(&self) -> Option<BlockId> {
        self.parent
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn first(&self) -> Option<CharId> {
        self.chars.first().copied()
    }

    pub fn last(&self) -> Option<CharId> {
        self.chars.last().copied()
    }

    pub fn position(&self, ch: CharId) -> Option<usize> {
        self.chars.iter().position(|candidate| *candidate == ch)
    }

    pub(crate) fn remove_char(&mut self, ch: CharId) -> Removal {
        let Some(index) = self.position(ch) else {
            return Removal::Missing;
        };
        self.chars.remove(index);
        if self.chars.is_empty() {
            Removal::Emptied
        } else {
            Removal::Removed
        }
    }
}

#[derive(Clone, Copy)]
pub struct WordRef<'a> {
    doc: &'a Document,
    id: WordId,
    word: &'a Word,
}

impl<'a> WordRef<'a> {
    pub(crate) fn new(doc: &'a Document, id: WordId) -> Option<Self> {
        let word = doc.word_nodes.get(id)?;
        Some(Self { doc, id, word })
    }

    pub fn id(&self) -> WordId {
        self.id
    }

    pub fn characters(&self) -> impl Iterator<Item = &'a Character> + 'a {
        let doc = self.doc;
        self.word
            .chars
            .iter()
            .filter_map(move |ch| doc.char_nodes.get(*ch))
    }

    pub fn last_character(&self) -> Option<&'a Character> {
        self.word.last().and_then(|ch| self.doc.char_nodes.get(ch))
    }

    pub fn ends_with_separator(&self) -> bool {
        self.last_character().is_some_and(Character::is_separator)
    }

    pub fn ends_with_newline(&self) -> bool {
        self.last_character().is_some_and(Character::is_newline)
    }

    /// Formatting is applied per Word: every property set on any character
    /// wraps the whole Word, the first one seen innermost.
    pub fn to_html(&self) -> String {
        let mut tags: Vec<&str> = Vec::new();
        let mut content = String::new();
        for ch in self.characters() {
            for prop in ch.get_props() {
                if !tags.contains(&prop) {
                    tags.push(prop);
                }
            }
            ch.push_html(&mut content);
        }

        let mut html = String::with_capacity(content.len() + tags.len() * 8);
        for tag in tags.iter().rev() {
            html.push('<');
            html.push_str(tag);
            html.push('>');
        }
        html.push_str(&content);
        for tag in &tags {
            html.push_str("</");
            html.push_str(tag);
            html.push('>');
        }
        html
    }

    pub fn to_tree(&self, id: &str) -> TreeNode {
        let children = self
            .characters()
            .enumerate()
            .map(|(index, ch)| ch.to_tree(&format!("{id}-{index}")).into())
            .collect();
        TreeNode::new(format!("w{id}"), "w").with_children(children)
    }
}

impl Deref for WordRef<'_> {
    type Target = Word;

    fn deref(&self) -> &Word {
        self.word
    }
}

impl fmt::Display for WordRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ch in self.characters() {
            write!(f, "{ch}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for WordRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordRef")
            .field("id", &self.id)
            .field("text", &self.to_string())
            .finish()
    }
}

pub struct WordMut<'a> {
    doc: &'a mut Document,
    id: WordId,
}

impl<'a> WordMut<'a> {
    pub(crate) fn new(doc: &'a mut Document, id: WordId) -> Option<Self> {
        doc.word_nodes.contains_key(id).then_some(Self { doc, id })
    }

    pub fn id(&self) -> WordId {
        self.id
    }

    /// Switches `name` on for every character unless all of them already
    /// have it, in which case it is switched off everywhere.
    pub fn toggle_prop(&mut self, name: &str) {
        self.doc.toggle_word_prop(self.id, name);
    }

    /// Splices `chars` in front of `reference` (or at the start when it is
    /// absent or not part of this Word), then splits on separators.
    pub fn insert_before(&mut self, reference: Option<CharId>, chars: &[CharId]) {
        if chars.is_empty() {
            return;
        }
        self.doc
            .insert_into_word(self.id, Anchor::Before(reference), chars);
        self.doc.reindex();
    }

    pub fn insert_after(&mut self, reference: Option<CharId>, chars: &[CharId]) {
        if chars.is_empty() {
            return;
        }
        self.doc
            .insert_into_word(self.id, Anchor::After(reference), chars);
        self.doc.reindex();
    }

    /// Removes `ch` from this Word. `Removal::Emptied` means the Word was
    /// dropped from its Block (and the Block too, if that emptied it).
    pub fn remove_char(&mut self, ch: CharId) -> Removal {
        let removal = self.doc.unlink_char(self.id, ch);
        if removal != Removal::Missing {
            self.doc.reindex();
        }
        removal
    }

    /// Pulls every character of `other` onto the end of this Word. Words of
    /// different Blocks are joined by merging the Blocks.
    pub fn merge(&mut self, other: WordId) {
        self.doc.merge_words(self.id, other);
        self.doc.reindex();
    }

    pub fn split(&mut self) {
        self.doc.split_word(self.id);
    }
}

impl Document {
    pub(crate) fn toggle_word_prop(&mut self, id: WordId, name: &str) {
        let Some(word) = self.word_nodes.get(id) else {
            return;
        };
        let all_on = word
            .chars
            .iter()
            .all(|ch| self.char_nodes.get(*ch).is_some_and(|ch| ch.prop(name)));
        for ch in &word.chars {
            if let Some(ch) = self.char_nodes.get_mut(*ch) {
                ch.set_prop(name, !all_on);
            }
        }
    }

    pub(crate) fn insert_into_word(
        &mut self,
        id: WordId,
        anchor: Anchor<CharId>,
        chars: &[CharId],
    ) {
        if !self.word_nodes.contains_key(id) {
            return;
        }
        let chars: Vec<CharId> = chars
            .iter()
            .copied()
            .filter(|ch| self.char_nodes.contains_key(*ch))
            .collect();
        for &ch in &chars {
            self.adopt_char(id, ch);
        }
        let Some(word) = self.word_nodes.get_mut(id) else {
            return;
        };
        let index = anchor.index_in(&word.chars);
        word.chars.splice(index..index, chars);
        self.split_word(id);
    }

    fn adopt_char(&mut self, id: WordId, ch: CharId) {
        let Some(previous) = self.char_nodes.get_mut(ch).map(|ch| ch.parent.replace(id)) else {
            return;
        };
        if let Some(previous) = previous.and_then(|word| self.word_nodes.get_mut(word)) {
            previous.remove_char(ch);
        }
    }

    /// Removes `ch` from Word `id` and cascades: an emptied Word leaves its
    /// Block and is dropped, an emptied Block leaves the Document.
    pub(crate) fn unlink_char(&mut self, id: WordId, ch: CharId) -> Removal {
        let Some(word) = self.word_nodes.get_mut(id) else {
            return Removal::Missing;
        };
        let removal = word.remove_char(ch);
        if removal == Removal::Missing {
            return removal;
        }
        let block = word.parent;
        if let Some(ch) = self.char_nodes.get_mut(ch) {
            ch.parent = None;
        }
        if removal == Removal::Emptied {
            if let Some(block) = block {
                self.unlink_word(block, id);
            }
            self.word_nodes.remove(id);
        }
        removal
    }

    /// Fragments Word `id` at every separator that is not its last
    /// character. The first fragment stays in `id`; the rest become new
    /// Words after it and, past each newline, new Blocks after its Block.
    /// The Word's original following siblings move to the end of the last
    /// new Block.
    pub(crate) fn split_word(&mut self, id: WordId) {
        let Some(word) = self.word_nodes.get(id) else {
            return;
        };
        let Some(block) = word.parent.filter(|block| {
            self.block_nodes
                .get(*block)
                .is_some_and(|block| block.attached)
        }) else {
            return;
        };
        let Some(last) = word.chars.len().checked_sub(1) else {
            return;
        };

        let mut run: Vec<CharId> = Vec::new();
        let mut own: Option<Vec<CharId>> = None;
        let mut same_block: Vec<Vec<CharId>> = Vec::new();
        let mut new_blocks: Vec<Vec<Vec<CharId>>> = Vec::new();
        let mut pending: Option<Vec<Vec<CharId>>> = None;

        for (index, &ch) in word.chars.iter().enumerate() {
            run.push(ch);
            if index == last {
                break;
            }
            let Some(character) = self.char_nodes.get(ch) else {
                continue;
            };
            if !character.is_separator() {
                continue;
            }
            let closed = mem::take(&mut run);
            if own.is_none() {
                own = Some(closed);
            } else if let Some(words) = pending.as_mut() {
                words.push(closed);
            } else {
                same_block.push(closed);
            }
            if character.is_newline()
                && let Some(words) = pending.replace(Vec::new())
            {
                new_blocks.push(words);
            }
        }

        let Some(own) = own else {
            return;
        };
        match pending.as_mut() {
            Some(words) => words.push(run),
            None => same_block.push(run),
        }
        if let Some(words) = pending {
            new_blocks.push(words);
        }

        debug!(
            "splitting word: {} new word(s) in place, {} new block(s)",
            same_block.len(),
            new_blocks.len()
        );

        if let Some(word) = self.word_nodes.get_mut(id) {
            word.chars = own;
        }

        let mut previous = id;
        for chars in same_block {
            let word = self.new_word_node(chars);
            self.attach_word(block, Anchor::After(Some(previous)), word);
            previous = word;
        }

        if new_blocks.is_empty() {
            return;
        }
        let mut groups = Vec::with_capacity(new_blocks.len());
        for fragments in new_blocks {
            let mut words = Vec::with_capacity(fragments.len());
            for chars in fragments {
                words.push(self.new_word_node(chars));
            }
            groups.push(words);
        }
        self.split_and_insert_blocks(block, previous, groups);
    }

    pub(crate) fn merge_words(&mut self, id: WordId, other: WordId) {
        if id == other {
            return;
        }
        let (Some(word), Some(incoming)) = (self.word_nodes.get(id), self.word_nodes.get(other))
        else {
            return;
        };
        if let (Some(block), Some(other_block)) = (word.parent, incoming.parent)
            && block != other_block
        {
            self.merge_blocks(block, other_block);
            return;
        }

        let moved = match self.word_nodes.get_mut(other) {
            Some(incoming) => mem::take(&mut incoming.chars),
            None => return,
        };
        if let Some(block) = self.word_nodes.get(other).and_then(|word| word.parent) {
            self.unlink_word(block, other);
        }
        self.word_nodes.remove(other);

        for ch in &moved {
            if let Some(ch) = self.char_nodes.get_mut(*ch) {
                ch.parent = Some(id);
            }
        }
        debug!("merging word of {} character(s) into preceding word", moved.len());
        if let Some(word) = self.word_nodes.get_mut(id) {
            word.chars.extend(moved);
        }
        self.split_word(id);
    }

    pub(crate) fn new_word_node(&mut self, chars: Vec<CharId>) -> WordId {
        let id = self.word_nodes.insert(Word {
            chars: Vec::new(),
            parent: None,
        });
        for ch in &chars {
            if let Some(ch) = self.char_nodes.get_mut(*ch) {
                ch.parent = Some(id);
            }
        }
        if let Some(word) = self.word_nodes.get_mut(id) {
            word.chars = chars;
        }
        id
    }
}

#[cfg(test)]
#[path = "word_tests.rs"]
mod word_tests;

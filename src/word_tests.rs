use super::*;

fn block_words(doc: &Document) -> Vec<Vec<String>> {
    doc.blocks()
        .iter()
        .filter_map(|block| doc.block(*block))
        .map(|block| block.words().map(|word| word.to_string()).collect())
        .collect()
}

fn word_at(doc: &Document, block: usize, word: usize) -> WordId {
    doc.block_at(block)
        .and_then(|block| block.word_at(word))
        .map(|word| word.id())
        .expect("word exists")
}

fn all_have(doc: &Document, word: WordId, prop: &str) -> bool {
    doc.word(word)
        .unwrap()
        .characters()
        .all(|ch| ch.prop(prop))
}

fn none_have(doc: &Document, word: WordId, prop: &str) -> bool {
    doc.word(word)
        .unwrap()
        .characters()
        .all(|ch| !ch.prop(prop))
}

#[test]
fn toggle_prop_switches_whole_word_on_then_off() {
    let mut doc = Document::from_text("bold");
    let word = word_at(&doc, 0, 0);
    assert!(none_have(&doc, word, "b"));

    doc.word_mut(word).unwrap().toggle_prop("b");
    assert!(all_have(&doc, word, "b"));

    doc.word_mut(word).unwrap().toggle_prop("b");
    assert!(none_have(&doc, word, "b"));
}

#[test]
fn toggle_prop_on_mixed_word_turns_everything_on() {
    let mut doc = Document::from_text("mixed");
    let word = word_at(&doc, 0, 0);
    let first = doc.word(word).unwrap().get_chars()[0];
    doc.char_nodes.get_mut(first).unwrap().set_prop("i", true);

    doc.word_mut(word).unwrap().toggle_prop("i");
    assert!(all_have(&doc, word, "i"));
}

#[test]
fn insert_before_without_reference_prepends_and_splits() {
    let mut doc = Document::from_text("cd");
    let word = word_at(&doc, 0, 0);
    let chars = doc.create_chars("ab ");

    doc.word_mut(word).unwrap().insert_before(None, &chars);

    assert_eq!(block_words(&doc), vec![vec!["ab ", "cd"]]);
    assert_eq!(doc.to_string(), "ab cd");
    assert_eq!(doc.len(), 6);
    assert_eq!(word_at(&doc, 0, 0), word);
}

#[test]
fn insert_after_unknown_reference_appends() {
    let mut doc = Document::from_text("ab cd");
    let first = word_at(&doc, 0, 0);
    let foreign = doc.create_chars("?")[0];
    let chars = doc.create_chars("x ");

    doc.word_mut(first).unwrap().insert_after(Some(foreign), &chars);

    assert_eq!(doc.to_string(), "ab x cd");
    assert_eq!(block_words(&doc), vec![vec!["ab ", "x ", "cd"]]);
}

#[test]
fn insert_with_newline_spawns_block_and_moves_following_words() {
    let mut doc = Document::from_text("one two three");
    let two = word_at(&doc, 0, 1);
    let o = doc.word(two).unwrap().get_chars()[2];
    let chars = doc.create_chars("\nnew");

    doc.word_mut(two).unwrap().insert_after(Some(o), &chars);

    assert_eq!(
        block_words(&doc),
        vec![vec!["one ", "two\n"], vec!["new ", "three"]]
    );
    assert_eq!(doc.to_string(), "one two\nnew three");
    assert_eq!(doc.len(), 18);
    assert!(doc.char_at(17).unwrap().is_terminator());
}

#[test]
fn insert_with_several_newlines_keeps_block_order() {
    let mut doc = Document::from_text("head tail");
    let head = word_at(&doc, 0, 0);
    let h = doc.word(head).unwrap().get_chars()[0];
    let chars = doc.create_chars("a b\nc d\ne");

    doc.word_mut(head).unwrap().insert_after(Some(h), &chars);

    assert_eq!(
        block_words(&doc),
        vec![
            vec!["ha ", "b\n"],
            vec!["c ", "d\n"],
            vec!["eead ", "tail"],
        ]
    );
}

#[test]
fn remove_char_reports_missing_for_foreign_character() {
    let mut doc = Document::from_text("ab");
    let word = word_at(&doc, 0, 0);
    let foreign = doc.create_chars("z")[0];

    assert_eq!(
        doc.word_mut(word).unwrap().remove_char(foreign),
        Removal::Missing
    );
    assert_eq!(doc.to_string(), "ab");
}

#[test]
fn remove_last_char_drops_word_from_block() {
    let mut doc = Document::from_text("a b");
    let word = word_at(&doc, 0, 0);
    let chars = doc.word(word).unwrap().get_chars().to_vec();

    assert_eq!(
        doc.word_mut(word).unwrap().remove_char(chars[0]),
        Removal::Removed
    );
    assert_eq!(
        doc.word_mut(word).unwrap().remove_char(chars[1]),
        Removal::Emptied
    );

    assert!(doc.word(word).is_none());
    assert_eq!(block_words(&doc), vec![vec!["b"]]);
    assert_eq!(doc.len(), 2);
}

#[test]
fn remove_last_char_of_only_word_drops_block() {
    let mut doc = Document::from_text("a\nb");
    let word = word_at(&doc, 0, 0);
    let chars = doc.word(word).unwrap().get_chars().to_vec();

    for ch in chars {
        doc.word_mut(word).unwrap().remove_char(ch);
    }

    assert_eq!(doc.blocks().len(), 1);
    assert_eq!(doc.to_string(), "b");
}

#[test]
fn merge_within_block_joins_characters() {
    let mut doc = Document::from_text("ab cd");
    let first = word_at(&doc, 0, 0);
    let second = word_at(&doc, 0, 1);
    let space = doc.word(first).unwrap().last().unwrap();
    doc.word_mut(first).unwrap().remove_char(space);

    doc.word_mut(first).unwrap().merge(second);

    assert_eq!(block_words(&doc), vec![vec!["abcd"]]);
    assert!(doc.word(second).is_none());
    assert!(
        doc.word(first)
            .unwrap()
            .get_chars()
            .iter()
            .all(|ch| doc.word_of(*ch) == Some(first))
    );
}

#[test]
fn merge_then_split_restores_separated_words() {
    let mut doc = Document::from_text("ab cd");
    let first = word_at(&doc, 0, 0);
    let second = word_at(&doc, 0, 1);

    doc.word_mut(first).unwrap().merge(second);

    assert_eq!(block_words(&doc), vec![vec!["ab ", "cd"]]);
    assert_eq!(doc.to_string(), "ab cd");
}

#[test]
fn merge_across_blocks_merges_the_blocks() {
    let mut doc = Document::from_text("ab\ncd");
    let first = word_at(&doc, 0, 0);
    let second = word_at(&doc, 1, 0);
    let newline = doc.word(first).unwrap().last().unwrap();
    doc.word_mut(first).unwrap().remove_char(newline);

    doc.word_mut(first).unwrap().merge(second);

    assert_eq!(block_words(&doc), vec![vec!["abcd"]]);
    assert_eq!(doc.blocks().len(), 1);
}

#[test]
fn split_waits_until_word_is_attached() {
    let mut doc = Document::new();
    let word = doc.create_word("a b");

    doc.word_mut(word).unwrap().split();

    assert_eq!(doc.word(word).unwrap().len(), 3);
    assert_eq!(doc.word(word).unwrap().parent(), None);
}

#[test]
fn html_wraps_word_in_every_seen_property() {
    let mut doc = Document::from_text("ab");
    let word = word_at(&doc, 0, 0);
    let chars = doc.word(word).unwrap().get_chars().to_vec();
    doc.char_nodes.get_mut(chars[0]).unwrap().set_prop("b", true);
    doc.char_nodes.get_mut(chars[0]).unwrap().set_prop("i", true);
    doc.char_nodes.get_mut(chars[1]).unwrap().set_prop("u", true);

    assert_eq!(
        doc.word(word).unwrap().to_html(),
        "<u><i><b>ab</b></i></u>"
    );
}

#[test]
fn html_escapes_content() {
    let doc = Document::from_text("a<b&c");
    let word = word_at(&doc, 0, 0);
    assert_eq!(doc.word(word).unwrap().to_html(), "a&lt;b&amp;c");
}

#[test]
fn tree_numbers_characters_under_word_id() {
    let doc = Document::from_text("hi");
    let word = word_at(&doc, 0, 0);
    let tree = doc.word(word).unwrap().to_tree("0-0");

    assert_eq!(tree.id, "w0-0");
    assert_eq!(tree.name, "w");
    let ids: Vec<&str> = tree.nodes().map(|node| node.id.as_str()).collect();
    assert_eq!(ids, vec!["c0-0-0", "c0-0-1", "c0-0-2"]);
    let names: Vec<&str> = tree.nodes().map(|node| node.name.as_str()).collect();
    assert_eq!(names, vec!["h", "i", ""]);
}

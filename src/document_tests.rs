use super::*;

fn block_words(doc: &Document) -> Vec<Vec<String>> {
    doc.blocks()
        .iter()
        .filter_map(|block| doc.block(*block))
        .map(|block| block.words().map(|word| word.to_string()).collect())
        .collect()
}

fn flat_text(doc: &Document) -> String {
    doc.chars()
        .iter()
        .filter_map(|ch| doc.character(*ch))
        .map(|ch| ch.to_string())
        .collect()
}

fn assert_in_sync(doc: &Document) {
    let from_tree: Vec<CharId> = doc
        .blocks()
        .iter()
        .filter_map(|block| doc.block(*block))
        .flat_map(|block| block.get_chars())
        .collect();
    assert_eq!(doc.chars(), from_tree.as_slice());
    assert_eq!(doc.chars().last(), Some(&doc.tail()));
}

#[test]
fn new_document_holds_single_terminator() {
    let doc = Document::new();
    assert_eq!(doc.blocks().len(), 1);
    assert_eq!(doc.len(), 1);
    assert!(doc.is_empty());
    assert!(doc.character(doc.tail()).unwrap().is_terminator());
    assert_eq!(doc.to_string(), "");
}

#[test]
fn three_lines_make_three_blocks_of_two_words() {
    let doc = Document::from_text("block one\nblock two\nblock three");

    assert_eq!(doc.blocks().len(), 3);
    assert!(
        doc.blocks()
            .iter()
            .all(|block| doc.block(*block).unwrap().len() == 2)
    );
    assert_eq!(doc.to_string(), "block one\nblock two\nblock three");
    assert_eq!(doc.len(), 32);
    assert_in_sync(&doc);
}

#[test]
fn inserting_at_word_boundary_starts_new_word_in_same_block() {
    let mut doc = Document::from_text("block one\nblock two");
    doc.insert_chars_at(6, "first ");

    assert_eq!(doc.to_string(), "block first one\nblock two");
    let block_word = doc.word_of(doc.chars()[0]).unwrap();
    let first_word = doc.word_of(doc.chars()[6]).unwrap();
    assert_ne!(block_word, first_word);
    assert_eq!(doc.block_of(block_word), doc.block_of(first_word));
    assert_in_sync(&doc);
}

#[test]
fn removing_across_newline_merges_blocks() {
    let mut doc = Document::from_text("block one\nblock two\nblock three");
    let removed = doc.remove_chars_at(1, 10);

    assert_eq!(removed.len(), 10);
    assert_eq!(
        removed.iter().map(|ch| ch.to_string()).collect::<String>(),
        "lock one\nb"
    );
    assert!(removed.iter().all(|ch| ch.parent().is_none()));
    assert_eq!(doc.to_string(), "block two\nblock three");
    assert_eq!(
        block_words(&doc),
        vec![vec!["block ", "two\n"], vec!["block ", "three"]]
    );
    assert_in_sync(&doc);
}

#[test]
fn removing_space_merges_words() {
    let mut doc = Document::from_text("hello world");
    doc.remove_chars_at(5, 1);

    assert_eq!(block_words(&doc), vec![vec!["helloworld"]]);
    assert_in_sync(&doc);
}

#[test]
fn removing_newline_joins_lines() {
    let mut doc = Document::from_text("hello \nworld");
    doc.remove_chars_at(6, 1);

    assert_eq!(block_words(&doc), vec![vec!["hello ", "world"]]);
    assert_in_sync(&doc);
}

#[test]
fn text_with_edge_separators_round_trips() {
    for text in ["\nabc", "abc\n", "a  b", "  ", "\n\n", "tab\there", "a\r\nb"] {
        let doc = Document::from_text(text);
        assert_eq!(doc.to_string(), text);
        assert_eq!(flat_text(&doc), text);
        assert_in_sync(&doc);
    }
}

#[test]
fn trailing_newline_leaves_terminator_block() {
    let doc = Document::from_text("abc\n");
    assert_eq!(block_words(&doc), vec![vec!["abc\n"], vec![""]]);
}

#[test]
fn carriage_return_is_content() {
    let doc = Document::from_text("a\r\nb");
    assert_eq!(block_words(&doc), vec![vec!["a\r\n"], vec!["b"]]);
}

#[test]
fn insert_after_newline_continues_next_word() {
    let mut doc = Document::from_text("ab\ncd");
    doc.insert_chars_at(3, "x");

    assert_eq!(block_words(&doc), vec![vec!["ab\n"], vec!["xcd"]]);
    assert_in_sync(&doc);
}

#[test]
fn insert_beyond_end_lands_before_terminator() {
    let mut doc = Document::from_text("abc");
    doc.insert_chars_at(99, "d");

    assert_eq!(doc.to_string(), "abcd");
    assert!(doc.character(doc.tail()).unwrap().is_terminator());
    assert_in_sync(&doc);
}

#[test]
fn insert_empty_text_is_noop() {
    let mut doc = Document::from_text("abc");
    doc.insert_chars_at(1, "");
    assert_eq!(doc.to_string(), "abc");
    assert_eq!(doc.len(), 4);
}

#[test]
fn terminator_is_never_removed() {
    let mut doc = Document::from_text("abc");
    assert!(doc.remove_chars_at(3, 1).is_empty());
    assert!(doc.remove_chars_at(10, 1).is_empty());

    let removed = doc.remove_chars_at(0, 100);
    assert_eq!(removed.len(), 3);
    assert!(doc.is_empty());
    assert_eq!(doc.len(), 1);
    assert_eq!(doc.blocks().len(), 1);
    assert_in_sync(&doc);
}

#[test]
fn removing_whole_middle_line_drops_its_block() {
    let mut doc = Document::from_text("a\nb\nc");
    doc.remove_chars_at(2, 2);

    assert_eq!(block_words(&doc), vec![vec!["a\n"], vec!["c"]]);
    assert_in_sync(&doc);
}

#[test]
fn exec_action_toggles_each_touched_word_once() {
    let mut doc = Document::from_text("one two three");
    doc.exec_action("b", Selection::new(2, 5));

    assert_eq!(doc.to_html(), "<p><b>one </b><b>two </b>three</p>");

    doc.exec_action("b", Selection::new(5, 2));
    assert_eq!(doc.to_html(), "<p>one two three</p>");
}

#[test]
fn exec_action_resolves_mixed_words_independently() {
    let mut doc = Document::from_text("one two");
    doc.exec_action("i", Selection::new(0, 1));
    doc.exec_action("i", Selection::new(0, 5));

    assert_eq!(doc.to_html(), "<p>one <i>two</i></p>");
}

#[test]
fn exec_action_ignores_selection_past_end() {
    let mut doc = Document::from_text("one");
    doc.exec_action("b", Selection::new(10, 20));
    assert_eq!(doc.to_html(), "<p>one</p>");

    doc.exec_action("u", Selection::new(1, 50));
    assert_eq!(doc.to_html(), "<p><u>one</u></p>");
}

#[test]
fn set_block_type_retypes_touched_blocks() {
    let mut doc = Document::from_text("title\nbody\nmore");
    doc.set_block_type(Selection::collapsed(0), BlockType::heading(1).unwrap());
    assert_eq!(doc.to_html(), "<h1>title\n</h1><p>body\n</p><p>more</p>");

    doc.set_block_type(Selection::new(7, 12), BlockType::BLOCKQUOTE);
    assert_eq!(
        doc.to_html(),
        "<h1>title\n</h1><blockquote>body\n</blockquote><blockquote>more</blockquote>"
    );
}

#[test]
fn insert_after_splits_block_words_on_attach() {
    let mut doc = Document::from_text("one\n");
    let first = doc.blocks()[0];
    let word = doc.create_word("two\nthree");
    let block = doc.create_block(&[word]);
    assert!(!doc.block(block).unwrap().is_attached());

    doc.insert_after(Some(first), block);

    assert_eq!(
        block_words(&doc),
        vec![vec!["one\n"], vec!["two\n"], vec!["three"], vec![""]]
    );
    assert_eq!(doc.to_string(), "one\ntwo\nthree");
    assert_in_sync(&doc);
}

#[test]
fn remove_block_detaches_and_reports() {
    let mut doc = Document::from_text("a\nb");
    let first = doc.blocks()[0];

    assert_eq!(doc.remove_block(first), Removal::Removed);
    assert_eq!(doc.to_string(), "b");
    assert_eq!(doc.remove_block(first), Removal::Missing);
    assert!(!doc.block(first).unwrap().is_attached());

    doc.insert_after(None, first);
    assert_eq!(doc.to_string(), "ba\n");
}

#[test]
fn removing_last_block_reseeds() {
    let mut doc = Document::from_text("only");
    let block = doc.blocks()[0];

    doc.remove_block(block);

    assert_eq!(doc.blocks().len(), 1);
    assert_ne!(doc.blocks()[0], block);
    assert!(doc.is_empty());
    assert_in_sync(&doc);
}

#[test]
fn tree_labels_blocks_words_and_characters() {
    let mut doc = Document::from_text("hi there");
    doc.exec_action("b", Selection::new(0, 1));
    let tree = doc.to_tree();

    assert_eq!(tree.id, "doc");
    assert_eq!(tree.name, "d");
    let block = tree.nodes().next().unwrap();
    assert_eq!(block.id, "b0");
    assert_eq!(block.name, "B");
    assert_eq!(block.kind.as_deref(), Some("p"));

    let words: Vec<&str> = block.nodes().map(|word| word.id.as_str()).collect();
    assert_eq!(words, vec!["w0-0", "w0-1"]);
    let space = block.nodes().next().unwrap().nodes().nth(2).unwrap();
    assert_eq!(space.id, "c0-0-2");
    assert_eq!(space.name, "[ ]");
    assert_eq!(space.props().collect::<Vec<_>>(), vec!["b"]);
}

#[test]
fn json_round_trips_through_tree() {
    let doc = Document::from_text("a\nb");
    let json = doc.to_json().unwrap();
    assert!(json.contains(r#""name":"\\n""#));

    let parsed: TreeNode = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, doc.to_tree());
    assert!(doc.to_json_pretty().unwrap().contains('\n'));
}

#[test]
fn selection_orders_its_ends() {
    let selection = Selection::new(9, 3);
    assert_eq!(selection, Selection { start: 3, end: 9 });
    assert_eq!(selection.len(), 6);
    assert!(Selection::collapsed(4).is_empty());
}

#[test]
fn anchor_falls_back_to_edges() {
    let siblings = [10, 20, 30];
    assert_eq!(Anchor::Before(Some(20)).index_in(&siblings), 1);
    assert_eq!(Anchor::After(Some(20)).index_in(&siblings), 2);
    assert_eq!(Anchor::Before(Some(99)).index_in(&siblings), 0);
    assert_eq!(Anchor::After(None).index_in(&siblings), 3);
}

#[test]
fn clearing_across_appended_block_keeps_terminator() {
    let mut doc = Document::from_text("ab");
    let word = doc.create_word("xy");
    let block = doc.create_block(&[word]);
    doc.insert_after(None, block);
    assert_eq!(doc.len(), 5);

    let removed = doc.remove_chars_at(0, 5);

    assert_eq!(removed.len(), 4);
    assert!(removed.iter().all(|ch| ch.parent().is_none()));
    assert_eq!(doc.blocks().len(), 1);
    assert!(doc.is_empty());
    assert!(doc.character(doc.tail()).unwrap().is_terminator());
    assert_in_sync(&doc);

    doc.insert_chars_at(0, "hi");
    assert_eq!(doc.to_string(), "hi");
    assert_eq!(doc.len(), 3);
    assert_in_sync(&doc);
}

#[test]
fn emptying_every_block_reseeds() {
    let mut doc = Document::from_text("ab");
    let first = doc.blocks()[0];
    let word = doc.create_word("xy");
    let block = doc.create_block(&[word]);
    doc.insert_after(None, block);
    doc.remove_block(first);
    assert_eq!(doc.to_string(), "xy");

    doc.remove_chars_at(0, 2);

    assert_eq!(doc.blocks().len(), 1);
    assert!(doc.is_empty());
    assert_in_sync(&doc);

    doc.insert_chars_at(0, "ok\nthen");
    assert_eq!(block_words(&doc), vec![vec!["ok\n"], vec!["then"]]);
    assert_in_sync(&doc);
}

#[test]
fn dropping_detached_nodes_frees_them() {
    let mut doc = Document::from_text("a\nb c");
    let first = doc.blocks()[0];
    let first_char = doc.chars()[0];

    assert!(!doc.drop_block(first));
    doc.remove_block(first);
    assert!(doc.drop_block(first));
    assert!(doc.block(first).is_none());
    assert!(doc.character(first_char).is_none());
    assert!(!doc.drop_block(first));

    let second = doc.blocks()[0];
    let kept = doc.block(second).unwrap().get_words()[0];
    let trailing = doc.block_mut(second).unwrap().remove_words_after(kept);
    assert_eq!(trailing.len(), 1);

    assert!(!doc.drop_word(kept));
    assert!(doc.drop_word(trailing[0]));
    assert!(doc.word(trailing[0]).is_none());
    assert_eq!(doc.to_string(), "b ");
    assert_in_sync(&doc);
}

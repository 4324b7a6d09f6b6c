/// Line feed. Ends a Word and the Block holding it.
pub const NEW_LINE: char = '\n';

/// Carriage return. Treated as ordinary content so `\r\n` line endings keep
/// exactly one Word boundary and one Block boundary.
pub const CARRIAGE_RETURN: char = '\r';

pub const SPACE: char = ' ';

/// Element names that open a block-level box when markup is walked. Anything
/// else is inline content.
pub const BLOCK_NAMES: &[&str] = &[
    "address",
    "blockquote",
    "div",
    "dl",
    "fieldset",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "hr",
    "noscript",
    "ol",
    "p",
    "pre",
    "article",
    "aside",
    "audio",
    "canvas",
    "dd",
    "figcaption",
    "figure",
    "footer",
    "hgroup",
    "main",
    "nav",
    "output",
    "section",
    "table",
    "tfoot",
    "ul",
    "video",
    "dt",
    "li",
    "tbody",
    "td",
    "th",
    "thead",
    "tr",
];

pub fn is_newline(ch: char) -> bool {
    ch == NEW_LINE
}

pub fn is_space(ch: char) -> bool {
    ch.is_whitespace() && ch != NEW_LINE && ch != CARRIAGE_RETURN
}

pub fn is_separator(ch: char) -> bool {
    is_newline(ch) || is_space(ch)
}

pub fn is_block_name(name: &str) -> bool {
    let name = name.trim();
    BLOCK_NAMES
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(name))
}

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};
use unicode_width::UnicodeWidthChar;

use crate::block::{BlockRef, BlockType};
use crate::character::Character;
use crate::document::{Document, Selection};
use crate::theme::Theme;
use crate::tree::TreeNode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorVisualPosition {
    pub line: usize,
    pub column: u16,
}

#[derive(Debug)]
pub struct RenderResult {
    pub lines: Vec<Line<'static>>,
    pub cursor: Option<CursorVisualPosition>,
    pub total_lines: usize,
}

/// Lays out every Block of `document` as wrapped terminal lines. `cursor`
/// is a flat character offset; the characters inside `selection` get the
/// theme's selection colors.
pub fn render_document(
    document: &Document,
    width: usize,
    cursor: Option<usize>,
    selection: Selection,
    theme: &Theme,
) -> RenderResult {
    let mut renderer = Renderer::new(width.max(1), cursor, selection, theme);
    renderer.render_document(document);
    renderer.finish()
}

/// Indented outline of a debug tree, one line per node.
pub fn render_tree(tree: &TreeNode, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    push_tree_node(tree, 0, theme, &mut lines);
    lines
}

fn push_tree_node(node: &TreeNode, depth: usize, theme: &Theme, lines: &mut Vec<Line<'static>>) {
    let name = if node.name.is_empty() {
        "(end)"
    } else {
        node.name.as_str()
    };
    let mut spans = vec![Span::raw(format!("{}{}", "  ".repeat(depth), name))];
    if let Some(kind) = &node.kind {
        spans.push(Span::styled(format!(" <{kind}>"), theme.tree_kind_style()));
    }
    let props: Vec<&str> = node.props().collect();
    if !props.is_empty() {
        spans.push(Span::styled(
            format!(" [{}]", props.join(",")),
            theme.tree_prop_style(),
        ));
    }
    lines.push(Line::from(spans));
    for child in node.nodes() {
        push_tree_node(child, depth + 1, theme, lines);
    }
}

/// Block type followed by the formatting active on the character at
/// `offset`, for the status bar.
pub fn breadcrumbs(document: &Document, offset: usize) -> Vec<String> {
    let Some(&ch) = document.chars().get(offset) else {
        return Vec::new();
    };
    let mut labels = Vec::new();
    if let Some(block) = document
        .word_of(ch)
        .and_then(|word| document.block_of(word))
        .and_then(|block| document.block(block))
    {
        labels.push(block.kind().to_string());
    }
    if let Some(character) = document.character(ch) {
        labels.extend(character.get_props().into_iter().map(str::to_string));
    }
    labels
}

struct Renderer<'a> {
    wrap_width: usize,
    cursor_offset: Option<usize>,
    selection: Selection,
    theme: &'a Theme,
    cursor: Option<CursorVisualPosition>,
    lines: Vec<Line<'static>>,
    current_line_index: usize,
    offset: usize,
}

impl<'a> Renderer<'a> {
    fn new(
        wrap_width: usize,
        cursor_offset: Option<usize>,
        selection: Selection,
        theme: &'a Theme,
    ) -> Self {
        Self {
            wrap_width,
            cursor_offset,
            selection,
            theme,
            cursor: None,
            lines: Vec::new(),
            current_line_index: 0,
            offset: 0,
        }
    }

    fn render_document(&mut self, document: &Document) {
        for block in document.blocks().iter().filter_map(|block| document.block(*block)) {
            self.render_block(document, &block);
        }
    }

    fn render_block(&mut self, document: &Document, block: &BlockRef<'_>) {
        let kind = block.kind();
        let fragments = self.collect_fragments(document, block, kind);
        if let Some(level) = kind.heading_level() {
            self.render_heading(&fragments, level);
            return;
        }
        let lines = match kind.as_str() {
            "blockquote" => wrap_fragments(&fragments, "| ", "| ", self.wrap_width),
            "li" => wrap_fragments(&fragments, "• ", "  ", self.wrap_width),
            "pre" => wrap_fragments(&fragments, "", "", usize::MAX / 4),
            _ => wrap_fragments(&fragments, "", "", self.wrap_width),
        };
        self.consume_lines(lines);
    }

    fn render_heading(&mut self, fragments: &[Fragment], level: u8) {
        let mut lines = wrap_fragments(fragments, "", "", self.wrap_width);
        for line in &mut lines {
            for segment in &mut line.spans {
                segment.style = segment.style.add_modifier(Modifier::BOLD);
            }
        }
        self.consume_lines(lines);

        let underline_char = match level {
            1 => '=',
            2 => '-',
            _ => return,
        };
        let width = self.lines.last().map(line_width).unwrap_or(0);
        self.push_plain_line(&underline_string(width, underline_char));
    }

    fn collect_fragments(
        &mut self,
        document: &Document,
        block: &BlockRef<'_>,
        kind: BlockType,
    ) -> Vec<Fragment> {
        let base = if kind == BlockType::PREFORMATTED {
            Style::default().add_modifier(Modifier::DIM)
        } else {
            Style::default()
        };
        let mut fragments = Vec::new();
        let mut builder: Option<TokenBuilder> = None;
        let mut pending_events: Vec<TextEvent> = Vec::new();
        let mut expanded: Vec<char> = Vec::new();

        for id in block.get_chars() {
            let offset = self.offset;
            self.offset += 1;
            if self.cursor_offset == Some(offset) {
                pending_events.push(TextEvent { offset: 0 });
            }
            let Some(character) = document.character(id) else {
                continue;
            };
            let Some(ch) = character.value() else {
                continue;
            };
            if ch == '\r' || ch == '\n' {
                continue;
            }

            let mut style = char_style(base, character);
            if offset >= self.selection.start && offset < self.selection.end {
                style = style.patch(self.theme.selection_style());
            }
            expanded.clear();
            if ch == '\t' {
                expanded.extend_from_slice(&[' '; 4]);
            } else {
                expanded.push(ch);
            }
            for &actual in &expanded {
                let is_whitespace = actual.is_whitespace();
                if builder
                    .as_ref()
                    .is_some_and(|existing| existing.kind_matches(is_whitespace))
                {
                    if let Some(current) = builder.as_mut() {
                        current.add_events(&mut pending_events);
                        current.push_char(actual, style);
                    }
                } else {
                    if let Some(mut existing) = builder.take() {
                        existing.add_events(&mut pending_events);
                        fragments.push(existing.finish());
                    }
                    let mut next = TokenBuilder::new(is_whitespace);
                    next.add_events(&mut pending_events);
                    next.push_char(actual, style);
                    builder = Some(next);
                }
            }
        }

        if let Some(mut token) = builder {
            token.add_events(&mut pending_events);
            fragments.push(token.finish());
        }
        if !pending_events.is_empty() {
            fragments.push(Fragment {
                segments: Vec::new(),
                kind: FragmentKind::Word,
                width: 0,
                events: pending_events,
            });
        }
        fragments
    }

    fn push_plain_line(&mut self, content: &str) {
        self.lines.push(Line::from(vec![Span::raw(content.to_string())]));
        self.current_line_index += 1;
    }

    fn consume_lines(&mut self, outputs: Vec<LineOutput>) {
        for output in outputs {
            let spans: Vec<Span<'static>> = output
                .spans
                .into_iter()
                .map(|segment| Span::styled(segment.text, segment.style))
                .collect();
            if let Some(event) = output.events.last() {
                self.cursor = Some(CursorVisualPosition {
                    line: self.current_line_index,
                    column: event.column,
                });
            }
            self.lines.push(Line::from(spans));
            self.current_line_index += 1;
        }
    }

    fn finish(mut self) -> RenderResult {
        if self.lines.is_empty() {
            self.lines.push(Line::from(""));
        }
        let total_lines = self.lines.len();
        RenderResult {
            lines: self.lines,
            cursor: self.cursor,
            total_lines,
        }
    }
}

fn char_style(base: Style, character: &Character) -> Style {
    character
        .get_props()
        .into_iter()
        .fold(base, |style, prop| match prop {
            "b" | "strong" => style.add_modifier(Modifier::BOLD),
            "i" | "em" => style.add_modifier(Modifier::ITALIC),
            "u" => style.add_modifier(Modifier::UNDERLINED),
            "s" | "strike" => style.add_modifier(Modifier::CROSSED_OUT),
            "mark" => style.add_modifier(Modifier::REVERSED),
            "code" => style.add_modifier(Modifier::DIM),
            _ => style,
        })
}

#[derive(Clone)]
struct LineSegment {
    text: String,
    style: Style,
}

struct LineOutput {
    spans: Vec<LineSegment>,
    events: Vec<LocatedEvent>,
}

#[derive(Clone, Copy)]
struct LocatedEvent {
    column: u16,
}

#[derive(Clone)]
struct Fragment {
    segments: Vec<LineSegment>,
    kind: FragmentKind,
    width: usize,
    events: Vec<TextEvent>,
}

#[derive(Clone, Copy)]
enum FragmentKind {
    Word,
    Whitespace,
}

/// Cursor placement inside a fragment, in columns from its start.
#[derive(Clone, Copy)]
struct TextEvent {
    offset: usize,
}

struct TokenBuilder {
    segments: Vec<LineSegment>,
    kind: FragmentKind,
    width: usize,
    events: Vec<TextEvent>,
}

impl TokenBuilder {
    fn new(is_whitespace: bool) -> Self {
        Self {
            segments: Vec::new(),
            kind: if is_whitespace {
                FragmentKind::Whitespace
            } else {
                FragmentKind::Word
            },
            width: 0,
            events: Vec::new(),
        }
    }

    fn kind_matches(&self, is_whitespace: bool) -> bool {
        matches!(
            (self.kind, is_whitespace),
            (FragmentKind::Whitespace, true) | (FragmentKind::Word, false)
        )
    }

    fn add_events(&mut self, pending: &mut Vec<TextEvent>) {
        for mut event in pending.drain(..) {
            event.offset = self.width;
            self.events.push(event);
        }
    }

    fn push_char(&mut self, ch: char, style: Style) {
        match self.segments.last_mut() {
            Some(segment) if segment.style == style => segment.text.push(ch),
            _ => self.segments.push(LineSegment {
                text: ch.to_string(),
                style,
            }),
        }
        self.width += UnicodeWidthChar::width(ch).unwrap_or(0);
    }

    fn finish(self) -> Fragment {
        Fragment {
            segments: self.segments,
            kind: self.kind,
            width: self.width,
            events: self.events,
        }
    }
}

fn wrap_fragments(
    fragments: &[Fragment],
    first_prefix: &str,
    continuation_prefix: &str,
    width: usize,
) -> Vec<LineOutput> {
    let mut outputs = Vec::new();
    let mut builder = LineBuilder::new(first_prefix);
    let mut pending_whitespace: Vec<Fragment> = Vec::new();

    for token in fragments {
        match token.kind {
            FragmentKind::Whitespace => pending_whitespace.push(token.clone()),
            FragmentKind::Word => {
                let whitespace_width: usize =
                    pending_whitespace.iter().map(|item| item.width).sum();
                if builder.width > builder.prefix_width
                    && builder.width + whitespace_width + token.width > width
                {
                    builder.consume_pending(&mut pending_whitespace);
                    outputs.push(builder.build_line());
                    builder = LineBuilder::new(continuation_prefix);
                }
                builder.consume_pending(&mut pending_whitespace);
                builder.append_token(token.clone());
            }
        }
    }

    builder.consume_pending(&mut pending_whitespace);
    outputs.push(builder.build_line());
    outputs
}

struct LineBuilder {
    segments: Vec<LineSegment>,
    events: Vec<LocatedEvent>,
    width: usize,
    prefix_width: usize,
}

impl LineBuilder {
    fn new(prefix: &str) -> Self {
        let prefix_width = visible_width(prefix);
        let mut segments = Vec::new();
        if !prefix.is_empty() {
            segments.push(LineSegment {
                text: prefix.to_string(),
                style: Style::default(),
            });
        }
        Self {
            segments,
            events: Vec::new(),
            width: prefix_width,
            prefix_width,
        }
    }

    fn consume_pending(&mut self, pending_whitespace: &mut Vec<Fragment>) {
        for fragment in pending_whitespace.drain(..) {
            self.append_token(fragment);
        }
    }

    fn append_token(&mut self, fragment: Fragment) {
        let start = self.width;
        self.segments.extend(fragment.segments);
        self.width += fragment.width;
        for event in fragment.events {
            self.events.push(LocatedEvent {
                column: (start + event.offset) as u16,
            });
        }
    }

    fn build_line(mut self) -> LineOutput {
        if self.segments.is_empty() {
            self.segments.push(LineSegment {
                text: String::new(),
                style: Style::default(),
            });
        }
        self.events.sort_by_key(|event| event.column);
        LineOutput {
            spans: self.segments,
            events: self.events,
        }
    }
}

fn visible_width(text: &str) -> usize {
    text.chars()
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .sum()
}

fn line_width(line: &Line<'_>) -> usize {
    line.spans
        .iter()
        .map(|span| visible_width(span.content.as_ref()))
        .sum()
}

fn underline_string(width: usize, ch: char) -> String {
    std::iter::repeat_n(ch, width.max(1)).collect()
}

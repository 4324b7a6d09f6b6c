use std::{
    fs, io,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{LevelFilter, debug, info};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
};

use words_tui::render::{RenderResult, breadcrumbs, render_document, render_tree};
use words_tui::theme::Theme;
use words_tui::{BlockType, Document, Selection, sync_text};

const STATUS_TIMEOUT: Duration = Duration::from_secs(4);
const TREE_PANEL_WIDTH: u16 = 36;

#[derive(Clone, Debug)]
struct CliOptions {
    file: Option<PathBuf>,
    html_file: PathBuf,
    log_file: Option<PathBuf>,
    verbosity: u8,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        RawCli::parse().try_into()
    }
}

#[derive(Parser, Debug)]
#[command(name = "words", about, long_about = None)]
struct RawCli {
    /// Write the formatted document here on Ctrl-S (defaults to FILE with an .html extension)
    #[arg(long = "html", value_name = "FILE")]
    html_file: Option<PathBuf>,

    /// Save logs to a specific file
    #[arg(long = "log", value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Increase logging verbosity (repeat for more detail)
    #[arg(short = 'v', action = ArgAction::Count)]
    verbosity: u8,

    /// Plain text file to start from
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,
}

impl TryFrom<RawCli> for CliOptions {
    type Error = anyhow::Error;

    fn try_from(raw: RawCli) -> Result<Self> {
        let html_file = match (raw.html_file, &raw.file) {
            (Some(path), _) => path,
            (None, Some(file)) => file.with_extension("html"),
            (None, None) => PathBuf::from("words.html"),
        };
        if raw.file.as_deref() == Some(html_file.as_path()) {
            anyhow::bail!("refusing to overwrite the input file with HTML output");
        }
        Ok(Self {
            file: raw.file,
            html_file,
            log_file: raw.log_file,
            verbosity: raw.verbosity,
        })
    }
}

fn main() -> Result<()> {
    let options = CliOptions::parse()?;
    init_logging(&options)?;
    run(options)
}

/// The terminal owns stdout and stderr, so logs only go to a file.
fn init_logging(options: &CliOptions) -> Result<()> {
    let Some(path) = &options.log_file else {
        return Ok(());
    };
    let file = fs::File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    let level = match options.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .context("failed to initialize logging")?;
    Ok(())
}

fn editor_wrap_configuration(width: usize) -> (usize, usize) {
    if width == 0 {
        return (1, 0);
    }
    if width < 60 {
        let wrap_width = width.saturating_sub(1).max(1);
        return (wrap_width, 0);
    }
    if width < 100 {
        let padding = 2.min(width / 2);
        let wrap_width = width.saturating_sub(padding.saturating_mul(2)).max(1);
        return (wrap_width, padding);
    }
    let max_padding = width.saturating_sub(1) / 2;
    let left_padding = (width.saturating_sub(100) / 2 + 4).min(max_padding);
    let wrap_width = width.saturating_sub(left_padding.saturating_mul(2)).max(1);
    (wrap_width, left_padding)
}

fn run(options: CliOptions) -> Result<()> {
    let (text, initial_status) = load_text(options.file.as_deref())?;
    let mut app = App::new(&text, options, initial_status);

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to initialize terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().ok();

    let res = run_app(&mut terminal, &mut app).context("application error");

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    res
}

fn load_text(path: Option<&Path>) -> Result<(String, Option<String>)> {
    match path {
        Some(path) if path.exists() => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            info!("loaded {} ({} bytes)", path.display(), content.len());
            Ok((content, None))
        }
        _ => Ok((String::new(), Some("New document".to_string()))),
    }
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();
    let mut needs_redraw = true;

    while !app.should_quit {
        if needs_redraw {
            terminal
                .draw(|frame| app.draw(frame))
                .context("failed to draw frame")?;
            needs_redraw = false;
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout).context("event poll failed")? {
            let evt = event::read().context("failed to read event")?;
            app.handle_event(evt)?;
            needs_redraw = true;
        }

        if last_tick.elapsed() >= tick_rate {
            let had_message_before = app.status_message.is_some();
            app.prune_status_message();
            last_tick = Instant::now();
            if had_message_before && app.status_message.is_none() {
                needs_redraw = true;
            }
        }
    }

    Ok(())
}

struct App {
    document: Document,
    /// The editable surface. Every change is replayed onto `document`.
    surface: Vec<char>,
    cursor: usize,
    selection_anchor: Option<usize>,
    text_path: Option<PathBuf>,
    html_path: PathBuf,
    theme: Theme,
    scroll_top: usize,
    show_tree: bool,
    should_quit: bool,
    dirty: bool,
    status_message: Option<(String, Instant)>,
}

impl App {
    fn new(text: &str, options: CliOptions, initial_status: Option<String>) -> Self {
        Self {
            document: Document::from_text(text),
            surface: text.chars().collect(),
            cursor: 0,
            selection_anchor: None,
            text_path: options.file,
            html_path: options.html_file,
            theme: Theme::default(),
            scroll_top: 0,
            show_tree: false,
            should_quit: false,
            dirty: false,
            status_message: initial_status.map(|msg| (msg, Instant::now())),
        }
    }

    fn selection(&self) -> Option<Selection> {
        let anchor = self.selection_anchor?;
        (anchor != self.cursor).then(|| Selection::new(anchor, self.cursor))
    }

    /// The active selection, or the character under the cursor so that a
    /// formatting toggle hits the Word being edited.
    fn action_target(&self) -> Selection {
        self.selection()
            .unwrap_or_else(|| Selection::new(self.cursor, self.cursor + 1))
    }

    fn prepare_selection(&mut self, extend: bool) {
        if extend {
            self.selection_anchor.get_or_insert(self.cursor);
        } else {
            self.selection_anchor = None;
        }
    }

    fn replace_selection(&mut self, text: &str) {
        let (start, end) = self
            .selection()
            .map(|selection| (selection.start, selection.end))
            .unwrap_or((self.cursor, self.cursor));
        self.surface.splice(start..end, text.chars());
        self.cursor = start + text.chars().count();
        self.selection_anchor = None;
        self.sync();
    }

    fn delete_backward(&mut self) {
        if self.selection().is_some() {
            self.replace_selection("");
        } else if self.cursor > 0 {
            self.cursor -= 1;
            self.surface.remove(self.cursor);
            self.sync();
        }
    }

    fn delete_forward(&mut self) {
        if self.selection().is_some() {
            self.replace_selection("");
        } else if self.cursor < self.surface.len() {
            self.surface.remove(self.cursor);
            self.sync();
        }
    }

    fn sync(&mut self) {
        let text: String = self.surface.iter().collect();
        let report = sync_text(&mut self.document, &text);
        if !report.is_empty() {
            debug!("surface edit: {report:?}");
            self.dirty = true;
        }
    }

    fn apply_action(&mut self, action: &str) {
        let target = self.action_target();
        self.document.exec_action(action, target);
        self.dirty = true;
    }

    fn apply_block_type(&mut self, kind: BlockType) {
        let target = self.selection().unwrap_or(Selection::collapsed(self.cursor));
        self.document.set_block_type(target, kind);
        self.dirty = true;
        self.status_message = Some((format!("Block type: {kind}"), Instant::now()));
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        if area.height == 0 || area.width == 0 {
            return;
        }

        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(area);
        let editor_area = vertical[0];
        let status_area = vertical[1];

        let (text_area, tree_area) = if self.show_tree && editor_area.width > TREE_PANEL_WIDTH * 2 {
            let horizontal = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Min(1), Constraint::Length(TREE_PANEL_WIDTH)])
                .split(editor_area);
            (horizontal[0], Some(horizontal[1]))
        } else {
            (editor_area, None)
        };

        let (wrap_width, left_padding) = editor_wrap_configuration(text_area.width as usize);
        let selection = self.selection().unwrap_or_default();
        let render = render_document(
            &self.document,
            wrap_width,
            Some(self.cursor),
            selection,
            &self.theme,
        );
        let viewport_height = text_area.height as usize;
        self.adjust_scroll(&render, viewport_height);

        let padded = Rect {
            x: text_area.x + left_padding as u16,
            width: text_area.width.saturating_sub(left_padding as u16),
            ..text_area
        };
        let paragraph = Paragraph::new(Text::from(render.lines.clone()))
            .style(self.theme.editor_style())
            .scroll((self.scroll_top as u16, 0));
        frame.render_widget(paragraph, padded);

        if let Some(cursor) = render.cursor
            && cursor.line >= self.scroll_top
            && cursor.line < self.scroll_top + viewport_height
            && padded.width > 0
        {
            let cursor_y = padded.y + (cursor.line - self.scroll_top) as u16;
            let cursor_x = padded.x + cursor.column.min(padded.width - 1);
            frame.set_cursor_position(Position::new(cursor_x, cursor_y));
        }

        if let Some(tree_area) = tree_area {
            self.draw_tree(frame, tree_area);
        }

        let status_line = self.status_line(status_area.width as usize);
        let status_widget = Paragraph::new(status_line).style(self.theme.status_bar_style());
        frame.render_widget(status_widget, status_area);
    }

    fn draw_tree(&self, frame: &mut Frame, area: Rect) {
        let lines = render_tree(&self.document.to_tree(), &self.theme);
        let panel = Paragraph::new(Text::from(lines)).block(
            Block::default()
                .borders(Borders::LEFT)
                .border_style(self.theme.panel_style())
                .title(" tree "),
        );
        frame.render_widget(panel, area);
    }

    fn adjust_scroll(&mut self, render: &RenderResult, viewport_height: usize) {
        let viewport = viewport_height.max(1);
        let max_scroll = render.total_lines.saturating_sub(viewport);
        if let Some(cursor) = render.cursor {
            if cursor.line < self.scroll_top {
                self.scroll_top = cursor.line;
            } else if cursor.line >= self.scroll_top + viewport {
                self.scroll_top = cursor.line + 1 - viewport;
            }
        }
        self.scroll_top = self.scroll_top.min(max_scroll);
    }

    fn status_line(&mut self, terminal_width: usize) -> Line<'static> {
        self.prune_status_message();

        let (line, column) = line_and_column(&self.surface, self.cursor);
        let position = format!("{}:{}", line + 1, column + 1);
        if let Some((message, _)) = &self.status_message {
            return Line::from(vec![
                Span::raw(format!("{position} ")),
                Span::raw(message.clone()),
            ]);
        }

        let filename = self
            .text_path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "[untitled]".to_string());
        let marker = if self.dirty { "*" } else { "" };
        let crumbs = breadcrumbs(&self.document, self.cursor).join(" > ");

        let mut spans = vec![
            Span::raw(position),
            Span::raw(" "),
            Span::styled(format!("{filename}{marker}"), self.theme.filename_style()),
        ];
        if !crumbs.is_empty() {
            spans.push(Span::raw(format!(" {crumbs}")));
        }
        spans.push(Span::raw(format!(
            ", {} blocks, {} words",
            self.document.blocks().len(),
            self.count_words()
        )));

        let shortcuts = ["^B/^I/^U:Format", "F9:Tree", "^S:Save", "^Q:Quit"];
        let left_width: usize = spans.iter().map(|span| span.content.chars().count()).sum();
        let mut shown: Vec<&str> = Vec::new();
        let mut shown_width = 0;
        for shortcut in shortcuts.iter().rev() {
            let width = if shown.is_empty() {
                shortcut.chars().count()
            } else {
                shown_width + 1 + shortcut.chars().count()
            };
            if left_width + 1 + width > terminal_width {
                break;
            }
            shown.insert(0, shortcut);
            shown_width = width;
        }
        if !shown.is_empty() {
            let padding = terminal_width
                .saturating_sub(left_width)
                .saturating_sub(shown_width)
                .max(1);
            spans.push(Span::raw(" ".repeat(padding)));
            spans.push(Span::raw(shown.join(" ")));
        }

        Line::from(spans)
    }

    fn prune_status_message(&mut self) {
        if let Some((_, instant)) = &self.status_message
            && instant.elapsed() > STATUS_TIMEOUT
        {
            self.status_message = None;
        }
    }

    fn count_words(&self) -> usize {
        self.document
            .words()
            .filter(|word| {
                word.characters()
                    .any(|ch| !ch.is_separator() && !ch.is_terminator())
            })
            .count()
    }

    fn save(&mut self) -> Result<()> {
        fs::write(&self.html_path, self.document.to_html())
            .with_context(|| format!("failed to write {}", self.html_path.display()))?;
        info!("wrote {}", self.html_path.display());
        self.dirty = false;
        self.status_message = Some((
            format!("Wrote {}", self.html_path.display()),
            Instant::now(),
        ));
        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = event
        else {
            return Ok(());
        };

        let shift = modifiers.contains(KeyModifiers::SHIFT);
        match (code, modifiers) {
            (KeyCode::Char('q') | KeyCode::Char('c'), m) if m.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            (KeyCode::Char('s'), m) if m.contains(KeyModifiers::CONTROL) => {
                if let Err(err) = self.save() {
                    self.status_message = Some((format!("{err:#}"), Instant::now()));
                }
            }
            (KeyCode::Char('b'), m) if m.contains(KeyModifiers::CONTROL) => self.apply_action("b"),
            (KeyCode::Char('i'), m) if m.contains(KeyModifiers::CONTROL) => self.apply_action("i"),
            (KeyCode::Char('u'), m) if m.contains(KeyModifiers::CONTROL) => self.apply_action("u"),
            (KeyCode::Char(digit @ '0'..='6'), m) if m.contains(KeyModifiers::ALT) => {
                let kind = match digit.to_digit(10) {
                    Some(level @ 1..=6) => BlockType::heading(level as u8),
                    _ => Some(BlockType::PARAGRAPH),
                };
                if let Some(kind) = kind {
                    self.apply_block_type(kind);
                }
            }
            (KeyCode::Char('q'), m) if m.contains(KeyModifiers::ALT) => {
                self.apply_block_type(BlockType::BLOCKQUOTE);
            }
            (KeyCode::Char('l'), m) if m.contains(KeyModifiers::ALT) => {
                self.apply_block_type(BlockType::LIST_ITEM);
            }
            (KeyCode::F(9), _) => {
                self.show_tree = !self.show_tree;
            }
            (KeyCode::Left, _) => {
                self.prepare_selection(shift);
                self.cursor = self.cursor.saturating_sub(1);
            }
            (KeyCode::Right, _) => {
                self.prepare_selection(shift);
                self.cursor = (self.cursor + 1).min(self.surface.len());
            }
            (KeyCode::Up, _) => {
                self.prepare_selection(shift);
                self.cursor = move_vertically(&self.surface, self.cursor, -1);
            }
            (KeyCode::Down, _) => {
                self.prepare_selection(shift);
                self.cursor = move_vertically(&self.surface, self.cursor, 1);
            }
            (KeyCode::Home, _) => {
                self.prepare_selection(shift);
                self.cursor = line_start(&self.surface, self.cursor);
            }
            (KeyCode::End, _) => {
                self.prepare_selection(shift);
                self.cursor = line_end(&self.surface, self.cursor);
            }
            (KeyCode::Backspace, _) => self.delete_backward(),
            (KeyCode::Delete, _) => self.delete_forward(),
            (KeyCode::Enter, _) => self.replace_selection("\n"),
            (KeyCode::Tab, _) => self.replace_selection("\t"),
            (KeyCode::Esc, _) => self.selection_anchor = None,
            (KeyCode::Char(ch), m)
                if !m.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.replace_selection(ch.encode_utf8(&mut [0; 4]));
            }
            _ => {}
        }
        Ok(())
    }
}

fn line_start(text: &[char], cursor: usize) -> usize {
    text[..cursor.min(text.len())]
        .iter()
        .rposition(|ch| *ch == '\n')
        .map(|index| index + 1)
        .unwrap_or(0)
}

fn line_end(text: &[char], cursor: usize) -> usize {
    let cursor = cursor.min(text.len());
    text[cursor..]
        .iter()
        .position(|ch| *ch == '\n')
        .map(|index| cursor + index)
        .unwrap_or(text.len())
}

fn line_and_column(text: &[char], cursor: usize) -> (usize, usize) {
    let cursor = cursor.min(text.len());
    let line = text[..cursor].iter().filter(|ch| **ch == '\n').count();
    (line, cursor - line_start(text, cursor))
}

/// Moves `cursor` one line up (`delta < 0`) or down, keeping the column when
/// the target line is long enough.
fn move_vertically(text: &[char], cursor: usize, delta: isize) -> usize {
    let start = line_start(text, cursor);
    let column = cursor - start;
    if delta < 0 {
        if start == 0 {
            return 0;
        }
        let previous = line_start(text, start - 1);
        (previous + column).min(start - 1)
    } else {
        let end = line_end(text, cursor);
        if end == text.len() {
            return text.len();
        }
        let next = end + 1;
        (next + column).min(line_end(text, next))
    }
}

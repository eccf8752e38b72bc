use crate::tui::app::{App, LoadState, nag_text};
use pgn_tree::events::fmt_bytes;
use pgn_tree::path::NodePath;
use pgn_tree::tree::{Game, MoveNode};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

pub fn render(f: &mut Frame, app: &App) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(8),    // Headers + moves
            Constraint::Length(5), // Position
            Constraint::Length(7), // Logs
            Constraint::Length(3), // Controls
        ])
        .split(area);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(chunks[1]);

    render_title(f, chunks[0], app);
    render_headers(f, body[0], app);
    render_moves(f, body[1], app);
    render_position(f, chunks[2], app);
    render_logs(f, chunks[3], app);
    render_controls(f, chunks[4]);
}

fn render_title(f: &mut Frame, area: Rect, app: &App) {
    let state_span = match &app.load_state {
        LoadState::Loading => Span::styled(" LOADING ", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        LoadState::Ready => Span::styled(" READY ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        LoadState::Error(_) => Span::styled(" ERROR ", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
    };

    let progress = match app.load_state {
        LoadState::Loading if app.dl_total > 0 => {
            format!(" {} / {}", fmt_bytes(app.dl_read), fmt_bytes(app.dl_total))
        }
        LoadState::Loading if app.parse_total > 0 => {
            format!(" {}/{} chunks", app.parse_done, app.parse_total)
        }
        _ if !app.games.is_empty() => format!(" game {}/{}", app.game_index + 1, app.games.len()),
        _ => " no games".to_string(),
    };

    let title = Paragraph::new(Line::from(vec![
        Span::styled(" PGN Tree ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        state_span,
        Span::styled(progress, Style::default().fg(Color::White)),
        Span::styled(format!("  {}", app.source_label), Style::default().fg(Color::DarkGray)),
    ]))
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));
    f.render_widget(title, area);
}

fn render_headers(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Headers ");

    let lines: Vec<Line> = app
        .current_game()
        .map(|game| {
            game.headers
                .iter()
                .map(|(key, value)| {
                    Line::from(vec![
                        Span::styled(format!(" {}: ", key), Style::default().fg(Color::Yellow)),
                        Span::raw(value.to_string()),
                    ])
                })
                .collect()
        })
        .unwrap_or_default();

    f.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}

fn render_moves(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Moves ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(game) = app.current_game() else {
        return;
    };
    let (lines, selected_row) = tree_lines(game, app.cursor.as_ref());

    // Keep the selected row roughly centred once it would scroll off.
    let height = inner.height as usize;
    let offset = match selected_row {
        Some(row) if row >= height => row - height / 2,
        _ => 0,
    };
    f.render_widget(Paragraph::new(lines).scroll((offset as u16, 0)), inner);
}

fn render_position(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Position ");

    let mut lines = vec![Line::from(Span::styled(
        format!(" {}", app.current_position().unwrap_or("-")),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ))];

    match app.selected_node() {
        Some(node) => {
            let mut move_line = format!(" {}{}", node.ply, node.notation);
            for nag in &node.nags {
                move_line.push(' ');
                move_line.push_str(&nag_text(*nag));
            }
            lines.push(Line::from(Span::styled(move_line, Style::default().fg(Color::Cyan))));
            if let Some(comment) = &node.comment {
                lines.push(Line::from(Span::styled(
                    format!(" {}", comment),
                    Style::default().fg(Color::Green),
                )));
            }
        }
        None => lines.push(Line::from(Span::styled(
            " Starting position",
            Style::default().fg(Color::DarkGray),
        ))),
    }

    f.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}

fn render_logs(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" Logs ({}) ", app.logs.len()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let visible_height = inner.height as usize;
    let total = app.logs.len();
    let start = app.log_scroll.min(total.saturating_sub(visible_height));

    let log_lines: Vec<Line> = app
        .logs
        .iter()
        .skip(start)
        .take(visible_height)
        .map(|msg| {
            let style = if msg.starts_with("ERROR") {
                Style::default().fg(Color::Red)
            } else if msg.starts_with("WARN") {
                Style::default().fg(Color::Yellow)
            } else if msg.contains("done") || msg.contains("complete") {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            };
            Line::from(Span::styled(format!("  {}", msg), style))
        })
        .collect();

    f.render_widget(Paragraph::new(log_lines).wrap(Wrap { trim: false }), inner);
}

fn render_controls(f: &mut Frame, area: Rect) {
    let controls = " [←→] Move  [Home/End] Line  [↓] Enter var  [↑] Leave var  [ [ ] ] Sibling var  [Tab] Game  [R] Reload  [Q] Quit ";
    let para = Paragraph::new(Line::from(Span::styled(
        controls,
        Style::default().fg(Color::DarkGray),
    )))
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));
    f.render_widget(para, area);
}

// ── Move tree layout ────────────────────────────────────────────────────────

/// Lay the tree out as rows: main-line move pairs, with each variation on its
/// own indented rows under the move it replaces. Also returns the row holding
/// the selected move.
pub fn tree_lines(game: &Game, cursor: Option<&NodePath>) -> (Vec<Line<'static>>, Option<usize>) {
    let mut rows = Vec::new();
    let mut selected = None;

    // Lines still being laid out; the top one is the one in progress.
    let mut frames = vec![PendingLine::new(&game.moves, Vec::new(), 0)];

    while let Some(frame) = frames.last_mut() {
        let line = frame.line;
        let Some(node) = line.get(frame.next) else {
            if let Some(mut done) = frames.pop() {
                done.flush(&mut rows);
            }
            continue;
        };
        let mut indices = frame.prefix.clone();
        indices.push(frame.next);
        let path = NodePath::from_indices(indices);
        frame.next += 1;

        if node.is_white || frame.needs_number {
            frame.row.push(Span::styled(format!("{} ", node.ply), Style::default().fg(Color::DarkGray)));
        }
        frame.needs_number = false;

        let style = if cursor == Some(&path) {
            selected = Some(rows.len());
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else if frame.depth == 0 {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::Gray)
        };
        frame.row.push(Span::styled(move_text(node), style));
        frame.row.push(Span::raw(" "));

        if !node.variations.is_empty() {
            frame.flush(&mut rows);
            frame.needs_number = true;
            let depth = frame.depth + 1;
            // Pushed in reverse so the first variation is laid out first.
            for (v, variation) in node.variations.iter().enumerate().rev() {
                let mut prefix = path.indices().to_vec();
                prefix.push(v);
                frames.push(PendingLine::new(variation, prefix, depth));
            }
        } else if frame.depth == 0 && !node.is_white {
            frame.flush(&mut rows);
        }
    }

    (rows, selected)
}

/// Deepest level that still gets its own indentation step.
const MAX_INDENT: usize = 16;

struct PendingLine<'a> {
    line: &'a [MoveNode],
    prefix: Vec<usize>,
    depth: usize,
    next: usize,
    needs_number: bool,
    row: Vec<Span<'static>>,
}

impl<'a> PendingLine<'a> {
    fn new(line: &'a [MoveNode], prefix: Vec<usize>, depth: usize) -> Self {
        let mut frame = Self {
            line,
            prefix,
            depth,
            next: 0,
            needs_number: true,
            row: Vec::new(),
        };
        frame.row.push(frame.indent());
        frame
    }

    fn indent(&self) -> Span<'static> {
        Span::raw("  ".repeat(self.depth.min(MAX_INDENT) + 1))
    }

    /// Emit the row in progress, if it holds any moves.
    fn flush(&mut self, rows: &mut Vec<Line<'static>>) {
        let fresh = vec![self.indent()];
        let row = std::mem::replace(&mut self.row, fresh);
        if row.len() > 1 {
            rows.push(Line::from(row));
        }
    }
}

fn move_text(node: &MoveNode) -> String {
    let mut text = node.notation.clone();
    for nag in &node.nags {
        text.push_str(&nag_text(*nag));
    }
    if node.comment.is_some() {
        text.push('*');
    }
    text
}

use crate::diary_entry::DiaryEntry;
use color_eyre::Result;
use crossterm::{
    event::{self, Event, KeyCode},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Terminal,
};
use std::{
    io::{stdout, Stdout},
    time::{Duration, Instant},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub enum Action {
    Write,
    View,
    Delete,
    Quit,
}

#[derive(PartialEq)]
enum FormField {
    Title,
    Content,
}

pub struct UI {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    cursor_position: usize,
    cursor_visible: bool,
    last_cursor_update: Instant,
}

impl UI {
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;

        Ok(UI {
            terminal,
            cursor_position: 0,
            cursor_visible: true,
            last_cursor_update: Instant::now(),
        })
    }

    pub fn display(&mut self, entries: &[DiaryEntry]) -> Result<()> {
        self.terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(1)
                .constraints(
                    [
                        Constraint::Length(3),
                        Constraint::Min(0),
                        Constraint::Length(3),
                    ]
                    .as_ref(),
                )
                .split(f.area());

            let title = Paragraph::new("Atrides Diary")
                .style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )
                .alignment(ratatui::layout::Alignment::Center);
            f.render_widget(title, chunks[0]);

            let items = entry_list_items(entries, chunks[1].width);
            let entries_list =
                List::new(items).block(Block::default().borders(Borders::ALL).title("Entries"));
            f.render_widget(entries_list, chunks[1]);

            let controls = if entries.is_empty() {
                Line::from(vec![
                    Span::raw("Press "),
                    Span::styled("w", Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw(" to write, "),
                    Span::styled("q", Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw(" to quit"),
                ])
            } else {
                Line::from(vec![
                    Span::raw("Press "),
                    Span::styled("w", Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw(" to write, "),
                    Span::styled("v", Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw(" to view, "),
                    Span::styled("d", Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw(" to delete, "),
                    Span::styled("q", Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw(" to quit"),
                ])
            };
            let controls_paragraph = Paragraph::new(controls)
                .style(Style::default().fg(Color::Yellow))
                .alignment(ratatui::layout::Alignment::Center);
            f.render_widget(controls_paragraph, chunks[2]);
        })?;

        Ok(())
    }

    pub fn handle_input(&self, entries: &[DiaryEntry]) -> Result<Option<Action>> {
        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('w') => Ok(Some(Action::Write)),
                KeyCode::Char('q') => Ok(Some(Action::Quit)),
                KeyCode::Char('v') if !entries.is_empty() => Ok(Some(Action::View)),
                KeyCode::Char('d') if !entries.is_empty() => Ok(Some(Action::Delete)),
                _ => Ok(None),
            }
        } else {
            Ok(None)
        }
    }

    /// Two input phases: a single-line title, then a multi-line content
    /// editor. Returns `None` when either field ends up blank, so nothing
    /// half-filled ever reaches the diary.
    pub fn get_new_entry(&mut self) -> Result<Option<DiaryEntry>> {
        let mut title = String::new();
        let mut content = String::new();

        loop {
            self.draw_entry_form("New Diary Entry", &title, &content, FormField::Title)?;

            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Esc | KeyCode::Enter => break,
                    KeyCode::Char(c) => {
                        title.push(c);
                    }
                    KeyCode::Backspace => {
                        title.pop();
                    }
                    _ => {}
                }
            }
        }

        self.cursor_position = 0;
        let mut last_content_update = Instant::now();

        loop {
            let now = Instant::now();
            let should_update_cursor =
                now.duration_since(self.last_cursor_update) >= Duration::from_millis(500);
            let should_redraw = should_update_cursor
                || now.duration_since(last_content_update) < Duration::from_millis(50);

            if should_redraw {
                let content_with_cursor = if self.cursor_visible {
                    let mut content_clone = content.clone();
                    content_clone.insert(self.cursor_position, '|');
                    content_clone
                } else {
                    content.clone()
                };
                self.draw_entry_form(
                    "New Diary Entry",
                    &title,
                    &content_with_cursor,
                    FormField::Content,
                )?;

                if should_update_cursor {
                    self.cursor_visible = !self.cursor_visible;
                    self.last_cursor_update = now;
                }
            }

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    match key.code {
                        KeyCode::Esc => break,
                        KeyCode::Char(c) => {
                            content.insert(self.cursor_position, c);
                            self.cursor_position += c.len_utf8();
                            last_content_update = Instant::now();
                        }
                        KeyCode::Backspace => {
                            if let Some(prev) = content[..self.cursor_position].chars().next_back()
                            {
                                self.cursor_position -= prev.len_utf8();
                                content.remove(self.cursor_position);
                                last_content_update = Instant::now();
                            }
                        }
                        KeyCode::Delete => {
                            if self.cursor_position < content.len() {
                                content.remove(self.cursor_position);
                                last_content_update = Instant::now();
                            }
                        }
                        KeyCode::Left => {
                            if let Some(prev) = content[..self.cursor_position].chars().next_back()
                            {
                                self.cursor_position -= prev.len_utf8();
                                last_content_update = Instant::now();
                            }
                        }
                        KeyCode::Right => {
                            if let Some(next) = content[self.cursor_position..].chars().next() {
                                self.cursor_position += next.len_utf8();
                                last_content_update = Instant::now();
                            }
                        }
                        KeyCode::Up => {
                            let line_start = content[..self.cursor_position]
                                .rfind('\n')
                                .map(|i| i + 1)
                                .unwrap_or(0);
                            if line_start > 0 {
                                let prev_start = content[..line_start - 1]
                                    .rfind('\n')
                                    .map(|i| i + 1)
                                    .unwrap_or(0);
                                let prev_len = line_start - 1 - prev_start;
                                let column = self.cursor_position - line_start;
                                self.cursor_position = floor_char_boundary(
                                    &content,
                                    prev_start + column.min(prev_len),
                                );
                            }
                            last_content_update = Instant::now();
                        }
                        KeyCode::Down => {
                            if let Some(offset) = content[self.cursor_position..].find('\n') {
                                let line_start = content[..self.cursor_position]
                                    .rfind('\n')
                                    .map(|i| i + 1)
                                    .unwrap_or(0);
                                let column = self.cursor_position - line_start;
                                let next_start = self.cursor_position + offset + 1;
                                let next_end = content[next_start..]
                                    .find('\n')
                                    .map(|i| next_start + i)
                                    .unwrap_or(content.len());
                                self.cursor_position = floor_char_boundary(
                                    &content,
                                    next_start + column.min(next_end - next_start),
                                );
                                last_content_update = Instant::now();
                            }
                        }
                        KeyCode::Enter => {
                            content.insert(self.cursor_position, '\n');
                            self.cursor_position += 1;
                            last_content_update = Instant::now();
                        }
                        _ => {}
                    }
                }
            }
        }

        let title = title.trim().to_string();
        if title.is_empty() || content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(DiaryEntry::new(title, content)))
    }

    fn draw_entry_form(
        &mut self,
        heading: &str,
        title: &str,
        content: &str,
        active: FormField,
    ) -> Result<()> {
        self.terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(1)
                .constraints(
                    [
                        Constraint::Length(3),
                        Constraint::Length(3),
                        Constraint::Min(10),
                        Constraint::Length(3),
                    ]
                    .as_ref(),
                )
                .split(f.area());

            let screen_title = Paragraph::new(heading.to_string())
                .style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )
                .alignment(ratatui::layout::Alignment::Center);
            f.render_widget(screen_title, chunks[0]);

            let active_style = Style::default().fg(Color::Green);
            let title_block = Block::default().borders(Borders::ALL).title("Title");
            let title_block = if active == FormField::Title {
                title_block.border_style(active_style)
            } else {
                title_block
            };
            f.render_widget(Paragraph::new(title.to_string()).block(title_block), chunks[1]);

            let content_block = Block::default().borders(Borders::ALL).title("Content");
            let content_block = if active == FormField::Content {
                content_block.border_style(active_style)
            } else {
                content_block
            };
            f.render_widget(
                Paragraph::new(content.to_string()).block(content_block),
                chunks[2],
            );

            let hint = if active == FormField::Title {
                "Enter: edit content"
            } else {
                "Esc: finish (blank entries are discarded)"
            };
            let instructions = Paragraph::new(hint)
                .style(Style::default().fg(Color::Yellow))
                .alignment(ratatui::layout::Alignment::Center);
            f.render_widget(instructions, chunks[3]);
        })?;

        Ok(())
    }

    pub fn view_entries(&mut self, entries: &[DiaryEntry]) -> Result<()> {
        let mut selected_index = 0;

        loop {
            self.draw_entry_list("View Entries", entries, selected_index)?;

            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Up => selected_index = selected_index.saturating_sub(1),
                    KeyCode::Down => {
                        if selected_index < entries.len() - 1 {
                            selected_index += 1;
                        }
                    }
                    KeyCode::Enter => {
                        self.view_full_entry(&entries[selected_index])?;
                    }
                    KeyCode::Esc => break,
                    _ => {}
                }
            }
        }

        Ok(())
    }

    fn view_full_entry(&mut self, entry: &DiaryEntry) -> Result<()> {
        loop {
            self.terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .margin(1)
                    .constraints(
                        [
                            Constraint::Length(3),
                            Constraint::Min(10),
                            Constraint::Length(3),
                        ]
                        .as_ref(),
                    )
                    .split(f.area());

                let title = Paragraph::new(entry.title.clone())
                    .style(
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    )
                    .alignment(ratatui::layout::Alignment::Center);
                f.render_widget(title, chunks[0]);

                let content = Paragraph::new(entry.content.clone()).block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(entry.date.format("%Y-%m-%d %H:%M").to_string()),
                );
                f.render_widget(content, chunks[1]);

                let instructions = Paragraph::new("Esc: Back")
                    .style(Style::default().fg(Color::Yellow))
                    .alignment(ratatui::layout::Alignment::Center);
                f.render_widget(instructions, chunks[2]);
            })?;

            if let Event::Key(_) = event::read()? {
                break;
            }
        }

        Ok(())
    }

    pub fn select_entry_to_delete(&mut self, entries: &[DiaryEntry]) -> Result<Option<DiaryEntry>> {
        let mut selected_index = 0;

        loop {
            self.draw_entry_list("Select Entry to Delete", entries, selected_index)?;

            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Up => selected_index = selected_index.saturating_sub(1),
                    KeyCode::Down => {
                        if selected_index < entries.len() - 1 {
                            selected_index += 1;
                        }
                    }
                    KeyCode::Enter => return Ok(Some(entries[selected_index].clone())),
                    KeyCode::Esc => return Ok(None),
                    _ => {}
                }
            }
        }
    }

    fn draw_entry_list(
        &mut self,
        heading: &str,
        entries: &[DiaryEntry],
        selected_index: usize,
    ) -> Result<()> {
        self.terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(1)
                .constraints(
                    [
                        Constraint::Length(3),
                        Constraint::Min(10),
                        Constraint::Length(3),
                    ]
                    .as_ref(),
                )
                .split(f.area());

            let title = Paragraph::new(heading.to_string())
                .style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )
                .alignment(ratatui::layout::Alignment::Center);
            f.render_widget(title, chunks[0]);

            let items = entry_list_items(entries, chunks[1].width);
            let entries_list = List::new(items)
                .block(Block::default().borders(Borders::ALL).title("Entries"))
                .highlight_style(Style::default().add_modifier(Modifier::BOLD))
                .highlight_symbol("> ");

            f.render_stateful_widget(
                entries_list,
                chunks[1],
                &mut ListState::default().with_selected(Some(selected_index)),
            );

            let instructions = Paragraph::new("Up/Down: Navigate, Enter: Select, Esc: Back")
                .style(Style::default().fg(Color::Yellow))
                .alignment(ratatui::layout::Alignment::Center);
            f.render_widget(instructions, chunks[2]);
        })?;

        Ok(())
    }
}

impl Drop for UI {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}

fn entry_list_items(entries: &[DiaryEntry], pane_width: u16) -> Vec<ListItem<'static>> {
    // Borders plus the highlight symbol.
    let width = pane_width.saturating_sub(4) as usize;
    entries
        .iter()
        .map(|entry| {
            let heading = format!(
                "[{}] {}",
                entry.date.format("%Y-%m-%d %H:%M"),
                entry.title
            );
            let preview = entry.content.lines().next().unwrap_or("");
            ListItem::new(vec![
                Line::from(Span::raw(truncate_to_width(&heading, width))),
                Line::from(Span::styled(
                    truncate_to_width(preview, width),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
        })
        .collect()
}

fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > max_width.saturating_sub(1) {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_to_width("hello", 10), "hello");
    }

    #[test]
    fn long_text_is_cut_with_ellipsis() {
        let out = truncate_to_width("a very long diary heading", 10);
        assert!(out.ends_with('…'));
        assert!(out.width() <= 10);
    }

    #[test]
    fn wide_characters_count_double() {
        let out = truncate_to_width("日記日記日記", 5);
        assert!(out.width() <= 5);
        assert!(out.ends_with('…'));
    }

    #[test]
    fn boundary_snap_never_splits_a_character() {
        let text = "aé日";
        for i in 0..=text.len() {
            assert!(text.is_char_boundary(floor_char_boundary(text, i)));
        }
    }
}

//! UI Components for the terminal interface

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, Paragraph};
use ratatui::Frame;
use std::collections::VecDeque;

use super::{Phase, Progress};

/// Status panel showing current phase and info
pub struct StatusPanel {
    phase: Phase,
    info: String,
}

impl StatusPanel {
    pub fn new() -> Self {
        Self {
            phase: Phase::Fetching,
            info: String::new(),
        }
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub fn set_info(&mut self, info: impl Into<String>) {
        self.info = info.into();
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let color = match self.phase {
            Phase::Complete => Color::Green,
            Phase::Failed => Color::Red,
            _ => Color::Cyan,
        };
        let phase_style = Style::default().fg(color).add_modifier(Modifier::BOLD);

        let phase_indicator = match self.phase {
            Phase::Fetching => "↓",
            Phase::Clearing => "⌫",
            Phase::Importing => "⚙",
            Phase::Committing => "⤓",
            Phase::Complete => "✓",
            Phase::Failed => "✗",
        };

        let lines = vec![
            Line::from(vec![
                Span::styled(format!(" {} ", phase_indicator), phase_style),
                Span::styled(self.phase.to_string(), phase_style),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::raw("   "),
                Span::styled(&self.info, Style::default().fg(Color::Gray)),
            ]),
        ];

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Wiki Visualizer import ")
            .border_style(Style::default().fg(Color::Blue));

        let paragraph = Paragraph::new(lines).block(block);
        frame.render_widget(paragraph, area);
    }
}

/// Progress panel showing a progress bar
pub struct ProgressPanel {
    progress: Option<Progress>,
}

impl ProgressPanel {
    pub fn new() -> Self {
        Self { progress: None }
    }

    pub fn set_progress(&mut self, progress: Progress) {
        self.progress = Some(progress);
    }

    pub fn clear(&mut self) {
        self.progress = None;
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::LEFT | Borders::RIGHT)
            .border_style(Style::default().fg(Color::Blue));

        let Some(progress) = &self.progress else {
            frame.render_widget(Paragraph::new("").block(block), area);
            return;
        };

        let label = if progress.total > 0 {
            format!(
                "{}: {}/{} records ({:.0}%)",
                progress.label,
                progress.current,
                progress.total,
                progress.ratio() * 100.0
            )
        } else {
            progress.label.clone()
        };

        let gauge = Gauge::default()
            .block(block)
            .gauge_style(Style::default().fg(Color::Cyan).bg(Color::DarkGray))
            .ratio(progress.ratio().min(1.0))
            .label(label);

        frame.render_widget(gauge, area);
    }
}

/// Log panel showing the most recent activity
pub struct LogPanel {
    entries: VecDeque<String>,
    max_entries: usize,
}

impl LogPanel {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries: 200,
        }
    }

    pub fn add(&mut self, message: impl Into<String>) {
        self.entries.push_back(message.into());
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Activity ")
            .border_style(Style::default().fg(Color::Blue));

        let visible_height = area.height.saturating_sub(2) as usize; // -2 for borders
        let start = self.entries.len().saturating_sub(visible_height);
        let last = self.entries.len().saturating_sub(1);

        let items: Vec<ListItem> = self
            .entries
            .iter()
            .enumerate()
            .skip(start)
            .map(|(i, entry)| {
                let style = if entry.starts_with("Skipped") {
                    Style::default().fg(Color::Yellow)
                } else if i == last {
                    Style::default().fg(Color::White)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                ListItem::new(Span::styled(format!(" {}", entry), style))
            })
            .collect();

        let list = List::new(items).block(block);
        frame.render_widget(list, area);
    }
}

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::engine::classifier::LearningSets;
use crate::engine::scoring::{ScoreState, multiplier};
use crate::ui::theme::Theme;

pub struct StatsSidebar<'a> {
    score: &'a ScoreState,
    sets: &'a LearningSets,
    level: Option<u32>,
    user: Option<&'a str>,
    theme: &'a Theme,
}

impl<'a> StatsSidebar<'a> {
    pub fn new(
        score: &'a ScoreState,
        sets: &'a LearningSets,
        level: Option<u32>,
        user: Option<&'a str>,
        theme: &'a Theme,
    ) -> Self {
        Self {
            score,
            sets,
            level,
            user,
            theme,
        }
    }
}

impl Widget for StatsSidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let accuracy = self.score.accuracy();
        let mult = multiplier(self.score.streak);

        let level_str = match self.level {
            Some(level) => format!("{level}"),
            None => "-".to_string(),
        };
        let streak_str = if mult > 1 {
            format!("{} (x{mult})", self.score.streak)
        } else {
            format!("{}", self.score.streak)
        };

        let mut lines = vec![
            Line::from(vec![
                Span::styled("Score: ", Style::default().fg(colors.fg())),
                Span::styled(
                    format!("{}", self.score.score),
                    Style::default()
                        .fg(colors.accent())
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Streak: ", Style::default().fg(colors.fg())),
                Span::styled(
                    streak_str,
                    Style::default().fg(if mult > 1 {
                        colors.warning()
                    } else {
                        colors.fg()
                    }),
                ),
            ]),
            Line::from(vec![
                Span::styled("Best:   ", Style::default().fg(colors.fg())),
                Span::styled(
                    format!("{}", self.score.max_streak),
                    Style::default().fg(colors.fg()),
                ),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Accuracy: ", Style::default().fg(colors.fg())),
                Span::styled(
                    format!("{accuracy:.1}%"),
                    Style::default().fg(if accuracy >= 95.0 {
                        colors.success()
                    } else if accuracy >= 85.0 {
                        colors.warning()
                    } else {
                        colors.error()
                    }),
                ),
            ]),
            Line::from(vec![
                Span::styled("Level: ", Style::default().fg(colors.fg())),
                Span::styled(level_str, Style::default().fg(colors.accent())),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Mastered: ", Style::default().fg(colors.fg())),
                Span::styled(
                    format!("{}", self.sets.mastered.len()),
                    Style::default().fg(colors.success()),
                ),
            ]),
            Line::from(vec![
                Span::styled("Review:   ", Style::default().fg(colors.fg())),
                Span::styled(
                    format!("{}", self.sets.review.len()),
                    Style::default().fg(colors.error()),
                ),
            ]),
        ];

        lines.push(Line::from(""));
        lines.push(match self.user {
            Some(user) => Line::from(vec![
                Span::styled("User: ", Style::default().fg(colors.fg())),
                Span::styled(user.to_string(), Style::default().fg(colors.accent())),
            ]),
            None => Line::from(Span::styled(
                "not signed in",
                Style::default().fg(colors.text_pending()),
            )),
        });

        let block = Block::bordered()
            .title(" Progress ")
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));

        Paragraph::new(lines).block(block).render(area, buf);
    }
}

use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::corpus::Item;
use crate::engine::hangul::is_composition_artifact;
use crate::session::SessionState;
use crate::ui::theme::Theme;

/// Display state of one target unit, derived from the input buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitState {
    Correct,
    /// Trailing unit that is a partial composition of its target, not yet
    /// a mistake.
    Composing,
    Incorrect,
    Cursor,
    Pending,
}

pub fn unit_states(target: &[char], input: &[char]) -> Vec<UnitState> {
    let typed = input.len().min(target.len());
    (0..target.len())
        .map(|i| {
            if i < typed {
                if input[i] == target[i] {
                    UnitState::Correct
                } else if i + 1 == typed && is_composition_artifact(input[i], target[i]) {
                    UnitState::Composing
                } else {
                    UnitState::Incorrect
                }
            } else if i == typed {
                UnitState::Cursor
            } else {
                UnitState::Pending
            }
        })
        .collect()
}

pub struct TypingArea<'a> {
    session: &'a SessionState,
    item: &'a Item,
    /// Copy mode shows the target; recall mode masks it behind the prompt.
    reveal_target: bool,
    theme: &'a Theme,
}

impl<'a> TypingArea<'a> {
    pub fn new(
        session: &'a SessionState,
        item: &'a Item,
        reveal_target: bool,
        theme: &'a Theme,
    ) -> Self {
        Self {
            session,
            item,
            reveal_target,
            theme,
        }
    }

    fn unit_span(&self, idx: usize, state: UnitState) -> Span<'static> {
        let colors = &self.theme.colors;
        let target_ch = self.session.target[idx];
        match state {
            UnitState::Correct => Span::styled(
                target_ch.to_string(),
                Style::default().fg(colors.text_correct()),
            ),
            UnitState::Composing => Span::styled(
                self.session.input[idx].to_string(),
                Style::default().fg(colors.text_composing()),
            ),
            UnitState::Incorrect => Span::styled(
                self.session.input[idx].to_string(),
                Style::default()
                    .fg(colors.text_incorrect())
                    .bg(colors.text_incorrect_bg())
                    .add_modifier(Modifier::UNDERLINED),
            ),
            UnitState::Cursor => {
                let display = if self.reveal_target {
                    target_ch.to_string()
                } else {
                    " ".to_string()
                };
                Span::styled(
                    display,
                    Style::default()
                        .fg(colors.text_cursor_fg())
                        .bg(colors.text_cursor_bg()),
                )
            }
            UnitState::Pending => {
                let display = if self.reveal_target {
                    target_ch.to_string()
                } else {
                    "\u{00b7}".to_string()
                };
                Span::styled(display, Style::default().fg(colors.text_pending()))
            }
        }
    }
}

impl Widget for TypingArea<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(2),
                Constraint::Min(1),
            ])
            .split(inner);

        // Prompt: English gloss, plus hanja when the entry carries one.
        let mut prompt_lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                self.item.gloss_en.clone(),
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )),
        ];
        if let Some(hanja) = &self.item.hanja {
            prompt_lines.push(Line::from(Span::styled(
                hanja.clone(),
                Style::default().fg(colors.accent_dim()),
            )));
        }
        Paragraph::new(prompt_lines)
            .alignment(Alignment::Center)
            .render(layout[0], buf);

        let states = unit_states(&self.session.target, &self.session.input);
        let spans: Vec<Span> = states
            .iter()
            .enumerate()
            .map(|(i, &state)| self.unit_span(i, state))
            .collect();
        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .render(layout[1], buf);

        if self.session.error_count > 0 {
            let miss = Line::from(Span::styled(
                format!("misses: {}", self.session.error_count),
                Style::default().fg(colors.error()),
            ));
            Paragraph::new(miss)
                .alignment(Alignment::Center)
                .render(layout[2], buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_unit_states_empty_input() {
        let states = unit_states(&chars("사과"), &[]);
        assert_eq!(states, vec![UnitState::Cursor, UnitState::Pending]);
    }

    #[test]
    fn test_unit_states_correct_prefix() {
        let states = unit_states(&chars("사과"), &chars("사"));
        assert_eq!(states, vec![UnitState::Correct, UnitState::Cursor]);
    }

    #[test]
    fn test_unit_states_trailing_artifact_is_composing() {
        // ㅅ is the first keystroke of 사; still in flight, not a miss.
        let states = unit_states(&chars("사과"), &chars("ㅅ"));
        assert_eq!(states, vec![UnitState::Composing, UnitState::Cursor]);
    }

    #[test]
    fn test_unit_states_non_trailing_artifact_is_incorrect() {
        // Once typing moved past it, a partial unit counts as wrong.
        let states = unit_states(&chars("사과"), &chars("ㅅ과"));
        assert_eq!(states, vec![UnitState::Incorrect, UnitState::Correct]);
    }

    #[test]
    fn test_unit_states_plain_mismatch() {
        let states = unit_states(&chars("사과"), &chars("바"));
        assert_eq!(states, vec![UnitState::Incorrect, UnitState::Cursor]);
    }

    #[test]
    fn test_unit_states_complete_input_has_no_cursor() {
        let states = unit_states(&chars("사과"), &chars("사과"));
        assert_eq!(states, vec![UnitState::Correct, UnitState::Correct]);
    }
}

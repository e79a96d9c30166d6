mod app;
mod auth;
mod config;
mod corpus;
mod engine;
mod event;
mod session;
mod store;
mod ui;

use std::io;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use app::{App, AppScreen, PracticeMode};
use corpus::FREQUENCY_BANDS;
use event::{AppEvent, EventHandler};
use ui::components::stats_sidebar::StatsSidebar;
use ui::components::typing_area::TypingArea;
use ui::layout::AppLayout;

#[derive(Parser)]
#[command(name = "hantype", version, about = "Korean vocabulary typing trainer")]
struct Cli {
    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(short, long, help = "Practice mode (recall, copy)")]
    mode: Option<String>,

    #[arg(short, long, help = "Sign in as this user on startup")]
    user: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let events = EventHandler::new(Duration::from_millis(100));
    let mut app = App::new(events.sender());

    if let Some(theme_name) = cli.theme
        && let Some(theme) = ui::theme::Theme::load(&theme_name)
    {
        let theme: &'static ui::theme::Theme = Box::leak(Box::new(theme));
        app.set_theme(theme);
    }
    if let Some(mode) = cli.mode {
        app.mode = if mode == "copy" {
            PracticeMode::Copy
        } else {
            PracticeMode::Recall
        };
    }
    if let Some(user) = cli.user {
        app.sign_in_input = user;
        app.sign_in();
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &events);

    app.shutdown();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Tick => {}
            AppEvent::Resize(_, _) => {}
            AppEvent::SyncNotice(message) => app.on_sync_notice(message),
            AppEvent::IdentityChanged(user) => app.on_identity_changed(user),
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.screen {
        AppScreen::Menu => handle_menu_key(app, key),
        AppScreen::Practice => handle_practice_key(app, key),
        AppScreen::Summary => handle_summary_key(app, key),
        AppScreen::Filters => handle_filters_key(app, key),
        AppScreen::SignIn => handle_sign_in_key(app, key),
    }
}

fn handle_menu_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('1') => app.start_practice(PracticeMode::Recall),
        KeyCode::Char('2') => app.start_practice(PracticeMode::Copy),
        KeyCode::Char('f') => app.screen = AppScreen::Filters,
        KeyCode::Char('u') => {
            if app.identity.current_user().is_some() {
                app.sign_out();
            } else {
                app.screen = AppScreen::SignIn;
            }
        }
        KeyCode::Up | KeyCode::Char('k') => app.menu.prev(),
        KeyCode::Down | KeyCode::Char('j') => app.menu.next(),
        KeyCode::Enter => match app.menu.selected {
            0 => app.start_practice(PracticeMode::Recall),
            1 => app.start_practice(PracticeMode::Copy),
            2 => app.screen = AppScreen::Filters,
            3 => {
                if app.identity.current_user().is_some() {
                    app.sign_out();
                } else {
                    app.screen = AppScreen::SignIn;
                }
            }
            _ => {}
        },
        _ => {}
    }
}

fn handle_practice_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.sync_config_from_criteria();
            let _ = app.config.save();
            app.end_practice();
        }
        KeyCode::Enter => app.submit(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Char(ch) => app.type_char(ch),
        _ => {}
    }
}

fn handle_summary_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Enter | KeyCode::Esc | KeyCode::Char(_) => app.go_to_menu(),
        _ => {}
    }
}

fn handle_filters_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => {
            app.sync_config_from_criteria();
            let _ = app.config.save();
            app.go_to_menu();
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.filters_selected = app.filters_selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.filters_selected = (app.filters_selected + 1).min(2);
        }
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Enter => cycle_filter(app, true),
        KeyCode::Left | KeyCode::Char('h') => cycle_filter(app, false),
        _ => {}
    }
}

fn cycle_filter(app: &mut App, forward: bool) {
    match app.filters_selected {
        0 => app.cycle_classification(forward),
        1 => app.cycle_complexity(forward),
        2 => app.cycle_frequency_band(forward),
        _ => {}
    }
}

fn handle_sign_in_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.sign_in_input.clear();
            app.go_to_menu();
        }
        KeyCode::Enter => app.sign_in(),
        KeyCode::Backspace => {
            app.sign_in_input.pop();
        }
        KeyCode::Char(ch) => app.sign_in_input.push(ch),
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    match app.screen {
        AppScreen::Menu => render_menu(frame, app),
        AppScreen::Practice => render_practice(frame, app),
        AppScreen::Summary => render_summary(frame, app),
        AppScreen::Filters => render_filters(frame, app),
        AppScreen::SignIn => render_sign_in(frame, app),
    }
}

fn header_line(frame: &mut ratatui::Frame, app: &App, area: ratatui::layout::Rect) {
    let colors = &app.theme.colors;
    let user = app
        .identity
        .current_user()
        .unwrap_or_else(|| "anonymous".to_string());
    let level = app
        .level()
        .map(|l| format!("Level {l}"))
        .unwrap_or_else(|| "Level -".to_string());
    let info = format!(
        " {user} | {level} | Score {} | {} mastered",
        app.score.score,
        app.sets.mastered.len(),
    );
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " hantype ",
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            info,
            Style::default()
                .fg(colors.text_pending())
                .bg(colors.header_bg()),
        ),
    ]))
    .style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, area);
}

fn notice_line(frame: &mut ratatui::Frame, app: &App, area: ratatui::layout::Rect) {
    let colors = &app.theme.colors;
    if let Some(ref notice) = app.notice {
        let footer = Paragraph::new(Line::from(Span::styled(
            format!(" ! {notice}"),
            Style::default().fg(colors.warning()),
        )));
        frame.render_widget(footer, area);
    }
}

fn render_menu(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    header_line(frame, app, layout[0]);

    let menu_area = ui::layout::centered_rect(50, 80, layout[1]);
    frame.render_widget(&app.menu, menu_area);

    let sign_label = if app.identity.current_user().is_some() {
        "[u] Sign out"
    } else {
        "[u] Sign in"
    };
    let footer = Paragraph::new(Line::from(Span::styled(
        format!(" [1-2] Practice  [f] Filters  {sign_label}  [q] Quit "),
        Style::default().fg(colors.text_pending()),
    )));
    frame.render_widget(footer, layout[2]);
    notice_line(frame, app, layout[3]);
}

fn render_practice(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;
    let app_layout = AppLayout::new(area);

    header_line(frame, app, app_layout.header);

    match app.current {
        Some(ref item) => {
            let reveal = app.mode == PracticeMode::Copy;
            let typing = TypingArea::new(&app.session, item, reveal, app.theme);
            frame.render_widget(typing, app_layout.main);
        }
        None => {
            // Empty pool or everything in it mastered. Normal state, says
            // so instead of presenting nothing.
            let message = if app.pool.is_empty() {
                "No words match the active filters."
            } else {
                "Every word in this pool is mastered."
            };
            let done = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    message,
                    Style::default().fg(colors.success()),
                )),
                Line::from(Span::styled(
                    "Adjust filters with [f] from the menu.",
                    Style::default().fg(colors.text_pending()),
                )),
            ])
            .alignment(Alignment::Center)
            .block(
                Block::bordered()
                    .border_style(Style::default().fg(colors.border()))
                    .style(Style::default().bg(colors.bg())),
            );
            frame.render_widget(done, app_layout.main);
        }
    }

    if let Some(sidebar_area) = app_layout.sidebar {
        let user = app.identity.current_user();
        let sidebar = StatsSidebar::new(
            &app.score,
            &app.sets,
            app.level(),
            user.as_deref(),
            app.theme,
        );
        frame.render_widget(sidebar, sidebar_area);
    }

    let footer_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(app_layout.footer);
    let footer = Paragraph::new(Line::from(Span::styled(
        " [Enter] Submit  [Backspace] Delete  [ESC] Menu ",
        Style::default().fg(colors.text_pending()),
    )));
    frame.render_widget(footer, footer_layout[0]);
    notice_line(frame, app, footer_layout[1]);
}

fn render_summary(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let centered = ui::layout::centered_rect(50, 60, area);

    let block = Block::bordered()
        .title(" Session Summary ")
        .border_style(Style::default().fg(colors.accent()))
        .style(Style::default().bg(colors.bg()));
    let inner = block.inner(centered);
    block.render(centered, frame.buffer_mut());

    let stat = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("  {label:<14}"), Style::default().fg(colors.fg())),
            Span::styled(value, Style::default().fg(colors.accent())),
        ])
    };

    let level = app
        .score
        .highest_level
        .map(|l| l.to_string())
        .unwrap_or_else(|| "-".to_string());
    let lines = vec![
        Line::from(""),
        stat("Score", app.score.score.to_string()),
        stat("Best streak", app.score.max_streak.to_string()),
        stat(
            "Accuracy",
            format!("{:.1}%", app.score.accuracy()),
        ),
        stat(
            "Attempts",
            format!(
                "{} ({} correct)",
                app.score.total_attempts, app.score.correct_attempts
            ),
        ),
        stat("Highest level", level),
        stat("Mastered", app.sets.mastered.len().to_string()),
        stat("Needs review", app.sets.review.len().to_string()),
        Line::from(""),
        Line::from(Span::styled(
            "  [Enter] Menu  [q] Quit",
            Style::default().fg(colors.text_pending()),
        )),
    ];
    Paragraph::new(lines).render(inner, frame.buffer_mut());
}

fn render_filters(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let centered = ui::layout::centered_rect(60, 60, area);

    let block = Block::bordered()
        .title(" Filters ")
        .border_style(Style::default().fg(colors.accent()))
        .style(Style::default().bg(colors.bg()));
    let inner = block.inner(centered);
    block.render(centered, frame.buffer_mut());

    let classification = app
        .criteria
        .classification
        .clone()
        .unwrap_or_else(|| "all".to_string());
    let complexity = app
        .criteria
        .complexity
        .map(|t| t.label().to_string())
        .unwrap_or_else(|| "all".to_string());
    let band = app
        .criteria
        .frequency_band
        .map(|b| {
            let lo = b * 1000 + 1;
            let hi = (b + 1) * 1000;
            format!("{b} ({lo}-{hi})")
        })
        .unwrap_or_else(|| "all".to_string());

    let fields = [
        ("Word class".to_string(), classification),
        ("Complexity".to_string(), complexity),
        (
            format!("Frequency band (0-{})", FREQUENCY_BANDS - 1),
            band,
        ),
    ];

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(fields.len() as u16 * 3),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(inner);

    let header = Paragraph::new(Line::from(Span::styled(
        "  Arrows to navigate and change, ESC to save & exit",
        Style::default().fg(colors.text_pending()),
    )));
    header.render(layout[0], frame.buffer_mut());

    let field_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            fields
                .iter()
                .map(|_| Constraint::Length(3))
                .collect::<Vec<_>>(),
        )
        .split(layout[1]);

    for (i, (label, value)) in fields.iter().enumerate() {
        let is_selected = i == app.filters_selected;
        let indicator = if is_selected { " > " } else { "   " };

        let label_style = Style::default()
            .fg(if is_selected {
                colors.accent()
            } else {
                colors.fg()
            })
            .add_modifier(if is_selected {
                Modifier::BOLD
            } else {
                Modifier::empty()
            });
        let value_style = Style::default().fg(if is_selected {
            colors.warning()
        } else {
            colors.text_pending()
        });

        let lines = vec![
            Line::from(Span::styled(format!("{indicator}{label}:"), label_style)),
            Line::from(Span::styled(format!("  < {value} >"), value_style)),
        ];
        Paragraph::new(lines).render(field_layout[i], frame.buffer_mut());
    }

    let pool_info = format!(
        "  {} words in pool{}",
        app.pool.len(),
        app.level()
            .map(|l| format!(" | Level {l}"))
            .unwrap_or_default()
    );
    let footer = Paragraph::new(Line::from(Span::styled(
        pool_info,
        Style::default().fg(colors.accent()),
    )));
    footer.render(layout[3], frame.buffer_mut());
}

fn render_sign_in(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let centered = ui::layout::centered_rect(40, 30, area);

    let block = Block::bordered()
        .title(" Sign In ")
        .border_style(Style::default().fg(colors.accent()))
        .style(Style::default().bg(colors.bg()));
    let inner = block.inner(centered);
    block.render(centered, frame.buffer_mut());

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "User name:",
            Style::default().fg(colors.fg()),
        )),
        Line::from(vec![
            Span::styled(
                format!("  {}", app.sign_in_input),
                Style::default().fg(colors.accent()),
            ),
            Span::styled("_", Style::default().fg(colors.text_cursor_bg())),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "[Enter] Sign in  [ESC] Cancel",
            Style::default().fg(colors.text_pending()),
        )),
    ];
    Paragraph::new(lines).render(inner, frame.buffer_mut());
}

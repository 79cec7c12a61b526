use crate::input::Scene;
use crate::model::{AwayRecap, ChatRole, Mood, PetAction, PetSnapshot};
use crate::session::PetSession;
use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap},
    Frame,
};

/// Everything one frame needs. Built fresh each frame from the session.
pub(crate) struct View<'a> {
    pub(crate) session: &'a PetSession,
    pub(crate) scene: Scene,
    pub(crate) chat_input: &'a str,
    pub(crate) online: bool,
    pub(crate) mono: bool,
    pub(crate) now: DateTime<Utc>,
}

impl View<'_> {
    fn fg(&self, c: Color) -> Style {
        Style::default().fg(if self.mono { Color::White } else { c })
    }
}

/* -----------------------------
   Puppy art
------------------------------ */

struct Face {
    eyes: &'static str,
    mouth: &'static str,
    cheek: &'static str,
}

fn face_for(mood: Mood) -> Face {
    let (eyes, mouth, cheek) = match mood {
        Mood::Happy => ("^ ^", "◡", "  "),
        Mood::Sad => ("T T", "◠", "  "),
        Mood::Sleeping => ("- -", "◡", "  "),
        Mood::Hungry => ("● ●", "U", "  "),
        Mood::Dirty => ("● ●", "◡", "~*"),
        Mood::Tired => ("= =", "o", "  "),
        Mood::Dead => ("x x", "~", "  "),
    };
    Face { eyes, mouth, cheek }
}

/// The puppy as fixed-width text, one entry per row.
pub(crate) fn puppy_lines(mood: Mood) -> Vec<String> {
    let face = face_for(mood);
    let mut lines = Vec::with_capacity(8);
    lines.push(if mood == Mood::Sleeping {
        "             Z z z".to_string()
    } else if mood == Mood::Dead {
        "      .-~~~~~-.    ".to_string()
    } else {
        "                  ".to_string()
    });
    lines.push("  /\\_______/\\    ".to_string());
    lines.push("  / /       \\ \\   ".to_string());
    lines.push(format!(" | |  {}   | | ", face.eyes));
    lines.push(format!("  \\|    {}    |/{}", face.mouth, face.cheek));
    lines.push("    \\_______/     ".to_string());
    lines.push("     /     \\      ".to_string());
    lines.push("    (_)   (_)     ".to_string());
    lines
}

fn action_effect(action: PetAction) -> &'static str {
    match action {
        PetAction::Feed => "🍔  nom nom  🍔",
        PetAction::Play => "⚽ ~ ~ ~ ~ ⚽",
        PetAction::Clean => "🧼 🫧 ✨ 🫧 🧼",
        PetAction::ToggleSleep => "",
    }
}

/// Caption under the puppy.
pub(crate) fn status_line(pet: &PetSnapshot, active: Option<PetAction>) -> &'static str {
    if pet.is_dead {
        return "HEAVEN";
    }
    match active {
        Some(action) => action.progressive(),
        None if pet.is_sleeping => "Zzz...",
        None => "Good Puppy!",
    }
}

fn mood_color(mood: Mood) -> Color {
    match mood {
        Mood::Happy => Color::LightMagenta,
        Mood::Sad => Color::Blue,
        Mood::Sleeping => Color::Cyan,
        Mood::Hungry => Color::Yellow,
        Mood::Dirty => Color::Green,
        Mood::Tired => Color::Gray,
        Mood::Dead => Color::DarkGray,
    }
}

/* -----------------------------
   Frame
------------------------------ */

pub(crate) fn draw(f: &mut Frame, v: &View) {
    let area = f.size();
    let pet = v.session.snapshot();

    let outer = Block::default()
        .borders(Borders::ALL)
        .title(Line::from(vec![
            Span::styled(" pixelpup ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" "),
            Span::styled(
                format!("{}'s pup  Lv.{}", v.session.owner(), pet.level),
                v.fg(Color::LightMagenta),
            ),
            Span::raw(" "),
        ]))
        .border_style(v.fg(Color::DarkGray));
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(12), Constraint::Length(3)])
        .split(inner);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[0]);
    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(3)])
        .split(cols[1]);

    render_pet_cam(f, cols[0], v);
    render_stats(f, side[0], v);
    render_chat(f, side[1], v);
    render_footer(f, rows[1], v);

    if pet.is_dead && v.scene == Scene::Main {
        render_dead(f, area, v);
    }
    match v.scene {
        Scene::Help => render_help(f, area, v),
        Scene::Recap => {
            if let Some(recap) = v.session.recap() {
                render_recap(f, area, v, recap);
            }
        }
        Scene::Main | Scene::Chat => {}
    }
}

fn render_pet_cam(f: &mut Frame, area: Rect, v: &View) {
    let pet = v.session.snapshot();
    let mood = v.session.mood();
    let transient = v.session.transient();
    let active = transient.visible_action(v.now);

    let mut lines: Vec<Line> = Vec::new();
    match transient.visible_thought(v.now) {
        Some(thought) if !pet.is_dead => {
            lines.push(Line::styled(
                format!("( {thought} )"),
                v.fg(Color::LightRed).add_modifier(Modifier::BOLD),
            ));
            lines.push(Line::styled("o", v.fg(Color::LightRed)));
        }
        _ => {
            lines.push(Line::raw(""));
            lines.push(Line::raw(""));
        }
    }

    let art_style = v.fg(mood_color(mood));
    for row in puppy_lines(mood) {
        lines.push(Line::styled(row, art_style));
    }

    lines.push(Line::raw(""));
    lines.push(match active {
        Some(action) => Line::styled(action_effect(action), v.fg(Color::Yellow)),
        None => Line::raw(""),
    });
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        format!("[ {} ]", status_line(pet, active)),
        v.fg(Color::LightMagenta).add_modifier(Modifier::BOLD),
    ));

    let p = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" ♡ LIVE PUP-CAM ♡ ")
                .border_style(v.fg(Color::LightRed)),
        );
    f.render_widget(p, area);
}

fn gauge_color(value: f32) -> Color {
    if value < 25.0 {
        Color::Red
    } else if value < 50.0 {
        Color::Yellow
    } else {
        Color::Green
    }
}

fn render_stats(f: &mut Frame, area: Rect, v: &View) {
    let pet = v.session.snapshot();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Mood: {} ", v.session.mood().label()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1); 7])
        .split(inner);

    let stats = [
        ("Hunger ", pet.hunger),
        ("Energy ", pet.energy),
        ("Happy  ", pet.happiness),
        ("Hygiene", pet.hygiene),
        ("Health ", pet.health),
    ];
    for (i, (name, value)) in stats.iter().enumerate() {
        let g = Gauge::default()
            .gauge_style(v.fg(gauge_color(*value)))
            .ratio(f64::from(*value / 100.0).clamp(0.0, 1.0))
            .label(format!("{name} {:>3.0}", value));
        f.render_widget(g, rows[i]);
    }

    let threshold = v.session.rules().leveling.threshold();
    let xp = Gauge::default()
        .gauge_style(v.fg(Color::Magenta))
        .ratio((f64::from(pet.xp) / f64::from(threshold)).clamp(0.0, 1.0))
        .label(format!("XP {}/{}", pet.xp, threshold));
    f.render_widget(xp, rows[6]);
}

fn render_chat(f: &mut Frame, area: Rect, v: &View) {
    let mut lines: Vec<Line> = v
        .session
        .chat()
        .iter()
        .map(|m| match m.role {
            ChatRole::User => Line::from(vec![
                Span::styled("you: ", v.fg(Color::Cyan).add_modifier(Modifier::BOLD)),
                Span::raw(m.text.clone()),
            ]),
            ChatRole::Pet => Line::from(vec![
                Span::styled("pup: ", v.fg(Color::LightMagenta).add_modifier(Modifier::BOLD)),
                Span::raw(m.text.clone()),
            ]),
        })
        .collect();

    if v.session.awaiting_chat() {
        lines.push(Line::styled("pup is thinking...", v.fg(Color::DarkGray)));
    }
    if v.scene == Scene::Chat {
        lines.push(Line::from(vec![
            Span::styled("> ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(v.chat_input.to_string()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ]));
    } else if lines.is_empty() {
        lines.push(Line::styled("press t to talk to your pup", v.fg(Color::DarkGray)));
    }

    // keep the newest lines in view
    let visible = area.height.saturating_sub(2) as usize;
    let skip = lines.len().saturating_sub(visible);
    let title = if v.online { " Chat " } else { " Chat (offline) " };
    let p = Paragraph::new(lines.into_iter().skip(skip).collect::<Vec<_>>())
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(p, area);
}

fn render_footer(f: &mut Frame, area: Rect, v: &View) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let keys: &[(&str, &str)] = match v.scene {
        Scene::Chat => &[("enter", " send  "), ("esc", " back")],
        Scene::Help => &[("esc/h", " close  "), ("q", " quit")],
        Scene::Recap => &[("enter", " continue  "), ("q", " quit")],
        Scene::Main if v.session.snapshot().is_dead => &[("n", " new puppy  "), ("q", " quit")],
        Scene::Main => &[
            ("f", " feed  "),
            ("p", " play  "),
            ("c", " clean  "),
            ("s", " sleep  "),
            ("t", " talk  "),
            ("h", " help  "),
            ("q", " quit"),
        ],
    };
    let spans: Vec<Span> = keys
        .iter()
        .flat_map(|(k, d)| [Span::styled(*k, bold), Span::raw(*d)])
        .collect();
    let p = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("Keys"));
    f.render_widget(p, area);
}

/* -----------------------------
   Overlays
------------------------------ */

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width.saturating_sub(4));
    let h = height.min(area.height.saturating_sub(2));
    Rect {
        x: area.x + (area.width - w) / 2,
        y: area.y + (area.height - h) / 2,
        width: w,
        height: h,
    }
}

fn render_box(f: &mut Frame, area: Rect, v: &View, title: &str, lines: Vec<Line>) {
    let rect = centered(area, 56, lines.len() as u16 + 4);
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title.to_string())
                .border_style(v.fg(Color::LightRed)),
        );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

fn render_dead(f: &mut Frame, area: Rect, v: &View) {
    let lines = vec![
        Line::raw(""),
        Line::raw("Your pup has crossed the rainbow bridge."),
        Line::raw(""),
        Line::styled(
            "Press N to adopt a new puppy, or Q to quit.",
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ];
    render_box(f, area, v, " HEAVEN ", lines);
}

fn render_help(f: &mut Frame, area: Rect, v: &View) {
    let lines = vec![
        Line::raw("Keep your pup fed, rested, happy and clean."),
        Line::raw("Needs keep dropping while the program is closed."),
        Line::raw(""),
        Line::raw("F  Feed:  +hunger, +health, a little messier"),
        Line::raw("P  Play:  +happiness, -energy"),
        Line::raw("C  Clean: +hygiene"),
        Line::raw("S  Sleep: nap or wake up. Naps restore energy."),
        Line::raw("T  Talk to your pup"),
        Line::raw(""),
        Line::raw("Any need at 10 or below drains health."),
        Line::raw("Every care action is worth XP toward the next level."),
        Line::raw(""),
        Line::raw("Esc or H to close help."),
    ];
    render_box(f, area, v, " How to care for your pup ", lines);
}

/// "3h 12m", "45m", "2d 4h".
pub(crate) fn format_elapsed(d: chrono::Duration) -> String {
    let mins = d.num_minutes().max(0);
    let (days, hours, mins) = (mins / 1440, (mins / 60) % 24, mins % 60);
    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{mins}m")
    }
}

pub(crate) fn recap_lines(recap: &AwayRecap) -> Vec<String> {
    let mut out = vec![format!("You were away for {}.", format_elapsed(recap.elapsed))];
    out.push(String::new());
    let names = ["Hunger", "Energy", "Happiness", "Hygiene"];
    let before = recap.before.primary_gauges();
    let after = recap.after.primary_gauges();
    for ((name, b), a) in names.iter().zip(before).zip(after) {
        out.push(format!("{name:<10} {b:>3.0} -> {a:>3.0}"));
    }
    out.push(format!(
        "{:<10} {:>3.0} -> {:>3.0}",
        "Health", recap.before.health, recap.after.health
    ));
    if recap.died {
        out.push(String::new());
        out.push("Your pup did not make it while you were gone.".to_string());
    }
    out
}

fn render_recap(f: &mut Frame, area: Rect, v: &View, recap: &AwayRecap) {
    let mut lines: Vec<Line> = recap_lines(recap).into_iter().map(Line::raw).collect();
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        "Press Enter to continue",
        Style::default().add_modifier(Modifier::BOLD),
    ));
    render_box(f, area, v, " While you were away ", lines);
}

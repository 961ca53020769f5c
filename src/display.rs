//! Rendering layer.  All terminal I/O lives here.
//!
//! Each function receives a mutable writer and an immutable view of the
//! session.  No game logic is performed; this module only translates
//! playfield pixels into terminal cells.  There is no artwork, so every
//! entity is drawn as a flat block covering its footprint.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal,
    QueueableCommand,
};
use galactic_salvage::entities::{
    Capability, CapabilityState, Category, Entity, Payload, Rect, SessionStatus,
};
use galactic_salvage::persistence::LeaderboardEntry;
use galactic_salvage::session::{FlushState, GameSession, SessionSummary};

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_HUD_SCORE: Color = Color::Yellow;
const C_HUD_LIVES: Color = Color::Red;
const C_HUD_LEVEL: Color = Color::Green;
const C_PLAYER: Color = Color::White;
const C_ASTEROID: Color = Color::Grey;
const C_BULLET: Color = Color::Cyan;
const C_SUPER_BULLET: Color = Color::Yellow;
const C_BROKEN_SHIP: Color = Color::Green;
const C_EXTRA_LIFE: Color = Color::Magenta;
const C_PICKUP: Color = Color::Cyan;
const C_STAR: Color = Color::DarkGrey;
const C_HINT: Color = Color::DarkGrey;
const C_POWERUP_ACTIVE: Color = Color::Yellow;

/// Front-end state the core knows nothing about.
pub struct Hud {
    pub high_score: u32,
    pub muted: bool,
}

/// Maps playfield pixels onto the bordered area of the terminal.
struct Viewport {
    cols: u16,
    rows: u16,
    sx: f32,
    sy: f32,
}

impl Viewport {
    fn new(session: &GameSession, width: u16, height: u16) -> Self {
        let cols = width.saturating_sub(2).max(1);
        let rows = height.saturating_sub(4).max(1);
        let config = session.config();
        Viewport {
            cols,
            rows,
            sx: cols as f32 / config.width(),
            sy: rows as f32 / config.height(),
        }
    }

    /// Terminal cells covered by `rect`, clipped to the playfield.
    fn cells(&self, rect: &Rect) -> Option<(u16, u16, u16, u16)> {
        let x0 = (rect.x * self.sx).floor().max(0.0);
        let y0 = (rect.y * self.sy).floor().max(0.0);
        let x1 = (rect.right() * self.sx).ceil().min(self.cols as f32);
        let y1 = (rect.bottom() * self.sy).ceil().min(self.rows as f32);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        // +1 col for the left wall, +2 rows for HUD and top bar
        Some((x0 as u16 + 1, y0 as u16 + 2, (x1 - x0) as u16, (y1 - y0) as u16))
    }
}

// ── Public entry points ───────────────────────────────────────────────────────

/// Render one complete frame.
pub fn render<W: Write>(out: &mut W, session: &GameSession, hud: &Hud) -> std::io::Result<()> {
    let (width, height) = terminal::size()?;
    let view = Viewport::new(session, width, height);

    out.queue(terminal::Clear(terminal::ClearType::All))?;
    draw_border(out, width, height)?;
    draw_hud(out, session, hud, width)?;

    // Stars first so everything else paints over them
    for star in session.registry().of(Category::Star) {
        draw_entity(out, &view, star)?;
    }
    for entity in session.registry().iter().filter(|e| e.category != Category::Star) {
        draw_entity(out, &view, entity)?;
    }
    draw_player(out, &view, session)?;
    draw_controls_hint(out, height)?;

    if session.status() != SessionStatus::Playing {
        draw_game_over(out, session, width, height)?;
    }

    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, height.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

/// Name entry before the first session.
pub fn render_name_prompt<W: Write>(out: &mut W, typed: &str) -> std::io::Result<()> {
    let (width, height) = terminal::size()?;
    let cx = width / 2;
    let cy = height / 2;
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let title = "★  GALACTIC  SALVAGE  ★";
    out.queue(cursor::MoveTo(cx.saturating_sub(title.chars().count() as u16 / 2), cy.saturating_sub(4)))?;
    out.queue(style::SetForegroundColor(Color::Cyan))?;
    out.queue(Print(title))?;

    out.queue(cursor::MoveTo(cx.saturating_sub(12), cy.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(Color::White))?;
    out.queue(Print("Enter your name:"))?;
    out.queue(cursor::MoveTo(cx.saturating_sub(12), cy + 1))?;
    out.queue(style::SetForegroundColor(Color::Yellow))?;
    out.queue(Print(format!("> {}_", typed)))?;

    out.queue(cursor::MoveTo(cx.saturating_sub(12), cy + 4))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print("ENTER : Start   ESC : Quit"))?;

    out.queue(style::ResetColor)?;
    out.flush()?;
    Ok(())
}

/// Top-ten table plus this session's line.
pub fn render_leaderboard<W: Write>(
    out: &mut W,
    entries: &[LeaderboardEntry],
    summary: &SessionSummary,
) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    out.queue(cursor::MoveTo(4, 1))?;
    out.queue(style::SetForegroundColor(Color::Cyan))?;
    out.queue(Print("LEADERBOARD"))?;

    out.queue(style::SetForegroundColor(Color::White))?;
    if entries.is_empty() {
        out.queue(cursor::MoveTo(4, 3))?;
        out.queue(Print("No scores yet."))?;
    }
    for (i, entry) in entries.iter().enumerate() {
        out.queue(cursor::MoveTo(4, 3 + i as u16))?;
        out.queue(Print(format!(
            "{:>2}. {}  {:<16} score {:>6}  level {:>3}  accuracy {}",
            i + 1,
            entry.created_at.format("%Y-%m-%d"),
            entry.player_name,
            entry.score,
            entry.level,
            format_accuracy(entry.shooting_accuracy),
        )))?;
    }

    let row = 4 + entries.len().max(1) as u16;
    out.queue(cursor::MoveTo(4, row))?;
    out.queue(style::SetForegroundColor(Color::Yellow))?;
    out.queue(Print(format!(
        "This run: score {}  level {}  accuracy {}",
        summary.score,
        summary.level,
        format_accuracy(summary.accuracy),
    )))?;

    let note = match &summary.flush {
        FlushState::Recorded(_) => "Saved to the leaderboard.".to_string(),
        FlushState::Skipped => "Nothing to save for a zero score.".to_string(),
        FlushState::Failed(reason) => format!("Leaderboard write failed: {reason}"),
        FlushState::Pending => String::new(),
    };
    out.queue(cursor::MoveTo(4, row + 1))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print(note))?;

    out.queue(cursor::MoveTo(4, row + 3))?;
    out.queue(Print("R : Play again   any other key : Exit"))?;

    out.queue(style::ResetColor)?;
    out.flush()?;
    Ok(())
}

fn format_accuracy(accuracy: Option<f64>) -> String {
    match accuracy {
        Some(pct) => format!("{pct:.2}%"),
        None => "n/a".to_string(),
    }
}

// ── Border ────────────────────────────────────────────────────────────────────

fn draw_border<W: Write>(out: &mut W, width: u16, height: u16) -> std::io::Result<()> {
    let w = width as usize;
    out.queue(style::SetForegroundColor(C_BORDER))?;

    out.queue(cursor::MoveTo(0, 1))?;
    out.queue(Print(format!("┌{}┐", "─".repeat(w.saturating_sub(2)))))?;

    out.queue(cursor::MoveTo(0, height.saturating_sub(2)))?;
    out.queue(Print(format!("└{}┘", "─".repeat(w.saturating_sub(2)))))?;

    for row in 2..height.saturating_sub(2) {
        out.queue(cursor::MoveTo(0, row))?;
        out.queue(Print("│"))?;
        out.queue(cursor::MoveTo(width.saturating_sub(1), row))?;
        out.queue(Print("│"))?;
    }
    Ok(())
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

fn draw_hud<W: Write>(
    out: &mut W,
    session: &GameSession,
    hud: &Hud,
    width: u16,
) -> std::io::Result<()> {
    let score = session.score();

    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_SCORE))?;
    let best = hud.high_score.max(score.points());
    out.queue(Print(format!("Score:{:>6}  Hi:{:>6}", score.points(), best)))?;

    let level_str = format!("[ LEVEL {} ]", score.level());
    let lx = (width / 2).saturating_sub(level_str.len() as u16 / 2);
    out.queue(cursor::MoveTo(lx, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_LEVEL))?;
    out.queue(Print(&level_str))?;

    let mut power_tag = String::new();
    for capability in Capability::ALL {
        let label = match capability {
            Capability::SuperBullet => "SUPER",
            Capability::UnlimitedBullets => "UNLIM",
        };
        match session.powerups().state(capability) {
            CapabilityState::Held => power_tag.push_str(&format!("[{label}] ")),
            CapabilityState::Active { .. } => power_tag.push_str(&format!("[{label}!] ")),
            CapabilityState::NotHeld | CapabilityState::Expired => {}
        }
    }
    if hud.muted {
        power_tag.push_str("[MUTE] ");
    }
    let hearts: String = "♥".repeat(session.player().lives as usize);
    let lives_str = format!("Lives:{}", hearts);
    let right_len = power_tag.chars().count() + lives_str.chars().count();
    out.queue(cursor::MoveTo(width.saturating_sub(right_len as u16 + 1), 0))?;

    if !power_tag.is_empty() {
        out.queue(style::SetForegroundColor(C_POWERUP_ACTIVE))?;
        out.queue(Print(&power_tag))?;
    }
    out.queue(style::SetForegroundColor(C_HUD_LIVES))?;
    out.queue(Print(&lives_str))?;
    Ok(())
}

// ── Entities ──────────────────────────────────────────────────────────────────

fn fill<W: Write>(
    out: &mut W,
    view: &Viewport,
    rect: &Rect,
    glyph: &str,
    color: Color,
) -> std::io::Result<Option<(u16, u16)>> {
    let Some((x, y, w, h)) = view.cells(rect) else {
        return Ok(None);
    };
    out.queue(style::SetForegroundColor(color))?;
    let line = glyph.repeat(w as usize);
    for row in y..y + h {
        out.queue(cursor::MoveTo(x, row))?;
        out.queue(Print(&line))?;
    }
    Ok(Some((x, y + h)))
}

fn draw_entity<W: Write>(out: &mut W, view: &Viewport, entity: &Entity) -> std::io::Result<()> {
    let (glyph, color) = match entity.category {
        Category::Asteroid => ("█", C_ASTEROID),
        Category::Bullet => ("║", C_BULLET),
        Category::SuperBullet => ("═", C_SUPER_BULLET),
        Category::BrokenShip => ("⌂", C_BROKEN_SHIP),
        Category::ExtraLife => ("♥", C_EXTRA_LIFE),
        Category::SuperBulletPickup => ("★", C_PICKUP),
        Category::UnlimitedBulletsPickup => ("∞", C_PICKUP),
        Category::Star => ("·", C_STAR),
    };
    let below = fill(out, view, &entity.rect, glyph, color)?;

    if let (Payload::Pickup { caption: Some(caption) }, Some((x, row))) = (&entity.payload, below) {
        if row < view.rows + 2 {
            out.queue(cursor::MoveTo(x.saturating_sub(caption.len() as u16 / 2).max(1), row))?;
            out.queue(Print(*caption))?;
        }
    }
    Ok(())
}

fn draw_player<W: Write>(out: &mut W, view: &Viewport, session: &GameSession) -> std::io::Result<()> {
    // Sprite (2 rows, 3 cols), anchored on the ship's footprint:
    //   ▲
    //  /█\
    let Some((x, y, w, h)) = view.cells(&session.player().rect) else {
        return Ok(());
    };
    let mid = x + w / 2;
    let tip = (y + h).saturating_sub(2).max(y);
    out.queue(style::SetForegroundColor(C_PLAYER))?;
    out.queue(cursor::MoveTo(mid, tip))?;
    out.queue(Print("▲"))?;
    out.queue(cursor::MoveTo(mid.saturating_sub(1).max(1), tip + 1))?;
    out.queue(Print("/█\\"))?;
    Ok(())
}

// ── Controls hint (last row) ──────────────────────────────────────────────────

fn draw_controls_hint<W: Write>(out: &mut W, height: u16) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(1, height.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print(
        "← → : Move  SPACE : Shoot  Z : Super  X : Unlimited  M : Mute  Q : Quit",
    ))?;
    Ok(())
}

// ── Game-over overlay ─────────────────────────────────────────────────────────

fn draw_game_over<W: Write>(
    out: &mut W,
    session: &GameSession,
    width: u16,
    height: u16,
) -> std::io::Result<()> {
    let lines: [(String, Color); 4] = [
        ("╔════════════════════╗".to_string(), Color::Red),
        ("║    GAME  OVER      ║".to_string(), Color::Red),
        ("╚════════════════════╝".to_string(), Color::Red),
        (format!("Final Score: {:>6}", session.score().points()), Color::Yellow),
    ];
    let cx = width / 2;
    let start_row = (height / 2).saturating_sub(lines.len() as u16 / 2);
    for (i, (msg, color)) in lines.iter().enumerate() {
        let col = cx.saturating_sub(msg.chars().count() as u16 / 2);
        out.queue(cursor::MoveTo(col, start_row + i as u16))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(msg))?;
    }
    Ok(())
}

/// Rendering layer.  All terminal I/O lives here.
///
/// Each function receives a mutable writer and an immutable view of the
/// game state.  No game logic is performed; this module only projects the
/// arena onto the terminal grid and translates state into commands.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal,
    QueueableCommand,
};
use mutation_brawler::entities::{
    AttackShape, Body, EnemyKind, GameState, GameStatus, Facing, ProjectileOwner, Tint,
};
use mutation_brawler::mutations::MutationCard;

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_HUD: Color = Color::Yellow;
const C_HUD_HP: Color = Color::Red;
const C_ENEMY_GRUNT: Color = Color::Red;
const C_ENEMY_SCOUT: Color = Color::Magenta;
const C_ENEMY_BRUTE: Color = Color::DarkRed;
const C_BOSS: Color = Color::Blue;
const C_PROJECTILE: Color = Color::Yellow;
const C_PICKUP: Color = Color::Green;
const C_ATTACK: Color = Color::White;
const C_SHADOW: Color = Color::DarkGrey;
const C_HINT: Color = Color::DarkGrey;

/// Arena height units per terminal row when drawing jumps.
const Z_PER_ROW: f32 = 20.0;

fn tint_color(tint: Tint) -> Color {
    match tint {
        Tint::Base => Color::Green,
        Tint::Poison => Color::DarkGreen,
        Tint::Sidearm => Color::Cyan,
        Tint::Knockback => Color::DarkYellow,
        Tint::TwinStrike => Color::Magenta,
        Tint::LongReach => Color::DarkMagenta,
        Tint::Cryo => Color::DarkCyan,
        Tint::Elastic => Color::Blue,
        Tint::Viral => Color::DarkMagenta,
    }
}

// ── Projection ────────────────────────────────────────────────────────────────

/// Maps arena coordinates onto the framed play area of the terminal.
struct Viewport {
    cols: u16,
    rows: u16,
    arena_width: f32,
    band_min: f32,
    band_max: f32,
}

impl Viewport {
    fn new(state: &GameState, cols: u16, rows: u16) -> Self {
        Self {
            cols,
            rows,
            arena_width: state.tuning.arena_width,
            band_min: state.tuning.play_band_min,
            band_max: state.tuning.play_band_max,
        }
    }

    fn inner_top(&self) -> u16 {
        2
    }

    fn inner_bottom(&self) -> u16 {
        self.rows.saturating_sub(3)
    }

    fn col(&self, x: f32) -> u16 {
        let span = self.cols.saturating_sub(3).max(1) as f32;
        let t = (x / self.arena_width).clamp(0.0, 1.0);
        1 + (t * span) as u16
    }

    /// The ground band takes the lower part of the play area; the rest is
    /// headroom for jumps and arcs.
    fn row(&self, y: f32, z: f32) -> u16 {
        let top = self.inner_top() as f32;
        let bottom = (self.inner_bottom() as f32).max(top);
        let band_top = top + (bottom - top) * 0.4;
        let t = ((y - self.band_min) / (self.band_max - self.band_min)).clamp(0.0, 1.0);
        let ground = band_top + t * (bottom - band_top);
        (ground - z / Z_PER_ROW).clamp(top, bottom) as u16
    }

    fn body_cell(&self, body: &Body) -> (u16, u16) {
        (self.col(body.center_x()), self.row(body.center_y(), body.z))
    }
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete frame.
pub fn render<W: Write>(out: &mut W, state: &GameState, cols: u16, rows: u16) -> std::io::Result<()> {
    let view = Viewport::new(state, cols, rows);
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    draw_border(out, &view)?;
    draw_hud(out, state, &view)?;

    for pickup in &state.pickups {
        out.queue(cursor::MoveTo(view.col(pickup.x), view.row(pickup.y, pickup.z)))?;
        out.queue(style::SetForegroundColor(C_PICKUP))?;
        out.queue(Print("◆"))?;
    }
    for attack in &state.attack_instances {
        draw_attack(out, &view, attack)?;
    }
    for enemy in state.enemies.iter().chain(state.boss.iter()) {
        draw_enemy(out, &view, enemy)?;
    }
    for p in &state.projectiles {
        let color = match p.owner {
            ProjectileOwner::Player => C_PROJECTILE,
            ProjectileOwner::Enemy => C_BOSS,
        };
        out.queue(cursor::MoveTo(view.col(p.x), view.row(p.y, p.z)))?;
        out.queue(style::SetForegroundColor(color))?;
        out.queue(Print("-"))?;
    }

    draw_player(out, state, &view)?;
    draw_inventory(out, state, &view)?;

    match state.status {
        GameStatus::ChoicePending => draw_level_up(out, state, &view)?,
        GameStatus::GameOver => draw_game_over(out, state, &view)?,
        GameStatus::Running => {}
    }

    // Park cursor in a harmless spot and flush
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, rows.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

// ── Border ────────────────────────────────────────────────────────────────────

fn draw_border<W: Write>(out: &mut W, view: &Viewport) -> std::io::Result<()> {
    let w = view.cols as usize;
    let h = view.rows;

    out.queue(style::SetForegroundColor(C_BORDER))?;

    out.queue(cursor::MoveTo(0, 1))?;
    out.queue(Print(format!("┌{}┐", "─".repeat(w.saturating_sub(2)))))?;

    out.queue(cursor::MoveTo(0, h.saturating_sub(2)))?;
    out.queue(Print(format!("└{}┘", "─".repeat(w.saturating_sub(2)))))?;

    for row in 2..h.saturating_sub(2) {
        out.queue(cursor::MoveTo(0, row))?;
        out.queue(Print("│"))?;
        out.queue(cursor::MoveTo(view.cols.saturating_sub(1), row))?;
        out.queue(Print("│"))?;
    }

    Ok(())
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

fn draw_hud<W: Write>(out: &mut W, state: &GameState, view: &Viewport) -> std::io::Result<()> {
    let stats = &state.player.body.stats;
    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_HP))?;
    out.queue(Print(format!("HP {:>3.0}/{:<3.0}", stats.hp.max(0.0), stats.max_hp)))?;

    let progress = format!(
        "Lv {}  XP {}/{}",
        state.player.level, state.player.xp, state.player.xp_to_next_level
    );
    let px = (view.cols / 2).saturating_sub(progress.len() as u16 / 2);
    out.queue(cursor::MoveTo(px, 0))?;
    out.queue(style::SetForegroundColor(C_HUD))?;
    out.queue(Print(&progress))?;

    let wave = if state.boss.is_some() {
        format!("Wave {} — BOSS", state.wave)
    } else {
        format!("Wave {}", state.wave)
    };
    let wx = view.cols.saturating_sub(wave.chars().count() as u16 + 1);
    out.queue(cursor::MoveTo(wx, 0))?;
    out.queue(Print(&wave))?;

    Ok(())
}

// ── Entities ──────────────────────────────────────────────────────────────────

fn draw_shadow<W: Write>(out: &mut W, view: &Viewport, body: &Body) -> std::io::Result<()> {
    if body.z > 0.0 {
        out.queue(cursor::MoveTo(view.col(body.center_x()), view.row(body.center_y(), 0.0)))?;
        out.queue(style::SetForegroundColor(C_SHADOW))?;
        out.queue(Print("_"))?;
    }
    Ok(())
}

fn draw_player<W: Write>(out: &mut W, state: &GameState, view: &Viewport) -> std::io::Result<()> {
    let body = &state.player.body;
    draw_shadow(out, view, body)?;

    // Grown shapes draw a wider sprite.
    let sprite = match (body.shape.scale > 1.2, body.facing) {
        (true, Facing::Right) => "@@>",
        (true, Facing::Left) => "<@@",
        (false, Facing::Right) => "@>",
        (false, Facing::Left) => "<@",
    };
    let (col, row) = view.body_cell(body);
    out.queue(cursor::MoveTo(col.saturating_sub(1).max(1), row))?;
    out.queue(style::SetForegroundColor(tint_color(body.shape.tint)))?;
    out.queue(Print(sprite))?;
    Ok(())
}

fn draw_enemy<W: Write>(
    out: &mut W,
    view: &Viewport,
    enemy: &mutation_brawler::entities::Enemy,
) -> std::io::Result<()> {
    draw_shadow(out, view, &enemy.body)?;
    let (sprite, color) = match enemy.kind {
        EnemyKind::Grunt => ("g", C_ENEMY_GRUNT),
        EnemyKind::Scout => ("s", C_ENEMY_SCOUT),
        EnemyKind::Brute => ("B", C_ENEMY_BRUTE),
        EnemyKind::Boss => ("[W]", C_BOSS),
    };
    let (col, row) = view.body_cell(&enemy.body);
    out.queue(cursor::MoveTo(col.saturating_sub(sprite.len() as u16 / 2).max(1), row))?;
    out.queue(style::SetForegroundColor(color))?;
    out.queue(Print(sprite))?;

    // Health pip row above anything wounded
    let stats = &enemy.body.stats;
    if stats.hp < stats.max_hp && row > view.inner_top() {
        let filled = ((stats.hp.max(0.0) / stats.max_hp) * 3.0).ceil() as usize;
        out.queue(cursor::MoveTo(col.saturating_sub(1).max(1), row - 1))?;
        out.queue(style::SetForegroundColor(Color::DarkGreen))?;
        out.queue(Print(format!("{:<3}", "▪".repeat(filled))))?;
    }
    Ok(())
}

fn draw_attack<W: Write>(
    out: &mut W,
    view: &Viewport,
    attack: &mutation_brawler::entities::AttackInstance,
) -> std::io::Result<()> {
    out.queue(style::SetForegroundColor(C_ATTACK))?;
    let ground_z = (attack.z - 18.0).max(0.0);
    match attack.spec.shape {
        AttackShape::Circle => {
            let row = view.row(attack.y, ground_z);
            let left = view.col(attack.x - attack.spec.area);
            let right = view.col(attack.x + attack.spec.area);
            out.queue(cursor::MoveTo(left, row))?;
            out.queue(Print("("))?;
            out.queue(cursor::MoveTo(right, row))?;
            out.queue(Print(")"))?;
        }
        AttackShape::Line => {
            let (from, to) = match attack.facing {
                Facing::Right => (attack.x, attack.x + attack.spec.area),
                Facing::Left => (attack.x - attack.spec.area, attack.x),
            };
            let (c0, c1) = (view.col(from), view.col(to));
            out.queue(cursor::MoveTo(c0, view.row(attack.y, ground_z)))?;
            out.queue(Print("=".repeat((c1.saturating_sub(c0)).max(1) as usize)))?;
        }
        AttackShape::Projectile => {}
    }
    Ok(())
}

// ── Inventory (last row) ──────────────────────────────────────────────────────

fn card_label(card: Option<&MutationCard>) -> String {
    match card {
        Some(card) => format!("{} L{}", card.id(), card.level),
        None => "—".to_string(),
    }
}

fn draw_inventory<W: Write>(out: &mut W, state: &GameState, view: &Viewport) -> std::io::Result<()> {
    let inv = &state.inventory;
    let pack: Vec<String> = inv.backpack.iter().map(|c| card_label(Some(c))).collect();
    let line = format!(
        "A:[{}]  B:[{}]  Pack({}/{}): {}",
        card_label(inv.socket_a.as_ref()),
        card_label(inv.socket_b.as_ref()),
        inv.backpack.len(),
        inv.capacity,
        pack.join(", ")
    );
    out.queue(cursor::MoveTo(1, view.rows.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print(line))?;
    Ok(())
}

// ── Overlays ──────────────────────────────────────────────────────────────────

fn draw_centered<W: Write>(
    out: &mut W,
    view: &Viewport,
    lines: &[(String, Color)],
) -> std::io::Result<()> {
    let cx = view.cols / 2;
    let start_row = (view.rows / 2).saturating_sub(lines.len() as u16 / 2);

    for (i, (msg, color)) in lines.iter().enumerate() {
        let row = start_row + i as u16;
        let col = cx.saturating_sub(msg.chars().count() as u16 / 2);
        out.queue(cursor::MoveTo(col, row))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(msg))?;
    }
    Ok(())
}

fn draw_level_up<W: Write>(out: &mut W, state: &GameState, view: &Viewport) -> std::io::Result<()> {
    let mut lines = vec![
        ("╔══════════════════╗".to_string(), Color::Green),
        ("║    LEVEL  UP!    ║".to_string(), Color::Green),
        ("╚══════════════════╝".to_string(), Color::Green),
        ("Choose your upgrade:".to_string(), Color::White),
    ];
    for (i, option) in state.level_up_choices.iter().enumerate() {
        lines.push((
            format!("[{}] {} — {}", i + 1, option.title(), option.description(&state.player)),
            Color::Yellow,
        ));
    }
    draw_centered(out, view, &lines)
}

fn draw_game_over<W: Write>(out: &mut W, state: &GameState, view: &Viewport) -> std::io::Result<()> {
    let lines = [
        ("╔══════════════════╗".to_string(), Color::Red),
        ("║    GAME  OVER    ║".to_string(), Color::Red),
        ("╚══════════════════╝".to_string(), Color::Red),
        (format!("You reached wave {}", state.wave), Color::Yellow),
        ("R - Restart  Q - Quit".to_string(), Color::White),
    ];
    draw_centered(out, view, &lines)
}

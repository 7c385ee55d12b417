mod display;

use std::collections::HashMap;
use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::path::PathBuf;
use std::sync::{mpsc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    style::{self, Color, Print},
    terminal, ExecutableCommand, QueueableCommand,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mutation_brawler::compute::{init_state, tick};
use mutation_brawler::config::Tuning;
use mutation_brawler::entities::{GameState, GameStatus, InputIntent};
use mutation_brawler::error::Result;
use mutation_brawler::progression::select_choice;

const FRAME: Duration = Duration::from_millis(16); // ≈60 FPS

/// Fixed step used by the headless runner.
const HEADLESS_DT: f32 = 1.0 / 60.0;

/// A key is considered "held" if its last press/repeat event arrived within
/// this many frames.  Covers terminals that don't emit key-release events:
/// the OS key-repeat rate is ≥ 15 Hz, so a window of 8 frames (≈133 ms) is
/// always refreshed before expiry.
const HOLD_WINDOW: u64 = 8;

#[derive(Parser, Debug)]
#[command(name = "mutation_brawler", about = "Arena brawler with stackable attack mutations")]
struct Args {
    /// TOML file overriding gameplay tuning
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Write logs to this file (the terminal UI otherwise runs without logging)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Run this many frames without a terminal, driven by an autopilot
    #[arg(long, value_name = "FRAMES")]
    headless: Option<u64>,

    /// Print the final snapshot as JSON after a headless run
    #[arg(long, requires = "headless")]
    dump: bool,
}

fn init_tracing(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mutation_brawler=info"));

    if let Some(path) = &args.log_file {
        let file = File::create(path)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if args.headless.is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
    // No subscriber otherwise: stderr output would tear the alternate screen.
    Ok(())
}

/// Returns true if `key` was seen within the last `HOLD_WINDOW` frames.
fn is_held(key_frame: &HashMap<KeyCode, u64>, key: &KeyCode, frame: u64) -> bool {
    key_frame
        .get(key)
        .map(|&last| frame.saturating_sub(last) <= HOLD_WINDOW)
        .unwrap_or(false)
}

fn any_held(key_frame: &HashMap<KeyCode, u64>, keys: &[KeyCode], frame: u64) -> bool {
    keys.iter().any(|k| is_held(key_frame, k, frame))
}

fn axis(negative: bool, positive: bool) -> i8 {
    match (negative, positive) {
        (true, false) => -1,
        (false, true) => 1,
        _ => 0,
    }
}

// ── Instructions ──────────────────────────────────────────────────────────────

enum MenuResult {
    Start,
    Quit,
}

fn show_instructions<W: Write>(out: &mut W, rx: &mpsc::Receiver<Event>) -> Result<MenuResult> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let (width, height) = terminal::size()?;
    let cx = width / 2;
    let cy = height / 2;

    let title = "★  MUTATION  BRAWLER  ★";
    out.queue(cursor::MoveTo(
        cx.saturating_sub(title.chars().count() as u16 / 2),
        cy.saturating_sub(8),
    ))?;
    out.queue(style::SetForegroundColor(Color::Green))?;
    out.queue(Print(title))?;

    out.queue(cursor::MoveTo(cx.saturating_sub(24), cy.saturating_sub(6)))?;
    out.queue(style::SetForegroundColor(Color::White))?;
    out.queue(Print("Survive waves of enemies, collect mutations, level up."))?;

    let controls: &[(&str, &str)] = &[
        ("A/D  ←/→", "Move left / right"),
        ("W/S  ↑/↓", "Move up / down"),
        ("Space   ", "Jump"),
        ("J / Z   ", "Attack A (Swipe)"),
        ("K / X   ", "Attack B (Combo)"),
        ("1 / 2   ", "Equip newest mutation to A / B"),
        ("1 2 3   ", "Pick a level-up option"),
    ];
    for (i, (keys, desc)) in controls.iter().enumerate() {
        let row = cy.saturating_sub(4) + i as u16;
        out.queue(cursor::MoveTo(cx.saturating_sub(20), row))?;
        out.queue(style::SetForegroundColor(Color::Yellow))?;
        out.queue(Print(format!("{:<10}", keys)))?;
        out.queue(style::SetForegroundColor(Color::DarkGrey))?;
        out.queue(Print(format!(" — {}", desc)))?;
    }

    out.queue(cursor::MoveTo(cx.saturating_sub(24), cy + 4))?;
    out.queue(style::SetForegroundColor(Color::DarkGrey))?;
    out.queue(Print("Walk over ◆ to pick up mutations; duplicates level up."))?;

    out.queue(cursor::MoveTo(cx.saturating_sub(14), cy + 6))?;
    out.queue(style::SetForegroundColor(Color::Green))?;
    out.queue(Print("ENTER : Start brawling   Q : Quit"))?;

    out.queue(style::ResetColor)?;
    out.flush()?;

    // Block until the user makes a choice
    loop {
        match rx.recv() {
            Ok(Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                ..
            })) => match code {
                KeyCode::Enter | KeyCode::Char(' ') => return Ok(MenuResult::Start),
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                    return Ok(MenuResult::Quit);
                }
                _ => {}
            },
            Ok(_) => {}
            Err(_) => return Ok(MenuResult::Quit),
        }
    }
}

// ── Game loop ─────────────────────────────────────────────────────────────────

/// Runs until the player quits.  `R` on the game-over screen starts a fresh
/// run with the same tuning.
///
/// Input model: a `key_frame` map records the frame number of the last
/// press/repeat event for every key.  Each frame the still-fresh keys are
/// folded into one `InputIntent`, so movement, jumping and both attacks can
/// be held together.  One-shot keys (equip, level-up choice, restart) act on
/// the press event itself.
fn game_loop<W: Write, R: Rng>(
    out: &mut W,
    mut state: GameState,
    rx: &mpsc::Receiver<Event>,
    rng: &mut R,
) -> Result<()> {
    let mut key_frame: HashMap<KeyCode, u64> = HashMap::new();
    let mut frame: u64 = 0;
    let mut last_step = Instant::now();

    loop {
        let frame_start = Instant::now();
        frame += 1;
        let mut intent = InputIntent::default();
        let mut restart = false;

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(ev) = rx.try_recv() {
            let Event::Key(KeyEvent {
                code,
                kind,
                modifiers,
                ..
            }) = ev
            else {
                continue;
            };
            match kind {
                KeyEventKind::Press => {
                    key_frame.insert(code, frame);
                    match code {
                        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                            return Ok(());
                        }
                        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                            return Ok(());
                        }
                        KeyCode::Char('r') | KeyCode::Char('R') if state.is_game_over() => {
                            restart = true;
                        }
                        KeyCode::Char(c @ '1'..='3')
                            if state.status == GameStatus::ChoicePending =>
                        {
                            let index = c as usize - '1' as usize;
                            if let Err(err) = select_choice(&mut state, index) {
                                warn!(%err, "level-up choice rejected");
                            }
                        }
                        KeyCode::Char('1') => intent.equip_newest_a = true,
                        KeyCode::Char('2') => intent.equip_newest_b = true,
                        _ => {}
                    }
                }
                KeyEventKind::Repeat => {
                    key_frame.insert(code, frame);
                }
                KeyEventKind::Release => {
                    key_frame.remove(&code);
                }
            }
        }

        if restart {
            state = init_state(state.tuning, rng);
            key_frame.clear();
            last_step = Instant::now();
            info!(wave = state.wave, "run restarted");
        }

        // ── Fold held keys into the frame's intent ────────────────────────────
        let left = any_held(&key_frame, &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')], frame);
        let right = any_held(&key_frame, &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')], frame);
        let up = any_held(&key_frame, &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')], frame);
        let down = any_held(&key_frame, &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')], frame);
        intent.move_x = axis(left, right);
        intent.move_y = axis(up, down);
        intent.jump = is_held(&key_frame, &KeyCode::Char(' '), frame);
        intent.attack_a = any_held(&key_frame, &[KeyCode::Char('j'), KeyCode::Char('z')], frame);
        intent.attack_b = any_held(&key_frame, &[KeyCode::Char('k'), KeyCode::Char('x')], frame);

        let dt = last_step.elapsed().as_secs_f32();
        last_step = Instant::now();
        state = tick(state, &intent, dt, rng);

        let (cols, rows) = terminal::size()?;
        display::render(out, &state, cols, rows)?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME {
            std::thread::sleep(FRAME - elapsed);
        }
    }
}

// ── Headless runner ───────────────────────────────────────────────────────────

/// Walk toward the nearest enemy, swing when close, and equip whatever
/// turns up.
fn autopilot(state: &GameState) -> InputIntent {
    let me = &state.player.body;
    let nearest = state
        .enemies
        .iter()
        .chain(state.boss.iter())
        .map(|e| (e.body.x - me.x, e.body.y - me.y))
        .min_by(|a, b| {
            let da = a.0 * a.0 + a.1 * a.1;
            let db = b.0 * b.0 + b.1 * b.1;
            da.total_cmp(&db)
        });

    let mut intent = InputIntent {
        equip_newest_a: state.inventory.socket_a.is_none() && !state.inventory.backpack.is_empty(),
        equip_newest_b: state.inventory.socket_b.is_none() && state.inventory.backpack.len() > 1,
        ..InputIntent::default()
    };
    if let Some((dx, dy)) = nearest {
        intent.move_x = axis(dx < -20.0, dx > 20.0);
        intent.move_y = axis(dy < -10.0, dy > 10.0);
        let close = dx * dx + dy * dy < 70.0 * 70.0;
        intent.attack_a = close;
        intent.attack_b = !close;
    }
    intent
}

fn run_headless<R: Rng>(tuning: Tuning, frames: u64, dump: bool, rng: &mut R) -> Result<()> {
    let mut state = init_state(tuning, rng);

    for _ in 0..frames {
        if state.status == GameStatus::ChoicePending {
            select_choice(&mut state, 0)?;
        }
        if state.is_game_over() {
            break;
        }
        let intent = autopilot(&state);
        state = tick(state, &intent, HEADLESS_DT, rng);
    }

    info!(
        wave = state.wave,
        level = state.player.level,
        hp = state.player.body.stats.hp,
        clock = state.clock,
        game_over = state.is_game_over(),
        "headless run finished"
    );
    if dump {
        println!("{}", serde_json::to_string_pretty(&state)?);
    }
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args)?;

    let tuning = match &args.config {
        Some(path) => Tuning::load(path)?,
        None => Tuning::default(),
    };
    let mut rng = match args.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    if let Some(frames) = args.headless {
        return run_headless(tuning, frames, args.dump, &mut rng);
    }

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Request key-release (and key-repeat) events from the terminal.
    // Kitty-protocol terminals support this; others fall back gracefully.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the game loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || loop {
        match event::read() {
            Ok(ev) => {
                if tx.send(ev).is_err() {
                    break; // receiver dropped → program exiting
                }
            }
            Err(_) => break,
        }
    });

    let result = run(&mut out, &rx, tuning, &mut rng);

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result
}

fn run<W: Write, R: Rng>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    tuning: Tuning,
    rng: &mut R,
) -> Result<()> {
    match show_instructions(out, rx)? {
        MenuResult::Quit => Ok(()),
        MenuResult::Start => {
            let state = init_state(tuning, rng);
            info!(wave = state.wave, "run started");
            game_loop(out, state, rx, rng)
        }
    }
}

mod display;

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{stdout, BufWriter, Write};
use std::sync::{mpsc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    style::Print,
    terminal, ExecutableCommand, QueueableCommand,
};
use rand::thread_rng;

use galactic_salvage::config::{self, GameConfig};
use galactic_salvage::entities::{InputFrame, SoundCue};
use galactic_salvage::error::StorageError;
use galactic_salvage::persistence::{LeaderboardStore, SqliteStore, UnavailableStore};
use galactic_salvage::session::GameSession;

use display::Hud;

// ── Simultaneous-input constants ──────────────────────────────────────────────

/// Min frames between shots while Space is held.
/// 10 frames @ 60 FPS = 6 shots/sec, so the 3-bullet ceiling still bites.
const SHOOT_COOLDOWN: u32 = 10;

/// A key counts as held if its last press/repeat arrived within this many
/// frames.  Terminals without release events rely on OS key-repeat (≥ 15 Hz)
/// refreshing the entry before it lapses.
const HOLD_WINDOW: u64 = 8;

const MAX_NAME_LEN: usize = 16;

fn is_held(key_frame: &HashMap<KeyCode, u64>, key: &KeyCode, frame: u64) -> bool {
    key_frame
        .get(key)
        .map(|&last| frame.saturating_sub(last) <= HOLD_WINDOW)
        .unwrap_or(false)
}

fn any_held(key_frame: &HashMap<KeyCode, u64>, keys: &[KeyCode], frame: u64) -> bool {
    keys.iter().any(|k| is_held(key_frame, k, frame))
}

// ── Logging ───────────────────────────────────────────────────────────────────

/// The terminal is in raw mode while playing, so log lines go to a file.
fn init_tracing() {
    let path = config::log_path();
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

// ── Audio ─────────────────────────────────────────────────────────────────────

/// The terminal bell stands in for the mixer; only the cues that matter get
/// one so rapid fire does not drown everything else.
fn play_cues<W: Write>(out: &mut W, cues: &[SoundCue], muted: bool) -> std::io::Result<()> {
    for cue in cues {
        tracing::trace!(?cue, "sound cue");
        if muted {
            continue;
        }
        if matches!(
            cue,
            SoundCue::PlayerBoom | SoundCue::LevelUp | SoundCue::GameOver | SoundCue::SavedBrokenShip
        ) {
            out.queue(Print('\x07'))?;
        }
    }
    Ok(())
}

// ── Name prompt ───────────────────────────────────────────────────────────────

/// Ask for a player name and register it.  `None` means the user quit.
fn prompt_name<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    store: &mut dyn LeaderboardStore,
) -> anyhow::Result<Option<String>> {
    let mut typed = String::new();
    loop {
        display::render_name_prompt(out, &typed)?;
        let ev = match rx.recv() {
            Ok(ev) => ev,
            Err(_) => return Ok(None),
        };
        let Event::Key(KeyEvent { code, kind, modifiers, .. }) = ev else {
            continue;
        };
        if kind == KeyEventKind::Release {
            continue;
        }
        match code {
            KeyCode::Esc => return Ok(None),
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return Ok(None),
            KeyCode::Backspace => {
                typed.pop();
            }
            KeyCode::Enter => match store.get_or_create_player_id(&typed) {
                Ok(player_id) => {
                    tracing::info!(player_id, "player signed in");
                    return Ok(Some(typed.trim().to_string()));
                }
                Err(StorageError::EmptyName) => {}
                Err(err) => {
                    // The row is written under this name at the end anyway.
                    tracing::warn!(error = %err, "player registration failed");
                    return Ok(Some(typed.trim().to_string()));
                }
            },
            KeyCode::Char(c) if !c.is_control() && typed.chars().count() < MAX_NAME_LEN => {
                typed.push(c);
            }
            _ => {}
        }
    }
}

// ── Game loop ─────────────────────────────────────────────────────────────────

/// Play one session to completion.  Returns `true` when the player asked to
/// leave the program rather than just end the run.
///
/// Held keys are tracked in `key_frame` (key → frame last seen) and turned
/// into an `InputFrame` each frame, so Space and the arrows work together.
/// Terminals with keyboard enhancement also send releases, which drop the key
/// immediately.
fn game_loop<W: Write>(
    out: &mut W,
    session: &mut GameSession,
    rx: &mpsc::Receiver<Event>,
    hud: &mut Hud,
) -> std::io::Result<bool> {
    let mut rng = thread_rng();
    let frame_len = Duration::from_secs_f64(1.0 / session.config().frame_rate as f64);

    let mut key_frame: HashMap<KeyCode, u64> = HashMap::new();
    let mut shoot_cooldown: u32 = 0;
    let mut frame: u64 = 0;
    let mut hard_quit = false;

    while !session.is_over() {
        let frame_start = Instant::now();
        frame += 1;
        let mut input = InputFrame::default();

        // ── Drain pending input (non-blocking) ────────────────────────────────
        while let Ok(ev) = rx.try_recv() {
            let Event::Key(KeyEvent { code, kind, modifiers, .. }) = ev else {
                continue;
            };
            match kind {
                KeyEventKind::Press => {
                    key_frame.insert(code.clone(), frame);
                    match code {
                        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => input.quit = true,
                        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                            input.quit = true;
                            hard_quit = true;
                        }
                        KeyCode::Char('z') | KeyCode::Char('Z') => input.activate_super_bullet = true,
                        KeyCode::Char('x') | KeyCode::Char('X') => {
                            input.activate_unlimited_bullets = true
                        }
                        KeyCode::Char('m') | KeyCode::Char('M') => input.toggle_mute = true,
                        KeyCode::F(12) => input.toggle_fullscreen = true,
                        _ => {}
                    }
                }
                KeyEventKind::Repeat => {
                    key_frame.insert(code.clone(), frame);
                }
                KeyEventKind::Release => {
                    key_frame.remove(&code);
                }
            }
        }

        // ── Held keys ─────────────────────────────────────────────────────────
        input.move_left = any_held(
            &key_frame,
            &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')],
            frame,
        );
        input.move_right = any_held(
            &key_frame,
            &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')],
            frame,
        );
        if shoot_cooldown == 0 && is_held(&key_frame, &KeyCode::Char(' '), frame) {
            input.fire = true;
            shoot_cooldown = SHOOT_COOLDOWN;
        }
        shoot_cooldown = shoot_cooldown.saturating_sub(1);

        if input.toggle_mute {
            hud.muted = !hud.muted;
            tracing::info!(muted = hud.muted, "mute toggled");
        }
        if input.toggle_fullscreen {
            tracing::debug!("fullscreen is up to the terminal; ignored");
        }

        session.apply_input(&input);
        session.tick(frame_len, &mut rng);

        let cues = session.drain_cues();
        play_cues(out, &cues, hud.muted)?;
        display::render(out, session, hud)?;

        let elapsed = frame_start.elapsed();
        if elapsed < frame_len {
            thread::sleep(frame_len - elapsed);
        }
    }
    Ok(hard_quit)
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = GameConfig::from_env().context("loading game config")?;

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Ask for release/repeat events; terminals without the protocol ignore it.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Blocking reads live on their own thread so the frame loop never waits.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || {
        while let Ok(ev) = event::read() {
            if tx.send(ev).is_err() {
                break;
            }
        }
    });

    let result = run(&mut out, &rx, config);

    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    if let Err(err) = &result {
        tracing::error!(error = %err, "exiting with error");
    }
    result
}

/// A database that cannot be opened still lets the game run; the session
/// summary then reports the leaderboard write as failed.
fn open_store() -> Box<dyn LeaderboardStore> {
    let path = config::leaderboard_path();
    match SqliteStore::open(&path) {
        Ok(store) => Box::new(store),
        Err(err) => {
            tracing::warn!(error = %err, "leaderboard unavailable; scores will not be saved");
            Box::new(UnavailableStore::new(err.to_string()))
        }
    }
}

fn run<W: Write>(out: &mut W, rx: &mpsc::Receiver<Event>, config: GameConfig) -> anyhow::Result<()> {
    let mut store = open_store();
    let Some(name) = prompt_name(out, rx, store.as_mut())? else {
        return Ok(());
    };
    let mut hud = Hud {
        high_score: 0,
        muted: false,
    };

    loop {
        hud.high_score = store.current_high_score().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "high score unavailable");
            0
        });

        let mut session = GameSession::new(config.clone(), &mut thread_rng());
        let hard_quit = game_loop(out, &mut session, rx, &mut hud)?;

        let outcome = session.finish(store.as_mut(), &name);
        tracing::info!(?outcome, "session finished");
        if hard_quit {
            return Ok(());
        }

        let top = store.top_ten().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "leaderboard read failed");
            Vec::new()
        });
        display::render_leaderboard(out, &top, &session.summary())?;

        // Drop keys still in flight from the game, then wait for a fresh one.
        while rx.try_recv().is_ok() {}
        loop {
            match rx.recv() {
                Ok(Event::Key(KeyEvent { code, kind: KeyEventKind::Press, .. })) => match code {
                    KeyCode::Char('r') | KeyCode::Char('R') => break,
                    _ => return Ok(()),
                },
                Ok(_) => {}
                Err(_) => return Ok(()),
            }
        }
    }
}

use std::{process::exit, thread::sleep, time::{Duration, Instant}};

use crate::Coord;
use crate::game::{Game, TerminationCause, TickOutcome};
use crate::snake::Direction::{*, self};
use crate::term::TermManager;
use crate::TermInt;

use crossterm::event::{KeyEvent, KeyModifiers, KeyCode};

const POLL_INTERVAL_MS: u64 = 5;

/// Terminal cells are taller than they are wide; vertical travel waits a
/// little longer per step so the snake's apparent speed stays constant.
const VERTICAL_STRETCH: f64 = 1.35;

pub struct App {
    width: TermInt,
    height: TermInt,
    paused: bool,
    term: TermManager,
}

impl App {
    pub fn new() -> Self {
        App { width: 0, height: 0, paused: false, term: TermManager::new() }
    }

    pub fn initialize(&mut self) {
        self.term.setup();

        let (w, h) = self.term.get_terminal_size();
        self.width = w;
        self.height = h;
    }

    pub fn show_intro(&mut self) {
        let lines = &[
            "Snake: in Space",
            "",
            "Arrow keys or WASD to move",
            "Esc to pause",
            "CTRL+C or q to quit",
            "",
            "Press any key to begin"
        ];

        self.term.show_message(lines);

        if is_quit(&self.term.read_key_blocking()) {
            self.clean_exit()
        }

        self.term.hide_message();
    }

    /// Runs one full round: fresh world, tick loop, game-over screen.
    pub fn play(&mut self) {
        self.term.clear();

        let mut game = match Game::new(self.width as Coord, self.height as Coord, Instant::now()) {
            Ok(game) => game,
            Err(_) => self.board_too_small(),
        };

        let mut dir_change: Option<Direction> = None;
        let mut deadline = Instant::now() + step_wait(&game);

        self.term.render(&game.snapshot());

        loop {
            sleep(Duration::from_millis(POLL_INTERVAL_MS));

            for key_ev in self.term.read_key_events_queue() {
                match &key_ev {
                    ev if is_quit(ev) => self.clean_exit(),
                    KeyEvent { code, modifiers: _ } => match code {
                        KeyCode::Char('w') | KeyCode::Up => dir_change = Some(Up),
                        KeyCode::Char('a') | KeyCode::Left => dir_change = Some(Left),
                        KeyCode::Char('s') | KeyCode::Down => dir_change = Some(Down),
                        KeyCode::Char('d') | KeyCode::Right => dir_change = Some(Right),
                        KeyCode::Esc => {
                            self.toggle_pause();
                            if !self.paused {
                                deadline = Instant::now() + step_wait(&game);
                            }
                        }
                        _ => {}
                    }
                }
            }

            if self.paused || Instant::now() < deadline {
                continue;
            }

            // One simulation step; only the last direction key sampled
            // since the previous step takes effect.
            let outcome = game.tick(dir_change.take(), Instant::now());
            self.term.render(&game.snapshot());

            match outcome {
                TickOutcome::Running => deadline = Instant::now() + step_wait(&game),
                TickOutcome::Over(cause) => {
                    self.game_over(&game, cause);
                    break;
                }
            }
        }

        // Quit if the user CTRL+C's after the game
        if is_quit(&self.term.read_key_blocking()) {
            self.clean_exit()
        }
    }

    ///////////////////////////////////////////////////////////////////////////

    fn clean_exit(&mut self) -> ! {
        self.term.restore();
        exit(0);
    }

    fn game_over(&mut self, game: &Game, cause: TerminationCause) {
        let headline = match cause {
            TerminationCause::BorderHit => "Crashed into the wall!",
            TerminationCause::SelfHit => "The snake bit itself!",
            TerminationCause::MeteorHit => "Smashed into a meteor!",
            TerminationCause::BoardFull => "Board conquered. You won!",
        };

        if cause != TerminationCause::BoardFull {
            self.term.paint_dead_snake(game.snake().body());
        }

        self.term.show_message(&[
            headline,
            &*format!("Score: {}", game.score()),
            "",
            "Press any key to play again,",
            "or CTRL+C to quit."
        ]);
    }

    fn board_too_small(&mut self) -> ! {
        self.term.show_message(&[
            "This terminal is too small to hold a game board.",
            "",
            "Press any key to exit."
        ]);
        self.term.read_key_blocking();
        self.clean_exit()
    }

    fn toggle_pause(&mut self) {
        if !self.paused {
            self.term.show_message(&["Paused", "Press Esc to resume", "or Ctrl+C to quit"]);
        } else {
            self.term.hide_message();
        }

        self.paused = !self.paused;
    }
}

fn step_wait(game: &Game) -> Duration {
    let interval = game.tick_interval();

    match game.snake().heading() {
        Up | Down => interval.mul_f64(VERTICAL_STRETCH),
        Left | Right => interval,
    }
}

fn is_quit(ev: &KeyEvent) -> bool {
    matches!(ev, KeyEvent { code: KeyCode::Char('c'), modifiers: KeyModifiers::CONTROL })
        || matches!(ev, KeyEvent { code: KeyCode::Char('q'), modifiers: _ })
}

use crate::{Cell, TermInt};
use std::{io::{Stdout, Write, stdout}, time::Duration};

use crate::game::Snapshot;
use crate::snake::Direction;

use crossterm::{cursor, execute, queue, style, terminal};
use crossterm::style::Color;
use crossterm::terminal::{ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::event::{Event, KeyEvent, read, poll};

const BORDER_CORNER_CHAR: char = '+';
const BORDER_H_CHAR: char = '-';
const BORDER_V_CHAR: char = '|';
const SNAKE_BODY_CHAR: char = '█';
const FOOD_CHAR: char = 'π';
const METEOR_CHAR: char = '*';
const PORTAL_CHAR: char = '@';
const DEAD_SNAKE_CHAR: char = 'X';

const METEOR_COLOR: Color = Color::Red;
const PORTAL_COLOR: Color = Color::Blue;
const DEAD_SNAKE_COLOR: Color = Color::Red;
const PLAIN: Color = Color::White;

/// One terminal cell: glyph plus foreground color.
type Glyph = (char, Color);

const BLANK: Glyph = (' ', PLAIN);

/// Owns the real terminal: raw mode, the alternate screen, key polling
/// and all visual encoding. The simulation hands over semantic snapshots;
/// everything glyph- or color-shaped lives here.
pub struct TermManager {
    width: TermInt,
    height: TermInt,
    stdout: Stdout,
    screen: Vec<Glyph>,
    msg_shown: bool,
}

impl TermManager {
    pub fn new() -> Self {
        let (width, height) = terminal::size().expect("Error reading size.");
        let stdout = stdout();
        let screen = vec![BLANK; width as usize * height as usize];
        TermManager { width, height, stdout, screen, msg_shown: false }
    }

    pub fn setup(&mut self) {
        execute!(self.stdout, EnterAlternateScreen, cursor::Hide, cursor::DisableBlinking)
            .expect("Error preparing the terminal.");
        terminal::enable_raw_mode().expect("Error enabling raw mode.");
    }

    pub fn restore(&mut self) {
        terminal::disable_raw_mode().expect("Error disabling raw mode.");
        execute!(self.stdout, cursor::Show, cursor::EnableBlinking, LeaveAlternateScreen)
            .expect("Error restoring the terminal.");
    }

    pub fn read_key_blocking(&self) -> KeyEvent {
        loop {
            if let Event::Key(ev) = read().unwrap() {
                return ev;
            }
        }
    }

    pub fn read_key_events_queue(&self) -> Vec<KeyEvent> {
        let mut events = vec![];

        while poll(Duration::from_millis(1)).unwrap() {
            if let Event::Key(ev) = read().unwrap() {
                events.push(ev);
            }
        }

        events
    }

    pub fn get_terminal_size(&self) -> (TermInt, TermInt) {
        (self.width, self.height)
    }

    /// Draws one frame. The snapshot is composed into a full glyph grid,
    /// compared against what is already on screen, and only the cells
    /// that changed are written out.
    pub fn render(&mut self, snap: &Snapshot) {
        let frame = self.compose(snap);

        for (i, (&new, &old)) in frame.iter().zip(self.screen.iter()).enumerate() {
            if new != old {
                let x = (i % self.width as usize) as TermInt;
                let y = (i / self.width as usize) as TermInt;
                queue!(
                    self.stdout,
                    cursor::MoveTo(x, y),
                    style::SetForegroundColor(new.1),
                    style::Print(new.0)
                )
                .unwrap();
            }
        }

        self.screen = frame;
        self.flush();
    }

    /// Repaints the snake's corpse over its last position.
    pub fn paint_dead_snake(&mut self, body: &[Cell]) {
        for &(x, y) in body {
            self.put_glyph((x as TermInt, y as TermInt), (DEAD_SNAKE_CHAR, DEAD_SNAKE_COLOR));
        }
        self.flush();
    }

    /// Prints a centered message box over the game without touching the
    /// screen buffer; `hide_message` brings the buffered frame back.
    pub fn show_message(&mut self, lines: &[&str]) {
        let box_width = lines.iter().map(|l| l.len()).max().unwrap() + 2;
        let box_height = lines.len() + 2;
        let left = (self.width - box_width as TermInt) / 2;
        let top = (self.height - box_height as TermInt) / 2;

        queue!(self.stdout, style::SetForegroundColor(PLAIN)).unwrap();

        for row in 0..box_height {
            // Row 0 and the last row are blank padding around the text
            let text = if row == 0 || row == box_height - 1 {
                " ".repeat(box_width)
            } else {
                format!("{: ^1$}", lines[row - 1], box_width)
            };
            queue!(self.stdout, cursor::MoveTo(left, top + row as TermInt), style::Print(text))
                .unwrap();
        }

        self.msg_shown = true;
        self.flush();
    }

    pub fn hide_message(&mut self) {
        if !self.msg_shown {
            return;
        }

        self.msg_shown = false;

        // The message was printed over the grid without touching the
        // buffer; putting the whole buffer back erases it.
        for i in 0..self.screen.len() {
            let x = (i % self.width as usize) as TermInt;
            let y = (i / self.width as usize) as TermInt;
            let glyph = self.screen[i];
            self.put_glyph((x, y), glyph);
        }

        self.flush();
    }

    pub fn clear(&mut self) {
        execute!(self.stdout, terminal::Clear(ClearType::All)).expect("Error clearing.");
        self.screen = vec![BLANK; self.width as usize * self.height as usize];
        self.msg_shown = false;
    }

    pub fn flush(&mut self) {
        self.stdout.flush().expect("Error flushing.");
    }

    ///////////////////////////////////////////////////////////////////////////

    fn compose(&self, snap: &Snapshot) -> Vec<Glyph> {
        let mut frame = vec![BLANK; self.width as usize * self.height as usize];
        let row = self.width as usize;
        let idx = |cell: Cell| cell.1 as usize * row + cell.0 as usize;

        for x in 0..snap.width {
            let ch = if x == 0 || x == snap.width - 1 { BORDER_CORNER_CHAR } else { BORDER_H_CHAR };
            frame[idx((x, 0))] = (ch, PLAIN);
            frame[idx((x, snap.height - 1))] = (ch, PLAIN);
        }
        for y in 1..snap.height - 1 {
            frame[idx((0, y))] = (BORDER_V_CHAR, PLAIN);
            frame[idx((snap.width - 1, y))] = (BORDER_V_CHAR, PLAIN);
        }

        // Draw order is the on-screen precedence: portals cover meteors,
        // meteors cover food, food covers the snake.
        for (i, &cell) in snap.snake.iter().enumerate() {
            let ch = if i == 0 { head_char(snap.heading) } else { SNAKE_BODY_CHAR };
            frame[idx(cell)] = (ch, PLAIN);
        }

        if let Some(food) = snap.food {
            frame[idx(food)] = (FOOD_CHAR, PLAIN);
        }

        for &meteor in snap.meteors {
            frame[idx(meteor)] = (METEOR_CHAR, METEOR_COLOR);
        }

        if let Some((a, b)) = snap.portals {
            frame[idx(a)] = (PORTAL_CHAR, PORTAL_COLOR);
            frame[idx(b)] = (PORTAL_CHAR, PORTAL_COLOR);
        }

        let score_text = format!("Score: {}", snap.score);
        let start = (snap.width as usize).saturating_sub(score_text.len() + 2);
        for (i, ch) in score_text.chars().enumerate() {
            frame[start + i] = (ch, PLAIN);
        }

        frame
    }

    fn put_glyph(&mut self, pos: (TermInt, TermInt), glyph: Glyph) {
        queue!(
            self.stdout,
            cursor::MoveTo(pos.0, pos.1),
            style::SetForegroundColor(glyph.1),
            style::Print(glyph.0)
        )
        .unwrap();
        self.screen[self.width as usize * pos.1 as usize + pos.0 as usize] = glyph;
    }
}

fn head_char(heading: Direction) -> char {
    match heading {
        Direction::Up => '^',
        Direction::Down => 'v',
        Direction::Left => '<',
        Direction::Right => '>',
    }
}

use crate::{Cell, Coord};
use Direction::*;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn offset(&self) -> (Coord, Coord) {
        match self {
            Up => (0, -1),
            Down => (0, 1),
            Left => (-1, 0),
            Right => (1, 0),
        }
    }
}

/// The snake's body, stored head-first, plus its current heading.
pub struct Snake {
    body: Vec<Cell>,
    heading: Direction,
}

impl Snake {
    /// Creates a snake with its head at `head` and the rest of the body
    /// trailing away opposite to `heading`.
    pub fn new(head: Cell, length: usize, heading: Direction) -> Self {
        let (dx, dy) = heading.offset();
        let body = (0..length as Coord)
            .map(|i| (head.0 - dx * i, head.1 - dy * i))
            .collect();
        Snake { body, heading }
    }

    pub fn head(&self) -> Cell {
        self.body[0]
    }

    pub fn body(&self) -> &[Cell] {
        &self.body
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    /// Turns the snake. A request for the exact reverse of the current
    /// heading is ignored, so the snake can never fold back onto its own
    /// neck; every other change is accepted.
    pub fn set_heading(&mut self, new_heading: Direction) {
        match (new_heading, self.heading) {
            (Up, Down) | (Down, Up) | (Left, Right) | (Right, Left) => {}
            _ => self.heading = new_heading,
        };
    }

    /// The cell the head would occupy after one step in the current
    /// heading. Does not mutate anything.
    pub fn next_head(&self) -> Cell {
        let (x, y) = self.head();
        let (dx, dy) = self.heading.offset();
        (x + dx, y + dy)
    }

    /// One straight-line step: `next` becomes the head and the tail cell
    /// is dropped, keeping the length constant.
    pub fn advance(&mut self, next: Cell) {
        self.body.insert(0, next);
        self.body.pop();
    }

    /// Relocates the head to `dest` without traversing the cells in
    /// between. The tail is dropped exactly as in `advance`, so a
    /// teleport never changes the snake's length.
    pub fn teleport_to(&mut self, dest: Cell) {
        self.body.insert(0, dest);
        self.body.pop();
    }

    /// Duplicates the tail cell in place. The snake gets longer without
    /// moving; the duplicate unfolds on the next step.
    pub fn grow(&mut self) {
        let tail = *self.body.last().unwrap();
        self.body.push(tail);
    }

    /// True iff the head sits on or beyond any border cell.
    pub fn hits_border(&self, width: Coord, height: Coord) -> bool {
        let (x, y) = self.head();
        x <= 0 || y <= 0 || x >= width - 1 || y >= height - 1
    }

    /// True iff the head overlaps any non-head body cell.
    pub fn hits_self(&self) -> bool {
        self.body[1..].contains(&self.head())
    }

    pub fn is_at(&self, cell: Cell) -> bool {
        self.head() == cell
    }

    pub fn occupies(&self, cell: Cell) -> bool {
        self.body.contains(&cell)
    }

    /// Builds a snake from explicit cells, head first. Gameplay only ever
    /// constructs snakes through `new`; tests shape bodies directly.
    #[cfg(test)]
    pub fn from_cells(cells: &[Cell], heading: Direction) -> Self {
        Snake { body: cells.to_vec(), heading }
    }
}

use std::error::Error;
use std::fmt;
use std::time::{Duration, Instant};

use crate::Cell;
use crate::snake::Snake;

use rand::seq::SliceRandom;
use rand::Rng;

/// How long a portal pair stays on the board before it is replaced.
pub const PORTAL_LIFETIME: Duration = Duration::from_secs(30);

/// No interior cell satisfies the placement constraint; the board is
/// effectively full.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct NoFreeCell;

impl fmt::Display for NoFreeCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no free cell left on the board")
    }
}

impl Error for NoFreeCell {}

/// Picks a cell uniformly at random from the interior cells not rejected
/// by `blocked`. The eligible set is computed up front, so exhaustion is
/// reported instead of looping forever on a crowded board.
pub fn pick_free_cell<R, F>(rng: &mut R, interior: &[Cell], blocked: F) -> Result<Cell, NoFreeCell>
where
    R: Rng,
    F: Fn(Cell) -> bool,
{
    let eligible: Vec<Cell> = interior.iter().copied().filter(|&c| !blocked(c)).collect();
    eligible.choose(rng).copied().ok_or(NoFreeCell)
}

/// Places `count` meteors, each avoiding the snake and the meteors placed
/// before it. Meteors never move or regenerate once placed.
pub fn scatter_meteors<R: Rng>(
    rng: &mut R,
    interior: &[Cell],
    snake: &Snake,
    count: usize,
) -> Result<Vec<Cell>, NoFreeCell> {
    let mut meteors: Vec<Cell> = Vec::with_capacity(count);

    for _ in 0..count {
        let cell = pick_free_cell(rng, interior, |c| {
            snake.occupies(c) || meteors.contains(&c)
        })?;
        meteors.push(cell);
    }

    Ok(meteors)
}

/// A linked pair of portals. Both endpoints share one lifecycle: they
/// spawn together, a hit on either consumes both, and the pair is
/// replaced wholesale once its lifetime runs out.
pub struct PortalPair {
    ends: (Cell, Cell),
    active: bool,
    spawned_at: Instant,
}

impl PortalPair {
    /// Spawns a fresh active pair on two distinct free cells.
    pub fn spawn<R, F>(
        rng: &mut R,
        interior: &[Cell],
        blocked: F,
        now: Instant,
    ) -> Result<PortalPair, NoFreeCell>
    where
        R: Rng,
        F: Fn(Cell) -> bool,
    {
        let first = pick_free_cell(rng, interior, &blocked)?;
        let second = pick_free_cell(rng, interior, |c| c == first || blocked(c))?;

        Ok(PortalPair {
            ends: (first, second),
            active: true,
            spawned_at: now,
        })
    }

    /// Both endpoints, while the pair is active.
    pub fn endpoints(&self) -> Option<(Cell, Cell)> {
        if self.active {
            Some(self.ends)
        } else {
            None
        }
    }

    /// If `cell` is an endpoint of an active pair, returns the opposite
    /// endpoint the traveller comes out of.
    pub fn exit_for(&self, cell: Cell) -> Option<Cell> {
        if !self.active {
            return None;
        }

        if cell == self.ends.0 {
            Some(self.ends.1)
        } else if cell == self.ends.1 {
            Some(self.ends.0)
        } else {
            None
        }
    }

    /// Consumes the pair; both endpoints go dark at once.
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn expired(&self, now: Instant) -> bool {
        now.duration_since(self.spawned_at) >= PORTAL_LIFETIME
    }

    /// An active pair on two fixed cells, for tests that need to know
    /// exactly where the portals sit.
    #[cfg(test)]
    pub fn with_ends(a: Cell, b: Cell, now: Instant) -> Self {
        PortalPair { ends: (a, b), active: true, spawned_at: now }
    }
}

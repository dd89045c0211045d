use std::cmp::max;
use std::time::{Duration, Instant};

use crate::{Cell, Coord};
use crate::snake::{Direction, Snake};
use crate::spawn::{self, NoFreeCell, PortalPair};

use rand::rngs::ThreadRng;
use rand::Rng;

const INITIAL_SNAKE_LENGTH: usize = 3;
const METEOR_COUNT: usize = 5;

const INITIAL_TICK_INTERVAL: Duration = Duration::from_millis(150);
const MIN_TICK_INTERVAL: Duration = Duration::from_millis(50);
const SPEEDUP_FACTOR: f64 = 0.8;
const POINTS_PER_SPEEDUP: u64 = 5;

/// Why a round ended.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TerminationCause {
    BorderHit,
    SelfHit,
    MeteorHit,
    /// A respawn found no free interior cell. The player has effectively
    /// filled the board, so the application reports this one as a win.
    BoardFull,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TickOutcome {
    Running,
    Over(TerminationCause),
}

/// Semantic render state for one frame. The renderer turns this into
/// glyphs and colors; the simulation never emits presentation strings.
pub struct Snapshot<'a> {
    pub width: Coord,
    pub height: Coord,
    pub snake: &'a [Cell],
    pub heading: Direction,
    pub food: Option<Cell>,
    pub meteors: &'a [Cell],
    pub portals: Option<(Cell, Cell)>,
    pub score: u64,
}

/// The whole simulation: every entity, the score and the adaptive tick
/// interval. One call to `tick` advances the world by exactly one step;
/// nothing in here touches the terminal, so a round can run headless.
pub struct Game<R: Rng = ThreadRng> {
    width: Coord,
    height: Coord,
    interior: Vec<Cell>,
    rng: R,
    snake: Snake,
    food: Option<Cell>,
    meteors: Vec<Cell>,
    portals: PortalPair,
    score: u64,
    tick_interval: Duration,
}

impl Game<ThreadRng> {
    pub fn new(width: Coord, height: Coord, now: Instant) -> Result<Self, NoFreeCell> {
        Game::with_rng(width, height, rand::thread_rng(), now)
    }
}

impl<R: Rng> Game<R> {
    pub fn with_rng(width: Coord, height: Coord, mut rng: R, now: Instant) -> Result<Self, NoFreeCell> {
        let mut interior = vec![];
        for y in 1..height - 1 {
            for x in 1..width - 1 {
                interior.push((x, y));
            }
        }

        let snake = Snake::new((width / 2, height / 2), INITIAL_SNAKE_LENGTH, Direction::Right);
        let meteors = spawn::scatter_meteors(&mut rng, &interior, &snake, METEOR_COUNT)?;

        let portals = PortalPair::spawn(
            &mut rng,
            &interior,
            |c| snake.occupies(c) || meteors.contains(&c),
            now,
        )?;
        let food = spawn::pick_free_cell(&mut rng, &interior, |c| {
            snake.occupies(c) || meteors.contains(&c)
        })?;

        Ok(Game {
            width,
            height,
            interior,
            rng,
            snake,
            food: Some(food),
            meteors,
            portals,
            score: 0,
            tick_interval: INITIAL_TICK_INTERVAL,
        })
    }

    /// Advances the simulation by one step. `input` is the single heading
    /// change sampled for this tick, if any; `now` drives the portal
    /// refresh timer. The step order is fixed: heading, movement with
    /// portal interception, portal refresh, food, termination checks.
    pub fn tick(&mut self, input: Option<Direction>, now: Instant) -> TickOutcome {
        if let Some(dir) = input {
            self.snake.set_heading(dir);
        }

        // An active portal on the would-be next cell intercepts the move:
        // the head comes out of the opposite endpoint instead of stepping
        // forward, and the pair is spent.
        let next = self.snake.next_head();
        match self.portals.exit_for(next) {
            Some(exit) => {
                self.snake.teleport_to(exit);
                self.portals.deactivate();
            }
            None => self.snake.advance(next),
        }

        if self.portals.expired(now) {
            match self.respawn_portals(now) {
                Ok(portals) => self.portals = portals,
                Err(NoFreeCell) => return TickOutcome::Over(TerminationCause::BoardFull),
            }
        }

        if self.food.map_or(false, |food| self.snake.is_at(food)) {
            self.snake.grow();
            self.score += 1;

            if self.score % POINTS_PER_SPEEDUP == 0 {
                self.tick_interval =
                    max(self.tick_interval.mul_f64(SPEEDUP_FACTOR), MIN_TICK_INTERVAL);
            }

            let snake = &self.snake;
            let meteors = &self.meteors;
            match spawn::pick_free_cell(&mut self.rng, &self.interior, |c| {
                snake.occupies(c) || meteors.contains(&c)
            }) {
                Ok(cell) => self.food = Some(cell),
                Err(NoFreeCell) => {
                    self.food = None;
                    return TickOutcome::Over(TerminationCause::BoardFull);
                }
            }
        }

        // Checked in priority order; the first hit wins the blame.
        if self.snake.hits_border(self.width, self.height) {
            TickOutcome::Over(TerminationCause::BorderHit)
        } else if self.snake.hits_self() {
            TickOutcome::Over(TerminationCause::SelfHit)
        } else if self.meteors.contains(&self.snake.head()) {
            TickOutcome::Over(TerminationCause::MeteorHit)
        } else {
            TickOutcome::Running
        }
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            width: self.width,
            height: self.height,
            snake: self.snake.body(),
            heading: self.snake.heading(),
            food: self.food,
            meteors: &self.meteors,
            portals: self.portals.endpoints(),
            score: self.score,
        }
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    fn respawn_portals(&mut self, now: Instant) -> Result<PortalPair, NoFreeCell> {
        let snake = &self.snake;
        let meteors = &self.meteors;
        PortalPair::spawn(
            &mut self.rng,
            &self.interior,
            |c| snake.occupies(c) || meteors.contains(&c),
            now,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawn::PORTAL_LIFETIME;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const WIDTH: Coord = 30;
    const HEIGHT: Coord = 20;

    fn game(seed: u64, now: Instant) -> Game<StdRng> {
        Game::with_rng(WIDTH, HEIGHT, StdRng::seed_from_u64(seed), now).unwrap()
    }

    /// Strips the randomly placed hazards so a scenario controls exactly
    /// what the snake can run into.
    fn clear_hazards(game: &mut Game<StdRng>) {
        game.meteors.clear();
        game.portals.deactivate();
        game.food = None;
    }

    fn occupied_by_snake_or_meteors(game: &Game<StdRng>, cell: Cell) -> bool {
        game.snake.occupies(cell) || game.meteors.contains(&cell)
    }

    #[test]
    fn fresh_games_respect_placement_constraints() {
        let now = Instant::now();

        for seed in 0..25 {
            let game = game(seed, now);

            assert_eq!(game.meteors.len(), METEOR_COUNT);
            for &m in &game.meteors {
                assert!(game.interior.contains(&m));
                assert!(!game.snake.occupies(m));
            }

            let food = game.food.unwrap();
            assert!(game.interior.contains(&food));
            assert!(!occupied_by_snake_or_meteors(&game, food));

            let (a, b) = game.portals.endpoints().unwrap();
            assert_ne!(a, b);
            for &p in &[a, b] {
                assert!(game.interior.contains(&p));
                assert!(!occupied_by_snake_or_meteors(&game, p));
            }
        }
    }

    #[test]
    fn eating_grows_scores_and_respawns_food() {
        let now = Instant::now();
        let mut game = game(1, now);
        let before_len = game.snake.body().len();

        // Keep the meteors so the respawn constraint is exercised for
        // real; just make sure nothing sits on the cell being eaten.
        let target = game.snake.next_head();
        game.meteors.retain(|&m| m != target);
        game.portals.deactivate();

        game.food = Some(target);
        let outcome = game.tick(None, now);

        assert_eq!(outcome, TickOutcome::Running);
        assert_eq!(game.score, 1);
        assert_eq!(game.snake.body().len(), before_len + 1);

        let fresh = game.food.expect("food must respawn after being eaten");
        assert!(!occupied_by_snake_or_meteors(&game, fresh));
    }

    #[test]
    fn every_fifth_point_speeds_the_game_up() {
        let now = Instant::now();
        let mut game = game(2, now);
        clear_hazards(&mut game);
        game.score = 4;
        let before = game.tick_interval;

        game.food = Some(game.snake.next_head());
        game.tick(None, now);

        assert_eq!(game.score, 5);
        let expected = before.as_secs_f64() * SPEEDUP_FACTOR;
        assert!((game.tick_interval.as_secs_f64() - expected).abs() < 1e-9);
    }

    #[test]
    fn tick_interval_never_drops_below_the_floor() {
        let now = Instant::now();
        let mut game = game(3, now);
        clear_hazards(&mut game);
        game.score = 4;
        game.tick_interval = MIN_TICK_INTERVAL;

        game.food = Some(game.snake.next_head());
        game.tick(None, now);

        assert_eq!(game.tick_interval, MIN_TICK_INTERVAL);
    }

    #[test]
    fn portal_hit_relocates_head_and_spends_the_pair() {
        let now = Instant::now();
        let mut game = game(4, now);
        clear_hazards(&mut game);
        let before_len = game.snake.body().len();

        let entry = game.snake.next_head();
        let exit = (2, 2);
        game.portals = PortalPair::with_ends(entry, exit, now);

        let outcome = game.tick(None, now);

        assert_eq!(outcome, TickOutcome::Running);
        assert_eq!(game.snake.head(), exit);
        assert_eq!(game.snake.body().len(), before_len);
        assert_eq!(game.portals.endpoints(), None);
    }

    #[test]
    fn expired_portals_are_replaced_with_a_fresh_pair() {
        let now = Instant::now();
        let mut game = game(5, now);
        clear_hazards(&mut game);
        // A still-active pair, parked away from the snake's path.
        game.portals = PortalPair::with_ends((2, 2), (3, 3), now);
        let later = now + PORTAL_LIFETIME + Duration::from_secs(1);

        let outcome = game.tick(None, later);

        assert_eq!(outcome, TickOutcome::Running);
        let (a, b) = game.portals.endpoints().expect("a fresh pair must be active");
        assert_ne!(a, b);
        assert!(!game.portals.expired(later));
    }

    #[test]
    fn used_portals_come_back_after_the_refresh_interval() {
        let now = Instant::now();
        let mut game = game(6, now);
        clear_hazards(&mut game);

        let later = now + PORTAL_LIFETIME;
        game.tick(None, later);

        assert!(game.portals.endpoints().is_some());
    }

    #[test]
    fn reverse_input_is_ignored_by_the_tick() {
        let now = Instant::now();
        let mut game = game(7, now);
        clear_hazards(&mut game);
        assert_eq!(game.snake.heading(), Direction::Right);

        game.tick(Some(Direction::Left), now);

        assert_eq!(game.snake.heading(), Direction::Right);
    }

    #[test]
    fn walking_into_the_border_ends_the_round() {
        let now = Instant::now();
        let mut game = game(8, now);
        clear_hazards(&mut game);
        game.snake = Snake::from_cells(&[(2, 5), (3, 5), (4, 5)], Direction::Left);

        // (2,5) -> (1,5) is still interior, one more step hits the wall.
        assert_eq!(game.tick(None, now), TickOutcome::Running);
        assert_eq!(game.tick(None, now), TickOutcome::Over(TerminationCause::BorderHit));
    }

    #[test]
    fn stepping_on_a_meteor_ends_the_round() {
        let now = Instant::now();
        let mut game = game(9, now);
        clear_hazards(&mut game);
        game.snake = Snake::from_cells(&[(10, 10), (9, 10), (8, 10)], Direction::Right);
        game.meteors = vec![(11, 10)];

        assert_eq!(game.tick(None, now), TickOutcome::Over(TerminationCause::MeteorHit));
    }

    #[test]
    fn self_collision_outranks_a_meteor_on_the_same_cell() {
        let now = Instant::now();
        let mut game = game(10, now);
        clear_hazards(&mut game);
        // Heading Up from (10,10) runs into the snake's own loop at
        // (10,9), which also hosts a meteor; the self collision takes the
        // blame.
        game.snake = Snake::from_cells(
            &[(10, 10), (11, 10), (11, 9), (10, 9), (9, 9), (9, 10)],
            Direction::Up,
        );
        game.meteors = vec![(10, 9)];

        assert_eq!(game.tick(None, now), TickOutcome::Over(TerminationCause::SelfHit));
    }

    #[test]
    fn teleporting_onto_food_still_counts_as_eating() {
        let now = Instant::now();
        let mut game = game(11, now);
        clear_hazards(&mut game);
        let before_len = game.snake.body().len();

        let entry = game.snake.next_head();
        let exit = (2, 2);
        game.portals = PortalPair::with_ends(entry, exit, now);
        game.food = Some(exit);

        let outcome = game.tick(None, now);

        assert_eq!(outcome, TickOutcome::Running);
        assert_eq!(game.score, 1);
        assert_eq!(game.snake.head(), exit);
        assert_eq!(game.snake.body().len(), before_len + 1);
    }
}

// Authoritative two-player snake simulation. One instance per game, advanced one tick at a time.

use super::board::{Board, Cell, Coordinate};
use super::player::{Color, Direction, PlayerState};
use super::tuning::{FOOD_LENGTH, HEIGHT, NUM_FOOD, SPAWN_OFFSET_RATIO, STARTING_LENGTH, WIDTH};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Result of advancing a game by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continuing,
    Won(Color),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Won(Color),
}

/// Owned copy of everything a client needs to render one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSnapshot {
    pub board: Board,
    pub red: PlayerState,
    pub blue: PlayerState,
    pub status: GameStatus,
}

#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    red: PlayerState,
    blue: PlayerState,
    status: GameStatus,
    rng: ChaCha8Rng,
}

impl Game {
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Same seed and same inputs replay to the same states.
    pub fn with_seed(seed: u64) -> Self {
        let x_offset = (f64::from(WIDTH) * SPAWN_OFFSET_RATIO).floor() as i32;
        let start_y = HEIGHT / 2;

        let mut game = Self {
            board: Board::new(),
            red: PlayerState::spawn(
                Coordinate::new(x_offset, start_y),
                Direction::Right,
                STARTING_LENGTH - 1,
            ),
            blue: PlayerState::spawn(
                Coordinate::new(WIDTH - x_offset, start_y),
                Direction::Left,
                STARTING_LENGTH - 1,
            ),
            status: GameStatus::InProgress,
            rng: ChaCha8Rng::seed_from_u64(seed),
        };

        for color in [Color::Red, Color::Blue] {
            let body: Vec<Coordinate> = game.player(color).body.iter().copied().collect();
            for at in body {
                game.mark(at, Cell::Snake(color));
            }
        }
        for _ in 0..NUM_FOOD {
            game.spawn_food();
        }

        game
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn player(&self, color: Color) -> &PlayerState {
        match color {
            Color::Red => &self.red,
            Color::Blue => &self.blue,
        }
    }

    fn player_mut(&mut self, color: Color) -> &mut PlayerState {
        match color {
            Color::Red => &mut self.red,
            Color::Blue => &mut self.blue,
        }
    }

    /// Turns the snake unless that would reverse it into its own neck.
    pub fn set_direction(&mut self, color: Color, direction: Direction) {
        let player = self.player_mut(color);
        if direction != player.heading.reverse() {
            player.heading = direction;
        }
    }

    /// Advances exactly one tick. Red is resolved completely before blue.
    pub fn step(&mut self) -> Outcome {
        if let GameStatus::Won(winner) = self.status {
            return Outcome::Won(winner);
        }

        for color in [Color::Red, Color::Blue] {
            if let Some(winner) = self.step_player(color) {
                self.status = GameStatus::Won(winner);
                return Outcome::Won(winner);
            }
        }

        Outcome::Continuing
    }

    /// Moves one snake. Returns the winner if this move loses the game.
    fn step_player(&mut self, color: Color) -> Option<Color> {
        let player = self.player(color);
        let Some(head) = player.head() else {
            return Some(color.opposite());
        };
        let new_head = head.step(player.heading);

        let vacated = {
            let player = self.player_mut(color);
            if player.growth_remaining > 0 {
                player.growth_remaining -= 1;
                None
            } else {
                player.body.pop_back()
            }
        };
        if let Some(tail) = vacated {
            self.mark(tail, Cell::Empty);
        }

        let eats = match self.board.get(new_head) {
            Ok(Cell::Empty) => false,
            Ok(Cell::Food) => true,
            // Wall or any snake body, including our own.
            Ok(Cell::Snake(_)) | Err(_) => return Some(color.opposite()),
        };

        if eats {
            self.player_mut(color).growth_remaining += FOOD_LENGTH - 1;
            self.spawn_food();
        }

        self.player_mut(color).body.push_front(new_head);
        self.mark(new_head, Cell::Snake(color));
        None
    }

    /// Drops one food on a uniformly random empty cell. Returns `None` on a full board.
    fn spawn_food(&mut self) -> Option<Coordinate> {
        if self.board.count(Cell::Empty) == 0 {
            return None;
        }

        loop {
            let at = Coordinate::new(self.rng.gen_range(0..WIDTH), self.rng.gen_range(0..HEIGHT));
            if self.board.get(at) == Ok(Cell::Empty) {
                self.mark(at, Cell::Food);
                return Some(at);
            }
        }
    }

    fn mark(&mut self, at: Coordinate, cell: Cell) {
        // Engine writes only come from snake bodies and bounds-checked heads.
        let written = self.board.set(at, cell);
        debug_assert!(written.is_ok(), "engine wrote outside the board at {at:?}");
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot::from(self)
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&Game> for GameSnapshot {
    fn from(game: &Game) -> Self {
        Self {
            board: game.board.clone(),
            red: game.red.clone(),
            blue: game.blue.clone(),
            status: game.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashSet, VecDeque};

    fn clear_food(game: &mut Game) {
        let food: Vec<Coordinate> = game.board.coordinates_of(Cell::Food).collect();
        for at in food {
            game.mark(at, Cell::Empty);
        }
    }

    // Replaces a snake wholesale, keeping the board consistent with its body.
    fn place_player(
        game: &mut Game,
        color: Color,
        body: &[(i32, i32)],
        heading: Direction,
        growth_remaining: u32,
    ) {
        let old: Vec<Coordinate> = game.player(color).body.iter().copied().collect();
        for at in old {
            game.mark(at, Cell::Empty);
        }

        let body: VecDeque<Coordinate> = body.iter().map(|&(x, y)| Coordinate::new(x, y)).collect();
        for at in &body {
            game.mark(*at, Cell::Snake(color));
        }
        *game.player_mut(color) = PlayerState {
            body,
            heading,
            growth_remaining,
        };
    }

    fn assert_consistent(game: &Game) {
        let mut seen = HashSet::new();
        for color in [Color::Red, Color::Blue] {
            let player = game.player(color);
            assert!(!player.is_empty());
            for at in &player.body {
                assert!(seen.insert(*at), "two occupants share {at:?}");
                assert_eq!(game.board.get(*at), Ok(Cell::Snake(color)));
            }
            for pair in player.body.iter().collect::<Vec<_>>().windows(2) {
                let (a, b) = (pair[0], pair[1]);
                assert_eq!((a.x - b.x).abs() + (a.y - b.y).abs(), 1, "body not contiguous");
            }
        }
        let snake_cells =
            game.board.count(Cell::Snake(Color::Red)) + game.board.count(Cell::Snake(Color::Blue));
        assert_eq!(snake_cells, seen.len());
    }

    #[test]
    fn when_game_starts_then_snakes_face_each_other_with_food_seeded() {
        let game = Game::with_seed(1);

        let red = game.player(Color::Red);
        assert_eq!(red.head(), Some(Coordinate::new(7, 15)));
        assert_eq!(red.heading, Direction::Right);
        assert_eq!(red.growth_remaining, STARTING_LENGTH - 1);

        let blue = game.player(Color::Blue);
        assert_eq!(blue.head(), Some(Coordinate::new(63, 15)));
        assert_eq!(blue.heading, Direction::Left);
        assert_eq!(blue.growth_remaining, STARTING_LENGTH - 1);

        assert_eq!(game.board().count(Cell::Food), NUM_FOOD);
        assert_eq!(game.status(), GameStatus::InProgress);
        assert_consistent(&game);
    }

    #[test]
    fn when_no_move_is_queued_then_red_advances_along_its_heading() {
        let mut game = Game::with_seed(7);
        clear_food(&mut game);

        assert_eq!(game.step(), Outcome::Continuing);

        let red = game.player(Color::Red);
        assert_eq!(red.head(), Some(Coordinate::new(8, 15)));
        // Still growing: the tail stayed put.
        assert_eq!(red.len(), 2);
        assert_eq!(red.growth_remaining, STARTING_LENGTH - 2);
        assert_eq!(game.player(Color::Blue).head(), Some(Coordinate::new(62, 15)));
        assert_consistent(&game);
    }

    #[test]
    fn when_red_runs_into_the_right_wall_then_blue_wins_before_blue_moves() {
        let mut game = Game::with_seed(3);
        clear_food(&mut game);
        place_player(&mut game, Color::Red, &[(WIDTH - 1, 15)], Direction::Right, 0);
        let blue_before = game.player(Color::Blue).clone();

        assert_eq!(game.step(), Outcome::Won(Color::Blue));
        assert_eq!(game.status(), GameStatus::Won(Color::Blue));
        assert_eq!(game.player(Color::Blue), &blue_before);
    }

    #[test]
    fn when_blue_eats_food_then_it_grows_and_food_respawns_elsewhere() {
        let mut game = Game::with_seed(11);
        clear_food(&mut game);
        place_player(&mut game, Color::Blue, &[(40, 5), (41, 5), (42, 5)], Direction::Left, 0);
        let food_at = Coordinate::new(39, 5);
        game.mark(food_at, Cell::Food);

        assert_eq!(game.step(), Outcome::Continuing);

        let blue = game.player(Color::Blue);
        assert_eq!(game.board().get(food_at), Ok(Cell::Snake(Color::Blue)));
        assert_eq!(blue.head(), Some(food_at));
        assert_eq!(blue.growth_remaining, FOOD_LENGTH - 1);
        assert_eq!(game.board().count(Cell::Food), 1);
        assert_ne!(game.board().coordinates_of(Cell::Food).next(), Some(food_at));
        assert_consistent(&game);
    }

    #[test]
    fn when_direction_reverses_heading_then_it_is_ignored() {
        let mut game = Game::with_seed(5);

        game.set_direction(Color::Red, Direction::Left);
        game.set_direction(Color::Blue, Direction::Right);
        assert_eq!(game.player(Color::Red).heading, Direction::Right);
        assert_eq!(game.player(Color::Blue).heading, Direction::Left);

        game.set_direction(Color::Red, Direction::Up);
        assert_eq!(game.player(Color::Red).heading, Direction::Up);
        game.set_direction(Color::Red, Direction::Down);
        assert_eq!(game.player(Color::Red).heading, Direction::Up);
    }

    #[test]
    fn when_snake_turns_into_its_own_body_then_it_loses() {
        let mut game = Game::with_seed(9);
        clear_food(&mut game);
        place_player(
            &mut game,
            Color::Red,
            &[(10, 10), (11, 10), (11, 11), (10, 11), (9, 11)],
            Direction::Down,
            0,
        );

        assert_eq!(game.step(), Outcome::Won(Color::Blue));
    }

    #[test]
    fn when_snake_moves_into_its_own_vacating_tail_then_it_survives() {
        let mut game = Game::with_seed(9);
        clear_food(&mut game);
        place_player(
            &mut game,
            Color::Red,
            &[(10, 10), (11, 10), (11, 11), (10, 11)],
            Direction::Down,
            0,
        );

        assert_eq!(game.step(), Outcome::Continuing);
        assert_eq!(game.player(Color::Red).head(), Some(Coordinate::new(10, 11)));
        assert_consistent(&game);
    }

    #[test]
    fn when_blue_enters_the_cell_red_just_vacated_then_both_survive() {
        let mut game = Game::with_seed(13);
        clear_food(&mut game);
        place_player(&mut game, Color::Red, &[(20, 10), (21, 10)], Direction::Up, 0);
        place_player(&mut game, Color::Blue, &[(22, 10), (23, 10)], Direction::Left, 0);

        assert_eq!(game.step(), Outcome::Continuing);
        assert_eq!(game.board().get(Coordinate::new(21, 10)), Ok(Cell::Snake(Color::Blue)));
        assert_consistent(&game);
    }

    #[test]
    fn when_red_enters_the_cell_blue_would_vacate_then_red_loses() {
        let mut game = Game::with_seed(13);
        clear_food(&mut game);
        place_player(&mut game, Color::Blue, &[(20, 10), (21, 10)], Direction::Up, 0);
        place_player(&mut game, Color::Red, &[(22, 10), (23, 10)], Direction::Left, 0);

        // Red resolves first, so blue's tail is still there.
        assert_eq!(game.step(), Outcome::Won(Color::Blue));
    }

    #[test]
    fn when_both_heads_target_the_same_cell_then_red_gets_it() {
        let mut game = Game::with_seed(17);
        clear_food(&mut game);
        place_player(&mut game, Color::Red, &[(30, 10)], Direction::Right, 0);
        place_player(&mut game, Color::Blue, &[(32, 10)], Direction::Left, 0);

        assert_eq!(game.step(), Outcome::Won(Color::Red));
        assert_eq!(game.board().get(Coordinate::new(31, 10)), Ok(Cell::Snake(Color::Red)));
    }

    #[test]
    fn when_snake_has_eaten_then_it_is_longer_for_the_next_ticks() {
        let mut fed = Game::with_seed(21);
        clear_food(&mut fed);
        place_player(&mut fed, Color::Red, &[(10, 3), (9, 3)], Direction::Right, 0);
        let mut hungry = fed.clone();
        fed.mark(Coordinate::new(11, 3), Cell::Food);
        fed.step();
        hungry.step();
        clear_food(&mut fed);

        for _ in 0..(FOOD_LENGTH - 1) {
            fed.step();
            hungry.step();
            assert!(fed.player(Color::Red).len() > hungry.player(Color::Red).len());
        }
    }

    #[test]
    fn when_same_seed_and_inputs_are_replayed_then_states_match() {
        let inputs = [
            (Color::Red, Direction::Up),
            (Color::Blue, Direction::Down),
            (Color::Red, Direction::Right),
            (Color::Blue, Direction::Left),
        ];
        let mut a = Game::with_seed(99);
        let mut b = Game::with_seed(99);

        for tick in 0..40 {
            let (color, dir) = inputs[tick % inputs.len()];
            if tick % 3 == 0 {
                a.set_direction(color, dir);
                b.set_direction(color, dir);
            }
            let (oa, ob) = (a.step(), b.step());
            assert_eq!(oa, ob);
            assert_eq!(a.snapshot(), b.snapshot());
            if oa != Outcome::Continuing {
                break;
            }
        }
    }

    #[test]
    fn when_games_run_to_the_end_then_board_stays_consistent() {
        let turns = [Direction::Up, Direction::Left, Direction::Down, Direction::Right];
        for seed in 0..8u64 {
            let mut game = Game::with_seed(seed);
            for tick in 0..500usize {
                if tick % 4 == 0 {
                    game.set_direction(Color::Red, turns[(tick / 4 + seed as usize) % 4]);
                }
                if tick % 6 == 0 {
                    game.set_direction(Color::Blue, turns[(tick / 6) % 4]);
                }
                let outcome = game.step();
                if outcome != Outcome::Continuing {
                    break;
                }
                assert_consistent(&game);
                assert_eq!(game.board().count(Cell::Food), NUM_FOOD);
            }
        }
    }

    #[test]
    fn when_game_is_over_then_step_repeats_the_result_without_moving() {
        let mut game = Game::with_seed(3);
        place_player(&mut game, Color::Red, &[(0, 0)], Direction::Up, 0);

        assert_eq!(game.step(), Outcome::Won(Color::Blue));
        let frozen = game.snapshot();
        assert_eq!(game.step(), Outcome::Won(Color::Blue));
        assert_eq!(game.snapshot(), frozen);
    }

    #[test]
    fn when_no_cell_is_empty_then_no_food_spawns() {
        let mut game = Game::with_seed(23);
        let empty: Vec<Coordinate> = game.board.coordinates_of(Cell::Empty).collect();
        for at in empty {
            game.mark(at, Cell::Food);
        }
        let before = game.board.clone();

        assert_eq!(game.spawn_food(), None);
        assert_eq!(game.board, before);
        assert_eq!(game.board.count(Cell::Empty), 0);
    }
}

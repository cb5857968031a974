//! The turn cycle and the Playing/GameOver state machine.
//!
//! A [`GameSession`] owns every piece of game state. Input reaches it only
//! through [`GameSession::handle`], one event at a time, and it reports
//! changes to registered listeners.

use crate::availability::{is_game_over, legal_directions};
use crate::config::SessionConfig;
use crate::direction::Direction;
use crate::error::SessionError;
use crate::grid::{GridModel, TileId};
use crate::resolver::{resolve, MoveOutcome};
use crate::score::ScoreAccumulator;
use crate::snapshot::Snapshot;
use crate::spawn::SpawnGenerator;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Playing,
    GameOver,
}

/// Input delivered by an external collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Move(Direction),
    /// Restart pulse. `false` is ignored.
    Restart(bool),
    /// A browser-style key name; anything but the four arrow keys is ignored.
    Key(String),
}

/// Change reported to listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// New running total, including the reset to zero on restart.
    ScoreChanged(u64),
    /// A move changed the board and a tile was spawned.
    BoardChanged,
    GameOver { score: u64 },
    Restarted,
}

/// What a single [`GameSession::handle`] call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    /// The event was not applicable (game over, unknown key, `Restart(false)`).
    Ignored,
    /// The direction had no legal move; nothing changed.
    Blocked(Direction),
    Moved {
        direction: Direction,
        outcome: MoveOutcome,
        spawned: TileId,
    },
    Restarted,
}

type Listener = Box<dyn FnMut(&Notification)>;

/// One game: grid, spawner, score and state.
pub struct GameSession {
    config: SessionConfig,
    grid: GridModel,
    spawner: SpawnGenerator,
    score: ScoreAccumulator,
    state: SessionState,
    restarts: u64,
    listeners: Vec<Listener>,
}

impl GameSession {
    /// Create a session and place its starting tiles.
    ///
    /// Starts in [`SessionState::GameOver`] if the starting tiles already
    /// leave no legal move (only possible on tiny grids).
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let mut session = GameSession {
            grid: GridModel::new(config.grid_size)?,
            spawner: SpawnGenerator::new(config.seed, config.four_probability),
            score: ScoreAccumulator::new(),
            state: SessionState::Playing,
            restarts: 0,
            listeners: Vec::new(),
            config,
        };
        session.start()?;
        info!(
            size = session.config.grid_size,
            seed = session.config.seed,
            state = ?session.state,
            "session started"
        );
        Ok(session)
    }

    /// Fresh grid, zero score, starting tiles.
    fn start(&mut self) -> Result<(), SessionError> {
        self.grid = GridModel::new(self.config.grid_size)?;
        self.score.reset();
        let count = self.config.start_tiles.min(self.grid.cell_count());
        for _ in 0..count {
            self.spawner.spawn(&mut self.grid)?;
        }
        self.state = if is_game_over(&self.grid) {
            SessionState::GameOver
        } else {
            SessionState::Playing
        };
        Ok(())
    }

    /// Register a listener. It immediately receives the current score.
    pub fn subscribe(&mut self, mut listener: impl FnMut(&Notification) + 'static) {
        listener(&Notification::ScoreChanged(self.score.total()));
        self.listeners.push(Box::new(listener));
    }

    fn notify(&mut self, notification: Notification) {
        for listener in &mut self.listeners {
            listener(&notification);
        }
    }

    /// Apply one input event.
    ///
    /// The only error is a spawn on a full board, which a correct move
    /// sequence never produces.
    pub fn handle(&mut self, event: Event) -> Result<Turn, SessionError> {
        match event {
            Event::Move(direction) => self.play(direction),
            Event::Key(key) => match Direction::from_key(&key) {
                Some(direction) => self.play(direction),
                None => {
                    debug!(key = %key, "ignoring unmapped key");
                    Ok(Turn::Ignored)
                }
            },
            Event::Restart(true) => self.restart(),
            Event::Restart(false) => Ok(Turn::Ignored),
        }
    }

    fn play(&mut self, direction: Direction) -> Result<Turn, SessionError> {
        if self.state == SessionState::GameOver {
            warn!(?direction, "ignoring move: game is over");
            return Ok(Turn::Ignored);
        }

        let outcome = resolve(&mut self.grid, direction);
        if !outcome.moved {
            return Ok(Turn::Blocked(direction));
        }

        let spawned = self.spawner.spawn(&mut self.grid)?;
        if outcome.score_delta > 0 {
            self.score.add(outcome.score_delta);
            self.notify(Notification::ScoreChanged(self.score.total()));
        }
        self.notify(Notification::BoardChanged);

        if is_game_over(&self.grid) {
            self.enter_game_over();
        }

        Ok(Turn::Moved {
            direction,
            outcome,
            spawned,
        })
    }

    fn enter_game_over(&mut self) {
        self.state = SessionState::GameOver;
        let score = self.score.total();
        info!(score, max_tile = self.grid.max_value(), "game over");
        self.notify(Notification::GameOver { score });
    }

    /// Restart `n` reseeds the spawner with `seed + n`, so restarts are
    /// reproducible but do not replay the opening.
    fn restart(&mut self) -> Result<Turn, SessionError> {
        self.restarts += 1;
        self.spawner
            .reseed(self.config.seed.wrapping_add(self.restarts));
        self.start()?;
        info!(restarts = self.restarts, "session restarted");

        self.notify(Notification::Restarted);
        self.notify(Notification::ScoreChanged(0));
        if self.state == SessionState::GameOver {
            self.enter_game_over();
        }
        Ok(Turn::Restarted)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_game_over(&self) -> bool {
        self.state == SessionState::GameOver
    }

    pub fn score(&self) -> u64 {
        self.score.total()
    }

    pub fn grid(&self) -> &GridModel {
        &self.grid
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Number of restarts since the session was created.
    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    /// Legal directions as a boolean array [Up, Down, Left, Right].
    pub fn legal_directions(&self) -> [bool; 4] {
        legal_directions(&self.grid)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.grid, self.score.total(), self.state)
    }

    #[cfg(test)]
    fn with_grid(config: SessionConfig, grid: GridModel) -> Self {
        let state = if is_game_over(&grid) {
            SessionState::GameOver
        } else {
            SessionState::Playing
        };
        GameSession {
            spawner: SpawnGenerator::new(config.seed, config.four_probability),
            grid,
            score: ScoreAccumulator::new(),
            state,
            restarts: 0,
            listeners: Vec::new(),
            config,
        }
    }
}

impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("state", &self.state)
            .field("score", &self.score.total())
            .field("restarts", &self.restarts)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Score: {}", self.score.total())?;
        write!(f, "{}", self.grid)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn session_with(rows: &[Vec<u32>]) -> GameSession {
        let grid = GridModel::from_rows(rows).unwrap();
        let config = SessionConfig {
            grid_size: grid.width(),
            ..SessionConfig::default()
        };
        GameSession::with_grid(config, grid)
    }

    fn record(session: &mut GameSession) -> Rc<RefCell<Vec<Notification>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        session.subscribe(move |n| sink.borrow_mut().push(n.clone()));
        log.borrow_mut().clear();
        log
    }

    // -------------------------------------------------------------------------
    // Startup
    // -------------------------------------------------------------------------

    #[test]
    fn test_new_session_has_two_tiles() {
        let session = GameSession::new(SessionConfig::default()).unwrap();
        assert_eq!(session.grid().tile_count(), 2);
        assert_eq!(session.config().start_tiles, 2);
        assert_eq!(session.score(), 0);
        assert_eq!(session.state(), SessionState::Playing);
    }

    #[test]
    fn test_tiny_grid_starts_game_over() {
        let config = SessionConfig {
            grid_size: 1,
            ..SessionConfig::default()
        };
        let session = GameSession::new(config).unwrap();
        assert_eq!(session.grid().tile_count(), 1);
        assert!(session.is_game_over());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SessionConfig {
            four_probability: -0.1,
            ..SessionConfig::default()
        };
        assert!(matches!(
            GameSession::new(config),
            Err(SessionError::Config(_))
        ));

        let config = SessionConfig {
            start_tiles: 0,
            ..SessionConfig::default()
        };
        assert!(matches!(
            GameSession::new(config),
            Err(SessionError::Config(ConfigError::NoStartTiles))
        ));
    }

    // -------------------------------------------------------------------------
    // Turn cycle
    // -------------------------------------------------------------------------

    #[test]
    fn test_move_spawns_and_scores() {
        let mut session = session_with(&[
            vec![2, 2, 0, 0],
            vec![0, 0, 0, 0],
            vec![0, 0, 0, 0],
            vec![0, 0, 0, 0],
        ]);
        let log = record(&mut session);

        let turn = session.handle(Event::Move(Direction::Left)).unwrap();
        let Turn::Moved { outcome, spawned, .. } = turn else {
            panic!("expected a move");
        };
        assert_eq!(outcome.score_delta, 4);
        assert_eq!(session.score(), 4);
        assert_eq!(session.grid().tile_count(), 2);
        assert!(session.grid().tile(spawned).is_some());
        assert_eq!(
            *log.borrow(),
            vec![Notification::ScoreChanged(4), Notification::BoardChanged]
        );
    }

    #[test]
    fn test_blocked_move_is_noop() {
        let mut session = session_with(&[vec![2, 0], vec![4, 0]]);
        let log = record(&mut session);
        let before = session.grid().clone();

        let turn = session.handle(Event::Move(Direction::Left)).unwrap();
        assert_eq!(turn, Turn::Blocked(Direction::Left));
        assert_eq!(session.grid(), &before);
        assert_eq!(session.score(), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_move_into_game_over() {
        // After sliding left, the spawn fills the last gap.
        let mut session = session_with(&[vec![0, 2], vec![4, 8]]);
        let log = record(&mut session);

        session.handle(Event::Move(Direction::Left)).unwrap();
        // The default seed spawns a 4, leaving no equal neighbours.
        assert_eq!(session.grid().values(), vec![vec![2, 4], vec![4, 8]]);
        assert!(session.is_game_over());
        assert_eq!(session.state(), SessionState::GameOver);
        assert_eq!(
            log.borrow().last(),
            Some(&Notification::GameOver { score: 0 })
        );
    }

    #[test]
    fn test_moves_ignored_after_game_over() {
        let mut session = session_with(&[vec![2, 4], vec![4, 2]]);
        assert!(session.is_game_over());
        let before = session.grid().clone();
        for direction in Direction::all() {
            assert_eq!(session.handle(Event::Move(direction)).unwrap(), Turn::Ignored);
        }
        assert_eq!(session.grid(), &before);
    }

    #[test]
    fn test_key_events() {
        let mut session = session_with(&[vec![0, 2], vec![0, 0]]);
        assert_eq!(session.handle(Event::Key("Enter".into())).unwrap(), Turn::Ignored);
        assert!(matches!(
            session.handle(Event::Key("ArrowLeft".into())).unwrap(),
            Turn::Moved {
                direction: Direction::Left,
                ..
            }
        ));
    }

    // -------------------------------------------------------------------------
    // Restart
    // -------------------------------------------------------------------------

    #[test]
    fn test_restart_from_game_over() {
        let mut session = session_with(&[vec![2, 4], vec![4, 2]]);
        session.score.add(128);
        let log = record(&mut session);

        assert_eq!(session.handle(Event::Restart(true)).unwrap(), Turn::Restarted);
        assert_eq!(session.score(), 0);
        assert_eq!(session.grid().tile_count(), 2);
        assert_eq!(session.state(), SessionState::Playing);
        assert_eq!(session.restarts(), 1);
        assert_eq!(
            *log.borrow(),
            vec![Notification::Restarted, Notification::ScoreChanged(0)]
        );
    }

    #[test]
    fn test_restart_false_ignored() {
        let mut session = session_with(&[vec![2, 4], vec![4, 2]]);
        assert_eq!(session.handle(Event::Restart(false)).unwrap(), Turn::Ignored);
        assert!(session.is_game_over());
        assert_eq!(session.restarts(), 0);
    }

    #[test]
    fn test_subscribe_receives_current_score() {
        let mut session = session_with(&[vec![2, 0], vec![0, 0]]);
        session.score.add(12);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        session.subscribe(move |n| sink.borrow_mut().push(n.clone()));
        assert_eq!(*seen.borrow(), vec![Notification::ScoreChanged(12)]);
    }

    // -------------------------------------------------------------------------
    // Display
    // -------------------------------------------------------------------------

    #[test]
    fn test_display_format() {
        let session = GameSession::new(SessionConfig::default()).unwrap();
        let display = format!("{}", session);
        assert!(display.contains("Score:"));
        assert!(display.contains("+------+"));
    }

    #[test]
    fn test_debug_format() {
        let session = GameSession::new(SessionConfig::default()).unwrap();
        let debug = format!("{:?}", session);
        assert!(debug.contains("GameSession"));
        assert!(debug.contains("score"));
    }
}

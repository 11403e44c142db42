use std::collections::HashMap;

use crate::board::{CELLS, GameResult, GameState, Mark, evaluate};
use crate::error::{InvalidMove, MoveError};

/// Result of a move that was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Game goes on; carries the state after the turn passed.
    Applied(GameState),
    /// The move decided the game. The turn is left on the mover.
    Ended(GameResult),
}

/// One game per room, created on first join.
#[derive(Debug, Default)]
pub struct GameStore {
    games: HashMap<String, GameState>,
}

impl GameStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensure_game(&mut self, room: &str) {
        self.games.entry(room.to_string()).or_default();
    }

    pub fn get_game(&self, room: &str) -> Option<&GameState> {
        self.games.get(room)
    }

    /// Puts the room's game back to an empty board with X to move.
    /// Returns `None` if the room has no game.
    pub fn reset_game(&mut self, room: &str) -> Option<&GameState> {
        let state = self.games.get_mut(room)?;
        *state = GameState::new();
        Some(&*state)
    }

    pub fn remove_game(&mut self, room: &str) -> Option<GameState> {
        self.games.remove(room)
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    /// Validates and plays `mark` at `cell_index`. On any error the board is
    /// left untouched.
    pub fn make_move(
        &mut self,
        room: &str,
        cell_index: i64,
        mark: Option<Mark>,
    ) -> Result<MoveOutcome, MoveError> {
        let state = self
            .games
            .get_mut(room)
            .ok_or_else(|| MoveError::UnknownRoom(room.to_string()))?;

        let index = usize::try_from(cell_index)
            .ok()
            .filter(|&i| i < CELLS)
            .ok_or(InvalidMove::OutOfRange(cell_index))?;

        if evaluate(&state.board).is_decided() {
            return Err(InvalidMove::GameOver.into());
        }
        if state.board[index].is_some() {
            return Err(InvalidMove::Occupied(index).into());
        }
        let mark = mark.ok_or(InvalidMove::NoMark)?;
        if mark != state.current_turn {
            return Err(InvalidMove::NotYourTurn.into());
        }

        state.board[index] = Some(mark);

        if let Some(result) = GameResult::from_board(&state.board) {
            return Ok(MoveOutcome::Ended(result));
        }

        state.current_turn = state.current_turn.opponent();
        Ok(MoveOutcome::Applied(state.clone()))
    }
}

use serde::{Deserialize, Serialize};

/// Number of cells on a board.
pub const CELLS: usize = 9;

/// Every line that wins the game, in the order they are checked.
pub const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// The symbol a connection plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn opponent(self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }
}

impl std::fmt::Display for Mark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::X => write!(f, "X"),
            Self::O => write!(f, "O"),
        }
    }
}

/// Row-major cells; `None` is an empty cell and serializes as `null`.
pub type Board = [Option<Mark>; CELLS];

/// Board plus whose turn it is, for one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub board: Board,
    pub current_turn: Mark,
}

impl GameState {
    /// Empty board, X to move.
    pub fn new() -> Self {
        Self {
            board: [None; CELLS],
            current_turn: Mark::X,
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win(Mark),
    Draw,
    Ongoing,
}

impl Outcome {
    pub fn is_decided(self) -> bool {
        !matches!(self, Self::Ongoing)
    }
}

/// Scans the win lines in order, then checks for a full board.
pub fn evaluate(board: &Board) -> Outcome {
    for [a, b, c] in WIN_LINES {
        if let Some(mark) = board[a] {
            if board[b] == Some(mark) && board[c] == Some(mark) {
                return Outcome::Win(mark);
            }
        }
    }

    if board.iter().all(Option::is_some) {
        Outcome::Draw
    } else {
        Outcome::Ongoing
    }
}

/// Payload of a `gameEnd` event. Carries the final board so clients can
/// draw the deciding move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Mark>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_draw: bool,
    pub message: String,
    pub board: Board,
}

impl GameResult {
    /// Returns `None` while the game is still running.
    pub fn from_board(board: &Board) -> Option<Self> {
        let (winner, is_draw, message) = match evaluate(board) {
            Outcome::Win(mark) => (Some(mark), false, format!("{} Wins!", mark)),
            Outcome::Draw => (None, true, "Draw!".to_string()),
            Outcome::Ongoing => return None,
        };
        Some(Self {
            winner,
            is_draw,
            message,
            board: *board,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const X: Option<Mark> = Some(Mark::X);
    const O: Option<Mark> = Some(Mark::O);
    const E: Option<Mark> = None;

    /// Decodes `n` as a base-3 board: 0 empty, 1 X, 2 O.
    fn board_from_index(mut n: usize) -> Board {
        let mut board = [None; CELLS];
        for cell in board.iter_mut() {
            *cell = match n % 3 {
                0 => None,
                1 => Some(Mark::X),
                _ => Some(Mark::O),
            };
            n /= 3;
        }
        board
    }

    #[test]
    fn top_row_of_x_wins() {
        let board = [X, X, X, E, E, E, E, E, E];
        assert_eq!(evaluate(&board), Outcome::Win(Mark::X));
    }

    #[test]
    fn diagonals_win() {
        assert_eq!(evaluate(&[O, E, E, E, O, E, E, E, O]), Outcome::Win(Mark::O));
        assert_eq!(evaluate(&[E, E, X, E, X, E, X, E, E]), Outcome::Win(Mark::X));
    }

    #[test]
    fn full_board_without_line_is_draw() {
        let board = [X, O, X, X, O, O, O, X, X];
        assert_eq!(evaluate(&board), Outcome::Draw);
    }

    #[test]
    fn full_board_with_line_is_win_not_draw() {
        let board = [X, X, X, O, O, X, O, X, O];
        assert_eq!(evaluate(&board), Outcome::Win(Mark::X));
    }

    #[test]
    fn empty_and_partial_boards_are_ongoing() {
        assert_eq!(evaluate(&[None; CELLS]), Outcome::Ongoing);
        assert_eq!(evaluate(&[X, O, X, E, E, E, E, E, E]), Outcome::Ongoing);
    }

    #[test]
    fn first_line_in_order_decides_winner() {
        // Unreachable in play, but the scan order is fixed.
        let board = [O, O, O, X, X, X, E, E, E];
        assert_eq!(evaluate(&board), Outcome::Win(Mark::O));
    }

    #[test]
    fn win_iff_some_line_is_uniform_for_every_board() {
        for n in 0..3usize.pow(CELLS as u32) {
            let board = board_from_index(n);
            let has_line = WIN_LINES.iter().any(|&[a, b, c]| {
                board[a].is_some() && board[a] == board[b] && board[a] == board[c]
            });
            let is_win = matches!(evaluate(&board), Outcome::Win(_));
            assert_eq!(has_line, is_win, "board {:?}", board);
        }
    }

    #[test]
    fn result_messages() {
        let won = [O, O, O, X, X, E, E, E, E];
        let win = GameResult::from_board(&won).unwrap();
        assert_eq!(win.message, "O Wins!");
        assert_eq!(win.winner, Some(Mark::O));
        assert_eq!(win.board, won);

        let draw = GameResult::from_board(&[X, O, X, X, O, O, O, X, X]).unwrap();
        assert!(draw.is_draw);
        assert_eq!(draw.message, "Draw!");

        assert!(GameResult::from_board(&[X, E, E, E, E, E, E, E, E]).is_none());
    }

    #[test]
    fn game_state_serializes_with_null_cells() {
        let mut state = GameState::new();
        state.board[4] = X;
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "board": [null, null, null, null, "X", null, null, null, null],
                "currentTurn": "X",
            })
        );
    }

    #[test]
    fn draw_result_omits_winner() {
        let draw = GameResult::from_board(&[X, O, X, X, O, O, O, X, X]).unwrap();
        let json = serde_json::to_value(&draw).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "isDraw": true,
                "message": "Draw!",
                "board": ["X", "O", "X", "X", "O", "O", "O", "X", "X"],
            })
        );
    }
}

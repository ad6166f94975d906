//! Tests for the game state machine.

use arena_tictactoe::{Game, GameStatus, LINES, LastMove, Mark, MoveError};

/// Plays the moves in order, panicking on any rejection.
fn play(game: &mut Game, moves: &[usize]) -> Vec<LastMove> {
    moves
        .iter()
        .map(|&index| game.make_move(index).expect("legal move"))
        .collect()
}

/// First set of `count` squares outside `line` that do not themselves
/// complete a line.
fn filler(line: [usize; 3], count: usize) -> Vec<usize> {
    let free: Vec<usize> = (0..9).filter(|i| !line.contains(i)).collect();
    let mut picked = Vec::new();
    for &i in &free {
        let mut trial = picked.clone();
        trial.push(i);
        let completes = LINES
            .iter()
            .any(|l| l.iter().all(|sq| trial.contains(sq)));
        if !completes {
            picked = trial;
        }
        if picked.len() == count {
            break;
        }
    }
    picked
}

#[test]
fn test_marks_alternate_starting_with_x() {
    let mut game = Game::new();
    let moves = play(&mut game, &[4, 0, 8, 2, 1, 7]);
    let marks: Vec<Mark> = moves.iter().map(|m| m.mark).collect();
    assert_eq!(marks, vec![Mark::X, Mark::O, Mark::X, Mark::O, Mark::X, Mark::O]);
}

#[test]
fn test_marks_alternate_again_after_reset() {
    let mut game = Game::new();
    play(&mut game, &[4, 0, 8]);
    game.reset();
    let moves = play(&mut game, &[0, 1]);
    assert_eq!(moves[0].mark, Mark::X);
    assert_eq!(moves[1].mark, Mark::O);
    assert_eq!(game.state().history(), &[0, 1]);
}

#[test]
fn test_marked_square_never_accepted_again() {
    let mut game = Game::new();
    let sequence = [4, 0, 8, 2, 1, 7];
    for (n, &index) in sequence.iter().enumerate() {
        game.make_move(index).expect("legal move");
        for &taken in &sequence[..=n] {
            assert_eq!(game.make_move(taken), Err(MoveError::Occupied(taken)));
        }
    }
}

#[test]
fn test_out_of_range_rejected() {
    let mut game = Game::new();
    assert_eq!(game.make_move(9), Err(MoveError::OutOfBounds(9)));
    assert_eq!(game.state().history(), &[] as &[usize]);
}

#[test]
fn test_each_line_wins_for_x() {
    for line in LINES {
        let o_moves = filler(line, 2);
        let mut game = Game::new();
        play(
            &mut game,
            &[line[0], o_moves[0], line[1], o_moves[1], line[2]],
        );
        assert_eq!(game.state().status(), GameStatus::Won(Mark::X), "line {:?}", line);
        let next = (0..9).find(|&i| game.state().board().is_empty(i)).expect("empty square");
        assert_eq!(game.make_move(next), Err(MoveError::GameOver));
    }
}

#[test]
fn test_each_line_wins_for_o() {
    for line in LINES {
        let x_moves = filler(line, 3);
        assert_eq!(x_moves.len(), 3, "line {:?}", line);
        let mut game = Game::new();
        play(
            &mut game,
            &[x_moves[0], line[0], x_moves[1], line[1], x_moves[2], line[2]],
        );
        assert_eq!(game.state().status(), GameStatus::Won(Mark::O), "line {:?}", line);
    }
}

#[test]
fn test_full_board_without_line_is_draw() {
    let mut game = Game::new();
    // X O X / X O O / O X X
    play(&mut game, &[0, 1, 2, 4, 3, 5, 7, 6, 8]);
    assert_eq!(game.state().status(), GameStatus::Draw);
    assert_eq!(game.make_move(0), Err(MoveError::GameOver));
}

#[test]
fn test_top_row_scenario() {
    let mut game = Game::new();
    let moves = play(&mut game, &[0, 3, 1, 4]);
    assert_eq!(moves.len(), 4);
    assert_eq!(game.state().status(), GameStatus::InProgress);

    let last = game.make_move(2).expect("winning move");
    assert_eq!(last, LastMove { mark: Mark::X, index: 2 });
    assert_eq!(game.state().status(), GameStatus::Won(Mark::X));
    assert_eq!(game.make_move(5), Err(MoveError::GameOver));
}

//! Pure transformations over [`BoardSnapshot`]s: cursor navigation and
//! reconciliation of a freshly fetched board against the one on screen.

use crate::types::{BoardSnapshot, IssuePosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Adopt `new`'s data while keeping the user's focus where it was.
///
/// The cursor follows the focused issue key if it still exists anywhere on the
/// new board. Otherwise it clamps into the same column index, then into the
/// first non-empty column, then falls back to the empty-board sentinel.
pub fn apply_refresh(old: &BoardSnapshot, new: BoardSnapshot) -> BoardSnapshot {
    let Some(position) = old.cursor() else {
        return new;
    };

    if let Some(found) = old
        .focused_issue()
        .and_then(|issue| new.position_of(&issue.key))
    {
        return new.with_cursor(Some(found));
    }

    let columns = new.columns();
    let fallback = columns
        .get(position.column)
        .filter(|column| !column.issues.is_empty())
        .map(|column| IssuePosition::new(position.column, position.issue.min(column.issues.len() - 1)))
        .or_else(|| {
            columns
                .iter()
                .enumerate()
                .find(|(_, column)| !column.issues.is_empty())
                .map(|(c, column)| IssuePosition::new(c, position.issue.min(column.issues.len() - 1)))
        });

    new.with_cursor(fallback)
}

/// Move the cursor one step. Edges are no-ops; there is no wraparound.
pub fn move_cursor(snapshot: &BoardSnapshot, direction: Direction) -> BoardSnapshot {
    let Some(position) = snapshot.cursor() else {
        return snapshot.clone();
    };
    let columns = snapshot.columns();

    let target = match direction {
        Direction::Up => position
            .issue
            .checked_sub(1)
            .map(|issue| IssuePosition::new(position.column, issue)),
        Direction::Down => {
            let len = columns[position.column].issues.len();
            (position.issue + 1 < len).then(|| IssuePosition::new(position.column, position.issue + 1))
        }
        Direction::Left => columns[..position.column]
            .iter()
            .rposition(|column| !column.issues.is_empty())
            .map(|c| IssuePosition::new(c, position.issue.min(columns[c].issues.len() - 1))),
        Direction::Right => columns[position.column + 1..]
            .iter()
            .position(|column| !column.issues.is_empty())
            .map(|offset| {
                let c = position.column + 1 + offset;
                IssuePosition::new(c, position.issue.min(columns[c].issues.len() - 1))
            }),
    };

    match target {
        Some(target) => snapshot.with_cursor(Some(target)),
        None => snapshot.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::board;

    fn focused_key(snapshot: &BoardSnapshot) -> Option<&str> {
        snapshot.focused_issue().map(|issue| issue.key.as_str())
    }

    fn at(snapshot: &BoardSnapshot, column: usize, issue: usize) -> BoardSnapshot {
        snapshot.with_cursor(Some(IssuePosition::new(column, issue)))
    }

    #[test]
    fn identical_refresh_keeps_focused_key() {
        let layouts: [&[(&str, &[&str])]; 3] = [
            &[("A", &["X-1", "X-2", "X-3"])],
            &[("A", &["X-1"]), ("B", &[]), ("C", &["X-2", "X-3"])],
            &[("A", &[]), ("B", &["X-1", "X-2"]), ("C", &["X-3"])],
        ];

        for layout in layouts {
            let base = board(layout);
            for column in 0..base.columns().len() {
                for issue in 0..base.columns()[column].issues.len() {
                    let old = at(&base, column, issue);
                    let key = focused_key(&old).map(str::to_string);
                    let refreshed = apply_refresh(&old, board(layout));
                    assert_eq!(focused_key(&refreshed).map(str::to_string), key);
                    assert_eq!(refreshed.cursor(), old.cursor());
                }
            }
        }
    }

    #[test]
    fn refresh_follows_issue_to_its_new_column() {
        let old = board(&[("To Do", &["X-1", "X-2"]), ("Doing", &[])]);
        assert_eq!(focused_key(&old), Some("X-1"));

        let new = board(&[("To Do", &["X-2"]), ("Doing", &["X-1"])]);
        let refreshed = apply_refresh(&old, new);

        assert_eq!(refreshed.cursor(), Some(IssuePosition::new(1, 0)));
        assert_eq!(focused_key(&refreshed), Some("X-1"));
    }

    #[test]
    fn refresh_adopts_new_data_verbatim() {
        let old = board(&[("A", &["X-1"])]);
        let new = board(&[("A", &["X-3", "X-1"]), ("B", &["X-2"])]);
        let refreshed = apply_refresh(&old, new.clone());

        assert_eq!(refreshed.columns(), new.columns());
        assert_eq!(refreshed.fetched_at(), new.fetched_at());
        assert_eq!(refreshed.cursor(), Some(IssuePosition::new(0, 1)));
    }

    #[test]
    fn deleted_issue_clamps_within_same_column() {
        let old = at(&board(&[("A", &["X-1"]), ("B", &["X-2", "X-3", "X-4"])]), 1, 2);
        let new = board(&[("A", &["X-1"]), ("B", &["X-2", "X-3"])]);
        let refreshed = apply_refresh(&old, new);
        assert_eq!(refreshed.cursor(), Some(IssuePosition::new(1, 1)));
    }

    #[test]
    fn deleted_issue_in_emptied_column_falls_back_to_first_non_empty() {
        let old = at(&board(&[("A", &[]), ("B", &["X-2"]), ("C", &["X-3", "X-4"])]), 1, 0);
        let new = board(&[("A", &[]), ("B", &[]), ("C", &["X-3", "X-4"])]);
        let refreshed = apply_refresh(&old, new);
        assert_eq!(refreshed.cursor(), Some(IssuePosition::new(2, 0)));
    }

    #[test]
    fn deleted_issue_in_removed_column_falls_back_to_first_non_empty() {
        let old = at(&board(&[("A", &["X-1"]), ("B", &["X-2"])]), 1, 0);
        let new = board(&[("A", &["X-1"])]);
        let refreshed = apply_refresh(&old, new);
        assert_eq!(focused_key(&refreshed), Some("X-1"));
    }

    #[test]
    fn refresh_to_empty_board_yields_sentinel() {
        let old = board(&[("A", &["X-1"])]);
        let refreshed = apply_refresh(&old, board(&[("A", &[])]));
        assert!(refreshed.is_empty());
    }

    #[test]
    fn refresh_from_empty_board_focuses_first_issue() {
        let old = board(&[("A", &[]), ("B", &[])]);
        let refreshed = apply_refresh(&old, board(&[("A", &[]), ("B", &["X-7"])]));
        assert_eq!(focused_key(&refreshed), Some("X-7"));
    }

    #[test]
    fn up_then_down_is_identity_away_from_edges() {
        let base = board(&[("A", &["X-1", "X-2", "X-3", "X-4"]), ("B", &["X-5", "X-6", "X-7"])]);
        for column in 0..base.columns().len() {
            let len = base.columns()[column].issues.len();
            for issue in 1..len - 1 {
                let start = at(&base, column, issue);
                let there_and_back = move_cursor(&move_cursor(&start, Direction::Up), Direction::Down);
                assert_eq!(there_and_back.cursor(), start.cursor());
                let back_and_there = move_cursor(&move_cursor(&start, Direction::Down), Direction::Up);
                assert_eq!(back_and_there.cursor(), start.cursor());
            }
        }
    }

    #[test]
    fn vertical_moves_stop_at_column_edges() {
        let base = board(&[("A", &["X-1", "X-2"])]);
        let top = at(&base, 0, 0);
        assert_eq!(move_cursor(&top, Direction::Up).cursor(), top.cursor());
        let bottom = at(&base, 0, 1);
        assert_eq!(move_cursor(&bottom, Direction::Down).cursor(), bottom.cursor());
    }

    #[test]
    fn horizontal_moves_skip_empty_columns_and_clamp_index() {
        let base = board(&[("A", &["X-1", "X-2", "X-3"]), ("B", &[]), ("C", &["X-4"])]);
        let start = at(&base, 0, 2);

        let right = move_cursor(&start, Direction::Right);
        assert_eq!(right.cursor(), Some(IssuePosition::new(2, 0)));

        let left = move_cursor(&right, Direction::Left);
        assert_eq!(left.cursor(), Some(IssuePosition::new(0, 0)));
    }

    #[test]
    fn horizontal_moves_keep_index_when_it_fits() {
        let base = board(&[("A", &["X-1", "X-2"]), ("B", &["X-3", "X-4", "X-5"])]);
        let moved = move_cursor(&at(&base, 0, 1), Direction::Right);
        assert_eq!(moved.cursor(), Some(IssuePosition::new(1, 1)));
    }

    #[test]
    fn horizontal_moves_are_no_ops_past_outer_non_empty_columns() {
        let base = board(&[("A", &[]), ("B", &["X-1"]), ("C", &["X-2"]), ("D", &[])]);

        let first = at(&base, 1, 0);
        let left = move_cursor(&first, Direction::Left);
        assert_eq!(left.cursor(), first.cursor());
        assert_eq!(move_cursor(&left, Direction::Left).cursor(), first.cursor());

        let last = at(&base, 2, 0);
        let right = move_cursor(&last, Direction::Right);
        assert_eq!(right.cursor(), last.cursor());
        assert_eq!(move_cursor(&right, Direction::Right).cursor(), last.cursor());
    }

    #[test]
    fn moves_on_empty_board_are_no_ops() {
        let empty = board(&[("A", &[]), ("B", &[])]);
        for direction in [Direction::Up, Direction::Down, Direction::Left, Direction::Right] {
            assert!(move_cursor(&empty, direction).is_empty());
        }
    }

    #[test]
    fn navigation_does_not_touch_board_data() {
        let base = board(&[("A", &["X-1"]), ("B", &["X-2"])]);
        let moved = move_cursor(&base, Direction::Right);
        assert_eq!(moved.columns(), base.columns());
        assert_eq!(moved.fetched_at(), base.fetched_at());
    }
}

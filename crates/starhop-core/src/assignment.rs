//! Minimum-cost perfect matching on a square cost matrix.
//!
//! Primal-dual Hungarian method with row and column potentials, O(n³).

const INF: i64 = i64::MAX / 4;

/// Optimal matching of rows to columns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assignment {
    /// `row_of_column[j]` is the row matched to column `j`.
    pub row_of_column: Vec<usize>,
    /// Sum of the matched costs.
    pub total: i64,
}

/// Solves the assignment problem for an `n × n` matrix.
///
/// Rows shorter than `n` are treated as having infinite cost in the missing
/// columns; callers are expected to pass a square matrix.
pub fn solve(costs: &[Vec<i64>]) -> Assignment {
    let n = costs.len();
    let cost = |i: usize, j: usize| costs[i - 1].get(j - 1).copied().unwrap_or(INF);

    // 1-based; index 0 is the virtual column used to grow augmenting paths.
    let mut u = vec![0i64; n + 1];
    let mut v = vec![0i64; n + 1];
    let mut matched_row = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for row in 1..=n {
        matched_row[0] = row;
        let mut j0 = 0;
        let mut min_slack = vec![INF; n + 1];
        let mut used = vec![false; n + 1];

        loop {
            used[j0] = true;
            let i0 = matched_row[j0];
            let mut delta = INF;
            let mut j1 = 0;
            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let reduced = cost(i0, j) - u[i0] - v[j];
                if reduced < min_slack[j] {
                    min_slack[j] = reduced;
                    way[j] = j0;
                }
                if min_slack[j] < delta {
                    delta = min_slack[j];
                    j1 = j;
                }
            }
            for j in 0..=n {
                if used[j] {
                    u[matched_row[j]] += delta;
                    v[j] -= delta;
                } else {
                    min_slack[j] -= delta;
                }
            }
            j0 = j1;
            if matched_row[j0] == 0 {
                break;
            }
        }

        while j0 != 0 {
            let j1 = way[j0];
            matched_row[j0] = matched_row[j1];
            j0 = j1;
        }
    }

    let row_of_column: Vec<usize> = matched_row[1..].iter().map(|&row| row - 1).collect();
    let total = row_of_column
        .iter()
        .enumerate()
        .map(|(col, &row)| costs[row][col])
        .sum();
    Assignment {
        row_of_column,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force(costs: &[Vec<i64>]) -> i64 {
        fn go(costs: &[Vec<i64>], row: usize, taken: &mut Vec<bool>) -> i64 {
            if row == costs.len() {
                return 0;
            }
            let mut best = i64::MAX;
            for col in 0..costs.len() {
                if !taken[col] {
                    taken[col] = true;
                    best = best.min(costs[row][col] + go(costs, row + 1, taken));
                    taken[col] = false;
                }
            }
            best
        }
        go(costs, 0, &mut vec![false; costs.len()])
    }

    #[test]
    fn small_matrix() {
        let costs = vec![vec![4, 1, 3], vec![2, 0, 5], vec![3, 2, 2]];
        let result = solve(&costs);
        assert_eq!(result.total, 5);
        assert_eq!(result.row_of_column, vec![1, 0, 2]);
    }

    #[test]
    fn matches_brute_force() {
        let costs = vec![
            vec![7, 3, 9, 4, 1],
            vec![2, 8, 6, 5, 3],
            vec![4, 4, 1, 7, 6],
            vec![9, 2, 3, 8, 5],
            vec![6, 5, 4, 2, 9],
        ];
        assert_eq!(solve(&costs).total, brute_force(&costs));
    }

    #[test]
    fn result_is_a_permutation() {
        let costs: Vec<Vec<i64>> = (0..10)
            .map(|i| (0..10).map(|j| ((i * 7 + j * 13) % 11) as i64).collect())
            .collect();
        let result = solve(&costs);
        let mut rows = result.row_of_column.clone();
        rows.sort_unstable();
        assert_eq!(rows, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn empty_matrix() {
        let result = solve(&[]);
        assert!(result.row_of_column.is_empty());
        assert_eq!(result.total, 0);
    }
}

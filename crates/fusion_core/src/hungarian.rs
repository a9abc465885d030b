//! Hungarian (Munkres) assignment
//!
//! Square-matrix Munkres with star/prime markings, O(n^3). The cost matrix
//! is assumed already square (callers pad with a sentinel cost); this
//! module does not pad itself so it stays a pure assignment-solver,
//! independent of the track/candidate gating that calls into it.

/// Solve the square assignment problem for `cost[row][col]`, minimizing
/// total cost. Returns `assignment[row] = col`.
pub fn solve(cost: &[Vec<f64>]) -> Vec<usize> {
    let n = cost.len();
    if n == 0 {
        return Vec::new();
    }
    debug_assert!(cost.iter().all(|row| row.len() == n), "cost matrix must be square");

    // Work on a padded copy so internal reductions don't require the
    // original to be mutable.
    let mut c = cost.to_vec();

    // Step 1: subtract row minima.
    for row in c.iter_mut() {
        let min = row.iter().cloned().fold(f64::INFINITY, f64::min);
        if min.is_finite() {
            for v in row.iter_mut() {
                *v -= min;
            }
        }
    }
    // Step 2: subtract column minima.
    for col in 0..n {
        let min = (0..n).map(|r| c[r][col]).fold(f64::INFINITY, f64::min);
        if min.is_finite() {
            for row in 0..n {
                c[row][col] -= min;
            }
        }
    }

    let mut starred = vec![vec![false; n]; n];
    let mut primed = vec![vec![false; n]; n];
    let mut row_covered = vec![false; n];
    let mut col_covered = vec![false; n];

    // Initial starring: one zero per row/col, greedily.
    for r in 0..n {
        for cidx in 0..n {
            if is_zero(c[r][cidx]) && !row_covered[r] && !col_covered[cidx] {
                starred[r][cidx] = true;
                row_covered[r] = true;
                col_covered[cidx] = true;
            }
        }
    }
    row_covered.iter_mut().for_each(|v| *v = false);
    col_covered.iter_mut().for_each(|v| *v = false);

    loop {
        // Cover columns containing a starred zero.
        for cidx in 0..n {
            col_covered[cidx] = (0..n).any(|r| starred[r][cidx]);
        }
        if col_covered.iter().filter(|&&v| v).count() >= n {
            break;
        }

        loop {
            match find_uncovered_zero(&c, &row_covered, &col_covered) {
                Some((r, cidx)) => {
                    primed[r][cidx] = true;
                    if let Some(star_col) = (0..n).find(|&cc| starred[r][cc]) {
                        row_covered[r] = true;
                        col_covered[star_col] = false;
                    } else {
                        augment_path(&mut starred, &primed, r, cidx);
                        primed.iter_mut().for_each(|row| row.iter_mut().for_each(|v| *v = false));
                        row_covered.iter_mut().for_each(|v| *v = false);
                        col_covered.iter_mut().for_each(|v| *v = false);
                        for cc in 0..n {
                            col_covered[cc] = (0..n).any(|rr| starred[rr][cc]);
                        }
                        break;
                    }
                }
                None => {
                    let min_uncovered = uncovered_min(&c, &row_covered, &col_covered);
                    if !min_uncovered.is_finite() {
                        break;
                    }
                    for r in 0..n {
                        for cc in 0..n {
                            if row_covered[r] {
                                c[r][cc] += min_uncovered;
                            }
                            if !col_covered[cc] {
                                c[r][cc] -= min_uncovered;
                            }
                        }
                    }
                }
            }
        }
    }

    let mut assignment = vec![usize::MAX; n];
    for r in 0..n {
        for cidx in 0..n {
            if starred[r][cidx] {
                assignment[r] = cidx;
            }
        }
    }
    assignment
}

fn is_zero(v: f64) -> bool {
    v.abs() < 1e-9
}

fn find_uncovered_zero(
    c: &[Vec<f64>],
    row_covered: &[bool],
    col_covered: &[bool],
) -> Option<(usize, usize)> {
    let n = c.len();
    for r in 0..n {
        if row_covered[r] {
            continue;
        }
        for cidx in 0..n {
            if !col_covered[cidx] && is_zero(c[r][cidx]) {
                return Some((r, cidx));
            }
        }
    }
    None
}

fn uncovered_min(c: &[Vec<f64>], row_covered: &[bool], col_covered: &[bool]) -> f64 {
    let n = c.len();
    let mut min = f64::INFINITY;
    for r in 0..n {
        if row_covered[r] {
            continue;
        }
        for cidx in 0..n {
            if !col_covered[cidx] {
                min = min.min(c[r][cidx]);
            }
        }
    }
    min
}

/// Alternate starred/primed zeros along the augmenting path starting at
/// the just-primed `(start_row, start_col)`, per the classic Munkres step 5.
fn augment_path(
    starred: &mut [Vec<bool>],
    primed: &[Vec<bool>],
    start_row: usize,
    start_col: usize,
) {
    let n = starred.len();
    let mut path = vec![(start_row, start_col)];

    loop {
        let (_, col) = *path.last().unwrap();
        let star_row = (0..n).find(|&r| starred[r][col]);
        match star_row {
            Some(r) => {
                path.push((r, col));
                let prime_col = (0..n).find(|&cc| primed[r][cc]).expect("primed row must have a primed zero");
                path.push((r, prime_col));
            }
            None => break,
        }
    }

    for &(r, cidx) in &path {
        if starred[r][cidx] {
            starred[r][cidx] = false;
        } else {
            starred[r][cidx] = true;
        }
    }
}

/// Total cost of an assignment against the original (unreduced) matrix.
pub fn assignment_cost(cost: &[Vec<f64>], assignment: &[usize]) -> f64 {
    assignment
        .iter()
        .enumerate()
        .filter(|(_, &c)| c != usize::MAX)
        .map(|(r, &c)| cost[r][c])
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trivial_1x1() {
        let cost = vec![vec![5.0]];
        let assignment = solve(&cost);
        assert_eq!(assignment, vec![0]);
    }

    #[test]
    fn test_known_optimal_3x3() {
        // Classic textbook example, optimal cost = 140 (rows->cols: 0->1,1->0,2->2 or similar)
        let cost = vec![
            vec![82.0, 83.0, 69.0],
            vec![77.0, 37.0, 49.0],
            vec![11.0, 69.0, 5.0],
        ];
        let assignment = solve(&cost);
        let total = assignment_cost(&cost, &assignment);
        // brute force over all permutations to confirm optimality
        let best = brute_force(&cost);
        assert!((total - best).abs() < 1e-6, "got {total}, want {best}");
    }

    #[test]
    fn test_optimality_random_matrices() {
        let mut seed = 12345u64;
        let mut next = move || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            ((seed >> 33) % 100) as f64
        };
        for _ in 0..20 {
            let n = 4;
            let cost: Vec<Vec<f64>> = (0..n).map(|_| (0..n).map(|_| next()).collect()).collect();
            let assignment = solve(&cost);
            let total = assignment_cost(&cost, &assignment);
            let best = brute_force(&cost);
            assert!((total - best).abs() < 1e-6, "got {total}, want {best} for {cost:?}");
        }
    }

    fn brute_force(cost: &[Vec<f64>]) -> f64 {
        let n = cost.len();
        let mut perm: Vec<usize> = (0..n).collect();
        let mut best = f64::INFINITY;
        permute(&mut perm, 0, cost, &mut best);
        best
    }

    fn permute(perm: &mut [usize], k: usize, cost: &[Vec<f64>], best: &mut f64) {
        let n = perm.len();
        if k == n {
            let total: f64 = (0..n).map(|r| cost[r][perm[r]]).sum();
            if total < *best {
                *best = total;
            }
            return;
        }
        for i in k..n {
            perm.swap(k, i);
            permute(perm, k + 1, cost, best);
            perm.swap(k, i);
        }
    }
}

use crate::{
    catalog::{AttributeCatalog, Profile},
    design::{
        seed,
        strategy::{SessionHistory, draw_profile_pair},
    },
    error::SurveyError,
};

const STRATEGY_NAME: &str = "d-optimal";
const CANDIDATE_COUNT: usize = 50;

/// Ridge added to the information matrix diagonal so the determinant still
/// discriminates between candidates while the design has fewer rows than
/// regressors (the first rounds of every session).
const RIDGE: f64 = 1e-6;

/// Greedy approximation of a d-optimal design: draw a bounded candidate set
/// of seeded pairs, then keep the candidate whose two profiles maximize
/// `det(X'X)` over the profiles already shown this session. Exact d-optimal
/// search is combinatorial in the catalog size; this candidate-set greedy is
/// the standard practical stand-in. Ties keep the earliest candidate, since
/// only a strictly larger determinant displaces the incumbent.
pub fn generate_pair(
    session_seed: &str,
    round_number: u32,
    catalog: &AttributeCatalog,
    history: &SessionHistory,
) -> Result<(Profile, Profile), SurveyError> {
    let mut rng = seed::draw_rng(session_seed, round_number, STRATEGY_NAME, 0);
    let history_rows: Vec<Vec<f64>> = history
        .shown
        .iter()
        .map(|profile| design_row(catalog, profile))
        .collect();

    let mut best_pair = None;
    let mut best_score = f64::NEG_INFINITY;
    for _ in 0..CANDIDATE_COUNT {
        let (profile_a, profile_b) = draw_profile_pair(&mut rng, catalog);

        let mut rows = history_rows.clone();
        rows.push(design_row(catalog, &profile_a));
        rows.push(design_row(catalog, &profile_b));
        let score = determinant(&information_matrix(&rows, regressor_count(catalog)));

        if score > best_score {
            best_score = score;
            best_pair = Some((profile_a, profile_b));
        }
    }

    // CANDIDATE_COUNT > 0 and every score beats NEG_INFINITY.
    let (profile_a, profile_b) = best_pair.expect("candidate set is non-empty");
    Ok((profile_a, profile_b))
}

/// Intercept plus one dummy regressor per non-reference level.
fn regressor_count(catalog: &AttributeCatalog) -> usize {
    1 + catalog
        .attributes()
        .iter()
        .map(|attribute| attribute.levels.len() - 1)
        .sum::<usize>()
}

/// Dummy coding in catalog order: for each attribute the first level is the
/// reference and contributes no column.
fn design_row(catalog: &AttributeCatalog, profile: &Profile) -> Vec<f64> {
    let mut row = Vec::with_capacity(regressor_count(catalog));
    row.push(1.0);
    for attribute in catalog.attributes() {
        let level_id = profile
            .get(&attribute.attribute_key)
            .map(String::as_str)
            .unwrap_or_default();
        for level in attribute.levels.iter().skip(1) {
            row.push(if level.level_id == level_id { 1.0 } else { 0.0 });
        }
    }
    row
}

fn information_matrix(rows: &[Vec<f64>], width: usize) -> Vec<Vec<f64>> {
    let mut matrix = vec![vec![0.0; width]; width];
    for row in rows {
        for i in 0..width {
            for j in 0..width {
                matrix[i][j] += row[i] * row[j];
            }
        }
    }
    for (i, matrix_row) in matrix.iter_mut().enumerate() {
        matrix_row[i] += RIDGE;
    }
    matrix
}

/// Determinant by Gaussian elimination with partial pivoting.
fn determinant(matrix: &[Vec<f64>]) -> f64 {
    let n = matrix.len();
    let mut work: Vec<Vec<f64>> = matrix.to_vec();
    let mut det = 1.0;

    for column in 0..n {
        let pivot_row = (column..n)
            .max_by(|&a, &b| {
                work[a][column]
                    .abs()
                    .total_cmp(&work[b][column].abs())
            })
            .unwrap_or(column);
        if work[pivot_row][column].abs() < f64::EPSILON {
            return 0.0;
        }
        if pivot_row != column {
            work.swap(pivot_row, column);
            det = -det;
        }

        let pivot = work[column][column];
        det *= pivot;
        for row in column + 1..n {
            let factor = work[row][column] / pivot;
            for j in column..n {
                work[row][j] -= factor * work[column][j];
            }
        }
    }

    det
}

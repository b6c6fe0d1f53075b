//! Separable 2-D DCT-II via the Lee (1984) recurrence. Each call returns a
//! freshly owned `Vec` rather than reusing a scratch buffer across
//! recursive calls -- the 32x32 inputs phash/lhash use make the extra
//! allocations immaterial. Only ever called with power-of-two lengths (32,
//! 16, 8, ...).

use std::f64::consts::PI;

fn dct1d(input: &[f64]) -> Vec<f64> {
    let len = input.len();
    if len == 1 {
        return vec![input[0]];
    }

    let half = len / 2;
    let mut temp = vec![0.0; len];
    for i in 0..half {
        let (x, y) = (input[i], input[len - 1 - i]);
        temp[i] = x + y;
        temp[i + half] = (x - y) / (((i as f64 + 0.5) * PI / len as f64).cos() * 2.0);
    }

    let first_half = dct1d(&temp[..half]);
    let second_half = dct1d(&temp[half..]);

    let mut output = vec![0.0; len];
    for i in 0..half.saturating_sub(1) {
        output[i * 2] = first_half[i];
        output[i * 2 + 1] = second_half[i] + second_half[i + 1];
    }
    output[len - 2] = first_half[half - 1];
    output[len - 1] = second_half[half - 1];
    output
}

/// 2-D DCT-II over a `height x width` row-major matrix, using the separable
/// property (rows, then columns).
pub fn dct2d(input: &[Vec<f64>], width: usize, height: usize) -> Vec<Vec<f64>> {
    let mut output: Vec<Vec<f64>> = input.iter().map(|row| dct1d(row)).collect();

    for x in 0..width {
        let column: Vec<f64> = (0..height).map(|y| output[y][x]).collect();
        let transformed = dct1d(&column);
        for (y, value) in transformed.into_iter().enumerate() {
            output[y][x] = value;
        }
    }

    output
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn dct_of_constant_matrix_has_zero_ac_terms() {
        let w = 8;
        let h = 8;
        let input: Vec<Vec<f64>> = vec![vec![5.0; w]; h];
        let out = dct2d(&input, w, h);

        for y in 0..h {
            for x in 0..w {
                if x == 0 && y == 0 {
                    continue;
                }
                assert!(out[y][x].abs() < 1e-6, "out[{y}][{x}] = {}", out[y][x]);
            }
        }
    }

    #[test]
    fn dct_preserves_matrix_shape() {
        let w = 32;
        let h = 32;
        let input: Vec<Vec<f64>> = (0..h)
            .map(|y| (0..w).map(|x| ((x + y) % 7) as f64).collect())
            .collect();
        let out = dct2d(&input, w, h);
        assert_eq!(out.len(), h);
        assert!(out.iter().all(|row| row.len() == w));
    }

    #[test]
    fn dc_term_is_scaled_sum() {
        let w = 4;
        let h = 4;
        let input: Vec<Vec<f64>> = vec![vec![1.0; w]; h];
        let out = dct2d(&input, w, h);
        assert!(out[0][0] > 0.0);
    }
}

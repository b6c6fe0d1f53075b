//! Perceptual image hashes: average, mode, difference (horizontal,
//! vertical, diagonal), perception, and Leonard hashes, built on the
//! grayscale conversion in this module and the DCT from [`super::dct`]. All
//! hashes pack bits MSB-first: bit `idx` (0-based, in scan order) lands at
//! `1 << (63 - idx)`.

use image::{imageops::FilterType, RgbImage};

use super::dct::dct2d;
use super::hamming::Hamming;
use crate::error::HashError;

fn set_bit(hash: &mut u64, idx: usize) {
    *hash |= 1u64 << (63 - idx);
}

fn luminance(p: image::Rgb<u8>) -> f64 {
    0.299 * p.0[0] as f64 + 0.587 * p.0[1] as f64 + 0.114 * p.0[2] as f64
}

fn gray_grid(img: &RgbImage, w: u32, h: u32) -> Vec<Vec<f64>> {
    let resized = image::imageops::resize(img, w, h, FilterType::Triangle);
    (0..h as usize)
        .map(|y| {
            (0..w as usize)
                .map(|x| luminance(*resized.get_pixel(x as u32, y as u32)))
                .collect()
        })
        .collect()
}

/// Same grid as [`gray_grid`] but binarized to 0.0/255.0 at `threshold`,
/// matching `LeonardHash`'s call to `ConvertToThresholdArray(resized, 114)`.
fn threshold_grid(img: &RgbImage, w: u32, h: u32, threshold: f64) -> Vec<Vec<f64>> {
    gray_grid(img, w, h)
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|v| if v >= threshold { 255.0 } else { 0.0 })
                .collect()
        })
        .collect()
}

fn require_nonempty(img: &RgbImage) -> Result<(), HashError> {
    if img.width() == 0 || img.height() == 0 {
        return Err(HashError::NilImage);
    }
    Ok(())
}

/// AHash: mean-threshold over an 8x8 grayscale grid.
pub fn ahash(img: &RgbImage) -> Result<Hamming, HashError> {
    require_nonempty(img)?;
    let (w, h) = (8, 8);
    let grid = gray_grid(img, w, h);
    let flat: Vec<f64> = grid.into_iter().flatten().collect();
    let avg = flat.iter().sum::<f64>() / flat.len() as f64;

    let mut hash = 0u64;
    for (idx, &p) in flat.iter().enumerate() {
        if p > avg {
            set_bit(&mut hash, idx);
        }
    }
    Ok(Hamming(hash))
}

/// MHash: mode-threshold over an 8x8 grayscale grid. Pixel values are
/// truncated to integers before counting the histogram.
pub fn mhash(img: &RgbImage) -> Result<Hamming, HashError> {
    require_nonempty(img)?;
    let (w, h) = (8, 8);
    let grid = gray_grid(img, w, h);
    let flat: Vec<f64> = grid.into_iter().flatten().collect();

    let mut counts: std::collections::HashMap<i64, usize> = std::collections::HashMap::new();
    for &p in &flat {
        *counts.entry(p as i64).or_insert(0) += 1;
    }
    let mode = counts
        .into_iter()
        .max_by_key(|&(_, count)| count)
        .map(|(value, _)| value)
        .unwrap_or(0);

    let mut hash = 0u64;
    for (idx, &p) in flat.iter().enumerate() {
        if (p as i64) < mode {
            set_bit(&mut hash, idx);
        }
    }
    Ok(Hamming(hash))
}

/// DHash: horizontal neighbor comparison over a 9x8 grid (8x8 bits).
pub fn dhash(img: &RgbImage) -> Result<Hamming, HashError> {
    require_nonempty(img)?;
    let (w, h) = (9u32, 8u32);
    let grid = gray_grid(img, w, h);

    let mut hash = 0u64;
    let mut idx = 0;
    for row in grid.iter() {
        for x in 0..(w as usize - 1) {
            if row[x] < row[x + 1] {
                set_bit(&mut hash, idx);
            }
            idx += 1;
        }
    }
    Ok(Hamming(hash))
}

/// DHashV: vertical neighbor comparison over an 8x9 grid (8x8 bits).
pub fn dhash_vertical(img: &RgbImage) -> Result<Hamming, HashError> {
    require_nonempty(img)?;
    let (w, h) = (8u32, 9u32);
    let grid = gray_grid(img, w, h);

    let mut hash = 0u64;
    let mut idx = 0;
    for y in 0..(h as usize - 1) {
        for x in 0..w as usize {
            if grid[y][x] < grid[y + 1][x] {
                set_bit(&mut hash, idx);
            }
            idx += 1;
        }
    }
    Ok(Hamming(hash))
}

/// DHashD: diagonal neighbor comparison over a 9x9 grid.
pub fn dhash_diagonal(img: &RgbImage) -> Result<Hamming, HashError> {
    require_nonempty(img)?;
    let w = 9usize;
    let h = 9usize;
    let grid = gray_grid(img, w as u32, h as u32);

    let mut hash = 0u64;
    let mut idx = 0;

    for x in (0..w).rev() {
        for y in 0..(w - x - 1) {
            let xx = x + y;
            if grid[y][xx] > grid[y + 1][xx + 1] {
                set_bit(&mut hash, idx);
            }
            idx += 1;
        }
    }

    for y in (1..h).rev() {
        for x in 0..(w - y - 1) {
            let yy = y + x;
            if grid[yy][x] > grid[yy + 1][x + 1] {
                set_bit(&mut hash, idx);
            }
            idx += 1;
        }
    }

    Ok(Hamming(hash))
}

fn dct_hash_from_grid(grid: Vec<Vec<f64>>) -> Hamming {
    let dct = dct2d(&grid, 32, 32);

    let mut flat = [0.0f64; 64];
    let mut sum = 0.0;
    for y in 0..8 {
        for x in 0..8 {
            sum += dct[y][x];
            flat[y * 8 + x] = dct[y][x];
        }
    }
    sum -= dct[0][0];
    let avg = sum / 63.0;

    let mut hash = 0u64;
    for (idx, &p) in flat.iter().enumerate() {
        if p > avg {
            set_bit(&mut hash, idx);
        }
    }
    Hamming(hash)
}

/// PHash: 32x32 resize, 2-D DCT-II, mean-exclude-DC threshold over the
/// top-left 8x8 low-frequency block.
pub fn phash(img: &RgbImage) -> Result<Hamming, HashError> {
    require_nonempty(img)?;
    let grid = gray_grid(img, 32, 32);
    Ok(dct_hash_from_grid(grid))
}

/// LHash: as [`phash`], but the 32x32 grid is binarized at 114 before the
/// DCT.
pub fn lhash(img: &RgbImage) -> Result<Hamming, HashError> {
    require_nonempty(img)?;
    let grid = threshold_grid(img, 32, 32, 114.0);
    Ok(dct_hash_from_grid(grid))
}

#[cfg(test)]
mod test {
    use super::*;

    fn solid(w: u32, h: u32, rgb: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(w, h, image::Rgb(rgb))
    }

    fn checkerboard(w: u32, h: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| {
            if (x + y) % 2 == 0 {
                image::Rgb([255, 255, 255])
            } else {
                image::Rgb([0, 0, 0])
            }
        })
    }

    #[test]
    fn ahash_of_solid_image_is_zero() {
        let img = solid(16, 16, [128, 128, 128]);
        let h = ahash(&img).unwrap();
        assert_eq!(h.0, 0);
    }

    #[test]
    fn mhash_of_solid_image_is_zero() {
        let img = solid(16, 16, [64, 64, 64]);
        let h = mhash(&img).unwrap();
        assert_eq!(h.0, 0);
    }

    #[test]
    fn dhash_of_solid_image_is_zero() {
        let img = solid(16, 16, [10, 10, 10]);
        assert_eq!(dhash(&img).unwrap().0, 0);
        assert_eq!(dhash_vertical(&img).unwrap().0, 0);
        assert_eq!(dhash_diagonal(&img).unwrap().0, 0);
    }

    #[test]
    fn similar_images_have_small_phash_distance() {
        let a = checkerboard(64, 64);
        let mut b = checkerboard(64, 64);
        b.put_pixel(0, 0, image::Rgb([254, 1, 1]));

        let ha = phash(&a).unwrap();
        let hb = phash(&b).unwrap();
        assert!(ha.distance_to(hb) <= 4);
    }

    #[test]
    fn dissimilar_images_have_larger_phash_distance_than_near_duplicates() {
        let a = checkerboard(64, 64);
        let b = solid(64, 64, [10, 200, 30]);
        let mut c = checkerboard(64, 64);
        c.put_pixel(0, 0, image::Rgb([254, 1, 1]));

        let ha = phash(&a).unwrap();
        let hb = phash(&b).unwrap();
        let hc = phash(&c).unwrap();

        assert!(ha.distance_to(hb) > ha.distance_to(hc));
    }

    #[test]
    fn lhash_runs_on_resized_grid() {
        let img = checkerboard(64, 64);
        let h = lhash(&img).unwrap();
        let _ = h.to_hex();
    }

    #[test]
    fn rejects_zero_sized_image() {
        let img = RgbImage::new(0, 0);
        assert!(matches!(ahash(&img), Err(HashError::NilImage)));
        assert!(matches!(phash(&img), Err(HashError::NilImage)));
    }
}

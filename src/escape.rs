// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time kernels.
//!
//! A point `c` on the complex plane is iterated as `z = z * z + c`,
//! starting from `z = c`, until the squared modulus of `z` exceeds
//! `THRESHOLD` (the point "escapes") or the iteration bound runs out.
//! The answer is the 1-based iteration at which the escape happened,
//! or `0` if it never did.  `0` can never be a real escape count, so
//! it doubles as the "inside the set" marker.
//!
//! There are two forms.  `escape_steps` walks a single point.
//! `escape_steps_batch` walks `LANES` points at once, keeping the
//! real parts, imaginary parts, and their squares in separate flat
//! arrays so that each step is a handful of independent elementwise
//! passes the compiler can vectorize.  Both forms perform the same
//! floating-point operations in the same order, so they agree exactly.

use itertools::izip;
use num::Complex;

/// The squared bailout radius.  A point whose orbit has `|z|^2 > 4`
/// is known to diverge.
pub const THRESHOLD: f64 = 4.0;

/// Number of points processed together by `escape_steps_batch`.
pub const LANES: usize = 64;

/// Iterate a single point.  Returns the 1-based iteration at which
/// `|z|^2` first exceeded `THRESHOLD`, or `0` if it did not within
/// `limit` iterations.
#[inline]
pub fn escape_steps(c: Complex<f64>, limit: usize) -> usize {
    let mut z = c;
    for i in 1..=limit {
        z = z * z + c;
        if z.norm_sqr() > THRESHOLD {
            return i;
        }
    }
    0
}

/// Iterate `LANES` points at once.  `re[k]` and `im[k]` are the
/// coordinates of lane `k`; the result holds the escape iteration of
/// each lane, with the same meaning as `escape_steps`.
///
/// Lanes that have already escaped keep being updated along with the
/// rest; only the bookkeeping pass looks at whether a lane is done,
/// and a lane is done exactly when its result is nonzero.  The outer
/// loop stops as soon as every lane has a result.
pub fn escape_steps_batch(re: &[f64; LANES], im: &[f64; LANES], limit: usize) -> [usize; LANES] {
    let mut res = [0usize; LANES];
    let mut zr = *re;
    let mut zi = *im;
    let mut zr2 = [0f64; LANES];
    let mut zi2 = [0f64; LANES];
    for (r2, i2, r, i) in izip!(zr2.iter_mut(), zi2.iter_mut(), zr.iter(), zi.iter()) {
        *r2 = r * r;
        *i2 = i * i;
    }

    let mut escaped = 0;
    for step in 1..=limit {
        // zi first: it needs the previous zr.
        for (i, r, ci) in izip!(zi.iter_mut(), zr.iter(), im.iter()) {
            let t = *r * *i;
            *i = t + t + ci;
        }
        for (r, r2, i2, cr) in izip!(zr.iter_mut(), zr2.iter(), zi2.iter(), re.iter()) {
            *r = r2 - i2 + cr;
        }
        for (r2, r) in zr2.iter_mut().zip(zr.iter()) {
            *r2 = r * r;
        }
        for (i2, i) in zi2.iter_mut().zip(zi.iter()) {
            *i2 = i * i;
        }

        for (out, r2, i2) in izip!(res.iter_mut(), zr2.iter(), zi2.iter()) {
            if *out == 0 && r2 + i2 > THRESHOLD {
                *out = step;
                escaped += 1;
            }
        }
        if escaped == LANES {
            break;
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn origin_never_escapes() {
        for limit in &[1, 2, 10, 100, 5000] {
            assert_eq!(escape_steps(Complex::new(0.0, 0.0), *limit), 0);
        }
    }

    #[test]
    fn far_points_escape_on_the_first_step() {
        let points = [
            Complex::new(2.01, 0.0),
            Complex::new(-2.01, 0.0),
            Complex::new(0.0, 2.5),
            Complex::new(-2.0, -2.0),
            Complex::new(1.5, 1.5),
            Complex::new(100.0, -40.0),
        ];
        for c in points.iter() {
            assert_eq!(escape_steps(*c, 10), 1, "{} did not escape at once", c);
        }
    }

    #[test]
    fn known_orbits() {
        // 1 -> 2 -> 5: |z|^2 is exactly 4 after one step, which is not
        // past the threshold.
        assert_eq!(escape_steps(Complex::new(1.0, 0.0), 10), 2);
        // -2 -> 2 -> 2 -> ... sits on the threshold forever.
        assert_eq!(escape_steps(Complex::new(-2.0, 0.0), 1000), 0);
        // -1 alternates between 0 and -1.
        assert_eq!(escape_steps(Complex::new(-1.0, 0.0), 1000), 0);
        assert_eq!(escape_steps(Complex::new(-1.0, -1.0), 10), 2);
    }

    #[test]
    fn limit_bounds_the_search() {
        let c = Complex::new(0.26, 0.0);
        let steps = escape_steps(c, 10_000);
        assert!(steps > 1);
        assert_eq!(escape_steps(c, steps - 1), 0);
        assert_eq!(escape_steps(c, steps), steps);
    }

    #[test]
    fn batch_never_escaping_lanes_stay_zero() {
        let re = [0.0; LANES];
        let im = [0.0; LANES];
        let res = escape_steps_batch(&re, &im, 50);
        assert!(res.iter().all(|&r| r == 0));
    }

    #[test]
    fn batch_mixes_inside_and_outside_lanes() {
        let mut re = [0.0; LANES];
        let im = [0.0; LANES];
        for k in (0..LANES).filter(|k| k % 2 == 1) {
            re[k] = 3.0;
        }
        let res = escape_steps_batch(&re, &im, 20);
        for k in 0..LANES {
            assert_eq!(res[k], if k % 2 == 1 { 1 } else { 0 });
        }
    }

    #[test]
    fn batch_agrees_with_scalar_on_random_points() {
        let mut rng = StdRng::seed_from_u64(0x6d61_6e64);
        for _ in 0..40 {
            let mut re = [0f64; LANES];
            let mut im = [0f64; LANES];
            for k in 0..LANES {
                re[k] = rng.gen_range(-2.5, 1.5);
                im[k] = rng.gen_range(-1.5, 1.5);
            }
            let limit = rng.gen_range(1, 300);
            let res = escape_steps_batch(&re, &im, limit);
            for k in 0..LANES {
                let c = Complex::new(re[k], im[k]);
                assert_eq!(res[k], escape_steps(c, limit), "lane {} at {}", k, c);
            }
        }
    }

    #[test]
    fn batch_agrees_with_scalar_near_the_boundary() {
        // A horizontal line through the seahorse valley, where escape
        // times vary wildly from one lane to the next.
        let mut re = [0f64; LANES];
        let mut im = [0f64; LANES];
        for k in 0..LANES {
            re[k] = -0.76 + (k as f64) * 0.0005;
            im[k] = 0.1;
        }
        let res = escape_steps_batch(&re, &im, 2000);
        for k in 0..LANES {
            assert_eq!(res[k], escape_steps(Complex::new(re[k], im[k]), 2000));
        }
    }
}

// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Polynomial atan2, accurate to about 0.005 rad.
#[inline]
pub(super) fn fast_atan2(y: f32, x: f32) -> f32 {
    #[inline]
    fn fast_atan(z: f32) -> f32 {
        let abs_z = z.abs();
        if abs_z <= 1.0 {
            z * (FRAC_PI_4 + 0.273 * (1.0 - abs_z))
        } else {
            let inv = 1.0 / z;
            let base = inv * (FRAC_PI_4 + 0.273 * (1.0 - inv.abs()));
            if z > 0.0 {
                FRAC_PI_2 - base
            } else {
                -FRAC_PI_2 - base
            }
        }
    }

    if x > 0.0 {
        fast_atan(y / x)
    } else if x < 0.0 {
        if y >= 0.0 {
            fast_atan(y / x) + PI
        } else {
            fast_atan(y / x) - PI
        }
    } else if y > 0.0 {
        FRAC_PI_2
    } else if y < 0.0 {
        -FRAC_PI_2
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::fast_atan2;

    #[test]
    fn test_fast_atan2_tracks_std() {
        for i in 0..360 {
            let a = (i as f32).to_radians() - std::f32::consts::PI + 0.001;
            let (y, x) = a.sin_cos();
            let err = (fast_atan2(y, x) - y.atan2(x)).abs();
            assert!(err < 0.01, "angle {a}: error {err}");
        }
    }

    #[test]
    fn test_fast_atan2_axes() {
        assert_eq!(fast_atan2(0.0, 0.0), 0.0);
        assert_eq!(fast_atan2(1.0, 0.0), std::f32::consts::FRAC_PI_2);
        assert_eq!(fast_atan2(-1.0, 0.0), -std::f32::consts::FRAC_PI_2);
    }
}

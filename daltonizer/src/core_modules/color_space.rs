// THEORY:
// The `color_space` module holds the stateless half of the color pipeline: the
// sRGB transfer function in both directions and the fixed RGB<->LMS basis.
//
// Key principles:
// 1.  **Row vectors**: every matrix product in this crate is `vector · matrix`,
//     i.e. `out[j] = Σ_i v[i] * m[i][j]`. The literature matrices are written in
//     that orientation and must not be transposed.
// 2.  **Computed once**: the sRGB->linear table and the LMS->RGB inverse are built
//     lazily behind `OnceLock` and then only read, so every worker thread shares
//     the same values.
// 3.  **Byte-safe output**: matrix arithmetic can push a channel well outside
//     [0, 1]. `delinearize` always clamps into the byte range after truncation.

pub mod color_space {
    use std::sync::OnceLock;

    pub type Channel = u8;
    pub type Vector3 = [f64; 3];
    pub type Matrix3 = [[f64; 3]; 3];

    /// Linear RGB (0.0-1.0 per component, gamma decoded).
    pub type LinearColor = Vector3;
    /// Cone response (long, medium, short).
    pub type LmsColor = Vector3;

    pub const IDENTITY: Matrix3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

    /// Linear RGB -> LMS.
    pub const RGB_TO_LMS: Matrix3 = [
        [0.0841456, 0.708538, 0.148692],
        [-0.0767272, 0.983854, 0.0817696],
        [-0.0192357, 0.152575, 0.876454],
    ];

    // Slack added before truncation so float noise in the round trip never
    // costs a whole channel step (e.g. 254.99999999997 must land on 255).
    const TRUNCATION_TOLERANCE: f64 = 1e-9;

    static SRGB_TO_LINEAR_LUT: OnceLock<[f64; 256]> = OnceLock::new();
    static LMS_TO_RGB: OnceLock<Matrix3> = OnceLock::new();

    fn srgb_to_linear(channel: Channel) -> f64 {
        let value = channel as f64 / 255.0;
        if value <= 0.04045 {
            value / 12.92
        } else {
            ((value + 0.055) / 1.055).powf(2.4)
        }
    }

    /// sRGB byte -> linear light in [0, 1].
    #[inline]
    pub fn linearize(channel: Channel) -> f64 {
        let table = SRGB_TO_LINEAR_LUT.get_or_init(|| {
            let mut table = [0.0f64; 256];
            for (i, entry) in table.iter_mut().enumerate() {
                *entry = srgb_to_linear(i as Channel);
            }
            table
        });
        table[channel as usize]
    }

    /// Linear light -> sRGB byte. Truncates toward zero, then clamps to 0..=255.
    pub fn delinearize(value: f64) -> Channel {
        let encoded = if value <= 0.0031308 {
            value * 12.92 * 255.0
        } else {
            (value.powf(1.0 / 2.4) * 1.055 - 0.055) * 255.0
        };
        if encoded.is_nan() {
            return 0;
        }
        (encoded + TRUNCATION_TOLERANCE).trunc().clamp(0.0, 255.0) as Channel
    }

    /// Linear RGB of a pixel's three color channels.
    pub fn linearize_rgb(red: Channel, green: Channel, blue: Channel) -> LinearColor {
        [linearize(red), linearize(green), linearize(blue)]
    }

    /// LMS -> linear RGB, the exact inverse of [`RGB_TO_LMS`].
    pub fn lms_to_rgb() -> &'static Matrix3 {
        // RGB_TO_LMS is a fixed, well-conditioned matrix, so the inverse always exists.
        LMS_TO_RGB.get_or_init(|| invert(&RGB_TO_LMS).unwrap_or(IDENTITY))
    }

    /// Row vector times matrix.
    #[inline]
    pub fn multiply(vector: &Vector3, matrix: &Matrix3) -> Vector3 {
        let mut out = [0.0f64; 3];
        for (column, slot) in out.iter_mut().enumerate() {
            *slot = vector[0] * matrix[0][column]
                + vector[1] * matrix[1][column]
                + vector[2] * matrix[2][column];
        }
        out
    }

    /// Inverse of a 3x3 matrix by cofactor expansion; `None` if singular.
    pub fn invert(m: &Matrix3) -> Option<Matrix3> {
        let cofactor = |r0: usize, r1: usize, c0: usize, c1: usize| {
            m[r0][c0] * m[r1][c1] - m[r0][c1] * m[r1][c0]
        };
        let det = m[0][0] * cofactor(1, 2, 1, 2) - m[0][1] * cofactor(1, 2, 0, 2)
            + m[0][2] * cofactor(1, 2, 0, 1);
        if det.abs() < 1e-12 {
            return None;
        }
        let inv_det = 1.0 / det;
        Some([
            [
                cofactor(1, 2, 1, 2) * inv_det,
                -cofactor(0, 2, 1, 2) * inv_det,
                cofactor(0, 1, 1, 2) * inv_det,
            ],
            [
                -cofactor(1, 2, 0, 2) * inv_det,
                cofactor(0, 2, 0, 2) * inv_det,
                -cofactor(0, 1, 0, 2) * inv_det,
            ],
            [
                cofactor(1, 2, 0, 1) * inv_det,
                -cofactor(0, 2, 0, 1) * inv_det,
                cofactor(0, 1, 0, 1) * inv_det,
            ],
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::color_space::*;

    fn assert_matrix_close(a: &Matrix3, b: &Matrix3, tolerance: f64) {
        for row in 0..3 {
            for column in 0..3 {
                assert!(
                    (a[row][column] - b[row][column]).abs() < tolerance,
                    "[{row}][{column}]: {} vs {}",
                    a[row][column],
                    b[row][column]
                );
            }
        }
    }

    #[test]
    fn linearize_endpoints() {
        assert_eq!(linearize(0), 0.0);
        assert!((linearize(255) - 1.0).abs() < 1e-12);
        // 10/255 sits below the 0.04045 knee.
        assert!((linearize(10) - (10.0 / 255.0) / 12.92).abs() < 1e-15);
    }

    #[test]
    fn linearize_is_monotonic() {
        for c in 1..=255u8 {
            assert!(linearize(c) > linearize(c - 1));
        }
    }

    #[test]
    fn delinearize_inverts_linearize_for_every_byte() {
        for c in 0..=255u8 {
            assert_eq!(delinearize(linearize(c)), c, "channel {c}");
        }
    }

    #[test]
    fn delinearize_clamps_out_of_range_values() {
        assert_eq!(delinearize(-0.5), 0);
        assert_eq!(delinearize(4.0), 255);
        assert_eq!(delinearize(f64::NAN), 0);
    }

    #[test]
    fn delinearize_truncates_instead_of_rounding() {
        // 0.5 linear encodes to ~187.5; truncation keeps 187.
        assert_eq!(delinearize(0.5), 187);
    }

    #[test]
    fn lms_round_trip_is_identity() {
        let forward = RGB_TO_LMS;
        let inverse = lms_to_rgb();
        let mut product = [[0.0f64; 3]; 3];
        for (row, out) in product.iter_mut().enumerate() {
            *out = multiply(&forward[row], inverse);
        }
        assert_matrix_close(&product, &IDENTITY, 1e-12);
    }

    #[test]
    fn invert_rejects_singular_matrix() {
        let singular = [[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 0.0, 1.0]];
        assert!(invert(&singular).is_none());
    }

    #[test]
    fn multiply_uses_row_vector_convention() {
        let m = [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        assert_eq!(multiply(&[1.0, 0.0, 0.0], &m), [1.0, 2.0, 3.0]);
        assert_eq!(multiply(&[0.0, 0.0, 1.0], &m), [7.0, 8.0, 9.0]);
    }
}

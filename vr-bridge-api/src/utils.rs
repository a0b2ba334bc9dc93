// Matrices are 4x4, column-major: element (row, col) lives at `col * 4 + row`.

#[cfg(feature = "utils")]
use time::OffsetDateTime;

// Returns the current time in milliseconds
#[cfg(feature = "utils")]
pub fn timestamp() -> f64 {
    OffsetDateTime::now_utc().unix_timestamp_nanos() as f64 * 1e-6
}

pub const IDENTITY_QUAT: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

#[inline]
fn at(m: &[f32; 16], row: usize, col: usize) -> f32 {
    m[col * 4 + row]
}

/// Builds the homogeneous transform of a pose.
/// `orientation` is scalar-last (`[x, y, z, w]`) and is normalized first;
/// a zero quaternion is treated as identity.
pub fn pose_matrix(position: &[f32; 3], orientation: &[f32; 4]) -> [f32; 16] {
    let [mut x, mut y, mut z, mut w] = *orientation;
    let norm = (x * x + y * y + z * z + w * w).sqrt();
    if norm > f32::EPSILON {
        x /= norm;
        y /= norm;
        z /= norm;
        w /= norm;
    } else {
        let [ix, iy, iz, iw] = IDENTITY_QUAT;
        x = ix;
        y = iy;
        z = iz;
        w = iw;
    }

    let mut out: [f32; 16] = identity_matrix!();

    out[0] = 1.0 - 2.0 * (y * y + z * z);
    out[1] = 2.0 * (x * y + z * w);
    out[2] = 2.0 * (x * z - y * w);

    out[4] = 2.0 * (x * y - z * w);
    out[5] = 1.0 - 2.0 * (x * x + z * z);
    out[6] = 2.0 * (y * z + x * w);

    out[8] = 2.0 * (x * z + y * w);
    out[9] = 2.0 * (y * z - x * w);
    out[10] = 1.0 - 2.0 * (x * x + y * y);

    out[12] = position[0];
    out[13] = position[1];
    out[14] = position[2];

    out
}

// Multiply 4x4 matrices, out = a * b
pub fn multiply_matrix(a: &[f32; 16], b: &[f32; 16], out: &mut [f32; 16]) {
    let mut tmp = [0f32; 16];
    for col in 0..4 {
        for row in 0..4 {
            tmp[col * 4 + row] = (0..4).map(|k| at(a, row, k) * at(b, k, col)).sum();
        }
    }
    *out = tmp;
}

/// Row-major copy of a matrix, the layout consumers index as `m[row][col]`.
pub fn matrix_rows(m: &[f32; 16]) -> [[f32; 4]; 4] {
    let mut rows = [[0f32; 4]; 4];
    for (row, values) in rows.iter_mut().enumerate() {
        for (col, value) in values.iter_mut().enumerate() {
            *value = at(m, row, col);
        }
    }
    rows
}

// Adapted from http://www.euclideanspace.com/maths/geometry/rotations/conversions/matrixToQuaternion/index.htm
#[inline]
pub fn matrix_to_quat(m: &[f32; 16]) -> [f32; 4] {
    let (m00, m11, m22) = (at(m, 0, 0), at(m, 1, 1), at(m, 2, 2));
    let w = f32::max(0.0, 1.0 + m00 + m11 + m22).sqrt() * 0.5;
    let mut x = f32::max(0.0, 1.0 + m00 - m11 - m22).sqrt() * 0.5;
    let mut y = f32::max(0.0, 1.0 - m00 + m11 - m22).sqrt() * 0.5;
    let mut z = f32::max(0.0, 1.0 - m00 - m11 + m22).sqrt() * 0.5;

    x = copysign(x, at(m, 2, 1) - at(m, 1, 2));
    y = copysign(y, at(m, 0, 2) - at(m, 2, 0));
    z = copysign(z, at(m, 1, 0) - at(m, 0, 1));

    [x, y, z, w]
}

#[inline]
pub fn copysign(a: f32, b: f32) -> f32 {
    if b == 0.0 {
        0.0
    } else {
        a.abs() * b.signum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn assert_close(a: &[f32], b: &[f32]) {
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < EPS, "{:?} != {:?}", a, b);
        }
    }

    fn transform_dir(m: &[f32; 16], v: [f32; 3]) -> [f32; 3] {
        let mut out = [0f32; 3];
        for (row, value) in out.iter_mut().enumerate() {
            *value = (0..3).map(|k| at(m, row, k) * v[k]).sum();
        }
        out
    }

    #[test]
    fn identity_orientation_is_pure_translation() {
        let m = pose_matrix(&[1.0, 2.0, 3.0], &IDENTITY_QUAT);
        let rows = matrix_rows(&m);
        assert_close(&rows[0], &[1.0, 0.0, 0.0, 1.0]);
        assert_close(&rows[1], &[0.0, 1.0, 0.0, 2.0]);
        assert_close(&rows[2], &[0.0, 0.0, 1.0, 3.0]);
        assert_close(&rows[3], &[0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn quarter_turn_about_y_maps_x_to_minus_z() {
        let half = std::f32::consts::FRAC_PI_4;
        let m = pose_matrix(&[0.0; 3], &[0.0, half.sin(), 0.0, half.cos()]);
        assert_close(&transform_dir(&m, [1.0, 0.0, 0.0]), &[0.0, 0.0, -1.0]);
        assert_close(&transform_dir(&m, [0.0, 0.0, 1.0]), &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn unnormalized_and_zero_quaternions() {
        let scaled = pose_matrix(&[0.0; 3], &[0.0, 0.0, 0.0, 4.0]);
        let zero = pose_matrix(&[0.0; 3], &[0.0; 4]);
        let identity: [f32; 16] = identity_matrix!();
        assert_close(&scaled, &identity);
        assert_close(&zero, &identity);
    }

    #[test]
    fn rotation_part_is_orthonormal() {
        let q = [0.2, -0.4, 0.1, 0.88];
        let m = pose_matrix(&[0.0; 3], &q);
        let mut transposed = m;
        for row in 0..4 {
            for col in 0..4 {
                transposed[col * 4 + row] = at(&m, col, row);
            }
        }
        let mut product = [0f32; 16];
        multiply_matrix(&m, &transposed, &mut product);
        let identity: [f32; 16] = identity_matrix!();
        assert_close(&product, &identity);
    }

    #[test]
    fn matrix_to_quat_recovers_orientation() {
        let norm = (0.2f32 * 0.2 + 0.4 * 0.4 + 0.1 * 0.1 + 0.88 * 0.88).sqrt();
        let q = [0.2 / norm, -0.4 / norm, 0.1 / norm, 0.88 / norm];
        let back = matrix_to_quat(&pose_matrix(&[5.0, 0.0, 0.0], &q));
        let sign = if back[3] * q[3] < 0.0 { -1.0 } else { 1.0 };
        let back: Vec<f32> = back.iter().map(|v| v * sign).collect();
        assert_close(&back, &q);
    }

    #[test]
    fn multiply_composes_translations() {
        let a = pose_matrix(&[1.0, 0.0, 0.0], &IDENTITY_QUAT);
        let b = pose_matrix(&[0.0, 2.0, 0.0], &IDENTITY_QUAT);
        let mut out = [0f32; 16];
        multiply_matrix(&a, &b, &mut out);
        assert_close(&matrix_rows(&out)[0], &[1.0, 0.0, 0.0, 1.0]);
        assert_close(&matrix_rows(&out)[1], &[0.0, 1.0, 0.0, 2.0]);
    }
}

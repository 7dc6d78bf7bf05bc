//! Euler angle <-> quaternion conversion for the node `Rotation` alias.
//!
//! Angles are in degrees, applied X first, then Y, then Z (q = qz * qy * qx).
//! Quaternions are stored (x, y, z, w).

#[inline]
fn normalize4(mut q: [f32; 4]) -> [f32; 4] {
    let len2 = q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3];
    if len2 > 0.0 {
        let inv_len = len2.sqrt().recip();
        q[0] *= inv_len;
        q[1] *= inv_len;
        q[2] *= inv_len;
        q[3] *= inv_len;
    } else {
        q = [0.0, 0.0, 0.0, 1.0];
    }
    q
}

pub fn quat_from_euler_deg(euler: [f32; 3]) -> [f32; 4] {
    let (sr, cr) = (euler[0].to_radians() * 0.5).sin_cos();
    let (sp, cp) = (euler[1].to_radians() * 0.5).sin_cos();
    let (sy, cy) = (euler[2].to_radians() * 0.5).sin_cos();
    normalize4([
        sr * cp * cy - cr * sp * sy,
        cr * sp * cy + sr * cp * sy,
        cr * cp * sy - sr * sp * cy,
        cr * cp * cy + sr * sp * sy,
    ])
}

pub fn euler_deg_from_quat(q: [f32; 4]) -> [f32; 3] {
    let [x, y, z, w] = normalize4(q);

    let roll = (2.0 * (w * x + y * z)).atan2(1.0 - 2.0 * (x * x + y * y));
    let sinp = 2.0 * (w * y - z * x);
    let pitch = if sinp.abs() >= 1.0 {
        std::f32::consts::FRAC_PI_2.copysign(sinp)
    } else {
        sinp.asin()
    };
    let yaw = (2.0 * (w * z + x * y)).atan2(1.0 - 2.0 * (y * y + z * z));

    [roll.to_degrees(), pitch.to_degrees(), yaw.to_degrees()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx3(a: [f32; 3], b: [f32; 3]) {
        for i in 0..3 {
            assert!((a[i] - b[i]).abs() < 1e-3, "left={a:?} right={b:?}");
        }
    }

    #[test]
    fn identity() {
        let q = quat_from_euler_deg([0.0, 0.0, 0.0]);
        assert!((q[3] - 1.0).abs() < 1e-6);
        approx3(euler_deg_from_quat(q), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn round_trip_away_from_gimbal_lock() {
        let e = [30.0, -45.0, 120.0];
        approx3(euler_deg_from_quat(quat_from_euler_deg(e)), e);
    }

    #[test]
    fn single_axis_yaw() {
        let q = quat_from_euler_deg([0.0, 0.0, 90.0]);
        let h = std::f32::consts::FRAC_1_SQRT_2;
        assert!((q[2] - h).abs() < 1e-5 && (q[3] - h).abs() < 1e-5);
    }
}

//! Integration of relative motion into an absolute position and orientation.

use std::ops::Mul;

use serde::{Deserialize, Serialize};
use spnav_protocol::Event;

/// Device units to scene units (and radians) per motion sample.
pub const MOTION_SCALE: f32 = 0.001;

/// Row-major 4x4 matrix in the layout OpenGL expects: translation lives in
/// elements 12..15.
pub type Mat4 = [f32; 16];

pub const IDENTITY: Mat4 = [
	1.0, 0.0, 0.0, 0.0, //
	0.0, 1.0, 0.0, 0.0, //
	0.0, 0.0, 1.0, 0.0, //
	0.0, 0.0, 0.0, 1.0,
];

/// Quaternion with the imaginary part first and the real part last.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
	pub x: f32,
	pub y: f32,
	pub z: f32,
	pub w: f32,
}

impl Default for Quat {
	fn default() -> Self {
		Self::IDENTITY
	}
}

impl Quat {
	pub const IDENTITY: Self = Self {
		x: 0.0,
		y: 0.0,
		z: 0.0,
		w: 1.0,
	};

	pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
		Self { x, y, z, w }
	}

	/// Rotation of `angle` radians about the unit vector `axis`.
	pub fn from_axis_angle(axis: [f32; 3], angle: f32) -> Self {
		let half = angle * 0.5;
		let sin_half = half.sin();
		Self {
			x: axis[0] * sin_half,
			y: axis[1] * sin_half,
			z: axis[2] * sin_half,
			w: half.cos(),
		}
	}

	/// Pure quaternion holding a vector.
	pub fn from_vec(v: [f32; 3]) -> Self {
		Self {
			x: v[0],
			y: v[1],
			z: v[2],
			w: 0.0,
		}
	}

	pub fn vector(self) -> [f32; 3] {
		[self.x, self.y, self.z]
	}

	pub fn length_sq(self) -> f32 {
		self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w
	}

	pub fn length(self) -> f32 {
		self.length_sq().sqrt()
	}

	pub fn conjugate(self) -> Self {
		Self {
			x: -self.x,
			y: -self.y,
			z: -self.z,
			w: self.w,
		}
	}

	/// Conjugate over squared length. A zero quaternion only gets conjugated.
	pub fn inverse(self) -> Self {
		let len_sq = self.length_sq();
		let conj = self.conjugate();
		if len_sq == 0.0 {
			return conj;
		}
		let s = 1.0 / len_sq;
		Self {
			x: conj.x * s,
			y: conj.y * s,
			z: conj.z * s,
			w: conj.w * s,
		}
	}

	/// Composes a rotation of `angle` radians about `axis` after `self`.
	pub fn rotate(self, axis: [f32; 3], angle: f32) -> Self {
		self * Self::from_axis_angle(axis, angle)
	}

	/// Rotates `v` by this quaternion: `q v q⁻¹`.
	pub fn rotate_vec(self, v: [f32; 3]) -> [f32; 3] {
		(self * Self::from_vec(v) * self.inverse()).vector()
	}

	/// Rotation matrix of a unit quaternion.
	pub fn to_matrix(self) -> Mat4 {
		let Self { x, y, z, w } = self;
		let (xx, yy, zz) = (x * x, y * y, z * z);
		let (xy, yz, zx) = (x * y, y * z, z * x);
		let (wx, wy, wz) = (w * x, w * y, w * z);
		[
			1.0 - 2.0 * yy - 2.0 * zz,
			2.0 * xy + 2.0 * wz,
			2.0 * zx - 2.0 * wy,
			0.0,
			2.0 * xy - 2.0 * wz,
			1.0 - 2.0 * xx - 2.0 * zz,
			2.0 * yz + 2.0 * wx,
			0.0,
			2.0 * zx + 2.0 * wy,
			2.0 * yz - 2.0 * wx,
			1.0 - 2.0 * xx - 2.0 * yy,
			0.0,
			0.0,
			0.0,
			0.0,
			1.0,
		]
	}
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
	[
		a[1] * b[2] - a[2] * b[1],
		a[2] * b[0] - a[0] * b[2],
		a[0] * b[1] - a[1] * b[0],
	]
}

/// `a * b` applies `a` first, then `b`.
impl Mul for Quat {
	type Output = Quat;

	fn mul(self, rhs: Quat) -> Quat {
		let dot = self.x * rhs.x + self.y * rhs.y + self.z * rhs.z;
		let c = cross(rhs.vector(), self.vector());
		Quat {
			x: self.w * rhs.x + rhs.w * self.x + c[0],
			y: self.w * rhs.y + rhs.w * self.y + c[1],
			z: self.w * rhs.z + rhs.w * self.z + c[2],
			w: self.w * rhs.w - dot,
		}
	}
}

/// `a * b` for row-major matrices.
pub fn mat4_mul(a: &Mat4, b: &Mat4) -> Mat4 {
	let mut out = [0.0; 16];
	for i in 0..4 {
		for j in 0..4 {
			out[i * 4 + j] = a[i * 4] * b[j]
				+ a[i * 4 + 1] * b[4 + j]
				+ a[i * 4 + 2] * b[8 + j]
				+ a[i * 4 + 3] * b[12 + j];
		}
	}
	out
}

pub fn mat4_translation(v: [f32; 3]) -> Mat4 {
	let mut m = IDENTITY;
	m[12] = v[0];
	m[13] = v[1];
	m[14] = v[2];
	m
}

/// Accumulated position and orientation. Owned by the application; the
/// client never reads or writes it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
	pub pos: [f32; 3],
	pub rot: Quat,
}

/// Rotation axis and magnitude, `None` for a zero vector.
fn rotation_axis(r: [i32; 3]) -> Option<([f32; 3], f32)> {
	let r = r.map(|v| v as f32);
	let len = (r[0] * r[0] + r[1] * r[1] + r[2] * r[2]).sqrt();
	(len != 0.0).then(|| ([r[0] / len, r[1] / len, r[2] / len], len))
}

impl Pose {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn reset(&mut self) {
		*self = Self::default();
	}

	/// Integrates motion in the object's frame: translation is applied in
	/// world space, rotation about the device axes.
	pub fn move_obj(&mut self, motion: [i32; 6]) {
		let [x, y, z, rx, ry, rz] = motion;
		self.pos[0] += x as f32 * MOTION_SCALE;
		self.pos[1] += y as f32 * MOTION_SCALE;
		self.pos[2] -= z as f32 * MOTION_SCALE;

		if let Some((axis, len)) = rotation_axis([rx, ry, rz]) {
			let axis = [axis[0], axis[1], -axis[2]];
			self.rot = self.rot.rotate(axis, len * MOTION_SCALE);
		}
	}

	/// Integrates motion for a fly-through camera: translation follows the
	/// camera's current facing.
	pub fn move_view(&mut self, motion: [i32; 6]) {
		let [x, y, z, rx, ry, rz] = motion;
		if let Some((axis, len)) = rotation_axis([rx, ry, rz]) {
			let axis = [-axis[0], -axis[1], axis[2]];
			self.rot = self.rot.rotate(axis, len * MOTION_SCALE);
		}

		let local = [
			-(x as f32) * MOTION_SCALE,
			-(y as f32) * MOTION_SCALE,
			z as f32 * MOTION_SCALE,
		];
		let delta = self.rot.rotate_vec(local);
		for (p, d) in self.pos.iter_mut().zip(delta) {
			*p += d;
		}
	}

	/// [`move_obj`](Self::move_obj) for an event; non-motion events are ignored.
	pub fn apply_obj(&mut self, event: &Event) {
		if let Some(motion) = event.motion_axes() {
			self.move_obj(motion);
		}
	}

	pub fn apply_view(&mut self, event: &Event) {
		if let Some(motion) = event.motion_axes() {
			self.move_view(motion);
		}
	}

	/// Model matrix: rotate, then place.
	pub fn matrix_obj(&self) -> Mat4 {
		mat4_mul(&self.rot.to_matrix(), &mat4_translation(self.pos))
	}

	/// View matrix: place, then orient.
	pub fn matrix_view(&self) -> Mat4 {
		mat4_mul(&mat4_translation(self.pos), &self.rot.to_matrix())
	}
}

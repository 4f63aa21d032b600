use super::*;

use crate::{Pose, Quat};

// ============================================================================
// POSITION / ORIENTATION HELPERS
// ============================================================================

/// `struct spnav_posrot`: position, then orientation as `x y z w`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SpnavPosrot {
	pub pos: [f32; 3],
	pub rot: [f32; 4],
}

impl From<&SpnavPosrot> for Pose {
	fn from(pr: &SpnavPosrot) -> Self {
		let [x, y, z, w] = pr.rot;
		Pose {
			pos: pr.pos,
			rot: Quat::new(x, y, z, w),
		}
	}
}

impl From<Pose> for SpnavPosrot {
	fn from(pose: Pose) -> Self {
		Self {
			pos: pose.pos,
			rot: [pose.rot.x, pose.rot.y, pose.rot.z, pose.rot.w],
		}
	}
}

unsafe fn update(
	pr: *mut SpnavPosrot,
	ev: *const SpnavEventMotion,
	apply: impl FnOnce(&mut Pose, [i32; 6]),
) {
	let (Some(pr), Some(ev)) = (unsafe { pr.as_mut() }, unsafe { ev.as_ref() }) else {
		return;
	};
	let mut pose = Pose::from(&*pr);
	apply(&mut pose, ev.axes());
	*pr = pose.into();
}

unsafe fn write_matrix(mat: *mut f32, pr: *const SpnavPosrot, build: impl FnOnce(&Pose) -> crate::Mat4) {
	let Some(pr) = (unsafe { pr.as_ref() }) else {
		return;
	};
	if mat.is_null() {
		return;
	}
	let m = build(&Pose::from(pr));
	unsafe { mat.cast::<crate::Mat4>().write_unaligned(m) };
}

/// Reset to the origin with no rotation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_posrot_init(pr: *mut SpnavPosrot) {
	if let Some(pr) = unsafe { pr.as_mut() } {
		*pr = Pose::new().into();
	}
}

/// Accumulate motion for an object held in the hand.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_posrot_moveobj(pr: *mut SpnavPosrot, ev: *const SpnavEventMotion) {
	unsafe { update(pr, ev, Pose::move_obj) }
}

/// Accumulate motion for a camera flying through the scene.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_posrot_moveview(pr: *mut SpnavPosrot, ev: *const SpnavEventMotion) {
	unsafe { update(pr, ev, Pose::move_view) }
}

/// Write the object transform as 16 floats, OpenGL order.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_matrix_obj(mat: *mut f32, pr: *const SpnavPosrot) {
	unsafe { write_matrix(mat, pr, Pose::matrix_obj) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_matrix_view(mat: *mut f32, pr: *const SpnavPosrot) {
	unsafe { write_matrix(mat, pr, Pose::matrix_view) }
}

//! Accumulates device motion into an object pose and a camera pose and prints
//! both after every motion event.

use std::error::Error;

use spnav_client::{Event, EventFilter, EventKind, Pose, SpnavClient};

fn main() -> Result<(), Box<dyn Error>> {
	let _ = tracing_subscriber::fmt::try_init();

	let mut client = SpnavClient::new();
	client.open()?;
	client.client_name("posrot example").ok();

	let mut object = Pose::new();
	let mut camera = Pose::new();

	loop {
		let event = client.wait_event()?;
		match event {
			Event::Motion { .. } => {
				object.apply_obj(&event);
				camera.apply_view(&event);
				println!("object {}", serde_json::to_string(&object)?);
				println!("camera {}", serde_json::to_string(&camera)?);
				print_matrix(&camera.matrix_view());
			}
			// Any button recenters and drops the motion that piled up meanwhile.
			Event::Button { press: true, .. } => {
				object.reset();
				camera.reset();
				let dropped = client.remove_events(EventFilter::Kind(EventKind::Motion))?;
				println!("reset, dropped {dropped} queued motion events");
			}
			_ => {}
		}
	}
}

fn print_matrix(m: &[f32; 16]) {
	for row in m.chunks_exact(4) {
		println!("  {:8.3} {:8.3} {:8.3} {:8.3}", row[0], row[1], row[2], row[3]);
	}
}

use std::{env, error::Error};

use spnav_client::{Event, EventMask, SpnavClient, SpnavConfig, SpnavError};

fn main() -> Result<(), Box<dyn Error>> {
	let _ = tracing_subscriber::fmt::try_init();

	let mut config = SpnavConfig::from_env();
	if let Some(path) = env::args().nth(1) {
		config = config.set_socket_path(path);
	}

	let mut client = SpnavClient::new();
	client.open_with(&config)?;
	print_dev_info(&mut client)?;

	loop {
		if !wait_readable(&client)? {
			continue;
		}
		while let Some(event) = client.poll_event()? {
			match event {
				Event::Motion {
					x, y, z, rx, ry, rz, ..
				} => println!("got motion event: t({x}, {y}, {z}) r({rx}, {ry}, {rz})"),
				Event::Button { press, bnum } => println!(
					"got button {} event b({bnum})",
					if press { "press" } else { "release" }
				),
				Event::Device { op, id, devtype, .. } => {
					println!("device {id} {op:?} (type {devtype:#x})")
				}
				other => println!("{other:?}"),
			}
		}
	}
}

fn print_dev_info(client: &mut SpnavClient) -> Result<(), SpnavError> {
	let proto = client.protocol()?;
	println!("spacenav AF_UNIX protocol version: {proto}");
	if proto < 1 {
		println!();
		return Ok(());
	}

	client.client_name("simple example")?;
	client.evmask(EventMask::DEFAULT)?;
	println!("Device: {}", client.dev_name()?);
	println!("Path: {}", client.dev_path()?);
	println!("Type: {}", client.dev_type()?);
	println!("Buttons: {}", client.dev_buttons());
	println!("Axes: {}", client.dev_axes());
	println!();
	Ok(())
}

/// Blocks on the client descriptor the way an application main loop would.
fn wait_readable(client: &SpnavClient) -> Result<bool, SpnavError> {
	let mut pfd = libc::pollfd {
		fd: client.fd()?,
		events: libc::POLLIN,
		revents: 0,
	};
	let ready = unsafe { libc::poll(&mut pfd, 1, -1) };
	if ready < 0 {
		let err = std::io::Error::last_os_error();
		if err.kind() == std::io::ErrorKind::Interrupted {
			return Ok(false);
		}
		return Err(SpnavError::Io(err));
	}
	Ok(pfd.revents & libc::POLLIN != 0)
}

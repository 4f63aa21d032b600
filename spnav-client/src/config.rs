use std::path::{Path, PathBuf};
use std::time::Duration;

use spnav_protocol::{DEFAULT_CONFIG_FILE, DEFAULT_SOCKET_PATH, SOCKET_ENV_VAR};

/// Connection settings for the socket transport.
#[derive(Debug, Clone)]
pub struct SpnavConfig {
	socket_path: Option<PathBuf>,
	config_file: Option<PathBuf>,
	request_timeout: Duration,
	handshake_timeout: Duration,
}

impl Default for SpnavConfig {
	fn default() -> Self {
		Self {
			socket_path: None,
			config_file: Some(PathBuf::from(DEFAULT_CONFIG_FILE)),
			request_timeout: Self::REQUEST_TIMEOUT,
			handshake_timeout: Self::HANDSHAKE_TIMEOUT,
		}
	}
}

impl SpnavConfig {
	pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(400);
	pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(300);

	/// Defaults plus the `SPNAV_SOCKET` override, if set.
	pub fn from_env() -> Self {
		let mut config = Self::default();
		config.socket_path = std::env::var_os(SOCKET_ENV_VAR).map(PathBuf::from);
		config
	}

	pub fn set_socket_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.socket_path = Some(path.into());
		self
	}

	pub fn set_config_file(mut self, path: impl Into<PathBuf>) -> Self {
		self.config_file = Some(path.into());
		self
	}

	/// Skip the system config file when resolving the socket path.
	pub fn without_config_file(mut self) -> Self {
		self.config_file = None;
		self
	}

	pub fn set_request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;
		self
	}

	pub fn set_handshake_timeout(mut self, timeout: Duration) -> Self {
		self.handshake_timeout = timeout;
		self
	}

	pub fn socket_path_ref(&self) -> Option<&Path> {
		self.socket_path.as_deref()
	}

	pub fn request_timeout(&self) -> Duration {
		self.request_timeout
	}

	pub fn handshake_timeout(&self) -> Duration {
		self.handshake_timeout
	}

	/// Socket paths to try, most specific first: the explicit override, the
	/// `socket` key of the config file, then the compiled-in default.
	pub fn socket_candidates(&self) -> Vec<PathBuf> {
		let mut candidates = Vec::with_capacity(3);
		if let Some(path) = &self.socket_path {
			candidates.push(path.clone());
		}
		if let Some(file) = &self.config_file {
			match std::fs::read_to_string(file) {
				Ok(contents) => {
					if let Some(path) = parse_socket_path(&contents) {
						candidates.push(path);
					}
				}
				Err(err) => {
					tracing::trace!(file = %file.display(), %err, "config file not readable");
				}
			}
		}
		let default = PathBuf::from(DEFAULT_SOCKET_PATH);
		if !candidates.contains(&default) {
			candidates.push(default);
		}
		candidates
	}
}

/// Finds `socket = <path>` in spnavrc-style contents.
pub fn parse_socket_path(contents: &str) -> Option<PathBuf> {
	contents.lines().find_map(|line| {
		let line = line.trim_start();
		if line.is_empty() || line.starts_with('#') || !line.starts_with("socket") {
			return None;
		}
		let (_, value) = line.split_once('=')?;
		let value = value.trim();
		(!value.is_empty()).then(|| PathBuf::from(value))
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn parser_skips_comments_and_blank_lines() {
		let contents = "\n# socket = /wrong\n   \n\tsocket =   /run/custom.sock  \nsocket = /second\n";
		assert_eq!(
			parse_socket_path(contents),
			Some(PathBuf::from("/run/custom.sock"))
		);
	}

	#[test]
	fn parser_ignores_other_keys_and_empty_values() {
		assert_eq!(parse_socket_path("sensitivity = 2.0\nsocket =\n"), None);
		assert_eq!(parse_socket_path("socket /no/equals\n"), None);
	}

	#[test]
	fn candidates_follow_priority_order() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "socket = /tmp/from-file.sock").unwrap();
		let config = SpnavConfig::default()
			.set_socket_path("/tmp/override.sock")
			.set_config_file(file.path());
		assert_eq!(
			config.socket_candidates(),
			vec![
				PathBuf::from("/tmp/override.sock"),
				PathBuf::from("/tmp/from-file.sock"),
				PathBuf::from(DEFAULT_SOCKET_PATH),
			]
		);
	}

	#[test]
	fn missing_config_file_falls_back_to_default() {
		let dir = tempfile::tempdir().unwrap();
		let config = SpnavConfig::default().set_config_file(dir.path().join("absent"));
		assert_eq!(
			config.socket_candidates(),
			vec![PathBuf::from(DEFAULT_SOCKET_PATH)]
		);
	}

	#[test]
	fn default_timeouts() {
		let config = SpnavConfig::default();
		assert_eq!(config.request_timeout(), Duration::from_millis(400));
		assert_eq!(config.handshake_timeout(), Duration::from_millis(300));
	}
}

use crate::{ApplyResult, Backdrop, Error};
use std::fmt;

/// How a status should be presented.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Severity {
	Success,
	Warning,
	Error,
}

/// A user-facing description of the outcome of an apply request.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Status {
	severity: Severity,
	message: String,
}
impl Status {
	/// The status for systems without backdrop support.
	pub fn not_supported() -> Self {
		Self {
			severity: Severity::Error,
			message: "Mica effects not supported on this system".to_string(),
		}
	}

	/// The status for a request that returned the given code.
	pub fn from_code(kind: Backdrop, result: ApplyResult) -> Self {
		if result.is_success() {
			Self {
				severity: Severity::Success,
				message: format!("Successfully applied {}", kind),
			}
		} else {
			Self {
				severity: Severity::Warning,
				message: format!("Effect applied with code {}", result),
			}
		}
	}

	/// The status for a request with the given outcome.
	pub fn from_outcome(kind: Backdrop, outcome: &Result<(), Error>) -> Self {
		match outcome {
			Err(Error::NotSupported) => Self::not_supported(),
			Err(Error::InvalidHandle) => Self {
				severity: Severity::Error,
				message: format!("Error - {}", Error::InvalidHandle),
			},
			_ => Self::from_code(kind, ApplyResult::from(outcome))
		}
	}

	pub fn severity(&self) -> Severity {
		self.severity
	}

	pub fn message(&self) -> &str {
		&self.message
	}
}
impl fmt::Display for Status {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(&self.message)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn success_names_the_effect() {
		let status = Status::from_outcome(Backdrop::MicaAlt, &Ok(()));
		assert_eq!(status.severity(), Severity::Success);
		assert_eq!(status.to_string(), "Successfully applied MICA_ALT");
	}

	#[test]
	fn native_failures_are_warnings_with_the_code() {
		let outcome = Err(Error::NativeCall {
			call: "DwmSetWindowAttribute",
			code: -2147024809,
			message: "The parameter is incorrect.".into(),
		});
		let status = Status::from_outcome(Backdrop::Mica, &outcome);

		assert_eq!(status.severity(), Severity::Warning);
		assert_eq!(status.message(), "Effect applied with code -2147024809");
	}

	#[test]
	fn unsupported_systems_are_errors() {
		let status = Status::from_outcome(Backdrop::Auto, &Err(Error::NotSupported));
		assert_eq!(status, Status::not_supported());
		assert_eq!(status.severity(), Severity::Error);
	}

	#[test]
	fn invalid_handles_are_errors() {
		let status = Status::from_outcome(Backdrop::Mica, &Err(Error::InvalidHandle));
		assert_eq!(status.severity(), Severity::Error);
		assert!(status.message().starts_with("Error - "));
	}
}

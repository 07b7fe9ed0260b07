/// Platform-specific code for handling windows.
mod platform;
pub use platform::{Native, Platform};

/// Public interface for applying backdrop effects to windows.
mod backdrop;
pub use backdrop::*;

/// Build number gating and system capability snapshots.
mod system;
pub use system::*;

/// User-facing status messages for apply outcomes.
mod status;
pub use status::*;

/// Result code returned when backdrop effects are unavailable (`E_NOTIMPL`).
pub const CODE_NOT_SUPPORTED: i32 = 0x8000_4001_u32 as i32;

/// Result code returned for handles that are not native windows (`E_HANDLE`).
pub const CODE_INVALID_HANDLE: i32 = 0x8007_0006_u32 as i32;

/// Errors types that may be triggered from winmica functions.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum Error {
	/// This error indicates that the current system does not support backdrop
	/// effects, either because its build is too old or because the build
	/// number could not be determined at all.
	#[error("backdrop effects are not supported on this system")]
	NotSupported,
	/// This error indicates that the given handle does not refer to a native
	/// window that the compositor could attach an effect to.
	#[error("handle does not refer to a native window")]
	InvalidHandle,
	/// This error indicates that, while backdrop effects are supported, the
	/// native call responsible for enabling them has failed.
	#[error("call to \"{call}\" failed: {message}")]
	NativeCall {
		/// The name of the native function that failed.
		call: &'static str,
		/// The status code reported by the native function.
		code: i32,
		/// A description of the failure.
		message: String,
	},
}
impl Error {
	/// The status code equivalent of this error, as reported by [`apply_mica`].
	pub fn code(&self) -> i32 {
		match self {
			Error::NotSupported => CODE_NOT_SUPPORTED,
			Error::InvalidHandle => CODE_INVALID_HANDLE,
			Error::NativeCall { code, .. } => *code,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn every_error_maps_to_a_failure_code() {
		let native = Error::NativeCall {
			call: "DwmSetWindowAttribute",
			code: 0x8007_0057_u32 as i32,
			message: "The parameter is incorrect.".into(),
		};

		assert_ne!(Error::NotSupported.code(), 0);
		assert_ne!(Error::InvalidHandle.code(), 0);
		assert_eq!(native.code(), 0x8007_0057_u32 as i32);
	}

	#[test]
	fn native_call_message_names_the_call() {
		let error = Error::NativeCall {
			call: "DwmSetWindowAttribute",
			code: -1,
			message: "boom".into(),
		};
		assert_eq!(
			error.to_string(),
			"call to \"DwmSetWindowAttribute\" failed: boom");
	}
}

use crate::{Backdrop, BackdropMethod, Error, WindowHandle};

#[cfg(windows)]
pub mod windows;

/// The native services backdrop effects are built on.
///
/// Implementations answer questions about the running system and carry out
/// requests without judging them: deciding whether a request should be made
/// at all is up to the [`Compositor`](crate::Compositor).
pub trait Platform {
	/// The build number of the operating system, if it can be determined.
	fn build_number(&self) -> Option<u32>;

	/// Whether applications are currently asked to use a dark theme.
	fn is_dark_mode(&self) -> bool;

	/// Applies the given effect to the window through the given method.
	///
	/// `dark` tells whether the effect should be tinted for a dark theme.
	fn set_backdrop(
		&self,
		window: WindowHandle,
		method: BackdropMethod,
		kind: Backdrop,
		dark: bool) -> Result<(), Error>;
}

/// The platform of the running system.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Native;
impl Platform for Native {
	fn build_number(&self) -> Option<u32> {
		#[cfg(windows)]
		return windows::build_number();

		#[cfg(not(windows))]
		None
	}

	fn is_dark_mode(&self) -> bool {
		#[cfg(windows)]
		return windows::is_dark_mode();

		#[cfg(not(windows))]
		false
	}

	fn set_backdrop(
		&self,
		window: WindowHandle,
		method: BackdropMethod,
		kind: Backdrop,
		dark: bool) -> Result<(), Error> {

		#[cfg(windows)]
		return unsafe {
			windows::set_backdrop(window.as_raw() as _, method, kind, dark)
				.map_err(Error::from)
		};

		#[cfg(not(windows))]
		{
			let _ = (window, method, kind, dark);
			Err(Error::NotSupported)
		}
	}
}

#[cfg(windows)]
impl From<windows::Error> for Error {
	fn from(what: windows::Error) -> Self {
		match &what {
			windows::Error::BackdropNotSupported => Error::NotSupported,
			windows::Error::FailedInvocation { call, error, .. } => Error::NativeCall {
				call: *call,
				code: error.code(),
				message: what.to_string(),
			},
			windows::Error::MissingFunctionality { name, error } => Error::NativeCall {
				call: *name,
				code: error.code(),
				message: what.to_string(),
			},
		}
	}
}


#[cfg(test)]
pub(crate) mod mock {
	use super::*;
	use std::cell::RefCell;

	/// A request received by a [`MockPlatform`].
	#[derive(Debug, Copy, Clone, Eq, PartialEq)]
	pub struct Call {
		pub window: WindowHandle,
		pub method: BackdropMethod,
		pub kind: Backdrop,
		pub dark: bool,
	}

	/// A platform with a fixed build and theme that records every request.
	#[derive(Debug, Default)]
	pub struct MockPlatform {
		build: Option<u32>,
		dark: bool,
		failure: Option<i32>,
		calls: RefCell<Vec<Call>>,
	}
	impl MockPlatform {
		pub fn new(build: Option<u32>) -> Self {
			Self { build, ..Default::default() }
		}

		pub fn with_dark_mode(mut self, dark: bool) -> Self {
			self.dark = dark;
			self
		}

		/// Makes every request fail with the given code.
		pub fn failing_with(mut self, code: i32) -> Self {
			self.failure = Some(code);
			self
		}

		pub fn calls(&self) -> Vec<Call> {
			self.calls.borrow().clone()
		}
	}
	impl Platform for MockPlatform {
		fn build_number(&self) -> Option<u32> {
			self.build
		}

		fn is_dark_mode(&self) -> bool {
			self.dark
		}

		fn set_backdrop(
			&self,
			window: WindowHandle,
			method: BackdropMethod,
			kind: Backdrop,
			dark: bool) -> Result<(), Error> {

			self.calls.borrow_mut().push(Call { window, method, kind, dark });
			match self.failure {
				Some(code) => Err(Error::NativeCall {
					call: "DwmSetWindowAttribute",
					code,
					message: format!("mock failure {:#x}", code),
				}),
				None => Ok(())
			}
		}
	}
}

use raw_window_handle::{HasRawWindowHandle, RawWindowHandle, Win32Handle};
use crate::platform::{Native, Platform};
use crate::{BackdropMethod, BuildThresholds, Error, Status, SystemCapabilities};
use std::fmt;

/// The backdrop effects the compositor can draw behind a window.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Backdrop {
	/// No backdrop. The window background is drawn as-is.
	Disabled,
	/// The standard Mica material, tinted by the desktop wallpaper.
	Mica,
	/// The more strongly tinted Mica variant used behind tabbed windows.
	MicaAlt,
	/// Let the compositor pick the material for the window.
	Auto,
}
impl Backdrop {
	/// The effects a user may choose from.
	pub const EFFECTS: [Backdrop; 3] = [
		Backdrop::Mica,
		Backdrop::MicaAlt,
		Backdrop::Auto,
	];

	/// The canonical name of this effect.
	pub fn name(self) -> &'static str {
		match self {
			Backdrop::Disabled => "DISABLED",
			Backdrop::Mica => "MICA",
			Backdrop::MicaAlt => "MICA_ALT",
			Backdrop::Auto => "AUTO",
		}
	}

	/// Whether this effect draws anything at all.
	pub fn is_enabled(self) -> bool {
		self != Backdrop::Disabled
	}
}
impl fmt::Display for Backdrop {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// The native handle of a window, borrowed for the duration of one call.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct WindowHandle(isize);
impl WindowHandle {
	/// Wraps a raw `HWND` value.
	pub fn from_raw(hwnd: isize) -> Self {
		Self(hwnd)
	}

	/// Extracts the native handle of the given window.
	///
	/// Only Win32 windows carry a handle the compositor can use. Any other
	/// kind of window, including UWP core windows, is rejected.
	pub fn from_window<H: HasRawWindowHandle>(window: &H) -> Result<Self, Error> {
		match window.raw_window_handle() {
			RawWindowHandle::Win32(Win32Handle { hwnd, .. }) if !hwnd.is_null() =>
				Ok(Self(hwnd as isize)),
			_ => Err(Error::InvalidHandle)
		}
	}

	/// The raw `HWND` value.
	pub fn as_raw(self) -> isize {
		self.0
	}

	/// Whether this is the null handle.
	pub fn is_null(self) -> bool {
		self.0 == 0
	}
}

/// The status code of an apply operation. Zero means success.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ApplyResult(pub i32);
impl ApplyResult {
	pub const SUCCESS: ApplyResult = ApplyResult(0);

	pub fn is_success(self) -> bool {
		self.0 == 0
	}

	pub fn code(self) -> i32 {
		self.0
	}
}
impl From<&Result<(), Error>> for ApplyResult {
	fn from(outcome: &Result<(), Error>) -> Self {
		match outcome {
			Ok(()) => ApplyResult::SUCCESS,
			Err(what) => ApplyResult(what.code())
		}
	}
}
impl fmt::Display for ApplyResult {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Applies backdrop effects through a [`Platform`], gating every request on
/// the build number it reports.
///
/// Nothing is cached between calls: the build number and the theme are
/// queried again every time they are needed.
#[derive(Debug, Clone)]
pub struct Compositor<P = Native> {
	platform: P,
	thresholds: BuildThresholds,
}
impl Compositor<Native> {
	/// A compositor backed by the running system, with thresholds read from
	/// the environment.
	pub fn native() -> Self {
		Self::new(Native, BuildThresholds::from_env())
	}
}
impl<P: Platform> Compositor<P> {
	pub fn new(platform: P, thresholds: BuildThresholds) -> Self {
		Self { platform, thresholds }
	}

	pub fn platform(&self) -> &P {
		&self.platform
	}

	pub fn thresholds(&self) -> BuildThresholds {
		self.thresholds
	}

	/// The method effects would currently be applied through.
	pub fn method(&self) -> BackdropMethod {
		self.thresholds.method_for_build(self.platform.build_number())
	}

	/// Whether backdrop effects are supported on this system.
	pub fn is_supported(&self) -> bool {
		self.method().is_supported()
	}

	/// Whether applications are currently asked to use a dark theme.
	pub fn is_dark_mode(&self) -> bool {
		self.platform.is_dark_mode()
	}

	/// Takes a snapshot of the current system.
	pub fn capabilities(&self) -> SystemCapabilities {
		SystemCapabilities::probe_with(&self.platform, self.thresholds)
	}

	/// Applies the given effect to the window.
	///
	/// Reapplying the effect a window already has, or disabling the effect of
	/// a window that has none, is accepted and changes nothing.
	pub fn apply(&self, window: WindowHandle, kind: Backdrop) -> Result<(), Error> {
		let method = self.method();
		if !method.is_supported() {
			log::debug!("Not applying {}: backdrop effects are unsupported.", kind);
			return Err(Error::NotSupported)
		}
		if window.is_null() {
			return Err(Error::InvalidHandle)
		}

		/* Only enabled effects are tinted, so the theme only matters then. */
		let dark = kind.is_enabled() && self.platform.is_dark_mode();

		log::debug!(
			"Applying {} to window {:#x} through the {:?} method.",
			kind,
			window.as_raw(),
			method);
		self.platform.set_backdrop(window, method, kind, dark)
	}

	/// Applies the given effect to the window, reporting the outcome as a
	/// status code instead of an error.
	pub fn apply_code(&self, window: WindowHandle, kind: Backdrop) -> ApplyResult {
		let outcome = self.apply(window, kind);
		if let Err(what) = &outcome {
			log::warn!("Could not apply {}: {}", kind, what);
		}
		ApplyResult::from(&outcome)
	}

	/// Checks for support first and, if present, applies the effect,
	/// describing the outcome for display.
	///
	/// When effects are unsupported the native layer is not touched at all.
	pub fn apply_with_status(&self, window: WindowHandle, kind: Backdrop) -> Status {
		if !self.is_supported() {
			return Status::not_supported()
		}
		Status::from_outcome(kind, &self.apply(window, kind))
	}
}

/// Applies the given effect to the window, returning a status code.
///
/// This is a boundary that never fails: unsupported systems and native
/// failures alike come back as non-zero codes.
pub fn apply_mica(window: WindowHandle, kind: Backdrop) -> ApplyResult {
	Compositor::native().apply_code(window, kind)
}

/// Applies the given effect to the window.
pub fn apply_backdrop<H: HasRawWindowHandle>(window: &H, kind: Backdrop) -> Result<(), Error> {
	Compositor::native().apply(WindowHandle::from_window(window)?, kind)
}

/// Whether backdrop effects are supported on this system.
pub fn is_mica_supported() -> bool {
	Compositor::native().is_supported()
}

/// Whether applications are currently asked to use a dark theme.
pub fn is_windows_dark_mode() -> bool {
	Native.is_dark_mode()
}

/// The build number of the running operating system, if available.
pub fn windows_build() -> Option<u32> {
	Native.build_number()
}

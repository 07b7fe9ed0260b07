use winapi::shared::minwindef::{BOOL, DWORD, FALSE, FARPROC, TRUE};
use winapi::shared::ntdef::{NTSTATUS, ULONG, WCHAR};
use winapi::shared::windef::HWND;
use winapi::shared::winerror::{ERROR_SUCCESS, S_OK};
use winapi::um::dwmapi::{DwmExtendFrameIntoClientArea, DwmSetWindowAttribute};
use winapi::um::errhandlingapi::GetLastError;
use winapi::um::libloaderapi::{GetProcAddress, LoadLibraryA};
use winapi::um::uxtheme::MARGINS;
use cstr::cstr;
use std::ffi::CStr;
use winapi::um::winbase::{FORMAT_MESSAGE_ALLOCATE_BUFFER, FORMAT_MESSAGE_FROM_SYSTEM, FORMAT_MESSAGE_IGNORE_INSERTS, FormatMessageW, LocalFree};
use winapi::um::winnt::{LANG_NEUTRAL, LONG, LPWSTR, MAKELANGID, SUBLANG_NEUTRAL};
use winapi::um::winreg::{HKEY_CURRENT_USER, RRF_RT_REG_DWORD, RegGetValueW};
use crate::{Backdrop, BackdropMethod};

/// Asks the compositor to draw the window frame with dark colors. Tints the
/// Mica material accordingly.
const DWMWA_USE_IMMERSIVE_DARK_MODE: DWORD = 20;

/// Selects the system-drawn backdrop material of a window. Documented from
/// Windows 11 22H2 onwards.
const DWMWA_SYSTEMBACKDROP_TYPE: DWORD = 38;

/// Undocumented switch enabling Mica in Windows 11 builds that predate
/// [`DWMWA_SYSTEMBACKDROP_TYPE`].
const DWMWA_MICA_EFFECT: DWORD = 1029;

/// The registry key holding the personalization settings of the user.
const PERSONALIZE_KEY: &str =
	"Software\\Microsoft\\Windows\\CurrentVersion\\Themes\\Personalize";

/// The registry value telling whether applications should use a light theme.
const APPS_USE_LIGHT_THEME: &str = "AppsUseLightTheme";

/// Type for a pointer to the `RtlGetVersion` function, found in `ntdll.dll`.
/// Unlike `GetVersionEx`, this function reports the real version of Windows
/// regardless of the compatibility manifest of the executable.
type __RtlGetVersion =
	unsafe extern "system" fn(*mut OperatingSystemVersionInfoWide) -> NTSTATUS;

lazy_static::lazy_static! {
	/// The `RtlGetVersion` entry point, or the reason it couldn't be found.
	///
	/// Only the entry point is kept. The version it reports is queried anew
	/// every time it's needed.
	static ref RTL_GET_VERSION: Result<__RtlGetVersion, Error> = unsafe {
		/* Ntdll.dll may be missing in sandboxed environments such as UWP.
		 * Version information won't be available there. */
		find_function(cstr!("ntdll.dll"), cstr!("RtlGetVersion"))
			.map(|address| std::mem::transmute::<_, __RtlGetVersion>(address))
			.map_err(|what| {
				log::warn!(
					"{}. Backdrop effects will be reported as unsupported.",
					what);
				what
			})
	};
}

/// Finds an exported function in the given library.
///
/// The library is never freed. Any address handed out must stay valid for as
/// long as whoever asked for it keeps it around.
unsafe fn find_function(
	library: &'static CStr,
	function: &'static CStr) -> Result<FARPROC, Error> {

	let module = LoadLibraryA(library.as_ptr());
	if module.is_null() {
		return Err(Error::MissingFunctionality {
			name: library.to_str().unwrap_or("library"),
			error: WinError(GetLastError())
		})
	}

	let address = GetProcAddress(module, function.as_ptr());
	if address.is_null() {
		return Err(Error::MissingFunctionality {
			name: function.to_str().unwrap_or("function"),
			error: WinError(GetLastError())
		})
	}

	Ok(address)
}

/// The build number of the running copy of Windows.
pub fn build_number() -> Option<u32> {
	let function = match &*RTL_GET_VERSION {
		Ok(function) => *function,
		Err(what) => {
			log::trace!("No build number available: {}", what);
			return None
		}
	};

	let mut version = OperatingSystemVersionInfoWide {
		byte_size: std::mem::size_of::<OperatingSystemVersionInfoWide>() as ULONG,
		major_version: 0,
		minor_version: 0,
		build_number: 0,
		platform_id: 0,
		service_pack: [0; 128]
	};

	let result = unsafe { function(&mut version as *mut _) };
	if result != 0 {
		/* RtlGetVersion is an infallible function and, yet, it's returned
		 * an invalid value. This may be an indication of a bug or undefined
		 * behavior. */
		log::error!(
			"RtlGetVersion returned {} when it should have been an \
			 infallible function, whose only valid return value is \
			 STATUS_SUCCESS. This may be indicative of a bug.",
			result);
		return None
	}

	log::trace!(
		"Running Windows {}.{} build {}.",
		version.major_version,
		version.minor_version,
		version.build_number);
	Some(version.build_number)
}

/// Whether the user has asked applications to use a dark theme.
///
/// Anything that keeps the setting from being read, such as the value being
/// absent in older versions of Windows, counts as a light theme.
pub fn is_dark_mode() -> bool {
	let key = wide(PERSONALIZE_KEY);
	let value = wide(APPS_USE_LIGHT_THEME);

	let mut light: DWORD = 1;
	let mut size = std::mem::size_of::<DWORD>() as DWORD;
	let status = unsafe {
		RegGetValueW(
			HKEY_CURRENT_USER,
			key.as_ptr(),
			value.as_ptr(),
			RRF_RT_REG_DWORD,
			std::ptr::null_mut(),
			&mut light as *mut DWORD as *mut _,
			&mut size as *mut _)
	};
	if status != ERROR_SUCCESS as LONG {
		log::debug!(
			"Could not read {}: {}. Assuming a light theme.",
			APPS_USE_LIGHT_THEME,
			WinError(status as DWORD));
		return false
	}

	light == 0
}

/// Applies the given backdrop to the window through the given method.
///
/// # Safety
/// The handle must refer to a live window.
pub unsafe fn set_backdrop(
	hwnd: HWND,
	method: BackdropMethod,
	kind: Backdrop,
	dark: bool) -> Result<(), Error> {

	if method == BackdropMethod::Unsupported {
		return Err(Error::BackdropNotSupported)
	}

	if kind.is_enabled() {
		/* The backdrop is only visible where the frame is, so the frame has to
		 * cover the whole client area. */
		extend_frame(hwnd, -1)?;
		match_theme(hwnd, dark);
	} else {
		extend_frame(hwnd, 0)?;
	}

	match method {
		BackdropMethod::Documented =>
			set_attribute(
				hwnd,
				DWMWA_SYSTEMBACKDROP_TYPE,
				&(SystemBackdropType::from(kind) as DWORD),
				"set the system backdrop type of the window"),
		BackdropMethod::Legacy =>
			set_attribute(
				hwnd,
				DWMWA_MICA_EFFECT,
				&legacy_switch(kind),
				"toggle the mica effect of the window"),
		BackdropMethod::Unsupported => Err(Error::BackdropNotSupported)
	}
}

/// Tints the window frame for the given theme.
///
/// The tint is cosmetic, so failing to set it doesn't keep the backdrop from
/// being applied. Returns whether the tint was set.
unsafe fn match_theme(hwnd: HWND, dark: bool) -> bool {
	let result = set_attribute(
		hwnd,
		DWMWA_USE_IMMERSIVE_DARK_MODE,
		&(if dark { TRUE } else { FALSE }),
		"match the window frame to the system theme");
	if let Err(what) = &result {
		log::warn!("{}. Continuing without a themed frame.", what);
	}

	result.is_ok()
}

/// The value of [`DWMWA_MICA_EFFECT`] for the given backdrop.
///
/// This switch only knows about plain Mica. Every other enabled effect
/// degrades to it.
fn legacy_switch(kind: Backdrop) -> BOOL {
	match kind {
		Backdrop::Disabled => FALSE,
		Backdrop::Mica => TRUE,
		Backdrop::MicaAlt | Backdrop::Auto => {
			log::debug!(
				"{} is not available before the documented backdrop API. \
				 Falling back to MICA.",
				kind);
			TRUE
		}
	}
}

/// Extends the window frame into the client area by the given margin on
/// every side. A negative margin covers the whole client area.
unsafe fn extend_frame(hwnd: HWND, margin: i32) -> Result<(), Error> {
	let margins = MARGINS {
		cxLeftWidth: margin,
		cxRightWidth: margin,
		cyTopHeight: margin,
		cyBottomHeight: margin
	};

	let result = DwmExtendFrameIntoClientArea(hwnd, &margins as *const _);
	if result != S_OK {
		return Err(Error::FailedInvocation {
			call: "DwmExtendFrameIntoClientArea",
			description: "extend window frame into the client area",
			error: WinError(result as DWORD)
		})
	}

	Ok(())
}

/// Sets a DWM attribute of the window.
unsafe fn set_attribute<T>(
	hwnd: HWND,
	attribute: DWORD,
	value: &T,
	description: &'static str) -> Result<(), Error> {

	let result = DwmSetWindowAttribute(
		hwnd,
		attribute,
		value as *const T as *const _,
		std::mem::size_of::<T>() as DWORD);
	if result != S_OK {
		return Err(Error::FailedInvocation {
			call: "DwmSetWindowAttribute",
			description,
			error: WinError(result as DWORD)
		})
	}

	Ok(())
}

/// Encodes a string as a null-terminated UTF-16 string.
fn wide(string: &str) -> Vec<WCHAR> {
	string.encode_utf16().chain(std::iter::once(0)).collect()
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// This error is triggered if this module was asked to apply a backdrop
	/// on a version of Windows that has no mechanism for it.
	#[error("Backdrop effects are not supported on this version of Windows")]
	BackdropNotSupported,
	/// This error is triggered if required functionality is present, but in
	/// spite of that, the invocation of the functionality has failed.
	#[error("Could not {description}: call to \"{call}\" failed: {error}")]
	FailedInvocation {
		/// The name of the functionality whose invocation failed.
		call: &'static str,
		/// The description of what was trying to be achieved.
		description: &'static str,
		/// The error code given by the failing call.
		error: WinError
	},
	/// This error is triggered if required functionality or one of its
	/// dependencies are not available in the system.
	#[error("Could not find \"{name}\": {error}")]
	MissingFunctionality {
		/// The name of the functionality that could not be found.
		name: &'static str,
		/// The error code given by `GetLastError()`.
		error: WinError
	}
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct WinError(DWORD);
impl WinError {
	/// Wraps a raw error code.
	pub fn from_raw(code: DWORD) -> Self {
		Self(code)
	}

	/// The raw value of this error, reinterpreted as a signed status code.
	pub fn code(&self) -> i32 {
		self.0 as i32
	}

	/// Retrieve the message for this error message from Windows, if available.
	pub fn message(&self) -> Option<String> {
		let mut buffer: LPWSTR = std::ptr::null_mut();
		let size = unsafe {
			FormatMessageW(
				FORMAT_MESSAGE_ALLOCATE_BUFFER
					| FORMAT_MESSAGE_FROM_SYSTEM
					| FORMAT_MESSAGE_IGNORE_INSERTS,
				std::ptr::null_mut(),
				self.0,
				MAKELANGID(LANG_NEUTRAL, SUBLANG_NEUTRAL) as DWORD,
				&mut buffer as *mut LPWSTR as *mut _,
				0,
				std::ptr::null_mut())
		};
		if size == 0 {
			/* No message. */
			return None
		}

		let slice = unsafe {
			std::slice::from_raw_parts(buffer, size as usize)
		};
		let message = std::char::decode_utf16(slice.iter().cloned())
			.map(|c| c.unwrap_or('_'))
			.collect::<String>()
			.trim()
			.to_string();

		/* Free the buffer FormatMessageW allocated for us. */
		unsafe {
			LocalFree(buffer as *mut _);
		}

		Some(message)
	}
}
impl std::fmt::Display for WinError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self.message() {
			Some(message) =>
				write!(f, "{} (0x{:08x})", message, self.0),
			None =>
				write!(f, "0x{:08x}", self.0),
		}
	}
}
impl std::error::Error for WinError {}

/// The values of the [`DWMWA_SYSTEMBACKDROP_TYPE`] attribute.
#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
enum SystemBackdropType {
	/// Let the compositor decide. This is the default for every window.
	Auto = 0,
	/// Draw no backdrop.
	None = 1,
	/// The Mica material, meant for long-lived main windows.
	MainWindow = 2,
	/// The Mica Alt material, meant for windows with tabbed title bars.
	TabbedWindow = 4,
}
impl From<Backdrop> for SystemBackdropType {
	fn from(kind: Backdrop) -> Self {
		match kind {
			Backdrop::Disabled => SystemBackdropType::None,
			Backdrop::Mica => SystemBackdropType::MainWindow,
			Backdrop::MicaAlt => SystemBackdropType::TabbedWindow,
			Backdrop::Auto => SystemBackdropType::Auto,
		}
	}
}

/// The operating system version information.
#[repr(C)]
struct OperatingSystemVersionInfoWide {
	/// The size of this structure.
	///
	/// This field must be set to the size of the structure, in bytes, so that
	/// Windows may recognize its type and fill it correctly. Setting the value
	/// to anything other than that will result in undefined behavior.
	byte_size: ULONG,
	/// The major version number of the operating system.
	major_version: ULONG,
	/// The minor version number of the operating system.
	minor_version: ULONG,
	/// The build number of the operating system.
	///
	/// Windows 10 and 11 share the same major and minor versions, so this
	/// value is the only one telling them apart.
	build_number: ULONG,
	/// The operating system platform.
	platform_id: ULONG,
	/// The service-pack version string.
	service_pack: [WCHAR; 128],
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn backdrop_types_match_the_documented_values() {
		assert_eq!(SystemBackdropType::from(Backdrop::Auto) as u32, 0);
		assert_eq!(SystemBackdropType::from(Backdrop::Disabled) as u32, 1);
		assert_eq!(SystemBackdropType::from(Backdrop::Mica) as u32, 2);
		assert_eq!(SystemBackdropType::from(Backdrop::MicaAlt) as u32, 4);
	}

	#[test]
	fn wide_strings_are_null_terminated() {
		assert_eq!(wide("Mica"), [0x4d, 0x69, 0x63, 0x61, 0]);
	}

	#[test]
	fn unsupported_method_is_rejected_before_touching_the_window() {
		let result = unsafe {
			set_backdrop(
				std::ptr::null_mut(),
				BackdropMethod::Unsupported,
				Backdrop::Mica,
				false)
		};
		assert!(matches!(result, Err(Error::BackdropNotSupported)));
	}

	#[test]
	fn win_errors_render_their_code() {
		let rendered = WinError(0x8007_0057).to_string();
		assert!(rendered.contains("0x80070057"));
		assert_eq!(WinError(0x8007_0057).code(), -2147024809);
	}

	#[test]
	fn rtl_get_version_is_found() {
		assert!(RTL_GET_VERSION.is_ok());
		assert!(build_number().is_some());
	}

	#[test]
	fn missing_functions_are_reported_by_name() {
		let result = unsafe {
			find_function(cstr!("ntdll.dll"), cstr!("NoSuchExportInNtdll"))
		};
		match result {
			Err(Error::MissingFunctionality { name, .. }) =>
				assert_eq!(name, "NoSuchExportInNtdll"),
			other => panic!("expected missing functionality, got {:?}", other.map(|_| ())),
		}
	}

	#[test]
	fn missing_libraries_are_reported_by_name() {
		let result = unsafe {
			find_function(cstr!("no-such-library.dll"), cstr!("RtlGetVersion"))
		};
		assert!(matches!(
			result,
			Err(Error::MissingFunctionality { name: "no-such-library.dll", .. })));
	}

	#[test]
	fn legacy_switch_degrades_every_effect_to_mica() {
		assert_eq!(legacy_switch(Backdrop::Disabled), FALSE);
		for kind in Backdrop::EFFECTS {
			assert_eq!(legacy_switch(kind), TRUE);
		}
	}

	#[test]
	fn failing_to_theme_the_frame_is_not_fatal() {
		assert!(!unsafe { match_theme(std::ptr::null_mut(), true) });
	}
}

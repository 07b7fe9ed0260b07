use crate::{Backdrop, Compositor, Platform};
use std::fmt;

/// Build number for the first release of Windows 11.
pub const WINDOWS_11_21H2: u32 = 22000;

/// Build number for Windows 11 22H2, the first release that documents
/// `DWMWA_SYSTEMBACKDROP_TYPE`.
pub const WINDOWS_11_22H2: u32 = 22621;

/// Environment variable overriding [`BuildThresholds::min_supported`].
pub const MIN_BUILD_VAR: &str = "WINMICA_MIN_BUILD";

/// Environment variable overriding [`BuildThresholds::documented_api`].
pub const DOCUMENTED_BUILD_VAR: &str = "WINMICA_DOCUMENTED_BUILD";

/// The native mechanism used to enable a backdrop on a given build.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BackdropMethod {
	/// `DWMWA_SYSTEMBACKDROP_TYPE`, which supports every variant.
	Documented,
	/// The undocumented `DWMWA_MICA_EFFECT` switch, which only knows about
	/// plain Mica.
	Legacy,
	/// No mechanism exists on this build.
	Unsupported,
}
impl BackdropMethod {
	/// Whether effects can be applied through this method at all.
	pub fn is_supported(self) -> bool {
		self != BackdropMethod::Unsupported
	}

	/// A line describing the method, for system reports.
	pub fn description(self) -> &'static str {
		match self {
			BackdropMethod::Documented => "Using official documented API",
			BackdropMethod::Legacy => "Using legacy fallback method",
			BackdropMethod::Unsupported =>
				"Mica effects not supported on this Windows version",
		}
	}
}

/// The build numbers at which each backdrop method becomes available.
///
/// These are observations about how Windows has behaved so far rather than
/// guarantees, which is why they can be overridden.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BuildThresholds {
	/// The first build on which any backdrop method works.
	pub min_supported: u32,
	/// The first build on which the documented attribute works.
	pub documented_api: u32,
}
impl Default for BuildThresholds {
	fn default() -> Self {
		Self {
			min_supported: WINDOWS_11_21H2,
			documented_api: WINDOWS_11_22H2,
		}
	}
}
impl BuildThresholds {
	/// Reads the thresholds from the environment, falling back to the
	/// defaults for any value that is absent or malformed.
	pub fn from_env() -> Self {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Same as [`from_env`](Self::from_env), reading values through `lookup`.
	pub fn from_lookup<F>(lookup: F) -> Self
		where F: Fn(&str) -> Option<String> {

		let defaults = Self::default();
		let read = |name: &str, fallback: u32| match lookup(name) {
			Some(value) => match value.trim().parse::<u32>() {
				Ok(build) => build,
				Err(what) => {
					log::warn!(
						"Ignoring {}={:?}: {}. Using build {} instead.",
						name, value, what, fallback);
					fallback
				}
			},
			None => fallback
		};

		let thresholds = Self {
			min_supported: read(MIN_BUILD_VAR, defaults.min_supported),
			documented_api: read(DOCUMENTED_BUILD_VAR, defaults.documented_api),
		};
		if thresholds.documented_api < thresholds.min_supported {
			log::warn!(
				"Documented API build {} precedes minimum supported build {}. \
				 Using the default thresholds instead.",
				thresholds.documented_api,
				thresholds.min_supported);
			return defaults
		}

		thresholds
	}

	/// Selects the backdrop method for the given build number.
	pub fn method_for(&self, build: u32) -> BackdropMethod {
		if build >= self.documented_api {
			BackdropMethod::Documented
		} else if build >= self.min_supported {
			BackdropMethod::Legacy
		} else {
			BackdropMethod::Unsupported
		}
	}

	/// Selects the backdrop method for a build number that may be unknown.
	pub fn method_for_build(&self, build: Option<u32>) -> BackdropMethod {
		build
			.map(|build| self.method_for(build))
			.unwrap_or(BackdropMethod::Unsupported)
	}
}

/// A snapshot of the system state relevant to backdrop effects.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct SystemCapabilities {
	/// The operating system build number, if it could be determined.
	pub build: Option<u32>,
	/// Whether applications are currently asked to use a dark theme.
	pub dark_mode: bool,
	/// The method effects would be applied through.
	pub method: BackdropMethod,
}
impl SystemCapabilities {
	/// Takes a snapshot of the current system.
	pub fn probe() -> Self {
		Compositor::native().capabilities()
	}

	/// Takes a snapshot of the given platform, gated on the given thresholds.
	pub fn probe_with<P: Platform>(platform: &P, thresholds: BuildThresholds) -> Self {
		let build = platform.build_number();
		Self {
			build,
			dark_mode: platform.is_dark_mode(),
			method: thresholds.method_for_build(build),
		}
	}

	/// Whether backdrop effects are supported.
	pub fn supported(&self) -> bool {
		self.method.is_supported()
	}
}
impl fmt::Display for SystemCapabilities {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self.build {
			Some(build) => writeln!(f, "Windows Build: {}", build)?,
			None => writeln!(f, "Windows Build: unknown")?,
		}
		writeln!(f, "Dark Mode: {}",
			if self.dark_mode { "Enabled" } else { "Disabled" })?;
		writeln!(f, "Mica Supported: {}",
			if self.supported() { "Yes" } else { "No" })?;

		let effects = Backdrop::EFFECTS
			.iter()
			.map(|effect| effect.name())
			.collect::<Vec<_>>()
			.join(", ");
		writeln!(f, "Supported Effects: {}", effects)?;
		writeln!(f)?;

		write!(f, "{}", self.method.description())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::platform::mock::MockPlatform;
	use std::collections::HashMap;

	#[test]
	fn builds_before_windows_11_are_unsupported() {
		let thresholds = BuildThresholds::default();
		for build in [0, 7601, 9200, 17763, 19041, 19045, 21999] {
			assert_eq!(thresholds.method_for(build), BackdropMethod::Unsupported);
		}
	}

	#[test]
	fn early_windows_11_builds_use_the_legacy_method() {
		let thresholds = BuildThresholds::default();
		for build in [22000, 22200, 22598, 22620] {
			let method = thresholds.method_for(build);
			assert_eq!(method, BackdropMethod::Legacy);
			assert!(method.is_supported());
		}
	}

	#[test]
	fn later_builds_use_the_documented_method() {
		let thresholds = BuildThresholds::default();
		for build in [22621, 22631, 26100, u32::MAX] {
			assert_eq!(thresholds.method_for(build), BackdropMethod::Documented);
		}
	}

	#[test]
	fn unknown_builds_are_unsupported() {
		let thresholds = BuildThresholds::default();
		assert_eq!(
			thresholds.method_for_build(None),
			BackdropMethod::Unsupported);
	}

	#[test]
	fn thresholds_can_be_overridden() {
		let values = HashMap::from([
			(MIN_BUILD_VAR, "21000"),
			(DOCUMENTED_BUILD_VAR, " 22000 "),
		]);
		let thresholds = BuildThresholds::from_lookup(|name| {
			values.get(name).map(|value| value.to_string())
		});

		assert_eq!(thresholds, BuildThresholds {
			min_supported: 21000,
			documented_api: 22000,
		});
		assert_eq!(thresholds.method_for(21500), BackdropMethod::Legacy);
	}

	#[test]
	fn malformed_overrides_fall_back_to_defaults() {
		let thresholds = BuildThresholds::from_lookup(|name| match name {
			MIN_BUILD_VAR => Some("eleven".to_string()),
			_ => None,
		});
		assert_eq!(thresholds, BuildThresholds::default());
	}

	#[test]
	fn inverted_overrides_are_rejected() {
		let thresholds = BuildThresholds::from_lookup(|name| match name {
			MIN_BUILD_VAR => Some("23000".to_string()),
			DOCUMENTED_BUILD_VAR => Some("22000".to_string()),
			_ => None,
		});
		assert_eq!(thresholds, BuildThresholds::default());
	}

	#[test]
	fn probing_a_platform_reads_its_build_and_theme() {
		let platform = MockPlatform::new(Some(22621)).with_dark_mode(true);
		let capabilities = SystemCapabilities::probe_with(
			&platform,
			BuildThresholds::default());

		assert_eq!(capabilities, SystemCapabilities {
			build: Some(22621),
			dark_mode: true,
			method: BackdropMethod::Documented,
		});
		assert!(capabilities.supported());
		assert!(platform.calls().is_empty());
	}

	#[test]
	fn probing_a_platform_without_a_build_is_unsupported() {
		let capabilities = SystemCapabilities::probe_with(
			&MockPlatform::new(None),
			BuildThresholds::default());

		assert_eq!(capabilities.build, None);
		assert!(!capabilities.supported());
	}

	#[test]
	fn report_describes_a_documented_system() {
		let capabilities = SystemCapabilities {
			build: Some(22631),
			dark_mode: true,
			method: BackdropMethod::Documented,
		};

		assert_eq!(capabilities.to_string(), "Windows Build: 22631\n\
			Dark Mode: Enabled\n\
			Mica Supported: Yes\n\
			Supported Effects: MICA, MICA_ALT, AUTO\n\
			\n\
			Using official documented API");
	}

	#[test]
	fn report_describes_an_unsupported_system() {
		let capabilities = SystemCapabilities {
			build: Some(19041),
			dark_mode: false,
			method: BackdropMethod::Unsupported,
		};
		let report = capabilities.to_string();

		assert!(report.contains("Dark Mode: Disabled"));
		assert!(report.contains("Mica Supported: No"));
		assert!(report.ends_with(
			"Mica effects not supported on this Windows version"));
	}
}

use serde::Deserialize;

/// What happens to an existing root directory before a fixture tree is first written to it.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Cleanup {
	/// Remove the root and everything below it.
	#[default]
	RemoveRootDir,
	/// Remove the root's children, keep the root.
	RemoveFixtures,
	/// Write on top of whatever is there.
	Keep,
}

fn __default_write() -> bool {
	true
}

fn __default_placeholder() -> String {
	"<fixture>".to_string()
}

/// Settings threaded into every fixture a [`FixtureCreator`](crate::FixtureCreator) makes.
///
/// ```
/// use tree_fixtures::{Cleanup, FixtureConfig};
///
/// let config = FixtureConfig::new(Cleanup::Keep, false, "[ROOT]".to_string());
/// assert_eq!(config.placeholder, "[ROOT]");
/// assert_eq!(FixtureConfig::default().cleanup, Cleanup::RemoveRootDir);
/// ```
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, derive_new::new)]
pub struct FixtureConfig {
	/// Applied before the first write of [`create`](crate::FixtureCreator::create) and each fork.
	#[serde(default)]
	pub cleanup: Cleanup,
	/// `false` skips cleanup and writing on creation; the fixture only computes its paths.
	/// Adding, forking and resetting always write.
	#[serde(default = "__default_write")]
	pub write: bool,
	/// Replacement for the root directory in [`Fixture::mask_root_dir`](crate::Fixture::mask_root_dir).
	#[serde(default = "__default_placeholder")]
	pub placeholder: String,
}

impl Default for FixtureConfig {
	fn default() -> Self {
		Self {
			cleanup: Cleanup::default(),
			write: __default_write(),
			placeholder: __default_placeholder(),
		}
	}
}

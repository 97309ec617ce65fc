//! Error taxonomy for tree materialization and fixture sessions.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Boxed cause carried by [`FixtureCreationError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A malformed item name in a [`Directory`](crate::Directory).
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ValidationError {
	#[error("Item name must not start with separator: {0}")]
	LeadingSeparator(String),
	#[error("Item name must not end with separator: {0}")]
	TrailingSeparator(String),
	#[error("Item name must not contain consecutive separators: {0}")]
	ConsecutiveSeparators(String),
}

impl ValidationError {
	/// The offending item name.
	pub fn name(&self) -> &str {
		match self {
			Self::LeadingSeparator(name) | Self::TrailingSeparator(name) | Self::ConsecutiveSeparators(name) => name,
		}
	}
}

/// Writing a fixture to disk failed.
///
/// `flexible` is set when a [`FileProducer`](crate::FileProducer) returned the error. Producers are
/// never handed a pre-created parent directory, so the message says so.
#[derive(Debug, Error)]
#[error("Failed to create fixture ('{}').{}", .path.display(), flexible_hint(.path, .flexible))]
pub struct FixtureCreationError {
	/// The path being written when the failure happened.
	pub path: PathBuf,
	/// The failure came from a [`FileProducer`](crate::FileProducer).
	pub flexible: bool,
	/// The underlying I/O error or producer report.
	#[source]
	pub source: BoxError,
}

impl FixtureCreationError {
	/// A directory or file write failed.
	pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
		Self {
			path: path.into(),
			flexible: false,
			source: Box::new(source),
		}
	}

	/// A [`FileProducer`](crate::FileProducer) returned an error.
	pub fn producer(path: impl Into<PathBuf>, source: color_eyre::Report) -> Self {
		Self {
			path: path.into(),
			flexible: true,
			source: source.into(),
		}
	}
}

fn flexible_hint(path: &Path, flexible: &bool) -> String {
	if !*flexible {
		return String::new();
	}
	let parent = path.parent().unwrap_or(path);
	format!(
		" Did you forget to create the parent directory ('{}')? The flexible fixture creation API does not automatically create the parent directory, you have to create it manually.",
		parent.display()
	)
}

/// A fork target that is the root it forks from, or is nested with it.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("New root directory must be different from the current root directory ('{}').", .root.display())]
pub struct ForkConflictError {
	/// The rejected fork root.
	pub root: PathBuf,
}

/// Every failure a fixture operation can report.
#[derive(Debug, Error)]
pub enum Error {
	#[error(transparent)]
	Validation(#[from] ValidationError),
	#[error(transparent)]
	Creation(#[from] FixtureCreationError),
	#[error(transparent)]
	ForkConflict(#[from] ForkConflictError),
	#[error("Failed to remove fixtures ('{}').", .path.display())]
	Remove {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("Failed to duplicate fixtures from '{}' into '{}'.", .from.display(), .to.display())]
	Clone {
		from: PathBuf,
		to: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

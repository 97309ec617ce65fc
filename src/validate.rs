use crate::error::ValidationError;

/// Separator for item names. Names are always POSIX-style, whatever the host uses.
pub const SEPARATOR: char = '/';

/// Check a single item name of a [`Directory`](crate::Directory).
///
/// A single embedded separator (`"a/b"`) is fine and stands for nested directories.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
	if name.starts_with(SEPARATOR) {
		return Err(ValidationError::LeadingSeparator(name.to_owned()));
	}
	if name.ends_with(SEPARATOR) {
		return Err(ValidationError::TrailingSeparator(name.to_owned()));
	}
	if name.contains("//") {
		return Err(ValidationError::ConsecutiveSeparators(name.to_owned()));
	}
	Ok(())
}

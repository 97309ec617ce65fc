//! Flattening a [`Directory`] into a table of logical path -> absolute path, without touching disk.

use std::{
	collections::BTreeMap,
	ops::Index,
	path::{Path, PathBuf},
};

use crate::{
	error::ValidationError,
	tree::{Directory, DirectoryItem},
	validate::{SEPARATOR, validate_name},
};

/// Every path a tree declares, including the ancestors implied by compound names.
///
/// Keys are POSIX-style logical paths (`"b/a.txt"`); values are absolute paths under the root.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PathTable {
	paths: BTreeMap<String, PathBuf>,
}

impl PathTable {
	/// An empty table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Absolute path for a logical key, if declared.
	pub fn get(&self, key: &str) -> Option<&Path> {
		self.paths.get(key).map(PathBuf::as_path)
	}

	/// Whether `key` was declared.
	pub fn contains(&self, key: &str) -> bool {
		self.paths.contains_key(key)
	}

	/// Logical keys, sorted.
	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.paths.keys().map(String::as_str)
	}

	/// `(key, absolute path)` pairs, sorted by key.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
		self.paths.iter().map(|(key, path)| (key.as_str(), path.as_path()))
	}

	/// Number of declared paths, ancestors included.
	pub fn len(&self) -> usize {
		self.paths.len()
	}

	/// Whether nothing was declared.
	pub fn is_empty(&self) -> bool {
		self.paths.is_empty()
	}

	pub(crate) fn insert(&mut self, key: String, path: PathBuf) {
		self.paths.insert(key, path);
	}

	/// Union with `other`; entries of `other` win on collision.
	pub fn merge(&mut self, other: PathTable) {
		self.paths.extend(other.paths);
	}

	/// Same keys, resolved against a different root.
	pub fn rerooted(&self, root: &Path) -> PathTable {
		let paths = self.paths.keys().map(|key| (key.clone(), root.join(key))).collect();
		PathTable { paths }
	}
}

impl Index<&str> for PathTable {
	type Output = Path;

	/// # Panics
	/// If `key` was never declared.
	fn index(&self, key: &str) -> &Path {
		match self.get(key) {
			Some(path) => path,
			None => panic!("no fixture path declared for {key:?}"),
		}
	}
}

impl<'a> IntoIterator for &'a PathTable {
	type IntoIter = std::collections::btree_map::Iter<'a, String, PathBuf>;
	type Item = (&'a String, &'a PathBuf);

	fn into_iter(self) -> Self::IntoIter {
		self.paths.iter()
	}
}

/// `"a/b/c"` -> `["a/b/c", "a/b", "a"]`
pub fn self_and_ancestors(path: &str) -> Vec<&str> {
	let mut paths = vec![path];
	let mut rest = path;
	while let Some(idx) = rest.rfind(SEPARATOR) {
		rest = &rest[..idx];
		paths.push(rest);
	}
	paths
}

fn join_logical(prefix: &str, name: &str) -> String {
	match prefix.is_empty() {
		true => name.to_owned(),
		false => format!("{prefix}{SEPARATOR}{name}"),
	}
}

/// Flatten `tree` rooted at `root_dir`.
///
/// ```
/// use std::path::Path;
/// use tree_fixtures::{directory, flatten};
///
/// let paths = flatten(&directory! { "c/a/a.txt" => "c-a-a", "b" => { "a.txt" => "b-a" } }, Path::new("/fx")).unwrap();
/// let keys: Vec<_> = paths.keys().collect();
/// assert_eq!(keys, ["b", "b/a.txt", "c", "c/a", "c/a/a.txt"]);
/// assert_eq!(&paths["c/a"], Path::new("/fx/c/a"));
/// ```
pub fn flatten(tree: &Directory, root_dir: &Path) -> Result<PathTable, ValidationError> {
	flatten_with_prefix(tree, root_dir, "")
}

/// Flatten `tree` as if it were declared at `prefix` under `root_dir`.
pub fn flatten_with_prefix(tree: &Directory, root_dir: &Path, prefix: &str) -> Result<PathTable, ValidationError> {
	let mut table = PathTable::new();
	for (name, item) in tree.iter() {
		validate_name(name)?;

		for path in self_and_ancestors(name) {
			let key = join_logical(prefix, path);
			let absolute = root_dir.join(&key);
			table.insert(key, absolute);
		}

		if let DirectoryItem::Directory(children) = item {
			table.merge(flatten_with_prefix(children, root_dir, &join_logical(prefix, name))?);
		}
	}
	Ok(table)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::directory;

	fn root() -> PathBuf {
		PathBuf::from("/fixtures")
	}

	fn table(entries: &[&str]) -> PathTable {
		let mut table = PathTable::new();
		for key in entries {
			table.insert((*key).to_owned(), root().join(key));
		}
		table
	}

	#[test]
	fn ancestors_of_a_compound_path() {
		assert_eq!(self_and_ancestors("a/b/c"), ["a/b/c", "a/b", "a"]);
		assert_eq!(self_and_ancestors("a.txt"), ["a.txt"]);
	}

	#[test]
	fn flat_files() {
		let paths = flatten(&directory! { "a.txt" => "a", "b.txt" => "b" }, &root()).unwrap();
		assert_eq!(paths, table(&["a.txt", "b.txt"]));
	}

	#[test]
	fn nested_directories() {
		let tree = directory! {
			"a.txt" => "a",
			"b" => {
				"a.txt" => "b-a",
				"b" => { "a.txt" => "b-b-a" },
			},
		};
		let paths = flatten(&tree, &root()).unwrap();
		assert_eq!(paths, table(&["a.txt", "b", "b/a.txt", "b/b", "b/b/a.txt"]));
	}

	#[test]
	fn compound_keys_expand_to_every_ancestor() {
		let tree = directory! {
			"a/a" => { "a.txt" => "a-a-a" },
			"b/a/a" => { "a.txt" => "b-a-a-a" },
			"b/a/b" => { "a.txt" => "b-a-b-a" },
		};
		let paths = flatten(&tree, &root()).unwrap();
		assert_eq!(paths, table(&["a", "a/a", "a/a/a.txt", "b", "b/a", "b/a/a", "b/a/a/a.txt", "b/a/b", "b/a/b/a.txt"]));
		assert_eq!(&paths["b/a/a/a.txt"], Path::new("/fixtures/b/a/a/a.txt"));
	}

	#[test]
	fn merged_directory_and_compound_key_flatten_alike() {
		let merged = flatten(&directory! { "a" => {}, "a/x" => "1" }, &root()).unwrap();
		let nested = flatten(&directory! { "a" => { "x" => "1" } }, &root()).unwrap();
		assert_eq!(merged, nested);
	}

	#[test]
	fn skipped_and_produced_items_are_still_listed() {
		let tree = directory! { "skip.txt" => (), "p/q.txt" => (crate::FileProducer::sync(|_| Ok(()))) };
		assert_eq!(flatten(&tree, &root()).unwrap(), table(&["p", "p/q.txt", "skip.txt"]));
	}

	#[test]
	fn prototype_like_names_are_plain_keys() {
		let paths = flatten(&directory! { "__proto__" => { "constructor" => "c" } }, &root()).unwrap();
		assert_eq!(paths, table(&["__proto__", "__proto__/constructor"]));
	}

	#[test]
	fn prefix_is_prepended_to_keys_and_paths() {
		let paths = flatten_with_prefix(&directory! { "x/y.txt" => "y" }, &root(), "p").unwrap();
		assert_eq!(paths, table(&["p/x", "p/x/y.txt"]));
	}

	#[test]
	fn rejects_invalid_names_anywhere() {
		let err = flatten(&directory! { "/a.txt" => "x" }, &root()).unwrap_err();
		assert_eq!(err, ValidationError::LeadingSeparator("/a.txt".into()));
		let err = flatten(&directory! { "a.txt/" => "x" }, &root()).unwrap_err();
		assert_eq!(err.name(), "a.txt/");
		let err = flatten(&directory! { "ok" => { "a//a.txt" => "x" } }, &root()).unwrap_err();
		assert_eq!(err.name(), "a//a.txt");
	}

	#[test]
	fn merge_and_reroot() {
		let mut first = flatten(&directory! { "a.txt" => "a" }, &root()).unwrap();
		first.merge(flatten(&directory! { "b.txt" => "b" }, &root()).unwrap());
		assert_eq!(first, table(&["a.txt", "b.txt"]));

		let moved = first.rerooted(Path::new("/elsewhere"));
		assert_eq!(moved.get("b.txt"), Some(Path::new("/elsewhere/b.txt")));
		assert_eq!(moved.len(), 2);
	}

	#[test]
	#[should_panic(expected = "no fixture path declared")]
	fn indexing_an_unknown_key_panics() {
		let _ = &PathTable::new()["missing"];
	}
}

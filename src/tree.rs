//! Declarative directory trees.
//!
//! A [`Directory`] maps item names to [`DirectoryItem`]s. Names may contain single `/` separators, so
//! `"c/b/a.txt"` declares `c` and `c/b` implicitly.

use std::{fmt, future::Future, path::{Path, PathBuf}, sync::Arc};

use futures::future::{BoxFuture, FutureExt as _};

type SyncProducer = dyn Fn(&Path) -> color_eyre::Result<()> + Send + Sync;
type AsyncProducer = dyn Fn(PathBuf) -> BoxFuture<'static, color_eyre::Result<()>> + Send + Sync;

/// A callback that writes a file itself, given the file's absolute path.
///
/// The parent directory is NOT created beforehand. A producer under `"nested/file.txt"` has to
/// create `nested` on its own unless something else in the tree already does.
#[derive(Clone)]
pub enum FileProducer {
	Sync(Arc<SyncProducer>),
	Async(Arc<AsyncProducer>),
}

impl FileProducer {
	/// A blocking callback, run on the task that writes the tree.
	pub fn sync<F>(f: F) -> Self
	where
		F: Fn(&Path) -> color_eyre::Result<()> + Send + Sync + 'static, {
		Self::Sync(Arc::new(f))
	}

	/// An async callback; it receives an owned path so the future can be `'static`.
	pub fn future<F, Fut>(f: F) -> Self
	where
		F: Fn(PathBuf) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = color_eyre::Result<()>> + Send + 'static, {
		Self::Async(Arc::new(move |path| f(path).boxed()))
	}

	pub(crate) async fn produce(&self, path: &Path) -> color_eyre::Result<()> {
		match self {
			Self::Sync(f) => f(path),
			Self::Async(f) => f(path.to_path_buf()).await,
		}
	}
}

impl fmt::Debug for FileProducer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Sync(_) => f.write_str("FileProducer::Sync(..)"),
			Self::Async(_) => f.write_str("FileProducer::Async(..)"),
		}
	}
}

#[derive(Clone, Debug)]
pub enum DirectoryItem {
	/// Written verbatim, replacing whatever was there.
	Content(String),
	/// Writes the file itself, see [`FileProducer`].
	Producer(FileProducer),
	/// Reserves the name; nothing is written.
	Skip,
	/// A nested directory; an empty one is still created.
	Directory(Directory),
}

impl DirectoryItem {
	/// Whether this item is a nested [`Directory`].
	pub fn is_directory(&self) -> bool {
		matches!(self, Self::Directory(_))
	}
}

impl From<&str> for DirectoryItem {
	fn from(content: &str) -> Self {
		Self::Content(content.to_owned())
	}
}

impl From<String> for DirectoryItem {
	fn from(content: String) -> Self {
		Self::Content(content)
	}
}

impl From<FileProducer> for DirectoryItem {
	fn from(producer: FileProducer) -> Self {
		Self::Producer(producer)
	}
}

impl From<Directory> for DirectoryItem {
	fn from(directory: Directory) -> Self {
		Self::Directory(directory)
	}
}

impl From<()> for DirectoryItem {
	fn from(_: ()) -> Self {
		Self::Skip
	}
}

impl<T: Into<DirectoryItem>> From<Option<T>> for DirectoryItem {
	fn from(item: Option<T>) -> Self {
		item.map_or(Self::Skip, Into::into)
	}
}

/// Insertion-ordered mapping from item name to [`DirectoryItem`].
///
/// Names are unique: inserting an existing name replaces its item and keeps its position.
#[derive(Clone, Debug, Default)]
pub struct Directory {
	entries: Vec<(String, DirectoryItem)>,
}

impl Directory {
	/// An empty directory.
	pub fn new() -> Self {
		Self::default()
	}

	/// Add `item` under `name`, replacing any item already there. Names are checked when the tree is used.
	pub fn insert(&mut self, name: impl Into<String>, item: impl Into<DirectoryItem>) -> &mut Self {
		let name = name.into();
		let item = item.into();
		match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
			Some((_, slot)) => *slot = item,
			None => self.entries.push((name, item)),
		}
		self
	}

	/// Builder form of [`insert`](Self::insert).
	pub fn with(mut self, name: impl Into<String>, item: impl Into<DirectoryItem>) -> Self {
		self.insert(name, item);
		self
	}

	/// The item declared under exactly `name`; compound names are not split.
	pub fn get(&self, name: &str) -> Option<&DirectoryItem> {
		self.entries.iter().find(|(existing, _)| existing == name).map(|(_, item)| item)
	}

	/// Items in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &DirectoryItem)> {
		self.entries.iter().map(|(name, item)| (name.as_str(), item))
	}

	/// Number of top-level items.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether no item is declared.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

impl<K: Into<String>, V: Into<DirectoryItem>> FromIterator<(K, V)> for Directory {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut directory = Self::new();
		directory.extend(iter);
		directory
	}
}

impl<K: Into<String>, V: Into<DirectoryItem>> Extend<(K, V)> for Directory {
	fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
		for (name, item) in iter {
			self.insert(name, item);
		}
	}
}

/// Build a [`Directory`] literally.
///
/// Nested `{ .. }` blocks are directories, `()` is [`DirectoryItem::Skip`], anything else goes through
/// `Into<DirectoryItem>`. Items spanning more than one token tree need parentheses.
///
/// ```
/// use tree_fixtures::{directory, DirectoryItem, FileProducer};
///
/// let tree = directory! {
/// 	"a.txt" => "a",
/// 	"b" => {
/// 		"a.txt" => "b-a",
/// 	},
/// 	"c/a/a.txt" => "c-a-a",
/// 	"empty" => {},
/// 	"reserved" => (),
/// 	"produced.txt" => (FileProducer::sync(|path| Ok(std::fs::write(path, "p")?))),
/// };
/// assert_eq!(tree.len(), 6);
/// assert!(tree.get("b").is_some_and(DirectoryItem::is_directory));
/// ```
#[macro_export]
macro_rules! directory {
	(@item { $($inner:tt)* }) => {
		$crate::DirectoryItem::Directory($crate::directory!($($inner)*))
	};
	(@item ()) => {
		$crate::DirectoryItem::Skip
	};
	(@item $value:expr) => {
		$crate::DirectoryItem::from($value)
	};
	() => {
		$crate::Directory::new()
	};
	($($name:expr => $item:tt),+ $(,)?) => {{
		let mut directory = $crate::Directory::new();
		$(directory.insert($name, $crate::directory!(@item $item));)+
		directory
	}};
}

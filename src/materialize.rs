//! Writing a [`Directory`] to disk.
//!
//! The declared tree (or several layered trees) is first validated and merged into one node per target
//! path, so the concurrent writes below never race on the same file.

use std::path::{Path, PathBuf};

use futures::future::{BoxFuture, FutureExt as _, try_join_all};
use tracing::{debug, trace};

use crate::{
	error::{FixtureCreationError, Result, ValidationError},
	tree::{Directory, DirectoryItem, FileProducer},
	validate::{SEPARATOR, validate_name},
};

#[derive(Debug)]
enum Node {
	Dir(DirNode),
	Content(String),
	Producer(FileProducer),
	Skip,
}

/// A directory after merging.
///
/// `explicit` is false for directories that only exist because a compound name (`"a/b.txt"`) passes
/// through them.
#[derive(Debug, Default)]
struct DirNode {
	explicit: bool,
	children: Vec<(String, Node)>,
}

impl DirNode {
	fn position(&self, name: &str) -> Option<usize> {
		self.children.iter().position(|(existing, _)| existing == name)
	}

	fn set(&mut self, name: &str, node: Node) {
		match self.position(name) {
			Some(idx) => self.children[idx].1 = node,
			None => self.children.push((name.to_owned(), node)),
		}
	}

	/// The child directory `name`, replacing a file of that name if there is one.
	fn dir_mut(&mut self, name: &str) -> &mut DirNode {
		let idx = match self.position(name) {
			Some(idx) => {
				if !matches!(self.children[idx].1, Node::Dir(_)) {
					self.children[idx].1 = Node::Dir(DirNode::default());
				}
				idx
			}
			None => {
				self.children.push((name.to_owned(), Node::Dir(DirNode::default())));
				self.children.len() - 1
			}
		};
		match &mut self.children[idx].1 {
			Node::Dir(dir) => dir,
			_ => unreachable!("child was just made a directory"),
		}
	}

	fn merge(&mut self, tree: &Directory) -> Result<(), ValidationError> {
		for (name, item) in tree.iter() {
			validate_name(name)?;

			let mut segments: Vec<&str> = name.split(SEPARATOR).collect();
			let last = segments.pop().unwrap_or(name);
			let mut parent = &mut *self;
			for segment in segments {
				parent = parent.dir_mut(segment);
			}

			match item {
				DirectoryItem::Directory(children) => {
					let dir = parent.dir_mut(last);
					dir.explicit = true;
					dir.merge(children)?;
				}
				DirectoryItem::Content(content) => parent.set(last, Node::Content(content.clone())),
				DirectoryItem::Producer(producer) => parent.set(last, Node::Producer(producer.clone())),
				DirectoryItem::Skip =>
					if parent.position(last).is_none() {
						parent.set(last, Node::Skip);
					},
			}
		}
		Ok(())
	}

	/// Whether the directory is created before its children are written.
	///
	/// Implicit directories holding only producers are left alone: producers get no parent for free.
	fn needs_creation(&self) -> bool {
		self.explicit
			|| self.children.iter().any(|(_, node)| match node {
				Node::Content(_) => true,
				Node::Dir(dir) => dir.needs_creation(),
				Node::Producer(_) | Node::Skip => false,
			})
	}
}

async fn create_dir(path: &Path) -> Result<(), FixtureCreationError> {
	tokio::fs::create_dir_all(path).await.map_err(|e| FixtureCreationError::io(path, e))?;
	trace!(path = %path.display(), "created directory");
	Ok(())
}

fn write_children<'a>(dir: &'a DirNode, path: &'a Path) -> BoxFuture<'a, Result<(), FixtureCreationError>> {
	async move {
		try_join_all(dir.children.iter().map(|(name, node)| write_node(node, path.join(name)))).await?;
		Ok(())
	}
	.boxed()
}

async fn write_node(node: &Node, path: PathBuf) -> Result<(), FixtureCreationError> {
	match node {
		Node::Skip => Ok(()),
		Node::Content(content) => {
			tokio::fs::write(&path, content).await.map_err(|e| FixtureCreationError::io(&path, e))?;
			trace!(path = %path.display(), bytes = content.len(), "wrote fixture file");
			Ok(())
		}
		Node::Producer(producer) => producer.produce(&path).await.map_err(|e| FixtureCreationError::producer(&path, e)),
		Node::Dir(dir) => {
			if dir.needs_creation() {
				create_dir(&path).await?;
			}
			write_children(dir, &path).await
		}
	}
}

/// Write `tree` under `base_dir`, creating `base_dir` first.
///
/// Every name is validated before anything is written. Siblings are written concurrently; a directory
/// always exists before its children are written. Existing files at declared paths are overwritten.
pub async fn materialize(tree: &Directory, base_dir: &Path) -> Result<()> {
	materialize_layers(std::slice::from_ref(tree), base_dir).await
}

/// Like [`materialize`], with later layers winning over earlier ones for the same file path.
pub(crate) async fn materialize_layers(layers: &[Directory], base_dir: &Path) -> Result<()> {
	let mut root = DirNode {
		explicit: true,
		children: Vec::new(),
	};
	for layer in layers {
		root.merge(layer)?;
	}

	debug!(base_dir = %base_dir.display(), layers = layers.len(), "materializing fixture tree");
	create_dir(base_dir).await?;
	write_children(&root, base_dir).await?;
	Ok(())
}

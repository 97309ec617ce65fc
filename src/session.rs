//! Fixture sessions: a root directory bound to the trees written into it.

use std::{
	ffi::OsString,
	fmt, io,
	path::{Component, Path, PathBuf},
	sync::Arc,
};

use futures::future::try_join_all;
use rand::{Rng as _, distributions::Alphanumeric};
use tracing::debug;

use crate::{
	clone::{ReflinkCloner, TreeCloner},
	config::{Cleanup, FixtureConfig},
	error::{Error, ForkConflictError, Result},
	materialize::{materialize, materialize_layers},
	paths::{PathTable, flatten},
	text::render_tree,
	tree::Directory,
};

const SUFFIX_LENGTH: usize = 10;

type RootDirGenerator = dyn Fn() -> PathBuf + Send + Sync;

/// Makes [`Fixture`]s. Holds the root directory generator, the [`FixtureConfig`] and the
/// [`TreeCloner`] used by forks.
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> tree_fixtures::Result<()> {
/// use tree_fixtures::{directory, FixtureCreator};
///
/// let creator = FixtureCreator::temp();
/// let fixture = creator.create(directory! { "a.txt" => "a", "b" => { "a.txt" => "b-a" } }).await?;
/// assert_eq!(std::fs::read_to_string(&fixture.paths()["b/a.txt"]).unwrap(), "b-a");
///
/// let forked = fixture.fork(directory! { "c.txt" => "c" }).await?;
/// assert_ne!(forked.root_dir(), fixture.root_dir());
/// assert!(forked.join(["a.txt"]).exists());
///
/// forked.rm_root_dir().await?;
/// fixture.rm_root_dir().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FixtureCreator {
	generate_root_dir: Arc<RootDirGenerator>,
	config: FixtureConfig,
	cloner: Arc<dyn TreeCloner>,
}

impl FixtureCreator {
	/// `generate_root_dir` is called once per [`create`](Self::create) and [`fork`](Fixture::fork).
	pub fn new(generate_root_dir: impl Fn() -> PathBuf + Send + Sync + 'static) -> Self {
		Self {
			generate_root_dir: Arc::new(generate_root_dir),
			config: FixtureConfig::default(),
			cloner: Arc::new(ReflinkCloner),
		}
	}

	/// Always the same root. Forks then need an explicit root, see [`Fixture::fork_in`].
	pub fn fixed(root_dir: impl Into<PathBuf>) -> Self {
		let root_dir = root_dir.into();
		Self::new(move || root_dir.clone())
	}

	/// A fresh `fixture_<random>` directory under `base_dir` per session.
	///
	/// Give each test worker its own `base_dir` and nothing is shared between them.
	pub fn random_under(base_dir: impl Into<PathBuf>) -> Self {
		let base_dir = base_dir.into();
		Self::new(move || base_dir.join(random_dir_name()))
	}

	/// [`random_under`](Self::random_under) the system temp directory.
	pub fn temp() -> Self {
		Self::random_under(std::env::temp_dir().join("tree_fixtures"))
	}

	/// Replace the [`FixtureConfig`] for fixtures made from now on.
	pub fn with_config(mut self, config: FixtureConfig) -> Self {
		self.config = config;
		self
	}

	/// Replace the [`TreeCloner`] used by forks.
	pub fn with_cloner(mut self, cloner: impl TreeCloner + 'static) -> Self {
		self.cloner = Arc::new(cloner);
		self
	}

	/// Settings applied to every fixture this creator makes.
	pub fn config(&self) -> &FixtureConfig {
		&self.config
	}

	/// Create a fixture under a freshly generated root.
	pub async fn create(&self, tree: Directory) -> Result<Fixture> {
		self.create_in(tree, self.generate()).await
	}

	/// Create a fixture under `root_dir`; the generator is not called.
	pub async fn create_in(&self, tree: Directory, root_dir: impl AsRef<Path>) -> Result<Fixture> {
		let root_dir = resolve_root(root_dir.as_ref());
		let paths = flatten(&tree, &root_dir)?;
		debug!(root_dir = %root_dir.display(), paths = paths.len(), write = self.config.write, "creating fixture");

		if self.config.write {
			clean(&root_dir, self.config.cleanup).await?;
			materialize(&tree, &root_dir).await?;
		}
		Ok(Fixture {
			root_dir,
			paths,
			layers: vec![tree],
			creator: self.clone(),
		})
	}

	fn generate(&self) -> PathBuf {
		(self.generate_root_dir)()
	}
}

impl fmt::Debug for FixtureCreator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FixtureCreator").field("config", &self.config).finish_non_exhaustive()
	}
}

fn random_dir_name() -> String {
	let suffix: String = rand::thread_rng().sample_iter(&Alphanumeric).take(SUFFIX_LENGTH).map(char::from).collect();
	format!("fixture_{suffix}")
}

fn resolve_root(root_dir: &Path) -> PathBuf {
	std::path::absolute(root_dir).unwrap_or_else(|_| root_dir.to_path_buf())
}

/// `path` with symlinks and `..` resolved as far as it exists on disk; the missing tail is applied lexically.
async fn resolve_existing(path: &Path) -> PathBuf {
	let mut existing = path.to_path_buf();
	let mut tail: Vec<OsString> = Vec::new();
	let mut resolved = loop {
		if let Ok(resolved) = tokio::fs::canonicalize(&existing).await {
			break resolved;
		}
		let mut components = existing.components();
		let last = match components.next_back() {
			Some(Component::Normal(name)) => name.to_owned(),
			Some(Component::ParentDir) => OsString::from(".."),
			Some(Component::CurDir) => OsString::from("."),
			_ => return path.to_path_buf(),
		};
		tail.push(last);
		existing = components.as_path().to_path_buf();
	};
	for name in tail.iter().rev() {
		match name.to_str() {
			Some("..") => {
				resolved.pop();
			}
			Some(".") => {}
			_ => resolved.push(name),
		}
	}
	resolved
}

/// Whether one root is the other or contains it.
async fn roots_overlap(a: &Path, b: &Path) -> bool {
	let (a, b) = (resolve_existing(a).await, resolve_existing(b).await);
	a.starts_with(&b) || b.starts_with(&a)
}

fn remove_error(path: &Path) -> impl FnOnce(io::Error) -> Error {
	let path = path.to_path_buf();
	move |source| Error::Remove { path, source }
}

/// Remove a file or directory tree; a missing path is not an error.
async fn remove_path(path: &Path) -> io::Result<()> {
	let metadata = match tokio::fs::symlink_metadata(path).await {
		Ok(metadata) => metadata,
		Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
		Err(e) => return Err(e),
	};
	let removed = match metadata.is_dir() {
		true => tokio::fs::remove_dir_all(path).await,
		false => tokio::fs::remove_file(path).await,
	};
	match removed {
		Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
		other => other,
	}
}

async fn remove_children(dir: &Path) -> Result<()> {
	let mut entries = match tokio::fs::read_dir(dir).await {
		Ok(entries) => entries,
		Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
		Err(e) => return Err(remove_error(dir)(e)),
	};
	let mut children = Vec::new();
	while let Some(entry) = entries.next_entry().await.map_err(remove_error(dir))? {
		children.push(entry.path());
	}

	try_join_all(children.iter().map(|child| async move { remove_path(child).await.map_err(remove_error(child)) })).await?;
	Ok(())
}

async fn clean(root_dir: &Path, cleanup: Cleanup) -> Result<()> {
	match cleanup {
		Cleanup::RemoveRootDir => remove_path(root_dir).await.map_err(remove_error(root_dir)),
		Cleanup::RemoveFixtures => remove_children(root_dir).await,
		Cleanup::Keep => Ok(()),
	}
}

/// A fixture tree written under a root directory.
///
/// Cheap to clone. [`add_fixtures`](Self::add_fixtures) and [`fork`](Self::fork) return new sessions and
/// leave this one as it was.
#[derive(Clone)]
pub struct Fixture {
	root_dir: PathBuf,
	paths: PathTable,
	/// Every tree declared for this session, oldest first.
	layers: Vec<Directory>,
	creator: FixtureCreator,
}

impl Fixture {
	/// Absolute root directory of this fixture.
	pub fn root_dir(&self) -> &Path {
		&self.root_dir
	}

	/// Logical path -> absolute path for everything declared so far, ancestors included.
	pub fn paths(&self) -> &PathTable {
		&self.paths
	}

	/// Join `segments` onto the root without checking that anything exists.
	///
	/// Leading `/` are ignored, so `join(["/a.txt"])` stays inside the root; empty segments are skipped.
	pub fn join<I, S>(&self, segments: I) -> PathBuf
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>, {
		let mut path = self.root_dir.clone();
		for segment in segments {
			let segment = segment.as_ref().trim_start_matches('/');
			if !segment.is_empty() {
				path.push(segment);
			}
		}
		path
	}

	/// Remove the root directory and everything under it.
	pub async fn rm_root_dir(&self) -> Result<()> {
		debug!(root_dir = %self.root_dir.display(), "removing fixture root");
		clean(&self.root_dir, Cleanup::RemoveRootDir).await
	}

	/// Remove everything under the root directory, keeping the root itself.
	pub async fn rm_fixtures(&self) -> Result<()> {
		debug!(root_dir = %self.root_dir.display(), "removing fixtures");
		clean(&self.root_dir, Cleanup::RemoveFixtures).await
	}

	/// Write `tree` into this root and return a session that knows its paths too.
	///
	/// Always writes, whatever [`FixtureConfig::write`] says.
	pub async fn add_fixtures(&self, tree: Directory) -> Result<Fixture> {
		let added = flatten(&tree, &self.root_dir)?;
		debug!(root_dir = %self.root_dir.display(), paths = added.len(), "adding fixtures");
		materialize(&tree, &self.root_dir).await?;

		let mut paths = self.paths.clone();
		paths.merge(added);
		let mut layers = self.layers.clone();
		layers.push(tree);
		Ok(Fixture {
			root_dir: self.root_dir.clone(),
			paths,
			layers,
			creator: self.creator.clone(),
		})
	}

	/// Copy this fixture into a freshly generated root, then write `tree` on top.
	///
	/// This fixture's files are left in place.
	pub async fn fork(&self, tree: Directory) -> Result<Fixture> {
		self.fork_in(tree, self.creator.generate()).await
	}

	/// [`fork`](Self::fork) into `root_dir`.
	///
	/// `root_dir` must not be this fixture's root, also when spelled through `..` or a symlink, and neither
	/// root may contain the other. Nothing is touched on conflict.
	pub async fn fork_in(&self, tree: Directory, root_dir: impl AsRef<Path>) -> Result<Fixture> {
		let root_dir = resolve_root(root_dir.as_ref());
		if roots_overlap(&root_dir, &self.root_dir).await {
			return Err(ForkConflictError { root: root_dir }.into());
		}
		let added = flatten(&tree, &root_dir)?;
		debug!(from = %self.root_dir.display(), to = %root_dir.display(), "forking fixture");

		let config = &self.creator.config;
		if config.write {
			clean(&root_dir, config.cleanup).await?;
		}
		materialize(&Directory::new(), &root_dir).await?;
		self.creator.cloner.clone_tree(&self.root_dir, &root_dir).await.map_err(|source| Error::Clone {
			from: self.root_dir.clone(),
			to: root_dir.clone(),
			source,
		})?;
		materialize(&tree, &root_dir).await?;

		let mut paths = self.paths.rerooted(&root_dir);
		paths.merge(added);
		let mut layers = self.layers.clone();
		layers.push(tree);
		Ok(Fixture {
			root_dir,
			paths,
			layers,
			creator: self.creator.clone(),
		})
	}

	/// Remove the root and write every declared tree again.
	pub async fn reset(&self) -> Result<()> {
		debug!(root_dir = %self.root_dir.display(), "resetting fixture");
		self.rm_root_dir().await?;
		materialize_layers(&self.layers, &self.root_dir).await
	}

	/// Replace every occurrence of the root directory in `text` with the configured placeholder.
	///
	/// Handy for snapshotting output that embeds absolute fixture paths.
	pub fn mask_root_dir(&self, text: &str) -> String {
		text.replace(self.root_dir.to_string_lossy().as_ref(), &self.creator.config.placeholder)
	}

	/// Render every file under the root in `//- /path` form, see [`render_tree`].
	pub fn snapshot(&self) -> io::Result<String> {
		render_tree(&self.root_dir)
	}
}

impl fmt::Debug for Fixture {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Fixture").field("root_dir", &self.root_dir).field("paths", &self.paths).finish_non_exhaustive()
	}
}

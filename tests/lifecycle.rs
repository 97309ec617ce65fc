use std::{
	fs,
	path::{Path, PathBuf},
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};

use tree_fixtures::{Cleanup, CopyCloner, FixtureConfig, FixtureCreator, directory};

/// Hands out `<base>/1`, `<base>/2`, ... in order.
fn numbered_roots(base: &Path) -> (FixtureCreator, Arc<AtomicUsize>) {
	let base = base.to_path_buf();
	let calls = Arc::new(AtomicUsize::new(0));
	let counter = calls.clone();
	let creator = FixtureCreator::new(move || base.join((counter.fetch_add(1, Ordering::SeqCst) + 1).to_string()));
	(creator, calls)
}

fn read(path: &Path) -> String {
	fs::read_to_string(path).unwrap()
}

fn listed(fixture: &tree_fixtures::Fixture) -> Vec<(String, PathBuf)> {
	fixture.paths().iter().map(|(key, path)| (key.to_owned(), path.to_path_buf())).collect()
}

fn expected(root: &Path, keys: &[&str]) -> Vec<(String, PathBuf)> {
	keys.iter().map(|key| ((*key).to_owned(), root.join(key))).collect()
}

#[tokio::test]
async fn create_add_fork_and_fork_again() {
	let td = tempfile::tempdir().unwrap();
	let (creator, calls) = numbered_roots(td.path());
	let (dir1, dir2, dir3) = (td.path().join("1"), td.path().join("2"), td.path().join("3"));

	let first = creator.create(directory! { "a.txt" => "a", "b" => { "a.txt" => "b-a" } }).await.unwrap();
	assert_eq!(first.join(["a.txt"]), dir1.join("a.txt"));
	assert_eq!(first.join(["b/a.txt"]), dir1.join("b/a.txt"));
	assert_eq!(listed(&first), expected(&dir1, &["a.txt", "b", "b/a.txt"]));
	assert_eq!(read(first.join(["a.txt"]).as_path()), "a");
	assert_eq!(read(first.join(["b/a.txt"]).as_path()), "b-a");

	let second = first.add_fixtures(directory! { "c.txt" => "c" }).await.unwrap();
	assert_eq!(second.root_dir(), dir1);
	assert_eq!(listed(&second), expected(&dir1, &["a.txt", "b", "b/a.txt", "c.txt"]));
	assert_eq!(read(&second.paths()["c.txt"]), "c");
	// The older session still reports only what it declared.
	assert_eq!(listed(&first), expected(&dir1, &["a.txt", "b", "b/a.txt"]));

	let third = second.fork(directory! { "b" => { "b.txt" => "b-b" } }).await.unwrap();
	assert_eq!(listed(&third), expected(&dir2, &["a.txt", "b", "b/a.txt", "b/b.txt", "c.txt"]));
	assert_eq!(read(&third.paths()["b/b.txt"]), "b-b");
	assert_eq!(read(&third.paths()["b/a.txt"]), "b-a");
	assert!(!dir1.join("b/b.txt").exists());

	let fourth = third.fork(directory! { "d.txt" => "d" }).await.unwrap();
	assert_eq!(listed(&fourth), expected(&dir3, &["a.txt", "b", "b/a.txt", "b/b.txt", "c.txt", "d.txt"]));
	insta::assert_snapshot!("fork_of_fork_tree", fourth.snapshot().unwrap());

	assert_eq!(calls.load(Ordering::SeqCst), 3);
	for fixture in [&first, &third, &fourth] {
		fixture.rm_root_dir().await.unwrap();
		assert!(!fixture.root_dir().exists());
	}
}

#[tokio::test]
async fn reset_restores_every_layer_of_a_fork() {
	let td = tempfile::tempdir().unwrap();
	let (creator, _) = numbered_roots(td.path());

	let base = creator.create(directory! { "a.txt" => "a", "b/a.txt" => "b-a" }).await.unwrap();
	let added = base.add_fixtures(directory! { "a.txt" => "a#2" }).await.unwrap();
	let forked = added.fork(directory! { "c.txt" => "c" }).await.unwrap();

	fs::write(&forked.paths()["a.txt"], "scribbled").unwrap();
	fs::remove_dir_all(&forked.paths()["b"]).unwrap();
	fs::write(forked.join(["stray.txt"]), "stray").unwrap();

	forked.reset().await.unwrap();
	assert_eq!(read(&forked.paths()["a.txt"]), "a#2");
	assert_eq!(read(&forked.paths()["b/a.txt"]), "b-a");
	assert_eq!(read(&forked.paths()["c.txt"]), "c");
	assert!(!forked.join(["stray.txt"]).exists());
	// Resetting the fork leaves its source alone.
	assert_eq!(read(&base.paths()["a.txt"]), "a#2");
	assert!(!base.join(["c.txt"]).exists());
}

#[tokio::test]
async fn removals() {
	let td = tempfile::tempdir().unwrap();
	let (creator, _) = numbered_roots(td.path());
	let fixture = creator.create(directory! { "a.txt" => "a", "b" => { "a.txt" => "b-a" }, "empty" => {} }).await.unwrap();

	fixture.rm_fixtures().await.unwrap();
	assert!(fixture.root_dir().is_dir());
	assert_eq!(fs::read_dir(fixture.root_dir()).unwrap().count(), 0);

	fixture.rm_root_dir().await.unwrap();
	assert!(!fixture.root_dir().exists());
	// Both are no-ops once the root is gone.
	fixture.rm_root_dir().await.unwrap();
	fixture.rm_fixtures().await.unwrap();
}

#[tokio::test]
async fn keep_cleanup_and_copy_cloner() {
	let td = tempfile::tempdir().unwrap();
	let root = td.path().join("root");
	fs::create_dir_all(&root).unwrap();
	fs::write(root.join("existing.txt"), "kept").unwrap();

	let creator = FixtureCreator::fixed(&root)
		.with_config(FixtureConfig { cleanup: Cleanup::Keep, ..FixtureConfig::default() })
		.with_cloner(CopyCloner);
	let fixture = creator.create(directory! { "a.txt" => "a" }).await.unwrap();
	assert_eq!(read(&root.join("existing.txt")), "kept");
	assert!(!fixture.paths().contains("existing.txt"));

	let forked = fixture.fork_in(directory! {}, td.path().join("copy")).await.unwrap();
	assert_eq!(read(&forked.join(["existing.txt"])), "kept");
	assert_eq!(read(&forked.paths()["a.txt"]), "a");
}

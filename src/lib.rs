//! Declarative file-tree fixtures for tests.
//!
//! Describe a directory tree as data, write it under a root directory, and get back a table of the
//! absolute path of everything you declared.
//!
//! # Declaring a tree
//!
//! ```
//! use std::path::Path;
//! use tree_fixtures::{directory, flatten};
//!
//! let tree = directory! {
//! 	"a.txt" => "a",
//! 	"b" => {
//! 		"a.txt" => "b-a",
//! 	},
//! 	"c/a/a.txt" => "c-a-a",
//! };
//! let paths = flatten(&tree, Path::new("/fixtures")).unwrap();
//! assert_eq!(&paths["c/a"], Path::new("/fixtures/c/a"));
//! ```
//!
//! Names may contain single `/` separators, which stand for nested directories. Items are file
//! contents, [`FileProducer`] callbacks, nested [`Directory`]s, or `()` to reserve a name without
//! writing anything.
//!
//! # Sessions
//!
//! ```
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> tree_fixtures::Result<()> {
//! use tree_fixtures::{directory, FixtureCreator};
//!
//! let base = FixtureCreator::temp().create(directory! { "Cargo.toml" => "[package]" }).await?;
//! let with_src = base.add_fixtures(directory! { "src/lib.rs" => "" }).await?;
//! assert!(with_src.paths().contains("src"));
//!
//! // An independent copy to mutate freely.
//! let forked = with_src.fork(directory! { "src/main.rs" => "fn main() {}" }).await?;
//! std::fs::remove_file(&forked.paths()["Cargo.toml"]).unwrap();
//! assert!(base.paths()["Cargo.toml"].exists());
//!
//! forked.reset().await?;
//! assert!(forked.paths()["Cargo.toml"].exists());
//!
//! forked.rm_root_dir().await?;
//! base.rm_root_dir().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Trees as text
//!
//! ```
//! use tree_fixtures::{Directory, trim_indent};
//!
//! let tree = Directory::parse(
//! 	r#"
//! 	//- /src/main.rs
//! 	fn main() {}
//! 	//- /README.md
//! 	hello
//! 	"#,
//! );
//! assert_eq!(tree.len(), 2);
//! assert_eq!(trim_indent("\n    a\n      b\n"), "a\n  b\n");
//! ```
//!
//! [`Fixture::snapshot`] renders a root back into that form, for `insta` snapshots.

pub mod clone;
pub mod config;
pub mod error;
pub mod materialize;
pub mod paths;
pub mod session;
pub mod text;
pub mod tree;
pub mod validate;

pub use clone::{CopyCloner, ReflinkCloner, TreeCloner};
pub use config::{Cleanup, FixtureConfig};
pub use error::{Error, FixtureCreationError, ForkConflictError, Result, ValidationError};
pub use materialize::materialize;
pub use paths::{PathTable, flatten, flatten_with_prefix, self_and_ancestors};
pub use session::{Fixture, FixtureCreator};
pub use text::{render_tree, trim_indent};
pub use tree::{Directory, DirectoryItem, FileProducer};
pub use validate::{SEPARATOR, validate_name};

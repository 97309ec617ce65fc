//! Trees written as text, in the `//- /path` multi-file format:
//!
//! ```text
//! //- /src/main.rs
//! fn main() {}
//! //- /README.md
//! # hi
//! ```

use std::{fs, io, path::Path};

use crate::tree::Directory;

const MARKER: &str = "//-";

impl Directory {
	/// Parse `//- /path` text into a tree. Text without markers becomes a single `main.rs`.
	///
	/// ```
	/// use tree_fixtures::{Directory, DirectoryItem};
	///
	/// let tree = Directory::parse(
	/// 	r#"
	/// 	//- /src/main.rs
	/// 	fn main() {}
	/// 	//- /README.md
	/// 	hello
	/// 	"#,
	/// );
	/// assert!(matches!(tree.get("src/main.rs"), Some(DirectoryItem::Content(text)) if text == "fn main() {}\n"));
	/// assert_eq!(tree.len(), 2);
	/// ```
	///
	/// # Panics
	/// If a marker line carries no path.
	pub fn parse(text: &str) -> Self {
		Self::parse_with_default_path(text, "main.rs")
	}

	/// [`parse`](Self::parse), naming a marker-less file `default_path` instead of `main.rs`.
	pub fn parse_with_default_path(text: &str, default_path: &str) -> Self {
		let text = trim_indent(text);
		let mut tree = Directory::new();

		if !text.contains(MARKER) {
			tree.insert(default_path.trim_start_matches('/'), text);
			return tree;
		}

		let mut current: Option<(String, String)> = None;
		for line in text.split_inclusive('\n') {
			match line.strip_prefix(MARKER) {
				Some(meta) => {
					if let Some((path, body)) = current.take() {
						tree.insert(path, body);
					}
					let path = meta.split_whitespace().next().unwrap_or_else(|| panic!("fixture marker without a path: {line:?}"));
					current = Some((path.trim_start_matches('/').to_owned(), String::new()));
				}
				None =>
					if let Some((_, body)) = current.as_mut() {
						body.push_str(line);
					},
			}
		}
		if let Some((path, body)) = current {
			tree.insert(path, body);
		}
		tree
	}
}

/// Remove common leading indentation from all lines, and a single leading newline.
pub fn trim_indent(text: &str) -> String {
	let text = text.strip_prefix('\n').unwrap_or(text);
	let indent = text.lines().filter(|it| !it.trim().is_empty()).map(|it| it.len() - it.trim_start().len()).min().unwrap_or(0);
	text.split_inclusive('\n')
		.map(|line| if line.len() <= indent { line.trim_start_matches([' ', '\t']) } else { &line[indent..] })
		.collect()
}

/// Render every file under `root` in `//- /path` form, sorted by path.
///
/// Files that are not UTF-8 show up as `<binary: N bytes>`. Directories are only visible through the
/// files they hold.
pub fn render_tree(root: &Path) -> io::Result<String> {
	let mut files = Vec::new();
	for entry in walkdir::WalkDir::new(root).min_depth(1) {
		let entry = entry?;
		if !entry.file_type().is_file() {
			continue;
		}
		let relative = entry.path().strip_prefix(root).map_err(io::Error::other)?;
		let key = relative.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/");
		let bytes = fs::read(entry.path())?;
		let text = match String::from_utf8(bytes) {
			Ok(text) => text,
			Err(e) => format!("<binary: {} bytes>", e.as_bytes().len()),
		};
		files.push((key, text));
	}
	files.sort_by(|a, b| a.0.cmp(&b.0));

	let mut result = String::new();
	for (path, text) in &files {
		result.push_str("//- /");
		result.push_str(path);
		result.push('\n');
		result.push_str(text);
		if !text.ends_with('\n') {
			result.push('\n');
		}
	}
	Ok(result)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{DirectoryItem, directory, materialize};

	fn content<'a>(tree: &'a Directory, name: &str) -> &'a str {
		match tree.get(name) {
			Some(DirectoryItem::Content(text)) => text,
			other => panic!("expected content at {name}, got {other:?}"),
		}
	}

	#[test]
	fn test_trim_indent() {
		let input = r#"
            fn main() {
                println!("hello");
            }
        "#;
		assert_eq!(trim_indent(input), "fn main() {\n    println!(\"hello\");\n}\n");
		assert_eq!(trim_indent("\n\t\ta\n\t\t\tb\n"), "a\n\tb\n");
	}

	#[test]
	fn parse_single_file() {
		let tree = Directory::parse(
			r#"
            fn main() {}
        "#,
		);
		assert_eq!(tree.len(), 1);
		assert_eq!(content(&tree, "main.rs"), "fn main() {}\n");

		let tree = Directory::parse_with_default_path("x", "/lib.rs");
		assert_eq!(content(&tree, "lib.rs"), "x");
	}

	#[test]
	fn parse_multi_file() {
		let tree = Directory::parse(
			r#"
            //- /main.rs
            mod foo;
            fn main() { foo::bar(); }

            //- /src/foo.rs
            pub fn bar() {}
        "#,
		);
		let names: Vec<_> = tree.iter().map(|(name, _)| name).collect();
		assert_eq!(names, ["main.rs", "src/foo.rs"]);
		assert_eq!(content(&tree, "main.rs"), "mod foo;\nfn main() { foo::bar(); }\n\n");
		assert_eq!(content(&tree, "src/foo.rs"), "pub fn bar() {}\n");
	}

	#[test]
	#[should_panic(expected = "fixture marker without a path")]
	fn marker_without_path_panics() {
		Directory::parse("//-\nbody\n");
	}

	#[tokio::test]
	async fn render_what_was_written() {
		let td = tempfile::tempdir().unwrap();
		let tree = directory! {
			"b" => { "a.txt" => "b-a" },
			"a.txt" => "a\n",
			"empty" => {},
		};
		materialize(&tree, td.path()).await.unwrap();
		std::fs::write(td.path().join("blob.bin"), [0xff, 0xfe, 0x00]).unwrap();

		let rendered = render_tree(td.path()).unwrap();
		assert_eq!(rendered, "//- /a.txt\na\n//- /b/a.txt\nb-a\n//- /blob.bin\n<binary: 3 bytes>\n");
	}

	#[tokio::test]
	async fn parsed_text_renders_back() {
		let text = "//- /README.md\n# hi\n//- /src/main.rs\nfn main() {}\n";
		let td = tempfile::tempdir().unwrap();
		materialize(&Directory::parse(text), td.path()).await.unwrap();
		assert_eq!(render_tree(td.path()).unwrap(), text);
	}

	#[test]
	fn render_missing_root_fails() {
		let td = tempfile::tempdir().unwrap();
		assert!(render_tree(&td.path().join("missing")).is_err());
	}
}

//! Duplicating a fixture root into a new root, used by [`Fixture::fork`](crate::Fixture::fork).

use std::{
	io,
	path::{Path, PathBuf},
};

use fs_extra::dir::{CopyOptions, copy as dir_copy};
use futures::future::{BoxFuture, FutureExt as _};
use tracing::debug;

/// Copies the contents of one directory into another, existing, directory.
///
/// Implement this to plug in a host-specific snapshot mechanism.
pub trait TreeCloner: Send + Sync {
	/// Copy everything under `from` into `to`, overwriting files that exist in both.
	fn clone_tree<'a>(&'a self, from: &'a Path, to: &'a Path) -> BoxFuture<'a, io::Result<()>>;
}

/// Copy-on-write clone through the system `cp` where the platform has one, full copy otherwise.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReflinkCloner;

impl TreeCloner for ReflinkCloner {
	fn clone_tree<'a>(&'a self, from: &'a Path, to: &'a Path) -> BoxFuture<'a, io::Result<()>> {
		async move {
			match clone_on_write(from, to).await {
				Ok(()) => return Ok(()),
				Err(e) => debug!(error = %e, from = %from.display(), "copy-on-write clone unavailable, copying"),
			}
			copy_recursive(from.to_path_buf(), to.to_path_buf()).await
		}
		.boxed()
	}
}

/// Plain recursive copy, never attempting a copy-on-write clone.
#[derive(Clone, Copy, Debug, Default)]
pub struct CopyCloner;

impl TreeCloner for CopyCloner {
	fn clone_tree<'a>(&'a self, from: &'a Path, to: &'a Path) -> BoxFuture<'a, io::Result<()>> {
		copy_recursive(from.to_path_buf(), to.to_path_buf()).boxed()
	}
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
async fn clone_on_write(from: &Path, to: &Path) -> io::Result<()> {
	#[cfg(target_os = "linux")]
	const CLONE_FLAG: &str = "--reflink=auto";
	#[cfg(target_os = "macos")]
	const CLONE_FLAG: &str = "-c";

	let output = tokio::process::Command::new("cp").arg("-R").arg(CLONE_FLAG).arg(from.join(".")).arg(to).output().await?;
	match output.status.success() {
		true => Ok(()),
		false => Err(io::Error::other(String::from_utf8_lossy(&output.stderr).trim().to_owned())),
	}
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
async fn clone_on_write(_from: &Path, _to: &Path) -> io::Result<()> {
	Err(io::Error::new(io::ErrorKind::Unsupported, "no copy-on-write clone on this platform"))
}

async fn copy_recursive(from: PathBuf, to: PathBuf) -> io::Result<()> {
	tokio::task::spawn_blocking(move || {
		let mut options = CopyOptions::new();
		// Contents of `from` land directly in `to`.
		options.content_only = true;
		options.copy_inside = true;
		options.overwrite = true;
		options.buffer_size = 64 * 1024;
		dir_copy(&from, &to, &options).map(drop).map_err(io::Error::other)
	})
	.await
	.map_err(io::Error::other)?
}

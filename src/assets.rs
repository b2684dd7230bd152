//! Copies static files into the output tree: the site-wide public assets and
//! each post's media files. Raster images are re-encoded through
//! [`crate::optimize`] on the way; everything else is copied byte for byte.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use spdlog::{info, warn};
use thiserror::Error;
use walkdir::WalkDir;

use crate::optimize::{optimize, ImageKind};
use crate::post::Post;

/// The directory, relative to the output directory, that public assets are
/// mirrored into.
pub const ASSETS_DIRECTORY: &str = "assets";

/// Mirrors `source` into `destination`, preserving relative paths. A missing
/// `source` directory is not an error; there's simply nothing to copy.
/// Returns the number of files copied.
pub fn copy_public_assets(source: &Path, destination: &Path) -> Result<usize> {
    if !source.is_dir() {
        info!(
            "No public directory found at `{}`; skipping asset copy",
            source.display()
        );
        return Ok(0);
    }

    info!("Copying assets from `{}`", source.display());
    let mut copied = 0;
    for result in WalkDir::new(source).sort_by(|a, b| a.file_name().cmp(b.file_name())) {
        let entry = result?;
        if !entry.file_type().is_file() {
            continue;
        }
        // strip_prefix shouldn't fail since `source` is always an ancestor of
        // the entry's path.
        let relative = entry
            .path()
            .strip_prefix(source)
            .unwrap_or_else(|_| Path::new(entry.file_name()));
        copy_file(entry.path(), &destination.join(relative))?;
        copied += 1;
    }
    Ok(copied)
}

/// Copies each post's media files from its source directory into
/// `posts/{year}/{month}/{slug}/` under `output_directory`. Files that have
/// disappeared since the post was loaded are skipped with a warning.
pub fn copy_post_media(posts: &[Post], output_directory: &Path) -> Result<()> {
    info!("Copying post media");
    for post in posts {
        let destination = post.media_output_directory(output_directory);
        for name in post.media_file_names.iter() {
            let source = post.source_directory.join(name);
            if !source.is_file() {
                warn!(
                    "Media file `{}` of post `{}` no longer exists; skipping it",
                    source.display(),
                    post.slug
                );
                continue;
            }
            copy_file(&source, &destination.join(name))?;
        }
    }
    Ok(())
}

// Copies one file, optimizing it if it's a recognized image.
fn copy_file(source: &Path, destination: &Path) -> Result<()> {
    let io_error = |path: &Path| {
        let path = path.to_owned();
        move |err| Error::Io { path, err }
    };

    if let Some(dir) = destination.parent() {
        fs::create_dir_all(dir).map_err(io_error(dir))?;
    }

    match ImageKind::from_path(source) {
        Some(kind) => {
            let bytes = fs::read(source).map_err(io_error(source))?;
            let optimized = optimize(&bytes, kind).map_err(|err| Error::Image {
                path: source.to_owned(),
                err,
            })?;
            fs::write(destination, optimized).map_err(io_error(destination))
        }
        None => fs::copy(source, destination)
            .map(|_| ())
            .map_err(io_error(destination)),
    }
}

/// The result of a fallible asset operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error copying assets.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when reading, writing, or creating a directory fails.
    #[error("copying `{}`: {}", .path.display(), .err)]
    Io { path: PathBuf, err: io::Error },

    /// Returned when an image can't be decoded or re-encoded.
    #[error("optimizing image `{}`: {}", .path.display(), .err)]
    Image { path: PathBuf, err: image::ImageError },

    /// Returned for WalkDir I/O errors.
    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),
}

//! Mod archive extraction.

use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
	/// The archive could not be read as a zip.
	#[error("{0} is not a valid mod archive.")]
	InvalidArchive(String),
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("zip error: {0}")]
	Zip(#[from] zip::result::ZipError),
}

/// Replaces `destination` with the contents of the zip at `archive`.
///
/// # Parameters
/// - `archive` - A downloaded mod archive.
/// - `destination` - The mod's directory, anything already there is removed first.
///
/// # Errors
/// - [`ContentError::InvalidArchive`] when `archive` isn't a zip.
/// - Any IO or zip error while extracting, `destination` is removed again in that case.
pub fn extract_mod(archive: impl AsRef<Path>, destination: impl AsRef<Path>) -> Result<(), ContentError> {
	let archive = archive.as_ref();
	let destination = destination.as_ref();

	let mut zip = zip::ZipArchive::new(std::fs::File::open(archive)?)
		.map_err(|_| ContentError::InvalidArchive(archive.display().to_string()))?;

	if destination.exists() {
		log::debug!("Removing old contents of {}", destination.display());
		std::fs::remove_dir_all(destination)?;
	}
	std::fs::create_dir_all(destination)?;

	log::info!("Extracting {} to {}", archive.display(), destination.display());
	if let Err(e) = zip.extract(destination) {
		/* Don't leave a half extracted mod behind */
		if let Err(cleanup) = std::fs::remove_dir_all(destination) {
			log::warn!("Failed to clean up {}: {}", destination.display(), cleanup);
		}
		return Err(e.into());
	}
	Ok(())
}

#[cfg(test)]
mod test {
	use std::io::Write;

	use super::*;

	fn write_zip(path: &Path) {
		let mut zip = zip::ZipWriter::new(std::fs::File::create(path).unwrap());
		zip.start_file("SML.uplugin", zip::write::FileOptions::default()).unwrap();
		zip.write_all(b"{}").unwrap();
		zip.finish().unwrap();
	}

	#[test]
	fn extract_replaces_destination() {
		let dir = tempfile::tempdir().unwrap();
		let archive = dir.path().join("sml.zip");
		write_zip(&archive);
		let dest = dir.path().join("Mods").join("SML");
		std::fs::create_dir_all(&dest).unwrap();
		std::fs::write(dest.join("stale.txt"), "old").unwrap();

		extract_mod(&archive, &dest).unwrap();
		assert!(dest.join("SML.uplugin").exists());
		assert!(!dest.join("stale.txt").exists());
	}

	#[test]
	fn extract_rejects_non_zip() {
		let dir = tempfile::tempdir().unwrap();
		let archive = dir.path().join("bad.zip");
		std::fs::write(&archive, "not a zip").unwrap();
		assert!(matches!(extract_mod(&archive, dir.path().join("out")), Err(ContentError::InvalidArchive(_))));
	}
}

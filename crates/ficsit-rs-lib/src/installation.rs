//! Turns a lockfile into mods on disk.

use std::path::Path;

use crate::lockfile::LockFile;

pub mod download;
pub mod content;

/// Downloads and extracts every mod of `lockfile` into `mods_dir`.
///
/// Mods with an empty link are local and left alone. Each mod is extracted to `mods_dir/<reference>`.
/// A dry run only checks the references, nothing is downloaded.
///
/// # Errors
/// - [`Error::Validation`](crate::Error::Validation) for a reference that isn't a plain directory name.
/// - The first download or extraction failure, mods extracted before it stay in place.
pub async fn apply_lockfile(config: &crate::Config, mods_dir: &Path, lockfile: &LockFile) -> crate::Result<()> {
	let client = download::client(config)?;

	for (reference, locked) in lockfile.iter() {
		if locked.is_local() {
			log::debug!("{} has no link, assuming it is installed", reference);
			continue;
		}
		if !crate::is_valid_reference(reference) {
			return Err(crate::Error::Validation(format!("`{}` can't be used as a mod directory", reference)));
		}
		if config.dry_run() {
			log::info!("dry-run: skipping download and extraction of {}", reference);
			continue;
		}
		let archive = download::download_or_cache(config, &client, reference, &locked.hash, &locked.link).await?;
		content::extract_mod(&archive, mods_dir.join(reference))?;
	}
	Ok(())
}

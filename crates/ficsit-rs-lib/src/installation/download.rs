//! Fetches mod archives into the download cache.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur during the download process.
#[derive(Debug, Error)]
pub enum DownloadError {
	/// The mod has no link to download it from.
	#[error("{0} has no download link.")]
	MissingLink(String),
	/// The downloaded content hash does not match the hash in the lockfile.
	#[error("downloaded content hash for {name} does not match, expected {expected} got {actual}.")]
	DifferentHashes {
		name: String,
		expected: String,
		actual: String,
	},
	#[error("server returned {status} for {url}")]
	Status {
		url: String,
		status: reqwest::StatusCode,
	},
	#[error("reqwest error: {0}")]
	Reqwest(#[from] reqwest::Error),
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
}

/// Where an archive with `hash` is stored in the cache.
///
/// Archives are keyed by their hash, `name` is only used when there is no hash.
pub fn cache_path(config: &crate::Config, name: &str, hash: &str) -> PathBuf {
	let key = if hash.is_empty() { name } else { hash };
	config.cache_dir().join(format!("{}.zip", key))
}

/// Builds the client used for downloads, honouring [`Config::https_only()`](crate::Config::https_only()).
pub fn client(config: &crate::Config) -> Result<reqwest::Client, DownloadError> {
	Ok(reqwest::Client::builder()
		.https_only(config.https_only())
		.build()?)
}

fn hash_matches(expected: &str, content: &[u8]) -> Result<(), String> {
	let actual = sha256::digest(content);
	if actual.eq_ignore_ascii_case(expected) {
		Ok(())
	} else {
		Err(actual)
	}
}

async fn cached(config: &crate::Config, path: &Path, hash: &str) -> Result<bool, DownloadError> {
	let content = match tokio::fs::read(path).await {
		Ok(content) => content,
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
		Err(e) => return Err(e.into()),
	};
	if !config.do_checksums() || hash.is_empty() {
		return Ok(true);
	}
	match hash_matches(hash, &content) {
		Ok(()) => Ok(true),
		Err(actual) => {
			log::warn!("Cached archive {} has hash {}, downloading again", path.display(), actual);
			Ok(false)
		},
	}
}

/// Returns the path of the archive for `name`, downloading it from `link` unless the cache holds it.
///
/// # Parameters
/// - `config` - Supplies the cache directory and checksum setting.
/// - `client` - Used for the download, see [`client()`].
/// - `name` - Only used for naming and messages.
/// - `hash` - Expected SHA-256 of the archive.
/// - `link` - Where to download the archive from.
///
/// # Errors
/// - [`DownloadError::MissingLink`] when the archive isn't cached and `link` is empty.
/// - [`DownloadError::DifferentHashes`] when checksums are enabled and the download doesn't match `hash`.
pub async fn download_or_cache(config: &crate::Config, client: &reqwest::Client, name: &str, hash: &str, link: &str) -> Result<PathBuf, DownloadError> {
	let download_path = cache_path(config, name, hash);
	if cached(config, &download_path, hash).await? {
		log::info!("{} already downloaded, skipping.", name);
		return Ok(download_path);
	}

	if link.is_empty() {
		return Err(DownloadError::MissingLink(name.to_string()));
	}

	log::info!("Downloading {} from {}", name, link);
	let response = client.get(link).send().await?;
	if !response.status().is_success() {
		return Err(DownloadError::Status { url: link.to_string(), status: response.status() });
	}
	let content = response.bytes().await?;

	if config.do_checksums() && !hash.is_empty() {
		hash_matches(hash, &content).map_err(|actual| DownloadError::DifferentHashes {
			name: name.to_string(),
			expected: hash.to_string(),
			actual,
		})?;
	}

	tokio::fs::create_dir_all(config.cache_dir()).await?;
	let tmp = download_path.with_extension("zip.part");
	tokio::fs::write(&tmp, &content).await?;
	tokio::fs::rename(&tmp, &download_path).await?;
	log::info!("Wrote {} to {}", name, download_path.display());

	Ok(download_path)
}

#[cfg(test)]
mod test {
	use super::*;

	fn config(dir: &Path) -> crate::Config {
		crate::Config::portable(dir)
	}

	#[test]
	fn cache_path_prefers_hash() {
		let c = config(Path::new("/tmp/x"));
		assert!(cache_path(&c, "SML", "abc").ends_with("abc.zip"));
		assert!(cache_path(&c, "SML", "").ends_with("SML.zip"));
	}

	#[tokio::test]
	async fn download_uses_valid_cache() {
		let dir = tempfile::tempdir().unwrap();
		let c = config(dir.path());
		let content = b"archive";
		let hash = sha256::digest(&content[..]);
		std::fs::create_dir_all(c.cache_dir()).unwrap();
		std::fs::write(cache_path(&c, "SML", &hash), content).unwrap();

		let client = client(&c).unwrap();
		let path = download_or_cache(&c, &client, "SML", &hash, "").await.unwrap();
		assert_eq!(path, cache_path(&c, "SML", &hash));
	}

	#[tokio::test]
	async fn download_rejects_corrupt_cache_without_link() {
		let dir = tempfile::tempdir().unwrap();
		let c = config(dir.path());
		std::fs::create_dir_all(c.cache_dir()).unwrap();
		std::fs::write(cache_path(&c, "SML", "00"), b"corrupt").unwrap();

		let client = client(&c).unwrap();
		let res = download_or_cache(&c, &client, "SML", "00", "").await;
		assert!(matches!(res, Err(DownloadError::MissingLink(_))));
	}
}

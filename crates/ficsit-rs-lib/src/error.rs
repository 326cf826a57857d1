//! Library error type.

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	#[error("reqwest error: {0}")]
	Reqwest(#[from] reqwest::Error),
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("JSON error: {0}")]
	SerdeJSON(#[from] serde_json::Error),
	#[error("parsing error: {0}")]
	Parse(String),
	#[error("validation error: {0}")]
	Validation(String),
	#[error("invalid version constraint: {0}")]
	Constraint(#[from] crate::version_constraint::ConstraintParseError),
	#[error("registry error: {0}")]
	Registry(#[from] crate::registry::RegistryError),
	#[error("could not resolve mods: {0}")]
	Resolve(#[from] crate::relationship_resolver::ResolveError),
	#[error("download failed: {0}")]
	Download(#[from] crate::installation::download::DownloadError),
	#[error("extraction failed: {0}")]
	Content(#[from] crate::installation::content::ContentError),
	#[error("unknown {0} file version: {1}")]
	UnknownFileVersion(&'static str, u32),
	#[error("{0} not found")]
	NotFound(String),
	#[error("already exists")]
	AlreadyExists,
}

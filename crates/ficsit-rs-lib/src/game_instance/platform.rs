use std::path::Path;

/// Layout of one kind of game installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
	pub name: &'static str,
	/// Build information file, relative to the game root.
	pub version_path: &'static str,
	/// Where the lockfile of the installation is kept, relative to the game root.
	pub lockfile_path: &'static str,
}

const LOCKFILE_PATH: &str = "FactoryGame/Mods/.ficsit-lock.json";

/// Known platforms, in detection order.
pub const PLATFORMS: [Platform; 3] = [
	Platform {
		name: "Windows",
		version_path: "Engine/Binaries/Win64/FactoryGame-Win64-Shipping.version",
		lockfile_path: LOCKFILE_PATH,
	},
	Platform {
		name: "WindowsServer",
		version_path: "Engine/Binaries/Win64/UE4Server-Win64-Shipping.version",
		lockfile_path: LOCKFILE_PATH,
	},
	Platform {
		name: "LinuxServer",
		version_path: "Engine/Binaries/Linux/UE4Server-Linux-Shipping.version",
		lockfile_path: LOCKFILE_PATH,
	},
];

/// Finds the first platform whose version file exists under `game_root`.
pub fn detect(game_root: &Path) -> crate::Result<&'static Platform> {
	for platform in &PLATFORMS {
		let version_file = game_root.join(platform.version_path);
		match std::fs::metadata(&version_file) {
			Ok(_) => {
				log::trace!("Detected {} platform at {}", platform.name, game_root.display());
				return Ok(platform);
			},
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
			Err(e) => return Err(e.into()),
		}
	}
	Err(crate::Error::Validation(format!("no platform detected in {}", game_root.display())))
}

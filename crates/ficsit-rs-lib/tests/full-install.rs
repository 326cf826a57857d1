use std::io::Write;
use std::path::Path;

use ficsit_rs::{Config, LockFile, LockedMod, Profiles};
use ficsit_rs::game_instance::Installations;
use ficsit_rs::installation::apply_lockfile;
use ficsit_rs::installation::download::cache_path;
use ficsit_rs_test_utils::{temp_game_installation, MockRegistry, FIXTURE_GAME_VERSION};
use semver::Version;

fn init_logger() {
	let _ = env_logger::builder().is_test(true).try_init();
}

fn sml_archive() -> Vec<u8> {
	let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
	zip.start_file("SML.uplugin", zip::write::FileOptions::default()).unwrap();
	zip.write_all(br#"{"SemVersion":"3.4.0"}"#).unwrap();
	zip.finish().unwrap().into_inner()
}

struct Setup {
	_data: tempfile::TempDir,
	game: tempfile::TempDir,
	config: Config,
	profiles: Profiles,
	installations: Installations,
}

/// A game with the `Default` profile requiring SML, whose archive is already in the cache.
fn setup(archive: &[u8]) -> (Setup, MockRegistry) {
	let data = tempfile::tempdir().unwrap();
	let game = temp_game_installation().unwrap();
	let config = Config::portable(data.path());
	config.ensure_dirs().unwrap();

	let mut profiles = Profiles::init(config.profiles_path()).unwrap();
	profiles.get_profile_mut("Default").unwrap().add_mod("SML", "^3.4.0").unwrap();
	let mut installations = Installations::init(config.installations_path()).unwrap();
	installations.add_installation(game.path(), "Default", &profiles).unwrap();

	let hash = sha256::digest(archive);
	std::fs::write(cache_path(&config, "SML", &hash), archive).unwrap();
	let registry = MockRegistry::new()
		.with_version("SML", "3.4.0")
		.with_artifact("SML", "3.4.0", &hash, "https://mods.invalid/SML-3.4.0.zip");

	(Setup { _data: data, game, config, profiles, installations }, registry)
}

fn lockfile_path(game: &Path) -> std::path::PathBuf {
	game.join("FactoryGame/Mods/.ficsit-lock.json")
}

#[tokio::test]
async fn full_install() {
	init_logger();
	let (s, registry) = setup(&sml_archive());
	let installation = s.installations.get_installation(s.game.path()).unwrap();
	assert_eq!(installation.game_version().unwrap(), FIXTURE_GAME_VERSION);

	let lock = installation.install(&s.config, &s.profiles, &registry).await.unwrap();
	assert_eq!(lock.get("SML").unwrap().version, Version::new(3, 4, 0));
	assert!(s.game.path().join("FactoryGame/Mods/SML/SML.uplugin").exists());
	assert_eq!(LockFile::load_from_file(lockfile_path(s.game.path())).unwrap(), lock);
}

#[tokio::test]
async fn full_install_skips_local_mods() {
	init_logger();
	let (s, _) = setup(&sml_archive());
	let installation = s.installations.get_installation(s.game.path()).unwrap();
	let prior: LockFile = [("SML".to_string(), LockedMod { version: Version::new(3, 4, 0), hash: String::new(), link: String::new() })]
		.into_iter()
		.collect();
	prior.save_to_file(lockfile_path(s.game.path()), false).unwrap();

	/* Nothing cached under an empty hash, a download attempt would fail */
	let registry = MockRegistry::new().with_version("SML", "3.4.0");
	let lock = installation.install(&s.config, &s.profiles, &registry).await.unwrap();
	assert_eq!(lock, prior);
	assert!(!s.game.path().join("FactoryGame/Mods/SML").exists());
}

#[tokio::test]
async fn failed_install_keeps_lockfile() {
	init_logger();
	let (s, _) = setup(b"not a zip");
	let installation = s.installations.get_installation(s.game.path()).unwrap();
	let prior: LockFile = [("Old".to_string(), LockedMod { version: Version::new(1, 0, 0), hash: String::new(), link: String::new() })]
		.into_iter()
		.collect();
	prior.save_to_file(lockfile_path(s.game.path()), false).unwrap();

	let hash = sha256::digest(&b"not a zip"[..]);
	let registry = MockRegistry::new()
		.with_version("SML", "3.4.0")
		.with_artifact("SML", "3.4.0", &hash, "https://mods.invalid/SML-3.4.0.zip");
	let res = installation.install(&s.config, &s.profiles, &registry).await;
	assert!(matches!(res, Err(ficsit_rs::Error::Content(_))));
	assert_eq!(LockFile::load_from_file(lockfile_path(s.game.path())).unwrap(), prior);
}

#[tokio::test]
async fn failed_resolve_keeps_lockfile() {
	init_logger();
	let (s, _) = setup(&sml_archive());
	let installation = s.installations.get_installation(s.game.path()).unwrap();

	let registry = MockRegistry::new().with_unavailable("SML");
	let res = installation.install(&s.config, &s.profiles, &registry).await;
	assert!(matches!(res, Err(ficsit_rs::Error::Resolve(_))));
	assert!(!lockfile_path(s.game.path()).exists());
}

#[tokio::test]
async fn dry_run_install_writes_nothing() {
	init_logger();
	let (mut s, registry) = setup(&sml_archive());
	s.config.set_dry_run(true);
	let installation = s.installations.get_installation(s.game.path()).unwrap();

	let lock = installation.install(&s.config, &s.profiles, &registry).await.unwrap();
	assert_eq!(lock.len(), 1);
	assert!(!lockfile_path(s.game.path()).exists());
	assert!(!s.game.path().join("FactoryGame/Mods/SML").exists());
}

#[tokio::test]
async fn dry_run_install_downloads_nothing() {
	init_logger();
	let (mut s, _) = setup(&sml_archive());
	s.config.set_dry_run(true);
	let installation = s.installations.get_installation(s.game.path()).unwrap();

	/* Not cached and the link can't be reached */
	let registry = MockRegistry::new()
		.with_version("SML", "3.4.0")
		.with_artifact("SML", "3.4.0", "0000", "https://mods.invalid/SML-3.4.0.zip");
	installation.install(&s.config, &s.profiles, &registry).await.unwrap();
	assert!(!cache_path(&s.config, "SML", "0000").exists());
}

#[tokio::test]
async fn apply_rejects_path_like_reference() {
	init_logger();
	let (s, _) = setup(&sml_archive());
	let mods_dir = s.game.path().join("FactoryGame/Mods");
	let lockfile: LockFile = [("../..".to_string(), LockedMod {
		version: Version::new(1, 0, 0),
		hash: "0000".to_string(),
		link: "https://mods.invalid/evil.zip".to_string(),
	})].into_iter().collect();

	let res = apply_lockfile(&s.config, &mods_dir, &lockfile).await;
	assert!(matches!(res, Err(ficsit_rs::Error::Validation(_))));
	assert!(s.game.path().join("FactoryGame.exe").exists());
}

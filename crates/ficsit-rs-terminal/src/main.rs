use ficsit_rs::game_instance::Installations;
use ficsit_rs::registry::IndexRegistry;
use ficsit_rs::relationship_resolver::ResolveError;
use ficsit_rs::{Config, LockFile, Profiles};

const USAGE: &str = "Usage: ficsit-rs-terminal [options] <command>

Commands:
	profile list
	profile create <name>
	profile delete <name>
	profile rename <old> <new>
	profile select <name>
	profile add-mod <profile> <mod> <constraint>
	profile remove-mod <profile> <mod>
	installation list
	installation add <path> [profile]
	installation remove <path>
	installation set-profile <path> <profile>
	resolve [path]
	apply [path]";

#[tokio::main]
async fn main() {
	let mut opts;

	/* Parse console input */
	let parsed_options = {
		let args: Vec<String> = std::env::args().collect();

		opts = getopts::Options::new();
		opts.optflag( "h", "help",       "Show help");
		opts.optflag( "v", "verbose",    "Increased vebosity");
		opts.optflag( "",  "dry-run",    "Don't write anything to disk");
		opts.optopt(  "",  "registry",   "Registry index file or URL", "LOCATION");
		opts.parsing_style(getopts::ParsingStyle::FloatingFrees);

		let parsed_options = match opts.parse(&args[1..]) {
			Ok(m)  => { m }
			Err(e) => { println!("Unable to parse options: {}", e); return }
		};

		if parsed_options.opt_present("h") {
			eprintln!("{}", opts.usage(USAGE));
			return;
		}

		parsed_options
	};

	let mut logger = env_logger::Builder::from_default_env();
	if parsed_options.opt_present("v") {
		logger.filter_level(log::LevelFilter::Debug);
	}
	logger.init();

	let mut config = Config::load_from_disk().unwrap_or_else(|e| {
		log::warn!("Failed to read config file: {}", e);
		log::warn!("Using default config.");
		Config::default()
	});
	if parsed_options.opt_present("dry-run") {
		config.set_dry_run(true);
	}
	if let Some(registry) = parsed_options.opt_str("registry") {
		config.set_registry_url(registry);
	}

	if parsed_options.free.is_empty() {
		eprintln!("{}", opts.usage(USAGE));
		return;
	}

	if let Err(e) = run(&config, &parsed_options.free).await {
		match e {
			Error::FicsitRs(ficsit_rs::Error::Resolve(e)) => report_resolve_error(&e),
			e => log::error!("{}", e),
		}
		std::process::exit(1);
	}
}

fn report_resolve_error(e: &ResolveError) {
	log::error!("Could not resolve mods: {}", e);
	if let ResolveError::VersionConflict { reference, requirements, .. } = e {
		log::error!("Requirements on {}:", reference);
		for requirement in requirements {
			log::error!("\t{} from {}", requirement.constraint, requirement.origin);
		}
	}
}

fn arg<'a>(args: &'a [String], i: usize, name: &'static str) -> Result<&'a str, Error> {
	args.get(i).map(String::as_str).ok_or(Error::MissingArgument(name))
}

struct State {
	profiles: Profiles,
	installations: Installations,
}

impl State {
	fn load(config: &Config) -> Result<Self, Error> {
		config.ensure_dirs()?;
		Ok(Self {
			profiles: Profiles::init(config.profiles_path())?,
			installations: Installations::init(config.installations_path())?,
		})
	}

	fn save(&self, config: &Config) -> Result<(), Error> {
		self.profiles.save(config.dry_run())?;
		self.installations.save(config.dry_run())?;
		Ok(())
	}
}

async fn run(config: &Config, args: &[String]) -> Result<(), Error> {
	let mut state = State::load(config)?;

	match (arg(args, 0, "command")?, args.get(1).map(String::as_str)) {
		("profile", Some(sub)) => profile_command(&mut state, sub, &args[2..])?,
		("installation", Some(sub)) => installation_command(&mut state, sub, &args[2..])?,
		("resolve", path) => {
			let path = match path {
				Some(path) => std::path::Path::new(path),
				None => state.installations.selected_installation().ok_or(Error::MissingArgument("path"))?,
			};
			let installation = state.installations.get_installation(path)
				.ok_or_else(|| Error::NotFound(path.display().to_string()))?;
			let registry = IndexRegistry::load(config).await?;
			let (prior, lockfile) = installation.resolve(&state.profiles, &registry).await?;
			print_diff(&prior, &lockfile);
			println!("{}", lockfile.to_json()?);
			return Ok(());
		},
		("apply", path) => {
			let registry = IndexRegistry::load(config).await?;
			let targets: Vec<_> = match path {
				Some(path) => vec![state.installations.get_installation(path).ok_or_else(|| Error::NotFound(path.to_string()))?],
				None => state.installations.iter().collect(),
			};
			for installation in targets {
				log::info!("Installing mods for {}", installation.path().display());
				let lockfile = installation.install(config, &state.profiles, &registry).await?;
				println!("{}: {} mods installed", installation.path().display(), lockfile.len());
			}
			return Ok(());
		},
		(command, _) => return Err(Error::UnknownCommand(command.to_string())),
	}

	state.save(config)
}

fn profile_command(state: &mut State, sub: &str, args: &[String]) -> Result<(), Error> {
	let profiles = &mut state.profiles;
	match sub {
		"list" => {
			for profile in profiles.profiles() {
				let marker = if profile.name() == profiles.selected_profile() { "*" } else { " " };
				println!("{} {}", marker, profile.name());
				for (reference, constraint) in profile.requirements() {
					println!("\t{} {}", reference, constraint);
				}
			}
		},
		"create" => { profiles.add_profile(arg(args, 0, "name")?)?; },
		"delete" => { profiles.delete_profile(arg(args, 0, "name")?)?; },
		"rename" => profiles.rename_profile(arg(args, 0, "old name")?, arg(args, 1, "new name")?)?,
		"select" => profiles.set_selected_profile(arg(args, 0, "name")?)?,
		"add-mod" => {
			let name = arg(args, 0, "profile")?;
			let profile = profiles.get_profile_mut(name).ok_or_else(|| Error::NotFound(name.to_string()))?;
			profile.add_mod(arg(args, 1, "mod")?, arg(args, 2, "constraint")?)?;
		},
		"remove-mod" => {
			let name = arg(args, 0, "profile")?;
			let profile = profiles.get_profile_mut(name).ok_or_else(|| Error::NotFound(name.to_string()))?;
			let reference = arg(args, 1, "mod")?;
			if profile.remove_mod(reference).is_none() {
				return Err(Error::NotFound(reference.to_string()));
			}
		},
		other => return Err(Error::UnknownCommand(format!("profile {}", other))),
	}
	Ok(())
}

fn installation_command(state: &mut State, sub: &str, args: &[String]) -> Result<(), Error> {
	match sub {
		"list" => {
			let selected = state.installations.selected_installation();
			for installation in state.installations.iter() {
				let marker = if Some(installation.path()) == selected { "*" } else { " " };
				println!("{} {} ({})", marker, installation.path().display(), installation.profile());
			}
		},
		"add" => {
			let profile = args.get(1).map(String::as_str).unwrap_or(state.profiles.selected_profile()).to_string();
			state.installations.add_installation(arg(args, 0, "path")?, &profile, &state.profiles)?;
		},
		"remove" => { state.installations.delete_installation(arg(args, 0, "path")?)?; },
		"set-profile" => {
			let path = arg(args, 0, "path")?;
			let installation = state.installations.get_installation_mut(path).ok_or_else(|| Error::NotFound(path.to_string()))?;
			installation.set_profile(&state.profiles, arg(args, 1, "profile")?)?;
		},
		other => return Err(Error::UnknownCommand(format!("installation {}", other))),
	}
	Ok(())
}

fn print_diff(prior: &LockFile, lockfile: &LockFile) {
	let diff = prior.diff(lockfile);
	if diff.is_empty() {
		println!("No changes.");
		return;
	}
	for (reference, version) in &diff.added {
		println!("+ {} {}", reference, version);
	}
	for (reference, old, new) in &diff.changed {
		println!("~ {} {} -> {}", reference, old, new);
	}
	for (reference, version) in &diff.removed {
		println!("- {} {}", reference, version);
	}
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("ficsit-rs error: {0}")]
	FicsitRs(#[from] ficsit_rs::Error),
	#[error("registry error: {0}")]
	Registry(#[from] ficsit_rs::registry::RegistryError),
	#[error("missing argument: {0}")]
	MissingArgument(&'static str),
	#[error("unknown command: {0}")]
	UnknownCommand(String),
	#[error("{0} not found")]
	NotFound(String),
}

//! `nemi` management command

use clap::{Parser, Subcommand};
use nemi::commands;
use nemi::conf::{Settings, init_logging};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nemi")]
#[command(about = "NEMI web management utility", long_about = None)]
#[command(version)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Settings file
	#[arg(long, global = true, default_value = "nemi.toml", value_name = "PATH")]
	config: PathBuf,

	/// Verbosity level (can be repeated)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	verbosity: u8,
}

#[derive(Subcommand)]
enum Commands {
	/// Serve the web application
	Runserver {
		/// Address to bind, overriding `bind_address`
		#[arg(long, value_name = "ADDR")]
		addr: Option<String>,
	},

	/// Apply the bundled schema to the configured database
	Migrate,

	/// Validate settings, templates and the database connection
	Check,

	/// Print an argon2 hash for an `auth_users` entry
	Hashpassword {
		#[arg(value_name = "PASSWORD")]
		password: String,
	},
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	let settings = Settings::load(&cli.config)?;
	init_logging(&settings.log_level, cli.verbosity);

	match cli.command {
		Commands::Runserver { addr } => commands::runserver(settings, addr).await,
		Commands::Migrate => commands::migrate(&settings).await,
		Commands::Check => {
			commands::check(&settings).await?;
			println!("No issues found.");
			Ok(())
		}
		Commands::Hashpassword { password } => {
			println!("{}", nemi::server::hash_password(&password)?);
			Ok(())
		}
	}
}

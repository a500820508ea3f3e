//! Roster replay binary.
//!
//! Loads a roster fixture, binds the sorted contacts model to an in-memory
//! source built from it, plays the session forward, and prints the rows.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use roster_model::ModelEvent;
use tracing::info;

mod fixture;
mod replay;

use fixture::Fixture;

/// Roster command line arguments.
#[derive(Parser, Debug)]
#[command(name = "roster")]
#[command(about = "Replay a contact roster fixture through the sorted contacts model")]
struct Args {
	/// Fixture file (TOML)
	#[arg(value_name = "FIXTURE")]
	fixture: PathBuf,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,

	/// Print every model notification
	#[arg(short, long)]
	events: bool,
}

fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	let subscriber = tracing_subscriber::fmt()
		.with_max_level(if args.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO })
		.with_writer(std::io::stderr)
		.finish();
	tracing::subscriber::set_global_default(subscriber)?;

	info!(fixture = %args.fixture.display(), "loading fixture");
	let fixture = Fixture::load(&args.fixture)?;
	let replay = replay::replay(&fixture).context("replaying fixture")?;

	println!("{:>4}  {:>8}  {:<28}  {:<16}  {}", "row", "key", "name", "username", "phone");
	for (row, record) in replay.rows.iter().enumerate() {
		println!(
			"{:>4}  {:>8}  {:<28}  {:<16}  {}",
			row,
			record.key,
			record.sort_key(),
			record.username.as_deref().unwrap_or("-"),
			record.phone.as_deref().unwrap_or("-"),
		);
	}

	if args.events {
		println!();
		for event in &replay.events {
			println!("{}", describe(event));
		}
	}

	println!();
	println!(
		"{} contacts, {} fetch request(s), {} deferred task(s), {}",
		replay.rows.len(),
		replay.fetch_requests,
		replay.tasks_run,
		if replay.initializing { "still initializing" } else { "settled" }
	);

	Ok(())
}

fn describe(event: &ModelEvent) -> String {
	match event {
		ModelEvent::SourceChanged => "source changed".to_string(),
		ModelEvent::InitializingChanged => "initializing changed".to_string(),
		ModelEvent::Reset => "reset".to_string(),
		ModelEvent::Inserted { first, .. } => format!("inserted row {first}"),
	}
}

#[cfg(test)]
mod tests {
	use roster_model::ModelEvent;

	use super::describe;

	#[test]
	fn describes_each_notification() {
		assert_eq!(describe(&ModelEvent::Reset), "reset");
		assert_eq!(describe(&ModelEvent::SourceChanged), "source changed");
		assert_eq!(describe(&ModelEvent::InitializingChanged), "initializing changed");
		assert_eq!(describe(&ModelEvent::Inserted { first: 4, last: 4 }), "inserted row 4");
	}
}

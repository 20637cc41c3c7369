//! Command-line shell over `sac_core`.
//!
//! # Responsibility
//! - Map subcommands onto `ChartService` commands.
//! - Write rendered charts as SVG files.
//!
//! Every run starts logged out with a fresh session; admin subcommands log
//! in with `--user/--password` first.

use clap::{Args, Parser, Subcommand};
use log::info;
use rusqlite::Connection;
use sac_core::db::{open_db, open_db_in_memory};
use sac_core::model::person::{parse_axis, Axis};
use sac_core::{
    AppConfig, AuthService, BoardProfile, ChartService, Collaborators, Command, PersonEdit,
    PersonId, PersonInput, SqlitePersonStore, SqliteProfileStore, SvgSurface,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn Error>>;

const DEFAULT_WINDOW_WIDTH: f64 = 1280.0;

#[derive(Parser)]
#[command(name = "sac", version, about = "Social acceptability chart", long_about = None)]
struct Cli {
    /// JSON config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// SQLite database; overrides `store.db_path`.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(flatten)]
    access: Access,
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Args)]
struct Access {
    /// Board member name.
    #[arg(long, global = true, requires = "password")]
    user: Option<String>,
    #[arg(long, global = true)]
    password: Option<String>,
    /// Shared view-once password; reveals avatars and scores for this run.
    #[arg(long, global = true)]
    view_once: Option<String>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Lists people in chart order.
    List,
    /// Adds a person (requires login).
    Add {
        handle: String,
        food: String,
        character: String,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Edits a person (requires login).
    Edit {
        id: PersonId,
        #[arg(long)]
        handle: Option<String>,
        #[arg(long)]
        food: Option<String>,
        #[arg(long)]
        character: Option<String>,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Deletes a person (requires login).
    Delete { id: PersonId },
    /// Renders the chart to an SVG file.
    Render {
        out: PathBuf,
        /// Browser window width the layout is computed for.
        #[arg(long, default_value_t = DEFAULT_WINDOW_WIDTH)]
        width: f64,
    },
    /// Manages board-member profiles.
    #[command(subcommand)]
    Profile(ProfileCmd),
}

#[derive(Subcommand)]
enum ProfileCmd {
    /// Adds or replaces a profile. Requires login once any profile exists.
    Add {
        id: String,
        name: String,
        #[arg(long)]
        role: String,
        #[arg(long)]
        emoji: String,
        #[arg(long = "profile-password")]
        profile_password: String,
        #[arg(long)]
        image_url: Option<String>,
    },
    List,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.store.db_path = Some(db.display().to_string());
    }
    sac_core::init_from_config(&config.logging)?;

    let conn = open_connection(&config)?;
    info!("event=cli_start module=cli status=ok");

    if let Cmd::Profile(command) = cli.command {
        return run_profile(&conn, &cli.access, command);
    }

    let window_width = match &cli.command {
        Cmd::Render { width, .. } => *width,
        _ => DEFAULT_WINDOW_WIDTH,
    };
    let mut service = ChartService::new(
        config,
        SqlitePersonStore::new(&conn),
        Collaborators::system(),
        window_width,
    );
    if let Some(notice) = service.start()?.notice() {
        eprintln!("{notice}");
    }
    apply_access(&mut service, &conn, &cli.access)?;

    match cli.command {
        Cmd::List => print_list(&service),
        Cmd::Add {
            handle,
            food,
            character,
            image,
        } => {
            let input = PersonInput {
                handle,
                food_score: parse_axis(Axis::Food, &food)?.into(),
                character: parse_axis(Axis::Character, &character)?.into(),
                image,
            };
            let outcome = service.dispatch(Command::Add(input))?;
            if let sac_core::Event::Added(id) = outcome.event {
                println!("added {id}");
            }
        }
        Cmd::Edit {
            id,
            handle,
            food,
            character,
            image,
        } => {
            let edit = PersonEdit {
                handle,
                food_score: parse_optional_axis(Axis::Food, food.as_deref())?,
                character: parse_optional_axis(Axis::Character, character.as_deref())?,
                image,
            };
            service.dispatch(Command::Edit { id, edit })?;
            println!("updated {id}");
        }
        Cmd::Delete { id } => {
            service.dispatch(Command::Delete(id))?;
            println!("deleted {id}");
        }
        Cmd::Render { out, .. } => {
            let mut surface = SvgSurface::new();
            let placements = service.render(&mut surface)?;
            std::fs::write(&out, surface.into_svg())?;
            println!("wrote {} ({} markers)", out.display(), placements.len());
        }
        Cmd::Profile(_) => {}
    }
    Ok(())
}

fn open_connection(config: &AppConfig) -> CliResult<Connection> {
    Ok(match config.store.db_path.as_deref() {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    })
}

/// Logs in and/or opens a view-once window as requested on the command line.
fn apply_access(
    service: &mut ChartService<SqlitePersonStore<'_>>,
    conn: &Connection,
    access: &Access,
) -> CliResult<()> {
    if let (Some(user), Some(password)) = (&access.user, &access.password) {
        let auth = AuthService::new(SqliteProfileStore::new(conn));
        let session_user = auth.authenticate(user, password)?;
        service.dispatch(Command::LoginSucceeded(session_user))?;
    }
    if let Some(password) = &access.view_once {
        service.dispatch(Command::SubmitViewOncePassword(password.clone()))?;
    }
    Ok(())
}

fn run_profile(conn: &Connection, access: &Access, command: ProfileCmd) -> CliResult<()> {
    let mut auth = AuthService::new(SqliteProfileStore::new(conn));
    match command {
        ProfileCmd::List => {
            for profile in auth.list_profiles()? {
                println!("{}\t{} {}\t{}", profile.id, profile.emoji, profile.name, profile.role);
            }
        }
        ProfileCmd::Add {
            id,
            name,
            role,
            emoji,
            profile_password,
            image_url,
        } => {
            // The first profile bootstraps the board.
            if !auth.list_profiles()?.is_empty() {
                let (Some(user), Some(password)) = (&access.user, &access.password) else {
                    return Err("adding a profile requires --user and --password".into());
                };
                auth.authenticate(user, password)?;
            }
            auth.register_profile(&BoardProfile {
                id: id.clone(),
                name,
                role,
                emoji,
                password: profile_password,
                image_url,
            })?;
            println!("saved profile {id}");
        }
    }
    Ok(())
}

fn print_list(service: &ChartService<SqlitePersonStore<'_>>) {
    for entry in service.list_entries() {
        let id = entry.id.map(|id| id.to_string()).unwrap_or_default();
        let score = entry
            .social_score
            .map(|score| score.to_string())
            .unwrap_or_else(|| "?".to_string());
        println!("{id}\t{}\t{score}", entry.handle);
    }
}

fn parse_optional_axis(axis: Axis, input: Option<&str>) -> CliResult<Option<i64>> {
    Ok(input
        .map(|value| parse_axis(axis, value))
        .transpose()?
        .map(i64::from))
}

#[cfg(test)]
mod tests {
    use super::{Cli, Cmd, ProfileCmd};
    use clap::Parser;

    #[test]
    fn admin_flags_are_global() {
        let cli = Cli::try_parse_from([
            "sac", "add", "@a", "10", "90", "--user", "Mo", "--password", "cake",
        ])
        .unwrap();
        assert_eq!(cli.access.user.as_deref(), Some("Mo"));
        assert!(matches!(cli.command, Cmd::Add { ref handle, .. } if handle == "@a"));
    }

    #[test]
    fn user_without_password_is_rejected() {
        assert!(Cli::try_parse_from(["sac", "list", "--user", "Mo"]).is_err());
    }

    #[test]
    fn render_takes_width_and_view_once() {
        let cli = Cli::try_parse_from([
            "sac", "render", "chart.svg", "--width", "700", "--view-once", "peek",
        ])
        .unwrap();
        assert_eq!(cli.access.view_once.as_deref(), Some("peek"));
        assert!(matches!(cli.command, Cmd::Render { width, .. } if width == 700.0));
    }

    #[test]
    fn profile_subcommands_parse() {
        let cli = Cli::try_parse_from([
            "sac",
            "profile",
            "add",
            "mo",
            "Mo",
            "--role",
            "Chair",
            "--emoji",
            "🍰",
            "--profile-password",
            "cake",
        ])
        .unwrap();
        assert!(matches!(cli.command, Cmd::Profile(ProfileCmd::Add { .. })));
    }
}

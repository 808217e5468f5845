use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{DonationNew, Engine, EngineError, ProjectNew, UserNew};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "pledge_admin")]
#[command(about = "Admin utilities for Pledge (bootstrap users/projects, reports)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./pledge.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Project(Project),
    Donation(Donation),
    /// Print fully funded projects, fastest to close first.
    Report,
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
    /// Allow managing projects and reading every donation.
    #[arg(long)]
    superuser: bool,
}

#[derive(Args, Debug)]
struct Project {
    #[command(subcommand)]
    command: ProjectCommand,
}

#[derive(Subcommand, Debug)]
enum ProjectCommand {
    Create(ProjectCreateArgs),
    List,
}

#[derive(Args, Debug)]
struct ProjectCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    description: String,
    /// Amount to raise, in minor units.
    #[arg(long)]
    target: i64,
}

#[derive(Args, Debug)]
struct Donation {
    #[command(subcommand)]
    command: DonationCommand,
}

#[derive(Subcommand, Debug)]
enum DonationCommand {
    /// Record a donation without an owner (e.g. a bank transfer).
    Create(DonationCreateArgs),
}

#[derive(Args, Debug)]
struct DonationCreateArgs {
    /// Amount pledged, in minor units.
    #[arg(long)]
    amount: i64,
    #[arg(long)]
    comment: Option<String>,
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> CliResult<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

const PASSWORD_MIN_CHARS: usize = 8;
const PASSWORD_ATTEMPTS: usize = 3;

type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// Print a full line on stderr, clearing whatever the prompt left there.
fn say(out: &mut std::io::Stderr, line: &str) -> CliResult<()> {
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(line),
        Print("\r\n")
    )?;
    out.flush()?;
    Ok(())
}

/// What a key press does to the secret being typed.
#[derive(Debug, PartialEq, Eq)]
enum SecretKey {
    Submit,
    Abort(&'static str),
    /// A character was appended; echo one `*`.
    Typed,
    /// The last character was removed; erase one `*`.
    Erased,
    Ignored,
}

fn apply_key(secret: &mut String, code: KeyCode, modifiers: KeyModifiers) -> SecretKey {
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);
    match code {
        KeyCode::Enter => SecretKey::Submit,
        KeyCode::Esc => SecretKey::Abort("cancelled"),
        KeyCode::Char('c') if ctrl => SecretKey::Abort("interrupted"),
        KeyCode::Backspace if secret.pop().is_some() => SecretKey::Erased,
        KeyCode::Char(ch) if !ctrl => {
            secret.push(ch);
            SecretKey::Typed
        }
        _ => SecretKey::Ignored,
    }
}

/// Read a line, echoing `*` per character. Ctrl-C and Esc abort.
fn read_secret(prompt: &str) -> CliResult<String> {
    let _raw = RawModeGuard::enter()?;
    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut secret = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match apply_key(&mut secret, code, modifiers) {
            SecretKey::Submit => break,
            SecretKey::Abort(reason) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err(reason.into());
            }
            SecretKey::Typed => execute!(out, Print("*"))?,
            SecretKey::Erased => {
                execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?
            }
            SecretKey::Ignored => continue,
        }
        out.flush()?;
    }
    execute!(out, Print("\r\n"))?;
    out.flush()?;

    Ok(secret)
}

/// Ask for a new password and its confirmation.
fn new_password() -> CliResult<String> {
    let mut out = std::io::stderr();
    for _ in 0..PASSWORD_ATTEMPTS {
        let password = read_secret("Password: ")?;
        if password.chars().count() < PASSWORD_MIN_CHARS {
            say(
                &mut out,
                &format!("Password must be at least {PASSWORD_MIN_CHARS} characters."),
            )?;
            continue;
        }

        if read_secret("Confirm password: ")? == password {
            return Ok(password);
        }
        say(&mut out, "Passwords do not match. Try again.")?;
    }

    Err("too many attempts".into())
}

async fn connect_db(database_url: &str) -> CliResult<DatabaseConnection> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let password = new_password()?;

            let user = match engine
                .create_user(UserNew {
                    username: args.username.clone(),
                    password,
                    is_superuser: args.superuser,
                })
                .await
            {
                Ok(user) => user,
                Err(EngineError::ExistingKey(_)) => {
                    eprintln!("user already exists: {}", args.username);
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            };

            println!("created user: {} (id {})", user.username, user.id);
        }
        Command::Project(Project {
            command: ProjectCommand::Create(args),
        }) => {
            let project = engine
                .create_project(ProjectNew::new(args.name, args.description, args.target))
                .await?;
            println!(
                "created project: {} (id {}), funded {}/{}",
                project.name, project.id, project.invested_amount, project.target_amount
            );
        }
        Command::Project(Project {
            command: ProjectCommand::List,
        }) => {
            for project in engine.projects().await? {
                let state = if project.fully_funded { "closed" } else { "open" };
                println!(
                    "{:>5}  {:<6}  {:>10}/{:<10}  {}",
                    project.id, state, project.invested_amount, project.target_amount, project.name
                );
            }
        }
        Command::Donation(Donation {
            command: DonationCommand::Create(args),
        }) => {
            let mut cmd = DonationNew::new(args.amount);
            if let Some(comment) = args.comment {
                cmd = cmd.comment(comment);
            }
            let donation = engine.create_donation(cmd).await?;
            println!(
                "created donation {}: allocated {}, {} left",
                donation.id,
                donation.invested_amount,
                donation.remaining()
            );
        }
        Command::Report => {
            let rows = engine.funding_report().await?;
            if rows.is_empty() {
                println!("no fully funded projects yet");
            }
            for row in rows {
                println!(
                    "{:>5}  {:>4} days  {}  ({})",
                    row.project_id,
                    row.days(),
                    row.name,
                    row.description
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_keys(keys: &[KeyCode]) -> (String, Vec<SecretKey>) {
        let mut secret = String::new();
        let outcomes = keys
            .iter()
            .map(|code| apply_key(&mut secret, *code, KeyModifiers::NONE))
            .collect();
        (secret, outcomes)
    }

    #[test]
    fn every_typed_character_is_echoed() {
        let (secret, outcomes) = type_keys(&[KeyCode::Char('a'), KeyCode::Char('b')]);
        assert_eq!(secret, "ab");
        assert_eq!(outcomes, vec![SecretKey::Typed, SecretKey::Typed]);
    }

    #[test]
    fn backspace_never_reaches_into_the_prompt() {
        let (secret, outcomes) = type_keys(&[
            KeyCode::Backspace,
            KeyCode::Char('x'),
            KeyCode::Backspace,
            KeyCode::Backspace,
        ]);
        assert!(secret.is_empty());
        assert_eq!(
            outcomes,
            vec![
                SecretKey::Ignored,
                SecretKey::Typed,
                SecretKey::Erased,
                SecretKey::Ignored,
            ]
        );
    }

    #[test]
    fn ctrl_c_aborts_without_typing() {
        let mut secret = String::new();
        let outcome = apply_key(&mut secret, KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(outcome, SecretKey::Abort("interrupted"));
        assert!(secret.is_empty());
        assert_eq!(
            apply_key(&mut secret, KeyCode::Enter, KeyModifiers::NONE),
            SecretKey::Submit
        );
    }
}

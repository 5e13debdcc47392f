mod api;
mod config;
mod logging;
mod search;
mod session;
mod ui;
mod validation;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use serde::Serialize;

use api::http::ReqwestTransport;
use api::{Contact, ContactService};
use config::Config;
use logging::LogSink;
use session::SessionStore;

const LOG_FILE_NAME: &str = "contactbook.log";

#[derive(Parser, Debug)]
#[command(name = "contactbook", version, about = "Terminal client for a remote contact book")]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the API base URL from the configuration
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the contacts stored for the saved API key
    List(ListArgs),
    /// Forget the saved API key
    Logout,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Print JSON instead of tab-separated lines
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Serialize)]
struct ListedContact<'a> {
    #[serde(flatten)]
    contact: &'a Contact,
    avatar_url: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Some(_) => logging::init_logging(cli.verbose, LogSink::Stderr)?,
        None => {
            let log_path = session::data_root()?.join(LOG_FILE_NAME);
            logging::init_logging(cli.verbose, LogSink::File(&log_path))?;
        }
    }

    let config = config::load(cli.config.as_deref(), cli.base_url.as_deref())?;
    let session = SessionStore::load(session::default_path()?)?;

    match cli.command {
        Some(Command::List(args)) => handle_list(args, &config, &session),
        Some(Command::Logout) => handle_logout(session),
        None => run_tui(config, session),
    }
}

fn build_service(config: &Config) -> Result<ContactService<ReqwestTransport>> {
    let transport =
        ReqwestTransport::new(config.timeout).context("failed to build HTTP client")?;
    Ok(ContactService::new(
        transport,
        config.base_url.clone(),
        config.avatar_service.clone(),
    ))
}

fn run_tui(config: Config, session: SessionStore) -> Result<()> {
    info!(
        "starting with base URL {} (config {}, session {})",
        config.base_url,
        config.config_path.display(),
        session.path().display()
    );
    let worker = ui::worker::Worker::spawn(build_service(&config)?)?;
    let mut app = ui::app::App::new(config, session);
    app.run(worker)?;
    info!("exiting");
    Ok(())
}

fn handle_list(args: ListArgs, config: &Config, session: &SessionStore) -> Result<()> {
    let Some(key) = session.key() else {
        bail!("no API key stored; run contactbook and log in first");
    };
    let service = build_service(config)?;
    let contacts = service
        .list_contacts(key, None)
        .context("failed to fetch contacts")?;

    print!(
        "{}",
        format_listing(&contacts, args.json, |contact| service.avatar_url(contact))?
    );
    Ok(())
}

/// Tab-separated `id name mobile email` lines, or pretty JSON with each
/// contact's avatar URL alongside its wire fields.
fn format_listing<F>(contacts: &[Contact], json: bool, avatar_url: F) -> Result<String>
where
    F: Fn(&Contact) -> String,
{
    if json {
        let listed: Vec<ListedContact> = contacts
            .iter()
            .map(|contact| ListedContact {
                contact,
                avatar_url: avatar_url(contact),
            })
            .collect();
        return Ok(format!("{}\n", serde_json::to_string_pretty(&listed)?));
    }

    let mut out = String::new();
    for contact in contacts {
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\n",
            contact.id,
            contact.display_name(),
            contact.mobile,
            contact.email
        ));
    }
    Ok(out)
}

fn handle_logout(mut session: SessionStore) -> Result<()> {
    if !session.is_active() {
        println!("No API key stored.");
        return Ok(());
    }
    session.clear()?;
    println!("You have been logged out successfully.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::TWO_CONTACTS;

    fn contacts() -> Vec<Contact> {
        serde_json::from_str(TWO_CONTACTS).unwrap()
    }

    #[test]
    fn test_listing_plain_is_tab_separated() {
        let out = format_listing(&contacts(), false, |_| String::new()).unwrap();
        assert_eq!(
            out,
            "1\tAlice Smith\t0123456789\talice@example.com\n\
             2\tBob Jones\t0987654321\tbob@example.com\n"
        );
    }

    #[test]
    fn test_listing_plain_empty() {
        assert_eq!(format_listing(&[], false, |_| String::new()).unwrap(), "");
    }

    #[test]
    fn test_listing_json_flattens_contact_and_avatar() {
        let out = format_listing(&contacts(), true, |c| format!("https://img.test/{}", c.id)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], "1");
        assert_eq!(rows[0]["firstname"], "Alice");
        assert_eq!(rows[0]["lastname"], "Smith");
        assert_eq!(rows[0]["avatar"], "alice.png");
        assert_eq!(rows[0]["avatar_url"], "https://img.test/1");
        assert_eq!(rows[1]["email"], "bob@example.com");
        assert!(rows[1]["avatar"].is_null());
        assert_eq!(rows[1]["avatar_url"], "https://img.test/2");
    }
}

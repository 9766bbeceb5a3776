use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};

use mailstats::auth::password_store;
use mailstats::config::{Config, load_config};
use mailstats::mail::imap_client::ImapTransport;
use mailstats::mail::transport::MailTransport;
use mailstats::stats::{EmailStats, StatsQuery, report};

#[derive(Parser)]
#[command(name = "mailstats")]
#[command(about = "Read-only thread and sender statistics for an IMAP account", long_about = None)]
struct Cli {
    /// Override the IMAP server from the config file
    #[arg(long, global = true)]
    server: Option<String>,

    /// Override the login user from the config file
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store the IMAP password in keyring
    SetPassword,

    #[command(flatten)]
    Session(SessionCommand),
}

/// Commands that talk to the server.
#[derive(Subcommand)]
enum SessionCommand {
    /// List mailboxes with their message counts
    Mailboxes,

    /// Show the storage quota
    Quota {
        #[arg(default_value = "INBOX")]
        mailbox: String,
    },

    /// Count messages per thread and per sender
    Stats {
        /// Mailbox to scan (repeatable)
        #[arg(short, long = "mailbox")]
        mailboxes: Vec<String>,

        /// Regex the whole subject must match
        #[arg(short, long)]
        filter: Option<String>,

        /// Number of top threads and senders to show
        #[arg(short = 'n', long)]
        top: Option<usize>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut cfg = load_config().map_err(|e| anyhow!("Configuration error: {e}"))?;
    if let Some(server) = cli.server {
        cfg.imap_server = server;
    }
    if let Some(user) = cli.user {
        cfg.user = user;
    }

    let cmd = match cli.cmd {
        Command::SetPassword => {
            eprintln!("Paste password for {} (end with Ctrl-D):", cfg.user);
            let mut secret = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut secret)?;
            password_store::save_password(&cfg.user, secret.trim())?;
            println!("Saved password for {}", cfg.user);
            return Ok(());
        }
        Command::Session(cmd) => cmd,
    };

    let password = password_store::resolve_password(&cfg.user)?;
    if cfg.ssl {
        let transport =
            ImapTransport::connect_tls(&cfg.imap_server, cfg.port(), &cfg.user, &password)?;
        run(EmailStats::new(transport), &cfg, cmd)
    } else {
        let transport =
            ImapTransport::connect_plain(&cfg.imap_server, cfg.port(), &cfg.user, &password)?;
        run(EmailStats::new(transport), &cfg, cmd)
    }
}

fn run<T: MailTransport>(mut stats: EmailStats<T>, cfg: &Config, cmd: SessionCommand) -> Result<()> {
    match cmd {
        SessionCommand::Mailboxes => {
            let boxes = stats.mailbox_counts()?;
            print!("{}", report::render_mailboxes(&boxes));
        }

        SessionCommand::Quota { mailbox } => {
            let quota = stats.mailbox_quota(&mailbox)?;
            print!("{}", report::render_quota(&mailbox, quota));
        }

        SessionCommand::Stats {
            mailboxes,
            filter,
            top,
            json,
        } => {
            let query = StatsQuery {
                mailboxes: if mailboxes.is_empty() {
                    cfg.mailboxes.clone()
                } else {
                    mailboxes
                },
                subject_filter: filter.unwrap_or_else(|| cfg.subject_filter.clone()),
                top: top.unwrap_or(cfg.top),
            };
            let result = stats.compute_stats(&query)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", report::render_stats(&query.mailboxes, &result));
            }
        }
    }

    stats.logout()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_password_is_not_a_session_command() {
        let cli = Cli::try_parse_from(["mailstats", "set-password"]).unwrap();
        assert!(matches!(cli.cmd, Command::SetPassword));

        let cli = Cli::try_parse_from(["mailstats", "--user", "me", "mailboxes"]).unwrap();
        assert!(matches!(cli.cmd, Command::Session(SessionCommand::Mailboxes)));
        assert_eq!(cli.user.as_deref(), Some("me"));

        let cli = Cli::try_parse_from(["mailstats", "stats", "-m", "INBOX", "-m", "Sent", "-n", "3"])
            .unwrap();
        match cli.cmd {
            Command::Session(SessionCommand::Stats { mailboxes, top, .. }) => {
                assert_eq!(mailboxes, vec!["INBOX", "Sent"]);
                assert_eq!(top, Some(3));
            }
            _ => panic!("expected stats"),
        }
    }
}

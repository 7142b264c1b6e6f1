use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Result};
use bml_agents::{ConciergeAgent, ConciergeConfig};
use bml_core::render::GENERIC_ERROR;
use bml_core::{
    language_info, ActionInput, BookingEvent, ConciergeReply, EventInput, IntentMatcher, Language,
    StartInput, TextInput,
};
use bml_observability::{init_tracing, AppMetrics};
use bml_storage::MemoryStore;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "concierge")]
#[command(about = "Bamboolino Concierge CLI")]
struct Cli {
    /// Comma list of booking types with an open flow.
    #[arg(long, env = "BML_BOOKING_TYPES", global = true)]
    booking_types: Option<String>,

    #[arg(long, env = "BML_BOOKING_SESSION_TTL_MINUTES", global = true)]
    session_ttl_minutes: Option<String>,

    #[arg(long, env = "BML_VENUE_PREFIX", global = true)]
    venue_prefix: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Chat {
        #[arg(long, default_value = "cli-user")]
        user_id: String,
        #[arg(long)]
        locale: Option<String>,
    },
    Detect {
        text: String,
    },
    Match {
        text: String,
    },
    Book {
        #[arg(long, default_value = "entry")]
        booking_type: String,
        #[arg(long)]
        subtype: String,
        #[arg(long)]
        group_size: Option<u32>,
        /// YYYY-MM-DD within the next seven days.
        #[arg(long)]
        date: String,
        /// One of 09:00-12:00, 12:00-15:00, 15:00-18:00, 18:00-20:00.
        #[arg(long)]
        slot: String,
        #[arg(long, default_value = "cli-user")]
        user_id: String,
        #[arg(long, default_value = "en")]
        locale: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("bml_cli");
    let cli = Cli::parse();

    let config = ConciergeConfig::from_lookup(|key| match key {
        "BML_BOOKING_TYPES" => cli.booking_types.clone(),
        "BML_BOOKING_SESSION_TTL_MINUTES" => cli.session_ttl_minutes.clone(),
        "BML_VENUE_PREFIX" => cli.venue_prefix.clone(),
        _ => None,
    });

    match cli.command {
        Command::Chat { user_id, locale } => run_chat(build_agent(config), user_id, locale).await?,
        Command::Detect { text } => {
            println!("{}", serde_json::to_string_pretty(&language_info(&text))?);
        }
        Command::Match { text } => {
            let language = bml_core::detect(&text);
            let matched = IntentMatcher::default().match_topic(&text);
            let payload = serde_json::json!({
                "language": language,
                "topic": matched.topic_id(),
                "score": matched.score,
                "answer": matched.topic.map(|topic| topic.answer(language)),
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Command::Book {
            booking_type,
            subtype,
            group_size,
            date,
            slot,
            user_id,
            locale,
        } => {
            let agent = build_agent(config);
            let reply = run_booking(
                &agent,
                &user_id,
                &locale,
                vec![
                    Some(BookingEvent::SelectType(booking_type)),
                    Some(BookingEvent::SelectSubtype(subtype)),
                    group_size.map(|size| BookingEvent::SubmitGroupSize(size.to_string())),
                    Some(BookingEvent::SelectDate(date)),
                    Some(BookingEvent::SelectTimeSlot(slot)),
                ],
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
    }

    Ok(())
}

fn build_agent(config: ConciergeConfig) -> ConciergeAgent<MemoryStore> {
    ConciergeAgent::new(Arc::new(MemoryStore::new()), AppMetrics::shared(), config)
}

async fn run_booking(
    agent: &ConciergeAgent<MemoryStore>,
    user_id: &str,
    locale: &str,
    events: Vec<Option<BookingEvent>>,
) -> Result<ConciergeReply> {
    agent
        .start(StartInput {
            user_id: user_id.to_string(),
            locale: Some(locale.to_string()),
        })
        .await?;

    let mut last = None;
    for event in events.into_iter().flatten() {
        let reply = agent
            .handle_event(EventInput {
                user_id: user_id.to_string(),
                event,
            })
            .await?;
        last = Some(reply);
    }

    match last {
        Some(reply) if reply.booking.is_some() => Ok(reply),
        Some(reply) => bail!("booking not confirmed: {}", reply.text),
        None => bail!("no booking events given"),
    }
}

async fn run_chat(
    agent: ConciergeAgent<MemoryStore>,
    user_id: String,
    locale: Option<String>,
) -> Result<()> {
    println!("Bamboolino Concierge chat mode. /help for commands, !<action> to press a button, 'exit' to quit.");

    let reply = agent
        .start(StartInput {
            user_id: user_id.clone(),
            locale,
        })
        .await?;
    print_reply(&reply);
    let mut language = reply.language;

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if message.is_empty() {
            continue;
        }

        let result = match message {
            "/start" => {
                agent
                    .start(StartInput {
                        user_id: user_id.clone(),
                        locale: Some(language.as_code().to_string()),
                    })
                    .await
            }
            "/help" => agent.help(&user_id).await,
            "/contact" => agent.contact(&user_id).await,
            "/accessibility" => agent.accessibility_overview(&user_id).await,
            _ => match message.strip_prefix('!') {
                Some(action) => {
                    agent
                        .handle_action(ActionInput {
                            user_id: user_id.clone(),
                            action: action.trim().to_string(),
                        })
                        .await
                }
                None => {
                    agent
                        .handle_text(TextInput {
                            user_id: user_id.clone(),
                            text: message.to_string(),
                        })
                        .await
                }
            },
        };

        match result {
            Ok(reply) => {
                language = reply.language;
                print_reply(&reply);
            }
            Err(error) => {
                tracing::warn!(error = %error, "chat turn failed");
                println!("\n{}\n", GENERIC_ERROR.get(language));
            }
        }
    }

    Ok(())
}

fn print_reply(reply: &ConciergeReply) {
    println!("\n{}", reply.text);
    if let Some(keyboard) = reply.keyboard.as_ref() {
        for row in &keyboard.rows {
            let row = row
                .iter()
                .map(|button| format!("[{}] !{}", button.label, button.action))
                .collect::<Vec<_>>()
                .join("   ");
            println!("  {row}");
        }
    }
    if let Some(qr) = reply.qr.as_ref() {
        println!("  QR ({}): {}", qr.media_type, qr.handle);
    }
    println!();
}

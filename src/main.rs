//! TutorTalk - terminal front-end
//!
//! Type a question and press enter, or use `/voice` to ask out loud.

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tutortalk::config::Config;
use tutortalk::session::SessionController;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Audio input device index
    #[arg(short, long)]
    device: Option<usize>,

    /// Do not speak replies aloud
    #[arg(long)]
    mute: bool,

    /// Override the tutor model
    #[arg(short, long)]
    model: Option<String>,
}

const HELP: &str = "\
Commands:
  /voice    ask a question out loud
  /stop     stop the spoken reply
  /clear    forget the conversation
  /history  show recent turns
  /quit     leave";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load().unwrap_or_default();
    config.apply_env();
    if args.device.is_some() {
        config.audio_device = args.device;
    }
    if let Some(model) = args.model {
        config.model = model;
    }
    if args.mute {
        config.speak_replies = false;
    }

    tutortalk::logging::init(args.verbose, &config.log_level);
    info!("🧠 TutorTalk v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut session = SessionController::from_config(&config, tokio::runtime::Handle::current())?;
    let history_limit = config.history_display_limit;

    println!("🧠 Personalized AI Learning Tutor");
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print_prompt();
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "/quit" | "/exit" => break,
            "/help" => println!("{HELP}"),
            "/stop" => {
                session.stop_voice();
                println!("🛑 Voice stopped.");
            }
            "/clear" => {
                session.clear_memory();
                println!("🧠 Chat memory cleared!");
            }
            "/history" => {
                println!("🗨️ Conversation History");
                for turn in session.recent_turns(history_limit) {
                    println!("{}: {}", turn.speaker, turn.text);
                }
            }
            "/voice" => {
                println!("🎧 Listening... Speak now!");
                match session.submit_voice().await {
                    Ok((question, reply)) => {
                        println!("✅ You said: {question}");
                        println!("🤖 {reply}");
                    }
                    Err(e) => println!("{}", SessionController::error_notice(&e)),
                }
            }
            question => {
                if question.is_empty() {
                    continue;
                }
                println!("🤖 Thinking...");
                match session.submit_text(question).await {
                    Ok(Some(reply)) => println!("🤖 {reply}"),
                    Ok(None) => {}
                    Err(e) => println!("{}", SessionController::error_notice(&e)),
                }
            }
        }
    }

    session.stop_voice();
    info!("👋 TutorTalk shutting down");
    Ok(())
}

fn print_prompt() {
    use std::io::Write;
    print!("💭 Ask your question: ");
    let _ = std::io::stdout().flush();
}

//! Interactive chat loop for the support chatbot.

use std::io::Write as _;

use cogniadapt_core::{AdapterClient, ChatEvent};
use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;
use rustyline_async::{Readline, ReadlineEvent};
use tokio_stream::StreamExt;

use crate::output::Output;

const GREETING: &str = "Hi! I'm Cogni-Chat. Ask me anything about what you're studying.";

/// Run the chat loop until the user quits
pub async fn run(client: &AdapterClient) -> Result<()> {
    let output = Output::new();

    output.status("Type 'quit' or 'exit' to leave the chat");

    // Seed the greeting so the conversation history starts with the bot
    let session = client.chat_session();
    if session.history().is_empty() {
        session.push_bot_message(GREETING);
    }
    output.bot_message("Cogni-Chat", GREETING);

    let (mut rl, mut writer) =
        Readline::new(format!("{} ", ">".bright_blue())).into_diagnostic()?;

    loop {
        match rl.readline().await {
            Ok(ReadlineEvent::Line(line)) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                if line == "quit" || line == "exit" {
                    output.status("Goodbye!");
                    break;
                }

                rl.add_history_entry(line.clone());

                let mut stream = match client.send_chat_message(&line).await {
                    Ok(stream) => stream,
                    Err(e) => {
                        output.error(&format!("Error: {}", e));
                        continue;
                    }
                };

                writeln!(writer).into_diagnostic()?;
                while let Some(event) = stream.next().await {
                    match event {
                        ChatEvent::Fragment { text } => {
                            write!(writer, "{}", text).into_diagnostic()?;
                            writer.flush().into_diagnostic()?;
                        }
                        ChatEvent::Failed { message } => {
                            writeln!(writer).into_diagnostic()?;
                            output.error(&message);
                        }
                    }
                }
                writeln!(writer).into_diagnostic()?;
            }
            Ok(ReadlineEvent::Interrupted) => {
                output.status("CTRL-C");
                continue;
            }
            Ok(ReadlineEvent::Eof) => {
                output.status("CTRL-D");
                break;
            }
            Err(err) => {
                output.error(&format!("Error: {:?}", err));
                break;
            }
        }
    }

    Ok(())
}

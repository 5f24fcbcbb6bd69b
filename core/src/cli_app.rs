use crate::backend::{Backend, HttpBackend};
use crate::clipboard::MemoryClipboard;
use crate::config::Config;
use crate::controller::ChatController;
use crate::model::Sender;
use crate::view::{ChatView, Notice};
use colored::*;
use std::io::{BufRead, Write};

/// One-shot client: each command drives the same controller the chat
/// screen uses, then prints what the screen would have shown.
pub async fn run(args: Vec<String>) -> anyhow::Result<()> {
    let bin = args
        .first()
        .map(|s| s.as_str())
        .unwrap_or("cli")
        .to_string();

    let (config, rest) = Config::from_args(&args)?;
    let Some(command) = rest.first() else {
        print_usage(&bin);
        return Ok(());
    };

    let backend = HttpBackend::new(config.backend_url.clone());
    let mut controller = ChatController::new(ChatView::new(config.sender), MemoryClipboard::new());

    match command.as_str() {
        "send" => {
            let Some((sender, message)) = send_args(&rest[1..], config.sender) else {
                eprintln!("{}", format!("Usage: {} send [alice|bob] <message>", bin).yellow());
                return Ok(());
            };
            send(&mut controller, &backend, sender, &message).await;
        }
        "keys" => {
            show_keys(&mut controller, &backend).await;
        }
        "regen" => {
            let yes = rest.iter().skip(1).any(|a| a == "--yes" || a == "-y");
            regenerate(&mut controller, &backend, yes).await?;
        }
        _ => {
            eprintln!("{} Unknown command: {}", "✗".red().bold(), command.red());
            print_usage(&bin);
        }
    }

    Ok(())
}

fn print_usage(bin: &str) {
    println!("{}", "🔐 CipherChat CLI".bright_cyan().bold());
    println!();
    println!("{}", "Usage:".bright_white().bold());
    println!(
        "  {} [--backend <url>] [--sender <alice|bob>] <command> [args]",
        bin.cyan()
    );
    println!();
    println!("{}", "Commands:".bright_white().bold());
    println!(
        "  {} [alice|bob] <message> Encrypt and round-trip a message",
        "send".cyan()
    );
    println!("  {}                        Print the server's keypairs", "keys".cyan());
    println!(
        "  {} [--yes]                Regenerate the server's keypairs",
        "regen".cyan()
    );
}

/// `send` arguments: an optional leading sender, then the message words.
/// Without a leading sender the configured one is used.
fn send_args(args: &[String], default_sender: Sender) -> Option<(Sender, String)> {
    let (sender, words) = match args {
        [first, rest @ ..] if !rest.is_empty() => match first.parse::<Sender>() {
            Ok(sender) => (sender, rest),
            Err(_) => (default_sender, args),
        },
        _ => (default_sender, args),
    };
    if words.is_empty() {
        return None;
    }
    Some((sender, words.join(" ")))
}

async fn send<B: Backend>(
    controller: &mut ChatController<MemoryClipboard>,
    backend: &B,
    sender: Sender,
    message: &str,
) {
    let request = controller.send_message(message, sender);
    controller.drive(request, backend).await;

    exit_on_notice(controller);

    let view = controller.view();
    for msg in view.messages.items() {
        println!("{} {}", format!("[{:?}]", msg.author).dimmed(), msg.text.bright_white());
    }
    println!();
    println!("{}", "Encrypted bundle:".bright_white().bold());
    println!("{}", view.bundle_view.green());
}

async fn show_keys<B: Backend>(controller: &mut ChatController<MemoryClipboard>, backend: &B) {
    let request = controller.show_keys();
    controller.drive(request, backend).await;

    let keys = &controller.view().keys_view;
    if keys.starts_with("Error: ") {
        eprintln!("{} {}", "✗".red().bold(), keys.red());
        std::process::exit(1);
    }
    println!("{}", keys);
}

async fn regenerate<B: Backend>(
    controller: &mut ChatController<MemoryClipboard>,
    backend: &B,
    yes: bool,
) -> anyhow::Result<()> {
    controller.regenerate_keys();
    let answer = if yes {
        true
    } else {
        let question = controller
            .view()
            .confirm
            .map(|c| c.question())
            .unwrap_or_default();
        print!("{} {} ", question.yellow(), "[y/N]".dimmed());
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    };

    let request = controller.answer_confirm(answer);
    if request.is_none() {
        println!("{}", "Cancelled".yellow());
        return Ok(());
    }
    controller.drive(request, backend).await;

    match controller.view().notice() {
        Some(Notice::Info(text)) => println!("{} {}", "✓".green().bold(), text.green()),
        _ => exit_on_notice(controller),
    }
    Ok(())
}

fn exit_on_notice(controller: &ChatController<MemoryClipboard>) {
    if let Some(notice) = controller.view().notice() {
        if notice.error().is_some() {
            eprintln!("{} {}", "✗".red().bold(), notice.text().red());
            std::process::exit(1);
        }
    }
}

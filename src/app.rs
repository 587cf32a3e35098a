//! Terminal lifecycle and the main event loop

use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use crate::config::Config;
use crate::conversation::ConversationController;
use crate::transport::ChatTransport;
use crate::ui::chat::{ChatAction, ChatManager};

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

fn init() -> Result<Tui> {
    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    Ok(Terminal::new(backend)?)
}

fn restore() -> Result<()> {
    execute!(io::stdout(), LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Restore the terminal before the default panic output runs
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        original_hook(panic_info);
    }));
}

pub async fn run(config: Config) -> Result<()> {
    install_panic_hook();
    let mut terminal = init()?;
    let result = event_loop(&mut terminal, config).await;
    restore()?;
    result
}

/// Single-threaded heart of the app: all conversation state is mutated
/// here, between draws. Transport completions arrive over the reply
/// channel; the tick keeps the thinking indicator animated.
async fn event_loop(terminal: &mut Tui, config: Config) -> Result<()> {
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel();
    let transport = ChatTransport::new(&config);
    let mut controller =
        ConversationController::new(transport, reply_tx, config.greeting.clone());
    let mut manager = ChatManager::new(config.ui.show_timestamps);

    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(Duration::from_millis(300));

    loop {
        terminal.draw(|frame| {
            manager.render(
                frame,
                controller.messages(),
                controller.is_pending(),
                controller.error(),
            );
        })?;

        tokio::select! {
            maybe_event = events.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        match manager.handle_key(key, controller.is_pending()) {
                            ChatAction::Submit(text) => {
                                controller.submit(&text);
                            }
                            ChatAction::Reset => controller.reset(),
                            ChatAction::DismissError => controller.dismiss_error(),
                            ChatAction::Quit => break,
                            ChatAction::None => {}
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => return Err(err.into()),
                    None => break,
                }
            }
            Some(event) = reply_rx.recv() => {
                controller.apply_reply(event);
            }
            _ = tick.tick() => {}
        }
    }

    Ok(())
}

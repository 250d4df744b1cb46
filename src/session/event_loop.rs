use std::future::Future;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::diagnostics::stats::StatsSnapshot;
use crate::session::commands::UiCommand;
use crate::session::controller::{SessionController, Wakeup};

enum LoopEvent {
    Wakeup(Wakeup),
    Command(Option<UiCommand>),
    Shutdown,
}

/// Drive `controller` until `shutdown` resolves or a `Quit` command arrives,
/// then stop any running session and return the final counters.
///
/// Every event is handled to completion before the next one is taken.
pub async fn run(
    mut controller: SessionController,
    mut commands: UnboundedReceiver<UiCommand>,
    shutdown: impl Future<Output = ()>,
) -> StatsSnapshot {
    tokio::pin!(shutdown);
    let mut commands_open = true;

    loop {
        let event = tokio::select! {
            wakeup = controller.next_wakeup() => LoopEvent::Wakeup(wakeup),
            command = commands.recv(), if commands_open => LoopEvent::Command(command),
            () = &mut shutdown => LoopEvent::Shutdown,
        };

        match event {
            LoopEvent::Wakeup(wakeup) => controller.handle_wakeup(wakeup),
            LoopEvent::Command(Some(command)) => {
                if !apply(&mut controller, command).await {
                    break;
                }
            }
            LoopEvent::Command(None) => {
                debug!("command channel closed");
                commands_open = false;
            }
            LoopEvent::Shutdown => {
                info!("shutting down");
                break;
            }
        }
    }

    controller.shutdown()
}

/// Returns `false` when the loop should end.
async fn apply(controller: &mut SessionController, command: UiCommand) -> bool {
    match command {
        UiCommand::Start => {
            if let Err(e) = controller.start().await {
                warn!("cannot start: {e}");
            }
        }
        UiCommand::Stop => {
            if !controller.stop() {
                debug!("stop ignored, no session running");
            }
        }
        UiCommand::Select(kind) => {
            if let Err(e) = controller.select_exercise(&kind) {
                warn!("cannot select exercise: {e}");
            }
        }
        UiCommand::Stats => match serde_json::to_string(&controller.stats()) {
            Ok(json) => info!("stats: {json}"),
            Err(e) => warn!("failed to serialize stats: {e}"),
        },
        UiCommand::Quit => return false,
    }
    true
}

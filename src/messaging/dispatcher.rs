use super::TransportEvent;
use crate::client::{ClientInner, CloseOutcome};
use std::ops::ControlFlow;
use std::sync::Weak;

/// Feeds the events of one underlying connection into the client state
pub struct EventDispatcher {
    client: Weak<ClientInner>,
    generation: u64,
}

impl EventDispatcher {
    pub(crate) fn new(client: Weak<ClientInner>, generation: u64) -> Self {
        Self { client, generation }
    }

    /// Applies one event. Breaks once the connection is finished, replaced,
    /// or the client is gone.
    pub async fn dispatch(&self, event: TransportEvent) -> ControlFlow<()> {
        let Some(client) = self.client.upgrade() else {
            tracing::debug!("Client dropped, discarding {} event", event.as_str());
            return ControlFlow::Break(());
        };

        let mut state = client.state.write().await;
        if state.generation() != self.generation {
            tracing::debug!(
                "Discarding {} event from stale connection {}",
                event.as_str(),
                self.generation
            );
            return ControlFlow::Break(());
        }

        match event {
            TransportEvent::Opened => state.handle_open(),
            TransportEvent::Message(text) => {
                state.handle_frame(&text);
            }
            TransportEvent::Error(reason) => state.handle_error(&reason),
            TransportEvent::Closed(info) => {
                if state.handle_close(&info) == CloseOutcome::Unexpected {
                    client.schedule_reconnect(&mut state);
                }
                return ControlFlow::Break(());
            }
        }

        ControlFlow::Continue(())
    }
}

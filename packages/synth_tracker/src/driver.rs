//! Async driver
//!
//! Serializes push messages and the poll interval onto one tokio task, so the
//! engine only ever sees one mutator.

use std::sync::Arc;

use synth_model::OutcomeOracle;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::engine::SessionEngine;
use crate::message::CraftMessage;
use crate::notify::SessionEvent;
use crate::signal::CraftHost;

/// Spawn a task that feeds `engine` from `message_rx` and a poll interval and
/// forwards every emitted event on `event_tx`.
///
/// The task stops when the message channel closes or the event receiver is
/// dropped, and hands the engine back so callers can inspect what it saw.
pub fn spawn_session_driver<O, H>(
    mut engine: SessionEngine<O>,
    host: Arc<H>,
    mut message_rx: mpsc::Receiver<CraftMessage>,
    event_tx: mpsc::Sender<SessionEvent>,
) -> tokio::task::JoinHandle<SessionEngine<O>>
where
    O: OutcomeOracle + Send + 'static,
    H: CraftHost + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut tick_interval = tokio::time::interval(engine.config().poll_interval);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        'driver: loop {
            tokio::select! {
                message = message_rx.recv() => {
                    let Some(message) = message else {
                        debug!("Message channel closed, stopping session driver");
                        break;
                    };
                    engine.handle_message(&message, host.as_ref());
                }
                _ = tick_interval.tick() => {
                    for event in engine.tick(host.as_ref()) {
                        if event_tx.send(event).await.is_err() {
                            debug!("Event receiver dropped, stopping session driver");
                            break 'driver;
                        }
                    }
                }
            }
        }

        engine
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerConfig;
    use crate::phase::SessionPhase;
    use crate::signal::{PhaseSignal, QuickSynthProgress, UiSnapshot};
    use std::sync::Mutex;
    use std::time::Duration;
    use synth_model::{
        BreakpointTables, CharacterStats, CraftDefinition, RecipeDescriptor, Simulation, Skill,
        StaticBreakpoints, StepSnapshot,
    };

    struct NoOracle;

    impl OutcomeOracle for NoOracle {
        fn simulate(
            &self,
            _craft: &CraftDefinition,
            step: &StepSnapshot,
            _action: Skill,
            _failed: bool,
            _chain_position: u32,
        ) -> Simulation {
            Simulation {
                deltas: Default::default(),
                next: step.clone(),
            }
        }
    }

    #[derive(Default)]
    struct SharedHost {
        signal: Mutex<PhaseSignal>,
        tables: StaticBreakpoints,
    }

    impl CraftHost for SharedHost {
        fn phase_signal(&self) -> PhaseSignal {
            *self.signal.lock().unwrap()
        }
        fn poll_ui_snapshot(&self) -> Option<UiSnapshot> {
            None
        }
        fn poll_quick_synth(&self) -> Option<QuickSynthProgress> {
            None
        }
        fn resolve_recipe(&self, _recipe_id: u32) -> Option<RecipeDescriptor> {
            None
        }
        fn character_stats(&self) -> CharacterStats {
            CharacterStats::default()
        }
        fn resolve_action(&self, _action_id: u32) -> Skill {
            Skill::None
        }
        fn breakpoints(&self) -> &dyn BreakpointTables {
            &self.tables
        }
    }

    fn engine() -> SessionEngine<NoOracle> {
        SessionEngine::new(
            NoOracle,
            TrackerConfig {
                poll_interval: Duration::from_millis(5),
                ..Default::default()
            },
        )
    }

    async fn next_event(rx: &mut mpsc::Receiver<SessionEvent>) -> SessionEvent {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("driver stopped")
    }

    #[tokio::test]
    async fn driver_forwards_tick_events() {
        let host = Arc::new(SharedHost::default());
        let (msg_tx, msg_rx) = mpsc::channel(16);
        let (event_tx, mut event_rx) = mpsc::channel(16);
        let handle = spawn_session_driver(engine(), host.clone(), msg_rx, event_tx);

        assert_eq!(
            next_event(&mut event_rx).await,
            SessionEvent::PhaseChanged {
                from: SessionPhase::Unknown,
                to: SessionPhase::AwaitingSessionEnd,
            }
        );
        assert_eq!(
            next_event(&mut event_rx).await,
            SessionEvent::PhaseChanged {
                from: SessionPhase::AwaitingSessionEnd,
                to: SessionPhase::Idle,
            }
        );

        *host.signal.lock().unwrap() = PhaseSignal {
            preparing: false,
            active: true,
            transitioning: true,
        };
        assert_eq!(
            next_event(&mut event_rx).await,
            SessionEvent::PhaseChanged {
                from: SessionPhase::Idle,
                to: SessionPhase::AwaitingStart,
            }
        );

        drop(msg_tx);
        let engine = handle.await.unwrap();
        assert_eq!(engine.phase(), SessionPhase::AwaitingStart);
    }

    #[tokio::test]
    async fn driver_applies_messages() {
        let host = Arc::new(SharedHost::default());
        let (msg_tx, msg_rx) = mpsc::channel(16);
        let (event_tx, _event_rx) = mpsc::channel(16);
        let handle = spawn_session_driver(engine(), host, msg_rx, event_tx);

        msg_tx.send(CraftMessage::QuickSynthProgress).await.unwrap();
        drop(msg_tx);

        let engine = handle.await.unwrap();
        let codes: Vec<_> = engine
            .diagnostics()
            .entries()
            .map(|r| r.diagnostic.code())
            .collect();
        assert!(codes.contains(&"unexpected_message"), "{codes:?}");
    }

    #[tokio::test]
    async fn driver_stops_when_events_are_dropped() {
        let host = Arc::new(SharedHost::default());
        let (_msg_tx, msg_rx) = mpsc::channel(16);
        let (event_tx, event_rx) = mpsc::channel(16);
        drop(event_rx);

        let handle = spawn_session_driver(engine(), host, msg_rx, event_tx);
        let engine = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("driver did not stop")
            .unwrap();
        assert_eq!(engine.phase(), SessionPhase::AwaitingSessionEnd);
    }
}

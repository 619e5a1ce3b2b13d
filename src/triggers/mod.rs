pub mod hadith_watch;
pub mod schedule;

use std::sync::Arc;

use crate::AppState;

/// Readiness signal for trigger sources. Triggers are spawned at startup but
/// hold their fire until `ReadySignal::set_ready` is called once after
/// dependency warm-up. The HTTP surface is never gated.
pub fn ready_gate() -> (ReadySignal, ReadyGate) {
    let (tx, rx) = tokio::sync::watch::channel(false);
    (ReadySignal { tx }, ReadyGate { rx })
}

pub struct ReadySignal {
    tx: tokio::sync::watch::Sender<bool>,
}

impl ReadySignal {
    pub fn set_ready(&self) {
        let _ = self.tx.send(true);
    }
}

#[derive(Clone)]
pub struct ReadyGate {
    rx: tokio::sync::watch::Receiver<bool>,
}

impl ReadyGate {
    /// Resolves once readiness is signalled. If the signal is dropped without
    /// ever becoming ready, this never resolves: triggers must not fire.
    pub async fn wait(mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Spawn both trigger loops, each gated on the readiness signal.
pub fn spawn_triggers(state: Arc<AppState>, gate: ReadyGate) {
    {
        let state = state.clone();
        let gate = gate.clone();
        tokio::spawn(async move {
            gate.wait().await;
            schedule::run(state).await;
        });
    }

    tokio::spawn(async move {
        gate.wait().await;
        hadith_watch::run(state).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn gate_blocks_until_ready() {
        let (signal, gate) = ready_gate();

        let waiter = tokio::spawn(gate.clone().wait());
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        signal.set_ready();
        waiter.await.unwrap();

        // Already-ready gates resolve immediately
        gate.wait().await;
    }
}

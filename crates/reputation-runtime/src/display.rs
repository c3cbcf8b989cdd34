//! Periodic console print of the current snapshot.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use miner_reputation::{ReputationApi, Snapshot};

/// Render a snapshot as a plain-text table.
pub fn render(snapshot: Option<&Snapshot>) -> String {
    let Some(snapshot) = snapshot else {
        return "Reputations: no round published yet\n".to_string();
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Reputations (round {}, {} miners, {} slashed):",
        snapshot.round,
        snapshot.len(),
        snapshot.slashed_count()
    );
    for rep in &snapshot.records {
        let _ = writeln!(
            out,
            "  {:<12} {:<56} slashed={}",
            rep.address.as_str(),
            rep.peer_id.as_str(),
            rep.slashed
        );
    }
    out
}

/// Print the snapshot every `interval` until `shutdown` is raised.
pub async fn run_display(
    api: Arc<dyn ReputationApi>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = shutdown.wait_for(|stop| *stop) => break,
            _ = ticker.tick() => {
                print!("{}", render(api.snapshot().as_ref()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miner_reputation::{Address, PeerId, Reputation};

    #[test]
    fn test_render_before_first_round() {
        assert!(render(None).contains("no round published"));
    }

    #[test]
    fn test_render_lists_every_record() {
        let snapshot = Snapshot::new(
            4,
            vec![
                Reputation::new(Address::from_actor_id(1000), PeerId::new("12D3KooWA"), false),
                Reputation::new(Address::from_actor_id(1001), PeerId::new("12D3KooWB"), true),
            ],
        );

        let text = render(Some(&snapshot));
        assert!(text.starts_with("Reputations (round 4, 2 miners, 1 slashed):"));
        assert!(text.contains("t01000"));
        assert!(text.contains("12D3KooWB"));
        assert!(text.contains("slashed=true"));
        assert_eq!(text.lines().count(), 3);
    }
}

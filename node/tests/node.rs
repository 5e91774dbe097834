//! Node wiring against a real LMDB directory.

use std::sync::Arc;
use std::time::Duration;

use mirror_governance::{ProposalDraft, ProposalStatus};
use mirror_node::{MirrorConfig, MirrorNode};
use mirror_nullables::NullClock;
use mirror_types::UserId;

const START: u64 = 1_700_000_000;

fn config(dir: &tempfile::TempDir) -> MirrorConfig {
    MirrorConfig {
        data_dir: dir.path().to_path_buf(),
        map_size: 16 << 20,
        rpc_port: 0,
        ..MirrorConfig::default()
    }
}

fn draft() -> ProposalDraft {
    ProposalDraft {
        title: "Public moderation log".into(),
        description: "Publish every moderation action with its reason.".into(),
        full_text: "Every removal, suspension or label applied by moderators is recorded in a \
                    public log together with the rule it enforces and the reason given."
            .into(),
        rationale: "Members cannot trust moderation they are not allowed to see or question."
            .into(),
        requires_super_majority: true,
        affected_sections: Vec::new(),
    }
}

#[tokio::test]
async fn node_serves_until_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let node = Arc::new(
        MirrorNode::with_clock(config(&dir), Arc::new(NullClock::new(START))).unwrap(),
    );
    let stop = node.shutdown_handle();

    let runner = {
        let node = node.clone();
        tokio::spawn(async move { node.run().await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    stop.shutdown();

    tokio::time::timeout(Duration::from_secs(5), runner)
        .await
        .expect("node should stop after shutdown")
        .unwrap()
        .unwrap();
}

#[test]
fn proposals_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(NullClock::new(START));

    let id = {
        let node = MirrorNode::with_clock(config(&dir), clock.clone()).unwrap();
        let lifecycle = node.state().lifecycle().clone();
        let proposal = lifecycle
            .submit_draft(&UserId::parse("author").unwrap(), draft())
            .unwrap();
        lifecycle
            .admit_to_voting(&proposal.id, &UserId::parse("guardian").unwrap(), None)
            .unwrap();
        proposal.id
    };

    let node = MirrorNode::with_clock(config(&dir), clock).unwrap();
    let proposal = node.state().lifecycle().get(&id).unwrap();
    assert_eq!(proposal.status, ProposalStatus::Voting);
    assert_eq!(proposal.title, "Public moderation log");
}

#[test]
fn invalid_governance_parameters_refuse_to_start() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(&dir);
    config.governance.max_write_attempts = 0;
    assert!(MirrorNode::new(config).is_err());
}

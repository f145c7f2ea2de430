//! # Governance Across Chains
//!
//! Proposal lifecycle with governance on Ethereum and voting plus payload
//! execution on Polygon, every hop carried by the cross-chain controllers.
//!
//! ## Flow Tested:
//!
//! 1. **Governance → Voting Machine**: activation sends the snapshot block
//!    and duration; the vote starts if the snapshot roots are proven
//! 2. **Voting Machine**: direct votes with storage proofs, portal votes
//!    settled with proofs
//! 3. **Voting Machine → Portal → Governance**: results queue or fail the
//!    proposal
//! 4. **Governance → Payloads Controller**: one execution message per
//!    payload

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cc_01_envelope_codec::{Envelope, VotingAssetWithSlot};
    use cc_05_receiver::{DeliveryOutcome, EnvelopeState, RecordingHandler};
    use cc_07_governance::config::with_decimals;
    use cc_07_governance::service::voting_strategy::BASE_BALANCE_SLOT;
    use cc_07_governance::{AccessLevel, GovernanceError, Payload, ProposalState, ProposalVoteState};
    use shared_bus::ProtocolEvent;
    use shared_types::{address_from_u64, chains, Address};

    use crate::harness::{creator, GovernanceDeployment, ACTIVATION_DELAY, EXECUTION_DELAY, VOTING_PERIOD};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn alice() -> Address {
        address_from_u64(0xA11CE)
    }

    fn bob() -> Address {
        address_from_u64(0xB0B)
    }

    fn deploy(for_votes: u64, against_votes: u64) -> GovernanceDeployment {
        GovernanceDeployment::new(&[(alice(), for_votes), (bob(), against_votes)]).unwrap()
    }

    /// Alice votes for, Bob against, then voting closes on Polygon.
    fn run_vote(d: &GovernanceDeployment) -> u64 {
        let proposal_id = d.create_active_proposal(&[7, 8]).unwrap();
        d.vote(&alice(), proposal_id, true).unwrap();
        d.vote(&bob(), proposal_id, false).unwrap();
        d.network.advance(VOTING_PERIOD);
        d.machine.close_and_send_vote(proposal_id).unwrap();
        proposal_id
    }

    fn aave_with_slot(d: &GovernanceDeployment) -> VotingAssetWithSlot {
        VotingAssetWithSlot {
            underlying_asset: d.assets.aave,
            slot: BASE_BALANCE_SLOT,
        }
    }

    // =============================================================================
    // FULL LIFECYCLE
    // =============================================================================

    #[test]
    fn test_proposal_lifecycle_across_chains() {
        let d = deploy(330_000, 5_000);
        let proposal_id = d.create_active_proposal(&[7, 8]).unwrap();

        // Activation reached Polygon and the vote started.
        assert_eq!(d.governance.get_proposal_state(proposal_id), ProposalState::Active);
        assert_eq!(d.machine.get_proposal_state(proposal_id), ProposalVoteState::Active);
        let snapshot = d.governance.get_proposal(proposal_id).unwrap().snapshot_block_hash;
        assert_eq!(snapshot, d.state.block_hash());
        assert_eq!(d.network.polygon.count_events("ProposalVoteStarted"), 1);

        // Alice votes directly on Polygon.
        assert_eq!(d.vote(&alice(), proposal_id, true).unwrap(), with_decimals(330_000));

        // Bob votes from Ethereum and settles with a proof on Polygon.
        d.governance
            .vote_via_portal(&bob(), proposal_id, false, &[aave_with_slot(&d)])
            .unwrap();
        assert!(d.portal.did_voter_vote_on_proposal(proposal_id, &bob()));
        assert!(d.machine.get_bridged_vote_info(proposal_id, &bob()).is_some());
        let power = d
            .machine
            .settle_vote_from_portal(proposal_id, &bob(), &[d.aave_proof(&bob())])
            .unwrap();
        assert_eq!(power, with_decimals(5_000));
        assert!(d.machine.get_bridged_vote_info(proposal_id, &bob()).is_none());

        // Results travel back and queue the proposal.
        d.network.advance(VOTING_PERIOD);
        d.machine.close_and_send_vote(proposal_id).unwrap();
        assert_eq!(
            d.machine.get_proposal_state(proposal_id),
            ProposalVoteState::SentToGovernance
        );
        let proposal = d.governance.get_proposal(proposal_id).unwrap();
        assert_eq!(proposal.state, ProposalState::Queued);
        assert_eq!(proposal.for_votes, with_decimals(330_000));
        assert_eq!(proposal.against_votes, with_decimals(5_000));
        assert!(d.network.ethereum.bus.history().iter().any(|e| matches!(
            e,
            ProtocolEvent::VoteMessageReceived { delivered: true, .. }
        )));

        // Execution waits for the cooldown.
        assert_eq!(
            d.governance.execute_proposal(proposal_id),
            Err(GovernanceError::QueueCooldownNotPassed(proposal_id))
        );
        d.network.advance(EXECUTION_DELAY);
        d.governance.execute_proposal(proposal_id).unwrap();

        assert_eq!(d.governance.get_proposal_state(proposal_id), ProposalState::Executed);
        assert!(d.payloads.is_payload_executed(7));
        assert!(d.payloads.is_payload_executed(8));
        assert_eq!(d.network.ethereum.count_events("PayloadSent"), 2);
        assert_eq!(d.network.ethereum.count_events("ProposalExecuted"), 1);
        assert_eq!(d.network.polygon.count_events("PayloadExecutionMessageReceived"), 2);
    }

    // =============================================================================
    // TALLIES
    // =============================================================================

    #[test]
    fn test_tally_passes_with_clear_majority() {
        let d = deploy(330_000, 5_000);
        let proposal_id = run_vote(&d);
        assert_eq!(d.governance.get_proposal_state(proposal_id), ProposalState::Queued);
        assert_eq!(d.network.ethereum.count_events("ProposalQueued"), 1);
    }

    #[test]
    fn test_tally_fails_without_differential() {
        let d = deploy(330_000, 235_000);
        let proposal_id = run_vote(&d);

        let proposal = d.governance.get_proposal(proposal_id).unwrap();
        assert_eq!(proposal.state, ProposalState::Failed);
        assert_eq!(proposal.against_votes, with_decimals(235_000));
        assert_eq!(d.network.ethereum.count_events("ProposalFailed"), 1);

        d.network.advance(EXECUTION_DELAY);
        assert_eq!(
            d.governance.execute_proposal(proposal_id),
            Err(GovernanceError::ProposalNotInQueuedState(proposal_id))
        );
        assert!(!d.payloads.is_payload_executed(7));
    }

    #[test]
    fn test_tally_at_exact_threshold_and_differential() {
        let d = deploy(320_000, 220_000);
        let proposal_id = run_vote(&d);
        assert_eq!(d.governance.get_proposal_state(proposal_id), ProposalState::Queued);

        let d = deploy(319_999, 0);
        let proposal_id = d.create_active_proposal(&[1]).unwrap();
        d.vote(&alice(), proposal_id, true).unwrap();
        d.network.advance(VOTING_PERIOD);
        d.machine.close_and_send_vote(proposal_id).unwrap();
        assert_eq!(d.governance.get_proposal_state(proposal_id), ProposalState::Failed);
    }

    #[test]
    fn test_unroutable_payload_blocks_whole_execution() {
        let d = deploy(330_000, 5_000);
        let payloads = [(chains::POLYGON, 7), (chains::AVALANCHE, 8)]
            .into_iter()
            .map(|(chain, payload_id)| Payload {
                chain,
                access_level: AccessLevel::Level1,
                payloads_controller: d.payloads.address(),
                payload_id,
            })
            .collect();
        let proposal_id = d
            .governance
            .create_proposal(&creator(), payloads, d.portal.address(), [0x1f; 32])
            .unwrap();
        d.network.advance(ACTIVATION_DELAY);
        d.governance.activate_voting(proposal_id).unwrap();
        d.vote(&alice(), proposal_id, true).unwrap();
        d.network.advance(VOTING_PERIOD);
        d.machine.close_and_send_vote(proposal_id).unwrap();
        assert_eq!(d.governance.get_proposal_state(proposal_id), ProposalState::Queued);

        d.network.advance(EXECUTION_DELAY);
        let registered = d.network.ethereum.count_events("EnvelopeRegistered");
        assert!(matches!(
            d.governance.execute_proposal(proposal_id),
            Err(GovernanceError::Controller(_))
        ));

        // Ethereum has no bridge to Avalanche, so the Polygon payload is not
        // sent either.
        assert_eq!(d.governance.get_proposal_state(proposal_id), ProposalState::Queued);
        assert_eq!(d.network.ethereum.count_events("EnvelopeRegistered"), registered);
        assert_eq!(d.network.ethereum.count_events("PayloadSent"), 0);
        assert!(!d.payloads.is_payload_executed(7));
    }

    // =============================================================================
    // RETRIES AND REJECTIONS
    // =============================================================================

    #[test]
    fn test_early_results_stay_retryable() {
        let d = deploy(330_000, 5_000);
        let proposal_id = d.create_active_proposal(&[7]).unwrap();
        d.vote(&alice(), proposal_id, true).unwrap();

        // Polygon's clock runs ahead of Ethereum's.
        d.network.polygon.ctx.advance(VOTING_PERIOD);
        d.machine.close_and_send_vote(proposal_id).unwrap();
        assert_eq!(d.governance.get_proposal_state(proposal_id), ProposalState::Active);

        let envelope = d
            .network
            .polygon
            .bus
            .history()
            .into_iter()
            .find_map(|event| match event {
                ProtocolEvent::EnvelopeRegistered { envelope, .. } => Some(envelope),
                _ => None,
            })
            .unwrap();
        let receiver = d.network.ethereum.controller.receiver();
        assert_eq!(receiver.get_envelope_state(&envelope.id()), EnvelopeState::Confirmed);

        d.network.ethereum.ctx.advance(VOTING_PERIOD);
        let outcome = d.network.ethereum.controller.deliver_envelope(&envelope).unwrap();
        assert_eq!(outcome, DeliveryOutcome::Delivered);
        assert_eq!(d.governance.get_proposal_state(proposal_id), ProposalState::Queued);
    }

    /// Envelopes whose delivery failed on Polygon, in arrival order.
    fn failed_on_polygon(d: &GovernanceDeployment) -> Vec<Envelope> {
        d.network
            .polygon
            .bus
            .history()
            .into_iter()
            .filter_map(|event| match event {
                ProtocolEvent::EnvelopeDeliveryAttempted {
                    envelope,
                    is_delivered: false,
                    ..
                } => Some(envelope),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_vote_overtaking_proposal_is_retried() {
        let d = deploy(330_000, 5_000);
        let proposal_id = d.create_proposal(&[7]).unwrap();
        d.network.advance(ACTIVATION_DELAY);

        // The proposal message reaches Polygon while the machine is not
        // accepting deliveries.
        let rejecting = Arc::new(RecordingHandler::new());
        rejecting.set_to_revert(true);
        let polygon = &d.network.polygon.controller;
        polygon.bind_handler(d.machine.address(), rejecting);
        d.governance.activate_voting(proposal_id).unwrap();
        polygon.bind_handler(d.machine.address(), d.machine.clone());

        // Bob's portal vote lands before the proposal and is refused.
        d.governance
            .vote_via_portal(&bob(), proposal_id, false, &[aave_with_slot(&d)])
            .unwrap();
        let failed = failed_on_polygon(&d);
        assert_eq!(failed.len(), 2);
        let (proposal_envelope, vote_envelope) = (&failed[0], &failed[1]);
        let receiver = polygon.receiver();
        assert_eq!(receiver.get_envelope_state(&vote_envelope.id()), EnvelopeState::Confirmed);
        assert!(d.machine.get_bridged_vote_info(proposal_id, &bob()).is_none());

        // Still refused while the proposal is missing.
        assert!(matches!(
            polygon.deliver_envelope(vote_envelope).unwrap(),
            DeliveryOutcome::Failed(_)
        ));

        assert_eq!(
            polygon.deliver_envelope(proposal_envelope).unwrap(),
            DeliveryOutcome::Delivered
        );
        assert_eq!(d.machine.get_proposal_state(proposal_id), ProposalVoteState::Active);
        assert_eq!(
            polygon.deliver_envelope(vote_envelope).unwrap(),
            DeliveryOutcome::Delivered
        );
        assert_eq!(receiver.get_envelope_state(&vote_envelope.id()), EnvelopeState::Delivered);

        let power = d
            .machine
            .settle_vote_from_portal(proposal_id, &bob(), &[d.aave_proof(&bob())])
            .unwrap();
        assert_eq!(power, with_decimals(5_000));
    }

    #[test]
    fn test_results_for_cancelled_proposal_not_queued() {
        let d = deploy(330_000, 5_000);
        let proposal_id = d.create_active_proposal(&[7]).unwrap();
        d.vote(&alice(), proposal_id, true).unwrap();

        let guardian = cc_07_governance::GovernanceConfig::for_testing().guardian;
        d.governance.cancel_proposal(&guardian, proposal_id).unwrap();

        d.network.advance(VOTING_PERIOD);
        d.machine.close_and_send_vote(proposal_id).unwrap();
        assert_eq!(d.governance.get_proposal_state(proposal_id), ProposalState::Cancelled);
        assert!(d.network.ethereum.bus.history().iter().any(|e| matches!(
            e,
            ProtocolEvent::EnvelopeDeliveryAttempted { is_delivered: false, .. }
        )));
        assert_eq!(d.network.ethereum.count_events("VoteMessageReceived"), 0);
    }

    #[test]
    fn test_portal_vote_only_once() {
        let d = deploy(330_000, 5_000);
        let proposal_id = d.create_active_proposal(&[7]).unwrap();

        d.governance
            .vote_via_portal(&bob(), proposal_id, false, &[aave_with_slot(&d)])
            .unwrap();
        assert_eq!(
            d.governance
                .vote_via_portal(&bob(), proposal_id, true, &[aave_with_slot(&d)]),
            Err(GovernanceError::VoterAlreadyVotedOnProposal {
                proposal_id,
                voter: bob()
            })
        );
        assert_eq!(d.network.polygon.count_events("VoteBridged"), 1);
    }

    #[test]
    fn test_unproven_snapshot_waits_for_manual_start() {
        let d = deploy(330_000, 5_000);
        d.network.ethereum.ctx.set_latest_block_hash([0x77; 32]);
        let proposal_id = d.create_active_proposal(&[7]).unwrap();

        assert!(d.network.polygon.bus.history().iter().any(|e| matches!(
            e,
            ProtocolEvent::ProposalVoteConfigurationBridged {
                vote_created: false,
                ..
            }
        )));
        assert_eq!(d.machine.get_proposal_state(proposal_id), ProposalVoteState::NotCreated);
        assert_eq!(
            d.machine.start_proposal_vote(proposal_id),
            Err(GovernanceError::MissingAaveRoots)
        );
    }
}

//! # Two-Chain Harness
//!
//! In-process chains joined by [`InMemoryBridge`] adapters. Every chain has
//! its own clock, event bus and controller; a bridge hands the encoded
//! transaction straight to the remote controller.
//!
//! [`GovernanceDeployment`] puts the governance stack on top:
//!
//! ```text
//! ETHEREUM                                 POLYGON
//! Governance ── VotingPortal ═══bridge═══▶ VotingMachine (proofs)
//!      ▲              ▲                            │
//!      │              └═════════bridge════ results ┘
//!      └── execute ══════════bridge══════▶ PayloadsController
//! ```

use std::sync::Arc;

use anyhow::Result;
use cc_02_proof_verifier::test_utils::StateFixture;
use cc_02_proof_verifier::{get_account_slot_hash, slot_key, DataWarehouse, DataWarehouseApi};
use cc_03_adapter_registry::{
    BridgeAdapterConfigInput, ConfirmationInput, ReceiverBridgeAdapterConfigInput,
};
use cc_06_controller::{ControllerConfig, CrossChainController, InMemoryBridge};
use cc_07_governance::config::{with_decimals, COOLDOWN_PERIOD};
use cc_07_governance::service::voting_strategy::{BASE_BALANCE_SLOT, STK_AAVE_EXCHANGE_RATE_SLOT};
use cc_07_governance::{
    AccessLevel, Governance, GovernanceConfig, MockPowerStrategy, Payload, PayloadsController,
    PayloadsControllerConfig, VotingAssetsConfig, VotingBalanceProof, VotingMachine,
    VotingMachineConfig, VotingPortal, VotingPortalConfig, VotingStrategy,
};
use shared_bus::{InMemoryEventBus, ProtocolEvent};
use shared_types::{address_from_u64, chains, Address, ChainId, ManualChainContext, Timestamp, U256};

/// Clock start of every chain.
pub const START: Timestamp = 1_700_000_000;

/// Level 1 cooldown before voting can start, plus one second.
pub const ACTIVATION_DELAY: u64 = 86_401;

/// Level 1 voting duration, plus one second so the vote can be closed.
pub const VOTING_PERIOD: u64 = 604_801;

/// Delay between queuing and execution.
pub const EXECUTION_DELAY: u64 = COOLDOWN_PERIOD;

// =============================================================================
// CHAINS
// =============================================================================

/// One chain: controller, clock and event bus.
pub struct Chain {
    /// Cross-chain controller.
    pub controller: Arc<CrossChainController>,
    /// Clock and block context.
    pub ctx: Arc<ManualChainContext>,
    /// Every event published on this chain.
    pub bus: Arc<InMemoryEventBus>,
    /// Controller configuration (owner, guardian).
    pub config: ControllerConfig,
}

impl Chain {
    /// Fresh chain at [`START`].
    pub fn new(chain_id: ChainId) -> Result<Self> {
        cc_telemetry::try_init_for_tests();
        let config = ControllerConfig::for_testing(chain_id);
        let ctx = Arc::new(ManualChainContext::new(chain_id, START));
        let bus = Arc::new(InMemoryEventBus::new());
        let controller = CrossChainController::new(config.clone(), ctx.clone(), bus.clone())?;
        Ok(Self {
            controller: Arc::new(controller),
            ctx,
            bus,
            config,
        })
    }

    /// Chain id.
    pub fn chain_id(&self) -> ChainId {
        self.controller.chain_id()
    }

    /// Controller owner.
    pub fn owner(&self) -> Address {
        self.config.owner
    }

    /// Approve senders on the controller.
    pub fn approve_senders(&self, senders: &[Address]) -> Result<()> {
        self.controller.approve_senders(&self.owner(), senders)?;
        Ok(())
    }

    /// Confirmations needed for envelopes from `origin_chain_id`.
    pub fn require_confirmations(&self, origin_chain_id: ChainId, required: u8) -> Result<()> {
        self.controller.update_confirmations(
            &self.owner(),
            &[ConfirmationInput {
                chain_id: origin_chain_id,
                required_confirmations: required,
            }],
        )?;
        Ok(())
    }

    /// Names of the events published so far, oldest first.
    pub fn event_names(&self) -> Vec<&'static str> {
        self.bus.history().iter().map(ProtocolEvent::name).collect()
    }

    /// Number of published events called `name`.
    pub fn count_events(&self, name: &str) -> usize {
        self.bus.history().iter().filter(|e| e.name() == name).count()
    }
}

/// Open a one-way lane from `from` to `to` through one bridge.
///
/// `local` is the adapter on `from`; `remote` is the identity transactions
/// arrive under on `to`.
pub fn connect(from: &Chain, to: &Chain, local: Address, remote: Address) -> Result<()> {
    from.controller.enable_bridge_adapters(
        &from.owner(),
        &[BridgeAdapterConfigInput {
            current_chain_bridge_adapter: local,
            destination_bridge_adapter: remote,
            destination_chain_id: to.chain_id(),
        }],
    )?;
    from.controller
        .bind_adapter(local, Arc::new(InMemoryBridge::new(from.chain_id(), &to.controller)));
    to.controller.allow_receiver_bridge_adapters(
        &to.owner(),
        &[ReceiverBridgeAdapterConfigInput {
            bridge_adapter: remote,
            chain_ids: vec![from.chain_id()],
        }],
    )?;
    Ok(())
}

/// Forwarder-side adapter number `n` on `chain_id`.
pub fn local_adapter(chain_id: ChainId, n: u64) -> Address {
    address_from_u64(0xA0_0000 + chain_id * 0x100 + n)
}

/// Identity adapter number `n` of `chain_id` delivers under remotely.
pub fn remote_adapter(chain_id: ChainId, n: u64) -> Address {
    address_from_u64(0xB0_0000 + chain_id * 0x100 + n)
}

/// Ethereum and Polygon bridged both ways.
pub struct Network {
    /// Governance chain.
    pub ethereum: Chain,
    /// Voting and execution chain.
    pub polygon: Chain,
}

impl Network {
    /// `bridges` lanes in each direction, `required` confirmations on both
    /// sides.
    pub fn new(bridges: u64, required: u8) -> Result<Self> {
        let ethereum = Chain::new(chains::ETHEREUM)?;
        let polygon = Chain::new(chains::POLYGON)?;
        for n in 0..bridges {
            connect(
                &ethereum,
                &polygon,
                local_adapter(chains::ETHEREUM, n),
                remote_adapter(chains::ETHEREUM, n),
            )?;
            connect(
                &polygon,
                &ethereum,
                local_adapter(chains::POLYGON, n),
                remote_adapter(chains::POLYGON, n),
            )?;
        }
        ethereum.require_confirmations(chains::POLYGON, required)?;
        polygon.require_confirmations(chains::ETHEREUM, required)?;
        ethereum.bus.drain();
        polygon.bus.drain();
        Ok(Self { ethereum, polygon })
    }

    /// Move both clocks forward.
    pub fn advance(&self, seconds: u64) {
        self.ethereum.ctx.advance(seconds);
        self.polygon.ctx.advance(seconds);
    }
}

// =============================================================================
// GOVERNANCE
// =============================================================================

/// Proposal creator with enough proposition power for every level.
pub fn creator() -> Address {
    address_from_u64(0xC0)
}

/// Governance on Ethereum, voting and payload execution on Polygon.
pub struct GovernanceDeployment {
    /// The two chains.
    pub network: Network,
    /// Governance (Ethereum).
    pub governance: Arc<Governance>,
    /// Portal to the Polygon voting machine (Ethereum).
    pub portal: Arc<VotingPortal>,
    /// Voting machine (Polygon).
    pub machine: Arc<VotingMachine>,
    /// Payloads controller (Polygon).
    pub payloads: Arc<PayloadsController>,
    /// Proposition power of creators.
    pub power: Arc<MockPowerStrategy>,
    /// Ethereum state at the snapshot block.
    pub state: StateFixture,
    /// Voting tokens.
    pub assets: VotingAssetsConfig,
}

impl GovernanceDeployment {
    /// Deploy with `holders` owning the given whole AAVE amounts at the
    /// snapshot block. The snapshot roots are already proven on Polygon.
    pub fn new(holders: &[(Address, u64)]) -> Result<Self> {
        let network = Network::new(1, 1)?;
        let assets = VotingAssetsConfig::for_testing();

        let mut state = StateFixture::new(18_000_000);
        state.add_account(assets.aave).add_account(assets.a_aave).set_slot(
            assets.stk_aave,
            slot_key(U256::from(STK_AAVE_EXCHANGE_RATE_SLOT)),
            with_decimals(1),
        );
        for (holder, amount) in holders {
            state.set_slot(
                assets.aave,
                get_account_slot_hash(holder, U256::from(BASE_BALANCE_SLOT)),
                with_decimals(*amount),
            );
        }
        let snapshot = state.block_hash();
        network.ethereum.ctx.set_latest_block_hash(snapshot);

        let warehouse = Arc::new(DataWarehouse::new(network.polygon.bus.clone()));
        let prover = address_from_u64(0x9999);
        for asset in [assets.aave, assets.stk_aave, assets.a_aave] {
            warehouse.process_storage_root(
                prover,
                asset,
                snapshot,
                &state.header(),
                &state.account_proof(&asset),
            )?;
        }
        let rate_slot = slot_key(U256::from(STK_AAVE_EXCHANGE_RATE_SLOT));
        warehouse.process_storage_slot(
            prover,
            assets.stk_aave,
            snapshot,
            rate_slot,
            &state.storage_proof(&assets.stk_aave, &rate_slot),
        )?;

        let power = Arc::new(MockPowerStrategy::new(address_from_u64(0x70)));
        power.set_power_of(creator(), with_decimals(100_000));

        let governance_config = GovernanceConfig::for_testing();
        let governance = Arc::new(Governance::new(
            governance_config.clone(),
            network.ethereum.ctx.clone(),
            network.ethereum.controller.clone(),
            power.clone(),
            network.ethereum.bus.clone(),
        )?);
        let portal = Arc::new(VotingPortal::new(
            VotingPortalConfig::for_testing(chains::POLYGON),
            &governance,
            network.ethereum.controller.clone(),
            network.ethereum.bus.clone(),
        ));
        governance.bind_voting_portal(portal.address(), portal.clone());
        governance.add_voting_portals(&governance_config.owner, &[portal.address()])?;

        let machine = Arc::new(VotingMachine::new(
            VotingMachineConfig::for_testing(chains::ETHEREUM),
            network.polygon.ctx.clone(),
            VotingStrategy::new(warehouse as Arc<dyn DataWarehouseApi>, assets),
            network.polygon.controller.clone(),
            network.polygon.bus.clone(),
        ));
        let payloads = Arc::new(PayloadsController::new(
            PayloadsControllerConfig::for_testing(chains::ETHEREUM),
            network.polygon.bus.clone(),
        ));

        network
            .ethereum
            .approve_senders(&[governance.address(), portal.address()])?;
        network.ethereum.controller.bind_handler(portal.address(), portal.clone());
        network.polygon.approve_senders(&[machine.address()])?;
        network.polygon.controller.bind_handler(machine.address(), machine.clone());
        network.polygon.controller.bind_handler(payloads.address(), payloads.clone());

        network.ethereum.bus.drain();
        network.polygon.bus.drain();
        Ok(Self {
            network,
            governance,
            portal,
            machine,
            payloads,
            power,
            state,
            assets,
        })
    }

    /// Level 1 proposal executing `payload_ids` on the Polygon payloads
    /// controller.
    pub fn create_proposal(&self, payload_ids: &[u64]) -> Result<u64> {
        let payloads = payload_ids
            .iter()
            .map(|payload_id| Payload {
                chain: chains::POLYGON,
                access_level: AccessLevel::Level1,
                payloads_controller: self.payloads.address(),
                payload_id: *payload_id,
            })
            .collect();
        Ok(self
            .governance
            .create_proposal(&creator(), payloads, self.portal.address(), [0x1f; 32])?)
    }

    /// Create a proposal and open voting on it.
    pub fn create_active_proposal(&self, payload_ids: &[u64]) -> Result<u64> {
        let proposal_id = self.create_proposal(payload_ids)?;
        self.network.advance(ACTIVATION_DELAY);
        self.governance.activate_voting(proposal_id)?;
        Ok(proposal_id)
    }

    /// Storage proof of `holder`'s AAVE balance at the snapshot block.
    pub fn aave_proof(&self, holder: &Address) -> VotingBalanceProof {
        let slot_hash = get_account_slot_hash(holder, U256::from(BASE_BALANCE_SLOT));
        VotingBalanceProof {
            underlying_asset: self.assets.aave,
            slot: BASE_BALANCE_SLOT,
            proof: self.state.storage_proof(&self.assets.aave, &slot_hash),
        }
    }

    /// Vote on Polygon with the holder's AAVE balance.
    pub fn vote(&self, holder: &Address, proposal_id: u64, support: bool) -> Result<U256> {
        Ok(self
            .machine
            .submit_vote(holder, proposal_id, support, &[self.aave_proof(holder)])?)
    }
}

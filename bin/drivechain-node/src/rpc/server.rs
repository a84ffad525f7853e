//! SCDB RPC server implementation.

use std::sync::Arc;

use async_trait::async_trait;
use bitcoin::{
    address::NetworkUnchecked,
    consensus::{self, Decodable},
    Address, Block, Network, Transaction,
};
use drivechain_db_types::traits::BlockArchiveDatabase;
use drivechain_primitives::{Buf20, Buf32};
use drivechain_rpc_api::ScdbApiServer;
use drivechain_rpc_types::*;
use drivechain_scdb::{
    fee, keys::derive_sidechain_keys, ConsensusContext, Scdb, ScdbError, ScdbResult,
};
use drivechain_scdb_types::{DestinationKind, Sidechain, SidechainCustomVote, WtPrimeVote};
use jsonrpsee::core::RpcResult;
use tracing::{debug, info};

use super::{
    errors::scdb_error,
    params::{fixed_hex, hash_or, non_negative, nonzero_hash_or, sidechain_number, wt_prime_hash},
};

const INVALID_SIDECHAIN: &str = "Invalid Sidechain number";
const NO_WT_PRIMES: &str = "No WT^(s) in SCDB for sidechain";

/// Number of trailing block hashes reported by `listpreviousblockhashes`.
const PREVIOUS_BLOCK_HASHES: u64 = 5;

/// Serves the SCDB RPC methods from the node's consensus context and block archive.
pub(crate) struct ScdbRpcServer {
    ctx: Arc<ConsensusContext>,
    archive: Arc<dyn BlockArchiveDatabase>,
    network: Network,
    halving_interval: u64,
}

impl ScdbRpcServer {
    /// Creates a new [`ScdbRpcServer`].
    pub(crate) fn new(
        ctx: Arc<ConsensusContext>,
        archive: Arc<dyn BlockArchiveDatabase>,
        network: Network,
        halving_interval: u64,
    ) -> Self {
        Self {
            ctx,
            archive,
            network,
            halving_interval,
        }
    }

    fn sidechain_ctip(&self, n: i64) -> ScdbResult<RpcSidechainCtip> {
        let scdb = self.ctx.read();
        let n = active_sidechain(&scdb, n, "Invalid sidechain number!")?;
        scdb.ctip(n)
            .map(RpcSidechainCtip::from)
            .ok_or_else(|| ScdbError::not_found("No CTIP found for sidechain!"))
    }

    fn sidechain_deposits(
        &self,
        key: &str,
        txid: Option<String>,
        n: Option<u32>,
        count: Option<i64>,
    ) -> ScdbResult<Vec<RpcSidechainDeposit>> {
        let key_hash =
            nonzero_hash_or(key, || ScdbError::invalid_input("Invalid sidechain key!"))?;
        let known = match (txid, n) {
            (Some(_), None) => {
                return Err(ScdbError::invalid_input(
                    "Output index 'n' is required if TXID is provided!",
                ))
            }
            (Some(txid), Some(n)) => {
                let txid =
                    nonzero_hash_or(&txid, || ScdbError::invalid_input("Invalid TXID!"))?;
                Some((txid, n))
            }
            (None, _) => None,
        };
        let keys = derive_sidechain_keys(&key_hash, self.network)?;

        let scdb = self.ctx.read();
        let deposits: Vec<_> = scdb
            .active_sidechains()
            .find(|sc| sc.priv_key == keys.priv_key)
            .map(|sc| scdb.deposits_for(sc.n_sidechain).collect())
            .unwrap_or_default();
        if deposits.is_empty() {
            return Err(ScdbError::not_found("No deposits in cache for this sidechain!"));
        }

        let mut remaining = count;
        let mut out = Vec::new();
        for d in deposits {
            if known == Some((d.txid(), d.n_burn_index)) {
                debug!(txid = %d.txid(), n = %d.n_burn_index, "rpc: reached known deposit");
                break;
            }
            if !self.ctx.chain().is_on_active_chain(&d.hash_block)? {
                return Err(ScdbError::not_found("Block not in active chain"));
            }
            out.push(RpcSidechainDeposit::from(d));

            if let Some(r) = remaining.as_mut() {
                *r -= 1;
                if *r <= 0 {
                    break;
                }
            }
        }
        Ok(out)
    }

    fn count_deposits(&self, n: i64) -> ScdbResult<usize> {
        let scdb = self.ctx.read();
        let n = active_sidechain(&scdb, n, "Invalid sidechain number")?;
        Ok(scdb.deposits_for(n).count())
    }

    fn receive_wt_prime_hex(&self, n: i64, rawtx: &str) -> ScdbResult<RpcWtxid> {
        let n = active_sidechain(&self.ctx.read(), n, "Invalid sidechain number!")?;
        let tx: Transaction = decode_consensus_hex(rawtx)
            .ok_or_else(|| ScdbError::invalid_input("Invalid transaction hex!"))?;
        if tx.input.is_empty() && tx.output.is_empty() {
            return Err(ScdbError::invalid_input("Invalid WT^ hex"));
        }

        let hash = self.ctx.update(|scdb| scdb.receive_wt_prime(n, tx))?;
        Ok(RpcWtxid {
            wtxid: hash.to_string(),
        })
    }

    fn verify_bmm_commitment(&self, blockhash: &str, bmmhash: &str) -> ScdbResult<RpcVerifyBmm> {
        let hash_block = hash_or(blockhash, || ScdbError::not_found("Block not found"))?;
        let h_star = hash_or(bmmhash, || ScdbError::not_found("h* not found in block"))?;
        let proof = self.ctx.verify_bmm(&hash_block, &h_star)?;
        Ok(RpcVerifyBmm {
            bmm: RpcBmmProof {
                txid: proof.txid.to_string(),
                time: proof.time.to_string(),
            },
        })
    }

    fn verify_cached_deposit(&self, blockhash: &str, txid: &str, ntx: i64) -> ScdbResult<String> {
        let hash_block = hash_or(blockhash, || ScdbError::not_found("Block not found"))?;
        let txid = hash_or(txid, || ScdbError::not_found("SCDB does not know deposit"))?;
        let n_tx = u32::try_from(ntx)
            .map_err(|_| ScdbError::invalid_input("nTx out of range for block"))?;
        let deposit = self.ctx.verify_deposit(&hash_block, &txid, n_tx)?;
        Ok(deposit.txid().to_string())
    }

    fn previous_block_hashes(&self) -> ScdbResult<Vec<RpcBlockHash>> {
        let chain = self.ctx.chain();
        let tip = chain.current_height()?.unwrap_or(0);
        if tip < PREVIOUS_BLOCK_HASHES {
            return Err(ScdbError::not_found(
                "Insufficient blocks connected to complete request!",
            ));
        }

        (tip + 1 - PREVIOUS_BLOCK_HASHES..=tip)
            .map(|height| {
                let hash = chain.block_hash_at_height(height)?.ok_or_else(|| {
                    ScdbError::Internal(format!("no canonical block at {height}"))
                })?;
                Ok(RpcBlockHash {
                    hash: hash.to_string(),
                })
            })
            .collect()
    }

    #[expect(clippy::too_many_arguments, reason = "mirrors the RPC parameters")]
    fn create_proposal(
        &self,
        nsidechain: i64,
        title: String,
        description: String,
        keyhash: &str,
        version: Option<i32>,
        hashid1: Option<String>,
        hashid2: Option<String>,
    ) -> ScdbResult<Sidechain> {
        let n_sidechain = sidechain_number(nsidechain, "Invalid sidechain number!")?;
        let hash_id1 = hashid1
            .map(|s| fixed_hex::<Buf32>(&s, 64, "HashID1 size invalid!"))
            .transpose()?
            .unwrap_or_else(Buf32::zero);
        let hash_id2 = hashid2
            .map(|s| fixed_hex::<Buf20>(&s, 40, "HashID2 size invalid!"))
            .transpose()?
            .unwrap_or_else(Buf20::zero);
        if title.is_empty() {
            return Err(ScdbError::invalid_input("Sidechain must have a title!"));
        }
        if description.is_empty() {
            return Err(ScdbError::invalid_input("Sidechain must have a description!"));
        }
        let key_hash =
            nonzero_hash_or(keyhash, || ScdbError::invalid_input("Invalid sidechain key hash!"))?;
        let keys = derive_sidechain_keys(&key_hash, self.network)?;

        let proposal = Sidechain {
            active: false,
            n_sidechain,
            version: version.unwrap_or(0).max(0),
            key_id: keys.key_id,
            priv_key: keys.priv_key,
            script_pubkey: keys.script_pubkey.into(),
            title,
            description,
            hash_id1,
            hash_id2,
        };
        let hash = proposal.proposal_hash();
        self.ctx.update(|scdb| {
            scdb.cache_proposal(proposal.clone());
            scdb.cache_ack(hash);
        });
        info!(%n_sidechain, %hash, title = %proposal.title, "rpc: cached sidechain proposal");
        Ok(proposal)
    }

    fn set_vote(&self, vote: &str, nsidechain: i64, hashwtprime: &str) -> ScdbResult<()> {
        let vote: WtPrimeVote = vote.parse().map_err(|_| {
            ScdbError::invalid_input("Invalid vote (must be \"upvote\", \"downvote\" or \"abstain\")")
        })?;
        let n_sidechain = active_sidechain(&self.ctx.read(), nsidechain, INVALID_SIDECHAIN)?;
        let hash_wt_prime = wt_prime_hash(hashwtprime)?;

        self.ctx.update(|scdb| {
            scdb.set_custom_vote(SidechainCustomVote {
                vote,
                n_sidechain,
                hash_wt_prime,
            })
        });
        info!(%n_sidechain, %hash_wt_prime, %vote, "rpc: set custom WT^ vote");
        Ok(())
    }

    fn average_fee(
        &self,
        blockcount: Option<i64>,
        startheight: Option<i64>,
    ) -> ScdbResult<RpcAverageFee> {
        let blocks = non_negative(blockcount, "Invalid number of blocks!")?;
        let start = non_negative(startheight, "Invalid start height!")?;
        let fee = fee::average_fee(self.ctx.chain(), blocks, start, self.halving_interval)?;
        Ok(fee.into())
    }

    fn work_score(&self, nsidechain: i64, hashwtprime: &str) -> ScdbResult<u16> {
        let scdb = self.ctx.read();
        let n = active_sidechain(&scdb, nsidechain, INVALID_SIDECHAIN)?;
        let hash = wt_prime_hash(hashwtprime)?;
        if scdb.wt_prime_states(n).is_empty() {
            return Err(ScdbError::not_found(NO_WT_PRIMES));
        }
        scdb.wt_prime_state(n, &hash)
            .map(|s| s.n_work_score)
            .ok_or_else(|| ScdbError::not_found("No WT^ workscore in SCDB"))
    }

    fn wt_prime_status(&self, nsidechain: i64) -> ScdbResult<Vec<RpcWtPrimeStatus>> {
        let scdb = self.ctx.read();
        let n = active_sidechain(&scdb, nsidechain, INVALID_SIDECHAIN)?;
        let states = scdb.wt_prime_states(n);
        if states.is_empty() {
            return Err(ScdbError::not_found(NO_WT_PRIMES));
        }
        Ok(states.iter().map(RpcWtPrimeStatus::from).collect())
    }

    fn cached_wt_primes(&self, nsidechain: i64) -> ScdbResult<Vec<RpcCachedWtPrime>> {
        let scdb = self.ctx.read();
        let n = active_sidechain(&scdb, nsidechain, INVALID_SIDECHAIN)?;
        let cached: Vec<_> = scdb
            .cached_wt_prime_txs(n)
            .map(|tx| RpcCachedWtPrime {
                hashwtprime: Buf32::from(tx.compute_txid()).to_string(),
            })
            .collect();
        if cached.is_empty() {
            return Err(ScdbError::not_found(NO_WT_PRIMES));
        }
        Ok(cached)
    }

    fn have_wt_prime(
        &self,
        hashwtprime: &str,
        nsidechain: i64,
        check: impl FnOnce(&Scdb, &Buf32, u8) -> bool,
    ) -> ScdbResult<bool> {
        let hash = wt_prime_hash(hashwtprime)?;
        let scdb = self.ctx.read();
        let n = active_sidechain(&scdb, nsidechain, INVALID_SIDECHAIN)?;
        Ok(check(&scdb, &hash, n))
    }

    fn scdb_data_for_block(&self, blockhash: &str) -> ScdbResult<Vec<RpcScdbBlockEntry>> {
        let not_found = || ScdbError::not_found("Block hash not found");
        let hash = hash_or(blockhash, not_found)?;
        if self.archive.get_block_height(hash)?.is_none() {
            return Err(not_found());
        }
        let data = self
            .ctx
            .block_data(hash)?
            .ok_or_else(|| ScdbError::not_found("Couldn't find data for block."))?;
        Ok(scdb_block_entries(&data))
    }

    fn validate(&self, address: &str) -> RpcValidateAddress {
        let Some(addr) = address
            .parse::<Address<NetworkUnchecked>>()
            .ok()
            .and_then(|a| a.require_network(self.network).ok())
        else {
            return RpcValidateAddress::invalid();
        };

        let script = addr.script_pubkey();
        RpcValidateAddress {
            isvalid: true,
            address: Some(addr.to_string()),
            script_pubkey: Some(hex::encode(script.as_bytes())),
            details: DestinationKind::from_script(&script).describe(),
        }
    }
}

/// Parses a sidechain number that must name an active sidechain, reporting `msg`
/// otherwise.
fn active_sidechain(scdb: &Scdb, n: i64, msg: &str) -> ScdbResult<u8> {
    let n = sidechain_number(n, msg)?;
    if !scdb.is_active(n) {
        return Err(ScdbError::invalid_input(msg));
    }
    Ok(n)
}

fn decode_consensus_hex<T: Decodable>(s: &str) -> Option<T> {
    let bytes = hex::decode(s).ok()?;
    consensus::deserialize(&bytes).ok()
}

/// Archives a submitted block on top of the canonical tip and brings the SCDB up to
/// it. Returns the height the block was stored at.
fn connect_submitted(
    ctx: &ConsensusContext,
    archive: &dyn BlockArchiveDatabase,
    block: &Block,
) -> ScdbResult<u64> {
    let hash = Buf32::from(block.block_hash());
    if archive.get_block_height(hash)?.is_some() {
        return Err(ScdbError::rejected("duplicate"));
    }

    let parent = Buf32::from(block.header.prev_blockhash);
    let height = match archive.get_canonical_tip()? {
        Some((tip_height, tip)) if tip == parent => tip_height + 1,
        Some(_) => {
            return Err(ScdbError::rejected("inconclusive: block does not extend the tip"))
        }
        None => 0,
    };

    archive.put_block(height, block)?;
    ctx.catch_up()?;
    Ok(height)
}

#[async_trait]
impl ScdbApiServer for ScdbRpcServer {
    async fn list_sidechain_ctip(&self, nsidechain: i64) -> RpcResult<RpcSidechainCtip> {
        self.sidechain_ctip(nsidechain).map_err(scdb_error)
    }

    async fn list_sidechain_deposits(
        &self,
        sidechainkey: String,
        txid: Option<String>,
        n: Option<u32>,
        count: Option<i64>,
    ) -> RpcResult<Vec<RpcSidechainDeposit>> {
        self.sidechain_deposits(&sidechainkey, txid, n, count)
            .map_err(scdb_error)
    }

    async fn count_sidechain_deposits(&self, nsidechain: i64) -> RpcResult<usize> {
        self.count_deposits(nsidechain).map_err(scdb_error)
    }

    async fn receive_wt_prime(&self, nsidechain: i64, rawtx: String) -> RpcResult<RpcWtxid> {
        self.receive_wt_prime_hex(nsidechain, &rawtx)
            .map_err(scdb_error)
    }

    async fn verify_bmm(&self, blockhash: String, bmmhash: String) -> RpcResult<RpcVerifyBmm> {
        self.verify_bmm_commitment(&blockhash, &bmmhash)
            .map_err(scdb_error)
    }

    async fn verify_deposit(
        &self,
        blockhash: String,
        txid: String,
        ntx: i64,
    ) -> RpcResult<String> {
        self.verify_cached_deposit(&blockhash, &txid, ntx)
            .map_err(scdb_error)
    }

    async fn list_previous_block_hashes(&self) -> RpcResult<Vec<RpcBlockHash>> {
        self.previous_block_hashes().map_err(scdb_error)
    }

    async fn list_active_sidechains(&self) -> RpcResult<Vec<RpcSidechain>> {
        Ok(self
            .ctx
            .read()
            .active_sidechains()
            .map(RpcSidechain::from)
            .collect())
    }

    async fn list_sidechain_activation_status(&self) -> RpcResult<Vec<RpcActivationStatus>> {
        Ok(self
            .ctx
            .read()
            .activation_status()
            .iter()
            .map(RpcActivationStatus::from)
            .collect())
    }

    async fn get_sidechain_activation_status(&self) -> RpcResult<Vec<RpcActivationStatus>> {
        Ok(self
            .ctx
            .read()
            .activation_status()
            .iter()
            .map(|s| RpcActivationStatus::from(s).with_proposal_hash(s))
            .collect())
    }

    async fn list_sidechain_proposals(&self) -> RpcResult<Vec<RpcSidechain>> {
        Ok(self
            .ctx
            .read()
            .cached_proposals()
            .iter()
            .map(RpcSidechain::from)
            .collect())
    }

    async fn create_sidechain_proposal(
        &self,
        nsidechain: i64,
        title: String,
        description: String,
        keyhash: String,
        version: Option<i32>,
        hashid1: Option<String>,
        hashid2: Option<String>,
    ) -> RpcResult<RpcSidechainProposal> {
        let proposal = self
            .create_proposal(
                nsidechain,
                title,
                description,
                &keyhash,
                version,
                hashid1,
                hashid2,
            )
            .map_err(scdb_error)?;
        Ok(RpcSidechainProposal::from(&proposal))
    }

    async fn set_wt_prime_vote(
        &self,
        vote: String,
        nsidechain: i64,
        hashwtprime: String,
    ) -> RpcResult<()> {
        self.set_vote(&vote, nsidechain, &hashwtprime)
            .map_err(scdb_error)
    }

    async fn clear_wt_prime_votes(&self) -> RpcResult<()> {
        self.ctx.update(|scdb| scdb.clear_custom_votes());
        info!("rpc: cleared custom WT^ votes");
        Ok(())
    }

    async fn list_wt_prime_votes(&self) -> RpcResult<Vec<RpcWtPrimeVote>> {
        Ok(self
            .ctx
            .read()
            .custom_votes()
            .iter()
            .map(RpcWtPrimeVote::from)
            .collect())
    }

    async fn get_average_fee(
        &self,
        blockcount: Option<i64>,
        startheight: Option<i64>,
    ) -> RpcResult<RpcAverageFee> {
        self.average_fee(blockcount, startheight)
            .map_err(scdb_error)
    }

    async fn get_work_score(&self, nsidechain: i64, hashwtprime: String) -> RpcResult<u16> {
        self.work_score(nsidechain, &hashwtprime)
            .map_err(scdb_error)
    }

    async fn list_wt_prime_status(&self, nsidechain: i64) -> RpcResult<Vec<RpcWtPrimeStatus>> {
        self.wt_prime_status(nsidechain).map_err(scdb_error)
    }

    async fn list_cached_wt_prime_transactions(
        &self,
        nsidechain: i64,
    ) -> RpcResult<Vec<RpcCachedWtPrime>> {
        self.cached_wt_primes(nsidechain).map_err(scdb_error)
    }

    async fn have_spent_wt_prime(&self, hashwtprime: String, nsidechain: i64) -> RpcResult<bool> {
        self.have_wt_prime(&hashwtprime, nsidechain, Scdb::have_spent_wt_prime)
            .map_err(scdb_error)
    }

    async fn have_failed_wt_prime(
        &self,
        hashwtprime: String,
        nsidechain: i64,
    ) -> RpcResult<bool> {
        self.have_wt_prime(&hashwtprime, nsidechain, Scdb::have_failed_wt_prime)
            .map_err(scdb_error)
    }

    async fn list_spent_wt_primes(&self) -> RpcResult<Vec<RpcSpentWtPrime>> {
        let scdb = self.ctx.read();
        let spent = scdb.spent_wt_primes();
        if spent.is_empty() {
            return Err(scdb_error(ScdbError::not_found("No spent WT^(s) in cache!")));
        }
        Ok(spent.iter().map(RpcSpentWtPrime::from).collect())
    }

    async fn list_failed_wt_primes(&self) -> RpcResult<Vec<RpcFailedWtPrime>> {
        let scdb = self.ctx.read();
        let failed = scdb.failed_wt_primes();
        if failed.is_empty() {
            return Err(scdb_error(ScdbError::not_found("No failed WT^(s) in cache!")));
        }
        Ok(failed.iter().map(RpcFailedWtPrime::from).collect())
    }

    async fn get_scdb_hash(&self) -> RpcResult<RpcScdbHash> {
        Ok(RpcScdbHash {
            hashscdb: self.ctx.read().scdb_hash().to_string(),
        })
    }

    async fn get_total_scdb_hash(&self) -> RpcResult<RpcTotalScdbHash> {
        let hash = self.ctx.total_scdb_hash().map_err(scdb_error)?;
        Ok(RpcTotalScdbHash {
            hashscdbtotal: hash.to_string(),
        })
    }

    async fn get_scdb_data_for_block(
        &self,
        blockhash: String,
    ) -> RpcResult<Vec<RpcScdbBlockEntry>> {
        self.scdb_data_for_block(&blockhash).map_err(scdb_error)
    }

    async fn list_failed_bmm(&self) -> RpcResult<Vec<RpcFailedBmm>> {
        Ok(self
            .ctx
            .read()
            .removed_bmm()
            .iter()
            .map(|txid| RpcFailedBmm {
                txid: txid.to_string(),
            })
            .collect())
    }

    async fn validate_address(&self, address: String) -> RpcResult<RpcValidateAddress> {
        Ok(self.validate(&address))
    }

    async fn create_critical_data_tx(
        &self,
        _amount: f64,
        _height: i64,
        _criticalhash: String,
    ) -> RpcResult<()> {
        Err(scdb_error(ScdbError::Unsupported))
    }

    async fn submit_block(&self, hexdata: String) -> RpcResult<()> {
        let block: Block = decode_consensus_hex(&hexdata)
            .ok_or_else(|| scdb_error(ScdbError::invalid_input("Block decode failed")))?;
        let hash = block.block_hash();

        let ctx = self.ctx.clone();
        let archive = self.archive.clone();
        let height = tokio::task::spawn_blocking(move || {
            connect_submitted(ctx.as_ref(), archive.as_ref(), &block)
        })
        .await
        .map_err(|e| scdb_error(ScdbError::Internal(format!("submitblock task failed: {e}"))))?
        .map_err(scdb_error)?;

        info!(%height, %hash, "rpc: accepted submitted block");
        Ok(())
    }
}

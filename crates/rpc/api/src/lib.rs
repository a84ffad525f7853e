//! SCDB RPC API definitions.
//!
//! Method names and argument order follow the base node's existing RPC surface, so
//! methods carry no namespace. Sidechain numbers arrive as plain JSON integers and are
//! range checked by the server.

use drivechain_rpc_types::*;
use jsonrpsee::{core::RpcResult, proc_macros::rpc};

#[rpc(server)]
pub trait ScdbApi {
    /// Critical transaction index pair of a sidechain.
    #[method(name = "listsidechainctip")]
    async fn list_sidechain_ctip(&self, nsidechain: i64) -> RpcResult<RpcSidechainCtip>;

    /// Cached deposits of the sidechain owning `sidechainkey`, newest first. Stops at
    /// the deposit `(txid, n)` if given, or after `count` entries.
    #[method(name = "listsidechaindeposits")]
    async fn list_sidechain_deposits(
        &self,
        sidechainkey: String,
        txid: Option<String>,
        n: Option<u32>,
        count: Option<i64>,
    ) -> RpcResult<Vec<RpcSidechainDeposit>>;

    #[method(name = "countsidechaindeposits")]
    async fn count_sidechain_deposits(&self, nsidechain: i64) -> RpcResult<usize>;

    /// Accepts a WT^ for verification.
    #[method(name = "receivewtprime")]
    async fn receive_wt_prime(&self, nsidechain: i64, rawtx: String) -> RpcResult<RpcWtxid>;

    /// Checks that `bmmhash` was committed in the coinbase of `blockhash`.
    #[method(name = "verifybmm")]
    async fn verify_bmm(&self, blockhash: String, bmmhash: String) -> RpcResult<RpcVerifyBmm>;

    /// Checks that a cached deposit sits at index `ntx` of `blockhash`. Returns its txid.
    #[method(name = "verifydeposit")]
    async fn verify_deposit(
        &self,
        blockhash: String,
        txid: String,
        ntx: i64,
    ) -> RpcResult<String>;

    /// The five most recent block hashes.
    #[method(name = "listpreviousblockhashes")]
    async fn list_previous_block_hashes(&self) -> RpcResult<Vec<RpcBlockHash>>;

    #[method(name = "listactivesidechains")]
    async fn list_active_sidechains(&self) -> RpcResult<Vec<RpcSidechain>>;

    #[method(name = "listsidechainactivationstatus")]
    async fn list_sidechain_activation_status(&self) -> RpcResult<Vec<RpcActivationStatus>>;

    /// Like `listsidechainactivationstatus`, with each proposal hash.
    #[method(name = "getsidechainactivationstatus")]
    async fn get_sidechain_activation_status(&self) -> RpcResult<Vec<RpcActivationStatus>>;

    /// Proposals created on this node.
    #[method(name = "listsidechainproposals")]
    async fn list_sidechain_proposals(&self) -> RpcResult<Vec<RpcSidechain>>;

    /// Creates a proposal for the next block and queues an ACK for it.
    #[method(name = "createsidechainproposal")]
    async fn create_sidechain_proposal(
        &self,
        nsidechain: i64,
        title: String,
        description: String,
        keyhash: String,
        version: Option<i32>,
        hashid1: Option<String>,
        hashid2: Option<String>,
    ) -> RpcResult<RpcSidechainProposal>;

    #[method(name = "setwtprimevote")]
    async fn set_wt_prime_vote(
        &self,
        vote: String,
        nsidechain: i64,
        hashwtprime: String,
    ) -> RpcResult<()>;

    #[method(name = "clearwtprimevotes")]
    async fn clear_wt_prime_votes(&self) -> RpcResult<()>;

    #[method(name = "listwtprimevotes")]
    async fn list_wt_prime_votes(&self) -> RpcResult<Vec<RpcWtPrimeVote>>;

    /// Average fee per transaction over recent blocks, estimated from coinbase values.
    #[method(name = "getaveragefee")]
    async fn get_average_fee(
        &self,
        blockcount: Option<i64>,
        startheight: Option<i64>,
    ) -> RpcResult<RpcAverageFee>;

    #[method(name = "getworkscore")]
    async fn get_work_score(&self, nsidechain: i64, hashwtprime: String) -> RpcResult<u16>;

    #[method(name = "listwtprimestatus")]
    async fn list_wt_prime_status(&self, nsidechain: i64) -> RpcResult<Vec<RpcWtPrimeStatus>>;

    #[method(name = "listcachedwtprimetransactions")]
    async fn list_cached_wt_prime_transactions(
        &self,
        nsidechain: i64,
    ) -> RpcResult<Vec<RpcCachedWtPrime>>;

    #[method(name = "havespentwtprime")]
    async fn have_spent_wt_prime(&self, hashwtprime: String, nsidechain: i64) -> RpcResult<bool>;

    #[method(name = "havefailedwtprime")]
    async fn have_failed_wt_prime(&self, hashwtprime: String, nsidechain: i64)
        -> RpcResult<bool>;

    #[method(name = "listspentwtprimes")]
    async fn list_spent_wt_primes(&self) -> RpcResult<Vec<RpcSpentWtPrime>>;

    #[method(name = "listfailedwtprimes")]
    async fn list_failed_wt_primes(&self) -> RpcResult<Vec<RpcFailedWtPrime>>;

    #[method(name = "getscdbhash")]
    async fn get_scdb_hash(&self) -> RpcResult<RpcScdbHash>;

    /// Hash over every stored block record, in height order.
    #[method(name = "gettotalscdbhash")]
    async fn get_total_scdb_hash(&self) -> RpcResult<RpcTotalScdbHash>;

    #[method(name = "getscdbdataforblock")]
    async fn get_scdb_data_for_block(&self, blockhash: String)
        -> RpcResult<Vec<RpcScdbBlockEntry>>;

    #[method(name = "listfailedbmm")]
    async fn list_failed_bmm(&self) -> RpcResult<Vec<RpcFailedBmm>>;

    #[method(name = "validateaddress")]
    async fn validate_address(&self, address: String) -> RpcResult<RpcValidateAddress>;

    /// Not implemented by this node.
    #[method(name = "createcriticaldatatx")]
    async fn create_critical_data_tx(
        &self,
        amount: f64,
        height: i64,
        criticalhash: String,
    ) -> RpcResult<()>;

    /// Stores a block extending the tip and connects it to the SCDB.
    #[method(name = "submitblock")]
    async fn submit_block(&self, hexdata: String) -> RpcResult<()>;
}

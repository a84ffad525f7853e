use bitcoin::consensus::encode::serialize_hex;
use drivechain_primitives::BitcoinAmount;
use drivechain_scdb_types::{
    DestinationDetails, Sidechain, SidechainActivationStatus, SidechainCtip, SidechainDeposit,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcSidechainCtip {
    pub txid: String,
    pub n: u32,
    /// In sats.
    pub amount: u64,
    pub amountformatted: String,
}

impl From<&SidechainCtip> for RpcSidechainCtip {
    fn from(ctip: &SidechainCtip) -> Self {
        let out = ctip.out.outpoint();
        Self {
            txid: out.txid.to_string(),
            n: out.vout,
            amount: ctip.amount.to_sat(),
            amountformatted: ctip.amount.to_formatted_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcSidechainDeposit {
    pub nsidechain: u8,
    pub strdest: String,
    pub txhex: String,
    pub nburnindex: u32,
    pub ntx: u32,
    pub hashblock: String,
}

impl From<&SidechainDeposit> for RpcSidechainDeposit {
    fn from(d: &SidechainDeposit) -> Self {
        Self {
            nsidechain: d.n_sidechain,
            strdest: d.str_dest.clone(),
            txhex: serialize_hex(d.tx.inner()),
            nburnindex: d.n_burn_index,
            ntx: d.n_tx,
            hashblock: d.hash_block.to_string(),
        }
    }
}

/// Entry of `listactivesidechains` and `listsidechainproposals`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcSidechain {
    pub title: String,
    pub description: String,
    pub privatekey: String,
    pub keyid: String,
    pub nversion: i32,
    pub hashid1: String,
    pub hashid2: String,
}

impl From<&Sidechain> for RpcSidechain {
    fn from(s: &Sidechain) -> Self {
        Self {
            title: s.title.clone(),
            description: s.description.clone(),
            privatekey: s.priv_key.clone(),
            keyid: s.key_id.clone(),
            nversion: s.version,
            hashid1: s.hash_id1.to_string(),
            hashid2: s.hash_id2.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcActivationStatus {
    pub title: String,
    pub description: String,
    pub privatekey: String,
    pub keyid: String,
    pub nage: i32,
    pub nfail: i32,
    /// Only set by `getsidechainactivationstatus`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposalhash: Option<String>,
}

impl RpcActivationStatus {
    pub fn with_proposal_hash(mut self, status: &SidechainActivationStatus) -> Self {
        self.proposalhash = Some(status.proposal.proposal_hash().to_string());
        self
    }
}

impl From<&SidechainActivationStatus> for RpcActivationStatus {
    fn from(s: &SidechainActivationStatus) -> Self {
        Self {
            title: s.proposal.title.clone(),
            description: s.proposal.description.clone(),
            privatekey: s.proposal.priv_key.clone(),
            keyid: s.proposal.key_id.clone(),
            nage: s.n_age,
            nfail: s.n_fail,
            proposalhash: None,
        }
    }
}

/// Reply of `createsidechainproposal`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcSidechainProposal {
    #[serde(rename = "nSidechain")]
    pub n_sidechain: u8,
    pub title: String,
    pub description: String,
    pub privatekey: String,
    pub keyid: String,
    pub version: i32,
    #[serde(rename = "hashID1")]
    pub hash_id1: String,
    #[serde(rename = "hashID2")]
    pub hash_id2: String,
}

impl From<&Sidechain> for RpcSidechainProposal {
    fn from(s: &Sidechain) -> Self {
        Self {
            n_sidechain: s.n_sidechain,
            title: s.title.clone(),
            description: s.description.clone(),
            privatekey: s.priv_key.clone(),
            keyid: s.key_id.clone(),
            version: s.version,
            hash_id1: s.hash_id1.to_string(),
            hash_id2: s.hash_id2.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcBmmProof {
    pub txid: String,
    /// Block time, rendered as a string.
    pub time: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcVerifyBmm {
    pub bmm: RpcBmmProof,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcBlockHash {
    pub hash: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RpcAverageFee {
    /// In whole coins.
    pub feeaverage: f64,
}

impl From<BitcoinAmount> for RpcAverageFee {
    fn from(fee: BitcoinAmount) -> Self {
        Self {
            feeaverage: fee.to_btc(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcValidateAddress {
    pub isvalid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(
        rename = "scriptPubKey",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub script_pubkey: Option<String>,
    #[serde(flatten)]
    pub details: DestinationDetails,
}

impl RpcValidateAddress {
    pub fn invalid() -> Self {
        Self {
            isvalid: false,
            address: None,
            script_pubkey: None,
            details: DestinationDetails::default(),
        }
    }
}

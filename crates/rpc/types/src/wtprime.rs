use drivechain_scdb_types::{
    SidechainCustomVote, SidechainFailedWTPrime, SidechainSpentWTPrime, SidechainWTPrimeState,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcWtxid {
    pub wtxid: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcWtPrimeVote {
    #[serde(rename = "nSidechain")]
    pub n_sidechain: u8,
    pub vote: String,
    #[serde(rename = "hashWTPrime")]
    pub hash_wt_prime: String,
}

impl From<&SidechainCustomVote> for RpcWtPrimeVote {
    fn from(v: &SidechainCustomVote) -> Self {
        Self {
            n_sidechain: v.n_sidechain,
            vote: v.vote.as_str().to_owned(),
            hash_wt_prime: v.hash_wt_prime.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcWtPrimeStatus {
    pub hashwtprime: String,
    pub nblocksleft: u16,
    pub nworkscore: u16,
}

impl From<&SidechainWTPrimeState> for RpcWtPrimeStatus {
    fn from(s: &SidechainWTPrimeState) -> Self {
        Self {
            hashwtprime: s.hash_wt_prime.to_string(),
            nblocksleft: s.n_blocks_left,
            nworkscore: s.n_work_score,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcCachedWtPrime {
    pub hashwtprime: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcSpentWtPrime {
    pub nsidechain: u8,
    pub hashwtprime: String,
    pub hashblock: String,
}

impl From<&SidechainSpentWTPrime> for RpcSpentWtPrime {
    fn from(s: &SidechainSpentWTPrime) -> Self {
        Self {
            nsidechain: s.n_sidechain,
            hashwtprime: s.hash_wt_prime.to_string(),
            hashblock: s.hash_block.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcFailedWtPrime {
    pub nsidechain: u8,
    pub hashwtprime: String,
}

impl From<&SidechainFailedWTPrime> for RpcFailedWtPrime {
    fn from(f: &SidechainFailedWTPrime) -> Self {
        Self {
            nsidechain: f.n_sidechain,
            hashwtprime: f.hash_wt_prime.to_string(),
        }
    }
}

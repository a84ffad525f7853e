use drivechain_scdb_types::SidechainBlockData;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcScdbHash {
    pub hashscdb: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcTotalScdbHash {
    pub hashscdbtotal: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcFailedBmm {
    pub txid: String,
}

/// Element of the `getscdbdataforblock` array: a leading count, then one entry per WT^.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcScdbBlockEntry {
    Count {
        nsidechains: usize,
    },
    WtPrime {
        nsidechain: u8,
        nblocksleft: u16,
        nworkscore: u16,
        hashwtprime: String,
    },
}

/// Flattens stored block data into the `getscdbdataforblock` reply.
pub fn scdb_block_entries(data: &SidechainBlockData) -> Vec<RpcScdbBlockEntry> {
    let mut entries = vec![RpcScdbBlockEntry::Count {
        nsidechains: data.wt_prime_status.len(),
    }];
    entries.extend(data.wt_prime_status.iter().flatten().map(|s| {
        RpcScdbBlockEntry::WtPrime {
            nsidechain: s.n_sidechain,
            nblocksleft: s.n_blocks_left,
            nworkscore: s.n_work_score,
            hashwtprime: s.hash_wt_prime.to_string(),
        }
    }));
    entries
}

#[cfg(test)]
mod tests {
    use drivechain_primitives::Buf32;
    use drivechain_scdb_types::SidechainWTPrimeState;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_block_entries_shape() {
        let mut a = SidechainWTPrimeState::new(0, Buf32::new([1; 32]));
        a.n_work_score = 4;
        let b = SidechainWTPrimeState::new(2, Buf32::new([2; 32]));
        let data = SidechainBlockData::new(vec![vec![a], vec![b]], vec![], vec![], vec![]);

        let v = serde_json::to_value(scdb_block_entries(&data)).unwrap();
        assert_eq!(v[0], json!({ "nsidechains": 2 }));
        assert_eq!(v[1]["nsidechain"], 0);
        assert_eq!(v[1]["nworkscore"], 4);
        assert_eq!(v[2]["nsidechain"], 2);
        assert_eq!(v[2]["nblocksleft"], b.n_blocks_left);
        assert_eq!(v.as_array().unwrap().len(), 3);
    }
}

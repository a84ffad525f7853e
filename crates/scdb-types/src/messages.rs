//! Sidechain messages carried by coinbase `OP_RETURN` outputs.
//!
//! Every message is `OP_RETURN || header(4) || payload`, with the raw bytes following the
//! opcode directly. BMM commitments share the layout, so bytes `5..37` of any script of at
//! least 37 bytes starting with `OP_RETURN` are read as an h* candidate.

use bitcoin::{opcodes::all::OP_RETURN, Script, ScriptBuf};
use drivechain_primitives::Buf32;

use crate::{
    constants::headers,
    entities::{Sidechain, SidechainCustomVote, WtPrimeVote},
    errors::CodecError,
};

const HEADER_LEN: usize = 4;
const PAYLOAD_START: usize = 1 + HEADER_LEN;
const BMM_SCRIPT_MIN_LEN: usize = PAYLOAD_START + 32;
const VOTE_ENTRY_LEN: usize = 1 + 1 + 32;

/// A decoded coinbase message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoinbaseMessage {
    /// A new sidechain proposal.
    Proposal(Sidechain),

    /// ACK of a pending proposal by hash.
    Ack(Buf32),

    /// Announces a WT^ hash for verification.
    WtPrimeAnnounce { n_sidechain: u8, hash_wt_prime: Buf32 },

    /// The votes the miner cast in this block. Entries that failed to decode are counted
    /// in `malformed`.
    Votes {
        votes: Vec<SidechainCustomVote>,
        malformed: usize,
    },
}

impl CoinbaseMessage {
    /// Decodes a coinbase output script.
    pub fn parse(script: &Script) -> Result<Self, CodecError> {
        let bytes = script.as_bytes();
        if bytes.first() != Some(&OP_RETURN.to_u8()) {
            return Err(CodecError::NotOpReturn);
        }
        if bytes.len() < PAYLOAD_START {
            return Err(CodecError::Truncated {
                expected: PAYLOAD_START,
                got: bytes.len(),
            });
        }

        let mut header = [0u8; HEADER_LEN];
        header.copy_from_slice(&bytes[1..PAYLOAD_START]);
        let payload = &bytes[PAYLOAD_START..];

        match header {
            headers::SIDECHAIN_PROPOSAL => Sidechain::decode_proposal(payload).map(Self::Proposal),
            headers::SIDECHAIN_ACK => Ok(Self::Ack(exact_hash(payload)?)),
            headers::WTPRIME_ANNOUNCE => {
                if payload.len() != 33 {
                    return Err(CodecError::Truncated {
                        expected: 33,
                        got: payload.len(),
                    });
                }
                let hash_wt_prime = exact_hash(&payload[..32])?;
                Ok(Self::WtPrimeAnnounce {
                    n_sidechain: payload[32],
                    hash_wt_prime,
                })
            }
            headers::WTPRIME_VOTES => Ok(parse_votes(payload)),
            other => Err(CodecError::UnknownHeader(other)),
        }
    }

    /// Builds the output script carrying this message.
    pub fn to_script(&self) -> ScriptBuf {
        let (header, payload) = match self {
            Self::Proposal(sc) => (headers::SIDECHAIN_PROPOSAL, sc.encode_proposal()),
            Self::Ack(hash) => (headers::SIDECHAIN_ACK, hash.as_slice().to_vec()),
            Self::WtPrimeAnnounce {
                n_sidechain,
                hash_wt_prime,
            } => {
                let mut p = hash_wt_prime.as_slice().to_vec();
                p.push(*n_sidechain);
                (headers::WTPRIME_ANNOUNCE, p)
            }
            Self::Votes { votes, .. } => {
                let mut p = Vec::with_capacity(votes.len() * VOTE_ENTRY_LEN);
                for v in votes {
                    p.push(v.n_sidechain);
                    p.push(v.vote.as_char() as u8);
                    p.extend_from_slice(v.hash_wt_prime.as_slice());
                }
                (headers::WTPRIME_VOTES, p)
            }
        };
        raw_op_return(header, &payload)
    }
}

fn exact_hash(payload: &[u8]) -> Result<Buf32, CodecError> {
    Buf32::try_from(payload).map_err(|p| CodecError::Truncated {
        expected: 32,
        got: p.len(),
    })
}

fn parse_votes(payload: &[u8]) -> CoinbaseMessage {
    let chunks = payload.chunks_exact(VOTE_ENTRY_LEN);
    let mut malformed = usize::from(!chunks.remainder().is_empty());
    let mut votes = Vec::with_capacity(payload.len() / VOTE_ENTRY_LEN);

    for entry in chunks {
        let Ok(vote) = WtPrimeVote::from_char(entry[1] as char) else {
            malformed += 1;
            continue;
        };
        let Ok(hash_wt_prime) = Buf32::try_from(&entry[2..]) else {
            malformed += 1;
            continue;
        };
        votes.push(SidechainCustomVote {
            vote,
            n_sidechain: entry[0],
            hash_wt_prime,
        });
    }

    CoinbaseMessage::Votes { votes, malformed }
}

fn raw_op_return(header: [u8; 4], payload: &[u8]) -> ScriptBuf {
    let mut bytes = Vec::with_capacity(PAYLOAD_START + payload.len());
    bytes.push(OP_RETURN.to_u8());
    bytes.extend_from_slice(&header);
    bytes.extend_from_slice(payload);
    ScriptBuf::from(bytes)
}

/// Reads the h* candidate of a coinbase output, if the script has the BMM shape.
pub fn extract_bmm_hash(script: &Script) -> Option<Buf32> {
    let bytes = script.as_bytes();
    if bytes.len() < BMM_SCRIPT_MIN_LEN || bytes[0] != OP_RETURN.to_u8() {
        return None;
    }
    Buf32::try_from(&bytes[PAYLOAD_START..BMM_SCRIPT_MIN_LEN]).ok()
}

/// Builds a BMM commitment to `h_star`, followed by optional extra bytes.
pub fn bmm_commitment_script(h_star: &Buf32, extra: &[u8]) -> ScriptBuf {
    let mut payload = h_star.as_slice().to_vec();
    payload.extend_from_slice(extra);
    raw_op_return(headers::BMM_COMMIT, &payload)
}

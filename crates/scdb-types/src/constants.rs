//! Consensus parameters of the sidechain database.
//!
//! These are the short testing periods the network currently runs with.

/// Blocks a WT^ has to collect the minimum workscore.
pub const SIDECHAIN_VERIFICATION_PERIOD: u16 = 263;

/// Workscore at which a WT^ may be paid out.
pub const SIDECHAIN_MIN_WORKSCORE: u16 = 131;

/// Blocks without an ACK after which a proposal is discarded.
pub const SIDECHAIN_ACTIVATION_MAX_FAILURES: i32 = 2;

/// Blocks in a sidechain activation period.
pub const SIDECHAIN_ACTIVATION_PERIOD: i32 = 20;

/// Blocks in a sidechain replacement period.
pub const SIDECHAIN_REPLACEMENT_PERIOD: u16 = SIDECHAIN_MIN_WORKSCORE;

/// Number of sidechains which may be active at once.
pub const SIDECHAIN_ACTIVATION_MAX_ACTIVE: usize = 256;

pub const SIDECHAIN_VERSION_CURRENT: i32 = 0;

pub const SIDECHAIN_VERSION_MAX: i32 = 0;

/// Discriminant of a persisted [`SidechainBlockData`](crate::SidechainBlockData) record.
pub const DB_SIDECHAIN_BLOCK_OP: u8 = b'S';

/// Destination pushed by the change-return output of every WT^.
pub const SIDECHAIN_WTPRIME_RETURN_DEST: &str = "D";

/// Coinbase message headers, written right after `OP_RETURN`.
pub mod headers {
    pub const SIDECHAIN_PROPOSAL: [u8; 4] = [0xD5, 0xE0, 0xC4, 0xAF];
    pub const SIDECHAIN_ACK: [u8; 4] = [0xD6, 0xE1, 0xC5, 0xDF];
    pub const WTPRIME_ANNOUNCE: [u8; 4] = [0xD4, 0x5A, 0xA9, 0x43];
    pub const WTPRIME_VOTES: [u8; 4] = [0xD7, 0x7D, 0x17, 0x76];
    pub const BMM_COMMIT: [u8; 4] = [0xD1, 0x61, 0x73, 0x68];
}

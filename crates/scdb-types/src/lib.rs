//! Data model of the sidechain database: records, coinbase messages and the
//! persisted snapshots.

pub mod constants;
pub mod deposit_address;
pub mod destination;
pub mod entities;
pub mod errors;
pub mod messages;
pub mod policy;
pub mod snapshot;

pub use deposit_address::{format_deposit_address, parse_deposit_address};
pub use destination::{DestinationDetails, DestinationKind};
pub use entities::*;
pub use errors::CodecError;
pub use messages::{bmm_commitment_script, extract_bmm_hash, CoinbaseMessage};
pub use policy::DefaultVotePolicy;
pub use snapshot::ScdbStateSnapshot;

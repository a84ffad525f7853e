//! Classification of output destinations for address reporting.

use bitcoin::{Script, WitnessVersion};
use drivechain_primitives::{Buf20, Buf32};
use serde::{Deserialize, Serialize};

/// The kind of destination a script pays to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DestinationKind {
    None,
    KeyHash(Buf20),
    ScriptHash(Buf20),
    WitnessV0KeyHash(Buf20),
    WitnessV0ScriptHash(Buf32),
    WitnessUnknown { version: u8, program: Vec<u8> },
}

/// Per-kind address details, flattened into the `validateaddress` reply.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isscript: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iswitness: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub witness_version: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub witness_program: Option<String>,
}

impl DestinationKind {
    pub fn from_script(script: &Script) -> Self {
        let b = script.as_bytes();
        if script.is_p2pkh() {
            return Buf20::try_from(&b[3..23]).map_or(Self::None, Self::KeyHash);
        }
        if script.is_p2sh() {
            return Buf20::try_from(&b[2..22]).map_or(Self::None, Self::ScriptHash);
        }
        if script.is_p2wpkh() {
            return Buf20::try_from(&b[2..22]).map_or(Self::None, Self::WitnessV0KeyHash);
        }
        if script.is_p2wsh() {
            return Buf32::try_from(&b[2..34]).map_or(Self::None, Self::WitnessV0ScriptHash);
        }
        match script.witness_version() {
            Some(v) if v != WitnessVersion::V0 && script.is_witness_program() => {
                Self::WitnessUnknown {
                    version: v.to_num(),
                    program: b[2..].to_vec(),
                }
            }
            _ => Self::None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn describe(&self) -> DestinationDetails {
        match self {
            Self::None => DestinationDetails::default(),
            Self::KeyHash(_) => describe_legacy(false),
            Self::ScriptHash(_) => describe_legacy(true),
            Self::WitnessV0KeyHash(h) => describe_witness(Some(false), 0, h.as_slice()),
            Self::WitnessV0ScriptHash(h) => describe_witness(Some(true), 0, h.as_slice()),
            Self::WitnessUnknown { version, program } => describe_witness(None, *version, program),
        }
    }
}

fn describe_legacy(isscript: bool) -> DestinationDetails {
    DestinationDetails {
        isscript: Some(isscript),
        iswitness: Some(false),
        ..Default::default()
    }
}

fn describe_witness(isscript: Option<bool>, version: u8, program: &[u8]) -> DestinationDetails {
    DestinationDetails {
        isscript,
        iswitness: Some(true),
        witness_version: Some(version),
        witness_program: Some(hex::encode(program)),
    }
}

//! Sidechain deposit keys derived from the proposal key hash.

use bitcoin::{
    hashes::Hash as _,
    secp256k1::{Secp256k1, SecretKey},
    Network, PrivateKey, ScriptBuf,
};
use drivechain_primitives::Buf32;

use crate::errors::{ScdbError, ScdbResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SidechainKeys {
    /// WIF, uncompressed.
    pub priv_key: String,
    /// Hex hash160 of the public key.
    pub key_id: String,
    /// P2PKH script deposits are paid to.
    pub script_pubkey: ScriptBuf,
}

/// Uses the 32 key hash bytes as the secret key of the sidechain.
pub fn derive_sidechain_keys(key_hash: &Buf32, network: Network) -> ScdbResult<SidechainKeys> {
    if key_hash.is_zero() {
        return Err(ScdbError::invalid_input("Invalid sidechain key hash!"));
    }
    let sk = SecretKey::from_slice(key_hash.as_slice())
        .map_err(|_| ScdbError::invalid_input("Private key outside allowed range"))?;

    let secp = Secp256k1::new();
    let priv_key = PrivateKey::new_uncompressed(sk, network);
    let pubkey_hash = priv_key.public_key(&secp).pubkey_hash();

    Ok(SidechainKeys {
        priv_key: priv_key.to_wif(),
        key_id: hex::encode(pubkey_hash.to_byte_array()),
        script_pubkey: ScriptBuf::new_p2pkh(&pubkey_hash),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_roundtrip_wif() {
        let hash = Buf32::new([7; 32]);
        let keys = derive_sidechain_keys(&hash, Network::Regtest).unwrap();

        let parsed = PrivateKey::from_wif(&keys.priv_key).unwrap();
        assert!(!parsed.compressed);
        assert_eq!(parsed.inner.secret_bytes(), [7; 32]);

        let secp = Secp256k1::new();
        let pkh = parsed.public_key(&secp).pubkey_hash();
        assert_eq!(keys.key_id, hex::encode(pkh.to_byte_array()));
        assert_eq!(keys.key_id.len(), 40);
        assert!(keys.script_pubkey.is_p2pkh());
    }

    #[test]
    fn test_network_changes_wif_only() {
        let hash = Buf32::new([7; 32]);
        let main = derive_sidechain_keys(&hash, Network::Bitcoin).unwrap();
        let reg = derive_sidechain_keys(&hash, Network::Regtest).unwrap();
        assert_ne!(main.priv_key, reg.priv_key);
        assert_eq!(main.key_id, reg.key_id);
    }

    #[test]
    fn test_rejects_bad_hashes() {
        let err = derive_sidechain_keys(&Buf32::zero(), Network::Regtest).unwrap_err();
        assert_eq!(err.to_string(), "Invalid sidechain key hash!");

        let err = derive_sidechain_keys(&Buf32::new([0xff; 32]), Network::Regtest).unwrap_err();
        assert_eq!(err.to_string(), "Private key outside allowed range");
    }
}

//! Critical transaction index pairs: the single output holding each sidechain's funds.

use std::collections::BTreeMap;

use bitcoin::{
    opcodes::all::OP_RETURN,
    script::Instruction,
    Amount, OutPoint, Script, Transaction,
};
use drivechain_primitives::{BitcoinAmount, BitcoinOutPoint};
use drivechain_scdb_types::{
    constants::SIDECHAIN_WTPRIME_RETURN_DEST, Sidechain, SidechainCtip, SidechainDeposit,
};

use crate::errors::{ScdbError, ScdbResult};

/// Live CTIPs by sidechain slot. Holds at most one per sidechain.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CtipLedger {
    ctips: BTreeMap<u8, SidechainCtip>,
}

impl CtipLedger {
    pub fn from_entries(entries: impl IntoIterator<Item = (u8, SidechainCtip)>) -> Self {
        Self {
            ctips: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, n_sidechain: u8) -> Option<&SidechainCtip> {
        self.ctips.get(&n_sidechain)
    }

    /// CTIPs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &SidechainCtip)> + '_ {
        self.ctips.iter().map(|(n, c)| (*n, c))
    }

    pub fn len(&self) -> usize {
        self.ctips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ctips.is_empty()
    }

    /// Applies a deposit and returns the new CTIP.
    ///
    /// The deposit must spend the current CTIP, if any, and strictly increase the amount.
    pub fn apply_deposit(
        &mut self,
        active: bool,
        deposit: &SidechainDeposit,
    ) -> ScdbResult<SidechainCtip> {
        let n = deposit.n_sidechain;
        if !active {
            return Err(ScdbError::invalid_input("Invalid sidechain number!"));
        }

        let tx = deposit.tx.inner();
        let burn = tx
            .output
            .get(deposit.n_burn_index as usize)
            .ok_or_else(|| ScdbError::rejected("Deposit burn output index out of range"))?;
        let amount = BitcoinAmount::from(burn.value);

        if let Some(current) = self.ctips.get(&n) {
            if !spends(tx, current.out.outpoint()) {
                return Err(ScdbError::rejected("Deposit does not spend sidechain CTIP"));
            }
            if amount <= current.amount {
                return Err(ScdbError::rejected("Deposit does not increase CTIP amount"));
            }
        } else if amount == BitcoinAmount::ZERO {
            return Err(ScdbError::rejected("Deposit amount is zero"));
        }

        let ctip = SidechainCtip {
            out: BitcoinOutPoint::new(tx.compute_txid(), deposit.n_burn_index),
            amount,
        };
        self.ctips.insert(n, ctip);
        Ok(ctip)
    }

    /// Applies a paid out WT^ and returns the new CTIP, or `None` when the sidechain
    /// was emptied.
    pub fn apply_withdrawal(
        &mut self,
        n_sidechain: u8,
        wt_prime: &Transaction,
    ) -> ScdbResult<Option<SidechainCtip>> {
        let current = self
            .ctips
            .get(&n_sidechain)
            .ok_or_else(|| ScdbError::rejected("Rejecting WT^: No CTIP found!"))?;
        if !spends(wt_prime, current.out.outpoint()) {
            return Err(ScdbError::rejected("WT^ does not spend sidechain CTIP"));
        }

        let (vout, change) = wt_prime_return(wt_prime)?;
        let change = BitcoinAmount::from(change);
        if change >= current.amount {
            return Err(ScdbError::rejected("WT^ does not decrease CTIP amount"));
        }

        if change == BitcoinAmount::ZERO {
            self.ctips.remove(&n_sidechain);
            return Ok(None);
        }
        let ctip = SidechainCtip {
            out: BitcoinOutPoint::new(wt_prime.compute_txid(), vout),
            amount: change,
        };
        self.ctips.insert(n_sidechain, ctip);
        Ok(Some(ctip))
    }
}

fn spends(tx: &Transaction, out: &OutPoint) -> bool {
    tx.input.iter().any(|i| i.previous_output == *out)
}

fn is_op_return(script: &Script) -> bool {
    script.as_bytes().first() == Some(&OP_RETURN.to_u8())
}

/// The single data push following `OP_RETURN`, if the script has that shape.
fn op_return_data(script: &Script) -> Option<&[u8]> {
    if !is_op_return(script) {
        return None;
    }
    let mut ins = script.instructions();
    ins.next();
    match ins.next() {
        Some(Ok(Instruction::PushBytes(p))) => Some(p.as_bytes()),
        _ => None,
    }
}

/// Finds a WT^'s change return: the first `OP_RETURN` output, which must push exactly
/// the return destination. Returns its index and value.
pub fn wt_prime_return(tx: &Transaction) -> ScdbResult<(u32, Amount)> {
    let (vout, out) = tx
        .output
        .iter()
        .enumerate()
        .find(|(_, o)| is_op_return(&o.script_pubkey))
        .ok_or_else(|| ScdbError::rejected("Rejecting WT^: No OP_RETURN output!"))?;

    let script = &out.script_pubkey;
    if script.len() < 3 {
        return Err(ScdbError::rejected(
            "Rejecting WT^: First OP_RETURN output invalid size (too small)!",
        ));
    }
    let dest = op_return_data(script).ok_or_else(|| {
        ScdbError::rejected("Rejecting WT^: First OP_RETURN output invalid. (Failed GetOp)!")
    })?;
    if dest != SIDECHAIN_WTPRIME_RETURN_DEST.as_bytes() {
        return Err(ScdbError::rejected(
            "Rejecting WT^: First OP_RETURN output invalid. (incorrect dest)!",
        ));
    }

    Ok((vout as u32, out.value))
}

/// A transaction recognised as a sidechain deposit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedDeposit {
    pub n_sidechain: u8,
    pub n_burn_index: u32,
    pub str_dest: String,
}

/// Recognises a deposit: an output paying an active sidechain's script together with an
/// `OP_RETURN` output pushing the UTF-8 sidechain destination.
pub fn decode_deposit(
    tx: &Transaction,
    sidechains: &BTreeMap<u8, Sidechain>,
) -> Option<DecodedDeposit> {
    let (n_burn_index, n_sidechain) = tx.output.iter().enumerate().find_map(|(i, o)| {
        sidechains
            .values()
            .find(|sc| {
                let script = sc.script_pubkey.inner();
                !script.is_empty() && *script == o.script_pubkey
            })
            .map(|sc| (i as u32, sc.n_sidechain))
    })?;

    let str_dest = tx
        .output
        .iter()
        .filter_map(|o| op_return_data(&o.script_pubkey))
        .find(|d| !d.is_empty())
        .and_then(|d| std::str::from_utf8(d).ok())?
        .to_owned();

    Some(DecodedDeposit {
        n_sidechain,
        n_burn_index,
        str_dest,
    })
}

#[cfg(test)]
mod tests {
    use bitcoin::{hashes::Hash as _, ScriptBuf, Txid};
    use drivechain_primitives::Buf32;
    use drivechain_test_utils::btc::{make_tx, op_return_push, outpoint, p2pkh_script, txout};
    use proptest::prelude::*;

    use super::*;

    const SC: u8 = 1;

    fn deposit(prev: &[OutPoint], sats: u64) -> SidechainDeposit {
        let tx = make_tx(
            prev,
            vec![txout(sats, p2pkh_script(SC)), txout(0, op_return_push(b"dest"))],
        );
        SidechainDeposit {
            n_sidechain: SC,
            str_dest: "dest".to_owned(),
            tx: tx.into(),
            n_burn_index: 0,
            n_tx: 1,
            hash_block: Buf32::zero(),
        }
    }

    fn wt_prime(prev: OutPoint, change: u64) -> Transaction {
        make_tx(
            &[prev],
            vec![
                txout(change, op_return_push(b"D")),
                txout(1_000, p2pkh_script(0x55)),
            ],
        )
    }

    fn ctip_outpoint(c: &SidechainCtip) -> OutPoint {
        *c.out.outpoint()
    }

    #[test]
    fn test_first_deposit_creates_ctip() {
        let mut ledger = CtipLedger::default();
        let d = deposit(&[outpoint(9, 0)], 5_000);
        let ctip = ledger.apply_deposit(true, &d).unwrap();
        assert_eq!(ctip.amount, BitcoinAmount::from_sat(5_000));
        assert_eq!(ctip.out.outpoint().txid, d.tx.compute_txid());
        assert_eq!(ledger.get(SC), Some(&ctip));
    }

    #[test]
    fn test_deposit_must_spend_ctip_and_increase() {
        let mut ledger = CtipLedger::default();
        let first = ledger.apply_deposit(true, &deposit(&[outpoint(9, 0)], 5_000)).unwrap();

        let unlinked = deposit(&[outpoint(8, 0)], 9_000);
        assert!(ledger.apply_deposit(true, &unlinked).is_err());

        let smaller = deposit(&[ctip_outpoint(&first)], 5_000);
        assert!(ledger.apply_deposit(true, &smaller).is_err());
        assert_eq!(ledger.get(SC), Some(&first));

        let next = deposit(&[ctip_outpoint(&first), outpoint(7, 1)], 6_000);
        let second = ledger.apply_deposit(true, &next).unwrap();
        assert_eq!(second.amount, BitcoinAmount::from_sat(6_000));
    }

    #[test]
    fn test_deposit_to_inactive_sidechain_rejected() {
        let mut ledger = CtipLedger::default();
        assert!(ledger.apply_deposit(false, &deposit(&[outpoint(9, 0)], 5_000)).is_err());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_withdrawal_updates_or_clears_ctip() {
        let mut ledger = CtipLedger::default();
        let first = ledger.apply_deposit(true, &deposit(&[outpoint(9, 0)], 5_000)).unwrap();

        let wt = wt_prime(ctip_outpoint(&first), 3_000);
        let next = ledger.apply_withdrawal(SC, &wt).unwrap().unwrap();
        assert_eq!(next.amount, BitcoinAmount::from_sat(3_000));
        assert_eq!(*next.out.outpoint(), OutPoint::new(wt.compute_txid(), 0));

        let drain = wt_prime(ctip_outpoint(&next), 0);
        assert_eq!(ledger.apply_withdrawal(SC, &drain).unwrap(), None);
        assert!(ledger.get(SC).is_none());
    }

    #[test]
    fn test_withdrawal_rejections() {
        let mut ledger = CtipLedger::default();
        assert!(ledger.apply_withdrawal(SC, &wt_prime(outpoint(1, 0), 0)).is_err());

        let first = ledger.apply_deposit(true, &deposit(&[outpoint(9, 0)], 5_000)).unwrap();
        let not_spending = wt_prime(outpoint(1, 0), 100);
        assert!(ledger.apply_withdrawal(SC, &not_spending).is_err());

        let not_decreasing = wt_prime(ctip_outpoint(&first), 5_000);
        assert!(ledger.apply_withdrawal(SC, &not_decreasing).is_err());
        assert_eq!(ledger.get(SC), Some(&first));
    }

    #[test]
    fn test_wt_prime_return_errors() {
        let no_op_return = make_tx(&[outpoint(1, 0)], vec![txout(5, p2pkh_script(1))]);
        assert!(wt_prime_return(&no_op_return).is_err());

        let too_small = make_tx(
            &[outpoint(1, 0)],
            vec![txout(5, ScriptBuf::from(vec![0x6a, 0x00]))],
        );
        assert_eq!(
            wt_prime_return(&too_small).unwrap_err().to_string(),
            "Rejecting WT^: First OP_RETURN output invalid size (too small)!"
        );

        // OP_PUSHDATA1 announcing five bytes that are not there.
        let bad_op = make_tx(
            &[outpoint(1, 0)],
            vec![txout(5, ScriptBuf::from(vec![0x6a, 0x4c, 0x05]))],
        );
        assert_eq!(
            wt_prime_return(&bad_op).unwrap_err().to_string(),
            "Rejecting WT^: First OP_RETURN output invalid. (Failed GetOp)!"
        );

        let wrong_dest = make_tx(&[outpoint(1, 0)], vec![txout(5, op_return_push(b"X"))]);
        assert_eq!(
            wt_prime_return(&wrong_dest).unwrap_err().to_string(),
            "Rejecting WT^: First OP_RETURN output invalid. (incorrect dest)!"
        );

        let ok = make_tx(
            &[outpoint(1, 0)],
            vec![txout(5, p2pkh_script(2)), txout(77, op_return_push(b"D"))],
        );
        assert_eq!(wt_prime_return(&ok).unwrap(), (1, Amount::from_sat(77)));
    }

    #[test]
    fn test_decode_deposit() {
        let sc = Sidechain {
            n_sidechain: SC,
            script_pubkey: p2pkh_script(SC).into(),
            active: true,
            ..Default::default()
        };
        let sidechains = BTreeMap::from([(SC, sc)]);

        let d = deposit(&[outpoint(9, 0)], 5_000);
        assert_eq!(
            decode_deposit(d.tx.inner(), &sidechains),
            Some(DecodedDeposit {
                n_sidechain: SC,
                n_burn_index: 0,
                str_dest: "dest".to_owned(),
            })
        );

        let no_dest = make_tx(&[outpoint(9, 0)], vec![txout(5_000, p2pkh_script(SC))]);
        assert_eq!(decode_deposit(&no_dest, &sidechains), None);

        let other = make_tx(
            &[outpoint(9, 0)],
            vec![txout(5_000, p2pkh_script(3)), txout(0, op_return_push(b"dest"))],
        );
        assert_eq!(decode_deposit(&other, &sidechains), None);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Deposit(u64),
        Withdraw(u64),
        StrayDeposit(u64),
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1u64..1_000_000).prop_map(Op::Deposit),
            (0u64..1_000_000).prop_map(Op::Withdraw),
            (1u64..1_000_000).prop_map(Op::StrayDeposit),
        ]
    }

    proptest! {
        #[test]
        fn proptest_ctip_invariant(ops in prop::collection::vec(arb_op(), 1..40)) {
            let mut ledger = CtipLedger::default();
            for (i, op) in ops.into_iter().enumerate() {
                let salt = i as u8;
                let before = ledger.get(SC).copied();
                let spend = before
                    .map(|c| ctip_outpoint(&c))
                    .unwrap_or_else(|| outpoint(salt, 0));
                let base = before.map_or(0, |c| c.amount.to_sat());

                let (res, is_deposit) = match op {
                    Op::Deposit(add) => {
                        let d = deposit(&[spend, outpoint(salt, 1)], base + add);
                        (ledger.apply_deposit(true, &d).map(|_| ()), true)
                    }
                    Op::StrayDeposit(sats) => {
                        let stray = OutPoint::new(Txid::from_byte_array([salt; 32]), 99);
                        (ledger.apply_deposit(true, &deposit(&[stray], sats)).map(|_| ()), true)
                    }
                    Op::Withdraw(change) => {
                        (ledger.apply_withdrawal(SC, &wt_prime(spend, change)).map(|_| ()), false)
                    }
                };

                prop_assert!(ledger.len() <= 1);
                let after = ledger.get(SC).copied();
                if res.is_err() {
                    prop_assert_eq!(before, after);
                    continue;
                }

                let before_amt = before.map(|c| c.amount);
                let after_amt = after.map(|c| c.amount);
                if is_deposit {
                    prop_assert!(after_amt > before_amt);
                    if let Some(b) = before {
                        prop_assert_ne!(b.out, after.unwrap().out);
                    }
                } else {
                    prop_assert!(before.is_some());
                    prop_assert!(after_amt.is_none() || after_amt < before_amt);
                }
            }
        }
    }
}

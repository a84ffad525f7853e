use drivechain_primitives::BitcoinAmount;

use crate::{
    errors::{ScdbError, ScdbResult},
    verify::ChainView,
};

pub const DEFAULT_FEE_BLOCK_COUNT: u64 = 6;

const INITIAL_SUBSIDY: BitcoinAmount = BitcoinAmount::from_int_btc(50);

/// Block subsidy at `height`, halving every `halving_interval` blocks.
pub fn block_subsidy(height: u64, halving_interval: u64) -> BitcoinAmount {
    let halvings = height / halving_interval.max(1);
    if halvings >= 64 {
        return BitcoinAmount::ZERO;
    }
    BitcoinAmount::from_sat(INITIAL_SUBSIDY.to_sat() >> halvings)
}

/// Average fee per transaction over the blocks from `start_height` down to
/// `start_height - block_count`, both included. Fees are the coinbase value above the
/// subsidy.
pub fn average_fee(
    chain: &dyn ChainView,
    block_count: Option<u64>,
    start_height: Option<u64>,
    halving_interval: u64,
) -> ScdbResult<BitcoinAmount> {
    let tip = chain
        .current_height()?
        .ok_or_else(|| ScdbError::invalid_input("Invalid start height!"))?;
    let height = start_height.unwrap_or(tip);
    if height > tip {
        return Err(ScdbError::invalid_input("Invalid start height!"));
    }
    let blocks = block_count.unwrap_or(DEFAULT_FEE_BLOCK_COUNT);
    if blocks > height {
        return Err(ScdbError::invalid_input("Invalid number of blocks!"));
    }

    let mut fees = 0u64;
    let mut n_tx = 0u64;
    for h in (height - blocks..=height).rev() {
        let hash = chain
            .block_hash_at_height(h)?
            .ok_or_else(|| ScdbError::not_found("Block not found"))?;
        let block = chain
            .block_by_hash(&hash)?
            .ok_or_else(|| ScdbError::not_found("Block not found"))?;
        let Some(coinbase) = block.txdata.first() else {
            continue;
        };

        let fee = coinbase
            .output
            .iter()
            .try_fold(0u64, |acc, o| acc.checked_add(o.value.to_sat()))
            .map(|reward| reward.saturating_sub(block_subsidy(h, halving_interval).to_sat()));
        fees = fee
            .and_then(|fee| fees.checked_add(fee))
            .ok_or_else(|| ScdbError::Internal(format!("fee total overflows at height {h}")))?;
        n_tx += block.txdata.len() as u64;
    }

    if n_tx == 0 {
        return Ok(BitcoinAmount::ZERO);
    }
    Ok(BitcoinAmount::from_sat(fees / n_tx))
}

use bitcoin::Block;
use drivechain_db_types::{traits::BlockArchiveDatabase, DbError, DbResult};
use drivechain_primitives::Buf32;
use tracing::debug;

use super::schemas::{
    BlockHeightSchema, BlockSchema, CanonicalBlockSchema, CanonicalTipSchema, TIP_KEY,
};
use crate::define_sled_database;

define_sled_database!(
    pub struct BlockArchiveDBSled {
        block_tree: BlockSchema,
        height_tree: BlockHeightSchema,
        canonical_tree: CanonicalBlockSchema,
        tip_tree: CanonicalTipSchema,
    }
);

impl BlockArchiveDatabase for BlockArchiveDBSled {
    fn put_block(&self, height: u64, block: &Block) -> DbResult<()> {
        let hash = Buf32::from(block.block_hash());
        let parent = Buf32::from(block.header.prev_blockhash);

        self.config.with_retry(
            (
                &self.block_tree,
                &self.height_tree,
                &self.canonical_tree,
                &self.tip_tree,
            ),
            |(bt, ht, ct, tt)| {
                if let Some((tip_height, tip_hash)) = tt.get(&TIP_KEY)? {
                    if height != tip_height + 1 {
                        return tt.abort(DbError::OooInsert("BlockSchema", height));
                    }
                    if parent != tip_hash {
                        return tt.abort(DbError::InvalidNextBlock(height, tip_hash));
                    }
                }
                if ht.get(&hash)?.is_some() {
                    return ht.abort(DbError::EntryAlreadyExists(hash));
                }

                bt.insert(&hash, block)?;
                ht.insert(&hash, &height)?;
                ct.insert(&height, &hash)?;
                tt.insert(&TIP_KEY, &(height, hash))?;
                Ok(())
            },
        )?;

        debug!(%height, %hash, "archived block");
        Ok(())
    }

    fn get_block(&self, hash: Buf32) -> DbResult<Option<Block>> {
        self.block_tree.get(&hash)
    }

    fn get_block_height(&self, hash: Buf32) -> DbResult<Option<u64>> {
        self.height_tree.get(&hash)
    }

    fn get_canonical_hash(&self, height: u64) -> DbResult<Option<Buf32>> {
        self.canonical_tree.get(&height)
    }

    fn get_canonical_tip(&self) -> DbResult<Option<(u64, Buf32)>> {
        self.tip_tree.get(&TIP_KEY)
    }
}

#[cfg(test)]
mod tests {
    use bitcoin::{hashes::Hash as _, BlockHash};
    use drivechain_test_utils::btc::{make_block, make_chain, make_coinbase, INITIAL_SUBSIDY};

    use super::*;
    use crate::sled_db_test_setup;

    sled_db_test_setup!(BlockArchiveDBSled);

    #[test]
    fn test_put_chain() {
        let db = setup_db();
        let blocks = make_chain(BlockHash::all_zeros(), 0, 3);
        for (h, b) in blocks.iter().enumerate() {
            db.put_block(h as u64, b).unwrap();
        }

        let tip_hash = Buf32::from(blocks[2].block_hash());
        assert_eq!(db.get_canonical_tip().unwrap(), Some((2, tip_hash)));
        assert_eq!(db.get_block_height(tip_hash).unwrap(), Some(2));
        assert_eq!(
            db.get_canonical_hash(1).unwrap(),
            Some(Buf32::from(blocks[1].block_hash()))
        );
        assert_eq!(db.get_block(tip_hash).unwrap(), Some(blocks[2].clone()));
        assert_eq!(db.get_block(Buf32::new([0xee; 32])).unwrap(), None);
    }

    #[test]
    fn test_rejects_unlinked_block() {
        let db = setup_db();
        let blocks = make_chain(BlockHash::all_zeros(), 0, 1);
        db.put_block(0, &blocks[0]).unwrap();

        let stray = make_block(
            BlockHash::from_byte_array([9; 32]),
            1,
            vec![make_coinbase(1, INITIAL_SUBSIDY, vec![])],
        );
        let tip = Buf32::from(blocks[0].block_hash());
        assert_eq!(db.put_block(1, &stray), Err(DbError::InvalidNextBlock(1, tip)));
        assert_eq!(db.put_block(3, &stray), Err(DbError::OooInsert("BlockSchema", 3)));
        assert_eq!(db.get_canonical_tip().unwrap(), Some((0, tip)));
    }
}

use drivechain_db_types::{traits::ScdbDatabase, DbError, DbResult};
use drivechain_primitives::Buf32;
use drivechain_scdb_types::{ScdbStateSnapshot, SidechainBlockData};

use super::schemas::{
    BlockDataKey, ScdbBlockDataSchema, ScdbHeightSchema, ScdbStateSchema, ScdbTipSchema,
    SINGLETON_KEY,
};
use crate::define_sled_database;

define_sled_database!(
    pub struct ScdbDBSled {
        block_data_tree: ScdbBlockDataSchema,
        height_tree: ScdbHeightSchema,
        tip_tree: ScdbTipSchema,
        state_tree: ScdbStateSchema,
    }
);

impl ScdbDatabase for ScdbDBSled {
    fn put_block_data(
        &self,
        height: u64,
        hash: Buf32,
        data: &SidechainBlockData,
        state: &ScdbStateSnapshot,
    ) -> DbResult<()> {
        self.config.with_retry(
            (
                &self.block_data_tree,
                &self.height_tree,
                &self.tip_tree,
                &self.state_tree,
            ),
            |(bdt, ht, tt, st)| {
                if let Some((tip, _)) = tt.get(&SINGLETON_KEY)? {
                    if height != tip + 1 {
                        return tt.abort(DbError::OooInsert("ScdbBlockDataSchema", height));
                    }
                }
                let key = BlockDataKey(hash);
                if bdt.get(&key)?.is_some() {
                    return bdt.abort(DbError::EntryAlreadyExists(hash));
                }

                bdt.insert(&key, data)?;
                ht.insert(&height, &hash)?;
                tt.insert(&SINGLETON_KEY, &(height, hash))?;
                st.insert(&SINGLETON_KEY, state)?;
                Ok(())
            },
        )
    }

    fn get_block_data(&self, hash: Buf32) -> DbResult<Option<SidechainBlockData>> {
        self.block_data_tree.get(&BlockDataKey(hash))
    }

    fn get_block_data_at_height(&self, height: u64) -> DbResult<Option<SidechainBlockData>> {
        let Some(hash) = self.height_tree.get(&height)? else {
            return Ok(None);
        };
        self.get_block_data(hash)?
            .ok_or(DbError::MissingBlockData(hash))
            .map(Some)
    }

    fn get_tip(&self) -> DbResult<Option<(u64, Buf32)>> {
        self.tip_tree.get(&SINGLETON_KEY)
    }

    fn get_latest_state(&self) -> DbResult<Option<ScdbStateSnapshot>> {
        self.state_tree.get(&SINGLETON_KEY)
    }

    fn get_raw_history(&self) -> DbResult<Vec<Vec<u8>>> {
        let mut out = Vec::new();
        for entry in self.height_tree.iter() {
            let (_, hash) = entry?;
            let raw = self
                .block_data_tree
                .get_raw(&BlockDataKey(hash))?
                .ok_or(DbError::MissingBlockData(hash))?;
            out.push(raw);
        }
        Ok(out)
    }
}

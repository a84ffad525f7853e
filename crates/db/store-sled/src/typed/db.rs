use std::sync::Arc;

use dashmap::DashMap;
use drivechain_db_types::DbResult;
use sled::{Db, Tree};

use super::{
    codec::{Schema, TreeName},
    tree::SledTree,
};
use crate::utils::sled_err;

/// Opened sled database with a cache of typed trees.
#[derive(Debug)]
pub struct SledDb {
    trees: DashMap<TreeName, Arc<Tree>>,
    db: Arc<Db>,
}

impl SledDb {
    pub fn new(db: Arc<Db>) -> Self {
        Self {
            db,
            trees: DashMap::new(),
        }
    }

    pub fn get_tree<S: Schema>(&self) -> DbResult<SledTree<S>> {
        if let Some(tree) = self.trees.get(&S::TREE_NAME) {
            return Ok(SledTree::new(tree.clone()));
        }

        let tree = Arc::new(
            self.db
                .open_tree(S::TREE_NAME.into_inner())
                .map_err(sled_err)?,
        );
        let tree = self.trees.entry(S::TREE_NAME).or_insert(tree).clone();
        Ok(SledTree::new(tree))
    }
}

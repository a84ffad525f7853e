use drivechain_db_types::{DbError, DbResult};
use sled::{
    transaction::{ConflictableTransactionResult, TransactionError},
    Transactional,
};

use super::{
    codec::Schema,
    tree::{SledTransactionalTree, SledTree},
};

/// Runs a closure over several typed trees atomically.
pub trait SledTransactional {
    type View;

    /// Executes `func` in a sled transaction. `func` may be retried on conflict.
    fn transaction<F, R>(&self, func: F) -> DbResult<R>
    where
        F: Fn(Self::View) -> ConflictableTransactionResult<R, DbError>;
}

fn flatten<R>(res: Result<R, TransactionError<DbError>>) -> DbResult<R> {
    res.map_err(|e| match e {
        TransactionError::Abort(e) => e,
        TransactionError::Storage(e) => DbError::TransactionError(e.to_string()),
    })
}

macro_rules! impl_sled_transactional {
    ($(($idx:tt, $schema:ident, $var:ident)),+) => {
        impl<'a, $($schema: Schema),+> SledTransactional for ($(&'a SledTree<$schema>),+,) {
            type View = ($(SledTransactionalTree<$schema>),+,);

            fn transaction<F, R>(&self, func: F) -> DbResult<R>
            where
                F: Fn(Self::View) -> ConflictableTransactionResult<R, DbError>,
            {
                flatten(($(&*self.$idx.inner),+,).transaction(|($($var),+,)| {
                    func(($(SledTransactionalTree::<$schema>::new($var.clone())),+,))
                }))
            }
        }
    };
}

impl_sled_transactional!((0, S0, t0), (1, S1, t1));
impl_sled_transactional!((0, S0, t0), (1, S1, t1), (2, S2, t2));
impl_sled_transactional!((0, S0, t0), (1, S1, t1), (2, S2, t2), (3, S3, t3));

use std::{
    marker::PhantomData,
    ops::{Bound, RangeBounds},
    sync::Arc,
};

use drivechain_db_types::{DbError, DbResult};
use sled::{
    transaction::{ConflictableTransactionError, ConflictableTransactionResult, TransactionalTree},
    IVec, Iter, Tree,
};

use super::codec::{KeyCodec, Schema, ValueCodec};
use crate::utils::sled_err;

fn decode_pair<S: Schema>((k, v): (IVec, IVec)) -> DbResult<(S::Key, S::Value)> {
    let key = S::Key::decode_key(&k)?;
    let value = S::Value::decode_value(&v)?;
    Ok((key, value))
}

fn key_bound<S: Schema>(k: Bound<&S::Key>) -> DbResult<Bound<Vec<u8>>> {
    Ok(match k {
        Bound::Included(k) => Bound::Included(k.encode_key()?),
        Bound::Excluded(k) => Bound::Excluded(k.encode_key()?),
        Bound::Unbounded => Bound::Unbounded,
    })
}

/// Sled tree bound to a schema.
#[derive(Debug)]
pub struct SledTree<S: Schema> {
    pub(crate) inner: Arc<Tree>,
    _phantom: PhantomData<S>,
}

impl<S: Schema> Clone for SledTree<S> {
    fn clone(&self) -> Self {
        Self::new(self.inner.clone())
    }
}

impl<S: Schema> SledTree<S> {
    pub fn new(inner: Arc<Tree>) -> Self {
        Self {
            inner,
            _phantom: PhantomData,
        }
    }

    pub fn insert(&self, key: &S::Key, value: &S::Value) -> DbResult<()> {
        let key = key.encode_key()?;
        let value = value.encode_value()?;
        self.inner.insert(key, value).map_err(sled_err)?;
        self.inner.flush().map_err(sled_err)?;
        Ok(())
    }

    pub fn get(&self, key: &S::Key) -> DbResult<Option<S::Value>> {
        let Some(raw) = self.get_raw(key)? else {
            return Ok(None);
        };
        Ok(Some(S::Value::decode_value(&raw)?))
    }

    /// Returns the stored bytes without decoding them.
    pub fn get_raw(&self, key: &S::Key) -> DbResult<Option<Vec<u8>>> {
        let key = key.encode_key()?;
        let val = self.inner.get(key).map_err(sled_err)?;
        Ok(val.map(|v| v.to_vec()))
    }

    pub fn contains_key(&self, key: &S::Key) -> DbResult<bool> {
        let key = key.encode_key()?;
        self.inner.contains_key(key).map_err(sled_err)
    }

    pub fn remove(&self, key: &S::Key) -> DbResult<()> {
        let key = key.encode_key()?;
        self.inner.remove(key).map_err(sled_err)?;
        self.inner.flush().map_err(sled_err)?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn first(&self) -> DbResult<Option<(S::Key, S::Value)>> {
        self.inner
            .first()
            .map_err(sled_err)?
            .map(decode_pair::<S>)
            .transpose()
    }

    pub fn last(&self) -> DbResult<Option<(S::Key, S::Value)>> {
        self.inner
            .last()
            .map_err(sled_err)?
            .map(decode_pair::<S>)
            .transpose()
    }

    /// Iterates the tree in key byte order.
    pub fn iter(&self) -> SledTreeIter<S> {
        SledTreeIter {
            inner: self.inner.iter(),
            _phantom: PhantomData,
        }
    }

    pub fn range<R>(&self, range: R) -> DbResult<SledTreeIter<S>>
    where
        R: RangeBounds<S::Key>,
    {
        let start = key_bound::<S>(range.start_bound())?;
        let end = key_bound::<S>(range.end_bound())?;
        Ok(SledTreeIter {
            inner: self.inner.range((start, end)),
            _phantom: PhantomData,
        })
    }
}

/// Schema-bound view of a tree inside a sled transaction.
///
/// Codec failures abort the transaction with the corresponding [`DbError`].
#[expect(
    missing_debug_implementations,
    reason = "sled's TransactionalTree is not Debug"
)]
pub struct SledTransactionalTree<S: Schema> {
    inner: TransactionalTree,
    _phantom: PhantomData<S>,
}

fn abort<T>(e: impl Into<DbError>) -> ConflictableTransactionResult<T, DbError> {
    Err(ConflictableTransactionError::Abort(e.into()))
}

impl<S: Schema> SledTransactionalTree<S> {
    pub fn new(inner: TransactionalTree) -> Self {
        Self {
            inner,
            _phantom: PhantomData,
        }
    }

    pub fn insert(
        &self,
        key: &S::Key,
        value: &S::Value,
    ) -> ConflictableTransactionResult<(), DbError> {
        let key = match key.encode_key() {
            Ok(k) => k,
            Err(e) => return abort(e),
        };
        let value = match value.encode_value() {
            Ok(v) => v,
            Err(e) => return abort(e),
        };
        self.inner.insert(key, value)?;
        Ok(())
    }

    pub fn get(&self, key: &S::Key) -> ConflictableTransactionResult<Option<S::Value>, DbError> {
        let key = match key.encode_key() {
            Ok(k) => k,
            Err(e) => return abort(e),
        };
        let Some(raw) = self.inner.get(key)? else {
            return Ok(None);
        };
        match S::Value::decode_value(&raw) {
            Ok(v) => Ok(Some(v)),
            Err(e) => abort(e),
        }
    }

    pub fn remove(&self, key: &S::Key) -> ConflictableTransactionResult<(), DbError> {
        let key = match key.encode_key() {
            Ok(k) => k,
            Err(e) => return abort(e),
        };
        self.inner.remove(key)?;
        Ok(())
    }

    /// Aborts the enclosing transaction with `err`.
    pub fn abort<T>(&self, err: DbError) -> ConflictableTransactionResult<T, DbError> {
        abort(err)
    }
}

#[expect(
    missing_debug_implementations,
    reason = "sled's Iter is not Debug"
)]
pub struct SledTreeIter<S: Schema> {
    inner: Iter,
    _phantom: PhantomData<S>,
}

impl<S: Schema> Iterator for SledTreeIter<S> {
    type Item = DbResult<(S::Key, S::Value)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|r| r.map_err(sled_err).and_then(decode_pair::<S>))
    }
}

impl<S: Schema> DoubleEndedIterator for SledTreeIter<S> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner
            .next_back()
            .map(|r| r.map_err(sled_err).and_then(decode_pair::<S>))
    }
}

use drivechain_db_types::DbError;

pub(crate) fn sled_err(e: sled::Error) -> DbError {
    DbError::IoError(e.to_string())
}

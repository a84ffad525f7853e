use std::{fs, path::Path, sync::Arc};

use anyhow::Context;

use crate::typed::SledDb;

/// Opens the sled database at `<datadir>/sled/<dbname>`, creating it if needed.
pub fn open_sled_database(datadir: &Path, dbname: &'static str) -> anyhow::Result<Arc<SledDb>> {
    let database_dir = datadir.join("sled").join(dbname);

    if !database_dir.exists() {
        fs::create_dir_all(&database_dir)
            .with_context(|| format!("creating {}", database_dir.display()))?;
    }

    let sled_db = sled::open(&database_dir).context("opening sled database")?;
    Ok(Arc::new(SledDb::new(Arc::new(sled_db))))
}

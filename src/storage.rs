//! On-disk DAG files.
//!
//! A DAG file is `DAG_MAGIC_NUM` as a little-endian `u64` followed by the raw
//! dataset items. Files are named after the algorithm revision and the first
//! eight bytes of the epoch's seed hash, so one directory can hold the DAGs
//! of several epochs.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use ethereum_types::H256;

use crate::cache::to_usize;
use crate::{
    alloc_zeroed, Dataset, Error, Result, DAG_MAGIC_NUM, DAG_MAGIC_NUM_SIZE,
    REVISION,
};

/// `full-R23-<first 8 seed bytes in hex>`.
pub fn dag_file_name(seed: &H256) -> String {
    format!("full-R{}-{}", REVISION, hex::encode(&seed.as_bytes()[..8]))
}

pub fn write_dataset<W: Write>(mut out: W, dataset: &Dataset) -> Result<()> {
    out.write_u64::<LittleEndian>(DAG_MAGIC_NUM)?;
    out.write_all(dataset.as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Reads a DAG of exactly `full_size` bytes. Trailing bytes are an error,
/// as is a file that is too short.
pub fn read_dataset<R: Read>(mut input: R, full_size: u64) -> Result<Dataset> {
    let found = input.read_u64::<LittleEndian>()?;
    if found != DAG_MAGIC_NUM {
        return Err(Error::BadMagic { found });
    }
    let mut bytes = alloc_zeroed(to_usize("dataset", full_size)?)?;
    input.read_exact(&mut bytes)?;
    let mut extra = [0u8; 1];
    if input.read(&mut extra)? != 0 {
        return Err(Error::size("DAG file", full_size, "has trailing bytes"));
    }
    Dataset::from_bytes(bytes)
}

/// Writes `dataset` into `dir` under its canonical name. The file is written
/// to a temporary name first and renamed, so a crash never leaves a
/// truncated DAG behind under the real name. On failure the temporary file
/// is removed.
pub fn save(dir: &Path, seed: &H256, dataset: &Dataset) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(dag_file_name(seed));
    let partial = path.with_extension("partial");
    let written = File::create(&partial)
        .map_err(Error::from)
        .and_then(|file| write_dataset(BufWriter::new(file), dataset))
        .and_then(|()| Ok(fs::rename(&partial, &path)?));
    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(&partial) {
            if cleanup.kind() != io::ErrorKind::NotFound {
                tracing::warn!(
                    path = %partial.display(),
                    error = %cleanup,
                    "could not remove partial DAG"
                );
            }
        }
        return Err(e);
    }
    tracing::info!(path = %path.display(), bytes = dataset.full_size(), "saved DAG");
    Ok(path)
}

/// Loads the DAG for `seed` from `dir`, `None` if there is no such file.
pub fn load(dir: &Path, seed: &H256, full_size: u64) -> Result<Option<Dataset>> {
    let path = dir.join(dag_file_name(seed));
    let file = match File::open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let expected = full_size.saturating_add(DAG_MAGIC_NUM_SIZE as u64);
    let actual = file.metadata()?.len();
    if actual != expected {
        tracing::warn!(path = %path.display(), actual, expected, "ignoring DAG file of wrong size");
        return Ok(None);
    }
    let dataset = read_dataset(BufReader::new(file), full_size)?;
    tracing::info!(path = %path.display(), "loaded DAG");
    Ok(Some(dataset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_dataset, Cache};
    use hex_literal::hex;

    fn dataset() -> Dataset {
        let cache = Cache::with_sizes(1024, 4096, H256::zero()).unwrap();
        build_dataset(&cache, 4096, None).unwrap()
    }

    #[test]
    fn file_name() {
        let seed = H256(hex!(
            "290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563"
        ));
        assert_eq!(dag_file_name(&seed), "full-R23-290decd9548b62a8");
        assert_eq!(dag_file_name(&H256::zero()), "full-R23-0000000000000000");
    }

    #[test]
    fn magic_prefix() {
        let dataset = dataset();
        let mut buf = Vec::new();
        write_dataset(&mut buf, &dataset).unwrap();
        assert_eq!(buf.len(), DAG_MAGIC_NUM_SIZE + 4096);
        assert_eq!(buf[..8], hex!("fecaddbaaddee1fe"));
        assert_eq!(read_dataset(&buf[..], 4096).unwrap(), dataset);
    }

    #[test]
    fn rejects_corrupt_files() {
        let dataset = dataset();
        let mut buf = Vec::new();
        write_dataset(&mut buf, &dataset).unwrap();

        let mut bad_magic = buf.clone();
        bad_magic[0] ^= 1;
        assert!(matches!(
            read_dataset(&bad_magic[..], 4096),
            Err(Error::BadMagic { .. })
        ));
        assert!(matches!(read_dataset(&buf[..100], 4096), Err(Error::Io(_))));

        buf.push(0);
        assert!(read_dataset(&buf[..], 4096).is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let seed = H256::repeat_byte(9);
        assert!(load(dir.path(), &seed, 4096).unwrap().is_none());

        let dataset = dataset();
        let path = save(dir.path(), &seed, &dataset).unwrap();
        assert!(path.ends_with("full-R23-0909090909090909"));
        assert_eq!(load(dir.path(), &seed, 4096).unwrap(), Some(dataset));
        assert!(load(dir.path(), &seed, 8192).unwrap().is_none());
    }

    #[test]
    fn failed_save_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let seed = H256::repeat_byte(9);
        // A non-empty directory under the DAG's name makes the rename fail.
        let blocker = dir.path().join(dag_file_name(&seed));
        fs::create_dir(&blocker).unwrap();
        File::create(blocker.join("keep")).unwrap();

        assert!(matches!(
            save(dir.path(), &seed, &dataset()),
            Err(Error::Io(_))
        ));
        assert!(!blocker.with_extension("partial").exists());
        assert!(blocker.join("keep").exists());
    }
}

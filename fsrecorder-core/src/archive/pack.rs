use crate::archive::manifest::Manifest;
use crate::error::Result;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Write the recording bundle: a gzip-compressed tar holding
/// `recording.json` and one `chunks/chunk_N.bin` entry per captured chunk.
pub fn pack(manifest: &Manifest, chunks: &[(String, PathBuf)], out: &Path) -> Result<()> {
    let json = serde_json::to_vec_pretty(manifest)?;

    let file = File::create(out)?;
    let enc = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(enc);

    let mut header = tar::Header::new_gnu();
    header.set_size(json.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, "recording.json", &json[..])?;

    for (id, path) in chunks {
        builder.append_path_with_name(path, format!("chunks/{id}.bin"))?;
    }

    builder.into_inner()?.finish()?;
    Ok(())
}

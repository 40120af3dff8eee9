use std::io::Write;
use std::path::Path;

use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::directory::{terminate_write, Directory};
use crate::error::DataCorruption;
use crate::index::{SegmentMeta, SegmentMetaJson};

use super::{Codec, FieldPayload, SegmentPayload, StoredDoc};

pub const V1_CODEC_NAME: &str = "1_0";

const TERM_SUFFIX: &str = ".term";
const STORE_SUFFIX: &str = ".store";
const META_SUFFIX: &str = ".meta.json";

/// The initial segment format.
///
/// Three artefacts per segment: `<name>.term` holds the field metas and term
/// dictionaries with their postings, `<name>.store` the stored field
/// payloads, `<name>.meta.json` the descriptor. The binary artefacts are
/// bincode-framed and end with a crc32 footer that is verified on open.
#[derive(Debug, Default)]
pub struct V1Codec;

fn write_framed<T: Serialize>(
    directory: &dyn Directory,
    filename: &str,
    value: &T,
) -> crate::Result<()> {
    let body = bincode::serialize(value)?;
    let checksum = crc32fast::hash(&body);

    let mut wrt = directory.open_write(Path::new(filename))?;
    wrt.write_all(&body)?;
    wrt.write_all(&checksum.to_le_bytes())?;
    terminate_write(wrt)?;
    Ok(())
}

fn read_framed<T: DeserializeOwned>(directory: &dyn Directory, filename: &str) -> crate::Result<T> {
    let data = directory.open_read(Path::new(filename))?;
    if data.len() < 4 {
        return Err(DataCorruption::new(filename.into(), "artefact shorter than its footer".to_string()).into());
    }
    let (body, footer) = data.split_at(data.len() - 4);
    let expected = u32::from_le_bytes(footer.try_into().expect("footer is 4 bytes"));
    let actual = crc32fast::hash(body);
    if expected != actual {
        return Err(DataCorruption::new(
            filename.into(),
            format!("checksum mismatch: footer {expected:#010x}, content {actual:#010x}"),
        )
        .into());
    }
    Ok(bincode::deserialize(body)?)
}

impl Codec for V1Codec {
    fn name(&self) -> &'static str {
        V1_CODEC_NAME
    }

    fn write_segment(
        &self,
        directory: &dyn Directory,
        payload: &SegmentPayload,
        meta: &mut SegmentMeta,
    ) -> crate::Result<()> {
        let term_file = format!("{}{TERM_SUFFIX}", meta.name());
        let store_file = format!("{}{STORE_SUFFIX}", meta.name());

        write_framed(directory, &term_file, &payload.fields)?;
        write_framed(directory, &store_file, &payload.stored)?;

        meta.add_file(term_file);
        meta.add_file(store_file);
        meta.set_docs_count(payload.docs_count());
        debug!(
            "serialized segment {} ({} docs, {} fields)",
            meta.name(),
            payload.docs_count(),
            payload.fields.len()
        );
        Ok(())
    }

    fn read_segment(
        &self,
        directory: &dyn Directory,
        meta: &SegmentMeta,
    ) -> crate::Result<SegmentPayload> {
        let fields: Vec<FieldPayload> =
            read_framed(directory, &format!("{}{TERM_SUFFIX}", meta.name()))?;
        let stored: Vec<StoredDoc> =
            read_framed(directory, &format!("{}{STORE_SUFFIX}", meta.name()))?;
        Ok(SegmentPayload { fields, stored })
    }

    fn write_segment_meta(
        &self,
        directory: &dyn Directory,
        meta: &SegmentMeta,
    ) -> crate::Result<String> {
        let filename = format!("{}{META_SUFFIX}", meta.name());
        let json = serde_json::to_string_pretty(&SegmentMetaJson::from(meta))?;
        directory.atomic_write(Path::new(&filename), json.as_bytes())?;
        Ok(filename)
    }

    fn read_segment_meta(
        &self,
        directory: &dyn Directory,
        filename: &str,
    ) -> crate::Result<SegmentMeta> {
        let data = directory.atomic_read(Path::new(filename))?;
        let json: SegmentMetaJson = serde_json::from_slice(&data).map_err(|err| {
            DataCorruption::new(filename.into(), format!("descriptor cannot be parsed: {err}"))
        })?;
        json.into_meta()
    }
}

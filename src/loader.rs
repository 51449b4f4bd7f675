//! JSON dataset loading.
//!
//! Entities are stored as a JSON array of records:
//!
//! ```json
//! [{"url": "http://dbpedia.org/resource/Berlin",
//!   "attributes": [{"name": "label", "value": "Berlin"}]}]
//! ```
//!
//! Ground truth is a JSON array of `{"source": <url>, "target": <url>}` objects,
//! resolved to positional ids through the loaded collections.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::entity::{DuplicatePair, EntityId, EntityRecord, GroundTruth};
use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
struct UrlPair {
    source: String,
    target: String,
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load an entity collection; ids are positions in the file.
pub fn load_entities(path: impl AsRef<Path>) -> Result<Vec<EntityRecord>> {
    let path = path.as_ref();
    let entities: Vec<EntityRecord> =
        serde_json::from_str(&read(path)?).map_err(|e| Error::data_format(path, e.to_string()))?;
    log::info!("loaded {} entities from {}", entities.len(), path.display());
    Ok(entities)
}

/// Load ground-truth pairs, resolving urls against `source` and `target`.
///
/// Pairs naming an unknown url are skipped (and counted in a warning). A url
/// occurring twice within one collection is a data format error.
pub fn load_ground_truth(
    path: impl AsRef<Path>,
    source: &[EntityRecord],
    target: &[EntityRecord],
) -> Result<GroundTruth> {
    let path = path.as_ref();
    let pairs: Vec<UrlPair> =
        serde_json::from_str(&read(path)?).map_err(|e| Error::data_format(path, e.to_string()))?;

    let source_ids = url_index(source).map_err(|url| {
        Error::data_format(path, format!("duplicate source url {url:?}"))
    })?;
    let target_ids = url_index(target).map_err(|url| {
        Error::data_format(path, format!("duplicate target url {url:?}"))
    })?;

    let mut ground_truth = GroundTruth::with_capacity(pairs.len());
    let mut skipped = 0usize;
    for pair in &pairs {
        match (
            source_ids.get(pair.source.as_str()),
            target_ids.get(pair.target.as_str()),
        ) {
            (Some(&s), Some(&t)) => {
                ground_truth.insert(DuplicatePair::new(s, t));
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        log::warn!(
            "{}: skipped {skipped} of {} pairs with unknown urls",
            path.display(),
            pairs.len()
        );
    }
    log::info!(
        "loaded {} duplicate pairs from {}",
        ground_truth.len(),
        path.display()
    );
    Ok(ground_truth)
}

/// url -> position; `Err(url)` on the first repeated url.
fn url_index(entities: &[EntityRecord]) -> std::result::Result<HashMap<&str, EntityId>, String> {
    let mut ids = HashMap::with_capacity(entities.len());
    for (id, e) in entities.iter().enumerate() {
        if let Some(url) = e.url.as_deref() {
            if ids.insert(url, id).is_some() {
                return Err(url.to_string());
            }
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    const SOURCE: &str = r#"[
        {"url": "s:berlin", "attributes": [{"name": "label", "value": "Berlin"}]},
        {"url": "s:paris", "attributes": [{"name": "label", "value": "Paris, France"}]}
    ]"#;

    const TARGET: &str = r#"[
        {"url": "t:paris", "attributes": [{"name": "name", "value": "Paris"}]},
        {"attributes": []}
    ]"#;

    #[test]
    fn loads_entities() {
        let f = write_tmp(SOURCE);
        let es = load_entities(f.path()).unwrap();
        assert_eq!(es.len(), 2);
        assert_eq!(es[1].url.as_deref(), Some("s:paris"));
        assert!(es[1].tokens().contains("france"));
    }

    #[test]
    fn resolves_ground_truth_and_skips_unknown() {
        let source = load_entities(write_tmp(SOURCE).path()).unwrap();
        let target = load_entities(write_tmp(TARGET).path()).unwrap();
        let gt = write_tmp(
            r#"[{"source": "s:paris", "target": "t:paris"},
                {"source": "s:rome", "target": "t:paris"}]"#,
        );
        let truth = load_ground_truth(gt.path(), &source, &target).unwrap();
        assert_eq!(truth.len(), 1);
        assert!(truth.contains(&DuplicatePair::new(1, 0)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_entities(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn malformed_json_is_data_format_error() {
        let f = write_tmp("{not json");
        assert!(matches!(
            load_entities(f.path()),
            Err(Error::DataFormat { .. })
        ));
    }

    #[test]
    fn duplicate_url_is_rejected() {
        let source = vec![
            EntityRecord::new(Some("x".into())),
            EntityRecord::new(Some("x".into())),
        ];
        let gt = write_tmp("[]");
        let err = load_ground_truth(gt.path(), &source, &[]).unwrap_err();
        assert!(err.to_string().contains("duplicate source url"));
    }
}

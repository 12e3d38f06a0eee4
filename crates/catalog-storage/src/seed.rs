//! Loading catalog documents from an export file.
//!
//! Accepts either a JSON array of objects or JSON lines (one object per line),
//! optionally zstd-compressed when the file name ends in `.zst`.

use catalog_core::Document;
use serde_json::Value as JsonValue;
use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("reading seed: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },
    #[error("entry {0} is not an object")]
    NotAnObject(usize),
}

pub fn read_documents(path: impl AsRef<Path>) -> Result<Vec<Document>, SeedError> {
    let path = path.as_ref();
    let fh = BufReader::new(File::open(path)?);
    let mut text = String::new();
    if path.extension().and_then(|s| s.to_str()) == Some("zst") {
        zstd::Decoder::new(fh)?.read_to_string(&mut text)?;
    } else {
        let mut fh = fh;
        fh.read_to_string(&mut text)?;
    }
    parse_documents(&text)
}

pub fn parse_documents(text: &str) -> Result<Vec<Document>, SeedError> {
    if text.trim_start().starts_with('[') {
        let values: Vec<JsonValue> =
            serde_json::from_str(text).map_err(|source| SeedError::Parse { line: 1, source })?;
        return values
            .into_iter()
            .enumerate()
            .map(|(i, v)| into_object(v, i + 1))
            .collect();
    }
    let mut out = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let v = serde_json::from_str(line).map_err(|source| SeedError::Parse {
            line: i + 1,
            source,
        })?;
        out.push(into_object(v, i + 1)?);
    }
    Ok(out)
}

fn into_object(v: JsonValue, n: usize) -> Result<Document, SeedError> {
    match v {
        JsonValue::Object(m) => Ok(m),
        _ => Err(SeedError::NotAnObject(n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_json_lines_and_skips_blank_lines() {
        let docs = parse_documents("{\"name\":\"a\"}\n\n{\"name\":\"b\"}\n").unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1]["name"], "b");
    }

    #[test]
    fn reads_json_arrays() {
        let docs = parse_documents("  [{\"name\":\"a\"},{\"name\":\"b\"}]").unwrap();
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn reports_the_offending_line() {
        match parse_documents("{\"name\":\"a\"}\n{oops\n") {
            Err(SeedError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            parse_documents("[1]"),
            Err(SeedError::NotAnObject(1))
        ));
    }

    #[test]
    fn reads_compressed_files() {
        let dir = std::env::temp_dir().join(format!("catalog-seed-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("items.jsonl.zst");
        let raw = b"{\"name\":\"a\",\"regularPrice\":\"1\"}\n";
        std::fs::write(&path, zstd::encode_all(&raw[..], 3).unwrap()).unwrap();
        let docs = read_documents(&path).unwrap();
        assert_eq!(docs[0]["regularPrice"], "1");
        std::fs::remove_dir_all(&dir).ok();
    }
}

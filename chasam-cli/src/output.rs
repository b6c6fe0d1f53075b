//! Match row output: one CSV row per [`chasam_core::MatchAnnotation`],
//! streamed as matches arrive so memory stays bounded under back-pressure.
//! Header: `source-name,target-name,target-path,hash-kind,hamming`.

use std::io::Write;

use serde::Serialize;

#[derive(Serialize)]
struct MatchRow<'a> {
    #[serde(rename = "source-name")]
    source_name: &'a str,
    #[serde(rename = "target-name")]
    target_name: &'a str,
    #[serde(rename = "target-path")]
    target_path: String,
    #[serde(rename = "hash-kind")]
    hash_kind: &'static str,
    hamming: u32,
}

pub struct MatchWriter<W: Write> {
    csv: csv::Writer<W>,
}

impl<W: Write> MatchWriter<W> {
    pub fn new(writer: W) -> csv::Result<Self> {
        Ok(MatchWriter {
            csv: csv::Writer::from_writer(writer),
        })
    }

    pub fn write_match(
        &mut self,
        source_name: &str,
        target_name: &str,
        target_path: &std::path::Path,
        hash_kind: chasam_core::HashKind,
        hamming: u32,
    ) -> csv::Result<()> {
        self.csv.serialize(MatchRow {
            source_name,
            target_name,
            target_path: target_path.display().to_string(),
            hash_kind: hash_kind.canonical_name(),
            hamming,
        })?;
        self.csv.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::Path;

    #[test]
    fn writes_header_and_row() {
        let mut buf = Vec::new();
        {
            let mut writer = MatchWriter::new(&mut buf).unwrap();
            writer
                .write_match(
                    "ref.png",
                    "candidate.png",
                    Path::new("/tmp/candidate.png"),
                    chasam_core::HashKind::PHash,
                    3,
                )
                .unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "source-name,target-name,target-path,hash-kind,hamming"
        );
        assert_eq!(
            lines.next().unwrap(),
            "ref.png,candidate.png,/tmp/candidate.png,PHash,3"
        );
    }
}

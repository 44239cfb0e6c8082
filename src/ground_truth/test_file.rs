//! Test files of labeled pairs
//!
//! One labeled pair per line: `+,id1,id2` for a match, `-,id1,id2` for a
//! non-match and `?,id1,id2` for an undecided pair. Lines starting with `#`
//! and blank lines are ignored.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::GroundTruthError;
use crate::ground_truth::link::{Decision, Link, Provenance, RecordPair};
use crate::ground_truth::store::GroundTruthStore;

/// Parse labeled pairs from a reader
pub fn read_test_file<R: Read>(reader: R) -> Result<Vec<Link>, GroundTruthError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut links = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        if record.len() != 3 {
            return Err(GroundTruthError::Malformed {
                line,
                reason: format!("expected 3 fields, found {}", record.len()),
            });
        }

        let decision = Decision::from_symbol(&record[0]).ok_or_else(|| GroundTruthError::Malformed {
            line,
            reason: format!("unknown label '{}'", &record[0]),
        })?;
        if record[1].is_empty() || record[2].is_empty() {
            return Err(GroundTruthError::Malformed {
                line,
                reason: "empty record id".to_string(),
            });
        }

        links.push(Link::new(
            RecordPair::new(&record[1], &record[2]),
            decision,
            Provenance::AssertedFromFile,
        ));
    }
    Ok(links)
}

/// Load a test file into the store
///
/// Returns the number of facts loaded.
pub fn load_test_file(
    path: impl AsRef<Path>,
    store: &mut GroundTruthStore,
) -> Result<usize, GroundTruthError> {
    let file = File::open(path.as_ref())?;
    let links = read_test_file(BufReader::new(file))?;
    let count = links.len();
    for link in links {
        store.assert_link(link)?;
    }
    tracing::info!(
        path = %path.as_ref().display(),
        facts = count,
        matches = store.count_matches(),
        implied_matches = store.expected_matches(),
        "loaded ground truth"
    );
    Ok(count)
}

/// Write the store's directly asserted facts in test-file format
pub fn write_test_file<W: Write>(
    store: &GroundTruthStore,
    writer: W,
) -> Result<(), GroundTruthError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    for link in store.links() {
        csv_writer.write_record([
            link.decision.symbol(),
            link.pair.id1(),
            link.pair.id2(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Save the store's directly asserted facts to a file
pub fn save_test_file(
    store: &GroundTruthStore,
    path: impl AsRef<Path>,
) -> Result<(), GroundTruthError> {
    let file = File::create(path.as_ref())?;
    write_test_file(store, BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_test_file() {
        let data = "# labeled by hand\n+,r1,r2\n-, r3 ,r1\n\n?,r4,r2\n";
        let links = read_test_file(data.as_bytes()).unwrap();

        assert_eq!(links.len(), 3);
        assert_eq!(links[0].decision, Decision::Match);
        assert_eq!(links[1].pair, RecordPair::new("r1", "r3"));
        assert_eq!(links[1].decision, Decision::NonMatch);
        assert_eq!(links[2].decision, Decision::Uncertain);
        assert!(links
            .iter()
            .all(|l| l.provenance == Provenance::AssertedFromFile));
    }

    #[test]
    fn test_read_rejects_unknown_label() {
        let err = read_test_file("+,a,b\nx,c,d\n".as_bytes()).unwrap_err();
        match err {
            GroundTruthError::Malformed { line, reason } => {
                assert_eq!(line, 2);
                assert!(reason.contains("'x'"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_rejects_short_line() {
        let err = read_test_file("+,a\n".as_bytes()).unwrap_err();
        assert!(matches!(err, GroundTruthError::Malformed { line: 1, .. }));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let mut store = GroundTruthStore::new();
        let err = load_test_file("/nonexistent/linkage-evo/test.csv", &mut store).unwrap_err();
        assert!(matches!(err, GroundTruthError::Io(_)));
    }

    #[test]
    fn test_write_then_load() {
        let mut store = GroundTruthStore::new();
        store
            .assert_decision("b", "a", Decision::Match, Provenance::AssertedByOracle)
            .unwrap();
        store
            .assert_decision("c", "d", Decision::Uncertain, Provenance::AssertedByOracle)
            .unwrap();

        let mut buffer = Vec::new();
        write_test_file(&store, &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "+,a,b\n?,c,d\n");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answers.csv");
        save_test_file(&store, &path).unwrap();

        let mut reloaded = GroundTruthStore::new();
        assert_eq!(load_test_file(&path, &mut reloaded).unwrap(), 2);
        assert_eq!(
            reloaded.infer_link("a", "b").unwrap().decision,
            Decision::Match
        );
    }
}

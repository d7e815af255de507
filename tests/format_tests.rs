//! End-to-end tests over song file fixtures
//!
//! Parse real-looking files, migrate them across the lineage and write them
//! back out.

use ultrastar_format::codec::{self, LineEnding, ParseWarning, WriteOptions};
use ultrastar_format::detect::DetectionMethod;
use ultrastar_format::{
    detect_from_keys, diff, Boundary, CheckStatus, FormatError, FormatVersion, MigrationStatus,
    VersionRegistry,
};

fn v(s: &str) -> FormatVersion {
    FormatVersion::parse(s).unwrap()
}

fn keys(doc: &ultrastar_format::Document) -> Vec<&str> {
    doc.attributes().keys().map(String::as_str).collect()
}

// =============================================================================
// Parsing
// =============================================================================

#[test]
fn test_parse_fixture_with_bom() {
    let doc = codec::parse(include_bytes!("fixtures/dancing_queen.txt")).unwrap();

    assert_eq!(doc.get("TITLE"), Some("Dancing Queen"));
    assert_eq!(doc.common_name(), "ABBA - Dancing Queen");
    assert_eq!(doc.version(), v("1.0.0"));
    assert_eq!(doc.primary_audio_reference(), Some("ABBA - Dancing Queen.mp3"));
    assert_eq!(doc.body().len(), 7);
    assert_eq!(doc.body()[1], ": 6 2 59  can");
    assert!(doc.check().is_ok());
}

#[test]
fn test_malformed_fixture_degrades_gracefully() {
    let parsed = codec::parse_with_report(include_str!("fixtures/malformed.txt"));
    let doc = &parsed.document;

    assert_eq!(doc.get("TITLE"), Some("Broken"));
    assert_eq!(keys(doc), ["TITLE", "ARTIST", "BPM", "CALCMEDLEY"]);
    assert_eq!(doc.body(), [": 0 1 1 a", "", ": 2 1 1 b"]);
    assert_eq!(parsed.detection.method, DetectionMethod::Fallback);
    assert_eq!(doc.version(), v("1.0.0"));
    assert_eq!(
        parsed.warnings,
        [
            ParseWarning::DuplicateKey { key: "TITLE".to_string(), line: 2 },
            ParseWarning::MissingSeparator { key: "CALCMEDLEY".to_string(), line: 5 },
        ]
    );

    let report = doc.check();
    assert_eq!(report.status(), CheckStatus::Missing);
    assert_eq!(report.missing_required, ["MP3"]);
    assert_eq!(report.empty_values, ["BPM", "CALCMEDLEY"]);
}

#[test]
fn test_round_trip_preserves_document() {
    for text in [
        include_str!("fixtures/dancing_queen.txt"),
        include_str!("fixtures/whats_up.txt"),
        include_str!("fixtures/medley_v120.txt"),
    ] {
        let doc = codec::parse_str(text);
        let reparsed = codec::parse(&codec::to_bytes(&doc, &WriteOptions::default())).unwrap();
        assert_eq!(reparsed, doc);

        let crlf = WriteOptions {
            line_ending: LineEnding::CrLf,
            end_marker: true,
        };
        assert_eq!(codec::parse_str(&codec::serialize_with(&doc, &crlf)), doc);
    }
}

#[test]
fn test_serialize_keeps_header_order() {
    let doc = codec::parse_str(include_str!("fixtures/medley_v120.txt"));
    let text = codec::serialize(&doc);
    let header: Vec<_> = text.lines().take(3).collect();
    assert_eq!(header, ["#VERSION:1.2.0", "#TITLE:Medley Song", "#ARTIST:Someone"]);
    assert!(!text.contains('\r'));
    assert!(!text.ends_with("E\n"));
}

#[test]
fn test_edited_document_survives_serialization() {
    let mut doc = codec::parse_str(
        "#VERSION:0.1.0\n#TITLE:X\n#ARTIST:Y\n#MP3:a.mp3\n#BPM:100\n: 0 1 1 a\n",
    );
    let original = doc.clone();

    for (key, value) in [("COMMENT", "first\nsecond"), ("A:B", "v")] {
        let err = doc.set(key, value).unwrap_err();
        assert!(matches!(err, FormatError::InvalidAttribute { .. }), "{key:?}");
    }
    assert_eq!(doc, original);

    doc.set("COMMENT", "first second").unwrap();
    doc.set("GENRE", " Pop ").unwrap();
    doc.set("title", "New: Title").unwrap();
    doc.set_empty("EDITION").unwrap();
    doc.move_attribute(5, 2).unwrap();

    assert_eq!(keys(&doc)[..3], ["VERSION", "TITLE", "COMMENT"]);
    for options in [
        WriteOptions::default(),
        WriteOptions {
            line_ending: LineEnding::CrLf,
            end_marker: true,
        },
    ] {
        let back = codec::parse(&codec::to_bytes(&doc, &options)).unwrap();
        assert_eq!(back, doc);
    }
}

// =============================================================================
// Detection
// =============================================================================

#[test]
fn test_detection_properties() {
    assert_eq!(detect_from_keys(["TITLE", "ARTIST", "MP3", "BPM"]), v("0.1.0"));
    assert_eq!(codec::parse_str("#VERSION:v1.1.0\n").version(), v("1.1.0"));
    assert_eq!(codec::parse_str("").version(), v("1.0.0"));
}

// =============================================================================
// Migration
// =============================================================================

#[test]
fn test_whats_up_audio_migration() {
    let doc = codec::parse_str(include_str!("fixtures/whats_up.txt"));

    let up = doc.migrate_to(v("2.0.0")).unwrap();
    assert_eq!(up.status, MigrationStatus::Reached);
    assert!(up.document.contains("AUDIO"));
    assert!(!up.document.contains("MP3"));
    assert_eq!(up.document.body(), doc.body());

    let down = up.document.migrate_to(v("0.1.0")).unwrap();
    assert!(down.document.contains("MP3"));
    assert!(!down.document.contains("AUDIO"));
    assert_eq!(down.document.get("VERSION"), Some("0.1.0"));
}

#[test]
fn test_primary_audio_prefers_mp3_while_both_exist() {
    let doc = codec::parse_str(
        "#VERSION:1.1.0\n#TITLE:T\n#ARTIST:A\n#AUDIO:song.ogg\n#MP3:song.mp3\n#BPM:120\n",
    );
    assert_eq!(doc.primary_audio_reference(), Some("song.mp3"));

    let medley = codec::parse_str(include_str!("fixtures/medley_v120.txt"));
    assert_eq!(medley.primary_audio_reference(), Some("old.mp3"));

    // The upgrade to 2.0.0 keeps AUDIO and drops MP3
    let up = ultrastar_format::upgrade(&medley).unwrap();
    assert_eq!(up.primary_audio_reference(), Some("song.ogg"));
}

#[test]
fn test_every_hop_lands_on_the_neighbor() {
    let registry = VersionRegistry::global();
    let mut doc = codec::parse_str(include_str!("fixtures/whats_up.txt"));
    doc = doc.migrate_to(v("0.1.0")).unwrap().document;

    while let Ok(next) = ultrastar_format::upgrade(&doc) {
        assert_eq!(next.version(), registry.neighbor_above(doc.version()).unwrap());
        assert_eq!(next.get("VERSION"), Some(next.version().to_string().as_str()));
        doc = next;
    }
    assert_eq!(Some(doc.version()), registry.latest());
}

#[test]
fn test_medley_round_trip_is_lossy() {
    let original = codec::parse_str(include_str!("fixtures/medley_v120.txt"));

    let up = ultrastar_format::upgrade(&original).unwrap();
    assert_eq!(up.get("MEDLEYSTART"), Some("6000"));
    assert_eq!(up.get("MEDLEYEND"), Some("21000"));
    assert_eq!(up.get("AUDIO"), Some("song.ogg"));
    assert!(!up.contains("MP3"));

    let back = ultrastar_format::downgrade(&up).unwrap();
    assert_eq!(back.version(), original.version());
    assert_eq!(back.get("MEDLEYSTARTBEAT"), Some("100"));
    assert_eq!(back.get("MEDLEYENDBEAT"), Some("400"));
    // MP3 was dropped on the way up and does not come back
    assert!(!back.contains("MP3"));
    assert_ne!(back, original);

    let changes = diff::diff(&original, &back);
    assert_eq!(changes.removed().collect::<Vec<_>>(), ["#MP3:old.mp3"]);
    assert_eq!(changes.added().count(), 0);
}

#[test]
fn test_migration_past_the_top_reports_boundary() {
    let doc = codec::parse_str(include_str!("fixtures/dancing_queen.txt"));
    let migration = doc.migrate_to(v("9.0.0")).unwrap();

    assert_eq!(migration.status, MigrationStatus::Stopped { boundary: Boundary::Top });
    assert_eq!(migration.document.version(), v("2.0.0"));
    assert_eq!(migration.hops.len(), 3);

    let err = ultrastar_format::upgrade(&migration.document).unwrap_err();
    assert!(matches!(err, FormatError::VersionChange { boundary: Boundary::Top, .. }));
}

#[test]
fn test_migrated_document_survives_serialization() {
    let doc = codec::parse_str(include_str!("fixtures/dancing_queen.txt"));
    let migrated = doc.migrate_to(v("2.0.0")).unwrap().document;

    let mut reordered = migrated.clone();
    reordered.reorder_canonical();
    assert_eq!(keys(&reordered)[..4], ["VERSION", "TITLE", "ARTIST", "AUDIO"]);

    let reparsed = codec::parse_str(&codec::serialize(&reordered));
    assert_eq!(reparsed, reordered);
    assert_eq!(reparsed.primary_audio_reference(), Some("ABBA - Dancing Queen.mp3"));
}

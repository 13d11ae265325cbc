// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Conversion of [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML) extracts
//! into routable [Nodes](crate::Node) and [Edges](crate::Edge).

mod profile;
mod reader;

pub use profile::{Profile, RoadClass, CAR_PROFILE};
pub use reader::{
    build_edges, ingest_from_buffer, ingest_from_file, ingest_from_io, read_extract_from_buffer,
    read_extract_from_file, read_extract_from_io, Error, Extract, FileFormat, Ingest, IngestStats,
    Options, Way,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Edge;

    macro_rules! assert_almost_eq {
        ($a:expr, $b:expr) => {
            assert!(
                (($a - $b).abs() < 1e-9),
                "assertion failed: {} ≈ {}",
                $a,
                $b
            )
        };
    }

    const SIMPLE_XML: &[u8] = include_bytes!("reader/test_fixtures/simple.osm");
    const SIMPLE_XML_GZ: &[u8] = include_bytes!("reader/test_fixtures/simple.osm.gz");
    const SIMPLE_XML_BZ2: &[u8] = include_bytes!("reader/test_fixtures/simple.osm.bz2");

    fn options(file_format: FileFormat) -> Options<'static> {
        Options {
            profile: &CAR_PROFILE,
            file_format,
            bbox: [0.0; 4],
        }
    }

    fn get_edge(ingest: &Ingest, from: i64, to: i64) -> Option<&Edge> {
        ingest.edges.iter().find(|e| e.from == from && e.to == to)
    }

    fn check_simple_ingest(ingest: &Ingest) {
        //                9
        //                ┊ (private)
        //          7 ┈┈┈ 8
        //          │  (footway)
        //     3 ── 5·6            10 ── 11
        //     │ ↖
        //     │   ↖
        // 1 ─ 2     4
        //  ↘_______↗  (one-way motorway 1 → 4 → 3)

        // Residential 1-2-3, mirrored
        assert!(get_edge(ingest, 1, 2).is_some());
        assert!(get_edge(ingest, 2, 1).is_some());
        assert!(get_edge(ingest, 2, 3).is_some());
        assert!(get_edge(ingest, 3, 2).is_some());

        // Motorway 1-4-3 is one-way
        assert!(get_edge(ingest, 1, 4).is_some());
        assert!(get_edge(ingest, 4, 3).is_some());
        assert!(get_edge(ingest, 4, 1).is_none());
        assert!(get_edge(ingest, 3, 4).is_none());

        // Tertiary 3-5-6-7 with oneway=true is bidirectional, 5-6 is too short
        assert!(get_edge(ingest, 3, 5).is_some());
        assert!(get_edge(ingest, 5, 3).is_some());
        assert!(get_edge(ingest, 5, 6).is_none());
        assert!(get_edge(ingest, 6, 5).is_none());
        assert!(get_edge(ingest, 6, 7).is_some());
        assert!(get_edge(ingest, 7, 6).is_some());

        // Footway, private service and a way to a missing node are skipped
        assert!(get_edge(ingest, 7, 8).is_none());
        assert!(get_edge(ingest, 8, 9).is_none());
        assert!(ingest.edges.iter().all(|e| e.to != 404 && e.from != 404));

        // access=destination does not close the road
        assert!(get_edge(ingest, 10, 11).is_some());
        assert!(get_edge(ingest, 11, 10).is_some());

        assert_eq!(ingest.edges.len(), 12);

        // Costs
        let e = get_edge(ingest, 1, 2).unwrap();
        assert_almost_eq!(e.distance, 1.001);
        assert_almost_eq!(e.cost, 1.001 / 30.0);
        assert_eq!(e.way_id, 100);
        assert_eq!(e.road_class, "residential");

        let e = get_edge(ingest, 1, 4).unwrap();
        assert_almost_eq!(e.distance, 1.653);
        assert_almost_eq!(e.cost, 1.653 / 80.0);

        for e in &ingest.edges {
            assert!(e.distance >= 0.001);
            assert_almost_eq!(e.cost, e.distance / CAR_PROFILE.speed(&e.road_class));
        }

        // Only nodes with edges are kept
        let used: Vec<i64> = ingest.nodes.iter().map(|n| n.id).collect();
        assert_eq!(used, vec![1, 2, 3, 4, 5, 6, 7, 10, 11]);

        let way_ids: Vec<i64> = ingest.ways.iter().map(|w| w.id).collect();
        assert_eq!(way_ids, vec![100, 101, 102, 106]);

        assert_eq!(
            ingest.stats,
            IngestStats {
                total_ways: 8,
                accepted_ways: 4,
                skipped_class: 2,
                skipped_access: 1,
                skipped_too_short: 1,
                skipped_no_segments: 0,
                dropped_segments: 1,
                unresolved_segments: 0,
            }
        );
    }

    #[test]
    fn test_ingest_xml() {
        let ingest = ingest_from_buffer(&options(FileFormat::Xml), SIMPLE_XML).unwrap();
        check_simple_ingest(&ingest);
    }

    #[test]
    fn test_ingest_xml_io() {
        let ingest = ingest_from_io(&options(FileFormat::Xml), SIMPLE_XML).unwrap();
        check_simple_ingest(&ingest);
    }

    #[test]
    fn test_ingest_gz() {
        let ingest = ingest_from_buffer(&options(FileFormat::XmlGz), SIMPLE_XML_GZ).unwrap();
        check_simple_ingest(&ingest);
    }

    #[test]
    fn test_ingest_bz2() {
        let ingest = ingest_from_buffer(&options(FileFormat::XmlBz2), SIMPLE_XML_BZ2).unwrap();
        check_simple_ingest(&ingest);
    }

    #[test]
    fn test_ingest_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("simple.osm.bz2");
        std::fs::write(&path, SIMPLE_XML_BZ2).unwrap();

        let ingest = ingest_from_file(&options(FileFormat::Unknown), &path).unwrap();
        check_simple_ingest(&ingest);

        assert!(matches!(
            ingest_from_file(&options(FileFormat::Unknown), tmp.path().join("missing.osm")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_ingest_detects_format() {
        let ingest = ingest_from_buffer(&options(FileFormat::Unknown), SIMPLE_XML_GZ).unwrap();
        check_simple_ingest(&ingest);

        let ingest = ingest_from_buffer(&options(FileFormat::Unknown), SIMPLE_XML_BZ2).unwrap();
        check_simple_ingest(&ingest);

        let ingest = ingest_from_buffer(&options(FileFormat::Unknown), SIMPLE_XML).unwrap();
        check_simple_ingest(&ingest);
    }

    #[test]
    fn test_bbox() {
        let options = Options {
            profile: &CAR_PROFILE,
            file_format: FileFormat::Xml,
            bbox: [0.04, 0.04, 0.06, 0.06],
        };
        let ingest = ingest_from_buffer(&options, SIMPLE_XML).unwrap();
        assert_eq!(ingest.edges.len(), 2);
        assert_eq!(ingest.stats.accepted_ways, 1);
    }

    #[test]
    fn test_no_nodes() {
        const DATA: &[u8] = br#"<?xml version="1.0"?>
<osm version="0.6">
  <way id="1"><nd ref="1"/><nd ref="2"/><tag k="highway" v="primary"/></way>
</osm>"#;

        let result = ingest_from_buffer(&options(FileFormat::Xml), DATA);
        assert!(matches!(result, Err(Error::MalformedExtract)));
    }

    #[test]
    fn test_no_ways() {
        const DATA: &[u8] = br#"<osm><node id="1" lat="0" lon="0"/></osm>"#;

        let ingest = ingest_from_buffer(&options(FileFormat::Xml), DATA).unwrap();
        assert!(ingest.edges.is_empty());
        assert!(ingest.nodes.is_empty());
        assert_eq!(ingest.stats.total_ways, 0);
    }
}

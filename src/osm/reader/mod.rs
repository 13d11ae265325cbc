// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use log::{debug, info};

use crate::osm::Profile;

mod edge_builder;
mod model;
mod xml;

pub use edge_builder::{build_edges, Ingest, IngestStats};
pub use model::{Extract, Way};

/// Format of the input OSM file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Unknown format - guess the format based on the content
    Unknown,

    /// Force uncompressed [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    Xml,

    /// Force [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    /// with [gzip](https://en.wikipedia.org/wiki/Gzip) compression
    XmlGz,

    /// Force [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    /// with [bzip2](https://en.wikipedia.org/wiki/Bzip2) compression
    XmlBz2,
}

/// Additional controls for interpreting OSM data as routable records.
#[derive(Debug)]
pub struct Options<'a> {
    /// How OSM ways should be filtered and costed.
    pub profile: &'a Profile<'a>,

    /// Format of the input data.
    pub file_format: FileFormat,

    /// Filter nodes by a specific bounding box. In order: left (min lon), bottom (min lat),
    /// right (max lon), top (max lat). Ignored if all values are set to zero, or at least one
    /// of them is not finite.
    pub bbox: [f64; 4],
}

impl<'a> Options<'a> {
    fn ignore_bbox(&self) -> bool {
        self.bbox.iter().all(|&x| x == 0.0) || self.bbox.iter().any(|x| !x.is_finite())
    }

    fn is_in_bbox(&self, lat: f64, lon: f64) -> bool {
        let [min_lon, min_lat, max_lon, max_lat] = self.bbox;
        lat >= min_lat && lat <= max_lat && lon >= min_lon && lon <= max_lon
    }
}

/// Error which can occur when reading an OSM extract.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("xml: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("io: {0}")]
    Io(#[from] io::Error),

    /// The document has no node elements at all; nothing can be routed over it.
    #[error("malformed extract: no nodes found")]
    MalformedExtract,
}

/// Internal trait for objects which can stream [osm features](model::Feature)
/// from an underlying source.
trait FeatureReader: Iterator<Item = Result<model::Feature, quick_xml::Error>> {
    /// Number of elements discarded due to missing or invalid attributes.
    fn skipped(&self) -> usize;
}

fn collect_extract<F: FeatureReader>(
    mut features: F,
    options: &Options<'_>,
) -> Result<Extract, Error> {
    let ignore_bbox = options.ignore_bbox();
    let mut extract = Extract::default();
    let mut seen_nodes: usize = 0;

    while let Some(f) = features.next() {
        match f? {
            model::Feature::Node(n) => {
                seen_nodes += 1;
                if ignore_bbox || options.is_in_bbox(n.lat, n.lon) {
                    extract.nodes.insert(n.id, n);
                }
            }
            model::Feature::Way(w) => extract.ways.push(w),
        }
    }

    if seen_nodes == 0 {
        return Err(Error::MalformedExtract);
    }

    if features.skipped() > 0 {
        debug!("skipped {} invalid elements", features.skipped());
    }
    info!(
        "found {} nodes ({} within bbox) and {} ways",
        seen_nodes,
        extract.nodes.len(),
        extract.ways.len(),
    );
    Ok(extract)
}

/// Guesses the [FileFormat] of a stream by peeking at its first bytes.
fn detect_format<R: BufRead>(reader: &mut R) -> io::Result<FileFormat> {
    let head = reader.fill_buf()?;
    if head.starts_with(&[0x1f, 0x8b]) {
        Ok(FileFormat::XmlGz)
    } else if head.starts_with(b"BZh") {
        Ok(FileFormat::XmlBz2)
    } else {
        Ok(FileFormat::Xml)
    }
}

/// Parse all nodes and ways from a reader as per the provided [Options].
///
/// The provided stream will be automatically wrapped in a buffered reader when needed.
pub fn read_extract_from_io<R: io::Read>(
    options: &Options<'_>,
    reader: R,
) -> Result<Extract, Error> {
    let mut b = io::BufReader::new(reader);

    let format = match options.file_format {
        FileFormat::Unknown => detect_format(&mut b)?,
        format => format,
    };

    match format {
        FileFormat::Xml | FileFormat::Unknown => {
            collect_extract(xml::Reader::from_io(b), options)
        }

        FileFormat::XmlGz => {
            let d = flate2::read::MultiGzDecoder::new(b);
            collect_extract(xml::Reader::from_io(io::BufReader::new(d)), options)
        }

        FileFormat::XmlBz2 => {
            let d = bzip2::read::MultiBzDecoder::new(b);
            collect_extract(xml::Reader::from_io(io::BufReader::new(d)), options)
        }
    }
}

/// Parse all nodes and ways from a file at the provided path as per the provided [Options].
pub fn read_extract_from_file<P: AsRef<Path>>(
    options: &Options<'_>,
    path: P,
) -> Result<Extract, Error> {
    let f = File::open(path)?;
    read_extract_from_io(options, f)
}

/// Parse all nodes and ways from a static buffer as per the provided [Options].
pub fn read_extract_from_buffer(options: &Options<'_>, data: &[u8]) -> Result<Extract, Error> {
    if options.file_format == FileFormat::Xml {
        // Fast path is available for in-memory XML data
        collect_extract(xml::Reader::from_buffer(data), options)
    } else {
        read_extract_from_io(options, io::Cursor::new(data))
    }
}

/// Reads an extract from a reader and converts it into routable records.
pub fn ingest_from_io<R: io::Read>(options: &Options<'_>, reader: R) -> Result<Ingest, Error> {
    let extract = read_extract_from_io(options, reader)?;
    Ok(build_edges(extract, options.profile))
}

/// Reads an extract from a file and converts it into routable records.
pub fn ingest_from_file<P: AsRef<Path>>(options: &Options<'_>, path: P) -> Result<Ingest, Error> {
    let extract = read_extract_from_file(options, path)?;
    Ok(build_edges(extract, options.profile))
}

/// Reads an extract from a static buffer and converts it into routable records.
pub fn ingest_from_buffer(options: &Options<'_>, data: &[u8]) -> Result<Ingest, Error> {
    let extract = read_extract_from_buffer(options, data)?;
    Ok(build_edges(extract, options.profile))
}

//! Lossless EXIF rewrite for JPEG photos.
//!
//! The JPEG is split into marker segments; every Exif APP1 segment is
//! dropped and one freshly written APP1 is inserted after SOI (and any
//! leading JFIF APP0). All other segments and the entropy-coded scan are
//! copied byte for byte.

use std::io::{Cursor, Write};
use std::path::Path;

use exif::experimental::Writer;
use exif::{Exif, Field, In, Rational, Reader, Tag, Value};

use crate::models::{CaptureDate, Location, MediaItem};

use super::errors::{EmbedError, EmbedResult};
use super::temp::TempTaggedFile;
use super::{set_capture_time, EmbedMetadata};

const MARKER_SOI: u8 = 0xD8;
const MARKER_EOI: u8 = 0xD9;
const MARKER_SOS: u8 = 0xDA;
const MARKER_APP0: u8 = 0xE0;
const MARKER_APP1: u8 = 0xE1;

const EXIF_HEADER: &[u8] = b"Exif\0\0";

/// Largest payload a single marker segment can carry.
const MAX_SEGMENT_PAYLOAD: usize = u16::MAX as usize - 2;

/// Tags this module owns in the primary IFD; existing values are replaced.
const OWNED_TAGS: &[Tag] = &[
    Tag::ImageDescription,
    Tag::DateTimeOriginal,
    Tag::GPSVersionID,
    Tag::GPSLatitudeRef,
    Tag::GPSLatitude,
    Tag::GPSLongitudeRef,
    Tag::GPSLongitude,
];

/// Layout tags regenerated by the writer.
const STRUCTURAL_TAGS: &[Tag] = &[
    Tag::ExifIFDPointer,
    Tag::GPSInfoIFDPointer,
    Tag::InteropIFDPointer,
    Tag::JPEGInterchangeFormat,
    Tag::JPEGInterchangeFormatLength,
    Tag::StripOffsets,
    Tag::StripByteCounts,
    Tag::TileOffsets,
    Tag::TileByteCounts,
    Tag::MakerNote,
];

struct Segment<'a> {
    marker: u8,
    bytes: &'a [u8],
}

impl Segment<'_> {
    fn is_exif(&self) -> bool {
        self.marker == MARKER_APP1 && self.payload().starts_with(EXIF_HEADER)
    }

    /// Bytes after the marker and length fields.
    fn payload(&self) -> &[u8] {
        self.bytes.get(4..).unwrap_or(&[])
    }
}

struct JpegLayout<'a> {
    segments: Vec<Segment<'a>>,
    /// Everything from SOS (or EOI) to the end of the file.
    scan: &'a [u8],
}

fn parse_layout(data: &[u8]) -> Result<JpegLayout<'_>, String> {
    if data.len() < 4 || data[0] != 0xFF || data[1] != MARKER_SOI {
        return Err("missing JPEG start-of-image marker".to_string());
    }

    let mut segments = Vec::new();
    let mut pos = 2;
    loop {
        if pos >= data.len() {
            return Err("truncated before image data".to_string());
        }
        if data[pos] != 0xFF {
            return Err(format!("expected marker at offset {}", pos));
        }
        let start = pos;
        // Fill bytes
        while pos < data.len() && data[pos] == 0xFF {
            pos += 1;
        }
        let Some(&marker) = data.get(pos) else {
            return Err("truncated marker".to_string());
        };
        pos += 1;

        if marker == MARKER_SOS || marker == MARKER_EOI {
            return Ok(JpegLayout {
                segments,
                scan: &data[start..],
            });
        }
        if marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            segments.push(Segment {
                marker,
                bytes: &data[start..pos],
            });
            continue;
        }

        let len = match data.get(pos..pos + 2) {
            Some(b) => usize::from(u16::from_be_bytes([b[0], b[1]])),
            None => return Err("truncated segment length".to_string()),
        };
        if len < 2 || pos + len > data.len() {
            return Err(format!("segment 0x{:02X} overruns the file", marker));
        }
        pos += len;
        segments.push(Segment {
            marker,
            bytes: &data[start..pos],
        });
    }
}

/// The TIFF body of the first Exif APP1 segment, if any.
pub fn exif_payload(jpeg: &[u8]) -> EmbedResult<Option<Vec<u8>>> {
    let layout = parse_layout(jpeg).map_err(|r| EmbedError::unsupported("<jpeg>", r))?;
    Ok(layout
        .segments
        .iter()
        .find(|s| s.is_exif())
        .map(|s| s.payload()[EXIF_HEADER.len()..].to_vec()))
}

/// The JPEG with every Exif APP1 segment removed.
///
/// Two files that differ only in their EXIF metadata strip to the same bytes.
pub fn strip_exif(jpeg: &[u8]) -> EmbedResult<Vec<u8>> {
    let layout = parse_layout(jpeg).map_err(|r| EmbedError::unsupported("<jpeg>", r))?;
    let mut out = Vec::with_capacity(jpeg.len());
    out.extend_from_slice(&jpeg[..2]);
    for seg in layout.segments.iter().filter(|s| !s.is_exif()) {
        out.extend_from_slice(seg.bytes);
    }
    out.extend_from_slice(layout.scan);
    Ok(out)
}

/// New values for the owned EXIF fields.
#[derive(Debug, Clone)]
pub struct ExifUpdate {
    pub description: String,
    pub date: CaptureDate,
    /// `(latitude, longitude)` in signed decimal degrees.
    pub gps: Option<(f64, f64)>,
}

impl ExifUpdate {
    pub fn new(
        description: &str,
        date: CaptureDate,
        location: Option<&Location>,
    ) -> EmbedResult<Self> {
        let gps = match location {
            Some(loc) => Some((loc.lat()?, loc.lon()?)),
            None => None,
        };
        Ok(Self {
            description: description.to_string(),
            date,
            gps,
        })
    }

    fn fields(&self) -> Vec<Field> {
        let mut fields = vec![
            primary(Tag::ImageDescription, ascii(&self.description)),
            primary(Tag::DateTimeOriginal, ascii(&self.date.exif_string())),
        ];
        if let Some((lat, lon)) = self.gps {
            fields.push(primary(Tag::GPSVersionID, Value::Byte(vec![2, 2, 0, 0])));
            fields.push(primary(
                Tag::GPSLatitudeRef,
                ascii(if lat < 0.0 { "S" } else { "N" }),
            ));
            fields.push(primary(Tag::GPSLatitude, Value::Rational(to_dms(lat))));
            fields.push(primary(
                Tag::GPSLongitudeRef,
                ascii(if lon < 0.0 { "W" } else { "E" }),
            ));
            fields.push(primary(Tag::GPSLongitude, Value::Rational(to_dms(lon))));
        }
        fields
    }
}

fn primary(tag: Tag, value: Value) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value,
    }
}

fn ascii(s: &str) -> Value {
    Value::Ascii(vec![s.as_bytes().to_vec()])
}

/// Degrees, minutes and seconds (1/10000 s precision) of `|deg|`.
fn to_dms(deg: f64) -> Vec<Rational> {
    const UNITS_PER_SECOND: u64 = 10_000;
    let total = (deg.abs() * 3600.0 * UNITS_PER_SECOND as f64).round() as u64;
    let degrees = total / (3600 * UNITS_PER_SECOND);
    let rem = total % (3600 * UNITS_PER_SECOND);
    let minutes = rem / (60 * UNITS_PER_SECOND);
    let seconds = rem % (60 * UNITS_PER_SECOND);
    vec![
        Rational::from((degrees as u32, 1)),
        Rational::from((minutes as u32, 1)),
        Rational::from((seconds as u32, UNITS_PER_SECOND as u32)),
    ]
}

/// Existing fields worth carrying over.
fn preserved_fields(exif: &Exif) -> Vec<Field> {
    exif.fields()
        .filter(|f| f.ifd_num == In::PRIMARY || f.ifd_num == In::THUMBNAIL)
        .filter(|f| !STRUCTURAL_TAGS.contains(&f.tag))
        .filter(|f| !(f.ifd_num == In::PRIMARY && OWNED_TAGS.contains(&f.tag)))
        .filter(|f| !matches!(f.value, Value::Unknown(..)))
        .cloned()
        .collect()
}

fn thumbnail(exif: &Exif) -> Option<&[u8]> {
    let offset = exif
        .get_field(Tag::JPEGInterchangeFormat, In::THUMBNAIL)?
        .value
        .get_uint(0)? as usize;
    let len = exif
        .get_field(Tag::JPEGInterchangeFormatLength, In::THUMBNAIL)?
        .value
        .get_uint(0)? as usize;
    exif.buf().get(offset..offset.checked_add(len)?)
}

fn write_tiff(fields: &[Field], thumb: Option<&[u8]>, little_endian: bool) -> EmbedResult<Vec<u8>> {
    let mut writer = Writer::new();
    for field in fields {
        writer.push_field(field);
    }
    if let Some(jpeg) = thumb {
        writer.set_jpeg(jpeg, In::THUMBNAIL);
    }
    let mut buf = Cursor::new(Vec::new());
    writer.write(&mut buf, little_endian)?;
    Ok(buf.into_inner())
}

/// Serialize the new Exif block, keeping as much existing metadata as fits.
///
/// Falls back to dropping the thumbnail, then to the owned fields alone,
/// when the existing metadata can't be rewritten or is too large.
fn build_exif(existing: Option<&Exif>, update: &ExifUpdate) -> EmbedResult<Vec<u8>> {
    let owned = update.fields();
    let fits = |tiff: &Vec<u8>| EXIF_HEADER.len() + tiff.len() <= MAX_SEGMENT_PAYLOAD;

    if let Some(exif) = existing {
        let mut fields = preserved_fields(exif);
        fields.extend(owned.iter().cloned());
        let little_endian = exif.little_endian();

        let thumb = thumbnail(exif);
        let mut candidates = vec![thumb];
        if thumb.is_some() {
            candidates.push(None);
        }
        for thumb in candidates {
            match write_tiff(&fields, thumb, little_endian) {
                Ok(tiff) if fits(&tiff) => return Ok(tiff),
                Ok(tiff) => tracing::debug!("Rewritten EXIF too large ({} bytes)", tiff.len()),
                Err(e) => tracing::warn!("Could not carry existing EXIF over: {}", e),
            }
        }
        tracing::warn!("Dropping existing EXIF fields, writing tagging fields only");
    }

    let tiff = write_tiff(&owned, None, existing.map(|e| e.little_endian()).unwrap_or(false))?;
    if !fits(&tiff) {
        return Err(EmbedError::Exif(format!(
            "description too long for an EXIF segment ({} bytes)",
            tiff.len()
        )));
    }
    Ok(tiff)
}

/// Rewrite `jpeg` in memory with the given EXIF values.
pub fn rewrite_exif(jpeg: &[u8], update: &ExifUpdate) -> EmbedResult<Vec<u8>> {
    let layout = parse_layout(jpeg).map_err(|r| EmbedError::unsupported("<jpeg>", r))?;

    let existing = layout
        .segments
        .iter()
        .find(|s| s.is_exif())
        .and_then(|s| {
            let tiff = s.payload()[EXIF_HEADER.len()..].to_vec();
            match Reader::new().read_raw(tiff) {
                Ok(exif) => Some(exif),
                Err(e) => {
                    tracing::warn!("Ignoring unreadable EXIF block: {}", e);
                    None
                }
            }
        });

    let tiff = build_exif(existing.as_ref(), update)?;
    let segment_len = 2 + EXIF_HEADER.len() + tiff.len();

    let mut out = Vec::with_capacity(jpeg.len() + segment_len + 2);
    out.extend_from_slice(&[0xFF, MARKER_SOI]);

    let mut kept = layout.segments.iter().filter(|s| !s.is_exif()).peekable();
    while let Some(seg) = kept.next_if(|s| s.marker == MARKER_APP0) {
        out.extend_from_slice(seg.bytes);
    }

    out.extend_from_slice(&[0xFF, MARKER_APP1]);
    out.extend_from_slice(&(segment_len as u16).to_be_bytes());
    out.extend_from_slice(EXIF_HEADER);
    out.extend_from_slice(&tiff);

    for seg in kept {
        out.extend_from_slice(seg.bytes);
    }
    out.extend_from_slice(layout.scan);
    Ok(out)
}

/// Write a tagged copy of a photo next to the original.
pub fn embed_photo(item: &MediaItem, meta: &EmbedMetadata) -> EmbedResult<TempTaggedFile> {
    let path = item.path();
    let data = std::fs::read(path)
        .map_err(|e| EmbedError::io(format!("reading {}", path.display()), e))?;

    let update = ExifUpdate::new(&meta.description, meta.date, meta.location.as_ref())?;
    let tagged = rewrite_exif(&data, &update).map_err(|e| match e {
        EmbedError::UnsupportedFormat { reason, .. } => {
            EmbedError::unsupported(path.display().to_string(), reason)
        }
        other => other,
    })?;

    let (temp, mut file) = TempTaggedFile::create_for(path)?;
    file.write_all(&tagged)
        .and_then(|_| file.sync_all())
        .map_err(|e| EmbedError::io(format!("writing {}", temp.path().display()), e))?;
    drop(file);

    set_capture_time(temp.path(), meta.date)?;
    tracing::debug!("Tagged photo {} -> {}", path.display(), temp.path().display());
    Ok(temp)
}

/// Read back the owned fields of a tagged JPEG, for verification.
pub fn read_description(jpeg_path: &Path) -> EmbedResult<Option<String>> {
    let data = std::fs::read(jpeg_path)
        .map_err(|e| EmbedError::io(format!("reading {}", jpeg_path.display()), e))?;
    let Some(tiff) = exif_payload(&data)? else {
        return Ok(None);
    };
    let exif = Reader::new().read_raw(tiff)?;
    Ok(exif
        .get_field(Tag::ImageDescription, In::PRIMARY)
        .and_then(|f| match &f.value {
            Value::Ascii(parts) => parts
                .first()
                .map(|p| String::from_utf8_lossy(p).to_string()),
            _ => None,
        }))
}

/// SOI, JFIF APP0, a DQT-like segment, SOS with scan data, EOI.
#[cfg(test)]
pub(crate) fn sample_jpeg() -> Vec<u8> {
    let mut v = vec![0xFF, 0xD8];
    v.extend_from_slice(&[
        0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0x00, 0x01,
        0x00, 0x01, 0x00, 0x00,
    ]);
    v.extend_from_slice(&[0xFF, 0xDB, 0x00, 0x05, 0x00, 0x10, 0x20]);
    v.extend_from_slice(&[
        0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00, 0x3F, 0x00,
    ]);
    v.extend_from_slice(&[0x12, 0x34, 0xFF, 0x00, 0x56, 0x78]);
    v.extend_from_slice(&[0xFF, 0xD9]);
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_exif(jpeg: &[u8], fields: &[Field]) -> Vec<u8> {
        let tiff = write_tiff(fields, None, true).unwrap();
        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&[0xFF, MARKER_APP1]);
        out.extend_from_slice(&((2 + EXIF_HEADER.len() + tiff.len()) as u16).to_be_bytes());
        out.extend_from_slice(EXIF_HEADER);
        out.extend_from_slice(&tiff);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    fn update() -> ExifUpdate {
        let loc = Location::new("Sydney", "-33.8688", "151.2093");
        ExifUpdate::new(
            "Tags: beach - People: Ada",
            CaptureDate::new(2024, 3, 9).unwrap(),
            Some(&loc),
        )
        .unwrap()
    }

    fn read(jpeg: &[u8]) -> Exif {
        Reader::new()
            .read_raw(exif_payload(jpeg).unwrap().unwrap())
            .unwrap()
    }

    fn ascii_of(exif: &Exif, tag: Tag) -> String {
        match &exif.get_field(tag, In::PRIMARY).unwrap().value {
            Value::Ascii(parts) => String::from_utf8_lossy(&parts[0]).to_string(),
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn writes_owned_fields() {
        let tagged = rewrite_exif(&sample_jpeg(), &update()).unwrap();
        let exif = read(&tagged);

        assert_eq!(ascii_of(&exif, Tag::ImageDescription), "Tags: beach - People: Ada");
        assert_eq!(ascii_of(&exif, Tag::DateTimeOriginal), "2024:03:09 00:00:00");
        assert_eq!(ascii_of(&exif, Tag::GPSLatitudeRef), "S");
        assert_eq!(ascii_of(&exif, Tag::GPSLongitudeRef), "E");

        match &exif.get_field(Tag::GPSLatitude, In::PRIMARY).unwrap().value {
            Value::Rational(r) => {
                assert_eq!((r[0].num, r[0].denom), (33, 1));
                assert_eq!((r[1].num, r[1].denom), (52, 1));
                // 0.8688 deg = 52 min 7.68 s
                assert_eq!((r[2].num, r[2].denom), (76_800, 10_000));
            }
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn non_metadata_bytes_are_unchanged() {
        let original = sample_jpeg();
        let tagged = rewrite_exif(&original, &update()).unwrap();
        assert_ne!(tagged, original);
        assert_eq!(strip_exif(&tagged).unwrap(), strip_exif(&original).unwrap());
        // APP1 lands right after JFIF APP0
        assert_eq!(&tagged[20..22], &[0xFF, MARKER_APP1]);
    }

    #[test]
    fn existing_fields_survive_and_owned_ones_are_replaced() {
        let original = with_exif(
            &sample_jpeg(),
            &[
                primary(Tag::Make, ascii("Canon")),
                primary(Tag::ImageDescription, ascii("old description")),
            ],
        );
        let tagged = rewrite_exif(&original, &update()).unwrap();
        let exif = read(&tagged);

        assert_eq!(ascii_of(&exif, Tag::Make), "Canon");
        assert_eq!(ascii_of(&exif, Tag::ImageDescription), "Tags: beach - People: Ada");
        assert_eq!(strip_exif(&tagged).unwrap(), strip_exif(&original).unwrap());
    }

    #[test]
    fn unreadable_exif_is_replaced() {
        let mut original = sample_jpeg();
        let junk = [&EXIF_HEADER[..], b"not a tiff header"].concat();
        let mut seg = vec![0xFF, MARKER_APP1];
        seg.extend_from_slice(&((2 + junk.len()) as u16).to_be_bytes());
        seg.extend_from_slice(&junk);
        original.splice(2..2, seg);

        let tagged = rewrite_exif(&original, &update()).unwrap();
        let exif = read(&tagged);
        assert_eq!(ascii_of(&exif, Tag::DateTimeOriginal), "2024:03:09 00:00:00");
    }

    #[test]
    fn retagging_is_idempotent() {
        let once = rewrite_exif(&sample_jpeg(), &update()).unwrap();
        let twice = rewrite_exif(&once, &update()).unwrap();
        assert_eq!(exif_payload(&once).unwrap(), exif_payload(&twice).unwrap());
    }

    #[test]
    fn without_location_no_gps_is_written() {
        let update = ExifUpdate::new("Tags: x - People: ", CaptureDate::new(2020, 1, 2).unwrap(), None)
            .unwrap();
        let exif = read(&rewrite_exif(&sample_jpeg(), &update).unwrap());
        assert!(exif.get_field(Tag::GPSLatitude, In::PRIMARY).is_none());
    }

    #[test]
    fn rejects_non_jpeg() {
        assert!(matches!(
            rewrite_exif(b"PNG....", &update()),
            Err(EmbedError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn dms_carries_cleanly() {
        let dms = to_dms(10.999_999_99);
        assert_eq!((dms[0].num, dms[1].num, dms[2].num), (11, 0, 0));
    }
}

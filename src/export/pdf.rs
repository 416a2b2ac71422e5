//! Single-page PDF output.
//!
//! The page MediaBox is the label's physical size converted to points, and
//! the rendered raster is embedded as one Flate-compressed RGB image scaled
//! to cover the whole page. Print size therefore depends only on the
//! millimeter dimensions, never on the pixel count.

use flate2::Compression;
use flate2::write::ZlibEncoder;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, StringFormat, dictionary};
use std::io::Write;

use crate::document::PageGeometry;
use crate::surface::RasterSurface;
use crate::units::mm_to_points;

use super::ExportError;

const PRODUCER: &str = concat!("labelpress ", env!("CARGO_PKG_VERSION"));

fn failure(e: impl std::fmt::Display) -> ExportError {
    ExportError::RenderFailure(format!("PDF encoding failed: {}", e))
}

/// A PDF text string: ASCII as a literal, anything else as UTF-16BE with a
/// byte order mark.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn deflate(bytes: &[u8]) -> Result<Vec<u8>, ExportError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).map_err(failure)?;
    encoder.finish().map_err(failure)
}

/// Serialize `surface` as a one-page PDF sized to `geometry`'s millimeters.
pub fn write_pdf(
    surface: &RasterSurface,
    geometry: &PageGeometry,
    title: Option<&str>,
) -> Result<Vec<u8>, ExportError> {
    let page_width = mm_to_points(geometry.width_mm);
    let page_height = mm_to_points(geometry.height_mm);
    let image = surface.image();

    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let image_stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width() as i64,
            "Height" => image.height() as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        deflate(&surface.to_rgb_bytes())?,
    );
    let image_id = doc.add_object(image_stream);

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    page_width.into(),
                    0.into(),
                    0.into(),
                    page_height.into(),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec!["Im1".into()]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content.encode().map_err(failure)?;
    let content_id = doc.add_object(Stream::new(
        dictionary! { "Filter" => "FlateDecode" },
        deflate(&encoded)?,
    ));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), page_width.into(), page_height.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im1" => image_id },
        },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);

    let created = chrono::Utc::now().format("D:%Y%m%d%H%M%SZ").to_string();
    let mut info = dictionary! {
        "Producer" => Object::string_literal(PRODUCER),
        "CreationDate" => Object::string_literal(created),
    };
    if let Some(title) = title {
        info.set("Title", text_string(title));
    }
    let info_id = doc.add_object(info);
    doc.trailer.set("Info", info_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).map_err(failure)?;
    Ok(out)
}

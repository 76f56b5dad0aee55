//! Single-page PDF assembly on `lopdf`.
//!
//! The page is exactly the size of the capture (1 CSS px = 0.75 pt) and holds
//! one JPEG image XObject (`/DCTDecode`) scaled to fill it. Orientation
//! follows from the MediaBox aspect ratio.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use crate::model::ExportError;

/// PDF points per CSS pixel (72 pt per inch / 96 px per inch).
pub const PT_PER_PX: f32 = 0.75;

fn pt(px: u32) -> f32 {
    px as f32 * PT_PER_PX
}

impl From<lopdf::Error> for ExportError {
    fn from(e: lopdf::Error) -> Self {
        ExportError::Pdf(e.to_string())
    }
}

/// Builds the PDF bytes.
///
/// `image_w`/`image_h` are the JPEG's pixel dimensions; `page_w_px` and
/// `page_h_px` the capture size in CSS pixels.
pub fn single_page_pdf(
    jpeg: &[u8],
    image_w: u32,
    image_h: u32,
    page_w_px: u32,
    page_h_px: u32,
) -> Result<Vec<u8>, ExportError> {
    if jpeg.is_empty() || image_w == 0 || image_h == 0 {
        return Err(ExportError::Pdf("no image data to embed".to_string()));
    }
    if page_w_px == 0 || page_h_px == 0 {
        return Err(ExportError::Pdf("page size is zero".to_string()));
    }
    let (page_w, page_h) = (pt(page_w_px), pt(page_h_px));

    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    // JPEG bytes go in as-is; DCTDecode is the viewer's job.
    let image = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image_w,
            "Height" => image_h,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg.to_vec(),
    );
    let image_id = doc.add_object(image);

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![page_w.into(), 0.into(), 0.into(), page_h.into(), 0.into(), 0.into()],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![Object::from(0), 0.into(), page_w.into(), page_h.into()],
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
        "Contents" => content_id,
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::from(page_id)],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out: Vec<u8> = Vec::with_capacity(jpeg.len() + 1024);
    doc.save_to(&mut out).map_err(lopdf::Error::from)?;
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Single-page poster document assembly.
//!
//! Writes a minimal landscape-A4 PDF embedding one JPEG as a full-page
//! image XObject. The payload is passed through as a `/DCTDecode` stream
//! byte for byte, so the adaptive encoder's size budget survives into the
//! artifact.

use thiserror::Error;

/// A4 landscape page width in PDF points.
pub const PAGE_WIDTH_PT: f64 = 841.89;
/// A4 landscape page height in PDF points.
pub const PAGE_HEIGHT_PT: f64 = 595.28;

/// JPEG start-of-image marker.
const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

/// Errors that can occur during document assembly.
#[derive(Debug, Error)]
pub enum PdfError {
    /// The payload does not carry a JPEG start-of-image marker.
    #[error("invalid poster image: payload is not JPEG data")]
    NotJpeg,

    /// Width or height is zero.
    #[error("invalid poster image: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Assemble a one-page landscape-A4 PDF with `jpeg` drawn full-bleed.
///
/// # Arguments
///
/// * `jpeg` - JPEG-encoded image payload
/// * `width` - Pixel width of the encoded image
/// * `height` - Pixel height of the encoded image
///
/// # Errors
///
/// Returns [`PdfError::NotJpeg`] when the payload lacks the SOI marker and
/// [`PdfError::InvalidDimensions`] for zero dimensions.
pub fn poster_document(jpeg: &[u8], width: u32, height: u32) -> Result<Vec<u8>, PdfError> {
    if width == 0 || height == 0 {
        return Err(PdfError::InvalidDimensions { width, height });
    }
    if jpeg.len() < JPEG_SOI.len() || jpeg[0..2] != JPEG_SOI {
        return Err(PdfError::NotJpeg);
    }

    // Stretch the image over the whole page; the capture region is laid out
    // at the A4 aspect ratio, so this is a fit, not a distortion.
    let content = format!(
        "q\n{PAGE_WIDTH_PT} 0 0 {PAGE_HEIGHT_PT} 0 0 cm\n/Im0 Do\nQ",
    );

    let objects: Vec<Vec<u8>> = vec![
        // 1: catalog
        b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
        // 2: page tree
        b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_vec(),
        // 3: the single landscape-A4 page
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH_PT} {PAGE_HEIGHT_PT}] \
             /Resources << /XObject << /Im0 5 0 R >> >> /Contents 4 0 R >>",
        )
        .into_bytes(),
        // 4: content stream
        stream_object(content.as_bytes(), "<< /Length {len} >>"),
        // 5: the poster image, DCTDecode passthrough
        stream_object(
            jpeg,
            &format!(
                "<< /Type /XObject /Subtype /Image /Width {width} /Height {height} \
                 /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode \
                 /Length {{len}} >>",
            ),
        ),
        // 6: info
        b"<< /Producer (PosterPress) >>".to_vec(),
    ];

    Ok(build_pdf(objects, 1, Some(6)))
}

/// Render a stream object body; `{len}` in the dict template is replaced
/// with the stream length.
fn stream_object(data: &[u8], dict_template: &str) -> Vec<u8> {
    let dict = dict_template.replace("{len}", &data.len().to_string());
    let mut body = Vec::with_capacity(dict.len() + data.len() + 20);
    body.extend_from_slice(dict.as_bytes());
    body.extend_from_slice(b"\nstream\n");
    body.extend_from_slice(data);
    body.extend_from_slice(b"\nendstream");
    body
}

/// Serialize numbered objects with a classic xref table and trailer.
fn build_pdf(objects: Vec<Vec<u8>>, catalog_id: usize, info_id: Option<usize>) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.7\n");
    // Binary comment line marks the file as non-ASCII for transfer tools
    out.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        let obj_id = index + 1;
        out.extend_from_slice(format!("{obj_id} 0 obj\n").as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }

    let mut trailer = format!(
        "trailer\n<< /Size {} /Root {} 0 R",
        objects.len() + 1,
        catalog_id
    );
    if let Some(info_id) = info_id {
        trailer.push_str(&format!(" /Info {info_id} 0 R"));
    }
    trailer.push_str(&format!(" >>\nstartxref\n{xref_start}\n%%EOF"));
    out.extend_from_slice(trailer.as_bytes());

    out
}

//! Embedded raster image extraction.
//!
//! Images are found through the XObject resources of each page, including
//! those of nested form XObjects, and saved as PNG when they pass the
//! [`ImageFilter`].

use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use image::{DynamicImage, GrayImage, ImageBuffer, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use crate::error::{Error, Result};
use crate::model::ImageRef;
use crate::parser::PdfSource;

use super::options::ImageFilter;

/// Nesting limit for form XObjects inside form XObjects.
const MAX_FORM_DEPTH: usize = 16;

/// Decode every image of every page and save the large ones into `out_dir`.
///
/// The directory is created if missing; failing to create it is the only
/// error. An image that cannot be decoded or saved, or whose decoder
/// panics, is skipped.
pub fn extract_images(
    source: &PdfSource,
    out_dir: &Path,
    filter: &ImageFilter,
) -> Result<Vec<ImageRef>> {
    std::fs::create_dir_all(out_dir)?;

    let doc = source.raw_doc();
    let mut saved = Vec::new();

    for (page_num, page_id) in source.pages() {
        let image_ids = page_image_ids(source, page_id);

        for (position, image_id) in image_ids.into_iter().enumerate() {
            let index = position as u32 + 1;
            let attempt = catch_unwind(AssertUnwindSafe(|| {
                save_image(doc, image_id, page_num, index, out_dir, filter)
            }))
            .unwrap_or_else(|payload| Err(Error::from_panic(payload)));
            match attempt {
                Ok(Some(image)) => saved.push(image),
                Ok(None) => {}
                Err(e) => log::debug!(
                    "{}: page {} image {} skipped: {}",
                    source.path().display(),
                    page_num,
                    index,
                    e
                ),
            }
        }
    }

    Ok(saved)
}

/// Image XObjects used by a page, in resource order, each listed once.
pub fn page_image_ids(source: &PdfSource, page_id: ObjectId) -> Vec<ObjectId> {
    let mut ids = Vec::new();
    let mut visited = HashSet::new();
    if let Some(resources) = source.page_resources(page_id) {
        collect_images(source, resources, &mut ids, &mut visited, 0);
    }
    ids
}

fn collect_images(
    source: &PdfSource,
    resources: &Dictionary,
    ids: &mut Vec<ObjectId>,
    visited: &mut HashSet<ObjectId>,
    depth: usize,
) {
    if depth > MAX_FORM_DEPTH {
        return;
    }
    let Some(xobjects) = resources
        .get(b"XObject")
        .ok()
        .and_then(|x| source.resolve_dict(x))
    else {
        return;
    };

    for (_, obj) in xobjects.iter() {
        let Ok(id) = obj.as_reference() else {
            continue;
        };
        if !visited.insert(id) {
            continue;
        }
        let Ok(Object::Stream(stream)) = source.raw_doc().get_object(id) else {
            continue;
        };

        match stream.dict.get(b"Subtype").and_then(Object::as_name) {
            Ok(b"Image") => ids.push(id),
            Ok(b"Form") => {
                if let Some(form_resources) = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|r| source.resolve_dict(r))
                {
                    collect_images(source, form_resources, ids, visited, depth + 1);
                }
            }
            _ => {}
        }
    }
}

fn save_image(
    doc: &LopdfDocument,
    image_id: ObjectId,
    page: u32,
    index: u32,
    out_dir: &Path,
    filter: &ImageFilter,
) -> Result<Option<ImageRef>> {
    let stream = match doc.get_object(image_id)? {
        Object::Stream(stream) => stream,
        _ => return Err(Error::ImageExtract("image XObject is not a stream".to_string())),
    };

    // Skip obviously small images before paying for decoding.
    if let (Some(w), Some(h)) = (
        dict_u32(&stream.dict, b"Width"),
        dict_u32(&stream.dict, b"Height"),
    ) {
        if !filter.accepts(w, h) {
            return Ok(None);
        }
    }

    let image = decode_image_stream(doc, stream)?;
    let (width, height) = (image.width(), image.height());
    if !filter.accepts(width, height) {
        return Ok(None);
    }

    let path = out_dir.join(ImageRef::file_name_for(page, index));
    image.save_with_format(&path, ImageFormat::Png)?;
    log::debug!("saved {} ({}x{})", path.display(), width, height);

    Ok(Some(ImageRef {
        path,
        page,
        index,
        width,
        height,
    }))
}

/// Decode an image XObject into a gray or RGB pixel buffer.
pub fn decode_image_stream(doc: &LopdfDocument, stream: &Stream) -> Result<DynamicImage> {
    let filters = stream_filters(&stream.dict);

    if let Some(unsupported) = filters
        .iter()
        .find(|f| matches!(f.as_str(), "JPXDecode" | "JBIG2Decode" | "CCITTFaxDecode"))
    {
        return Err(Error::UnsupportedImage(unsupported.clone()));
    }

    if filters.iter().any(|f| f == "DCTDecode" || f == "DCT") {
        if filters.len() != 1 {
            return Err(Error::UnsupportedImage(filters.join(" + ")));
        }
        let image = image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)?;
        return Ok(match image {
            DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => image,
            other => DynamicImage::ImageRgb8(other.to_rgb8()),
        });
    }

    let data = if filters.is_empty() {
        stream.content.clone()
    } else {
        stream
            .decompressed_content()
            .map_err(|e| Error::ImageExtract(format!("{}: {}", filters.join(" + "), e)))?
    };

    let width = dict_u32(&stream.dict, b"Width")
        .ok_or_else(|| Error::ImageExtract("missing /Width".to_string()))?;
    let height = dict_u32(&stream.dict, b"Height")
        .ok_or_else(|| Error::ImageExtract("missing /Height".to_string()))?;

    let is_mask = matches!(stream.dict.get(b"ImageMask"), Ok(Object::Boolean(true)));
    let (color, bits) = if is_mask {
        (ColorModel::Gray, 1)
    } else {
        let color = match stream.dict.get(b"ColorSpace") {
            Ok(cs) => ColorModel::resolve(doc, cs, 0)?,
            Err(_) => ColorModel::Gray,
        };
        let bits = dict_u32(&stream.dict, b"BitsPerComponent").unwrap_or(8);
        (color, bits)
    };

    let invert = !matches!(color, ColorModel::Indexed { .. }) && has_inverted_decode(&stream.dict);
    let raw = RawImage {
        width,
        height,
        bits,
        invert,
    };
    raw.decode(&data, &color)
}

/// Names of the filters applied to a stream, outermost first.
fn stream_filters(dict: &Dictionary) -> Vec<String> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![String::from_utf8_lossy(name).into_owned()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .collect(),
        _ => Vec::new(),
    }
}

fn dict_u32(dict: &Dictionary, key: &[u8]) -> Option<u32> {
    dict.get(key)
        .ok()
        .and_then(|o| o.as_i64().ok())
        .and_then(|v| u32::try_from(v).ok())
}

/// A `/Decode [1 0 ...]` array flips every sample.
fn has_inverted_decode(dict: &Dictionary) -> bool {
    let Ok(Object::Array(decode)) = dict.get(b"Decode") else {
        return false;
    };
    let number = |o: &Object| match o {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    };
    match (decode.first().and_then(number), decode.get(1).and_then(number)) {
        (Some(lo), Some(hi)) => lo > hi,
        _ => false,
    }
}

/// Color model of a raw sample stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorModel {
    Gray,
    Rgb,
    Cmyk,
    /// Palette lookup into a base space; samples are indices.
    Indexed {
        base: Box<ColorModel>,
        hival: u8,
        lookup: Vec<u8>,
    },
}

impl ColorModel {
    /// Samples per pixel in the stream.
    pub fn components(&self) -> usize {
        match self {
            ColorModel::Gray | ColorModel::Indexed { .. } => 1,
            ColorModel::Rgb => 3,
            ColorModel::Cmyk => 4,
        }
    }

    fn resolve(doc: &LopdfDocument, obj: &Object, depth: usize) -> Result<Self> {
        if depth > 4 {
            return Err(Error::UnsupportedImage("color space nesting".to_string()));
        }
        match obj {
            Object::Reference(id) => Self::resolve(doc, doc.get_object(*id)?, depth + 1),
            Object::Name(name) => Self::from_family(name),
            Object::Array(items) => {
                let family = items
                    .first()
                    .and_then(|o| o.as_name().ok())
                    .ok_or_else(|| Error::UnsupportedImage("empty color space".to_string()))?;
                match family {
                    b"ICCBased" => {
                        let profile = match items.get(1) {
                            Some(Object::Reference(id)) => doc.get_object(*id)?,
                            Some(other) => other,
                            None => {
                                return Err(Error::UnsupportedImage(
                                    "ICCBased without profile".to_string(),
                                ))
                            }
                        };
                        let Object::Stream(profile) = profile else {
                            return Err(Error::UnsupportedImage("ICCBased profile".to_string()));
                        };
                        match dict_u32(&profile.dict, b"N") {
                            Some(1) => Ok(ColorModel::Gray),
                            Some(3) => Ok(ColorModel::Rgb),
                            Some(4) => Ok(ColorModel::Cmyk),
                            _ => match profile.dict.get(b"Alternate") {
                                Ok(alt) => Self::resolve(doc, alt, depth + 1),
                                Err(_) => Err(Error::UnsupportedImage("ICCBased /N".to_string())),
                            },
                        }
                    }
                    b"Indexed" | b"I" => {
                        let base = items
                            .get(1)
                            .ok_or_else(|| Error::UnsupportedImage("Indexed base".to_string()))?;
                        let base = Self::resolve(doc, base, depth + 1)?;
                        if matches!(base, ColorModel::Indexed { .. }) {
                            return Err(Error::UnsupportedImage("nested Indexed".to_string()));
                        }
                        let hival = items
                            .get(2)
                            .and_then(|o| o.as_i64().ok())
                            .map(|v| v.clamp(0, 255) as u8)
                            .ok_or_else(|| Error::UnsupportedImage("Indexed hival".to_string()))?;
                        let lookup = match items.get(3) {
                            Some(Object::Reference(id)) => lookup_bytes(doc.get_object(*id)?),
                            Some(other) => lookup_bytes(other),
                            None => None,
                        }
                        .ok_or_else(|| Error::UnsupportedImage("Indexed lookup".to_string()))?;
                        Ok(ColorModel::Indexed {
                            base: Box::new(base),
                            hival,
                            lookup,
                        })
                    }
                    other => Self::from_family(other),
                }
            }
            _ => Err(Error::UnsupportedImage("color space".to_string())),
        }
    }

    fn from_family(name: &[u8]) -> Result<Self> {
        match name {
            b"DeviceGray" | b"CalGray" | b"G" => Ok(ColorModel::Gray),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Ok(ColorModel::Rgb),
            b"DeviceCMYK" | b"CMYK" => Ok(ColorModel::Cmyk),
            other => Err(Error::UnsupportedImage(format!(
                "color space {}",
                String::from_utf8_lossy(other)
            ))),
        }
    }
}

fn lookup_bytes(obj: &Object) -> Option<Vec<u8>> {
    match obj {
        Object::String(bytes, _) => Some(bytes.clone()),
        Object::Stream(stream) => Some(
            stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone()),
        ),
        _ => None,
    }
}

/// Geometry of an unpacked sample stream.
#[derive(Debug, Clone, Copy)]
pub struct RawImage {
    pub width: u32,
    pub height: u32,
    /// Bits per component: 1, 2, 4, 8 or 16
    pub bits: u32,
    /// Flip every sample (`/Decode [1 0]`)
    pub invert: bool,
}

impl RawImage {
    /// Unpack `data` into a gray or RGB image.
    pub fn decode(&self, data: &[u8], color: &ColorModel) -> Result<DynamicImage> {
        if !matches!(self.bits, 1 | 2 | 4 | 8 | 16) {
            return Err(Error::UnsupportedImage(format!(
                "{} bits per component",
                self.bits
            )));
        }

        let is_indexed = matches!(color, ColorModel::Indexed { .. });
        let samples = self.unpack(data, color.components(), !is_indexed)?;

        match color {
            ColorModel::Gray => self.gray(samples),
            ColorModel::Rgb => self.rgb(samples),
            ColorModel::Cmyk => self.rgb(cmyk_to_rgb(&samples)),
            ColorModel::Indexed {
                base,
                hival,
                lookup,
            } => {
                let n = base.components();
                let mut expanded = Vec::with_capacity(samples.len() * n);
                for index in samples {
                    let index = usize::from(index.min(*hival));
                    let entry = lookup
                        .get(index * n..index * n + n)
                        .ok_or_else(|| Error::ImageExtract("palette too short".to_string()))?;
                    expanded.extend_from_slice(entry);
                }
                match base.as_ref() {
                    ColorModel::Gray => self.gray(expanded),
                    ColorModel::Rgb => self.rgb(expanded),
                    _ => self.rgb(cmyk_to_rgb(&expanded)),
                }
            }
        }
    }

    /// One 8-bit sample per component, rows packed.
    ///
    /// With `scale`, samples narrower than 8 bits are stretched to 0..=255;
    /// palette indices are passed through unscaled.
    fn unpack(&self, data: &[u8], components: usize, scale: bool) -> Result<Vec<u8>> {
        let oversized = || {
            Error::ImageExtract(format!(
                "{}x{} at {} bits is too large",
                self.width, self.height, self.bits
            ))
        };
        let per_row = (self.width as usize)
            .checked_mul(components)
            .ok_or_else(oversized)?;
        let row_bytes = per_row
            .checked_mul(self.bits as usize)
            .ok_or_else(oversized)?
            .div_ceil(8);
        let needed = row_bytes
            .checked_mul(self.height as usize)
            .ok_or_else(oversized)?;
        if data.len() < needed {
            return Err(Error::ImageExtract(format!(
                "truncated image data: {} of {} bytes",
                data.len(),
                needed
            )));
        }

        let max = (1u16 << self.bits.min(8)) - 1;
        let mut out = Vec::with_capacity(per_row * self.height as usize);

        for row in data[..needed].chunks_exact(row_bytes) {
            for i in 0..per_row {
                let value = match self.bits {
                    8 => row[i],
                    16 => row[i * 2],
                    bits => {
                        let bit = i * bits as usize;
                        let shift = 8 - bits as usize - (bit % 8);
                        let sample = u16::from(row[bit / 8] >> shift) & max;
                        if scale {
                            (sample * 255 / max) as u8
                        } else {
                            sample as u8
                        }
                    }
                };
                out.push(value);
            }
        }
        Ok(out)
    }

    fn gray(&self, mut samples: Vec<u8>) -> Result<DynamicImage> {
        if self.invert {
            samples.iter_mut().for_each(|s| *s = 255 - *s);
        }
        let buffer: GrayImage = ImageBuffer::from_raw(self.width, self.height, samples)
            .ok_or_else(|| Error::ImageExtract("gray buffer size".to_string()))?;
        Ok(DynamicImage::ImageLuma8(buffer))
    }

    fn rgb(&self, mut samples: Vec<u8>) -> Result<DynamicImage> {
        if self.invert {
            samples.iter_mut().for_each(|s| *s = 255 - *s);
        }
        let buffer: RgbImage = ImageBuffer::from_raw(self.width, self.height, samples)
            .ok_or_else(|| Error::ImageExtract("RGB buffer size".to_string()))?;
        Ok(DynamicImage::ImageRgb8(buffer))
    }
}

/// Naive CMYK to RGB: `r = (255 - c) * (255 - k) / 255`.
pub fn cmyk_to_rgb(cmyk: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(cmyk.len() / 4 * 3);
    for px in cmyk.chunks_exact(4) {
        let k = 255 - u16::from(px[3]);
        for &channel in &px[..3] {
            rgb.push(((255 - u16::from(channel)) * k / 255) as u8);
        }
    }
    rgb
}

use anyhow::{Context, Result, anyhow, bail};
use lopdf::{Dictionary, Document, Object, ObjectId, content::Content};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct PageContent {
    pub number: u32,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct PageImage {
    pub filename: String,
    pub page: u32,
    /// Left edge of the placed image.
    pub x: f64,
    /// Top edge in top-origin coordinates; ascending y is reading order.
    pub y: f64,
    /// False when the image exists in the page resources but is never drawn.
    pub has_rect: bool,
}

#[derive(Debug)]
pub struct Extraction {
    pub pages: Vec<PageContent>,
    pub images: Vec<PageImage>,
}

/// Walk every page of the document, collecting plain text and persisting
/// embedded images into `images_dir` under deterministic
/// `page<NN>_img<NN>.<ext>` names.
pub fn extract_document(input: &Path, images_dir: &Path) -> Result<Extraction> {
    let doc =
        Document::load(input).with_context(|| format!("opening PDF: {}", input.display()))?;

    let mut pages = Vec::new();
    let mut images = Vec::new();

    for (page_no, page_id) in doc.get_pages() {
        let text = match doc.extract_text(&[page_no]) {
            Ok(t) => t,
            Err(err) => {
                warn!("could not extract text on page {page_no}: {err}");
                String::new()
            }
        };

        let page_images = extract_page_images(&doc, page_id, page_no, images_dir);
        debug!(
            "page {page_no}: {} chars, {} images",
            text.len(),
            page_images.len()
        );
        images.extend(page_images);
        pages.push(PageContent {
            number: page_no,
            text,
        });
    }

    Ok(Extraction { pages, images })
}

fn extract_page_images(
    doc: &Document,
    page_id: ObjectId,
    page_no: u32,
    images_dir: &Path,
) -> Vec<PageImage> {
    let mut out = Vec::new();
    let Some(xobjects) = page_xobjects(doc, page_id) else {
        return out;
    };

    let placements = match image_placements(doc, page_id) {
        Ok(p) => p,
        Err(err) => {
            warn!("could not read content stream on page {page_no}: {err:#}");
            HashMap::new()
        }
    };
    let page_height = media_box_height(doc, page_id).unwrap_or(842.0);

    let mut idx = 0u32;
    for (name, obj) in xobjects.iter() {
        let Some(stream) = resolve(doc, obj).ok().and_then(|o| o.as_stream().ok()) else {
            continue;
        };
        if !is_image_subtype(&stream.dict) {
            continue;
        }
        idx += 1;

        match save_image(doc, stream, images_dir, page_no, idx) {
            Ok(filename) => {
                let (x, y, has_rect) = match placements.get(name.as_slice()) {
                    Some(r) => (r.x0, page_height - r.y1, true),
                    None => (0.0, 0.0, false),
                };
                out.push(PageImage {
                    filename,
                    page: page_no,
                    x,
                    y,
                    has_rect,
                });
            }
            Err(err) => warn!("could not extract image {idx} on page {page_no}: {err:#}"),
        }
    }

    out
}

fn is_image_subtype(dict: &Dictionary) -> bool {
    dict.get(b"Subtype")
        .and_then(|o| o.as_name())
        .map(|n| n == b"Image")
        .unwrap_or(false)
}

/// Axis-aligned bounds in PDF coordinates (origin bottom-left, y up).
#[derive(Debug, Clone, Copy)]
struct Rect {
    x0: f64,
    y1: f64,
}

#[derive(Debug, Clone, Copy)]
struct Matrix {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Matrix {
    fn identity() -> Self {
        Matrix {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    fn from_operands(ops: &[Object]) -> Option<Self> {
        if ops.len() < 6 {
            return None;
        }
        Some(Matrix {
            a: number(&ops[0])?,
            b: number(&ops[1])?,
            c: number(&ops[2])?,
            d: number(&ops[3])?,
            e: number(&ops[4])?,
            f: number(&ops[5])?,
        })
    }

    fn multiply(self, other: Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }
}

/// Map each XObject name to the bounds of its first placement, tracking the
/// CTM through q/Q/cm. An image XObject paints the unit square through the
/// CTM, so its corners give the placed rectangle.
fn image_placements(doc: &Document, page_id: ObjectId) -> Result<HashMap<Vec<u8>, Rect>> {
    let data = doc
        .get_page_content(page_id)
        .map_err(|e| anyhow!("page content: {e}"))?;
    let content = Content::decode(&data).map_err(|e| anyhow!("decoding content stream: {e}"))?;

    let mut stack = Vec::new();
    let mut ctm = Matrix::identity();
    let mut rects: HashMap<Vec<u8>, Rect> = HashMap::new();

    for op in &content.operations {
        match op.operator.as_str() {
            "q" => stack.push(ctm),
            "Q" => {
                if let Some(m) = stack.pop() {
                    ctm = m;
                }
            }
            "cm" => {
                if let Some(m) = Matrix::from_operands(&op.operands) {
                    ctm = m.multiply(ctm);
                }
            }
            "Do" => {
                if let Some(Object::Name(name)) = op.operands.first() {
                    rects
                        .entry(name.clone())
                        .or_insert_with(|| unit_square_bounds(ctm));
                }
            }
            _ => {}
        }
    }

    Ok(rects)
}

fn unit_square_bounds(m: Matrix) -> Rect {
    let corners = [
        m.apply(0.0, 0.0),
        m.apply(1.0, 0.0),
        m.apply(0.0, 1.0),
        m.apply(1.0, 1.0),
    ];
    let mut x0 = f64::INFINITY;
    let mut y1 = f64::NEG_INFINITY;
    for (x, y) in corners {
        x0 = x0.min(x);
        y1 = y1.max(y);
    }
    Rect { x0, y1 }
}

fn page_xobjects(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let page = doc.get_object(page_id).ok()?.as_dict().ok()?;
    let resources = inherited(doc, page, b"Resources")?;
    let resources = resolve(doc, resources).ok()?.as_dict().ok()?;
    let xobjects = resources.get(b"XObject").ok()?;
    resolve(doc, xobjects).ok()?.as_dict().ok()
}

/// Look up a page attribute, walking the Pages tree for inherited values.
fn inherited<'a>(doc: &'a Document, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut dict = page;
    for _ in 0..32 {
        if let Ok(obj) = dict.get(key) {
            return Some(obj);
        }
        let parent = dict.get(b"Parent").ok()?;
        dict = resolve(doc, parent).ok()?.as_dict().ok()?;
    }
    None
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object> {
    let mut obj = obj;
    for _ in 0..8 {
        match obj {
            Object::Reference(id) => {
                obj = doc
                    .get_object(*id)
                    .map_err(|e| anyhow!("dangling reference: {e}"))?;
            }
            other => return Ok(other),
        }
    }
    bail!("reference chain too deep");
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn media_box_height(doc: &Document, page_id: ObjectId) -> Option<f64> {
    let page = doc.get_object(page_id).ok()?.as_dict().ok()?;
    let mb = inherited(doc, page, b"MediaBox")?;
    let arr = resolve(doc, mb).ok()?.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let y0 = number(resolve(doc, &arr[1]).ok()?)?;
    let y1 = number(resolve(doc, &arr[3]).ok()?)?;
    Some(y1 - y0)
}

/// Persist one image XObject. DCTDecode streams are complete JPEG files and
/// are written as-is; FlateDecode rasters are re-encoded as PNG; JPXDecode
/// codestreams are written raw. Anything else is an error the caller logs
/// and skips.
fn save_image(
    doc: &Document,
    stream: &lopdf::Stream,
    images_dir: &Path,
    page_no: u32,
    idx: u32,
) -> Result<String> {
    let filters = image_filters(doc, &stream.dict)?;

    let (ext, raw): (&str, Option<&[u8]>) = match filters.as_slice() {
        [f] if f.as_str() == "DCTDecode" => ("jpg", Some(&stream.content)),
        [f] if f.as_str() == "JPXDecode" => ("jp2", Some(&stream.content)),
        [f] if f.as_str() == "FlateDecode" => ("png", None),
        [] => ("png", None),
        other => bail!("unsupported filter chain {:?}", other),
    };

    let filename = format!("page{page_no:02}_img{idx:02}.{ext}");
    let path = images_dir.join(&filename);

    match raw {
        Some(bytes) => {
            std::fs::write(&path, bytes)
                .with_context(|| format!("writing {}", path.display()))?;
        }
        None => {
            let data = if filters.is_empty() {
                stream.content.clone()
            } else {
                stream
                    .decompressed_content()
                    .map_err(|e| anyhow!("inflating image stream: {e}"))?
            };
            write_raster_png(doc, &stream.dict, &data, &path)?;
        }
    }

    Ok(filename)
}

fn image_filters(doc: &Document, dict: &Dictionary) -> Result<Vec<String>> {
    let Ok(obj) = dict.get(b"Filter") else {
        return Ok(Vec::new());
    };
    match resolve(doc, obj)? {
        Object::Name(n) => Ok(vec![String::from_utf8_lossy(n).into_owned()]),
        Object::Array(arr) => {
            let mut out = Vec::new();
            for entry in arr {
                let name = resolve(doc, entry)?
                    .as_name()
                    .map_err(|e| anyhow!("filter name: {e}"))?;
                out.push(String::from_utf8_lossy(name).into_owned());
            }
            Ok(out)
        }
        other => bail!("unexpected Filter object: {:?}", other),
    }
}

fn write_raster_png(
    doc: &Document,
    dict: &Dictionary,
    data: &[u8],
    path: &Path,
) -> Result<()> {
    let width = dict_u32(doc, dict, b"Width")?;
    let height = dict_u32(doc, dict, b"Height")?;
    let bits = dict_u32(doc, dict, b"BitsPerComponent").unwrap_or(8);
    if bits != 8 {
        bail!("unsupported bit depth {bits}");
    }

    let components = color_components(doc, dict)?;
    let expected = width as usize * height as usize * components as usize;
    if data.len() < expected {
        bail!(
            "raster data too short: {} bytes for {width}x{height}x{components}",
            data.len()
        );
    }

    let color = match components {
        1 => image::ExtendedColorType::L8,
        3 => image::ExtendedColorType::Rgb8,
        n => bail!("unsupported component count {n}"),
    };
    image::save_buffer(path, &data[..expected], width, height, color)
        .with_context(|| format!("encoding {}", path.display()))
}

fn dict_u32(doc: &Document, dict: &Dictionary, key: &[u8]) -> Result<u32> {
    let obj = dict
        .get(key)
        .map_err(|_| anyhow!("missing {}", String::from_utf8_lossy(key)))?;
    number(resolve(doc, obj)?)
        .map(|n| n as u32)
        .ok_or_else(|| anyhow!("non-numeric {}", String::from_utf8_lossy(key)))
}

fn color_components(doc: &Document, dict: &Dictionary) -> Result<u8> {
    let obj = dict
        .get(b"ColorSpace")
        .map_err(|_| anyhow!("missing ColorSpace"))?;
    match resolve(doc, obj)? {
        Object::Name(n) if n == b"DeviceRGB" => Ok(3),
        Object::Name(n) if n == b"DeviceGray" => Ok(1),
        Object::Array(arr) => {
            let family = arr
                .first()
                .and_then(|o| resolve(doc, o).ok())
                .and_then(|o| o.as_name().ok());
            if family == Some(b"ICCBased".as_slice()) {
                let icc = arr
                    .get(1)
                    .and_then(|o| resolve(doc, o).ok())
                    .and_then(|o| o.as_stream().ok())
                    .ok_or_else(|| anyhow!("malformed ICCBased colorspace"))?;
                return match dict_u32(doc, &icc.dict, b"N")? {
                    1 => Ok(1),
                    3 => Ok(3),
                    n => bail!("unsupported ICC component count {n}"),
                };
            }
            bail!("unsupported colorspace family");
        }
        other => bail!("unexpected ColorSpace object: {:?}", other),
    }
}

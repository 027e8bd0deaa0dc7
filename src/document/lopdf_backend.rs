//! `lopdf`-backed document access.
//!
//! Rasters are stamped as image XObjects: RGB samples in a Flate-compressed
//! DeviceRGB stream, alpha in a DeviceGray soft mask. Each distinct raster
//! is embedded once and referenced from every placement. Placements are
//! buffered per page and written on save as one content stream per page,
//! with the existing content wrapped in `q`/`Q` so its graphics state
//! cannot leak into the stamps.

use super::raster::{default_rasterizer, PageRasterizer};
use super::{ColorMode, PageRect, PdfBackend, PdfDocument};
use crate::constants::{DEFAULT_PAGE_SIZE, IMAGE_RESOURCE_PREFIX, MAX_PAGE_TREE_DEPTH};
use crate::watermark::WatermarkError;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{DynamicImage, RgbaImage};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::{OpenOptions, Permissions};
use std::hash::{Hash, Hasher};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Opens PDF files with `lopdf`.
#[derive(Clone)]
pub struct LopdfBackend {
    rasterizer: Arc<dyn PageRasterizer>,
}

impl LopdfBackend {
    pub fn new() -> Self {
        Self::with_rasterizer(default_rasterizer())
    }

    pub fn with_rasterizer(rasterizer: Arc<dyn PageRasterizer>) -> Self {
        Self { rasterizer }
    }
}

impl Default for LopdfBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LopdfBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LopdfBackend").finish_non_exhaustive()
    }
}

impl PdfBackend for LopdfBackend {
    type Document = LopdfDocument;

    fn open(&self, path: &Path) -> Result<LopdfDocument, WatermarkError> {
        if !path.is_file() {
            return Err(WatermarkError::open(path, "file not found"));
        }

        let doc = Document::load(path).map_err(|e| WatermarkError::open(path, e))?;
        if doc.is_encrypted() {
            return Err(WatermarkError::open(path, "document is encrypted"));
        }

        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        let reserved_names = existing_xobject_names(&doc, &pages);

        tracing::debug!(
            path = %path.display(),
            pages = pages.len(),
            xobjects = reserved_names.len(),
            "Opened document"
        );

        Ok(LopdfDocument {
            source: path.to_path_buf(),
            doc,
            pages,
            rasterizer: Arc::clone(&self.rasterizer),
            images: RasterCache::default(),
            reserved_names,
            next_image: 0,
            stamps: BTreeMap::new(),
        })
    }
}

/// An embedded raster and its resource name.
#[derive(Debug, Clone)]
struct EmbeddedImage {
    id: ObjectId,
    name: String,
}

/// Embedded rasters, looked up by content.
///
/// The hash only selects a bucket; a hit also requires identical pixels.
#[derive(Debug, Default)]
struct RasterCache {
    buckets: HashMap<u64, Vec<(RgbaImage, EmbeddedImage)>>,
    len: usize,
}

impl RasterCache {
    fn get(&self, key: u64, raster: &RgbaImage) -> Option<&EmbeddedImage> {
        self.buckets
            .get(&key)?
            .iter()
            .find(|(stored, _)| stored == raster)
            .map(|(_, image)| image)
    }

    fn insert(&mut self, key: u64, raster: &RgbaImage, image: EmbeddedImage) {
        self.buckets
            .entry(key)
            .or_default()
            .push((raster.clone(), image));
        self.len += 1;
    }

    fn len(&self) -> usize {
        self.len
    }
}

/// Placements buffered for one page.
#[derive(Debug, Default)]
struct PageStamps {
    content: Vec<u8>,
    xobjects: BTreeMap<String, ObjectId>,
}

/// A PDF document opened with [`LopdfBackend`].
pub struct LopdfDocument {
    source: PathBuf,
    doc: Document,
    pages: Vec<ObjectId>,
    rasterizer: Arc<dyn PageRasterizer>,
    images: RasterCache,
    /// XObject names already used by the pages of the source document
    reserved_names: HashSet<Vec<u8>>,
    next_image: usize,
    stamps: BTreeMap<usize, PageStamps>,
}

impl std::fmt::Debug for LopdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LopdfDocument")
            .field("source", &self.source)
            .field("pages", &self.pages.len())
            .field("images", &self.images.len())
            .finish_non_exhaustive()
    }
}

impl LopdfDocument {
    /// Number of distinct rasters embedded so far.
    pub fn embedded_image_count(&self) -> usize {
        self.images.len()
    }

    fn page_id(&self, index: usize) -> Result<ObjectId, WatermarkError> {
        self.pages
            .get(index)
            .copied()
            .ok_or(WatermarkError::PageOutOfRange {
                index,
                count: self.pages.len(),
            })
    }

    /// Visible page box `[x0, y0, x1, y1]`: CropBox, else MediaBox, else Letter.
    fn page_box(&self, index: usize) -> Result<[f32; 4], WatermarkError> {
        let page_id = self.page_id(index)?;
        let rect = inherited_attribute(&self.doc, page_id, b"CropBox")
            .and_then(|obj| parse_rect(&self.doc, obj))
            .or_else(|| {
                inherited_attribute(&self.doc, page_id, b"MediaBox")
                    .and_then(|obj| parse_rect(&self.doc, obj))
            })
            .unwrap_or([0.0, 0.0, DEFAULT_PAGE_SIZE.0, DEFAULT_PAGE_SIZE.1]);
        Ok(rect)
    }

    /// Next image resource name not already used by any page.
    fn next_image_name(&mut self) -> String {
        loop {
            self.next_image += 1;
            let name = format!("{}{}", IMAGE_RESOURCE_PREFIX, self.next_image);
            if !self.reserved_names.contains(name.as_bytes()) {
                return name;
            }
        }
    }

    fn embed_raster(&mut self, raster: &RgbaImage) -> Result<EmbeddedImage, WatermarkError> {
        let key = raster_key(raster);
        if let Some(image) = self.images.get(key, raster) {
            return Ok(image.clone());
        }

        let (width, height) = raster.dimensions();
        let pixel_count = (width as usize) * (height as usize);
        let mut rgb = Vec::with_capacity(pixel_count * 3);
        let mut alpha = Vec::with_capacity(pixel_count);
        for pixel in raster.pixels() {
            rgb.extend_from_slice(&pixel.0[..3]);
            alpha.push(pixel[3]);
        }

        let mut image_dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        };

        // Fully opaque rasters need no soft mask
        if alpha.iter().any(|&a| a != 255) {
            let mask = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width,
                    "Height" => height,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                    "Filter" => "FlateDecode",
                },
                deflate(&alpha)?,
            );
            let mask_id = self.doc.add_object(mask);
            image_dict.set("SMask", Object::Reference(mask_id));
        }

        let id = self.doc.add_object(Stream::new(image_dict, deflate(&rgb)?));
        let image = EmbeddedImage {
            id,
            name: self.next_image_name(),
        };

        tracing::debug!(
            name = %image.name,
            width,
            height,
            "Embedded raster as image XObject"
        );

        self.images.insert(key, raster, image.clone());
        Ok(image)
    }

    /// Write buffered placements into the page dictionaries.
    fn flush_stamps(&mut self) -> Result<(), WatermarkError> {
        let stamps = std::mem::take(&mut self.stamps);

        for (index, stamp) in stamps {
            let page_id = self.page_id(index)?;

            let mut resources = inherited_attribute(&self.doc, page_id, b"Resources")
                .and_then(|obj| resolve_dict(&self.doc, obj))
                .unwrap_or_default();
            let mut xobjects = resources
                .get(b"XObject")
                .ok()
                .and_then(|obj| resolve_dict(&self.doc, obj))
                .unwrap_or_default();
            for (name, id) in &stamp.xobjects {
                xobjects.set(name.as_bytes().to_vec(), Object::Reference(*id));
            }
            resources.set("XObject", Object::Dictionary(xobjects));

            let save_id = self.doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
            let mut stamp_content = b"\nQ\n".to_vec();
            stamp_content.extend_from_slice(&stamp.content);
            let stamp_id = self.doc.add_object(Stream::new(Dictionary::new(), stamp_content));
            let existing = page_contents(&self.doc, page_id);

            let page = self
                .doc
                .get_object_mut(page_id)
                .and_then(Object::as_dict_mut)
                .map_err(|e| WatermarkError::Render(format!("page {} is malformed: {}", index, e)))?;

            let mut contents = vec![Object::Reference(save_id)];
            contents.extend(existing);
            contents.push(Object::Reference(stamp_id));

            page.set("Contents", Object::Array(contents));
            page.set("Resources", Object::Dictionary(resources));
        }

        Ok(())
    }
}

impl PdfDocument for LopdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_dimensions(&self, index: usize) -> Result<(f32, f32), WatermarkError> {
        let [x0, y0, x1, y1] = self.page_box(index)?;
        Ok((x1 - x0, y1 - y0))
    }

    fn render_page(&self, index: usize, mode: ColorMode) -> Result<DynamicImage, WatermarkError> {
        self.page_id(index)?;
        self.rasterizer.render(&self.source, index, mode)
    }

    fn insert_raster(
        &mut self,
        index: usize,
        rect: PageRect,
        raster: &RgbaImage,
    ) -> Result<(), WatermarkError> {
        let [bx0, _, _, by1] = self.page_box(index)?;
        let image = self.embed_raster(raster)?;

        // Top-left page units to PDF user space (bottom-left origin)
        let x = bx0 + rect.x0;
        let y = by1 - rect.y1;

        let stamp = self.stamps.entry(index).or_default();
        let op = format!(
            "q {} 0 0 {} {} {} cm /{} Do Q\n",
            rect.width(),
            rect.height(),
            x,
            y,
            image.name
        );
        stamp.content.extend_from_slice(op.as_bytes());
        stamp.xobjects.insert(image.name, image.id);

        Ok(())
    }

    fn save(&mut self, destination: &Path) -> Result<(), WatermarkError> {
        let permissions = check_destination(destination)?;
        self.flush_stamps()?;

        let dir = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| WatermarkError::write(destination, e))?;
        if let Some(permissions) = permissions {
            temp.as_file()
                .set_permissions(permissions)
                .map_err(|e| WatermarkError::write(destination, e))?;
        }

        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            self.doc
                .save_to(&mut writer)
                .map_err(|e| WatermarkError::write(destination, e))?;
            writer
                .flush()
                .map_err(|e| WatermarkError::write(destination, e))?;
        }

        // The temporary file is removed on drop if persisting fails
        temp.persist(destination)
            .map_err(|e| WatermarkError::write(destination, e.error))?;

        tracing::debug!(path = %destination.display(), "Saved document");
        Ok(())
    }
}

/// Make sure an existing destination may be replaced.
///
/// Returns the permissions the new file should carry: those of the file it
/// replaces, or the default output mode for a new file.
fn check_destination(destination: &Path) -> Result<Option<Permissions>, WatermarkError> {
    let metadata = match std::fs::metadata(destination) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(new_file_permissions()),
        Err(e) => return Err(WatermarkError::write(destination, e)),
    };

    // Read-only bits count even for users allowed to bypass them
    if metadata.permissions().readonly() {
        return Err(WatermarkError::write(destination, "destination is read-only"));
    }
    OpenOptions::new()
        .write(true)
        .open(destination)
        .map_err(|e| WatermarkError::write(destination, e))?;

    Ok(Some(metadata.permissions()))
}

#[cfg(unix)]
fn new_file_permissions() -> Option<Permissions> {
    use crate::constants::OUTPUT_FILE_MODE;
    use std::os::unix::fs::PermissionsExt;

    Some(Permissions::from_mode(OUTPUT_FILE_MODE))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<Permissions> {
    None
}

/// Content hash selecting the cache bucket of a raster.
fn raster_key(raster: &RgbaImage) -> u64 {
    let mut hasher = DefaultHasher::new();
    raster.dimensions().hash(&mut hasher);
    raster.as_raw().hash(&mut hasher);
    hasher.finish()
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, WatermarkError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| WatermarkError::Encode(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| WatermarkError::Encode(e.to_string()))
}

/// Names of all XObjects visible from the given pages, inherited ones included.
fn existing_xobject_names(doc: &Document, pages: &[ObjectId]) -> HashSet<Vec<u8>> {
    let mut names = HashSet::new();
    for page_id in pages {
        let xobjects = inherited_attribute(doc, *page_id, b"Resources")
            .and_then(|obj| resolve_dict(doc, obj))
            .and_then(|resources| {
                let xobjects = resources.get(b"XObject").ok()?;
                resolve_dict(doc, xobjects)
            });
        if let Some(xobjects) = xobjects {
            names.extend(xobjects.iter().map(|(name, _)| name.clone()));
        }
    }
    names
}

/// Content stream references of a page, with an indirect array flattened.
fn page_contents(doc: &Document, page_id: ObjectId) -> Vec<Object> {
    let Ok(page) = doc.get_object(page_id).and_then(Object::as_dict) else {
        return Vec::new();
    };

    match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

/// Look up a page attribute, following `Parent` links for inherited values.
fn inherited_attribute<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = doc.get_object(page_id).and_then(Object::as_dict).ok()?;

    for _ in 0..MAX_PAGE_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        let parent_id = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_object(parent_id).and_then(Object::as_dict).ok()?;
    }

    None
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn resolve_dict(doc: &Document, obj: &Object) -> Option<Dictionary> {
    resolve(doc, obj)?.as_dict().ok().cloned()
}

fn number(doc: &Document, obj: &Object) -> Option<f32> {
    match resolve(doc, obj)? {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Parse a rectangle array, normalised so that `x0 <= x1` and `y0 <= y1`.
fn parse_rect(doc: &Document, obj: &Object) -> Option<[f32; 4]> {
    let array = resolve(doc, obj)?.as_array().ok()?;
    if array.len() != 4 {
        return None;
    }

    let values: Vec<f32> = array.iter().filter_map(|o| number(doc, o)).collect();
    let [a, b, c, d] = <[f32; 4]>::try_from(values).ok()?;

    let rect = [a.min(c), b.min(d), a.max(c), b.max(d)];
    (rect[2] > rect[0] && rect[3] > rect[1]).then_some(rect)
}

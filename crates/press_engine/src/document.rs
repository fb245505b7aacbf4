use std::path::Path;

use image::DynamicImage;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::recode::{EncodedImage, StreamFilter};
use crate::types::TransformError;

/// Handle to one embedded raster image on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle {
    /// Resource name the page content refers to the image by.
    pub name: String,
    /// Backing object id; opaque to callers.
    pub id: (u32, u16),
}

/// The document capability the transform stage needs: enumerate pages,
/// enumerate raster images per page, decode one to pixels, and
/// replace/remove/save.
pub trait DocumentEditor: Send {
    fn page_count(&self) -> usize;
    /// Raster images on a page, in native enumeration order.
    fn page_images(&self, page_index: usize) -> Result<Vec<ImageHandle>, TransformError>;
    fn load_pixels(&self, handle: &ImageHandle) -> Result<DynamicImage, TransformError>;
    fn replace_image(
        &mut self,
        handle: &ImageHandle,
        encoded: &EncodedImage,
    ) -> Result<(), TransformError>;
    fn remove_image(
        &mut self,
        page_index: usize,
        handle: &ImageHandle,
    ) -> Result<(), TransformError>;
    /// Persist the rewritten document. Returns the bytes written.
    fn save(&mut self, path: &Path) -> Result<u64, TransformError>;
}

/// Opens a downloaded document for editing.
pub trait DocumentOpener: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn DocumentEditor>, TransformError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfOpener;

impl DocumentOpener for LopdfOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn DocumentEditor>, TransformError> {
        Ok(Box::new(LopdfEditor::open(path)?))
    }
}

pub struct LopdfEditor {
    doc: Document,
    pages: Vec<ObjectId>,
}

impl LopdfEditor {
    pub fn open(path: &Path) -> Result<Self, TransformError> {
        let doc = Document::load(path).map_err(doc_err)?;
        let pages = doc.get_pages().into_values().collect();
        Ok(Self { doc, pages })
    }

    fn page_id(&self, page_index: usize) -> Result<ObjectId, TransformError> {
        self.pages
            .get(page_index)
            .copied()
            .ok_or_else(|| TransformError::Document(format!("page {page_index} out of range")))
    }

    fn resolved<'a>(&'a self, object: &'a Object) -> Result<&'a Object, TransformError> {
        match object.as_reference() {
            Ok(id) => self.doc.get_object(id).map_err(doc_err),
            Err(_) => Ok(object),
        }
    }

    /// Named XObject entries reachable from the page's own resources.
    fn xobject_entries(&self, page_index: usize) -> Result<Vec<(String, ObjectId)>, TransformError> {
        let page_id = self.page_id(page_index)?;
        let page = self.doc.get_dictionary(page_id).map_err(doc_err)?;
        let Ok(resources) = page.get(b"Resources") else {
            return Ok(Vec::new());
        };
        let resources = self.resolved(resources)?.as_dict().map_err(doc_err)?;
        let Ok(xobjects) = resources.get(b"XObject") else {
            return Ok(Vec::new());
        };
        let xobjects = self.resolved(xobjects)?.as_dict().map_err(doc_err)?;

        let mut entries = Vec::new();
        for (name, object) in xobjects.iter() {
            if let Ok(id) = object.as_reference() {
                entries.push((String::from_utf8_lossy(name).into_owned(), id));
            }
        }
        Ok(entries)
    }

    fn raw_to_image(
        &self,
        dict: &Dictionary,
        data: Vec<u8>,
        handle: &ImageHandle,
    ) -> Result<DynamicImage, TransformError> {
        let width = dict_u32(dict, b"Width");
        let height = dict_u32(dict, b"Height");
        let bits = dict.get(b"BitsPerComponent").ok().and_then(|o| o.as_i64().ok());
        if bits != Some(8) {
            return Err(TransformError::UnsupportedImage {
                name: handle.name.clone(),
                detail: format!("bits per component {bits:?}"),
            });
        }

        let colorspace = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|object| self.resolved(object).ok())
            .and_then(|object| object.as_name().ok())
            .map(<[u8]>::to_vec);
        match colorspace.as_deref() {
            Some(b"DeviceRGB") => image::RgbImage::from_raw(width, height, data)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| TransformError::Decode("rgb sample buffer size mismatch".into())),
            Some(b"DeviceGray") => image::GrayImage::from_raw(width, height, data)
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(|| TransformError::Decode("gray sample buffer size mismatch".into())),
            other => Err(TransformError::UnsupportedImage {
                name: handle.name.clone(),
                detail: format!(
                    "color space {:?}",
                    other.map(String::from_utf8_lossy)
                ),
            }),
        }
    }
}

impl DocumentEditor for LopdfEditor {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_images(&self, page_index: usize) -> Result<Vec<ImageHandle>, TransformError> {
        let mut handles = Vec::new();
        for (name, id) in self.xobject_entries(page_index)? {
            let Ok(object) = self.doc.get_object(id) else {
                continue;
            };
            let Ok(stream) = object.as_stream() else {
                continue;
            };
            let is_image = stream
                .dict
                .get(b"Subtype")
                .ok()
                .and_then(|o| o.as_name().ok())
                == Some(b"Image".as_slice());
            if is_image {
                handles.push(ImageHandle { name, id });
            }
        }
        Ok(handles)
    }

    fn load_pixels(&self, handle: &ImageHandle) -> Result<DynamicImage, TransformError> {
        let stream = self
            .doc
            .get_object(handle.id)
            .map_err(doc_err)?
            .as_stream()
            .map_err(doc_err)?;

        match primary_filter(&stream.dict).as_deref() {
            Some(b"DCTDecode") => image::load_from_memory(&stream.content)
                .map_err(|err| TransformError::Decode(err.to_string())),
            Some(b"FlateDecode") => {
                let data = stream.decompressed_content().map_err(doc_err)?;
                self.raw_to_image(&stream.dict, data, handle)
            }
            None => self.raw_to_image(&stream.dict, stream.content.clone(), handle),
            Some(other) => Err(TransformError::UnsupportedImage {
                name: handle.name.clone(),
                detail: format!("filter {}", String::from_utf8_lossy(other)),
            }),
        }
    }

    fn replace_image(
        &mut self,
        handle: &ImageHandle,
        encoded: &EncodedImage,
    ) -> Result<(), TransformError> {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", Object::Integer(i64::from(encoded.width)));
        dict.set("Height", Object::Integer(i64::from(encoded.height)));
        dict.set(
            "ColorSpace",
            Object::Name(if encoded.grayscale {
                b"DeviceGray".to_vec()
            } else {
                b"DeviceRGB".to_vec()
            }),
        );
        dict.set("BitsPerComponent", Object::Integer(8));
        dict.set(
            "Filter",
            Object::Name(match encoded.filter {
                StreamFilter::Dct => b"DCTDecode".to_vec(),
                StreamFilter::Flate => b"FlateDecode".to_vec(),
            }),
        );
        self.doc
            .objects
            .insert(handle.id, Object::Stream(Stream::new(dict, encoded.data.clone())));
        Ok(())
    }

    fn remove_image(
        &mut self,
        page_index: usize,
        handle: &ImageHandle,
    ) -> Result<(), TransformError> {
        let page_id = self.page_id(page_index)?;

        // The XObject map may be its own object, or sit inline in the
        // resources, which may themselves be inline in the page dictionary.
        let (resources_ref, xobject_ref) = {
            let page = self.doc.get_dictionary(page_id).map_err(doc_err)?;
            let resources_obj = page.get(b"Resources").map_err(doc_err)?;
            let resources_ref = resources_obj.as_reference().ok();
            let resources = match resources_ref {
                Some(id) => self
                    .doc
                    .get_object(id)
                    .map_err(doc_err)?
                    .as_dict()
                    .map_err(doc_err)?,
                None => resources_obj.as_dict().map_err(doc_err)?,
            };
            let xobject_ref = resources
                .get(b"XObject")
                .ok()
                .and_then(|object| object.as_reference().ok());
            (resources_ref, xobject_ref)
        };

        let container: &mut Dictionary = if let Some(id) = xobject_ref {
            self.doc
                .get_object_mut(id)
                .map_err(doc_err)?
                .as_dict_mut()
                .map_err(doc_err)?
        } else {
            let holder: &mut Dictionary = match resources_ref {
                Some(id) => self
                    .doc
                    .get_object_mut(id)
                    .map_err(doc_err)?
                    .as_dict_mut()
                    .map_err(doc_err)?,
                None => self
                    .doc
                    .get_object_mut(page_id)
                    .map_err(doc_err)?
                    .as_dict_mut()
                    .map_err(doc_err)?
                    .get_mut(b"Resources")
                    .map_err(doc_err)?
                    .as_dict_mut()
                    .map_err(doc_err)?,
            };
            holder
                .get_mut(b"XObject")
                .map_err(doc_err)?
                .as_dict_mut()
                .map_err(doc_err)?
        };
        container.remove(handle.name.as_bytes());

        self.doc.objects.remove(&handle.id);
        Ok(())
    }

    fn save(&mut self, path: &Path) -> Result<u64, TransformError> {
        self.doc.save(path).map_err(doc_err)?;
        Ok(std::fs::metadata(path)?.len())
    }
}

fn primary_filter(dict: &Dictionary) -> Option<Vec<u8>> {
    match dict.get(b"Filter").ok()? {
        Object::Name(name) => Some(name.clone()),
        Object::Array(items) => items
            .first()
            .and_then(|object| object.as_name().ok())
            .map(<[u8]>::to_vec),
        _ => None,
    }
}

fn dict_u32(dict: &Dictionary, key: &[u8]) -> u32 {
    dict.get(key)
        .ok()
        .and_then(|object| object.as_i64().ok())
        .and_then(|value| u32::try_from(value).ok())
        .unwrap_or(0)
}

fn doc_err(err: impl std::fmt::Display) -> TransformError {
    TransformError::Document(err.to_string())
}

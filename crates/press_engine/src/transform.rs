use std::path::Path;

use press_core::JobConfig;

use crate::document::DocumentEditor;
use crate::progress::JobReporter;
use crate::recode::recode;
use crate::types::TransformError;

/// What the page-by-page rewrite did to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutcome {
    pub pages: usize,
    pub images_rewritten: usize,
    pub images_removed: usize,
    pub output_bytes: u64,
}

/// Rewrite every embedded raster image per the job policy and persist the
/// document to `output_path`.
///
/// Pages are visited in document order, images per page in native
/// enumeration order. Quality 0 removes an image instead of recompressing
/// it. One progress emission fires per completed page, at
/// `50 + 50 * pages_done / total_pages`.
pub fn rewrite_images(
    editor: &mut dyn DocumentEditor,
    config: &JobConfig,
    output_path: &Path,
    report: &mut JobReporter,
) -> Result<TransformOutcome, TransformError> {
    let total_pages = editor.page_count();
    let mut images_rewritten = 0;
    let mut images_removed = 0;

    for page_index in 0..total_pages {
        for handle in editor.page_images(page_index)? {
            if config.quality == 0 {
                editor.remove_image(page_index, &handle)?;
                images_removed += 1;
            } else {
                let pixels = editor.load_pixels(&handle)?;
                let encoded = recode(pixels, config)?;
                editor.replace_image(&handle, &encoded)?;
                images_rewritten += 1;
            }
        }
        report.converting(50.0 + 50.0 * (page_index + 1) as f64 / total_pages as f64);
    }

    let output_bytes = editor.save(output_path)?;
    Ok(TransformOutcome {
        pages: total_pages,
        images_rewritten,
        images_removed,
        output_bytes,
    })
}

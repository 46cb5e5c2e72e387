//! Page Rasterizer: document bytes → ordered, normalized page images.
//!
//! Pages are written as PNG files into a per-invocation scratch directory
//! owned by [`RasterizedDocument`]. Dropping the document removes them,
//! whichever way the pipeline exits.

use std::path::PathBuf;

use image::DynamicImage;
use tempfile::TempDir;
use tracing::{debug, info};

use super::pdfium::DEFAULT_RENDER_DPI;
use super::preprocess::{self, MAX_IMAGE_BYTES};
use super::types::{Document, DocumentKind, PageImage, PdfPageRenderer};
use super::ConversionError;

/// Normalized pages of one document plus the scratch directory holding them.
#[derive(Debug)]
pub struct RasterizedDocument {
    workdir: TempDir,
    pages: Vec<PageImage>,
}

impl RasterizedDocument {
    /// Pages in source order. Never empty.
    pub fn pages(&self) -> &[PageImage] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn workdir(&self) -> &std::path::Path {
        self.workdir.path()
    }
}

pub struct PageRasterizer {
    renderer: Option<Box<dyn PdfPageRenderer>>,
    dpi: u32,
    work_root: Option<PathBuf>,
}

impl PageRasterizer {
    /// `renderer` is `None` when PDFium could not be loaded; raster inputs still work.
    pub fn new(renderer: Option<Box<dyn PdfPageRenderer>>) -> Self {
        Self {
            renderer,
            dpi: DEFAULT_RENDER_DPI,
            work_root: None,
        }
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Create scratch directories under `root` instead of the system temp dir.
    pub fn with_work_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.work_root = Some(root.into());
        self
    }

    pub fn rasterize(&self, document: &Document) -> Result<RasterizedDocument, ConversionError> {
        let kind = document.kind()?;
        if document.bytes.is_empty() {
            return Err(ConversionError::EmptyDocument);
        }
        if document.bytes.len() > MAX_IMAGE_BYTES {
            return Err(ConversionError::TooLarge {
                limit_mb: MAX_IMAGE_BYTES / (1024 * 1024),
            });
        }

        let workdir = self.scratch_dir()?;
        let mut pages = Vec::new();

        match kind {
            DocumentKind::Raster => {
                let normalized = preprocess::normalize_raster_bytes(&document.bytes)?;
                pages.push(store_page(&workdir, 0, &normalized)?);
            }
            DocumentKind::Pdf => {
                let renderer = self.renderer.as_deref().ok_or_else(|| {
                    ConversionError::RendererUnavailable("PDFium is not loaded".into())
                })?;
                let count = renderer.page_count(&document.bytes)?;
                if count == 0 {
                    return Err(ConversionError::EmptyDocument);
                }
                for index in 0..count {
                    let rendered = renderer.render_page(&document.bytes, index, self.dpi)?;
                    pages.push(normalize_and_store(&workdir, index, &rendered)?);
                }
            }
        }

        info!(
            kind = ?kind,
            pages = pages.len(),
            dpi = self.dpi,
            "Document rasterized"
        );

        Ok(RasterizedDocument { workdir, pages })
    }

    fn scratch_dir(&self) -> Result<TempDir, ConversionError> {
        let builder = {
            let mut b = tempfile::Builder::new();
            b.prefix("lease-ingest-");
            b
        };
        let dir = match &self.work_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        Ok(dir)
    }
}

fn normalize_and_store(
    workdir: &TempDir,
    index: usize,
    rendered: &DynamicImage,
) -> Result<PageImage, ConversionError> {
    let normalized = preprocess::normalize_page(rendered);
    store_page(workdir, index, &normalized)
}

fn store_page(
    workdir: &TempDir,
    index: usize,
    page: &image::GrayImage,
) -> Result<PageImage, ConversionError> {
    let png = preprocess::encode_png(page)?;
    let path = workdir.path().join(format!("page-{:04}.png", index + 1));
    std::fs::write(&path, &png)?;
    debug!(page = index + 1, bytes = png.len(), "Stored normalized page");
    Ok(PageImage {
        index,
        path,
        width: page.width(),
        height: page.height(),
    })
}

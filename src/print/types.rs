//! Print artifacts

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::ImageEncoder;
use image::codecs::png::PngEncoder;

use super::canvas::Canvas;
use super::notes::NotesPage;

/// Final image of one printed page
#[derive(Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// Page number (1-indexed)
    pub page_number: usize,
    pub width_px: u32,
    pub height_px: u32,
    /// PNG-encoded page image
    pub png: Vec<u8>,
}

impl RenderedPage {
    /// Encode a finished canvas
    pub fn from_canvas(page_number: usize, canvas: &Canvas) -> Result<Self, String> {
        let (width, height) = (canvas.width(), canvas.height());
        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(
                canvas.image.as_raw(),
                width,
                height,
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|err| err.to_string())?;

        Ok(Self {
            page_number,
            width_px: width,
            height_px: height,
            png,
        })
    }

    /// `data:` URL of the page image
    #[must_use]
    pub fn data_url(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.png))
    }
}

impl std::fmt::Debug for RenderedPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedPage")
            .field("page_number", &self.page_number)
            .field("width_px", &self.width_px)
            .field("height_px", &self.height_px)
            .field("png_len", &self.png.len())
            .finish()
    }
}

/// One item of the print document, in print order
#[derive(Clone, Debug)]
pub enum PrintArtifact {
    Page(RenderedPage),
    Notes(NotesPage),
}

impl PrintArtifact {
    /// Page the artifact belongs to
    #[must_use]
    pub fn page_number(&self) -> usize {
        match self {
            PrintArtifact::Page(page) => page.page_number,
            PrintArtifact::Notes(notes) => notes.page_number,
        }
    }

    #[must_use]
    pub fn is_notes(&self) -> bool {
        matches!(self, PrintArtifact::Notes(_))
    }
}

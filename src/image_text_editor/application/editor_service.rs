use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use image::RgbaImage;
use serde::Serialize;
use tokio::sync::Mutex;

use super::compositor::{compose, Scene};
use super::error::ApplicationError;
use crate::domain::bitmap::Bitmap;
use crate::domain::canvas::CanvasSize;
use crate::domain::error::DomainError;
use crate::domain::image_decoder_trait::ImageDecoder;
use crate::domain::overlay_style::{OverlayPatch, OverlaySlot, OverlayStyle};
use crate::infrastructure::font_book::FontBook;
use crate::infrastructure::image_decoder::RawUpload;
use crate::infrastructure::png_exporter::{encode_png, export_file_name};
use crate::infrastructure::raster_surface::RasterSurface;

/// The editable document: two overlay slots and at most one bitmap.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    pub title: OverlayStyle,
    pub content: OverlayStyle,
    pub bitmap: Option<Arc<Bitmap>>,
}

impl EditorState {
    pub fn initial() -> Self {
        Self {
            title: OverlayStyle::default_title(),
            content: OverlayStyle::default_content(),
            bitmap: None,
        }
    }

    fn scene(&self, canvas: CanvasSize) -> Scene<'_> {
        Scene {
            canvas,
            bitmap: self.bitmap.as_deref(),
            title: &self.title,
            content: &self.content,
        }
    }

    fn overlay_mut(&mut self, slot: OverlaySlot) -> &mut OverlayStyle {
        match slot {
            OverlaySlot::Title => &mut self.title,
            OverlaySlot::Content => &mut self.content,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditorSnapshot {
    pub canvas: CanvasSize,
    pub title: OverlayStyle,
    pub content: OverlayStyle,
    pub image: Option<ImageInfo>,
    pub image_loaded: bool,
    pub export_enabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

// State and the frame rendered from it always change together
struct Committed {
    state: EditorState,
    frame: Arc<RgbaImage>,
}

pub struct EditorService {
    canvas: CanvasSize,
    fonts: Arc<FontBook>,
    image_decoder: Arc<dyn ImageDecoder + Send + Sync>,
    current: Mutex<Committed>,
    upload_seq: AtomicU64,
}

impl EditorService {
    pub fn new(
        canvas: CanvasSize,
        fonts: Arc<FontBook>,
        image_decoder: Arc<dyn ImageDecoder + Send + Sync>,
    ) -> Result<Self, ApplicationError> {
        let state = EditorState::initial();
        let frame = render(canvas, &fonts, &state)?;
        Ok(Self {
            canvas,
            fonts,
            image_decoder,
            current: Mutex::new(Committed { state, frame: Arc::new(frame) }),
            upload_seq: AtomicU64::new(0),
        })
    }

    pub async fn snapshot(&self) -> EditorSnapshot {
        let current = self.current.lock().await;
        let state = &current.state;
        let image = state
            .bitmap
            .as_ref()
            .map(|b| ImageInfo { width: b.width(), height: b.height() });
        EditorSnapshot {
            canvas: self.canvas,
            title: state.title.clone(),
            content: state.content.clone(),
            image,
            image_loaded: image.is_some(),
            export_enabled: image.is_some(),
        }
    }

    pub async fn update_overlay(
        &self,
        slot: OverlaySlot,
        patch: OverlayPatch,
    ) -> Result<OverlayStyle, ApplicationError> {
        let mut current = self.current.lock().await;
        let mut next = current.state.clone();
        let style = next.overlay_mut(slot);
        *style = style.apply(&patch, self.canvas);
        let updated = style.clone();

        self.commit(&mut current, next).await?;
        tracing::debug!(
            %slot,
            font = %updated.css_font(),
            x = updated.x,
            y = updated.y,
            "Overlay updated"
        );
        Ok(updated)
    }

    /// Decodes an upload off the async runtime and swaps it in as the bitmap.
    /// Overlapping uploads are not cancelled: whichever decode finishes last
    /// is the one that stays.
    pub async fn load_image(&self, upload: RawUpload) -> Result<ImageInfo, ApplicationError> {
        let seq = self.upload_seq.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(
            seq,
            mime = %upload.mime_type,
            bytes = upload.bytes.len(),
            "Decoding upload"
        );

        let decoder = Arc::clone(&self.image_decoder);
        let decoded =
            tokio::task::spawn_blocking(move || decoder.decode(&upload.mime_type, &upload.bytes))
                .await?;
        let bitmap = decoded.map_err(|e| {
            tracing::warn!(seq, error = %e, "Upload could not be decoded; keeping current image");
            e
        })?;
        let info = ImageInfo { width: bitmap.width(), height: bitmap.height() };

        let mut current = self.current.lock().await;
        let mut next = current.state.clone();
        next.bitmap = Some(Arc::new(bitmap));
        self.commit(&mut current, next).await?;

        tracing::info!(seq, width = info.width, height = info.height, "Bitmap replaced");
        Ok(info)
    }

    /// PNG of the most recent frame, with or without an image.
    pub async fn preview_png(&self) -> Result<Vec<u8>, ApplicationError> {
        let frame = Arc::clone(&self.current.lock().await.frame);
        let bytes = tokio::task::spawn_blocking(move || encode_png(&frame)).await??;
        Ok(bytes)
    }

    /// Encodes the most recent frame for download. Nothing is re-rendered.
    pub async fn export(&self) -> Result<ExportedImage, ApplicationError> {
        let frame = {
            let current = self.current.lock().await;
            if current.state.bitmap.is_none() {
                return Err(ApplicationError::NoImageLoaded);
            }
            Arc::clone(&current.frame)
        };

        let bytes = tokio::task::spawn_blocking(move || encode_png(&frame))
            .await?
            .map_err(|e| {
                tracing::error!(error = %e, "PNG encoding failed");
                e
            })?;
        let file_name = export_file_name(SystemTime::now());
        tracing::info!(%file_name, bytes = bytes.len(), "Frame exported");
        Ok(ExportedImage { file_name, bytes })
    }

    /// Renders `next` on a blocking worker and swaps it in only if that
    /// succeeds. The caller keeps the lock, so commits never interleave.
    async fn commit(
        &self,
        current: &mut Committed,
        next: EditorState,
    ) -> Result<(), ApplicationError> {
        let canvas = self.canvas;
        let fonts = Arc::clone(&self.fonts);
        let (next, frame) = tokio::task::spawn_blocking(move || {
            let frame = render(canvas, &fonts, &next);
            (next, frame)
        })
        .await?;
        *current = Committed { state: next, frame: Arc::new(frame?) };
        Ok(())
    }
}

fn render(
    canvas: CanvasSize,
    fonts: &FontBook,
    state: &EditorState,
) -> Result<RgbaImage, DomainError> {
    let mut surface = RasterSurface::new(canvas, fonts);
    compose(&state.scene(canvas), &mut surface)?;
    Ok(surface.into_frame())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::color::Color;
    use crate::domain::font_family::FontFamily;
    use crate::domain::image_decoder_trait::MockImageDecoder;
    use crate::infrastructure::error::InfrastructureError;
    use crate::infrastructure::image_decoder::{DecodeLimits, DefaultImageDecoder};
    use crate::infrastructure::raster_surface::tests::system_font_book;
    use image::{ImageFormat, Rgba};
    use std::time::Duration;

    const CANVAS: CanvasSize = CanvasSize::new(60, 80);

    fn service_with(
        decoder: impl ImageDecoder + Send + Sync + 'static,
        fonts: FontBook,
    ) -> EditorService {
        EditorService::new(CANVAS, Arc::new(fonts), Arc::new(decoder)).unwrap()
    }

    fn real_service() -> EditorService {
        service_with(DefaultImageDecoder::new(DecodeLimits::default()), FontBook::empty())
    }

    fn png_upload(width: u32, height: u32, color: [u8; 4]) -> RawUpload {
        let image = RgbaImage::from_pixel(width, height, Rgba(color));
        let mut buffer = std::io::Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Png).unwrap();
        RawUpload { mime_type: "image/png".to_string(), bytes: buffer.into_inner() }
    }

    fn decode_png(bytes: &[u8]) -> RgbaImage {
        image::load_from_memory_with_format(bytes, ImageFormat::Png).unwrap().to_rgba8()
    }

    #[tokio::test]
    async fn test_initial_state() {
        let service = real_service();
        let snapshot = service.snapshot().await;
        assert_eq!(snapshot.canvas, CANVAS);
        assert_eq!(snapshot.title, OverlayStyle::default_title());
        assert_eq!(snapshot.content, OverlayStyle::default_content());
        assert_eq!(snapshot.image, None);
        assert!(!snapshot.export_enabled);

        let preview = decode_png(&service.preview_png().await.unwrap());
        assert_eq!(preview.dimensions(), (60, 80));
        assert!(preview.pixels().all(|p| p.0 == [0x1a, 0x1a, 0x1a, 255]));
    }

    #[tokio::test]
    async fn test_export_requires_an_image() {
        let service = real_service();
        assert!(matches!(service.export().await, Err(ApplicationError::NoImageLoaded)));
    }

    #[tokio::test]
    async fn test_load_then_export_captures_last_frame() {
        let service = real_service();
        let info = service.load_image(png_upload(120, 160, [255, 0, 0, 255])).await.unwrap();
        assert_eq!(info, ImageInfo { width: 120, height: 160 });

        let snapshot = service.snapshot().await;
        assert!(snapshot.image_loaded && snapshot.export_enabled);

        let exported = service.export().await.unwrap();
        assert!(exported.file_name.starts_with("edited-image-"));
        assert!(exported.file_name.ends_with(".png"));
        let digits = &exported.file_name["edited-image-".len()..exported.file_name.len() - 4];
        assert!(digits.parse::<u128>().is_ok());

        let frame = decode_png(&exported.bytes);
        assert_eq!(frame.dimensions(), (60, 80));
        assert!(frame.pixels().all(|p| p.0 == [255, 0, 0, 255]));
        assert_eq!(decode_png(&service.preview_png().await.unwrap()), frame);
    }

    #[tokio::test]
    async fn test_failed_decode_keeps_previous_image() {
        let service = real_service();
        service.load_image(png_upload(30, 40, [0, 0, 255, 255])).await.unwrap();

        let garbage = RawUpload { mime_type: "image/png".to_string(), bytes: vec![0, 1, 2, 3] };
        let err = service.load_image(garbage).await.unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::InfrastructureError(InfrastructureError::DecodingError(_))
        ));

        let gif = RawUpload { mime_type: "image/gif".to_string(), bytes: vec![0; 8] };
        let err = service.load_image(gif).await.unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::InfrastructureError(InfrastructureError::UnsupportedFormat(_))
        ));

        assert_eq!(service.snapshot().await.image, Some(ImageInfo { width: 30, height: 40 }));
    }

    #[tokio::test]
    async fn test_update_overlay_clamps_and_persists() {
        let service = real_service();
        let patch = OverlayPatch {
            x: Some(1_000),
            font_size: Some(3),
            color: Some(Color::new(1, 2, 3, 255)),
            ..OverlayPatch::default()
        };
        let updated = service.update_overlay(OverlaySlot::Content, patch).await.unwrap();
        assert_eq!(updated.x, CANVAS.max_x());
        assert_eq!(updated.font_size, 12);

        let snapshot = service.snapshot().await;
        assert_eq!(snapshot.content, updated);
        assert_eq!(snapshot.title, OverlayStyle::default_title());
    }

    #[tokio::test]
    async fn test_text_without_fonts_is_not_committed() {
        let service = real_service();
        let patch = OverlayPatch { text: Some("Hello".to_string()), ..OverlayPatch::default() };
        let err = service.update_overlay(OverlaySlot::Title, patch).await.unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::DomainError(DomainError::FontUnavailable(FontFamily::Inter))
        ));
        assert_eq!(service.snapshot().await.title.text, "");
    }

    #[tokio::test]
    async fn test_text_is_rendered_into_preview() {
        let Some(fonts) = system_font_book() else {
            eprintln!("no system font found; skipping");
            return;
        };
        let service = service_with(DefaultImageDecoder::new(DecodeLimits::default()), fonts);
        let before = decode_png(&service.preview_png().await.unwrap());

        let patch = OverlayPatch {
            text: Some("Hi".to_string()),
            x: Some(0),
            y: Some(0),
            ..OverlayPatch::default()
        };
        service.update_overlay(OverlaySlot::Title, patch).await.unwrap();
        let after = decode_png(&service.preview_png().await.unwrap());
        assert_ne!(before, after);
    }

    /// Sleeps in proportion to the payload, so overlapping decodes finish in
    /// a known order. Unlike a mockall mock it holds no lock while decoding.
    struct DelayedDecoder;

    impl ImageDecoder for DelayedDecoder {
        fn decode(&self, _mime_type: &str, bytes: &[u8]) -> Result<Bitmap, InfrastructureError> {
            let (side, delay) = match bytes {
                b"slow" => (10, 300),
                _ => (20, 10),
            };
            std::thread::sleep(Duration::from_millis(delay));
            Ok(Bitmap::new(RgbaImage::new(side, side)))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_overlapping_uploads_last_completion_wins() {
        let service = Arc::new(service_with(DelayedDecoder, FontBook::empty()));

        // "slow" is submitted first but finishes last
        let first = {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                let upload =
                    RawUpload { mime_type: "image/png".to_string(), bytes: b"slow".to_vec() };
                service.load_image(upload).await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        let fast = RawUpload { mime_type: "image/png".to_string(), bytes: b"fast".to_vec() };
        assert_eq!(service.load_image(fast).await.unwrap(), ImageInfo { width: 20, height: 20 });
        assert_eq!(service.snapshot().await.image, Some(ImageInfo { width: 20, height: 20 }));

        assert_eq!(first.await.unwrap().unwrap(), ImageInfo { width: 10, height: 10 });
        assert_eq!(service.snapshot().await.image, Some(ImageInfo { width: 10, height: 10 }));
    }

    #[tokio::test]
    async fn test_decoder_mock_is_consulted_with_declared_type() {
        let mut decoder = MockImageDecoder::new();
        decoder
            .expect_decode()
            .withf(|mime, bytes| {
                mime.to_string() == "image/jpeg" && bytes.to_vec() == b"jpeg bytes".to_vec()
            })
            .times(1)
            .returning(|_, _| Ok(Bitmap::new(RgbaImage::new(4, 3))));
        let service = service_with(decoder, FontBook::empty());

        let upload =
            RawUpload { mime_type: "image/jpeg".to_string(), bytes: b"jpeg bytes".to_vec() };
        assert_eq!(service.load_image(upload).await.unwrap(), ImageInfo { width: 4, height: 3 });
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_many_offscreen_lines_render_quickly() {
        let Some(fonts) = system_font_book() else {
            eprintln!("no system font found; skipping");
            return;
        };
        let service = EditorService::new(
            CanvasSize::REFERENCE,
            Arc::new(fonts),
            Arc::new(DefaultImageDecoder::new(DecodeLimits::default())),
        )
        .unwrap();

        let patch = OverlayPatch { text: Some("x\n".repeat(20_000)), ..OverlayPatch::default() };
        let started = std::time::Instant::now();
        service.update_overlay(OverlaySlot::Content, patch).await.unwrap();
        let elapsed = started.elapsed();
        assert!(elapsed < Duration::from_secs(5), "update took {elapsed:?}");
        assert_eq!(service.snapshot().await.content.text.lines().count(), 20_000);
    }
}

//! PDF出力
//!
//! 1 Page = 1 PDFページ。スライド座標（cm・左上原点）を
//! PDF座標（pt・左下原点）へ変換して画像と凡例を描画する。

use super::{prepare_output_path, ReportSink};
use crate::config::ReportConfig;
use crate::error::{Result, WaferDeckError};
use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Point, Pt, RawImage, TextItem,
    XObjectId, XObjectTransform,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use wafer_deck_common::layout::cm_to_pt;
use wafer_deck_common::{LegendBlock, Page, PlacedImage};

/// 画像の基準解像度（1px = 1pt）
const IMAGE_DPI: f32 = 72.0;
/// 行送り（フォントサイズ比）
const LINE_HEIGHT_RATIO: f32 = 1.2;
/// Courier の1文字幅（フォントサイズ比）
const COURIER_ADVANCE: f32 = 0.6;
/// Helvetica の平均文字幅（フォントサイズ比、概算）
const HELVETICA_ADVANCE: f32 = 0.5;
/// 縮小の下限（pt）
const MIN_FONT_PT: f32 = 6.0;

/// 埋め込み済み画像
#[derive(Clone)]
struct EmbeddedImage {
    id: XObjectId,
    width_px: f32,
    height_px: f32,
}

pub struct PdfSink {
    output_dir: PathBuf,
    page_width_cm: f32,
    page_height_cm: f32,
    title: String,
}

impl PdfSink {
    pub fn new(output_dir: impl Into<PathBuf>, config: &ReportConfig) -> Self {
        Self {
            output_dir: output_dir.into(),
            page_width_cm: config.page_width_cm,
            page_height_cm: config.page_height_cm,
            title: "wafer-deck report".into(),
        }
    }

    /// PDFバイト列を生成
    pub fn render(&self, pages: &[Page]) -> Result<Vec<u8>> {
        let mut doc = PdfDocument::new(&self.title);
        let mut images: HashMap<PathBuf, EmbeddedImage> = HashMap::new();
        let mut pdf_pages = Vec::with_capacity(pages.len());

        for page in pages {
            let mut ops = Vec::new();

            for placed in &page.images {
                let embedded = match images.get(&placed.path) {
                    Some(e) => e.clone(),
                    None => {
                        let e = embed_image(&mut doc, &placed.path)?;
                        images.insert(placed.path.clone(), e.clone());
                        e
                    }
                };
                ops.push(self.image_op(placed, &embedded));
            }

            for legend in &page.legends {
                ops.extend(self.text_ops(legend));
            }

            tracing::debug!(page = %page.name, ops = ops.len(), "pdf page rendered");
            pdf_pages.push(PdfPage::new(
                Mm(self.page_width_cm * 10.0),
                Mm(self.page_height_cm * 10.0),
                ops,
            ));
        }

        let mut warnings = Vec::new();
        let bytes = doc
            .with_pages(pdf_pages)
            .save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            tracing::debug!(count = warnings.len(), "pdf save produced warnings");
        }
        Ok(bytes)
    }

    fn page_height_pt(&self) -> f32 {
        cm_to_pt(self.page_height_cm)
    }

    /// 画像配置: 指定幅に合わせて縦横比を保って拡縮
    fn image_op(&self, placed: &PlacedImage, image: &EmbeddedImage) -> Op {
        let width_pt = cm_to_pt(placed.width);
        let scale = if image.width_px > 0.0 { width_pt / image.width_px } else { 1.0 };
        let height_pt = image.height_px * scale;

        Op::UseXobject {
            id: image.id.clone(),
            transform: XObjectTransform {
                translate_x: Some(Pt(cm_to_pt(placed.x))),
                translate_y: Some(Pt(self.page_height_pt() - cm_to_pt(placed.y) - height_pt)),
                rotate: None,
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(IMAGE_DPI),
            },
        }
    }

    /// テキストボックス: 1行目のベースラインをボックス上端からフォントサイズ分下げる
    fn text_ops(&self, legend: &LegendBlock) -> Vec<Op> {
        let font = if legend.monospace {
            BuiltinFont::Courier
        } else {
            BuiltinFont::Helvetica
        };
        let size = fitted_font_size(legend);
        let top = self.page_height_pt() - cm_to_pt(legend.y);

        let mut ops = vec![
            Op::StartTextSection,
            Op::SetTextCursor {
                pos: Point {
                    x: Pt(cm_to_pt(legend.x)),
                    y: Pt(top - size),
                },
            },
            Op::SetFontSizeBuiltinFont {
                size: Pt(size),
                font: font.clone(),
            },
            Op::SetLineHeight {
                lh: Pt(size * LINE_HEIGHT_RATIO),
            },
        ];

        for line in legend.text.lines() {
            ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(line.to_string())],
                font: font.clone(),
            });
            ops.push(Op::AddLineBreak);
        }
        ops.push(Op::EndTextSection);
        ops
    }
}

impl ReportSink for PdfSink {
    fn write(&mut self, pages: &[Page]) -> Result<PathBuf> {
        if pages.is_empty() {
            return Err(WaferDeckError::PdfGeneration("出力するページがありません".into()));
        }
        let bytes = self.render(pages)?;
        let output_path = prepare_output_path(&self.output_dir, "pdf")?;
        std::fs::write(&output_path, bytes)?;
        tracing::info!(path = %output_path.display(), pages = pages.len(), "pdf written");
        Ok(output_path)
    }
}

/// ボックスに収まるフォントサイズ。折り返しはせず、はみ出す場合だけ縮める
fn fitted_font_size(legend: &LegendBlock) -> f32 {
    let line_count = legend.text.lines().count().max(1) as f32;
    let longest = legend
        .text
        .lines()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0) as f32;
    let advance = if legend.monospace {
        COURIER_ADVANCE
    } else {
        HELVETICA_ADVANCE
    };

    let mut size = legend.font_size;
    if legend.width > 0.0 && longest > 0.0 {
        size = size.min(cm_to_pt(legend.width) / (longest * advance));
    }
    if legend.height > 0.0 {
        size = size.min(cm_to_pt(legend.height) / (line_count * LINE_HEIGHT_RATIO));
    }
    size.max(MIN_FONT_PT.min(legend.font_size))
}

fn embed_image(doc: &mut PdfDocument, path: &Path) -> Result<EmbeddedImage> {
    let bytes = std::fs::read(path).map_err(|e| WaferDeckError::image_access(path, e))?;
    let mut warnings = Vec::new();
    let image = RawImage::decode_from_bytes(&bytes, &mut warnings)
        .map_err(|e| WaferDeckError::image_access(path, e))?;

    let width_px = image.width as f32;
    let height_px = image.height as f32;
    let id = doc.add_image(&image);

    Ok(EmbeddedImage {
        id,
        width_px,
        height_px,
    })
}

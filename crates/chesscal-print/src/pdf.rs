//! Single-page PDF output.

use pdf_writer::{Content, Pdf, Rect, Ref};

use crate::{PageLayout, Palette};

/// Render the checkerboard into an in-memory PDF document.
///
/// Each box is filled and stroked with the same color so printers do not
/// leave hairline seams between neighbors.
pub fn render_pdf(layout: &PageLayout, palette: Palette, corner_markers: bool) -> Vec<u8> {
    let catalog_id = Ref::new(1);
    let page_tree_id = Ref::new(2);
    let page_id = Ref::new(3);
    let content_id = Ref::new(4);

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id).kids([page_id]).count(1);
    {
        let mut page = pdf.page(page_id);
        page.media_box(Rect::new(
            0.0,
            0.0,
            layout.page.width_pt as f32,
            layout.page.height_pt as f32,
        ));
        page.parent(page_tree_id);
        page.contents(content_id);
    }

    let mut content = Content::new();
    let side = layout.box_pt as f32;
    for row in 0..layout.boxes_y {
        for col in 0..layout.boxes_x {
            let [r, g, b] = palette.box_color(layout, corner_markers, row, col).unit();
            let (x, y) = layout.box_origin(row, col);
            content.set_fill_rgb(r, g, b);
            content.set_stroke_rgb(r, g, b);
            content.rect(x as f32, y as f32, side, side);
            content.fill_nonzero_and_stroke();
        }
    }
    pdf.stream(content_id, &content.finish());
    pdf.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoxSizing, PageSize};

    #[test]
    fn emits_one_rect_per_box() {
        let layout =
            PageLayout::compute(PageSize::A4, 42.52, BoxSizing::Fixed { size_mm: 30.0 }).unwrap();
        let bytes = render_pdf(&layout, Palette::Monochrome, true);
        assert!(bytes.starts_with(b"%PDF-"));

        let text = String::from_utf8_lossy(&bytes);
        let tokens: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(tokens.iter().filter(|t| **t == "re").count(), layout.box_count());
        assert_eq!(tokens.iter().filter(|t| **t == "B").count(), layout.box_count());
        assert!(text.contains("/MediaBox"));
    }
}

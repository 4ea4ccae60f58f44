use chesscal_core::JsonConfig;
use chesscal_print::{
    generate_target, render_raster, BoxSizing, PageLayout, Palette, Rgb, TargetConfig,
};

fn box_center_px(layout: &PageLayout, dpi: f64, height: u32, row: u32, col: u32) -> (u32, u32) {
    let scale = dpi / 72.0;
    let (x, y) = layout.box_origin(row, col);
    let cx = (x + layout.box_pt / 2.0) * scale;
    let cy = height as f64 - (y + layout.box_pt / 2.0) * scale;
    (cx as u32, cy as u32)
}

#[test]
fn writes_pdf_and_preview_with_marked_corners() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = TargetConfig {
        output_path: tmp.path().join("out/target.pdf"),
        preview_path: Some(tmp.path().join("out/target.png")),
        preview_dpi: 72.0,
        ..TargetConfig::default()
    };
    let summary = generate_target(&cfg).unwrap();
    assert_eq!(summary.layout.inner_corners(), (9, 13));

    let pdf = std::fs::read(&cfg.output_path).unwrap();
    assert!(pdf.starts_with(b"%PDF-"));

    let png = image::open(cfg.preview_path.as_ref().unwrap())
        .unwrap()
        .to_rgb8();
    let layout = summary.layout;
    assert_eq!(png.width(), layout.page.width_pt.round() as u32);

    let corners = Palette::DarkHue.corners();
    let (lr, lc) = (layout.boxes_y - 1, layout.boxes_x - 1);
    for (row, col, want) in [
        (0, 0, corners.bottom_left),
        (0, lc, corners.bottom_right),
        (lr, 0, corners.top_left),
        (lr, lc, corners.top_right),
        (1, 1, Palette::DarkHue.base()[0]),
        (1, 2, Palette::DarkHue.base()[1]),
    ] {
        let (x, y) = box_center_px(&layout, 72.0, png.height(), row, col);
        assert_eq!(Rgb(png.get_pixel(x, y).0), want, "box ({row}, {col})");
    }
    // Margin stays blank.
    assert_eq!(png.get_pixel(2, 2).0, [255, 255, 255]);
}

#[test]
fn every_drawn_box_uses_a_palette_color() {
    let cfg = TargetConfig {
        sizing: BoxSizing::FitAcross { boxes: 8 },
        palette: Palette::Monochrome,
        ..TargetConfig::default()
    };
    let layout = cfg.layout().unwrap();
    let raster = render_raster(&layout, cfg.palette, true, 50.0).unwrap();

    let base = Palette::Monochrome.base();
    let mut base_boxes = 0;
    for row in 0..layout.boxes_y {
        for col in 0..layout.boxes_x {
            let (x, y) = box_center_px(&layout, 50.0, raster.height, row, col);
            let px = raster.pixel(x, y).unwrap();
            if base.contains(&px) {
                base_boxes += 1;
            } else {
                assert!(Palette::Monochrome.corners().as_array().contains(&px));
            }
        }
    }
    assert_eq!(base_boxes + 4, layout.box_count());
}

#[test]
fn config_round_trips_through_json() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("target.json");
    std::fs::write(
        &path,
        r#"{ "sizing": { "mode": "fit_across", "boxes": 12 }, "palette": "monochrome" }"#,
    )
    .unwrap();
    let cfg = TargetConfig::load_json(&path).unwrap();
    assert_eq!(cfg.sizing, BoxSizing::FitAcross { boxes: 12 });
    assert_eq!(cfg.palette, Palette::Monochrome);
    assert_eq!(cfg.margin_cm, 1.5);
    assert!(cfg.corner_markers);

    cfg.write_json(&path).unwrap();
    assert_eq!(TargetConfig::load_json(&path).unwrap(), cfg);
}

#[test]
fn unwritable_output_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let blocker = tmp.path().join("file");
    std::fs::write(&blocker, b"not a dir").unwrap();
    let cfg = TargetConfig {
        output_path: blocker.join("target.pdf"),
        ..TargetConfig::default()
    };
    assert!(generate_target(&cfg).is_err());
}

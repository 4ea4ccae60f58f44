//! Synthetic checkerboard views rendered through a pinhole camera.

#![allow(dead_code)]

use std::path::Path;

use image::{GrayImage, Luma};
use nalgebra::{Matrix3, Rotation3, Vector3};

pub const WIDTH: u32 = 640;
pub const HEIGHT: u32 = 480;
pub const FOCAL_PX: f64 = 700.0;

/// Squares per axis; inner corners are one less (9 x 13).
const SQUARES_X: f64 = 10.0;
const SQUARES_Y: f64 = 14.0;
const SUPERSAMPLE: u32 = 3;

/// Board tilted by `rx_deg`/`ry_deg` with its center `distance` squares in
/// front of the camera.
pub fn render_board(rx_deg: f64, ry_deg: f64, distance: f64) -> GrayImage {
    let k = Matrix3::new(
        FOCAL_PX,
        0.0,
        WIDTH as f64 / 2.0,
        0.0,
        FOCAL_PX,
        HEIGHT as f64 / 2.0,
        0.0,
        0.0,
        1.0,
    );
    let r = Rotation3::from_euler_angles(rx_deg.to_radians(), ry_deg.to_radians(), 0.0);
    let center = Vector3::new(SQUARES_X / 2.0, SQUARES_Y / 2.0, 0.0);
    let t = Vector3::new(0.0, 0.0, distance) - r * center;
    let rm = r.matrix();
    let h = k * Matrix3::from_columns(&[rm.column(0).into_owned(), rm.column(1).into_owned(), t]);
    let h_inv = h.try_inverse().expect("board homography is invertible");

    let n = SUPERSAMPLE * SUPERSAMPLE;
    GrayImage::from_fn(WIDTH, HEIGHT, |x, y| {
        let mut light = 0u32;
        for sy in 0..SUPERSAMPLE {
            for sx in 0..SUPERSAMPLE {
                let px = x as f64 + (sx as f64 + 0.5) / SUPERSAMPLE as f64;
                let py = y as f64 + (sy as f64 + 0.5) / SUPERSAMPLE as f64;
                let q = h_inv * Vector3::new(px, py, 1.0);
                let (u, v) = (q.x / q.z, q.y / q.z);
                let on_board = (0.0..SQUARES_X).contains(&u) && (0.0..SQUARES_Y).contains(&v);
                let dark = on_board && (u.floor() as i64 + v.floor() as i64) % 2 == 0;
                if !dark {
                    light += 1;
                }
            }
        }
        Luma([(light * 255 / n) as u8])
    })
}

pub fn blank() -> GrayImage {
    GrayImage::from_pixel(WIDTH, HEIGHT, Luma([255]))
}

pub fn save(img: &GrayImage, path: &Path) {
    img.save(path).expect("write synthetic image");
}

/// Two detectable views and one blank frame, the classic smoke scenario.
pub fn write_two_boards_and_blank(dir: &Path) {
    save(&render_board(15.0, -10.0, 32.0), &dir.join("view_a.png"));
    save(&render_board(-12.0, 18.0, 34.0), &dir.join("view_b.png"));
    save(&blank(), &dir.join("view_c.png"));
}

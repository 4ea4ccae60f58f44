//! Calibration result archive.
//!
//! The archive is a NumPy `.npz` file: a zip of `.npy` (format 1.0,
//! little-endian `f64`, C order) arrays named `mtx`, `dist`, `rvecs` and
//! `tvecs`, so downstream Python tools can `np.load` it directly.

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Length of the distortion vector (`k1, k2, p1, p2, k3`).
pub const DIST_COEFF_COUNT: usize = 5;

const NPY_MAGIC: &[u8] = b"\x93NUMPY";
const NPY_ALIGN: usize = 64;

#[derive(thiserror::Error, Debug)]
pub enum ArchiveError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    #[error("malformed npy entry '{name}': {reason}")]
    Npy { name: String, reason: String },
    #[error("array '{name}' has shape {found:?}, expected {expected}")]
    Shape {
        name: String,
        found: Vec<usize>,
        expected: String,
    },
    #[error("pose count mismatch ({rvecs} rotations, {tvecs} translations)")]
    PoseMismatch { rvecs: usize, tvecs: usize },
}

/// Intrinsics, distortion and one pose per accepted image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationArchive {
    /// Row-major 3x3 camera matrix `K`.
    pub camera_matrix: [[f64; 3]; 3],
    pub dist_coeffs: Vec<f64>,
    /// Rodrigues rotation vectors, one per image.
    pub rvecs: Vec<[f64; 3]>,
    pub tvecs: Vec<[f64; 3]>,
}

impl CalibrationArchive {
    /// Number of poses stored in the archive.
    pub fn pose_count(&self) -> usize {
        self.rvecs.len()
    }

    fn validate(&self) -> Result<(), ArchiveError> {
        if self.dist_coeffs.len() != DIST_COEFF_COUNT {
            return Err(ArchiveError::Shape {
                name: "dist".into(),
                found: vec![self.dist_coeffs.len()],
                expected: format!("{DIST_COEFF_COUNT} coefficients"),
            });
        }
        if self.rvecs.len() != self.tvecs.len() {
            return Err(ArchiveError::PoseMismatch {
                rvecs: self.rvecs.len(),
                tvecs: self.tvecs.len(),
            });
        }
        Ok(())
    }

    /// Write the archive to `path`, creating parent directories.
    pub fn write_npz(&self, path: impl AsRef<Path>) -> Result<(), ArchiveError> {
        self.validate()?;
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = BufWriter::new(File::create(path)?);
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        let n = self.rvecs.len();
        let mtx: Vec<f64> = self.camera_matrix.iter().flatten().copied().collect();
        let rvecs: Vec<f64> = self.rvecs.iter().flatten().copied().collect();
        let tvecs: Vec<f64> = self.tvecs.iter().flatten().copied().collect();

        let entries: [(&str, Vec<usize>, &[f64]); 4] = [
            ("mtx", vec![3, 3], &mtx),
            ("dist", vec![1, DIST_COEFF_COUNT], &self.dist_coeffs),
            ("rvecs", vec![n, 3, 1], &rvecs),
            ("tvecs", vec![n, 3, 1], &tvecs),
        ];
        for (name, shape, data) in entries {
            zip.start_file(format!("{name}.npy"), options)?;
            zip.write_all(&encode_npy(&shape, data))?;
        }
        zip.finish()?.flush()?;
        Ok(())
    }

    /// Load an archive written by [`CalibrationArchive::write_npz`] (or by NumPy).
    pub fn read_npz(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let file = BufReader::new(File::open(path)?);
        let mut zip = ZipArchive::new(file)?;

        let (shape, mtx) = read_entry(&mut zip, "mtx")?;
        if shape != [3, 3] {
            return Err(shape_err("mtx", shape, "(3, 3)"));
        }

        let (shape, dist) = read_entry(&mut zip, "dist")?;
        if dist.len() != DIST_COEFF_COUNT || shape.iter().filter(|&&d| d != 1).count() > 1 {
            return Err(shape_err("dist", shape, "(1, 5) or (5,)"));
        }

        let rvecs = read_vec3_stack(&mut zip, "rvecs")?;
        let tvecs = read_vec3_stack(&mut zip, "tvecs")?;

        let mut camera_matrix = [[0.0; 3]; 3];
        for (r, row) in camera_matrix.iter_mut().enumerate() {
            row.copy_from_slice(&mtx[r * 3..r * 3 + 3]);
        }
        let archive = Self {
            camera_matrix,
            dist_coeffs: dist,
            rvecs,
            tvecs,
        };
        archive.validate()?;
        Ok(archive)
    }
}

fn shape_err(name: &str, found: Vec<usize>, expected: &str) -> ArchiveError {
    ArchiveError::Shape {
        name: name.into(),
        found,
        expected: expected.into(),
    }
}

fn read_vec3_stack<R: Read + Seek>(
    zip: &mut ZipArchive<R>,
    name: &str,
) -> Result<Vec<[f64; 3]>, ArchiveError> {
    let (shape, data) = read_entry(zip, name)?;
    let ok = match shape.as_slice() {
        [_, 3] | [_, 3, 1] => true,
        [0] => true,
        _ => false,
    };
    if !ok {
        return Err(shape_err(name, shape, "(N, 3, 1)"));
    }
    Ok(data.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
}

fn read_entry<R: Read + Seek>(
    zip: &mut ZipArchive<R>,
    name: &str,
) -> Result<(Vec<usize>, Vec<f64>), ArchiveError> {
    let mut bytes = Vec::new();
    zip.by_name(&format!("{name}.npy"))?.read_to_end(&mut bytes)?;
    decode_npy(&bytes).map_err(|reason| ArchiveError::Npy {
        name: name.into(),
        reason,
    })
}

fn shape_literal(shape: &[usize]) -> String {
    match shape {
        [d] => format!("({d},)"),
        dims => {
            let parts: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
            format!("({})", parts.join(", "))
        }
    }
}

fn encode_npy(shape: &[usize], data: &[f64]) -> Vec<u8> {
    let mut header = format!(
        "{{'descr': '<f8', 'fortran_order': False, 'shape': {}, }}",
        shape_literal(shape)
    );
    // magic(6) + version(2) + header_len(2) + header + '\n'
    let unpadded = NPY_MAGIC.len() + 4 + header.len() + 1;
    let pad = (NPY_ALIGN - unpadded % NPY_ALIGN) % NPY_ALIGN;
    header.extend(std::iter::repeat(' ').take(pad));
    header.push('\n');

    let mut out = Vec::with_capacity(NPY_MAGIC.len() + 4 + header.len() + data.len() * 8);
    out.extend_from_slice(NPY_MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    for v in data {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

fn decode_npy(bytes: &[u8]) -> Result<(Vec<usize>, Vec<f64>), String> {
    if bytes.len() < 10 || &bytes[..6] != NPY_MAGIC {
        return Err("missing NUMPY magic".into());
    }
    let (header_len, header_start) = match bytes[6] {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
        2 | 3 if bytes.len() >= 12 => (
            u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize,
            12,
        ),
        v => return Err(format!("unsupported format version {v}")),
    };
    let data_start = header_start + header_len;
    let header = bytes
        .get(header_start..data_start)
        .and_then(|h| std::str::from_utf8(h).ok())
        .ok_or("truncated header")?;

    if !header.contains("'descr': '<f8'") {
        return Err(format!("expected little-endian f64 data, header: {header}"));
    }
    if header.contains("'fortran_order': True") {
        return Err("fortran-ordered arrays are not supported".into());
    }
    let shape = parse_shape(header).ok_or("cannot parse shape")?;

    let needed = shape
        .iter()
        .try_fold(8usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| format!("shape {shape:?} is too large"))?;
    let payload = &bytes[data_start..];
    if payload.len() != needed {
        return Err(format!(
            "payload holds {} bytes, shape {:?} needs {}",
            payload.len(),
            shape,
            needed
        ));
    }
    let data = payload
        .chunks_exact(8)
        .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
        .collect();
    Ok((shape, data))
}

fn parse_shape(header: &str) -> Option<Vec<usize>> {
    let rest = &header[header.find("'shape'")?..];
    let open = rest.find('(')?;
    let close = open + rest[open..].find(')')?;
    rest[open + 1..close]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(n: usize) -> CalibrationArchive {
        CalibrationArchive {
            camera_matrix: [[812.5, 0.0, 319.2], [0.0, 810.1, 241.7], [0.0, 0.0, 1.0]],
            dist_coeffs: vec![-0.12, 0.05, 0.001, -0.002, 0.0],
            rvecs: (0..n).map(|i| [0.1 * i as f64, -0.2, 0.03]).collect(),
            tvecs: (0..n).map(|i| [-4.0, -6.5, 40.0 + i as f64]).collect(),
        }
    }

    #[test]
    fn npy_header_is_aligned() {
        let bytes = encode_npy(&[2, 3, 1], &[0.0; 6]);
        let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
        assert_eq!((10 + header_len) % NPY_ALIGN, 0);
        assert_eq!(bytes[10 + header_len - 1], b'\n');
        let (shape, data) = decode_npy(&bytes).unwrap();
        assert_eq!(shape, vec![2, 3, 1]);
        assert_eq!(data.len(), 6);
    }

    #[test]
    fn one_dimensional_shapes_use_trailing_comma() {
        assert_eq!(shape_literal(&[5]), "(5,)");
        assert_eq!(shape_literal(&[0, 3, 1]), "(0, 3, 1)");
        assert_eq!(
            parse_shape("{'descr': '<f8', 'fortran_order': False, 'shape': (5,), }"),
            Some(vec![5])
        );
    }

    #[test]
    fn archive_reloads_with_documented_shapes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out/calibration.npz");
        let archive = sample(2);
        archive.write_npz(&path).unwrap();

        let loaded = CalibrationArchive::read_npz(&path).unwrap();
        assert_eq!(loaded, archive);
        assert_eq!(loaded.pose_count(), 2);
        assert_eq!(loaded.dist_coeffs.len(), DIST_COEFF_COUNT);
    }

    #[test]
    fn rejects_inconsistent_archives() {
        let tmp = tempfile::tempdir().unwrap();
        let mut bad = sample(3);
        bad.tvecs.pop();
        let err = bad.write_npz(tmp.path().join("bad.npz")).unwrap_err();
        assert!(matches!(err, ArchiveError::PoseMismatch { rvecs: 3, tvecs: 2 }));
        assert!(!tmp.path().join("bad.npz").exists());

        let mut short = sample(1);
        short.dist_coeffs.truncate(4);
        assert!(matches!(
            short.write_npz(tmp.path().join("short.npz")),
            Err(ArchiveError::Shape { .. })
        ));
    }

    fn raw_npy(header: &str, payload: &[u8]) -> Vec<u8> {
        let mut bytes = NPY_MAGIC.to_vec();
        bytes.extend_from_slice(&[1, 0]);
        bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
        bytes.extend_from_slice(header.as_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn misplaced_shape_parens_are_an_error() {
        let bytes = raw_npy(
            "{'descr': '<f8', 'fortran_order': False, 'shape': ), (3,}\n",
            &[],
        );
        assert_eq!(decode_npy(&bytes).unwrap_err(), "cannot parse shape");
        assert_eq!(parse_shape("{'shape': ), (3,}"), None);
    }

    #[test]
    fn oversized_shape_is_an_error() {
        let bytes = raw_npy(
            "{'descr': '<f8', 'fortran_order': False, 'shape': (4294967296, 4294967296, 2), }\n",
            &[0; 16],
        );
        assert!(decode_npy(&bytes).unwrap_err().contains("too large"));
    }

    #[test]
    fn truncated_payload_is_reported() {
        let mut bytes = encode_npy(&[3, 3], &[1.0; 9]);
        bytes.truncate(bytes.len() - 8);
        assert!(decode_npy(&bytes).unwrap_err().contains("payload"));
    }
}

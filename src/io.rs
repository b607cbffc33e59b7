// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::io::Write;
use std::path::Path;

use ndarray::{Array1, ArrayD};

use crate::error::{InversionError, Result};

/// Supported file formats for vector I/O.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileFormat {
    /// NumPy .npy format.
    Npy,
    /// MATLAB .mat format (Level 5).
    Mat,
}

/// Infer file format from extension.
pub fn infer_format(path: &Path) -> Result<FileFormat> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("npy") => Ok(FileFormat::Npy),
        Some("mat") => Ok(FileFormat::Mat),
        Some(ext) => Err(InversionError::UnsupportedFileFormat(ext.to_string())),
        None => Err(InversionError::UnsupportedFileFormat(
            "(no extension)".to_string(),
        )),
    }
}

/// Save a vector (cost history, velocity profile) to a file, inferring format
/// from the extension. `name` is the MAT variable name and is ignored for .npy.
pub fn save_vector(path: &Path, name: &str, data: &[f64]) -> Result<()> {
    match infer_format(path)? {
        FileFormat::Npy => save_npy(path, data),
        FileFormat::Mat => write_mat_level5(path, name, data),
    }
}

/// Load a vector from a file, inferring format from the extension. `name` is
/// the MAT variable to read and is ignored for .npy.
pub fn load_vector(path: &Path, name: &str) -> Result<Vec<f64>> {
    match infer_format(path)? {
        FileFormat::Npy => load_npy(path),
        FileFormat::Mat => load_mat(path, name),
    }
}

fn save_npy(path: &Path, data: &[f64]) -> Result<()> {
    let arr = Array1::from(data.to_vec());
    ndarray_npy::write_npy(path, &arr)
        .map_err(|e| InversionError::Other(format!("npy write error: {}", e)))
}

fn load_npy(path: &Path) -> Result<Vec<f64>> {
    // Try f64 first
    let arr: ArrayD<f64> = match ndarray_npy::read_npy(path) {
        Ok(a) => a,
        Err(_) => {
            let arr32: ArrayD<f32> = ndarray_npy::read_npy(path)
                .map_err(|e| InversionError::UnsupportedDtype(format!("{}", e)))?;
            arr32.mapv(|v| v as f64)
        }
    };

    // Row or column vectors are fine; anything with two non-unit axes is not.
    if arr.shape().iter().filter(|&&n| n > 1).count() > 1 {
        return Err(InversionError::Other(format!(
            "expected a vector, got array of shape {:?}",
            arr.shape()
        )));
    }
    Ok(arr.iter().copied().collect())
}

fn load_mat(path: &Path, name: &str) -> Result<Vec<f64>> {
    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);
    let mat = matfile::MatFile::parse(&mut reader)
        .map_err(|e| InversionError::Other(format!("MAT parse error: {}", e)))?;

    let available: Vec<String> = mat.arrays().iter().map(|a| a.name().to_string()).collect();
    let array = mat
        .find_by_name(name)
        .ok_or_else(|| InversionError::MatVariableNotFound {
            expected: name.to_string(),
            available,
        })?;

    if array.size().iter().filter(|&&n| n > 1).count() > 1 {
        return Err(InversionError::Other(format!(
            "MAT variable '{}' is not a vector: size {:?}",
            name,
            array.size()
        )));
    }

    // Column-major order is irrelevant for a vector.
    match array.data() {
        matfile::NumericData::Double { real, imag: _ } => Ok(real.clone()),
        matfile::NumericData::Single { real, imag: _ } => {
            Ok(real.iter().map(|&v| v as f64).collect())
        }
        _ => Err(InversionError::UnsupportedDtype(
            "MAT file array is not f64 or f32".to_string(),
        )),
    }
}

/// Round a byte count up to the next multiple of 8.
fn padded(len: u32) -> u32 {
    len.div_ceil(8) * 8
}

/// Byte count as a MAT tag length field. Padding must fit as well.
fn tag_len(len: usize) -> Result<u32> {
    u32::try_from(len)
        .ok()
        .filter(|l| l.checked_next_multiple_of(8).is_some())
        .ok_or_else(|| {
            InversionError::Other(format!("{} bytes exceed the MAT element size limit", len))
        })
}

/// Write a tagged sub-element: 4-byte type, 4-byte length, payload, zero padding.
fn write_element<W: Write>(w: &mut W, mi_type: u32, payload: &[u8]) -> Result<()> {
    let len = tag_len(payload.len())?;
    w.write_all(&mi_type.to_le_bytes())?;
    w.write_all(&len.to_le_bytes())?;
    w.write_all(payload)?;
    let pad = (padded(len) - len) as usize;
    if pad > 0 {
        w.write_all(&vec![0u8; pad])?;
    }
    Ok(())
}

/// Minimal MAT-file Level 5 writer for a single 1-by-N double array.
///
/// The `matfile` crate only reads. Layout: 128-byte header, then one
/// miMATRIX element holding array flags, dimensions, name and real data.
fn write_mat_level5(path: &Path, var_name: &str, data: &[f64]) -> Result<()> {
    const MI_INT8: u32 = 1;
    const MI_INT32: u32 = 5;
    const MI_UINT32: u32 = 6;
    const MI_DOUBLE: u32 = 9;
    const MI_MATRIX: u32 = 14;
    const MX_DOUBLE_CLASS: u32 = 6;

    let file = std::fs::File::create(path)?;
    let mut w = std::io::BufWriter::new(file);

    let desc = b"MATLAB 5.0 MAT-file, created by layered-inversion";
    let mut header_text = [b' '; 116];
    let copy_len = desc.len().min(116);
    header_text[..copy_len].copy_from_slice(&desc[..copy_len]);
    w.write_all(&header_text)?;
    w.write_all(&[0u8; 8])?; // subsystem offset
    w.write_all(&0x0100u16.to_le_bytes())?; // version
    w.write_all(b"IM")?; // little-endian

    let mut flags = Vec::with_capacity(8);
    flags.extend_from_slice(&MX_DOUBLE_CLASS.to_le_bytes());
    flags.extend_from_slice(&0u32.to_le_bytes());

    let mut dims = Vec::with_capacity(8);
    dims.extend_from_slice(&1i32.to_le_bytes());
    let n = i32::try_from(data.len()).map_err(|_| {
        InversionError::Other(format!("{} values exceed the MAT dimension limit", data.len()))
    })?;
    dims.extend_from_slice(&n.to_le_bytes());

    let name = var_name.as_bytes();
    let real: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();

    let mut matrix_size = 0u32;
    for len in [flags.len(), dims.len(), name.len(), real.len()] {
        matrix_size = padded(tag_len(len)?)
            .checked_add(8)
            .and_then(|element| matrix_size.checked_add(element))
            .ok_or_else(|| {
                InversionError::Other("MAT matrix element exceeds 4 GiB".to_string())
            })?;
    }

    w.write_all(&MI_MATRIX.to_le_bytes())?;
    w.write_all(&matrix_size.to_le_bytes())?;
    write_element(&mut w, MI_UINT32, &flags)?;
    write_element(&mut w, MI_INT32, &dims)?;
    write_element(&mut w, MI_INT8, name)?;
    write_element(&mut w, MI_DOUBLE, &real)?;

    w.flush()?;
    Ok(())
}

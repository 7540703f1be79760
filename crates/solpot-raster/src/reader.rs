//! GeoTIFF tile reader with windowed, chunk-based access.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use geo::Rect;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;

use crate::{Affine, PixelWindow, RasterError, RasterWindow, Result};

/// GeoTIFF ModelPixelScale tag.
const MODEL_PIXEL_SCALE: Tag = Tag::ModelPixelScaleTag;
/// GeoTIFF ModelTiepoint tag.
const MODEL_TIEPOINT: Tag = Tag::ModelTiepointTag;
/// GDAL_NODATA tag, ASCII.
const GDAL_NODATA: Tag = Tag::GdalNodata;

/// An opened raster tile: metadata is parsed eagerly, pixels are read
/// lazily per window.
///
/// Only the TIFF chunks (strips or internal tiles) overlapping a requested
/// window are decoded, so reading a 30x30 px building crop from an
/// 8000x8000 px irradiance tile does not decode the whole tile.
pub struct RasterTile<R: Read + Seek = BufReader<File>> {
    decoder: Decoder<R>,
    width: u32,
    height: u32,
    bands: usize,
    transform: Affine,
    nodata: Option<f64>,
}

impl RasterTile<BufReader<File>> {
    /// Open a GeoTIFF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> RasterTile<R> {
    /// Open a GeoTIFF from any seekable reader.
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut decoder = Decoder::new(reader)?;

        // Raise the decoder limits: a single 10k x 10k RGBI chunk row is
        // well beyond the crate defaults.
        let mut limits = Limits::default();
        limits.decoding_buffer_size = 1024 * 1024 * 1024;
        limits.intermediate_buffer_size = 1024 * 1024 * 1024;
        limits.ifd_value_size = 1024 * 1024 * 1024;
        decoder = decoder.with_limits(limits);

        let (width, height) = decoder.dimensions()?;
        let bands = decoder
            .get_tag_u32(Tag::SamplesPerPixel)
            .unwrap_or(1)
            .max(1) as usize;
        let transform = read_geotransform(&mut decoder)?;
        let nodata = read_nodata(&mut decoder);

        Ok(Self {
            decoder,
            width,
            height,
            bands,
            transform,
            nodata,
        })
    }

    /// Raster dimensions in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of samples per pixel.
    pub fn bands(&self) -> usize {
        self.bands
    }

    /// Full-tile pixel-to-projected transform.
    pub fn transform(&self) -> Affine {
        self.transform
    }

    /// Declared no-data sentinel, if any.
    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    /// Pixel window covering the projected bounds, or `None` for no
    /// overlap.
    pub fn window(&self, bounds: &Rect<f64>) -> Option<PixelWindow> {
        PixelWindow::from_bounds(bounds, &self.transform, self.width, self.height)
    }

    /// Read the first band of the window covering `bounds` as `f32`.
    ///
    /// Pixels equal to the declared no-data sentinel are replaced with
    /// `0.0`: absent measurements contribute zero energy but stay part of
    /// area-based aggregates. Bounds entirely outside the tile produce an
    /// empty window, not an error.
    pub fn read_window_f32(&mut self, bounds: &Rect<f64>) -> Result<RasterWindow<f32>> {
        let Some(win) = self.window(bounds) else {
            return Ok(RasterWindow::empty(self.transform, 1));
        };

        let mut data = vec![0f32; win.width * win.height];
        let bands = self.bands;
        self.copy_window(&win, |samples, src, dst| {
            data[dst] = samples.sample_f64(src * bands)? as f32;
            Ok(())
        })?;

        if let Some(nd) = self.nodata {
            for v in &mut data {
                if (f64::from(*v) - nd).abs() < 1e-3 {
                    *v = 0.0;
                }
            }
        }

        Ok(RasterWindow {
            data,
            width: win.width,
            height: win.height,
            bands: 1,
            transform: self.transform.for_window(win.col_off, win.row_off),
        })
    }

    /// Read the first three bands of the window covering `bounds` as
    /// interleaved 8-bit RGB. The fourth (infrared) band of RGBI imagery
    /// is dropped.
    pub fn read_window_rgb(&mut self, bounds: &Rect<f64>) -> Result<RasterWindow<u8>> {
        if self.bands < 3 {
            return Err(RasterError::UnsupportedDataType(format!(
                "expected at least 3 bands for RGB, found {}",
                self.bands
            )));
        }

        let Some(win) = self.window(bounds) else {
            return Ok(RasterWindow::empty(self.transform, 3));
        };

        let mut data = vec![0u8; win.width * win.height * 3];
        let bands = self.bands;
        self.copy_window(&win, |samples, src, dst| {
            for band in 0..3 {
                data[dst * 3 + band] = samples.sample_u8(src * bands + band)?;
            }
            Ok(())
        })?;

        Ok(RasterWindow {
            data,
            width: win.width,
            height: win.height,
            bands: 3,
            transform: self.transform.for_window(win.col_off, win.row_off),
        })
    }

    /// Decode every chunk overlapping `win` and hand each covered pixel to
    /// `copy`: `(chunk samples, pixel index within chunk, pixel index
    /// within window)`.
    fn copy_window<F>(&mut self, win: &PixelWindow, mut copy: F) -> Result<()>
    where
        F: FnMut(&ChunkSamples, usize, usize) -> Result<()>,
    {
        let (chunk_w, chunk_h) = self.decoder.chunk_dimensions();
        let (chunk_w, chunk_h) = (i64::from(chunk_w), i64::from(chunk_h));
        let chunks_across = (i64::from(self.width) + chunk_w - 1) / chunk_w;

        let win_col1 = win.col_off + win.width as i64;
        let win_row1 = win.row_off + win.height as i64;

        let first_chunk_col = win.col_off / chunk_w;
        let last_chunk_col = (win_col1 - 1) / chunk_w;
        let first_chunk_row = win.row_off / chunk_h;
        let last_chunk_row = (win_row1 - 1) / chunk_h;

        for chunk_row in first_chunk_row..=last_chunk_row {
            for chunk_col in first_chunk_col..=last_chunk_col {
                let index = (chunk_row * chunks_across + chunk_col) as u32;
                let (data_w, _data_h) = self.decoder.chunk_data_dimensions(index);
                let samples = ChunkSamples::from_result(self.decoder.read_chunk(index)?);

                // Chunk origin in image coordinates.
                let origin_col = chunk_col * chunk_w;
                let origin_row = chunk_row * chunk_h;

                let col0 = win.col_off.max(origin_col);
                let col1 = win_col1.min(origin_col + chunk_w);
                let row0 = win.row_off.max(origin_row);
                let row1 = win_row1.min(origin_row + chunk_h);

                for row in row0..row1 {
                    let chunk_local_row = (row - origin_row) as usize;
                    let window_row = (row - win.row_off) as usize;
                    for col in col0..col1 {
                        let src =
                            chunk_local_row * data_w as usize + (col - origin_col) as usize;
                        let dst = window_row * win.width + (col - win.col_off) as usize;
                        copy(&samples, src, dst)?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl<R: Read + Seek> std::fmt::Debug for RasterTile<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterTile")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bands", &self.bands)
            .field("transform", &self.transform)
            .field("nodata", &self.nodata)
            .finish()
    }
}

/// Decoded chunk pixels with uniform sample access.
enum ChunkSamples {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl ChunkSamples {
    fn from_result(result: DecodingResult) -> Self {
        match result {
            DecodingResult::U8(v) => ChunkSamples::U8(v),
            DecodingResult::U16(v) => ChunkSamples::U16(v),
            DecodingResult::U32(v) => ChunkSamples::U32(v),
            DecodingResult::U64(v) => ChunkSamples::U64(v),
            DecodingResult::I8(v) => ChunkSamples::I8(v),
            DecodingResult::I16(v) => ChunkSamples::I16(v),
            DecodingResult::I32(v) => ChunkSamples::I32(v),
            DecodingResult::I64(v) => ChunkSamples::I64(v),
            DecodingResult::F32(v) => ChunkSamples::F32(v),
            DecodingResult::F64(v) => ChunkSamples::F64(v),
        }
    }

    fn sample_f64(&self, i: usize) -> Result<f64> {
        let out = match self {
            ChunkSamples::U8(v) => f64::from(v[i]),
            ChunkSamples::U16(v) => f64::from(v[i]),
            ChunkSamples::U32(v) => f64::from(v[i]),
            ChunkSamples::U64(v) => v[i] as f64,
            ChunkSamples::I8(v) => f64::from(v[i]),
            ChunkSamples::I16(v) => f64::from(v[i]),
            ChunkSamples::I32(v) => f64::from(v[i]),
            ChunkSamples::I64(v) => v[i] as f64,
            ChunkSamples::F32(v) => f64::from(v[i]),
            ChunkSamples::F64(v) => v[i],
        };
        Ok(out)
    }

    fn sample_u8(&self, i: usize) -> Result<u8> {
        match self {
            ChunkSamples::U8(v) => Ok(v[i]),
            ChunkSamples::U16(v) => Ok((v[i] >> 8) as u8),
            other => Err(RasterError::UnsupportedDataType(format!(
                "cannot convert {} samples to 8-bit RGB",
                other.type_name()
            ))),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            ChunkSamples::U8(_) => "u8",
            ChunkSamples::U16(_) => "u16",
            ChunkSamples::U32(_) => "u32",
            ChunkSamples::U64(_) => "u64",
            ChunkSamples::I8(_) => "i8",
            ChunkSamples::I16(_) => "i16",
            ChunkSamples::I32(_) => "i32",
            ChunkSamples::I64(_) => "i64",
            ChunkSamples::F32(_) => "f32",
            ChunkSamples::F64(_) => "f64",
        }
    }
}

/// Read the pixel-to-projected transform from the GeoTIFF tags.
///
/// ModelTiepoint is `[i, j, k, x, y, z]`: pixel `(i, j)` sits at projected
/// `(x, y)`. ModelPixelScale is `[sx, sy, sz]` with `sy` positive even
/// though rows grow southward.
fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Affine> {
    let tiepoint = decoder
        .get_tag_f64_vec(MODEL_TIEPOINT)
        .map_err(|_| RasterError::InvalidGeoTiff("missing ModelTiepoint tag".to_string()))?;
    let scale = decoder
        .get_tag_f64_vec(MODEL_PIXEL_SCALE)
        .map_err(|_| RasterError::InvalidGeoTiff("missing ModelPixelScale tag".to_string()))?;

    if tiepoint.len() < 6 || scale.len() < 2 {
        return Err(RasterError::InvalidGeoTiff(format!(
            "short georeferencing tags: tiepoint has {} values, scale has {}",
            tiepoint.len(),
            scale.len()
        )));
    }

    let (sx, sy) = (scale[0], scale[1]);
    if sx <= 0.0 || sy <= 0.0 {
        return Err(RasterError::InvalidGeoTiff(format!(
            "non-positive pixel scale ({sx}, {sy})"
        )));
    }

    // Shift the tiepoint back to pixel (0, 0).
    let origin_x = tiepoint[3] - tiepoint[0] * sx;
    let origin_y = tiepoint[4] + tiepoint[1] * sy;

    Ok(Affine {
        a: sx,
        b: 0.0,
        c: origin_x,
        d: 0.0,
        e: -sy,
        f: origin_y,
    })
}

/// GDAL stores the no-data sentinel as an ASCII-formatted number.
fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
    decoder
        .get_tag_ascii_string(GDAL_NODATA)
        .ok()
        .and_then(|s| s.trim().trim_end_matches('\0').parse().ok())
}

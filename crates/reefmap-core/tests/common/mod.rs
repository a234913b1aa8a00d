//! Fixture images generated at test time.

#![allow(dead_code)]

use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// A GPS position as EXIF stores it.
pub struct GpsFixture {
    pub latitude: [(u32, u32); 3],
    pub latitude_ref: &'static str,
    pub longitude: [(u32, u32); 3],
    pub longitude_ref: &'static str,
}

impl GpsFixture {
    /// 16°3'15.84"N 108°12'7.92"E
    pub fn da_nang() -> Self {
        Self {
            latitude: [(16, 1), (3, 1), (1584, 100)],
            latitude_ref: "N",
            longitude: [(108, 1), (12, 1), (792, 100)],
            longitude_ref: "E",
        }
    }
}

fn rationals(parts: &[(u32, u32); 3]) -> Value {
    Value::Rational(
        parts
            .iter()
            .map(|&(num, denom)| Rational { num, denom })
            .collect(),
    )
}

fn ascii(s: &str) -> Value {
    Value::Ascii(vec![s.as_bytes().to_vec()])
}

fn field(tag: Tag, value: Value) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value,
    }
}

/// Serialize camera tags and optional GPS into a TIFF-structured EXIF block.
pub fn exif_block(camera: &[(Tag, &str)], gps: Option<&GpsFixture>) -> Vec<u8> {
    let mut fields: Vec<Field> = camera.iter().map(|&(tag, s)| field(tag, ascii(s))).collect();
    if let Some(gps) = gps {
        fields.push(field(Tag::GPSLatitude, rationals(&gps.latitude)));
        fields.push(field(Tag::GPSLatitudeRef, ascii(gps.latitude_ref)));
        fields.push(field(Tag::GPSLongitude, rationals(&gps.longitude)));
        fields.push(field(Tag::GPSLongitudeRef, ascii(gps.longitude_ref)));
    }

    let mut writer = Writer::new();
    for f in &fields {
        writer.push_field(f);
    }
    let mut buf = Cursor::new(Vec::new());
    writer.write(&mut buf, false).unwrap();
    buf.into_inner()
}

/// Encode a solid JPEG and splice an APP1 EXIF segment after SOI.
pub fn jpeg_with_exif(width: u32, height: u32, tiff: Option<&[u8]>) -> Vec<u8> {
    let mut jpeg = Cursor::new(Vec::new());
    RgbImage::from_pixel(width, height, Rgb([20, 90, 150]))
        .write_to(&mut jpeg, image::ImageFormat::Jpeg)
        .unwrap();
    let jpeg = jpeg.into_inner();
    let Some(tiff) = tiff else {
        return jpeg;
    };

    let segment_len = u16::try_from(2 + 6 + tiff.len()).unwrap();
    let mut out = Vec::with_capacity(jpeg.len() + tiff.len() + 10);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}

pub fn write_jpeg(
    dir: &Path,
    name: &str,
    camera: &[(Tag, &str)],
    gps: Option<&GpsFixture>,
) -> PathBuf {
    let tiff = exif_block(camera, gps);
    let path = dir.join(name);
    std::fs::write(&path, jpeg_with_exif(64, 48, Some(&tiff))).unwrap();
    path
}

pub fn write_plain_jpeg(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, jpeg_with_exif(width, height, None)).unwrap();
    path
}

/// A fully transparent PNG.
pub fn write_transparent_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]))
        .save(&path)
        .unwrap();
    path
}

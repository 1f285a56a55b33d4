//! PLY export of fused scan clouds

use crate::error::{IoError, IoResult};
use ply_rs::{
    parser::Parser,
    ply::{Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType, ScalarType},
    writer::Writer,
};
use roomscan_core::{Point3f, ScanCloud, ScanPoint, Vector3f};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

const FLOAT_PROPERTIES: [&str; 6] = ["x", "y", "z", "nx", "ny", "nz"];
const COLOR_PROPERTIES: [&str; 3] = ["red", "green", "blue"];

/// Write a scan cloud as ASCII PLY with normals and colors.
///
/// Points without a normal are written with a zero normal; points without a
/// color are written white.
pub fn write_scan_cloud<W: Write>(cloud: &ScanCloud, writer: &mut W) -> IoResult<()> {
    let mut ply = Ply::<DefaultElement>::new();
    ply.header.encoding = Encoding::Ascii;
    ply.header.comments.push("roomscan fused cloud".to_string());

    let mut vertex_element = ElementDef::new("vertex".to_string());
    vertex_element.count = cloud.len();
    for name in FLOAT_PROPERTIES {
        vertex_element
            .properties
            .add(PropertyDef::new(name.to_string(), PropertyType::Scalar(ScalarType::Float)));
    }
    for name in COLOR_PROPERTIES {
        vertex_element
            .properties
            .add(PropertyDef::new(name.to_string(), PropertyType::Scalar(ScalarType::UChar)));
    }
    ply.header.elements.add(vertex_element);

    let vertices = cloud
        .iter()
        .map(|point| {
            let normal = point.normal.unwrap_or_else(Vector3f::zeros);
            let color = point.color.unwrap_or([255, 255, 255]);
            let floats = [point.position.x, point.position.y, point.position.z, normal.x, normal.y, normal.z];

            let mut vertex = DefaultElement::new();
            for (name, value) in FLOAT_PROPERTIES.iter().zip(floats) {
                vertex.insert(name.to_string(), Property::Float(value));
            }
            for (name, value) in COLOR_PROPERTIES.iter().zip(color) {
                vertex.insert(name.to_string(), Property::UChar(value));
            }
            vertex
        })
        .collect();
    ply.payload.insert("vertex".to_string(), vertices);

    Writer::new().write_ply(writer, &mut ply)?;
    Ok(())
}

/// Write a scan cloud to a PLY file
pub fn write_scan_cloud_file<P: AsRef<Path>>(cloud: &ScanCloud, path: P) -> IoResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_scan_cloud(cloud, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Read a scan cloud from PLY. Normals and colors are optional properties;
/// an all-zero normal is read as "no normal".
pub fn read_scan_cloud<R: BufRead>(reader: &mut R) -> IoResult<ScanCloud> {
    let ply = Parser::<DefaultElement>::new().read_ply(reader)?;

    let Some(vertices) = ply.payload.get("vertex") else {
        return Ok(ScanCloud::new());
    };

    vertices
        .iter()
        .map(|vertex| {
            let position = Point3f::new(
                extract_float(vertex, "x")?,
                extract_float(vertex, "y")?,
                extract_float(vertex, "z")?,
            );

            let normal = match (
                extract_float(vertex, "nx"),
                extract_float(vertex, "ny"),
                extract_float(vertex, "nz"),
            ) {
                (Ok(x), Ok(y), Ok(z)) if x != 0.0 || y != 0.0 || z != 0.0 => Some(Vector3f::new(x, y, z)),
                _ => None,
            };

            let color = match (
                extract_uchar(vertex, "red"),
                extract_uchar(vertex, "green"),
                extract_uchar(vertex, "blue"),
            ) {
                (Some(r), Some(g), Some(b)) => Some([r, g, b]),
                _ => None,
            };

            Ok(ScanPoint { position, normal, color })
        })
        .collect()
}

/// Read a scan cloud from a PLY file
pub fn read_scan_cloud_file<P: AsRef<Path>>(path: P) -> IoResult<ScanCloud> {
    read_scan_cloud(&mut BufReader::new(File::open(path)?))
}

fn extract_float(element: &DefaultElement, name: &str) -> IoResult<f32> {
    match element.get(name) {
        Some(Property::Float(v)) => Ok(*v),
        Some(Property::Double(v)) => Ok(*v as f32),
        Some(Property::Int(v)) => Ok(*v as f32),
        Some(_) => Err(IoError::ParseError {
            message: format!("Property '{name}' is not a number"),
        }),
        None => Err(IoError::ParseError {
            message: format!("Missing property: {name}"),
        }),
    }
}

fn extract_uchar(element: &DefaultElement, name: &str) -> Option<u8> {
    match element.get(name) {
        Some(Property::UChar(v)) => Some(*v),
        _ => None,
    }
}

//! PLY format support

use crate::error::IoError;
use crate::{PointCloudReader, PointCloudWriter};
use cloudframe_core::{Point3f, PointCloud, Result};
use ply_rs::{
    parser::Parser,
    ply::{Addable, DefaultElement, ElementDef, Ply, Property, PropertyDef, PropertyType, ScalarType},
    writer::Writer,
};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

pub struct PlyReader;
pub struct PlyWriter;

impl PointCloudReader for PlyReader {
    fn read_point_cloud<P: AsRef<Path>>(path: P) -> Result<PointCloud<Point3f>> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let parser = Parser::<DefaultElement>::new();
        let ply = parser.read_ply(&mut reader)?;

        let mut points = Vec::new();

        if let Some(vertex_element) = ply.payload.get("vertex") {
            points.reserve(vertex_element.len());
            for vertex in vertex_element {
                let x = extract_property_value(vertex, "x", path)?;
                let y = extract_property_value(vertex, "y", path)?;
                let z = extract_property_value(vertex, "z", path)?;

                points.push(Point3f::new(x, y, z));
            }
        }

        Ok(PointCloud::from_points(points))
    }
}

impl PointCloudWriter for PlyWriter {
    fn write_point_cloud<P: AsRef<Path>>(cloud: &PointCloud<Point3f>, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        let mut ply = Ply::<DefaultElement>::new();

        let mut vertex_element = ElementDef::new("vertex".to_string());
        vertex_element.count = cloud.len();
        for axis in ["x", "y", "z"] {
            vertex_element.properties.add(PropertyDef::new(
                axis.to_string(),
                PropertyType::Scalar(ScalarType::Float),
            ));
        }
        ply.header.elements.add(vertex_element);

        let vertices = cloud
            .iter()
            .map(|point| {
                let mut vertex = DefaultElement::new();
                vertex.insert("x".to_string(), Property::Float(point.x));
                vertex.insert("y".to_string(), Property::Float(point.y));
                vertex.insert("z".to_string(), Property::Float(point.z));
                vertex
            })
            .collect();
        ply.payload.insert("vertex".to_string(), vertices);

        Writer::new().write_ply(&mut writer, &mut ply)?;

        Ok(())
    }
}

/// Extract a property value as f32 from a PLY element
fn extract_property_value(element: &DefaultElement, name: &str, path: &Path) -> Result<f32> {
    let value = match element.get(name) {
        Some(Property::Float(val)) => *val,
        Some(Property::Double(val)) => *val as f32,
        Some(Property::Int(val)) => *val as f32,
        Some(Property::UInt(val)) => *val as f32,
        Some(Property::Short(val)) => *val as f32,
        Some(Property::UShort(val)) => *val as f32,
        Some(Property::Char(val)) => *val as f32,
        Some(Property::UChar(val)) => *val as f32,
        _ => {
            return Err(IoError::ParseError {
                path: path.to_path_buf(),
                message: format!("vertex property '{name}' not found or not scalar"),
            }
            .into())
        }
    };
    Ok(value)
}

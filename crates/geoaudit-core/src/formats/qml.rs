//! QGIS layer style (`.qml`) writer for categorized renderers

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use crate::error::{AuditError, Result};
use crate::models::{CategorizedRenderer, Color, GeometryFamily};

const QGIS_VERSION: &str = "3.28.0";

/// Write `renderer` as a QGIS style document to `path`. The symbol type
/// follows the geometry family of the styled layer.
pub fn write_qml(path: &Path, renderer: &CategorizedRenderer, family: GeometryFamily) -> Result<()> {
    let xml = render_qml(renderer, family)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, xml)?;
    Ok(())
}

fn xml_error(e: impl std::fmt::Display) -> AuditError {
    AuditError::Serialization(format!("QML: {}", e))
}

fn symbol_kind(family: GeometryFamily) -> (&'static str, &'static str) {
    match family {
        GeometryFamily::Point | GeometryFamily::MultiPoint => ("marker", "SimpleMarker"),
        GeometryFamily::Line => ("line", "SimpleLine"),
        GeometryFamily::Polygon => ("fill", "SimpleFill"),
    }
}

fn qgis_color(color: &Color) -> String {
    format!("{},{},{},255", color.r, color.g, color.b)
}

fn render_qml(renderer: &CategorizedRenderer, family: GeometryFamily) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;

    let mut root = BytesStart::new("qgis");
    root.push_attribute(("version", QGIS_VERSION));
    root.push_attribute(("styleCategories", "Symbology"));
    writer.write_event(Event::Start(root)).map_err(xml_error)?;

    let mut renderer_el = BytesStart::new("renderer-v2");
    renderer_el.push_attribute(("type", "categorizedSymbol"));
    renderer_el.push_attribute(("attr", renderer.field.as_str()));
    renderer_el.push_attribute(("symbollevels", "0"));
    renderer_el.push_attribute(("enableorderby", "0"));
    renderer_el.push_attribute(("forceraster", "0"));
    writer.write_event(Event::Start(renderer_el)).map_err(xml_error)?;

    writer.write_event(Event::Start(BytesStart::new("categories"))).map_err(xml_error)?;
    for (idx, category) in renderer.categories.iter().enumerate() {
        let symbol = idx.to_string();
        let mut el = BytesStart::new("category");
        el.push_attribute(("symbol", symbol.as_str()));
        el.push_attribute(("value", category.value.as_str()));
        el.push_attribute(("label", category.label.as_str()));
        el.push_attribute(("render", "true"));
        writer.write_event(Event::Empty(el)).map_err(xml_error)?;
    }
    writer.write_event(Event::End(BytesEnd::new("categories"))).map_err(xml_error)?;

    let (symbol_type, layer_class) = symbol_kind(family);
    writer.write_event(Event::Start(BytesStart::new("symbols"))).map_err(xml_error)?;
    for (idx, category) in renderer.categories.iter().enumerate() {
        let name = idx.to_string();
        let mut symbol = BytesStart::new("symbol");
        symbol.push_attribute(("type", symbol_type));
        symbol.push_attribute(("name", name.as_str()));
        symbol.push_attribute(("alpha", "1"));
        symbol.push_attribute(("clip_to_extent", "1"));
        symbol.push_attribute(("force_rhr", "0"));
        writer.write_event(Event::Start(symbol)).map_err(xml_error)?;

        let mut layer = BytesStart::new("layer");
        layer.push_attribute(("class", layer_class));
        layer.push_attribute(("enabled", "1"));
        layer.push_attribute(("locked", "0"));
        layer.push_attribute(("pass", "0"));
        writer.write_event(Event::Start(layer)).map_err(xml_error)?;

        let mut options = BytesStart::new("Option");
        options.push_attribute(("type", "Map"));
        writer.write_event(Event::Start(options)).map_err(xml_error)?;
        let color = qgis_color(&category.color);
        let mut color_opt = BytesStart::new("Option");
        color_opt.push_attribute(("name", "color"));
        color_opt.push_attribute(("type", "QString"));
        color_opt.push_attribute(("value", color.as_str()));
        writer.write_event(Event::Empty(color_opt)).map_err(xml_error)?;
        writer.write_event(Event::End(BytesEnd::new("Option"))).map_err(xml_error)?;

        writer.write_event(Event::End(BytesEnd::new("layer"))).map_err(xml_error)?;
        writer.write_event(Event::End(BytesEnd::new("symbol"))).map_err(xml_error)?;
    }
    writer.write_event(Event::End(BytesEnd::new("symbols"))).map_err(xml_error)?;

    writer.write_event(Event::End(BytesEnd::new("renderer-v2"))).map_err(xml_error)?;
    writer.write_event(Event::End(BytesEnd::new("qgis"))).map_err(xml_error)?;

    String::from_utf8(writer.into_inner().into_inner()).map_err(xml_error)
}

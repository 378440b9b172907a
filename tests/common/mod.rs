// テスト用フィクスチャ: 最小構成の .docx を動的に生成する
//
// No committed binaries: every document is assembled here with the zip and
// image crates.

#![allow(dead_code)]

use std::io::{Cursor, Read, Write};

use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:type="paragraph" w:styleId="Normal"/></w:styles>"#;

/// PNG with a horizontal/vertical gradient so mosaics visibly change it.
pub fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x * 7 % 256) as u8, (y * 11 % 256) as u8, ((x + y) % 256) as u8, 255])
    });
    encode(DynamicImage::ImageRgba8(img), ImageFormat::Png)
}

/// Single-color PNG.
pub fn solid_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    encode(DynamicImage::ImageRgba8(img), ImageFormat::Png)
}

/// Single-color JPEG.
pub fn solid_jpeg(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, image::Rgb(rgb));
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
}

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).expect("encode fixture image");
    buf.into_inner()
}

/// An image to embed: file extension (without dot) and bytes.
pub struct FixtureImage {
    pub ext: &'static str,
    pub bytes: Vec<u8>,
}

pub fn png(bytes: Vec<u8>) -> FixtureImage {
    FixtureImage { ext: "png", bytes }
}

pub fn jpeg(bytes: Vec<u8>) -> FixtureImage {
    FixtureImage { ext: "jpeg", bytes }
}

/// Build a `.docx` whose body references `images` in order, one picture per
/// paragraph, with a text paragraph in between.
pub fn build_docx(images: &[FixtureImage]) -> Vec<u8> {
    let mut body = String::new();
    let mut rels = String::new();
    let mut media = Vec::new();

    rels.push_str(
        r#"<Relationship Id="rIdStyles" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
    );

    for (i, img) in images.iter().enumerate() {
        let n = i + 1;
        let rid = format!("rId{}", n + 10);
        body.push_str(&format!(
            r#"<w:p><w:r><w:t>Paragraph {n}</w:t></w:r></w:p><w:p><w:r><w:drawing><wp:inline><wp:extent cx="5715000" cy="4286250"/><a:graphic><a:graphicData><pic:pic><pic:blipFill><a:blip r:embed="{rid}"/></pic:blipFill></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#
        ));
        rels.push_str(&format!(
            r#"<Relationship Id="{rid}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image{n}.{}"/>"#,
            img.ext
        ));
        media.push((format!("word/media/image{n}.{}", img.ext), img.bytes.clone()));
    }

    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture"><w:body>{body}<w:p><w:r><w:t>The end</w:t></w:r></w:p></w:body></w:document>"#
    );
    let document_rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
    );

    let mut parts: Vec<(String, Vec<u8>)> = vec![
        ("[Content_Types].xml".into(), CONTENT_TYPES.as_bytes().to_vec()),
        ("_rels/.rels".into(), ROOT_RELS.as_bytes().to_vec()),
        ("word/document.xml".into(), document.into_bytes()),
        ("word/_rels/document.xml.rels".into(), document_rels.into_bytes()),
        ("word/styles.xml".into(), STYLES_XML.as_bytes().to_vec()),
    ];
    parts.extend(media);
    zip_parts(&parts)
}

pub fn zip_parts(parts: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, data) in parts {
        writer.start_file(name.as_str(), options).expect("start zip entry");
        writer.write_all(data).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// Decompressed content of `name` inside a zip, if present.
pub fn read_entry(zip_bytes: &[u8], name: &str) -> Option<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(zip_bytes)).expect("open zip");
    let mut entry = archive.by_name(name).ok()?;
    let mut data = Vec::new();
    entry.read_to_end(&mut data).expect("read zip entry");
    Some(data)
}

/// Entry names of a zip, in archive order.
pub fn entry_names(zip_bytes: &[u8]) -> Vec<String> {
    let archive = ZipArchive::new(Cursor::new(zip_bytes)).expect("open zip");
    archive.file_names().map(str::to_string).collect::<Vec<_>>()
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Default Extension="jpeg" ContentType="image/jpeg"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

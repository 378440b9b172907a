// 本文マークアップから画像参照 (r:embed / r:id) を文書順に収集する

use quick_xml::Reader;
use quick_xml::events::Event;

/// Relationship ids of the images referenced by a WordprocessingML part, in
/// document order. Repeated references are kept; the caller deduplicates.
///
/// Recognized references:
/// - DrawingML pictures: `<a:blip r:embed="rIdN"/>`
/// - legacy VML pictures: `<v:imagedata r:id="rIdN"/>`
pub fn image_references(xml: &[u8]) -> crate::error::Result<Vec<String>> {
    let mut reader = Reader::from_reader(xml);
    let mut ids = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                let wanted: &[u8] = match e.local_name().as_ref() {
                    b"blip" => b"embed",
                    b"imagedata" => b"id",
                    _ => continue,
                };
                for attr in e.attributes() {
                    let attr = attr?;
                    // r:id only; o:relid and unprefixed ids are other things.
                    let prefixed_r = attr
                        .key
                        .prefix()
                        .is_some_and(|p| p.as_ref() == b"r");
                    if prefixed_r && attr.key.local_name().as_ref() == wanted {
                        ids.push(attr.unescape_value()?.into_owned());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(ids)
}

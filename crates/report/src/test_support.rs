use lopdf::{dictionary, Document, Object, Stream};

/// Builds a minimal valid one-page PDF with a single text run — enough for
/// the assembler and pipeline tests to merge real documents.
pub(crate) fn one_page_pdf(text: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.4");

    let font_id = doc.add_object(dictionary! {
        "Type" => Object::Name(b"Font".to_vec()),
        "Subtype" => Object::Name(b"Type1".to_vec()),
        "BaseFont" => Object::Name(b"Helvetica".to_vec()),
    });

    let content = Stream::new(
        dictionary! {},
        format!("BT /F1 24 Tf 100 700 Td ({text}) Tj ET").into_bytes(),
    );
    let content_id = doc.add_object(Object::Stream(content));

    let page_id = doc.add_object(dictionary! {
        "Type" => Object::Name(b"Page".to_vec()),
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => Object::Reference(content_id),
        "Resources" => dictionary! {
            "Font" => dictionary! {
                "F1" => Object::Reference(font_id),
            },
        },
    });

    let pages_id = doc.add_object(dictionary! {
        "Type" => Object::Name(b"Pages".to_vec()),
        "Kids" => vec![Object::Reference(page_id)],
        "Count" => Object::Integer(1),
    });

    if let Ok(Object::Dictionary(ref mut dict)) = doc.get_object_mut(page_id) {
        dict.set("Parent", Object::Reference(pages_id));
    }

    let catalog_id = doc.add_object(dictionary! {
        "Type" => Object::Name(b"Catalog".to_vec()),
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

//! PDF builders shared by the integration tests

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};

/// A document with one page per entry of `pages` (each a list of text runs)
/// and an Info dictionary carrying `title`
pub fn build_pdf(pages: &[&[&str]], width: i64, height: i64, title: Option<&str>) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Times-Roman".to_vec())),
    ]));
    let resources = Dictionary::from_iter([(
        "Font",
        Object::Dictionary(Dictionary::from_iter([("F1", Object::Reference(font_id))])),
    )]);

    let mut kids = Vec::new();
    for runs in pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), 11.into()]),
            Operation::new("Td", vec![50.into(), (height - 60).into()]),
        ];
        for run in runs.iter() {
            operations.push(Operation::new("Tj", vec![Object::string_literal(*run)]));
            operations.push(Operation::new("Td", vec![0.into(), (-13).into()]));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations }.encode().unwrap();
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content));
        let page_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Dictionary(resources.clone())),
            ("MediaBox", Object::Array(vec![0.into(), 0.into(), width.into(), height.into()])),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
        ])),
    );

    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    if let Some(title) = title {
        let info_id = doc.add_object(Dictionary::from_iter([
            ("Title", Object::string_literal(title)),
            ("Author", Object::string_literal("Accounts Payable")),
        ]));
        doc.trailer.set("Info", Object::Reference(info_id));
    }

    let mut output = Vec::new();
    doc.save_to(&mut output).unwrap();
    output
}

/// Operands of the last `Tm` on page 1 as (x, y)
pub fn last_text_origin(pdf_bytes: &[u8]) -> (f32, f32) {
    let doc = Document::load_mem(pdf_bytes).unwrap();
    let page_id = *doc.get_pages().get(&1).unwrap();
    let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();

    let tm = content.operations.iter().rev()
        .find(|op| op.operator == "Tm")
        .expect("no Tm operator on page 1");
    (tm.operands[4].as_float().unwrap(), tm.operands[5].as_float().unwrap())
}

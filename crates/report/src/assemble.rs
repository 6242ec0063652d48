use lopdf::{Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("missing section: {0:?}")]
    MissingSection(PathBuf),
    #[error("empty section: {0:?}")]
    EmptySection(PathBuf),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("merged document is missing a {0} object")]
    Structure(&'static str),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Concatenates the report sections in order: title page, table,
/// counterparty list, graph. The merged result replaces the table section
/// in place (written to a temp file first, so a failed merge leaves the
/// original table section retrievable). The counterparty-list and graph
/// intermediates are deleted only after a successful merge.
pub fn merge_sections(
    title_page: &Path,
    table: &Path,
    counterparties: &Path,
    graph: &Path,
) -> Result<PathBuf, MergeError> {
    let sections = [title_page, table, counterparties, graph];
    for section in sections {
        check_section(section)?;
    }

    let documents = sections
        .iter()
        .map(|p| Document::load(p).map_err(MergeError::from))
        .collect::<Result<Vec<_>, _>>()?;
    let mut merged = merge_documents(documents)?;

    let tmp = table.with_extension("pdf.partial");
    merged.save(&tmp)?;
    std::fs::rename(&tmp, table)?;

    std::fs::remove_file(counterparties)?;
    std::fs::remove_file(graph)?;

    tracing::info!(artifact = %table.display(), "assembled final report");
    Ok(table.to_path_buf())
}

fn check_section(path: &Path) -> Result<(), MergeError> {
    let meta = std::fs::metadata(path)
        .map_err(|_| MergeError::MissingSection(path.to_path_buf()))?;
    if meta.len() == 0 {
        return Err(MergeError::EmptySection(path.to_path_buf()));
    }
    Ok(())
}

/// Standard lopdf page-tree merge: renumber every document into one id
/// space, collect pages, then rebuild a single Pages/Catalog pair.
fn merge_documents(documents: Vec<Document>) -> Result<Document, MergeError> {
    let mut max_id = 1;
    let mut pages: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for mut doc in documents {
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        for (_, object_id) in doc.get_pages() {
            let page = doc.get_object(object_id)?.to_owned();
            pages.insert(object_id, page);
        }
        objects.extend(doc.objects.clone());
    }

    let mut merged = Document::with_version("1.5");
    let mut catalog: Option<(ObjectId, Object)> = None;
    let mut page_tree: Option<(ObjectId, Object)> = None;

    for (object_id, object) in objects {
        match object.type_name().unwrap_or(b"") {
            b"Catalog" => {
                let id = catalog.as_ref().map(|(id, _)| *id).unwrap_or(object_id);
                catalog = Some((id, object));
            }
            b"Pages" => {
                if let Ok(dict) = object.as_dict() {
                    let mut dict = dict.clone();
                    if let Some((_, ref existing)) = page_tree {
                        if let Ok(existing) = existing.as_dict() {
                            dict.extend(existing);
                        }
                    }
                    let id = page_tree.as_ref().map(|(id, _)| *id).unwrap_or(object_id);
                    page_tree = Some((id, Object::Dictionary(dict)));
                }
            }
            b"Page" | b"Outlines" | b"Outline" => {}
            _ => {
                merged.objects.insert(object_id, object);
            }
        }
    }

    let (pages_id, pages_object) = page_tree.ok_or(MergeError::Structure("Pages"))?;
    let (catalog_id, catalog_object) = catalog.ok_or(MergeError::Structure("Catalog"))?;

    for (object_id, object) in &pages {
        if let Ok(dict) = object.as_dict() {
            let mut dict = dict.clone();
            dict.set("Parent", pages_id);
            merged.objects.insert(*object_id, Object::Dictionary(dict));
        }
    }

    if let Ok(dict) = pages_object.as_dict() {
        let mut dict = dict.clone();
        dict.set("Count", pages.len() as u32);
        dict.set(
            "Kids",
            pages.keys().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
        );
        merged.objects.insert(pages_id, Object::Dictionary(dict));
    }

    if let Ok(dict) = catalog_object.as_dict() {
        let mut dict = dict.clone();
        dict.set("Pages", pages_id);
        dict.remove(b"Outlines");
        merged.objects.insert(catalog_id, Object::Dictionary(dict));
    }

    merged.trailer.set("Root", catalog_id);
    merged.max_id = merged.objects.len() as u32;
    merged.renumber_objects();
    merged.compress();
    Ok(merged)
}

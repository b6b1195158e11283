//! Integration tests for StructuredData
//!
//! Loading, validated writes, instance bookkeeping and phantom handling.

mod common;

use assetkit_core::structured_data::LinkKind;
use assetkit_core::{DefinitionTree, PropertyError, Reference, StructuredData, Transport};
use serde_json::json;
use std::sync::Arc;

fn loaded() -> StructuredData {
    StructuredData::from_wire(&common::news_wire(), common::news_definition()).unwrap()
}

// ========== LOAD & QUERY ==========

#[test]
fn test_load_soap_and_query() {
    let data = loaded();

    assert_eq!(data.identifiers().len(), 13);
    assert_eq!(data.definition_id(), Some("dd-news"));
    assert_eq!(data.definition_path(), Some("/definitions/news"));
    assert!(!data.has_phantom_nodes());

    assert_eq!(data.text("contact;1;name").unwrap(), "Dean of Students");
    assert_eq!(data.sibling_count("contact;0").unwrap(), 2);
    assert_eq!(
        data.sibling_identifiers("contact;0;phone;1").unwrap(),
        vec!["contact;0;phone;0", "contact;0;phone;1"]
    );
    assert!(data.is_multiple("contact;0;phone;0").unwrap());
    assert!(data.is_required("title").unwrap());
    assert_eq!(data.possible_values("category").unwrap().len(), 3);
    assert_eq!(
        data.selections("audience").unwrap(),
        vec!["students", "alumni"]
    );

    let (kind, reference) = data.link("related").unwrap().unwrap();
    assert_eq!(kind, LinkKind::Page);
    assert_eq!(reference.id.as_deref(), Some("p42"));
}

#[test]
fn test_only_repeatable_fields_carry_positions() {
    let data = StructuredData::with_definition(common::news_definition());
    assert_eq!(&data.identifiers()[..3], &["title", "body", "published"]);
    assert!(data.has_identifier("contact;0"));
    assert!(data.has_identifier("contact;0;name"));
    assert!(data.has_identifier("contact;0;phone;1"));
    assert!(!data.has_identifier("title;0"));
    assert!(!data.has_identifier("contact;0;name;0"));

    let phone = data.node("contact;0;phone;1").unwrap();
    assert_eq!(phone.schema_path(), "contact;phone");
    assert_eq!(phone.index(), 1);
    assert_eq!(data.node("contact;0;name").unwrap().schema_path(), "contact;name");
}

#[test]
fn test_unknown_fqi() {
    let data = loaded();
    assert!(!data.has_identifier("contact;7"));
    assert!(data.node("contact;7").is_none());
    assert!(matches!(
        data.text("contact;7;name"),
        Err(PropertyError::NodeNotFound(_))
    ));
}

#[test]
fn test_blank_tree_honours_minimums() {
    let data = StructuredData::with_definition(common::news_definition());
    assert_eq!(data.sibling_count("contact;0;phone;0").unwrap(), 2);
    assert_eq!(data.text("category").unwrap(), "campus");
    assert_eq!(data.text("title").unwrap(), "");
    assert!(data.link("sidebar").unwrap().is_none());
}

// ========== VALUE WRITES ==========

#[test]
fn test_set_text_validation() {
    let mut data = loaded();
    assert!(matches!(
        data.set_text("title", ""),
        Err(PropertyError::EmptyValue { .. })
    ));
    assert!(matches!(
        data.set_text("category", "athletics"),
        Err(PropertyError::InvalidValue { .. })
    ));
    data.set_text("category", "sports").unwrap();
    assert_eq!(data.text("category").unwrap(), "sports");

    let mut blank = StructuredData::with_definition(common::news_definition());
    assert!(blank.set_text("published", "13-01-2024").is_err());
    blank.set_text("published", "01-13-2024").unwrap();
    assert!(blank.set_text("updated", "yesterday").is_err());
    blank.set_text("updated", "1714557600000").unwrap();
}

#[test]
fn test_set_selections() {
    let mut data = loaded();
    data.set_selections("audience", &["faculty"]).unwrap();
    assert_eq!(
        data.text("audience").unwrap(),
        "::CONTENT-XML-CHECKBOX::faculty"
    );
    assert!(data.set_selections("audience", &["staff"]).is_err());
    assert!(data
        .set_selections("category", &["campus", "sports"])
        .is_err());
    assert!(matches!(
        data.set_selections("title", &["x"]),
        Err(PropertyError::NodeKind { .. })
    ));
}

#[test]
fn test_asset_links() {
    let mut data = loaded();
    data.set_file("related", Reference::by_path("/docs/program.pdf"))
        .unwrap();
    let (kind, reference) = data.link("related").unwrap().unwrap();
    assert_eq!(kind, LinkKind::File);
    assert_eq!(reference.path.as_deref(), Some("/docs/program.pdf"));

    assert!(matches!(
        data.set_block("related", Reference::by_id("b1")),
        Err(PropertyError::InvalidValue { .. })
    ));
    data.clear_link("related").unwrap();
    assert!(data.link("related").unwrap().is_none());

    assert!(matches!(
        data.set_text("related", "x"),
        Err(PropertyError::NodeKind { .. })
    ));

    let mut blank = StructuredData::with_definition(common::news_definition());
    blank.set_block("sidebar", Reference::by_id("b1")).unwrap();
    assert!(blank.set_page("sidebar", Reference::by_id("p1")).is_err());
}

// ========== STRUCTURE ==========

#[test]
fn test_append_and_remove_siblings() {
    let mut data = loaded();
    let phone = data.append_sibling("contact;0;phone;0").unwrap();
    assert_eq!(phone, "contact;0;phone;2");
    assert_eq!(data.text(&phone).unwrap(), "");
    assert_eq!(data.text("contact;1;name").unwrap(), "Dean of Students");

    data.remove_last_sibling(&phone).unwrap();
    assert!(!data.has_identifier(&phone));
    assert!(matches!(
        data.remove_last_sibling("contact;0;phone;0"),
        Err(PropertyError::InstanceLimit { .. })
    ));

    assert!(matches!(
        data.append_sibling("title"),
        Err(PropertyError::NotMultiple(_))
    ));

    assert_eq!(data.append_sibling("contact;0").unwrap(), "contact;2");
    assert!(data.has_identifier("contact;2;phone;1"));
    assert_eq!(data.append_sibling("contact;1").unwrap(), "contact;3");
    assert!(matches!(
        data.append_sibling("contact;0"),
        Err(PropertyError::InstanceLimit { .. })
    ));
}

#[test]
fn test_set_instance_count() {
    let mut data = loaded();
    data.set_instance_count("contact;1", 4).unwrap();
    assert_eq!(data.sibling_count("contact;0").unwrap(), 4);

    data.set_instance_count("contact;3", 1).unwrap();
    assert_eq!(data.sibling_count("contact;0").unwrap(), 1);
    assert_eq!(data.text("contact;0;name").unwrap(), "Registrar");

    assert!(data.set_instance_count("contact;0", 0).is_err());
    assert!(data.set_instance_count("contact;0", 5).is_err());
}

#[test]
fn test_swap_and_move() {
    let mut data = loaded();
    data.swap_data("contact;0", "contact;1").unwrap();
    assert_eq!(data.text("contact;0;name").unwrap(), "Dean of Students");
    assert_eq!(data.text("contact;1;name").unwrap(), "Registrar");

    assert!(matches!(
        data.swap_data("contact;0;phone;0", "contact;1;phone;0"),
        Err(PropertyError::NotSiblings { .. })
    ));
    assert!(matches!(
        data.swap_data("contact;0", "title"),
        Err(PropertyError::NotMultiple(_))
    ));

    let moved = data.move_down("contact;1;phone;0").unwrap();
    assert_eq!(moved, "contact;1;phone;1");
    assert_eq!(data.text(&moved).unwrap(), "555-0100");
    let back = data.move_up(&moved).unwrap();
    assert_eq!(back, "contact;1;phone;0");
    assert_eq!(data.text(&back).unwrap(), "555-0100");

    assert!(data.move_up("contact;0").is_err());
    assert!(data.move_down("contact;1").is_err());
}

#[test]
fn test_copy_data_from() {
    let source = loaded();
    let mut target = StructuredData::with_definition(common::news_definition());
    let copied = target.copy_data_from(&source);

    assert_eq!(copied, 8);
    assert_eq!(target.text("title").unwrap(), "Commencement");
    assert_eq!(target.text("contact;0;phone;1").unwrap(), "555-0101");
    assert_eq!(target.link("related").unwrap().unwrap().0, LinkKind::Page);
    assert!(!target.has_identifier("contact;1"));
}

// ========== SEARCH ==========

#[test]
fn test_search_and_replace() {
    let mut data = loaded();
    assert_eq!(
        data.search_text("555-01"),
        vec!["contact;0;phone;0", "contact;0;phone;1"]
    );
    assert!(data.search_text("").is_empty());

    assert_eq!(data.replace_text("commencement", "graduation").unwrap(), 1);
    assert_eq!(
        data.text("body").unwrap(),
        "<p>Welcome to graduation week</p>"
    );
    assert_eq!(data.text("title").unwrap(), "Commencement");

    // choosers are not free text
    assert_eq!(data.replace_text("campus", "athletics").unwrap(), 0);
    assert_eq!(data.text("category").unwrap(), "campus");

    assert!(data.replace_text("", "x").is_err());
}

// ========== PHANTOMS ==========

#[test]
fn test_phantom_nodes() {
    let value = json!({"structuredDataNodes": [
        {"type": "text", "identifier": "title", "text": "A"},
        {"type": "text", "identifier": "title", "text": "B"},
        {"type": "text", "identifier": "subtitle", "text": "x"},
        {"type": "group", "identifier": "body", "structuredDataNodes": [
            {"type": "text", "identifier": "inner", "text": "y"}
        ]}
    ]});
    let mut data = StructuredData::from_wire(&value, common::news_definition()).unwrap();

    assert_eq!(
        data.phantom_identifiers(),
        vec!["title;1", "subtitle;0", "body;0", "body;0;inner;0"]
    );
    assert!(matches!(
        data.set_text("subtitle;0", "z"),
        Err(PropertyError::PhantomNode(_))
    ));
    assert!(data.field_definition("subtitle;0").is_none());
    assert!(data.field_definition("title").is_some());

    assert_eq!(data.remove_phantom_nodes(), 4);
    assert_eq!(data.identifiers(), &["title"]);
    assert!(!data.has_phantom_nodes());
    assert_eq!(data.remove_phantom_nodes(), 0);
}

#[test]
fn test_stray_node_is_not_an_instance() {
    let mut wire = common::news_wire();
    wire["structuredDataNodes"]["structuredDataNode"]
        .as_array_mut()
        .unwrap()
        .push(json!({"type": "text", "identifier": "contact", "text": "stale"}));

    let mut data = StructuredData::from_wire(&wire, common::news_definition()).unwrap();
    assert_eq!(data.phantom_identifiers(), vec!["contact;2"]);
    assert_eq!(data.sibling_count("contact;0").unwrap(), 2);
    assert_eq!(
        data.sibling_identifiers("contact;1").unwrap(),
        vec!["contact;0", "contact;1"]
    );
    assert!(matches!(
        data.sibling_count("contact;2"),
        Err(PropertyError::PhantomNode(_))
    ));

    // removal takes the last group and leaves the stray node alone
    data.remove_last_sibling("contact;0").unwrap();
    assert_eq!(data.sibling_count("contact;0").unwrap(), 1);
    assert_eq!(data.text("contact;0;name").unwrap(), "Registrar");
    assert_eq!(data.phantom_identifiers(), vec!["contact;1"]);
    assert_eq!(data.text("contact;1").unwrap(), "stale");

    // the stray node does not count toward the maximum of four
    let mut data = StructuredData::from_wire(&wire, common::news_definition()).unwrap();
    assert_eq!(data.append_sibling("contact;0").unwrap(), "contact;2");
    assert_eq!(data.append_sibling("contact;0").unwrap(), "contact;3");
    assert!(matches!(
        data.append_sibling("contact;0"),
        Err(PropertyError::InstanceLimit { .. })
    ));
    assert_eq!(data.phantom_identifiers(), vec!["contact;4"]);
}

#[test]
fn test_asset_type_mismatch_is_phantom() {
    let mut wire = common::news_wire();
    let nodes = wire["structuredDataNodes"]["structuredDataNode"]
        .as_array_mut()
        .unwrap();
    nodes.push(json!({
        "type": "asset", "identifier": "sidebar", "assetType": "file", "fileId": "f1"
    }));
    nodes.push(json!({
        "type": "asset", "identifier": "sidebar", "assetType": "block", "blockId": "b1"
    }));

    let mut data = StructuredData::from_wire(&wire, common::news_definition()).unwrap();
    assert_eq!(data.phantom_identifiers(), vec!["sidebar;1"]);
    assert_eq!(data.link("sidebar").unwrap().unwrap().0, LinkKind::Block);
    assert!(matches!(
        data.set_file("sidebar;1", Reference::by_id("f2")),
        Err(PropertyError::PhantomNode(_))
    ));

    assert_eq!(data.remove_phantom_nodes(), 1);
    assert!(!data.has_identifier("sidebar;1"));
    assert!(data.has_identifier("sidebar"));
}

#[test]
fn test_narrower_definition_creates_phantoms() {
    let mut data = loaded();
    let narrow = DefinitionTree::from_value(&json!({"fields": [
        {"identifier": "title", "type": "text"},
        {"identifier": "contact", "type": "group", "multiple": true, "fields": [
            {"identifier": "name", "type": "text"}
        ]}
    ]}))
    .unwrap();
    data.set_definition(Arc::new(narrow));

    let phantoms = data.phantom_identifiers();
    assert!(phantoms.contains(&"body;0".to_string()));
    assert!(phantoms.contains(&"contact;1;phone;1".to_string()));
    assert!(!phantoms.contains(&"contact;1;name".to_string()));
}

#[test]
fn test_phantom_values() {
    let mut wire = common::news_wire();
    let nodes = wire["structuredDataNodes"]["structuredDataNode"]
        .as_array_mut()
        .unwrap();
    nodes[2]["text"] = json!("alumni-news");
    nodes[3]["text"] = json!("::CONTENT-XML-CHECKBOX::students::CONTENT-XML-CHECKBOX::staff");
    let mut data = StructuredData::from_wire(&wire, common::news_definition()).unwrap();

    assert!(data.has_phantom_values());
    assert_eq!(data.phantom_values(), vec!["category", "audience"]);

    assert_eq!(data.remove_phantom_values(), 2);
    assert_eq!(data.text("category").unwrap(), "campus");
    assert_eq!(data.selections("audience").unwrap(), vec!["students"]);
    assert!(!data.has_phantom_values());
}

// ========== WIRE ==========

#[test]
fn test_to_wire_dialects() {
    let data = loaded();

    let rest = data.to_wire(Transport::Rest);
    assert_eq!(rest["definitionId"], json!("dd-news"));
    let nodes = rest["structuredDataNodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 7);
    assert_eq!(nodes[4]["pageId"], json!("p42"));
    assert_eq!(nodes[5]["structuredDataNodes"][2]["text"], json!("555-0101"));

    let soap = data.to_wire(Transport::Soap);
    assert_eq!(
        soap["structuredDataNodes"]["structuredDataNode"][0]["identifier"],
        json!("title")
    );

    let reloaded = StructuredData::from_wire(&rest, common::news_definition()).unwrap();
    assert_eq!(reloaded.identifiers(), data.identifiers());
}

#[test]
fn test_rejects_malformed_nodes() {
    let value = json!({"structuredDataNodes": [
        {"type": "widget", "identifier": "title"}
    ]});
    assert!(StructuredData::from_wire(&value, common::news_definition()).is_err());
    assert!(StructuredData::from_wire(&json!([]), common::news_definition()).is_err());
}

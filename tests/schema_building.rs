//! Integration tests for schema construction and raw-schema conversion.

use fluent_llm::drivers::gemini::options::{enum_values, nullable};
use fluent_llm::drivers::{BackendDriver, GeminiDriver, MockDriver};
use fluent_llm::schema::{Schema, SchemaBuilder, SchemaKind};
use fluent_llm::Model;
use schemars::JsonSchema;
use serde_json::json;
use std::collections::BTreeSet;

fn mock_model() -> Model<MockDriver> {
    Model::new(MockDriver::new(), "mock-1").unwrap()
}

fn gemini_model() -> Model<GeminiDriver> {
    Model::new(GeminiDriver::new(), "gemini-2.0-flash").unwrap()
}

fn child_names(schema: &Schema) -> BTreeSet<&str> {
    schema.properties().iter().map(Schema::name).collect()
}

fn required_names(schema: &Schema) -> BTreeSet<&str> {
    schema
        .required_properties()
        .iter()
        .map(String::as_str)
        .collect()
}

fn sample<D: BackendDriver>(b: &SchemaBuilder<D>) -> Schema {
    b.object(
        "order",
        vec![
            b.string("id", vec![b.required(), b.description("Order number")]).into(),
            b.integer("quantity", vec![b.required()]).into(),
            b.number("price", vec![]).into(),
            b.boolean("gift", vec![]).into(),
            b.array(
                "items",
                vec![b
                    .object("item", vec![b.string("sku", vec![b.required()]).into()])
                    .into()],
            )
            .into(),
        ],
    )
}

#[test]
fn test_object_with_required_and_optional_child() {
    let model = mock_model();
    let b = model.new_schema();
    let o = b.object(
        "o",
        vec![
            b.string("s", vec![b.required()]).into(),
            b.integer("n", vec![]).into(),
        ],
    );

    assert_eq!(o.kind(), SchemaKind::Object);
    assert_eq!(child_names(&o), BTreeSet::from(["s", "n"]));
    assert_eq!(o.required_properties(), ["s"]);
    assert!(o.property("s").unwrap().is_required());
    assert!(!o.property("n").unwrap().is_required());
}

#[test]
fn test_description_applies_to_one_node() {
    let model = mock_model();
    let b = model.new_schema();
    let o = b.object(
        "o",
        vec![
            b.string("a", vec![b.description("hello")]).into(),
            b.string("b", vec![]).into(),
        ],
    );

    assert_eq!(o.description(), None);
    assert_eq!(o.property("a").unwrap().description(), Some("hello"));
    assert_eq!(o.property("b").unwrap().description(), None);
}

#[test]
fn test_integer_options_are_applied() {
    let model = mock_model();
    let b = model.new_schema();
    let n = b.integer("n", vec![b.required(), b.description("count")]);
    assert!(n.is_required());
    assert_eq!(n.description(), Some("count"));
}

#[test]
#[should_panic(expected = "accepts only option arguments")]
fn test_schema_argument_to_string_panics() {
    let model = mock_model();
    let b = model.new_schema();
    let child = b.string("inner", vec![]);
    b.string("outer", vec![child.into()]);
}

#[test]
fn test_try_constructors_return_configuration_errors() {
    let model = mock_model();
    let b = model.new_schema();

    let err = b
        .try_boolean("flag", vec![b.string("inner", vec![]).into()])
        .unwrap_err();
    assert!(err.is_configuration());

    let err = b
        .try_array(
            "pair",
            vec![b.string("a", vec![]).into(), b.string("b", vec![]).into()],
        )
        .unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_children_from_another_backend_are_rejected() {
    let mock = mock_model();
    let gemini = gemini_model();
    let foreign = gemini.new_schema().string("s", vec![]);

    let err = mock
        .new_schema()
        .try_object("o", vec![foreign.into()])
        .unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_gemini_options_reach_the_encoding() {
    let model = gemini_model();
    let b = model.new_schema();
    let schema = b.object(
        "ticket",
        vec![b
            .string("status", vec![enum_values(["open", "closed"]), nullable()])
            .into()],
    );

    let raw: serde_json::Value = serde_json::from_slice(&b.to_raw_schema(&schema).unwrap()).unwrap();
    assert_eq!(raw["properties"]["status"]["type"], "STRING");
    assert_eq!(raw["properties"]["status"]["enum"], json!(["open", "closed"]));
    assert_eq!(raw["properties"]["status"]["nullable"], true);
}

fn assert_round_trip<D: BackendDriver>(b: &SchemaBuilder<D>) {
    let original = sample(b);
    let raw = b.to_raw_schema(&original).unwrap();
    let parsed = b.from_raw_schema(&raw).unwrap();

    assert_eq!(parsed.kind(), original.kind());
    assert_eq!(parsed.name(), original.name());
    assert_eq!(parsed.backend(), original.backend());
    assert_eq!(child_names(&parsed), child_names(&original));
    assert_eq!(required_names(&parsed), required_names(&original));
    assert_eq!(
        parsed.property("id").unwrap().description(),
        Some("Order number")
    );

    let items = parsed.property("items").unwrap().items().unwrap();
    assert_eq!(items.kind(), SchemaKind::Object);
    assert_eq!(required_names(items), BTreeSet::from(["sku"]));
}

#[test]
fn test_round_trip_gemini_encoding() {
    let model = gemini_model();
    assert_round_trip(&model.new_schema());
}

#[test]
fn test_round_trip_json_schema_encoding() {
    let model = mock_model();
    assert_round_trip(&model.new_schema());
}

#[test]
fn test_to_raw_schema_rejects_foreign_schema() {
    let gemini = gemini_model();
    let schema = sample(&mock_model().new_schema());
    assert!(gemini
        .new_schema()
        .to_raw_schema(&schema)
        .unwrap_err()
        .is_configuration());
}

#[test]
fn test_malformed_raw_schema_is_parse_error() {
    let model = gemini_model();
    let err = model.new_schema().from_raw_schema(b"{not json").unwrap_err();
    assert!(err.is_parse());

    let err = model
        .new_schema()
        .from_raw_schema(br#"{"type": "TUPLE"}"#)
        .unwrap_err();
    assert!(err.is_parse());
}

#[allow(dead_code)]
#[derive(JsonSchema)]
struct LineItem {
    sku: String,
    quantity: u32,
}

#[allow(dead_code)]
#[derive(JsonSchema)]
struct Invoice {
    /// Invoice number as printed.
    number: String,
    total: f64,
    paid: bool,
    lines: Vec<LineItem>,
    note: Option<String>,
}

#[test]
fn test_from_type_for_each_backend() {
    fn check<D: BackendDriver>(b: &SchemaBuilder<D>) {
        let schema = b.from_type::<Invoice>().unwrap();
        assert_eq!(schema.name(), "Invoice");
        assert_eq!(schema.backend(), b.backend());
        assert_eq!(
            child_names(&schema),
            BTreeSet::from(["number", "total", "paid", "lines", "note"])
        );
        assert_eq!(
            required_names(&schema),
            BTreeSet::from(["number", "total", "paid", "lines"])
        );
        assert_eq!(
            schema.property("number").unwrap().description(),
            Some("Invoice number as printed.")
        );
        assert_eq!(schema.property("total").unwrap().kind(), SchemaKind::Number);
        assert_eq!(
            schema.property("note").unwrap().extension("nullable"),
            Some(&json!(true))
        );

        let lines = schema.property("lines").unwrap();
        assert_eq!(lines.kind(), SchemaKind::Array);
        let line = lines.items().unwrap();
        assert_eq!(line.kind(), SchemaKind::Object);
        assert_eq!(line.property("quantity").unwrap().kind(), SchemaKind::Integer);
    }

    check(&gemini_model().new_schema());
    check(&mock_model().new_schema());
}

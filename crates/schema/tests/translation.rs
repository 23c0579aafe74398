use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use serde_json::json;
use thing_schema::{
	path_template, route_parameters, to_wire_schema, Field, ParamType, ParameterLocation,
	ParameterOverride, ParameterSchema, RouteRule, Schema, SchemaError, SchemaInput,
};

#[test]
fn one_template_slot_per_placeholder() {
	let cases = [
		("/", "/"),
		("/properties/<name>", "/properties/{name}"),
		(
			"/a/<int:x>/b/<float:y>/c/<string(length=4):z>",
			"/a/{x}/b/{y}/c/{z}",
		),
		("/literal-<id>-suffix", "/literal-{id}-suffix"),
	];

	for (pattern, expected) in cases {
		let rule = RouteRule::parse(pattern).unwrap();
		assert_eq!(path_template(&rule), expected, "pattern {pattern}");
	}
}

#[test]
fn unknown_converters_fall_back_to_string() {
	let rule = RouteRule::parse("/<uuid:id>/<any(a,b):which>").unwrap();

	for param in route_parameters(&rule, &IndexMap::new()) {
		assert_eq!(param.schema, ParameterSchema::new(ParamType::String));
		assert_eq!(param.location, ParameterLocation::Path);
		assert!(param.required);
	}
}

#[test]
fn overrides_win_field_by_field() {
	let rule = RouteRule::parse("/<int:id>").unwrap().with_default("id", 1);

	let overrides = [(
		"id".to_string(),
		ParameterOverride {
			required: Some(false),
			default: Some(json!(7)),
			..Default::default()
		},
	)]
	.into_iter()
	.collect::<IndexMap<_, _>>();

	let params = route_parameters(&rule, &overrides);

	assert_eq!(params.len(), 1);
	assert!(!params[0].required);
	assert_eq!(params[0].default, Some(json!(7)));
	assert_eq!(
		params[0].schema,
		ParameterSchema::new(ParamType::Integer).with_format("int32")
	);
}

#[test]
fn header_overrides_are_appended() {
	let rule = RouteRule::parse("/things").unwrap();

	let overrides = [(
		"X-Token".to_string(),
		ParameterOverride {
			location: Some(ParameterLocation::Header),
			required: Some(true),
			..Default::default()
		},
	)]
	.into_iter()
	.collect::<IndexMap<_, _>>();

	assert_eq!(
		serde_json::to_value(route_parameters(&rule, &overrides)).unwrap(),
		json!([{"in": "header", "name": "X-Token", "required": true, "schema": {"type": "string"}}])
	);
}

#[test]
fn wire_schema_is_structure_only() {
	let schema = Schema::new()
		.with_field("id", Field::uuid().required())
		.with_field("tags", Field::list(Field::string()))
		.with_field("extra", Field::dict());

	assert_eq!(
		serde_json::to_value(to_wire_schema(&SchemaInput::Schema(schema)).unwrap()).unwrap(),
		json!({
			"type": "object",
			"properties": {
				"id": {"type": "string", "format": "uuid"},
				"tags": {"type": "array", "items": {"type": "string"}},
				"extra": {"type": "object"}
			},
			"required": ["id"]
		})
	);
}

#[test]
fn deeply_nested_mappings() {
	let mut input = SchemaInput::Field(Field::boolean());
	for depth in 0..32 {
		input = [(format!("level{depth}"), input)].into_iter().collect();
	}

	let mut node = to_wire_schema(&input).unwrap();
	for depth in (0..32).rev() {
		node = node
			.properties
			.and_then(|mut properties| properties.swap_remove(&format!("level{depth}")))
			.unwrap();
	}

	assert_eq!(serde_json::to_value(node).unwrap(), json!({"type": "boolean"}));
}

#[test]
fn prebuilt_schema_in_mapping_is_rejected() {
	let input = [
		("ok", SchemaInput::Field(Field::string())),
		("bad", SchemaInput::Schema(Schema::new())),
	]
	.into_iter()
	.collect::<SchemaInput>();

	assert!(matches!(
		to_wire_schema(&input),
		Err(SchemaError::TypeMismatch { .. })
	));
}

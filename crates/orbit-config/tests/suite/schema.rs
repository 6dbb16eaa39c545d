use orbit_config::json_schema;

#[test]
fn json_schema_describes_dependencies_section() {
    let value = serde_json::to_value(json_schema()).expect("schema serializes");

    let builtins = value
        .pointer("/definitions/BuiltinsLoadingState/enum")
        .and_then(|v| v.as_array())
        .expect("builtins enum is present");
    assert!(builtins.contains(&serde_json::json!("class-loader")));
    assert!(builtins.contains(&serde_json::json!("dependencies")));

    assert!(value
        .pointer("/definitions/DependenciesConfig/properties/core_library_prefixes")
        .is_some());
}

#[test]
fn json_schema_rejects_unknown_top_level_fields() {
    let value = serde_json::to_value(json_schema()).expect("schema serializes");
    assert_eq!(
        value.get("additionalProperties").and_then(|v| v.as_bool()),
        Some(false)
    );
}

use pg_keen::prelude::*;
use serde::Serialize;
use serde_json::json;

#[test]
fn test1_report_query_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let template = "SELECT u.id, u.meta->>'plan' AS plan, u.created_at::date
FROM users u
WHERE u.org_id = :org.id
  AND u.created_at >= :since::timestamptz -- since is inclusive, :until is not used
  AND (u.role = :role OR :role IS NULL)
ORDER BY u.id";

    let extracted = extract(template);
    assert_eq!(extracted.names, vec!["org.id", "since", "role"]);
    assert!(extracted.text.contains("u.org_id = $1"));
    assert!(extracted.text.contains("$2::timestamptz -- since is inclusive, :until is not used"));
    assert!(extracted.text.contains("(u.role = $3 OR $3 IS NULL)"));
    assert!(extracted.text.contains("u.created_at::date"));

    let bound = bind_strict(
        template,
        &json!({ "org": { "id": 12 }, "since": "2024-01-01", "role": null }),
    )?;
    assert_eq!(
        bound.values,
        vec![
            RowValues::Int(12),
            RowValues::Text("2024-01-01".into()),
            RowValues::Null,
        ]
    );
    Ok(())
}

#[test]
fn test1_array_index_paths() {
    let bound = bind(
        "INSERT INTO pairs (a, b) VALUES (:items.0, :items.1)",
        &json!({ "items": ["left", "right"] }),
    );
    assert_eq!(bound.text, "INSERT INTO pairs (a, b) VALUES ($1, $2)");
    assert_eq!(
        bound.values,
        vec![RowValues::Text("left".into()), RowValues::Text("right".into())]
    );
}

#[test]
fn test1_many_params_keep_their_own_index() {
    let names: Vec<String> = (1..=12).map(|i| format!("p{i}")).collect();
    let template = names
        .iter()
        .map(|n| format!(":{n}"))
        .collect::<Vec<_>>()
        .join(", ");
    let params: serde_json::Map<String, serde_json::Value> = names
        .iter()
        .enumerate()
        .map(|(i, n)| (n.clone(), json!(i + 1)))
        .collect();

    let bound = bind(&format!("SELECT {template}"), &json!(params));
    let expected = (1..=12).map(|i| format!("${i}")).collect::<Vec<_>>().join(", ");
    assert_eq!(bound.text, format!("SELECT {expected}"));
    for (i, value) in bound.values.iter().enumerate() {
        assert_eq!(value.as_int(), Some(&((i + 1) as i64)));
    }
}

#[test]
fn test1_structs_bind_by_field_name() -> Result<(), Box<dyn std::error::Error>> {
    #[derive(Serialize)]
    struct Filter<'a> {
        name: &'a str,
        limit: i64,
    }

    let bound = bind_serialize(
        "SELECT * FROM t WHERE name = :name LIMIT :limit",
        &Filter { name: "x", limit: 5 },
    )?;
    assert_eq!(bound.values, vec![RowValues::Text("x".into()), RowValues::Int(5)]);
    Ok(())
}

#[test]
fn test1_missing_values_by_policy() {
    let template = "UPDATE t SET v = :v WHERE id = :id";
    let params = json!({ "id": 1 });

    let relaxed = extract(template).bind_with(&params, MissingParamPolicy::PassThrough);
    assert_eq!(
        relaxed.map(|b| b.values).ok(),
        Some(vec![RowValues::Missing, RowValues::Int(1)])
    );

    let strict = extract(template).bind_with(&params, MissingParamPolicy::Strict);
    assert!(matches!(strict, Err(PgKeenError::MissingParameter { name }) if name == "v"));
}

#[test]
fn test1_shared_cache_matches_fresh_parse() {
    let cache = TemplateCache::default();
    let templates = [
        "SELECT :a",
        "SELECT :a, :a.b::int",
        "SELECT 1 -- :ignored",
        "SELECT :x1, :x10, :x",
    ];
    for template in templates {
        let cached = NamedQuery::cached(template, &cache);
        assert_eq!(cached.extracted(), &extract(template));
    }
    assert_eq!(cache.len(), templates.len());

    let again = NamedQuery::cached("SELECT :a", &cache);
    assert_eq!(again.names(), ["a"]);
    assert_eq!(cache.len(), templates.len());
}

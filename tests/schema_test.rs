use cqlkit::prelude::*;
use cqlkit::schema::{PRIMARY_KEY, Structure};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::cell::RefCell;

fn structure(entries: &[(&str, &str)]) -> Structure {
    entries
        .iter()
        .map(|(name, expr)| {
            let decl = if *name == PRIMARY_KEY {
                Declaration::Value(Value::from(*expr))
            } else {
                Declaration::Type(cqlkit::parse_type(expr).unwrap())
            };
            (name.to_string(), decl)
        })
        .collect()
}

#[test]
fn test_compile_matrix() {
    let ok = Schema::compile(structure(&[("id", "uuid primary key"), ("name", "text")])).unwrap();
    assert_eq!(ok.primary_columns(), vec!["id"]);
    assert!(ok.key().is_none());

    let pseudo = Schema::compile(structure(&[("name", "text"), (PRIMARY_KEY, "name")])).unwrap();
    assert_eq!(pseudo.key(), Some(&KeySpec::Single("name".into())));
    assert!(pseudo.is_primary("name"));

    let missing = Schema::compile(structure(&[("name", "text")])).unwrap_err();
    assert!(matches!(missing, CqlError::Config(_)));
    assert_eq!(missing.to_string(), "Configuration error: No primary key has been set.");

    let unknown = Schema::compile(structure(&[("name", "text"), (PRIMARY_KEY, "email")])).unwrap_err();
    assert!(matches!(unknown, CqlError::Reference(_)));

    let not_a_type = Schema::compile(vec![
        ("id".to_string(), SchemaType::uuid().primary_key().into()),
        ("name".to_string(), Declaration::Value(Value::Int(1))),
    ])
    .unwrap_err();
    assert!(matches!(not_a_type, CqlError::Type(_)));
}

#[test]
fn test_composite_key_create_table() {
    let schema = Schema::builder()
        .column("id", SchemaType::uuid())
        .column("username", SchemaType::text())
        .column("age", SchemaType::int())
        .column("emails", SchemaType::set(SchemaType::text()))
        .primary_key(KeySpec::partitioned(["id", "username"], ["age"]))
        .build()
        .unwrap();
    let table = Table::new("users", schema).unwrap();

    assert_eq!(
        table.create(true).unwrap().to_cql(),
        "CREATE TABLE IF NOT EXISTS users (id uuid, username text, age int, emails set<text>, PRIMARY KEY ((id, username), age));"
    );
}

#[test]
fn test_type_expressions() {
    for expr in ["text", "map<text, int>", "list<timestamp>", "set<uuid>"] {
        assert_eq!(cqlkit::parse_type(expr).unwrap().to_string(), expr);
    }
    assert!(cqlkit::parse_type("TEXT PRIMARY KEY").unwrap().is_primary());

    let err = cqlkit::parse_type("map<text, frob>").unwrap_err();
    assert!(matches!(err, CqlError::Parse { position: 10, .. }));
}

#[test]
fn test_catalog_from_toml() {
    let config: Config = r#"
consistency = "local_quorum"

[tables.users]
id = "uuid"
username = "text"
age = "int"
PRIMARY_KEY = [["id", "username"], "age"]
"#
    .parse()
    .unwrap();

    let mut catalog = Catalog::from_config(&config).unwrap();
    let users = catalog.table("users", None).unwrap();
    let model = catalog.model("users", Some(users.clone())).unwrap();

    let stmt = model.find([("username", "frodo")]).unwrap();
    assert_eq!(stmt.to_cql(), "SELECT * FROM users WHERE username = 'frodo';");

    let seen = RefCell::new(Vec::new());
    let executor = |cql: &str, options: &ExecOptions| -> CqlResult<Vec<Row>> {
        seen.borrow_mut().push((cql.to_string(), options.consistency));
        let row = json!({"username": "frodo", "age": null, "__columns": ["username"]});
        match row {
            serde_json::Value::Object(map) => Ok(vec![map]),
            _ => unreachable!(),
        }
    };

    let rows = stmt.execute(&executor, &catalog.exec_options()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].keys().collect::<Vec<_>>(), vec!["username"]);
    assert_eq!(
        seen.into_inner(),
        vec![(
            "SELECT * FROM users WHERE username = 'frodo';".to_string(),
            Consistency::LocalQuorum
        )]
    );

    let err = catalog.model("users", Some(Table::new("users", users.schema().as_ref().clone()).unwrap()));
    assert!(matches!(err, Err(CqlError::Invariant(_))));
}

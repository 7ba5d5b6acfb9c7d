//! QuerySet execution against an in-memory SQLite database

use nemi_db::{Database, DatabaseError, Filter, QuerySet};
use rstest::*;
use serde_json::{Value, json};

#[fixture]
async fn db() -> Database {
	let db = Database::connect_in_memory().await.unwrap();
	db.apply_schema().await.unwrap();
	db.execute_script(
		"INSERT INTO method_vw (method_id, source_method_identifier, method_source, media_name, method_type_id, pbt)
		 VALUES (10, 'EPA-200.7', 'EPA', 'WATER', 1, 'N'),
		        (10, 'EPA-200.7', 'EPA', 'WATER', 1, 'N'),
		        (11, 'ASTM-D5673', 'ASTM', 'WATER', 2, NULL),
		        (12, 'USGS-I-1472', 'USGS', 'SEDIMENT', 3, 'Y');
		 INSERT INTO definitions_dom (definition_abbrev, definition_name, definition_description)
		 VALUES ('MEDIA_NAME', 'Media', 'Sample matrix'),
		        ('GEAR_TYPE', 'Gear', 'Sampling gear'),
		        ('GEAR_TYPE', 'Gear type', 'Duplicate entry');",
	)
	.await
	.unwrap();
	db
}

#[rstest]
#[tokio::test]
async fn test_values_distinct_order(#[future] db: Database) {
	// Arrange
	let db = db.await;
	let qs = QuerySet::new("method_vw")
		.filter(Filter::eq("media_name", "WATER"))
		.values(&["method_id", "source_method_identifier"])
		.distinct()
		.order_by(&["-method_id"]);

	// Act
	let rows = qs.fetch(&db).await.unwrap();

	// Assert
	assert_eq!(rows.len(), 2);
	assert_eq!(rows[0]["method_id"], 11);
	assert_eq!(
		rows[1].keys().collect::<Vec<_>>(),
		vec!["method_id", "source_method_identifier"]
	);
}

#[rstest]
#[tokio::test]
async fn test_fetch_values_is_positional(#[future] db: Database) {
	// Arrange
	let db = db.await;

	// Act
	let rows = QuerySet::new("method_vw")
		.values(&["source_method_identifier", "pbt"])
		.filter(Filter::eq("method_id", 11_i64))
		.fetch_values(&db)
		.await
		.unwrap();

	// Assert
	assert_eq!(rows, vec![vec![json!("ASTM-D5673"), Value::Null]]);
}

#[rstest]
#[tokio::test]
async fn test_exclude_keeps_null_columns(#[future] db: Database) {
	// Arrange
	let db = db.await;

	// Act
	let count = QuerySet::new("method_vw")
		.exclude(Filter::eq("pbt", "Y"))
		.count(&db)
		.await
		.unwrap();

	// Assert
	assert_eq!(count, 3);
}

#[rstest]
#[tokio::test]
async fn test_in_and_contains(#[future] db: Database) {
	// Arrange
	let db = db.await;

	// Act
	let ids = QuerySet::new("method_vw")
		.filter(Filter::is_in("method_type_id", vec![1_i64, 3]))
		.filter(Filter::contains("method_source", "S"))
		.values(&["method_id"])
		.fetch_column(&db)
		.await
		.unwrap();

	// Assert
	assert_eq!(ids, vec![json!(12)]);
}

#[rstest]
#[tokio::test]
async fn test_get_reports_missing_and_duplicate(#[future] db: Database) {
	// Arrange
	let db = db.await;
	let base = QuerySet::new("definitions_dom");

	// Act
	let found = base
		.clone()
		.filter(Filter::eq("definition_abbrev", "MEDIA_NAME"))
		.get(&db)
		.await;
	let missing = base
		.clone()
		.filter(Filter::eq("definition_abbrev", "PBT"))
		.get(&db)
		.await;
	let duplicate = base
		.filter(Filter::eq("definition_abbrev", "GEAR_TYPE"))
		.get(&db)
		.await;

	// Assert
	assert_eq!(found.unwrap()["definition_name"], "Media");
	assert!(matches!(missing, Err(DatabaseError::NotFound(_))));
	assert!(matches!(duplicate, Err(DatabaseError::MultipleObjectsReturned(_))));
}

#[rstest]
#[tokio::test]
async fn test_aggregate_max(#[future] db: Database) {
	// Arrange
	let db = db.await;

	// Act
	let max = QuerySet::new("method_vw")
		.aggregate_max(&db, "method_id")
		.await
		.unwrap();
	let empty = QuerySet::new("source_citation_ref")
		.aggregate_max(&db, "source_citation_id")
		.await
		.unwrap();

	// Assert
	assert_eq!(max, json!(12));
	assert_eq!(empty, Value::Null);
}

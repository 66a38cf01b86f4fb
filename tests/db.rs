mod common;

#[test]
fn test_creates_and_removes_db_files() {
    let test_db = common::TestDb::new("test_creates_and_removes_db_files.db");
    let conn = test_db.pool().get();
    assert!(conn.is_ok());
}

#[test]
fn test_pool_enables_foreign_keys() {
    use diesel::RunQueryDsl;
    use diesel::sql_types::Integer;

    #[derive(diesel::QueryableByName)]
    struct ForeignKeys {
        #[diesel(sql_type = Integer)]
        foreign_keys: i32,
    }

    let test_db = common::TestDb::new("test_pool_enables_foreign_keys.db");
    let mut conn = test_db.pool().get().unwrap();
    let pragma: ForeignKeys = diesel::sql_query("PRAGMA foreign_keys")
        .get_result(&mut conn)
        .unwrap();
    assert_eq!(pragma.foreign_keys, 1);
}

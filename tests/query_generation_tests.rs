mod common;

use std::sync::Arc;
use common::{Customer, Order};
use pretty_assertions::assert_eq;
use structdb::schema::StructureSchema;
use structdb::sql::{DbQueryGenerator, PagingStrategy, SqlDialect, SqlStatements};
use structdb::{DbError, Expr, QueryCommand, StructureId, Value};

fn generator(dialect: SqlDialect) -> DbQueryGenerator {
    DbQueryGenerator::new(Arc::new(SqlStatements::for_dialect(dialect)))
}

fn customers() -> QueryCommand {
    let schema = StructureSchema::<Customer>::derive().unwrap();
    QueryCommand::for_schema(&schema)
}

const JOIN_0: &str = "left join [Customer_indexes] mem0 on mem0.[StructureId] = s.[StructureId]";
const JOIN_1: &str = "left join [Customer_indexes] mem1 on mem1.[StructureId] = s.[StructureId]";

#[test]
fn test_plain_listing_joins_indexes_once_without_grouping() {
    let query = generator(SqlDialect::Sql2008).generate_query(&customers()).unwrap();

    assert_eq!(
        query.sql,
        "select s.[Json] from [Customer_structure] s \
         inner join [Customer_indexes] si on si.[StructureId] = s.[StructureId];"
    );
    assert!(query.params.is_empty());
}

#[test]
fn test_filtered_sorted_listing_with_take() {
    let command = customers()
        .filter(Expr::member("age").gt(18))
        .order_by("name")
        .take(5);
    let query = generator(SqlDialect::Sql2008).generate_query(&command).unwrap();

    assert_eq!(
        query.sql,
        format!(
            "select top(@take) s.[Json] from [Customer_structure] s inner join [Customer_indexes] si on si.[StructureId] = s.[StructureId] {} {} where mem0.[age] > @p0 \
             group by s.[StructureId], s.[Json] order by min(mem1.[name]) asc;",
            JOIN_0, JOIN_1
        )
    );
    assert_eq!(query.param_names(), vec!["@p0", "@take"]);
    assert_eq!(query.param("@p0"), Some(&Value::Integer(18)));
    assert_eq!(query.param("@take"), Some(&Value::Integer(5)));
}

#[test]
fn test_one_join_per_distinct_member_path() {
    let command = customers()
        .filter(
            Expr::member("age")
                .gt(18)
                .and(Expr::member("age").lt(65))
                .or(Expr::member("name").eq("Ann")),
        )
        .order_by_desc("age")
        .order_by("name");
    let query = generator(SqlDialect::Sql2008).generate_query(&command).unwrap();

    assert_eq!(query.sql.matches("left join").count(), 2);
    assert_eq!(
        query.sql,
        format!(
            "select s.[Json] from [Customer_structure] s inner join [Customer_indexes] si on si.[StructureId] = s.[StructureId] {} {} \
             where ((mem0.[age] > @p0 and mem0.[age] < @p1) or mem1.[name] = @p2) \
             group by s.[StructureId], s.[Json] order by min(mem0.[age]) desc, min(mem1.[name]) asc;",
            JOIN_0, JOIN_1
        )
    );
}

#[test]
fn test_identity_member_filters_main_row() {
    let command = customers()
        .filter(Expr::member("id").in_list([3i64, 7]))
        .order_by("id");
    let query = generator(SqlDialect::Sql2008).generate_query(&command).unwrap();

    assert_eq!(
        query.sql,
        "select s.[Json] from [Customer_structure] s inner join [Customer_indexes] si on si.[StructureId] = s.[StructureId] where s.[StructureId] in (@p0, @p1) \
         group by s.[StructureId], s.[Json] order by s.[StructureId] asc;"
    );
}

#[test]
fn test_windowed_cte_paging() {
    let command = customers().filter(Expr::member("age").gt_eq(21)).page(1, 10);
    let query = generator(SqlDialect::Sql2008).generate_query(&command).unwrap();

    assert_eq!(
        query.sql,
        format!(
            "with pagedRs as (select s.[Json], row_number() over (order by s.[StructureId]) as RowNum \
             from [Customer_structure] s inner join [Customer_indexes] si on si.[StructureId] = s.[StructureId] {} where mem0.[age] >= @p0 group by s.[StructureId], s.[Json]) \
             select [Json] from pagedRs where pagedRs.RowNum between @pagingFrom and @pagingTo \
             order by pagedRs.RowNum;",
            JOIN_0
        )
    );
    assert_eq!(query.param_names(), vec!["@p0", "@pagingFrom", "@pagingTo"]);
    assert_eq!(query.param("@pagingFrom"), Some(&Value::Integer(11)));
    assert_eq!(query.param("@pagingTo"), Some(&Value::Integer(20)));
}

#[test]
fn test_row_number_paging_orders_by_sortings() {
    let command = customers().order_by_desc("name").page(0, 10);
    let query = generator(SqlDialect::Sql2005).generate_query(&command).unwrap();

    assert_eq!(
        query.sql,
        format!(
            "select [Json] from (select s.[Json], row_number() over (order by min(mem0.[name]) desc) as RowNum \
             from [Customer_structure] s inner join [Customer_indexes] si on si.[StructureId] = s.[StructureId] {} group by s.[StructureId], s.[Json]) rs \
             where rs.RowNum between @pagingFrom and @pagingTo order by rs.RowNum;",
            JOIN_0
        )
    );
    assert_eq!(query.param("@pagingFrom"), Some(&Value::Integer(1)));
    assert_eq!(query.param("@pagingTo"), Some(&Value::Integer(10)));
}

#[test]
fn test_paging_overrides_take_and_strategy_can_be_forced() {
    let command = customers().page(2, 5).take(3);
    let query = generator(SqlDialect::Sql2005)
        .with_paging_strategy(PagingStrategy::WindowedCte)
        .generate_query(&command)
        .unwrap();

    assert!(query.sql.starts_with("with pagedRs as ("));
    assert!(!query.sql.contains("top("));
    assert_eq!(query.param("@pagingFrom"), Some(&Value::Integer(11)));
    assert_eq!(query.param("@pagingTo"), Some(&Value::Integer(15)));
    assert_eq!(query.param("@take"), None);
}

#[test]
fn test_degenerate_limits_are_rejected() {
    let generator = generator(SqlDialect::Sql2008);

    let zero_take = customers().take(0);
    assert!(matches!(generator.generate_query(&zero_take), Err(DbError::ContractViolation(_))));

    let zero_page = customers().page(0, 0);
    assert!(matches!(generator.generate_query(&zero_page), Err(DbError::ContractViolation(_))));
}

#[test]
fn test_identifier_query() {
    let command = customers().filter(Expr::member("is_active")).take(3);
    let query = generator(SqlDialect::Sql2008)
        .generate_query_returning_identifiers(&command)
        .unwrap();

    assert_eq!(
        query.sql,
        format!(
            "select top(@take) s.[StructureId] from [Customer_structure] s inner join [Customer_indexes] si on si.[StructureId] = s.[StructureId] {} \
             where mem0.[is_active] = @p0 group by s.[StructureId];",
            JOIN_0
        )
    );
    assert_eq!(query.param("@p0"), Some(&Value::Boolean(true)));
}

#[test]
fn test_identifier_query_contract() {
    let generator = generator(SqlDialect::Sql2008);
    let order_schema = StructureSchema::<Order>::derive().unwrap();
    let active = || customers().filter(Expr::member("is_active"));

    let cases = vec![
        customers(),
        active().order_by("name"),
        active().page(0, 10),
        QueryCommand::for_schema(&order_schema)
            .filter(Expr::member("total").gt(1.5))
            .include_document(&StructureSchema::<Customer>::derive().unwrap(), "customer_id", "customer"),
    ];
    for command in cases {
        assert!(matches!(
            generator.generate_query_returning_identifiers(&command),
            Err(DbError::ContractViolation(_))
        ));
    }
}

#[test]
fn test_count_queries() {
    let generator = generator(SqlDialect::Sql2008);

    let all = generator.generate_count_query(&customers().order_by("name").take(2)).unwrap();
    assert_eq!(all.sql, "select count(*) from [Customer_structure];");
    assert!(all.params.is_empty());

    let matching = generator
        .generate_count_query(&customers().filter(Expr::member("name").starts_with("Jo")).page(3, 10))
        .unwrap();
    assert_eq!(
        matching.sql,
        format!(
            "select count(*) from (select s.[StructureId] from [Customer_structure] s inner join [Customer_indexes] si on si.[StructureId] = s.[StructureId] {} \
             where mem0.[name] like @p0 group by s.[StructureId]) ids;",
            JOIN_0
        )
    );
    assert_eq!(matching.param_names(), vec!["@p0"]);
    assert_eq!(matching.param("@p0"), Some(&Value::Text("Jo%".into())));
}

#[test]
fn test_include_of_referenced_document() {
    let orders = StructureSchema::<Order>::derive().unwrap();
    let customers = StructureSchema::<Customer>::derive().unwrap();
    let command = QueryCommand::for_schema(&orders)
        .order_by_desc("total")
        .include_document(&customers, "customer_id", "customer");
    let query = generator(SqlDialect::Sql2008).generate_query(&command).unwrap();

    assert_eq!(
        query.sql,
        "select s.[Json], min(cs0.[Json]) as [customer] from [SalesOrder_structure] s inner join [SalesOrder_indexes] si on si.[StructureId] = s.[StructureId] \
         left join [SalesOrder_indexes] mem0 on mem0.[StructureId] = s.[StructureId] \
         left join [SalesOrder_indexes] mem1 on mem1.[StructureId] = s.[StructureId] \
         left join [Customer_structure] cs0 on cs0.[StructureId] = mem1.[customer_id] \
         group by s.[StructureId], s.[Json] order by min(mem0.[total]) desc;"
    );
}

#[test]
fn test_paged_include_keeps_include_column_outside() {
    let orders = StructureSchema::<Order>::derive().unwrap();
    let customers = StructureSchema::<Customer>::derive().unwrap();
    let command = QueryCommand::for_schema(&orders)
        .include_document(&customers, "customer_id", "customer")
        .page(0, 25);
    let query = generator(SqlDialect::Sql2008).generate_query(&command).unwrap();

    assert!(query.sql.contains(") select [Json], [customer] from pagedRs"));
}

#[test]
fn test_get_by_ids_binds_each_identity() {
    let schema = StructureSchema::<Customer>::derive().unwrap();
    let generator = generator(SqlDialect::Sql2008);

    let query = generator
        .generate_get_by_ids(schema.model(), &[StructureId::Identity(4), StructureId::Identity(9)])
        .unwrap();
    assert_eq!(
        query.sql,
        "select [Json] from [Customer_structure] where [StructureId] in (@id0, @id1);"
    );

    let wrong_kind = generator.generate_get_by_id(schema.model(), &StructureId::from("abc"));
    assert!(matches!(wrong_kind, Err(DbError::TypeMismatch(_))));
    assert!(generator.generate_get_by_ids(schema.model(), &[]).is_err());
}

#[test]
fn test_identity_range_reads_and_deletes() {
    let schema = StructureSchema::<Customer>::derive().unwrap();
    let generator = generator(SqlDialect::Sql2008);
    let (from, to) = (StructureId::Identity(10), StructureId::Identity(20));

    let read = generator.generate_get_by_id_range(schema.model(), &from, &to).unwrap();
    assert_eq!(
        read.sql,
        "select [Json] from [Customer_structure] where [StructureId] between @idFrom and @idTo \
         order by [StructureId];"
    );
    assert_eq!(read.param("@idFrom"), Some(&Value::Integer(10)));
    assert_eq!(read.param("@idTo"), Some(&Value::Integer(20)));

    let deletes = generator.generate_delete_by_id_range(schema.model(), &from, &to).unwrap();
    let sql: Vec<&str> = deletes.iter().map(|q| q.sql.as_str()).collect();
    assert_eq!(
        sql,
        vec![
            "delete from [Customer_uniques] where [StructureId] between @idFrom and @idTo;",
            "delete from [Customer_indexes] where [StructureId] between @idFrom and @idTo;",
            "delete from [Customer_structure] where [StructureId] between @idFrom and @idTo;",
        ]
    );
    assert!(deletes.iter().all(|q| q.param_names() == vec!["@idFrom", "@idTo"]));
}

#[test]
fn test_identity_range_bounds_are_checked() {
    let schema = StructureSchema::<Customer>::derive().unwrap();
    let generator = generator(SqlDialect::Sql2008);

    let reversed =
        generator.generate_get_by_id_range(schema.model(), &StructureId::Identity(9), &StructureId::Identity(2));
    assert!(matches!(reversed, Err(DbError::ContractViolation(_))));

    let empty =
        generator.generate_delete_by_id_range(schema.model(), &StructureId::Identity(0), &StructureId::Identity(2));
    assert!(matches!(empty, Err(DbError::ContractViolation(_))));

    let wrong_kind =
        generator.generate_get_by_id_range(schema.model(), &StructureId::from("a"), &StructureId::from("b"));
    assert!(matches!(wrong_kind, Err(DbError::TypeMismatch(_))));
}

#[test]
fn test_delete_by_ids_clears_every_table() {
    let schema = StructureSchema::<Order>::derive().unwrap();
    let generator = generator(SqlDialect::Sql2008);
    let (first, second) = (uuid::Uuid::new_v4(), uuid::Uuid::new_v4());
    let ids = [StructureId::Guid(first), StructureId::Guid(second)];

    let deletes = generator.generate_delete_by_ids(schema.model(), &ids).unwrap();
    let sql: Vec<&str> = deletes.iter().map(|q| q.sql.as_str()).collect();
    assert_eq!(
        sql,
        vec![
            "delete from [SalesOrder_indexes] where [StructureId] in (@id0, @id1);",
            "delete from [SalesOrder_structure] where [StructureId] in (@id0, @id1);",
        ]
    );
    assert_eq!(deletes[1].param("@id1"), Some(&Value::Uuid(second)));
    assert!(matches!(
        generator.generate_delete_by_ids(schema.model(), &[]),
        Err(DbError::ContractViolation(_))
    ));
}

#[test]
fn test_delete_by_query_captures_identities_first() {
    let command = customers().filter(Expr::member("age").lt(18));
    let query = generator(SqlDialect::Sql2008)
        .generate_delete_by_query(&command)
        .unwrap();

    assert_eq!(
        query.sql.lines().collect::<Vec<_>>(),
        vec![
            "declare @ids table ([StructureId] bigint not null primary key);".to_string(),
            format!(
                "insert into @ids ([StructureId]) select s.[StructureId] from [Customer_structure] s inner join [Customer_indexes] si on si.[StructureId] = s.[StructureId] {} \
                 where mem0.[age] < @p0 group by s.[StructureId];",
                JOIN_0
            ),
            "delete from [Customer_uniques] where [StructureId] in (select [StructureId] from @ids);".to_string(),
            "delete from [Customer_indexes] where [StructureId] in (select [StructureId] from @ids);".to_string(),
            "delete from [Customer_structure] where [StructureId] in (select [StructureId] from @ids);".to_string(),
        ]
    );
    assert_eq!(query.param_names(), vec!["@p0"]);

    let unfiltered = generator(SqlDialect::Sql2008).generate_delete_by_query(&customers());
    assert!(matches!(unfiltered, Err(DbError::ContractViolation(_))));
}

#[test]
fn test_include_target_cannot_shadow_body_column() {
    let orders = StructureSchema::<Order>::derive().unwrap();
    let customers = StructureSchema::<Customer>::derive().unwrap();
    let generator = generator(SqlDialect::Sql2008);

    for target in ["json", "RowNum"] {
        let command = QueryCommand::for_schema(&orders)
            .include_document(&customers, "customer_id", target)
            .page(0, 10);
        assert!(matches!(generator.generate_query(&command), Err(DbError::ContractViolation(_))));
    }
}

use crate::core::Result;
use crate::schema::{IndexMember, SchemaModel, TableRole};
use crate::sql::statements::{self, SqlStatements};

/// Builds the `create table` batch for one table of a structure set.
pub struct CreateTableBuilder<'a> {
    statements: &'a SqlStatements,
    model: &'a SchemaModel,
    role: TableRole,
}

impl<'a> CreateTableBuilder<'a> {
    pub fn new(statements: &'a SqlStatements, model: &'a SchemaModel, role: TableRole) -> Self {
        Self {
            statements,
            model,
            role,
        }
    }

    /// The `create table` statement followed by any unique indexes it needs.
    pub fn build(&self) -> Result<Vec<String>> {
        let dialect = self.statements.dialect();
        let table = self.model.table_name(self.role);
        let quoted_table = dialect.quote(&table);
        let id_type = dialect.id_column_type(self.model.id_type());

        match self.role {
            TableRole::Structure => Ok(vec![self.statements.inject(
                statements::CREATE_STRUCTURE_TABLE,
                &[&quoted_table, id_type, dialect.json_column_type()],
            )?]),
            TableRole::Indexes => {
                let columns = member_columns(self.statements, self.model.members().iter());
                Ok(vec![self.statements.inject(
                    statements::CREATE_INDEXES_TABLE,
                    &[&quoted_table, id_type, &columns],
                )?])
            }
            TableRole::Uniques => {
                let columns = member_columns(self.statements, self.model.unique_members());
                let mut batch = vec![self.statements.inject(
                    statements::CREATE_UNIQUES_TABLE,
                    &[&quoted_table, id_type, &columns],
                )?];
                for member in self.model.unique_members() {
                    batch.push(create_unique_index(self.statements, &table, member)?);
                }
                Ok(batch)
            }
        }
    }
}

/// `alter table ... add` for one member column, plus its unique index on the uniques table.
pub fn add_column(
    statements: &SqlStatements,
    table: &str,
    role: TableRole,
    member: &IndexMember,
) -> Result<Vec<String>> {
    let dialect = statements.dialect();
    let mut batch = vec![statements.inject(
        statements::ADD_COLUMN,
        &[
            &dialect.quote(table),
            &dialect.quote(&member.column_name),
            dialect.column_type(member.data_type),
        ],
    )?];
    if role == TableRole::Uniques {
        batch.push(create_unique_index(statements, table, member)?);
    }
    Ok(batch)
}

/// Drop statements for every table of the set, uniques first.
pub fn drop_structure_set(statements: &SqlStatements, model: &SchemaModel) -> Result<Vec<String>> {
    let dialect = statements.dialect();
    [TableRole::Uniques, TableRole::Indexes, TableRole::Structure]
        .iter()
        .map(|role| {
            let table = model.table_name(*role);
            statements.inject(statements::DROP_TABLE, &[&table, &dialect.quote(&table)])
        })
        .collect()
}

/// Keeps the column name verbatim; column names are unique per set ignoring
/// case, so index names are too.
pub fn unique_index_name(table: &str, member: &IndexMember) -> String {
    format!("UX_{}_{}", table, member.column_name)
}

fn create_unique_index(statements: &SqlStatements, table: &str, member: &IndexMember) -> Result<String> {
    let dialect = statements.dialect();
    statements.inject(
        statements::CREATE_UNIQUE_INDEX,
        &[
            &dialect.quote(&unique_index_name(table, member)),
            &dialect.quote(table),
            &dialect.quote(&member.column_name),
        ],
    )
}

/// `, [col] type null` for each member.
fn member_columns<'m>(statements: &SqlStatements, members: impl Iterator<Item = &'m IndexMember>) -> String {
    let dialect = statements.dialect();
    members
        .map(|member| {
            format!(
                ", {} {} null",
                dialect.quote(&member.column_name),
                dialect.column_type(member.data_type)
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DataType, IdType};
    use crate::sql::SqlDialect;

    fn model() -> SchemaModel {
        SchemaModel::new(
            "Customer".into(),
            "abc".into(),
            "Id".into(),
            IdType::Guid,
            vec![
                IndexMember {
                    member_path: "Name".into(),
                    column_name: "Name".into(),
                    data_type: DataType::Text,
                    is_unique: false,
                },
                IndexMember {
                    member_path: "Address.Zip".into(),
                    column_name: "Address.Zip".into(),
                    data_type: DataType::Integer,
                    is_unique: true,
                },
            ],
            None,
        )
    }

    #[test]
    fn builds_all_three_tables() {
        let statements = SqlStatements::for_dialect(SqlDialect::Sql2008);
        let model = model();

        let structure = CreateTableBuilder::new(&statements, &model, TableRole::Structure)
            .build()
            .unwrap();
        assert_eq!(
            structure,
            vec!["create table [Customer_structure] ([StructureId] uniqueidentifier not null primary key, [Json] nvarchar(max) not null);"]
        );

        let indexes = CreateTableBuilder::new(&statements, &model, TableRole::Indexes)
            .build()
            .unwrap();
        assert_eq!(
            indexes[0],
            "create table [Customer_indexes] ([StructureId] uniqueidentifier not null primary key, [Name] nvarchar(300) null, [Address.Zip] bigint null);"
        );

        let uniques = CreateTableBuilder::new(&statements, &model, TableRole::Uniques)
            .build()
            .unwrap();
        assert_eq!(uniques.len(), 2);
        assert!(uniques[0].contains("[Address.Zip] bigint null"));
        assert!(!uniques[0].contains("[Name]"));
        assert!(uniques[1].starts_with("create unique nonclustered index [UX_Customer_uniques_Address.Zip]"));
    }

    #[test]
    fn drops_uniques_before_structure() {
        let statements = SqlStatements::for_dialect(SqlDialect::Sql2005);
        let drops = drop_structure_set(&statements, &model()).unwrap();

        assert_eq!(drops.len(), 3);
        assert!(drops[0].contains("[Customer_uniques]"));
        assert!(drops[2].contains("[Customer_structure]"));
    }

    #[test]
    fn unique_index_names_do_not_collide_across_nesting() {
        let unique = |path: &str| IndexMember {
            member_path: path.into(),
            column_name: path.into(),
            data_type: DataType::Integer,
            is_unique: true,
        };
        let model = SchemaModel::new(
            "Thing".into(),
            "h".into(),
            "Id".into(),
            IdType::Identity,
            vec![unique("a_b"), unique("a.b")],
            None,
        );
        let statements = SqlStatements::for_dialect(SqlDialect::Sql2008);

        let batch = CreateTableBuilder::new(&statements, &model, TableRole::Uniques)
            .build()
            .unwrap();

        assert_eq!(batch.len(), 3);
        assert!(batch[1].starts_with("create unique nonclustered index [UX_Thing_uniques_a_b] on [Thing_uniques] ([a_b])"));
        assert!(batch[2].starts_with("create unique nonclustered index [UX_Thing_uniques_a.b] on [Thing_uniques] ([a.b])"));
    }
}

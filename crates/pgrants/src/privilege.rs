//! Privilege catalog.
//!
//! A [`PrivilegeCatalog`] lists, for each object type, where its ACL lives
//! and whether it is read once per instance or once per database. The
//! built-in catalog covers the usual PostgreSQL object types; callers may
//! build their own to inspect custom privileges.

use std::fmt;

/// Where a privilege type is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Queried once, on the default database.
    Instance,
    /// Queried in every managed database.
    Database,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Instance => write!(f, "instance"),
            Scope::Database => write!(f, "database"),
        }
    }
}

/// A catalog entry: how to inspect grants of one object type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Privilege {
    /// Object type, e.g. `TABLE`.
    pub object: String,
    pub scope: Scope,
    /// SQL returning grant rows. `$1` is the `text[]` of managed privilege types.
    pub inspect: String,
}

impl Privilege {
    pub fn new(object: impl Into<String>, scope: Scope, inspect: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            scope,
            inspect: inspect.into(),
        }
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} privileges ({} scope)", self.object, self.scope)
    }
}

/// Ordered, read-only registry of privilege entries.
#[derive(Debug, Clone, Default)]
pub struct PrivilegeCatalog {
    entries: Vec<Privilege>,
}

impl PrivilegeCatalog {
    pub fn new(entries: Vec<Privilege>) -> Self {
        Self { entries }
    }

    /// Catalog of the object types PostgreSQL tracks ACLs for.
    pub fn builtin() -> Self {
        Self::new(vec![
            Privilege::new("DATABASE", Scope::Instance, DATABASE_GRANTS),
            Privilege::new("SCHEMA", Scope::Database, SCHEMA_GRANTS),
            Privilege::new("LANGUAGE", Scope::Database, LANGUAGE_GRANTS),
            Privilege::new("TABLE", Scope::Database, TABLE_GRANTS),
            Privilege::new("SEQUENCE", Scope::Database, SEQUENCE_GRANTS),
            Privilege::new("FUNCTION", Scope::Database, FUNCTION_GRANTS),
            Privilege::new("GLOBAL DEFAULT", Scope::Database, GLOBAL_DEFAULT_GRANTS),
            Privilege::new("SCHEMA DEFAULT", Scope::Database, SCHEMA_DEFAULT_GRANTS),
        ])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Privilege> {
        self.entries.iter()
    }

    pub fn get(&self, object: &str) -> Option<&Privilege> {
        self.entries.iter().find(|p| p.object == object)
    }
}

/// How a grant on a given object type fills the grant fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectShape {
    /// Grant is qualified by a schema.
    pub schema: bool,
    /// Grant belongs to a role's default privileges and carries an owner.
    pub owner: bool,
    pub object: ObjectField,
    /// Grant aggregates every object of the type in a schema.
    pub aggregate: bool,
}

/// What the `object` field of a grant holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectField {
    /// Nothing.
    None,
    /// The database name.
    Database,
    /// An object name, kept as reported.
    Name,
    /// A default privilege object class such as `TABLES`.
    Class,
}

/// Shape of a well-known object type, `None` for custom ones.
pub fn shape_of(object: &str) -> Option<ObjectShape> {
    let shape = match object {
        "DATABASE" => ObjectShape {
            schema: false,
            owner: false,
            object: ObjectField::Database,
            aggregate: false,
        },
        "SCHEMA" => ObjectShape {
            schema: true,
            owner: false,
            object: ObjectField::None,
            aggregate: false,
        },
        "LANGUAGE" => ObjectShape {
            schema: false,
            owner: false,
            object: ObjectField::Name,
            aggregate: false,
        },
        "TABLE" | "SEQUENCE" | "FUNCTION" => ObjectShape {
            schema: true,
            owner: false,
            object: ObjectField::None,
            aggregate: true,
        },
        "GLOBAL DEFAULT" => ObjectShape {
            schema: false,
            owner: true,
            object: ObjectField::Class,
            aggregate: false,
        },
        "SCHEMA DEFAULT" => ObjectShape {
            schema: true,
            owner: true,
            object: ObjectField::Class,
            aggregate: false,
        },
        _ => return None,
    };
    Some(shape)
}

// Every grant query returns the same columns:
// owner, grantee, type, database, schema, object, partial.
// ACL entries granted to PUBLIC have grantee oid 0 and no pg_roles row.
// Implicit owner entries are skipped.

const DATABASE_GRANTS: &str = r#"
SELECT NULL::text AS "owner",
       COALESCE(grantee.rolname, 'public') AS "grantee",
       grants.privilege_type AS "type",
       db.datname::text AS "database",
       NULL::text AS "schema",
       db.datname::text AS "object",
       NULL::boolean AS "partial"
FROM pg_catalog.pg_database AS db
CROSS JOIN LATERAL aclexplode(COALESCE(db.datacl, acldefault('d', db.datdba))) AS grants
LEFT OUTER JOIN pg_catalog.pg_roles AS grantee ON grantee.oid = grants.grantee
WHERE grants.grantee <> db.datdba
  AND grants.privilege_type = ANY($1)
ORDER BY 4, 2, 3
"#;

const SCHEMA_GRANTS: &str = r#"
SELECT NULL::text AS "owner",
       COALESCE(grantee.rolname, 'public') AS "grantee",
       grants.privilege_type AS "type",
       current_database()::text AS "database",
       nsp.nspname::text AS "schema",
       NULL::text AS "object",
       NULL::boolean AS "partial"
FROM pg_catalog.pg_namespace AS nsp
CROSS JOIN LATERAL aclexplode(COALESCE(nsp.nspacl, acldefault('n', nsp.nspowner))) AS grants
LEFT OUTER JOIN pg_catalog.pg_roles AS grantee ON grantee.oid = grants.grantee
WHERE grants.grantee <> nsp.nspowner
  AND grants.privilege_type = ANY($1)
ORDER BY 5, 2, 3
"#;

const LANGUAGE_GRANTS: &str = r#"
SELECT NULL::text AS "owner",
       COALESCE(grantee.rolname, 'public') AS "grantee",
       grants.privilege_type AS "type",
       current_database()::text AS "database",
       NULL::text AS "schema",
       lang.lanname::text AS "object",
       NULL::boolean AS "partial"
FROM pg_catalog.pg_language AS lang
CROSS JOIN LATERAL aclexplode(COALESCE(lang.lanacl, acldefault('l', lang.lanowner))) AS grants
LEFT OUTER JOIN pg_catalog.pg_roles AS grantee ON grantee.oid = grants.grantee
WHERE grants.grantee <> lang.lanowner
  AND grants.privilege_type = ANY($1)
ORDER BY 6, 2, 3
"#;

const TABLE_GRANTS: &str = r#"
WITH objects AS (
  SELECT rel.relnamespace AS nsp, rel.relowner AS owner,
         COALESCE(rel.relacl, acldefault('r', rel.relowner)) AS acl
  FROM pg_catalog.pg_class AS rel
  WHERE rel.relkind IN ('r', 'v', 'm', 'f', 'p')
), totals AS (
  SELECT nsp, COUNT(*) AS total FROM objects GROUP BY nsp
), grants AS (
  SELECT objects.nsp, acl.grantee, acl.privilege_type, COUNT(*) AS granted
  FROM objects
  CROSS JOIN LATERAL aclexplode(objects.acl) AS acl
  WHERE acl.grantee <> objects.owner
    AND acl.privilege_type = ANY($1)
  GROUP BY 1, 2, 3
)
SELECT NULL::text AS "owner",
       COALESCE(grantee.rolname, 'public') AS "grantee",
       grants.privilege_type AS "type",
       current_database()::text AS "database",
       nsp.nspname::text AS "schema",
       NULL::text AS "object",
       grants.granted < totals.total AS "partial"
FROM grants
JOIN totals USING (nsp)
JOIN pg_catalog.pg_namespace AS nsp ON nsp.oid = grants.nsp
LEFT OUTER JOIN pg_catalog.pg_roles AS grantee ON grantee.oid = grants.grantee
ORDER BY 5, 2, 3
"#;

const SEQUENCE_GRANTS: &str = r#"
WITH objects AS (
  SELECT rel.relnamespace AS nsp, rel.relowner AS owner,
         COALESCE(rel.relacl, acldefault('s', rel.relowner)) AS acl
  FROM pg_catalog.pg_class AS rel
  WHERE rel.relkind = 'S'
), totals AS (
  SELECT nsp, COUNT(*) AS total FROM objects GROUP BY nsp
), grants AS (
  SELECT objects.nsp, acl.grantee, acl.privilege_type, COUNT(*) AS granted
  FROM objects
  CROSS JOIN LATERAL aclexplode(objects.acl) AS acl
  WHERE acl.grantee <> objects.owner
    AND acl.privilege_type = ANY($1)
  GROUP BY 1, 2, 3
)
SELECT NULL::text AS "owner",
       COALESCE(grantee.rolname, 'public') AS "grantee",
       grants.privilege_type AS "type",
       current_database()::text AS "database",
       nsp.nspname::text AS "schema",
       NULL::text AS "object",
       grants.granted < totals.total AS "partial"
FROM grants
JOIN totals USING (nsp)
JOIN pg_catalog.pg_namespace AS nsp ON nsp.oid = grants.nsp
LEFT OUTER JOIN pg_catalog.pg_roles AS grantee ON grantee.oid = grants.grantee
ORDER BY 5, 2, 3
"#;

const FUNCTION_GRANTS: &str = r#"
WITH objects AS (
  SELECT pro.pronamespace AS nsp, pro.proowner AS owner,
         COALESCE(pro.proacl, acldefault('f', pro.proowner)) AS acl
  FROM pg_catalog.pg_proc AS pro
), totals AS (
  SELECT nsp, COUNT(*) AS total FROM objects GROUP BY nsp
), grants AS (
  SELECT objects.nsp, acl.grantee, acl.privilege_type, COUNT(*) AS granted
  FROM objects
  CROSS JOIN LATERAL aclexplode(objects.acl) AS acl
  WHERE acl.grantee <> objects.owner
    AND acl.privilege_type = ANY($1)
  GROUP BY 1, 2, 3
)
SELECT NULL::text AS "owner",
       COALESCE(grantee.rolname, 'public') AS "grantee",
       grants.privilege_type AS "type",
       current_database()::text AS "database",
       nsp.nspname::text AS "schema",
       NULL::text AS "object",
       grants.granted < totals.total AS "partial"
FROM grants
JOIN totals USING (nsp)
JOIN pg_catalog.pg_namespace AS nsp ON nsp.oid = grants.nsp
LEFT OUTER JOIN pg_catalog.pg_roles AS grantee ON grantee.oid = grants.grantee
ORDER BY 5, 2, 3
"#;

const GLOBAL_DEFAULT_GRANTS: &str = r#"
SELECT pg_catalog.pg_get_userbyid(def.defaclrole)::text AS "owner",
       COALESCE(grantee.rolname, 'public') AS "grantee",
       grants.privilege_type AS "type",
       current_database()::text AS "database",
       NULL::text AS "schema",
       CASE def.defaclobjtype
         WHEN 'r' THEN 'TABLES'
         WHEN 'S' THEN 'SEQUENCES'
         WHEN 'f' THEN 'FUNCTIONS'
         WHEN 'T' THEN 'TYPES'
         WHEN 'n' THEN 'SCHEMAS'
       END AS "object",
       NULL::boolean AS "partial"
FROM pg_catalog.pg_default_acl AS def
CROSS JOIN LATERAL aclexplode(def.defaclacl) AS grants
LEFT OUTER JOIN pg_catalog.pg_roles AS grantee ON grantee.oid = grants.grantee
WHERE def.defaclnamespace = 0
  AND grants.grantee <> def.defaclrole
  AND grants.privilege_type = ANY($1)
ORDER BY 1, 6, 2, 3
"#;

const SCHEMA_DEFAULT_GRANTS: &str = r#"
SELECT pg_catalog.pg_get_userbyid(def.defaclrole)::text AS "owner",
       COALESCE(grantee.rolname, 'public') AS "grantee",
       grants.privilege_type AS "type",
       current_database()::text AS "database",
       nsp.nspname::text AS "schema",
       CASE def.defaclobjtype
         WHEN 'r' THEN 'TABLES'
         WHEN 'S' THEN 'SEQUENCES'
         WHEN 'f' THEN 'FUNCTIONS'
         WHEN 'T' THEN 'TYPES'
       END AS "object",
       NULL::boolean AS "partial"
FROM pg_catalog.pg_default_acl AS def
JOIN pg_catalog.pg_namespace AS nsp ON nsp.oid = def.defaclnamespace
CROSS JOIN LATERAL aclexplode(def.defaclacl) AS grants
LEFT OUTER JOIN pg_catalog.pg_roles AS grantee ON grantee.oid = grants.grantee
WHERE grants.privilege_type = ANY($1)
ORDER BY 1, 5, 6, 2, 3
"#;

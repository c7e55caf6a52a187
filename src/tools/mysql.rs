//! Database tools for the MySQL sub-agent.
//!
//! SQL runs through the HTTP SQL gateway that fronts the production MySQL
//! instances. Statements pass a [`SqlGuard`] first: the gateway defaults to
//! read-only, and anything destructive is refused with a structured payload
//! unless writes were explicitly enabled.

use genai::chat::{Tool, ToolCall};
use regex::RegexSet;
use serde_json::json;

use super::{body_or_error, optional_str, require_str, ToolContext};

/// System prompt for the MySQL sub-agent.
pub const MYSQL_AGENT_INSTRUCTIONS: &str = "\
You are the database agent. You verify data-level hypotheses with SQL through
`mysql_execute` and locate tables, columns, and routines with
`mysql_search_objects`.

Approach:
1. Never guess schema. Use `mysql_search_objects` (or DESCRIBE) to confirm
   table and column names before querying them.
2. Keep queries cheap: always LIMIT result sets, prefer indexed columns in
   WHERE clauses, and use COUNT/aggregates instead of pulling rows when only
   a cardinality is needed.
3. The gateway is read-only by default; destructive statements are refused.
   If a task genuinely requires a change, report the exact statement you
   would run instead of running it.

Report the query you ran, the row counts or values it returned, and what
that implies for the hypothesis under test. An empty result is a finding;
report it as such.";

/// Checks SQL statements against a set of destructive-statement patterns.
pub struct SqlGuard {
    patterns: RegexSet,
    reasons: Vec<&'static str>,
    allow_writes: bool,
}

/// Information about a refused statement.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BlockedStatement {
    pub blocked: bool,
    pub reason: String,
    pub sql: String,
}

/// (pattern, reason) pairs for statements the read-only gateway refuses.
/// Patterns match the first keyword of the statement, case-insensitively.
const WRITE_PATTERNS: &[(&str, &str)] = &[
    (r"(?i)^\s*(insert|replace)\b", "Data modification (INSERT/REPLACE)"),
    (r"(?i)^\s*update\b", "Data modification (UPDATE)"),
    (r"(?i)^\s*delete\b", "Data modification (DELETE)"),
    (r"(?i)^\s*(drop|truncate)\b", "Destructive DDL (DROP/TRUNCATE)"),
    (r"(?i)^\s*(create|alter|rename)\b", "Schema change (CREATE/ALTER/RENAME)"),
    (r"(?i)^\s*(grant|revoke)\b", "Privilege change (GRANT/REVOKE)"),
    (r"(?i)^\s*(call|load\s+data)\b", "Stored routine / bulk load"),
    (r"(?i)^\s*set\s+global\b", "Server configuration change"),
];

impl SqlGuard {
    /// Compile the guard. The RegexSet is compiled once for efficient
    /// multi-pattern matching.
    pub fn new(allow_writes: bool) -> Result<Self, regex::Error> {
        let (regexes, reasons): (Vec<_>, Vec<_>) = WRITE_PATTERNS.iter().copied().unzip();
        Ok(Self {
            patterns: RegexSet::new(regexes)?,
            reasons,
            allow_writes,
        })
    }

    /// Check a statement. Returns `Some(BlockedStatement)` if refused,
    /// `None` if it may be sent to the gateway.
    ///
    /// Every `;`-separated fragment is inspected, so a destructive statement
    /// stacked behind a harmless one (`SELECT 1; DROP TABLE t`) is still
    /// refused. Splitting ignores string literals, which can only make the
    /// guard stricter, never more permissive.
    pub fn check(&self, sql: &str) -> Option<BlockedStatement> {
        if self.allow_writes {
            return None;
        }
        for fragment in sql.split(';') {
            let matches: Vec<_> = self.patterns.matches(fragment).into_iter().collect();
            if let Some(&first) = matches.first() {
                return Some(BlockedStatement {
                    blocked: true,
                    reason: format!("{} refused: gateway is read-only", self.reasons[first]),
                    sql: sql.to_string(),
                });
            }
        }
        None
    }
}

/// Tool schemas for the MySQL sub-agent.
pub fn define_tools() -> Vec<Tool> {
    vec![
        Tool::new("mysql_execute")
            .with_description(
                "Execute a SQL statement through the read-only SQL gateway. \
                 Returns a JSON object with columns and rows. Destructive \
                 statements are refused.",
            )
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "sql": {
                        "type": "string",
                        "description": "The SQL statement to execute (include a LIMIT)"
                    }
                },
                "required": ["sql"]
            })),
        Tool::new("mysql_search_objects")
            .with_description(
                "Search information_schema for tables, columns, or routines whose \
                 name matches a keyword. Returns matching objects with their schema.",
            )
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "keyword": {
                        "type": "string",
                        "description": "Substring to match against object names"
                    },
                    "object_type": {
                        "type": "string",
                        "description": "Restrict to 'table', 'column', or 'routine' (default: all)"
                    }
                },
                "required": ["keyword"]
            })),
    ]
}

pub async fn execute(call: &ToolCall, ctx: &ToolContext) -> String {
    let sql = match require_str(call, "sql") {
        Ok(s) => s,
        Err(e) => return e,
    };

    if let Some(blocked) = ctx.sql_guard.check(sql) {
        tracing::warn!(sql, reason = %blocked.reason, "SQL statement refused");
        return serde_json::to_string(&blocked)
            .unwrap_or_else(|_| json!({"error": blocked.reason}).to_string());
    }

    run_sql(sql, ctx, "mysql_execute").await
}

pub async fn search_objects(call: &ToolCall, ctx: &ToolContext) -> String {
    let keyword = match require_str(call, "keyword") {
        Ok(k) => k,
        Err(e) => return e,
    };
    let object_type = optional_str(call, "object_type").unwrap_or("all");

    let sql = build_object_search_sql(keyword, object_type);
    run_sql(&sql, ctx, "mysql_search_objects").await
}

/// POST a statement to the SQL gateway's query endpoint.
async fn run_sql(sql: &str, ctx: &ToolContext, what: &str) -> String {
    let url = format!("{}/query", ctx.endpoints.sql_gateway_url);
    body_or_error(
        ctx.http.post(&url).json(&json!({ "sql": sql })).send().await,
        what,
    )
    .await
}

/// Build the information_schema lookup for `mysql_search_objects`.
///
/// The keyword is embedded via LIKE with backslashes and quotes escaped
/// (MySQL treats `\` as an escape inside string literals, so a trailing
/// `\'` in the raw keyword would otherwise re-open the literal); the
/// gateway itself enforces read-only access, the guard is not consulted
/// for this generated statement.
fn build_object_search_sql(keyword: &str, object_type: &str) -> String {
    let like = format!(
        "%{}%",
        keyword.replace('\\', "\\\\").replace('\'', "''")
    );
    match object_type {
        "table" => format!(
            "SELECT table_schema, table_name, 'table' AS object_type \
             FROM information_schema.tables \
             WHERE table_name LIKE '{like}' LIMIT 50"
        ),
        "column" => format!(
            "SELECT table_schema, table_name, column_name, 'column' AS object_type \
             FROM information_schema.columns \
             WHERE column_name LIKE '{like}' LIMIT 50"
        ),
        "routine" => format!(
            "SELECT routine_schema, routine_name, 'routine' AS object_type \
             FROM information_schema.routines \
             WHERE routine_name LIKE '{like}' LIMIT 50"
        ),
        _ => format!(
            "SELECT table_schema, table_name AS object_name, 'table' AS object_type \
             FROM information_schema.tables WHERE table_name LIKE '{like}' \
             UNION ALL \
             SELECT table_schema, column_name AS object_name, 'column' AS object_type \
             FROM information_schema.columns WHERE column_name LIKE '{like}' \
             UNION ALL \
             SELECT routine_schema, routine_name AS object_name, 'routine' AS object_type \
             FROM information_schema.routines WHERE routine_name LIKE '{like}' \
             LIMIT 100"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_blocks_destructive_statements_in_read_only_mode() {
        let guard = SqlGuard::new(false).unwrap();

        for sql in [
            "DROP TABLE orders",
            "  delete from users where id = 1",
            "UPDATE accounts SET balance = 0",
            "TRUNCATE TABLE audit_log",
            "insert into t values (1)",
            "ALTER TABLE t ADD COLUMN c INT",
            "GRANT ALL ON *.* TO 'x'",
            "SET GLOBAL max_connections = 10",
        ] {
            let blocked = guard.check(sql);
            assert!(blocked.is_some(), "should block: {sql}");
            assert!(blocked.unwrap().reason.contains("read-only"));
        }
    }

    #[test]
    fn guard_blocks_destructive_statements_stacked_behind_reads() {
        let guard = SqlGuard::new(false).unwrap();

        for sql in [
            "SELECT 1; DROP TABLE orders",
            "SELECT 1;\nDELETE FROM users",
            "SHOW TABLES; UPDATE accounts SET balance = 0; SELECT 1",
        ] {
            let blocked = guard.check(sql);
            assert!(blocked.is_some(), "should block: {sql}");
            assert!(blocked.unwrap().reason.contains("read-only"));
        }
    }

    #[test]
    fn guard_allows_stacked_reads_and_trailing_semicolons() {
        let guard = SqlGuard::new(false).unwrap();

        for sql in [
            "SELECT 1;",
            "SELECT 1; SELECT 2",
            "DESCRIBE users; SHOW TABLES",
        ] {
            assert!(guard.check(sql).is_none(), "should allow: {sql}");
        }
    }

    #[test]
    fn guard_allows_read_statements() {
        let guard = SqlGuard::new(false).unwrap();

        for sql in [
            "SELECT * FROM orders LIMIT 10",
            "SHOW TABLES",
            "EXPLAIN SELECT 1",
            "DESCRIBE users",
            "select count(*) from payments where updated_at > now() - interval 1 hour",
        ] {
            assert!(guard.check(sql).is_none(), "should allow: {sql}");
        }
    }

    #[test]
    fn guard_allows_everything_when_writes_enabled() {
        let guard = SqlGuard::new(true).unwrap();
        assert!(guard.check("DROP TABLE orders").is_none());
    }

    #[test]
    fn object_search_sql_escapes_quotes_and_limits() {
        let sql = build_object_search_sql("user's", "table");
        assert!(sql.contains("%user''s%"));
        assert!(sql.contains("LIMIT 50"));
        assert!(sql.contains("information_schema.tables"));
    }

    #[test]
    fn object_search_sql_escapes_backslashes_before_quotes() {
        // A raw trailing `\'` must not survive as a backslash-escaped quote:
        // the backslash is doubled first, then the quote, keeping the
        // literal closed.
        let sql = build_object_search_sql(r"evil\'", "table");
        assert!(sql.contains(r"%evil\\''%"));

        let sql = build_object_search_sql(r"path\to", "column");
        assert!(sql.contains(r"%path\\to%"));
    }

    #[test]
    fn object_search_sql_defaults_to_all_object_types() {
        let sql = build_object_search_sql("order", "all");
        assert!(sql.contains("information_schema.tables"));
        assert!(sql.contains("information_schema.columns"));
        assert!(sql.contains("information_schema.routines"));
    }
}

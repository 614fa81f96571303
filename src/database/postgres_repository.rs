use sqlx::PgPool;

/// Postgres-backed implementation of every repository trait in `crate::database`.
#[derive(Clone)]
pub struct PostgresRepository {
    pub pool: PgPool,
}

/// Turns free text into an `ILIKE` substring pattern, escaping the wildcard
/// characters so user input only ever matches literally.
pub(crate) fn contains_pattern(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('%');
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

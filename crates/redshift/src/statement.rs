//! UNLOAD statement templating.

use std::sync::LazyLock;

use regex::Regex;

/// Two single quotes, shortest non-empty inner text, two single quotes.
static ESCAPED_QUOTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"''(.+?)''").expect("valid regex"));

/// Separator between UNLOAD options in the rendered statement.
pub const OPTION_SEPARATOR: &str = "\n\t\t\t";

/// Collapse one level of doubled single quotes around a quoted value.
///
/// `''O'Brien''` becomes `'O'Brien'`. Each match is rewritten once,
/// left to right; the result is not rescanned.
pub fn unescape_quotes(select_query: &str) -> String {
    ESCAPED_QUOTES
        .replace_all(select_query, "'${1}'")
        .into_owned()
}

/// Join UNLOAD options in their given order.
pub fn join_options(options: &[String]) -> String {
    options.join(OPTION_SEPARATOR)
}

/// Render the UNLOAD statement.
///
/// The select text is embedded in `$$` dollar quoting so its own quotes need
/// no further escaping.
pub fn build_unload_statement(
    s3_bucket: &str,
    credentials_block: &str,
    select_query: &str,
    s3_key: &str,
    unload_options: &str,
) -> String {
    let select_query = unescape_quotes(select_query);
    format!(
        "UNLOAD ($${select_query}$$)\n\
         TO 's3://{s3_bucket}/{s3_key}'\n\
         credentials\n\
         '{credentials_block}'\n\
         {unload_options};"
    )
}
